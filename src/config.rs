//! A full maze run described as data: build, generate, then solve.

use log::debug;
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use serde_derive::{Deserialize, Serialize};

use crate::cells::{Coordinate, TopologyKind};
use crate::errors::*;
use crate::generators::{GenerationStats, GeneratorKind};
use crate::grid::{Maze, MazeBuilder};
use crate::solvers::{Footprints, Solver, SolverKind};
use crate::units::{ColumnsCount, RowsCount};

/// Deserialisable from any serde format, e.g.
///
/// ```json
/// { "topology": "Tunneled", "rows": 4, "columns": 4,
///   "tunnels": [[{"row": 0, "column": 0}, {"row": 3, "column": 3}]],
///   "generator": "RecursiveBacktracker", "solver": "WallFollower", "seed": 7 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MazeConfig {
    pub topology: TopologyKind,
    pub rows: usize,
    pub columns: usize,
    #[serde(default)]
    pub entrance: Option<Coordinate>,
    #[serde(default)]
    pub exit: Option<Coordinate>,
    #[serde(default)]
    pub tunnels: Vec<(Coordinate, Coordinate)>,
    #[serde(default)]
    pub generator: GeneratorKind,
    #[serde(default)]
    pub solver: SolverKind,
    /// Without a seed every run differs.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub generation: GenerationStats,
    pub solved: bool,
    pub explored: usize,
    pub route: Vec<Coordinate>,
}

impl MazeConfig {
    pub fn new(topology: TopologyKind, rows: usize, columns: usize) -> MazeConfig {
        MazeConfig {
            topology,
            rows,
            columns,
            entrance: None,
            exit: None,
            tunnels: vec![],
            generator: GeneratorKind::default(),
            solver: SolverKind::default(),
            seed: None,
        }
    }

    /// The fully walled maze, with its tunnels.
    pub fn build_maze(&self) -> Result<Maze> {
        let mut builder = MazeBuilder::new(self.topology, RowsCount(self.rows), ColumnsCount(self.columns));
        if let Some(entrance) = self.entrance {
            builder = builder.entrance(entrance);
        }
        if let Some(exit) = self.exit {
            builder = builder.exit(exit);
        }
        for &(a, b) in &self.tunnels {
            builder = builder.tunnel(a, b);
        }
        builder.build()
    }

    pub fn rng(&self) -> XorShiftRng {
        match self.seed {
            Some(seed) => XorShiftRng::seed_from_u64(seed),
            None => XorShiftRng::from_entropy(),
        }
    }

    /// Build, generate and solve with one random source.
    pub fn run<F: Footprints + ?Sized>(&self, footprints: &mut F) -> Result<RunReport> {
        debug!("running {:?}", self);
        let mut maze = self.build_maze()?;
        let mut rng = self.rng();

        let generation = self.generator.generate(&mut maze, &mut rng)?;

        let mut solver = Solver::new(self.solver);
        let solved = solver.solve(&maze, &mut rng, footprints);

        Ok(RunReport {
            generation,
            solved,
            explored: solver.explored_count(),
            route: solver.route().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solvers::NoFootprints;

    fn from_json(json: &str) -> MazeConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = from_json(r#"{ "topology": "Hexagonal", "rows": 3, "columns": 3 }"#);
        assert_eq!(config, MazeConfig::new(TopologyKind::Hexagonal, 3, 3));

        let report = config.run(&mut NoFootprints).unwrap();
        assert_eq!(report.generation.carved, 8);
        assert!(report.solved);
        assert_eq!(report.route.first(), Some(&Coordinate::new(0, 0)));
        assert_eq!(report.route.last(), Some(&Coordinate::new(2, 3)));
    }

    #[test]
    fn growing_tree_threshold_defaults() {
        let config = from_json(r#"{ "topology": "Rectangular", "rows": 2, "columns": 5,
                                    "generator": { "GrowingTree": {} },
                                    "solver": "BiDirectionalBacktracker" }"#);
        assert_eq!(config.generator, GeneratorKind::growing_tree());
        assert_eq!(config.solver, SolverKind::BiDirectionalBacktracker);

        let custom = from_json(r#"{ "topology": "Rectangular", "rows": 2, "columns": 5,
                                    "generator": { "GrowingTree": { "threshold": 0.5 } } }"#);
        assert_eq!(custom.generator, GeneratorKind::GrowingTree { threshold: 0.5 });
    }

    #[test]
    fn tunneled_run() {
        let config = from_json(r#"{ "topology": "Tunneled", "rows": 4, "columns": 4,
                                    "tunnels": [[{"row": 0, "column": 0}, {"row": 3, "column": 3}]],
                                    "generator": "RecursiveBacktracker",
                                    "solver": "WallFollower",
                                    "seed": 7 }"#);
        let mut steps = 0;
        let report = config.run(&mut |_: Coordinate| steps += 1).unwrap();

        assert_eq!(report.generation.locked.len(), 1);
        assert_eq!(report.generation.carved, 14);
        assert!(report.solved);
        assert!(report.route.len() <= report.explored);
        assert!(steps >= report.explored);

        // Same seed, same maze and walk.
        assert_eq!(config.run(&mut NoFootprints).unwrap(), report);
    }

    #[test]
    fn configuration_errors_are_reported() {
        let mut config = MazeConfig::new(TopologyKind::Tunneled, 4, 4);
        config.generator = GeneratorKind::ModifiedPrims;
        match config.run(&mut NoFootprints) {
            Err(Error(ErrorKind::UnsupportedTopology(..), _)) => {}
            other => panic!("expected unsupported topology, got {:?}", other),
        }

        let mut adjacent_tunnel = MazeConfig::new(TopologyKind::Tunneled, 4, 4);
        adjacent_tunnel.tunnels.push((Coordinate::new(0, 0), Coordinate::new(0, 1)));
        assert!(adjacent_tunnel.build_maze().is_err());

        assert!(MazeConfig::new(TopologyKind::Rectangular, 0, 4).build_maze().is_err());
    }
}
