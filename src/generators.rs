//! Perfect maze generation.
//!
//! Every generator carves a spanning tree into a fully walled `Maze`: starting from a random cell,
//! it opens exactly one edge for every other cell it reaches. They differ in which cell they grow
//! the tree from next, which decides the texture (bias) of the maze.

use bit_set::BitSet;
use log::{debug, trace, warn};
use petgraph::graph::NodeIndex;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_derive::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::cells::{Coordinate, TopologyKind};
use crate::errors::*;
use crate::grid::{IndexType, Maze, Slot};

/// How often Growing Tree picks a uniformly random active cell instead of the newest one.
pub const DEFAULT_GROWING_TREE_THRESHOLD: f64 = 0.1;

fn default_threshold() -> f64 {
    DEFAULT_GROWING_TREE_THRESHOLD
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeneratorKind {
    /// `threshold` 0.0 always expands the most recently added cell (a recursive backtracker),
    /// 1.0 always a uniformly random one (Prim's like).
    GrowingTree {
        #[serde(default = "default_threshold")]
        threshold: f64,
    },
    ModifiedPrims,
    RecursiveBacktracker,
}

impl Default for GeneratorKind {
    fn default() -> GeneratorKind {
        GeneratorKind::RecursiveBacktracker
    }
}

/// What a generation run did to the maze.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationStats {
    /// Cells included in the tree, including the starting cell.
    pub visited: usize,
    /// Edges opened.
    pub carved: usize,
    /// Moves made through a tunnel instead of an edge.
    pub tunnels_used: usize,
    /// Tunnel endpoints that were only allowed to be entered through their tunnel.
    pub locked: Vec<Coordinate>,
}

impl GeneratorKind {
    pub fn growing_tree() -> GeneratorKind {
        GeneratorKind::GrowingTree { threshold: DEFAULT_GROWING_TREE_THRESHOLD }
    }

    pub fn name(&self) -> &'static str {
        match *self {
            GeneratorKind::GrowingTree { .. } => "growing tree",
            GeneratorKind::ModifiedPrims => "modified prim's",
            GeneratorKind::RecursiveBacktracker => "recursive backtracker",
        }
    }

    pub fn supports(&self, kind: TopologyKind) -> bool {
        match *self {
            GeneratorKind::GrowingTree { .. } | GeneratorKind::ModifiedPrims => {
                kind == TopologyKind::Rectangular || kind == TopologyKind::Hexagonal
            }
            GeneratorKind::RecursiveBacktracker => true,
        }
    }

    /// Carve a perfect maze into a fully walled maze.
    ///
    /// An unsupported topology or bad configuration leaves the maze untouched. A disconnected
    /// maze leaves it partially carved, call `Maze::reset` before generating again.
    pub fn generate<GridIndexType, R>(&self,
                                      maze: &mut Maze<GridIndexType>,
                                      rng: &mut R)
                                      -> Result<GenerationStats>
        where GridIndexType: IndexType,
              R: Rng + ?Sized
    {
        if !self.supports(maze.kind()) {
            warn!("{} generation skipped: {:?} mazes are not supported", self.name(), maze.kind());
            bail!(ErrorKind::UnsupportedTopology(self.name(), maze.kind()));
        }

        debug!("{} generation of {:?}", self.name(), maze);
        let stats = match *self {
            GeneratorKind::GrowingTree { threshold } => growing_tree(maze, threshold, rng),
            GeneratorKind::ModifiedPrims => modified_prims(maze, rng),
            GeneratorKind::RecursiveBacktracker => recursive_backtracker(maze, rng),
        };

        match stats {
            Ok(ref s) => debug!("{} generation finished: {:?}", self.name(), s),
            Err(ref e) => warn!("{} generation failed: {}", self.name(), e),
        }
        stats
    }
}

type SlotSmallVec<Ix> = SmallVec<[Slot<Ix>; 6]>;

fn unvisited_slots<GridIndexType: IndexType>(maze: &Maze<GridIndexType>,
                                             cell: NodeIndex<GridIndexType>,
                                             visited: &BitSet)
                                             -> SlotSmallVec<GridIndexType> {
    maze.slots(cell)
        .map(|(_, slot)| slot)
        .filter(|slot| !visited.contains(slot.neighbour.index()))
        .collect()
}

fn growing_tree<GridIndexType, R>(maze: &mut Maze<GridIndexType>,
                                  threshold: f64,
                                  rng: &mut R)
                                  -> Result<GenerationStats>
    where GridIndexType: IndexType,
          R: Rng + ?Sized
{
    if !(0.0..=1.0).contains(&threshold) {
        bail!(ErrorKind::InvalidThreshold(threshold));
    }

    let cells_count = maze.size();
    let mut visited = BitSet::with_capacity(cells_count);
    let mut stats = GenerationStats::default();

    let start = maze.random_cell(rng);
    visited.insert(start.index());
    stats.visited = 1;
    let mut active = vec![start];

    while !active.is_empty() {
        let position = if rng.gen_bool(threshold) {
            rng.gen_range(0..active.len())
        } else {
            active.len() - 1
        };
        let cell = active[position];

        let candidates = unvisited_slots(maze, cell, &visited);
        if let Some(slot) = candidates.choose(rng) {
            maze.open_edge(slot.edge);
            visited.insert(slot.neighbour.index());
            active.push(slot.neighbour);
            stats.visited += 1;
            stats.carved += 1;
        } else {
            // Fully expanded. Keep the order of the rest, "newest" must stay newest. Removing
            // the newest cell, the common case, does not shift anything.
            let _ = active.remove(position);
        }
    }

    if stats.visited < cells_count {
        bail!(ErrorKind::Disconnected(stats.visited, cells_count));
    }
    Ok(stats)
}

fn modified_prims<GridIndexType, R>(maze: &mut Maze<GridIndexType>, rng: &mut R) -> Result<GenerationStats>
    where GridIndexType: IndexType,
          R: Rng + ?Sized
{
    let cells_count = maze.size();
    let mut included = BitSet::with_capacity(cells_count);
    let mut in_frontier = BitSet::with_capacity(cells_count);
    let mut frontier = Vec::new();
    let mut stats = GenerationStats::default();

    let mut newest = maze.random_cell(rng);
    included.insert(newest.index());
    stats.visited = 1;

    while stats.visited < cells_count {

        for neighbour in maze.neighbours(newest) {
            let n = neighbour.index();
            if !included.contains(n) && !in_frontier.contains(n) {
                in_frontier.insert(n);
                frontier.push(neighbour);
            }
        }

        if frontier.is_empty() {
            break;
        }
        // Selection is uniform so the frontier order does not matter.
        let frontier_cell = frontier.swap_remove(rng.gen_range(0..frontier.len()));
        in_frontier.remove(frontier_cell.index());

        // Frontier cells are only ever added as neighbours of included cells.
        let connections: SlotSmallVec<GridIndexType> = maze.slots(frontier_cell)
            .map(|(_, slot)| slot)
            .filter(|slot| included.contains(slot.neighbour.index()))
            .collect();
        let connection = connections.choose(rng)
            .ok_or(ErrorKind::Disconnected(stats.visited, cells_count))?;

        maze.open_edge(connection.edge);
        included.insert(frontier_cell.index());
        stats.visited += 1;
        stats.carved += 1;
        newest = frontier_cell;
    }

    if stats.visited < cells_count {
        bail!(ErrorKind::Disconnected(stats.visited, cells_count));
    }
    Ok(stats)
}

#[derive(Debug, Copy, Clone)]
enum Move<Ix: IndexType> {
    Carve(Slot<Ix>),
    Tunnel(NodeIndex<Ix>),
}

fn recursive_backtracker<GridIndexType, R>(maze: &mut Maze<GridIndexType>,
                                           rng: &mut R)
                                           -> Result<GenerationStats>
    where GridIndexType: IndexType,
          R: Rng + ?Sized
{
    let cells_count = maze.size();
    let mut visited = BitSet::with_capacity(cells_count);
    // Tunnel ends that may only be entered through their tunnel.
    let mut locked = BitSet::with_capacity(cells_count);
    let mut stack = Vec::with_capacity(cells_count);
    let mut stats = GenerationStats::default();

    let mut current = maze.random_cell(rng);
    visited.insert(current.index());
    stats.visited = 1;

    while stats.visited < cells_count {

        let mut moves: SmallVec<[Move<GridIndexType>; 7]> = unvisited_slots(maze, current, &visited)
            .into_iter()
            .filter(|slot| !locked.contains(slot.neighbour.index()))
            .map(Move::Carve)
            .collect();

        let unvisited_partner = maze.tunnel(current).filter(|p| !visited.contains(p.index()));
        moves.extend(unvisited_partner.map(Move::Tunnel));

        if let Some(&chosen) = moves.choose(rng) {

            // Whichever way we leave a tunnel end, the far end must not also be reached
            // through the grid or the tunnel would close a loop.
            if let Some(partner) = unvisited_partner {
                if locked.insert(partner.index()) {
                    trace!("tunnel end {:?} locked", maze.coordinate(partner));
                    stats.locked.push(maze.coordinate(partner));
                }
            }

            stack.push(current);
            current = match chosen {
                Move::Carve(slot) => {
                    maze.open_edge(slot.edge);
                    stats.carved += 1;
                    slot.neighbour
                }
                Move::Tunnel(partner) => {
                    stats.tunnels_used += 1;
                    partner
                }
            };
            visited.insert(current.index());
            stats.visited += 1;

        } else if let Some(previous) = stack.pop() {
            current = previous;
        } else {
            break;
        }
    }

    if stats.visited < cells_count {
        bail!(ErrorKind::Disconnected(stats.visited, cells_count));
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use quickcheck::{quickcheck, TestResult};
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    use super::*;
    use crate::grid::MazeBuilder;
    use crate::pathing;
    use crate::units::{ColumnsCount, RowsCount};

    const ALL_GENERATORS: [GeneratorKind; 5] = [GeneratorKind::GrowingTree { threshold: 0.1 },
                                                GeneratorKind::GrowingTree { threshold: 0.0 },
                                                GeneratorKind::GrowingTree { threshold: 1.0 },
                                                GeneratorKind::ModifiedPrims,
                                                GeneratorKind::RecursiveBacktracker];

    fn maze(kind: TopologyKind, rows: usize, columns: usize) -> Maze {
        MazeBuilder::new(kind, RowsCount(rows), ColumnsCount(columns)).build().unwrap()
    }

    fn rng(seed: u64) -> XorShiftRng {
        XorShiftRng::seed_from_u64(seed)
    }

    #[test]
    fn every_generator_builds_a_spanning_tree() {
        for kind in &[TopologyKind::Rectangular, TopologyKind::Hexagonal] {
            for generator in &ALL_GENERATORS {
                for seed in 0..5 {
                    let mut m = maze(*kind, 7, 9);
                    let stats = generator.generate(&mut m, &mut rng(seed)).unwrap();

                    assert_eq!(stats.visited, 63);
                    assert_eq!(stats.carved, 62);
                    assert_eq!(m.open_edges_count(), 62);
                    assert!(pathing::analyse(&m).is_perfect(), "{:?} on {:?}", generator, kind);
                }
            }
        }
    }

    #[test]
    fn rectangular_5x5_recursive_backtracker() {
        let mut m = maze(TopologyKind::Rectangular, 5, 5);
        let _ = GeneratorKind::RecursiveBacktracker.generate(&mut m, &mut rng(42)).unwrap();
        assert_eq!(m.open_edges_count(), 24);
        assert_eq!(pathing::analyse(&m).components, 1);
    }

    #[test]
    fn hexagonal_3x3_carves_8_edges() {
        for generator in &ALL_GENERATORS {
            let mut m = maze(TopologyKind::Hexagonal, 3, 3);
            let _ = generator.generate(&mut m, &mut rng(7)).unwrap();
            assert_eq!(m.open_edges_count(), 8);
        }
    }

    #[test]
    fn single_cell_maze_needs_no_carving() {
        for generator in &ALL_GENERATORS {
            let mut m = maze(TopologyKind::Rectangular, 1, 1);
            let stats = generator.generate(&mut m, &mut rng(1)).unwrap();
            assert_eq!(stats.visited, 1);
            assert_eq!(stats.carved, 0);
        }
    }

    #[test]
    fn unsupported_topology_leaves_maze_untouched() {
        for generator in &[GeneratorKind::growing_tree(), GeneratorKind::ModifiedPrims] {
            let mut m = maze(TopologyKind::Tunneled, 4, 4);
            match generator.generate(&mut m, &mut rng(3)) {
                Err(Error(ErrorKind::UnsupportedTopology(_, TopologyKind::Tunneled), _)) => {}
                other => panic!("expected unsupported topology, got {:?}", other),
            }
            assert_eq!(m.open_edges_count(), 0);
        }
    }

    #[test]
    fn threshold_out_of_range_is_rejected() {
        let mut m = maze(TopologyKind::Rectangular, 3, 3);
        let generator = GeneratorKind::GrowingTree { threshold: 1.5 };
        assert!(generator.generate(&mut m, &mut rng(3)).is_err());
        assert_eq!(m.open_edges_count(), 0);
    }

    #[test]
    fn seeded_generation_is_deterministic() {
        for generator in &ALL_GENERATORS {
            let mut a = maze(TopologyKind::Hexagonal, 6, 6);
            let mut b = maze(TopologyKind::Hexagonal, 6, 6);
            let _ = generator.generate(&mut a, &mut rng(99)).unwrap();
            let _ = generator.generate(&mut b, &mut rng(99)).unwrap();
            assert_eq!(a.iter_links().collect::<Vec<_>>(), b.iter_links().collect::<Vec<_>>());
        }
    }

    #[test]
    fn tunnel_4x4_locks_exactly_one_end() {
        for seed in 0..20 {
            let mut m: Maze = MazeBuilder::new(TopologyKind::Tunneled, RowsCount(4), ColumnsCount(4))
                .tunnel(Coordinate::new(0, 0), Coordinate::new(3, 3))
                .build()
                .unwrap();
            let stats = GeneratorKind::RecursiveBacktracker.generate(&mut m, &mut rng(seed)).unwrap();

            assert_eq!(stats.locked.len(), 1);
            assert!(stats.locked[0] == Coordinate::new(0, 0) || stats.locked[0] == Coordinate::new(3, 3));
            assert_eq!(stats.tunnels_used, 1);
            assert_eq!(stats.visited, 16);

            // The tunnel is one of the 15 tree passages.
            assert_eq!(m.open_edges_count(), 14);
            let analysis = pathing::analyse(&m);
            assert_eq!(analysis.passages(), 15);
            assert!(analysis.is_perfect());
        }
    }

    #[test]
    fn locked_tunnel_end_is_never_entered_from_the_grid() {
        for seed in 0..20 {
            let mut m: Maze = MazeBuilder::new(TopologyKind::Tunneled, RowsCount(5), ColumnsCount(5))
                .tunnel(Coordinate::new(0, 0), Coordinate::new(4, 4))
                .tunnel(Coordinate::new(2, 0), Coordinate::new(0, 3))
                .build()
                .unwrap();
            let stats = GeneratorKind::RecursiveBacktracker.generate(&mut m, &mut rng(seed)).unwrap();
            assert_eq!(stats.locked.len(), 2);
            assert!(pathing::analyse(&m).is_perfect());

            // With the tunnel removed the two ends lie in different grid components.
            for &(a, b) in m.tunnels() {
                let grid_only = pathing::grid_distances(&m, m.coordinate(a)).unwrap();
                assert_eq!(grid_only.distance_from_start_to(m.coordinate(b)), None);
            }
        }
    }

    // A depth first tree has no cross edges: the two sides of every wall still standing are an
    // ancestor and a descendant of each other, seen from the cell the tree was grown from.
    fn is_depth_first_tree_from_some_root(m: &Maze) -> bool {
        let from: Vec<pathing::Distances> =
            m.iter().map(|c| pathing::Distances::new(m, c).unwrap()).collect();
        let d = |a: NodeIndex, b: NodeIndex| {
            from[a.index()].distance_from_start_to(m.coordinate(b)).unwrap()
        };
        let walls: Vec<(NodeIndex, NodeIndex)> = m.cells()
            .flat_map(|cell| {
                m.slots(cell)
                    .filter(|(_, slot)| !m.is_edge_open(slot.edge))
                    .map(move |(_, slot)| (cell, slot.neighbour))
            })
            .collect();

        m.cells().any(|root| {
            walls.iter().all(|&(u, v)| {
                d(root, v) == d(root, u) + d(u, v) || d(root, u) == d(root, v) + d(u, v)
            })
        })
    }

    #[test]
    fn threshold_zero_always_grows_from_the_newest_cell() {
        for seed in 0..10 {
            let mut m = maze(TopologyKind::Rectangular, 6, 6);
            let generator = GeneratorKind::GrowingTree { threshold: 0.0 };
            let _ = generator.generate(&mut m, &mut rng(seed)).unwrap();
            assert!(is_depth_first_tree_from_some_root(&m), "seed {}", seed);
        }
    }

    #[test]
    fn threshold_one_grows_from_random_cells() {
        let depth_first_count = (0..10)
            .filter(|&seed| {
                let mut m = maze(TopologyKind::Rectangular, 6, 6);
                let generator = GeneratorKind::GrowingTree { threshold: 1.0 };
                let _ = generator.generate(&mut m, &mut rng(seed)).unwrap();
                is_depth_first_tree_from_some_root(&m)
            })
            .count();
        assert_eq!(depth_first_count, 0);
    }

    #[test]
    fn large_mazes_count_every_cell_once() {
        let generators = [GeneratorKind::growing_tree(),
                          GeneratorKind::ModifiedPrims,
                          GeneratorKind::RecursiveBacktracker];
        for generator in &generators {
            let mut m = maze(TopologyKind::Rectangular, 200, 200);
            let stats = generator.generate(&mut m, &mut rng(5)).unwrap();
            assert_eq!(stats.visited, 40_000);
            assert_eq!(stats.carved, 39_999);
        }
    }

    #[test]
    fn spanning_tree_property() {
        fn prop(rows: u8, columns: u8, seed: u64, which: u8) -> TestResult {
            let (rows, columns) = (1 + rows as usize % 12, 1 + columns as usize % 12);
            let topology = if which % 2 == 0 { TopologyKind::Rectangular } else { TopologyKind::Hexagonal };
            let generator = ALL_GENERATORS[which as usize % ALL_GENERATORS.len()];

            let mut m = maze(topology, rows, columns);
            if generator.generate(&mut m, &mut rng(seed)).is_err() {
                return TestResult::failed();
            }
            TestResult::from_bool(m.open_edges_count() == rows * columns - 1 &&
                                  pathing::analyse(&m).is_perfect())
        }
        quickcheck(prop as fn(u8, u8, u64, u8) -> TestResult);
    }
}
