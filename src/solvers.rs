//! Route finding from a maze's entrance to its exit.
//!
//! Solvers only read the maze. Every step onto a cell is reported through a `Footprints` hook so
//! that a caller can animate or record the walk.

use bit_set::BitSet;
use log::{debug, warn};
use petgraph::graph::NodeIndex;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_derive::{Deserialize, Serialize};

use crate::cells::{Coordinate, Direction};
use crate::grid::{CellSmallVec, IndexType, Maze};

/// Observer of a solver's walk.
pub trait Footprints {
    /// Called for the starting cell(s) and then once for every step onto a cell, revisits included.
    fn on_visit(&mut self, coord: Coordinate);
}

impl<F: FnMut(Coordinate)> Footprints for F {
    fn on_visit(&mut self, coord: Coordinate) {
        self(coord)
    }
}

#[derive(Debug, Copy, Clone, Default)]
pub struct NoFootprints;

impl Footprints for NoFootprints {
    fn on_visit(&mut self, _: Coordinate) {}
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverKind {
    /// Deterministic left hand rule.
    WallFollower,
    /// Two random depth first walks, from the entrance and the exit, until they meet.
    BiDirectionalBacktracker,
}

impl Default for SolverKind {
    fn default() -> SolverKind {
        SolverKind::WallFollower
    }
}

impl SolverKind {
    pub fn name(&self) -> &'static str {
        match *self {
            SolverKind::WallFollower => "wall follower",
            SolverKind::BiDirectionalBacktracker => "bidirectional backtracker",
        }
    }
}

/// Result of the last solve run of a solver.
#[derive(Debug, Clone)]
pub struct Solver {
    kind: SolverKind,
    solved: bool,
    explored: usize,
    route: Vec<Coordinate>,
}

impl Solver {
    pub fn new(kind: SolverKind) -> Solver {
        Solver {
            kind,
            solved: false,
            explored: 0,
            route: vec![],
        }
    }

    #[inline]
    pub fn kind(&self) -> SolverKind {
        self.kind
    }

    /// Walk the maze from entrance to exit, replacing the result of any previous run.
    /// The random source is only drawn from by the bidirectional backtracker.
    pub fn solve<GridIndexType, R, F>(&mut self,
                                      maze: &Maze<GridIndexType>,
                                      rng: &mut R,
                                      footprints: &mut F)
                                      -> bool
        where GridIndexType: IndexType,
              R: Rng + ?Sized,
              F: Footprints + ?Sized
    {
        debug!("{} solving {:?}", self.kind.name(), maze);

        let walk = match self.kind {
            SolverKind::WallFollower => wall_follower(maze, footprints),
            SolverKind::BiDirectionalBacktracker => bidirectional_backtracker(maze, rng, footprints),
        };
        self.solved = walk.solved;
        self.explored = walk.explored;
        self.route = walk.route.into_iter().map(|cell| maze.coordinate(cell)).collect();

        if self.solved {
            debug!("{} solved: route length {}, explored {} cells",
                   self.kind.name(),
                   self.route.len(),
                   self.explored);
        } else {
            warn!("{} found no route from {:?} to {:?} after exploring {} cells",
                  self.kind.name(),
                  maze.entrance(),
                  maze.exit(),
                  self.explored);
        }
        self.solved
    }

    #[inline]
    pub fn is_solved(&self) -> bool {
        self.solved
    }

    /// Distinct cells visited. The bidirectional walks each count their own visits.
    #[inline]
    pub fn explored_count(&self) -> usize {
        self.explored
    }

    /// Entrance to exit when solved, otherwise the partial route of the last walk.
    #[inline]
    pub fn route(&self) -> &[Coordinate] {
        &self.route
    }
}

struct Walk<Ix: IndexType> {
    solved: bool,
    explored: usize,
    route: Vec<NodeIndex<Ix>>,
}

/// Try to leave a cell through one of its ports, returning the cell entered and the port of that
/// cell the walker arrives through.
///
/// A cell has `num_dir + 1` ports in clockwise order: its direction slots, then its tunnel as the
/// port after the last slot. The walker takes a tunnel when the left hand scan reaches that port,
/// not as soon as it stands on a tunnel end, so it never bounces back and forth through one.
fn leave_through<GridIndexType: IndexType>(maze: &Maze<GridIndexType>,
                                           cell: NodeIndex<GridIndexType>,
                                           port: usize)
                                           -> Option<(NodeIndex<GridIndexType>, usize)> {
    let num_dir = maze.kind().num_dir();
    if port == num_dir {
        maze.tunnel(cell).map(|partner| (partner, num_dir))
    } else {
        maze.slot(cell, port)
            .filter(|slot| maze.is_edge_open(slot.edge))
            .map(|slot| (slot.neighbour, maze.kind().opposite_slot(port)))
    }
}

fn wall_follower<GridIndexType, F>(maze: &Maze<GridIndexType>, footprints: &mut F) -> Walk<GridIndexType>
    where GridIndexType: IndexType,
          F: Footprints + ?Sized
{
    let kind = maze.kind();
    let ports = kind.num_dir() + 1;
    let (entrance, exit) = (maze.entrance_cell(), maze.exit_cell());

    // On a tree every passage is walked at most once each way before the walk is back where it
    // started, so this bounds the walk on any maze.
    let passages = maze.open_edges_count() + maze.tunnels().len();
    let max_moves = 2 * passages + 1;

    let mut visited = BitSet::with_capacity(maze.size());
    visited.insert(entrance.index());
    let mut route = vec![entrance];
    footprints.on_visit(maze.coordinate(entrance));

    // Heading east into the entrance, as if arriving through its west side.
    let mut arrived_through = kind.slot_of(Direction::West).unwrap_or(0);
    let mut current = entrance;
    let mut moves = 0;

    while current != exit && moves < max_moves {
        let next = (1..=ports)
            .map(|turn| (arrived_through + turn) % ports)
            .filter_map(|port| leave_through(maze, current, port))
            .next();

        let (cell, port) = match next {
            Some(step) => step,
            None => break,
        };

        // Stepping back onto the previous cell of the route folds the dead end away.
        if route.len() >= 2 && route[route.len() - 2] == cell {
            let _ = route.pop();
        } else {
            route.push(cell);
        }
        visited.insert(cell.index());
        footprints.on_visit(maze.coordinate(cell));

        current = cell;
        arrived_through = port;
        moves += 1;
    }

    Walk {
        solved: current == exit,
        explored: visited.len(),
        route,
    }
}

struct DepthFirstWalk<Ix: IndexType> {
    stack: Vec<NodeIndex<Ix>>,
    on_stack: BitSet,
    visited: BitSet,
}

impl<Ix: IndexType> DepthFirstWalk<Ix> {
    fn new(start: NodeIndex<Ix>, cells_count: usize) -> DepthFirstWalk<Ix> {
        let mut walk = DepthFirstWalk {
            stack: vec![start],
            on_stack: BitSet::with_capacity(cells_count),
            visited: BitSet::with_capacity(cells_count),
        };
        walk.on_stack.insert(start.index());
        walk.visited.insert(start.index());
        walk
    }

    fn is_exhausted(&self) -> bool {
        self.stack.is_empty()
    }

    fn is_on_stack(&self, cell: NodeIndex<Ix>) -> bool {
        self.on_stack.contains(cell.index())
    }

    fn position(&self, cell: NodeIndex<Ix>) -> Option<usize> {
        self.stack.iter().position(|&c| c == cell)
    }

    /// Take one step forward or back. Returns the newly entered cell if it was a step forward.
    fn step<R, F>(&mut self, maze: &Maze<Ix>, rng: &mut R, footprints: &mut F) -> Option<NodeIndex<Ix>>
        where R: Rng + ?Sized,
              F: Footprints + ?Sized
    {
        let current = *self.stack.last()?;

        let candidates: CellSmallVec<Ix> = maze.passages(current)
            .into_iter()
            .filter(|next| !self.visited.contains(next.index()))
            .collect();

        if let Some(&next) = candidates.choose(rng) {
            self.stack.push(next);
            self.on_stack.insert(next.index());
            self.visited.insert(next.index());
            footprints.on_visit(maze.coordinate(next));
            Some(next)
        } else {
            let _ = self.stack.pop();
            self.on_stack.remove(current.index());
            if let Some(&back) = self.stack.last() {
                footprints.on_visit(maze.coordinate(back));
            }
            None
        }
    }
}

fn bidirectional_backtracker<GridIndexType, R, F>(maze: &Maze<GridIndexType>,
                                                  rng: &mut R,
                                                  footprints: &mut F)
                                                  -> Walk<GridIndexType>
    where GridIndexType: IndexType,
          R: Rng + ?Sized,
          F: Footprints + ?Sized
{
    let (entrance, exit) = (maze.entrance_cell(), maze.exit_cell());
    let mut from_entrance = DepthFirstWalk::new(entrance, maze.size());
    let mut from_exit = DepthFirstWalk::new(exit, maze.size());
    footprints.on_visit(maze.coordinate(entrance));
    if exit != entrance {
        footprints.on_visit(maze.coordinate(exit));
    }

    let mut meeting = if entrance == exit { Some(entrance) } else { None };

    while meeting.is_none() && !(from_entrance.is_exhausted() && from_exit.is_exhausted()) {

        if let Some(cell) = from_entrance.step(maze, rng, footprints) {
            if from_exit.is_on_stack(cell) {
                meeting = Some(cell);
                break;
            }
        }

        if let Some(cell) = from_exit.step(maze, rng, footprints) {
            if from_entrance.is_on_stack(cell) {
                meeting = Some(cell);
            }
        }
    }

    let explored = from_entrance.visited.len() + from_exit.visited.len();

    match meeting.and_then(|cell| Some((cell, from_entrance.position(cell)?, from_exit.position(cell)?))) {
        Some((_, entrance_position, exit_position)) => {
            let mut route = from_entrance.stack[..=entrance_position].to_vec();
            route.extend(from_exit.stack[..exit_position].iter().rev());
            Walk {
                solved: true,
                explored,
                route,
            }
        }
        None => {
            Walk {
                solved: false,
                explored,
                route: from_entrance.stack,
            }
        }
    }
}
