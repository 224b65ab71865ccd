// Flood fill distances and route finding over the passages of a maze.
//
// Distances are keyed by coordinate rather than by cell id so that they stay meaningful when
// compared across mazes of different index types. They do not borrow the maze: carving more
// passages afterwards silently invalidates them.

use itertools::Itertools;
use petgraph::algo::{connected_components, is_cyclic_undirected};
use petgraph::graph::{NodeIndex, UnGraph};
use smallvec::SmallVec;

use crate::cells::Coordinate;
use crate::grid::{CellSmallVec, IndexType, Maze};
use crate::utils;
use crate::utils::FnvHashMap;

#[derive(Debug, Clone)]
pub struct Distances {
    start_coordinate: Coordinate,
    distances: FnvHashMap<Coordinate, u32>,
    max_distance: u32,
}

impl Distances {
    /// Steps from `start_coordinate` to every cell reachable through passages, tunnels included.
    /// None if the start is not a cell of the maze.
    pub fn new<GridIndexType: IndexType>(maze: &Maze<GridIndexType>,
                                         start_coordinate: Coordinate)
                                         -> Option<Distances> {
        flood(maze, start_coordinate, |cell| maze.passages(cell))
    }

    #[inline(always)]
    pub fn start(&self) -> Coordinate {
        self.start_coordinate
    }

    #[inline(always)]
    pub fn max(&self) -> u32 {
        self.max_distance
    }

    /// Number of cells reached, including the start.
    #[inline]
    pub fn reached(&self) -> usize {
        self.distances.len()
    }

    /// None when the coordinate is unreachable or not part of the maze.
    #[inline(always)]
    pub fn distance_from_start_to(&self, coord: Coordinate) -> Option<u32> {
        self.distances.get(&coord).cloned()
    }

    /// Every cell at the maximum distance, in row major order.
    pub fn furthest_points(&self) -> SmallVec<[Coordinate; 8]> {
        let furthest_distance = self.max();
        self.distances
            .iter()
            .filter(|&(_, distance)| *distance == furthest_distance)
            .map(|(coord, _)| *coord)
            .sorted()
            .collect()
    }
}

/// Distances through open edges only. Tunnels are treated as walls.
pub fn grid_distances<GridIndexType: IndexType>(maze: &Maze<GridIndexType>,
                                                start_coordinate: Coordinate)
                                                -> Option<Distances> {
    flood(maze, start_coordinate, |cell| {
        maze.slots(cell)
            .filter(|(_, slot)| maze.is_edge_open(slot.edge))
            .map(|(_, slot)| slot.neighbour)
            .collect()
    })
}

fn flood<GridIndexType, F>(maze: &Maze<GridIndexType>,
                           start_coordinate: Coordinate,
                           next_cells: F)
                           -> Option<Distances>
    where GridIndexType: IndexType,
          F: Fn(NodeIndex<GridIndexType>) -> CellSmallVec<GridIndexType>
{
    let start = maze.cell(start_coordinate)?;

    let mut distances: FnvHashMap<Coordinate, u32> = utils::fnv_hashmap(maze.size());
    distances.insert(start_coordinate, 0);
    let mut max: u32 = 0;

    // Every step costs one, so the first time a cell is reached is by a shortest route and the
    // map doubles as the visited set.
    let mut frontier = vec![start];
    while !frontier.is_empty() {
        let mut new_frontier = vec![];
        for &cell in &frontier {
            let distance_to_cell = distances[&maze.coordinate(cell)];
            max = max.max(distance_to_cell);

            for next in next_cells(cell) {
                let next_coord = maze.coordinate(next);
                if !distances.contains_key(&next_coord) {
                    distances.insert(next_coord, distance_to_cell + 1);
                    new_frontier.push(next);
                }
            }
        }
        frontier = new_frontier;
    }

    Some(Distances {
        start_coordinate,
        distances,
        max_distance: max,
    })
}

/// Walk back from `end_point` towards the start of `distances_from_start`, always stepping to a
/// passage neighbour one step closer. Returns the route from start to end inclusive.
pub fn shortest_path<GridIndexType: IndexType>(maze: &Maze<GridIndexType>,
                                               distances_from_start: &Distances,
                                               end_point: Coordinate)
                                               -> Option<Vec<Coordinate>> {
    let mut current_distance = distances_from_start.distance_from_start_to(end_point)?;
    let mut current = maze.cell(end_point)?;
    let mut path = vec![end_point];

    while current_distance > 0 {
        let closer = maze.passages(current)
            .into_iter()
            .find(|&n| {
                distances_from_start.distance_from_start_to(maze.coordinate(n)) ==
                Some(current_distance - 1)
            });

        // Distances computed over a different maze.
        current = closer?;
        current_distance -= 1;
        path.push(maze.coordinate(current));
    }

    path.reverse();
    Some(path)
}

/// The longest route of a perfect maze: the furthest cell from an arbitrary cell is one end of
/// it, the furthest cell from that end is the other. Any other maze gets back some long route.
pub fn longest_path<GridIndexType: IndexType>(maze: &Maze<GridIndexType>) -> Option<Vec<Coordinate>> {
    let arbitrary_start = maze.iter().next()?;
    let first_distances = Distances::new(maze, arbitrary_start)?;
    let long_path_start = *first_distances.furthest_points().first()?;

    let distances_from_start = Distances::new(maze, long_path_start)?;
    let end_point = *distances_from_start.furthest_points().first()?;
    shortest_path(maze, &distances_from_start, end_point)
}

/// Shape of the passage graph of a maze: open edges plus tunnels over every cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PassageAnalysis {
    pub cells: usize,
    pub open_edges: usize,
    pub tunnels: usize,
    pub components: usize,
    pub has_cycle: bool,
}

impl PassageAnalysis {
    #[inline]
    pub fn passages(&self) -> usize {
        self.open_edges + self.tunnels
    }

    /// Exactly one route between any two cells.
    pub fn is_perfect(&self) -> bool {
        self.components == 1 && !self.has_cycle && self.passages() + 1 == self.cells
    }
}

pub fn analyse<GridIndexType: IndexType>(maze: &Maze<GridIndexType>) -> PassageAnalysis {
    // Default sized indices, tunnels may push a compact maze past its own index type.
    let node = |cell: NodeIndex<GridIndexType>| NodeIndex::<u32>::new(cell.index());
    let mut passages = UnGraph::<(), ()>::with_capacity(maze.size(), maze.size());
    for _ in maze.cells() {
        let _ = passages.add_node(());
    }

    let grid = maze.graph();
    let open_edges = grid.raw_edges().iter().filter(|edge| edge.weight.open).collect_vec();
    for edge in &open_edges {
        let _ = passages.add_edge(node(edge.source()), node(edge.target()), ());
    }
    for &(a, b) in maze.tunnels() {
        let _ = passages.add_edge(node(a), node(b), ());
    }

    PassageAnalysis {
        cells: maze.size(),
        open_edges: open_edges.len(),
        tunnels: maze.tunnels().len(),
        components: connected_components(&passages),
        has_cycle: is_cyclic_undirected(&passages),
    }
}
