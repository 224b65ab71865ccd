use std::fmt;

use petgraph::graph::{EdgeIndex, NodeIndex, NodeIndices};
pub use petgraph::graph::IndexType;
use petgraph::{Graph, Undirected};
use rand::Rng;
use smallvec::SmallVec;

use crate::cells::{Coordinate, Direction, TopologyKind};
use crate::errors::*;
use crate::grid_dimensions::GridDimensions;
use crate::grid_iterators::CellIter;
use crate::units::{ColumnsCount, EdgesCount, NodesCount, RowsCount};

/// Wall state of the boundary between two grid adjacent cells.
///
/// There is exactly one `Edge` per pair of neighbours, living in the maze's edge arena. Both
/// cells refer to it by index from their facing direction slots, so opening it from either side
/// opens it for both.
#[derive(Eq, PartialEq, Copy, Clone, Debug, Default)]
pub struct Edge {
    pub open: bool,
}

/// One direction slot of a cell: the neighbour that way and the edge shared with it.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub struct Slot<Ix: IndexType = u32> {
    pub neighbour: NodeIndex<Ix>,
    pub edge: EdgeIndex<Ix>,
}

pub type CellSmallVec<Ix> = SmallVec<[NodeIndex<Ix>; 8]>;

#[derive(Clone, Debug)]
struct CellLinks<Ix: IndexType> {
    // `num_dir` entries, None where the neighbour would be out of bounds.
    slots: SmallVec<[Option<Slot<Ix>>; 6]>,
    tunnel: Option<NodeIndex<Ix>>,
}

/// A maze over one of the grid topologies.
///
/// Cells are the nodes of a petgraph graph (weighted with their coordinate) and every pair of
/// grid neighbours is joined by one graph edge holding the shared `Edge` wall state. The maze
/// starts fully walled; generators open edges, solvers only read them.
#[derive(Clone)]
pub struct Maze<GridIndexType: IndexType = u32> {
    graph: Graph<Coordinate, Edge, Undirected, GridIndexType>,
    links: Vec<CellLinks<GridIndexType>>,
    dimensions: GridDimensions,
    entrance: NodeIndex<GridIndexType>,
    exit: NodeIndex<GridIndexType>,
    tunnels: Vec<(NodeIndex<GridIndexType>, NodeIndex<GridIndexType>)>,
}

impl<GridIndexType: IndexType> fmt::Debug for Maze<GridIndexType> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f,
               "Maze :: kind: {:?}, rows: {:?}, columns: {:?}, open edges: {}/{}, tunnels: {}",
               self.kind(),
               self.dimensions.rows(),
               self.dimensions.columns(),
               self.open_edges_count(),
               self.edges_count(),
               self.tunnels.len())
    }
}

impl<GridIndexType: IndexType> Maze<GridIndexType> {
    /// Build a fully walled maze.
    pub fn new(dimensions: GridDimensions,
               entrance: Coordinate,
               exit: Coordinate)
               -> Result<Maze<GridIndexType>> {

        let (NodesCount(nodes), EdgesCount(edges)) = dimensions.graph_size();

        // petgraph reserves the maximum index value as its "no index" marker.
        let index_limit = <GridIndexType as IndexType>::max().index();
        if nodes >= index_limit || edges >= index_limit {
            bail!(ErrorKind::GridTooLarge(nodes, edges));
        }
        for &coord in &[entrance, exit] {
            if !dimensions.is_valid_coordinate(coord) {
                bail!(ErrorKind::InvalidCoordinate(coord));
            }
        }

        let kind = dimensions.kind();
        let mut graph = Graph::with_capacity(nodes, edges);
        for coord in CellIter::new(dimensions) {
            let _ = graph.add_node(coord);
        }

        let empty_links = CellLinks {
            slots: SmallVec::from_elem(None, kind.num_dir()),
            tunnel: None,
        };
        let mut links = vec![empty_links; nodes];

        for index in 0..nodes {
            let coord = graph[NodeIndex::new(index)];
            for (slot, dir) in kind.directions().iter().enumerate() {
                let neighbour_index = coord.offset(*dir)
                    .and_then(|c| dimensions.coordinate_to_index(c));

                // Lower indexed neighbours already created the shared edge.
                if let Some(n) = neighbour_index.filter(|&n| n > index) {
                    let (a, b) = (NodeIndex::new(index), NodeIndex::new(n));
                    let edge = graph.add_edge(a, b, Edge::default());
                    links[index].slots[slot] = Some(Slot { neighbour: b, edge });
                    links[n].slots[kind.opposite_slot(slot)] = Some(Slot { neighbour: a, edge });
                }
            }
        }

        let to_node = |coord| {
            dimensions.coordinate_to_index(coord)
                .map(NodeIndex::new)
                .ok_or_else(|| Error::from(ErrorKind::InvalidCoordinate(coord)))
        };

        Ok(Maze {
            graph,
            links,
            dimensions,
            entrance: to_node(entrance)?,
            exit: to_node(exit)?,
            tunnels: vec![],
        })
    }

    /// Join two cells that are not grid neighbours with a tunnel.
    pub fn add_tunnel(&mut self, a: Coordinate, b: Coordinate) -> Result<()> {
        if !self.kind().supports_tunnels() {
            bail!(ErrorKind::UnsupportedTopology("tunnels", self.kind()));
        }
        let (a_cell, b_cell) = match (self.cell(a), self.cell(b)) {
            (Some(a_cell), Some(b_cell)) => (a_cell, b_cell),
            _ => bail!(ErrorKind::InvalidTunnel(a, b, "endpoint outside of the maze")),
        };
        if a_cell == b_cell {
            bail!(ErrorKind::InvalidTunnel(a, b, "both ends are the same cell"));
        }
        if self.edge_between(a_cell, b_cell).is_some() {
            bail!(ErrorKind::InvalidTunnel(a, b, "cells are already grid neighbours"));
        }
        if self.tunnel(a_cell).is_some() || self.tunnel(b_cell).is_some() {
            bail!(ErrorKind::InvalidTunnel(a, b, "a cell can only have one tunnel"));
        }

        self.links[a_cell.index()].tunnel = Some(b_cell);
        self.links[b_cell.index()].tunnel = Some(a_cell);
        self.tunnels.push((a_cell, b_cell));
        Ok(())
    }

    #[inline]
    pub fn kind(&self) -> TopologyKind {
        self.dimensions.kind()
    }

    #[inline]
    pub fn dimensions(&self) -> &GridDimensions {
        &self.dimensions
    }

    /// Number of cells.
    #[inline]
    pub fn size(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of grid edges, open or not.
    #[inline]
    pub fn edges_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn open_edges_count(&self) -> usize {
        self.graph.edge_weights().filter(|edge| edge.open).count()
    }

    #[inline]
    pub fn entrance(&self) -> Coordinate {
        self.graph[self.entrance]
    }

    #[inline]
    pub fn exit(&self) -> Coordinate {
        self.graph[self.exit]
    }

    #[inline]
    pub fn entrance_cell(&self) -> NodeIndex<GridIndexType> {
        self.entrance
    }

    #[inline]
    pub fn exit_cell(&self) -> NodeIndex<GridIndexType> {
        self.exit
    }

    /// Convert a grid coordinate into a cell id.
    /// Returns None if the grid coordinate is invalid (out of the grid's dimensions).
    #[inline]
    pub fn cell(&self, coord: Coordinate) -> Option<NodeIndex<GridIndexType>> {
        self.dimensions.coordinate_to_index(coord).map(NodeIndex::new)
    }

    /// Panics if the cell id does not belong to this maze.
    #[inline]
    pub fn coordinate(&self, cell: NodeIndex<GridIndexType>) -> Coordinate {
        self.graph[cell]
    }

    #[inline]
    pub fn cells(&self) -> NodeIndices<GridIndexType> {
        self.graph.node_indices()
    }

    #[inline]
    pub fn iter(&self) -> CellIter {
        CellIter::new(self.dimensions)
    }

    #[inline]
    pub fn random_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> NodeIndex<GridIndexType> {
        NodeIndex::new(rng.gen_range(0..self.size()))
    }

    #[inline]
    pub fn slot(&self, cell: NodeIndex<GridIndexType>, slot: usize) -> Option<Slot<GridIndexType>> {
        self.links[cell.index()].slots.get(slot).and_then(|s| *s)
    }

    /// The occupied direction slots of a cell, as (slot index, slot) pairs.
    pub fn slots<'a>(&'a self,
                     cell: NodeIndex<GridIndexType>)
                     -> impl Iterator<Item = (usize, Slot<GridIndexType>)> + 'a {
        self.links[cell.index()]
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.map(|s| (index, s)))
    }

    /// Cells that are grid neighbours of a cell, but not necessarily linked by a passage.
    pub fn neighbours(&self, cell: NodeIndex<GridIndexType>) -> CellSmallVec<GridIndexType> {
        self.slots(cell).map(|(_, slot)| slot.neighbour).collect()
    }

    pub fn neighbour_at_direction(&self,
                                  cell: NodeIndex<GridIndexType>,
                                  direction: Direction)
                                  -> Option<NodeIndex<GridIndexType>> {
        self.kind()
            .slot_of(direction)
            .and_then(|slot| self.slot(cell, slot))
            .map(|slot| slot.neighbour)
    }

    #[inline]
    pub fn tunnel(&self, cell: NodeIndex<GridIndexType>) -> Option<NodeIndex<GridIndexType>> {
        self.links[cell.index()].tunnel
    }

    #[inline]
    pub fn tunnels(&self) -> &[(NodeIndex<GridIndexType>, NodeIndex<GridIndexType>)] {
        &self.tunnels
    }

    #[inline]
    pub fn is_edge_open(&self, edge: EdgeIndex<GridIndexType>) -> bool {
        self.graph[edge].open
    }

    #[inline]
    pub fn open_edge(&mut self, edge: EdgeIndex<GridIndexType>) {
        self.graph[edge].open = true;
    }

    /// Is there a passage out of the cell through the given direction slot?
    #[inline]
    pub fn is_slot_open(&self, cell: NodeIndex<GridIndexType>, slot: usize) -> bool {
        self.slot(cell, slot).map_or(false, |s| self.is_edge_open(s.edge))
    }

    pub fn is_open(&self, cell: NodeIndex<GridIndexType>, direction: Direction) -> bool {
        self.kind().slot_of(direction).map_or(false, |slot| self.is_slot_open(cell, slot))
    }

    /// Cells reachable in one step: through an open edge or the cell's tunnel.
    pub fn passages(&self, cell: NodeIndex<GridIndexType>) -> CellSmallVec<GridIndexType> {
        let mut reachable: CellSmallVec<GridIndexType> = self.slots(cell)
            .filter(|(_, slot)| self.is_edge_open(slot.edge))
            .map(|(_, slot)| slot.neighbour)
            .collect();
        reachable.extend(self.tunnel(cell));
        reachable
    }

    /// Walled on all grid sides. A tunnel does not count as a way out.
    pub fn is_dead_end(&self, cell: NodeIndex<GridIndexType>) -> bool {
        self.slots(cell).all(|(_, slot)| !self.is_edge_open(slot.edge))
    }

    /// Are two grid adjacent cells linked by an open edge?
    pub fn is_linked(&self, a: Coordinate, b: Coordinate) -> bool {
        match (self.cell(a), self.cell(b)) {
            (Some(a_cell), Some(b_cell)) => {
                self.edge_between(a_cell, b_cell).map_or(false, |edge| self.is_edge_open(edge))
            }
            _ => false,
        }
    }

    /// Carve a passage between two grid neighbours.
    pub fn link(&mut self, a: Coordinate, b: Coordinate) -> Result<()> {
        let edge = self.edge_between_coordinates(a, b)?;
        self.open_edge(edge);
        Ok(())
    }

    /// Rebuild the wall between two grid neighbours. Returns true if there was a passage.
    pub fn unlink(&mut self, a: Coordinate, b: Coordinate) -> Result<bool> {
        let edge = self.edge_between_coordinates(a, b)?;
        let was_open = self.is_edge_open(edge);
        self.graph[edge].open = false;
        Ok(was_open)
    }

    /// Close every edge, back to the freshly built state. Tunnels are kept.
    pub fn reset(&mut self) {
        for edge in self.graph.edge_weights_mut() {
            edge.open = false;
        }
    }

    /// Coordinate pairs of every open edge.
    pub fn iter_links<'a>(&'a self) -> impl Iterator<Item = (Coordinate, Coordinate)> + 'a {
        self.graph
            .raw_edges()
            .iter()
            .filter(|edge| edge.weight.open)
            .map(move |edge| (self.graph[edge.source()], self.graph[edge.target()]))
    }

    pub(crate) fn graph(&self) -> &Graph<Coordinate, Edge, Undirected, GridIndexType> {
        &self.graph
    }

    fn edge_between(&self,
                    a: NodeIndex<GridIndexType>,
                    b: NodeIndex<GridIndexType>)
                    -> Option<EdgeIndex<GridIndexType>> {
        self.slots(a).find(|(_, slot)| slot.neighbour == b).map(|(_, slot)| slot.edge)
    }

    fn edge_between_coordinates(&self, a: Coordinate, b: Coordinate) -> Result<EdgeIndex<GridIndexType>> {
        let a_cell = self.cell(a).ok_or(ErrorKind::InvalidCoordinate(a))?;
        let b_cell = self.cell(b).ok_or(ErrorKind::InvalidCoordinate(b))?;
        self.edge_between(a_cell, b_cell).ok_or_else(|| ErrorKind::NotAdjacent(a, b).into())
    }
}

/// Consuming builder for a fully walled maze.
///
/// The entrance defaults to the first cell and the exit to the last cell in row major order.
#[derive(Debug, Clone)]
pub struct MazeBuilder {
    kind: TopologyKind,
    rows: RowsCount,
    columns: ColumnsCount,
    entrance: Option<Coordinate>,
    exit: Option<Coordinate>,
    tunnels: Vec<(Coordinate, Coordinate)>,
}

impl MazeBuilder {
    pub fn new(kind: TopologyKind, rows: RowsCount, columns: ColumnsCount) -> MazeBuilder {
        MazeBuilder {
            kind,
            rows,
            columns,
            entrance: None,
            exit: None,
            tunnels: vec![],
        }
    }

    pub fn entrance(mut self, entrance: Coordinate) -> MazeBuilder {
        self.entrance = Some(entrance);
        self
    }

    pub fn exit(mut self, exit: Coordinate) -> MazeBuilder {
        self.exit = Some(exit);
        self
    }

    pub fn tunnel(mut self, a: Coordinate, b: Coordinate) -> MazeBuilder {
        self.tunnels.push((a, b));
        self
    }

    pub fn build<GridIndexType: IndexType>(&self) -> Result<Maze<GridIndexType>> {
        let dimensions = GridDimensions::new(self.kind, self.rows, self.columns)?;
        let entrance = self.entrance.unwrap_or_else(|| Coordinate::new(0, 0));
        let exit = self.exit.unwrap_or_else(|| dimensions.last_coordinate());

        let mut maze = Maze::new(dimensions, entrance, exit)?;
        for &(a, b) in &self.tunnels {
            maze.add_tunnel(a, b)?;
        }
        Ok(maze)
    }
}
