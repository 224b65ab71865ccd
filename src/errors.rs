// Create the Error, ErrorKind, ResultExt, and Result types
// Result is a typedef of std `Result` with the error type our own `Error`
// Defines the From conversions that let `?` work for our `Error`.
use crate::cells::{Coordinate, TopologyKind};

error_chain! {
    errors {
        UnsupportedTopology(algorithm: &'static str, topology: TopologyKind) {
            description("maze topology not supported by the algorithm")
            display("{} does not support {:?} mazes", algorithm, topology)
        }
        InvalidDimensions(rows: usize, columns: usize) {
            description("invalid maze dimensions")
            display("invalid maze dimensions: {} rows by {} columns", rows, columns)
        }
        GridTooLarge(cells: usize, edges: usize) {
            description("maze does not fit the graph index type")
            display("{} cells and {} edges do not fit the graph index type", cells, edges)
        }
        InvalidCoordinate(coord: Coordinate) {
            description("coordinate outside of the maze")
            display("coordinate {:?} is outside of the maze", coord)
        }
        InvalidTunnel(a: Coordinate, b: Coordinate, reason: &'static str) {
            description("invalid tunnel")
            display("cannot tunnel between {:?} and {:?}: {}", a, b, reason)
        }
        NotAdjacent(a: Coordinate, b: Coordinate) {
            description("cells are not grid neighbours")
            display("{:?} and {:?} are not grid neighbours", a, b)
        }
        InvalidThreshold(threshold: f64) {
            description("selection threshold outside of [0, 1]")
            display("selection threshold {} is outside of [0, 1]", threshold)
        }
        Disconnected(visited: usize, total: usize) {
            description("maze has cells unreachable from the starting cell")
            display("only {} of {} cells were reachable", visited, total)
        }
    }
}
