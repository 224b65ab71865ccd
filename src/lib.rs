//! **mazes** is a perfect maze generation and route finding library over rectangular, hexagonal
//! and tunneled grids.

// `error_chain!` can recurse deeply
#![recursion_limit = "1024"]

#[macro_use]
extern crate error_chain;

pub mod cells;
pub mod config;
pub mod errors;
pub mod generators;
pub mod grid;
pub mod grid_dimensions;
pub mod grid_iterators;
pub mod pathing;
pub mod solvers;
pub mod units;
mod utils;
