//! Hypercubic lattice topology: grids, coordinates, and the discrete
//! Laplacian.

pub mod grid;
pub mod laplacian;

pub use grid::Grid;
pub use laplacian::{axis_operator, second_difference};
