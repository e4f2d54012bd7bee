//! Symmetry quotient machinery for the hypercubic lattice.
//!
//! The point group acting here is generated by axis permutations and
//! single-axis reflections through the grid center (the hyperoctahedral
//! group). [`ops`] builds the individual operators and the orbit relation;
//! [`quotient`] derives the fundamental-domain mask and the expand/collapse
//! projections between the full grid and its quotient.

pub mod ops;
pub mod quotient;

pub use ops::{
    diagonal_unfold, flip_index, mirror_unfold, permutation_operator, reflection_operator,
    transpose_index, unfold,
};
pub use quotient::{ExpandCollapse, canonical_mask, collapse_vector, expand_collapse, reduce_operator};
