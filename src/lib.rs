//! # hyperpile
//!
//! hyperpile simulates the abelian sandpile model on n-dimensional
//! hypercubic lattices. Grains deposited at the origin are redistributed to
//! neighbors whenever a site's height reaches its lattice degree, until every
//! site is stable; the crate exploits the lattice's permutation and
//! reflection symmetries to restrict the expensive relaxation to a
//! fundamental domain, shrinking the grid to a fraction of its size before
//! iterating.
//!
//! ## Features
//! - Exact integer construction of the discrete Laplacian as a Kronecker sum
//! - Symmetry-quotient machinery: permutation/reflection operators and the
//!   expand/collapse maps between the full grid and its fundamental domain
//! - A synchronous fixed-point toppling engine with conserved mass and a
//!   batched convergence check
//! - An optional continuum warm start that trades one direct solve for a
//!   large cut in round count
//! - A driver that sizes the grid from the grain count so the avalanche
//!   stays interior
//!
//! ## Determinism
//!
//! Every stage is a deterministic sparse matrix/vector operation; two runs of
//! the same configuration produce identical piles, spills, and round counts.
//! The optional `rayon` feature parallelizes rows within a relaxation round
//! without changing any result.
//!
//! ## Usage
//! ```rust
//! use hyperpile::sim::{SimConfig, simulate};
//!
//! let report = simulate(&SimConfig {
//!     grains: 256,
//!     dimensions: 2,
//!     ..SimConfig::default()
//! })?;
//! assert_eq!(report.pile.iter().sum::<i64>(), 256);
//! # Ok::<(), hyperpile::pile_error::PileError>(())
//! ```

pub mod lattice;
pub mod linalg;
pub mod pile_error;
pub mod relax;
pub mod sim;
pub mod symmetry;

/// A convenient prelude to import the most-used types & entry points:
pub mod prelude {
    pub use crate::lattice::{Grid, second_difference};
    pub use crate::linalg::CsrMatrix;
    pub use crate::pile_error::PileError;
    pub use crate::relax::{Stabilized, stabilize, warm_start};
    pub use crate::sim::{SimConfig, SimReport, simulate};
    pub use crate::symmetry::{
        ExpandCollapse, canonical_mask, collapse_vector, expand_collapse, permutation_operator,
        reduce_operator, reflection_operator, unfold,
    };
}
