//! PileError: Unified error type for hyperpile public APIs
//!
//! Every fallible operation in the crate reports through this enum so callers
//! get non-panicking, descriptive errors at the API boundary rather than
//! faults mid-algorithm.

use thiserror::Error;

/// Unified error type for hyperpile operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PileError {
    /// Grid dimension must be at least 1.
    #[error("grid dimension must be >= 1, got {0}")]
    InvalidDimension(usize),
    /// Grid side length must be odd and at least 1.
    #[error("grid side length must be odd and >= 1, got {0}")]
    InvalidSize(usize),
    /// A vector or operator dimension disagrees with its peer.
    #[error("shape mismatch: expected {expected}, found {found}")]
    ShapeMismatch { expected: usize, found: usize },
    /// A non-positive topple threshold makes the relaxation ill-defined.
    #[error("degree at node {node} must be positive, got {value}")]
    InvalidDegree { node: usize, value: i64 },
    /// The convergence-check batching interval must be at least 1.
    #[error("check interval must be >= 1")]
    InvalidCheckInterval,
    /// An axis permutation was not a bijection on `0..dim`.
    #[error("axis order is not a permutation of 0..{dim}")]
    InvalidPermutation { dim: usize },
    /// The restricted warm-start system has no solution (empty or degenerate
    /// target region, or a numerically singular pivot).
    #[error("warm-start system is singular or degenerate")]
    SingularSystem,
    /// Grain count for a simulation must be at least 1.
    #[error("grain count must be >= 1, got {0}")]
    InvalidGrainCount(i64),
    /// No built-in critical density for this dimension; supply an override.
    #[error("no critical density known for dimension {0}; set one explicitly")]
    UnknownCriticalDensity(usize),
}
