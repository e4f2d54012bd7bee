//! Discrete Laplacian assembly: Kronecker sum of 1-D second differences.
//!
//! All arithmetic is exact integer arithmetic; the entries are the small
//! weights of the lattice graph (`-2·dim` diagonal, `+1` between axis
//! neighbors), never floating point.

use crate::lattice::Grid;
use crate::linalg::CsrMatrix;

/// The 1-D second-difference operator: tridiagonal `1, -2, 1`.
pub fn second_difference(n: usize) -> CsrMatrix<i64> {
    let mut triplets = Vec::with_capacity(3 * n);
    for i in 0..n {
        if i > 0 {
            triplets.push((i, i - 1, 1));
        }
        triplets.push((i, i, -2));
        if i + 1 < n {
            triplets.push((i, i + 1, 1));
        }
    }
    CsrMatrix::from_triplets(n, n, triplets)
}

/// Embed a 1-D operator on `axis` of the grid: the Kronecker product with
/// identities on every other axis, leftmost factor slowest.
pub fn axis_operator(grid: &Grid, op: &CsrMatrix<i64>, axis: usize) -> CsrMatrix<i64> {
    let eye = CsrMatrix::identity(grid.side());
    let mut out = CsrMatrix::identity(1);
    for a in 0..grid.dim() {
        out = out.kron(if a == axis { op } else { &eye });
    }
    out
}

pub(crate) fn build_laplacian(grid: &Grid) -> CsrMatrix<i64> {
    let d2 = second_difference(grid.side());
    let mut acc = axis_operator(grid, &d2, 0);
    for axis in 1..grid.dim() {
        acc = acc
            .add(&axis_operator(grid, &d2, axis))
            .expect("axis operators share the grid shape");
    }
    acc
}
