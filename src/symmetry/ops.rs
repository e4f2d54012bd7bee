//! Permutation and reflection operators on flattened grid indices.
//!
//! Every operator is built the same generic way: apply an index rearrangement
//! to the flattened node numbering and emit one nonzero per row mapping the
//! original index to its image, the sparse analogue of transposing or
//! flipping the d-dimensional coordinate array.

use itertools::Itertools;

use crate::lattice::Grid;
use crate::linalg::CsrMatrix;
use crate::pile_error::PileError;

/// Image of `node` under the coordinate transpose by `order`.
///
/// With row-major digits `i_0..i_{d-1}` (axis 0 slowest), the transposed
/// array's flat entry `node` reads the original digit `i_m` at stride
/// `order[m]`.
#[inline]
pub fn transpose_index(grid: &Grid, node: usize, order: &[usize]) -> usize {
    (0..grid.dim())
        .map(|m| grid.axis_index(node, m) * grid.stride(order[m]))
        .sum()
}

/// Image of `node` under the coordinate flip along `axis`.
#[inline]
pub fn flip_index(grid: &Grid, node: usize, axis: usize) -> usize {
    let i = grid.axis_index(node, axis);
    let s = grid.stride(axis);
    node - i * s + (grid.side() - 1 - i) * s
}

fn validate_axis_order(dim: usize, order: &[usize]) -> Result<(), PileError> {
    if order.len() != dim {
        return Err(PileError::InvalidPermutation { dim });
    }
    let mut seen = vec![false; dim];
    for &a in order {
        if a >= dim || seen[a] {
            return Err(PileError::InvalidPermutation { dim });
        }
        seen[a] = true;
    }
    Ok(())
}

/// One 0/1 nonzero per row at `(node, map(node))`, for each map; duplicate
/// coordinates collapse to a single 1.
fn operator_from_maps(grid: &Grid, maps: &[Box<dyn Fn(usize) -> usize + '_>]) -> CsrMatrix<i64> {
    let n = grid.node_count();
    let mut triplets = Vec::with_capacity(n * maps.len());
    for map in maps {
        for node in 0..n {
            triplets.push((node, map(node), 1i64));
        }
    }
    CsrMatrix::from_triplets(n, n, triplets).pattern()
}

/// Sparse operator whose action on a flattened vector reproduces transposing
/// the coordinate array by `order`.
pub fn permutation_operator(grid: &Grid, order: &[usize]) -> Result<CsrMatrix<i64>, PileError> {
    validate_axis_order(grid.dim(), order)?;
    Ok(operator_from_maps(
        grid,
        &[Box::new(move |k| transpose_index(grid, k, order))],
    ))
}

/// Sparse operator reflecting the grid through its center along `axis`.
pub fn reflection_operator(grid: &Grid, axis: usize) -> CsrMatrix<i64> {
    debug_assert!(axis < grid.dim());
    operator_from_maps(grid, &[Box::new(move |k| flip_index(grid, k, axis))])
}

/// Union of the reflection along `axis` with the identity: "this node or its
/// mirror".
pub fn mirror_unfold(grid: &Grid, axis: usize) -> CsrMatrix<i64> {
    debug_assert!(axis < grid.dim());
    operator_from_maps(
        grid,
        &[Box::new(move |k| flip_index(grid, k, axis)), Box::new(|k| k)],
    )
}

/// Union of every axis-permutation image of each node.
pub fn diagonal_unfold(grid: &Grid) -> CsrMatrix<i64> {
    let orders: Vec<Vec<usize>> = (0..grid.dim()).permutations(grid.dim()).collect();
    let maps: Vec<Box<dyn Fn(usize) -> usize + '_>> = orders
        .iter()
        .map(|p| Box::new(move |k| transpose_index(grid, k, p)) as Box<dyn Fn(usize) -> usize + '_>)
        .collect();
    operator_from_maps(grid, &maps)
}

/// The full node-orbit relation under the symmetry group: identity composed
/// with every per-axis mirror union, then with the permutation union, each
/// product collapsed back to 0/1.
pub fn unfold(grid: &Grid) -> CsrMatrix<i64> {
    let mut u = CsrMatrix::identity(grid.node_count());
    for axis in 0..grid.dim() {
        u = u
            .matmul(&mirror_unfold(grid, axis))
            .expect("mirror operators share the grid shape")
            .pattern();
    }
    u.matmul(&diagonal_unfold(grid))
        .expect("permutation union shares the grid shape")
        .pattern()
}
