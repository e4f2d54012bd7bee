//! Fundamental domain and the expand/collapse projections.
//!
//! The canonical orientation of a node has all coordinates non-negative and
//! weakly decreasing in axis index; exactly one node per orbit satisfies it.
//! `collapse` restricts a full-grid vector to those representatives and
//! `expand` broadcasts representative values back over their orbits, so
//! `collapse · expand` is the identity on the fundamental domain and a
//! full-grid operator `L` reduces to `collapse · L · expand` (valid because
//! the symmetry group is an automorphism group of the Laplacian's adjacency).

use crate::lattice::Grid;
use crate::linalg::CsrMatrix;
use crate::pile_error::PileError;
use crate::symmetry::ops::unfold;

/// The expand/collapse pair and the mask that defines them.
#[derive(Clone, Debug)]
pub struct ExpandCollapse {
    /// Fundamental domain → full grid; one nonzero per full-grid row.
    pub expand: CsrMatrix<i64>,
    /// Full grid → fundamental domain; identity rows at mask positions.
    pub collapse: CsrMatrix<i64>,
    /// True exactly at canonical-orientation nodes.
    pub mask: Vec<bool>,
}

/// Boolean mask of canonical-orientation nodes: every coordinate
/// non-negative, coordinates weakly decreasing in axis index.
pub fn canonical_mask(grid: &Grid) -> Vec<bool> {
    let n = grid.node_count();
    let mut mask = vec![true; n];
    for axis in 0..grid.dim() {
        let x = grid.coords(axis);
        for node in 0..n {
            mask[node] &= x[node] >= 0;
        }
    }
    for i in 0..grid.dim() {
        for j in (i + 1)..grid.dim() {
            let (xi, xj) = (grid.coords(i), grid.coords(j));
            for node in 0..n {
                mask[node] &= xi[node] >= xj[node];
            }
        }
    }
    mask
}

/// Build the expand and collapse operators. With `apply_mask` false the
/// unsliced operators are returned (expand is the full orbit relation,
/// collapse the identity), which is occasionally useful for inspecting
/// orbits.
pub fn expand_collapse(grid: &Grid, apply_mask: bool) -> ExpandCollapse {
    let mask = canonical_mask(grid);
    let mut expand = unfold(grid);
    let mut collapse = CsrMatrix::identity(grid.node_count());
    if apply_mask {
        expand = expand
            .select_cols(&mask)
            .expect("mask length matches the grid");
        collapse = collapse
            .select_rows(&mask)
            .expect("mask length matches the grid");
    }
    ExpandCollapse { expand, collapse, mask }
}

/// Reduce a full-grid operator to the fundamental domain:
/// `collapse · op · expand`.
pub fn reduce_operator(
    ec: &ExpandCollapse,
    op: &CsrMatrix<i64>,
) -> Result<CsrMatrix<i64>, PileError> {
    ec.collapse.matmul(op)?.matmul(&ec.expand)
}

/// Restrict a per-node vector to the masked entries, in node order. The
/// action of `collapse` on a vector, without the sparse product.
pub fn collapse_vector<T: Copy>(mask: &[bool], v: &[T]) -> Result<Vec<T>, PileError> {
    if v.len() != mask.len() {
        return Err(PileError::ShapeMismatch { expected: mask.len(), found: v.len() });
    }
    Ok(mask
        .iter()
        .zip(v)
        .filter_map(|(&keep, &x)| keep.then_some(x))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_selects_one_representative_per_orbit() {
        let g = Grid::new(3, 2).unwrap();
        let mask = canonical_mask(&g);
        // (0,0), (1,0), (1,1) in centered coordinates
        let kept: Vec<usize> = (0..9).filter(|&k| mask[k]).collect();
        assert_eq!(kept.len(), 3);
        for &k in &kept {
            assert!(g.coords(0)[k] >= g.coords(1)[k] && g.coords(1)[k] >= 0);
        }
    }

    #[test]
    fn collapse_expand_is_identity_on_the_domain() {
        let g = Grid::new(5, 2).unwrap();
        let ec = expand_collapse(&g, true);
        let m = ec.mask.iter().filter(|&&b| b).count();
        assert_eq!(ec.expand.rows(), 25);
        assert_eq!(ec.expand.cols(), m);
        assert_eq!(ec.collapse.rows(), m);
        let prod = ec.collapse.matmul(&ec.expand).unwrap();
        assert_eq!(prod, CsrMatrix::identity(m));
    }

    #[test]
    fn every_full_grid_row_is_covered_exactly_once() {
        let g = Grid::new(5, 3).unwrap();
        let ec = expand_collapse(&g, true);
        for node in 0..g.node_count() {
            assert_eq!(ec.expand.row(node).0.len(), 1, "node {node}");
        }
    }

    #[test]
    fn orbit_constant_fields_round_trip() {
        let g = Grid::new(5, 2).unwrap();
        let ec = expand_collapse(&g, true);
        // squared radius is integer-valued and constant on orbits
        let r2: Vec<i64> = (0..g.node_count())
            .map(|k| (0..g.dim()).map(|a| g.coords(a)[k].pow(2)).sum())
            .collect();
        let reduced = collapse_vector(&ec.mask, &r2).unwrap();
        let back = ec.expand.mul_vec(&reduced).unwrap();
        assert_eq!(back, r2);
    }

    #[test]
    fn unmasked_operators_are_unsliced() {
        let g = Grid::new(3, 2).unwrap();
        let ec = expand_collapse(&g, false);
        assert_eq!(ec.collapse, CsrMatrix::identity(9));
        assert_eq!(ec.expand.rows(), 9);
        assert_eq!(ec.expand.cols(), 9);
    }

    #[test]
    fn reduced_laplacian_preserves_orbit_dynamics() {
        // L_reduced acting on a collapsed orbit-constant vector agrees with
        // collapsing L's full-grid action.
        let g = Grid::new(5, 2).unwrap();
        let ec = expand_collapse(&g, true);
        let l_red = reduce_operator(&ec, g.laplacian()).unwrap();
        let r2: Vec<i64> = (0..g.node_count())
            .map(|k| (0..g.dim()).map(|a| g.coords(a)[k].pow(2)).sum())
            .collect();
        let full = g.laplacian().mul_vec(&r2).unwrap();
        let lhs = l_red
            .mul_vec(&collapse_vector(&ec.mask, &r2).unwrap())
            .unwrap();
        assert_eq!(lhs, collapse_vector(&ec.mask, &full).unwrap());
    }
}
