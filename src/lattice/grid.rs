//! `Grid`: an n-dimensional hypercubic lattice of odd side length.
//!
//! Nodes are flattened row-major with axis 0 slowest; every operator in the
//! crate uses this one ordering. Coordinates are centered so the grid spans
//! `-(n-1)/2 ..= (n-1)/2` along each axis. The grid is immutable once built;
//! the Laplacian and degree vector are materialized on first access into
//! explicit `OnceCell` fields.

use once_cell::sync::OnceCell;

use crate::lattice::laplacian::build_laplacian;
use crate::linalg::CsrMatrix;
use crate::pile_error::PileError;

#[derive(Debug)]
pub struct Grid {
    side: usize,
    dim: usize,
    /// Per-axis centered coordinate of every node: `coords[axis][node]`.
    coords: Vec<Vec<i64>>,
    /// Euclidean distance of every node from the grid center.
    radius: Vec<f64>,
    laplacian: OnceCell<CsrMatrix<i64>>,
    degree: OnceCell<Vec<i64>>,
}

impl Grid {
    /// Build a grid with `dim` axes of odd side length `side`.
    ///
    /// # Errors
    /// `InvalidDimension` if `dim < 1`; `InvalidSize` if `side` is even,
    /// zero, or `side^dim` does not fit in `usize`.
    pub fn new(side: usize, dim: usize) -> Result<Self, PileError> {
        if dim < 1 {
            return Err(PileError::InvalidDimension(dim));
        }
        if side < 1 || side % 2 == 0 {
            return Err(PileError::InvalidSize(side));
        }
        let mut len = 1usize;
        for _ in 0..dim {
            len = len
                .checked_mul(side)
                .ok_or(PileError::InvalidSize(side))?;
        }

        let half = ((side - 1) / 2) as i64;
        let mut coords = vec![vec![0i64; len]; dim];
        for node in 0..len {
            let mut rem = node;
            for axis in (0..dim).rev() {
                coords[axis][node] = (rem % side) as i64 - half;
                rem /= side;
            }
        }
        let radius = (0..len)
            .map(|node| {
                let sq: i64 = coords.iter().map(|x| x[node] * x[node]).sum();
                (sq as f64).sqrt()
            })
            .collect();

        Ok(Self {
            side,
            dim,
            coords,
            radius,
            laplacian: OnceCell::new(),
            degree: OnceCell::new(),
        })
    }

    #[inline]
    pub fn side(&self) -> usize {
        self.side
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Total node count, `side^dim`.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.radius.len()
    }

    /// Flattening stride of `axis`: `side^(dim - 1 - axis)`.
    #[inline]
    pub fn stride(&self, axis: usize) -> usize {
        self.side.pow((self.dim - 1 - axis) as u32)
    }

    /// The (uncentered) index of `node` along `axis`, in `0..side`.
    #[inline]
    pub fn axis_index(&self, node: usize, axis: usize) -> usize {
        (node / self.stride(axis)) % self.side
    }

    /// Centered coordinates of all nodes along `axis`.
    #[inline]
    pub fn coords(&self, axis: usize) -> &[i64] {
        &self.coords[axis]
    }

    #[inline]
    pub fn radius(&self) -> &[f64] {
        &self.radius
    }

    /// The discrete Laplacian over all nodes, built once on first access.
    pub fn laplacian(&self) -> &CsrMatrix<i64> {
        self.laplacian.get_or_init(|| build_laplacian(self))
    }

    /// Per-node lattice degree: the negated Laplacian diagonal, `2·dim`
    /// everywhere (the lattice is open, boundary rows keep the interior
    /// diagonal).
    pub fn degree(&self) -> &[i64] {
        self.degree
            .get_or_init(|| self.laplacian().diagonal().iter().map(|d| -d).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_construction() {
        assert_eq!(Grid::new(9, 0).unwrap_err(), PileError::InvalidDimension(0));
        assert_eq!(Grid::new(8, 2).unwrap_err(), PileError::InvalidSize(8));
        assert_eq!(Grid::new(0, 2).unwrap_err(), PileError::InvalidSize(0));
    }

    #[test]
    fn coordinates_are_centered() {
        let g = Grid::new(5, 2).unwrap();
        assert_eq!(g.node_count(), 25);
        assert_eq!(g.coords(0).iter().min(), Some(&-2));
        assert_eq!(g.coords(0).iter().max(), Some(&2));
        // axis 0 is slowest: first row of 5 nodes shares coordinate -2.
        assert!(g.coords(0)[..5].iter().all(|&c| c == -2));
        assert_eq!(&g.coords(1)[..5], &[-2, -1, 0, 1, 2]);
    }

    #[test]
    fn center_node_has_zero_radius() {
        let g = Grid::new(9, 2).unwrap();
        let center = g.node_count() / 2;
        assert_eq!(g.radius()[center], 0.0);
        assert_eq!(g.radius().iter().filter(|&&r| r == 0.0).count(), 1);
    }

    #[test]
    fn axis_index_round_trips() {
        let g = Grid::new(3, 3).unwrap();
        for node in 0..g.node_count() {
            let rebuilt: usize = (0..3).map(|a| g.axis_index(node, a) * g.stride(a)).sum();
            assert_eq!(rebuilt, node);
        }
    }

    #[test]
    fn degree_is_twice_the_dimension() {
        let g = Grid::new(5, 3).unwrap();
        assert!(g.degree().iter().all(|&d| d == 6));
    }
}
