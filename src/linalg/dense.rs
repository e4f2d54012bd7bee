//! Dense direct solver for the warm-start linear system.
//!
//! The restricted Laplacian block is small after symmetry reduction, so a
//! dense LU factorization with partial pivoting keeps the exact-solve
//! contract without a sparse-solver dependency. Singularity surfaces as a
//! vanishing pivot and is reported as [`PileError::SingularSystem`].

use crate::linalg::CsrMatrix;
use crate::pile_error::PileError;

/// Square dense matrix, row-major.
#[derive(Clone, Debug)]
pub struct DenseMatrix {
    n: usize,
    data: Vec<f64>,
}

impl DenseMatrix {
    /// Materialize a square sparse operator.
    pub fn from_csr(m: &CsrMatrix<f64>) -> Result<Self, PileError> {
        if m.rows() != m.cols() {
            return Err(PileError::ShapeMismatch { expected: m.rows(), found: m.cols() });
        }
        let n = m.rows();
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            let (cols, vals) = m.row(i);
            for (c, v) in cols.iter().zip(vals) {
                data[i * n + c] = *v;
            }
        }
        Ok(Self { n, data })
    }

    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    /// Solve `self · x = rhs` by LU with partial pivoting, consuming the
    /// factorization workspace.
    pub fn solve(mut self, mut rhs: Vec<f64>) -> Result<Vec<f64>, PileError> {
        let n = self.n;
        if rhs.len() != n {
            return Err(PileError::ShapeMismatch { expected: n, found: rhs.len() });
        }
        if n == 0 {
            return Err(PileError::SingularSystem);
        }
        let scale = self
            .data
            .iter()
            .fold(0.0f64, |m, v| m.max(v.abs()));
        if scale == 0.0 {
            return Err(PileError::SingularSystem);
        }
        let tiny = scale * f64::EPSILON * n as f64;

        for k in 0..n {
            // pivot row
            let mut p = k;
            let mut best = self.data[k * n + k].abs();
            for i in (k + 1)..n {
                let a = self.data[i * n + k].abs();
                if a > best {
                    best = a;
                    p = i;
                }
            }
            if best <= tiny {
                return Err(PileError::SingularSystem);
            }
            if p != k {
                for j in 0..n {
                    self.data.swap(k * n + j, p * n + j);
                }
                rhs.swap(k, p);
            }
            let pivot = self.data[k * n + k];
            for i in (k + 1)..n {
                let f = self.data[i * n + k] / pivot;
                if f == 0.0 {
                    continue;
                }
                for j in k..n {
                    self.data[i * n + j] -= f * self.data[k * n + j];
                }
                rhs[i] -= f * rhs[k];
            }
        }

        // back substitution
        for k in (0..n).rev() {
            let mut acc = rhs[k];
            for j in (k + 1)..n {
                acc -= self.data[k * n + j] * rhs[j];
            }
            rhs[k] = acc / self.data[k * n + k];
        }
        Ok(rhs)
    }
}
