//! Compressed Sparse Row matrices over an integer or float scalar.
//!
//! Immutable after construction, with deterministic entry order: within each
//! row the column indices are strictly increasing, and every stored value is
//! nonzero. All composite constructors (triplet merge, products, sums,
//! slices) preserve both properties, so equality on two `CsrMatrix` values is
//! structural equality of the operators they represent.

use num_traits::{Num, NumAssignOps};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::pile_error::PileError;

/// Sparse matrix in CSR form.
///
/// `row_ptr` has `rows + 1` entries; row `i` occupies the half-open range
/// `row_ptr[i]..row_ptr[i + 1]` of `col_idx`/`values`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CsrMatrix<T> {
    rows: usize,
    cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<T>,
}

impl<T> CsrMatrix<T>
where
    T: Copy + Num + NumAssignOps + Send + Sync,
{
    /// Build from coordinate triplets `(row, col, value)`.
    ///
    /// Duplicate coordinates are summed (the COO convention); entries that
    /// sum to zero are dropped. Out-of-range indices are a programming error
    /// in the caller and only checked in debug builds.
    pub fn from_triplets(rows: usize, cols: usize, mut triplets: Vec<(usize, usize, T)>) -> Self {
        triplets.sort_unstable_by_key(|&(r, c, _)| (r, c));
        let mut merged: Vec<(usize, usize, T)> = Vec::with_capacity(triplets.len());
        for (r, c, v) in triplets {
            debug_assert!(r < rows && c < cols, "triplet ({r},{c}) out of {rows}x{cols}");
            match merged.last_mut() {
                Some(last) if last.0 == r && last.1 == c => last.2 += v,
                _ => merged.push((r, c, v)),
            }
        }
        merged.retain(|&(_, _, v)| v != T::zero());

        let mut row_ptr = vec![0usize; rows + 1];
        for &(r, _, _) in &merged {
            row_ptr[r + 1] += 1;
        }
        for i in 0..rows {
            row_ptr[i + 1] += row_ptr[i];
        }
        let mut col_idx = Vec::with_capacity(merged.len());
        let mut values = Vec::with_capacity(merged.len());
        for (_, c, v) in merged {
            col_idx.push(c);
            values.push(v);
        }
        Self { rows, cols, row_ptr, col_idx, values }
    }

    /// The `n × n` identity operator.
    pub fn identity(n: usize) -> Self {
        Self {
            rows: n,
            cols: n,
            row_ptr: (0..=n).collect(),
            col_idx: (0..n).collect(),
            values: vec![T::one(); n],
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Column indices and values of row `i`.
    #[inline]
    pub fn row(&self, i: usize) -> (&[usize], &[T]) {
        let lo = self.row_ptr[i];
        let hi = self.row_ptr[i + 1];
        (&self.col_idx[lo..hi], &self.values[lo..hi])
    }

    #[inline]
    fn row_dot(&self, i: usize, x: &[T]) -> T {
        let (cols, vals) = self.row(i);
        let mut acc = T::zero();
        for (c, v) in cols.iter().zip(vals) {
            acc += *v * x[*c];
        }
        acc
    }

    /// `self · x`, checking the vector length at the boundary.
    pub fn mul_vec(&self, x: &[T]) -> Result<Vec<T>, PileError> {
        if x.len() != self.cols {
            return Err(PileError::ShapeMismatch { expected: self.cols, found: x.len() });
        }
        let mut out = vec![T::zero(); self.rows];
        self.mul_vec_into(x, &mut out);
        Ok(out)
    }

    /// `self · x` into a caller-owned buffer. The relaxation hot path; rows
    /// are independent, so with the `rayon` feature they run in parallel.
    pub fn mul_vec_into(&self, x: &[T], out: &mut [T]) {
        debug_assert_eq!(x.len(), self.cols);
        debug_assert_eq!(out.len(), self.rows);
        #[cfg(feature = "rayon")]
        out.par_iter_mut()
            .enumerate()
            .for_each(|(i, o)| *o = self.row_dot(i, x));
        #[cfg(not(feature = "rayon"))]
        for (i, o) in out.iter_mut().enumerate() {
            *o = self.row_dot(i, x);
        }
    }

    /// Sparse matrix product `self · rhs`.
    pub fn matmul(&self, rhs: &Self) -> Result<Self, PileError> {
        if self.cols != rhs.rows {
            return Err(PileError::ShapeMismatch { expected: self.cols, found: rhs.rows });
        }
        let mut row_ptr = vec![0usize; self.rows + 1];
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        // Dense accumulator with an explicit touched-set so legitimate zero
        // partial sums are not confused with untouched slots.
        let mut acc = vec![T::zero(); rhs.cols];
        let mut mark = vec![false; rhs.cols];
        let mut touched: Vec<usize> = Vec::new();
        for i in 0..self.rows {
            let (acols, avals) = self.row(i);
            for (j, a) in acols.iter().zip(avals) {
                let (bcols, bvals) = rhs.row(*j);
                for (c, b) in bcols.iter().zip(bvals) {
                    if mark[*c] {
                        acc[*c] += *a * *b;
                    } else {
                        mark[*c] = true;
                        acc[*c] = *a * *b;
                        touched.push(*c);
                    }
                }
            }
            touched.sort_unstable();
            for &c in &touched {
                if acc[c] != T::zero() {
                    col_idx.push(c);
                    values.push(acc[c]);
                }
                acc[c] = T::zero();
                mark[c] = false;
            }
            touched.clear();
            row_ptr[i + 1] = col_idx.len();
        }
        Ok(Self { rows: self.rows, cols: rhs.cols, row_ptr, col_idx, values })
    }

    /// Entrywise sum `self + rhs`.
    pub fn add(&self, rhs: &Self) -> Result<Self, PileError> {
        if self.rows != rhs.rows {
            return Err(PileError::ShapeMismatch { expected: self.rows, found: rhs.rows });
        }
        if self.cols != rhs.cols {
            return Err(PileError::ShapeMismatch { expected: self.cols, found: rhs.cols });
        }
        let mut row_ptr = vec![0usize; self.rows + 1];
        let mut col_idx = Vec::with_capacity(self.nnz() + rhs.nnz());
        let mut values = Vec::with_capacity(self.nnz() + rhs.nnz());
        for i in 0..self.rows {
            let (ac, av) = self.row(i);
            let (bc, bv) = rhs.row(i);
            let (mut p, mut q) = (0usize, 0usize);
            while p < ac.len() || q < bc.len() {
                let (c, v) = if q >= bc.len() || (p < ac.len() && ac[p] < bc[q]) {
                    let e = (ac[p], av[p]);
                    p += 1;
                    e
                } else if p >= ac.len() || bc[q] < ac[p] {
                    let e = (bc[q], bv[q]);
                    q += 1;
                    e
                } else {
                    let e = (ac[p], av[p] + bv[q]);
                    p += 1;
                    q += 1;
                    e
                };
                if v != T::zero() {
                    col_idx.push(c);
                    values.push(v);
                }
            }
            row_ptr[i + 1] = col_idx.len();
        }
        Ok(Self { rows: self.rows, cols: self.cols, row_ptr, col_idx, values })
    }

    /// Transposed copy.
    pub fn transpose(&self) -> Self {
        let mut row_ptr = vec![0usize; self.cols + 1];
        for &c in &self.col_idx {
            row_ptr[c + 1] += 1;
        }
        for i in 0..self.cols {
            row_ptr[i + 1] += row_ptr[i];
        }
        let mut cursor = row_ptr[..self.cols].to_vec();
        let mut col_idx = vec![0usize; self.nnz()];
        let mut values = vec![T::zero(); self.nnz()];
        for i in 0..self.rows {
            let (cols, vals) = self.row(i);
            for (c, v) in cols.iter().zip(vals) {
                let p = cursor[*c];
                col_idx[p] = i;
                values[p] = *v;
                cursor[*c] += 1;
            }
        }
        Self { rows: self.cols, cols: self.rows, row_ptr, col_idx, values }
    }

    /// Kronecker product `self ⊗ rhs`.
    pub fn kron(&self, rhs: &Self) -> Self {
        let rows = self.rows * rhs.rows;
        let cols = self.cols * rhs.cols;
        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_idx = Vec::with_capacity(self.nnz() * rhs.nnz());
        let mut values = Vec::with_capacity(self.nnz() * rhs.nnz());
        for i in 0..self.rows {
            let (acols, avals) = self.row(i);
            for j in 0..rhs.rows {
                let (bcols, bvals) = rhs.row(j);
                for (ac, a) in acols.iter().zip(avals) {
                    for (bc, b) in bcols.iter().zip(bvals) {
                        col_idx.push(ac * rhs.cols + bc);
                        values.push(*a * *b);
                    }
                }
                row_ptr[i * rhs.rows + j + 1] = col_idx.len();
            }
        }
        Self { rows, cols, row_ptr, col_idx, values }
    }

    /// Main diagonal, zero-filled where no entry is stored.
    pub fn diagonal(&self) -> Vec<T> {
        let n = self.rows.min(self.cols);
        (0..n)
            .map(|i| {
                let (cols, vals) = self.row(i);
                match cols.binary_search(&i) {
                    Ok(p) => vals[p],
                    Err(_) => T::zero(),
                }
            })
            .collect()
    }

    /// Copy with the main diagonal cleared.
    pub fn without_diagonal(&self) -> Self {
        let mut row_ptr = vec![0usize; self.rows + 1];
        let mut col_idx = Vec::with_capacity(self.nnz());
        let mut values = Vec::with_capacity(self.nnz());
        for i in 0..self.rows {
            let (cols, vals) = self.row(i);
            for (c, v) in cols.iter().zip(vals) {
                if *c != i {
                    col_idx.push(*c);
                    values.push(*v);
                }
            }
            row_ptr[i + 1] = col_idx.len();
        }
        Self { rows: self.rows, cols: self.cols, row_ptr, col_idx, values }
    }

    /// Rows where `keep` is true, in order.
    pub fn select_rows(&self, keep: &[bool]) -> Result<Self, PileError> {
        if keep.len() != self.rows {
            return Err(PileError::ShapeMismatch { expected: self.rows, found: keep.len() });
        }
        let mut row_ptr = vec![0usize];
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        for i in 0..self.rows {
            if keep[i] {
                let (cols, vals) = self.row(i);
                col_idx.extend_from_slice(cols);
                values.extend_from_slice(vals);
                row_ptr.push(col_idx.len());
            }
        }
        let rows = row_ptr.len() - 1;
        Ok(Self { rows, cols: self.cols, row_ptr, col_idx, values })
    }

    /// Columns where `keep` is true, reindexed densely.
    pub fn select_cols(&self, keep: &[bool]) -> Result<Self, PileError> {
        if keep.len() != self.cols {
            return Err(PileError::ShapeMismatch { expected: self.cols, found: keep.len() });
        }
        let mut remap = vec![usize::MAX; self.cols];
        let mut next = 0usize;
        for (c, &k) in keep.iter().enumerate() {
            if k {
                remap[c] = next;
                next += 1;
            }
        }
        let mut row_ptr = vec![0usize; self.rows + 1];
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        for i in 0..self.rows {
            let (cols, vals) = self.row(i);
            for (c, v) in cols.iter().zip(vals) {
                if keep[*c] {
                    col_idx.push(remap[*c]);
                    values.push(*v);
                }
            }
            row_ptr[i + 1] = col_idx.len();
        }
        Ok(Self { rows: self.rows, cols: next, row_ptr, col_idx, values })
    }

    /// Principal submatrix: rows and columns where `keep` is true.
    pub fn submatrix(&self, keep: &[bool]) -> Result<Self, PileError> {
        self.select_rows(keep)?.select_cols(keep)
    }

    /// 0/1 pattern of the operator: every stored entry becomes one. The
    /// boolean-OR collapse used when composing orbit relations.
    pub fn pattern(&self) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            row_ptr: self.row_ptr.clone(),
            col_idx: self.col_idx.clone(),
            values: vec![T::one(); self.nnz()],
        }
    }
}

impl<T: Copy> CsrMatrix<T> {
    /// Convert the scalar type entrywise, dropping entries `f` maps to zero.
    pub fn map<U, F>(&self, f: F) -> CsrMatrix<U>
    where
        U: Copy + Num + NumAssignOps + Send + Sync,
        F: Fn(T) -> U,
    {
        let mut row_ptr = vec![0usize; self.rows + 1];
        let mut col_idx = Vec::with_capacity(self.values.len());
        let mut values = Vec::with_capacity(self.values.len());
        for i in 0..self.rows {
            let lo = self.row_ptr[i];
            let hi = self.row_ptr[i + 1];
            for k in lo..hi {
                let v = f(self.values[k]);
                if v != U::zero() {
                    col_idx.push(self.col_idx[k]);
                    values.push(v);
                }
            }
            row_ptr[i + 1] = col_idx.len();
        }
        CsrMatrix { rows: self.rows, cols: self.cols, row_ptr, col_idx, values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> CsrMatrix<i64> {
        // [ 2 0 1 ]
        // [ 0 0 0 ]
        // [ 3 4 0 ]
        CsrMatrix::from_triplets(3, 3, vec![(0, 0, 2), (0, 2, 1), (2, 0, 3), (2, 1, 4)])
    }

    #[test]
    fn triplets_merge_duplicates_and_drop_zeros() {
        let m = CsrMatrix::from_triplets(2, 2, vec![(0, 0, 1), (0, 0, 2), (1, 1, 5), (1, 1, -5)]);
        assert_eq!(m.nnz(), 1);
        assert_eq!(m.row(0), (&[0usize][..], &[3i64][..]));
        assert_eq!(m.row(1).0.len(), 0);
    }

    #[test]
    fn mul_vec_matches_dense() {
        let m = small();
        assert_eq!(m.mul_vec(&[1, 10, 100]).unwrap(), vec![102, 0, 43]);
    }

    #[test]
    fn mul_vec_rejects_bad_length() {
        let m = small();
        assert!(matches!(
            m.mul_vec(&[1, 2]),
            Err(PileError::ShapeMismatch { expected: 3, found: 2 })
        ));
    }

    #[test]
    fn matmul_against_identity_and_dense() {
        let m = small();
        let id = CsrMatrix::identity(3);
        assert_eq!(m.matmul(&id).unwrap(), m);
        assert_eq!(id.matmul(&m).unwrap(), m);
        let p = m.matmul(&m).unwrap();
        // dense check of m·m
        for (i, row) in [[7i64, 4, 2], [0, 0, 0], [6, 0, 3]].iter().enumerate() {
            for (j, want) in row.iter().enumerate() {
                let (cols, vals) = p.row(i);
                let got = cols.binary_search(&j).map(|k| vals[k]).unwrap_or(0);
                assert_eq!(got, *want, "({i},{j})");
            }
        }
    }

    #[test]
    fn add_cancels_to_empty() {
        let m = small();
        let neg = m.map(|v| -v);
        let sum = m.add(&neg).unwrap();
        assert_eq!(sum.nnz(), 0);
    }

    #[test]
    fn transpose_round_trip() {
        let m = small();
        assert_eq!(m.transpose().transpose(), m);
        assert_eq!(m.transpose().row(0), (&[0usize, 2][..], &[2i64, 3][..]));
    }

    #[test]
    fn kron_with_identity_is_block_diagonal() {
        let d2 = CsrMatrix::from_triplets(
            2,
            2,
            vec![(0, 0, -2), (0, 1, 1), (1, 0, 1), (1, 1, -2)],
        );
        let k = CsrMatrix::identity(2).kron(&d2);
        assert_eq!(k.rows(), 4);
        assert_eq!(k.row(0), (&[0usize, 1][..], &[-2i64, 1][..]));
        assert_eq!(k.row(2), (&[2usize, 3][..], &[-2i64, 1][..]));
    }

    #[test]
    fn diagonal_and_clearing() {
        let m = small();
        assert_eq!(m.diagonal(), vec![2, 0, 0]);
        let off = m.without_diagonal();
        assert_eq!(off.diagonal(), vec![0, 0, 0]);
        assert_eq!(off.nnz(), m.nnz() - 1);
    }

    #[test]
    fn row_and_column_slicing() {
        let m = small();
        let keep = [true, false, true];
        let sub = m.submatrix(&keep).unwrap();
        assert_eq!(sub.rows(), 2);
        assert_eq!(sub.cols(), 2);
        // [ 2 1 ]   (old cols 0,2)
        // [ 3 0 ]
        assert_eq!(sub.row(0), (&[0usize, 1][..], &[2i64, 1][..]));
        assert_eq!(sub.row(1), (&[0usize][..], &[3i64][..]));
    }

    #[test]
    fn random_matvec_matches_dense_reference() {
        use rand::rngs::SmallRng;
        use rand::{Rng, SeedableRng};
        let mut rng = SmallRng::seed_from_u64(42);
        let (rows, cols) = (17, 13);
        let triplets: Vec<(usize, usize, i64)> = (0..120)
            .map(|_| (rng.gen_range(0..rows), rng.gen_range(0..cols), rng.gen_range(-5i64..=5)))
            .collect();
        let x: Vec<i64> = (0..cols).map(|_| rng.gen_range(-9i64..=9)).collect();

        let mut dense = vec![0i64; rows * cols];
        for &(r, c, v) in &triplets {
            dense[r * cols + c] += v;
        }
        let want: Vec<i64> = (0..rows)
            .map(|r| (0..cols).map(|c| dense[r * cols + c] * x[c]).sum())
            .collect();

        let m = CsrMatrix::from_triplets(rows, cols, triplets);
        assert_eq!(m.mul_vec(&x).unwrap(), want);
        // transposing twice and multiplying through the transpose agree too
        let xt: Vec<i64> = (0..rows).map(|r| x[r % cols]).collect();
        let want_t: Vec<i64> = (0..cols)
            .map(|c| (0..rows).map(|r| dense[r * cols + c] * xt[r]).sum())
            .collect();
        assert_eq!(m.transpose().mul_vec(&xt).unwrap(), want_t);
    }

    #[test]
    fn pattern_flattens_weights() {
        let m = CsrMatrix::from_triplets(2, 2, vec![(0, 0, 7), (1, 0, -3)]);
        let p = m.pattern();
        assert_eq!(p.row(0).1, &[1i64][..]);
        assert_eq!(p.row(1).1, &[1i64][..]);
    }
}

#[cfg(test)]
mod serde_tests {
    use super::*;

    #[test]
    fn json_round_trip() {
        let m = CsrMatrix::from_triplets(2, 3, vec![(0, 1, 4i64), (1, 2, -1)]);
        let s = serde_json::to_string(&m).unwrap();
        let back: CsrMatrix<i64> = serde_json::from_str(&s).unwrap();
        assert_eq!(back, m);
    }
}
