//! Synchronous toppling to a fixed point.
//!
//! Each round applies the operator to the accumulated spill field, so
//! `spillover + pile` is exactly the current height field, and every node
//! topples `floor(height / degree)` further times at once. This all-sites
//! relaxation reaches the same fixed point as one-site-at-a-time toppling
//! (the abelian property) and converges monotonically on finite grids.

use log::debug;

use crate::linalg::CsrMatrix;
use crate::pile_error::PileError;

/// Result of a stabilization run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stabilized {
    /// Final heights; `0 <= pile[v] < degree[v]` at every node.
    pub pile: Vec<i64>,
    /// Cumulative topple count per node.
    pub spills: Vec<i64>,
    /// Rounds executed, including the confirming quiet round(s).
    pub rounds: usize,
}

/// Relax `pile` under `laplacian` until no node exceeds its degree.
///
/// `initial_spills` warm-starts the spill field (see
/// [`warm_start`](crate::relax::warm_start())); `check_interval` batches the
/// convergence check every that many rounds, a performance knob that cannot
/// change the fixed point.
///
/// The operator is applied exactly as built, diagonal included; the identity
/// `pile_out = pile_in + laplacian · spills` holds at return, so total mass
/// is conserved whenever no boundary node topples.
///
/// # Errors
/// `ShapeMismatch` for disagreeing lengths, `InvalidDegree` for any
/// non-positive threshold, `InvalidCheckInterval` for a zero interval.
pub fn stabilize(
    pile: Vec<i64>,
    laplacian: &CsrMatrix<i64>,
    degree: &[i64],
    initial_spills: Option<Vec<i64>>,
    check_interval: usize,
) -> Result<Stabilized, PileError> {
    let n = laplacian.rows();
    if laplacian.cols() != n {
        return Err(PileError::ShapeMismatch { expected: n, found: laplacian.cols() });
    }
    if pile.len() != n {
        return Err(PileError::ShapeMismatch { expected: n, found: pile.len() });
    }
    if degree.len() != n {
        return Err(PileError::ShapeMismatch { expected: n, found: degree.len() });
    }
    if check_interval == 0 {
        return Err(PileError::InvalidCheckInterval);
    }
    if let Some((node, &value)) = degree.iter().enumerate().find(|&(_, &d)| d <= 0) {
        return Err(PileError::InvalidDegree { node, value });
    }
    let mut spills = match initial_spills {
        Some(s) if s.len() != n => {
            return Err(PileError::ShapeMismatch { expected: n, found: s.len() });
        }
        Some(s) => s,
        None => vec![0; n],
    };

    let mut spillover = vec![0i64; n];
    let mut rounds = 0usize;
    loop {
        laplacian.mul_vec_into(&spills, &mut spillover);
        let mut quiet = true;
        for v in 0..n {
            let topple = (spillover[v] + pile[v]).div_euclid(degree[v]);
            if topple != 0 {
                spills[v] += topple;
                quiet = false;
            }
        }
        rounds += 1;
        if rounds % check_interval == 0 && quiet {
            break;
        }
    }
    debug!("stabilized {n} nodes in {rounds} rounds");

    let pile = spillover
        .iter()
        .zip(&pile)
        .map(|(s, p)| s + p)
        .collect();
    Ok(Stabilized { pile, spills, rounds })
}
