//! End-to-end simulation driver.
//!
//! Sizes the grid from the target grain count and dimension, deposits every
//! grain at the origin, optionally collapses the problem onto the fundamental
//! domain and warm-starts the relaxation, then expands the stabilized pile
//! back to the full grid. Rendering the result is left to consumers.

use log::debug;

use crate::lattice::Grid;
use crate::pile_error::PileError;
use crate::relax::{Stabilized, stabilize, warm_start};
use crate::symmetry::{collapse_vector, expand_collapse, reduce_operator};

/// Volume of the unit d-ball, by the two-step recurrence
/// `V(d) = 2π/d · V(d-2)`.
pub fn n_ball_volume(dim: usize) -> f64 {
    match dim {
        0 => 1.0,
        1 => 2.0,
        d => n_ball_volume(d - 2) * 2.0 * std::f64::consts::PI / d as f64,
    }
}

/// Empirical critical density of the stabilized pile, per dimension. Used
/// only to size the grid generously enough that the avalanche stays
/// interior.
fn builtin_critical_density(dim: usize) -> Option<f64> {
    match dim {
        1 => Some(1.0),
        2 => Some(2.125),
        3 => Some(3.5),
        _ => None,
    }
}

/// Simulation parameters. Defaults mirror the classic 2-D run: symmetry
/// reduction on, warm start off, convergence checked every round.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SimConfig {
    /// Grains deposited at the origin.
    pub grains: i64,
    pub dimensions: usize,
    /// Density used to pick the warm-start target radius.
    pub sizing_density: f64,
    /// Right-hand-side density of the warm-start solve.
    pub target_density: i64,
    pub use_symmetry: bool,
    pub warm_start: bool,
    pub check_interval: usize,
    /// Overrides the built-in critical-density table; required for
    /// dimensions above 3.
    pub critical_density: Option<f64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grains: 1 << 12,
            dimensions: 2,
            sizing_density: 3.0,
            target_density: 3,
            use_symmetry: true,
            warm_start: false,
            check_interval: 1,
            critical_density: None,
        }
    }
}

/// A finished run: the grid it ran on and the stabilized full-grid fields.
#[derive(Debug)]
pub struct SimReport {
    pub grid: Grid,
    /// Stabilized heights over the full grid.
    pub pile: Vec<i64>,
    /// Topple counts over the full grid.
    pub spills: Vec<i64>,
    /// Rounds the relaxation ran.
    pub rounds: usize,
}

/// Pick the odd side length that contains the whole avalanche: twice the
/// outer radius `R / ⌊ρ_c⌋^(1/d)` where `R` is the radius of a ball holding
/// `grains` at unit density.
pub fn sized_side(grains: i64, dim: usize, critical_density: f64) -> usize {
    let r = (grains as f64 / n_ball_volume(dim)).powf(1.0 / dim as f64);
    let outer = r / critical_density.floor().powf(1.0 / dim as f64);
    2 * outer as usize + 1
}

/// Run the full pipeline for `cfg`.
pub fn simulate(cfg: &SimConfig) -> Result<SimReport, PileError> {
    if cfg.dimensions < 1 {
        return Err(PileError::InvalidDimension(cfg.dimensions));
    }
    if cfg.grains < 1 {
        return Err(PileError::InvalidGrainCount(cfg.grains));
    }
    let critical = cfg
        .critical_density
        .or_else(|| builtin_critical_density(cfg.dimensions))
        .ok_or(PileError::UnknownCriticalDensity(cfg.dimensions))?;

    let r = (cfg.grains as f64 / n_ball_volume(cfg.dimensions)).powf(1.0 / cfg.dimensions as f64);
    let side = sized_side(cfg.grains, cfg.dimensions, critical);
    debug!("grains={} dim={} R={r:.2} side={side}", cfg.grains, cfg.dimensions);
    let grid = Grid::new(side, cfg.dimensions)?;

    let mut pile = vec![0i64; grid.node_count()];
    let origin = grid
        .radius()
        .iter()
        .position(|&r| r == 0.0)
        .expect("odd-sided grid has a center node");
    pile[origin] = cfg.grains;

    let reduction = cfg.use_symmetry.then(|| expand_collapse(&grid, true));
    let (laplacian, pile, radius, degree) = match &reduction {
        Some(ec) => (
            reduce_operator(ec, grid.laplacian())?,
            collapse_vector(&ec.mask, &pile)?,
            collapse_vector(&ec.mask, grid.radius())?,
            collapse_vector(&ec.mask, grid.degree())?,
        ),
        None => (
            grid.laplacian().clone(),
            pile,
            grid.radius().to_vec(),
            grid.degree().to_vec(),
        ),
    };

    let initial_spills = if cfg.warm_start {
        let target_radius = r / cfg.sizing_density.powf(1.0 / cfg.dimensions as f64);
        Some(warm_start(
            &laplacian,
            &pile,
            &radius,
            &degree,
            target_radius,
            cfg.target_density,
        )?)
    } else {
        None
    };

    let Stabilized { pile, spills, rounds } =
        stabilize(pile, &laplacian, &degree, initial_spills, cfg.check_interval)?;

    let (pile, spills) = match &reduction {
        Some(ec) => (ec.expand.mul_vec(&pile)?, ec.expand.mul_vec(&spills)?),
        None => (pile, spills),
    };
    Ok(SimReport { grid, pile, spills, rounds })
}
