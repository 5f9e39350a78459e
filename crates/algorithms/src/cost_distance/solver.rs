//! Cost-distance solver selection
//!
//! External GIS stacks expose several interchangeable least-cost backends.
//! Here the capability is a single trait — friction plus sources in,
//! cost/nearest/backlink out — and variants are selected by name through a
//! registry, not by conditional branching at call sites. A solver owns no
//! ambient state: everything it needs is passed in, everything it produces
//! is returned.

use super::{cost_distance, CostDistanceOutput, CostDistanceParams};
use accessgis_core::raster::Raster;
use accessgis_core::{Error, Result};

/// A cost-distance backend: computes accessibility rasters from a friction
/// surface and a source set.
pub trait CostDistanceSolver: Send + Sync {
    /// Registry name of this solver
    fn name(&self) -> &'static str;

    /// Run the computation
    fn solve(
        &self,
        friction: &Raster<f64>,
        params: &CostDistanceParams,
    ) -> Result<CostDistanceOutput>;
}

/// The built-in solver: sequential multi-source Dijkstra, the reference
/// any alternative backend must match (including the lowest-id tie-break).
#[derive(Debug, Clone, Default)]
pub struct DijkstraSolver;

impl CostDistanceSolver for DijkstraSolver {
    fn name(&self) -> &'static str {
        "dijkstra"
    }

    fn solve(
        &self,
        friction: &Raster<f64>,
        params: &CostDistanceParams,
    ) -> Result<CostDistanceOutput> {
        cost_distance(friction, params)
    }
}

/// Look up a solver by name.
///
/// # Errors
/// [`Error::UnknownMethod`] for any name not in the registry — reported
/// immediately, before any input is read or work attempted.
pub fn solver_for(method: &str) -> Result<Box<dyn CostDistanceSolver>> {
    match method {
        "dijkstra" => Ok(Box::new(DijkstraSolver)),
        other => Err(Error::UnknownMethod(other.to_string())),
    }
}
