//! # AccessGis Algorithms
//!
//! Travel-time accessibility analysis for AccessGis.
//!
//! The crate builds a friction surface from heterogeneous speed sources and
//! converts it, together with a set of facility points, into accessibility
//! rasters:
//!
//! - **speed**: road-network rasterization, land-cover speed blending and
//!   the max-combine of speed rasters
//! - **friction**: speed (km/h) to per-cell traversal time (seconds)
//! - **cost_distance**: multi-source shortest path over the friction grid,
//!   producing accumulated cost, nearest-source and backlink rasters
//! - **pipeline**: file-level stage wrappers with the skip-if-exists
//!   idempotence convention

pub mod cost_distance;
pub mod friction;
pub mod pipeline;
pub mod speed;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::cost_distance::{
        cost_distance, solver_for, sources_from_raster, CostDistance, CostDistanceOutput,
        CostDistanceParams, CostDistanceSolver, DijkstraSolver, SourcePoint,
    };
    pub use crate::friction::{compute_friction, FrictionConverter, FrictionParams};
    pub use crate::speed::{
        combine_speeds, combine_speeds_many, speed_from_landcover, speed_from_roads,
        CombineSpeeds, LandCoverLayer, LandCoverParams, LandCoverSpeeds, NetworkSpeeds,
        SPEED_NODATA,
    };
    pub use accessgis_core::prelude::*;
}
