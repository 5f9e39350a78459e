//! Speed surface construction
//!
//! Three stages produce a single combined speed raster in km/h:
//! road-network rasterization, fractional land-cover blending, and a
//! per-cell max combine (the fastest available mode of travel wins).

pub mod combine;
pub mod landcover;
pub mod roads;
pub mod table;

pub use combine::{combine_speeds, combine_speeds_many, CombineSpeeds};
pub use landcover::{speed_from_landcover, LandCoverLayer, LandCoverParams};
pub use roads::speed_from_roads;
pub use table::{LandCoverSpeeds, NetworkSpeeds};

/// Nodata sentinel shared by all speed rasters (km/h values are never
/// negative).
pub const SPEED_NODATA: f32 = -1.0;
