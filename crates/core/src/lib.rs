//! # AccessGis Core
//!
//! Core types, traits and I/O for the AccessGis accessibility-mapping library.
//!
//! This crate provides:
//! - `Raster<T>`: Generic georeferenced raster grid type
//! - `GeoTransform`: Affine transformation for georeferencing
//! - `CRS`: Coordinate Reference System handling
//! - `RoadSegment`/`RoadNetwork`: line features feeding the road rasterizer
//! - Algorithm traits for a consistent API
//! - GeoTIFF I/O (native, or via GDAL with the `gdal` feature)

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;
pub mod vector;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};
pub use vector::{RoadNetwork, RoadSegment};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::vector::{RoadNetwork, RoadSegment};
    pub use crate::Algorithm;
}

/// Core trait for all algorithms in AccessGis.
///
/// Algorithms are pure functions that transform input data according to
/// parameters. Every stage returns brand-new rasters and never mutates its
/// inputs.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
