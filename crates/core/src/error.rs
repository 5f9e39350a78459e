//! Error types for AccessGis

use thiserror::Error;

/// Main error type for AccessGis operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Geotransform mismatch between input rasters")]
    TransformMismatch,

    #[error("CRS mismatch: {0} vs {1}")]
    CrsMismatch(String, String),

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Empty source point set: at least one source is required")]
    EmptySources,

    #[error("Source point {id} at ({row}, {col}) lies outside the raster grid")]
    SourceOutsideGrid { id: u32, row: usize, col: usize },

    #[error("Source point {id} at ({row}, {col}) lies on nodata friction")]
    SourceOnNodata { id: u32, row: usize, col: usize },

    #[error("Unknown cost-distance method: {0}")]
    UnknownMethod(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("GDAL error: {0}")]
    #[cfg(feature = "gdal")]
    Gdal(String),

    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "gdal")]
impl From<gdal::errors::GdalError> for Error {
    fn from(e: gdal::errors::GdalError) -> Self {
        Error::Gdal(e.to_string())
    }
}

/// Result type alias for AccessGis operations
pub type Result<T> = std::result::Result<T, Error>;
