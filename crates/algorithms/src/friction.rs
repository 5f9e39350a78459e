//! Friction surface computation
//!
//! Converts a speed raster (km/h) into a friction raster: the time in
//! seconds needed to cross one cell along its diagonal. Degenerate speeds
//! never reach the cost-distance engine as NaN or infinity; they clamp to a
//! finite "effectively impassable" ceiling. The grid's linear units must be
//! meters for the output to be in seconds.
//!
//! Processed in fixed-size windows, like the other raster construction
//! stages.

use accessgis_core::{Algorithm, Error, Raster, Result};
use accessgis_parallel::{process_windows, write_windows, DEFAULT_WINDOW_SIZE};
use ndarray::Array2;

/// Nodata sentinel for friction rasters (traversal times are never negative)
pub const FRICTION_NODATA: f64 = -1.0;

/// Parameters for friction computation
#[derive(Debug, Clone)]
pub struct FrictionParams {
    /// Ceiling in seconds for impassable or degenerate cells. Keeps path
    /// costs bounded and finite.
    pub max_time: f64,
    /// Processing window edge length
    pub window_size: usize,
}

impl Default for FrictionParams {
    fn default() -> Self {
        Self {
            max_time: 3600.0,
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

/// Convert a speed raster to friction, i.e. seconds to cross a cell.
///
/// `friction = diagonal_cell_distance / (speed / 3.6)` with km/h converted
/// to m/s. Degenerate values are handled in this order: explicit nodata
/// speed propagates to nodata friction; zero or negative speed clamps to
/// `max_time`; non-finite traversal times clamp to `max_time`; anything
/// above `max_time` clamps to `max_time`. The result is therefore always
/// positive and finite outside the nodata mask.
pub fn compute_friction(speed: &Raster<f32>, params: &FrictionParams) -> Result<Raster<f64>> {
    if !(params.max_time > 0.0 && params.max_time.is_finite()) {
        return Err(Error::InvalidParameter {
            name: "max_time",
            value: params.max_time.to_string(),
            reason: "the impassable ceiling must be positive and finite".to_string(),
        });
    }

    let max_time = params.max_time;
    let diag_distance = speed.transform().diagonal_distance();

    let mut out: Raster<f64> = speed.with_same_meta();
    out.set_nodata(Some(FRICTION_NODATA));

    let blocks = process_windows(out.shape(), params.window_size, |window| {
        Array2::from_shape_fn((window.rows, window.cols), |(lr, lc)| {
            let (row, col) = window.to_source_coords(lr, lc);
            let value = unsafe { speed.get_unchecked(row, col) };

            if speed.is_nodata(value) {
                return FRICTION_NODATA;
            }

            // From km/hour to m/second
            let meters_per_second = value as f64 / 3.6;
            if meters_per_second <= 0.0 {
                return max_time;
            }

            let time_to_cross = diag_distance / meters_per_second;
            if !time_to_cross.is_finite() || time_to_cross > max_time {
                max_time
            } else {
                time_to_cross
            }
        })
    });
    write_windows(&mut out, blocks);

    Ok(out)
}

/// Friction conversion algorithm
#[derive(Debug, Clone, Default)]
pub struct FrictionConverter;

impl Algorithm for FrictionConverter {
    type Input = Raster<f32>;
    type Output = Raster<f64>;
    type Params = FrictionParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Friction Converter"
    }

    fn description(&self) -> &'static str {
        "Convert a speed raster (km/h) into per-cell traversal time (s)"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        compute_friction(&input, &params)
    }
}
