//! Speed raster combination
//!
//! Merges speed rasters by taking the per-cell maximum: the fastest
//! available mode of travel wins. The operation is commutative and
//! associative, so it generalizes to any number of sources.

use crate::speed::SPEED_NODATA;
use accessgis_core::{Algorithm, Error, Raster, Result};
use accessgis_parallel::{process_windows, write_windows, DEFAULT_WINDOW_SIZE};
use ndarray::Array2;

/// Combine two speed rasters by keeping the per-cell maximum.
///
/// Negative or NaN results map to the first input's nodata sentinel (with
/// the negative-sentinel convention, a cell that is nodata in both inputs
/// stays nodata, while a cell valid in either input keeps the valid speed).
///
/// # Errors
/// Alignment errors when the two rasters do not share one grid.
pub fn combine_speeds(a: &Raster<f32>, b: &Raster<f32>) -> Result<Raster<f32>> {
    a.ensure_aligned(b)?;

    let nodata = a.nodata().unwrap_or(SPEED_NODATA);
    let mut out: Raster<f32> = a.with_same_meta();
    out.set_nodata(Some(nodata));

    let blocks = process_windows(out.shape(), DEFAULT_WINDOW_SIZE, |window| {
        Array2::from_shape_fn((window.rows, window.cols), |(lr, lc)| {
            let (row, col) = window.to_source_coords(lr, lc);
            let va = unsafe { a.get_unchecked(row, col) };
            let vb = unsafe { b.get_unchecked(row, col) };

            // f32::max ignores a NaN operand, so a value valid in either
            // input survives; anything negative or NaN is invalid
            let max = va.max(vb);
            if max >= 0.0 {
                max
            } else {
                nodata
            }
        })
    });
    write_windows(&mut out, blocks);

    Ok(out)
}

/// Fold [`combine_speeds`] over any number of speed rasters.
pub fn combine_speeds_many(rasters: &[&Raster<f32>]) -> Result<Raster<f32>> {
    let Some((first, rest)) = rasters.split_first() else {
        return Err(Error::InvalidParameter {
            name: "rasters",
            value: "[]".to_string(),
            reason: "at least one speed raster is required".to_string(),
        });
    };

    let mut combined = (*first).clone();
    for raster in rest {
        combined = combine_speeds(&combined, raster)?;
    }
    Ok(combined)
}

/// Speed combination algorithm
#[derive(Debug, Clone, Default)]
pub struct CombineSpeeds;

impl Algorithm for CombineSpeeds {
    type Input = (Raster<f32>, Raster<f32>);
    type Output = Raster<f32>;
    type Params = ();
    type Error = Error;

    fn name(&self) -> &'static str {
        "Combine Speeds"
    }

    fn description(&self) -> &'static str {
        "Merge speed rasters by keeping the per-cell maximum"
    }

    fn execute(&self, input: Self::Input, _params: Self::Params) -> Result<Self::Output> {
        combine_speeds(&input.0, &input.1)
    }
}
