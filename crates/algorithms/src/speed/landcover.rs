//! Land-cover speed blending
//!
//! Assigns an off-road speed to each cell from the fractional coverage of
//! each land-cover class, with a persistent-water override: cells covered by
//! standing water for two or more months of the year are impassable
//! regardless of the land-cover blend.
//!
//! Processed in fixed-size windows so memory use is independent of grid
//! extent; windows are computed concurrently and merged by a single writer.

use crate::speed::table::LandCoverSpeeds;
use crate::speed::SPEED_NODATA;
use accessgis_core::{Error, Raster, Result};
use accessgis_parallel::{process_windows, write_windows, DEFAULT_WINDOW_SIZE};
use ndarray::Array2;

/// One land-cover class layer: fractional coverage per cell in [0, 100].
#[derive(Debug, Clone)]
pub struct LandCoverLayer {
    /// Class name, must resolve in the speed table (e.g. "tree")
    pub class: String,
    /// Co-registered coverage raster in percent
    pub coverfraction: Raster<f32>,
}

impl LandCoverLayer {
    pub fn new(class: impl Into<String>, coverfraction: Raster<f32>) -> Self {
        Self {
            class: class.into(),
            coverfraction,
        }
    }
}

/// Parameters for land-cover speed blending
#[derive(Debug, Clone)]
pub struct LandCoverParams {
    /// Class/speed lookup table
    pub speeds: LandCoverSpeeds,
    /// Months-with-water threshold above which a cell is blocked
    pub water_months: f32,
    /// Processing window edge length
    pub window_size: usize,
}

impl Default for LandCoverParams {
    fn default() -> Self {
        Self {
            speeds: LandCoverSpeeds::default(),
            water_months: 2.0,
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

/// Blend fractional land-cover coverage into a continuous speed raster (km/h).
///
/// `speed[cell] = sum((coverage_k / 100) * table[class_k])` over all layers.
/// Cells where the surface-water raster reports `water_months` or more
/// months of standing water are set to 0. Cells where any land-cover layer
/// holds nodata propagate nodata.
///
/// # Errors
/// - `InvalidParameter` when no layers are given or a class name is missing
///   from the table
/// - Alignment errors when the layers and water raster do not share one grid
pub fn speed_from_landcover(
    layers: &[LandCoverLayer],
    surface_water: &Raster<f32>,
    params: &LandCoverParams,
) -> Result<Raster<f32>> {
    let Some(first) = layers.first() else {
        return Err(Error::InvalidParameter {
            name: "layers",
            value: "[]".to_string(),
            reason: "at least one land-cover layer is required".to_string(),
        });
    };

    // Resolve every class up front: the lookup must be total over the stack
    let mut class_speeds = Vec::with_capacity(layers.len());
    for layer in layers {
        let speed = params.speeds.get(&layer.class).ok_or_else(|| Error::InvalidParameter {
            name: "layers",
            value: layer.class.clone(),
            reason: "land-cover class missing from the speed table".to_string(),
        })?;
        class_speeds.push(speed as f32);
    }

    // All inputs must sit on the shared grid
    for layer in &layers[1..] {
        first.coverfraction.ensure_aligned(&layer.coverfraction)?;
    }
    first.coverfraction.ensure_aligned(surface_water)?;

    let mut out: Raster<f32> = first.coverfraction.with_same_meta();
    out.set_nodata(Some(SPEED_NODATA));

    let blocks = process_windows(out.shape(), params.window_size, |window| {
        Array2::from_shape_fn((window.rows, window.cols), |(lr, lc)| {
            let (row, col) = window.to_source_coords(lr, lc);

            let mut speed = 0.0_f32;
            for (layer, &class_speed) in layers.iter().zip(&class_speeds) {
                let coverfraction = unsafe { layer.coverfraction.get_unchecked(row, col) };
                if layer.coverfraction.is_nodata(coverfraction) {
                    return SPEED_NODATA;
                }
                speed += (coverfraction / 100.0) * class_speed;
            }

            // Standing water blocks movement
            let months = unsafe { surface_water.get_unchecked(row, col) };
            if !surface_water.is_nodata(months) && months >= params.water_months {
                return 0.0;
            }

            speed
        })
    });
    write_windows(&mut out, blocks);

    Ok(out)
}
