//! Road network speed rasterization
//!
//! Burns road line geometries onto the target grid with all-touched
//! semantics: every cell the line passes through receives the segment's
//! resolved speed, not only the cells containing its centroid. Cell
//! traversal follows the classic voxel-walking scheme (Amanatides & Woo,
//! 1987) in fractional pixel space.
//!
//! Draw order is the tie-break: when two segments touch the same cell, the
//! later one in the network's order wins.

use crate::speed::table::NetworkSpeeds;
use crate::speed::SPEED_NODATA;
use accessgis_core::raster::GeoTransform;
use accessgis_core::{Raster, Result, RoadNetwork, CRS};
use geo_types::LineString;

/// Rasterize a road network into a speed raster (km/h).
///
/// Each segment's speed is resolved from its tags via
/// [`NetworkSpeeds::resolve`]; segments with an unrecognized road category
/// are excluded. Resolved speeds are burned integer-truncated. Cells touched
/// by no segment hold the nodata sentinel.
///
/// # Arguments
/// * `network` - Road line features in target-grid coordinates
/// * `speeds` - Speed lookup table
/// * `transform` - Affine transform of the target grid
/// * `crs` - CRS of the target grid
/// * `rows`, `cols` - Target grid dimensions
///
/// # Returns
/// Raster<f32> of speeds with nodata = -1
pub fn speed_from_roads(
    network: &RoadNetwork,
    speeds: &NetworkSpeeds,
    transform: GeoTransform,
    crs: Option<CRS>,
    rows: usize,
    cols: usize,
) -> Result<Raster<f32>> {
    let mut out: Raster<f32> = Raster::new(rows, cols);
    out.set_transform(transform);
    out.set_crs(crs);
    out.set_nodata(Some(SPEED_NODATA));
    out.data_mut().fill(SPEED_NODATA);

    for segment in network.iter() {
        let Some(speed) = speeds.resolve(segment) else {
            continue;
        };
        let value = speed.trunc() as f32;

        visit_line_cells(&segment.geometry, &transform, rows, cols, &mut |row, col| {
            // Later segments overwrite earlier ones
            unsafe { out.set_unchecked(row, col, value) };
        });
    }

    Ok(out)
}

/// Walk every cell touched by a line geometry.
///
/// The geometry is converted to fractional pixel coordinates, each segment
/// is clipped to the grid extent, and the clipped span is traversed cell by
/// cell.
fn visit_line_cells<F: FnMut(usize, usize)>(
    line: &LineString<f64>,
    transform: &GeoTransform,
    rows: usize,
    cols: usize,
    visit: &mut F,
) {
    let points: Vec<(f64, f64)> = line
        .coords()
        .map(|c| transform.geo_to_pixel(c.x, c.y))
        .collect();

    if points.len() == 1 {
        let (x, y) = points[0];
        visit_point(x, y, rows, cols, visit);
        return;
    }

    for pair in points.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        burn_segment(x0, y0, x1, y1, rows, cols, visit);
    }
}

fn visit_point<F: FnMut(usize, usize)>(x: f64, y: f64, rows: usize, cols: usize, visit: &mut F) {
    let col = x.floor();
    let row = y.floor();
    if col >= 0.0 && row >= 0.0 && (col as usize) < cols && (row as usize) < rows {
        visit(row as usize, col as usize);
    }
}

/// Traverse one line segment in pixel space, visiting every crossed cell.
fn burn_segment<F: FnMut(usize, usize)>(
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    rows: usize,
    cols: usize,
    visit: &mut F,
) {
    if rows == 0 || cols == 0 {
        return;
    }

    let Some((x0, y0, x1, y1)) = clip_to_grid(x0, y0, x1, y1, cols as f64, rows as f64) else {
        return;
    };

    let max_col = cols as isize - 1;
    let max_row = rows as isize - 1;

    let mut col = (x0.floor() as isize).clamp(0, max_col);
    let mut row = (y0.floor() as isize).clamp(0, max_row);
    let end_col = (x1.floor() as isize).clamp(0, max_col);
    let end_row = (y1.floor() as isize).clamp(0, max_row);

    let dx = x1 - x0;
    let dy = y1 - y0;

    let step_col: isize = if dx > 0.0 {
        1
    } else if dx < 0.0 {
        -1
    } else {
        0
    };
    let step_row: isize = if dy > 0.0 {
        1
    } else if dy < 0.0 {
        -1
    } else {
        0
    };

    // Parametric distance to the next column/row boundary, and per-cell increments
    let t_delta_x = if step_col != 0 { (1.0 / dx).abs() } else { f64::INFINITY };
    let t_delta_y = if step_row != 0 { (1.0 / dy).abs() } else { f64::INFINITY };

    let mut t_max_x = match step_col {
        1 => ((col + 1) as f64 - x0) / dx,
        -1 => (col as f64 - x0) / dx,
        _ => f64::INFINITY,
    };
    let mut t_max_y = match step_row {
        1 => ((row + 1) as f64 - y0) / dy,
        -1 => (row as f64 - y0) / dy,
        _ => f64::INFINITY,
    };

    visit(row as usize, col as usize);

    // Exact corner crossings advance one axis per iteration, so both
    // corner-adjacent cells are touched; the step budget bounds the walk
    // against floating point drift.
    let mut remaining = (end_col - col).abs() + (end_row - row).abs();
    while remaining > 0 {
        if t_max_x <= t_max_y {
            col += step_col;
            t_max_x += t_delta_x;
        } else {
            row += step_row;
            t_max_y += t_delta_y;
        }

        if col < 0 || row < 0 || col > max_col || row > max_row {
            break;
        }
        visit(row as usize, col as usize);
        remaining -= 1;
    }
}

/// Liang-Barsky clip of a segment to the box [0, max_x] x [0, max_y].
fn clip_to_grid(
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    max_x: f64,
    max_y: f64,
) -> Option<(f64, f64, f64, f64)> {
    let dx = x1 - x0;
    let dy = y1 - y0;

    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    for (p, q) in [
        (-dx, x0),
        (dx, max_x - x0),
        (-dy, y0),
        (dy, max_y - y0),
    ] {
        if p == 0.0 {
            // Parallel to this boundary: reject if fully outside
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                if r > t0 {
                    t0 = r;
                }
            } else {
                if r < t0 {
                    return None;
                }
                if r < t1 {
                    t1 = r;
                }
            }
        }
    }

    Some((x0 + t0 * dx, y0 + t0 * dy, x0 + t1 * dx, y0 + t1 * dy))
}
