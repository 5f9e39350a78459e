//! File-level accessibility pipeline
//!
//! Thin wrappers around the raster stages, operating on GeoTIFF artifacts.
//! Every stage follows the idempotence convention: when its destination
//! artifact already exists the stage is a no-op, so the pipeline can be
//! re-run safely after a partial failure. Each stage reads its inputs,
//! computes a brand-new raster and writes it once complete; outputs are
//! never visible to later stages before a stage finishes.

use crate::cost_distance::{self, CostDistanceParams};
use crate::friction::{self, FrictionParams};
use crate::speed::landcover::{self, LandCoverLayer, LandCoverParams};
use crate::speed::table::NetworkSpeeds;
use crate::speed::{combine, roads};
use accessgis_core::io::{read_geotiff, write_geotiff};
use accessgis_core::raster::GeoTransform;
use accessgis_core::{Raster, Result, RoadNetwork, CRS};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

fn prepare_destination(dst: &Path) -> Result<bool> {
    if dst.is_file() {
        info!("{} already exists, skipping", dst.display());
        return Ok(false);
    }
    if let Some(parent) = dst.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(true)
}

/// Rasterize a road network into a speed GeoTIFF on the target grid.
pub fn speed_from_roads(
    network: &RoadNetwork,
    speeds: &NetworkSpeeds,
    transform: GeoTransform,
    crs: Option<CRS>,
    rows: usize,
    cols: usize,
    dst: &Path,
) -> Result<PathBuf> {
    if !prepare_destination(dst)? {
        return Ok(dst.to_path_buf());
    }

    let raster = roads::speed_from_roads(network, speeds, transform, crs, rows, cols)?;
    write_geotiff(&raster, dst, None)?;
    info!(
        "Rasterized {} road segments into {}",
        network.len(),
        dst.display()
    );
    Ok(dst.to_path_buf())
}

/// Blend land-cover coverage GeoTIFFs into a speed GeoTIFF.
///
/// `layers` pairs each class name with the path of its fractional-coverage
/// raster; `surface_water` is the months-with-water raster.
pub fn speed_from_landcover(
    layers: &[(String, PathBuf)],
    surface_water: &Path,
    dst: &Path,
    params: &LandCoverParams,
) -> Result<PathBuf> {
    if !prepare_destination(dst)? {
        return Ok(dst.to_path_buf());
    }

    let mut stack = Vec::with_capacity(layers.len());
    for (class, path) in layers {
        let coverfraction: Raster<f32> = read_geotiff(path, None)?;
        stack.push(LandCoverLayer::new(class.clone(), coverfraction));
    }
    let water: Raster<f32> = read_geotiff(surface_water, None)?;

    let raster = landcover::speed_from_landcover(&stack, &water, params)?;
    write_geotiff(&raster, dst, None)?;
    info!(
        "Blended {} land-cover layers into {}",
        stack.len(),
        dst.display()
    );
    Ok(dst.to_path_buf())
}

/// Combine land-cover and road-network speed GeoTIFFs by per-cell maximum.
pub fn combine_speed_rasters(
    landcover_speed: &Path,
    roadnetwork_speed: &Path,
    dst: &Path,
) -> Result<PathBuf> {
    if !prepare_destination(dst)? {
        return Ok(dst.to_path_buf());
    }

    let land: Raster<f32> = read_geotiff(landcover_speed, None)?;
    let road: Raster<f32> = read_geotiff(roadnetwork_speed, None)?;

    let raster = combine::combine_speeds(&land, &road)?;
    write_geotiff(&raster, dst, None)?;
    info!("Combined speed rasters into {}", dst.display());
    Ok(dst.to_path_buf())
}

/// Convert a speed GeoTIFF to a friction GeoTIFF.
pub fn compute_friction(speed_raster: &Path, dst: &Path, params: &FrictionParams) -> Result<PathBuf> {
    if !prepare_destination(dst)? {
        return Ok(dst.to_path_buf());
    }

    let speed: Raster<f32> = read_geotiff(speed_raster, None)?;
    let raster = friction::compute_friction(&speed, params)?;
    write_geotiff(&raster, dst, None)?;
    info!("Computed friction surface {}", dst.display());
    Ok(dst.to_path_buf())
}

/// Compute the accessibility map (travel time in seconds) from a friction
/// GeoTIFF and a target-points GeoTIFF.
///
/// The target raster holds a positive id at each facility cell and 0
/// elsewhere (zero-valued pixels are treated as "no source"). The method
/// name selects the solver backend; an unknown name fails before any input
/// is read.
pub fn compute_traveltime(
    src_friction: &Path,
    src_target: &Path,
    dst_cost: &Path,
    dst_nearest: &Path,
    dst_backlink: Option<&Path>,
    method: &str,
) -> Result<()> {
    // Fail fast on an unsupported method, before touching any raster
    let solver = cost_distance::solver_for(method)?;

    let mut outputs = vec![dst_cost, dst_nearest];
    outputs.extend(dst_backlink);
    if outputs.iter().all(|p| p.is_file()) {
        info!("Travel time outputs already exist, skipping");
        return Ok(());
    }
    for dst in &outputs {
        if let Some(parent) = dst.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
    }

    let friction: Raster<f64> = read_geotiff(src_friction, None)?;
    let targets: Raster<u32> = read_geotiff(src_target, None)?;
    friction.ensure_aligned(&targets)?;

    let params = CostDistanceParams {
        sources: cost_distance::sources_from_raster(&targets),
        compute_backlink: dst_backlink.is_some(),
    };
    info!(
        "Computing travel time with {} from {} sources",
        solver.name(),
        params.sources.len()
    );
    let output = solver.solve(&friction, &params)?;

    write_geotiff(&output.cost, dst_cost, None)?;
    write_geotiff(&output.nearest, dst_nearest, None)?;
    if let (Some(dst), Some(backlink)) = (dst_backlink, &output.backlink) {
        write_geotiff(backlink, dst, None)?;
    }
    info!("Wrote accessibility map {}", dst_cost.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use accessgis_core::Error;
    use geo_types::line_string;
    use accessgis_core::RoadSegment;

    fn grid_transform() -> GeoTransform {
        // 6x6 grid of 100 m cells, origin at (0, 600)
        GeoTransform::new(0.0, 600.0, 100.0, -100.0)
    }

    fn write_landcover_inputs(dir: &Path) -> (Vec<(String, PathBuf)>, PathBuf) {
        let mut grass = Raster::filled(6, 6, 100.0_f32);
        grass.set_transform(grid_transform());
        grass.set_nodata(Some(-1.0));
        let grass_path = dir.join("landcover_grass.tif");
        write_geotiff(&grass, &grass_path, None).unwrap();

        let mut water = Raster::filled(6, 6, 0.0_f32);
        water.set_transform(grid_transform());
        water.set_nodata(Some(-32768.0));
        let water_path = dir.join("surface_water.tif");
        write_geotiff(&water, &water_path, None).unwrap();

        (vec![("grass".to_string(), grass_path)], water_path)
    }

    fn write_targets(dir: &Path) -> PathBuf {
        let mut targets: Raster<u32> = Raster::new(6, 6);
        targets.set_transform(grid_transform());
        targets.set(0, 0, 1).unwrap();
        targets.set(5, 5, 2).unwrap();
        let path = dir.join("health.tif");
        write_geotiff(&targets, &path, None).unwrap();
        path
    }

    #[test]
    fn test_full_pipeline_and_idempotence() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();

        let (layers, water) = write_landcover_inputs(dir);
        let targets = write_targets(dir);

        let mut network = RoadNetwork::new();
        network.push(RoadSegment::new(
            line_string![(x: 10.0, y: 550.0), (x: 590.0, y: 550.0)],
            "primary",
        ));

        let road_speed = speed_from_roads(
            &network,
            &NetworkSpeeds::default(),
            grid_transform(),
            None,
            6,
            6,
            &dir.join("speed_roads.tif"),
        )
        .unwrap();
        let land_speed = speed_from_landcover(
            &layers,
            &water,
            &dir.join("speed_landcover.tif"),
            &LandCoverParams::default(),
        )
        .unwrap();
        let combined =
            combine_speed_rasters(&land_speed, &road_speed, &dir.join("speed.tif")).unwrap();
        let friction_path = compute_friction(
            &combined,
            &dir.join("friction.tif"),
            &FrictionParams::default(),
        )
        .unwrap();

        let cost = dir.join("out/cost.tif");
        let nearest = dir.join("out/nearest.tif");
        let backlink = dir.join("out/backlink.tif");
        compute_traveltime(
            &friction_path,
            &targets,
            &cost,
            &nearest,
            Some(&backlink),
            "dijkstra",
        )
        .unwrap();

        for path in [&cost, &nearest, &backlink] {
            assert!(path.is_file(), "{} not written", path.display());
        }

        let cost_raster: Raster<f64> = read_geotiff(&cost, None).unwrap();
        assert_eq!(cost_raster.get(0, 0).unwrap(), 0.0);
        assert!(cost_raster.get(3, 3).unwrap() > 0.0);

        let nearest_raster: Raster<u32> = read_geotiff(&nearest, None).unwrap();
        assert_eq!(nearest_raster.get(0, 0).unwrap(), 1);
        assert_eq!(nearest_raster.get(5, 5).unwrap(), 2);

        // Re-running every stage is a no-op, not an error
        speed_from_roads(
            &network,
            &NetworkSpeeds::default(),
            grid_transform(),
            None,
            6,
            6,
            &dir.join("speed_roads.tif"),
        )
        .unwrap();
        compute_traveltime(
            &friction_path,
            &targets,
            &cost,
            &nearest,
            Some(&backlink),
            "dijkstra",
        )
        .unwrap();
    }

    #[test]
    fn test_unknown_method_fails_before_reading() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("does_not_exist.tif");

        // The method check comes first: no I/O error, an UnknownMethod error
        let err = compute_traveltime(
            &missing,
            &missing,
            &tmp.path().join("cost.tif"),
            &tmp.path().join("nearest.tif"),
            None,
            "r.cost",
        );
        assert!(matches!(err, Err(Error::UnknownMethod(_))));
    }
}
