//! Speed lookup tables
//!
//! Two static tables drive speed assignment: road categories with quality
//! multipliers, and land-cover classes with off-road walking speeds. Both
//! ship with built-in defaults and can be replaced from JSON files with the
//! same layout the original resource files used.

use accessgis_core::{Error, Result, RoadSegment};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Speeds associated with road-network tags.
///
/// `highway` maps a road category to its base speed in km/h. The three
/// quality maps (`tracktype`, `smoothness`, `surface`) hold multipliers in
/// (0, 1]; a tag that is absent or unrecognized contributes a neutral 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSpeeds {
    /// Base speed per road category (km/h)
    pub highway: HashMap<String, f64>,
    /// Track grade multipliers
    #[serde(default)]
    pub tracktype: HashMap<String, f64>,
    /// Surface quality multipliers
    #[serde(default)]
    pub smoothness: HashMap<String, f64>,
    /// Surface material multipliers
    #[serde(default)]
    pub surface: HashMap<String, f64>,
}

impl NetworkSpeeds {
    /// Load a speed table from a JSON file.
    ///
    /// Expected layout: an object with `highway`, `tracktype`, `smoothness`
    /// and `surface` keys, each mapping tag values to numbers.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        serde_json::from_reader(reader).map_err(|e| Error::Other(e.to_string()))
    }

    /// Resolve the speed (km/h) of a road segment from its tags.
    ///
    /// Returns `None` when the road category is not in the table — the
    /// segment is excluded from the speed raster, which is a policy, not an
    /// error. The worst single quality factor dominates: the final speed is
    /// the base speed times the minimum (not the product) of the three
    /// quality multipliers.
    pub fn segment_speed(
        &self,
        highway: &str,
        tracktype: Option<&str>,
        smoothness: Option<&str>,
        surface: Option<&str>,
    ) -> Option<f64> {
        let base_speed = *self.highway.get(highway)?;

        let tracktype = self.quality(&self.tracktype, tracktype);
        let smoothness = self.quality(&self.smoothness, smoothness);
        let surface = self.quality(&self.surface, surface);

        Some(base_speed * tracktype.min(smoothness).min(surface))
    }

    /// Resolve the speed of a [`RoadSegment`] feature.
    pub fn resolve(&self, segment: &RoadSegment) -> Option<f64> {
        self.segment_speed(
            &segment.highway,
            segment.tracktype.as_deref(),
            segment.smoothness.as_deref(),
            segment.surface.as_deref(),
        )
    }

    fn quality(&self, table: &HashMap<String, f64>, tag: Option<&str>) -> f64 {
        tag.and_then(|t| table.get(t)).copied().unwrap_or(1.0)
    }
}

impl Default for NetworkSpeeds {
    fn default() -> Self {
        let highway = [
            ("motorway", 100.0),
            ("trunk", 80.0),
            ("primary", 80.0),
            ("secondary", 60.0),
            ("tertiary", 50.0),
            ("unclassified", 30.0),
            ("residential", 25.0),
            ("service", 20.0),
            ("track", 20.0),
            ("path", 10.0),
        ];
        let tracktype = [
            ("grade1", 1.0),
            ("grade2", 0.8),
            ("grade3", 0.6),
            ("grade4", 0.4),
            ("grade5", 0.2),
        ];
        let smoothness = [
            ("excellent", 1.0),
            ("good", 0.9),
            ("intermediate", 0.7),
            ("bad", 0.5),
            ("very_bad", 0.35),
            ("horrible", 0.2),
            ("very_horrible", 0.1),
        ];
        let surface = [
            ("asphalt", 1.0),
            ("paved", 1.0),
            ("concrete", 1.0),
            ("compacted", 0.9),
            ("gravel", 0.8),
            ("fine_gravel", 0.8),
            ("unpaved", 0.6),
            ("dirt", 0.5),
            ("earth", 0.5),
            ("ground", 0.5),
            ("grass", 0.4),
            ("sand", 0.3),
            ("mud", 0.2),
        ];

        fn to_map(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
            pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
        }

        Self {
            highway: to_map(&highway),
            tracktype: to_map(&tracktype),
            smoothness: to_map(&smoothness),
            surface: to_map(&surface),
        }
    }
}

/// Off-road walking speed (km/h) per land-cover class.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandCoverSpeeds {
    pub classes: HashMap<String, f64>,
}

impl LandCoverSpeeds {
    /// Load a class/speed table from a flat JSON object.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        serde_json::from_reader(reader).map_err(|e| Error::Other(e.to_string()))
    }

    /// Speed for a land-cover class, if present
    pub fn get(&self, class: &str) -> Option<f64> {
        self.classes.get(class).copied()
    }
}

impl Default for LandCoverSpeeds {
    fn default() -> Self {
        let classes = [
            ("bare", 3.0),
            ("crops", 2.5),
            ("grass", 3.0),
            ("moss", 2.0),
            ("shrub", 2.0),
            ("snow", 1.0),
            ("tree", 2.0),
            ("urban", 5.0),
            ("water-permanent", 0.0),
            ("water-seasonal", 1.0),
        ];
        Self {
            classes: classes.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }
}
