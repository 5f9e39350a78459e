//! Vector features feeding the road-network rasterizer
//!
//! The accessibility core consumes already-extracted and filtered road
//! geometries (tag filtering of raw map data is an upstream concern). A road
//! segment is a line geometry plus the tags that determine its travel speed:
//! the road category and up to three quality descriptors.

use geo_types::LineString;

/// A road line feature with the tags relevant to speed resolution.
///
/// Geometry coordinates are expressed in the target grid's CRS; callers are
/// responsible for reprojecting beforehand. Quality tags are optional and
/// free-form (unrecognized values fall back to a neutral multiplier).
#[derive(Debug, Clone)]
pub struct RoadSegment {
    /// Line geometry in target-grid coordinates
    pub geometry: LineString<f64>,
    /// Road category tag (e.g. "primary", "track")
    pub highway: String,
    /// Track grade tag, if any (e.g. "grade3")
    pub tracktype: Option<String>,
    /// Surface quality tag, if any (e.g. "bad")
    pub smoothness: Option<String>,
    /// Surface material tag, if any (e.g. "asphalt")
    pub surface: Option<String>,
}

impl RoadSegment {
    /// Create a segment with a category and no quality tags
    pub fn new(geometry: LineString<f64>, highway: impl Into<String>) -> Self {
        Self {
            geometry,
            highway: highway.into(),
            tracktype: None,
            smoothness: None,
            surface: None,
        }
    }

    /// Set the tracktype tag
    pub fn with_tracktype(mut self, tracktype: impl Into<String>) -> Self {
        self.tracktype = Some(tracktype.into());
        self
    }

    /// Set the smoothness tag
    pub fn with_smoothness(mut self, smoothness: impl Into<String>) -> Self {
        self.smoothness = Some(smoothness.into());
        self
    }

    /// Set the surface tag
    pub fn with_surface(mut self, surface: impl Into<String>) -> Self {
        self.surface = Some(surface.into());
        self
    }
}

/// An ordered collection of road segments.
///
/// Order matters: when two segments touch the same cell during
/// rasterization, the later one wins.
#[derive(Debug, Clone, Default)]
pub struct RoadNetwork {
    pub segments: Vec<RoadSegment>,
}

impl RoadNetwork {
    pub fn new() -> Self {
        Self { segments: Vec::new() }
    }

    pub fn push(&mut self, segment: RoadSegment) {
        self.segments.push(segment);
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoadSegment> {
        self.segments.iter()
    }
}

impl IntoIterator for RoadNetwork {
    type Item = RoadSegment;
    type IntoIter = std::vec::IntoIter<RoadSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.into_iter()
    }
}

impl FromIterator<RoadSegment> for RoadNetwork {
    fn from_iter<I: IntoIterator<Item = RoadSegment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}
