use serde::{Deserialize, Serialize};

pub const MIN_LATITUDE: f64 = -90.0;
pub const MAX_LATITUDE: f64 = 90.0;
pub const MIN_LONGITUDE: f64 = -180.0;
pub const MAX_LONGITUDE: f64 = 180.0;

/// A geographic position. Field order follows the engine convention (lng first).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    #[must_use]
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        is_valid_latitude(self.lat) && is_valid_longitude(self.lng)
    }

    /// Human-readable `"lat, lng"` text with 4 decimal places
    #[must_use]
    pub fn display_text(&self) -> String {
        format!("{:.4}, {:.4}", self.lat, self.lng)
    }

    /// Parse `"lat, lng"` text (the format produced by [`LngLat::display_text`])
    #[must_use]
    pub fn parse_lat_lng(text: &str) -> Option<Self> {
        let (lat, lng) = text.split_once(',')?;
        let lat = lat.trim().parse::<f64>().ok()?;
        let lng = lng.trim().parse::<f64>().ok()?;
        let point = Self::new(lng, lat);
        point.is_valid().then_some(point)
    }

    #[must_use]
    pub fn as_array(&self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

#[must_use]
pub fn is_valid_latitude(lat: f64) -> bool {
    (MIN_LATITUDE..=MAX_LATITUDE).contains(&lat)
}

#[must_use]
pub fn is_valid_longitude(lng: f64) -> bool {
    (MIN_LONGITUDE..=MAX_LONGITUDE).contains(&lng)
}

/// Axis-aligned bounding box as returned by the route search API
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub southwest: LngLat,
    pub northeast: LngLat,
}

impl Bounds {
    /// Smallest box covering every point, `None` for an empty slice
    #[must_use]
    pub fn covering(points: &[LngLat]) -> Option<Self> {
        let first = points.first()?;
        let mut southwest = *first;
        let mut northeast = *first;
        for point in &points[1..] {
            southwest.lng = southwest.lng.min(point.lng);
            southwest.lat = southwest.lat.min(point.lat);
            northeast.lng = northeast.lng.max(point.lng);
            northeast.lat = northeast.lat.max(point.lat);
        }
        Some(Self { southwest, northeast })
    }

    #[must_use]
    pub fn center(&self) -> LngLat {
        LngLat::new(
            (self.southwest.lng + self.northeast.lng) / 2.0,
            (self.southwest.lat + self.northeast.lat) / 2.0,
        )
    }
}

/// Read-only view of the engine camera, recomputed on every move/zoom event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportSnapshot {
    pub zoom: f64,
    pub center: LngLat,
}

impl ViewportSnapshot {
    #[must_use]
    pub fn zoom_text(&self) -> String {
        format!("{:.2}", self.zoom)
    }

    #[must_use]
    pub fn center_text(&self) -> String {
        self.center.display_text()
    }
}

impl Default for ViewportSnapshot {
    fn default() -> Self {
        Self {
            zoom: crate::constants::DEFAULT_ZOOM,
            center: crate::constants::DEFAULT_CENTER,
        }
    }
}
