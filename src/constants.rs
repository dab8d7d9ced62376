use crate::models::LngLat;

/// Default camera center (Oran)
pub const DEFAULT_CENTER: LngLat = LngLat { lng: -0.6308, lat: 35.6971 };
pub const DEFAULT_ZOOM: f64 = 12.0;
pub const DEFAULT_PITCH: f64 = 0.0;
pub const DEFAULT_BEARING: f64 = 0.0;
pub const DEFAULT_STYLE_URL: &str = "mapbox://styles/mapbox/streets-v12";

pub const START_MARKER_COLOR: &str = "#22c55e";
pub const END_MARKER_COLOR: &str = "#ef4444";
pub const LOCATION_MARKER_COLOR: &str = "#0ea5e9";

pub const PRIMARY_ROUTE_COLOR: &str = "#2563eb";
pub const ALTERNATE_ROUTE_COLOR: &str = "#94a3b8";

/// Padding in pixels used when fitting a route's bounding box
pub const FIT_BOUNDS_PADDING: f64 = 50.0;

pub const FLY_TO_DURATION_MS: u32 = 1500;
pub const LOCATE_ZOOM: f64 = 15.0;

pub const GEOLOCATION_TIMEOUT_MS: u32 = 10_000;
pub const GEOLOCATION_MAX_AGE_MS: u32 = 60_000;
