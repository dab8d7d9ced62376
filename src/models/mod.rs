mod endpoint;
mod geo;
mod marker;
mod route;

pub use endpoint::{EndpointKind, EndpointSelection, InteractionMode};
pub use geo::{
    is_valid_latitude, is_valid_longitude, Bounds, LngLat, ViewportSnapshot, MAX_LATITUDE, MAX_LONGITUDE,
    MIN_LATITUDE, MIN_LONGITUDE,
};
pub use marker::{
    is_hex_color, FieldError, Marker, MarkerPatch, NewMarker, ValidationErrors, DEFAULT_MARKER_COLOR,
    MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH,
};
pub use route::{RouteResult, RouteSearchRequest, RouteStep, TransitDetails, TravelMode};
