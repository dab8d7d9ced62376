//! Everything that touches the map engine.

pub mod engine;
pub mod geolocation;
pub mod headless;
pub mod mapbox;
pub mod picking;
pub mod registry;
pub mod session;
pub mod view;
pub mod viewport;

pub use engine::{Cursor, FlyTo, HandlerId, LineStyle, MapEngine, MapEvent, MapHandler, MarkerRef, MarkerSpec};
pub use geolocation::GeolocationError;
pub use headless::{HeadlessEngine, HeadlessSurface};
pub use mapbox::MapboxEngine;
pub use view::{MapController, MapView, ViewState};
