//! The narrow capability surface every map engine is driven through.
//!
//! Nothing outside `crate::map` touches a concrete engine; the controller only sees
//! this trait, which keeps the browser engine and the headless test engine
//! interchangeable.

use std::rc::Rc;

use crate::config::MapConfig;
use crate::error::{EngineError, InitError};
use crate::models::{Bounds, LngLat, ViewportSnapshot};

/// Handle to an engine-side point marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerRef(pub u64);

/// Handle to a bound event callback, used to unbind exactly that callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub u64);

/// Engine events a callback can be bound to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapEvent {
    Click,
    Move,
    Zoom,
    LayerClick(String),
    LayerEnter(String),
    LayerLeave(String),
}

impl MapEvent {
    /// Engine event name
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            MapEvent::Click | MapEvent::LayerClick(_) => "click",
            MapEvent::Move => "move",
            MapEvent::Zoom => "zoom",
            MapEvent::LayerEnter(_) => "mouseenter",
            MapEvent::LayerLeave(_) => "mouseleave",
        }
    }

    #[must_use]
    pub fn layer(&self) -> Option<&str> {
        match self {
            MapEvent::LayerClick(id) | MapEvent::LayerEnter(id) | MapEvent::LayerLeave(id) => Some(id),
            _ => None,
        }
    }
}

/// Callback receiving the event position (the camera center for move/zoom events)
pub type MapHandler = Rc<dyn Fn(LngLat)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Crosshair,
    Pointer,
}

impl Cursor {
    #[must_use]
    pub fn css(self) -> &'static str {
        match self {
            Cursor::Default => "",
            Cursor::Crosshair => "crosshair",
            Cursor::Pointer => "pointer",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub position: LngLat,
    pub color: String,
    pub popup_html: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub color: &'static str,
    pub width: f64,
    pub opacity: f64,
}

impl LineStyle {
    #[must_use]
    pub fn primary() -> Self {
        Self {
            color: crate::constants::PRIMARY_ROUTE_COLOR,
            width: 6.0,
            opacity: 0.9,
        }
    }

    #[must_use]
    pub fn alternate() -> Self {
        Self {
            color: crate::constants::ALTERNATE_ROUTE_COLOR,
            width: 4.0,
            opacity: 0.7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyTo {
    pub center: LngLat,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
    pub duration_ms: u32,
}

impl FlyTo {
    /// Camera move back to the configured home view
    #[must_use]
    pub fn home(config: &MapConfig) -> Self {
        Self {
            center: config.center,
            zoom: config.zoom,
            pitch: config.pitch,
            bearing: config.bearing,
            duration_ms: crate::constants::FLY_TO_DURATION_MS,
        }
    }
}

/// Imperative map engine handle.
///
/// Methods take `&self`: an engine handle behaves like a reference to an engine
/// object living outside Rust, and callbacks must be able to call back into it.
pub trait MapEngine: Clone + 'static {
    /// Whatever the engine renders into
    type Container;

    /// Create the engine inside `container`
    ///
    /// # Errors
    ///
    /// Returns [`InitError`] when the render context is missing or construction fails
    fn initialize(container: &Self::Container, config: &MapConfig) -> Result<Self, InitError>;

    /// Tear the engine down, dropping every callback still bound
    fn destroy(&self);

    /// Run `callback` once the engine has loaded its style (immediately if already loaded)
    fn on_load(&self, callback: Box<dyn FnOnce()>);

    /// Add a point marker
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the marker
    fn add_marker(&self, spec: &MarkerSpec) -> Result<MarkerRef, EngineError>;
    fn remove_marker(&self, marker: MarkerRef);

    /// Add a GeoJSON line source
    ///
    /// # Errors
    ///
    /// Returns an error if a source with this id already exists
    fn add_source(&self, id: &str, geometry: &[LngLat]) -> Result<(), EngineError>;

    /// Add a line layer drawing `source_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the layer id is taken or the source is missing
    fn add_layer(&self, id: &str, source_id: &str, style: &LineStyle) -> Result<(), EngineError>;

    /// # Errors
    ///
    /// Returns an error if the layer does not exist
    fn remove_layer(&self, id: &str) -> Result<(), EngineError>;

    /// # Errors
    ///
    /// Returns an error if the source is missing or a layer still uses it
    fn remove_source(&self, id: &str) -> Result<(), EngineError>;

    fn has_layer(&self, id: &str) -> bool;
    fn has_source(&self, id: &str) -> bool;

    fn fly_to(&self, options: &FlyTo);
    fn fit_bounds(&self, bounds: &Bounds, padding: f64);
    fn viewport(&self) -> ViewportSnapshot;
    fn set_cursor(&self, cursor: Cursor);

    /// Open a popup at `position`
    fn show_popup(&self, position: LngLat, html: &str);

    fn on(&self, event: MapEvent, handler: MapHandler) -> HandlerId;
    fn off(&self, id: HandlerId);

    /// Add a source and the layer drawing it
    ///
    /// # Errors
    ///
    /// Returns the first engine rejection
    fn add_route_layer(&self, source_id: &str, layer_id: &str, geometry: &[LngLat], style: &LineStyle) -> Result<(), EngineError> {
        self.add_source(source_id, geometry)?;
        self.add_layer(layer_id, source_id, style)
    }

    /// Remove a layer and then its source. Engines refuse to drop a source that a
    /// layer still draws, so the order is fixed.
    ///
    /// # Errors
    ///
    /// Returns the first engine rejection
    fn remove_route_layer(&self, source_id: &str, layer_id: &str) -> Result<(), EngineError> {
        if self.has_layer(layer_id) {
            self.remove_layer(layer_id)?;
        }
        if self.has_source(source_id) {
            self.remove_source(source_id)?;
        }
        Ok(())
    }

    fn on_click(&self, handler: MapHandler) -> HandlerId {
        self.on(MapEvent::Click, handler)
    }

    fn on_move(&self, handler: MapHandler) -> HandlerId {
        self.on(MapEvent::Move, handler)
    }

    fn on_zoom(&self, handler: MapHandler) -> HandlerId {
        self.on(MapEvent::Zoom, handler)
    }
}
