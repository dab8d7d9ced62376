//! In-memory engine with no rendering.
//!
//! Mirrors the rules a real engine enforces (unique layer/source ids, no source
//! removal while a layer draws it) and records every camera request so controller
//! behavior can be asserted without a browser.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use indexmap::IndexMap;

use super::engine::{Cursor, FlyTo, HandlerId, LineStyle, MapEngine, MapEvent, MapHandler, MarkerRef, MarkerSpec};
use crate::config::MapConfig;
use crate::error::{EngineError, InitError};
use crate::models::{Bounds, LngLat, ViewportSnapshot};

/// What the headless engine pretends to render into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessSurface {
    pub webgl: bool,
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self { webgl: true }
    }
}

#[derive(Default)]
struct HeadlessState {
    loaded: bool,
    pending_load: Vec<Box<dyn FnOnce()>>,
    next_id: u64,
    markers: BTreeMap<MarkerRef, MarkerSpec>,
    sources: IndexMap<String, Vec<LngLat>>,
    layers: IndexMap<String, (String, LineStyle)>,
    handlers: BTreeMap<HandlerId, (MapEvent, MapHandler)>,
    cursor: Cursor,
    camera: ViewportSnapshot,
    fit_requests: Vec<(Bounds, f64)>,
    fly_requests: Vec<FlyTo>,
    popups: Vec<(LngLat, String)>,
    destroyed: bool,
}

impl HeadlessState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Cloning yields another handle to the same engine
#[derive(Clone, Default)]
pub struct HeadlessEngine {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessEngine {
    /// Complete the style load, running queued `on_load` callbacks
    pub fn finish_load(&self) {
        let pending = {
            let mut state = self.state.borrow_mut();
            state.loaded = true;
            std::mem::take(&mut state.pending_load)
        };
        for callback in pending {
            callback();
        }
    }

    /// Deliver `event` to every callback bound to it, in binding order
    pub fn fire(&self, event: &MapEvent, at: LngLat) {
        let handlers: Vec<MapHandler> = self
            .state
            .borrow()
            .handlers
            .values()
            .filter(|(bound, _)| bound == event)
            .map(|(_, handler)| Rc::clone(handler))
            .collect();
        for handler in handlers {
            handler(at);
        }
    }

    pub fn click_at(&self, at: LngLat) {
        self.fire(&MapEvent::Click, at);
    }

    /// Simulate a user pan/zoom gesture
    pub fn move_camera(&self, center: LngLat, zoom: f64) {
        self.set_camera(ViewportSnapshot { zoom, center });
    }

    /// Jump the camera and fire the events the browser engine would, synchronously
    fn set_camera(&self, camera: ViewportSnapshot) {
        let zoom_changed = {
            let mut state = self.state.borrow_mut();
            let changed = (state.camera.zoom - camera.zoom).abs() > f64::EPSILON;
            state.camera = camera;
            changed
        };
        self.fire(&MapEvent::Move, camera.center);
        if zoom_changed {
            self.fire(&MapEvent::Zoom, camera.center);
        }
    }

    #[must_use]
    pub fn handler_count(&self, event: &MapEvent) -> usize {
        self.state.borrow().handlers.values().filter(|(bound, _)| bound == event).count()
    }

    #[must_use]
    pub fn total_handlers(&self) -> usize {
        self.state.borrow().handlers.len()
    }

    #[must_use]
    pub fn markers(&self) -> Vec<MarkerSpec> {
        self.state.borrow().markers.values().cloned().collect()
    }

    #[must_use]
    pub fn markers_with_color(&self, color: &str) -> usize {
        self.state.borrow().markers.values().filter(|m| m.color == color).count()
    }

    #[must_use]
    pub fn layer_ids(&self) -> Vec<String> {
        self.state.borrow().layers.keys().cloned().collect()
    }

    #[must_use]
    pub fn source_ids(&self) -> Vec<String> {
        self.state.borrow().sources.keys().cloned().collect()
    }

    #[must_use]
    pub fn layer_style(&self, id: &str) -> Option<LineStyle> {
        self.state.borrow().layers.get(id).map(|(_, style)| style.clone())
    }

    #[must_use]
    pub fn source_geometry(&self, id: &str) -> Option<Vec<LngLat>> {
        self.state.borrow().sources.get(id).cloned()
    }

    #[must_use]
    pub fn cursor(&self) -> Cursor {
        self.state.borrow().cursor
    }

    #[must_use]
    pub fn fit_requests(&self) -> Vec<(Bounds, f64)> {
        self.state.borrow().fit_requests.clone()
    }

    #[must_use]
    pub fn fly_requests(&self) -> Vec<FlyTo> {
        self.state.borrow().fly_requests.clone()
    }

    #[must_use]
    pub fn popups(&self) -> Vec<(LngLat, String)> {
        self.state.borrow().popups.clone()
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.state.borrow().destroyed
    }
}

impl MapEngine for HeadlessEngine {
    type Container = HeadlessSurface;

    fn initialize(container: &HeadlessSurface, config: &MapConfig) -> Result<Self, InitError> {
        if !container.webgl {
            return Err(InitError::NoRenderContext);
        }
        config.credential()?;

        let engine = Self::default();
        engine.state.borrow_mut().camera = ViewportSnapshot {
            zoom: config.zoom,
            center: config.center,
        };
        Ok(engine)
    }

    fn destroy(&self) {
        let mut state = self.state.borrow_mut();
        state.handlers.clear();
        state.markers.clear();
        state.layers.clear();
        state.sources.clear();
        state.pending_load.clear();
        state.destroyed = true;
    }

    fn on_load(&self, callback: Box<dyn FnOnce()>) {
        let loaded = self.state.borrow().loaded;
        if loaded {
            callback();
        } else {
            self.state.borrow_mut().pending_load.push(callback);
        }
    }

    fn add_marker(&self, spec: &MarkerSpec) -> Result<MarkerRef, EngineError> {
        let mut state = self.state.borrow_mut();
        let marker = MarkerRef(state.next_id());
        state.markers.insert(marker, spec.clone());
        Ok(marker)
    }

    fn remove_marker(&self, marker: MarkerRef) {
        self.state.borrow_mut().markers.remove(&marker);
    }

    fn add_source(&self, id: &str, geometry: &[LngLat]) -> Result<(), EngineError> {
        let mut state = self.state.borrow_mut();
        if state.sources.contains_key(id) {
            return Err(EngineError(format!("There is already a source with ID \"{id}\"")));
        }
        state.sources.insert(id.to_string(), geometry.to_vec());
        Ok(())
    }

    fn add_layer(&self, id: &str, source_id: &str, style: &LineStyle) -> Result<(), EngineError> {
        let mut state = self.state.borrow_mut();
        if state.layers.contains_key(id) {
            return Err(EngineError(format!("Layer with id \"{id}\" already exists on this map")));
        }
        if !state.sources.contains_key(source_id) {
            return Err(EngineError(format!("Source \"{source_id}\" not found")));
        }
        state.layers.insert(id.to_string(), (source_id.to_string(), style.clone()));
        Ok(())
    }

    fn remove_layer(&self, id: &str) -> Result<(), EngineError> {
        self.state
            .borrow_mut()
            .layers
            .shift_remove(id)
            .map(|_| ())
            .ok_or_else(|| EngineError(format!("Layer \"{id}\" does not exist")))
    }

    fn remove_source(&self, id: &str) -> Result<(), EngineError> {
        let mut state = self.state.borrow_mut();
        if let Some(layer) = state.layers.iter().find(|(_, (source, _))| source == id).map(|(layer, _)| layer.clone()) {
            return Err(EngineError(format!(
                "Source \"{id}\" cannot be removed while layer \"{layer}\" is using it"
            )));
        }
        state
            .sources
            .shift_remove(id)
            .map(|_| ())
            .ok_or_else(|| EngineError(format!("Source \"{id}\" does not exist")))
    }

    fn has_layer(&self, id: &str) -> bool {
        self.state.borrow().layers.contains_key(id)
    }

    fn has_source(&self, id: &str) -> bool {
        self.state.borrow().sources.contains_key(id)
    }

    fn fly_to(&self, options: &FlyTo) {
        self.state.borrow_mut().fly_requests.push(*options);
        self.set_camera(ViewportSnapshot {
            zoom: options.zoom,
            center: options.center,
        });
    }

    fn fit_bounds(&self, bounds: &Bounds, padding: f64) {
        let zoom = {
            let mut state = self.state.borrow_mut();
            state.fit_requests.push((*bounds, padding));
            state.camera.zoom
        };
        self.set_camera(ViewportSnapshot {
            zoom,
            center: bounds.center(),
        });
    }

    fn viewport(&self) -> ViewportSnapshot {
        self.state.borrow().camera
    }

    fn set_cursor(&self, cursor: Cursor) {
        self.state.borrow_mut().cursor = cursor;
    }

    fn show_popup(&self, position: LngLat, html: &str) {
        self.state.borrow_mut().popups.push((position, html.to_string()));
    }

    fn on(&self, event: MapEvent, handler: MapHandler) -> HandlerId {
        let mut state = self.state.borrow_mut();
        let id = HandlerId(state.next_id());
        state.handlers.insert(id, (event, handler));
        id
    }

    fn off(&self, id: HandlerId) {
        self.state.borrow_mut().handlers.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn engine() -> HeadlessEngine {
        HeadlessEngine::initialize(&HeadlessSurface::default(), &MapConfig::with_token("pk.test"))
            .expect("engine should start")
    }

    #[test]
    fn test_initialize_requires_webgl_then_token() {
        let no_gl = HeadlessEngine::initialize(&HeadlessSurface { webgl: false }, &MapConfig::default());
        assert_eq!(no_gl.err(), Some(InitError::NoRenderContext));

        let no_token = HeadlessEngine::initialize(&HeadlessSurface::default(), &MapConfig::default());
        assert_eq!(no_token.err(), Some(InitError::MissingCredential));
    }

    #[test]
    fn test_source_cannot_be_removed_under_a_layer() {
        let engine = engine();
        engine.add_route_layer("route-0", "route-layer-0", &[], &LineStyle::primary()).expect("added");

        assert!(engine.remove_source("route-0").is_err());
        assert!(engine.add_source("route-0", &[]).is_err());

        engine.remove_route_layer("route-0", "route-layer-0").expect("removed in order");
        assert!(engine.layer_ids().is_empty());
        assert!(engine.source_ids().is_empty());
    }

    #[test]
    fn test_on_load_waits_for_finish() {
        let engine = engine();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        engine.on_load(Box::new(move || counter.set(counter.get() + 1)));
        assert_eq!(calls.get(), 0);
        engine.finish_load();
        assert_eq!(calls.get(), 1);

        let counter = Rc::clone(&calls);
        engine.on_load(Box::new(move || counter.set(counter.get() + 1)));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_fire_reaches_only_matching_handlers() {
        let engine = engine();
        let clicks = Rc::new(Cell::new(0));
        let counter = Rc::clone(&clicks);
        let id = engine.on_click(Rc::new(move |_| counter.set(counter.get() + 1)));
        engine.on_move(Rc::new(|_| panic!("move handler must not see clicks")));

        engine.click_at(LngLat::new(0.0, 0.0));
        assert_eq!(clicks.get(), 1);

        engine.off(id);
        engine.click_at(LngLat::new(0.0, 0.0));
        assert_eq!(clicks.get(), 1);
        assert_eq!(engine.handler_count(&MapEvent::Click), 0);
    }
}
