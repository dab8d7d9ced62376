//! The view controller: one state object owning the engine and every piece of
//! map-side bookkeeping.
//!
//! UI code holds a [`MapView`], a cheap clonable handle. Engine callbacks only hold
//! a weak reference and back off (logging the dropped event) when the controller
//! is already borrowed; camera events instead mark the viewport stale, and it is
//! recomputed as soon as the borrow ends. Listeners are notified after the borrow is released, so a
//! listener may call straight back into the view.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::{Rc, Weak};

use leptos::logging::{error, warn};

use super::engine::{FlyTo, MapEngine, MapHandler};
use super::geolocation::GeolocationError;
use super::picking::PickingMachine;
use super::registry::OverlayRegistry;
use super::session::RouteSession;
use super::viewport::ViewportReflector;
use crate::api::{MarkerApi, RouteSearchApi};
use crate::config::MapConfig;
use crate::constants::{FIT_BOUNDS_PADDING, LOCATE_ZOOM};
use crate::error::{ApiError, InitError, RouteError};
use crate::log;
use crate::models::{
    Bounds, EndpointKind, EndpointSelection, FieldError, InteractionMode, LngLat, Marker, NewMarker, RouteResult,
    TravelMode, ValidationErrors, ViewportSnapshot,
};

/// Everything the UI renders from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub mode: InteractionMode,
    pub start: EndpointSelection,
    pub end: EndpointSelection,
    pub routes: Vec<RouteResult>,
    pub is_loading: bool,
    pub last_error: Option<String>,
    pub viewport: ViewportSnapshot,
    pub markers: Vec<Marker>,
    pub is_locating: bool,
}

pub struct MapController<E: MapEngine> {
    config: MapConfig,
    engine: Option<E>,
    registry: OverlayRegistry,
    picking: PickingMachine,
    session: RouteSession,
    viewport: ViewportReflector,
    start: EndpointSelection,
    end: EndpointSelection,
    markers: Vec<Marker>,
    last_error: Option<String>,
    locating: bool,
}

impl<E: MapEngine> MapController<E> {
    fn new(config: MapConfig, engine: E) -> Self {
        Self {
            config,
            engine: Some(engine),
            registry: OverlayRegistry::new(),
            picking: PickingMachine::new(),
            session: RouteSession::new(),
            viewport: ViewportReflector::new(),
            start: EndpointSelection::default(),
            end: EndpointSelection::default(),
            markers: Vec::new(),
            last_error: None,
            locating: false,
        }
    }

    #[must_use]
    pub fn state(&self) -> ViewState {
        ViewState {
            mode: self.picking.mode(),
            start: self.start.clone(),
            end: self.end.clone(),
            routes: self.session.results().to_vec(),
            is_loading: self.session.is_loading(),
            last_error: self.last_error.clone(),
            viewport: self.viewport.snapshot(),
            markers: self.markers.clone(),
            is_locating: self.locating,
        }
    }

    #[must_use]
    pub fn engine(&self) -> Option<&E> {
        self.engine.as_ref()
    }

    #[must_use]
    pub fn registry(&self) -> &OverlayRegistry {
        &self.registry
    }

    fn endpoint_mut(&mut self, kind: EndpointKind) -> &mut EndpointSelection {
        match kind {
            EndpointKind::Start => &mut self.start,
            EndpointKind::End => &mut self.end,
        }
    }

    fn refresh_viewport(&mut self) {
        if let Some(engine) = &self.engine {
            self.viewport.refresh(engine);
        }
    }

    /// A map click while picking `kind`
    fn complete_pick(&mut self, kind: EndpointKind, at: LngLat) {
        if self.picking.mode().target() != Some(kind) {
            return;
        }
        let shown = self
            .registry
            .place_endpoint_marker(self.engine.as_ref(), kind, at, kind.marker_color());
        *self.endpoint_mut(kind) = EndpointSelection {
            has_marker: shown,
            ..EndpointSelection::from_point(at)
        };
        self.picking.cancel(self.engine.as_ref());
    }

    fn set_endpoint_text(&mut self, kind: EndpointKind, text: &str) {
        let coordinates = LngLat::parse_lat_lng(text);
        let has_marker = match coordinates {
            Some(point) => self
                .registry
                .place_endpoint_marker(self.engine.as_ref(), kind, point, kind.marker_color()),
            None => {
                self.registry.remove_endpoint_marker(self.engine.as_ref(), kind);
                false
            }
        };
        *self.endpoint_mut(kind) = EndpointSelection {
            coordinates,
            display_text: text.to_string(),
            has_marker,
        };
    }

    fn settle_search(&mut self, seq: u64, outcome: Result<Vec<RouteResult>, ApiError>) -> Result<usize, RouteError> {
        let routes = match self.session.settle(seq, outcome) {
            Ok(routes) => routes.to_vec(),
            Err(RouteError::Superseded) => {
                log!("Discarding route response {}: a newer search was accepted", seq);
                return Err(RouteError::Superseded);
            }
            Err(e) => {
                warn!("Route search failed: {e}");
                self.last_error = Some(e.to_string());
                return Err(e);
            }
        };

        let fallback: Vec<LngLat> = self.start.coordinates.into_iter().chain(self.end.coordinates).collect();
        let fallback = if fallback.len() == 2 { fallback } else { Vec::new() };
        let rendered = self.registry.render_routes(self.engine.as_ref(), &routes, &fallback);

        let bounds = routes.first().and_then(|route| route.bounds).or_else(|| {
            self.registry
                .route_overlays()
                .first()
                .and_then(|overlay| Bounds::covering(&overlay.geometry))
        });
        if let (Some(engine), Some(bounds)) = (&self.engine, bounds) {
            engine.fit_bounds(&bounds, FIT_BOUNDS_PADDING);
        }

        self.last_error = None;
        Ok(rendered)
    }

    fn reset(&mut self) {
        let engine = self.engine.as_ref();
        self.picking.cancel(engine);
        self.session.reset();
        self.registry.clear_routes(engine);
        self.registry.clear_endpoint_markers(engine);
        self.start = EndpointSelection::default();
        self.end = EndpointSelection::default();
        self.last_error = None;
    }

    fn show_markers(&mut self, markers: Vec<Marker>) {
        self.registry.show_saved_markers(self.engine.as_ref(), &markers);
        self.markers = markers;
    }

    fn fly_to_location(&mut self, at: LngLat) {
        self.registry.place_location_marker(self.engine.as_ref(), at);
        if let Some(engine) = &self.engine {
            engine.fly_to(&FlyTo {
                center: at,
                zoom: LOCATE_ZOOM,
                ..FlyTo::home(&self.config)
            });
        }
    }

    fn unmount(&mut self) {
        let engine = self.engine.take();
        self.registry.clear_all(engine.as_ref());
        self.picking.cancel(engine.as_ref());
        self.viewport.detach(engine.as_ref());
        self.session.reset();
        if let Some(engine) = engine {
            engine.destroy();
        }
    }
}

type Listener = Rc<dyn Fn(&ViewState)>;

struct Shared<E: MapEngine> {
    controller: RefCell<MapController<E>>,
    listener: RefCell<Option<Listener>>,
    /// A camera event arrived while the controller was borrowed
    viewport_stale: Cell<bool>,
}

/// Shared handle to a mounted map view
pub struct MapView<E: MapEngine> {
    shared: Rc<Shared<E>>,
}

impl<E: MapEngine> Clone for MapView<E> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<E: MapEngine> MapView<E> {
    /// Create the engine inside `container` and start reflecting its viewport
    ///
    /// # Errors
    ///
    /// Returns the engine's [`InitError`]; nothing else is started in that case
    pub fn mount(container: &E::Container, config: MapConfig) -> Result<Self, InitError> {
        let engine = E::initialize(container, &config)?;
        let view = Self {
            shared: Rc::new(Shared {
                controller: RefCell::new(MapController::new(config, engine.clone())),
                listener: RefCell::new(None),
                viewport_stale: Cell::new(false),
            }),
        };

        let weak = Rc::downgrade(&view.shared);
        let on_camera: MapHandler = Rc::new(move |_| Self::camera_changed(&weak));
        view.update(|controller| controller.viewport.attach(&engine, &on_camera));

        let weak = Rc::downgrade(&view.shared);
        engine.on_load(Box::new(move || {
            log!("Map style loaded");
            Self::camera_changed(&weak);
        }));

        Ok(view)
    }

    /// Mount, hand the live view to `on_mount`, then load the saved markers.
    /// A failed mount returns before anything is requested from `api`.
    ///
    /// # Errors
    ///
    /// Returns the engine's [`InitError`]
    pub async fn mount_and_load<A: MarkerApi>(
        container: &E::Container,
        config: MapConfig,
        api: &A,
        on_mount: impl FnOnce(&Self),
    ) -> Result<Self, InitError> {
        let view = Self::mount(container, config)?;
        on_mount(&view);
        let count = view.load_markers(api).await;
        log!("Loaded {} saved markers", count);
        Ok(view)
    }

    /// Called with the new state after every change
    pub fn set_listener(&self, listener: impl Fn(&ViewState) + 'static) {
        *self.shared.listener.borrow_mut() = Some(Rc::new(listener));
    }

    #[must_use]
    pub fn state(&self) -> ViewState {
        self.shared.controller.borrow().state()
    }

    /// Read access for inspection
    pub fn with<R>(&self, f: impl FnOnce(&MapController<E>) -> R) -> R {
        let result = f(&self.shared.controller.borrow());
        self.flush_viewport();
        result
    }

    fn update<R>(&self, f: impl FnOnce(&mut MapController<E>) -> R) -> R {
        let (result, state) = {
            let mut controller = self.shared.controller.borrow_mut();
            let result = f(&mut controller);
            if self.shared.viewport_stale.take() {
                controller.refresh_viewport();
            }
            (result, controller.state())
        };
        self.notify(&state);
        result
    }

    /// Recompute a viewport left stale by camera events during a read borrow
    fn flush_viewport(&self) {
        if !self.shared.viewport_stale.get() {
            return;
        }
        let state = {
            let Ok(mut controller) = self.shared.controller.try_borrow_mut() else { return };
            self.shared.viewport_stale.set(false);
            controller.refresh_viewport();
            controller.state()
        };
        self.notify(&state);
    }

    /// Move/zoom/load callback. Never dropped: while the controller is busy the
    /// refresh is deferred to the end of the current borrow.
    fn camera_changed(weak: &Weak<Shared<E>>) {
        let Some(shared) = weak.upgrade() else { return };
        if shared.controller.try_borrow_mut().is_err() {
            shared.viewport_stale.set(true);
            return;
        }
        Self { shared }.update(MapController::refresh_viewport);
    }

    fn notify(&self, state: &ViewState) {
        let listener = self.shared.listener.borrow().clone();
        if let Some(listener) = listener {
            listener(state);
        }
    }

    /// Entry point for engine callbacks
    fn update_weak(weak: &Weak<Shared<E>>, f: impl FnOnce(&mut MapController<E>)) {
        let Some(shared) = weak.upgrade() else { return };
        let state = {
            let Ok(mut controller) = shared.controller.try_borrow_mut() else {
                warn!("Map event dropped: view is busy");
                return;
            };
            f(&mut controller);
            if shared.viewport_stale.take() {
                controller.refresh_viewport();
            }
            controller.state()
        };
        Self { shared }.notify(&state);
    }

    /// Press the "pick on map" button for `kind`
    pub fn toggle_picking(&self, kind: EndpointKind) {
        let weak = Rc::downgrade(&self.shared);
        self.update(|controller| {
            let engine = controller.engine.clone();
            controller.picking.toggle(engine.as_ref(), kind, move |kind| {
                Rc::new(move |at| Self::update_weak(&weak, |c| c.complete_pick(kind, at)))
            });
        });
    }

    pub fn cancel_picking(&self) {
        self.update(|controller| {
            let engine = controller.engine.clone();
            controller.picking.cancel(engine.as_ref());
        });
    }

    /// Typed endpoint text. `"lat, lng"` input also places the endpoint marker.
    pub fn set_endpoint_text(&self, kind: EndpointKind, text: &str) {
        self.update(|controller| controller.set_endpoint_text(kind, text));
    }

    /// Search routes between the current endpoints and draw the results.
    /// Returns the number of routes drawn.
    ///
    /// # Errors
    ///
    /// See [`RouteError`]; on any error the previously drawn routes stay on the map
    pub async fn search<A: RouteSearchApi>(&self, api: &A, mode: TravelMode) -> Result<usize, RouteError> {
        let ticket = self.update(|controller| {
            let ticket = controller.session.begin(&controller.start, &controller.end, mode);
            controller.last_error = ticket.as_ref().err().map(ToString::to_string);
            ticket
        })?;

        let outcome = api.search_routes(&ticket.request).await;
        self.update(|controller| controller.settle_search(ticket.seq, outcome))
    }

    /// Clear endpoints, their markers, every route and any picking state
    pub fn reset(&self) {
        self.update(MapController::reset);
    }

    /// Fly back to the configured home view
    pub fn reset_viewport(&self) {
        self.update(|controller| {
            if let Some(engine) = &controller.engine {
                engine.fly_to(&FlyTo::home(&controller.config));
            }
        });
    }

    /// Show the saved markers. A failed load is logged and leaves the map without
    /// saved markers. Returns how many are shown.
    pub async fn load_markers<A: MarkerApi>(&self, api: &A) -> usize {
        let markers = match api.list_markers().await {
            Ok(markers) => markers,
            Err(e) => {
                error!("Failed to load markers: {e}");
                Vec::new()
            }
        };
        let count = markers.len();
        self.update(|controller| controller.show_markers(markers));
        count
    }

    /// Persist the current `kind` endpoint as a saved marker
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] without sending anything when the endpoint has
    /// no coordinates or the title is invalid
    pub async fn save_endpoint_as_marker<A: MarkerApi>(&self, api: &A, kind: EndpointKind, title: &str) -> Result<Marker, ApiError> {
        let coordinates = self.with(|controller| match kind {
            EndpointKind::Start => controller.start.coordinates,
            EndpointKind::End => controller.end.coordinates,
        });
        let Some(position) = coordinates else {
            return Err(ApiError::Validation(ValidationErrors(vec![FieldError {
                field: "coordinates".to_string(),
                message: format!("pick a {} point on the map first", kind.label().to_lowercase()),
            }])));
        };

        let input = NewMarker {
            color: kind.marker_color().to_string(),
            ..NewMarker::new(title.trim(), position)
        };
        input.validate()?;

        let marker = api.create_marker(&input).await?;
        self.update(|controller| {
            controller.registry.add_saved_marker(controller.engine.as_ref(), &marker);
            controller.markers.push(marker.clone());
        });
        Ok(marker)
    }

    /// Delete a saved marker. Returns `false` when the server did not know it.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; the marker stays shown
    pub async fn delete_marker<A: MarkerApi>(&self, api: &A, id: &str) -> Result<bool, ApiError> {
        let deleted = api.delete_marker(id).await?;
        if deleted {
            self.update(|controller| {
                controller.registry.remove_saved_marker(controller.engine.as_ref(), id);
                controller.markers.retain(|marker| marker.id != id);
            });
        }
        Ok(deleted)
    }

    /// Center on the device position
    ///
    /// # Errors
    ///
    /// Returns the lookup's [`GeolocationError`]; it is also kept as the last error
    pub async fn locate<F>(&self, lookup: F) -> Result<LngLat, GeolocationError>
    where
        F: Future<Output = Result<LngLat, GeolocationError>>,
    {
        self.update(|controller| controller.locating = true);
        let outcome = lookup.await;
        self.update(|controller| {
            controller.locating = false;
            match outcome {
                Ok(at) => {
                    controller.fly_to_location(at);
                    Ok(at)
                }
                Err(e) => {
                    warn!("Geolocation failed: {e}");
                    controller.last_error = Some(e.to_string());
                    Err(e)
                }
            }
        })
    }

    /// Remove every overlay and handler, then destroy the engine
    pub fn unmount(&self) {
        self.update(MapController::unmount);
        *self.shared.listener.borrow_mut() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::engine::{Cursor, MapEvent};
    use crate::map::headless::{HeadlessEngine, HeadlessSurface};
    use crate::map::registry::{route_layer_id, route_source_id};
    use chrono::Utc;
    use futures::channel::oneshot;
    use futures::executor::block_on;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    type Reply = Result<Vec<RouteResult>, ApiError>;

    #[derive(Default)]
    struct StubApi {
        replies: RefCell<VecDeque<Reply>>,
        pending: RefCell<VecDeque<oneshot::Receiver<Reply>>>,
        markers: RefCell<Vec<Marker>>,
        fail_markers: bool,
        search_calls: Cell<usize>,
        marker_calls: Cell<usize>,
    }

    impl RouteSearchApi for StubApi {
        async fn search_routes(&self, _request: &crate::models::RouteSearchRequest) -> Reply {
            self.search_calls.set(self.search_calls.get() + 1);
            let pending = self.pending.borrow_mut().pop_front();
            if let Some(receiver) = pending {
                return receiver.await.unwrap_or_else(|_| Err(ApiError::Network("dropped".to_string())));
            }
            self.replies.borrow_mut().pop_front().unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    impl MarkerApi for StubApi {
        async fn list_markers(&self) -> Result<Vec<Marker>, ApiError> {
            self.marker_calls.set(self.marker_calls.get() + 1);
            if self.fail_markers {
                return Err(ApiError::Network("offline".to_string()));
            }
            Ok(self.markers.borrow().clone())
        }

        async fn get_marker(&self, id: &str) -> Result<Marker, ApiError> {
            self.markers
                .borrow()
                .iter()
                .find(|marker| marker.id == id)
                .cloned()
                .ok_or(ApiError::NotFound)
        }

        async fn create_marker(&self, input: &NewMarker) -> Result<Marker, ApiError> {
            self.marker_calls.set(self.marker_calls.get() + 1);
            let marker = saved_marker(&format!("m{}", self.markers.borrow().len() + 1), input.latitude, input.longitude);
            let marker = Marker {
                title: input.title.clone(),
                color: input.color.clone(),
                ..marker
            };
            self.markers.borrow_mut().push(marker.clone());
            Ok(marker)
        }

        async fn update_marker(&self, _id: &str, _patch: &crate::models::MarkerPatch) -> Result<Marker, ApiError> {
            Err(ApiError::NotFound)
        }

        async fn delete_marker(&self, id: &str) -> Result<bool, ApiError> {
            self.marker_calls.set(self.marker_calls.get() + 1);
            let mut markers = self.markers.borrow_mut();
            let before = markers.len();
            markers.retain(|marker| marker.id != id);
            Ok(markers.len() != before)
        }
    }

    fn saved_marker(id: &str, latitude: f64, longitude: f64) -> Marker {
        Marker {
            id: id.to_string(),
            title: format!("Marker {id}"),
            description: None,
            latitude,
            longitude,
            color: "#3b82f6".to_string(),
            created_at: Utc::now(),
        }
    }

    fn route(duration: &str, bounds: Option<Bounds>, geometry: Vec<LngLat>) -> RouteResult {
        RouteResult {
            duration: duration.to_string(),
            distance: "3.2 km".to_string(),
            steps: Vec::new(),
            bounds,
            geometry,
        }
    }

    fn mounted() -> (MapView<HeadlessEngine>, HeadlessEngine) {
        let view = MapView::<HeadlessEngine>::mount(&HeadlessSurface::default(), MapConfig::with_token("pk.test"))
            .expect("view should mount");
        let engine = view.with(|c| c.engine().cloned()).expect("engine is live");
        (view, engine)
    }

    #[test]
    fn test_blank_destination_is_rejected_without_request() {
        let (view, _engine) = mounted();
        let api = StubApi::default();
        view.set_endpoint_text(EndpointKind::Start, "A");

        let result = block_on(view.search(&api, TravelMode::Transit));
        assert!(matches!(result, Err(RouteError::Validation(_))));
        assert_eq!(api.search_calls.get(), 0);
        assert!(!view.state().is_loading);
        assert!(view.state().last_error.is_some());
    }

    #[test]
    fn test_two_routes_render_and_fit_returned_bounds() {
        let (view, engine) = mounted();
        let bounds = Bounds {
            southwest: LngLat::new(-0.65, 35.69),
            northeast: LngLat::new(-0.63, 35.70),
        };
        let api = StubApi::default();
        api.replies.borrow_mut().push_back(Ok(vec![
            route("18 min", Some(bounds), vec![LngLat::new(-0.63, 35.70), LngLat::new(-0.65, 35.69)]),
            route("24 min", Some(bounds), vec![LngLat::new(-0.63, 35.70), LngLat::new(-0.64, 35.695), LngLat::new(-0.65, 35.69)]),
        ]));

        view.set_endpoint_text(EndpointKind::Start, "35.70,-0.63");
        view.set_endpoint_text(EndpointKind::End, "35.69,-0.65");
        let drawn = block_on(view.search(&api, TravelMode::Transit)).expect("search succeeds");

        assert_eq!(drawn, 2);
        assert_eq!(view.with(|c| c.registry().route_overlays().len()), 2);
        assert_eq!(engine.layer_ids(), vec![route_layer_id(0), route_layer_id(1)]);
        assert_eq!(engine.fit_requests(), vec![(bounds, FIT_BOUNDS_PADDING)]);

        let state = view.state();
        assert_eq!(state.routes.len(), 2);
        assert!(!state.is_loading);
        assert_eq!(engine.markers_with_color(EndpointKind::Start.marker_color()), 1);
        assert_eq!(engine.markers_with_color(EndpointKind::End.marker_color()), 1);
    }

    #[test]
    fn test_route_without_geometry_draws_straight_segment() {
        let (view, engine) = mounted();
        let api = StubApi::default();
        api.replies.borrow_mut().push_back(Ok(vec![route("5 min", None, Vec::new())]));

        view.set_endpoint_text(EndpointKind::Start, "35.70, -0.63");
        view.set_endpoint_text(EndpointKind::End, "35.69, -0.65");
        block_on(view.search(&api, TravelMode::Walking)).expect("search succeeds");

        let straight = vec![LngLat::new(-0.63, 35.70), LngLat::new(-0.65, 35.69)];
        assert_eq!(engine.source_geometry(&route_source_id(0)), Some(straight.clone()));
        assert_eq!(engine.fit_requests().len(), 1);
        assert_eq!(engine.fit_requests()[0].0, Bounds::covering(&straight).expect("two points"));
    }

    #[test]
    fn test_failed_or_empty_search_keeps_previous_routes() {
        let (view, engine) = mounted();
        let api = StubApi::default();
        api.replies.borrow_mut().extend([
            Ok(vec![route("10 min", None, vec![LngLat::new(0.0, 0.0), LngLat::new(1.0, 1.0)])]),
            Err(ApiError::Network("offline".to_string())),
            Ok(Vec::new()),
        ]);
        view.set_endpoint_text(EndpointKind::Start, "Gare SNTF");
        view.set_endpoint_text(EndpointKind::End, "Front de Mer");

        block_on(view.search(&api, TravelMode::Transit)).expect("first search succeeds");
        let failed = block_on(view.search(&api, TravelMode::Transit));
        assert!(matches!(failed, Err(RouteError::Api(ApiError::Network(_)))));
        let empty = block_on(view.search(&api, TravelMode::Transit));
        assert_eq!(empty, Err(RouteError::NoRoutes));

        assert_eq!(engine.layer_ids(), vec![route_layer_id(0)]);
        let state = view.state();
        assert!(!state.is_loading);
        assert_eq!(state.routes[0].duration, "10 min");
        assert_eq!(state.last_error, Some(RouteError::NoRoutes.to_string()));
    }

    #[test]
    fn test_pick_start_on_map() {
        let (view, engine) = mounted();
        view.toggle_picking(EndpointKind::Start);
        assert_eq!(view.state().mode, InteractionMode::PickingStart);
        assert_eq!(engine.cursor(), Cursor::Crosshair);

        engine.click_at(LngLat::new(-0.63, 35.70));

        let state = view.state();
        assert_eq!(state.start.coordinates, Some(LngLat::new(-0.63, 35.70)));
        assert_eq!(state.start.display_text, "35.7000, -0.6300");
        assert!(state.start.has_marker);
        assert_eq!(state.mode, InteractionMode::Idle);
        assert_eq!(engine.markers_with_color(EndpointKind::Start.marker_color()), 1);
        assert_eq!(engine.markers().len(), 1);
        assert_eq!(engine.handler_count(&MapEvent::Click), 0);
        assert_eq!(engine.cursor(), Cursor::Default);

        // a later click must not move the endpoint
        engine.click_at(LngLat::new(-0.70, 35.60));
        assert_eq!(view.state().start.coordinates, Some(LngLat::new(-0.63, 35.70)));
    }

    #[test]
    fn test_repicking_replaces_endpoint_marker() {
        let (view, engine) = mounted();
        for at in [LngLat::new(-0.63, 35.70), LngLat::new(-0.64, 35.71)] {
            view.toggle_picking(EndpointKind::End);
            engine.click_at(at);
        }
        assert_eq!(engine.markers_with_color(EndpointKind::End.marker_color()), 1);
        assert_eq!(view.state().end.display_text, "35.7100, -0.6400");
    }

    #[test]
    fn test_no_render_context_fails_before_marker_load() {
        let api = StubApi::default();
        let mounted = Cell::new(false);
        let surface = HeadlessSurface { webgl: false };

        let result = block_on(MapView::<HeadlessEngine>::mount_and_load(&surface, MapConfig::default(), &api, |_| {
            mounted.set(true);
        }));

        assert_eq!(result.err(), Some(InitError::NoRenderContext));
        assert!(!mounted.get());
        assert_eq!(api.marker_calls.get(), 0);

        let missing_token = block_on(MapView::<HeadlessEngine>::mount_and_load(
            &HeadlessSurface::default(),
            MapConfig::default(),
            &api,
            |_| mounted.set(true),
        ));
        assert_eq!(missing_token.err(), Some(InitError::MissingCredential));
        assert_eq!(api.marker_calls.get(), 0);
    }

    #[test]
    fn test_mount_then_load_markers_once() {
        let api = StubApi::default();
        api.markers.borrow_mut().push(saved_marker("m1", 35.7, -0.6));
        let calls_at_mount = Cell::new(None);

        let view = block_on(MapView::<HeadlessEngine>::mount_and_load(
            &HeadlessSurface::default(),
            MapConfig::with_token("pk.test"),
            &api,
            |_| calls_at_mount.set(Some(api.marker_calls.get())),
        ))
        .expect("view should mount");

        assert_eq!(calls_at_mount.get(), Some(0));
        assert_eq!(api.marker_calls.get(), 1);
        assert_eq!(view.state().markers.len(), 1);
    }

    #[test]
    fn test_reset_clears_everything_but_saved_markers() {
        let (view, engine) = mounted();
        let api = StubApi::default();
        api.markers.borrow_mut().push(saved_marker("m1", 35.7, -0.6));
        api.replies
            .borrow_mut()
            .push_back(Ok(vec![route("9 min", None, vec![LngLat::new(0.0, 0.0), LngLat::new(1.0, 1.0)])]));

        block_on(view.load_markers(&api));
        view.set_endpoint_text(EndpointKind::Start, "35.70, -0.63");
        view.set_endpoint_text(EndpointKind::End, "35.69, -0.65");
        block_on(view.search(&api, TravelMode::Transit)).expect("search succeeds");
        view.toggle_picking(EndpointKind::Start);

        view.reset();

        let state = view.state();
        assert_eq!(state.mode, InteractionMode::Idle);
        assert_eq!(state.start, EndpointSelection::default());
        assert_eq!(state.end, EndpointSelection::default());
        assert!(state.routes.is_empty());
        assert!(engine.layer_ids().is_empty());
        assert!(engine.source_ids().is_empty());
        assert_eq!(engine.markers().len(), 1, "only the saved marker remains");
        assert_eq!(engine.handler_count(&MapEvent::Click), 0);
    }

    #[test]
    fn test_late_response_never_overwrites_newer_search() {
        let (view, engine) = mounted();
        let api = StubApi::default();
        let (older_tx, older_rx) = oneshot::channel();
        let (newer_tx, newer_rx) = oneshot::channel();
        api.pending.borrow_mut().extend([older_rx, newer_rx]);
        view.set_endpoint_text(EndpointKind::Start, "A");
        view.set_endpoint_text(EndpointKind::End, "B");

        let (older, newer, ()) = block_on(async {
            futures::join!(view.search(&api, TravelMode::Transit), view.search(&api, TravelMode::Transit), async {
                let _ = newer_tx.send(Ok(vec![route("newer", None, vec![LngLat::new(0.0, 0.0), LngLat::new(1.0, 1.0)])]));
                futures::pending!();
                let _ = older_tx.send(Ok(vec![
                    route("older", None, vec![LngLat::new(0.0, 0.0), LngLat::new(2.0, 2.0)]),
                    route("older alt", None, vec![LngLat::new(0.0, 0.0), LngLat::new(3.0, 3.0)]),
                ]));
            })
        });

        assert_eq!(newer, Ok(1));
        assert_eq!(older, Err(RouteError::Superseded));
        assert_eq!(view.state().routes[0].duration, "newer");
        assert_eq!(engine.layer_ids(), vec![route_layer_id(0)]);
        assert!(!view.state().is_loading);
    }

    #[test]
    fn test_load_markers_degrades_to_empty() {
        let (view, engine) = mounted();
        let api = StubApi {
            fail_markers: true,
            ..StubApi::default()
        };
        assert_eq!(block_on(view.load_markers(&api)), 0);
        assert!(view.state().markers.is_empty());
        assert!(engine.markers().is_empty());

        let api = StubApi::default();
        api.markers
            .borrow_mut()
            .extend([saved_marker("m1", 35.7, -0.6), saved_marker("m2", 35.71, -0.61)]);
        assert_eq!(block_on(view.load_markers(&api)), 2);
        assert_eq!(engine.markers().len(), 2);
        assert_eq!(view.with(|c| c.registry().saved_marker_count()), 2);
    }

    #[test]
    fn test_save_and_delete_endpoint_marker() {
        let (view, engine) = mounted();
        let api = StubApi::default();

        let missing = block_on(view.save_endpoint_as_marker(&api, EndpointKind::Start, "Home"));
        assert!(matches!(missing, Err(ApiError::Validation(_))));
        let blank_title = {
            view.set_endpoint_text(EndpointKind::Start, "35.70, -0.63");
            block_on(view.save_endpoint_as_marker(&api, EndpointKind::Start, "   "))
        };
        assert!(matches!(blank_title, Err(ApiError::Validation(_))));
        assert_eq!(api.marker_calls.get(), 0, "invalid input never reaches the API");

        let saved = block_on(view.save_endpoint_as_marker(&api, EndpointKind::Start, "Home")).expect("saved");
        assert_eq!(saved.title, "Home");
        assert_eq!(view.state().markers.len(), 1);
        assert_eq!(engine.markers().len(), 2, "endpoint marker plus saved marker");

        assert_eq!(block_on(view.delete_marker(&api, &saved.id)), Ok(true));
        assert!(view.state().markers.is_empty());
        assert_eq!(engine.markers().len(), 1);

        assert_eq!(block_on(view.delete_marker(&api, "unknown")), Ok(false));
    }

    #[test]
    fn test_viewport_follows_camera_and_load() {
        let (view, engine) = mounted();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        view.set_listener(move |state| log.borrow_mut().push(state.viewport.zoom_text()));

        engine.move_camera(LngLat::new(-0.62, 35.71), 13.25);
        assert_eq!(view.state().viewport.zoom_text(), "13.25");
        assert_eq!(view.state().viewport.center_text(), "35.7100, -0.6200");

        engine.finish_load();
        assert!(seen.borrow().len() >= 2);
    }

    #[test]
    fn test_camera_moves_during_a_borrow_are_not_lost() {
        let (view, engine) = mounted();

        view.with(|_| engine.move_camera(LngLat::new(-0.60, 35.75), 14.0));
        assert_eq!(view.state().viewport, engine.viewport());
        assert_eq!(view.state().viewport.zoom_text(), "14.00");

        view.update(|_| engine.move_camera(LngLat::new(-0.58, 35.68), 11.5));
        assert_eq!(view.state().viewport, engine.viewport());
    }

    #[test]
    fn test_viewport_tracks_fit_and_home() {
        let (view, engine) = mounted();
        let api = StubApi::default();
        let bounds = Bounds {
            southwest: LngLat::new(-0.65, 35.69),
            northeast: LngLat::new(-0.63, 35.70),
        };
        api.replies
            .borrow_mut()
            .push_back(Ok(vec![route("7 min", Some(bounds), vec![bounds.southwest, bounds.northeast])]));
        view.set_endpoint_text(EndpointKind::Start, "A");
        view.set_endpoint_text(EndpointKind::End, "B");

        block_on(view.search(&api, TravelMode::Transit)).expect("search succeeds");
        assert_eq!(view.state().viewport.center, bounds.center());

        engine.move_camera(LngLat::new(0.0, 0.0), 3.0);
        view.reset_viewport();
        assert_eq!(view.state().viewport, engine.viewport());
        assert_eq!(view.state().viewport.center, MapConfig::default().center);
    }

    #[test]
    fn test_listener_may_call_back_into_view() {
        let (view, engine) = mounted();
        let inner = view.clone();
        view.set_listener(move |state| {
            if state.start.has_marker && state.mode == InteractionMode::Idle && !state.end.has_marker {
                inner.toggle_picking(EndpointKind::End);
            }
        });
        view.toggle_picking(EndpointKind::Start);
        engine.click_at(LngLat::new(-0.63, 35.70));
        assert_eq!(view.state().mode, InteractionMode::PickingEnd);
    }

    #[test]
    fn test_locate_and_reset_viewport() {
        let (view, engine) = mounted();
        let at = LngLat::new(-0.61, 35.72);
        assert_eq!(block_on(view.locate(async move { Ok(at) })), Ok(at));
        assert_eq!(engine.fly_requests()[0].center, at);
        assert_eq!(engine.fly_requests()[0].zoom, LOCATE_ZOOM);
        assert_eq!(engine.markers().len(), 1);

        let denied = block_on(view.locate(async { Err(GeolocationError::PermissionDenied) }));
        assert_eq!(denied, Err(GeolocationError::PermissionDenied));
        assert!(!view.state().is_locating);

        view.reset_viewport();
        let home = FlyTo::home(&MapConfig::with_token("pk.test"));
        assert_eq!(engine.fly_requests().last(), Some(&home));
    }

    #[test]
    fn test_unmount_releases_engine() {
        let (view, engine) = mounted();
        let api = StubApi::default();
        api.markers.borrow_mut().push(saved_marker("m1", 35.7, -0.6));
        block_on(view.load_markers(&api));
        view.toggle_picking(EndpointKind::Start);

        view.unmount();

        assert!(engine.is_destroyed());
        assert_eq!(engine.total_handlers(), 0);
        assert!(engine.markers().is_empty());
        assert!(view.with(|c| c.engine().is_none()));

        // operations after unmount are no-ops
        view.toggle_picking(EndpointKind::End);
        assert_eq!(view.state().mode, InteractionMode::Idle);
    }
}
