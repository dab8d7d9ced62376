//! Bookkeeping for every overlay this app adds to the engine.
//!
//! The registry is the only code that adds or removes engine markers and route
//! layers, so it can guarantee the teardown order: layer handlers are detached
//! before layers are removed, and layers before their sources. Every operation is a
//! no-op when there is no live engine.

use std::rc::Rc;

use indexmap::IndexMap;
use leptos::logging::warn;

use super::engine::{Cursor, HandlerId, LineStyle, MapEngine, MapEvent, MarkerRef, MarkerSpec};
use crate::constants::LOCATION_MARKER_COLOR;
use crate::models::{EndpointKind, LngLat, Marker, RouteResult};
use crate::utils::escape_html;

#[must_use]
pub fn route_source_id(index: usize) -> String {
    format!("route-{index}")
}

#[must_use]
pub fn route_layer_id(index: usize) -> String {
    format!("route-layer-{index}")
}

/// Index 0 is the primary route; every other result is drawn as an alternate
#[must_use]
pub fn route_style(index: usize) -> LineStyle {
    if index == 0 {
        LineStyle::primary()
    } else {
        LineStyle::alternate()
    }
}

/// A rendered route candidate
#[derive(Debug, Clone, PartialEq)]
pub struct RouteOverlay {
    pub index: usize,
    pub source_id: String,
    pub layer_id: String,
    pub geometry: Vec<LngLat>,
    pub duration: String,
    pub distance: String,
    handlers: Vec<HandlerId>,
}

#[derive(Debug, Default)]
pub struct OverlayRegistry {
    start: Option<MarkerRef>,
    end: Option<MarkerRef>,
    location: Option<MarkerRef>,
    saved: IndexMap<String, MarkerRef>,
    routes: Vec<RouteOverlay>,
}

fn marker_popup(marker: &Marker) -> String {
    let mut html = format!("<strong>{}</strong>", escape_html(&marker.title));
    if let Some(description) = marker.description.as_deref().filter(|d| !d.is_empty()) {
        html.push_str("<br>");
        html.push_str(&escape_html(description));
    }
    html
}

/// Label shown for the route at `index`
#[must_use]
pub fn route_title(index: usize) -> String {
    if index == 0 {
        "Best route".to_string()
    } else {
        format!("Alternative {index}")
    }
}

fn route_popup(index: usize, duration: &str, distance: &str) -> String {
    format!(
        "<strong>{}</strong><br>{} &middot; {}",
        route_title(index),
        escape_html(duration),
        escape_html(distance)
    )
}

impl OverlayRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn endpoint_slot(&mut self, kind: EndpointKind) -> &mut Option<MarkerRef> {
        match kind {
            EndpointKind::Start => &mut self.start,
            EndpointKind::End => &mut self.end,
        }
    }

    #[must_use]
    pub fn endpoint_marker(&self, kind: EndpointKind) -> Option<MarkerRef> {
        match kind {
            EndpointKind::Start => self.start,
            EndpointKind::End => self.end,
        }
    }

    /// Place the marker for `kind`, replacing any previous marker of the same kind.
    /// Returns whether a marker is now shown.
    pub fn place_endpoint_marker<E: MapEngine>(&mut self, engine: Option<&E>, kind: EndpointKind, position: LngLat, color: &str) -> bool {
        let Some(engine) = engine else { return false };

        if let Some(previous) = self.endpoint_slot(kind).take() {
            engine.remove_marker(previous);
        }

        let spec = MarkerSpec {
            position,
            color: color.to_string(),
            popup_html: Some(format!("<strong>{}</strong><br>{}", kind.label(), position.display_text())),
        };
        match engine.add_marker(&spec) {
            Ok(marker) => {
                *self.endpoint_slot(kind) = Some(marker);
                true
            }
            Err(e) => {
                warn!("Failed to place {} marker: {e}", kind.label());
                false
            }
        }
    }

    pub fn remove_endpoint_marker<E: MapEngine>(&mut self, engine: Option<&E>, kind: EndpointKind) {
        let previous = self.endpoint_slot(kind).take();
        if let (Some(engine), Some(marker)) = (engine, previous) {
            engine.remove_marker(marker);
        }
    }

    pub fn clear_endpoint_markers<E: MapEngine>(&mut self, engine: Option<&E>) {
        self.remove_endpoint_marker(engine, EndpointKind::Start);
        self.remove_endpoint_marker(engine, EndpointKind::End);
    }

    /// Show the "you are here" marker, replacing the previous one
    pub fn place_location_marker<E: MapEngine>(&mut self, engine: Option<&E>, position: LngLat) {
        let Some(engine) = engine else { return };
        if let Some(previous) = self.location.take() {
            engine.remove_marker(previous);
        }
        let spec = MarkerSpec {
            position,
            color: LOCATION_MARKER_COLOR.to_string(),
            popup_html: Some("You are here".to_string()),
        };
        match engine.add_marker(&spec) {
            Ok(marker) => self.location = Some(marker),
            Err(e) => warn!("Failed to place location marker: {e}"),
        }
    }

    #[must_use]
    pub fn route_overlays(&self) -> &[RouteOverlay] {
        &self.routes
    }

    /// Replace every rendered route with `routes`.
    ///
    /// `fallback_geometry` is drawn for results that carry no geometry of their own.
    /// Returns the number of routes now on the map.
    pub fn render_routes<E: MapEngine>(&mut self, engine: Option<&E>, routes: &[RouteResult], fallback_geometry: &[LngLat]) -> usize {
        let Some(engine) = engine else { return 0 };

        self.clear_routes(Some(engine));

        for (index, route) in routes.iter().enumerate() {
            let geometry = if route.geometry.is_empty() { fallback_geometry.to_vec() } else { route.geometry.clone() };
            let source_id = route_source_id(index);
            let layer_id = route_layer_id(index);

            if let Err(e) = engine.add_route_layer(&source_id, &layer_id, &geometry, &route_style(index)) {
                warn!("Failed to render route {index}: {e}");
                // Leave nothing half-added behind
                if let Err(e) = engine.remove_route_layer(&source_id, &layer_id) {
                    warn!("Failed to roll back route {index}: {e}");
                }
                continue;
            }

            let handlers = bind_route_handlers(engine, &layer_id, route_popup(index, &route.duration, &route.distance));
            self.routes.push(RouteOverlay {
                index,
                source_id,
                layer_id,
                geometry,
                duration: route.duration.clone(),
                distance: route.distance.clone(),
                handlers,
            });
        }

        self.routes.len()
    }

    /// Remove every rendered route: handlers first, then all layers, then all sources
    pub fn clear_routes<E: MapEngine>(&mut self, engine: Option<&E>) {
        let previous = std::mem::take(&mut self.routes);
        let Some(engine) = engine else { return };

        for overlay in &previous {
            for handler in &overlay.handlers {
                engine.off(*handler);
            }
        }
        for overlay in &previous {
            if engine.has_layer(&overlay.layer_id) {
                if let Err(e) = engine.remove_layer(&overlay.layer_id) {
                    warn!("Failed to remove layer {}: {e}", overlay.layer_id);
                }
            }
        }
        for overlay in &previous {
            if engine.has_source(&overlay.source_id) {
                if let Err(e) = engine.remove_source(&overlay.source_id) {
                    warn!("Failed to remove source {}: {e}", overlay.source_id);
                }
            }
        }
    }

    #[must_use]
    pub fn saved_marker_count(&self) -> usize {
        self.saved.len()
    }

    /// Replace the displayed saved markers with `markers`
    pub fn show_saved_markers<E: MapEngine>(&mut self, engine: Option<&E>, markers: &[Marker]) {
        self.clear_saved_markers(engine);
        for marker in markers {
            self.add_saved_marker(engine, marker);
        }
    }

    /// Display one saved marker as a static marker with a title/description popup
    pub fn add_saved_marker<E: MapEngine>(&mut self, engine: Option<&E>, marker: &Marker) {
        let Some(engine) = engine else { return };
        if let Some(previous) = self.saved.shift_remove(&marker.id) {
            engine.remove_marker(previous);
        }
        let spec = MarkerSpec {
            position: marker.position(),
            color: marker.color.clone(),
            popup_html: Some(marker_popup(marker)),
        };
        match engine.add_marker(&spec) {
            Ok(engine_marker) => {
                self.saved.insert(marker.id.clone(), engine_marker);
            }
            Err(e) => warn!("Failed to display marker {}: {e}", marker.id),
        }
    }

    pub fn remove_saved_marker<E: MapEngine>(&mut self, engine: Option<&E>, id: &str) {
        let previous = self.saved.shift_remove(id);
        if let (Some(engine), Some(marker)) = (engine, previous) {
            engine.remove_marker(marker);
        }
    }

    pub fn clear_saved_markers<E: MapEngine>(&mut self, engine: Option<&E>) {
        let previous = std::mem::take(&mut self.saved);
        if let Some(engine) = engine {
            for marker in previous.into_values() {
                engine.remove_marker(marker);
            }
        }
    }

    /// Remove every overlay, used when the view unmounts
    pub fn clear_all<E: MapEngine>(&mut self, engine: Option<&E>) {
        self.clear_routes(engine);
        self.clear_endpoint_markers(engine);
        self.clear_saved_markers(engine);
        if let (Some(engine), Some(marker)) = (engine, self.location.take()) {
            engine.remove_marker(marker);
        }
    }
}

fn bind_route_handlers<E: MapEngine>(engine: &E, layer_id: &str, popup_html: String) -> Vec<HandlerId> {
    let hover_engine = engine.clone();
    let enter = engine.on(
        MapEvent::LayerEnter(layer_id.to_string()),
        Rc::new(move |_| hover_engine.set_cursor(Cursor::Pointer)),
    );

    let leave_engine = engine.clone();
    let leave = engine.on(
        MapEvent::LayerLeave(layer_id.to_string()),
        Rc::new(move |_| leave_engine.set_cursor(Cursor::Default)),
    );

    let popup_engine = engine.clone();
    let click = engine.on(
        MapEvent::LayerClick(layer_id.to_string()),
        Rc::new(move |at| popup_engine.show_popup(at, &popup_html)),
    );

    vec![enter, leave, click]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::map::headless::{HeadlessEngine, HeadlessSurface};
    use chrono::Utc;

    fn engine() -> HeadlessEngine {
        HeadlessEngine::initialize(&HeadlessSurface::default(), &MapConfig::with_token("pk.test"))
            .expect("engine should start")
    }

    fn route(duration: &str) -> RouteResult {
        RouteResult {
            duration: duration.to_string(),
            distance: "3 km".to_string(),
            steps: Vec::new(),
            bounds: None,
            geometry: vec![LngLat::new(-0.63, 35.70), LngLat::new(-0.65, 35.69)],
        }
    }

    fn saved(id: &str, title: &str) -> Marker {
        Marker {
            id: id.to_string(),
            title: title.to_string(),
            description: Some("<script>".to_string()),
            latitude: 35.7,
            longitude: -0.64,
            color: "#ff0000".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_rerender_replaces_previous_routes() {
        let engine = engine();
        let mut registry = OverlayRegistry::new();

        let first = vec![route("10 min"), route("12 min"), route("15 min")];
        assert_eq!(registry.render_routes(Some(&engine), &first, &[]), 3);

        let second = vec![route("20 min"), route("25 min")];
        assert_eq!(registry.render_routes(Some(&engine), &second, &[]), 2);

        assert_eq!(engine.layer_ids(), vec!["route-layer-0", "route-layer-1"]);
        assert_eq!(engine.source_ids(), vec!["route-0", "route-1"]);
        let durations: Vec<&str> = registry.route_overlays().iter().map(|o| o.duration.as_str()).collect();
        assert_eq!(durations, vec!["20 min", "25 min"]);
        // Three handlers per layer, none left from the first render
        assert_eq!(engine.total_handlers(), 6);
        assert_eq!(engine.handler_count(&MapEvent::LayerClick("route-layer-2".to_string())), 0);
    }

    #[test]
    fn test_first_route_is_primary() {
        let engine = engine();
        let mut registry = OverlayRegistry::new();
        registry.render_routes(Some(&engine), &[route("a"), route("b")], &[]);

        assert_eq!(engine.layer_style("route-layer-0"), Some(LineStyle::primary()));
        assert_eq!(engine.layer_style("route-layer-1"), Some(LineStyle::alternate()));
    }

    #[test]
    fn test_fallback_geometry_used_when_route_has_none() {
        let engine = engine();
        let mut registry = OverlayRegistry::new();
        let mut bare = route("a");
        bare.geometry.clear();
        let fallback = [LngLat::new(1.0, 2.0), LngLat::new(3.0, 4.0)];

        registry.render_routes(Some(&engine), &[bare], &fallback);
        assert_eq!(engine.source_geometry("route-0"), Some(fallback.to_vec()));
    }

    #[test]
    fn test_route_layer_handlers() {
        let engine = engine();
        let mut registry = OverlayRegistry::new();
        registry.render_routes(Some(&engine), &[route("9 min")], &[]);

        engine.fire(&MapEvent::LayerEnter("route-layer-0".to_string()), LngLat::new(0.0, 0.0));
        assert_eq!(engine.cursor(), Cursor::Pointer);
        engine.fire(&MapEvent::LayerLeave("route-layer-0".to_string()), LngLat::new(0.0, 0.0));
        assert_eq!(engine.cursor(), Cursor::Default);

        engine.fire(&MapEvent::LayerClick("route-layer-0".to_string()), LngLat::new(-0.64, 35.7));
        let popups = engine.popups();
        assert_eq!(popups.len(), 1);
        assert!(popups[0].1.contains("Best route"));
        assert!(popups[0].1.contains("9 min"));
    }

    #[test]
    fn test_clear_routes_removes_everything() {
        let engine = engine();
        let mut registry = OverlayRegistry::new();
        registry.render_routes(Some(&engine), &[route("a"), route("b")], &[]);
        registry.clear_routes(Some(&engine));

        assert!(engine.layer_ids().is_empty());
        assert!(engine.source_ids().is_empty());
        assert_eq!(engine.total_handlers(), 0);
        assert!(registry.route_overlays().is_empty());
    }

    #[test]
    fn test_endpoint_marker_replaced_per_kind() {
        let engine = engine();
        let mut registry = OverlayRegistry::new();
        let green = EndpointKind::Start.marker_color();

        assert!(registry.place_endpoint_marker(Some(&engine), EndpointKind::Start, LngLat::new(0.0, 0.0), green));
        assert!(registry.place_endpoint_marker(Some(&engine), EndpointKind::Start, LngLat::new(1.0, 1.0), green));
        assert!(registry.place_endpoint_marker(Some(&engine), EndpointKind::End, LngLat::new(2.0, 2.0), EndpointKind::End.marker_color()));

        assert_eq!(engine.markers_with_color(green), 1);
        assert_eq!(engine.markers().len(), 2);
    }

    #[test]
    fn test_clear_endpoint_markers_is_idempotent() {
        let engine = engine();
        let mut registry = OverlayRegistry::new();
        registry.place_endpoint_marker(Some(&engine), EndpointKind::Start, LngLat::new(0.0, 0.0), "#22c55e");
        registry.place_endpoint_marker(Some(&engine), EndpointKind::End, LngLat::new(1.0, 1.0), "#ef4444");

        registry.clear_endpoint_markers(Some(&engine));
        let once = (engine.markers(), registry.endpoint_marker(EndpointKind::Start), registry.endpoint_marker(EndpointKind::End));
        registry.clear_endpoint_markers(Some(&engine));
        let twice = (engine.markers(), registry.endpoint_marker(EndpointKind::Start), registry.endpoint_marker(EndpointKind::End));

        assert_eq!(once, twice);
        assert!(twice.0.is_empty());
    }

    #[test]
    fn test_operations_without_engine_are_noops() {
        let mut registry = OverlayRegistry::new();
        let none: Option<&HeadlessEngine> = None;

        assert!(!registry.place_endpoint_marker(none, EndpointKind::Start, LngLat::new(0.0, 0.0), "#22c55e"));
        assert_eq!(registry.render_routes(none, &[route("a")], &[]), 0);
        registry.show_saved_markers(none, &[saved("m1", "Cafe")]);

        assert!(registry.route_overlays().is_empty());
        assert_eq!(registry.saved_marker_count(), 0);
        assert!(registry.endpoint_marker(EndpointKind::Start).is_none());
    }

    #[test]
    fn test_saved_markers_escape_popup_and_replace() {
        let engine = engine();
        let mut registry = OverlayRegistry::new();
        registry.show_saved_markers(Some(&engine), &[saved("m1", "Caf\u{e9} & Bar"), saved("m2", "Port")]);
        assert_eq!(registry.saved_marker_count(), 2);

        let popup = engine.markers()[0].popup_html.clone().expect("popup");
        assert!(popup.contains("Caf\u{e9} &amp; Bar"));
        assert!(popup.contains("&lt;script&gt;"));

        registry.show_saved_markers(Some(&engine), &[saved("m3", "Only")]);
        assert_eq!(engine.markers().len(), 1);

        registry.remove_saved_marker(Some(&engine), "m3");
        assert!(engine.markers().is_empty());
    }
}
