//! `MapEngine` over the Mapbox GL JS global (`window.mapboxgl`).
//!
//! Everything goes through `js_sys::Reflect`; the library is loaded by a script tag
//! in `index.html`, so there is no generated binding to keep in sync.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use js_sys::{Array, Function, Reflect};
use leptos::logging::warn;
use serde_json::json;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use super::engine::{Cursor, FlyTo, HandlerId, LineStyle, MapEngine, MapEvent, MapHandler, MarkerRef, MarkerSpec};
use crate::config::MapConfig;
use crate::error::{EngineError, InitError};
use crate::models::{Bounds, LngLat, ViewportSnapshot};

struct BoundHandler {
    event: MapEvent,
    closure: Closure<dyn Fn(JsValue)>,
}

struct Inner {
    mapboxgl: JsValue,
    map: JsValue,
    next_id: Cell<u64>,
    markers: RefCell<HashMap<MarkerRef, JsValue>>,
    handlers: RefCell<HashMap<HandlerId, BoundHandler>>,
    popup: RefCell<Option<JsValue>>,
}

/// Cloning yields another handle to the same map
#[derive(Clone)]
pub struct MapboxEngine {
    inner: Rc<Inner>,
}

fn key(name: &str) -> JsValue {
    JsValue::from_str(name)
}

fn method(target: &JsValue, name: &str) -> Result<Function, JsValue> {
    Reflect::get(target, &key(name))?
        .dyn_into::<Function>()
        .map_err(|_| JsValue::from_str(&format!("{name} is not a function")))
}

fn call(target: &JsValue, name: &str, args: &[&JsValue]) -> Result<JsValue, JsValue> {
    let args: Array = args.iter().copied().collect();
    method(target, name)?.apply(target, &args)
}

fn construct(namespace: &JsValue, class: &str, args: &[&JsValue]) -> Result<JsValue, JsValue> {
    let constructor = method(namespace, class)?;
    let args: Array = args.iter().copied().collect();
    Reflect::construct(&constructor, &args)
}

/// Build a plain JS object from a JSON value
fn js_object(value: &serde_json::Value) -> Result<JsValue, JsValue> {
    let text = serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
    js_sys::JSON::parse(&text)
}

fn lng_lat_array(point: LngLat) -> JsValue {
    let pair = Array::new();
    pair.push(&JsValue::from_f64(point.lng));
    pair.push(&JsValue::from_f64(point.lat));
    pair.into()
}

fn read_lng_lat(value: &JsValue) -> Option<LngLat> {
    let lng = Reflect::get(value, &key("lng")).ok()?.as_f64()?;
    let lat = Reflect::get(value, &key("lat")).ok()?.as_f64()?;
    Some(LngLat::new(lng, lat))
}

fn line_feature(geometry: &[LngLat]) -> serde_json::Value {
    let coordinates: Vec<[f64; 2]> = geometry.iter().map(LngLat::as_array).collect();
    json!({
        "type": "geojson",
        "data": {
            "type": "Feature",
            "properties": {},
            "geometry": { "type": "LineString", "coordinates": coordinates }
        }
    })
}

fn has_webgl() -> bool {
    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        return false;
    };
    let Ok(canvas) = document.create_element("canvas") else {
        return false;
    };
    let Ok(canvas) = canvas.dyn_into::<web_sys::HtmlCanvasElement>() else {
        return false;
    };
    ["webgl2", "webgl"]
        .iter()
        .any(|kind| matches!(canvas.get_context(kind), Ok(Some(_))))
}

fn init_failure(e: &JsValue) -> InitError {
    InitError::EngineInitFailure(EngineError::from(e.clone()).0)
}

impl MapboxEngine {
    fn next_id(&self) -> u64 {
        let id = self.inner.next_id.get() + 1;
        self.inner.next_id.set(id);
        id
    }

    fn map(&self) -> &JsValue {
        &self.inner.map
    }

    fn center(map: &JsValue) -> Option<LngLat> {
        call(map, "getCenter", &[]).ok().as_ref().and_then(read_lng_lat)
    }

    /// `map.getLayer` / `map.getSource` return `undefined` for unknown ids
    fn exists(&self, getter: &str, id: &str) -> bool {
        call(self.map(), getter, &[&key(id)]).is_ok_and(|found| !found.is_undefined() && !found.is_null())
    }

    fn popup(&self, html: &str) -> Result<JsValue, JsValue> {
        let options = js_object(&json!({ "offset": 25 }))?;
        let popup = construct(&self.inner.mapboxgl, "Popup", &[&options])?;
        call(&popup, "setHTML", &[&key(html)])?;
        Ok(popup)
    }

    fn build_marker(&self, spec: &MarkerSpec) -> Result<JsValue, JsValue> {
        let options = js_object(&json!({ "color": spec.color }))?;
        let marker = construct(&self.inner.mapboxgl, "Marker", &[&options])?;
        call(&marker, "setLngLat", &[&lng_lat_array(spec.position)])?;
        if let Some(html) = &spec.popup_html {
            let popup = self.popup(html)?;
            call(&marker, "setPopup", &[&popup])?;
        }
        call(&marker, "addTo", &[self.map()])?;
        Ok(marker)
    }

    fn unbind(&self, handler: &BoundHandler) {
        let name = key(handler.event.name());
        let function: &JsValue = handler.closure.as_ref();
        let result = match handler.event.layer() {
            Some(layer) => call(self.map(), "off", &[&name, &key(layer), function]),
            None => call(self.map(), "off", &[&name, function]),
        };
        if let Err(e) = result {
            warn!("Failed to unbind {} handler: {}", handler.event.name(), EngineError::from(e));
        }
    }
}

impl MapEngine for MapboxEngine {
    type Container = web_sys::HtmlElement;

    fn initialize(container: &Self::Container, config: &MapConfig) -> Result<Self, InitError> {
        if !has_webgl() {
            return Err(InitError::NoRenderContext);
        }
        let token = config.credential()?;

        let window = web_sys::window().ok_or_else(|| InitError::EngineInitFailure("no window".to_string()))?;
        let mapboxgl = Reflect::get(&window, &key("mapboxgl")).map_err(|e| init_failure(&e))?;
        if mapboxgl.is_undefined() {
            return Err(InitError::EngineInitFailure("mapbox-gl is not loaded".to_string()));
        }
        Reflect::set(&mapboxgl, &key("accessToken"), &key(token)).map_err(|e| init_failure(&e))?;

        let options = js_object(&json!({
            "style": config.style_url,
            "center": config.center.as_array(),
            "zoom": config.zoom,
            "pitch": config.pitch,
            "bearing": config.bearing,
        }))
        .map_err(|e| init_failure(&e))?;
        Reflect::set(&options, &key("container"), container).map_err(|e| init_failure(&e))?;

        let map = construct(&mapboxgl, "Map", &[&options]).map_err(|e| init_failure(&e))?;

        if let Ok(navigation) = construct(&mapboxgl, "NavigationControl", &[]) {
            if let Err(e) = call(&map, "addControl", &[&navigation, &key("top-right")]) {
                warn!("Failed to add navigation control: {}", EngineError::from(e));
            }
        }

        Ok(Self {
            inner: Rc::new(Inner {
                mapboxgl,
                map,
                next_id: Cell::new(0),
                markers: RefCell::new(HashMap::new()),
                handlers: RefCell::new(HashMap::new()),
                popup: RefCell::new(None),
            }),
        })
    }

    fn destroy(&self) {
        let handlers: Vec<BoundHandler> = self.inner.handlers.borrow_mut().drain().map(|(_, h)| h).collect();
        for handler in &handlers {
            self.unbind(handler);
        }
        let markers: Vec<JsValue> = self.inner.markers.borrow_mut().drain().map(|(_, m)| m).collect();
        for marker in markers {
            let _ = call(&marker, "remove", &[]);
        }
        if let Some(popup) = self.inner.popup.borrow_mut().take() {
            let _ = call(&popup, "remove", &[]);
        }
        if let Err(e) = call(self.map(), "remove", &[]) {
            warn!("Failed to remove map: {}", EngineError::from(e));
        }
        drop(handlers);
    }

    fn on_load(&self, callback: Box<dyn FnOnce()>) {
        let loaded = call(self.map(), "loaded", &[]).ok().and_then(|v| v.as_bool()).unwrap_or(false);
        if loaded {
            callback();
            return;
        }
        let listener = Closure::once_into_js(move || callback());
        if let Err(e) = call(self.map(), "once", &[&key("load"), &listener]) {
            warn!("Failed to wait for map load: {}", EngineError::from(e));
        }
    }

    fn add_marker(&self, spec: &MarkerSpec) -> Result<MarkerRef, EngineError> {
        let marker = self.build_marker(spec)?;
        let id = MarkerRef(self.next_id());
        self.inner.markers.borrow_mut().insert(id, marker);
        Ok(id)
    }

    fn remove_marker(&self, marker: MarkerRef) {
        let removed = self.inner.markers.borrow_mut().remove(&marker);
        if let Some(marker) = removed {
            if let Err(e) = call(&marker, "remove", &[]) {
                warn!("Failed to remove marker: {}", EngineError::from(e));
            }
        }
    }

    fn add_source(&self, id: &str, geometry: &[LngLat]) -> Result<(), EngineError> {
        if self.has_source(id) {
            return Err(EngineError(format!("source {id} already exists")));
        }
        let source = js_object(&line_feature(geometry))?;
        call(self.map(), "addSource", &[&key(id), &source])?;
        Ok(())
    }

    fn add_layer(&self, id: &str, source_id: &str, style: &LineStyle) -> Result<(), EngineError> {
        if self.has_layer(id) {
            return Err(EngineError(format!("layer {id} already exists")));
        }
        let layer = js_object(&json!({
            "id": id,
            "type": "line",
            "source": source_id,
            "layout": { "line-join": "round", "line-cap": "round" },
            "paint": {
                "line-color": style.color,
                "line-width": style.width,
                "line-opacity": style.opacity,
            }
        }))?;
        call(self.map(), "addLayer", &[&layer])?;
        Ok(())
    }

    fn remove_layer(&self, id: &str) -> Result<(), EngineError> {
        call(self.map(), "removeLayer", &[&key(id)])?;
        Ok(())
    }

    fn remove_source(&self, id: &str) -> Result<(), EngineError> {
        call(self.map(), "removeSource", &[&key(id)])?;
        Ok(())
    }

    fn has_layer(&self, id: &str) -> bool {
        self.exists("getLayer", id)
    }

    fn has_source(&self, id: &str) -> bool {
        self.exists("getSource", id)
    }

    fn fly_to(&self, options: &FlyTo) {
        let result = js_object(&json!({
            "center": options.center.as_array(),
            "zoom": options.zoom,
            "pitch": options.pitch,
            "bearing": options.bearing,
            "duration": options.duration_ms,
            "essential": true,
        }))
        .and_then(|options| call(self.map(), "flyTo", &[&options]));
        if let Err(e) = result {
            warn!("flyTo failed: {}", EngineError::from(e));
        }
    }

    fn fit_bounds(&self, bounds: &Bounds, padding: f64) {
        let result = js_object(&json!([bounds.southwest.as_array(), bounds.northeast.as_array()]))
            .and_then(|corners| {
                let options = js_object(&json!({ "padding": padding, "essential": true }))?;
                call(self.map(), "fitBounds", &[&corners, &options])
            });
        if let Err(e) = result {
            warn!("fitBounds failed: {}", EngineError::from(e));
        }
    }

    fn viewport(&self) -> ViewportSnapshot {
        let fallback = ViewportSnapshot::default();
        let zoom = call(self.map(), "getZoom", &[])
            .ok()
            .and_then(|z| z.as_f64())
            .unwrap_or(fallback.zoom);
        let center = Self::center(self.map()).unwrap_or(fallback.center);
        ViewportSnapshot { zoom, center }
    }

    fn set_cursor(&self, cursor: Cursor) {
        let style = call(self.map(), "getCanvas", &[]).and_then(|canvas| Reflect::get(&canvas, &key("style")));
        if let Ok(style) = style {
            let _ = Reflect::set(&style, &key("cursor"), &key(cursor.css()));
        }
    }

    fn show_popup(&self, position: LngLat, html: &str) {
        if let Some(previous) = self.inner.popup.borrow_mut().take() {
            let _ = call(&previous, "remove", &[]);
        }
        let result = self.popup(html).and_then(|popup| {
            call(&popup, "setLngLat", &[&lng_lat_array(position)])?;
            call(&popup, "addTo", &[self.map()])?;
            Ok(popup)
        });
        match result {
            Ok(popup) => *self.inner.popup.borrow_mut() = Some(popup),
            Err(e) => warn!("Failed to open popup: {}", EngineError::from(e)),
        }
    }

    fn on(&self, event: MapEvent, handler: MapHandler) -> HandlerId {
        let id = HandlerId(self.next_id());
        let map = self.inner.map.clone();
        let camera_event = matches!(event, MapEvent::Move | MapEvent::Zoom);

        let closure = Closure::wrap(Box::new(move |ev: JsValue| {
            let position = if camera_event {
                Self::center(&map)
            } else {
                Reflect::get(&ev, &key("lngLat")).ok().as_ref().and_then(read_lng_lat)
            };
            if let Some(position) = position {
                handler(position);
            }
        }) as Box<dyn Fn(JsValue)>);

        let name = key(event.name());
        let function: &JsValue = closure.as_ref();
        let bound = match event.layer() {
            Some(layer) => call(self.map(), "on", &[&name, &key(layer), function]),
            None => call(self.map(), "on", &[&name, function]),
        };
        if let Err(e) = bound {
            warn!("Failed to bind {} handler: {}", event.name(), EngineError::from(e));
        }

        self.inner.handlers.borrow_mut().insert(id, BoundHandler { event, closure });
        id
    }

    fn off(&self, id: HandlerId) {
        let removed = self.inner.handlers.borrow_mut().remove(&id);
        if let Some(handler) = removed {
            self.unbind(&handler);
        }
    }
}
