use js_sys::{Function, Object, Promise, Reflect};
use thiserror::Error;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::constants::{GEOLOCATION_MAX_AGE_MS, GEOLOCATION_TIMEOUT_MS};
use crate::models::LngLat;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("location permission was denied")]
    PermissionDenied,
    #[error("your position is currently unavailable")]
    PositionUnavailable,
    #[error("locating you took too long")]
    Timeout,
    #[error("this browser does not support geolocation")]
    Unsupported,
}

impl GeolocationError {
    /// Map a `GeolocationPositionError.code`
    #[must_use]
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => Self::PermissionDenied,
            3 => Self::Timeout,
            _ => Self::PositionUnavailable,
        }
    }
}

fn get(target: &JsValue, key: &str) -> Option<JsValue> {
    Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .filter(|value| !value.is_undefined() && !value.is_null())
}

fn position_to_lng_lat(position: &JsValue) -> Option<LngLat> {
    let coords = get(position, "coords")?;
    let lat = get(&coords, "latitude")?.as_f64()?;
    let lng = get(&coords, "longitude")?.as_f64()?;
    Some(LngLat::new(lng, lat))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn error_code(error: &JsValue) -> u16 {
    get(error, "code")
        .and_then(|code| code.as_f64())
        .map_or(2, |code| code as u16)
}

/// One-shot high accuracy position request
///
/// # Errors
///
/// Returns the mapped browser error, or [`GeolocationError::Unsupported`] when the
/// browser has no geolocation API
pub async fn current_position() -> Result<LngLat, GeolocationError> {
    let navigator = web_sys::window()
        .map(|window| JsValue::from(window.navigator()))
        .ok_or(GeolocationError::Unsupported)?;
    let geolocation = get(&navigator, "geolocation").ok_or(GeolocationError::Unsupported)?;
    let get_current_position = get(&geolocation, "getCurrentPosition")
        .and_then(|f| f.dyn_into::<Function>().ok())
        .ok_or(GeolocationError::Unsupported)?;

    let options = Object::new();
    for (key, value) in [
        ("enableHighAccuracy", JsValue::TRUE),
        ("timeout", JsValue::from(GEOLOCATION_TIMEOUT_MS)),
        ("maximumAge", JsValue::from(GEOLOCATION_MAX_AGE_MS)),
    ] {
        let _ = Reflect::set(&options, &JsValue::from_str(key), &value);
    }

    let mut call_error = None;
    let promise = Promise::new(&mut |resolve, reject| {
        let on_success = Closure::once_into_js(move |position: JsValue| {
            let _ = resolve.call1(&JsValue::NULL, &position);
        });
        let on_error = Closure::once_into_js(move |error: JsValue| {
            let _ = reject.call1(&JsValue::NULL, &error);
        });
        if let Err(e) = get_current_position.call3(&geolocation, &on_success, &on_error, &options) {
            call_error = Some(e);
        }
    });
    if call_error.is_some() {
        return Err(GeolocationError::Unsupported);
    }

    match JsFuture::from(promise).await {
        Ok(position) => position_to_lng_lat(&position).ok_or(GeolocationError::PositionUnavailable),
        Err(error) => Err(GeolocationError::from_code(error_code(&error))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(GeolocationError::from_code(1), GeolocationError::PermissionDenied);
        assert_eq!(GeolocationError::from_code(2), GeolocationError::PositionUnavailable);
        assert_eq!(GeolocationError::from_code(3), GeolocationError::Timeout);
        assert_eq!(GeolocationError::from_code(42), GeolocationError::PositionUnavailable);
    }
}
