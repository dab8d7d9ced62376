use thiserror::Error;

use crate::models::ValidationErrors;

/// Terminal failure while mounting the map view; the UI shows a fallback screen
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    #[error("this browser cannot create a WebGL context, so the interactive map is unavailable")]
    NoRenderContext,
    #[error("no map access token is configured (set MAPBOX_ACCESS_TOKEN at build time)")]
    MissingCredential,
    #[error("the map engine failed to start: {0}")]
    EngineInitFailure(String),
}

/// A rejected engine call. Callers log it; it never reaches rendering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("map engine: {0}")]
pub struct EngineError(pub String);

impl From<wasm_bindgen::JsValue> for EngineError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        let message = value
            .as_string()
            .or_else(|| {
                js_sys::Reflect::get(&value, &wasm_bindgen::JsValue::from_str("message"))
                    .ok()
                    .and_then(|m| m.as_string())
            })
            .unwrap_or_else(|| format!("{value:?}"));
        Self(message)
    }
}

/// Failure talking to the backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Network(String),
    #[error("server responded with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("marker not found")]
    NotFound,
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("no routes found between these locations")]
    NoRoutes,
    /// A newer search was accepted (or the session was reset) before this response arrived
    #[error("route search superseded by a newer request")]
    Superseded,
}
