//! Build-time configuration for the client.
//!
//! Values come from environment variables captured at compile time (the wasm bundle
//! has no process environment), falling back to the defaults in `constants`.

use crate::constants::{DEFAULT_BEARING, DEFAULT_CENTER, DEFAULT_PITCH, DEFAULT_STYLE_URL, DEFAULT_ZOOM};
use crate::error::InitError;
use crate::models::LngLat;

#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    pub access_token: Option<String>,
    pub style_url: String,
    pub center: LngLat,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            style_url: DEFAULT_STYLE_URL.to_string(),
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            pitch: DEFAULT_PITCH,
            bearing: DEFAULT_BEARING,
        }
    }
}

impl MapConfig {
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
            ..Self::default()
        }
    }

    /// The engine credential, rejecting absent or blank tokens
    ///
    /// # Errors
    ///
    /// Returns [`InitError::MissingCredential`] when no usable token is configured
    pub fn credential(&self) -> Result<&str, InitError> {
        self.access_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(InitError::MissingCredential)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppConfig {
    pub map: MapConfig,
    /// Origin of the backend API; `None` means the page origin
    pub api_base: Option<String>,
}

impl AppConfig {
    #[must_use]
    pub fn from_build_env() -> Self {
        let map = MapConfig {
            access_token: non_empty(option_env!("MAPBOX_ACCESS_TOKEN")),
            style_url: non_empty(option_env!("MAPBOX_STYLE_URL"))
                .unwrap_or_else(|| DEFAULT_STYLE_URL.to_string()),
            ..MapConfig::default()
        };
        Self {
            map,
            api_base: non_empty(option_env!("API_BASE_URL")),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}
