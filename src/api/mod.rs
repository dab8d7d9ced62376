//! HTTP clients for the marker store and the route search endpoint.

mod markers;
mod routes;

pub use markers::MarkerApi;
pub use routes::RouteSearchApi;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::models::{FieldError, ValidationErrors};

const FALLBACK_BASE_URL: &str = "http://localhost:8080";

/// reqwest-backed implementation of every API trait
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Use the configured API origin, else the origin the page was served from
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let base = config
            .api_base
            .clone()
            .or_else(page_origin)
            .unwrap_or_else(|| FALLBACK_BASE_URL.to_string());
        Self::new(base)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn page_origin() -> Option<String> {
    web_sys::window()?.location().origin().ok()
}

/// Error body returned by the server for every non-2xx response
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    details: Option<serde_json::Value>,
}

/// Turn a non-2xx response into an [`ApiError`]. A 400 carrying field details
/// becomes [`ApiError::Validation`].
fn status_error(status: u16, body: &str) -> ApiError {
    if status == 404 {
        return ApiError::NotFound;
    }

    let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) else {
        return ApiError::Status {
            status,
            message: body.trim().to_string(),
        };
    };

    if status == 400 {
        let fields = parsed
            .details
            .clone()
            .and_then(|details| serde_json::from_value::<Vec<FieldError>>(details).ok())
            .filter(|fields| !fields.is_empty());
        if let Some(fields) = fields {
            return ApiError::Validation(ValidationErrors(fields));
        }
    }

    ApiError::Status {
        status,
        message: parsed.error,
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status.as_u16(), &body))
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    check(response)
        .await?
        .json::<T>()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

fn network(e: &reqwest::Error) -> ApiError {
    ApiError::Network(e.to_string())
}
