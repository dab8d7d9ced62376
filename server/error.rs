use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;
use transit_map::models::ValidationErrors;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid marker data")]
    InvalidMarker(#[source] ValidationErrors),
    #[error("Invalid route search")]
    InvalidSearch(#[source] ValidationErrors),
    #[error("Invalid request body")]
    BadBody(String),
    #[error("Marker not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::InvalidMarker(_) | ServerError::InvalidSearch(_) | ServerError::BadBody(_) => {
                StatusCode::BAD_REQUEST
            }
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ServerError::InvalidMarker(errors) | ServerError::InvalidSearch(errors) => {
                json!({ "error": self.to_string(), "details": errors.0 })
            }
            ServerError::BadBody(reason) => json!({ "error": self.to_string(), "details": reason }),
            ServerError::NotFound => json!({ "error": self.to_string() }),
            ServerError::Database(e) => {
                log::error!("Database failure: {e}");
                json!({ "error": "Internal server error" })
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
