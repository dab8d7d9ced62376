use super::{network, read_json, HttpApi};
use crate::error::ApiError;
use crate::models::{RouteResult, RouteSearchRequest};

const ROUTE_SEARCH_API: &str = "/api/routes/search";

/// The route search boundary. Results come back best first.
#[allow(async_fn_in_trait)]
pub trait RouteSearchApi {
    /// # Errors
    ///
    /// Returns an error if the request fails, is rejected, or cannot be decoded
    async fn search_routes(&self, request: &RouteSearchRequest) -> Result<Vec<RouteResult>, ApiError>;
}

impl RouteSearchApi for HttpApi {
    async fn search_routes(&self, request: &RouteSearchRequest) -> Result<Vec<RouteResult>, ApiError> {
        let response = self
            .client
            .post(self.url(ROUTE_SEARCH_API))
            .json(request)
            .send()
            .await
            .map_err(|e| network(&e))?;
        read_json(response).await
    }
}
