use super::{check, network, read_json, HttpApi};
use crate::error::ApiError;
use crate::models::{Marker, MarkerPatch, NewMarker};

const MARKERS_API: &str = "/api/markers";

/// The marker store (`/api/markers`)
#[allow(async_fn_in_trait)]
pub trait MarkerApi {
    /// Every marker, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body cannot be decoded
    async fn list_markers(&self) -> Result<Vec<Marker>, ApiError>;

    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for an unknown id
    async fn get_marker(&self, id: &str) -> Result<Marker, ApiError>;

    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] if the server rejects the payload
    async fn create_marker(&self, input: &NewMarker) -> Result<Marker, ApiError>;

    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for an unknown id, [`ApiError::Validation`] for a
    /// rejected patch
    async fn update_marker(&self, id: &str, patch: &MarkerPatch) -> Result<Marker, ApiError>;

    /// Returns `false` when no marker had this id
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails
    async fn delete_marker(&self, id: &str) -> Result<bool, ApiError>;
}

impl MarkerApi for HttpApi {
    async fn list_markers(&self) -> Result<Vec<Marker>, ApiError> {
        let response = self.client.get(self.url(MARKERS_API)).send().await.map_err(|e| network(&e))?;
        read_json(response).await
    }

    async fn get_marker(&self, id: &str) -> Result<Marker, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("{MARKERS_API}/{id}")))
            .send()
            .await
            .map_err(|e| network(&e))?;
        read_json(response).await
    }

    async fn create_marker(&self, input: &NewMarker) -> Result<Marker, ApiError> {
        let response = self
            .client
            .post(self.url(MARKERS_API))
            .json(input)
            .send()
            .await
            .map_err(|e| network(&e))?;
        read_json(response).await
    }

    async fn update_marker(&self, id: &str, patch: &MarkerPatch) -> Result<Marker, ApiError> {
        let response = self
            .client
            .put(self.url(&format!("{MARKERS_API}/{id}")))
            .json(patch)
            .send()
            .await
            .map_err(|e| network(&e))?;
        read_json(response).await
    }

    async fn delete_marker(&self, id: &str) -> Result<bool, ApiError> {
        let response = self
            .client
            .delete(self.url(&format!("{MARKERS_API}/{id}")))
            .send()
            .await
            .map_err(|e| network(&e))?;
        match check(response).await {
            Ok(_) => Ok(true),
            Err(ApiError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
