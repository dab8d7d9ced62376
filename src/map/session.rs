//! Route search bookkeeping: validation, the loading flag and request ordering.
//!
//! Every request gets a sequence number. A response is only accepted when it is
//! newer than the last accepted one, so a slow response can never overwrite the
//! results of a search issued after it.

use crate::error::{ApiError, RouteError};
use crate::models::{EndpointSelection, RouteResult, RouteSearchRequest, TravelMode};

/// An issued search waiting for its response
#[derive(Debug, Clone, PartialEq)]
pub struct SearchTicket {
    pub seq: u64,
    pub request: RouteSearchRequest,
}

#[derive(Debug, Default)]
pub struct RouteSession {
    issued: u64,
    accepted: u64,
    loading: bool,
    results: Vec<RouteResult>,
}

impl RouteSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn results(&self) -> &[RouteResult] {
        &self.results
    }

    /// Validate both endpoints and issue a new request
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Validation`] if either endpoint has no text; nothing is issued
    pub fn begin(&mut self, start: &EndpointSelection, end: &EndpointSelection, mode: TravelMode) -> Result<SearchTicket, RouteError> {
        if start.is_blank() || end.is_blank() {
            return Err(RouteError::Validation(
                "Please enter both a start and a destination".to_string(),
            ));
        }

        self.issued += 1;
        self.loading = true;
        Ok(SearchTicket {
            seq: self.issued,
            request: RouteSearchRequest {
                start: start.display_text.trim().to_string(),
                end: end.display_text.trim().to_string(),
                mode,
            },
        })
    }

    /// Record the response for `seq`. On `Ok` the caller must render the returned
    /// routes; on `Err` the previous results stay as they were.
    ///
    /// # Errors
    ///
    /// - [`RouteError::Superseded`] when a newer response was already accepted
    /// - [`RouteError::Api`] when the request failed
    /// - [`RouteError::NoRoutes`] when the response was empty
    pub fn settle(&mut self, seq: u64, outcome: Result<Vec<RouteResult>, ApiError>) -> Result<&[RouteResult], RouteError> {
        if seq == self.issued {
            self.loading = false;
        }
        if seq <= self.accepted {
            return Err(RouteError::Superseded);
        }

        let routes = outcome?;
        if routes.is_empty() {
            return Err(RouteError::NoRoutes);
        }

        self.accepted = seq;
        self.results = routes;
        Ok(&self.results)
    }

    /// Drop the results and retire every in-flight request
    pub fn reset(&mut self) {
        self.accepted = self.issued;
        self.loading = false;
        self.results.clear();
    }
}
