//! Place façade

use waymark_common::dto::{PlaceRequest, PlaceResponse, RouteResponse};
use waymark_common::{Error, Result};

use super::ApiClient;

/// Remote façade for the place entity
#[derive(Clone)]
pub struct PlaceClient {
    api: ApiClient,
}

impl PlaceClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Fetch all places
    pub async fn list_all(&self) -> Result<Vec<PlaceResponse>> {
        let places: Vec<PlaceResponse> = self.api.get_json("/api/places").await?;
        tracing::debug!(count = places.len(), "listed places");
        Ok(places)
    }

    /// Fetch places that appear on no route authored by the given user
    pub async fn list_not_visited(&self, user_id: i64) -> Result<Vec<PlaceResponse>> {
        let places: Vec<PlaceResponse> = self
            .api
            .get_json(&format!("/api/places/not-visited?userId={}", user_id))
            .await?;
        tracing::debug!(count = places.len(), user_id, "listed not-visited places");
        Ok(places)
    }

    /// Fetch a single place
    pub async fn get_by_id(&self, id: i64) -> Result<PlaceResponse> {
        self.api.get_json(&format!("/api/places/{}", id)).await
    }

    /// Reverse lookup: routes that include this place
    pub async fn routes_for_place(&self, id: i64) -> Result<Vec<RouteResponse>> {
        self.api
            .get_json(&format!("/api/places/{}/routes", id))
            .await
    }

    /// Create a place; payload is validated locally before submission
    pub async fn create(&self, payload: &PlaceRequest) -> Result<PlaceResponse> {
        payload.validate()?;
        let place: PlaceResponse = self.api.post_json("/api/places", payload).await?;
        tracing::info!(place_id = place.id, "created place");
        Ok(place)
    }

    /// Create several places in one call
    ///
    /// All payloads are validated before any network I/O; one invalid
    /// element rejects the whole batch locally.
    pub async fn create_bulk(&self, payloads: &[PlaceRequest]) -> Result<Vec<PlaceResponse>> {
        if payloads.is_empty() {
            return Err(Error::Validation("bulk create of zero places".to_string()));
        }
        for payload in payloads {
            payload.validate()?;
        }
        let places: Vec<PlaceResponse> = self.api.post_json("/api/places/bulk", payloads).await?;
        tracing::info!(count = places.len(), "bulk-created places");
        Ok(places)
    }

    /// Full-replacement update; omitted fields are not preserved
    pub async fn update(&self, id: i64, payload: &PlaceRequest) -> Result<PlaceResponse> {
        payload.validate()?;
        let place: PlaceResponse = self
            .api
            .put_json(&format!("/api/places/{}", id), payload)
            .await?;
        tracing::info!(place_id = place.id, "updated place");
        Ok(place)
    }

    /// Delete a place; the store detaches it from any routes first
    pub async fn remove(&self, id: i64) -> Result<()> {
        self.api.delete(&format!("/api/places/{}", id)).await?;
        tracing::info!(place_id = id, "deleted place");
        Ok(())
    }
}
