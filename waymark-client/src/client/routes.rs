//! Route façade
//!
//! Besides the uniform CRUD contract, routes own the place-membership
//! association: attach/detach mutate it independently of `update`, which
//! only replaces the route's own fields.

use waymark_common::dto::{RouteRequest, RouteResponse};
use waymark_common::Result;

use super::ApiClient;

/// Remote façade for the route entity
#[derive(Clone)]
pub struct RouteClient {
    api: ApiClient,
}

impl RouteClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Fetch all routes
    ///
    /// The embedded `places` collection may be unpopulated here; only the
    /// detail fetch guarantees it.
    pub async fn list_all(&self) -> Result<Vec<RouteResponse>> {
        let routes: Vec<RouteResponse> = self.api.get_json("/api/routes").await?;
        tracing::debug!(count = routes.len(), "listed routes");
        Ok(routes)
    }

    /// Fetch routes having at least `min_places` places attached
    pub async fn list_with_min_places(&self, min_places: u32) -> Result<Vec<RouteResponse>> {
        let routes: Vec<RouteResponse> = self
            .api
            .get_json(&format!("/api/routes/more-than?minPlaces={}", min_places))
            .await?;
        tracing::debug!(count = routes.len(), min_places, "listed filtered routes");
        Ok(routes)
    }

    /// Fetch a single route with its place set populated
    pub async fn get_by_id(&self, id: i64) -> Result<RouteResponse> {
        self.api.get_json(&format!("/api/routes/{}", id)).await
    }

    /// Create a route; payload is validated locally before submission
    ///
    /// The author must exist at creation time; the store reports a missing
    /// author as NotFound.
    pub async fn create(&self, payload: &RouteRequest) -> Result<RouteResponse> {
        payload.validate()?;
        let route: RouteResponse = self.api.post_json("/api/routes", payload).await?;
        tracing::info!(route_id = route.id, author_id = route.author_id, "created route");
        Ok(route)
    }

    /// Full-replacement update of the route's own fields
    ///
    /// Place membership is not part of the payload; use attach/detach.
    pub async fn update(&self, id: i64, payload: &RouteRequest) -> Result<RouteResponse> {
        payload.validate()?;
        let route: RouteResponse = self
            .api
            .put_json(&format!("/api/routes/{}", id), payload)
            .await?;
        tracing::info!(route_id = route.id, "updated route");
        Ok(route)
    }

    /// Delete a route; the places on it are untouched
    pub async fn remove(&self, id: i64) -> Result<()> {
        self.api.delete(&format!("/api/routes/{}", id)).await?;
        tracing::info!(route_id = id, "deleted route");
        Ok(())
    }

    /// Attach a place to a route's place set
    pub async fn add_place(&self, route_id: i64, place_id: i64) -> Result<()> {
        self.api
            .post_empty(&format!("/api/routes/{}/add/{}", route_id, place_id))
            .await?;
        tracing::info!(route_id, place_id, "attached place to route");
        Ok(())
    }

    /// Detach a place from a route's place set; the place itself survives
    pub async fn remove_place(&self, route_id: i64, place_id: i64) -> Result<()> {
        self.api
            .delete(&format!("/api/routes/{}/remove/{}", route_id, place_id))
            .await?;
        tracing::info!(route_id, place_id, "detached place from route");
        Ok(())
    }
}
