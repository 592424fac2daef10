//! User façade

use waymark_common::dto::{UserRequest, UserResponse};
use waymark_common::Result;

use super::ApiClient;

/// Remote façade for the user entity
#[derive(Clone)]
pub struct UserClient {
    api: ApiClient,
}

impl UserClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Fetch all users
    ///
    /// The embedded `routes` projection may be unpopulated here; only the
    /// detail fetch guarantees it.
    pub async fn list_all(&self) -> Result<Vec<UserResponse>> {
        let users: Vec<UserResponse> = self.api.get_json("/api/users").await?;
        tracing::debug!(count = users.len(), "listed users");
        Ok(users)
    }

    /// Fetch a single user with its authored routes populated
    pub async fn get_by_id(&self, id: i64) -> Result<UserResponse> {
        self.api.get_json(&format!("/api/users/{}", id)).await
    }

    /// Create a user; payload is validated locally before submission
    pub async fn create(&self, payload: &UserRequest) -> Result<UserResponse> {
        payload.validate()?;
        let user: UserResponse = self.api.post_json("/api/users", payload).await?;
        tracing::info!(user_id = user.id, "created user");
        Ok(user)
    }

    /// Full-replacement update; omitted fields are not preserved
    pub async fn update(&self, id: i64, payload: &UserRequest) -> Result<UserResponse> {
        payload.validate()?;
        let user: UserResponse = self
            .api
            .put_json(&format!("/api/users/{}", id), payload)
            .await?;
        tracing::info!(user_id = user.id, "updated user");
        Ok(user)
    }

    /// Delete a user
    ///
    /// Not idempotent: deleting a missing id fails with NotFound. Routes
    /// authored by the user are left behind with a dangling author id.
    pub async fn remove(&self, id: i64) -> Result<()> {
        self.api.delete(&format!("/api/users/{}", id)).await?;
        tracing::info!(user_id = id, "deleted user");
        Ok(())
    }
}
