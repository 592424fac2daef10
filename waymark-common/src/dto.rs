//! Entity request/response types
//!
//! One request/response pair per entity, matching the backing store's JSON
//! contract. Wire field names are camelCase (`authorId`); Rust fields are
//! snake_case via serde renames.
//!
//! Request types carry the local structural checks (`validate()`) that the
//! remote façades run before building a request. Anything stricter than
//! these checks is the store's business.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ========================================
// User
// ========================================

/// Payload for creating or fully replacing a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRequest {
    /// Display name, non-empty
    pub name: String,
    /// Contact email, basic `local@domain` shape
    pub email: String,
}

/// User as returned by the backing store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    /// Server-assigned id, immutable
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Routes authored by this user (read-only projection; list endpoints
    /// may leave it unpopulated)
    #[serde(default)]
    pub routes: Vec<RouteResponse>,
}

// ========================================
// Route
// ========================================

/// Payload for creating or fully replacing a route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    /// Route name, non-empty, immutable after creation
    pub name: String,
    pub description: String,
    /// Authoring user, set at creation
    pub author_id: i64,
}

/// Route as returned by the backing store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResponse {
    /// Server-assigned id, immutable
    pub id: i64,
    pub name: String,
    pub description: String,
    pub author_id: i64,
    /// Places currently on the route. Membership is mutated only through
    /// the attach/detach operations, never through update. Order is
    /// display order. List endpoints may leave it unpopulated.
    #[serde(default)]
    pub places: Vec<PlaceResponse>,
}

// ========================================
// Place
// ========================================

/// Payload for creating or fully replacing a place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceRequest {
    pub name: String,
    pub address: String,
    pub description: String,
}

/// Place as returned by the backing store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceResponse {
    /// Server-assigned id, immutable
    pub id: i64,
    pub name: String,
    pub address: String,
    pub description: String,
}

// ========================================
// Local validation
// ========================================

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Basic `local@domain` shape: exactly one `@`, non-empty on both sides
fn require_email_shape(value: &str) -> Result<()> {
    let mut parts = value.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next();

    match domain {
        Some(domain) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => Ok(()),
        _ => Err(Error::Validation(format!(
            "email must match local@domain: {:?}",
            value
        ))),
    }
}

impl UserRequest {
    /// Check required fields before submission
    pub fn validate(&self) -> Result<()> {
        require_non_empty("name", &self.name)?;
        require_non_empty("email", &self.email)?;
        require_email_shape(&self.email)
    }
}

impl RouteRequest {
    /// Check required fields before submission
    pub fn validate(&self) -> Result<()> {
        require_non_empty("name", &self.name)?;
        require_non_empty("description", &self.description)
    }
}

impl PlaceRequest {
    /// Check required fields before submission
    pub fn validate(&self) -> Result<()> {
        require_non_empty("name", &self.name)?;
        require_non_empty("address", &self.address)?;
        require_non_empty("description", &self.description)
    }
}
