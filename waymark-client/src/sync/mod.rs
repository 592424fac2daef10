//! Cross-entity reference resolution
//!
//! The backing store returns related entities by reference only (a route
//! carries an `authorId`, not an author), and its list endpoints may leave
//! embedded collections unpopulated. The resolver assembles display-ready
//! composites by issuing the necessary secondary fetches.
//!
//! Policy: degrade, don't fail. A failed secondary fetch produces a
//! deterministic fallback value instead of an error, so the primary view
//! always renders. No retries and no caching; each call is a point-in-time
//! snapshot assembled from independent fetches, which may reflect slightly
//! different instants.

use std::collections::{HashMap, HashSet};

use futures::stream::{FuturesUnordered, StreamExt};
use waymark_common::dto::{PlaceResponse, RouteResponse, UserResponse};

use crate::client::{PlaceClient, RouteClient, UserClient};

/// Display label for a route's author
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorLabel {
    /// Author's name, or the `User #<id>` placeholder
    pub name: String,
    /// False when the label is a fallback for a failed fetch
    pub resolved: bool,
}

/// Resolves denormalized display data via secondary fetches
#[derive(Clone)]
pub struct AssociationResolver {
    users: UserClient,
    routes: RouteClient,
    places: PlaceClient,
}

impl AssociationResolver {
    pub fn new(users: UserClient, routes: RouteClient, places: PlaceClient) -> Self {
        Self {
            users,
            routes,
            places,
        }
    }

    /// Deterministic placeholder for an unresolvable author
    pub fn fallback_label(author_id: i64) -> AuthorLabel {
        AuthorLabel {
            name: format!("User #{}", author_id),
            resolved: false,
        }
    }

    /// Resolve a route's author name
    ///
    /// Never fails: a fetch failure (including a dangling author id after
    /// the user was deleted) degrades to the placeholder label.
    pub async fn resolve_route_author(&self, route: &RouteResponse) -> AuthorLabel {
        match self.users.get_by_id(route.author_id).await {
            Ok(user) => AuthorLabel {
                name: user.name,
                resolved: true,
            },
            Err(e) => {
                tracing::warn!(
                    route_id = route.id,
                    author_id = route.author_id,
                    error = %e,
                    "author resolution failed, using placeholder"
                );
                Self::fallback_label(route.author_id)
            }
        }
    }

    /// Resolve a route's place membership
    ///
    /// A populated embedded list is returned verbatim. An empty one may
    /// just be an unhydrated list payload, so a single detail re-fetch
    /// decides; if that fetch fails, the embedded (possibly empty) list is
    /// kept rather than failing the view.
    pub async fn resolve_route_places(&self, route: &RouteResponse) -> Vec<PlaceResponse> {
        if !route.places.is_empty() {
            return route.places.clone();
        }
        match self.routes.get_by_id(route.id).await {
            Ok(detail) => detail.places,
            Err(e) => {
                tracing::warn!(route_id = route.id, error = %e, "place hydration failed");
                route.places.clone()
            }
        }
    }

    /// Resolve a user's authored routes, hydrating when unpopulated
    pub async fn resolve_user_routes(&self, user: &UserResponse) -> Vec<RouteResponse> {
        if !user.routes.is_empty() {
            return user.routes.clone();
        }
        match self.users.get_by_id(user.id).await {
            Ok(detail) => detail.routes,
            Err(e) => {
                tracing::warn!(user_id = user.id, error = %e, "route hydration failed");
                user.routes.clone()
            }
        }
    }

    /// Reverse lookup: routes that include the given place
    ///
    /// Degrades to an empty list on failure.
    pub async fn resolve_place_routes(&self, place: &PlaceResponse) -> Vec<RouteResponse> {
        match self.places.routes_for_place(place.id).await {
            Ok(routes) => routes,
            Err(e) => {
                tracing::warn!(place_id = place.id, error = %e, "reverse route lookup failed");
                Vec::new()
            }
        }
    }

    /// Resolve author labels for a whole route list
    ///
    /// Issues one fetch per distinct author id, not per route, and runs
    /// them concurrently. Fetches are independent: one author failing to
    /// resolve falls back to its placeholder without affecting the others.
    /// Returns a map keyed by route id.
    pub async fn resolve_authors_for_routes(
        &self,
        routes: &[RouteResponse],
    ) -> HashMap<i64, AuthorLabel> {
        let author_ids: HashSet<i64> = routes.iter().map(|r| r.author_id).collect();

        let mut fetches = FuturesUnordered::new();
        for author_id in author_ids {
            let users = self.users.clone();
            fetches.push(async move { (author_id, users.get_by_id(author_id).await) });
        }

        let mut labels: HashMap<i64, AuthorLabel> = HashMap::new();
        while let Some((author_id, outcome)) = fetches.next().await {
            let label = match outcome {
                Ok(user) => AuthorLabel {
                    name: user.name,
                    resolved: true,
                },
                Err(e) => {
                    tracing::warn!(author_id, error = %e, "author resolution failed in batch");
                    Self::fallback_label(author_id)
                }
            };
            labels.insert(author_id, label);
        }

        routes
            .iter()
            .map(|route| {
                let label = labels
                    .get(&route.author_id)
                    .cloned()
                    .unwrap_or_else(|| Self::fallback_label(route.author_id));
                (route.id, label)
            })
            .collect()
    }
}
