//! In-process stub of the backing store
//!
//! Implements the full HTTP surface the client core targets, backed by an
//! in-memory store, so integration tests run against a real listener
//! without an external server. Mirrors the store's documented hydration
//! contract: list endpoints leave embedded collections unpopulated, detail
//! endpoints populate them.
//!
//! Knobs for failure injection: individual user detail fetches can be made
//! to return 500, and the route list endpoint can be given artificial
//! latency for request-supersession tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tokio::sync::Mutex;
use waymark_client::client::{ApiClient, PlaceClient, RouteClient, UserClient};
use waymark_client::sync::AssociationResolver;
use waymark_common::config::ClientConfig;
use waymark_common::dto::{
    PlaceRequest, PlaceResponse, RouteRequest, RouteResponse, UserRequest, UserResponse,
};

#[derive(Debug, Clone)]
struct StoredUser {
    name: String,
    email: String,
}

#[derive(Debug, Clone)]
struct StoredRoute {
    name: String,
    description: String,
    author_id: i64,
    place_ids: Vec<i64>,
}

#[derive(Debug, Clone)]
struct StoredPlace {
    name: String,
    address: String,
    description: String,
}

#[derive(Default)]
struct Inner {
    users: HashMap<i64, StoredUser>,
    routes: HashMap<i64, StoredRoute>,
    places: HashMap<i64, StoredPlace>,
    /// User ids whose detail fetch returns 500
    failing_users: HashSet<i64>,
    /// Detail fetch counts per user id
    user_fetch_counts: HashMap<i64, u64>,
}

/// Shared state of the stub store, with seeding and failure-injection
/// handles for tests
pub struct StubStore {
    inner: Mutex<Inner>,
    next_id: AtomicI64,
    route_list_delay_ms: AtomicU64,
    route_list_failing: AtomicBool,
}

impl Default for StubStore {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            next_id: AtomicI64::new(1),
            route_list_delay_ms: AtomicU64::new(0),
            route_list_failing: AtomicBool::new(false),
        }
    }
}

impl StubStore {
    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    pub async fn seed_user(&self, name: &str, email: &str) -> i64 {
        let id = self.allocate_id();
        self.inner.lock().await.users.insert(
            id,
            StoredUser {
                name: name.to_string(),
                email: email.to_string(),
            },
        );
        id
    }

    pub async fn seed_place(&self, name: &str, address: &str, description: &str) -> i64 {
        let id = self.allocate_id();
        self.inner.lock().await.places.insert(
            id,
            StoredPlace {
                name: name.to_string(),
                address: address.to_string(),
                description: description.to_string(),
            },
        );
        id
    }

    pub async fn seed_route(
        &self,
        name: &str,
        description: &str,
        author_id: i64,
        place_ids: &[i64],
    ) -> i64 {
        let id = self.allocate_id();
        self.inner.lock().await.routes.insert(
            id,
            StoredRoute {
                name: name.to_string(),
                description: description.to_string(),
                author_id,
                place_ids: place_ids.to_vec(),
            },
        );
        id
    }

    /// Make GET /api/users/{id} return 500 from now on
    pub async fn fail_user_fetch(&self, id: i64) {
        self.inner.lock().await.failing_users.insert(id);
    }

    /// How many times a user's detail endpoint was hit
    pub async fn user_fetch_count(&self, id: i64) -> u64 {
        *self
            .inner
            .lock()
            .await
            .user_fetch_counts
            .get(&id)
            .unwrap_or(&0)
    }

    /// Artificial latency applied to GET /api/routes
    ///
    /// The handler reads the store before sleeping, so a delayed response
    /// carries the data as of request time.
    pub fn set_route_list_delay(&self, delay: Duration) {
        self.route_list_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Make GET /api/routes return 500 from now on
    pub fn set_route_list_failing(&self, failing: bool) {
        self.route_list_failing.store(failing, Ordering::SeqCst);
    }

    /// Drop all routes and replace them with a single seeded one
    pub async fn replace_routes_with(
        &self,
        name: &str,
        description: &str,
        author_id: i64,
    ) -> i64 {
        self.inner.lock().await.routes.clear();
        self.seed_route(name, description, author_id, &[]).await
    }
}

pub type Store = Arc<StubStore>;

fn user_summary(id: i64, user: &StoredUser) -> UserResponse {
    UserResponse {
        id,
        name: user.name.clone(),
        email: user.email.clone(),
        routes: Vec::new(),
    }
}

fn place_response(id: i64, place: &StoredPlace) -> PlaceResponse {
    PlaceResponse {
        id,
        name: place.name.clone(),
        address: place.address.clone(),
        description: place.description.clone(),
    }
}

fn route_summary(id: i64, route: &StoredRoute) -> RouteResponse {
    RouteResponse {
        id,
        name: route.name.clone(),
        description: route.description.clone(),
        author_id: route.author_id,
        places: Vec::new(),
    }
}

fn route_detail(inner: &Inner, id: i64, route: &StoredRoute) -> RouteResponse {
    let places = route
        .place_ids
        .iter()
        .filter_map(|pid| inner.places.get(pid).map(|p| place_response(*pid, p)))
        .collect();
    RouteResponse {
        id,
        name: route.name.clone(),
        description: route.description.clone(),
        author_id: route.author_id,
        places,
    }
}

fn user_detail(inner: &Inner, id: i64, user: &StoredUser) -> UserResponse {
    let routes = inner
        .routes
        .iter()
        .filter(|(_, r)| r.author_id == id)
        .map(|(rid, r)| route_detail(inner, *rid, r))
        .collect();
    UserResponse {
        id,
        name: user.name.clone(),
        email: user.email.clone(),
        routes,
    }
}

// ========================================
// User handlers
// ========================================

async fn list_users(State(store): State<Store>) -> Json<Vec<UserResponse>> {
    let inner = store.inner.lock().await;
    let mut users: Vec<UserResponse> = inner
        .users
        .iter()
        .map(|(id, u)| user_summary(*id, u))
        .collect();
    users.sort_by_key(|u| u.id);
    Json(users)
}

async fn get_user(
    State(store): State<Store>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, StatusCode> {
    let mut inner = store.inner.lock().await;
    *inner.user_fetch_counts.entry(id).or_insert(0) += 1;
    if inner.failing_users.contains(&id) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let user = inner.users.get(&id).ok_or(StatusCode::NOT_FOUND)?.clone();
    Ok(Json(user_detail(&inner, id, &user)))
}

async fn create_user(
    State(store): State<Store>,
    Json(payload): Json<UserRequest>,
) -> Json<UserResponse> {
    let id = store.allocate_id();
    let user = StoredUser {
        name: payload.name,
        email: payload.email,
    };
    let mut inner = store.inner.lock().await;
    inner.users.insert(id, user.clone());
    Json(user_summary(id, &user))
}

async fn update_user(
    State(store): State<Store>,
    Path(id): Path<i64>,
    Json(payload): Json<UserRequest>,
) -> Result<Json<UserResponse>, StatusCode> {
    let mut inner = store.inner.lock().await;
    if !inner.users.contains_key(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let user = StoredUser {
        name: payload.name,
        email: payload.email,
    };
    inner.users.insert(id, user.clone());
    Ok(Json(user_summary(id, &user)))
}

async fn delete_user(
    State(store): State<Store>,
    Path(id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    let mut inner = store.inner.lock().await;
    // No referential cleanup: routes keep their author id, which dangles
    inner
        .users
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(StatusCode::NOT_FOUND)
}

// ========================================
// Route handlers
// ========================================

async fn list_routes(
    State(store): State<Store>,
) -> Result<Json<Vec<RouteResponse>>, StatusCode> {
    if store.route_list_failing.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let delay = store.route_list_delay_ms.load(Ordering::SeqCst);
    let mut routes: Vec<RouteResponse> = {
        let inner = store.inner.lock().await;
        inner
            .routes
            .iter()
            .map(|(id, r)| route_summary(*id, r))
            .collect()
    };
    routes.sort_by_key(|r| r.id);
    // Snapshot first, then sleep: a delayed response carries the data as
    // of request time
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    Ok(Json(routes))
}

#[derive(Deserialize)]
struct MinPlacesQuery {
    #[serde(rename = "minPlaces")]
    min_places: usize,
}

async fn list_routes_min_places(
    State(store): State<Store>,
    Query(query): Query<MinPlacesQuery>,
) -> Json<Vec<RouteResponse>> {
    let inner = store.inner.lock().await;
    let mut routes: Vec<RouteResponse> = inner
        .routes
        .iter()
        .filter(|(_, r)| r.place_ids.len() >= query.min_places)
        .map(|(id, r)| route_summary(*id, r))
        .collect();
    routes.sort_by_key(|r| r.id);
    Json(routes)
}

async fn get_route(
    State(store): State<Store>,
    Path(id): Path<i64>,
) -> Result<Json<RouteResponse>, StatusCode> {
    let inner = store.inner.lock().await;
    let route = inner.routes.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(route_detail(&inner, id, route)))
}

async fn create_route(
    State(store): State<Store>,
    Json(payload): Json<RouteRequest>,
) -> Result<Json<RouteResponse>, StatusCode> {
    let mut inner = store.inner.lock().await;
    // The author must exist at creation time
    if !inner.users.contains_key(&payload.author_id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let id = store.allocate_id();
    let route = StoredRoute {
        name: payload.name,
        description: payload.description,
        author_id: payload.author_id,
        place_ids: Vec::new(),
    };
    inner.routes.insert(id, route.clone());
    Ok(Json(route_summary(id, &route)))
}

async fn update_route(
    State(store): State<Store>,
    Path(id): Path<i64>,
    Json(payload): Json<RouteRequest>,
) -> Result<Json<RouteResponse>, StatusCode> {
    let mut inner = store.inner.lock().await;
    let existing = inner.routes.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    let route = StoredRoute {
        name: payload.name,
        description: payload.description,
        author_id: payload.author_id,
        // Membership is only mutated through attach/detach
        place_ids: existing.place_ids.clone(),
    };
    inner.routes.insert(id, route.clone());
    let detail = route_detail(&inner, id, &route);
    Ok(Json(detail))
}

async fn delete_route(
    State(store): State<Store>,
    Path(id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    let mut inner = store.inner.lock().await;
    inner
        .routes
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn attach_place(
    State(store): State<Store>,
    Path((route_id, place_id)): Path<(i64, i64)>,
) -> Result<StatusCode, StatusCode> {
    let mut inner = store.inner.lock().await;
    if !inner.places.contains_key(&place_id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let route = inner.routes.get_mut(&route_id).ok_or(StatusCode::NOT_FOUND)?;
    // Set semantics: attaching an already-attached place is a no-op
    if !route.place_ids.contains(&place_id) {
        route.place_ids.push(place_id);
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn detach_place(
    State(store): State<Store>,
    Path((route_id, place_id)): Path<(i64, i64)>,
) -> Result<StatusCode, StatusCode> {
    let mut inner = store.inner.lock().await;
    if !inner.places.contains_key(&place_id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let route = inner.routes.get_mut(&route_id).ok_or(StatusCode::NOT_FOUND)?;
    if !route.place_ids.contains(&place_id) {
        return Err(StatusCode::BAD_REQUEST);
    }
    route.place_ids.retain(|pid| *pid != place_id);
    Ok(StatusCode::NO_CONTENT)
}

// ========================================
// Place handlers
// ========================================

async fn list_places(State(store): State<Store>) -> Json<Vec<PlaceResponse>> {
    let inner = store.inner.lock().await;
    let mut places: Vec<PlaceResponse> = inner
        .places
        .iter()
        .map(|(id, p)| place_response(*id, p))
        .collect();
    places.sort_by_key(|p| p.id);
    Json(places)
}

#[derive(Deserialize)]
struct NotVisitedQuery {
    #[serde(rename = "userId")]
    user_id: i64,
}

async fn list_not_visited(
    State(store): State<Store>,
    Query(query): Query<NotVisitedQuery>,
) -> Json<Vec<PlaceResponse>> {
    let inner = store.inner.lock().await;
    let visited: HashSet<i64> = inner
        .routes
        .values()
        .filter(|r| r.author_id == query.user_id)
        .flat_map(|r| r.place_ids.iter().copied())
        .collect();
    let mut places: Vec<PlaceResponse> = inner
        .places
        .iter()
        .filter(|(id, _)| !visited.contains(id))
        .map(|(id, p)| place_response(*id, p))
        .collect();
    places.sort_by_key(|p| p.id);
    Json(places)
}

async fn get_place(
    State(store): State<Store>,
    Path(id): Path<i64>,
) -> Result<Json<PlaceResponse>, StatusCode> {
    let inner = store.inner.lock().await;
    let place = inner.places.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(place_response(id, place)))
}

async fn routes_for_place(
    State(store): State<Store>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<RouteResponse>>, StatusCode> {
    let inner = store.inner.lock().await;
    if !inner.places.contains_key(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let mut routes: Vec<RouteResponse> = inner
        .routes
        .iter()
        .filter(|(_, r)| r.place_ids.contains(&id))
        .map(|(rid, r)| route_detail(&inner, *rid, r))
        .collect();
    routes.sort_by_key(|r| r.id);
    Ok(Json(routes))
}

async fn create_place(
    State(store): State<Store>,
    Json(payload): Json<PlaceRequest>,
) -> Json<PlaceResponse> {
    let id = store.allocate_id();
    let place = StoredPlace {
        name: payload.name,
        address: payload.address,
        description: payload.description,
    };
    store.inner.lock().await.places.insert(id, place.clone());
    Json(place_response(id, &place))
}

async fn create_places_bulk(
    State(store): State<Store>,
    Json(payloads): Json<Vec<PlaceRequest>>,
) -> Json<Vec<PlaceResponse>> {
    let mut inner = store.inner.lock().await;
    let created = payloads
        .into_iter()
        .map(|payload| {
            let id = store.allocate_id();
            let place = StoredPlace {
                name: payload.name,
                address: payload.address,
                description: payload.description,
            };
            inner.places.insert(id, place.clone());
            place_response(id, &place)
        })
        .collect();
    Json(created)
}

async fn update_place(
    State(store): State<Store>,
    Path(id): Path<i64>,
    Json(payload): Json<PlaceRequest>,
) -> Result<Json<PlaceResponse>, StatusCode> {
    let mut inner = store.inner.lock().await;
    if !inner.places.contains_key(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let place = StoredPlace {
        name: payload.name,
        address: payload.address,
        description: payload.description,
    };
    inner.places.insert(id, place.clone());
    Ok(Json(place_response(id, &place)))
}

async fn delete_place(
    State(store): State<Store>,
    Path(id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    let mut inner = store.inner.lock().await;
    if inner.places.remove(&id).is_none() {
        return Err(StatusCode::NOT_FOUND);
    }
    // Deleting a place detaches it from every route
    for route in inner.routes.values_mut() {
        route.place_ids.retain(|pid| *pid != id);
    }
    Ok(StatusCode::NO_CONTENT)
}

fn router(store: Store) -> Router {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/api/routes", get(list_routes).post(create_route))
        .route("/api/routes/more-than", get(list_routes_min_places))
        .route(
            "/api/routes/:id",
            get(get_route).put(update_route).delete(delete_route),
        )
        .route("/api/routes/:route_id/add/:place_id", post(attach_place))
        .route(
            "/api/routes/:route_id/remove/:place_id",
            delete(detach_place),
        )
        .route("/api/places", get(list_places).post(create_place))
        .route("/api/places/bulk", post(create_places_bulk))
        .route("/api/places/not-visited", get(list_not_visited))
        .route(
            "/api/places/:id",
            get(get_place).put(update_place).delete(delete_place),
        )
        .route("/api/places/:id/routes", get(routes_for_place))
        .with_state(store)
}

/// Start the stub on an ephemeral port; returns its base URL and the
/// seeding/injection handle
pub async fn spawn_stub() -> (String, Store) {
    let store = Arc::new(StubStore::default());
    let app = router(store.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Should bind ephemeral port");
    let addr = listener.local_addr().expect("Should read local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Stub server failed");
    });
    (format!("http://{}", addr), store)
}

/// Client configuration pointing at a base URL with a short timeout
pub fn test_config(base_url: &str) -> ClientConfig {
    ClientConfig {
        api_url: base_url.to_string(),
        request_timeout: Duration::from_secs(5),
    }
}

/// Façades and resolver wired against the given base URL
pub fn make_clients(
    base_url: &str,
) -> (UserClient, RouteClient, PlaceClient, AssociationResolver) {
    let api = ApiClient::new(&test_config(base_url)).expect("Should build API client");
    let users = UserClient::new(api.clone());
    let routes = RouteClient::new(api.clone());
    let places = PlaceClient::new(api);
    let resolver = AssociationResolver::new(users.clone(), routes.clone(), places.clone());
    (users, routes, places, resolver)
}

/// A base URL nothing is listening on
pub async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Should bind ephemeral port");
    let addr = listener.local_addr().expect("Should read local addr");
    drop(listener);
    format!("http://{}", addr)
}
