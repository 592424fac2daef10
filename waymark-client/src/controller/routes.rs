//! Route view-state controller
//!
//! The busiest of the three controllers: the route list embeds author
//! labels resolved in batch, the detail view embeds both the author label
//! and the hydrated place set, and attach/detach mutate place membership
//! followed by a single-detail re-fetch rather than a full list refresh.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::Mutex;
use waymark_common::dto::{RouteRequest, RouteResponse};
use waymark_common::events::{EntityKind, EventBus, WaymarkEvent};
use waymark_common::{Error, Result};

use crate::client::RouteClient;
use crate::sync::{AssociationResolver, AuthorLabel};

use super::{notify_error, FormMode, ListPhase, Selection};

/// One row of the route list: the route plus its resolved author label
#[derive(Debug, Clone)]
pub struct RouteListEntry {
    pub route: RouteResponse,
    pub author: AuthorLabel,
}

/// Display-ready route detail: hydrated place set plus author label
#[derive(Debug, Clone)]
pub struct RouteDetail {
    pub route: RouteResponse,
    pub author: AuthorLabel,
}

/// Snapshot of the route controller's view state
#[derive(Debug, Clone, Default)]
pub struct RouteViewState {
    pub phase: ListPhase,
    pub entries: Vec<RouteListEntry>,
    pub selection: Selection<RouteDetail, RouteRequest>,
    /// Most recent unrecovered error, cleared by the next success
    pub last_error: Option<String>,
}

/// View-state controller for routes
pub struct RouteController {
    routes: RouteClient,
    resolver: AssociationResolver,
    events: EventBus,
    state: Mutex<RouteViewState>,
    refresh_seq: AtomicU64,
    select_seq: AtomicU64,
}

impl RouteController {
    pub fn new(routes: RouteClient, resolver: AssociationResolver, events: EventBus) -> Self {
        Self {
            routes,
            resolver,
            events,
            state: Mutex::new(RouteViewState::default()),
            refresh_seq: AtomicU64::new(0),
            select_seq: AtomicU64::new(0),
        }
    }

    /// Snapshot of the current view state
    pub async fn state(&self) -> RouteViewState {
        self.state.lock().await.clone()
    }

    /// Fetch the route list and its author labels
    pub async fn refresh(&self) {
        let seq = self.begin_list_cycle().await;
        let outcome = self.routes.list_all().await;
        self.finish_list_cycle(seq, outcome).await;
    }

    /// Fetch only routes with at least `min_places` places attached
    ///
    /// Runs through the same Loading/Ready/Error machinery and the same
    /// coalescing token as a plain refresh.
    pub async fn refresh_with_min_places(&self, min_places: u32) {
        let seq = self.begin_list_cycle().await;
        let outcome = self.routes.list_with_min_places(min_places).await;
        self.finish_list_cycle(seq, outcome).await;
    }

    async fn begin_list_cycle(&self) -> u64 {
        let seq = self.refresh_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.lock().await.phase = ListPhase::Loading;
        seq
    }

    async fn finish_list_cycle(&self, seq: u64, outcome: Result<Vec<RouteResponse>>) {
        // Resolve author labels before taking the lock; a superseded cycle
        // wastes these fetches but never corrupts newer state.
        let outcome = match outcome {
            Ok(routes) => {
                let labels = self.resolver.resolve_authors_for_routes(&routes).await;
                Ok((routes, labels))
            }
            Err(e) => Err(e),
        };

        let mut state = self.state.lock().await;
        if self.refresh_seq.load(Ordering::SeqCst) != seq {
            tracing::debug!(seq, "discarding superseded route list result");
            return;
        }

        match outcome {
            Ok((routes, mut labels)) => {
                state.entries = routes
                    .into_iter()
                    .map(|route| {
                        let author = labels
                            .remove(&route.id)
                            .unwrap_or_else(|| AssociationResolver::fallback_label(route.author_id));
                        RouteListEntry { route, author }
                    })
                    .collect();
                state.phase = ListPhase::Ready;
                state.last_error = None;
                self.events.emit_lossy(WaymarkEvent::ListRefreshed {
                    entity: EntityKind::Route,
                    count: state.entries.len(),
                    timestamp: Utc::now(),
                });
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(error = %message, "route list fetch failed");
                state.phase = ListPhase::Error(message.clone());
                state.last_error = Some(message.clone());
                notify_error(&self.events, &message);
            }
        }
    }

    /// Open the detail view for a route
    ///
    /// Fetches the detail and resolves its author label and place set. A
    /// failure surfaces an error and keeps the prior selection.
    pub async fn select(&self, id: i64) {
        let seq = self.select_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let outcome = self.load_detail(id).await;

        let mut state = self.state.lock().await;
        if self.select_seq.load(Ordering::SeqCst) != seq {
            tracing::debug!(route_id = id, "discarding superseded route selection");
            return;
        }
        match outcome {
            Ok(detail) => {
                state.selection = Selection::Viewing(detail);
                state.last_error = None;
            }
            Err(e) => {
                let message = e.to_string();
                state.last_error = Some(message.clone());
                notify_error(&self.events, &message);
            }
        }
    }

    async fn load_detail(&self, id: i64) -> Result<RouteDetail> {
        let mut route = self.routes.get_by_id(id).await?;
        route.places = self.resolver.resolve_route_places(&route).await;
        let author = self.resolver.resolve_route_author(&route).await;
        Ok(RouteDetail { route, author })
    }

    /// Open an empty create form
    pub async fn begin_create(&self) {
        self.state.lock().await.selection = Selection::Editing {
            mode: FormMode::Create,
            original: None,
            draft: None,
        };
    }

    /// Open an edit form for an existing route
    pub async fn begin_edit(&self, detail: RouteDetail) {
        self.state.lock().await.selection = Selection::Editing {
            mode: FormMode::Edit,
            original: Some(detail),
            draft: None,
        };
    }

    /// Close any open form or detail view without submitting
    pub async fn clear_selection(&self) {
        self.state.lock().await.selection = Selection::None;
    }

    /// Submit the open form
    ///
    /// Creates or updates depending on the form mode. Success closes the
    /// form (create lands back on the list, edit on the updated detail)
    /// and triggers a full refresh. Failure keeps the form open with the
    /// draft payload intact and surfaces the error.
    pub async fn submit(&self, payload: RouteRequest) {
        let target = {
            let state = self.state.lock().await;
            match &state.selection {
                Selection::Editing { mode, original, .. } => {
                    (*mode, original.as_ref().map(|d| d.route.id))
                }
                _ => {
                    drop(state);
                    self.surface(Error::Validation("no route form is open".to_string()))
                        .await;
                    return;
                }
            }
        };

        let outcome = match target {
            (FormMode::Create, _) => self.routes.create(&payload).await,
            (FormMode::Edit, Some(id)) => self.routes.update(id, &payload).await,
            (FormMode::Edit, None) => {
                Err(Error::Validation("edit form without a target route".to_string()))
            }
        };

        match outcome {
            Ok(route) => {
                let (action, selection) = match target.0 {
                    FormMode::Create => ("created", Selection::None),
                    FormMode::Edit => {
                        let author = self.resolver.resolve_route_author(&route).await;
                        (
                            "updated",
                            Selection::Viewing(RouteDetail {
                                route: route.clone(),
                                author,
                            }),
                        )
                    }
                };
                {
                    let mut state = self.state.lock().await;
                    state.selection = selection;
                    state.last_error = None;
                }
                self.events.emit_lossy(WaymarkEvent::EntityMutated {
                    entity: EntityKind::Route,
                    id: route.id,
                    action: action.to_string(),
                    timestamp: Utc::now(),
                });
                self.refresh().await;
            }
            Err(e) => {
                let message = e.to_string();
                let mut state = self.state.lock().await;
                if let Selection::Editing { draft, .. } = &mut state.selection {
                    *draft = Some(payload);
                }
                state.last_error = Some(message.clone());
                notify_error(&self.events, &message);
            }
        }
    }

    /// Delete a route and refresh the list
    ///
    /// On failure the error is surfaced and the list is left untouched; a
    /// stale entry remains until the next successful refresh.
    pub async fn destroy(&self, id: i64) {
        match self.routes.remove(id).await {
            Ok(()) => {
                {
                    let mut state = self.state.lock().await;
                    if matches!(&state.selection, Selection::Viewing(d) if d.route.id == id) {
                        state.selection = Selection::None;
                    }
                    state.last_error = None;
                }
                self.events.emit_lossy(WaymarkEvent::EntityMutated {
                    entity: EntityKind::Route,
                    id,
                    action: "deleted".to_string(),
                    timestamp: Utc::now(),
                });
                self.refresh().await;
            }
            Err(e) => self.surface(e).await,
        }
    }

    /// Attach a place to a route, then re-fetch that route's detail
    pub async fn attach_place(&self, route_id: i64, place_id: i64) {
        match self.routes.add_place(route_id, place_id).await {
            Ok(()) => {
                self.events.emit_lossy(WaymarkEvent::RoutePlacesChanged {
                    route_id,
                    place_id,
                    attached: true,
                    timestamp: Utc::now(),
                });
                self.refetch_detail(route_id).await;
            }
            Err(e) => self.surface(e).await,
        }
    }

    /// Detach a place from a route, then re-fetch that route's detail
    pub async fn detach_place(&self, route_id: i64, place_id: i64) {
        match self.routes.remove_place(route_id, place_id).await {
            Ok(()) => {
                self.events.emit_lossy(WaymarkEvent::RoutePlacesChanged {
                    route_id,
                    place_id,
                    attached: false,
                    timestamp: Utc::now(),
                });
                self.refetch_detail(route_id).await;
            }
            Err(e) => self.surface(e).await,
        }
    }

    /// Refresh one route's place set from its detail endpoint, updating
    /// the matching list entry and any active selection of that route
    async fn refetch_detail(&self, route_id: i64) {
        match self.routes.get_by_id(route_id).await {
            Ok(detail) => {
                let mut state = self.state.lock().await;
                if let Some(entry) = state.entries.iter_mut().find(|e| e.route.id == route_id) {
                    entry.route = detail.clone();
                }
                if let Selection::Viewing(current) = &mut state.selection {
                    if current.route.id == route_id {
                        current.route = detail;
                    }
                }
                state.last_error = None;
            }
            Err(e) => self.surface(e).await,
        }
    }

    async fn surface(&self, error: Error) {
        let message = error.to_string();
        tracing::warn!(error = %message, "route operation failed");
        self.state.lock().await.last_error = Some(message.clone());
        notify_error(&self.events, &message);
    }
}
