//! Place view-state controller

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::Mutex;
use waymark_common::dto::{PlaceRequest, PlaceResponse, RouteResponse};
use waymark_common::events::{EntityKind, EventBus, WaymarkEvent};
use waymark_common::{Error, Result};

use crate::client::PlaceClient;
use crate::sync::AssociationResolver;

use super::{notify_error, FormMode, ListPhase, Selection};

/// Display-ready place detail: the place plus the routes that include it
#[derive(Debug, Clone)]
pub struct PlaceDetail {
    pub place: PlaceResponse,
    pub routes: Vec<RouteResponse>,
}

/// Snapshot of the place controller's view state
#[derive(Debug, Clone, Default)]
pub struct PlaceViewState {
    pub phase: ListPhase,
    pub entries: Vec<PlaceResponse>,
    pub selection: Selection<PlaceDetail, PlaceRequest>,
    /// Most recent unrecovered error, cleared by the next success
    pub last_error: Option<String>,
}

/// View-state controller for places
pub struct PlaceController {
    places: PlaceClient,
    resolver: AssociationResolver,
    events: EventBus,
    state: Mutex<PlaceViewState>,
    refresh_seq: AtomicU64,
    select_seq: AtomicU64,
}

impl PlaceController {
    pub fn new(places: PlaceClient, resolver: AssociationResolver, events: EventBus) -> Self {
        Self {
            places,
            resolver,
            events,
            state: Mutex::new(PlaceViewState::default()),
            refresh_seq: AtomicU64::new(0),
            select_seq: AtomicU64::new(0),
        }
    }

    /// Snapshot of the current view state
    pub async fn state(&self) -> PlaceViewState {
        self.state.lock().await.clone()
    }

    /// Fetch the place list
    pub async fn refresh(&self) {
        let seq = self.begin_list_cycle().await;
        let outcome = self.places.list_all().await;
        self.finish_list_cycle(seq, outcome).await;
    }

    /// Fetch only places on no route authored by the given user
    ///
    /// Same Loading/Ready/Error machinery and coalescing token as a plain
    /// refresh.
    pub async fn refresh_not_visited(&self, user_id: i64) {
        let seq = self.begin_list_cycle().await;
        let outcome = self.places.list_not_visited(user_id).await;
        self.finish_list_cycle(seq, outcome).await;
    }

    async fn begin_list_cycle(&self) -> u64 {
        let seq = self.refresh_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.lock().await.phase = ListPhase::Loading;
        seq
    }

    async fn finish_list_cycle(&self, seq: u64, outcome: Result<Vec<PlaceResponse>>) {
        let mut state = self.state.lock().await;
        if self.refresh_seq.load(Ordering::SeqCst) != seq {
            tracing::debug!(seq, "discarding superseded place list result");
            return;
        }
        match outcome {
            Ok(places) => {
                state.entries = places;
                state.phase = ListPhase::Ready;
                state.last_error = None;
                self.events.emit_lossy(WaymarkEvent::ListRefreshed {
                    entity: EntityKind::Place,
                    count: state.entries.len(),
                    timestamp: Utc::now(),
                });
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(error = %message, "place list fetch failed");
                state.phase = ListPhase::Error(message.clone());
                state.last_error = Some(message.clone());
                notify_error(&self.events, &message);
            }
        }
    }

    /// Open the detail view for a place, with its routes resolved
    pub async fn select(&self, id: i64) {
        let seq = self.select_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let outcome = self.load_detail(id).await;

        let mut state = self.state.lock().await;
        if self.select_seq.load(Ordering::SeqCst) != seq {
            tracing::debug!(place_id = id, "discarding superseded place selection");
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

    async fn load_detail(&self, id: i64) -> Result<PlaceDetail> {
        let place = self.places.get_by_id(id).await?;
        let routes = self.resolver.resolve_place_routes(&place).await;
        Ok(PlaceDetail { place, routes })
    }

    /// Open an empty create form
    pub async fn begin_create(&self) {
        self.state.lock().await.selection = Selection::Editing {
            mode: FormMode::Create,
            original: None,
            draft: None,
        };
    }

    /// Open an edit form for an existing place
    pub async fn begin_edit(&self, detail: PlaceDetail) {
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

    /// Submit the open form; see the route controller for the contract
    pub async fn submit(&self, payload: PlaceRequest) {
        let target = {
            let state = self.state.lock().await;
            match &state.selection {
                Selection::Editing { mode, original, .. } => {
                    (*mode, original.as_ref().map(|d| d.place.id))
                }
                _ => {
                    drop(state);
                    self.surface(Error::Validation("no place form is open".to_string()))
                        .await;
                    return;
                }
            }
        };

        let outcome = match target {
            (FormMode::Create, _) => self.places.create(&payload).await,
            (FormMode::Edit, Some(id)) => self.places.update(id, &payload).await,
            (FormMode::Edit, None) => {
                Err(Error::Validation("edit form without a target place".to_string()))
            }
        };

        match outcome {
            Ok(place) => {
                let (action, selection) = match target.0 {
                    FormMode::Create => ("created", Selection::None),
                    FormMode::Edit => {
                        let routes = self.resolver.resolve_place_routes(&place).await;
                        (
                            "updated",
                            Selection::Viewing(PlaceDetail {
                                place: place.clone(),
                                routes,
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
                    entity: EntityKind::Place,
                    id: place.id,
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

    /// Delete a place and refresh the list
    ///
    /// The store detaches the place from any routes first; the routes
    /// themselves survive.
    pub async fn destroy(&self, id: i64) {
        match self.places.remove(id).await {
            Ok(()) => {
                {
                    let mut state = self.state.lock().await;
                    if matches!(&state.selection, Selection::Viewing(d) if d.place.id == id) {
                        state.selection = Selection::None;
                    }
                    state.last_error = None;
                }
                self.events.emit_lossy(WaymarkEvent::EntityMutated {
                    entity: EntityKind::Place,
                    id,
                    action: "deleted".to_string(),
                    timestamp: Utc::now(),
                });
                self.refresh().await;
            }
            Err(e) => self.surface(e).await,
        }
    }

    async fn surface(&self, error: Error) {
        let message = error.to_string();
        tracing::warn!(error = %message, "place operation failed");
        self.state.lock().await.last_error = Some(message.clone());
        notify_error(&self.events, &message);
    }
}
