//! User view-state controller

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::Mutex;
use waymark_common::dto::{UserRequest, UserResponse};
use waymark_common::events::{EntityKind, EventBus, WaymarkEvent};
use waymark_common::{Error, Result};

use crate::client::UserClient;
use crate::sync::AssociationResolver;

use super::{notify_error, FormMode, ListPhase, Selection};

/// Snapshot of the user controller's view state
///
/// Detail views carry the user's authored routes hydrated into
/// `UserResponse::routes`.
#[derive(Debug, Clone, Default)]
pub struct UserViewState {
    pub phase: ListPhase,
    pub entries: Vec<UserResponse>,
    pub selection: Selection<UserResponse, UserRequest>,
    /// Most recent unrecovered error, cleared by the next success
    pub last_error: Option<String>,
}

/// View-state controller for users
pub struct UserController {
    users: UserClient,
    resolver: AssociationResolver,
    events: EventBus,
    state: Mutex<UserViewState>,
    refresh_seq: AtomicU64,
    select_seq: AtomicU64,
}

impl UserController {
    pub fn new(users: UserClient, resolver: AssociationResolver, events: EventBus) -> Self {
        Self {
            users,
            resolver,
            events,
            state: Mutex::new(UserViewState::default()),
            refresh_seq: AtomicU64::new(0),
            select_seq: AtomicU64::new(0),
        }
    }

    /// Snapshot of the current view state
    pub async fn state(&self) -> UserViewState {
        self.state.lock().await.clone()
    }

    /// Fetch the user list
    pub async fn refresh(&self) {
        let seq = self.refresh_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.lock().await.phase = ListPhase::Loading;

        let outcome = self.users.list_all().await;

        let mut state = self.state.lock().await;
        if self.refresh_seq.load(Ordering::SeqCst) != seq {
            tracing::debug!(seq, "discarding superseded user list result");
            return;
        }
        match outcome {
            Ok(users) => {
                state.entries = users;
                state.phase = ListPhase::Ready;
                state.last_error = None;
                self.events.emit_lossy(WaymarkEvent::ListRefreshed {
                    entity: EntityKind::User,
                    count: state.entries.len(),
                    timestamp: Utc::now(),
                });
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(error = %message, "user list fetch failed");
                state.phase = ListPhase::Error(message.clone());
                state.last_error = Some(message.clone());
                notify_error(&self.events, &message);
            }
        }
    }

    /// Open the detail view for a user, with authored routes hydrated
    pub async fn select(&self, id: i64) {
        let seq = self.select_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let outcome = self.load_detail(id).await;

        let mut state = self.state.lock().await;
        if self.select_seq.load(Ordering::SeqCst) != seq {
            tracing::debug!(user_id = id, "discarding superseded user selection");
            return;
        }
        match outcome {
            Ok(user) => {
                state.selection = Selection::Viewing(user);
                state.last_error = None;
            }
            Err(e) => {
                let message = e.to_string();
                state.last_error = Some(message.clone());
                notify_error(&self.events, &message);
            }
        }
    }

    async fn load_detail(&self, id: i64) -> Result<UserResponse> {
        let mut user = self.users.get_by_id(id).await?;
        user.routes = self.resolver.resolve_user_routes(&user).await;
        Ok(user)
    }

    /// Open an empty create form
    pub async fn begin_create(&self) {
        self.state.lock().await.selection = Selection::Editing {
            mode: FormMode::Create,
            original: None,
            draft: None,
        };
    }

    /// Open an edit form for an existing user
    pub async fn begin_edit(&self, user: UserResponse) {
        self.state.lock().await.selection = Selection::Editing {
            mode: FormMode::Edit,
            original: Some(user),
            draft: None,
        };
    }

    /// Close any open form or detail view without submitting
    pub async fn clear_selection(&self) {
        self.state.lock().await.selection = Selection::None;
    }

    /// Submit the open form; see the route controller for the contract
    pub async fn submit(&self, payload: UserRequest) {
        let target = {
            let state = self.state.lock().await;
            match &state.selection {
                Selection::Editing { mode, original, .. } => {
                    (*mode, original.as_ref().map(|u| u.id))
                }
                _ => {
                    drop(state);
                    self.surface(Error::Validation("no user form is open".to_string()))
                        .await;
                    return;
                }
            }
        };

        let outcome = match target {
            (FormMode::Create, _) => self.users.create(&payload).await,
            (FormMode::Edit, Some(id)) => self.users.update(id, &payload).await,
            (FormMode::Edit, None) => {
                Err(Error::Validation("edit form without a target user".to_string()))
            }
        };

        match outcome {
            Ok(user) => {
                let (action, selection) = match target.0 {
                    FormMode::Create => ("created", Selection::None),
                    FormMode::Edit => ("updated", Selection::Viewing(user.clone())),
                };
                {
                    let mut state = self.state.lock().await;
                    state.selection = selection;
                    state.last_error = None;
                }
                self.events.emit_lossy(WaymarkEvent::EntityMutated {
                    entity: EntityKind::User,
                    id: user.id,
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

    /// Delete a user and refresh the list
    ///
    /// The store performs no referential cleanup: routes authored by the
    /// deleted user keep their author id, which from now on resolves to a
    /// placeholder label.
    pub async fn destroy(&self, id: i64) {
        match self.users.remove(id).await {
            Ok(()) => {
                {
                    let mut state = self.state.lock().await;
                    if matches!(&state.selection, Selection::Viewing(u) if u.id == id) {
                        state.selection = Selection::None;
                    }
                    state.last_error = None;
                }
                self.events.emit_lossy(WaymarkEvent::EntityMutated {
                    entity: EntityKind::User,
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
        tracing::warn!(error = %message, "user operation failed");
        self.state.lock().await.last_error = Some(message.clone());
        notify_error(&self.events, &message);
    }
}
