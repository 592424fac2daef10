//! View-state controllers
//!
//! One controller per entity type (users, routes, places). Each holds the
//! current list, the active selection, and form state, and sequences the
//! fetch → render → mutate → re-fetch cycles an attached front end drives.
//!
//! List state: `Idle → Loading → Ready` on success, `Loading → Error` on a
//! failed fetch. Orthogonal to it, the selection sub-state:
//! `None / Viewing / Editing`.
//!
//! Concurrency: controller methods take `&self`; view state lives behind a
//! `tokio::sync::Mutex` that is never held across a network await. Each
//! controller keeps monotonic sequence counters for refresh and select, so
//! a response belonging to a superseded request is discarded on arrival
//! instead of overwriting newer state (last-request-wins). Every mutating
//! operation re-fetches: the full list after create/update/delete, the
//! single route detail after attach/detach.
//!
//! Unrecovered errors land in `last_error` and go out as `Notification`
//! events; already-rendered data is never rolled back.

use chrono::Utc;
use waymark_common::events::{EventBus, Severity, WaymarkEvent};

mod places;
mod routes;
mod users;

pub use places::{PlaceController, PlaceDetail, PlaceViewState};
pub use routes::{RouteController, RouteDetail, RouteListEntry, RouteViewState};
pub use users::{UserController, UserViewState};

/// List loading phase
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ListPhase {
    /// Nothing fetched yet
    #[default]
    Idle,
    /// A list fetch cycle is in flight
    Loading,
    /// List is populated and current as of the last fetch
    Ready,
    /// The last fetch cycle failed; previously rendered entries are kept
    Error(String),
}

/// Whether an open form creates a new entity or edits an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
}

/// Active detail/selection sub-state, orthogonal to the list phase
///
/// `D` is the display-ready detail composite, `R` the request payload kept
/// as a draft when a submission fails.
#[derive(Debug, Clone)]
pub enum Selection<D, R> {
    /// No entity selected
    None,
    /// Detail view open
    Viewing(D),
    /// Form open; `original` is the entity under edit (absent for create),
    /// `draft` the last payload whose submission failed
    Editing {
        mode: FormMode,
        original: Option<D>,
        draft: Option<R>,
    },
}

impl<D, R> Default for Selection<D, R> {
    fn default() -> Self {
        Selection::None
    }
}

impl<D, R> Selection<D, R> {
    /// True while a form is open
    pub fn is_editing(&self) -> bool {
        matches!(self, Selection::Editing { .. })
    }
}

/// Broadcast an error notification for the front end
fn notify_error(events: &EventBus, message: &str) {
    events.emit_lossy(WaymarkEvent::Notification {
        severity: Severity::Error,
        message: message.to_string(),
        timestamp: Utc::now(),
    });
}
