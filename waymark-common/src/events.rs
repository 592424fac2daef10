//! Event types for the Waymark event system
//!
//! Provides shared event definitions and the EventBus the controllers
//! publish on. The presentation layer subscribes to render notifications
//! and to learn when list state has changed underneath it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Entity type an event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    User,
    Route,
    Place,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::User => write!(f, "user"),
            EntityKind::Route => write!(f, "route"),
            EntityKind::Place => write!(f, "place"),
        }
    }
}

/// Notification severity, as the presentation should render it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Waymark event types
///
/// Events are broadcast via EventBus and can be serialized for transmission
/// to an attached front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WaymarkEvent {
    /// A controller finished a list fetch cycle
    ///
    /// Triggers:
    /// - UI: re-render the entity table
    ListRefreshed {
        /// Entity type whose list changed
        entity: EntityKind,
        /// Number of entries now held
        count: usize,
        /// When the refresh completed
        timestamp: DateTime<Utc>,
    },

    /// An entity was created, updated, or deleted through a controller
    ///
    /// Triggers:
    /// - UI: close forms, show confirmation
    EntityMutated {
        /// Entity type that was mutated
        entity: EntityKind,
        /// Id of the affected entity
        id: i64,
        /// What happened ("created", "updated", "deleted")
        action: String,
        /// When the mutation was acknowledged by the store
        timestamp: DateTime<Utc>,
    },

    /// A route's place membership changed via attach/detach
    ///
    /// Triggers:
    /// - UI: re-render the route detail's place list
    RoutePlacesChanged {
        /// Route whose membership changed
        route_id: i64,
        /// Place that was attached or detached
        place_id: i64,
        /// True for attach, false for detach
        attached: bool,
        /// When the change was acknowledged by the store
        timestamp: DateTime<Utc>,
    },

    /// User-visible notification (unrecovered errors, confirmations)
    ///
    /// Triggers:
    /// - UI: toast/message display
    Notification {
        /// How the message should be rendered
        severity: Severity,
        /// Human-readable message
        message: String,
        /// When the notification was raised
        timestamp: DateTime<Utc>,
    },
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// Uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<WaymarkEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<WaymarkEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Controllers run headless in tests and in the CLI, so a missing
    /// subscriber is the normal case, not an error.
    pub fn emit_lossy(&self, event: WaymarkEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
