//! # Waymark Client Core
//!
//! Client-side core of the Waymark travel-route manager. The authoritative
//! store lives behind a coarse-grained HTTP/JSON API (no joins, no
//! server-side eager loading); this crate keeps the client's composite
//! views consistent with it.
//!
//! Three layers, leaves first:
//! - [`client`]: one remote façade per entity type (Users, Routes,
//!   Places); request construction, response decoding, error taxonomy.
//! - [`sync`]: resolves cross-entity references (author names, place
//!   membership, authored routes) with secondary fetches; degrades to
//!   fallback labels instead of failing the view.
//! - [`controller`]: per-entity view-state controllers sequencing
//!   fetch → render → mutate → re-fetch cycles for an attached front end.
//!
//! The front end itself (tables, modals, forms) is an external consumer of
//! the controllers and is not part of this crate; `main.rs` ships a thin
//! command-line stand-in.

pub mod client;
pub mod controller;
pub mod sync;

pub use client::{ApiClient, PlaceClient, RouteClient, UserClient};
pub use sync::{AssociationResolver, AuthorLabel};
