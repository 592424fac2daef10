//! Common error types for Waymark

use thiserror::Error;

/// Common result type for Waymark operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the remote façades and controllers
///
/// `Validation` is raised locally before a request is built and never
/// reaches the network. `NotFound` is an explicit miss reported by the
/// backing store. `Transport` covers everything else the network can do
/// wrong: connect/timeout failures, non-2xx statuses, undecodable bodies.
#[derive(Error, Debug)]
pub enum Error {
    /// Payload failed local structural checks
    #[error("Validation error: {0}")]
    Validation(String),

    /// Backing store reports no such id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network failure or non-2xx response not otherwise classified
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
