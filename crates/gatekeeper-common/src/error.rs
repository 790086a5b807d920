//! Common error types for Puzzle Gate components.

use thiserror::Error;

/// Errors shared by the gatekeeper library and its collaborators
#[derive(Debug, Error)]
pub enum GatekeeperError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential lookup failed (directory or database unavailable)
    #[error("Credential lookup error: {0}")]
    Credentials(String),

    /// Invalid input from the host (unknown command, bad coordinates)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
