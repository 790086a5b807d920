//! # Gatekeeper Common
//!
//! Shared types, constants, and errors used across Puzzle Gate components.
//!
//! ## Modules
//! - `types` - Core data structures (Point, Quadrant, Role, GateStatus)
//! - `error` - Common error types
//! - `constants` - Shared configuration defaults

pub mod constants;
pub mod error;
pub mod types;

pub use error::GatekeeperError;
pub use types::*;
