//! # Gatekeeper - Puzzle Gate login engine
//!
//! Gates a login form behind a drag-and-drop jigsaw CAPTCHA and locks the
//! form after repeated failed checks.
//!
//! ## Architecture
//! ```text
//! host (event loop) → LoginSession ─┬→ PuzzleState  (captcha)
//!                                   ├→ LoginGate    (attempts / lockout)
//!                                   └→ CredentialCheck (role lookup)
//! ```

pub mod auth;
pub mod captcha;
pub mod config;
pub mod gate;
pub mod host;
pub mod session;

pub use auth::{Account, CredentialCheck, StaticDirectory};
pub use captcha::{CaptchaError, DragIntent, PuzzleSettings, PuzzleState};
pub use gate::{Clock, LockoutPolicy, LoginGate, SystemClock};
pub use session::{LoginSession, SessionEvent, SessionOutcome};
