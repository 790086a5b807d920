//! Login gate: failed-attempt counting and timed lockout.

mod clock;
mod lockout;

pub use clock::{Clock, SystemClock};
pub use lockout::{GateTransition, LockoutPolicy, LoginGate};
