//! Login form session.
//!
//! Owns everything the login window used to keep in loose fields: the live
//! puzzle, the attempt gate, the pointer drag, and the credential inputs.
//! Hosts feed it `SessionEvent`s from their event loop and render the
//! returned `SessionOutcome`.

use chrono::{DateTime, Utc};
use gatekeeper_common::{GateStatus, GatekeeperError, LandingView, Point, Quadrant};
use rand::rngs::StdRng;
use serde::Serialize;
use thiserror::Error;

use crate::auth::{Account, CredentialCheck};
use crate::captcha::{CaptchaError, DragIntent, DragTracker, ImageSource, PuzzleSettings, PuzzleState};
use crate::gate::{GateTransition, LoginGate};

/// Input from the login form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    EmailEntered(String),
    PasswordEntered(String),
    PointerPressed(Point),
    PointerMoved(Point),
    PointerReleased,
    Drag(DragIntent),
    CheckCaptcha,
    ResetCaptcha,
    Submit,
    /// Periodic lockout check
    Tick,
}

/// Why an action was turned down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    Locked { until: DateTime<Utc> },
    /// Fields empty or captcha unsolved
    NotReady,
}

/// Result of handling one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Updated,
    Ignored,
    CaptchaPassed,
    /// Check failed; the puzzle has been reshuffled
    CaptchaFailed { remaining: u32 },
    LockedOut { until: DateTime<Utc> },
    CaptchaReset,
    Refused(Refusal),
    Authenticated { account: Account, landing: LandingView },
    /// Unknown credentials; the puzzle has been reshuffled
    InvalidCredentials,
    Unlocked,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Captcha(#[from] CaptchaError),

    #[error(transparent)]
    Credentials(#[from] GatekeeperError),
}

/// Tile as the host may display it
#[derive(Debug, Clone, Serialize)]
pub struct TileView {
    pub tile: Quadrant,
    pub position: Point,
    pub size: (u32, u32),
}

/// Form state for rendering and for `status` output
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub gate: GateStatus,
    pub attempts: String,
    pub attempts_remaining: u32,
    pub captcha_solved: bool,
    pub fields_filled: bool,
    pub submit_enabled: bool,
    pub captcha_check_enabled: bool,
    pub held_tile: Option<Quadrant>,
    pub tiles: Vec<TileView>,
}

pub struct LoginSession {
    source: Box<dyn ImageSource>,
    puzzle: PuzzleState,
    gate: LoginGate,
    drag: DragTracker,
    directory: Box<dyn CredentialCheck>,
    rng: StdRng,
    email: String,
    password: String,
}

impl LoginSession {
    /// Build a session with a freshly generated puzzle.
    ///
    /// Fails when the puzzle image cannot be loaded; the form must not be shown then.
    pub fn new(
        source: Box<dyn ImageSource>,
        settings: PuzzleSettings,
        gate: LoginGate,
        directory: Box<dyn CredentialCheck>,
        mut rng: StdRng,
    ) -> Result<Self, CaptchaError> {
        let puzzle = PuzzleState::generate(source.as_ref(), settings, &mut rng)?;

        Ok(Self {
            source,
            puzzle,
            gate,
            drag: DragTracker::new(),
            directory,
            rng,
            email: String::new(),
            password: String::new(),
        })
    }

    pub fn handle(
        &mut self,
        event: SessionEvent,
        now: DateTime<Utc>,
    ) -> Result<SessionOutcome, SessionError> {
        match event {
            SessionEvent::EmailEntered(email) => {
                self.email = email;
                Ok(SessionOutcome::Updated)
            }
            SessionEvent::PasswordEntered(password) => {
                self.password = password;
                Ok(SessionOutcome::Updated)
            }
            SessionEvent::PointerPressed(at) => Ok(match self.drag.press(&self.puzzle, at) {
                Some(_) => SessionOutcome::Updated,
                None => SessionOutcome::Ignored,
            }),
            SessionEvent::PointerMoved(at) => Ok(match self.drag.motion(at) {
                Some(intent) => {
                    intent.apply(&mut self.puzzle);
                    SessionOutcome::Updated
                }
                None => SessionOutcome::Ignored,
            }),
            SessionEvent::PointerReleased => Ok(match self.drag.release() {
                Some(_) => SessionOutcome::Updated,
                None => SessionOutcome::Ignored,
            }),
            SessionEvent::Drag(intent) => {
                intent.apply(&mut self.puzzle);
                Ok(SessionOutcome::Updated)
            }
            SessionEvent::CheckCaptcha => self.check_captcha(now),
            SessionEvent::ResetCaptcha => {
                self.regenerate()?;
                Ok(SessionOutcome::CaptchaReset)
            }
            SessionEvent::Submit => self.submit(),
            SessionEvent::Tick => Ok(match self.gate.tick(now) {
                GateTransition::Unlocked => SessionOutcome::Unlocked,
                _ => SessionOutcome::Ignored,
            }),
        }
    }

    fn check_captcha(&mut self, now: DateTime<Utc>) -> Result<SessionOutcome, SessionError> {
        if let Some(refusal) = self.lock_refusal() {
            return Ok(SessionOutcome::Refused(refusal));
        }

        if self.puzzle.check_solved() {
            self.gate.record_success();
            tracing::info!("Captcha passed");
            return Ok(SessionOutcome::CaptchaPassed);
        }

        match self.gate.record_failure(now) {
            GateTransition::Locked { until } => Ok(SessionOutcome::LockedOut { until }),
            GateTransition::FailureCounted { remaining, .. } => {
                self.regenerate()?;
                Ok(SessionOutcome::CaptchaFailed { remaining })
            }
            _ => Ok(SessionOutcome::Ignored),
        }
    }

    fn submit(&mut self) -> Result<SessionOutcome, SessionError> {
        if let Some(refusal) = self.lock_refusal() {
            return Ok(SessionOutcome::Refused(refusal));
        }
        if !self.submission_allowed() {
            return Ok(SessionOutcome::Refused(Refusal::NotReady));
        }

        let email = self.email.trim();
        match self.directory.authenticate(email, self.password.trim())? {
            Some(account) => {
                tracing::info!(email = %account.email, role = %account.role, "Login succeeded");
                let landing = account.role.landing_view();
                Ok(SessionOutcome::Authenticated { account, landing })
            }
            None => {
                tracing::info!(email = %email, "Login rejected: unknown credentials");
                self.regenerate()?;
                Ok(SessionOutcome::InvalidCredentials)
            }
        }
    }

    fn regenerate(&mut self) -> Result<(), CaptchaError> {
        self.drag.release();
        self.puzzle = self.puzzle.reset(self.source.as_ref(), &mut self.rng)?;
        Ok(())
    }

    fn lock_refusal(&self) -> Option<Refusal> {
        match self.gate.status() {
            GateStatus::Locked { until } => Some(Refusal::Locked { until }),
            GateStatus::Open => None,
        }
    }

    pub fn fields_filled(&self) -> bool {
        !self.email.trim().is_empty() && !self.password.trim().is_empty()
    }

    pub fn submission_allowed(&self) -> bool {
        self.gate
            .is_submission_allowed(self.fields_filled(), self.puzzle.is_solved())
    }

    pub fn is_locked(&self) -> bool {
        self.gate.is_locked()
    }

    pub fn puzzle(&self) -> &PuzzleState {
        &self.puzzle
    }

    pub fn gate(&self) -> &LoginGate {
        &self.gate
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            gate: self.gate.status(),
            attempts: self.gate.attempts_label(),
            attempts_remaining: self.gate.attempts_remaining(),
            captcha_solved: self.puzzle.is_solved(),
            fields_filled: self.fields_filled(),
            submit_enabled: self.submission_allowed(),
            captcha_check_enabled: self.gate.can_verify_captcha(),
            held_tile: self.drag.held(),
            tiles: self
                .puzzle
                .tiles()
                .iter()
                .map(|tile| TileView {
                    tile: tile.quadrant(),
                    position: tile.position(),
                    size: tile.size(),
                })
                .collect(),
        }
    }
}
