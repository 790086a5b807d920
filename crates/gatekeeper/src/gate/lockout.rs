//! Failed-attempt tracking with timed lockout.

use chrono::{DateTime, TimeDelta, Utc};
use gatekeeper_common::constants::{LOCK_DURATION_SECS, MAX_FAILED_ATTEMPTS};
use gatekeeper_common::{GateStatus, GatekeeperError};
use std::time::Duration;

/// How many failures are tolerated and for how long the gate then locks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    max_attempts: u32,
    lock_duration: TimeDelta,
}

impl LockoutPolicy {
    pub fn new(max_attempts: u32, lock_duration: Duration) -> Result<Self, GatekeeperError> {
        if max_attempts == 0 {
            return Err(GatekeeperError::Config(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        let lock_duration = TimeDelta::from_std(lock_duration).map_err(|_| {
            GatekeeperError::Config(format!("lock duration {:?} is out of range", lock_duration))
        })?;

        Ok(Self {
            max_attempts,
            lock_duration,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn lock_duration(&self) -> TimeDelta {
        self.lock_duration
    }
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_FAILED_ATTEMPTS,
            lock_duration: TimeDelta::seconds(LOCK_DURATION_SECS as i64),
        }
    }
}

/// What a gate operation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateTransition {
    /// Nothing changed
    Unchanged,
    /// Failure counted, gate still open
    FailureCounted { failed_attempts: u32, remaining: u32 },
    /// Failure limit reached
    Locked { until: DateTime<Utc> },
    /// Lockout expired; counter back to zero
    Unlocked,
}

/// Login attempt state: failed captcha checks and any active lockout.
///
/// Lives for the whole process and is never persisted.
#[derive(Debug, Clone)]
pub struct LoginGate {
    policy: LockoutPolicy,
    failed_attempts: u32,
    status: GateStatus,
}

impl LoginGate {
    pub fn new(policy: LockoutPolicy) -> Self {
        Self {
            policy,
            failed_attempts: 0,
            status: GateStatus::Open,
        }
    }

    /// Count a failed captcha check. Reaching the limit locks the gate.
    /// Ignored while already locked.
    pub fn record_failure(&mut self, now: DateTime<Utc>) -> GateTransition {
        if self.status.is_locked() {
            return GateTransition::Unchanged;
        }

        self.failed_attempts = (self.failed_attempts + 1).min(self.policy.max_attempts);

        if self.failed_attempts >= self.policy.max_attempts {
            let until = now + self.policy.lock_duration;
            self.status = GateStatus::Locked { until };

            tracing::warn!(
                failed_attempts = self.failed_attempts,
                until = %until,
                "Login locked due to failed captcha attempts"
            );

            return GateTransition::Locked { until };
        }

        tracing::debug!(
            failed_attempts = self.failed_attempts,
            max_attempts = self.policy.max_attempts,
            "Captcha attempt failed"
        );

        GateTransition::FailureCounted {
            failed_attempts: self.failed_attempts,
            remaining: self.attempts_remaining(),
        }
    }

    /// Count a passed captcha check.
    ///
    /// The failure counter is left alone; only a lockout expiring clears it.
    pub fn record_success(&mut self) -> GateTransition {
        tracing::debug!(failed_attempts = self.failed_attempts, "Captcha attempt passed");
        GateTransition::Unchanged
    }

    /// Expire the lockout once `now` reaches the deadline.
    pub fn tick(&mut self, now: DateTime<Utc>) -> GateTransition {
        match self.status {
            GateStatus::Locked { until } if now >= until => {
                self.status = GateStatus::Open;
                self.failed_attempts = 0;
                tracing::info!("Login lockout expired");
                GateTransition::Unlocked
            }
            _ => GateTransition::Unchanged,
        }
    }

    /// Login may be submitted only with filled fields, a solved captcha, and an open gate.
    pub fn is_submission_allowed(&self, fields_filled: bool, captcha_solved: bool) -> bool {
        fields_filled && captcha_solved && !self.status.is_locked()
    }

    /// Captcha checks are refused while locked
    pub fn can_verify_captcha(&self) -> bool {
        !self.status.is_locked()
    }

    pub fn status(&self) -> GateStatus {
        self.status
    }

    pub fn is_locked(&self) -> bool {
        self.status.is_locked()
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.policy.max_attempts
    }

    pub fn attempts_remaining(&self) -> u32 {
        self.policy.max_attempts.saturating_sub(self.failed_attempts)
    }

    /// Time left on an active lockout
    pub fn lock_remaining(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        match self.status {
            GateStatus::Locked { until } => Some((until - now).max(TimeDelta::zero())),
            GateStatus::Open => None,
        }
    }

    /// Counter text shown under the login button
    pub fn attempts_label(&self) -> String {
        format!("Attempts: {}/{}", self.failed_attempts, self.policy.max_attempts)
    }
}

impl Default for LoginGate {
    fn default() -> Self {
        Self::new(LockoutPolicy::default())
    }
}
