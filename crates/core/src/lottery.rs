//! Lottery Mode
//!
//! A time-boxed promotional state that replaces and locks the cart in
//! exchange for a flat discount. The mode is a two-state machine; all
//! clock-dependent transitions take an explicit `now` so callers own the
//! timer.

use jiff::{SignedDuration, Span, Timestamp};
use serde::{Deserialize, Serialize};

/// The lottery-mode state machine: inactive, or active until an absolute
/// expiry instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LotteryMode {
    /// No lottery session; the cart is unlocked.
    #[default]
    Inactive,

    /// A lottery session locks the cart and discounts the item subtotal
    /// until `expires_at`.
    Active {
        /// Absolute expiry instant, set when the session starts.
        expires_at: Timestamp,
    },
}

impl LotteryMode {
    /// Start a session expiring `duration` after `now`.
    #[must_use]
    pub fn start(now: Timestamp, duration: Span) -> Self {
        Self::Active {
            expires_at: now.saturating_add(duration).unwrap_or(Timestamp::MAX),
        }
    }

    /// Whether a session is running.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    /// The expiry instant of the running session, if any.
    #[must_use]
    pub const fn expires_at(&self) -> Option<Timestamp> {
        match self {
            Self::Active { expires_at } => Some(*expires_at),
            Self::Inactive => None,
        }
    }

    /// Forfeit the session immediately.
    pub fn cancel(&mut self) {
        *self = Self::Inactive;
    }

    /// Deactivate the session if its expiry has passed.
    ///
    /// Returns `true` when this call performed the transition, so the caller
    /// can clear the persisted record exactly once.
    pub fn expire_if_due(&mut self, now: Timestamp) -> bool {
        if let Self::Active { expires_at } = self {
            if *expires_at <= now {
                *self = Self::Inactive;
                return true;
            }
        }

        false
    }

    /// Time left on the running session, clamped at zero; `None` when
    /// inactive.
    #[must_use]
    pub fn remaining(&self, now: Timestamp) -> Option<SignedDuration> {
        match self {
            Self::Active { expires_at } => {
                Some(expires_at.duration_since(now).max(SignedDuration::ZERO))
            }
            Self::Inactive => None,
        }
    }
}
