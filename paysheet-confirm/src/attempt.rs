//! Confirmation attempt state machine.
//!
//! One [`ConfirmationAttempt`] tracks one submit cycle from validation to a
//! terminal outcome. Attempts are ephemeral: the coordinator discards them
//! once they terminate, and never runs two at once for the same session.

use crate::ActionKind;
use paysheet_lib::options::PaymentOption;
use serde::{Deserialize, Serialize};

/// Where an attempt currently sits.
///
/// Transitions: `Validating -> Submitting -> {Succeeded, Declined,
/// Canceled, RequiresInput}`; `RequiresInput -> Submitting` once the input
/// is supplied. Cancellation is a terminal state, not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
    /// Local checks before anything touches the network.
    Validating,
    /// The confirmation request is in flight.
    Submitting,
    /// Parked until the named input arrives.
    RequiresInput(ActionKind),
    /// Terminal: confirmed.
    Succeeded,
    /// Terminal: rejected by the backend.
    Declined,
    /// Terminal: aborted by the user.
    Canceled,
}

impl AttemptState {
    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Declined | Self::Canceled)
    }

    /// Check if the attempt still blocks new submissions.
    pub fn is_live(&self) -> bool {
        !self.is_terminal()
    }
}

/// Ephemeral record of one submit cycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationAttempt {
    /// Unique ID for this attempt.
    pub id: String,
    /// The option being confirmed.
    pub option: PaymentOption,
    /// Whether a new instrument should be saved on success.
    pub save_for_future: bool,
    /// Current position in the lifecycle.
    pub state: AttemptState,
    /// Whether this attempt demanded fresh CVC entry.
    pub requires_cvc_recollection: bool,
    /// When the attempt was created (unix epoch seconds).
    pub started_at: i64,
}

impl ConfirmationAttempt {
    /// Create a new attempt in `Validating`.
    pub fn new(option: PaymentOption, save_for_future: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            option,
            save_for_future,
            state: AttemptState::Validating,
            requires_cvc_recollection: false,
            started_at: chrono::Utc::now().timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminality() {
        assert!(AttemptState::Succeeded.is_terminal());
        assert!(AttemptState::Declined.is_terminal());
        assert!(AttemptState::Canceled.is_terminal());
        assert!(AttemptState::Validating.is_live());
        assert!(AttemptState::Submitting.is_live());
        assert!(AttemptState::RequiresInput(ActionKind::Cvc).is_live());
    }

    #[test]
    fn test_new_attempt_starts_validating() {
        let attempt = ConfirmationAttempt::new(PaymentOption::saved("pm_1"), false);
        assert_eq!(attempt.state, AttemptState::Validating);
        assert!(!attempt.requires_cvc_recollection);
        assert!(!attempt.id.is_empty());
    }

    #[test]
    fn test_attempt_ids_are_unique() {
        let a = ConfirmationAttempt::new(PaymentOption::saved("pm_1"), false);
        let b = ConfirmationAttempt::new(PaymentOption::saved("pm_1"), false);
        assert_ne!(a.id, b.id);
    }
}
