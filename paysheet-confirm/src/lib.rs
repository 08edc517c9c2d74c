//! Paysheet confirmation layer.
//!
//! This crate drives the submit/confirm lifecycle for a payment sheet: it
//! validates the selected option, dispatches one confirmation attempt at a
//! time to the checkout backend, and reconciles the outcome back into the
//! stores from `paysheet-lib`.
//!
//! The backend is reached only through the [`IntentClient`] trait, so the
//! coordinator can be exercised entirely with in-process fakes. Analytics
//! flow through the fire-and-forget [`AnalyticsSink`] and never block or
//! fail a state transition.

use paysheet_lib::options::PaymentOption;
use paysheet_lib::saved::SavedMethod;
use paysheet_lib::session::CustomerSession;
use paysheet_lib::{SavedMethodId, SheetError};
use serde::{Deserialize, Serialize};

pub mod attempt;
pub mod coordinator;
pub mod events;

pub use attempt::{AttemptState, ConfirmationAttempt};
pub use coordinator::ConfirmationCoordinator;

/// Result type for confirmation operations.
pub type Result<T> = std::result::Result<T, ConfirmError>;

#[derive(thiserror::Error, Debug)]
pub enum ConfirmError {
    /// The selected form entry is missing required fields. Local validation;
    /// the network is never touched.
    #[error("form is missing required fields: {}", missing.join(", "))]
    IncompleteForm { missing: Vec<String> },
    /// Another confirmation attempt is still running. Callers treat this as
    /// a no-op.
    #[error("a confirmation attempt is already in progress")]
    AlreadyInProgress,
    /// The requested transition does not apply to the current attempt state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Nothing is selected to confirm.
    #[error("no payment option selected")]
    NothingSelected,
    /// Transport or backend failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// Failure propagated from the core stores.
    #[error(transparent)]
    Sheet(#[from] SheetError),
}

/// Extra input a confirmation needs before it can complete.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Fresh CVC entry for a saved card.
    Cvc,
    /// Micro-deposit verification for a bank account.
    MicroDeposit,
    /// A web redirect the user must complete.
    WebRedirect,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Cvc => "cvc",
            Self::MicroDeposit => "micro_deposit",
            Self::WebRedirect => "web_redirect",
        };
        write!(f, "{label}")
    }
}

/// Terminal (or input-waiting) result of one submit call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The confirmation went through. `attached` names the saved method the
    /// attempt produced, when the instrument was saved.
    Succeeded {
        attached: Option<SavedMethodId>,
    },
    /// The backend rejected the instrument. The prior selection stays
    /// intact; the user may retry the same option without re-entering data.
    Declined { reason: String },
    /// The user aborted. Selection reverts to the previously confirmed
    /// option; no message is surfaced.
    Canceled,
    /// The attempt is parked until the named input arrives.
    RequiresInput { action: ActionKind },
}

impl Outcome {
    /// True when the attempt reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::RequiresInput { .. })
    }
}

/// One confirmation dispatch to the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfirmRequest {
    /// The option being confirmed.
    pub option: PaymentOption,
    /// Whether a new instrument should be saved for future use.
    pub save_for_future: bool,
    /// Recollected CVC, when the recollection policy demanded one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cvc: Option<String>,
}

/// What the backend resolved a confirmation dispatch to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IntentOutcome {
    /// Confirmed. `attached` carries the saved method when the backend
    /// persisted the instrument.
    Succeeded { attached: Option<SavedMethod> },
    /// The instrument was rejected.
    Declined { reason: String },
    /// The backend needs the user to complete an action first.
    RequiresAction { action: ActionKind },
    /// The user dismissed an external flow (wallet sheet, redirect).
    Canceled,
}

/// Abstraction over the checkout backend.
///
/// Implementations own the wire protocol; the coordinator only consumes
/// these two operations.
#[async_trait::async_trait]
pub trait IntentClient: Send + Sync {
    /// Create or confirm the payment intent for the selected option.
    async fn create_or_confirm_intent(&self, request: &ConfirmRequest) -> Result<IntentOutcome>;

    /// Fetch the saved methods visible to a customer session.
    async fn fetch_saved_methods(&self, session: &CustomerSession) -> Result<Vec<SavedMethod>>;
}

/// Fire-and-forget analytics seam. Implementations must not block; failures
/// are swallowed and never affect a state transition.
pub trait AnalyticsSink: Send + Sync {
    /// Report an event with structured attributes.
    fn report_event(&self, name: &str, attributes: &serde_json::Value);
}

/// Sink that drops every event.
pub struct NoopAnalytics;

impl AnalyticsSink for NoopAnalytics {
    fn report_event(&self, _name: &str, _attributes: &serde_json::Value) {}
}
