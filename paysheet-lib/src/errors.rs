//! Error types for paysheet operations.
//!
//! The taxonomy separates locally preventable conditions (incomplete forms,
//! disallowed removals, double submits) from conditions that have to be
//! surfaced to the user (declines, transport failures). Cancellation reverts
//! state without surfacing a message and is not user-visible.

use thiserror::Error;

/// Error type for paysheet operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SheetError {
    /// A form entry is missing required fields. Resolved locally by the user
    /// editing the form; never caused by the network.
    #[error("form is missing required fields: {}", missing.join(", "))]
    IncompleteForm {
        /// Field keys that are empty or absent.
        missing: Vec<String>,
    },

    /// The backend rejected the instrument. Recoverable by retrying with a
    /// different option; the prior selection stays intact.
    #[error("payment declined: {reason}")]
    Declined {
        /// Backend-provided decline reason (e.g. "card_declined").
        reason: String,
    },

    /// Removal of a saved method is not permitted by the active policy.
    /// Callers should disable the affordance rather than let this surface.
    #[error("removal not allowed: {reason}")]
    RemovalNotAllowed {
        /// Which policy blocked the removal.
        reason: String,
    },

    /// A confirmation attempt is already running for this session. Callers
    /// treat this as a no-op.
    #[error("a confirmation attempt is already in progress")]
    AlreadyInProgress,

    /// The user aborted the flow. Reverts state without a message; exists as
    /// an error only for callers that thread cancellation through `Result`.
    #[error("canceled by user")]
    Canceled,

    /// The referenced saved method does not exist in the store.
    #[error("saved method not found: {id}")]
    MethodNotFound {
        /// The missing method ID.
        id: String,
    },

    /// The operation only applies to co-branded card methods.
    #[error("method {id} is not co-branded")]
    NotCoBranded {
        /// The method ID the operation was attempted on.
        id: String,
    },

    /// The requested brand is not one of the method's co-branded networks.
    #[error("brand {brand} is not available on method {id}")]
    BrandNotAvailable {
        /// The method ID.
        id: String,
        /// The requested brand.
        brand: String,
    },

    /// Transport or backend failure outside the decline taxonomy.
    #[error("transport error: {0}")]
    Transport(String),

    /// Internal/unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SheetError {
    /// Returns true if this error should be shown to the end user as a
    /// message. Everything else is prevented proactively or swallowed.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, Self::Declined { .. } | Self::Transport(_))
    }

    /// Returns true if the condition can be resolved by the user without
    /// leaving the sheet (editing the form, picking another option).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::IncompleteForm { .. } | Self::Declined { .. } | Self::AlreadyInProgress
        )
    }

    /// Create a declined error.
    pub fn declined(reason: impl Into<String>) -> Self {
        Self::Declined {
            reason: reason.into(),
        }
    }

    /// Create a removal-not-allowed error.
    pub fn removal_not_allowed(reason: impl Into<String>) -> Self {
        Self::RemovalNotAllowed {
            reason: reason.into(),
        }
    }

    /// Create a method-not-found error.
    pub fn method_not_found(id: impl Into<String>) -> Self {
        Self::MethodNotFound { id: id.into() }
    }
}

impl From<serde_json::Error> for SheetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_visibility() {
        assert!(SheetError::declined("card_declined").is_user_visible());
        assert!(SheetError::Transport("timeout".into()).is_user_visible());
        assert!(!SheetError::AlreadyInProgress.is_user_visible());
        assert!(!SheetError::Canceled.is_user_visible());
        assert!(!SheetError::removal_not_allowed("last method").is_user_visible());
    }

    #[test]
    fn test_recoverable() {
        let incomplete = SheetError::IncompleteForm {
            missing: vec!["cvc".to_string()],
        };
        assert!(incomplete.is_recoverable());
        assert!(!SheetError::Internal("bug".into()).is_recoverable());
    }

    #[test]
    fn test_display() {
        let err = SheetError::IncompleteForm {
            missing: vec!["number".to_string(), "cvc".to_string()],
        };
        assert_eq!(err.to_string(), "form is missing required fields: number, cvc");
        assert!(SheetError::declined("expired_card")
            .to_string()
            .contains("expired_card"));
    }
}
