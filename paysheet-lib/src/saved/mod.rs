//! Saved payment methods.
//!
//! A [`SavedMethod`] is a persisted payment instrument attached to a
//! customer. The [`SavedMethodStore`] owns the list for the active session
//! and is the single writer of the default-method slot.

mod store;

pub use store::{DetachOutcome, SavedMethodStore};

use crate::session::Redisplay;
use crate::{CardBrand, FingerprintKey, MethodTypeId, SavedMethodId};
use serde::{Deserialize, Serialize};

/// A persisted payment instrument for a customer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedMethod {
    /// Backend identifier for this attachment.
    pub id: SavedMethodId,
    /// What kind of instrument this is.
    pub type_id: MethodTypeId,
    /// Key identifying the underlying instrument across attachments.
    pub fingerprint: FingerprintKey,
    /// Display brand, for card instruments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<CardBrand>,
    /// Last four digits of the instrument number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last4: Option<String>,
    /// Whether this is the customer's default method. Maintained by the
    /// store; at most one method carries this flag at a time.
    #[serde(default)]
    pub is_default: bool,
    /// All networks this card can settle on. More than one entry means the
    /// card is co-branded and the brand may be switched.
    #[serde(default)]
    pub networks: Vec<CardBrand>,
    /// Redisplay consent captured at attach time.
    #[serde(default)]
    pub allow_redisplay: Redisplay,
    /// Per-method removal eligibility from the backend.
    #[serde(default = "default_true")]
    pub allow_removal: bool,
    /// When the method was attached (unix epoch seconds).
    pub attached_at: i64,
}

fn default_true() -> bool {
    true
}

impl SavedMethod {
    /// Create a single-network card method.
    pub fn card(
        id: impl Into<SavedMethodId>,
        fingerprint: impl Into<FingerprintKey>,
        brand: CardBrand,
        last4: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            type_id: MethodTypeId::card(),
            fingerprint: fingerprint.into(),
            networks: vec![brand.clone()],
            brand: Some(brand),
            last4: Some(last4.into()),
            is_default: false,
            allow_redisplay: Redisplay::Unspecified,
            allow_removal: true,
            attached_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Create a co-branded card method. The first network is the initially
    /// selected brand.
    pub fn co_branded_card(
        id: impl Into<SavedMethodId>,
        fingerprint: impl Into<FingerprintKey>,
        networks: Vec<CardBrand>,
        last4: impl Into<String>,
    ) -> Self {
        let brand = networks.first().cloned();
        Self {
            id: id.into(),
            type_id: MethodTypeId::card(),
            fingerprint: fingerprint.into(),
            brand,
            networks,
            last4: Some(last4.into()),
            is_default: false,
            allow_redisplay: Redisplay::Unspecified,
            allow_removal: true,
            attached_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Create a US bank account method.
    pub fn us_bank_account(
        id: impl Into<SavedMethodId>,
        fingerprint: impl Into<FingerprintKey>,
        last4: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            type_id: MethodTypeId::us_bank_account(),
            fingerprint: fingerprint.into(),
            brand: None,
            networks: Vec::new(),
            last4: Some(last4.into()),
            is_default: false,
            allow_redisplay: Redisplay::Unspecified,
            allow_removal: true,
            attached_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Set the redisplay consent.
    pub fn with_redisplay(mut self, redisplay: Redisplay) -> Self {
        self.allow_redisplay = redisplay;
        self
    }

    /// Mark the method as non-removable.
    pub fn non_removable(mut self) -> Self {
        self.allow_removal = false;
        self
    }

    /// True when the card can settle on more than one network.
    pub fn is_co_branded(&self) -> bool {
        self.networks.len() > 1
    }

    /// True for card-type methods.
    pub fn is_card(&self) -> bool {
        self.type_id == MethodTypeId::card()
    }
}
