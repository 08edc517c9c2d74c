//! Paysheet core library.
//!
//! This crate holds the client-side state that a payment sheet presentation
//! needs to track: which payment option is selected, which saved methods the
//! customer has (and which one is the default), and any in-progress form
//! input that should survive navigation within the same presentation.
//!
//! It intentionally stays free of UI and network concerns. The confirmation
//! lifecycle that drives these stores lives in `paysheet-confirm`, which
//! talks to the checkout backend through trait-based dependency injection.
//!
//! # Components
//!
//! - **[`options::PaymentOptionRegistry`]**: ordered selectable options and
//!   the single current selection.
//! - **[`saved::SavedMethodStore`]**: saved methods for the active customer
//!   session, including dedup, the default-method slot, and removal policy.
//! - **[`forms::FormSessionCache`]**: draft form values per method type,
//!   scoped to one sheet presentation.
//!
//! # Example
//!
//! ```
//! use paysheet_lib::saved::{SavedMethod, SavedMethodStore};
//! use paysheet_lib::session::CustomerSession;
//! use paysheet_lib::{CardBrand, MethodTypeId};
//!
//! let store = SavedMethodStore::new();
//! let card = SavedMethod::card("pm_1", "fp_visa", CardBrand::Visa, "4242");
//! store.attach(card, false).unwrap();
//!
//! let session = CustomerSession::legacy("ek_test");
//! let visible = store.list(&session);
//! assert_eq!(visible.len(), 1);
//! // First-ever attach always becomes the default.
//! assert!(visible[0].is_default);
//! ```

use serde::{Deserialize, Serialize};

pub mod config;
pub mod errors;
pub mod forms;
pub mod options;
pub mod saved;
pub mod session;

pub use config::SheetConfiguration;
pub use errors::SheetError;
pub use forms::{FormDraft, FormSessionCache, RequiredFieldPolicy};
pub use options::{PaymentOption, PaymentOptionRegistry, WalletKind};
pub use saved::{DetachOutcome, SavedMethod, SavedMethodStore};
pub use session::{CustomerSession, Redisplay, RedisplayFilter};

/// Common result alias for paysheet operations.
pub type Result<T> = std::result::Result<T, SheetError>;

/// Identifier for a payment method type (the kind of instrument, not an
/// individual instrument).
///
/// # Example
///
/// ```
/// use paysheet_lib::MethodTypeId;
///
/// // Create from &str
/// let card: MethodTypeId = "card".into();
///
/// // Or explicitly
/// let sepa = MethodTypeId::new("sepa_debit");
///
/// assert_eq!(card, MethodTypeId::card());
/// assert_eq!(sepa.as_str(), "sepa_debit");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodTypeId(pub String);

impl MethodTypeId {
    /// Create a new MethodTypeId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the method type ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Well-known type ID for card instruments.
    pub const CARD: &'static str = "card";

    /// Well-known type ID for US bank account instruments.
    pub const US_BANK_ACCOUNT: &'static str = "us_bank_account";

    /// Well-known type ID for SEPA debit instruments.
    pub const SEPA_DEBIT: &'static str = "sepa_debit";

    /// Create the card type ID.
    pub fn card() -> Self {
        Self::new(Self::CARD)
    }

    /// Create the US bank account type ID.
    pub fn us_bank_account() -> Self {
        Self::new(Self::US_BANK_ACCOUNT)
    }

    /// Create the SEPA debit type ID.
    pub fn sepa_debit() -> Self {
        Self::new(Self::SEPA_DEBIT)
    }
}

impl From<&str> for MethodTypeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for MethodTypeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for MethodTypeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MethodTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for an individual saved payment method.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SavedMethodId(pub String);

impl SavedMethodId {
    /// Create a new SavedMethodId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SavedMethodId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SavedMethodId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for SavedMethodId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Backend-assigned key identifying the underlying instrument.
///
/// Two attachments with the same fingerprint represent the same card or bank
/// account; dedup collapses them to one visible entry under customer-session
/// scope.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FingerprintKey(pub String);

impl FingerprintKey {
    /// Create a new FingerprintKey from a string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Get the fingerprint as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FingerprintKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for FingerprintKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for FingerprintKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Card network brand.
///
/// Co-branded cards carry more than one network and require an explicit
/// brand choice before confirmation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardBrand {
    Visa,
    Mastercard,
    Amex,
    CartesBancaires,
    /// A network this library has no special handling for.
    Unknown(String),
}

impl CardBrand {
    /// Get the brand as a wire-format string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Visa => "visa",
            Self::Mastercard => "mastercard",
            Self::Amex => "amex",
            Self::CartesBancaires => "cartes_bancaires",
            Self::Unknown(other) => other.as_str(),
        }
    }
}

impl From<&str> for CardBrand {
    fn from(s: &str) -> Self {
        match s {
            "visa" => Self::Visa,
            "mastercard" => Self::Mastercard,
            "amex" => Self::Amex,
            "cartes_bancaires" => Self::CartesBancaires,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for CardBrand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
