//! Selectable payment options.
//!
//! A [`PaymentOption`] is one way to pay: a wallet, a saved instrument, or a
//! new-entry form. The [`PaymentOptionRegistry`] holds the ordered list of
//! options and the single current selection.

mod registry;

pub use registry::PaymentOptionRegistry;

use crate::forms::FormDraft;
use crate::{MethodTypeId, SavedMethodId};
use serde::{Deserialize, Serialize};

/// Wallet options offered by the sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletKind {
    /// The platform's system wallet sheet.
    PlatformPay,
    /// An account-backed wallet with its own login.
    LinkWallet,
}

impl WalletKind {
    /// Get the wallet kind as a wire-format string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::PlatformPay => "platform_pay",
            Self::LinkWallet => "link_wallet",
        }
    }
}

impl std::fmt::Display for WalletKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One selectable way to pay.
///
/// Exactly one option (or none) is selected at any time. A `FormEntry`
/// carries its live draft; it may be selected while incomplete, but can only
/// be confirmed once its required fields are filled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentOption {
    /// A wallet confirmation flow.
    Wallet { wallet: WalletKind },
    /// A previously saved instrument.
    Saved { id: SavedMethodId },
    /// A new-instrument form, with its in-progress draft.
    FormEntry { draft: FormDraft },
}

impl PaymentOption {
    /// Create a wallet option.
    pub fn wallet(wallet: WalletKind) -> Self {
        Self::Wallet { wallet }
    }

    /// Create a saved-method option.
    pub fn saved(id: impl Into<SavedMethodId>) -> Self {
        Self::Saved { id: id.into() }
    }

    /// Create a form-entry option from a draft.
    pub fn form_entry(draft: FormDraft) -> Self {
        Self::FormEntry { draft }
    }

    /// The saved method ID, for saved options.
    pub fn saved_id(&self) -> Option<&SavedMethodId> {
        match self {
            Self::Saved { id } => Some(id),
            _ => None,
        }
    }

    /// The form draft, for form-entry options.
    pub fn draft(&self) -> Option<&FormDraft> {
        match self {
            Self::FormEntry { draft } => Some(draft),
            _ => None,
        }
    }

    /// The method type a form-entry option collects.
    pub fn form_type_id(&self) -> Option<&MethodTypeId> {
        self.draft().map(|d| &d.type_id)
    }

    /// True for form-entry options.
    pub fn is_form_entry(&self) -> bool {
        matches!(self, Self::FormEntry { .. })
    }

    /// True when this option refers to the given saved method.
    pub fn refers_to(&self, id: &SavedMethodId) -> bool {
        self.saved_id() == Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_accessors() {
        let wallet = PaymentOption::wallet(WalletKind::PlatformPay);
        assert!(wallet.saved_id().is_none());
        assert!(!wallet.is_form_entry());

        let saved = PaymentOption::saved("pm_1");
        assert!(saved.refers_to(&"pm_1".into()));
        assert!(!saved.refers_to(&"pm_2".into()));

        let form = PaymentOption::form_entry(FormDraft::new("card"));
        assert!(form.is_form_entry());
        assert_eq!(form.form_type_id(), Some(&MethodTypeId::card()));
    }

    #[test]
    fn test_wallet_kind_strings() {
        assert_eq!(WalletKind::PlatformPay.as_str(), "platform_pay");
        assert_eq!(WalletKind::LinkWallet.to_string(), "link_wallet");
    }
}
