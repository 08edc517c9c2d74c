//! Sheet configuration.
//!
//! Merchant-facing knobs that shape selection and removal behavior for one
//! sheet presentation. The defaults match the most common integration:
//! wallets on, removal on, last-method removal off, no CVC recollection.

use crate::options::WalletKind;
use serde::{Deserialize, Serialize};

/// Configuration for a payment sheet presentation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SheetConfiguration {
    /// Wallet options offered when no saved method wins initial selection,
    /// in display order.
    pub wallets: Vec<WalletKind>,
    /// Whether saved methods may be removed at all.
    pub removal_enabled: bool,
    /// Whether the last remaining saved method may be removed.
    pub allows_removal_of_last_saved_payment_method: bool,
    /// When set, only co-branded card methods are removable. Carve-out used
    /// by card-brand-choice integrations.
    pub restrict_removal_to_co_branded: bool,
    /// Whether saved cards require fresh CVC entry before reuse.
    pub cvc_recollection: bool,
}

impl SheetConfiguration {
    /// Enable a wallet option.
    pub fn with_wallet(mut self, wallet: WalletKind) -> Self {
        if !self.wallets.contains(&wallet) {
            self.wallets.push(wallet);
        }
        self
    }

    /// Disable all wallet options.
    pub fn without_wallets(mut self) -> Self {
        self.wallets.clear();
        self
    }

    /// Allow removing the last remaining saved method.
    pub fn allow_removal_of_last(mut self, allow: bool) -> Self {
        self.allows_removal_of_last_saved_payment_method = allow;
        self
    }

    /// Disable removal of saved methods entirely.
    pub fn disable_removal(mut self) -> Self {
        self.removal_enabled = false;
        self
    }

    /// Restrict removal to co-branded card methods.
    pub fn co_branded_removal_only(mut self) -> Self {
        self.restrict_removal_to_co_branded = true;
        self
    }

    /// Require fresh CVC entry before reusing a saved card.
    pub fn require_cvc_recollection(mut self) -> Self {
        self.cvc_recollection = true;
        self
    }

    /// The first enabled wallet, if any. Used for selection fallback.
    pub fn first_wallet(&self) -> Option<WalletKind> {
        self.wallets.first().copied()
    }
}

impl Default for SheetConfiguration {
    fn default() -> Self {
        Self {
            wallets: vec![WalletKind::PlatformPay, WalletKind::LinkWallet],
            removal_enabled: true,
            allows_removal_of_last_saved_payment_method: false,
            restrict_removal_to_co_branded: false,
            cvc_recollection: false,
        }
    }
}
