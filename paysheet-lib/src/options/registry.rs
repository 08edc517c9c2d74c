//! Payment option registry.
//!
//! Owns the ordered list of selectable options and the authoritative
//! "currently selected" pointer. Selection changes feed the form cache so a
//! half-typed form survives switching away and back; the confirmation layer
//! promotes a selection to "confirmed" only after a successful submit.
//!
//! # Thread Safety
//!
//! Uses `RwLock` and tolerates lock poisoning by taking the inner value.

use super::PaymentOption;
use crate::config::SheetConfiguration;
use crate::forms::FormSessionCache;
use crate::saved::SavedMethod;
use crate::SavedMethodId;
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
struct RegistryState {
    options: Vec<PaymentOption>,
    selected: Option<PaymentOption>,
    last_confirmed: Option<PaymentOption>,
}

/// Registry of selectable payment options and the current selection.
///
/// # Example
///
/// ```
/// use paysheet_lib::options::{PaymentOption, PaymentOptionRegistry, WalletKind};
///
/// let registry = PaymentOptionRegistry::new();
/// registry.select(PaymentOption::wallet(WalletKind::PlatformPay));
/// assert!(registry.current_selection().is_some());
///
/// // Dismissing without confirming reverts to nothing, since no option was
/// // ever confirmed.
/// registry.clear_selection();
/// assert!(registry.current_selection().is_none());
/// ```
pub struct PaymentOptionRegistry {
    state: RwLock<RegistryState>,
    forms: Arc<FormSessionCache>,
}

impl PaymentOptionRegistry {
    /// Create a registry with its own form cache.
    pub fn new() -> Self {
        Self::with_form_cache(Arc::new(FormSessionCache::new()))
    }

    /// Create a registry wired to a shared form cache.
    pub fn with_form_cache(forms: Arc<FormSessionCache>) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            forms,
        }
    }

    /// The form cache selection changes feed into.
    pub fn form_cache(&self) -> Arc<FormSessionCache> {
        Arc::clone(&self.forms)
    }

    /// Replace the selectable option list.
    pub fn set_options(&self, options: Vec<PaymentOption>) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.options = options;
    }

    /// The selectable options in display order.
    pub fn options(&self) -> Vec<PaymentOption> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.options.clone()
    }

    /// Select an option.
    ///
    /// Completeness is not required here; an unfinished form may be selected
    /// and is only validated at confirm time. Switching away from a form
    /// entry snapshots its draft; switching to a form entry with an empty
    /// draft restores the cached one, so nothing typed is lost.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, option)))]
    pub fn select(&self, option: PaymentOption) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        self.snapshot_outgoing(&state);

        let incoming = match option {
            PaymentOption::FormEntry { draft } if draft.fields.is_empty() => {
                match self.forms.restore(&draft.type_id) {
                    Some(cached) => PaymentOption::FormEntry { draft: cached },
                    None => PaymentOption::FormEntry { draft },
                }
            }
            other => other,
        };
        state.selected = Some(incoming);
    }

    /// The current selection, or none if nothing was ever selected or the
    /// selection was cleared without a confirmed fallback.
    pub fn current_selection(&self) -> Option<PaymentOption> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.selected.clone()
    }

    /// The last confirmed option, if any.
    pub fn last_confirmed(&self) -> Option<PaymentOption> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.last_confirmed.clone()
    }

    /// Dismiss the selection surface without confirming.
    ///
    /// Reverts to the previously confirmed option rather than to none,
    /// unless no option was ever confirmed. An outgoing form draft is still
    /// snapshotted so tapping back in restores it.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub fn clear_selection(&self) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        self.snapshot_outgoing(&state);
        state.selected = state.last_confirmed.clone();
    }

    /// Promote an option to confirmed. Called by the confirmation layer
    /// after a successful submit; sets both the selection and the target of
    /// future [`clear_selection`](Self::clear_selection) reverts.
    pub fn mark_confirmed(&self, option: PaymentOption) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.selected = Some(option.clone());
        state.last_confirmed = Some(option);
    }

    /// Pick the initial selection for a freshly loaded sheet.
    ///
    /// The default saved method wins; otherwise the first enabled wallet;
    /// otherwise nothing is selected. A saved-method pick also becomes the
    /// confirmed baseline so a later cancel reverts to it. Any baseline
    /// from a previous presentation is dropped either way; a dismissal
    /// must never revert to an option the fresh load no longer knows.
    pub fn auto_select_initial(
        &self,
        saved: &[SavedMethod],
        config: &SheetConfiguration,
    ) -> Option<PaymentOption> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.last_confirmed = None;

        let initial = if let Some(default) = saved.iter().find(|m| m.is_default) {
            let option = PaymentOption::saved(default.id.clone());
            state.last_confirmed = Some(option.clone());
            Some(option)
        } else {
            config.first_wallet().map(PaymentOption::wallet)
        };

        state.selected = initial.clone();
        initial
    }

    /// Adjust the selection after a saved method was detached.
    ///
    /// Only acts when the detached method was selected: falls back to the
    /// first remaining saved method, else an enabled wallet, else none. A
    /// confirmed pointer at the detached method is dropped so a later cancel
    /// cannot revert to it.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, remaining, config)))]
    pub fn handle_detached(
        &self,
        detached: &SavedMethodId,
        remaining: &[SavedMethod],
        config: &SheetConfiguration,
    ) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());

        if state
            .last_confirmed
            .as_ref()
            .is_some_and(|o| o.refers_to(detached))
        {
            state.last_confirmed = None;
        }

        let selected_was_detached = state
            .selected
            .as_ref()
            .is_some_and(|o| o.refers_to(detached));
        if !selected_was_detached {
            return;
        }

        state.selected = remaining
            .first()
            .map(|m| PaymentOption::saved(m.id.clone()))
            .or_else(|| config.first_wallet().map(PaymentOption::wallet));
    }

    fn snapshot_outgoing(&self, state: &RegistryState) {
        if let Some(PaymentOption::FormEntry { draft }) = &state.selected {
            self.forms.snapshot(draft.clone());
        }
    }
}

impl Default for PaymentOptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
