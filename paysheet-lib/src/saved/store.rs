//! Saved method store.
//!
//! Owns the saved methods for the active customer and the single default
//! slot. All mutations take the write lock once, so a concurrent read never
//! observes zero or two defaults.
//!
//! # Thread Safety
//!
//! The store uses `RwLock` for thread-safe access and tolerates lock
//! poisoning by taking the inner value, matching the behavior of the other
//! registries in this workspace.

use super::SavedMethod;
use crate::config::SheetConfiguration;
use crate::session::CustomerSession;
use crate::{CardBrand, FingerprintKey, Result, SavedMethodId, SheetError};
use std::collections::HashSet;
use std::sync::RwLock;

/// What fell out of a successful detach, so callers can adjust selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetachOutcome {
    /// The method that was removed.
    pub removed: SavedMethod,
    /// Whether the removed method held the default flag. The flag is cleared
    /// with the removal; survivors are never re-promoted automatically.
    pub was_default: bool,
    /// How many methods remain attached.
    pub remaining: usize,
}

#[derive(Debug, Default)]
struct StoreState {
    /// Attachment order, newest last.
    methods: Vec<SavedMethod>,
    default: Option<SavedMethodId>,
}

impl StoreState {
    /// Rewrite the per-method flags so they agree with the default slot.
    fn sync_default_flags(&mut self) {
        for method in &mut self.methods {
            method.is_default = Some(&method.id) == self.default.as_ref();
        }
    }
}

/// Store for a customer's saved payment methods.
///
/// # Example
///
/// ```
/// use paysheet_lib::saved::{SavedMethod, SavedMethodStore};
/// use paysheet_lib::{CardBrand, SavedMethodId};
///
/// let store = SavedMethodStore::new();
/// store
///     .attach(SavedMethod::card("pm_1", "fp_1", CardBrand::Visa, "4242"), false)
///     .unwrap();
/// store
///     .attach(SavedMethod::card("pm_2", "fp_2", CardBrand::Mastercard, "4444"), true)
///     .unwrap();
///
/// // The explicit set_as_default on the second attach moved the flag.
/// assert_eq!(store.default_method(), Some(SavedMethodId::new("pm_2")));
/// ```
pub struct SavedMethodStore {
    state: RwLock<StoreState>,
    config: SheetConfiguration,
}

impl SavedMethodStore {
    /// Create an empty store with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SheetConfiguration::default())
    }

    /// Create an empty store with an explicit configuration.
    pub fn with_config(config: SheetConfiguration) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            config,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &SheetConfiguration {
        &self.config
    }

    /// List the methods visible under the given session scope, in attachment
    /// order (newest last).
    ///
    /// Under customer-session scope the redisplay filter is applied and
    /// attachments sharing a fingerprint collapse to the earliest entry.
    /// Legacy scope shows the raw attachment list, duplicates included.
    pub fn list(&self, session: &CustomerSession) -> Vec<SavedMethod> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());

        let mut visible: Vec<SavedMethod> = match session.redisplay_filter() {
            Some(filter) => state
                .methods
                .iter()
                .filter(|m| filter.allows(m.allow_redisplay))
                .cloned()
                .collect(),
            None => state.methods.clone(),
        };

        if session.dedupes_by_fingerprint() {
            let mut seen: HashSet<FingerprintKey> = HashSet::new();
            let mut deduped: Vec<SavedMethod> = Vec::with_capacity(visible.len());
            for method in visible {
                if seen.insert(method.fingerprint.clone()) {
                    deduped.push(method);
                } else if method.is_default {
                    // The collapsed duplicate held the flag; keep it visible
                    // on the surviving entry.
                    if let Some(kept) = deduped
                        .iter_mut()
                        .find(|m| m.fingerprint == method.fingerprint)
                    {
                        kept.is_default = true;
                    }
                }
            }
            visible = deduped;
        }

        visible
    }

    /// Number of attached methods, before any scope filtering.
    pub fn len(&self) -> usize {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.methods.len()
    }

    /// True when no methods are attached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a method by ID.
    pub fn get(&self, id: &SavedMethodId) -> Option<SavedMethod> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.methods.iter().find(|m| &m.id == id).cloned()
    }

    /// The current default method ID, if one is set.
    pub fn default_method(&self) -> Option<SavedMethodId> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.default.clone()
    }

    /// Attach a method.
    ///
    /// The first method attached while the store is empty always becomes the
    /// default, regardless of `set_as_default`. Afterwards the flag moves
    /// only when `set_as_default` is true; the previous holder is demoted in
    /// the same write, so no reader observes two defaults.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self, method), fields(method_id = %method.id))
    )]
    pub fn attach(&self, mut method: SavedMethod, set_as_default: bool) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());

        if state.methods.iter().any(|m| m.id == method.id) {
            // Re-attaching the same backend object is an upsert, not a
            // duplicate entry.
            state.methods.retain(|m| m.id != method.id);
        }

        let first_attach = state.methods.is_empty();
        method.is_default = false;
        let id = method.id.clone();
        state.methods.push(method);

        if first_attach || set_as_default {
            state.default = Some(id);
        }
        state.sync_default_flags();
        Ok(())
    }

    /// Detach a method.
    ///
    /// Fails with [`SheetError::RemovalNotAllowed`] when removal is disabled
    /// by configuration, restricted to co-branded methods, blocked for this
    /// method by the backend, or would remove the last remaining method
    /// while that is not allowed.
    ///
    /// Clears the default flag if the detached method held it. Survivors are
    /// not re-promoted: default promotion is a first-attach rule, not a
    /// last-one-standing rule.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), fields(method_id = %id)))]
    pub fn detach(&self, id: &SavedMethodId) -> Result<DetachOutcome> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());

        let position = state
            .methods
            .iter()
            .position(|m| &m.id == id)
            .ok_or_else(|| SheetError::method_not_found(id.as_str()))?;

        if !self.config.removal_enabled {
            return Err(SheetError::removal_not_allowed(
                "removal is disabled by configuration",
            ));
        }
        if !state.methods[position].allow_removal {
            return Err(SheetError::removal_not_allowed(
                "this method is not removable",
            ));
        }
        if self.config.restrict_removal_to_co_branded && !state.methods[position].is_co_branded() {
            return Err(SheetError::removal_not_allowed(
                "only co-branded methods are removable",
            ));
        }
        if state.methods.len() == 1 && !self.config.allows_removal_of_last_saved_payment_method {
            return Err(SheetError::removal_not_allowed(
                "the last saved method cannot be removed",
            ));
        }

        let removed = state.methods.remove(position);
        let was_default = state.default.as_ref() == Some(id);
        if was_default {
            state.default = None;
        }
        state.sync_default_flags();

        Ok(DetachOutcome {
            remaining: state.methods.len(),
            removed,
            was_default,
        })
    }

    /// Switch the brand of a co-branded card.
    ///
    /// The attachment keeps its ID and fingerprint; only the presented brand
    /// changes, and only to one of the card's networks.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self), fields(method_id = %id, brand = %new_brand))
    )]
    pub fn update_brand(&self, id: &SavedMethodId, new_brand: CardBrand) -> Result<SavedMethod> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());

        let method = state
            .methods
            .iter_mut()
            .find(|m| &m.id == id)
            .ok_or_else(|| SheetError::method_not_found(id.as_str()))?;

        if !method.is_co_branded() {
            return Err(SheetError::NotCoBranded {
                id: id.as_str().to_string(),
            });
        }
        if !method.networks.contains(&new_brand) {
            return Err(SheetError::BrandNotAvailable {
                id: id.as_str().to_string(),
                brand: new_brand.as_str().to_string(),
            });
        }

        method.brand = Some(new_brand);
        Ok(method.clone())
    }

    /// Explicitly promote a method to default, demoting the previous holder
    /// in the same write.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), fields(method_id = %id)))]
    pub fn set_default(&self, id: &SavedMethodId) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());

        if !state.methods.iter().any(|m| &m.id == id) {
            return Err(SheetError::method_not_found(id.as_str()));
        }
        state.default = Some(id.clone());
        state.sync_default_flags();
        Ok(())
    }

    /// Replace local state with the backend's view of the customer.
    ///
    /// Adopts the backend's default flag when one is present; otherwise the
    /// previous local default is retained if the method still exists.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, methods)))]
    pub fn sync_from_backend(&self, methods: Vec<SavedMethod>) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());

        let backend_default = methods.iter().find(|m| m.is_default).map(|m| m.id.clone());
        let previous_default = state.default.clone();

        state.methods = methods;
        let retained_default = match backend_default {
            Some(id) => Some(id),
            None => previous_default.filter(|id| state.methods.iter().any(|m| &m.id == id)),
        };
        state.default = retained_default;
        state.sync_default_flags();
    }
}

impl Default for SavedMethodStore {
    fn default() -> Self {
        Self::new()
    }
}
