//! Draft cache for one sheet presentation.
//!
//! # Thread Safety
//!
//! Uses `RwLock` and tolerates lock poisoning by taking the inner value,
//! matching the stores in this workspace.

use super::FormDraft;
use crate::MethodTypeId;
use std::collections::HashMap;
use std::sync::RwLock;

/// Key-value cache of form drafts, one per method type, scoped to the life
/// of a single sheet presentation.
///
/// The cache stores and restores exact values; it never validates. It is
/// cleared entirely when a new sheet is presented, and per-type when a draft
/// is consumed by a successful save.
///
/// # Example
///
/// ```
/// use paysheet_lib::forms::{FormDraft, FormSessionCache};
/// use paysheet_lib::MethodTypeId;
///
/// let cache = FormSessionCache::new();
/// cache.snapshot(FormDraft::new("card").set_field("number", "4"));
///
/// let restored = cache.restore(&MethodTypeId::card()).unwrap();
/// assert_eq!(restored.field("number"), Some("4"));
/// ```
pub struct FormSessionCache {
    drafts: RwLock<HashMap<MethodTypeId, FormDraft>>,
}

impl FormSessionCache {
    /// Create an empty cache for a new presentation.
    pub fn new() -> Self {
        Self {
            drafts: RwLock::new(HashMap::new()),
        }
    }

    /// Store a draft, replacing any previous draft for the same type.
    pub fn snapshot(&self, draft: FormDraft) {
        let mut drafts = self.drafts.write().unwrap_or_else(|e| e.into_inner());
        drafts.insert(draft.type_id.clone(), draft);
    }

    /// Fetch the last snapshotted draft for a method type.
    pub fn restore(&self, type_id: &MethodTypeId) -> Option<FormDraft> {
        let drafts = self.drafts.read().unwrap_or_else(|e| e.into_inner());
        drafts.get(type_id).cloned()
    }

    /// Drop the draft for one method type (after a successful save).
    pub fn clear(&self, type_id: &MethodTypeId) {
        let mut drafts = self.drafts.write().unwrap_or_else(|e| e.into_inner());
        drafts.remove(type_id);
    }

    /// Drop everything (a new sheet presentation starts).
    pub fn clear_all(&self) {
        let mut drafts = self.drafts.write().unwrap_or_else(|e| e.into_inner());
        drafts.clear();
    }

    /// Number of cached drafts.
    pub fn len(&self) -> usize {
        let drafts = self.drafts.read().unwrap_or_else(|e| e.into_inner());
        drafts.len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for FormSessionCache {
    fn default() -> Self {
        Self::new()
    }
}
