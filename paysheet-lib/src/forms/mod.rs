//! Form drafts and the per-presentation draft cache.
//!
//! A [`FormDraft`] is the unvalidated scratch state of an "add new method"
//! form. The [`FormSessionCache`] keeps one draft per method type so that
//! switching away from a half-filled form and back restores exactly what was
//! typed. Validation happens only at confirm time, through
//! [`RequiredFieldPolicy`].

mod cache;
mod requirements;

pub use cache::FormSessionCache;
pub use requirements::RequiredFieldPolicy;

use crate::MethodTypeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// In-progress, not-yet-submitted form input for one method type.
///
/// Values are stored exactly as typed, including partial or invalid entries.
/// The draft never validates; completeness is a confirm-time concern.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormDraft {
    /// Which method type this form collects.
    pub type_id: MethodTypeId,
    /// Field key to raw typed value.
    pub fields: BTreeMap<String, String>,
    /// Whether the user opted in to saving the method for future use.
    #[serde(default)]
    pub save_for_future: bool,
}

impl FormDraft {
    /// Create an empty draft for a method type.
    pub fn new(type_id: impl Into<MethodTypeId>) -> Self {
        Self {
            type_id: type_id.into(),
            fields: BTreeMap::new(),
            save_for_future: false,
        }
    }

    /// Set a field value, replacing any previous value.
    pub fn set_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Opt in to saving the method after a successful confirmation.
    pub fn save_for_future(mut self) -> Self {
        self.save_for_future = true;
        self
    }

    /// Get a field value, if one was typed.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// True when a field exists and is non-empty.
    pub fn has_value(&self, key: &str) -> bool {
        self.field(key).is_some_and(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_stores_values_verbatim() {
        let draft = FormDraft::new("card")
            .set_field("number", "4")
            .set_field("cvc", "");
        // A single incomplete digit is stored as-is.
        assert_eq!(draft.field("number"), Some("4"));
        assert!(draft.has_value("number"));
        assert!(!draft.has_value("cvc"));
        assert!(!draft.has_value("exp_month"));
    }

    #[test]
    fn test_set_field_replaces() {
        let draft = FormDraft::new("card")
            .set_field("number", "4")
            .set_field("number", "42");
        assert_eq!(draft.field("number"), Some("42"));
    }
}
