//! Customer session scoping.
//!
//! The same underlying attached methods can be presented differently
//! depending on how the customer is identified. Legacy ephemeral-key scope
//! shows the raw attachment list; customer-session scope applies a
//! redisplay filter and collapses duplicate instruments by fingerprint.

use serde::{Deserialize, Serialize};

/// Whether a saved method may be shown again in future sessions.
///
/// Set at attach time, typically from the user's consent checkbox.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Redisplay {
    /// No preference was captured when the method was attached.
    #[default]
    Unspecified,
    /// Redisplay limited to specific flows.
    Limited,
    /// Always eligible for redisplay.
    Always,
}

/// The set of redisplay values a customer session is willing to show.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedisplayFilter {
    allowed: Vec<Redisplay>,
}

impl RedisplayFilter {
    /// Build a filter from an explicit allow list.
    pub fn new(allowed: Vec<Redisplay>) -> Self {
        Self { allowed }
    }

    /// The permissive filter observed in default configurations: shows
    /// methods attached with any redisplay value.
    pub fn unspecified_limited_always() -> Self {
        Self::new(vec![
            Redisplay::Unspecified,
            Redisplay::Limited,
            Redisplay::Always,
        ])
    }

    /// Filter that only shows methods explicitly consented to redisplay.
    pub fn always_only() -> Self {
        Self::new(vec![Redisplay::Always])
    }

    /// Whether a method with the given redisplay value passes the filter.
    pub fn allows(&self, redisplay: Redisplay) -> bool {
        self.allowed.contains(&redisplay)
    }
}

impl Default for RedisplayFilter {
    fn default() -> Self {
        Self::unspecified_limited_always()
    }
}

/// Identifies the scope under which saved methods are listed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CustomerSession {
    /// Legacy ephemeral-key scope. No redisplay filtering, no dedup:
    /// duplicate attachments of the same instrument are all visible.
    Legacy {
        /// The ephemeral key authorizing customer access.
        ephemeral_key: String,
    },
    /// Customer-session scope. Applies the redisplay filter and collapses
    /// attachments sharing a fingerprint to one visible entry.
    CustomerSession {
        /// The customer session identifier.
        id: String,
        /// Which redisplay values are visible under this session.
        redisplay_filter: RedisplayFilter,
    },
}

impl CustomerSession {
    /// Create a legacy ephemeral-key session.
    pub fn legacy(ephemeral_key: impl Into<String>) -> Self {
        Self::Legacy {
            ephemeral_key: ephemeral_key.into(),
        }
    }

    /// Create a customer session with the default permissive filter.
    pub fn customer_session(id: impl Into<String>) -> Self {
        Self::CustomerSession {
            id: id.into(),
            redisplay_filter: RedisplayFilter::default(),
        }
    }

    /// Create a customer session with an explicit redisplay filter.
    pub fn customer_session_with_filter(id: impl Into<String>, filter: RedisplayFilter) -> Self {
        Self::CustomerSession {
            id: id.into(),
            redisplay_filter: filter,
        }
    }

    /// Whether this scope deduplicates attachments by fingerprint.
    pub fn dedupes_by_fingerprint(&self) -> bool {
        matches!(self, Self::CustomerSession { .. })
    }

    /// The redisplay filter for this scope, if it applies one.
    pub fn redisplay_filter(&self) -> Option<&RedisplayFilter> {
        match self {
            Self::Legacy { .. } => None,
            Self::CustomerSession {
                redisplay_filter, ..
            } => Some(redisplay_filter),
        }
    }
}
