//! Analytics event names.
//!
//! Reported through [`crate::AnalyticsSink`] around each lifecycle
//! transition. Names are stable identifiers, not display strings.

/// The sheet finished loading saved methods and picked an initial selection.
pub const SHEET_LOADED: &str = "sheet.loaded";

/// A confirmation attempt started submitting.
pub const CONFIRM_STARTED: &str = "confirm.started";

/// A confirmation attempt succeeded.
pub const CONFIRM_SUCCEEDED: &str = "confirm.succeeded";

/// The backend declined the instrument.
pub const CONFIRM_DECLINED: &str = "confirm.declined";

/// The user aborted a pending confirmation.
pub const CONFIRM_CANCELED: &str = "confirm.canceled";

/// The attempt is waiting for additional input.
pub const CONFIRM_REQUIRES_INPUT: &str = "confirm.requires_input";

/// A saved method was attached.
pub const METHOD_ATTACHED: &str = "method.attached";

/// A saved method was detached.
pub const METHOD_DETACHED: &str = "method.detached";

/// A co-branded card's brand was switched.
pub const METHOD_BRAND_UPDATED: &str = "method.brand_updated";
