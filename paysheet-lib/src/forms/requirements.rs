//! Required-field policy per method type and country.
//!
//! Completeness is evaluated only at confirm time; selecting an incomplete
//! form is always allowed.

use super::FormDraft;
use crate::MethodTypeId;

/// Determines which fields a form must fill before it can be confirmed.
#[derive(Clone, Debug, Default)]
pub struct RequiredFieldPolicy;

impl RequiredFieldPolicy {
    /// Create the default policy.
    pub fn new() -> Self {
        Self
    }

    /// The required field keys for a method type in a billing country.
    ///
    /// Unknown method types require nothing; the backend is the authority
    /// for types this library has no schema for.
    pub fn required_fields(&self, type_id: &MethodTypeId, country: &str) -> &'static [&'static str] {
        match type_id.as_str() {
            MethodTypeId::CARD => &["number", "exp_month", "exp_year", "cvc"],
            MethodTypeId::SEPA_DEBIT => {
                // SEPA mandates require a full billing address.
                &["name", "iban", "line1", "city", "postal_code", "country"]
            }
            MethodTypeId::US_BANK_ACCOUNT => {
                if country == "US" {
                    &["name", "email"]
                } else {
                    // Bank-style methods outside the US also need the account
                    // holder's country.
                    &["name", "email", "country"]
                }
            }
            _ => &[],
        }
    }

    /// The required fields a draft has not filled yet.
    pub fn missing_fields(&self, draft: &FormDraft, country: &str) -> Vec<String> {
        self.required_fields(&draft.type_id, country)
            .iter()
            .filter(|key| !draft.has_value(key))
            .map(|key| key.to_string())
            .collect()
    }

    /// True when the draft can be confirmed.
    pub fn is_complete(&self, draft: &FormDraft, country: &str) -> bool {
        self.missing_fields(draft, country).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_requirements() {
        let policy = RequiredFieldPolicy::new();
        let draft = FormDraft::new("card")
            .set_field("number", "4242424242424242")
            .set_field("exp_month", "12")
            .set_field("exp_year", "2030");
        let missing = policy.missing_fields(&draft, "US");
        assert_eq!(missing, vec!["cvc".to_string()]);
        assert!(!policy.is_complete(&draft, "US"));

        let complete = draft.set_field("cvc", "123");
        assert!(policy.is_complete(&complete, "US"));
    }

    #[test]
    fn test_sepa_requires_address() {
        let policy = RequiredFieldPolicy::new();
        let draft = FormDraft::new("sepa_debit")
            .set_field("name", "Jane Diaz")
            .set_field("iban", "DE89370400440532013000");
        let missing = policy.missing_fields(&draft, "DE");
        assert!(missing.contains(&"line1".to_string()));
        assert!(missing.contains(&"city".to_string()));
        assert!(missing.contains(&"postal_code".to_string()));
        assert!(missing.contains(&"country".to_string()));
    }

    #[test]
    fn test_bank_requirements_vary_by_country() {
        let policy = RequiredFieldPolicy::new();
        let us = policy.required_fields(&MethodTypeId::us_bank_account(), "US");
        assert_eq!(us, ["name", "email"]);
        let abroad = policy.required_fields(&MethodTypeId::us_bank_account(), "CA");
        assert!(abroad.contains(&"country"));
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let policy = RequiredFieldPolicy::new();
        let draft = FormDraft::new("us_bank_account")
            .set_field("name", "Jane Diaz")
            .set_field("email", "");
        assert_eq!(policy.missing_fields(&draft, "US"), vec!["email".to_string()]);
    }

    #[test]
    fn test_unknown_type_requires_nothing() {
        let policy = RequiredFieldPolicy::new();
        let draft = FormDraft::new("cashapp");
        assert!(policy.is_complete(&draft, "US"));
    }
}
