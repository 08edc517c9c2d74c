//! End-to-end flows through the confirmation coordinator
//!
//! These tests exercise load, submit, decline, CVC recollection, and detach
//! against a scripted backend, and check the analytics event stream.

#[cfg(test)]
mod coordinator_flows {
    use paysheet_confirm::{
        ActionKind, AnalyticsSink, ConfirmError, ConfirmRequest, ConfirmationCoordinator,
        IntentClient, IntentOutcome, Outcome,
    };
    use paysheet_lib::forms::FormDraft;
    use paysheet_lib::options::{PaymentOption, PaymentOptionRegistry};
    use paysheet_lib::saved::{SavedMethod, SavedMethodStore};
    use paysheet_lib::session::CustomerSession;
    use paysheet_lib::{CardBrand, SheetConfiguration, SheetError};
    use std::sync::{Arc, Mutex};

    /// Backend stub that pops scripted outcomes front to back.
    struct ScriptedClient {
        outcomes: Mutex<Vec<IntentOutcome>>,
        saved: Vec<SavedMethod>,
    }

    impl ScriptedClient {
        fn new(outcomes: Vec<IntentOutcome>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes),
                saved: Vec::new(),
            }
        }

        fn with_saved(mut self, saved: Vec<SavedMethod>) -> Self {
            self.saved = saved;
            self
        }
    }

    #[async_trait::async_trait]
    impl IntentClient for ScriptedClient {
        async fn create_or_confirm_intent(
            &self,
            _request: &ConfirmRequest,
        ) -> paysheet_confirm::Result<IntentOutcome> {
            let mut outcomes = self.outcomes.lock().unwrap();
            if outcomes.is_empty() {
                return Err(ConfirmError::Transport("script exhausted".into()));
            }
            Ok(outcomes.remove(0))
        }

        async fn fetch_saved_methods(
            &self,
            _session: &CustomerSession,
        ) -> paysheet_confirm::Result<Vec<SavedMethod>> {
            Ok(self.saved.clone())
        }
    }

    /// Analytics sink that records event names in order.
    #[derive(Default)]
    struct RecordingAnalytics {
        events: Mutex<Vec<String>>,
    }

    impl RecordingAnalytics {
        fn names(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl AnalyticsSink for RecordingAnalytics {
        fn report_event(&self, name: &str, _attributes: &serde_json::Value) {
            self.events.lock().unwrap().push(name.to_string());
        }
    }

    fn coordinator(client: ScriptedClient, config: SheetConfiguration) -> ConfirmationCoordinator {
        let registry = Arc::new(PaymentOptionRegistry::new());
        let store = Arc::new(SavedMethodStore::with_config(config));
        ConfirmationCoordinator::new(registry, store, Arc::new(client))
    }

    fn complete_card_draft() -> FormDraft {
        FormDraft::new("card")
            .set_field("number", "4242424242424242")
            .set_field("exp_month", "12")
            .set_field("exp_year", "2030")
            .set_field("cvc", "123")
    }

    #[tokio::test]
    async fn test_new_card_saved_end_to_end() {
        let attached = SavedMethod::card("pm_new", "fp_new", CardBrand::Visa, "4242");
        let client = ScriptedClient::new(vec![IntentOutcome::Succeeded {
            attached: Some(attached),
        }]);
        let analytics = Arc::new(RecordingAnalytics::default());
        let coordinator = coordinator(client, SheetConfiguration::default())
            .with_analytics(Arc::clone(&analytics) as Arc<dyn AnalyticsSink>);

        let session = CustomerSession::legacy("ek_test");
        let visible = coordinator.load(&session).await.unwrap();
        assert!(visible.is_empty());

        // User fills the card form and confirms with "save" checked.
        let draft = complete_card_draft().save_for_future();
        coordinator
            .registry()
            .select(PaymentOption::form_entry(draft.clone()));
        let outcome = coordinator
            .submit(PaymentOption::form_entry(draft), true)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Succeeded {
                attached: Some("pm_new".into())
            }
        );

        // Read-after-write: the new method is listed and selected, and the
        // first attach made it the default.
        let listed = coordinator.store().list(&session);
        assert_eq!(listed.len(), 1);
        assert!(listed[0].is_default);
        assert_eq!(
            coordinator.registry().current_selection(),
            Some(PaymentOption::saved("pm_new"))
        );

        // The consumed draft is gone from the cache.
        assert!(coordinator
            .registry()
            .form_cache()
            .restore(&"card".into())
            .is_none());

        assert_eq!(
            analytics.names(),
            vec![
                "sheet.loaded",
                "confirm.started",
                "method.attached",
                "confirm.succeeded",
            ]
        );
    }

    #[tokio::test]
    async fn test_decline_then_retry_event_stream() {
        let client = ScriptedClient::new(vec![
            IntentOutcome::Declined {
                reason: "insufficient_funds".into(),
            },
            IntentOutcome::Succeeded { attached: None },
        ]);
        let analytics = Arc::new(RecordingAnalytics::default());
        let coordinator = coordinator(client, SheetConfiguration::default())
            .with_analytics(Arc::clone(&analytics) as Arc<dyn AnalyticsSink>);

        let option = PaymentOption::form_entry(complete_card_draft());
        coordinator.registry().select(option.clone());

        let declined = coordinator.submit(option.clone(), false).await.unwrap();
        assert_eq!(
            declined,
            Outcome::Declined {
                reason: "insufficient_funds".into()
            }
        );
        // Selection survives the decline; the retry reuses it untouched.
        assert_eq!(coordinator.registry().current_selection(), Some(option.clone()));

        let retried = coordinator.submit(option, false).await.unwrap();
        assert!(matches!(retried, Outcome::Succeeded { .. }));

        assert_eq!(
            analytics.names(),
            vec![
                "confirm.started",
                "confirm.declined",
                "confirm.started",
                "confirm.succeeded",
            ]
        );
    }

    #[tokio::test]
    async fn test_cvc_recollection_is_per_method() {
        let client = ScriptedClient::new(vec![
            IntentOutcome::Succeeded { attached: None },
            IntentOutcome::Succeeded { attached: None },
        ]);
        let config = SheetConfiguration::default().require_cvc_recollection();
        let coordinator = coordinator(client, config);
        coordinator
            .store()
            .attach(SavedMethod::card("pm_a", "fp_a", CardBrand::Visa, "4242"), false)
            .unwrap();
        coordinator
            .store()
            .attach(
                SavedMethod::card("pm_b", "fp_b", CardBrand::Mastercard, "4444"),
                false,
            )
            .unwrap();

        // Verifying one card does not exempt the other.
        let first = coordinator
            .submit(PaymentOption::saved("pm_a"), false)
            .await
            .unwrap();
        assert_eq!(
            first,
            Outcome::RequiresInput {
                action: ActionKind::Cvc
            }
        );
        coordinator.provide_cvc("123").await.unwrap();

        let other = coordinator
            .submit(PaymentOption::saved("pm_b"), false)
            .await
            .unwrap();
        assert_eq!(
            other,
            Outcome::RequiresInput {
                action: ActionKind::Cvc
            }
        );
    }

    #[tokio::test]
    async fn test_load_resets_cvc_verifications() {
        let saved = SavedMethod::card("pm_a", "fp_a", CardBrand::Visa, "4242");
        let client = ScriptedClient::new(vec![IntentOutcome::Succeeded { attached: None }])
            .with_saved(vec![saved]);
        let config = SheetConfiguration::default().require_cvc_recollection();
        let coordinator = coordinator(client, config);

        let session = CustomerSession::legacy("ek_test");
        coordinator.load(&session).await.unwrap();

        let parked = coordinator
            .submit(PaymentOption::saved("pm_a"), false)
            .await
            .unwrap();
        assert!(!parked.is_terminal());
        coordinator.provide_cvc("123").await.unwrap();

        // A fresh presentation forgets the verification.
        coordinator.load(&session).await.unwrap();
        let again = coordinator
            .submit(PaymentOption::saved("pm_a"), false)
            .await
            .unwrap();
        assert_eq!(
            again,
            Outcome::RequiresInput {
                action: ActionKind::Cvc
            }
        );
    }

    #[tokio::test]
    async fn test_reload_forgets_prior_presentation_baseline() {
        let attached = SavedMethod::card("pm_gone", "fp_gone", CardBrand::Visa, "4242");
        let client = ScriptedClient::new(vec![IntentOutcome::Succeeded {
            attached: Some(attached),
        }]);
        let coordinator = coordinator(client, SheetConfiguration::default());

        // First presentation confirms a newly saved card.
        let draft = complete_card_draft().save_for_future();
        coordinator
            .submit(PaymentOption::form_entry(draft), true)
            .await
            .unwrap();
        assert_eq!(
            coordinator.registry().last_confirmed(),
            Some(PaymentOption::saved("pm_gone"))
        );

        // The backend no longer lists that method on the next presentation.
        let session = CustomerSession::legacy("ek_test");
        coordinator.load(&session).await.unwrap();

        // Dismissing must not revert to the vanished method from the prior
        // presentation.
        coordinator.registry().clear_selection();
        assert_ne!(
            coordinator.registry().current_selection(),
            Some(PaymentOption::saved("pm_gone"))
        );
        assert!(coordinator.registry().current_selection().is_none());
    }

    #[tokio::test]
    async fn test_load_clears_stale_drafts() {
        let client = ScriptedClient::new(vec![]);
        let coordinator = coordinator(client, SheetConfiguration::default());
        coordinator
            .registry()
            .select(PaymentOption::form_entry(
                FormDraft::new("card").set_field("number", "4"),
            ));
        coordinator.registry().clear_selection();
        assert!(!coordinator.registry().form_cache().is_empty());

        let session = CustomerSession::legacy("ek_test");
        coordinator.load(&session).await.unwrap();
        assert!(coordinator.registry().form_cache().is_empty());
    }

    #[tokio::test]
    async fn test_detach_last_method_blocked_by_default() {
        let client = ScriptedClient::new(vec![]);
        let coordinator = coordinator(client, SheetConfiguration::default());
        coordinator
            .store()
            .attach(SavedMethod::card("pm_only", "fp", CardBrand::Visa, "4242"), false)
            .unwrap();

        let session = CustomerSession::legacy("ek_test");
        let err = coordinator.detach(&"pm_only".into(), &session).unwrap_err();
        assert!(matches!(
            err,
            ConfirmError::Sheet(SheetError::RemovalNotAllowed { .. })
        ));
        assert_eq!(coordinator.store().len(), 1);
    }

    #[tokio::test]
    async fn test_customer_session_scope_hides_duplicates() {
        let dup_a = SavedMethod::card("pm_dup_a", "fp_same", CardBrand::Visa, "4242");
        let dup_b = SavedMethod::card("pm_dup_b", "fp_same", CardBrand::Visa, "4242");
        let client = ScriptedClient::new(vec![]).with_saved(vec![dup_a, dup_b]);
        let coordinator = coordinator(client, SheetConfiguration::default());

        let scoped = CustomerSession::customer_session("cuss_123");
        let visible = coordinator.load(&scoped).await.unwrap();
        assert_eq!(visible.len(), 1);

        // The legacy scope shows both attachments.
        let legacy = CustomerSession::legacy("ek_test");
        assert_eq!(coordinator.store().list(&legacy).len(), 2);
    }

    #[cfg(feature = "timeout")]
    #[tokio::test(start_paused = true)]
    async fn test_slow_backend_times_out() {
        /// Backend that never answers.
        struct StalledClient;

        #[async_trait::async_trait]
        impl IntentClient for StalledClient {
            async fn create_or_confirm_intent(
                &self,
                _request: &ConfirmRequest,
            ) -> paysheet_confirm::Result<IntentOutcome> {
                tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
                Ok(IntentOutcome::Succeeded { attached: None })
            }

            async fn fetch_saved_methods(
                &self,
                _session: &CustomerSession,
            ) -> paysheet_confirm::Result<Vec<SavedMethod>> {
                Ok(Vec::new())
            }
        }

        let registry = Arc::new(PaymentOptionRegistry::new());
        let store = Arc::new(SavedMethodStore::new());
        let coordinator = ConfirmationCoordinator::new(registry, store, Arc::new(StalledClient));

        let err = coordinator
            .submit(PaymentOption::form_entry(complete_card_draft()), false)
            .await
            .unwrap_err();
        assert!(matches!(err, ConfirmError::Transport(_)));

        // The timed-out attempt no longer blocks a new submit.
        assert!(coordinator.current_attempt().is_none());
    }
}
