//! Confirmation coordinator.
//!
//! Serializes confirmation attempts for one sheet session: validates the
//! selected option, dispatches to the [`IntentClient`], and reconciles the
//! outcome into the registry and the saved method store. At most one
//! attempt is live at a time; cancellation reverts the selection
//! synchronously and discards whatever the in-flight request later resolves
//! to.

use crate::attempt::{AttemptState, ConfirmationAttempt};
use crate::{
    events, ActionKind, AnalyticsSink, ConfirmError, ConfirmRequest, IntentClient, IntentOutcome,
    NoopAnalytics, Outcome, Result,
};
use paysheet_lib::forms::RequiredFieldPolicy;
use paysheet_lib::options::{PaymentOption, PaymentOptionRegistry};
use paysheet_lib::saved::{DetachOutcome, SavedMethod, SavedMethodStore};
use paysheet_lib::session::CustomerSession;
use paysheet_lib::{CardBrand, SavedMethodId};
use serde_json::json;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[cfg(feature = "timeout")]
const CONFIRM_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);

#[derive(Default)]
struct SessionState {
    /// The one attempt allowed to be live, if any.
    attempt: Option<ConfirmationAttempt>,
    /// Saved methods freshly confirmed this sheet session; these skip CVC
    /// recollection on a second confirm.
    verified: HashSet<SavedMethodId>,
    /// Bumped by cancel so a resolving in-flight request knows to discard
    /// its outcome.
    generation: u64,
}

/// What `begin_attempt` decided to do with a submit call.
enum Begin {
    /// Park the attempt until a fresh CVC arrives.
    RequiresCvc,
    /// Dispatch to the backend.
    Dispatch(ConfirmRequest),
}

/// Drives the submit/confirm lifecycle for one sheet session.
pub struct ConfirmationCoordinator {
    registry: Arc<PaymentOptionRegistry>,
    store: Arc<SavedMethodStore>,
    client: Arc<dyn IntentClient>,
    analytics: Arc<dyn AnalyticsSink>,
    field_policy: RequiredFieldPolicy,
    country: String,
    session: Mutex<SessionState>,
}

impl ConfirmationCoordinator {
    /// Create a coordinator over the given stores and backend client.
    pub fn new(
        registry: Arc<PaymentOptionRegistry>,
        store: Arc<SavedMethodStore>,
        client: Arc<dyn IntentClient>,
    ) -> Self {
        Self {
            registry,
            store,
            client,
            analytics: Arc::new(NoopAnalytics),
            field_policy: RequiredFieldPolicy::new(),
            country: "US".to_string(),
            session: Mutex::new(SessionState::default()),
        }
    }

    /// Attach an analytics sink.
    pub fn with_analytics(mut self, analytics: Arc<dyn AnalyticsSink>) -> Self {
        self.analytics = analytics;
        self
    }

    /// Set the billing country used for required-field validation.
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    /// The registry this coordinator drives.
    pub fn registry(&self) -> &Arc<PaymentOptionRegistry> {
        &self.registry
    }

    /// The saved method store this coordinator drives.
    pub fn store(&self) -> &Arc<SavedMethodStore> {
        &self.store
    }

    /// Load the sheet for a customer session.
    ///
    /// Fetches saved methods, replaces local store state, resets the
    /// per-presentation state (form drafts, CVC verifications, any stale
    /// attempt), and picks the initial selection. Returns the methods
    /// visible under the session scope.
    #[tracing::instrument(skip(self, session))]
    pub async fn load(&self, session: &CustomerSession) -> Result<Vec<SavedMethod>> {
        let methods = self.client.fetch_saved_methods(session).await?;
        self.store.sync_from_backend(methods);

        {
            let mut state = self.session.lock().unwrap_or_else(|e| e.into_inner());
            state.attempt = None;
            state.verified.clear();
            state.generation += 1;
        }
        self.registry.form_cache().clear_all();

        let visible = self.store.list(session);
        let initial = self.registry.auto_select_initial(&visible, self.store.config());
        tracing::debug!(methods = visible.len(), selected = initial.is_some(), "sheet loaded");
        self.analytics.report_event(
            events::SHEET_LOADED,
            &json!({ "saved_methods": visible.len() }),
        );
        Ok(visible)
    }

    /// Submit an option for confirmation.
    ///
    /// Fails fast with [`ConfirmError::IncompleteForm`] before touching the
    /// network, and with [`ConfirmError::AlreadyInProgress`] while another
    /// attempt is live. A saved card under the CVC recollection policy
    /// parks in `RequiresInput(Cvc)` exactly once per method per session;
    /// resume with [`provide_cvc`](Self::provide_cvc).
    #[tracing::instrument(skip(self, option))]
    pub async fn submit(&self, option: PaymentOption, save_for_future: bool) -> Result<Outcome> {
        let (begin, generation) = self.begin_attempt(option, save_for_future)?;
        match begin {
            Begin::RequiresCvc => Ok(Outcome::RequiresInput {
                action: ActionKind::Cvc,
            }),
            Begin::Dispatch(request) => self.dispatch(request, generation).await,
        }
    }

    /// Submit whatever the registry currently has selected.
    ///
    /// The pay-button path. Fails with [`ConfirmError::NothingSelected`]
    /// when no option is selected.
    pub async fn submit_selected(&self, save_for_future: bool) -> Result<Outcome> {
        let option = self
            .registry
            .current_selection()
            .ok_or(ConfirmError::NothingSelected)?;
        self.submit(option, save_for_future).await
    }

    /// Supply the recollected CVC and re-enter submission.
    #[tracing::instrument(skip(self, cvc))]
    pub async fn provide_cvc(&self, cvc: impl Into<String>) -> Result<Outcome> {
        let (request, generation) = self.resume_attempt(ActionKind::Cvc, Some(cvc.into()))?;
        self.dispatch(request, generation).await
    }

    /// Re-enter submission after an external action (redirect,
    /// micro-deposit verification) completed.
    #[tracing::instrument(skip(self))]
    pub async fn resume_after_action(&self, action: ActionKind) -> Result<Outcome> {
        let (request, generation) = self.resume_attempt(action, None)?;
        self.dispatch(request, generation).await
    }

    /// Abort the live attempt, if any.
    ///
    /// The selection reverts to the previously confirmed option
    /// synchronously, before any in-flight network call resolves; that
    /// call's eventual outcome is discarded without side effects.
    #[tracing::instrument(skip(self))]
    pub fn cancel(&self) {
        let mut state = self.session.lock().unwrap_or_else(|e| e.into_inner());
        state.generation += 1;
        if let Some(attempt) = state.attempt.take() {
            if attempt.state.is_live() {
                self.registry.clear_selection();
                tracing::debug!(attempt_id = %attempt.id, "attempt canceled");
                self.analytics
                    .report_event(events::CONFIRM_CANCELED, &json!({ "attempt_id": attempt.id }));
            }
        }
    }

    /// The live attempt, if one exists.
    pub fn current_attempt(&self) -> Option<ConfirmationAttempt> {
        let state = self.session.lock().unwrap_or_else(|e| e.into_inner());
        state.attempt.clone()
    }

    /// Detach a saved method and adjust the selection.
    ///
    /// On success the selection falls back to another saved method if one
    /// remains visible, else an enabled wallet, else none.
    #[tracing::instrument(skip(self, session), fields(method_id = %id))]
    pub fn detach(&self, id: &SavedMethodId, session: &CustomerSession) -> Result<DetachOutcome> {
        let outcome = self.store.detach(id)?;
        let remaining = self.store.list(session);
        self.registry
            .handle_detached(id, &remaining, self.store.config());
        self.analytics.report_event(
            events::METHOD_DETACHED,
            &json!({ "method_id": id.as_str(), "remaining": outcome.remaining }),
        );
        Ok(outcome)
    }

    /// Switch the brand of a co-branded saved card.
    #[tracing::instrument(skip(self), fields(method_id = %id))]
    pub fn update_brand(&self, id: &SavedMethodId, brand: CardBrand) -> Result<SavedMethod> {
        let updated = self.store.update_brand(id, brand.clone())?;
        self.analytics.report_event(
            events::METHOD_BRAND_UPDATED,
            &json!({ "method_id": id.as_str(), "brand": brand.as_str() }),
        );
        Ok(updated)
    }

    /// Validate and register a new attempt. Runs synchronously under the
    /// session lock so the in-flight guard is race-free.
    fn begin_attempt(
        &self,
        option: PaymentOption,
        save_for_future: bool,
    ) -> Result<(Begin, u64)> {
        let mut state = self.session.lock().unwrap_or_else(|e| e.into_inner());

        if state.attempt.as_ref().is_some_and(|a| a.state.is_live()) {
            return Err(ConfirmError::AlreadyInProgress);
        }

        let mut attempt = ConfirmationAttempt::new(option, save_for_future);

        if let Some(draft) = attempt.option.draft() {
            let missing = self.field_policy.missing_fields(draft, &self.country);
            if !missing.is_empty() {
                return Err(ConfirmError::IncompleteForm { missing });
            }
        }

        if self.needs_cvc_recollection(&attempt.option, &state.verified) {
            attempt.requires_cvc_recollection = true;
            attempt.state = AttemptState::RequiresInput(ActionKind::Cvc);
            let attempt_id = attempt.id.clone();
            state.attempt = Some(attempt);
            self.analytics.report_event(
                events::CONFIRM_REQUIRES_INPUT,
                &json!({ "attempt_id": attempt_id, "action": "cvc" }),
            );
            return Ok((Begin::RequiresCvc, state.generation));
        }

        attempt.state = AttemptState::Submitting;
        let request = ConfirmRequest {
            option: attempt.option.clone(),
            save_for_future,
            cvc: None,
        };
        let attempt_id = attempt.id.clone();
        let generation = state.generation;
        state.attempt = Some(attempt);
        self.analytics
            .report_event(events::CONFIRM_STARTED, &json!({ "attempt_id": attempt_id }));
        Ok((Begin::Dispatch(request), generation))
    }

    /// Move a parked attempt back into `Submitting`.
    fn resume_attempt(
        &self,
        action: ActionKind,
        cvc: Option<String>,
    ) -> Result<(ConfirmRequest, u64)> {
        let mut state = self.session.lock().unwrap_or_else(|e| e.into_inner());

        let attempt = state
            .attempt
            .as_mut()
            .ok_or_else(|| ConfirmError::InvalidState("no attempt waiting for input".into()))?;
        if attempt.state != AttemptState::RequiresInput(action) {
            return Err(ConfirmError::InvalidState(format!(
                "attempt is not waiting for {action}"
            )));
        }

        attempt.state = AttemptState::Submitting;
        let request = ConfirmRequest {
            option: attempt.option.clone(),
            save_for_future: attempt.save_for_future,
            cvc,
        };
        let attempt_id = attempt.id.clone();
        let generation = state.generation;
        self.analytics
            .report_event(events::CONFIRM_STARTED, &json!({ "attempt_id": attempt_id }));
        Ok((request, generation))
    }

    fn needs_cvc_recollection(
        &self,
        option: &PaymentOption,
        verified: &HashSet<SavedMethodId>,
    ) -> bool {
        if !self.store.config().cvc_recollection {
            return false;
        }
        let Some(id) = option.saved_id() else {
            return false;
        };
        if verified.contains(id) {
            return false;
        }
        self.store.get(id).is_some_and(|m| m.is_card())
    }

    /// Call the backend and reconcile its outcome. The session lock is not
    /// held across the await; the generation counter decides whether the
    /// resolution still matters.
    async fn dispatch(&self, request: ConfirmRequest, generation: u64) -> Result<Outcome> {
        let result = self.call_client(&request).await;

        let mut state = self.session.lock().unwrap_or_else(|e| e.into_inner());
        if state.generation != generation {
            // Canceled while in flight. cancel() already reverted the
            // selection; this resolution is discarded.
            tracing::debug!("discarding outcome of canceled attempt");
            return Ok(Outcome::Canceled);
        }

        let attempt = state
            .attempt
            .take()
            .ok_or_else(|| ConfirmError::InvalidState("no live attempt".into()))?;

        let intent = match result {
            Ok(intent) => intent,
            Err(err) => {
                tracing::warn!(error = %err, "confirmation dispatch failed");
                return Err(err);
            }
        };

        match intent {
            IntentOutcome::Succeeded { attached } => {
                let attached_id = self.apply_success(&attempt, attached, &mut state.verified)?;
                self.analytics.report_event(
                    events::CONFIRM_SUCCEEDED,
                    &json!({ "attempt_id": attempt.id }),
                );
                Ok(Outcome::Succeeded {
                    attached: attached_id,
                })
            }
            IntentOutcome::Declined { reason } => {
                // Back to idle with the prior selection intact; the user may
                // retry the same option without re-entering anything.
                self.analytics.report_event(
                    events::CONFIRM_DECLINED,
                    &json!({ "attempt_id": attempt.id, "reason": reason }),
                );
                Ok(Outcome::Declined { reason })
            }
            IntentOutcome::RequiresAction { action } => {
                let mut parked = attempt;
                parked.state = AttemptState::RequiresInput(action);
                self.analytics.report_event(
                    events::CONFIRM_REQUIRES_INPUT,
                    &json!({ "attempt_id": parked.id, "action": action.to_string() }),
                );
                state.attempt = Some(parked);
                Ok(Outcome::RequiresInput { action })
            }
            IntentOutcome::Canceled => {
                // The user dismissed the external flow; the previously
                // confirmed option remains selected, not the attempted one.
                self.registry.clear_selection();
                self.analytics.report_event(
                    events::CONFIRM_CANCELED,
                    &json!({ "attempt_id": attempt.id }),
                );
                Ok(Outcome::Canceled)
            }
        }
    }

    /// Side effects of a successful confirmation: persist the attached
    /// method, promote the confirmed option, clear the consumed draft, and
    /// mark the method session-verified.
    ///
    /// The attach is gated on the save opt-in. A backend that returns an
    /// attached method without one is ignored locally; the instrument is
    /// not surfaced as saved.
    fn apply_success(
        &self,
        attempt: &ConfirmationAttempt,
        attached: Option<SavedMethod>,
        verified: &mut HashSet<SavedMethodId>,
    ) -> Result<Option<SavedMethodId>> {
        let opted_in = attempt.save_for_future
            || attempt.option.draft().is_some_and(|d| d.save_for_future);
        let attached_id = match attached {
            Some(method) if opted_in => {
                let id = method.id.clone();
                self.store.attach(method, false)?;
                self.analytics
                    .report_event(events::METHOD_ATTACHED, &json!({ "method_id": id.as_str() }));
                Some(id)
            }
            _ => None,
        };

        if let Some(type_id) = attempt.option.form_type_id() {
            self.registry.form_cache().clear(type_id);
        }

        let confirmed = match &attached_id {
            Some(id) => PaymentOption::saved(id.clone()),
            None => attempt.option.clone(),
        };
        if let Some(id) = confirmed.saved_id() {
            verified.insert(id.clone());
        }
        self.registry.mark_confirmed(confirmed);

        Ok(attached_id)
    }

    async fn call_client(&self, request: &ConfirmRequest) -> Result<IntentOutcome> {
        #[cfg(feature = "timeout")]
        {
            tokio::time::timeout(CONFIRM_TIMEOUT, self.client.create_or_confirm_intent(request))
                .await
                .map_err(|_| ConfirmError::Transport("intent confirmation timed out".into()))?
        }
        #[cfg(not(feature = "timeout"))]
        {
            self.client.create_or_confirm_intent(request).await
        }
    }
}
