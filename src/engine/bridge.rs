use crate::consent::ConsentDecision;
use crate::dom::Document;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalState {
    Granted,
    Denied,
}

impl From<bool> for SignalState {
    fn from(granted: bool) -> Self {
        if granted {
            SignalState::Granted
        } else {
            SignalState::Denied
        }
    }
}

/// The external analytics consent-signal vocabulary. Six fields follow
/// the decision; `security_storage` is a non-optional baseline and is
/// always granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConsentSignals {
    pub ad_user_data: SignalState,
    pub ad_personalization: SignalState,
    pub ad_storage: SignalState,
    pub analytics_storage: SignalState,
    pub functionality_storage: SignalState,
    pub personalization_storage: SignalState,
    pub security_storage: SignalState,
}

impl ConsentSignals {
    /// State before any decision: everything denied except
    /// `security_storage`.
    pub fn denied_baseline() -> Self {
        Self::from_grants(false, false, false)
    }

    pub fn from_decision(decision: &ConsentDecision) -> Self {
        Self::from_grants(decision.marketing, decision.analytics, decision.functional)
    }

    fn from_grants(marketing: bool, analytics: bool, functional: bool) -> Self {
        Self {
            ad_user_data: marketing.into(),
            ad_personalization: marketing.into(),
            ad_storage: marketing.into(),
            analytics_storage: analytics.into(),
            functionality_storage: functional.into(),
            personalization_storage: marketing.into(),
            security_storage: SignalState::Granted,
        }
    }
}

/// Appends consent-mode entries to the page's dataLayer push log, in the
/// `["consent", "default"|"update", {...}]` shape the external analytics
/// convention expects.
pub struct ConsentModeBridge {
    document: Arc<Document>,
}

impl ConsentModeBridge {
    pub fn new(document: Arc<Document>) -> Self {
        Self { document }
    }

    pub fn push_default(&self) {
        self.push("default", ConsentSignals::denied_baseline());
    }

    pub fn push_update(&self, decision: &ConsentDecision) {
        self.push("update", ConsentSignals::from_decision(decision));
    }

    fn push(&self, verb: &str, signals: ConsentSignals) {
        let entry = json!(["consent", verb, signals]);
        debug!(verb = verb, "pushing consent-mode signals");
        self.document.data_layer.push(entry);
    }
}
