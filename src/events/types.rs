use crate::consent::ConsentDecision;

/// Observable engine outcomes for the consent-UI collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A consent decision finished reconciling. `restored` counts the
    /// blocked resources brought back to life by this apply.
    ConsentApplied {
        decision: ConsentDecision,
        restored: usize,
    },
    /// A visitor clicked a blocked-content placeholder; the consent UI
    /// should open.
    OpenConsentUi { service_id: String },
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: &EngineEvent);
}
