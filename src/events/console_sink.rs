use super::types::{EngineEvent, EventSink};
use crate::config::LoggingConfig;
use tracing::info;

pub struct ConsoleEventSink {
    config: LoggingConfig,
}

impl ConsoleEventSink {
    pub fn new(config: LoggingConfig) -> Self {
        Self { config }
    }
}

impl EventSink for ConsoleEventSink {
    fn emit(&self, event: &EngineEvent) {
        if !self.config.enable {
            return;
        }

        match event {
            EngineEvent::ConsentApplied { decision, restored } => {
                if self.config.log_restored {
                    info!(
                        target: "consent_event",
                        accepted = decision.accepted,
                        analytics = decision.analytics,
                        marketing = decision.marketing,
                        functional = decision.functional,
                        ads = decision.ads,
                        restored = restored,
                        "consent applied"
                    );
                }
            }
            EngineEvent::OpenConsentUi { service_id } => {
                info!(
                    target: "consent_event",
                    service = %service_id,
                    "placeholder clicked, open consent UI"
                );
            }
        }
    }
}
