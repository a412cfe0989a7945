use super::ledger::{BlockedResourceRecord, Ledger, ResourceKind};
use crate::consent::ConsentState;
use crate::dom::{Document, Element, ElementNode};
use crate::registry::{RegistryHandle, ServiceMatcher};
use crate::stats::StatsCollector;
use std::sync::Arc;
use tracing::debug;

/// Attribute the real locator is diverted into while blocked. The
/// browser never sees a fetchable value on `src`.
pub const BLOCKED_SRC_ATTR: &str = "data-consent-src";

/// Non-executable replacement for the script `type` marker.
pub const INERT_TYPE: &str = "text/plain";

/// The single chokepoint for element creation. Elements produced here
/// route their attribute writes through the consent guard, so a matched
/// script can never acquire a live `src` without a grant.
pub struct GuardedFactory {
    document: Arc<Document>,
    registry: Arc<RegistryHandle>,
    consent: Arc<ConsentState>,
    ledger: Arc<Ledger>,
    stats: Arc<StatsCollector>,
}

impl GuardedFactory {
    pub(crate) fn new(
        document: Arc<Document>,
        registry: Arc<RegistryHandle>,
        consent: Arc<ConsentState>,
        ledger: Arc<Ledger>,
        stats: Arc<StatsCollector>,
    ) -> Self {
        Self {
            document,
            registry,
            consent,
            ledger,
            stats,
        }
    }

    pub fn create_element(&self, tag: &str) -> GuardedElement {
        GuardedElement {
            inner: ElementNode::new(tag),
            document: self.document.clone(),
            registry: self.registry.clone(),
            consent: self.consent.clone(),
            ledger: self.ledger.clone(),
            stats: self.stats.clone(),
        }
    }
}

/// An element whose attribute-setting operation enforces consent.
pub struct GuardedElement {
    inner: Element,
    document: Arc<Document>,
    registry: Arc<RegistryHandle>,
    consent: Arc<ConsentState>,
    ledger: Arc<Ledger>,
    stats: Arc<StatsCollector>,
}

impl GuardedElement {
    pub fn element(&self) -> &Element {
        &self.inner
    }

    /// The guarded write. Runs the match-and-block decision synchronously
    /// inside this call; the current consent state and the current
    /// registry are consulted on every invocation, never cached.
    pub fn set_attribute(&self, name: &str, value: &str) {
        if !(self.inner.is_script() && name == "src") {
            self.inner.set_attr(name, value);
            return;
        }

        let list = self.registry.current();
        match list.match_url(value) {
            Some(service) if !self.consent.is_granted(service.category) => {
                self.inner.set_attr(BLOCKED_SRC_ATTR, value);
                self.inner.set_attr("type", INERT_TYPE);

                let added = self.ledger.record(BlockedResourceRecord {
                    kind: ResourceKind::Script,
                    node: Arc::downgrade(&self.inner),
                    node_id: self.inner.id(),
                    original_src: value.to_owned(),
                    service_id: service.id.clone(),
                    category: service.category,
                });
                if added {
                    self.stats.inc_intercepted_script();
                    debug!(
                        service = %service.id,
                        category = %service.category.as_str(),
                        "blocked script src assignment"
                    );
                } else {
                    // Re-assignment on an already-blocked node: keep one
                    // record, tracking the newest locator and its match.
                    self.ledger.update_blocked(self.inner.id(), value, service);
                }
            }
            _ => {
                // Benign or granted. A previously diverted value is now
                // superseded; drop the stale record and inert state.
                if self.ledger.retire(self.inner.id()).is_some() {
                    self.inner.remove_attr(BLOCKED_SRC_ATTR);
                    if self.inner.attr("type").as_deref() == Some(INERT_TYPE) {
                        self.inner.remove_attr("type");
                    }
                }
                self.inner.set_attr("src", value);
                self.document.activate_if_live(&self.inner);
            }
        }
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.inner.attr(name)
    }
}
