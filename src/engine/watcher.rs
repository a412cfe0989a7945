use super::interceptor::{BLOCKED_SRC_ATTR, INERT_TYPE};
use super::ledger::{BlockedResourceRecord, Ledger, ResourceKind};
use crate::consent::ConsentState;
use crate::dom::{descendants_including_self, Document, Element, ElementNode};
use crate::registry::{RegistryHandle, ServiceDefinition, ServiceMatcher};
use crate::stats::StatsCollector;
use std::sync::Arc;
use tracing::debug;

pub const PLACEHOLDER_CLASS: &str = "consent-gate-placeholder";
pub const PLACEHOLDER_SERVICE_ATTR: &str = "data-consent-service";

/// Safety net for resources that bypass the guarded factory: markup
/// inserted wholesale, elements created elsewhere. Consumes the
/// document's mutation batches in order and applies the same
/// match-and-block decision at insertion time.
///
/// Insertion time is strictly weaker than creation time: a script parsed
/// from markup has already fetched by the time its batch is observable
/// (see [`Document::append_parsed`]). That gap is inherent to
/// observation-based blocking and is left visible rather than papered
/// over; the guarded factory remains the primary guarantee.
pub struct MutationWatcher {
    document: Arc<Document>,
    registry: Arc<RegistryHandle>,
    consent: Arc<ConsentState>,
    ledger: Arc<Ledger>,
    stats: Arc<StatsCollector>,
}

impl MutationWatcher {
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

    /// Drains pending mutation batches, oldest first, blocking what needs
    /// blocking and then letting the still-live resources of each batch
    /// activate. Returns how many nodes were newly blocked.
    pub fn process_pending(&self) -> usize {
        let mut blocked = 0;
        // Placeholder swaps queue further batches; keep draining until
        // the queue is quiet.
        loop {
            let batches = self.document.take_mutations();
            if batches.is_empty() {
                return blocked;
            }
            for batch in batches {
                for root in &batch.added {
                    blocked += self.inspect_subtree(root);
                    self.document.activate_subtree(root);
                }
            }
        }
    }

    fn inspect_subtree(&self, root: &Element) -> usize {
        let mut blocked = 0;
        for el in descendants_including_self(root) {
            if el.is_script() {
                blocked += self.inspect_script(&el) as usize;
            } else if el.is_iframe() {
                blocked += self.inspect_iframe(&el) as usize;
            }
        }
        blocked
    }

    fn inspect_script(&self, el: &Element) -> bool {
        if self.ledger.contains(el.id()) {
            return false;
        }
        let Some(src) = el.attr("src") else {
            return false;
        };
        let Some(service) = self.match_unconsented(&src) else {
            return false;
        };

        // Neutralize in place: divert the locator, kill the executable type.
        el.remove_attr("src");
        el.set_attr(BLOCKED_SRC_ATTR, &src);
        el.set_attr("type", INERT_TYPE);

        if self.ledger.record(BlockedResourceRecord {
            kind: ResourceKind::Script,
            node: Arc::downgrade(el),
            node_id: el.id(),
            original_src: src,
            service_id: service.id.clone(),
            category: service.category,
        }) {
            self.stats.inc_intercepted_script();
            debug!(service = %service.id, "blocked inserted script");
            return true;
        }
        false
    }

    fn inspect_iframe(&self, el: &Element) -> bool {
        if self.ledger.contains(el.id()) {
            return false;
        }
        let Some(src) = el.attr("src") else {
            return false;
        };
        let Some(service) = self.match_unconsented(&src) else {
            return false;
        };
        let Some(parent) = el.parent() else {
            return false;
        };

        // Swap in an explanatory placeholder; the original locator lives
        // on in the ledger for later reconstruction.
        let placeholder = ElementNode::new("div");
        placeholder.set_attr("class", PLACEHOLDER_CLASS);
        placeholder.set_attr(PLACEHOLDER_SERVICE_ATTR, &service.id);
        placeholder.set_text(&format!(
            "This embedded content is blocked until you allow {} cookies. Click to review your choices.",
            service.category.as_str()
        ));

        if !self.document.replace_child(&parent, el, &placeholder) {
            return false;
        }

        if self.ledger.record(BlockedResourceRecord {
            kind: ResourceKind::Iframe,
            node: Arc::downgrade(&placeholder),
            node_id: placeholder.id(),
            original_src: src,
            service_id: service.id.clone(),
            category: service.category,
        }) {
            self.stats.inc_intercepted_iframe();
            debug!(service = %service.id, "replaced inserted iframe with placeholder");
            return true;
        }
        false
    }

    fn match_unconsented(&self, url: &str) -> Option<ServiceDefinition> {
        let list = self.registry.current();
        let service = list.match_url(url)?;
        if self.consent.is_granted(service.category) {
            return None;
        }
        Some(service.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Arc<Document>, Arc<Ledger>, MutationWatcher) {
        let document = Document::new("example.com");
        let registry = Arc::new(RegistryHandle::with_defaults());
        let consent = Arc::new(ConsentState::new());
        let ledger = Arc::new(Ledger::new());
        let stats = Arc::new(StatsCollector::new());
        let watcher = MutationWatcher::new(
            document.clone(),
            registry,
            consent,
            ledger.clone(),
            stats,
        );
        (document, ledger, watcher)
    }

    #[test]
    fn test_inserted_script_is_neutralized_before_activation() {
        let (doc, ledger, watcher) = setup();
        let script = ElementNode::new("script");
        script.set_attr("src", "https://www.google-analytics.com/analytics.js");
        doc.append_child(doc.root(), &script);

        assert_eq!(watcher.process_pending(), 1);
        assert!(doc.network.is_empty());
        assert_eq!(script.attr("src"), None);
        assert_eq!(
            script.attr(BLOCKED_SRC_ATTR).as_deref(),
            Some("https://www.google-analytics.com/analytics.js")
        );
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_nested_insertion_is_walked() {
        let (doc, ledger, watcher) = setup();
        let wrapper = ElementNode::new("div");
        let inner = ElementNode::new("div");
        let tracker = ElementNode::new("script");
        tracker.set_attr("src", "https://connect.facebook.net/en_US/fbevents.js");
        let benign = ElementNode::new("script");
        benign.set_attr("src", "https://example.com/app.js");
        inner.push_child(tracker.clone());
        inner.push_child(benign.clone());
        wrapper.push_child(inner);

        doc.append_child(doc.root(), &wrapper);
        assert_eq!(watcher.process_pending(), 1);

        assert_eq!(ledger.len(), 1);
        // The benign script went live.
        assert_eq!(doc.network.requests(), vec!["https://example.com/app.js"]);
    }

    #[test]
    fn test_iframe_becomes_placeholder() {
        let (doc, ledger, watcher) = setup();
        let iframe = ElementNode::new("iframe");
        iframe.set_attr("src", "https://www.youtube.com/embed/abc123");
        doc.append_child(doc.root(), &iframe);

        assert_eq!(watcher.process_pending(), 1);
        assert!(!doc.is_connected(&iframe));
        assert!(doc.network.is_empty());

        let children = doc.root().children();
        let placeholder = children.last().unwrap();
        assert_eq!(placeholder.tag(), "div");
        assert_eq!(
            placeholder.attr(PLACEHOLDER_SERVICE_ATTR).as_deref(),
            Some("youtube-embed")
        );
        assert!(placeholder.text().contains("blocked"));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_parser_inserted_script_gap_is_visible() {
        let (doc, ledger, watcher) = setup();
        let script = ElementNode::new("script");
        script.set_attr("src", "https://www.google-analytics.com/analytics.js");

        // Parser path: the fetch fires at insertion, before any observer.
        doc.append_parsed(doc.root(), &script);
        assert_eq!(doc.network.len(), 1);

        // The watcher still neutralizes and ledgers the element after the
        // fact, but cannot recall the request.
        watcher.process_pending();
        assert_eq!(script.attr("src"), None);
        assert_eq!(ledger.len(), 1);
        assert_eq!(doc.network.len(), 1);
    }

    #[test]
    fn test_already_ledgered_node_is_skipped() {
        let (doc, ledger, watcher) = setup();
        let script = ElementNode::new("script");
        script.set_attr("src", "https://www.hotjar.com/h.js");
        doc.append_child(doc.root(), &script);
        watcher.process_pending();

        // Re-attach elsewhere; re-observation must not double-ledger.
        let section = ElementNode::new("div");
        doc.append_child(doc.root(), &section);
        doc.append_child(&section, &script);
        assert_eq!(watcher.process_pending(), 0);
        assert_eq!(ledger.len(), 1);
    }
}
