mod bridge;
mod interceptor;
mod ledger;
mod purge;
mod watcher;

pub use bridge::{ConsentModeBridge, ConsentSignals, SignalState};
pub use interceptor::{GuardedElement, GuardedFactory, BLOCKED_SRC_ATTR, INERT_TYPE};
pub use ledger::{BlockedResourceRecord, Ledger, ResourceKind};
pub use purge::{default_purge_rules, CookiePurger, CookieRule, PurgeOutcome, PurgeRule};
pub use watcher::{MutationWatcher, PLACEHOLDER_CLASS, PLACEHOLDER_SERVICE_ATTR};

use crate::config::Config;
use crate::consent::{ConsentDecision, ConsentState, ConsentStore};
use crate::dom::{Document, Element, ElementNode};
use crate::events::{ConsoleEventSink, EngineEvent, EventBus, EventSink};
use crate::registry::{RegistryHandle, RegistryLoader, RemoteLoader};
use crate::stats::{StatsCollector, StatsSnapshot};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The engine singleton: owns the registry handle, the current consent
/// state, the ledger, and the page surfaces, and exposes the public
/// entry points. Created once at page-script load; there is no ambient
/// global state outside this instance.
pub struct ConsentEngine {
    config: Config,
    document: Arc<Document>,
    registry: Arc<RegistryHandle>,
    consent: Arc<ConsentState>,
    store: ConsentStore,
    ledger: Arc<Ledger>,
    watcher: MutationWatcher,
    bridge: ConsentModeBridge,
    purger: CookiePurger,
    events: EventBus,
    stats: Arc<StatsCollector>,
}

impl ConsentEngine {
    /// Wires the engine against a page. Interception is live as soon as
    /// this returns: the built-in service defaults are loaded
    /// synchronously, the default (all-denied) consent-mode state is
    /// pushed, and any persisted decision is reconciled immediately.
    pub fn new(config: Config, document: Arc<Document>) -> Arc<Self> {
        let registry = Arc::new(RegistryHandle::with_defaults());
        let consent = Arc::new(ConsentState::new());
        let ledger = Arc::new(Ledger::new());
        let stats = Arc::new(StatsCollector::new());
        let store = ConsentStore::new(document.clone(), &config.storage);
        let watcher = MutationWatcher::new(
            document.clone(),
            registry.clone(),
            consent.clone(),
            ledger.clone(),
            stats.clone(),
        );
        let bridge = ConsentModeBridge::new(document.clone());
        let purger = CookiePurger::new(&config.purge);
        let events = EventBus::new();
        events.subscribe(Arc::new(ConsoleEventSink::new(config.logging.clone())));

        let engine = Arc::new(Self {
            config,
            document,
            registry,
            consent,
            store,
            ledger,
            watcher,
            bridge,
            purger,
            events,
            stats,
        });

        engine.bridge.push_default();

        if let Some(decision) = engine.store.load() {
            info!("Persisted consent decision found; reconciling");
            engine.apply(decision);
        }

        engine
    }

    /// Element factory all resource-creating call sites go through; the
    /// enforcement chokepoint.
    pub fn factory(&self) -> GuardedFactory {
        GuardedFactory::new(
            self.document.clone(),
            self.registry.clone(),
            self.consent.clone(),
            self.ledger.clone(),
            self.stats.clone(),
        )
    }

    /// Drains pending document mutations through the watcher. Returns the
    /// number of newly blocked nodes.
    pub fn process_mutations(&self) -> usize {
        self.watcher.process_pending()
    }

    /// Public entry point for the consent-UI collaborator. Persists the
    /// decision, pushes the consent-mode update, restores newly granted
    /// resources, purges denied-category cookies and storage, and emits a
    /// completion event. Re-invocation with an identical decision is a
    /// no-op beyond the event.
    pub fn apply(&self, decision: ConsentDecision) {
        let decision = if decision.timestamp == 0 {
            decision.stamped_now()
        } else {
            decision
        };
        info!(
            accepted = decision.accepted,
            analytics = decision.analytics,
            marketing = decision.marketing,
            functional = decision.functional,
            ads = decision.ads,
            "applying consent decision"
        );

        self.consent.replace(decision.clone());
        self.store.save(&decision);

        self.bridge.push_update(&decision);

        let restored = self.restore_granted(&decision);

        let outcome = self.purger.purge_denied(&self.document, &decision);
        self.stats.add_cookies_purged(outcome.cookies_removed as u64);
        self.stats
            .add_storage_keys_purged(outcome.storage_keys_removed as u64);

        self.events
            .emit(EngineEvent::ConsentApplied { decision, restored });
    }

    /// Removes the persisted decision. The caller is expected to reload
    /// the page afterwards; see [`ConsentStore::clear`].
    pub fn clear_persisted(&self) {
        self.store.clear();
    }

    /// Report a click on a blocked-content placeholder; tells the
    /// external consent UI to open.
    pub fn placeholder_clicked(&self, el: &Element) {
        let Some(service_id) = el.attr(PLACEHOLDER_SERVICE_ATTR) else {
            debug!("click on a non-placeholder element ignored");
            return;
        };
        self.events.emit(EngineEvent::OpenConsentUi { service_id });
    }

    /// Spawns the remote registry refresh. Interception keeps running on
    /// the defaults while the fetch is in flight; failure leaves them in
    /// force.
    pub fn start_remote_refresh(self: &Arc<Self>) {
        if !self.config.refresh.enable {
            return;
        }
        let Some(site_id) = self.config.site_id.clone() else {
            debug!("no site_id configured; skipping remote registry refresh");
            return;
        };
        let loader = RemoteLoader::new(&self.config.api_base_url, self.config.refresh.timeout_ms);
        let registry = self.registry.clone();
        tokio::spawn(async move {
            registry.refresh(&loader, &site_id).await;
        });
    }

    /// Runs one refresh with a caller-supplied loader (test seam, and the
    /// way embedders with their own transport plug in).
    pub async fn refresh_registry(&self, loader: &dyn RegistryLoader) -> bool {
        let Some(site_id) = self.config.site_id.as_deref() else {
            return false;
        };
        self.registry.refresh(loader, site_id).await
    }

    pub fn subscribe(&self, sink: Arc<dyn EventSink>) {
        self.events.subscribe(sink);
    }

    pub fn current_decision(&self) -> ConsentDecision {
        self.consent.current()
    }

    pub fn blocked_count(&self) -> usize {
        self.ledger.len()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    fn restore_granted(&self, decision: &ConsentDecision) -> usize {
        let mut restored = 0;
        for record in self.ledger.take_granted(decision) {
            let Some(node) = record.node.upgrade() else {
                // Reclaimed while we held the record; nothing to restore.
                continue;
            };
            match record.kind {
                ResourceKind::Script => {
                    node.set_attr("src", &record.original_src);
                    node.remove_attr(BLOCKED_SRC_ATTR);
                    if node.attr("type").as_deref() == Some(INERT_TYPE) {
                        node.remove_attr("type");
                    }
                    if !self.document.is_connected(&node) {
                        // Held outside the tree since interception.
                        self.document.append_child(self.document.root(), &node);
                    }
                    self.document.activate_if_live(&node);
                    restored += 1;
                    self.stats.inc_restored();
                    debug!(service = %record.service_id, "restored blocked script");
                }
                ResourceKind::Iframe => {
                    let Some(parent) = node.parent() else {
                        warn!(
                            service = %record.service_id,
                            "placeholder detached before restore; skipping"
                        );
                        continue;
                    };
                    let iframe = ElementNode::new("iframe");
                    iframe.set_attr("src", &record.original_src);
                    if !self.document.replace_child(&parent, &node, &iframe) {
                        continue;
                    }
                    self.document.activate_if_live(&iframe);
                    restored += 1;
                    self.stats.inc_restored();
                    debug!(service = %record.service_id, "reconstructed blocked iframe");
                }
            }
        }
        // Restoration queued mutation batches; drain them so benign
        // follow-up inserts are not left pending.
        self.watcher.process_pending();
        restored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Category;

    fn engine() -> (Arc<Document>, Arc<ConsentEngine>) {
        let document = Document::new("example.com");
        let engine = ConsentEngine::new(Config::default(), document.clone());
        (document, engine)
    }

    #[test]
    fn test_default_consent_mode_pushed_at_startup() {
        let (doc, _engine) = engine();
        let entries = doc.data_layer.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0][1], "default");
        assert_eq!(entries[0][2]["security_storage"], "granted");
        assert_eq!(entries[0][2]["analytics_storage"], "denied");
    }

    #[test]
    fn test_restore_reattaches_detached_script() {
        let (doc, engine) = engine();
        let factory = engine.factory();
        let script = factory.create_element("script");
        script.set_attribute("src", "https://www.google-analytics.com/analytics.js");
        // Never inserted into the tree.
        assert_eq!(engine.blocked_count(), 1);

        engine.apply(
            ConsentDecision::default()
                .grant(Category::Analytics)
                .accepted(),
        );

        assert_eq!(engine.blocked_count(), 0);
        assert!(doc.network.contains("google-analytics.com"));
    }

    #[test]
    fn test_persisted_decision_reconciled_at_startup() {
        let document = Document::new("example.com");
        {
            // A prior session saved a decision.
            let store = ConsentStore::new(document.clone(), &Config::default().storage);
            store.save(
                &ConsentDecision::default()
                    .grant(Category::Analytics)
                    .accepted()
                    .stamped_now(),
            );
        }
        let engine = ConsentEngine::new(Config::default(), document);
        assert!(engine.current_decision().accepted);
        assert!(engine.current_decision().analytics);
    }

    #[test]
    fn test_placeholder_click_emits_open_event() {
        let (_doc, engine) = engine();
        let sink = Arc::new(crate::events::MemoryEventSink::new(10));
        engine.subscribe(sink.clone());

        let placeholder = ElementNode::new("div");
        placeholder.set_attr(PLACEHOLDER_SERVICE_ATTR, "youtube-embed");
        engine.placeholder_clicked(&placeholder);

        assert_eq!(
            sink.get_recent(),
            vec![EngineEvent::OpenConsentUi {
                service_id: "youtube-embed".into()
            }]
        );
    }
}
