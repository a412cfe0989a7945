use crate::consent::ConsentDecision;
use crate::dom::ElementNode;
use crate::registry::{Category, ServiceDefinition};
use std::sync::{Mutex, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Script,
    Iframe,
}

/// One intercepted resource awaiting a possible restore. Holds only a
/// weak reference to the node; the ledger never keeps a removed node
/// alive.
#[derive(Debug, Clone)]
pub struct BlockedResourceRecord {
    pub kind: ResourceKind,
    pub node: Weak<ElementNode>,
    pub node_id: u64,
    pub original_src: String,
    pub service_id: String,
    pub category: Category,
}

/// In-memory record of everything currently blocked. At most one record
/// per node; process-lifetime only.
#[derive(Debug, Default)]
pub struct Ledger {
    records: Mutex<Vec<BlockedResourceRecord>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record unless the node is already ledgered. Returns
    /// whether the record was added (re-interception is a no-op).
    pub fn record(&self, record: BlockedResourceRecord) -> bool {
        let mut records = self.records.lock().unwrap();
        if records.iter().any(|r| r.node_id == record.node_id) {
            return false;
        }
        records.push(record);
        true
    }

    pub fn contains(&self, node_id: u64) -> bool {
        self.records
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.node_id == node_id)
    }

    /// Re-points a record after a re-assignment on an already-blocked
    /// node. The diverted locator and the matched service both follow
    /// the newest assignment; a stale category here would restore the
    /// resource under the wrong grant.
    pub fn update_blocked(&self, node_id: u64, src: &str, service: &ServiceDefinition) {
        let mut records = self.records.lock().unwrap();
        if let Some(rec) = records.iter_mut().find(|r| r.node_id == node_id) {
            rec.original_src = src.to_owned();
            rec.service_id = service.id.clone();
            rec.category = service.category;
        }
    }

    /// Drops the record for a node whose blocked value was superseded by
    /// a benign assignment.
    pub fn retire(&self, node_id: u64) -> Option<BlockedResourceRecord> {
        let mut records = self.records.lock().unwrap();
        let idx = records.iter().position(|r| r.node_id == node_id)?;
        Some(records.remove(idx))
    }

    /// Removes and returns every record whose category the decision now
    /// grants. Records whose node has been reclaimed are swept out
    /// silently along the way.
    pub fn take_granted(&self, decision: &ConsentDecision) -> Vec<BlockedResourceRecord> {
        let mut records = self.records.lock().unwrap();
        let mut granted = Vec::new();
        records.retain(|r| {
            if r.node.upgrade().is_none() {
                return false;
            }
            if decision.granted(r.category) {
                granted.push(r.clone());
                return false;
            }
            true
        });
        granted
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn record_for(el: &Arc<ElementNode>, category: Category) -> BlockedResourceRecord {
        BlockedResourceRecord {
            kind: ResourceKind::Script,
            node: Arc::downgrade(el),
            node_id: el.id(),
            original_src: "https://tracker.test/t.js".into(),
            service_id: "tracker".into(),
            category,
        }
    }

    #[test]
    fn test_no_double_record() {
        let ledger = Ledger::new();
        let el = ElementNode::new("script");
        assert!(ledger.record(record_for(&el, Category::Analytics)));
        assert!(!ledger.record(record_for(&el, Category::Analytics)));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_take_granted_filters_by_category() {
        let ledger = Ledger::new();
        let a = ElementNode::new("script");
        let b = ElementNode::new("script");
        ledger.record(record_for(&a, Category::Analytics));
        ledger.record(record_for(&b, Category::Marketing));

        let decision = ConsentDecision::default().grant(Category::Analytics);
        let granted = ledger.take_granted(&decision);
        assert_eq!(granted.len(), 1);
        assert_eq!(granted[0].node_id, a.id());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_update_blocked_repoints_service_and_category() {
        let ledger = Ledger::new();
        let el = ElementNode::new("script");
        ledger.record(record_for(&el, Category::Marketing));

        let analytics = ServiceDefinition::new(
            "stats",
            Category::Analytics,
            "stats.test",
        );
        ledger.update_blocked(el.id(), "https://stats.test/s.js", &analytics);

        // The old category no longer selects the record.
        let marketing_only = ConsentDecision::default().grant(Category::Marketing);
        assert!(ledger.take_granted(&marketing_only).is_empty());

        let analytics_only = ConsentDecision::default().grant(Category::Analytics);
        let granted = ledger.take_granted(&analytics_only);
        assert_eq!(granted.len(), 1);
        assert_eq!(granted[0].service_id, "stats");
        assert_eq!(granted[0].original_src, "https://stats.test/s.js");
    }

    #[test]
    fn test_dead_nodes_are_swept() {
        let ledger = Ledger::new();
        {
            let el = ElementNode::new("script");
            ledger.record(record_for(&el, Category::Analytics));
        }
        // Node dropped; a grant pass must skip it without error.
        let decision = ConsentDecision::default().grant(Category::Analytics);
        assert!(ledger.take_granted(&decision).is_empty());
        assert!(ledger.is_empty());
    }
}
