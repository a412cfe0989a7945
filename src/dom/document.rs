use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Weak};

use super::node::{descendants_including_self, Element, ElementNode};
use super::surfaces::{CookieJar, DataLayer, NetworkLog, StorageArea};

/// One observed change to the live tree: the roots of newly added subtrees,
/// in insertion order.
#[derive(Debug)]
pub struct MutationBatch {
    pub added: Vec<Element>,
}

/// The page: element tree plus the host surfaces hanging off it.
///
/// Tree insertions queue [`MutationBatch`]es which the mutation watcher
/// drains in order. For DOM-API insertions ([`Document::append_child`])
/// resource activation is deferred until the batch is processed, so a
/// watcher that neutralizes the node first wins. Parser-driven insertions
/// ([`Document::append_parsed`]) activate immediately at attach time,
/// before any observer runs. That path cannot be protected after the
/// fact, which is the acknowledged limitation of watcher-based blocking.
#[derive(Debug)]
pub struct Document {
    hostname: String,
    root: Element,
    mutations: Mutex<VecDeque<MutationBatch>>,
    pub cookies: CookieJar,
    pub storage: StorageArea,
    pub data_layer: DataLayer,
    pub network: NetworkLog,
}

impl Document {
    pub fn new(hostname: &str) -> Arc<Self> {
        Arc::new(Self {
            hostname: hostname.to_owned(),
            root: ElementNode::new("html"),
            mutations: Mutex::new(VecDeque::new()),
            cookies: CookieJar::new(),
            storage: StorageArea::new(),
            data_layer: DataLayer::new(),
            network: NetworkLog::new(),
        })
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn is_connected(&self, el: &Element) -> bool {
        let mut cursor = el.clone();
        loop {
            if Arc::ptr_eq(&cursor, &self.root) {
                return true;
            }
            match cursor.parent() {
                Some(parent) => cursor = parent,
                None => return false,
            }
        }
    }

    /// DOM-API insertion (`appendChild` equivalent). Records a mutation
    /// batch; activation waits for the batch to be processed.
    pub fn append_child(&self, parent: &Element, child: &Element) {
        self.attach(parent, child);
        self.queue_batch(vec![child.clone()]);
    }

    /// Parser insertion: markup parsed from a string attaches and fetches
    /// in the same step. Activation happens here, synchronously, before
    /// the mutation batch is observable.
    pub fn append_parsed(&self, parent: &Element, child: &Element) {
        self.attach(parent, child);
        self.activate_subtree(child);
        self.queue_batch(vec![child.clone()]);
    }

    /// Swaps `old` for `new` under `parent`. Returns false if `old` was
    /// not a child of `parent`.
    pub fn replace_child(&self, parent: &Element, old: &Element, new: &Element) -> bool {
        if let Some(existing) = new.parent() {
            existing.remove_child_node(new);
        }
        if !parent.replace_child_node(old, new.clone()) {
            return false;
        }
        old.set_parent(Weak::new());
        new.set_parent(Arc::downgrade(parent));
        self.queue_batch(vec![new.clone()]);
        true
    }

    pub fn remove_child(&self, parent: &Element, child: &Element) -> bool {
        let removed = parent.remove_child_node(child);
        if removed {
            child.set_parent(Weak::new());
        }
        removed
    }

    /// Drains the queued mutation batches, oldest first.
    pub fn take_mutations(&self) -> Vec<MutationBatch> {
        self.mutations.lock().unwrap().drain(..).collect()
    }

    pub fn pending_mutations(&self) -> usize {
        self.mutations.lock().unwrap().len()
    }

    /// Issues the network request for every connected, still-live resource
    /// under `root` that has not fetched yet.
    pub fn activate_subtree(&self, root: &Element) {
        for el in descendants_including_self(root) {
            self.activate_if_live(&el);
        }
    }

    /// A connected script with a live `src` and an executable type, or a
    /// connected iframe with a `src`, fetches exactly once.
    pub fn activate_if_live(&self, el: &Element) {
        if !self.is_connected(el) {
            return;
        }
        let src = match el.attr("src") {
            Some(s) if !s.is_empty() => s,
            _ => return,
        };
        let fetches = (el.is_script() && el.has_executable_type()) || el.is_iframe();
        if fetches && el.mark_activated() {
            self.network.record(&src);
        }
    }

    fn attach(&self, parent: &Element, child: &Element) {
        if let Some(existing) = child.parent() {
            existing.remove_child_node(child);
        }
        parent.push_child(child.clone());
        child.set_parent(Arc::downgrade(parent));
    }

    fn queue_batch(&self, added: Vec<Element>) {
        self.mutations
            .lock()
            .unwrap()
            .push_back(MutationBatch { added });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_child_defers_activation() {
        let doc = Document::new("example.com");
        let script = ElementNode::new("script");
        script.set_attr("src", "https://cdn.example.com/app.js");

        doc.append_child(doc.root(), &script);
        assert!(doc.network.is_empty());

        // Processing the batch (here: directly) triggers the fetch.
        for batch in doc.take_mutations() {
            for added in &batch.added {
                doc.activate_subtree(added);
            }
        }
        assert_eq!(doc.network.requests(), vec!["https://cdn.example.com/app.js"]);
    }

    #[test]
    fn test_append_parsed_activates_immediately() {
        let doc = Document::new("example.com");
        let script = ElementNode::new("script");
        script.set_attr("src", "https://cdn.example.com/app.js");

        doc.append_parsed(doc.root(), &script);
        assert_eq!(doc.network.len(), 1);
        // The batch is still observable afterwards.
        assert_eq!(doc.pending_mutations(), 1);
    }

    #[test]
    fn test_detached_script_never_fetches() {
        let doc = Document::new("example.com");
        let script = ElementNode::new("script");
        script.set_attr("src", "https://cdn.example.com/app.js");
        doc.activate_if_live(&script);
        assert!(doc.network.is_empty());
    }

    #[test]
    fn test_activation_is_once_only() {
        let doc = Document::new("example.com");
        let script = ElementNode::new("script");
        script.set_attr("src", "https://x.test/a.js");
        doc.append_parsed(doc.root(), &script);
        doc.activate_subtree(doc.root());
        assert_eq!(doc.network.len(), 1);
    }

    #[test]
    fn test_replace_child_detaches_old() {
        let doc = Document::new("example.com");
        let iframe = ElementNode::new("iframe");
        doc.append_child(doc.root(), &iframe);
        let placeholder = ElementNode::new("div");
        assert!(doc.replace_child(doc.root(), &iframe, &placeholder));
        assert!(!doc.is_connected(&iframe));
        assert!(doc.is_connected(&placeholder));
    }
}
