use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Shared handle to a node. The ledger only ever holds `Weak` copies of
/// this, so a blocked node removed from the tree stays reclaimable.
pub type Element = Arc<ElementNode>;

#[derive(Debug)]
pub struct ElementNode {
    id: u64,
    tag: Box<str>,
    attrs: RwLock<FxHashMap<Box<str>, String>>,
    text: RwLock<String>,
    parent: RwLock<Weak<ElementNode>>,
    children: RwLock<Vec<Element>>,
    // Set once the (modeled) browser has issued the network request for
    // this node, so re-processing a batch never double-fetches.
    activated: AtomicBool,
}

impl ElementNode {
    pub fn new(tag: &str) -> Element {
        Arc::new(Self {
            id: NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed),
            tag: tag.to_ascii_lowercase().into_boxed_str(),
            attrs: RwLock::new(FxHashMap::default()),
            text: RwLock::new(String::new()),
            parent: RwLock::new(Weak::new()),
            children: RwLock::new(Vec::new()),
            activated: AtomicBool::new(false),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn is_script(&self) -> bool {
        &*self.tag == "script"
    }

    pub fn is_iframe(&self) -> bool {
        &*self.tag == "iframe"
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        self.attrs.read().unwrap().get(name).cloned()
    }

    pub fn set_attr(&self, name: &str, value: &str) {
        self.attrs
            .write()
            .unwrap()
            .insert(name.to_owned().into_boxed_str(), value.to_owned());
    }

    pub fn remove_attr(&self, name: &str) -> Option<String> {
        self.attrs.write().unwrap().remove(name)
    }

    pub fn text(&self) -> String {
        self.text.read().unwrap().clone()
    }

    pub fn set_text(&self, text: &str) {
        *self.text.write().unwrap() = text.to_owned();
    }

    pub fn parent(&self) -> Option<Element> {
        self.parent.read().unwrap().upgrade()
    }

    pub fn children(&self) -> Vec<Element> {
        self.children.read().unwrap().clone()
    }

    /// A script is executable unless its `type` was replaced with a
    /// non-executable marker (or some other non-JS type).
    pub fn has_executable_type(&self) -> bool {
        match self.attr("type") {
            None => true,
            Some(t) => {
                let t = t.trim().to_ascii_lowercase();
                t.is_empty() || t == "text/javascript" || t == "application/javascript" || t == "module"
            }
        }
    }

    pub(crate) fn mark_activated(&self) -> bool {
        !self.activated.swap(true, Ordering::Relaxed)
    }

    pub(crate) fn set_parent(&self, parent: Weak<ElementNode>) {
        *self.parent.write().unwrap() = parent;
    }

    pub(crate) fn push_child(&self, child: Element) {
        self.children.write().unwrap().push(child);
    }

    pub(crate) fn remove_child_node(&self, child: &Element) -> bool {
        let mut children = self.children.write().unwrap();
        match children.iter().position(|c| Arc::ptr_eq(c, child)) {
            Some(idx) => {
                children.remove(idx);
                true
            }
            None => false,
        }
    }

    pub(crate) fn replace_child_node(&self, old: &Element, new: Element) -> bool {
        let mut children = self.children.write().unwrap();
        match children.iter().position(|c| Arc::ptr_eq(c, old)) {
            Some(idx) => {
                children[idx] = new;
                true
            }
            None => false,
        }
    }
}

/// Depth-first walk of `root` and everything under it, in document order.
pub(crate) fn descendants_including_self(root: &Element) -> Vec<Element> {
    let mut out = Vec::new();
    let mut stack = vec![root.clone()];
    while let Some(el) = stack.pop() {
        let children = el.children();
        out.push(el);
        for child in children.into_iter().rev() {
            stack.push(child);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executable_type_detection() {
        let el = ElementNode::new("script");
        assert!(el.has_executable_type());

        el.set_attr("type", "module");
        assert!(el.has_executable_type());

        el.set_attr("type", "text/plain");
        assert!(!el.has_executable_type());
    }

    #[test]
    fn test_subtree_walk_covers_nested_nodes() {
        let root = ElementNode::new("div");
        let mid = ElementNode::new("div");
        let leaf = ElementNode::new("script");
        mid.push_child(leaf.clone());
        root.push_child(mid.clone());

        let all = descendants_including_self(&root);
        assert_eq!(all.len(), 3);
        assert!(all.iter().any(|e| e.id() == leaf.id()));
    }
}
