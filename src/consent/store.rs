use super::decision::ConsentDecision;
use crate::config::StorageConfig;
use crate::dom::{Cookie, Document};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Persists the current decision as a long-lived cookie so repeat visits
/// do not re-prompt.
pub struct ConsentStore {
    document: Arc<Document>,
    cookie_name: String,
    expiry: Duration,
}

impl ConsentStore {
    pub fn new(document: Arc<Document>, config: &StorageConfig) -> Self {
        Self {
            document,
            cookie_name: config.cookie_name.clone(),
            expiry: Duration::from_secs(config.expiry_days * 24 * 60 * 60),
        }
    }

    /// The persisted decision, or None when there is none or the payload
    /// is unreadable. A malformed payload is discarded with a warning;
    /// initialization must never fail on it.
    pub fn load(&self) -> Option<ConsentDecision> {
        let cookie = self.document.cookies.get(&self.cookie_name)?;
        match serde_json::from_str::<ConsentDecision>(&cookie.value) {
            Ok(decision) => {
                debug!("Loaded persisted consent decision");
                Some(decision)
            }
            Err(e) => {
                warn!("Discarding malformed persisted consent decision: {}", e);
                None
            }
        }
    }

    pub fn save(&self, decision: &ConsentDecision) {
        let value = match serde_json::to_string(decision) {
            Ok(v) => v,
            Err(e) => {
                warn!("Failed to serialize consent decision: {}", e);
                return;
            }
        };
        self.document.cookies.set(Cookie {
            name: self.cookie_name.clone(),
            value,
            domain: None,
            expires: Some(SystemTime::now() + self.expiry),
        });
    }

    /// Removes the persisted decision. By convention the caller reloads
    /// the page afterwards: consent signals already picked up by running
    /// third-party code cannot be rolled back in place.
    pub fn clear(&self) {
        self.document.cookies.remove(&self.cookie_name, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Category;

    fn store() -> (Arc<Document>, ConsentStore) {
        let doc = Document::new("example.com");
        let store = ConsentStore::new(doc.clone(), &StorageConfig::default());
        (doc, store)
    }

    #[test]
    fn test_round_trip() {
        let (_doc, store) = store();
        let decision = ConsentDecision::default()
            .grant(Category::Analytics)
            .accepted()
            .stamped_now();
        store.save(&decision);
        assert_eq!(store.load(), Some(decision));
    }

    #[test]
    fn test_malformed_payload_loads_as_none() {
        let (doc, store) = store();
        doc.cookies.set(Cookie {
            name: StorageConfig::default().cookie_name,
            value: "{not valid json".into(),
            domain: None,
            expires: None,
        });
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_clear_removes_cookie() {
        let (doc, store) = store();
        store.save(&ConsentDecision::default().accepted());
        store.clear();
        assert!(doc.cookies.is_empty());
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_save_sets_long_expiry() {
        let (doc, store) = store();
        store.save(&ConsentDecision::default().accepted());
        let cookie = doc.cookies.get(&StorageConfig::default().cookie_name).unwrap();
        let expires = cookie.expires.expect("consent cookie must carry an expiry");
        let min = SystemTime::now() + Duration::from_secs(300 * 24 * 60 * 60);
        assert!(expires > min, "expiry should be on the order of a year");
    }
}
