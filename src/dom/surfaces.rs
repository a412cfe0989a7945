use std::collections::VecDeque;
use std::sync::{Mutex, RwLock};
use std::time::SystemTime;

use rustc_hash::FxHashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    /// `None` is a host-only cookie; `Some` carries an explicit domain
    /// attribute (possibly with a leading dot).
    pub domain: Option<String>,
    pub expires: Option<SystemTime>,
}

/// The page's cookie store.
#[derive(Debug, Default)]
pub struct CookieJar {
    cookies: Mutex<Vec<Cookie>>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a cookie, replacing any existing one with the same name and
    /// domain attribute.
    pub fn set(&self, cookie: Cookie) {
        let mut cookies = self.cookies.lock().unwrap();
        cookies.retain(|c| !(c.name == cookie.name && c.domain == cookie.domain));
        cookies.push(cookie);
    }

    /// First unexpired cookie with this name, regardless of domain scope.
    pub fn get(&self, name: &str) -> Option<Cookie> {
        let now = SystemTime::now();
        self.cookies
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.name == name && c.expires.is_none_or(|exp| exp > now))
            .cloned()
    }

    pub fn remove(&self, name: &str, domain: Option<&str>) -> bool {
        let removed = self.remove_where(|c| c.name == name && c.domain.as_deref() == domain);
        removed > 0
    }

    /// Removes every cookie the predicate selects, returning the count.
    pub fn remove_where(&self, pred: impl Fn(&Cookie) -> bool) -> usize {
        let mut cookies = self.cookies.lock().unwrap();
        let before = cookies.len();
        cookies.retain(|c| !pred(c));
        before - cookies.len()
    }

    pub fn names(&self) -> Vec<String> {
        self.cookies
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.cookies.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Persistent key/value storage (localStorage-shaped).
#[derive(Debug, Default)]
pub struct StorageArea {
    items: RwLock<FxHashMap<String, String>>,
}

impl StorageArea {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.items.read().unwrap().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: &str) {
        self.items
            .write()
            .unwrap()
            .insert(key.to_owned(), value.to_owned());
    }

    pub fn remove(&self, key: &str) -> bool {
        self.items.write().unwrap().remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Append-only push log (the external `dataLayer` convention). Entries are
/// never mutated or removed once pushed.
#[derive(Debug, Default)]
pub struct DataLayer {
    entries: Mutex<Vec<serde_json::Value>>,
}

impl DataLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: serde_json::Value) {
        self.entries.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<serde_json::Value> {
        self.entries.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Every resource fetch the modeled browser issued. A URL showing up here
/// means the real browser would have hit the network.
#[derive(Debug, Default)]
pub struct NetworkLog {
    requests: Mutex<VecDeque<String>>,
}

impl NetworkLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, url: &str) {
        self.requests.lock().unwrap().push_back(url.to_owned());
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().iter().cloned().collect()
    }

    pub fn contains(&self, url_fragment: &str) -> bool {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.contains(url_fragment))
    }

    pub fn len(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
