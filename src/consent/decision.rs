use crate::registry::Category;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// The visitor's per-category choice. This is also the persisted wire
/// shape: `{ <category>: bool..., accepted: bool, timestamp: number }`.
/// Missing categories deserialize to `false` (deny by default).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentDecision {
    #[serde(default)]
    pub necessary: bool,
    #[serde(default)]
    pub functional: bool,
    #[serde(default)]
    pub analytics: bool,
    #[serde(default)]
    pub marketing: bool,
    #[serde(default)]
    pub ads: bool,
    #[serde(default)]
    pub accepted: bool,
    #[serde(default)]
    pub timestamp: u64,
}

impl Default for ConsentDecision {
    /// The first-visit state: nothing granted, nothing accepted.
    fn default() -> Self {
        Self {
            necessary: false,
            functional: false,
            analytics: false,
            marketing: false,
            ads: false,
            accepted: false,
            timestamp: 0,
        }
    }
}

impl ConsentDecision {
    /// `necessary` is a non-optional baseline and reads as granted even
    /// when the visitor never ticked it.
    pub fn granted(&self, category: Category) -> bool {
        match category {
            Category::Necessary => true,
            Category::Functional => self.functional,
            Category::Analytics => self.analytics,
            Category::Marketing => self.marketing,
            Category::Ads => self.ads,
        }
    }

    pub fn grant(mut self, category: Category) -> Self {
        match category {
            Category::Necessary => self.necessary = true,
            Category::Functional => self.functional = true,
            Category::Analytics => self.analytics = true,
            Category::Marketing => self.marketing = true,
            Category::Ads => self.ads = true,
        }
        self
    }

    pub fn accepted(mut self) -> Self {
        self.accepted = true;
        self
    }

    pub fn stamped_now(mut self) -> Self {
        self.timestamp = unix_timestamp();
        self
    }
}

pub(crate) fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// The single current decision. Replaced wholesale on every apply
/// (last write wins, no merge).
#[derive(Debug, Default)]
pub struct ConsentState {
    current: RwLock<ConsentDecision>,
}

impl ConsentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> ConsentDecision {
        self.current.read().unwrap().clone()
    }

    pub fn is_granted(&self, category: Category) -> bool {
        self.current.read().unwrap().granted(category)
    }

    pub fn replace(&self, decision: ConsentDecision) {
        *self.current.write().unwrap() = decision;
    }
}
