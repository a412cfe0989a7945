use serde::{Deserialize, Serialize};
use tracing::warn;

/// Consent bucket a service belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Necessary,
    Functional,
    Analytics,
    Marketing,
    Ads,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Necessary,
        Category::Functional,
        Category::Analytics,
        Category::Marketing,
        Category::Ads,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Necessary => "necessary",
            Category::Functional => "functional",
            Category::Analytics => "analytics",
            Category::Marketing => "marketing",
            Category::Ads => "ads",
        }
    }
}

/// One known tracker: an id, the category gating it, and a substring
/// pattern tested against resource URLs. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceDefinition {
    pub id: String,
    pub category: Category,
    pub pattern: String,
}

impl ServiceDefinition {
    pub fn new(id: &str, category: Category, pattern: &str) -> Self {
        Self {
            id: id.to_owned(),
            category,
            pattern: pattern.to_owned(),
        }
    }

    pub fn matches(&self, url: &str) -> bool {
        !self.pattern.is_empty() && url.contains(&self.pattern)
    }
}

/// The "hot path" check: which service, if any, does this URL belong to.
pub trait ServiceMatcher: Send + Sync {
    /// First matching definition in registration order, or None.
    fn match_url(&self, url: &str) -> Option<&ServiceDefinition>;
}

/// Registration-ordered service set. Iteration order is the registration
/// order, which makes first-hit matching deterministic when several
/// patterns could match the same URL.
#[derive(Debug, Default)]
pub struct ServiceList {
    services: Vec<ServiceDefinition>,
}

impl ServiceList {
    /// Builds a list, keeping the first occurrence of each id and dropping
    /// later duplicates.
    pub fn new(definitions: Vec<ServiceDefinition>) -> Self {
        let mut services: Vec<ServiceDefinition> = Vec::with_capacity(definitions.len());
        for def in definitions {
            if services.iter().any(|s| s.id == def.id) {
                warn!("Duplicate service id '{}' dropped from registry", def.id);
                continue;
            }
            services.push(def);
        }
        Self { services }
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceDefinition> {
        self.services.iter()
    }
}

impl ServiceMatcher for ServiceList {
    fn match_url(&self, url: &str) -> Option<&ServiceDefinition> {
        self.services.iter().find(|s| s.matches(url))
    }
}
