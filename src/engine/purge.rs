use crate::config::PurgeConfig;
use crate::consent::ConsentDecision;
use crate::dom::Document;
use crate::registry::Category;
use tracing::debug;

/// How a cookie name is selected: an exact first-party tracker name, or a
/// vendor prefix family (e.g. `_ga_` covers per-property session cookies).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieRule {
    Exact(String),
    Prefix(String),
}

impl CookieRule {
    fn matches(&self, name: &str) -> bool {
        match self {
            CookieRule::Exact(n) => name == n,
            CookieRule::Prefix(p) => name.starts_with(p.as_str()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PurgeRule {
    pub category: Category,
    pub cookies: Vec<CookieRule>,
    pub storage_keys: Vec<String>,
}

/// Well-known tracker cookie names and storage keys, per category.
pub fn default_purge_rules() -> Vec<PurgeRule> {
    fn exact(n: &str) -> CookieRule {
        CookieRule::Exact(n.to_owned())
    }
    fn prefix(p: &str) -> CookieRule {
        CookieRule::Prefix(p.to_owned())
    }

    vec![
        PurgeRule {
            category: Category::Analytics,
            cookies: vec![
                exact("_ga"),
                prefix("_ga_"),
                exact("_gid"),
                prefix("_gat"),
                prefix("_hj"),
                prefix("_pk_"),
                exact("mp_mixpanel"),
            ],
            storage_keys: vec!["_hjSession".into(), "matomo_sessid".into()],
        },
        PurgeRule {
            category: Category::Marketing,
            cookies: vec![
                exact("_fbp"),
                exact("_fbc"),
                exact("fr"),
                prefix("_ttp"),
                exact("li_sugr"),
                prefix("hubspotutk"),
            ],
            storage_keys: vec!["_fbp_meta".into()],
        },
        PurgeRule {
            category: Category::Ads,
            cookies: vec![
                exact("IDE"),
                exact("test_cookie"),
                exact("_gcl_au"),
                prefix("_gcl_"),
                prefix("cto_"),
            ],
            storage_keys: vec![],
        },
        PurgeRule {
            category: Category::Functional,
            cookies: vec![prefix("intercom-"), exact("__zlcmid")],
            storage_keys: vec!["intercom.intercom-state".into()],
        },
    ]
}

/// Deletes tracker cookies and storage keys for denied categories.
pub struct CookiePurger {
    rules: Vec<PurgeRule>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PurgeOutcome {
    pub cookies_removed: usize,
    pub storage_keys_removed: usize,
}

impl CookiePurger {
    /// Built-in rules plus any site-specific additions from config.
    pub fn new(config: &PurgeConfig) -> Self {
        let mut rules = default_purge_rules();
        for extra in &config.extra {
            rules.push(PurgeRule {
                category: extra.category,
                cookies: extra
                    .cookies
                    .iter()
                    .map(|n| CookieRule::Exact(n.clone()))
                    .chain(
                        extra
                            .cookie_prefixes
                            .iter()
                            .map(|p| CookieRule::Prefix(p.clone())),
                    )
                    .collect(),
                storage_keys: extra.storage_keys.clone(),
            });
        }
        Self { rules }
    }

    /// Runs the purge for every category the decision denies. Cookies are
    /// matched under all the scoping variants trackers use: host-only, the
    /// bare hostname, the dotted hostname, and the dotted second-level
    /// domain.
    pub fn purge_denied(&self, document: &Document, decision: &ConsentDecision) -> PurgeOutcome {
        let variants = domain_variants(document.hostname());
        let mut outcome = PurgeOutcome::default();

        for rule in &self.rules {
            if decision.granted(rule.category) {
                continue;
            }
            for cookie_rule in &rule.cookies {
                let removed = document.cookies.remove_where(|c| {
                    cookie_rule.matches(&c.name)
                        && match &c.domain {
                            None => true,
                            Some(d) => variants.iter().any(|v| v == d),
                        }
                });
                outcome.cookies_removed += removed;
            }
            for key in &rule.storage_keys {
                if document.storage.remove(key) {
                    outcome.storage_keys_removed += 1;
                }
            }
        }

        if outcome.cookies_removed > 0 || outcome.storage_keys_removed > 0 {
            debug!(
                cookies = outcome.cookies_removed,
                storage_keys = outcome.storage_keys_removed,
                "purged denied-category state"
            );
        }
        outcome
    }
}

/// Cookie domain attributes a tracker may have scoped to: the bare host,
/// the dotted host, and the dotted second-level domain. The sld is the
/// naive last two labels; multi-label public suffixes are not special-cased.
fn domain_variants(hostname: &str) -> Vec<String> {
    let mut variants = vec![hostname.to_owned(), format!(".{hostname}")];
    let labels: Vec<&str> = hostname.split('.').collect();
    if labels.len() > 2 {
        let sld = labels[labels.len() - 2..].join(".");
        variants.push(format!(".{sld}"));
    }
    variants.dedup();
    variants
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Cookie;

    fn cookie(name: &str, domain: Option<&str>) -> Cookie {
        Cookie {
            name: name.into(),
            value: "v".into(),
            domain: domain.map(str::to_owned),
            expires: None,
        }
    }

    #[test]
    fn test_domain_variants() {
        assert_eq!(
            domain_variants("www.shop.example.com"),
            vec![
                "www.shop.example.com".to_string(),
                ".www.shop.example.com".to_string(),
                ".example.com".to_string()
            ]
        );
        assert_eq!(
            domain_variants("example.com"),
            vec!["example.com".to_string(), ".example.com".to_string()]
        );
    }

    #[test]
    fn test_denied_category_cookies_are_purged_across_variants() {
        let doc = Document::new("www.example.com");
        doc.cookies.set(cookie("_ga", None));
        doc.cookies.set(cookie("_ga_ABC123", Some(".example.com")));
        doc.cookies.set(cookie("_gid", Some(".www.example.com")));
        doc.cookies.set(cookie("session", None));

        let purger = CookiePurger::new(&PurgeConfig::default());
        let outcome = purger.purge_denied(&doc, &ConsentDecision::default());

        assert_eq!(outcome.cookies_removed, 3);
        assert_eq!(doc.cookies.names(), vec!["session".to_string()]);
    }

    #[test]
    fn test_granted_category_cookies_survive() {
        let doc = Document::new("example.com");
        doc.cookies.set(cookie("_ga", None));
        doc.cookies.set(cookie("_fbp", None));

        let purger = CookiePurger::new(&PurgeConfig::default());
        let decision = ConsentDecision::default().grant(Category::Analytics).accepted();
        purger.purge_denied(&doc, &decision);

        assert!(doc.cookies.get("_ga").is_some());
        assert!(doc.cookies.get("_fbp").is_none());
    }

    #[test]
    fn test_storage_keys_for_denied_categories_removed() {
        let doc = Document::new("example.com");
        doc.storage.set("_hjSession", "x");
        doc.storage.set("app_prefs", "y");

        let purger = CookiePurger::new(&PurgeConfig::default());
        let outcome = purger.purge_denied(&doc, &ConsentDecision::default());

        assert_eq!(outcome.storage_keys_removed, 1);
        assert!(doc.storage.get("app_prefs").is_some());
    }

    #[test]
    fn test_extra_rules_from_config() {
        let config: PurgeConfig = toml::from_str(
            r#"
            [[extra]]
            category = "marketing"
            cookies = ["_shop_mk"]
            cookie_prefixes = ["_shop_camp_"]
            "#,
        )
        .unwrap();

        let doc = Document::new("example.com");
        doc.cookies.set(cookie("_shop_mk", None));
        doc.cookies.set(cookie("_shop_camp_42", None));

        let purger = CookiePurger::new(&config);
        let outcome = purger.purge_denied(&doc, &ConsentDecision::default());
        assert_eq!(outcome.cookies_removed, 2);
    }

    #[test]
    fn test_purge_is_idempotent() {
        let doc = Document::new("example.com");
        doc.cookies.set(cookie("_ga", None));
        let purger = CookiePurger::new(&PurgeConfig::default());

        let first = purger.purge_denied(&doc, &ConsentDecision::default());
        let second = purger.purge_denied(&doc, &ConsentDecision::default());
        assert_eq!(first.cookies_removed, 1);
        assert_eq!(second, PurgeOutcome::default());
    }
}
