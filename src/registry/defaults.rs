use super::types::{Category, ServiceDefinition};

/// Built-in tracker table, available synchronously so the page is
/// protected before (and regardless of) any remote refresh.
pub fn builtin_services() -> Vec<ServiceDefinition> {
    use Category::*;
    [
        // Analytics
        ("google-analytics", Analytics, "google-analytics.com"),
        ("google-tag-manager", Analytics, "googletagmanager.com"),
        ("hotjar", Analytics, "hotjar.com"),
        ("matomo", Analytics, "matomo"),
        ("mixpanel", Analytics, "cdn.mxpnl.com"),
        ("plausible", Analytics, "plausible.io/js"),
        // Marketing
        ("facebook-pixel", Marketing, "connect.facebook.net"),
        ("linkedin-insight", Marketing, "snap.licdn.com"),
        ("twitter-pixel", Marketing, "static.ads-twitter.com"),
        ("tiktok-pixel", Marketing, "analytics.tiktok.com"),
        ("hubspot", Marketing, "js.hs-scripts.com"),
        ("youtube-embed", Marketing, "youtube.com/embed"),
        // Ads
        ("google-ads", Ads, "googleadservices.com"),
        ("doubleclick", Ads, "doubleclick.net"),
        ("adsense", Ads, "pagead2.googlesyndication.com"),
        ("criteo", Ads, "static.criteo.net"),
        // Functional
        ("google-maps", Functional, "google.com/maps/embed"),
        ("vimeo-embed", Functional, "player.vimeo.com"),
        ("intercom", Functional, "widget.intercom.io"),
        ("zendesk", Functional, "zdassets.com"),
    ]
    .into_iter()
    .map(|(id, category, pattern)| ServiceDefinition::new(id, category, pattern))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::types::{ServiceList, ServiceMatcher};

    #[test]
    fn test_builtin_table_is_well_formed() {
        let list = ServiceList::new(builtin_services());
        // ServiceList would have dropped duplicates; the table must not rely on that.
        assert_eq!(list.len(), builtin_services().len());
        assert!(list
            .iter()
            .all(|s| !s.id.is_empty() && !s.pattern.is_empty()));
    }

    #[test]
    fn test_builtin_matches_common_trackers() {
        let list = ServiceList::new(builtin_services());
        let ga = list
            .match_url("https://www.google-analytics.com/analytics.js")
            .unwrap();
        assert_eq!(ga.category, Category::Analytics);

        let fb = list
            .match_url("https://connect.facebook.net/en_US/fbevents.js")
            .unwrap();
        assert_eq!(fb.category, Category::Marketing);
    }
}
