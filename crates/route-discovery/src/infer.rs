//! Component-to-route inference ladder
//!
//! Maps a component name to an already-discovered route: exact substring
//! first, then category vocabulary clusters. Falling through is a valid
//! outcome; exploration continues on the current page.

use changescout_core_types::tokenize;
use context_store::DiscoveredRoute;
use tracing::debug;

/// Vocabulary clusters: a component whose name shares a cluster with a
/// route's name/url is assumed to live on that route.
const CATEGORY_CLUSTERS: &[&[&str]] = &[
    // Reporting vocabulary; charts and tables live on report pages.
    &["report", "reports", "test-run", "testrun", "chart", "table", "graph", "summary"],
    &["setting", "settings", "config", "preference", "profile", "account"],
    &["login", "logout", "signin", "signup", "auth", "session"],
    &["billing", "invoice", "payment", "checkout", "subscription"],
];

/// Resolve a component name to a known route, or `None` when nothing
/// matches (not an error).
pub fn infer_route(component: &str, routes: &[DiscoveredRoute]) -> Option<DiscoveredRoute> {
    let component_lower = component.to_lowercase();

    // Tier 1: direct substring between component and route name/url.
    for route in routes {
        let name = route.name.to_lowercase();
        let url = route.url.to_lowercase();
        if name.contains(&component_lower)
            || component_lower.contains(&name)
            || url.contains(&component_lower)
        {
            return Some(route.clone());
        }
    }

    // Tier 2: shared category vocabulary.
    let component_tokens = tokenize(component);
    for cluster in CATEGORY_CLUSTERS {
        let component_in_cluster = component_tokens
            .iter()
            .any(|token| cluster.contains(&token.as_str()));
        if !component_in_cluster {
            continue;
        }
        for route in routes {
            let haystack = format!("{} {}", route.name, route.url).to_lowercase();
            if cluster.iter().any(|term| haystack.contains(term)) {
                debug!(component, route = %route.name, "matched route via category cluster");
                return Some(route.clone());
            }
        }
    }

    debug!(component, "no route inferred");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use context_store::DiscoveryMethod;

    fn routes() -> Vec<DiscoveredRoute> {
        vec![
            DiscoveredRoute::new("Test Runs", "/test-runs", DiscoveryMethod::Manual),
            DiscoveredRoute::new("Settings", "/settings", DiscoveryMethod::Manual),
        ]
    }

    #[test]
    fn exact_substring_wins() {
        let found = infer_route("settings", &routes()).unwrap();
        assert_eq!(found.url, "/settings");
    }

    #[test]
    fn chart_component_clusters_with_reporting_routes() {
        let found = infer_route("ResultsChart", &routes()).unwrap();
        assert_eq!(found.url, "/test-runs");
    }

    #[test]
    fn unmatched_component_is_a_valid_miss() {
        assert!(infer_route("AvatarUploader", &routes()).is_none());
    }
}
