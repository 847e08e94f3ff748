use std::collections::HashSet;
use std::env;

use tracing::debug;
use url::Url;

use crate::models::plan::Activity;

/// Partner tracking parameters for a booking domain. Ids come from the
/// environment at call time so operators can enable partners without a
/// restart; unset ids are skipped.
fn partner_params(domain: &str) -> Option<Vec<(&'static str, String)>> {
    let partners: [(&str, Vec<(&'static str, String)>); 5] = [
        (
            "viator.com",
            vec![
                ("aid", env::var("VIATOR_AFFILIATE_ID").unwrap_or_default()),
                ("mcid", "cruise-planner-app".to_string()),
            ],
        ),
        (
            "getyourguide.com",
            vec![
                (
                    "partner_id",
                    env::var("GETYOURGUIDE_AFFILIATE_ID").unwrap_or_default(),
                ),
                ("utm_source", "cruise-planner".to_string()),
                ("utm_medium", "affiliate".to_string()),
            ],
        ),
        (
            "klook.com",
            vec![
                (
                    "affiliate_id",
                    env::var("KLOOK_AFFILIATE_ID").unwrap_or_default(),
                ),
                ("source", "cruise-planner".to_string()),
            ],
        ),
        (
            "tripadvisor.com",
            vec![
                ("pid", env::var("TRIPADVISOR_AFFILIATE_ID").unwrap_or_default()),
                ("source", "cruise-planner".to_string()),
            ],
        ),
        (
            "booking.com",
            vec![
                ("aid", env::var("BOOKING_AFFILIATE_ID").unwrap_or_default()),
                ("label", "cruise-planner-booking".to_string()),
            ],
        ),
    ];

    partners.into_iter().find_map(|(partner, params)| {
        let matches = domain == partner || domain.ends_with(&format!(".{partner}"));
        matches.then_some(params)
    })
}

fn domain_of(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

/// Appends partner tracking parameters when the URL belongs to a supported
/// booking platform. Existing query parameters are never overridden, and
/// anything unparseable passes through untouched.
pub fn add_affiliate_params(booking_url: &str) -> String {
    let Ok(mut url) = Url::parse(booking_url) else {
        return booking_url.to_string();
    };
    let Some(domain) = domain_of(&url) else {
        return booking_url.to_string();
    };
    let Some(params) = partner_params(&domain) else {
        return booking_url.to_string();
    };

    let active: Vec<(&str, String)> = params
        .into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .collect();
    if active.is_empty() {
        return booking_url.to_string();
    }

    let existing: HashSet<String> = url
        .query_pairs()
        .map(|(key, _)| key.into_owned())
        .collect();
    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in active {
            if !existing.contains(key) {
                pairs.append_pair(key, &value);
            }
        }
    }
    debug!(%domain, "added affiliate params to booking url");
    url.to_string()
}

/// Rewrites every activity's booking link in place.
pub fn rewrite_booking_urls(activities: &mut [Activity]) {
    for activity in activities.iter_mut() {
        if let Some(booking_url) = activity.booking_url.take() {
            activity.booking_url = Some(add_affiliate_params(&booking_url));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Affiliate ids are read from process environment; every test that sets
    // one uses the same value to stay safe under the parallel test runner.
    const VIATOR_ID: &str = "test-viator-123";

    #[test]
    fn viator_url_gains_tracking_params() {
        env::set_var("VIATOR_AFFILIATE_ID", VIATOR_ID);
        let url = "https://www.viator.com/tours/Rome/Colosseum-Tour/d511-12345";
        let result = add_affiliate_params(url);
        assert!(result.contains("aid=test-viator-123"));
        assert!(result.contains("mcid=cruise-planner-app"));
    }

    #[test]
    fn bare_partner_domain_matches_too() {
        env::set_var("VIATOR_AFFILIATE_ID", VIATOR_ID);
        let result = add_affiliate_params("https://viator.com/tour/123");
        assert!(result.contains("aid=test-viator-123"));
    }

    #[test]
    fn existing_params_are_preserved_and_never_overridden() {
        env::set_var("VIATOR_AFFILIATE_ID", VIATOR_ID);
        let url = "https://www.viator.com/tours/Rome/tour/123?currency=USD&aid=theirs";
        let result = add_affiliate_params(url);
        assert!(result.contains("currency=USD"));
        assert!(result.contains("aid=theirs"));
        assert!(!result.contains("aid=test-viator-123"));
    }

    #[test]
    fn unknown_domains_pass_through_unchanged() {
        let url = "https://example.com/some/path";
        assert_eq!(add_affiliate_params(url), url);
    }

    #[test]
    fn lookalike_domains_do_not_match() {
        let fake = "https://www.notviator.com/fake/tour";
        assert_eq!(add_affiliate_params(fake), fake);
        let nested = "https://www.klook.com.fake.com/activity/123";
        assert_eq!(add_affiliate_params(nested), nested);
    }

    #[test]
    fn malformed_urls_pass_through_unchanged() {
        assert_eq!(add_affiliate_params("not-a-url"), "not-a-url");
        assert_eq!(add_affiliate_params(""), "");
    }

    #[test]
    fn static_params_apply_even_without_an_id() {
        // klook has a static `source` param alongside the env-driven id;
        // with the id unset the static one still applies.
        env::remove_var("KLOOK_AFFILIATE_ID");
        let result = add_affiliate_params("https://www.klook.com/activity/12345");
        assert!(result.contains("source=cruise-planner"));
        assert!(!result.contains("affiliate_id="));
    }
}
