//! Route selection: filter the candidate set, then pick the most
//! specific match under a total order.
//!
//! The order, highest first:
//!
//! 1. domain specificity: exact > subdomain wildcard > any
//! 2. path specificity: exact > wildcard
//! 3. among wildcards, the longer prefix
//!
//! Remaining ties are broken toward the lexicographically smaller route
//! id so selection is reproducible. Configuration should prevent such
//! ties; the tie-break keeps behavior deterministic when it does not.

use gatekeeper_core::Route;
use tracing::debug;

/// Specificity key; bigger compares as more specific.
fn specificity(route: &Route) -> (u8, u8, usize) {
    let domain_rank = if route.domain == "*" {
        0
    } else if route.domain.starts_with("*.") {
        1
    } else {
        2
    };
    let (path_rank, prefix_len) = match route.pattern.strip_suffix("/*") {
        Some(prefix) => (0, prefix.len()),
        None => (1, route.pattern.len()),
    };
    (domain_rank, path_rank, prefix_len)
}

/// Select the best route for `(domain, path)` from a candidate set.
///
/// The candidate set may over-approximate (the repository is allowed to
/// return non-matching routes); both filters are re-applied here. An
/// absent domain is treated as the empty string, which only `*` routes
/// match.
#[must_use]
pub fn select_route<'a>(candidates: &'a [Route], domain: Option<&str>, path: &str) -> Option<&'a Route> {
    let domain = domain.unwrap_or("").to_ascii_lowercase();

    let selected = candidates
        .iter()
        .filter(|r| r.matches_path(path) && r.matches_domain(&domain))
        .max_by(|a, b| {
            specificity(a)
                .cmp(&specificity(b))
                .then_with(|| b.id.cmp(&a.id))
        });

    if let Some(route) = selected {
        debug!(
            route_id = %route.id,
            pattern = %route.pattern,
            route_domain = %route.domain,
            %domain,
            path,
            "route selected"
        );
    }

    selected
}
