//! In-app routing for notifications

use super::EventKind;

/// Route used when a notification carries nothing to route on
pub const DEFAULT_ROUTE: &str = "/";

/// Reconciliation list; the record number goes into `search`
pub const RECONCILIATION_ROUTE: &str = "/mutabakat";

/// Compute the route a notification leads to
///
/// Reconciliation kinds always route to the record search, even with no
/// reference id. Otherwise an explicit link wins, then the root.
pub fn route_for(kind: &EventKind, reference_id: Option<&str>, link: Option<&str>) -> String {
    if kind.is_reconciliation() {
        return format!("{}?search={}", RECONCILIATION_ROUTE, reference_id.unwrap_or(""));
    }

    match link {
        Some(link) if !link.is_empty() => link.to_string(),
        _ => DEFAULT_ROUTE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_kinds_use_reference_template() {
        for kind in [EventKind::Approved, EventKind::Rejected, EventKind::Sent] {
            assert_eq!(route_for(&kind, Some("X"), None), "/mutabakat?search=X");
        }
    }

    #[test]
    fn test_known_kind_without_reference_substitutes_empty() {
        assert_eq!(route_for(&EventKind::Sent, None, None), "/mutabakat?search=");
    }

    #[test]
    fn test_known_kind_ignores_link() {
        let route = route_for(&EventKind::Rejected, Some("42"), Some("/elsewhere"));
        assert_eq!(route, "/mutabakat?search=42");
    }

    #[test]
    fn test_unrelated_kind_uses_link_verbatim() {
        let kind = EventKind::Other("system".into());
        assert_eq!(
            route_for(&kind, Some("42"), Some("/audit?page=2#top")),
            "/audit?page=2#top"
        );
    }

    #[test]
    fn test_nothing_routes_to_root() {
        assert_eq!(route_for(&EventKind::Generic, None, None), "/");
        assert_eq!(route_for(&EventKind::Generic, None, Some("")), "/");
    }
}
