//! URL templates for the admin REST API
//!
//! A static mapping of logical resource names to collection URLs, plus a
//! helper for id-suffixed item URLs. Plain data, no behavior.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Property listings
pub const LISTINGS: &str = "/listings";
/// Geographic locations
pub const LOCATIONS: &str = "/locations";
/// Zones within a location
pub const ZONES: &str = "/zones";
/// Property type catalog
pub const PROPERTY_TYPES: &str = "/property-types";
/// Console users
pub const USERS: &str = "/users";
/// Access roles
pub const ROLES: &str = "/roles";
/// Navigation menus
pub const MENUS: &str = "/menus";
/// Translatable language variables
pub const LANGUAGE_VARIABLES: &str = "/language-variables";
/// CMS content pages
pub const CONTENT_PAGES: &str = "/content-pages";
/// Audit log entries
pub const AUDIT_LOGS: &str = "/audit-logs";
/// Session refresh endpoint
pub const AUTH_REFRESH: &str = "/auth/refresh";
/// Sign-in endpoint
pub const AUTH_SIGN_IN: &str = "/auth/sign-in";

/// Logical resource name → collection URL
pub static RESOURCES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("listings", LISTINGS),
        ("locations", LOCATIONS),
        ("zones", ZONES),
        ("property_types", PROPERTY_TYPES),
        ("users", USERS),
        ("roles", ROLES),
        ("menus", MENUS),
        ("language_variables", LANGUAGE_VARIABLES),
        ("content_pages", CONTENT_PAGES),
        ("audit_logs", AUDIT_LOGS),
    ])
});

/// Look up a collection URL by logical resource name
pub fn resource(name: &str) -> Option<&'static str> {
    RESOURCES.get(name).copied()
}

/// Item URL for a collection, e.g. `item(LISTINGS, 42)` → `/listings/42`
pub fn item(collection: &str, id: impl std::fmt::Display) -> String {
    format!("{}/{id}", collection.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_lookup() {
        assert_eq!(resource("listings"), Some("/listings"));
        assert_eq!(resource("audit_logs"), Some("/audit-logs"));
        assert_eq!(resource("unknown"), None);
    }

    #[test]
    fn test_item_url() {
        assert_eq!(item(LISTINGS, 42), "/listings/42");
        assert_eq!(item("/users/", "abc"), "/users/abc");
    }

    #[test]
    fn test_registry_covers_every_collection() {
        assert_eq!(RESOURCES.len(), 10);
        for url in RESOURCES.values() {
            assert!(url.starts_with('/'));
        }
    }
}
