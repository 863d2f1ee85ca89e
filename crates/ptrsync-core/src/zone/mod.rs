//! Zone name resolution
//!
//! Turns a human-given zone name into the provider's zone identifier.
//! `example.com` and `example.com.` name the same zone; everything else is
//! compared exactly.

use crate::error::{Error, Result};
use crate::traits::ZoneProvider;
use tracing::debug;

/// Strip exactly one trailing dot
pub fn normalize_zone_name(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

/// Compare two zone names, ignoring a single trailing dot on either side
pub fn same_zone_name(a: &str, b: &str) -> bool {
    normalize_zone_name(a) == normalize_zone_name(b)
}

/// Resolves zone names to provider zone IDs
///
/// No retries and no caching: every call is one provider round-trip.
#[derive(Clone, Copy)]
pub struct ZoneResolver<'a> {
    provider: &'a dyn ZoneProvider,
}

impl<'a> ZoneResolver<'a> {
    pub fn new(provider: &'a dyn ZoneProvider) -> Self {
        Self { provider }
    }

    /// Resolve `zone_name` to its zone ID
    ///
    /// # Errors
    ///
    /// - [`Error::ZoneNotFound`] if the provider fails or reports no zone
    /// - [`Error::ZoneNameMismatch`] if the provider's closest match is a
    ///   different zone
    pub async fn resolve(&self, zone_name: &str) -> Result<String> {
        debug!("Resolving hosted zone {}", zone_name);

        let zones = self
            .provider
            .list_zones_by_name(zone_name, 1)
            .await
            .map_err(|e| Error::zone_not_found(zone_name, e.to_string()))?;

        let zone = zones
            .into_iter()
            .next()
            .ok_or_else(|| Error::zone_not_found(zone_name, "provider returned no zones"))?;

        if !same_zone_name(zone_name, &zone.name) {
            return Err(Error::ZoneNameMismatch {
                expected: zone_name.to_string(),
                actual: zone.name,
            });
        }

        debug!("Hosted zone {} resolved to {}", zone_name, zone.id);
        Ok(zone.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MemoryZoneProvider;

    #[test]
    fn test_same_zone_name() {
        let cases = [
            ("example.com", "example.com", true),
            ("example.com", "example.com.", true),
            ("example.com.", "example.com", true),
            ("example.com.", "example.com.", true),
            ("hoge.example.com", "example.com", false),
            ("hoge.example.com", "hoge1example.com", false),
            ("Example.com", "example.com", false),
            ("example.com..", "example.com", false),
        ];

        for (idx, (a, b, expected)) in cases.iter().enumerate() {
            assert_eq!(same_zone_name(a, b), *expected, "case {idx}: {a} vs {b}");
        }
    }

    #[tokio::test]
    async fn test_resolve_with_and_without_trailing_dot() {
        let provider = MemoryZoneProvider::new();
        provider.add_zone("XYZ789", "example.com.").await;
        let resolver = ZoneResolver::new(&provider);

        assert_eq!(resolver.resolve("example.com").await.unwrap(), "XYZ789");
        assert_eq!(resolver.resolve("example.com.").await.unwrap(), "XYZ789");
    }

    #[tokio::test]
    async fn test_resolve_closest_match_is_rejected() {
        let provider = MemoryZoneProvider::new();
        provider.add_zone("EFG456", "example.net.").await;
        let resolver = ZoneResolver::new(&provider);

        let err = resolver.resolve("example.com.").await.unwrap_err();
        assert_eq!(
            err,
            Error::ZoneNameMismatch {
                expected: "example.com.".to_string(),
                actual: "example.net.".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_resolve_empty_provider() {
        let provider = MemoryZoneProvider::new();
        let resolver = ZoneResolver::new(&provider);

        let err = resolver.resolve("notfound.com.").await.unwrap_err();
        assert!(matches!(err, Error::ZoneNotFound { ref zone_name, .. } if zone_name == "notfound.com."));
    }
}
