//! Exact record lookup
//!
//! Fetches the one record set stored under a name, as needed before a
//! delete (providers only delete a record set that matches exactly).

use crate::error::{Error, Result};
use crate::traits::{RecordCursor, RecordSet, ZoneProvider};
use tracing::debug;

#[derive(Clone, Copy)]
pub struct RecordLookup<'a> {
    provider: &'a dyn ZoneProvider,
}

impl<'a> RecordLookup<'a> {
    pub fn new(provider: &'a dyn ZoneProvider) -> Self {
        Self { provider }
    }

    /// Find the record set named exactly `hostname` in `zone_id`
    ///
    /// Asks for a single record at the lexicographic position of `hostname`.
    /// Names are compared byte-for-byte, without trailing-dot normalization.
    ///
    /// # Errors
    ///
    /// - [`Error::AmbiguousResult`] if the provider marks the answer truncated,
    ///   whatever it contains
    /// - [`Error::RecordNotFound`] if the provider returns no record
    /// - [`Error::NameMismatch`] if the returned record has another name
    pub async fn find_exact(&self, hostname: &str, zone_id: &str) -> Result<RecordSet> {
        debug!("Looking up record {} in zone {}", hostname, zone_id);

        let cursor = RecordCursor::at(hostname);
        let page = self
            .provider
            .list_record_sets(zone_id, Some(&cursor), Some(1))
            .await?;

        if page.truncated {
            return Err(Error::AmbiguousResult {
                name: hostname.to_string(),
                zone_id: zone_id.to_string(),
            });
        }

        let record = page
            .records
            .into_iter()
            .next()
            .ok_or_else(|| Error::RecordNotFound {
                name: hostname.to_string(),
                zone_id: zone_id.to_string(),
            })?;

        if record.name != hostname {
            return Err(Error::NameMismatch {
                expected: hostname.to_string(),
                actual: record.name,
            });
        }

        Ok(record)
    }
}
