//! Paged record listing
//!
//! [`RecordPages`] walks a zone one provider page at a time. It is lazy
//! (nothing is fetched until a page is asked for), finite (it stops after
//! the last page or the first error) and restartable.

use crate::error::Result;
use crate::traits::{RecordCursor, RecordSet, RecordSetPage, ZoneProvider};
use futures::Stream;
use tracing::debug;

pub struct RecordPages<'a> {
    provider: &'a dyn ZoneProvider,
    zone_id: String,
    page_size: Option<u32>,
    cursor: Option<RecordCursor>,
    done: bool,
}

impl<'a> RecordPages<'a> {
    pub fn new(provider: &'a dyn ZoneProvider, zone_id: impl Into<String>) -> Self {
        Self {
            provider,
            zone_id: zone_id.into(),
            page_size: None,
            cursor: None,
            done: false,
        }
    }

    /// Ask the provider for pages of at most `page_size` records
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Fetch the next page, or `None` once the listing is exhausted
    pub async fn next_page(&mut self) -> Option<Result<RecordSetPage>> {
        if self.done {
            return None;
        }

        let result = self
            .provider
            .list_record_sets(&self.zone_id, self.cursor.as_ref(), self.page_size)
            .await;

        match &result {
            // An empty page or a cursor that does not move would repeat forever
            Ok(page)
                if page.truncated
                    && !page.records.is_empty()
                    && page.next.is_some()
                    && page.next != self.cursor =>
            {
                debug!(
                    "Listed {} record(s) in zone {}, more to follow",
                    page.records.len(),
                    self.zone_id
                );
                self.cursor = page.next.clone();
            }
            _ => self.done = true,
        }

        Some(result)
    }

    /// Rewind to the first page
    pub fn restart(&mut self) {
        self.cursor = None;
        self.done = false;
    }

    /// Drain the remaining pages into one list of record sets
    pub async fn collect_all(&mut self) -> Result<Vec<RecordSet>> {
        let mut records = Vec::new();
        while let Some(page) = self.next_page().await {
            records.extend(page?.records);
        }
        Ok(records)
    }

    /// Turn the remaining pages into a stream
    pub fn into_stream(self) -> impl Stream<Item = Result<RecordSetPage>> + 'a {
        futures::stream::unfold(self, |mut pages| async move {
            let page = pages.next_page().await?;
            Some((page, pages))
        })
    }
}
