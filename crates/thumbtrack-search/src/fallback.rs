//! Fallback query engine: the index read contract served by the relational store
//!
//! Used only while the index is unavailable. There is no relevance scoring and
//! no suggestion support; results are ordered newest first.

use std::collections::HashMap;
use std::sync::Arc;

use thumbtrack_core::{PageRequest, Pagination, Pin, SearchResult, TagCount};
use thumbtrack_store::{PinFilter, PinStore};
use tracing::debug;

use crate::error::Result;

#[derive(Clone)]
pub struct FallbackEngine {
    store: Arc<dyn PinStore>,
}

impl FallbackEngine {
    pub fn new(store: Arc<dyn PinStore>) -> Self {
        Self { store }
    }

    /// Substring search on title/description with an exact tag intersection
    ///
    /// Store failures propagate; there is nothing beneath the store to fall back to.
    pub async fn search(&self, text: &str, tags: &[String], page: PageRequest) -> Result<SearchResult<Pin>> {
        let filter = PinFilter::new(text, tags);
        let (pins, total) = self
            .store
            .filter_pins(&filter, page.offset(), page.limit as usize)
            .await?;
        debug!("Fallback search matched {} pins", total);

        Ok(SearchResult {
            pins,
            pagination: Pagination::new(page, total),
        })
    }

    /// Tag frequencies counted over every pin
    pub async fn popular_tags(&self, limit: usize) -> Result<Vec<TagCount>> {
        let mut counts: HashMap<String, u64> = HashMap::new();
        for tags in self.store.all_pin_tags().await? {
            for tag in tags {
                *counts.entry(tag).or_default() += 1;
            }
        }

        let mut tags: Vec<TagCount> = counts
            .into_iter()
            .map(|(tag, count)| TagCount { tag, count })
            .collect();
        tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
        tags.truncate(limit);
        Ok(tags)
    }
}
