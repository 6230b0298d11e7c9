//! The relational store contract consumed by search and recommendations

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thumbtrack_core::{Engagement, Pin, PinId, PinView, User, UserId};

use crate::error::Result;

/// Relational filter used when the index is unavailable
///
/// A non-empty `query` matches pins whose title or description contains it
/// (case-insensitive). A non-empty `tags` list additionally requires the pin
/// to carry at least one of those tags, compared exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinFilter {
    pub query: Option<String>,
    pub tags: Vec<String>,
}

impl PinFilter {
    pub fn new(query: &str, tags: &[String]) -> Self {
        let query = query.trim();
        Self {
            query: (!query.is_empty()).then(|| query.to_lowercase()),
            tags: tags.to_vec(),
        }
    }

    /// Whether a pin passes the filter
    pub fn matches(&self, pin: &Pin) -> bool {
        let text_ok = match &self.query {
            None => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                pin.title.to_lowercase().contains(&needle)
                    || pin
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            }
        };
        let tags_ok = self.tags.is_empty() || pin.tags.iter().any(|t| self.tags.contains(t));
        text_ok && tags_ok
    }
}

/// Query-capable access to pins, boards, follows and engagement
///
/// Every listing that says "newest first" orders by creation time of the
/// listed record (save time for saves, pin time for pins). `take = None`
/// means unbounded.
#[async_trait]
pub trait PinStore: Send + Sync {
    /// Look up a user
    async fn user(&self, id: UserId) -> Result<Option<User>>;

    /// Pins with the given ids, in no particular order; unknown ids are skipped
    async fn pins_by_ids(&self, ids: &[PinId]) -> Result<Vec<Pin>>;

    /// Every pin, used by the reindex sweep
    async fn all_pins(&self) -> Result<Vec<Pin>>;

    /// The tag list of every pin
    async fn all_pin_tags(&self) -> Result<Vec<Vec<String>>>;

    /// One page of pins matching `filter`, newest first, with the total match count
    async fn filter_pins(
        &self,
        filter: &PinFilter,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<Pin>, u64)>;

    /// One pin per save on boards the user owns, newest save first
    async fn saved_pins_on_owned_boards(&self, user: UserId, take: Option<usize>) -> Result<Vec<Pin>>;

    /// One pin per save on boards the user is a non-owner member of, newest save first
    async fn saved_pins_on_member_boards(&self, user: UserId, take: Option<usize>)
        -> Result<Vec<Pin>>;

    /// Pins the user authored, newest first
    async fn pins_by_author(&self, user: UserId, take: Option<usize>) -> Result<Vec<Pin>>;

    /// Users the given user follows, most recent follow first
    async fn followed_user_ids(&self, user: UserId, take: Option<usize>) -> Result<Vec<UserId>>;

    /// Pins authored by any of `authors`, newest first
    async fn pins_by_authors(&self, authors: &[UserId], take: usize) -> Result<Vec<Pin>>;

    /// Pins created at or after `since`, newest first
    async fn pins_created_since(&self, since: DateTime<Utc>) -> Result<Vec<Pin>>;

    /// Newest pins whose id is not in `excluded`
    async fn recent_pins_excluding(&self, excluded: &HashSet<PinId>, take: usize)
        -> Result<Vec<Pin>>;

    /// Save and comment counts for the given pins; pins without activity map to zero
    async fn engagement(&self, ids: &[PinId]) -> Result<HashMap<PinId, Engagement>>;

    /// Insert a new pin
    async fn insert_pin(&self, pin: Pin) -> Result<()>;

    /// Replace an existing pin
    async fn update_pin(&self, pin: Pin) -> Result<()>;

    /// Delete a pin along with its saves and comments, returning it if it existed
    async fn delete_pin(&self, id: PinId) -> Result<Option<Pin>>;

    /// Append a view event
    async fn record_view(&self, view: PinView) -> Result<()>;
}
