//! Signal aggregation: what a caller is into, and what they have already seen
//!
//! Four bounded sources feed the tag-affinity vector. Three unbounded sources
//! make up the exclusion set. Pins by followed users count toward affinity but
//! are never excluded. All seven reads are issued concurrently.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::try_join_all;
use thumbtrack_core::{Pin, PinId, UserId};
use thumbtrack_store::PinStore;
use tracing::debug;

use crate::config::FeedConfig;
use crate::error::Result;

/// Accumulated per-tag weights in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagAffinity {
    totals: Vec<(String, u64)>,
    positions: HashMap<String, usize>,
}

impl TagAffinity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `weight` to every tag of every pin
    pub fn add_pins(&mut self, pins: &[Pin], weight: u64) {
        for pin in pins {
            for tag in &pin.tags {
                self.add(tag, weight);
            }
        }
    }

    pub fn add(&mut self, tag: &str, weight: u64) {
        match self.positions.get(tag) {
            Some(&i) => self.totals[i].1 += weight,
            None => {
                self.positions.insert(tag.to_string(), self.totals.len());
                self.totals.push((tag.to_string(), weight));
            }
        }
    }

    /// Total weight of a tag, zero if never seen
    pub fn weight(&self, tag: &str) -> u64 {
        self.positions.get(tag).map_or(0, |&i| self.totals[i].1)
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    /// The `n` heaviest tags, heaviest first; equal weights keep first-seen order
    pub fn top(&self, n: usize) -> Vec<(String, u64)> {
        let mut ranked = self.totals.clone();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        ranked
    }
}

/// Everything the for-you feed needs to know about a caller
#[derive(Debug, Clone, Default)]
pub struct Signals {
    pub affinity: TagAffinity,
    /// Heaviest tags with their weights
    pub top_tags: Vec<(String, u64)>,
    /// Pins the caller saved (own or shared boards) or authored
    pub exclusion: HashSet<PinId>,
}

#[derive(Clone)]
pub struct SignalAggregator {
    store: Arc<dyn PinStore>,
    config: FeedConfig,
}

impl SignalAggregator {
    pub fn new(store: Arc<dyn PinStore>, config: FeedConfig) -> Self {
        Self { store, config }
    }

    /// Gather affinity and exclusions for `user`
    ///
    /// A user with no activity gets empty signals, not an error.
    pub async fn collect(&self, user: UserId) -> Result<Signals> {
        let (affinity, exclusion) = tokio::try_join!(self.affinity(user), self.exclusion(user))?;
        let top_tags = affinity.top(self.config.top_tags);
        debug!(
            "Signals for {}: {} tags, {} excluded pins",
            user,
            affinity.len(),
            exclusion.len()
        );
        Ok(Signals {
            affinity,
            top_tags,
            exclusion,
        })
    }

    /// Weighted tag totals over the four bounded sources
    pub async fn affinity(&self, user: UserId) -> Result<TagAffinity> {
        let bounds = self.config.bounds;
        let weights = self.config.weights;

        let (owned, member, authored, followed) = tokio::try_join!(
            self.store
                .saved_pins_on_owned_boards(user, Some(bounds.owned_saves)),
            self.store
                .saved_pins_on_member_boards(user, Some(bounds.member_saves)),
            self.store.pins_by_author(user, Some(bounds.authored)),
            self.followed_pins(user),
        )?;

        let mut affinity = TagAffinity::new();
        affinity.add_pins(&owned, weights.owned_saves);
        affinity.add_pins(&member, weights.member_saves);
        affinity.add_pins(&authored, weights.authored);
        affinity.add_pins(&followed, weights.followed);
        Ok(affinity)
    }

    /// Recent pins of each recently followed user
    async fn followed_pins(&self, user: UserId) -> thumbtrack_store::Result<Vec<Pin>> {
        let bounds = self.config.bounds;
        let followed = self
            .store
            .followed_user_ids(user, Some(bounds.follows))
            .await?;

        let per_user = try_join_all(
            followed
                .into_iter()
                .map(|id| self.store.pins_by_author(id, Some(bounds.pins_per_follow))),
        )
        .await?;
        Ok(per_user.into_iter().flatten().collect())
    }

    /// Ids of every pin the caller saved or authored
    pub async fn exclusion(&self, user: UserId) -> Result<HashSet<PinId>> {
        let (owned, member, authored) = tokio::try_join!(
            self.store.saved_pins_on_owned_boards(user, None),
            self.store.saved_pins_on_member_boards(user, None),
            self.store.pins_by_author(user, None),
        )?;
        Ok(owned
            .iter()
            .chain(&member)
            .chain(&authored)
            .map(|pin| pin.id)
            .collect())
    }
}
