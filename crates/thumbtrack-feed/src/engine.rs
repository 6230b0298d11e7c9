//! Recommendation engine: for-you, trending and following feeds

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use thumbtrack_core::{Engagement, Pin, PinId, PinView, UserId};
use thumbtrack_search::{hydrate, IndexStore};
use thumbtrack_store::PinStore;
use tracing::{debug, warn};

use crate::config::FeedConfig;
use crate::error::Result;
use crate::signals::SignalAggregator;

#[derive(Clone)]
pub struct FeedEngine {
    store: Arc<dyn PinStore>,
    index: IndexStore,
    signals: SignalAggregator,
    config: FeedConfig,
}

impl FeedEngine {
    pub fn new(store: Arc<dyn PinStore>, index: IndexStore, config: FeedConfig) -> Self {
        Self {
            signals: SignalAggregator::new(Arc::clone(&store), config.clone()),
            store,
            index,
            config,
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Personalized feed of up to `feed_size` pins
    ///
    /// Pins matching the caller's top tags come first, in index relevance
    /// order. The rest is backfilled with recent pins ranked by engagement.
    /// Pins the caller saved or authored never appear.
    pub async fn for_you(&self, user: UserId) -> Result<Vec<Pin>> {
        let size = self.config.feed_size;
        let signals = self.signals.collect(user).await?;

        let mut feed: Vec<Pin> = Vec::with_capacity(size);
        if !signals.top_tags.is_empty() {
            let affinities = signals
                .top_tags
                .iter()
                .map(|(tag, weight)| (tag.clone(), *weight as f64))
                .collect();
            let ids = self
                .index
                .recommend(affinities, signals.exclusion.clone(), size * 2)
                .await;
            let candidates = hydrate(self.store.as_ref(), &ids).await?;
            feed.extend(
                candidates
                    .into_iter()
                    .filter(|pin| !signals.exclusion.contains(&pin.id))
                    .take(size),
            );
        }
        debug!("For-you feed for {}: {} tag matches", user, feed.len());

        if feed.len() < size {
            let mut seen = signals.exclusion;
            seen.extend(feed.iter().map(|pin| pin.id));
            let backfill = self.backfill(&seen, size - feed.len()).await?;
            feed.extend(backfill);
        }
        Ok(feed)
    }

    /// Recent pins outside `seen`, best `remaining` by saves plus comments
    async fn backfill(&self, seen: &HashSet<PinId>, remaining: usize) -> Result<Vec<Pin>> {
        let candidates = self
            .store
            .recent_pins_excluding(seen, remaining * 2)
            .await?;
        let mut ranked = self
            .rank_by(candidates, |engagement| engagement.backfill_score())
            .await?;
        ranked.truncate(remaining);
        Ok(ranked)
    }

    /// Pins from the trending window ranked by twice the saves plus comments
    ///
    /// No backfill: a quiet week yields a shorter feed.
    pub async fn trending(&self) -> Result<Vec<Pin>> {
        let since = Utc::now() - self.config.trending_window();
        let recent = self.store.pins_created_since(since).await?;
        let mut ranked = self
            .rank_by(recent, |engagement| engagement.trending_score())
            .await?;
        ranked.truncate(self.config.feed_size);
        Ok(ranked)
    }

    /// Newest pins by users the caller follows; empty when they follow nobody
    pub async fn following(&self, user: UserId) -> Result<Vec<Pin>> {
        let followed = self.store.followed_user_ids(user, None).await?;
        if followed.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .store
            .pins_by_authors(&followed, self.config.feed_size)
            .await?)
    }

    /// Append a view event; failures are logged and dropped
    pub async fn record_view(&self, pin_id: PinId, user: Option<UserId>) {
        if let Err(e) = self.store.record_view(PinView::now(pin_id, user)).await {
            warn!("Failed to record view of pin {}: {}", pin_id, e);
        }
    }

    /// Sort pins by an engagement score, highest first, keeping input order on ties
    async fn rank_by<F>(&self, pins: Vec<Pin>, score: F) -> Result<Vec<Pin>>
    where
        F: Fn(&Engagement) -> u64,
    {
        let ids: Vec<PinId> = pins.iter().map(|pin| pin.id).collect();
        let engagement = self.store.engagement(&ids).await?;

        let mut scored: Vec<(u64, Pin)> = pins
            .into_iter()
            .map(|pin| {
                let value = engagement.get(&pin.id).map_or(0, &score);
                (value, pin)
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(scored.into_iter().map(|(_, pin)| pin).collect())
    }
}
