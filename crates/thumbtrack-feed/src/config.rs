//! Feed configuration

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Weight added to a tag for each occurrence, per signal source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceWeights {
    /// Pins saved to boards the caller owns
    pub owned_saves: u64,
    /// Pins saved to boards the caller collaborates on
    pub member_saves: u64,
    /// Pins the caller authored
    pub authored: u64,
    /// Pins by users the caller follows
    pub followed: u64,
}

impl Default for SourceWeights {
    fn default() -> Self {
        Self {
            owned_saves: 3,
            member_saves: 2,
            authored: 2,
            followed: 1,
        }
    }
}

/// How many records each signal source may read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceBounds {
    pub owned_saves: usize,
    pub member_saves: usize,
    pub authored: usize,
    /// Most recent follows considered
    pub follows: usize,
    /// Most recent pins read per followed user
    pub pins_per_follow: usize,
}

impl Default for SourceBounds {
    fn default() -> Self {
        Self {
            owned_saves: 50,
            member_saves: 30,
            authored: 20,
            follows: 10,
            pins_per_follow: 10,
        }
    }
}

/// Configuration for the recommendation feeds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Number of pins in every feed
    pub feed_size: usize,
    pub weights: SourceWeights,
    pub bounds: SourceBounds,
    /// Tags kept from the affinity vector
    pub top_tags: usize,
    /// Age limit for trending pins
    pub trending_window_days: i64,
}

impl FeedConfig {
    pub fn trending_window(&self) -> Duration {
        Duration::days(self.trending_window_days)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            feed_size: 40,
            weights: SourceWeights::default(),
            bounds: SourceBounds::default(),
            top_tags: 10,
            trending_window_days: 7,
        }
    }
}
