//! Common RPC types
//!
//! Raw page and limit values travel as given and are validated by the server.
//! The caller is passed explicitly; authentication happens in front of the
//! RPC layer.

use serde::{Deserialize, Serialize};
use thumbtrack_core::{NewPin, Pagination, Pin, PinId, PinUpdate, SearchResult, TagCount, UserId};

// ============================================================================
// Search
// ============================================================================

/// Request to search pins by free text and tags
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Request to browse pins carrying one tag
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PinsByTagRequest {
    pub tag: String,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// One page of hydrated pins
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub pins: Vec<Pin>,
    pub pagination: Pagination,
}

impl From<SearchResult<Pin>> for SearchResponse {
    fn from(result: SearchResult<Pin>) -> Self {
        Self {
            pins: result.pins,
            pagination: result.pagination,
        }
    }
}

/// Request for autocomplete suggestions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuggestRequest {
    pub q: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestResponse {
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopularTagsResponse {
    pub tags: Vec<TagCount>,
}

// ============================================================================
// Feeds
// ============================================================================

/// Request for a feed that depends on who is asking
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedRequest {
    #[serde(default)]
    pub caller: Option<UserId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedResponse {
    pub pins: Vec<Pin>,
}

/// Request to record that a pin was viewed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordViewRequest {
    pub pin_id: PinId,
    #[serde(default)]
    pub caller: Option<UserId>,
}

// ============================================================================
// Pin Lifecycle
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePinRequest {
    #[serde(default)]
    pub caller: Option<UserId>,
    pub pin: NewPin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePinRequest {
    #[serde(default)]
    pub caller: Option<UserId>,
    pub pin_id: PinId,
    pub update: PinUpdate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletePinRequest {
    #[serde(default)]
    pub caller: Option<UserId>,
    pub pin_id: PinId,
}

/// A single pin after a create or update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinResponse {
    pub pin: Pin,
}

// ============================================================================
// Operations
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReindexResponse {
    /// Documents sent to the index
    pub indexed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub index_available: bool,
    pub version: String,
}

/// Empty response for operations that only acknowledge
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmptyResponse {}
