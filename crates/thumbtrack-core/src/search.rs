//! Search types - the index projection of a pin and the paginated result envelope

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::{Pin, PinId, UserId};

/// Searchable projection of a pin
///
/// Always derived from a `Pin`: rebuilt on every create/update and removed on
/// delete. The relational store stays the source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub id: PinId,
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
    pub tags: Vec<String>,
    pub author_user_id: UserId,
    pub author_username: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Pin> for SearchDocument {
    fn from(pin: &Pin) -> Self {
        Self {
            id: pin.id,
            title: pin.title.clone(),
            description: pin.description.clone(),
            image_url: pin.image_url.clone(),
            tags: pin.tags.clone(),
            author_user_id: pin.author.id,
            author_username: pin.author.username.clone(),
            created_at: pin.created_at,
        }
    }
}

/// An index hit: the stored projection plus its relevance score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    #[serde(flatten)]
    pub document: SearchDocument,
    pub score: f32,
}

/// Page/limit pair validated at the route layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// 1-based page number
    pub page: u32,
    /// Page size within [1, MAX_LIMIT]
    pub limit: u32,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u32 = 20;
    pub const MAX_LIMIT: u32 = 50;

    /// Build a page request from raw query parameters
    ///
    /// A missing page means page 1; a page below 1 is rejected. The limit
    /// defaults to 20 and is clamped into [1, 50].
    pub fn from_params(page: Option<i64>, limit: Option<i64>) -> Result<Self> {
        let page = page.unwrap_or(1);
        if page < 1 {
            return Err(CoreError::InvalidPage(page));
        }
        let page = u32::try_from(page).map_err(|_| CoreError::InvalidPage(page))?;
        let limit = limit
            .unwrap_or(i64::from(Self::DEFAULT_LIMIT))
            .clamp(1, i64::from(Self::MAX_LIMIT)) as u32;
        Ok(Self { page, limit })
    }

    /// Number of records to skip
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.limit as usize
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// Pagination block shared by every search backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    /// Compute pagination for `total` matches; `total_pages = ceil(total / limit)`
    pub fn new(request: PageRequest, total: u64) -> Self {
        let limit = u64::from(request.limit.max(1));
        Self {
            page: request.page,
            limit: request.limit,
            total,
            total_pages: total.div_ceil(limit),
        }
    }
}

/// Ordered page of results plus pagination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult<T> {
    pub pins: Vec<T>,
    pub pagination: Pagination,
}

impl<T> SearchResult<T> {
    /// An empty page for the given request
    pub fn empty(request: PageRequest) -> Self {
        Self {
            pins: Vec::new(),
            pagination: Pagination::new(request, 0),
        }
    }
}

/// A tag with the number of pins carrying it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}
