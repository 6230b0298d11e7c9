//! RPC method handlers
//!
//! Parameters are validated here, before anything reaches the search or feed
//! services, and service errors are mapped onto RPC error codes.

use std::sync::Arc;

use jsonrpsee::core::async_trait;
use jsonrpsee::types::ErrorObjectOwned;
use thumbtrack_core::{PageRequest, UserId};
use thumbtrack_feed::{FeedConfig, FeedEngine, FeedError};
use thumbtrack_rpc::{
    CreatePinRequest, DeletePinRequest, EmptyResponse, FeedRequest, FeedResponse, HealthResponse,
    PinResponse, PinsByTagRequest, PopularTagsResponse, RecordViewRequest, ReindexResponse,
    RpcError, SearchRequest, SearchResponse, SuggestRequest, SuggestResponse, ThumbtrackApiServer,
    UpdatePinRequest,
};
use thumbtrack_search::{reindex_all, IndexStore, PinLifecycle, SearchError, SearchFacade};
use thumbtrack_store::{PinStore, StoreError};
use tracing::{debug, info};

/// Shortest query that gets suggestions
pub const MIN_SUGGEST_LEN: usize = 2;
pub const SUGGEST_LIMIT: usize = 10;
pub const POPULAR_TAGS_LIMIT: usize = 20;

/// RPC handler implementation
#[derive(Clone)]
pub struct RpcHandler {
    store: Arc<dyn PinStore>,
    search: SearchFacade,
    feed: FeedEngine,
    lifecycle: PinLifecycle,
}

impl RpcHandler {
    pub fn new(store: Arc<dyn PinStore>, index: IndexStore, feed: FeedConfig) -> Self {
        Self {
            search: SearchFacade::new(index.clone(), Arc::clone(&store)),
            feed: FeedEngine::new(Arc::clone(&store), index.clone(), feed),
            lifecycle: PinLifecycle::new(Arc::clone(&store), index),
            store,
        }
    }

    pub fn index(&self) -> &IndexStore {
        self.search.index()
    }
}

/// Validate raw paging parameters: page defaults to 1 and must be positive,
/// limit defaults to 20 and is clamped into [1, 50]
pub fn page_request(page: Option<i64>, limit: Option<i64>) -> Result<PageRequest, RpcError> {
    PageRequest::from_params(page, limit).map_err(|e| RpcError::InvalidParams(e.to_string()))
}

/// Trim tags and drop empty ones
pub fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

fn require_caller(caller: Option<UserId>) -> Result<UserId, RpcError> {
    caller.ok_or_else(|| RpcError::Unauthorized("this method requires a caller".to_string()))
}

fn store_error(e: StoreError) -> RpcError {
    match e {
        StoreError::PinNotFound(id) => RpcError::NotFound(format!("pin {}", id)),
        StoreError::UserNotFound(id) => RpcError::NotFound(format!("user {}", id)),
        other => RpcError::Store(other.to_string()),
    }
}

fn search_error(e: SearchError) -> ErrorObjectOwned {
    let rpc = match e {
        SearchError::Invalid(e) => RpcError::InvalidParams(e.to_string()),
        SearchError::PinNotFound(id) => RpcError::NotFound(format!("pin {}", id)),
        SearchError::Forbidden(message) => RpcError::Forbidden(message),
        SearchError::Store(e) => store_error(e),
        other => RpcError::Internal(other.to_string()),
    };
    rpc.into()
}

fn feed_error(e: FeedError) -> ErrorObjectOwned {
    match e {
        FeedError::Store(e) => store_error(e).into(),
        FeedError::Search(e) => search_error(e),
    }
}

#[async_trait]
impl ThumbtrackApiServer for RpcHandler {
    async fn search(&self, request: SearchRequest) -> Result<SearchResponse, ErrorObjectOwned> {
        let page = page_request(request.page, request.limit)?;
        let text = request.q.unwrap_or_default();
        let tags = clean_tags(request.tags);
        debug!("Search '{}' tags {:?} page {}", text, tags, page.page);

        let result = self
            .search
            .search(text.trim(), &tags, page)
            .await
            .map_err(search_error)?;
        Ok(result.into())
    }

    async fn pins_by_tag(&self, request: PinsByTagRequest) -> Result<SearchResponse, ErrorObjectOwned> {
        let page = page_request(request.page, request.limit)?;
        let tags = clean_tags(vec![request.tag]);
        if tags.is_empty() {
            return Err(RpcError::InvalidParams("tag is required".to_string()).into());
        }

        let result = self
            .search
            .search("", &tags, page)
            .await
            .map_err(search_error)?;
        Ok(result.into())
    }

    async fn suggest(&self, request: SuggestRequest) -> Result<SuggestResponse, ErrorObjectOwned> {
        let text = request.q.trim();
        if text.chars().count() < MIN_SUGGEST_LEN {
            return Ok(SuggestResponse {
                suggestions: Vec::new(),
            });
        }
        let suggestions = self.search.suggest(text, SUGGEST_LIMIT).await;
        Ok(SuggestResponse { suggestions })
    }

    async fn popular_tags(&self) -> Result<PopularTagsResponse, ErrorObjectOwned> {
        let tags = self
            .search
            .popular_tags(POPULAR_TAGS_LIMIT)
            .await
            .map_err(search_error)?;
        Ok(PopularTagsResponse { tags })
    }

    async fn for_you(&self, request: FeedRequest) -> Result<FeedResponse, ErrorObjectOwned> {
        let caller = require_caller(request.caller)?;
        let pins = self.feed.for_you(caller).await.map_err(feed_error)?;
        Ok(FeedResponse { pins })
    }

    async fn trending(&self) -> Result<FeedResponse, ErrorObjectOwned> {
        let pins = self.feed.trending().await.map_err(feed_error)?;
        Ok(FeedResponse { pins })
    }

    async fn following(&self, request: FeedRequest) -> Result<FeedResponse, ErrorObjectOwned> {
        let caller = require_caller(request.caller)?;
        let pins = self.feed.following(caller).await.map_err(feed_error)?;
        Ok(FeedResponse { pins })
    }

    async fn record_view(&self, request: RecordViewRequest) -> Result<EmptyResponse, ErrorObjectOwned> {
        self.feed.record_view(request.pin_id, request.caller).await;
        Ok(EmptyResponse {})
    }

    async fn create_pin(&self, request: CreatePinRequest) -> Result<PinResponse, ErrorObjectOwned> {
        let caller = require_caller(request.caller)?;
        let mut input = request.pin;
        input.tags = clean_tags(input.tags);

        let pin = self
            .lifecycle
            .create_pin(caller, input)
            .await
            .map_err(search_error)?;
        Ok(PinResponse { pin })
    }

    async fn update_pin(&self, request: UpdatePinRequest) -> Result<PinResponse, ErrorObjectOwned> {
        let caller = require_caller(request.caller)?;
        let mut update = request.update;
        update.tags = update.tags.map(clean_tags);

        let pin = self
            .lifecycle
            .update_pin(caller, request.pin_id, update)
            .await
            .map_err(search_error)?;
        Ok(PinResponse { pin })
    }

    async fn delete_pin(&self, request: DeletePinRequest) -> Result<EmptyResponse, ErrorObjectOwned> {
        let caller = require_caller(request.caller)?;
        self.lifecycle
            .delete_pin(caller, request.pin_id)
            .await
            .map_err(search_error)?;
        Ok(EmptyResponse {})
    }

    async fn reindex(&self) -> Result<ReindexResponse, ErrorObjectOwned> {
        info!("Reindex requested");
        let indexed = reindex_all(self.store.as_ref(), self.search.index())
            .await
            .map_err(search_error)?;
        Ok(ReindexResponse { indexed })
    }

    async fn health(&self) -> Result<HealthResponse, ErrorObjectOwned> {
        Ok(HealthResponse {
            index_available: self.search.index().is_available(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thumbtrack_core::{NewPin, PinId, PinUpdate, User};
    use thumbtrack_search::{IndexHealth, IndexLocation};
    use thumbtrack_store::MemoryStore;

    async fn handler(with_index: bool) -> (RpcHandler, Arc<MemoryStore>, User) {
        let store = Arc::new(MemoryStore::new());
        let user = User::new("ada");
        store.add_user(user.clone()).await;
        let index = if with_index {
            IndexStore::initialize(IndexLocation::InMemory, Arc::new(IndexHealth::new())).await
        } else {
            IndexStore::unavailable(Arc::new(IndexHealth::new()))
        };
        let handler = RpcHandler::new(store.clone(), index, FeedConfig::default());
        (handler, store, user)
    }

    fn new_pin(title: &str, tags: &[&str]) -> NewPin {
        NewPin {
            title: title.to_string(),
            image_url: "https://img.example/p.png".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    async fn create(handler: &RpcHandler, user: &User, title: &str, tags: &[&str]) -> PinId {
        handler
            .create_pin(CreatePinRequest {
                caller: Some(user.id),
                pin: new_pin(title, tags),
            })
            .await
            .unwrap()
            .pin
            .id
    }

    #[test]
    fn test_clean_tags() {
        let tags = clean_tags(vec![" cats ".into(), "".into(), "  ".into(), "dogs".into()]);
        assert_eq!(tags, vec!["cats", "dogs"]);
    }

    #[tokio::test]
    async fn test_search_validates_paging() {
        let (handler, _, _) = handler(true).await;

        let err = handler
            .search(SearchRequest {
                page: Some(0),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), RpcError::INVALID_PARAMS);

        let response = handler
            .search(SearchRequest {
                limit: Some(500),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(response.pagination.limit, 50);
        assert_eq!(response.pagination.page, 1);
    }

    #[tokio::test]
    async fn test_created_pins_are_searchable_and_browsable() {
        let (handler, _, user) = handler(true).await;
        let cat = create(&handler, &user, "Cat tree", &[" pets "]).await;
        create(&handler, &user, "Bookshelf", &["home"]).await;

        let response = handler
            .search(SearchRequest {
                q: Some("cat".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(response.pins.len(), 1);
        assert_eq!(response.pins[0].id, cat);
        assert_eq!(response.pins[0].tags, vec!["pets"]);

        let response = handler
            .pins_by_tag(PinsByTagRequest {
                tag: "pets".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(response.pagination.total, 1);

        let err = handler
            .pins_by_tag(PinsByTagRequest {
                tag: "  ".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), RpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_suggest_requires_two_characters() {
        let (handler, _, user) = handler(true).await;
        create(&handler, &user, "Pizza stone", &["pizza"]).await;

        let short = handler.suggest(SuggestRequest { q: "p".into() }).await.unwrap();
        assert!(short.suggestions.is_empty());
        let long = handler.suggest(SuggestRequest { q: "pi".into() }).await.unwrap();
        assert_eq!(long.suggestions, vec!["Pizza stone", "pizza"]);
    }

    #[tokio::test]
    async fn test_personal_feeds_require_a_caller() {
        let (handler, _, user) = handler(false).await;
        let err = handler.for_you(FeedRequest::default()).await.unwrap_err();
        assert_eq!(err.code(), RpcError::UNAUTHORIZED);
        let err = handler.following(FeedRequest::default()).await.unwrap_err();
        assert_eq!(err.code(), RpcError::UNAUTHORIZED);

        let response = handler
            .for_you(FeedRequest {
                caller: Some(user.id),
            })
            .await
            .unwrap();
        assert!(response.pins.is_empty());
        assert!(handler.trending().await.unwrap().pins.is_empty());
    }

    #[tokio::test]
    async fn test_record_view_always_acknowledges() {
        let (handler, store, _) = handler(false).await;
        handler
            .record_view(RecordViewRequest {
                pin_id: PinId::new(),
                caller: None,
            })
            .await
            .unwrap();
        assert_eq!(store.views().await.len(), 1);
    }

    #[tokio::test]
    async fn test_lifecycle_error_codes() {
        let (handler, store, owner) = handler(true).await;
        let other = User::new("mallory");
        store.add_user(other.clone()).await;
        let pin_id = create(&handler, &owner, "Lamp", &[]).await;

        let err = handler
            .delete_pin(DeletePinRequest {
                caller: Some(other.id),
                pin_id,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), RpcError::FORBIDDEN);

        let err = handler
            .update_pin(UpdatePinRequest {
                caller: Some(owner.id),
                pin_id: PinId::new(),
                update: PinUpdate::default(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), RpcError::NOT_FOUND);

        let err = handler
            .create_pin(CreatePinRequest {
                caller: Some(owner.id),
                pin: new_pin("", &[]),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), RpcError::INVALID_PARAMS);

        let updated = handler
            .update_pin(UpdatePinRequest {
                caller: Some(owner.id),
                pin_id,
                update: PinUpdate {
                    tags: Some(vec![" lighting ".into()]),
                    ..Default::default()
                },
            })
            .await
            .unwrap();
        assert_eq!(updated.pin.tags, vec!["lighting"]);
    }

    #[tokio::test]
    async fn test_reindex_and_health() {
        let (handler, store, user) = handler(true).await;
        for title in ["One", "Two"] {
            store
                .insert_pin(thumbtrack_core::Pin::new(user.author(), new_pin(title, &[])))
                .await
                .unwrap();
        }
        assert_eq!(handler.reindex().await.unwrap().indexed, 2);
        assert!(handler.health().await.unwrap().index_available);

        let (degraded, _, _) = self::handler(false).await;
        assert!(!degraded.health().await.unwrap().index_available);
        assert_eq!(degraded.reindex().await.unwrap().indexed, 0);
    }
}
