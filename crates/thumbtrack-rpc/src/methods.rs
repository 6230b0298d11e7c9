//! RPC method definitions using jsonrpsee

use jsonrpsee::proc_macros::rpc;
use jsonrpsee::types::ErrorObjectOwned;

use crate::types::*;

/// Thumbtrack RPC API
///
/// Search and feed reads, view recording, and the pin writes that keep the
/// search index in step with the store.
#[rpc(server, client, namespace = "thumbtrack")]
pub trait ThumbtrackApi {
    // ========================================================================
    // Search
    // ========================================================================

    /// Search pins by text and tags
    #[method(name = "search")]
    async fn search(&self, request: SearchRequest) -> Result<SearchResponse, ErrorObjectOwned>;

    /// Browse pins carrying a tag
    #[method(name = "pinsByTag")]
    async fn pins_by_tag(&self, request: PinsByTagRequest) -> Result<SearchResponse, ErrorObjectOwned>;

    /// Autocomplete titles and tags
    #[method(name = "suggest")]
    async fn suggest(&self, request: SuggestRequest) -> Result<SuggestResponse, ErrorObjectOwned>;

    /// Most used tags
    #[method(name = "popularTags")]
    async fn popular_tags(&self) -> Result<PopularTagsResponse, ErrorObjectOwned>;

    // ========================================================================
    // Feeds
    // ========================================================================

    /// Personalized feed for the caller
    #[method(name = "forYou")]
    async fn for_you(&self, request: FeedRequest) -> Result<FeedResponse, ErrorObjectOwned>;

    /// Engagement-ranked pins from the last week
    #[method(name = "trending")]
    async fn trending(&self) -> Result<FeedResponse, ErrorObjectOwned>;

    /// Newest pins by users the caller follows
    #[method(name = "following")]
    async fn following(&self, request: FeedRequest) -> Result<FeedResponse, ErrorObjectOwned>;

    /// Record a pin view; always acknowledged
    #[method(name = "recordView")]
    async fn record_view(&self, request: RecordViewRequest) -> Result<EmptyResponse, ErrorObjectOwned>;

    // ========================================================================
    // Pin Lifecycle
    // ========================================================================

    #[method(name = "createPin")]
    async fn create_pin(&self, request: CreatePinRequest) -> Result<PinResponse, ErrorObjectOwned>;

    #[method(name = "updatePin")]
    async fn update_pin(&self, request: UpdatePinRequest) -> Result<PinResponse, ErrorObjectOwned>;

    #[method(name = "deletePin")]
    async fn delete_pin(&self, request: DeletePinRequest) -> Result<EmptyResponse, ErrorObjectOwned>;

    // ========================================================================
    // Operations
    // ========================================================================

    /// Rebuild the search index from the store
    #[method(name = "reindex")]
    async fn reindex(&self) -> Result<ReindexResponse, ErrorObjectOwned>;

    #[method(name = "health")]
    async fn health(&self) -> Result<HealthResponse, ErrorObjectOwned>;
}
