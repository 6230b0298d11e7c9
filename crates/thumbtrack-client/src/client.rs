//! RPC client implementation

use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use thumbtrack_core::{NewPin, Pin, PinId, PinUpdate, TagCount, UserId};
use thumbtrack_rpc::{
    CreatePinRequest, DeletePinRequest, FeedRequest, HealthResponse, PinsByTagRequest,
    RecordViewRequest, SearchRequest, SearchResponse, SuggestRequest, ThumbtrackApiClient,
    UpdatePinRequest,
};
use tracing::debug;
use url::Url;

use crate::error::{ClientError, Result};

/// Client for connecting to a Thumbtrack server
pub struct ThumbtrackClient {
    client: HttpClient,
    base_url: Url,
}

impl ThumbtrackClient {
    /// Connect to a Thumbtrack server
    pub async fn connect(url: impl AsRef<str>) -> Result<Self> {
        let base_url: Url = url
            .as_ref()
            .parse()
            .map_err(|e| ClientError::Connection(format!("Invalid URL: {}", e)))?;

        let client = HttpClientBuilder::default()
            .build(&base_url)
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        debug!("Connected to Thumbtrack server at {}", base_url);

        Ok(Self { client, base_url })
    }

    /// Get the server URL
    pub fn url(&self) -> &Url {
        &self.base_url
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// Search pins; `None` page and limit use the server defaults
    pub async fn search(
        &self,
        q: impl Into<String>,
        tags: Vec<String>,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<SearchResponse> {
        let q = q.into();
        let request = SearchRequest {
            q: (!q.is_empty()).then_some(q),
            tags,
            page,
            limit,
        };
        Ok(self.client.search(request).await?)
    }

    pub async fn pins_by_tag(&self, tag: impl Into<String>, page: Option<i64>, limit: Option<i64>) -> Result<SearchResponse> {
        let request = PinsByTagRequest {
            tag: tag.into(),
            page,
            limit,
        };
        Ok(self.client.pins_by_tag(request).await?)
    }

    pub async fn suggest(&self, q: impl Into<String>) -> Result<Vec<String>> {
        let response = self.client.suggest(SuggestRequest { q: q.into() }).await?;
        Ok(response.suggestions)
    }

    pub async fn popular_tags(&self) -> Result<Vec<TagCount>> {
        Ok(self.client.popular_tags().await?.tags)
    }

    // ========================================================================
    // Feeds
    // ========================================================================

    pub async fn for_you(&self, caller: UserId) -> Result<Vec<Pin>> {
        let request = FeedRequest {
            caller: Some(caller),
        };
        Ok(self.client.for_you(request).await?.pins)
    }

    pub async fn trending(&self) -> Result<Vec<Pin>> {
        Ok(self.client.trending().await?.pins)
    }

    pub async fn following(&self, caller: UserId) -> Result<Vec<Pin>> {
        let request = FeedRequest {
            caller: Some(caller),
        };
        Ok(self.client.following(request).await?.pins)
    }

    pub async fn record_view(&self, pin_id: PinId, caller: Option<UserId>) -> Result<()> {
        self.client
            .record_view(RecordViewRequest { pin_id, caller })
            .await?;
        Ok(())
    }

    // ========================================================================
    // Pin Lifecycle
    // ========================================================================

    pub async fn create_pin(&self, caller: UserId, pin: NewPin) -> Result<Pin> {
        let request = CreatePinRequest {
            caller: Some(caller),
            pin,
        };
        Ok(self.client.create_pin(request).await?.pin)
    }

    pub async fn update_pin(&self, caller: UserId, pin_id: PinId, update: PinUpdate) -> Result<Pin> {
        let request = UpdatePinRequest {
            caller: Some(caller),
            pin_id,
            update,
        };
        Ok(self.client.update_pin(request).await?.pin)
    }

    pub async fn delete_pin(&self, caller: UserId, pin_id: PinId) -> Result<()> {
        let request = DeletePinRequest {
            caller: Some(caller),
            pin_id,
        };
        self.client.delete_pin(request).await?;
        Ok(())
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Rebuild the server's search index; returns the number of pins sent
    pub async fn reindex(&self) -> Result<usize> {
        Ok(self.client.reindex().await?.indexed)
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        Ok(self.client.health().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use thumbtrack_core::User;
    use thumbtrack_rpc::RpcError;
    use thumbtrack_server::{ServerConfig, ThumbtrackServer};

    async fn running_server() -> ThumbtrackServer {
        let config = ServerConfig {
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            ..Default::default()
        };
        let mut server = ThumbtrackServer::open(config).await.unwrap();
        server.start().await.unwrap();
        server
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_url() {
        assert!(matches!(
            ThumbtrackClient::connect("not a url").await,
            Err(ClientError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn test_round_trip_against_server() {
        let mut server = running_server().await;
        let user = User::new("ada");
        server.store().add_user(user.clone()).await;

        let client = ThumbtrackClient::connect(format!("http://{}", server.addr()))
            .await
            .unwrap();
        assert!(client.health().await.unwrap().index_available);

        let pin = client
            .create_pin(
                user.id,
                NewPin {
                    title: "Pizza stone".to_string(),
                    image_url: "https://img.example/p.png".to_string(),
                    tags: vec!["pizza".to_string()],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let found = client.search("pizza", vec![], None, None).await.unwrap();
        assert_eq!(found.pins[0].id, pin.id);
        assert_eq!(client.suggest("piz").await.unwrap(), vec!["Pizza stone", "pizza"]);
        assert_eq!(client.popular_tags().await.unwrap()[0].tag, "pizza");
        client.record_view(pin.id, None).await.unwrap();

        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_server_error_codes_are_decoded() {
        let mut server = running_server().await;
        let client = ThumbtrackClient::connect(format!("http://{}", server.addr()))
            .await
            .unwrap();

        let err = client
            .search("", vec![], Some(0), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Rpc(RpcError::InvalidParams(_))));

        let err = client.delete_pin(UserId::new(), PinId::new()).await.unwrap_err();
        assert_eq!(err.code(), Some(RpcError::NOT_FOUND));

        server.stop().await.unwrap();
    }
}
