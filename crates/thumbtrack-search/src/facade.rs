//! Search façade: one read interface over the index and the fallback engine

use std::collections::HashMap;
use std::sync::Arc;

use thumbtrack_core::{PageRequest, Pin, PinId, SearchResult, TagCount};
use thumbtrack_store::PinStore;
use tracing::debug;

use crate::error::Result;
use crate::fallback::FallbackEngine;
use crate::index::IndexStore;

/// The backend serving one call, chosen from the index's availability
pub enum SearchBackend<'a> {
    Index(&'a IndexStore),
    Fallback(&'a FallbackEngine),
}

/// Entry point for search, suggestions and popular tags
#[derive(Clone)]
pub struct SearchFacade {
    index: IndexStore,
    fallback: FallbackEngine,
    store: Arc<dyn PinStore>,
}

impl SearchFacade {
    pub fn new(index: IndexStore, store: Arc<dyn PinStore>) -> Self {
        Self {
            fallback: FallbackEngine::new(Arc::clone(&store)),
            index,
            store,
        }
    }

    pub fn index(&self) -> &IndexStore {
        &self.index
    }

    pub fn store(&self) -> &Arc<dyn PinStore> {
        &self.store
    }

    /// Select the backend for a single call
    pub fn backend(&self) -> SearchBackend<'_> {
        if self.index.is_available() {
            SearchBackend::Index(&self.index)
        } else {
            SearchBackend::Fallback(&self.fallback)
        }
    }

    /// Search pins and return full records
    ///
    /// Index hits are hydrated from the store and kept in index order; ids
    /// the store no longer knows are dropped. The pagination block is the
    /// index's, so `total` may count such dropped ids.
    pub async fn search(&self, text: &str, tags: &[String], page: PageRequest) -> Result<SearchResult<Pin>> {
        match self.backend() {
            SearchBackend::Fallback(fallback) => fallback.search(text, tags, page).await,
            SearchBackend::Index(index) => {
                let hits = index.search(text, tags, page).await;
                let ids: Vec<PinId> = hits.pins.iter().map(|hit| hit.document.id).collect();
                let pins = hydrate(self.store.as_ref(), &ids).await?;
                debug!("Search returned {} of {} hits", pins.len(), hits.pagination.total);
                Ok(SearchResult {
                    pins,
                    pagination: hits.pagination,
                })
            }
        }
    }

    /// Autocomplete strings; none while the index is unavailable
    pub async fn suggest(&self, text: &str, limit: usize) -> Vec<String> {
        match self.backend() {
            SearchBackend::Index(index) => index.suggest(text, limit).await,
            SearchBackend::Fallback(_) => Vec::new(),
        }
    }

    pub async fn popular_tags(&self, limit: usize) -> Result<Vec<TagCount>> {
        match self.backend() {
            SearchBackend::Index(index) => Ok(index.popular_tags(limit).await),
            SearchBackend::Fallback(fallback) => fallback.popular_tags(limit).await,
        }
    }
}

/// Fetch records for `ids` and return them in the order of `ids`
///
/// Missing ids are skipped. Duplicate ids yield one record each time they appear.
pub async fn hydrate(store: &dyn PinStore, ids: &[PinId]) -> Result<Vec<Pin>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut by_id: HashMap<PinId, Pin> = store
        .pins_by_ids(ids)
        .await?
        .into_iter()
        .map(|pin| (pin.id, pin))
        .collect();

    let mut ordered = Vec::with_capacity(ids.len());
    for (position, id) in ids.iter().enumerate() {
        let repeated = ids[position + 1..].contains(id);
        let pin = if repeated {
            by_id.get(id).cloned()
        } else {
            by_id.remove(id)
        };
        ordered.extend(pin);
    }
    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};
    use std::collections::HashSet;
    use thumbtrack_core::{Engagement, NewPin, PinView, User, UserId};
    use thumbtrack_store::{MemoryStore, PinFilter, StoreError};

    use crate::health::IndexHealth;
    use crate::index::IndexLocation;

    fn new_pin(user: &User, title: &str, tags: &[&str], age_hours: i64) -> Pin {
        let mut pin = Pin::new(
            user.author(),
            NewPin {
                title: title.to_string(),
                description: None,
                image_url: "https://img.example/p.png".to_string(),
                link: None,
                tags: tags.iter().map(|t| t.to_string()).collect(),
            },
        );
        pin.created_at = Utc::now() - Duration::hours(age_hours);
        pin
    }

    async fn seeded_store(titles: &[&str]) -> (Arc<MemoryStore>, Vec<Pin>) {
        let store = Arc::new(MemoryStore::new());
        let user = User::new("ada");
        store.add_user(user.clone()).await;
        let mut pins = Vec::new();
        for (i, title) in titles.iter().enumerate() {
            let pin = new_pin(&user, title, &["misc"], i as i64);
            store.insert_pin(pin.clone()).await.unwrap();
            pins.push(pin);
        }
        (store, pins)
    }

    #[tokio::test]
    async fn test_hydrate_preserves_requested_order() {
        let (store, pins) = seeded_store(&["a", "b", "c"]).await;
        let order = vec![pins[2].id, pins[0].id, pins[1].id];
        let hydrated = hydrate(store.as_ref(), &order).await.unwrap();
        let ids: Vec<_> = hydrated.iter().map(|p| p.id).collect();
        assert_eq!(ids, order);
    }

    #[tokio::test]
    async fn test_hydrate_drops_unknown_ids() {
        let (store, pins) = seeded_store(&["a", "b"]).await;
        let order = vec![pins[1].id, PinId::new(), pins[0].id];
        let hydrated = hydrate(store.as_ref(), &order).await.unwrap();
        let ids: Vec<_> = hydrated.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![pins[1].id, pins[0].id]);
    }

    #[tokio::test]
    async fn test_index_order_survives_hydration() {
        let (store, pins) = seeded_store(&[]).await;
        assert!(pins.is_empty());
        let user = User::new("cook");
        store.add_user(user.clone()).await;

        // title boost ranks the title match first even though it is older
        let best = new_pin(&user, "pizza oven", &["kitchen"], 30);
        let middle = new_pin(&user, "weekend", &["pizza"], 20);
        let mut weakest = new_pin(&user, "dinner", &["family"], 10);
        weakest.description = Some("pizza with the family".to_string());
        for pin in [&weakest, &middle, &best] {
            store.insert_pin(pin.clone()).await.unwrap();
        }

        let index = IndexStore::initialize(IndexLocation::InMemory, Arc::new(IndexHealth::new())).await;
        index
            .bulk_index([&best, &middle, &weakest].iter().map(|p| (*p).into()).collect())
            .await;

        let facade = SearchFacade::new(index, store);
        let result = facade.search("pizza", &[], PageRequest::default()).await.unwrap();
        let ids: Vec<_> = result.pins.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![best.id, middle.id, weakest.id]);
    }

    #[tokio::test]
    async fn test_unavailable_index_uses_fallback() {
        let (store, pins) = seeded_store(&["cat nap", "dog", "Catnip"]).await;
        let health = Arc::new(IndexHealth::with_state(false));
        let facade = SearchFacade::new(IndexStore::unavailable(health), store);

        assert!(matches!(facade.backend(), SearchBackend::Fallback(_)));
        let result = facade.search("cat", &[], PageRequest::default()).await.unwrap();
        let ids: Vec<_> = result.pins.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![pins[0].id, pins[2].id]);
        assert!(facade.suggest("cat", 10).await.is_empty());
        assert_eq!(facade.popular_tags(20).await.unwrap()[0].count, 3);
    }

    #[tokio::test]
    async fn test_index_without_live_backend_uses_fallback_despite_healthy_flag() {
        let (store, pins) = seeded_store(&["cat nap", "dog"]).await;
        let health = Arc::new(IndexHealth::with_state(true));
        let facade = SearchFacade::new(IndexStore::unavailable(health), store);

        assert!(matches!(facade.backend(), SearchBackend::Fallback(_)));
        let result = facade.search("cat", &[], PageRequest::default()).await.unwrap();
        let ids: Vec<_> = result.pins.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![pins[0].id]);
    }

    #[tokio::test]
    async fn test_both_backends_share_the_envelope_shape() {
        let titles: Vec<String> = (0..5).map(|i| format!("lamp {}", i)).collect();
        let title_refs: Vec<&str> = titles.iter().map(String::as_str).collect();
        let (store, pins) = seeded_store(&title_refs).await;

        let index = IndexStore::initialize(IndexLocation::InMemory, Arc::new(IndexHealth::new())).await;
        index.bulk_index(pins.iter().map(Into::into).collect()).await;
        let indexed = SearchFacade::new(index, store.clone());
        let fallback = SearchFacade::new(
            IndexStore::unavailable(Arc::new(IndexHealth::new())),
            store,
        );

        let page = PageRequest { page: 2, limit: 2 };
        let a = indexed.search("lamp", &[], page).await.unwrap();
        let b = fallback.search("lamp", &[], page).await.unwrap();
        assert_eq!(a.pagination, b.pagination);
        assert_eq!(a.pagination.total_pages, 3);
        assert_eq!(a.pins.len(), b.pins.len());
    }

    /// A store whose every query fails
    struct DownStore;

    #[async_trait]
    impl PinStore for DownStore {
        async fn user(&self, _: UserId) -> thumbtrack_store::Result<Option<User>> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn pins_by_ids(&self, _: &[PinId]) -> thumbtrack_store::Result<Vec<Pin>> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn all_pins(&self) -> thumbtrack_store::Result<Vec<Pin>> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn all_pin_tags(&self) -> thumbtrack_store::Result<Vec<Vec<String>>> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn filter_pins(
            &self,
            _: &PinFilter,
            _: usize,
            _: usize,
        ) -> thumbtrack_store::Result<(Vec<Pin>, u64)> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn saved_pins_on_owned_boards(
            &self,
            _: UserId,
            _: Option<usize>,
        ) -> thumbtrack_store::Result<Vec<Pin>> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn saved_pins_on_member_boards(
            &self,
            _: UserId,
            _: Option<usize>,
        ) -> thumbtrack_store::Result<Vec<Pin>> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn pins_by_author(&self, _: UserId, _: Option<usize>) -> thumbtrack_store::Result<Vec<Pin>> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn followed_user_ids(
            &self,
            _: UserId,
            _: Option<usize>,
        ) -> thumbtrack_store::Result<Vec<UserId>> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn pins_by_authors(&self, _: &[UserId], _: usize) -> thumbtrack_store::Result<Vec<Pin>> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn pins_created_since(&self, _: DateTime<Utc>) -> thumbtrack_store::Result<Vec<Pin>> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn recent_pins_excluding(
            &self,
            _: &HashSet<PinId>,
            _: usize,
        ) -> thumbtrack_store::Result<Vec<Pin>> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn engagement(&self, _: &[PinId]) -> thumbtrack_store::Result<HashMap<PinId, Engagement>> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn insert_pin(&self, _: Pin) -> thumbtrack_store::Result<()> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn update_pin(&self, _: Pin) -> thumbtrack_store::Result<()> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn delete_pin(&self, _: PinId) -> thumbtrack_store::Result<Option<Pin>> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn record_view(&self, _: PinView) -> thumbtrack_store::Result<()> {
            Err(StoreError::Unavailable("down".into()))
        }
    }

    #[tokio::test]
    async fn test_store_outage_propagates_on_both_paths() {
        let down: Arc<dyn PinStore> = Arc::new(DownStore);
        let fallback = SearchFacade::new(
            IndexStore::unavailable(Arc::new(IndexHealth::new())),
            Arc::clone(&down),
        );
        assert!(fallback.search("x", &[], PageRequest::default()).await.is_err());

        let index = IndexStore::initialize(IndexLocation::InMemory, Arc::new(IndexHealth::new())).await;
        let user = User::new("ada");
        index.index_document((&new_pin(&user, "x ray", &[], 1)).into()).await;
        let indexed = SearchFacade::new(index, down);
        assert!(indexed.search("x ray", &[], PageRequest::default()).await.is_err());
    }
}
