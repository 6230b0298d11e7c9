//! Pin lifecycle hooks: store first, index second
//!
//! The store write decides the outcome. The index write that follows is best
//! effort and is never rolled back or reported; `reindex_all` repairs drift.

use std::sync::Arc;

use thumbtrack_core::{NewPin, Pin, PinId, PinUpdate, SearchDocument, UserId};
use thumbtrack_store::{PinStore, StoreError};
use tracing::{info, warn};

use crate::error::{Result, SearchError};
use crate::index::IndexStore;

#[derive(Clone)]
pub struct PinLifecycle {
    store: Arc<dyn PinStore>,
    index: IndexStore,
}

impl PinLifecycle {
    pub fn new(store: Arc<dyn PinStore>, index: IndexStore) -> Self {
        Self { store, index }
    }

    /// Create a pin for `author` and index it
    pub async fn create_pin(&self, author: UserId, input: NewPin) -> Result<Pin> {
        input.validate()?;
        let user = self
            .store
            .user(author)
            .await?
            .ok_or(StoreError::UserNotFound(author))?;

        let pin = Pin::new(user.author(), input);
        self.store.insert_pin(pin.clone()).await?;
        self.index.index_document(SearchDocument::from(&pin)).await;

        info!("Created pin '{}' ({})", pin.title, pin.id);
        Ok(pin)
    }

    /// Apply `update` to a pin the caller authored and reindex it
    pub async fn update_pin(&self, caller: UserId, id: PinId, update: PinUpdate) -> Result<Pin> {
        update.validate()?;
        let mut pin = self.owned_pin(caller, id).await?;

        update.apply(&mut pin);
        self.store.update_pin(pin.clone()).await?;
        self.index.index_document(SearchDocument::from(&pin)).await;

        info!("Updated pin {}", pin.id);
        Ok(pin)
    }

    /// Delete a pin the caller authored and drop it from the index
    pub async fn delete_pin(&self, caller: UserId, id: PinId) -> Result<()> {
        self.owned_pin(caller, id).await?;
        if self.store.delete_pin(id).await?.is_none() {
            return Err(SearchError::PinNotFound(id));
        }
        self.index.remove_document(id).await;

        info!("Deleted pin {}", id);
        Ok(())
    }

    async fn owned_pin(&self, caller: UserId, id: PinId) -> Result<Pin> {
        let pin = self
            .store
            .pins_by_ids(&[id])
            .await?
            .into_iter()
            .next()
            .ok_or(SearchError::PinNotFound(id))?;
        if pin.author.id != caller {
            return Err(SearchError::Forbidden(format!(
                "pin {} belongs to another user",
                id
            )));
        }
        Ok(pin)
    }
}

/// Rebuild the index from every pin in the store
///
/// Returns the number of documents sent, 0 when the index is unavailable.
pub async fn reindex_all(store: &dyn PinStore, index: &IndexStore) -> Result<usize> {
    if !index.is_available() {
        warn!("Search index unavailable, skipping reindex");
        return Ok(0);
    }

    let docs: Vec<SearchDocument> = store.all_pins().await?.iter().map(SearchDocument::from).collect();
    let count = docs.len();
    index.bulk_index(docs).await;

    info!("Reindexed {} pins", count);
    Ok(count)
}
