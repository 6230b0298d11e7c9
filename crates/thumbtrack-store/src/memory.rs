//! In-process store implementation with JSON snapshots

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thumbtrack_core::{
    Board, BoardId, Comment, CommentId, Engagement, Follow, Pin, PinId, PinView, SavedPin, User,
    UserId,
};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::store::{PinFilter, PinStore};

/// On-disk layout of a store snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Schema version for forward compatibility
    pub version: u32,
    pub users: Vec<User>,
    pub pins: Vec<Pin>,
    pub boards: Vec<Board>,
    pub saved_pins: Vec<SavedPin>,
    pub follows: Vec<Follow>,
    pub comments: Vec<Comment>,
    pub views: Vec<PinView>,
}

impl Snapshot {
    /// Current schema version
    pub const CURRENT_VERSION: u32 = 1;
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    pins: HashMap<PinId, Pin>,
    boards: HashMap<BoardId, Board>,
    saved_pins: Vec<SavedPin>,
    follows: Vec<Follow>,
    comments: Vec<Comment>,
    views: Vec<PinView>,
}

impl Tables {
    fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            users: snapshot.users.into_iter().map(|u| (u.id, u)).collect(),
            pins: snapshot.pins.into_iter().map(|p| (p.id, p)).collect(),
            boards: snapshot.boards.into_iter().map(|b| (b.id, b)).collect(),
            saved_pins: snapshot.saved_pins,
            follows: snapshot.follows,
            comments: snapshot.comments,
            views: snapshot.views,
        }
    }

    fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            version: Snapshot::CURRENT_VERSION,
            users: self.users.values().cloned().collect(),
            pins: self.pins.values().cloned().collect(),
            boards: self.boards.values().cloned().collect(),
            saved_pins: self.saved_pins.clone(),
            follows: self.follows.clone(),
            comments: self.comments.clone(),
            views: self.views.clone(),
        }
    }

    /// Pins saved to the selected boards, one per save, newest save first
    fn saved_pins_where(
        &self,
        board_filter: impl Fn(&Board) -> bool,
        take: Option<usize>,
    ) -> Vec<Pin> {
        let boards: HashSet<BoardId> = self
            .boards
            .values()
            .filter(|b| board_filter(*b))
            .map(|b| b.id)
            .collect();

        let mut saves: Vec<&SavedPin> = self
            .saved_pins
            .iter()
            .filter(|s| boards.contains(&s.board_id))
            .collect();
        saves.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        saves
            .into_iter()
            .filter_map(|s| self.pins.get(&s.pin_id).cloned())
            .take(take.unwrap_or(usize::MAX))
            .collect()
    }

    /// Pins passing `keep`, newest first
    fn pins_where(&self, keep: impl Fn(&Pin) -> bool) -> Vec<Pin> {
        let mut pins: Vec<Pin> = self.pins.values().filter(|p| keep(*p)).cloned().collect();
        newest_first(&mut pins);
        pins
    }
}

fn newest_first(pins: &mut [Pin]) {
    pins.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

/// A store held entirely in memory
///
/// Optionally backed by a snapshot file:
/// ```text
/// thumbtrack.json   # users, pins, boards, saves, follows, comments, views
/// ```
pub struct MemoryStore {
    tables: RwLock<Tables>,
    snapshot_path: Option<PathBuf>,
}

impl MemoryStore {
    /// Create an empty store with no snapshot file
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            snapshot_path: None,
        }
    }

    /// Open a store from a snapshot file, starting empty if the file does not exist yet
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if path.is_dir() {
            return Err(StoreError::InvalidPath(format!(
                "Snapshot path is a directory: {}",
                path.display()
            )));
        }

        let tables = if path.exists() {
            let json = fs::read_to_string(&path).await?;
            let snapshot: Snapshot = serde_json::from_str(&json)?;
            info!(
                "Opened snapshot {:?} ({} pins, {} users)",
                path,
                snapshot.pins.len(),
                snapshot.users.len()
            );
            Tables::from_snapshot(snapshot)
        } else {
            info!("No snapshot at {:?}, starting empty", path);
            Tables::default()
        };

        Ok(Self {
            tables: RwLock::new(tables),
            snapshot_path: Some(path),
        })
    }

    /// Write the current contents to the snapshot file, if one is configured
    pub async fn save(&self) -> Result<()> {
        let Some(path) = &self.snapshot_path else {
            debug!("No snapshot path configured, skipping save");
            return Ok(());
        };

        let json = {
            let tables = self.tables.read().await;
            serde_json::to_string_pretty(&tables.to_snapshot())?
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, json).await?;

        debug!("Saved snapshot to {:?}", path);
        Ok(())
    }

    /// Add a user
    pub async fn add_user(&self, user: User) -> UserId {
        let id = user.id;
        self.tables.write().await.users.insert(id, user);
        id
    }

    /// Add a board
    pub async fn add_board(&self, board: Board) -> BoardId {
        let id = board.id;
        self.tables.write().await.boards.insert(id, board);
        id
    }

    /// Save a pin to a board now
    pub async fn save_pin(&self, board_id: BoardId, pin_id: PinId) {
        self.save_pin_at(board_id, pin_id, Utc::now()).await;
    }

    /// Save a pin to a board at a given time
    pub async fn save_pin_at(&self, board_id: BoardId, pin_id: PinId, at: DateTime<Utc>) {
        self.tables.write().await.saved_pins.push(SavedPin {
            pin_id,
            board_id,
            created_at: at,
        });
    }

    /// Record that `follower` follows `following`
    pub async fn follow(&self, follower: UserId, following: UserId) {
        let mut tables = self.tables.write().await;
        let exists = tables
            .follows
            .iter()
            .any(|f| f.follower_id == follower && f.following_id == following);
        if !exists {
            tables.follows.push(Follow {
                follower_id: follower,
                following_id: following,
                created_at: Utc::now(),
            });
        }
    }

    /// Add a comment to a pin
    pub async fn add_comment(&self, pin_id: PinId, user_id: UserId, body: impl Into<String>) -> CommentId {
        let comment = Comment {
            id: CommentId::new(),
            pin_id,
            user_id,
            body: body.into(),
            created_at: Utc::now(),
        };
        let id = comment.id;
        self.tables.write().await.comments.push(comment);
        id
    }

    /// Every recorded view, oldest first
    pub async fn views(&self) -> Vec<PinView> {
        self.tables.read().await.views.clone()
    }

    /// Number of pins held
    pub async fn pin_count(&self) -> usize {
        self.tables.read().await.pins.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PinStore for MemoryStore {
    async fn user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn pins_by_ids(&self, ids: &[PinId]) -> Result<Vec<Pin>> {
        let tables = self.tables.read().await;
        let wanted: HashSet<&PinId> = ids.iter().collect();
        // HashMap iteration order, deliberately unrelated to `ids`
        Ok(tables
            .pins
            .values()
            .filter(|p| wanted.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn all_pins(&self) -> Result<Vec<Pin>> {
        Ok(self.tables.read().await.pins_where(|_| true))
    }

    async fn all_pin_tags(&self) -> Result<Vec<Vec<String>>> {
        let tables = self.tables.read().await;
        Ok(tables.pins.values().map(|p| p.tags.clone()).collect())
    }

    async fn filter_pins(
        &self,
        filter: &PinFilter,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<Pin>, u64)> {
        let matching = self.tables.read().await.pins_where(|p| filter.matches(p));
        let total = matching.len() as u64;
        let page = matching.into_iter().skip(offset).take(limit).collect();
        Ok((page, total))
    }

    async fn saved_pins_on_owned_boards(&self, user: UserId, take: Option<usize>) -> Result<Vec<Pin>> {
        let tables = self.tables.read().await;
        Ok(tables.saved_pins_where(|b| b.is_owned_by(user), take))
    }

    async fn saved_pins_on_member_boards(
        &self,
        user: UserId,
        take: Option<usize>,
    ) -> Result<Vec<Pin>> {
        let tables = self.tables.read().await;
        Ok(tables.saved_pins_where(|b| b.has_member(user), take))
    }

    async fn pins_by_author(&self, user: UserId, take: Option<usize>) -> Result<Vec<Pin>> {
        let tables = self.tables.read().await;
        let mut pins = tables.pins_where(|p| p.author.id == user);
        pins.truncate(take.unwrap_or(usize::MAX));
        Ok(pins)
    }

    async fn followed_user_ids(&self, user: UserId, take: Option<usize>) -> Result<Vec<UserId>> {
        let tables = self.tables.read().await;
        let mut follows: Vec<&Follow> = tables
            .follows
            .iter()
            .filter(|f| f.follower_id == user)
            .collect();
        follows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(follows
            .into_iter()
            .map(|f| f.following_id)
            .take(take.unwrap_or(usize::MAX))
            .collect())
    }

    async fn pins_by_authors(&self, authors: &[UserId], take: usize) -> Result<Vec<Pin>> {
        let tables = self.tables.read().await;
        let mut pins = tables.pins_where(|p| authors.contains(&p.author.id));
        pins.truncate(take);
        Ok(pins)
    }

    async fn pins_created_since(&self, since: DateTime<Utc>) -> Result<Vec<Pin>> {
        Ok(self.tables.read().await.pins_where(|p| p.created_at >= since))
    }

    async fn recent_pins_excluding(
        &self,
        excluded: &HashSet<PinId>,
        take: usize,
    ) -> Result<Vec<Pin>> {
        let tables = self.tables.read().await;
        let mut pins = tables.pins_where(|p| !excluded.contains(&p.id));
        pins.truncate(take);
        Ok(pins)
    }

    async fn engagement(&self, ids: &[PinId]) -> Result<HashMap<PinId, Engagement>> {
        let tables = self.tables.read().await;
        let mut counts: HashMap<PinId, Engagement> =
            ids.iter().map(|id| (*id, Engagement::default())).collect();

        for save in &tables.saved_pins {
            if let Some(e) = counts.get_mut(&save.pin_id) {
                e.save_count += 1;
            }
        }
        for comment in &tables.comments {
            if let Some(e) = counts.get_mut(&comment.pin_id) {
                e.comment_count += 1;
            }
        }
        Ok(counts)
    }

    async fn insert_pin(&self, pin: Pin) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&pin.author.id) {
            return Err(StoreError::UserNotFound(pin.author.id));
        }
        debug!("Inserted pin {}", pin.id);
        tables.pins.insert(pin.id, pin);
        Ok(())
    }

    async fn update_pin(&self, pin: Pin) -> Result<()> {
        let mut tables = self.tables.write().await;
        match tables.pins.get_mut(&pin.id) {
            Some(existing) => {
                *existing = pin;
                Ok(())
            }
            None => Err(StoreError::PinNotFound(pin.id)),
        }
    }

    async fn delete_pin(&self, id: PinId) -> Result<Option<Pin>> {
        let mut tables = self.tables.write().await;
        let removed = tables.pins.remove(&id);
        if removed.is_some() {
            tables.saved_pins.retain(|s| s.pin_id != id);
            tables.comments.retain(|c| c.pin_id != id);
            debug!("Deleted pin {}", id);
        }
        Ok(removed)
    }

    async fn record_view(&self, view: PinView) -> Result<()> {
        self.tables.write().await.views.push(view);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;
    use thumbtrack_core::NewPin;

    async fn user(store: &MemoryStore, name: &str) -> User {
        let user = User::new(name);
        store.add_user(user.clone()).await;
        user
    }

    async fn pin(store: &MemoryStore, author: &User, title: &str, age_days: i64) -> Pin {
        let mut pin = Pin::new(
            author.author(),
            NewPin {
                title: title.to_string(),
                image_url: "https://img.example/p.png".to_string(),
                tags: vec!["misc".to_string()],
                ..Default::default()
            },
        );
        pin.created_at = Utc::now() - Duration::days(age_days);
        store.insert_pin(pin.clone()).await.unwrap();
        pin
    }

    #[tokio::test]
    async fn test_insert_requires_known_author() {
        let store = MemoryStore::new();
        let stranger = User::new("ghost");
        let pin = Pin::new(
            stranger.author(),
            NewPin {
                title: "x".to_string(),
                image_url: "https://img.example/x.png".to_string(),
                ..Default::default()
            },
        );
        assert!(matches!(
            store.insert_pin(pin).await,
            Err(StoreError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_filter_pins_is_newest_first_and_paginated() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada").await;
        let old = pin(&store, &ada, "cat old", 3).await;
        let mid = pin(&store, &ada, "cat mid", 2).await;
        let new = pin(&store, &ada, "cat new", 1).await;
        pin(&store, &ada, "dog", 0).await;

        let filter = PinFilter::new("cat", &[]);
        let (page, total) = store.filter_pins(&filter, 0, 2).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.iter().map(|p| p.id).collect::<Vec<_>>(), vec![new.id, mid.id]);

        let (page, _) = store.filter_pins(&filter, 2, 2).await.unwrap();
        assert_eq!(page.iter().map(|p| p.id).collect::<Vec<_>>(), vec![old.id]);
    }

    #[tokio::test]
    async fn test_saved_pins_split_by_ownership() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada").await;
        let bob = user(&store, "bob").await;
        let p1 = pin(&store, &bob, "one", 1).await;
        let p2 = pin(&store, &bob, "two", 1).await;

        let own = store.add_board(Board::new(ada.id, "mine")).await;
        let shared = store
            .add_board(Board::new(bob.id, "shared").with_member(ada.id))
            .await;
        store.save_pin_at(own, p1.id, Utc::now() - Duration::hours(2)).await;
        store.save_pin_at(own, p2.id, Utc::now() - Duration::hours(1)).await;
        store.save_pin(shared, p1.id).await;

        let owned = store.saved_pins_on_owned_boards(ada.id, None).await.unwrap();
        assert_eq!(owned.iter().map(|p| p.id).collect::<Vec<_>>(), vec![p2.id, p1.id]);

        let owned = store.saved_pins_on_owned_boards(ada.id, Some(1)).await.unwrap();
        assert_eq!(owned.len(), 1);

        let member = store.saved_pins_on_member_boards(ada.id, None).await.unwrap();
        assert_eq!(member.iter().map(|p| p.id).collect::<Vec<_>>(), vec![p1.id]);

        // bob owns the shared board, so it is not a member board for him
        assert!(store.saved_pins_on_member_boards(bob.id, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_engagement_counts_saves_and_comments() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada").await;
        let p = pin(&store, &ada, "p", 0).await;
        let quiet = pin(&store, &ada, "quiet", 0).await;
        let board = store.add_board(Board::new(ada.id, "b")).await;
        store.save_pin(board, p.id).await;
        store.save_pin(board, p.id).await;
        store.add_comment(p.id, ada.id, "nice").await;

        let counts = store.engagement(&[p.id, quiet.id]).await.unwrap();
        assert_eq!(counts[&p.id], Engagement { save_count: 2, comment_count: 1 });
        assert_eq!(counts[&quiet.id], Engagement::default());
    }

    #[tokio::test]
    async fn test_delete_cascades_to_saves_and_comments() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada").await;
        let p = pin(&store, &ada, "p", 0).await;
        let board = store.add_board(Board::new(ada.id, "b")).await;
        store.save_pin(board, p.id).await;
        store.add_comment(p.id, ada.id, "hi").await;

        assert!(store.delete_pin(p.id).await.unwrap().is_some());
        assert!(store.delete_pin(p.id).await.unwrap().is_none());
        assert!(store.saved_pins_on_owned_boards(ada.id, None).await.unwrap().is_empty());
        let counts = store.engagement(&[p.id]).await.unwrap();
        assert_eq!(counts[&p.id], Engagement::default());
    }

    #[tokio::test]
    async fn test_pins_created_since_and_excluding() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada").await;
        let fresh = pin(&store, &ada, "fresh", 1).await;
        let stale = pin(&store, &ada, "stale", 9).await;

        let window = store
            .pins_created_since(Utc::now() - Duration::days(7))
            .await
            .unwrap();
        assert_eq!(window.iter().map(|p| p.id).collect::<Vec<_>>(), vec![fresh.id]);

        let excluded: HashSet<PinId> = [fresh.id].into_iter().collect();
        let rest = store.recent_pins_excluding(&excluded, 10).await.unwrap();
        assert_eq!(rest.iter().map(|p| p.id).collect::<Vec<_>>(), vec![stale.id]);
    }

    #[tokio::test]
    async fn test_snapshot_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("thumbtrack.json");

        let store = MemoryStore::open(&path).await.unwrap();
        let ada = user(&store, "ada").await;
        let p = pin(&store, &ada, "kept", 0).await;
        store.follow(ada.id, UserId::new()).await;
        store.save().await.unwrap();
        assert!(path.exists());

        let reopened = MemoryStore::open(&path).await.unwrap();
        assert_eq!(reopened.pin_count().await, 1);
        assert_eq!(reopened.pins_by_ids(&[p.id]).await.unwrap()[0].title, "kept");
        assert_eq!(reopened.followed_user_ids(ada.id, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_open_rejects_directory() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            MemoryStore::open(dir.path()).await,
            Err(StoreError::InvalidPath(_))
        ));
    }
}
