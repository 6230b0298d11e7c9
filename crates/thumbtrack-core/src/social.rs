//! Social graph entities - users, boards, saves, follows, comments and views

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Author, BoardId, CommentId, PinId, UserId};

/// A registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with no avatar
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            avatar_url: None,
            created_at: Utc::now(),
        }
    }

    /// The public projection embedded in pins
    pub fn author(&self) -> Author {
        Author {
            id: self.id,
            username: self.username.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

/// A board collects saved pins; it has one owner and optional members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub owner_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub is_private: bool,
    /// Collaborators besides the owner
    pub members: Vec<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Board {
    /// Create a new public board with no members
    pub fn new(owner_id: UserId, name: impl Into<String>) -> Self {
        Self {
            id: BoardId::new(),
            owner_id,
            name: name.into(),
            description: None,
            is_private: false,
            members: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Add a collaborator
    pub fn with_member(mut self, user_id: UserId) -> Self {
        if user_id != self.owner_id && !self.members.contains(&user_id) {
            self.members.push(user_id);
        }
        self
    }

    /// Whether the user owns this board
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }

    /// Whether the user collaborates on this board without owning it
    pub fn has_member(&self, user_id: UserId) -> bool {
        !self.is_owned_by(user_id) && self.members.contains(&user_id)
    }
}

/// A pin saved to a board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPin {
    pub pin_id: PinId,
    pub board_id: BoardId,
    pub created_at: DateTime<Utc>,
}

/// A follow edge from `follower_id` to `following_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Follow {
    pub follower_id: UserId,
    pub following_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// A comment on a pin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub pin_id: PinId,
    pub user_id: UserId,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// An advisory record that a pin was viewed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinView {
    pub pin_id: PinId,
    /// `None` for anonymous viewers
    pub user_id: Option<UserId>,
    pub viewed_at: DateTime<Utc>,
}

impl PinView {
    /// A view recorded now
    pub fn now(pin_id: PinId, user_id: Option<UserId>) -> Self {
        Self {
            pin_id,
            user_id,
            viewed_at: Utc::now(),
        }
    }
}
