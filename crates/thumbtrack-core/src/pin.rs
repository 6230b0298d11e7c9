//! Pin types - the bookmarked image that search and feeds revolve around

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::{PinId, UserId};

/// Public identity of a pin's author, embedded in every hydrated pin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: UserId,
    pub username: String,
    pub avatar_url: Option<String>,
}

/// A Pin as held by the relational store (source of truth)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    /// Unique identifier for this pin
    pub id: PinId,

    /// Display title
    pub title: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// URL of the stored image
    pub image_url: String,

    /// Optional outbound link
    pub link: Option<String>,

    /// Tags in author-supplied order
    pub tags: Vec<String>,

    /// Who created the pin
    pub author: Author,

    /// When the pin was created
    pub created_at: DateTime<Utc>,

    /// When the pin was last modified
    pub updated_at: DateTime<Utc>,
}

impl Pin {
    /// Build a pin from validated input, stamped with the current time
    pub fn new(author: Author, input: NewPin) -> Self {
        let now = Utc::now();
        Self {
            id: PinId::new(),
            title: input.title,
            description: input.description,
            image_url: input.image_url,
            link: input.link,
            tags: input.tags,
            author,
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the modified timestamp to now
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Input for creating a pin
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPin {
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
    pub link: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewPin {
    pub const MAX_TITLE_LEN: usize = 100;
    pub const MAX_DESCRIPTION_LEN: usize = 500;
    pub const MAX_TAGS: usize = 10;
    pub const MAX_TAG_LEN: usize = 30;

    /// Check the field limits a pin must respect
    pub fn validate(&self) -> Result<()> {
        validate_title(&self.title)?;
        validate_description(self.description.as_deref())?;
        validate_tags(&self.tags)?;
        if self.image_url.trim().is_empty() {
            return Err(CoreError::InvalidPin("image URL is required".to_string()));
        }
        Ok(())
    }
}

/// Partial update of a pin; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PinUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub link: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl PinUpdate {
    /// Check the field limits of every field being changed
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        validate_description(self.description.as_deref())?;
        if let Some(tags) = &self.tags {
            validate_tags(tags)?;
        }
        Ok(())
    }

    /// Apply the changes to a pin and bump its modified time
    pub fn apply(self, pin: &mut Pin) {
        if let Some(title) = self.title {
            pin.title = title;
        }
        if let Some(description) = self.description {
            pin.description = Some(description);
        }
        if let Some(image_url) = self.image_url {
            pin.image_url = image_url;
        }
        if let Some(link) = self.link {
            pin.link = Some(link);
        }
        if let Some(tags) = self.tags {
            pin.tags = tags;
        }
        pin.touch();
    }
}

fn validate_title(title: &str) -> Result<()> {
    let len = title.chars().count();
    if len == 0 || len > NewPin::MAX_TITLE_LEN {
        return Err(CoreError::InvalidPin(format!(
            "title must be 1-{} characters",
            NewPin::MAX_TITLE_LEN
        )));
    }
    Ok(())
}

fn validate_description(description: Option<&str>) -> Result<()> {
    if description.is_some_and(|d| d.chars().count() > NewPin::MAX_DESCRIPTION_LEN) {
        return Err(CoreError::InvalidPin(format!(
            "description must be at most {} characters",
            NewPin::MAX_DESCRIPTION_LEN
        )));
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> Result<()> {
    if tags.len() > NewPin::MAX_TAGS {
        return Err(CoreError::InvalidPin(format!(
            "at most {} tags allowed",
            NewPin::MAX_TAGS
        )));
    }
    if let Some(tag) = tags.iter().find(|t| t.chars().count() > NewPin::MAX_TAG_LEN) {
        return Err(CoreError::InvalidPin(format!("tag too long: {}", tag)));
    }
    Ok(())
}

/// Aggregate interaction counts for a pin
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub save_count: u64,
    pub comment_count: u64,
}

impl Engagement {
    /// Ranking key for backfilling the for-you feed
    pub fn backfill_score(&self) -> u64 {
        self.save_count + self.comment_count
    }

    /// Ranking key for the trending feed; saves count double
    pub fn trending_score(&self) -> u64 {
        2 * self.save_count + self.comment_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> NewPin {
        NewPin {
            title: "Sourdough crumb".to_string(),
            description: Some("72h cold proof".to_string()),
            image_url: "https://img.example/1.jpg".to_string(),
            link: None,
            tags: vec!["bread".to_string(), "baking".to_string()],
        }
    }

    #[test]
    fn test_new_pin_validates() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_title() {
        let mut pin = input();
        pin.title.clear();
        assert!(matches!(pin.validate(), Err(CoreError::InvalidPin(_))));
    }

    #[test]
    fn test_rejects_too_many_tags() {
        let mut pin = input();
        pin.tags = (0..11).map(|i| format!("t{}", i)).collect();
        assert!(pin.validate().is_err());
    }

    #[test]
    fn test_update_applies_only_given_fields() {
        let author = Author {
            id: UserId::new(),
            username: "baker".to_string(),
            avatar_url: None,
        };
        let mut pin = Pin::new(author, input());
        let update = PinUpdate {
            tags: Some(vec!["rye".to_string()]),
            ..Default::default()
        };
        update.apply(&mut pin);
        assert_eq!(pin.title, "Sourdough crumb");
        assert_eq!(pin.tags, vec!["rye".to_string()]);
    }

    #[test]
    fn test_engagement_scores() {
        let e = Engagement {
            save_count: 3,
            comment_count: 4,
        };
        assert_eq!(e.backfill_score(), 7);
        assert_eq!(e.trending_score(), 10);
    }
}
