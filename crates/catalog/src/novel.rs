//! Novel entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fablecast_core::{AuthorId, CategoryId, Entity, NovelId};

/// A novel in the catalog.
///
/// Soft-deletable: `deleted_at` set instead of removal, and deleted novels
/// are invisible to every read path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Novel {
    pub id: NovelId,
    pub title: String,
    pub summary: String,
    pub cover_image_url: Option<String>,
    pub publication_year: Option<i32>,
    pub is_completed: bool,
    pub view_count: u64,
    pub author_ids: Vec<AuthorId>,
    pub category_ids: Vec<CategoryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Novel {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

impl Entity for Novel {
    type Id = NovelId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
