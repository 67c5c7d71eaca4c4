//! Catalog storage abstraction + in-memory implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use fablecast_core::{AuthorId, CategoryId, EpisodeId, NovelId, ScriptId};

use crate::author::Author;
use crate::category::Category;
use crate::episode::{Episode, ScriptKind, ScriptRecord};
use crate::novel::Novel;

/// Catalog store error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogStoreError {
    #[error("record not found")]
    NotFound,
    #[error("record already exists: {0}")]
    AlreadyExists(String),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Catalog store abstraction.
///
/// Reads never return soft-deleted rows.
pub trait CatalogStore: Send + Sync {
    fn insert_novel(&self, novel: Novel) -> Result<(), CatalogStoreError>;
    fn get_novel(&self, id: NovelId) -> Result<Option<Novel>, CatalogStoreError>;
    fn update_novel(&self, novel: &Novel) -> Result<(), CatalogStoreError>;
    fn list_novels(&self) -> Result<Vec<Novel>, CatalogStoreError>;

    fn insert_author(&self, author: Author) -> Result<(), CatalogStoreError>;
    fn get_author(&self, id: AuthorId) -> Result<Option<Author>, CatalogStoreError>;
    fn find_author_by_name(&self, name: &str) -> Result<Option<Author>, CatalogStoreError>;
    fn list_authors(&self) -> Result<Vec<Author>, CatalogStoreError>;

    fn insert_category(&self, category: Category) -> Result<(), CatalogStoreError>;
    fn get_category(&self, id: CategoryId) -> Result<Option<Category>, CatalogStoreError>;
    fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, CatalogStoreError>;
    fn list_categories(&self) -> Result<Vec<Category>, CatalogStoreError>;

    fn insert_episode(&self, episode: Episode) -> Result<(), CatalogStoreError>;
    fn get_episode(&self, id: EpisodeId) -> Result<Option<Episode>, CatalogStoreError>;
    fn update_episode(&self, episode: &Episode) -> Result<(), CatalogStoreError>;
    fn episodes_by_novel(&self, novel_id: NovelId) -> Result<Vec<Episode>, CatalogStoreError>;

    fn insert_script(&self, script: ScriptRecord) -> Result<(), CatalogStoreError>;
    fn get_script(&self, id: ScriptId) -> Result<Option<ScriptRecord>, CatalogStoreError>;
    fn script_by_episode(
        &self,
        episode_id: EpisodeId,
        kind: ScriptKind,
    ) -> Result<Option<ScriptRecord>, CatalogStoreError>;
}

/// In-memory catalog store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    novels: RwLock<HashMap<NovelId, Novel>>,
    authors: RwLock<HashMap<AuthorId, Author>>,
    categories: RwLock<HashMap<CategoryId, Category>>,
    episodes: RwLock<HashMap<EpisodeId, Episode>>,
    scripts: RwLock<HashMap<ScriptId, ScriptRecord>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(_: impl core::fmt::Debug) -> CatalogStoreError {
    CatalogStoreError::Storage("catalog store lock poisoned".into())
}

impl CatalogStore for InMemoryCatalogStore {
    fn insert_novel(&self, novel: Novel) -> Result<(), CatalogStoreError> {
        let mut novels = self.novels.write().map_err(poisoned)?;
        if novels.contains_key(&novel.id) {
            return Err(CatalogStoreError::AlreadyExists(novel.id.to_string()));
        }
        novels.insert(novel.id, novel);
        Ok(())
    }

    fn get_novel(&self, id: NovelId) -> Result<Option<Novel>, CatalogStoreError> {
        let novels = self.novels.read().map_err(poisoned)?;
        Ok(novels.get(&id).filter(|n| !n.is_deleted()).cloned())
    }

    fn update_novel(&self, novel: &Novel) -> Result<(), CatalogStoreError> {
        let mut novels = self.novels.write().map_err(poisoned)?;
        if !novels.contains_key(&novel.id) {
            return Err(CatalogStoreError::NotFound);
        }
        novels.insert(novel.id, novel.clone());
        Ok(())
    }

    fn list_novels(&self) -> Result<Vec<Novel>, CatalogStoreError> {
        let novels = self.novels.read().map_err(poisoned)?;
        let mut all: Vec<Novel> = novels.values().filter(|n| !n.is_deleted()).cloned().collect();
        all.sort_by_key(|n| n.created_at);
        Ok(all)
    }

    fn insert_author(&self, author: Author) -> Result<(), CatalogStoreError> {
        let mut authors = self.authors.write().map_err(poisoned)?;
        if authors.values().any(|a| a.name == author.name) {
            return Err(CatalogStoreError::AlreadyExists(author.name));
        }
        authors.insert(author.id, author);
        Ok(())
    }

    fn get_author(&self, id: AuthorId) -> Result<Option<Author>, CatalogStoreError> {
        Ok(self.authors.read().map_err(poisoned)?.get(&id).cloned())
    }

    fn find_author_by_name(&self, name: &str) -> Result<Option<Author>, CatalogStoreError> {
        let authors = self.authors.read().map_err(poisoned)?;
        Ok(authors.values().find(|a| a.name == name).cloned())
    }

    fn list_authors(&self) -> Result<Vec<Author>, CatalogStoreError> {
        let authors = self.authors.read().map_err(poisoned)?;
        let mut all: Vec<Author> = authors.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    fn insert_category(&self, category: Category) -> Result<(), CatalogStoreError> {
        let mut categories = self.categories.write().map_err(poisoned)?;
        if categories.values().any(|c| c.name == category.name) {
            return Err(CatalogStoreError::AlreadyExists(category.name));
        }
        categories.insert(category.id, category);
        Ok(())
    }

    fn get_category(&self, id: CategoryId) -> Result<Option<Category>, CatalogStoreError> {
        Ok(self.categories.read().map_err(poisoned)?.get(&id).cloned())
    }

    fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, CatalogStoreError> {
        let categories = self.categories.read().map_err(poisoned)?;
        Ok(categories.values().find(|c| c.name == name).cloned())
    }

    fn list_categories(&self) -> Result<Vec<Category>, CatalogStoreError> {
        let categories = self.categories.read().map_err(poisoned)?;
        let mut all: Vec<Category> = categories.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    fn insert_episode(&self, episode: Episode) -> Result<(), CatalogStoreError> {
        let mut episodes = self.episodes.write().map_err(poisoned)?;
        if episodes.contains_key(&episode.id) {
            return Err(CatalogStoreError::AlreadyExists(episode.id.to_string()));
        }
        episodes.insert(episode.id, episode);
        Ok(())
    }

    fn get_episode(&self, id: EpisodeId) -> Result<Option<Episode>, CatalogStoreError> {
        let episodes = self.episodes.read().map_err(poisoned)?;
        Ok(episodes.get(&id).filter(|e| !e.is_deleted()).cloned())
    }

    fn update_episode(&self, episode: &Episode) -> Result<(), CatalogStoreError> {
        let mut episodes = self.episodes.write().map_err(poisoned)?;
        if !episodes.contains_key(&episode.id) {
            return Err(CatalogStoreError::NotFound);
        }
        episodes.insert(episode.id, episode.clone());
        Ok(())
    }

    fn episodes_by_novel(&self, novel_id: NovelId) -> Result<Vec<Episode>, CatalogStoreError> {
        let episodes = self.episodes.read().map_err(poisoned)?;
        let mut all: Vec<Episode> = episodes
            .values()
            .filter(|e| e.novel_id == novel_id && !e.is_deleted())
            .cloned()
            .collect();
        all.sort_by_key(|e| e.chapter_number);
        Ok(all)
    }

    fn insert_script(&self, script: ScriptRecord) -> Result<(), CatalogStoreError> {
        let mut scripts = self.scripts.write().map_err(poisoned)?;
        scripts.insert(script.id, script);
        Ok(())
    }

    fn get_script(&self, id: ScriptId) -> Result<Option<ScriptRecord>, CatalogStoreError> {
        Ok(self.scripts.read().map_err(poisoned)?.get(&id).cloned())
    }

    fn script_by_episode(
        &self,
        episode_id: EpisodeId,
        kind: ScriptKind,
    ) -> Result<Option<ScriptRecord>, CatalogStoreError> {
        let scripts = self.scripts.read().map_err(poisoned)?;
        Ok(scripts
            .values()
            .find(|s| s.episode_id == episode_id && s.kind == kind)
            .cloned())
    }
}
