//! Catalog business rules (novel/episode CRUD orchestration).

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use fablecast_core::{DomainError, EpisodeId, NovelId, Page};

use crate::author::Author;
use crate::category::Category;
use crate::episode::{Episode, ReleaseStatus, ScriptKind, ScriptRecord};
use crate::novel::Novel;
use crate::store::{CatalogStore, CatalogStoreError};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] CatalogStoreError),
}

/// Input for novel create/update.
#[derive(Debug, Clone)]
pub struct NovelDraft {
    pub title: String,
    pub summary: String,
    pub cover_image_url: Option<String>,
    pub publication_year: Option<i32>,
    pub is_completed: bool,
    pub author: String,
    pub categories: Vec<String>,
}

/// Input for episode create/update.
#[derive(Debug, Clone)]
pub struct EpisodeDraft {
    pub title: String,
    pub release_status: ReleaseStatus,
    pub scheduled_release_date: Option<chrono::DateTime<chrono::Utc>>,
}

/// A novel with its author/category names resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NovelSummary {
    pub novel: Novel,
    pub authors: Vec<String>,
    pub categories: Vec<String>,
}

/// Catalog CRUD service.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Create a novel, creating its author and categories by name if needed.
    ///
    /// The same title may exist under different authors; the (title, author)
    /// pair must be unique.
    pub fn create_novel(&self, draft: NovelDraft) -> Result<NovelSummary, CatalogError> {
        if draft.title.trim().is_empty() {
            return Err(DomainError::validation("novel title must not be empty").into());
        }

        if self.title_author_pair_exists(&draft.title, &draft.author, None)? {
            return Err(DomainError::conflict(format!(
                "novel '{}' by '{}' already exists",
                draft.title, draft.author
            ))
            .into());
        }

        let author = self.find_or_create_author(&draft.author)?;
        let categories = self.find_or_create_categories(&draft.categories)?;

        let now = Utc::now();
        let novel = Novel {
            id: NovelId::new(),
            title: draft.title,
            summary: draft.summary,
            cover_image_url: draft.cover_image_url,
            publication_year: draft.publication_year,
            is_completed: draft.is_completed,
            view_count: 0,
            author_ids: vec![author.id],
            category_ids: categories.iter().map(|c| c.id).collect(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.store.insert_novel(novel.clone())?;
        info!(novel_id = %novel.id, title = %novel.title, "novel created");

        Ok(NovelSummary {
            novel,
            authors: vec![author.name],
            categories: categories.into_iter().map(|c| c.name).collect(),
        })
    }

    pub fn update_novel(
        &self,
        id: NovelId,
        draft: NovelDraft,
    ) -> Result<NovelSummary, CatalogError> {
        let mut novel = self.require_novel(id)?;

        if self.title_author_pair_exists(&draft.title, &draft.author, Some(id))? {
            return Err(DomainError::conflict(format!(
                "novel '{}' by '{}' already exists",
                draft.title, draft.author
            ))
            .into());
        }

        let author = self.find_or_create_author(&draft.author)?;
        let categories = self.find_or_create_categories(&draft.categories)?;

        novel.title = draft.title;
        novel.summary = draft.summary;
        novel.cover_image_url = draft.cover_image_url;
        novel.publication_year = draft.publication_year;
        novel.is_completed = draft.is_completed;
        novel.author_ids = vec![author.id];
        novel.category_ids = categories.iter().map(|c| c.id).collect();
        novel.updated_at = Utc::now();
        self.store.update_novel(&novel)?;

        Ok(NovelSummary {
            novel,
            authors: vec![author.name],
            categories: categories.into_iter().map(|c| c.name).collect(),
        })
    }

    pub fn novel_detail(&self, id: NovelId) -> Result<NovelSummary, CatalogError> {
        let novel = self.require_novel(id)?;
        self.summarize(novel)
    }

    pub fn list_novels(&self, page: usize, size: usize) -> Result<Page<NovelSummary>, CatalogError> {
        let novels = self.store.list_novels()?;
        let paged = Page::slice(novels, page, size)?;
        self.summarize_page(paged)
    }

    /// Case-insensitive title substring search.
    pub fn search_novels(
        &self,
        query: &str,
        page: usize,
        size: usize,
    ) -> Result<Page<NovelSummary>, CatalogError> {
        let needle = query.to_lowercase();
        let novels = self
            .store
            .list_novels()?
            .into_iter()
            .filter(|n| n.title.to_lowercase().contains(&needle))
            .collect();
        let paged = Page::slice(novels, page, size)?;
        self.summarize_page(paged)
    }

    pub fn delete_novel(&self, id: NovelId) -> Result<(), CatalogError> {
        let mut novel = self.require_novel(id)?;
        novel.deleted_at = Some(Utc::now());
        self.store.update_novel(&novel)?;
        Ok(())
    }

    /// Create an episode plus its script record.
    ///
    /// Chapter numbers are assigned sequentially per novel; a title may not
    /// repeat within a novel.
    pub fn create_episode(
        &self,
        novel_id: NovelId,
        draft: EpisodeDraft,
    ) -> Result<(Episode, ScriptRecord), CatalogError> {
        let novel = self.require_novel(novel_id)?;

        let siblings = self.store.episodes_by_novel(novel_id)?;
        if siblings.iter().any(|e| e.title == draft.title) {
            return Err(DomainError::conflict(format!(
                "episode '{}' already exists in novel {}",
                draft.title, novel_id
            ))
            .into());
        }
        let chapter_number = siblings.iter().map(|e| e.chapter_number).max().unwrap_or(0) + 1;

        let now = Utc::now();
        let episode = Episode {
            id: EpisodeId::new(),
            novel_id: novel.id,
            title: draft.title,
            chapter_number,
            release_status: draft.release_status,
            scheduled_release_date: draft.scheduled_release_date,
            released_date: (draft.release_status == ReleaseStatus::Public).then_some(now),
            view_count: 0,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.store.insert_episode(episode.clone())?;

        let script_id = fablecast_core::ScriptId::new();
        let script = ScriptRecord {
            id: script_id,
            episode_id: episode.id,
            kind: ScriptKind::Script,
            path: ScriptRecord::script_path(novel.id, episode.id, script_id),
            created_at: now,
        };
        self.store.insert_script(script.clone())?;

        info!(episode_id = %episode.id, novel_id = %novel.id,
              chapter = episode.chapter_number, "episode created");
        Ok((episode, script))
    }

    pub fn update_episode(
        &self,
        id: EpisodeId,
        draft: EpisodeDraft,
    ) -> Result<Episode, CatalogError> {
        let mut episode = self.require_episode(id)?;

        let siblings = self.store.episodes_by_novel(episode.novel_id)?;
        if siblings.iter().any(|e| e.title == draft.title && e.id != id) {
            return Err(DomainError::conflict(format!(
                "episode '{}' already exists in novel {}",
                draft.title, episode.novel_id
            ))
            .into());
        }

        episode.title = draft.title;
        episode.scheduled_release_date = draft.scheduled_release_date;
        if draft.release_status == ReleaseStatus::Public
            && episode.release_status != ReleaseStatus::Public
        {
            episode.released_date = Some(Utc::now());
        }
        episode.release_status = draft.release_status;
        episode.updated_at = Utc::now();
        self.store.update_episode(&episode)?;
        Ok(episode)
    }

    pub fn episode_detail(&self, id: EpisodeId) -> Result<Episode, CatalogError> {
        self.require_episode(id)
    }

    pub fn episodes_of_novel(&self, novel_id: NovelId) -> Result<Vec<Episode>, CatalogError> {
        self.require_novel(novel_id)?;
        Ok(self.store.episodes_by_novel(novel_id)?)
    }

    pub fn delete_episode(&self, id: EpisodeId) -> Result<(), CatalogError> {
        let mut episode = self.require_episode(id)?;
        episode.deleted_at = Some(Utc::now());
        self.store.update_episode(&episode)?;
        Ok(())
    }

    pub fn script_for_episode(&self, id: EpisodeId) -> Result<ScriptRecord, CatalogError> {
        self.store
            .script_by_episode(id, ScriptKind::Script)?
            .ok_or_else(|| DomainError::not_found().into())
    }

    /// Record the generated-audio artifact for an episode once narration
    /// has produced it.
    pub fn record_audio(
        &self,
        episode_id: EpisodeId,
        audio_id: uuid::Uuid,
    ) -> Result<ScriptRecord, CatalogError> {
        let episode = self.require_episode(episode_id)?;
        let id = fablecast_core::ScriptId::from_uuid(audio_id);
        let record = ScriptRecord {
            id,
            episode_id,
            kind: ScriptKind::Audio,
            path: ScriptRecord::audio_path(episode.novel_id, episode_id, id),
            created_at: Utc::now(),
        };
        self.store.insert_script(record.clone())?;
        info!(episode_id = %episode_id, audio_id = %audio_id, "audio artifact recorded");
        Ok(record)
    }

    pub fn list_authors(&self) -> Result<Vec<Author>, CatalogError> {
        Ok(self.store.list_authors()?)
    }

    pub fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        Ok(self.store.list_categories()?)
    }

    fn require_novel(&self, id: NovelId) -> Result<Novel, CatalogError> {
        self.store
            .get_novel(id)?
            .ok_or_else(|| DomainError::not_found().into())
    }

    fn require_episode(&self, id: EpisodeId) -> Result<Episode, CatalogError> {
        self.store
            .get_episode(id)?
            .ok_or_else(|| DomainError::not_found().into())
    }

    fn title_author_pair_exists(
        &self,
        title: &str,
        author: &str,
        exclude: Option<NovelId>,
    ) -> Result<bool, CatalogError> {
        let Some(author) = self.store.find_author_by_name(author)? else {
            return Ok(false);
        };
        Ok(self
            .store
            .list_novels()?
            .iter()
            .any(|n| n.title == title && n.author_ids.contains(&author.id) && Some(n.id) != exclude))
    }

    fn find_or_create_author(&self, name: &str) -> Result<Author, CatalogError> {
        if name.trim().is_empty() {
            return Err(DomainError::validation("author name must not be empty").into());
        }
        if let Some(author) = self.store.find_author_by_name(name)? {
            return Ok(author);
        }
        let author = Author {
            id: fablecast_core::AuthorId::new(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        self.store.insert_author(author.clone())?;
        info!(author_id = %author.id, name = %author.name, "author created");
        Ok(author)
    }

    fn find_or_create_categories(&self, names: &[String]) -> Result<Vec<Category>, CatalogError> {
        names
            .iter()
            .map(|name| {
                if let Some(category) = self.store.find_category_by_name(name)? {
                    return Ok(category);
                }
                let category = Category {
                    id: fablecast_core::CategoryId::new(),
                    name: name.clone(),
                    created_at: Utc::now(),
                };
                self.store.insert_category(category.clone())?;
                Ok(category)
            })
            .collect()
    }

    fn summarize(&self, novel: Novel) -> Result<NovelSummary, CatalogError> {
        let mut authors = Vec::with_capacity(novel.author_ids.len());
        for id in &novel.author_ids {
            if let Some(author) = self.store.get_author(*id)? {
                authors.push(author.name);
            }
        }
        let mut categories = Vec::with_capacity(novel.category_ids.len());
        for id in &novel.category_ids {
            if let Some(category) = self.store.get_category(*id)? {
                categories.push(category.name);
            }
        }
        Ok(NovelSummary {
            novel,
            authors,
            categories,
        })
    }

    fn summarize_page(&self, page: Page<Novel>) -> Result<Page<NovelSummary>, CatalogError> {
        let Page {
            items,
            page: number,
            size,
            total_elements,
            total_pages,
        } = page;
        let items = items
            .into_iter()
            .map(|novel| self.summarize(novel))
            .collect::<Result<_, _>>()?;
        Ok(Page {
            items,
            page: number,
            size,
            total_elements,
            total_pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryCatalogStore;

    fn service() -> CatalogService {
        CatalogService::new(Arc::new(InMemoryCatalogStore::new()))
    }

    fn draft(title: &str, author: &str) -> NovelDraft {
        NovelDraft {
            title: title.to_string(),
            summary: "summary".to_string(),
            cover_image_url: None,
            publication_year: Some(2021),
            is_completed: false,
            author: author.to_string(),
            categories: vec!["Fantasy".to_string()],
        }
    }

    fn episode_draft(title: &str) -> EpisodeDraft {
        EpisodeDraft {
            title: title.to_string(),
            release_status: ReleaseStatus::Public,
            scheduled_release_date: None,
        }
    }

    #[test]
    fn creating_a_novel_creates_author_and_categories_once() {
        let svc = service();
        let a = svc.create_novel(draft("Tower", "Kim")).unwrap();
        let b = svc.create_novel(draft("Dungeon", "Kim")).unwrap();

        assert_eq!(a.authors, vec!["Kim"]);
        assert_eq!(a.categories, vec!["Fantasy"]);
        // Same author/category reused, not duplicated.
        assert_eq!(a.novel.author_ids, b.novel.author_ids);
        assert_eq!(svc.list_authors().unwrap().len(), 1);
        assert_eq!(svc.list_categories().unwrap().len(), 1);
    }

    #[test]
    fn duplicate_title_author_pair_is_rejected() {
        let svc = service();
        svc.create_novel(draft("Tower", "Kim")).unwrap();

        let err = svc.create_novel(draft("Tower", "Kim")).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Domain(DomainError::Conflict(_))
        ));

        // Same title under a different author is fine.
        svc.create_novel(draft("Tower", "Lee")).unwrap();
    }

    #[test]
    fn episodes_get_sequential_chapter_numbers() {
        let svc = service();
        let novel = svc.create_novel(draft("Tower", "Kim")).unwrap().novel;

        let (e1, s1) = svc.create_episode(novel.id, episode_draft("Ch 1")).unwrap();
        let (e2, _) = svc.create_episode(novel.id, episode_draft("Ch 2")).unwrap();

        assert_eq!(e1.chapter_number, 1);
        assert_eq!(e2.chapter_number, 2);
        assert!(s1.path.contains(&novel.id.to_string()));
        assert_eq!(svc.script_for_episode(e1.id).unwrap().id, s1.id);
    }

    #[test]
    fn recorded_audio_does_not_shadow_the_episode_script() {
        let svc = service();
        let novel = svc.create_novel(draft("Tower", "Kim")).unwrap().novel;
        let (episode, script) = svc.create_episode(novel.id, episode_draft("Ch 1")).unwrap();

        let audio_id = uuid::Uuid::now_v7();
        let audio = svc.record_audio(episode.id, audio_id).unwrap();

        assert_eq!(audio.kind, ScriptKind::Audio);
        assert_eq!(audio.id, fablecast_core::ScriptId::from_uuid(audio_id));
        assert!(audio.path.contains("/audio/"));
        // The script lookup used for narration still resolves the script.
        assert_eq!(svc.script_for_episode(episode.id).unwrap().id, script.id);
    }

    #[test]
    fn duplicate_episode_title_within_novel_is_rejected() {
        let svc = service();
        let novel = svc.create_novel(draft("Tower", "Kim")).unwrap().novel;
        svc.create_episode(novel.id, episode_draft("Ch 1")).unwrap();

        let err = svc
            .create_episode(novel.id, episode_draft("Ch 1"))
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Domain(DomainError::Conflict(_))
        ));
    }

    #[test]
    fn public_release_sets_released_date() {
        let svc = service();
        let novel = svc.create_novel(draft("Tower", "Kim")).unwrap().novel;

        let (episode, _) = svc
            .create_episode(
                novel.id,
                EpisodeDraft {
                    title: "Ch 1".into(),
                    release_status: ReleaseStatus::Private,
                    scheduled_release_date: None,
                },
            )
            .unwrap();
        assert_eq!(episode.released_date, None);

        let updated = svc.update_episode(episode.id, episode_draft("Ch 1")).unwrap();
        assert!(updated.released_date.is_some());
    }

    #[test]
    fn soft_deleted_novel_disappears_from_reads() {
        let svc = service();
        let novel = svc.create_novel(draft("Tower", "Kim")).unwrap().novel;

        svc.delete_novel(novel.id).unwrap();
        assert!(matches!(
            svc.novel_detail(novel.id),
            Err(CatalogError::Domain(DomainError::NotFound))
        ));
        assert_eq!(svc.list_novels(1, 10).unwrap().total_elements, 0);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let svc = service();
        svc.create_novel(draft("The Dark Tower", "Kim")).unwrap();
        svc.create_novel(draft("Bright Dawn", "Kim")).unwrap();

        let hits = svc.search_novels("tower", 1, 10).unwrap();
        assert_eq!(hits.total_elements, 1);
        assert_eq!(hits.items[0].novel.title, "The Dark Tower");
    }
}
