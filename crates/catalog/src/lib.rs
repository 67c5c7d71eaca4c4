//! Catalog domain: novels, episodes, authors, categories, script records.
//!
//! Pure domain types plus a storage abstraction; no IO, no HTTP. The episode
//! narration trigger lives at the API layer, which pairs this crate's
//! services with the narration producer.

pub mod author;
pub mod category;
pub mod episode;
pub mod novel;
pub mod service;
pub mod store;

pub use author::Author;
pub use category::Category;
pub use episode::{Episode, ReleaseStatus, ScriptKind, ScriptRecord};
pub use novel::Novel;
pub use service::{CatalogError, CatalogService, EpisodeDraft, NovelDraft, NovelSummary};
pub use store::{CatalogStore, CatalogStoreError, InMemoryCatalogStore};
