//! Author entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fablecast_core::{AuthorId, Entity};

/// An author, unique by name. Created implicitly when a novel references a
/// name that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Entity for Author {
    type Id = AuthorId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
