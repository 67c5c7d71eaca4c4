//! Category entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fablecast_core::{CategoryId, Entity};

/// A category, unique by name. Created implicitly through novel create/update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
