//! Facility entity - a site or warehouse holding stock and machines

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{check_not_blank, default_revision, Entity};
use crate::core::identity::{EntityId, EntityPrefix};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Facility {
    /// Unique identifier (FAC-...)
    pub id: EntityId,

    pub name: String,

    /// Short site code (e.g. "NP1")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub created: DateTime<Utc>,

    pub author: String,

    #[serde(default = "default_revision")]
    pub entity_revision: u32,
}

impl Entity for Facility {
    const PREFIX: EntityPrefix = EntityPrefix::Fac;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }

    fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        check_not_blank(&mut issues, "name", &self.name);
        issues
    }
}

impl Facility {
    pub fn new(name: String, author: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Fac),
            name,
            code: None,
            address: None,
            notes: None,
            created: Utc::now(),
            author,
            entity_revision: 1,
        }
    }

    /// Code if set, otherwise the name
    pub fn display_name(&self) -> &str {
        self.code.as_deref().unwrap_or(&self.name)
    }
}
