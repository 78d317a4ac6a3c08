//! Supplier entity - vendors parts are bought from

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{check_non_negative, check_not_blank, default_revision, Entity};
use crate::core::identity::{EntityId, EntityPrefix};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
    /// Unique identifier (SUP-...)
    pub id: EntityId,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    /// Typical lead time in weeks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_time_weeks: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub created: DateTime<Utc>,

    pub author: String,

    #[serde(default = "default_revision")]
    pub entity_revision: u32,
}

impl Entity for Supplier {
    const PREFIX: EntityPrefix = EntityPrefix::Sup;

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
        if let Some(lead) = self.lead_time_weeks {
            check_non_negative(&mut issues, "lead_time_weeks", lead);
        }
        if let Some(ref email) = self.email {
            if !email.contains('@') {
                issues.push(format!("email '{}' is not an email address", email));
            }
        }
        issues
    }
}

impl Supplier {
    pub fn new(name: String, author: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Sup),
            name,
            contact: None,
            email: None,
            phone: None,
            website: None,
            lead_time_weeks: None,
            notes: None,
            created: Utc::now(),
            author,
            entity_revision: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supplier_validate_email() {
        let mut sup = Supplier::new("Acme Bearings".into(), "test".into());
        assert!(sup.validate().is_empty());
        sup.email = Some("sales.acme.example".into());
        assert_eq!(sup.validate().len(), 1);
    }
}
