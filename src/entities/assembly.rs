//! Assembly entity - a machine sub-structure with its own parts list

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{check_not_blank, default_revision, Entity};
use crate::core::identity::{EntityId, EntityPrefix};

/// BOM line - a part used in the assembly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomLine {
    /// Part ID (PART-...)
    pub part: String,

    /// Units of the part per assembly
    pub quantity: u32,

    /// Fitting notes (e.g. "Torque to 25 Nm")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Assembly entity - belongs to a machine, optionally nested in another assembly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assembly {
    /// Unique identifier (ASM-...)
    pub id: EntityId,

    pub title: String,

    /// Machine this assembly belongs to (MCH-...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine: Option<String>,

    /// Parent assembly if this is a sub-assembly (ASM-...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Path to the exploded-view drawing image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drawing: Option<String>,

    /// Parts list
    #[serde(default)]
    pub bom: Vec<BomLine>,

    pub created: DateTime<Utc>,

    pub author: String,

    #[serde(default = "default_revision")]
    pub entity_revision: u32,
}

impl Entity for Assembly {
    const PREFIX: EntityPrefix = EntityPrefix::Asm;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }

    fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        check_not_blank(&mut issues, "title", &self.title);
        if self.parent.as_deref() == Some(self.id.to_string().as_str()) {
            issues.push("assembly cannot be its own parent".to_string());
        }
        for (i, line) in self.bom.iter().enumerate() {
            if line.quantity == 0 {
                issues.push(format!("bom[{}] quantity must be greater than zero", i));
            }
            if !line.part.starts_with("PART-") {
                issues.push(format!("bom[{}] must reference a PART- record (got '{}')", i, line.part));
            }
        }
        issues
    }
}

impl Assembly {
    pub fn new(title: String, author: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Asm),
            title,
            machine: None,
            parent: None,
            description: None,
            drawing: None,
            bom: Vec::new(),
            created: Utc::now(),
            author,
            entity_revision: 1,
        }
    }

    /// Add a part to the BOM, merging with an existing line for the same part
    pub fn add_part(&mut self, part: String, quantity: u32, notes: Option<String>) {
        if let Some(line) = self.bom.iter_mut().find(|l| l.part == part) {
            line.quantity = line.quantity.saturating_add(quantity);
            if notes.is_some() {
                line.notes = notes;
            }
        } else {
            self.bom.push(BomLine { part, quantity, notes });
        }
        self.entity_revision += 1;
    }

    /// Remove a part from the BOM, returning whether a line was removed
    pub fn remove_part(&mut self, part: &str) -> bool {
        let before = self.bom.len();
        self.bom.retain(|l| l.part != part);
        let removed = self.bom.len() != before;
        if removed {
            self.entity_revision += 1;
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_part_merges_lines() {
        let mut asm = Assembly::new("Spindle head".into(), "test".into());
        asm.add_part("PART-A".into(), 2, None);
        asm.add_part("PART-A".into(), 3, Some("grease".into()));
        asm.add_part("PART-B".into(), 1, None);

        assert_eq!(asm.bom.len(), 2);
        assert_eq!(asm.bom[0].quantity, 5);
        assert_eq!(asm.bom[0].notes.as_deref(), Some("grease"));
        assert_eq!(asm.entity_revision, 4);
    }

    #[test]
    fn test_remove_part() {
        let mut asm = Assembly::new("Gearbox".into(), "test".into());
        asm.add_part("PART-A".into(), 1, None);
        assert!(asm.remove_part("PART-A"));
        assert!(!asm.remove_part("PART-A"));
        assert!(asm.bom.is_empty());
    }

    #[test]
    fn test_validate_bom_lines() {
        let mut asm = Assembly::new("Pump".into(), "test".into());
        asm.bom.push(BomLine {
            part: "CMP-1".into(),
            quantity: 0,
            notes: None,
        });
        assert_eq!(asm.validate().len(), 2);
    }
}
