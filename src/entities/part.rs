//! Part entity - an inventory line item

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{check_non_negative, check_not_blank, default_revision, Entity};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::stock::{self, StockAssessment, StockInputs};

/// Part category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PartCategory {
    Mechanical,
    Electrical,
    Hydraulic,
    Pneumatic,
    Fastener,
    Consumable,
    #[default]
    Other,
}

impl std::fmt::Display for PartCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartCategory::Mechanical => write!(f, "mechanical"),
            PartCategory::Electrical => write!(f, "electrical"),
            PartCategory::Hydraulic => write!(f, "hydraulic"),
            PartCategory::Pneumatic => write!(f, "pneumatic"),
            PartCategory::Fastener => write!(f, "fastener"),
            PartCategory::Consumable => write!(f, "consumable"),
            PartCategory::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for PartCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mechanical" => Ok(PartCategory::Mechanical),
            "electrical" => Ok(PartCategory::Electrical),
            "hydraulic" => Ok(PartCategory::Hydraulic),
            "pneumatic" => Ok(PartCategory::Pneumatic),
            "fastener" => Ok(PartCategory::Fastener),
            "consumable" => Ok(PartCategory::Consumable),
            "other" => Ok(PartCategory::Other),
            _ => Err(format!(
                "Invalid category: {}. Use mechanical, electrical, hydraulic, pneumatic, fastener, consumable, or other",
                s
            )),
        }
    }
}

/// A Part entity - stocked item with usage rates driving reorder levels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    /// Unique identifier (PART-...)
    pub id: EntityId,

    /// Internal part number
    pub part_number: String,

    /// Short title/description
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub category: PartCategory,

    /// Units on hand
    #[serde(default)]
    pub quantity: u32,

    /// Quantity at or below which the part is critical
    #[serde(default)]
    pub min_stock: u32,

    /// Price per unit
    #[serde(default)]
    pub unit_price: f64,

    /// Average units consumed per week
    #[serde(default)]
    pub weekly_usage: f64,

    /// Average units consumed per month (used when weekly usage is unset)
    #[serde(default)]
    pub monthly_usage: f64,

    /// Replenishment lead time in weeks
    #[serde(default)]
    pub lead_time_weeks: f64,

    /// Extra units kept on top of lead-time demand
    #[serde(default)]
    pub safety_stock: f64,

    /// Bin / shelf location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Facility holding the stock (FAC-...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility: Option<String>,

    /// Preferred supplier (SUP-...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,

    /// Supplier's part number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_part_number: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    pub created: DateTime<Utc>,

    pub author: String,

    #[serde(default = "default_revision")]
    pub entity_revision: u32,
}

impl Entity for Part {
    const PREFIX: EntityPrefix = EntityPrefix::Part;

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
        check_not_blank(&mut issues, "part_number", &self.part_number);
        check_not_blank(&mut issues, "title", &self.title);
        check_non_negative(&mut issues, "unit_price", self.unit_price);
        check_non_negative(&mut issues, "weekly_usage", self.weekly_usage);
        check_non_negative(&mut issues, "monthly_usage", self.monthly_usage);
        check_non_negative(&mut issues, "lead_time_weeks", self.lead_time_weeks);
        check_non_negative(&mut issues, "safety_stock", self.safety_stock);
        issues
    }
}

impl Part {
    pub fn new(part_number: String, title: String, author: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Part),
            part_number,
            title,
            description: None,
            category: PartCategory::default(),
            quantity: 0,
            min_stock: 0,
            unit_price: 0.0,
            weekly_usage: 0.0,
            monthly_usage: 0.0,
            lead_time_weeks: 0.0,
            safety_stock: 0.0,
            location: None,
            facility: None,
            supplier: None,
            supplier_part_number: None,
            tags: Vec::new(),
            created: Utc::now(),
            author,
            entity_revision: 1,
        }
    }

    pub fn stock_inputs(&self) -> StockInputs {
        StockInputs {
            quantity: self.quantity,
            min_stock: self.min_stock,
            weekly_usage: self.weekly_usage,
            monthly_usage: self.monthly_usage,
            lead_time_weeks: self.lead_time_weeks,
            safety_stock: self.safety_stock,
        }
    }

    /// Reorder level, stock status and related metrics
    pub fn assess(&self) -> StockAssessment {
        stock::assess(&self.stock_inputs())
    }

    /// Value of the stock on hand
    pub fn stock_value(&self) -> f64 {
        self.quantity as f64 * self.unit_price.max(0.0)
    }

    /// Bump the revision after an edit
    pub fn touch(&mut self) {
        self.entity_revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stock::StockStatus;

    #[test]
    fn test_part_creation() {
        let part = Part::new("BRG-6204".into(), "Ball bearing 6204".into(), "test".into());
        assert!(part.id.to_string().starts_with("PART-"));
        assert_eq!(part.quantity, 0);
        assert_eq!(part.assess().status, StockStatus::OutOfStock);
        assert!(part.validate().is_empty());
    }

    #[test]
    fn test_part_assessment_uses_fields() {
        let mut part = Part::new("V-BELT".into(), "V-belt A42".into(), "test".into());
        part.quantity = 20;
        part.min_stock = 2;
        part.weekly_usage = 10.0;
        part.lead_time_weeks = 2.0;
        part.safety_stock = 5.0;

        let a = part.assess();
        assert_eq!(a.reorder_level, 25);
        assert_eq!(a.status, StockStatus::ReorderNeeded);
    }

    #[test]
    fn test_part_yaml_defaults_missing_inputs_to_zero() {
        let yaml = r#"
id: PART-01HC2JB7SMQX7RS1Y0GFKBHPTD
part_number: "FLT-01"
title: "Oil filter"
quantity: 7
created: 2024-01-15T10:00:00Z
author: "Test Author"
"#;
        let part: Part = serde_yml::from_str(yaml).unwrap();
        assert_eq!(part.min_stock, 0);
        assert_eq!(part.weekly_usage, 0.0);
        assert_eq!(part.category, PartCategory::Other);
        assert_eq!(part.assess().reorder_level, 0);
        assert_eq!(part.assess().status, StockStatus::Healthy);
        assert_eq!(part.entity_revision, 1);
    }

    #[test]
    fn test_part_validate_rejects_negative_rates() {
        let mut part = Part::new("X".into(), "".into(), "test".into());
        part.weekly_usage = -1.0;
        let issues = part.validate();
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn test_stock_value() {
        let mut part = Part::new("X".into(), "Y".into(), "test".into());
        part.quantity = 4;
        part.unit_price = 2.5;
        assert_eq!(part.stock_value(), 10.0);
    }

    #[test]
    fn test_category_serialization() {
        let mut part = Part::new("H-1".into(), "Hose".into(), "test".into());
        part.category = PartCategory::Hydraulic;
        let yaml = serde_yml::to_string(&part).unwrap();
        assert!(yaml.contains("category: hydraulic"));
    }
}
