//! Quote entity - a supplier's price offer for a part

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{check_non_negative, default_revision, Entity};
use crate::core::identity::{EntityId, EntityPrefix};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Expired,
}

impl std::fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuoteStatus::Pending => write!(f, "pending"),
            QuoteStatus::Accepted => write!(f, "accepted"),
            QuoteStatus::Rejected => write!(f, "rejected"),
            QuoteStatus::Expired => write!(f, "expired"),
        }
    }
}

impl std::str::FromStr for QuoteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(QuoteStatus::Pending),
            "accepted" => Ok(QuoteStatus::Accepted),
            "rejected" => Ok(QuoteStatus::Rejected),
            "expired" => Ok(QuoteStatus::Expired),
            _ => Err(format!(
                "Invalid quote status: {}. Use pending, accepted, rejected, or expired",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    /// Unique identifier (QUOT-...)
    pub id: EntityId,

    /// Quoting supplier (SUP-...)
    pub supplier: String,

    /// Quoted part (PART-...)
    pub part: String,

    /// Price per unit
    pub unit_price: f64,

    /// Quantity the price applies to
    #[serde(default = "default_quote_qty")]
    pub quantity: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_time_weeks: Option<f64>,

    /// Last day the offer is valid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<NaiveDate>,

    #[serde(default)]
    pub quote_status: QuoteStatus,

    /// Supplier's quote reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub created: DateTime<Utc>,

    pub author: String,

    #[serde(default = "default_revision")]
    pub entity_revision: u32,
}

fn default_quote_qty() -> u32 {
    1
}

impl Entity for Quote {
    const PREFIX: EntityPrefix = EntityPrefix::Quot;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        self.reference.as_deref().unwrap_or(&self.part)
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }

    fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        check_non_negative(&mut issues, "unit_price", self.unit_price);
        if let Some(lead) = self.lead_time_weeks {
            check_non_negative(&mut issues, "lead_time_weeks", lead);
        }
        if self.quantity == 0 {
            issues.push("quantity must be greater than zero".to_string());
        }
        issues
    }
}

impl Quote {
    pub fn new(supplier: String, part: String, unit_price: f64, author: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Quot),
            supplier,
            part,
            unit_price,
            quantity: 1,
            lead_time_weeks: None,
            valid_until: None,
            quote_status: QuoteStatus::default(),
            reference: None,
            notes: None,
            created: Utc::now(),
            author,
            entity_revision: 1,
        }
    }

    /// Usable for purchasing on `today`: not rejected and not past validity
    pub fn is_valid_on(&self, today: NaiveDate) -> bool {
        matches!(self.quote_status, QuoteStatus::Pending | QuoteStatus::Accepted)
            && self.valid_until.map_or(true, |d| d >= today)
    }

    pub fn total_price(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_window() {
        let mut q = Quote::new("SUP-1".into(), "PART-1".into(), 4.0, "test".into());
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert!(q.is_valid_on(today));

        q.valid_until = NaiveDate::from_ymd_opt(2024, 5, 31);
        assert!(!q.is_valid_on(today));

        q.valid_until = NaiveDate::from_ymd_opt(2024, 6, 1);
        assert!(q.is_valid_on(today));

        q.quote_status = QuoteStatus::Rejected;
        assert!(!q.is_valid_on(today));
    }

    #[test]
    fn test_total_price() {
        let mut q = Quote::new("SUP-1".into(), "PART-1".into(), 2.5, "test".into());
        q.quantity = 10;
        assert_eq!(q.total_price(), 25.0);
    }
}
