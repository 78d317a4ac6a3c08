//! Entity trait - common interface for all record types

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::core::identity::{EntityId, EntityPrefix};

/// Common trait for all Depot records
pub trait Entity: Serialize + DeserializeOwned + 'static {
    /// The record type prefix (e.g., PART, ORD)
    const PREFIX: EntityPrefix;

    /// Get the record's unique ID
    fn id(&self) -> &EntityId;

    /// Get the record's display title
    fn title(&self) -> &str;

    /// Get the creation timestamp
    fn created(&self) -> DateTime<Utc>;

    /// Get the author
    fn author(&self) -> &str;

    /// Check record-level invariants, returning one message per problem
    fn validate(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Push a message when a float field is negative or not finite
pub(crate) fn check_non_negative(issues: &mut Vec<String>, field: &str, value: f64) {
    if !value.is_finite() || value < 0.0 {
        issues.push(format!("{} must be a non-negative number (got {})", field, value));
    }
}

/// Push a message when a required text field is blank
pub(crate) fn check_not_blank(issues: &mut Vec<String>, field: &str, value: &str) {
    if value.trim().is_empty() {
        issues.push(format!("{} must not be empty", field));
    }
}

pub(crate) fn default_revision() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_non_negative() {
        let mut issues = Vec::new();
        check_non_negative(&mut issues, "weekly_usage", 1.5);
        check_non_negative(&mut issues, "monthly_usage", -2.0);
        check_non_negative(&mut issues, "safety_stock", f64::NAN);
        assert_eq!(issues.len(), 2);
        assert!(issues[0].contains("monthly_usage"));
    }

    #[test]
    fn test_check_not_blank() {
        let mut issues = Vec::new();
        check_not_blank(&mut issues, "title", "Bearing");
        check_not_blank(&mut issues, "name", "   ");
        assert_eq!(issues, vec!["name must not be empty".to_string()]);
    }
}
