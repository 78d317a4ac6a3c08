//! Movement entity - append-only record of a stock change

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// Goods received
    In,
    /// Goods issued / used
    Out,
    /// Physical count correction
    Adjust,
}

impl std::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MovementKind::In => write!(f, "in"),
            MovementKind::Out => write!(f, "out"),
            MovementKind::Adjust => write!(f, "adjust"),
        }
    }
}

impl std::str::FromStr for MovementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in" | "inbound" | "receive" => Ok(MovementKind::In),
            "out" | "outbound" | "use" => Ok(MovementKind::Out),
            "adjust" | "adjustment" => Ok(MovementKind::Adjust),
            _ => Err(format!("Invalid movement kind: {}. Use in, out, or adjust", s)),
        }
    }
}

/// A recorded change to a part's quantity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    /// Unique identifier (MOV-...)
    pub id: EntityId,

    /// Part affected (PART-...)
    pub part: String,

    pub kind: MovementKind,

    /// Units moved (absolute, direction given by `kind`)
    pub quantity: u32,

    pub quantity_before: u32,

    pub quantity_after: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Related record, e.g. the order received or the machine repaired
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    pub created: DateTime<Utc>,

    pub author: String,
}

impl Entity for Movement {
    const PREFIX: EntityPrefix = EntityPrefix::Mov;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        self.reason.as_deref().unwrap_or("")
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }

    fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let consistent = match self.kind {
            MovementKind::In => self.quantity_before.checked_add(self.quantity) == Some(self.quantity_after),
            MovementKind::Out => self.quantity_before.checked_sub(self.quantity) == Some(self.quantity_after),
            MovementKind::Adjust => self.quantity_before.abs_diff(self.quantity_after) == self.quantity,
        };
        if !consistent {
            issues.push(format!(
                "{} movement of {} does not take {} to {}",
                self.kind, self.quantity, self.quantity_before, self.quantity_after
            ));
        }
        if !self.part.starts_with("PART-") {
            issues.push(format!("part must reference a PART- record (got '{}')", self.part));
        }
        issues
    }
}

impl Movement {
    /// Signed change in units (negative for outbound)
    pub fn delta(&self) -> i64 {
        self.quantity_after as i64 - self.quantity_before as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movement(kind: MovementKind, qty: u32, before: u32, after: u32) -> Movement {
        Movement {
            id: EntityId::new(EntityPrefix::Mov),
            part: "PART-01HC2JB7SMQX7RS1Y0GFKBHPTD".into(),
            kind,
            quantity: qty,
            quantity_before: before,
            quantity_after: after,
            reason: None,
            reference: None,
            created: Utc::now(),
            author: "test".into(),
        }
    }

    #[test]
    fn test_delta_sign() {
        assert_eq!(movement(MovementKind::In, 5, 10, 15).delta(), 5);
        assert_eq!(movement(MovementKind::Out, 3, 10, 7).delta(), -3);
        assert_eq!(movement(MovementKind::Adjust, 4, 10, 6).delta(), -4);
    }

    #[test]
    fn test_validate_consistency() {
        assert!(movement(MovementKind::In, 5, 10, 15).validate().is_empty());
        assert_eq!(movement(MovementKind::Out, 5, 10, 15).validate().len(), 1);
        assert!(movement(MovementKind::Adjust, 2, 5, 3).validate().is_empty());
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("use".parse::<MovementKind>().unwrap(), MovementKind::Out);
        assert_eq!("IN".parse::<MovementKind>().unwrap(), MovementKind::In);
        assert!("sideways".parse::<MovementKind>().is_err());
    }
}
