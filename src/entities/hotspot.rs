//! Hotspot entity - a point on an assembly drawing linking to a part or sub-assembly

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{check_not_blank, Entity};
use crate::core::identity::{EntityId, EntityPrefix};

/// What a hotspot points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotspotTarget<'a> {
    Part(&'a str),
    Assembly(&'a str),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hotspot {
    /// Unique identifier (HOT-...)
    pub id: EntityId,

    /// Assembly whose drawing carries the hotspot (ASM-...)
    pub assembly: String,

    /// Horizontal position, percent of drawing width
    pub x: f64,

    /// Vertical position, percent of drawing height
    pub y: f64,

    /// Callout label (e.g. balloon number "12")
    #[serde(default)]
    pub label: String,

    /// Linked part (PART-...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part: Option<String>,

    /// Linked sub-assembly (ASM-...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subassembly: Option<String>,

    pub created: DateTime<Utc>,

    pub author: String,
}

impl Entity for Hotspot {
    const PREFIX: EntityPrefix = EntityPrefix::Hot;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.label
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }

    fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        check_not_blank(&mut issues, "assembly", &self.assembly);
        for (axis, value) in [("x", self.x), ("y", self.y)] {
            if !coordinate_in_range(value) {
                issues.push(format!("{} must be between 0 and 100 (got {})", axis, value));
            }
        }
        match (&self.part, &self.subassembly) {
            (Some(_), Some(_)) => issues.push("hotspot links both a part and a sub-assembly".to_string()),
            (None, None) => issues.push("hotspot must link a part or a sub-assembly".to_string()),
            _ => {}
        }
        if self.subassembly.as_deref() == Some(self.assembly.as_str()) {
            issues.push("hotspot cannot link its own assembly".to_string());
        }
        issues
    }
}

/// Whether a drawing coordinate lies on the image (0..=100 percent)
pub fn coordinate_in_range(value: f64) -> bool {
    value.is_finite() && (0.0..=100.0).contains(&value)
}

impl Hotspot {
    pub fn new(assembly: String, x: f64, y: f64, label: String, author: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Hot),
            assembly,
            x,
            y,
            label,
            part: None,
            subassembly: None,
            created: Utc::now(),
            author,
        }
    }

    pub fn target(&self) -> Option<HotspotTarget<'_>> {
        match (&self.part, &self.subassembly) {
            (Some(part), None) => Some(HotspotTarget::Part(part)),
            (None, Some(asm)) => Some(HotspotTarget::Assembly(asm)),
            _ => None,
        }
    }

    /// Reposition the hotspot, rejecting coordinates off the drawing
    pub fn move_to(&mut self, x: f64, y: f64) -> Result<(), String> {
        if !coordinate_in_range(x) || !coordinate_in_range(y) {
            return Err(format!("coordinates ({}, {}) are outside 0..100", x, y));
        }
        self.x = x;
        self.y = y;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hotspot() -> Hotspot {
        Hotspot::new("ASM-1".into(), 10.0, 20.0, "1".into(), "test".into())
    }

    #[test]
    fn test_requires_exactly_one_target() {
        let mut h = hotspot();
        assert_eq!(h.validate().len(), 1);
        assert!(h.target().is_none());

        h.part = Some("PART-1".into());
        assert!(h.validate().is_empty());
        assert_eq!(h.target(), Some(HotspotTarget::Part("PART-1")));

        h.subassembly = Some("ASM-2".into());
        assert_eq!(h.validate().len(), 1);
    }

    #[test]
    fn test_coordinates_bounded() {
        let mut h = hotspot();
        h.part = Some("PART-1".into());
        assert!(h.move_to(100.0, 0.0).is_ok());
        assert!(h.move_to(100.5, 0.0).is_err());
        assert_eq!((h.x, h.y), (100.0, 0.0));

        h.y = -1.0;
        assert_eq!(h.validate().len(), 1);
    }

    #[test]
    fn test_cannot_link_own_assembly() {
        let mut h = hotspot();
        h.subassembly = Some("ASM-1".into());
        assert_eq!(h.validate().len(), 1);
    }
}
