//! Machine entity - equipment maintained with stocked parts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{check_not_blank, default_revision, Entity};
use crate::core::identity::{EntityId, EntityPrefix};

/// Operating state of a machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MachineStatus {
    #[default]
    Operational,
    Maintenance,
    Down,
    Retired,
}

impl std::fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MachineStatus::Operational => write!(f, "operational"),
            MachineStatus::Maintenance => write!(f, "maintenance"),
            MachineStatus::Down => write!(f, "down"),
            MachineStatus::Retired => write!(f, "retired"),
        }
    }
}

impl std::str::FromStr for MachineStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "operational" | "running" => Ok(MachineStatus::Operational),
            "maintenance" => Ok(MachineStatus::Maintenance),
            "down" => Ok(MachineStatus::Down),
            "retired" => Ok(MachineStatus::Retired),
            _ => Err(format!(
                "Invalid machine status: {}. Use operational, maintenance, down, or retired",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    /// Unique identifier (MCH-...)
    pub id: EntityId,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,

    /// Facility where the machine is installed (FAC-...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility: Option<String>,

    #[serde(default)]
    pub machine_status: MachineStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub created: DateTime<Utc>,

    pub author: String,

    #[serde(default = "default_revision")]
    pub entity_revision: u32,
}

impl Entity for Machine {
    const PREFIX: EntityPrefix = EntityPrefix::Mch;

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

impl Machine {
    pub fn new(name: String, author: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Mch),
            name,
            model: None,
            manufacturer: None,
            serial_number: None,
            facility: None,
            machine_status: MachineStatus::default(),
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
    fn test_machine_status_roundtrip() {
        let mut machine = Machine::new("CNC Lathe 2".into(), "test".into());
        machine.machine_status = MachineStatus::Down;
        let yaml = serde_yml::to_string(&machine).unwrap();
        assert!(yaml.contains("machine_status: down"));

        let parsed: Machine = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(parsed.machine_status, MachineStatus::Down);
    }

    #[test]
    fn test_machine_status_parsing() {
        assert_eq!("Running".parse::<MachineStatus>().unwrap(), MachineStatus::Operational);
        assert!("broken".parse::<MachineStatus>().is_err());
    }
}
