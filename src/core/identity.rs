//! Record identity system using type-prefixed ULIDs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;

/// Record type prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityPrefix {
    /// Inventory part
    Part,
    /// Stock movement (in/out/adjust)
    Mov,
    /// Facility / site
    Fac,
    /// Machine
    Mch,
    /// Machine assembly
    Asm,
    /// Drawing hotspot
    Hot,
    /// Supplier
    Sup,
    /// Supplier quotation
    Quot,
    /// Purchase order
    Ord,
}

impl EntityPrefix {
    /// Get the string representation of the prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::Part => "PART",
            EntityPrefix::Mov => "MOV",
            EntityPrefix::Fac => "FAC",
            EntityPrefix::Mch => "MCH",
            EntityPrefix::Asm => "ASM",
            EntityPrefix::Hot => "HOT",
            EntityPrefix::Sup => "SUP",
            EntityPrefix::Quot => "QUOT",
            EntityPrefix::Ord => "ORD",
        }
    }

    /// Get all valid prefixes
    pub fn all() -> &'static [EntityPrefix] {
        &[
            EntityPrefix::Part,
            EntityPrefix::Mov,
            EntityPrefix::Fac,
            EntityPrefix::Mch,
            EntityPrefix::Asm,
            EntityPrefix::Hot,
            EntityPrefix::Sup,
            EntityPrefix::Quot,
            EntityPrefix::Ord,
        ]
    }

    /// Human readable name of the record type
    pub fn label(&self) -> &'static str {
        match self {
            EntityPrefix::Part => "part",
            EntityPrefix::Mov => "movement",
            EntityPrefix::Fac => "facility",
            EntityPrefix::Mch => "machine",
            EntityPrefix::Asm => "assembly",
            EntityPrefix::Hot => "hotspot",
            EntityPrefix::Sup => "supplier",
            EntityPrefix::Quot => "quote",
            EntityPrefix::Ord => "order",
        }
    }

    /// Try to determine the prefix from an ID string like "PART-01H..."
    pub fn from_id_str(id: &str) -> Option<Self> {
        let (prefix, _) = id.split_once('-')?;
        prefix.parse().ok()
    }
}

impl fmt::Display for EntityPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityPrefix {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PART" => Ok(EntityPrefix::Part),
            "MOV" => Ok(EntityPrefix::Mov),
            "FAC" => Ok(EntityPrefix::Fac),
            "MCH" => Ok(EntityPrefix::Mch),
            "ASM" => Ok(EntityPrefix::Asm),
            "HOT" => Ok(EntityPrefix::Hot),
            "SUP" => Ok(EntityPrefix::Sup),
            "QUOT" => Ok(EntityPrefix::Quot),
            "ORD" => Ok(EntityPrefix::Ord),
            _ => Err(IdParseError::InvalidPrefix(s.to_string())),
        }
    }
}

/// A unique record identifier combining a type prefix and ULID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    prefix: EntityPrefix,
    ulid: Ulid,
}

impl PartialOrd for EntityPrefix {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EntityPrefix {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl EntityId {
    /// Create a new EntityId with the given prefix
    pub fn new(prefix: EntityPrefix) -> Self {
        Self {
            prefix,
            ulid: Ulid::new(),
        }
    }

    pub fn prefix(&self) -> EntityPrefix {
        self.prefix
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.ulid)
    }
}

impl FromStr for EntityId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix_str, ulid_str) = s
            .split_once('-')
            .ok_or_else(|| IdParseError::MissingDelimiter(s.to_string()))?;

        let prefix = prefix_str.parse()?;
        let ulid = Ulid::from_string(ulid_str)
            .map_err(|e| IdParseError::InvalidUlid(ulid_str.to_string(), e.to_string()))?;

        Ok(Self { prefix, ulid })
    }
}

impl Serialize for EntityId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when parsing record IDs
#[derive(Debug, Error)]
pub enum IdParseError {
    #[error("invalid record prefix: '{0}' (valid: PART, MOV, FAC, MCH, ASM, HOT, SUP, QUOT, ORD)")]
    InvalidPrefix(String),

    #[error("missing '-' delimiter in record ID: '{0}'")]
    MissingDelimiter(String),

    #[error("invalid ULID '{0}': {1}")]
    InvalidUlid(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_generation() {
        let id = EntityId::new(EntityPrefix::Part);
        assert!(id.to_string().starts_with("PART-"));
        assert_eq!(id.to_string().len(), 31); // PART- (5) + ULID (26)
    }

    #[test]
    fn test_entity_id_parsing() {
        let original = EntityId::new(EntityPrefix::Ord);
        let parsed = original.to_string().parse::<EntityId>().unwrap();
        assert_eq!(parsed.prefix(), EntityPrefix::Ord);
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_entity_id_invalid_prefix() {
        let err = "XXX-01HQ3K4N5M6P7R8S9T0UVWXYZ".parse::<EntityId>().unwrap_err();
        assert!(matches!(err, IdParseError::InvalidPrefix(_)));
    }

    #[test]
    fn test_entity_id_missing_delimiter() {
        let err = "PART01HQ3K4N5M6P7R8S9T0UVWXYZ".parse::<EntityId>().unwrap_err();
        assert!(matches!(err, IdParseError::MissingDelimiter(_)));
    }

    #[test]
    fn test_entity_id_invalid_ulid() {
        let err = "PART-notaulid".parse::<EntityId>().unwrap_err();
        assert!(matches!(err, IdParseError::InvalidUlid(_, _)));
    }

    #[test]
    fn test_prefix_from_id_str() {
        assert_eq!(
            EntityPrefix::from_id_str("ASM-01HQ3K4N5M6P7R8S9T0UVWXYZ"),
            Some(EntityPrefix::Asm)
        );
        assert_eq!(EntityPrefix::from_id_str("nothing"), None);
    }

    #[test]
    fn test_all_prefixes_parse() {
        for prefix in EntityPrefix::all() {
            let id = EntityId::new(*prefix);
            let parsed = id.to_string().parse::<EntityId>().unwrap();
            assert_eq!(parsed.prefix(), *prefix);
        }
    }
}
