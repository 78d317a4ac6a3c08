//! Short ID system for easier record selection
//!
//! Provides numeric aliases like `@1`, `@2` that map to full record IDs.
//! List commands refresh the aliases for the records they print, and new
//! records get the next free alias.

use std::collections::HashMap;
use std::fs;

use crate::core::project::{Project, PROJECT_DIR};

const INDEX_FILE: &str = "shortids.json";

/// A mapping of short IDs (@N) to full record IDs
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ShortIdIndex {
    /// Maps short number to full record ID string
    entries: HashMap<u32, String>,
    /// Reverse lookup, rebuilt on load
    #[serde(skip)]
    reverse: HashMap<String, u32>,
    /// Next available short ID
    next_id: u32,
}

impl ShortIdIndex {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            reverse: HashMap::new(),
            next_id: 1,
        }
    }

    /// Load the index from a project, or create empty if not found
    pub fn load(project: &Project) -> Self {
        let path = project.root().join(PROJECT_DIR).join(INDEX_FILE);
        if let Ok(content) = fs::read_to_string(&path) {
            if let Ok(mut index) = serde_json::from_str::<ShortIdIndex>(&content) {
                index.reverse = index.entries.iter().map(|(k, v)| (v.clone(), *k)).collect();
                index.next_id = index.next_id.max(index.entries.keys().max().map_or(1, |m| m + 1));
                return index;
            }
            tracing::warn!(path = %path.display(), "short ID index is corrupt, starting fresh");
        }
        Self::new()
    }

    /// Save the index to a project
    pub fn save(&self, project: &Project) -> std::io::Result<()> {
        let path = project.root().join(PROJECT_DIR).join(INDEX_FILE);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
    }

    /// Add an ID and return its short ID (existing alias if already present)
    pub fn add(&mut self, entity_id: String) -> u32 {
        if let Some(&short_id) = self.reverse.get(&entity_id) {
            return short_id;
        }

        let short_id = self.next_id;
        self.next_id += 1;
        self.entries.insert(short_id, entity_id.clone());
        self.reverse.insert(entity_id, short_id);
        short_id
    }

    /// Make sure every ID has an alias
    pub fn ensure_all(&mut self, ids: impl IntoIterator<Item = String>) {
        for id in ids {
            self.add(id);
        }
    }

    /// Drop the alias for a deleted record
    pub fn remove(&mut self, entity_id: &str) {
        if let Some(short) = self.reverse.remove(entity_id) {
            self.entries.remove(&short);
        }
    }

    /// Resolve a reference to a full ID
    ///
    /// Accepts `@N`, a plain number `N`, or a full/partial ID which is
    /// passed through unchanged for partial matching.
    pub fn resolve(&self, reference: &str) -> Option<String> {
        let num_str = if let Some(rest) = reference.strip_prefix('@') {
            rest
        } else if !reference.is_empty() && reference.chars().all(|c| c.is_ascii_digit()) {
            reference
        } else {
            return Some(reference.to_string());
        };

        num_str
            .parse::<u32>()
            .ok()
            .and_then(|n| self.entries.get(&n).cloned())
    }

    pub fn get_short_id(&self, entity_id: &str) -> Option<u32> {
        self.reverse.get(entity_id).copied()
    }

    /// "@N" for a known ID, the ID itself otherwise
    pub fn display(&self, entity_id: &str) -> String {
        self.get_short_id(entity_id)
            .map(|n| format!("@{}", n))
            .unwrap_or_else(|| entity_id.to_string())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_add_and_resolve() {
        let mut index = ShortIdIndex::new();

        assert_eq!(index.add("PART-01ABC".to_string()), 1);
        assert_eq!(index.add("PART-02DEF".to_string()), 2);

        assert_eq!(index.resolve("@1"), Some("PART-01ABC".to_string()));
        assert_eq!(index.resolve("2"), Some("PART-02DEF".to_string()));
        assert_eq!(index.resolve("@99"), None);
    }

    #[test]
    fn test_short_id_passthrough() {
        let index = ShortIdIndex::new();
        assert_eq!(index.resolve("PART-01ABC"), Some("PART-01ABC".to_string()));
        assert_eq!(index.resolve("bearing"), Some("bearing".to_string()));
    }

    #[test]
    fn test_short_id_no_duplicates() {
        let mut index = ShortIdIndex::new();
        let a = index.add("ORD-001".to_string());
        let b = index.add("ORD-001".to_string());
        assert_eq!(a, b);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_remove_and_display() {
        let mut index = ShortIdIndex::new();
        index.ensure_all(vec!["SUP-1".to_string(), "SUP-2".to_string()]);
        assert_eq!(index.display("SUP-2"), "@2");

        index.remove("SUP-1");
        assert_eq!(index.get_short_id("SUP-1"), None);
        assert_eq!(index.display("SUP-1"), "SUP-1");
        // Aliases are never reused
        assert_eq!(index.add("SUP-3".to_string()), 3);
    }
}
