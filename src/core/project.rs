//! Project discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::identity::{EntityId, EntityPrefix};

/// Marker directory that identifies a project root
pub const PROJECT_DIR: &str = ".depot";

/// Suffix used by every record file
pub const RECORD_SUFFIX: &str = ".depot.yaml";

/// Represents a Depot project
#[derive(Debug, Clone)]
pub struct Project {
    /// Root directory of the project (parent of .depot/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new project structure at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if root.join(PROJECT_DIR).exists() {
            return Err(ProjectError::AlreadyExists(root));
        }

        Self::create_structure(root)
    }

    /// Force initialization even if .depot/ exists
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::create_structure(root)
    }

    fn create_structure(root: PathBuf) -> Result<Self, ProjectError> {
        let depot_dir = root.join(PROJECT_DIR);
        std::fs::create_dir_all(&depot_dir).map_err(|e| ProjectError::IoError(e.to_string()))?;

        std::fs::write(depot_dir.join("config.yaml"), Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        for prefix in EntityPrefix::all() {
            std::fs::create_dir_all(root.join(Self::entity_directory(*prefix)))
                .map_err(|e| ProjectError::IoError(e.to_string()))?;
        }

        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# Depot Project Configuration

# Default author for new records (can be overridden by global config)
# author: ""

# Editor to use for `depot <type> edit` commands (default: $EDITOR)
# editor: ""

# Default output format (auto, yaml, tsv, json, csv, md, id)
# default_format: auto

# Currency symbol used when printing prices and values
# currency: "$"

# Supplier lead time (weeks) above which a part is flagged as long-lead
# long_lead_weeks: 6
"#
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .depot configuration directory
    pub fn depot_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    /// Get the path for a record file
    pub fn entity_path(&self, id: &EntityId) -> PathBuf {
        self.entity_dir(id.prefix())
            .join(format!("{}{}", id, RECORD_SUFFIX))
    }

    /// Absolute directory for a given prefix
    pub fn entity_dir(&self, prefix: EntityPrefix) -> PathBuf {
        self.root.join(Self::entity_directory(prefix))
    }

    /// Get the directory (relative to the root) for a given record prefix
    pub fn entity_directory(prefix: EntityPrefix) -> &'static str {
        match prefix {
            EntityPrefix::Part => "inventory/parts",
            EntityPrefix::Mov => "inventory/movements",
            EntityPrefix::Fac => "facilities",
            EntityPrefix::Mch => "machines/equipment",
            EntityPrefix::Asm => "machines/assemblies",
            EntityPrefix::Hot => "machines/hotspots",
            EntityPrefix::Sup => "purchasing/suppliers",
            EntityPrefix::Quot => "purchasing/quotes",
            EntityPrefix::Ord => "purchasing/orders",
        }
    }

    /// Iterate all record files of a given prefix type
    pub fn iter_entity_files(&self, prefix: EntityPrefix) -> impl Iterator<Item = PathBuf> {
        walkdir::WalkDir::new(self.entity_dir(prefix))
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().to_string_lossy().ends_with(RECORD_SUFFIX))
            .map(|e| e.path().to_path_buf())
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not a Depot project (searched from {searched_from:?}). Run 'depot init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("Depot project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_project_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        assert!(project.depot_dir().join("config.yaml").exists());
        assert!(project.root().join("inventory/parts").is_dir());
        assert!(project.root().join("inventory/movements").is_dir());
        assert!(project.root().join("machines/hotspots").is_dir());
        assert!(project.root().join("purchasing/orders").is_dir());
    }

    #[test]
    fn test_project_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let err = Project::init(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::AlreadyExists(_)));
    }

    #[test]
    fn test_project_discover_from_subdirectory() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let subdir = tmp.path().join("inventory/parts/nested");
        std::fs::create_dir_all(&subdir).unwrap();

        let project = Project::discover_from(&subdir).unwrap();
        assert_eq!(
            project.root().canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_project_discover_fails_without_marker() {
        let tmp = tempdir().unwrap();
        let err = Project::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::NotFound { .. }));
    }

    #[test]
    fn test_entity_path_uses_prefix_directory() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let id = EntityId::new(EntityPrefix::Quot);
        let path = project.entity_path(&id);
        assert!(path.starts_with(project.root().join("purchasing/quotes")));
        assert!(path.to_string_lossy().ends_with(".depot.yaml"));
    }
}
