//! Record loading and saving
//!
//! Generic helpers for reading and writing records of any [`Entity`] type,
//! so command implementations don't repeat directory scanning.

use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::entity::Entity;
use crate::core::project::{Project, RECORD_SUFFIX};
use crate::core::shortid::ShortIdIndex;
use crate::yaml::{parse_yaml_file, YamlError};

/// Load all records of type T in the project
///
/// Files that fail to parse are skipped and logged; `depot validate`
/// reports them in full.
pub fn load_all<T: Entity>(project: &Project) -> Vec<T> {
    let mut entities = Vec::new();

    for path in project.iter_entity_files(T::PREFIX) {
        match parse_yaml_file::<T>(&path) {
            Ok(entity) => entities.push(entity),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable record");
            }
        }
    }

    entities.sort_by(|a: &T, b: &T| a.id().cmp(b.id()));
    entities
}

/// Parse every record file of type T, keeping failures
pub fn scan<T: Entity>(project: &Project) -> Vec<(PathBuf, std::result::Result<T, YamlError>)> {
    project
        .iter_entity_files(T::PREFIX)
        .map(|path| {
            let parsed = parse_yaml_file::<T>(&path);
            (path, parsed)
        })
        .collect()
}

/// Find a record file by full or partial ID in a directory
///
/// Searches for a file whose stem contains the given ID.
/// Returns the first match found.
pub fn find_entity_file(dir: &Path, id: &str) -> Option<PathBuf> {
    if id.is_empty() || !dir.exists() {
        return None;
    }

    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.to_string_lossy().ends_with(RECORD_SUFFIX))
        .filter(|p| {
            p.file_name()
                .and_then(|s| s.to_str())
                .map_or(false, |name| name.contains(id))
        })
        .collect();

    candidates.sort();
    candidates.into_iter().next()
}

/// Load a single record by ID, partial ID or short ID (`@N`)
pub fn load_entity<T: Entity>(project: &Project, reference: &str) -> Result<(PathBuf, T)> {
    let short_ids = ShortIdIndex::load(project);
    let resolved = short_ids
        .resolve(reference)
        .unwrap_or_else(|| reference.to_string());

    let path = find_entity_file(&project.entity_dir(T::PREFIX), &resolved).ok_or_else(|| {
        miette::miette!("No {} found matching '{}'", T::PREFIX.label(), reference)
    })?;

    let entity = parse_yaml_file::<T>(&path)?;
    Ok((path, entity))
}

/// Resolve a reference to the full ID string of an existing record of type T
pub fn resolve_id<T: Entity>(project: &Project, reference: &str) -> Result<String> {
    let (_, entity) = load_entity::<T>(project, reference)?;
    Ok(entity.id().to_string())
}

/// Write a record to its canonical path, returning that path
pub fn save_entity<T: Entity>(project: &Project, entity: &T) -> Result<PathBuf> {
    let path = project.entity_path(entity.id());
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }

    let yaml = serde_yml::to_string(entity).into_diagnostic()?;
    fs::write(&path, yaml).into_diagnostic()?;
    tracing::debug!(id = %entity.id(), path = %path.display(), "saved record");
    Ok(path)
}

/// Delete the file backing a record
pub fn remove_entity<T: Entity>(project: &Project, entity: &T) -> Result<PathBuf> {
    let path = project.entity_path(entity.id());
    fs::remove_file(&path).into_diagnostic()?;
    tracing::debug!(id = %entity.id(), "removed record");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::facility::Facility;
    use tempfile::tempdir;

    #[test]
    fn test_load_all_empty_project() {
        let dir = tempdir().unwrap();
        let project = Project::init(dir.path()).unwrap();
        let facilities: Vec<Facility> = load_all(&project);
        assert!(facilities.is_empty());
    }

    #[test]
    fn test_find_entity_file_nonexistent_dir() {
        assert!(find_entity_file(Path::new("/nonexistent/path"), "PART-123").is_none());
    }

    #[test]
    fn test_find_entity_file_by_partial_id() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("PART-01J123456789ABCDEF.depot.yaml");
        fs::write(&file_path, "id: PART-01J123456789ABCDEF").unwrap();

        assert_eq!(find_entity_file(dir.path(), "01J1234").unwrap(), file_path);
        assert!(find_entity_file(dir.path(), "").is_none());
    }

    #[test]
    fn test_save_then_load_by_short_id() {
        let dir = tempdir().unwrap();
        let project = Project::init(dir.path()).unwrap();

        let facility = Facility::new("North Plant".into(), "tester".into());
        save_entity(&project, &facility).unwrap();

        let mut index = ShortIdIndex::load(&project);
        let short = index.add(facility.id.to_string());
        index.save(&project).unwrap();

        let (_, loaded) = load_entity::<Facility>(&project, &format!("@{}", short)).unwrap();
        assert_eq!(loaded.id, facility.id);
        assert_eq!(loaded.name, "North Plant");
    }

    #[test]
    fn test_load_all_skips_broken_files() {
        let dir = tempdir().unwrap();
        let project = Project::init(dir.path()).unwrap();

        let facility = Facility::new("Depot A".into(), "tester".into());
        save_entity(&project, &facility).unwrap();
        fs::write(
            project.entity_dir(crate::core::EntityPrefix::Fac).join("FAC-broken.depot.yaml"),
            "id: [unclosed",
        )
        .unwrap();

        let facilities: Vec<Facility> = load_all(&project);
        assert_eq!(facilities.len(), 1);

        let scanned = scan::<Facility>(&project);
        assert_eq!(scanned.len(), 2);
        assert_eq!(scanned.iter().filter(|(_, r)| r.is_err()).count(), 1);
    }
}
