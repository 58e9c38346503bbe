//! Which files are loaded, and in which role

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::FileReference;

/// The part a loaded file plays in the assembled corpus
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Files holding documents
    Corpus,
    /// Files holding metadata joined onto documents
    Meta,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corpus => f.write_str("corpus"),
            Self::Meta => f.write_str("meta"),
        }
    }
}

/// Two ordered, de-duplicated sets of files, one per role.
///
/// Adding checks the file can be opened; no content is read.
#[derive(Debug, Default)]
pub struct IngestionRegistry {
    corpus: Vec<Arc<FileReference>>,
    meta: Vec<Arc<FileReference>>,
}

impl IngestionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file to a role. Files already present are left in place.
    pub fn add(&mut self, file: Arc<FileReference>, role: Role) -> Result<()> {
        if self.contains(&file, role) {
            return Ok(());
        }
        check_readable(&file)?;

        tracing::debug!("Added {} as {} file", file.path(), role);
        self.files_mut(role).push(file);
        Ok(())
    }

    /// Remove a file from a role if present
    pub fn remove(&mut self, file: &FileReference, role: Role) {
        self.files_mut(role).retain(|f| f.as_ref() != file);
    }

    /// Remove every file from both roles
    pub fn remove_all(&mut self) {
        self.corpus.clear();
        self.meta.clear();
    }

    /// Files of a role in the order they were added
    pub fn files_in(&self, role: Role) -> &[Arc<FileReference>] {
        match role {
            Role::Corpus => &self.corpus,
            Role::Meta => &self.meta,
        }
    }

    /// Whether a role has any files
    pub fn is_loaded(&self, role: Role) -> bool {
        !self.files_in(role).is_empty()
    }

    /// Whether a file is present in a role
    pub fn contains(&self, file: &FileReference, role: Role) -> bool {
        self.files_in(role).iter().any(|f| f.as_ref() == file)
    }

    /// Files across both roles, corpus files first
    pub fn all_files(&self) -> impl Iterator<Item = &Arc<FileReference>> {
        self.corpus.iter().chain(self.meta.iter())
    }

    fn files_mut(&mut self, role: Role) -> &mut Vec<Arc<FileReference>> {
        match role {
            Role::Corpus => &mut self.corpus,
            Role::Meta => &mut self.meta,
        }
    }
}

fn check_readable(file: &FileReference) -> Result<()> {
    let physical = file.physical_path();
    if !physical.exists() {
        return Err(Error::access(file.path(), "file does not exist"));
    }
    if physical.is_dir() {
        return Err(Error::access(file.path(), "path is a directory"));
    }
    File::open(physical).map_err(|e| Error::access(file.path(), e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileReferenceCache;
    use tempfile::TempDir;

    #[test]
    fn test_add_dedupes_and_keeps_order() {
        let dir = TempDir::new().unwrap();
        for name in ["b.txt", "a.txt"] {
            std::fs::write(dir.path().join(name), name).unwrap();
        }
        let mut cache = FileReferenceCache::new();
        let b = cache.get(&dir.path().join("b.txt").to_string_lossy());
        let a = cache.get(&dir.path().join("a.txt").to_string_lossy());

        let mut registry = IngestionRegistry::new();
        registry.add(b.clone(), Role::Corpus).unwrap();
        registry.add(a.clone(), Role::Corpus).unwrap();
        registry.add(b.clone(), Role::Corpus).unwrap();
        registry.add(a.clone(), Role::Meta).unwrap();

        let names: Vec<&str> = registry.files_in(Role::Corpus).iter().map(|f| f.filename()).collect();
        assert_eq!(names, vec!["b.txt", "a.txt"]);
        assert!(registry.contains(&a, Role::Meta));

        registry.remove(&b, Role::Corpus);
        registry.remove(&b, Role::Corpus);
        assert_eq!(registry.files_in(Role::Corpus).len(), 1);

        registry.remove_all();
        assert!(!registry.is_loaded(Role::Corpus));
        assert!(!registry.is_loaded(Role::Meta));
    }

    #[test]
    fn test_missing_file_is_access_error() {
        let mut registry = IngestionRegistry::new();
        let file = Arc::new(FileReference::new("/nonexistent/ghost.csv"));
        let err = registry.add(file, Role::Corpus).unwrap_err();
        match err {
            Error::Access { path, .. } => assert_eq!(path, "/nonexistent/ghost.csv"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!registry.is_loaded(Role::Corpus));
    }
}
