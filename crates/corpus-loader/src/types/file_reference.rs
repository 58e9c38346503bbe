//! File identity and addressing, including files nested inside zip archives

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::{BufReader, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Location of a file inside a zip archive
#[derive(Debug, Clone)]
struct ArchiveMember {
    archive_path: PathBuf,
    internal_path: String,
}

/// Identity of one physical or archive-nested file.
///
/// Equality and hashing use the logical path only, so two references
/// to the same path are interchangeable wherever they came from.
#[derive(Debug, Clone)]
pub struct FileReference {
    path: String,
    directory_path: String,
    filename: String,
    extension: String,
    member: Option<ArchiveMember>,
}

impl FileReference {
    /// Reference a file on the filesystem
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let as_path = Path::new(&path);
        let directory_path = as_path
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let filename = as_path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.clone());
        let extension = extension_of(&filename);

        Self {
            path,
            directory_path,
            filename,
            extension,
            member: None,
        }
    }

    /// Reference a file stored inside a zip archive
    pub fn archived(archive_path: impl Into<PathBuf>, internal_path: impl Into<String>) -> Self {
        let archive_path = archive_path.into();
        let internal_path = internal_path.into();
        let path = archive_path.join(&internal_path).to_string_lossy().into_owned();
        let filename = internal_path
            .rsplit('/')
            .next()
            .unwrap_or(internal_path.as_str())
            .to_string();
        let extension = extension_of(&filename);

        Self {
            path,
            directory_path: archive_path.to_string_lossy().into_owned(),
            filename,
            extension,
            member: Some(ArchiveMember {
                archive_path,
                internal_path,
            }),
        }
    }

    /// Logical path, used as identity and for display
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Parent directory, or the archive path for archived files
    pub fn directory_path(&self) -> &str {
        &self.directory_path
    }

    /// File name including extension
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// File name without its final extension
    pub fn filename_no_ext(&self) -> &str {
        match self.filename.rfind('.') {
            Some(idx) if idx > 0 => &self.filename[..idx],
            _ => &self.filename,
        }
    }

    /// Extension as written (case preserved), without the '.'
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Extension lower-cased for comparisons
    pub fn extension_lower(&self) -> String {
        self.extension.to_lowercase()
    }

    /// True if the file name starts with '.'
    pub fn is_hidden(&self) -> bool {
        self.filename.starts_with('.')
    }

    /// True if the file lives inside a zip archive
    pub fn is_zipped(&self) -> bool {
        self.member.is_some()
    }

    /// The path whose existence and permissions govern this file
    pub fn physical_path(&self) -> &Path {
        match &self.member {
            Some(member) => &member.archive_path,
            None => Path::new(&self.path),
        }
    }

    /// Provide a directly openable path to the file contents.
    ///
    /// Archive members are extracted to a temporary file that keeps the
    /// original extension. The temporary file is deleted when the returned
    /// guard is dropped.
    pub fn resolve(&self) -> Result<ResolvedFile> {
        let Some(member) = &self.member else {
            return Ok(ResolvedFile::Direct(PathBuf::from(&self.path)));
        };

        let bytes = read_member(member)?;
        let suffix = if self.extension.is_empty() {
            String::new()
        } else {
            format!(".{}", self.extension)
        };
        let mut temp = tempfile::Builder::new()
            .prefix("corpus-loader-")
            .suffix(&suffix)
            .tempfile()?;
        temp.write_all(&bytes)?;
        temp.flush()?;

        tracing::debug!("Extracted {} to {}", self.path, temp.path().display());
        Ok(ResolvedFile::Extracted(temp))
    }

    /// Read the full file contents
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        match &self.member {
            Some(member) => read_member(member),
            None => Ok(std::fs::read(&self.path)?),
        }
    }

    /// Open a reader over the file contents
    pub fn open(&self) -> Result<Box<dyn Read>> {
        match &self.member {
            Some(member) => Ok(Box::new(Cursor::new(read_member(member)?))),
            None => Ok(Box::new(BufReader::new(File::open(&self.path)?))),
        }
    }
}

impl PartialEq for FileReference {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for FileReference {}

impl Hash for FileReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl fmt::Display for FileReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// A directly openable file path, extracted to a temporary file if needed
#[derive(Debug)]
pub enum ResolvedFile {
    /// The file exists on disk as-is
    Direct(PathBuf),
    /// Archive member extracted to a temporary file, removed on drop
    Extracted(NamedTempFile),
}

impl ResolvedFile {
    /// Path to open
    pub fn path(&self) -> &Path {
        match self {
            Self::Direct(path) => path,
            Self::Extracted(temp) => temp.path(),
        }
    }
}

fn extension_of(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ext.to_string(),
        None => String::new(),
    }
}

fn read_member(member: &ArchiveMember) -> Result<Vec<u8>> {
    let file = File::open(&member.archive_path)?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))?;
    let mut entry = archive.by_name(&member.internal_path)?;
    let mut bytes = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Add-only cache of file references keyed by logical path
#[derive(Debug, Default)]
pub struct FileReferenceCache {
    refs: HashMap<String, Arc<FileReference>>,
}

impl FileReferenceCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the reference for a filesystem path, creating it on first use
    pub fn get(&mut self, path: &str) -> Arc<FileReference> {
        self.refs
            .entry(path.to_string())
            .or_insert_with(|| Arc::new(FileReference::new(path)))
            .clone()
    }

    /// References for every file inside a zip archive, from a single scan
    pub fn archive_members(&mut self, archive_path: &str) -> Result<Vec<Arc<FileReference>>> {
        let file = File::open(archive_path).map_err(|e| Error::access(archive_path, e.to_string()))?;
        let archive = zip::ZipArchive::new(BufReader::new(file))
            .map_err(|e| Error::load(archive_path, e.to_string()))?;

        let mut members = Vec::new();
        for name in archive.file_names() {
            if name.ends_with('/') {
                continue;
            }
            let candidate = FileReference::archived(archive_path, name);
            let entry = self
                .refs
                .entry(candidate.path().to_string())
                .or_insert_with(|| Arc::new(candidate.clone()));
            // A plain reference cached under a member's path cannot read it
            if !entry.is_zipped() {
                *entry = Arc::new(candidate);
            }
            members.push(entry.clone());
        }
        members.sort_by(|a, b| a.path().cmp(b.path()));

        tracing::debug!("Found {} files in archive {}", members.len(), archive_path);
        Ok(members)
    }

    /// Zip archives expand to their members; any other path is a single file
    pub fn expand(&mut self, path: &str) -> Result<Vec<Arc<FileReference>>> {
        let reference = self.get(path);
        if reference.extension_lower() == "zip" && !reference.is_zipped() {
            self.archive_members(path)
        } else {
            Ok(vec![reference])
        }
    }

    /// Every file under a root directory, sorted by logical path
    pub fn discover(
        &mut self,
        root: &Path,
        expand_archives: bool,
    ) -> Result<Vec<Arc<FileReference>>> {
        let mut found = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                Error::access(root.to_string_lossy(), e.to_string())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path().to_string_lossy().into_owned();
            if expand_archives {
                found.extend(self.expand(&path)?);
            } else {
                found.push(self.get(&path));
            }
        }
        found.sort_by(|a, b| a.path().cmp(b.path()));
        Ok(found)
    }

    /// Number of cached references
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Drop every cached reference
    pub fn clear(&mut self) {
        self.refs.clear();
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::Write;
    use std::path::Path;

    /// Write a zip archive holding the given (name, content) entries
    pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, content) in entries {
            zip.start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(content).unwrap();
        }
        zip.finish().unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::write_zip;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cache_returns_same_reference() {
        let mut cache = FileReferenceCache::new();
        let a = cache.get("data/report.CSV");
        let b = cache.get("data/report.CSV");

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a, b);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_archive_member_replaces_plain_reference() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("bundle.zip");
        write_zip(&archive, &[("x.txt", b"x")]);
        let archive_str = archive.to_string_lossy().into_owned();

        let mut cache = FileReferenceCache::new();
        let plain = cache.get(&format!("{}/x.txt", archive_str));
        assert!(!plain.is_zipped());

        let members = cache.archive_members(&archive_str).unwrap();
        assert!(members[0].is_zipped());
        assert_eq!(members[0].read_bytes().unwrap(), b"x");
        assert!(cache.get(&format!("{}/x.txt", archive_str)).is_zipped());
    }

    #[test]
    fn test_path_components() {
        let file = FileReference::new("data/nested/.hidden.Txt");
        assert_eq!(file.directory_path(), "data/nested");
        assert_eq!(file.filename(), ".hidden.Txt");
        assert_eq!(file.extension(), "Txt");
        assert_eq!(file.extension_lower(), "txt");
        assert!(file.is_hidden());
        assert!(!file.is_zipped());

        let bare = FileReference::new("README");
        assert_eq!(bare.extension(), "");
        assert_eq!(bare.filename_no_ext(), "README");
    }

    #[test]
    fn test_equality_by_path_only() {
        let plain = FileReference::new("bundle.zip/a.txt");
        let member = FileReference::archived("bundle.zip", "a.txt");
        assert_eq!(plain, member);
        assert!(member.is_zipped());
    }

    #[test]
    fn test_archive_members_and_resolve() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("bundle.zip");
        write_zip(
            &archive,
            &[("docs/one.txt", b"first"), ("two.csv", b"a,b\n1,2\n")],
        );

        let mut cache = FileReferenceCache::new();
        let archive_str = archive.to_string_lossy().into_owned();
        let members = cache.archive_members(&archive_str).unwrap();
        assert_eq!(members.len(), 2);

        let one = members.iter().find(|m| m.filename() == "one.txt").unwrap();
        assert!(one.is_zipped());
        assert_eq!(one.directory_path(), archive_str);
        assert_eq!(one.read_bytes().unwrap(), b"first");

        let temp_path = {
            let resolved = one.resolve().unwrap();
            assert_eq!(std::fs::read(resolved.path()).unwrap(), b"first");
            assert!(resolved.path().to_string_lossy().ends_with(".txt"));
            resolved.path().to_path_buf()
        };
        assert!(!temp_path.exists());

        // A second scan hands back the cached references
        let again = cache.archive_members(&archive_str).unwrap();
        assert!(Arc::ptr_eq(&members[0], &again[0]));
    }

    #[test]
    fn test_discover_sorted_with_archives() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("a.txt"), "a").unwrap();
        write_zip(&dir.path().join("c.zip"), &[("inner.txt", b"c")]);

        let mut cache = FileReferenceCache::new();
        let flat = cache.discover(dir.path(), false).unwrap();
        assert_eq!(flat.len(), 3);

        let expanded = cache.discover(dir.path(), true).unwrap();
        let names: Vec<&str> = expanded.iter().map(|f| f.filename()).collect();
        assert_eq!(names, vec!["b.txt", "inner.txt", "a.txt"]);

        let paths: Vec<&str> = expanded.iter().map(|f| f.path()).collect();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
    }
}
