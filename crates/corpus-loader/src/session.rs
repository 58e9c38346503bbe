//! A loading session: files, editable headers, corpora and export in one place

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use crate::config::LoaderConfig;
use crate::error::{Error, Result};
use crate::export::{ExportEngine, ExportFormat, Exporter};
use crate::ingestion::{IngestionRegistry, LoaderStrategy, Role, SchemaReconciler};
use crate::processing::{BuildRequest, CorpusAssembler};
use crate::storage::Corpora;
use crate::types::{Corpus, CorpusSummary, DataType, FileReference, FileReferenceCache, HeaderList};

/// Key under which [`CorpusLoader::file_counts`] reports the total
pub const TOTAL_FILES_KEY: &str = "Total files";

/// Owns everything one caller needs to go from files to exported corpora.
///
/// Each caller constructs its own session. Nothing is shared between
/// sessions and no internal locking is done.
#[derive(Debug)]
pub struct CorpusLoader {
    config: LoaderConfig,
    cache: FileReferenceCache,
    registry: IngestionRegistry,
    corpus_headers: HeaderList,
    meta_headers: HeaderList,
    text_header: Option<String>,
    corpus_link_header: Option<String>,
    meta_link_header: Option<String>,
    corpora: Corpora,
    export: ExportEngine,
}

impl CorpusLoader {
    /// Create a session from a validated configuration
    pub fn new(config: LoaderConfig) -> Result<Self> {
        config.validate()?;
        let export = ExportEngine::new(&config.export);
        Ok(Self {
            config,
            cache: FileReferenceCache::new(),
            registry: IngestionRegistry::new(),
            corpus_headers: HeaderList::new(),
            meta_headers: HeaderList::new(),
            text_header: None,
            corpus_link_header: None,
            meta_link_header: None,
            corpora: Corpora::new(),
            export,
        })
    }

    /// Session configuration
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Write in-memory files under the root directory and return their paths.
    ///
    /// Names must be plain file names. Separators and `.`/`..` are rejected
    /// before anything is written. Existing files are overwritten.
    pub fn upload_files<N: AsRef<str>, B: AsRef<[u8]>>(&self, files: &[(N, B)]) -> Result<Vec<String>> {
        for (name, _) in files {
            let name = name.as_ref();
            if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
                return Err(Error::access(name, "upload name must be a plain file name"));
            }
        }

        let mut written = Vec::with_capacity(files.len());
        for (name, content) in files {
            let path = self.config.root_directory.join(name.as_ref());
            let display = path.to_string_lossy().into_owned();
            std::fs::write(&path, content.as_ref()).map_err(|e| Error::access(&display, e.to_string()))?;
            let uploaded = &display;
            tracing::debug!("Uploaded {}", uploaded);
            written.push(display);
        }
        tracing::info!(
            "Uploaded {} files to {}",
            written.len(),
            self.config.root_directory.display()
        );
        Ok(written)
    }

    /// Add files to a role and re-infer that role's headers.
    ///
    /// Zip archives are expanded into their members. Hidden files are
    /// skipped unless `include_hidden` is set. If anything fails, the files
    /// added by this call are removed again and the headers are unchanged.
    pub fn load_files<S: AsRef<str>>(&mut self, paths: &[S], role: Role, include_hidden: bool) -> Result<()> {
        let mut added: Vec<Arc<FileReference>> = Vec::new();
        let result = self.add_and_infer(paths, role, include_hidden, &mut added);

        match result {
            Ok(headers) => {
                tracing::info!(
                    "Loaded {} {} files, {} headers",
                    added.len(),
                    role,
                    headers.len()
                );
                *self.headers_mut(role) = headers;
                self.reapply_selections();
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Rolling back {} files after error: {}", added.len(), e);
                for file in &added {
                    self.registry.remove(file, role);
                }
                Err(e)
            }
        }
    }

    fn add_and_infer<S: AsRef<str>>(
        &mut self,
        paths: &[S],
        role: Role,
        include_hidden: bool,
        added: &mut Vec<Arc<FileReference>>,
    ) -> Result<HeaderList> {
        for path in paths {
            for file in self.cache.expand(path.as_ref())? {
                if file.is_hidden() && !include_hidden {
                    tracing::warn!("Skipping hidden file {}", file.path());
                    continue;
                }
                if self.registry.contains(&file, role) {
                    continue;
                }
                self.registry.add(file.clone(), role)?;
                added.push(file);
            }
        }

        let headers = SchemaReconciler::new(&self.config.ingest).infer(self.registry.files_in(role))?;
        Ok(HeaderList::from(headers))
    }

    /// Remove files (or every member of an archive) from both roles.
    ///
    /// Paths that match no loaded file are ignored.
    pub fn unload<S: AsRef<str>>(&mut self, paths: &[S]) {
        for path in paths {
            let path = path.as_ref();
            let matching: Vec<Arc<FileReference>> = self
                .registry
                .all_files()
                .filter(|f| f.path() == path || (f.is_zipped() && f.physical_path() == Path::new(path)))
                .cloned()
                .collect();
            for file in matching {
                self.registry.remove(&file, Role::Corpus);
                self.registry.remove(&file, Role::Meta);
            }
        }
        self.clear_emptied_roles();
    }

    /// Remove every file and all header state
    pub fn unload_all(&mut self) {
        self.registry.remove_all();
        self.clear_emptied_roles();
        tracing::debug!("All files unloaded");
    }

    fn clear_emptied_roles(&mut self) {
        if !self.registry.is_loaded(Role::Corpus) {
            self.corpus_headers.clear();
            self.text_header = None;
            self.corpus_link_header = None;
        }
        if !self.registry.is_loaded(Role::Meta) {
            self.meta_headers.clear();
            self.meta_link_header = None;
        }
    }

    /// Files loaded in a role, in add order
    pub fn files(&self, role: Role) -> &[Arc<FileReference>] {
        self.registry.files_in(role)
    }

    /// Whether a role has any files
    pub fn is_loaded(&self, role: Role) -> bool {
        self.registry.is_loaded(role)
    }

    /// Current headers of a role
    pub fn headers(&self, role: Role) -> &HeaderList {
        match role {
            Role::Corpus => &self.corpus_headers,
            Role::Meta => &self.meta_headers,
        }
    }

    fn headers_mut(&mut self, role: Role) -> &mut HeaderList {
        match role {
            Role::Corpus => &mut self.corpus_headers,
            Role::Meta => &mut self.meta_headers,
        }
    }

    /// Change the include flag and/or datatype of one header
    pub fn update_header(
        &mut self,
        role: Role,
        name: &str,
        include: Option<bool>,
        datatype: Option<DataType>,
    ) -> bool {
        self.headers_mut(role).update(name, include, datatype)
    }

    /// Selected document text header
    pub fn text_header(&self) -> Option<&str> {
        self.text_header.as_deref()
    }

    /// Select the document text header, forcing it to an included TEXT column.
    ///
    /// Corpus headers are searched first, then metadata headers. An unknown
    /// name clears the selection.
    pub fn set_text_header(&mut self, name: Option<&str>) {
        self.text_header = None;
        let Some(name) = name else {
            return;
        };
        for role in [Role::Corpus, Role::Meta] {
            if self.headers_mut(role).update(name, Some(true), Some(DataType::Text)) {
                self.text_header = Some(name.to_string());
                return;
            }
        }
    }

    /// Selected join header of a role
    pub fn link_header(&self, role: Role) -> Option<&str> {
        match role {
            Role::Corpus => self.corpus_link_header.as_deref(),
            Role::Meta => self.meta_link_header.as_deref(),
        }
    }

    /// Select the join header of a role, forcing it to be included.
    ///
    /// An unknown name clears the selection.
    pub fn set_link_header(&mut self, role: Role, name: Option<&str>) {
        let selected = name
            .filter(|n| self.headers_mut(role).update(n, Some(true), None))
            .map(str::to_string);
        match role {
            Role::Corpus => self.corpus_link_header = selected,
            Role::Meta => self.meta_link_header = selected,
        }
    }

    fn reapply_selections(&mut self) {
        let text = self.text_header.take();
        self.set_text_header(text.as_deref());
        for role in [Role::Corpus, Role::Meta] {
            let link = self.link_header(role).map(str::to_string);
            self.set_link_header(role, link.as_deref());
        }
    }

    /// Assemble the loaded files into a new corpus
    pub fn build(&mut self, name: &str) -> Result<&Corpus> {
        let request = BuildRequest {
            name: name.to_string(),
            corpus_headers: self.corpus_headers.as_slice().to_vec(),
            meta_headers: self.meta_headers.as_slice().to_vec(),
            text_header: self.text_header.clone(),
            corpus_link_header: self.corpus_link_header.clone(),
            meta_link_header: self.meta_link_header.clone(),
        };
        CorpusAssembler::new(&self.config).build(&self.registry, &mut self.corpora, &request)
    }

    /// Built corpora
    pub fn corpora(&self) -> &Corpora {
        &self.corpora
    }

    /// Look up a built corpus
    pub fn corpus(&self, name: &str) -> Option<&Corpus> {
        self.corpora.get(name)
    }

    /// Most recently built corpus
    pub fn latest_corpus(&self) -> Option<&Corpus> {
        self.corpora.latest()
    }

    /// Rename a built corpus
    pub fn rename_corpus(&mut self, name: &str, new_name: &str) -> Result<()> {
        self.corpora.rename(name, new_name)
    }

    /// Delete a built corpus, handing it back
    pub fn delete_corpus(&mut self, name: &str) -> Option<Corpus> {
        let removed = self.corpora.remove(name);
        if removed.is_some() {
            tracing::info!("Deleted corpus '{}'", name);
        }
        removed
    }

    /// Export a built corpus in one call
    pub fn export(&self, name: &str, format: ExportFormat) -> Result<Vec<u8>> {
        self.exporter(name, format)?.finish()
    }

    /// Start a chunked export of a built corpus
    pub fn exporter(&self, name: &str, format: ExportFormat) -> Result<Exporter<'_>> {
        let corpus = self
            .corpora
            .get(name)
            .ok_or_else(|| Error::CorpusNotFound(name.to_string()))?;
        self.export.exporter(corpus, format)
    }

    /// Summaries of every built corpus, newest first
    pub fn corpora_summary(&self) -> Vec<CorpusSummary> {
        self.corpora.items().iter().rev().map(Corpus::summary).collect()
    }

    /// Loaded file count in total and per upper-case extension
    pub fn file_counts(&self) -> BTreeMap<String, usize> {
        let mut seen = HashSet::new();
        let mut counts = BTreeMap::new();
        for file in self.registry.all_files() {
            if !seen.insert(file.path()) {
                continue;
            }
            *counts.entry(file.extension().to_uppercase()).or_insert(0) += 1;
        }
        counts.insert(TOTAL_FILES_KEY.to_string(), seen.len());
        counts
    }

    /// Every file under the configured root directory
    pub fn discover(&mut self, expand_archives: bool) -> Result<Vec<Arc<FileReference>>> {
        let root = self.config.root_directory.clone();
        self.cache.discover(&root, expand_archives)
    }

    /// Names of every datatype
    pub fn datatypes(&self) -> Vec<&'static str> {
        DataType::all().iter().map(|d| d.name()).collect()
    }

    /// Upper-case names of every loadable file type
    pub fn file_types(&self) -> Vec<String> {
        LoaderStrategy::accepted_extensions()
            .into_iter()
            .map(str::to_uppercase)
            .collect()
    }

    /// Upper-case names of every export format
    pub fn export_formats(&self) -> Vec<String> {
        ExportFormat::all().iter().map(|f| f.to_string()).collect()
    }
}
