//! Assembling loaded files into one named corpus

use crate::config::LoaderConfig;
use crate::error::{Error, Result};
use crate::ingestion::{IngestionRegistry, LoaderStrategy, Role};
use crate::storage::Corpora;
use crate::types::{Corpus, CorpusHeader, Table};

/// Everything needed to assemble one corpus
#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    /// Corpus name; a name is generated when empty
    pub name: String,
    /// Headers applied to every corpus file
    pub corpus_headers: Vec<CorpusHeader>,
    /// Headers applied to every metadata file
    pub meta_headers: Vec<CorpusHeader>,
    /// Column holding document text
    pub text_header: Option<String>,
    /// Corpus-side join column
    pub corpus_link_header: Option<String>,
    /// Metadata-side join column
    pub meta_link_header: Option<String>,
}

/// Concatenates each role's files and joins corpus rows to metadata rows
#[derive(Debug, Clone, Copy)]
pub struct CorpusAssembler<'a> {
    config: &'a LoaderConfig,
}

impl<'a> CorpusAssembler<'a> {
    /// Create an assembler using the given configuration
    pub fn new(config: &'a LoaderConfig) -> Self {
        Self { config }
    }

    /// Build a corpus from the registered files and add it to `corpora`.
    ///
    /// Nothing is registered unless every step succeeds.
    pub fn build<'c>(
        &self,
        registry: &IngestionRegistry,
        corpora: &'c mut Corpora,
        request: &BuildRequest,
    ) -> Result<&'c Corpus> {
        let load_corpus = !request.corpus_headers.is_empty();
        let load_meta = !request.meta_headers.is_empty();

        if !load_corpus && !load_meta {
            return Err(Error::NothingToBuild);
        }
        let links = if load_corpus && load_meta {
            match (&request.corpus_link_header, &request.meta_link_header) {
                (Some(corpus_link), Some(meta_link)) => Some((corpus_link, meta_link)),
                _ => return Err(Error::MissingLinkHeader),
            }
        } else {
            None
        };
        if !request.name.is_empty() && corpora.contains(&request.name) {
            return Err(Error::DuplicateName(request.name.clone()));
        }
        let text_header = request
            .text_header
            .as_deref()
            .ok_or_else(|| Error::build("no text header selected"))?;

        let table = match links {
            Some((corpus_link, meta_link)) => {
                let corpus = self.concatenate(registry, Role::Corpus, &request.corpus_headers)?;
                let meta = self.concatenate(registry, Role::Meta, &request.meta_headers)?;
                let joined = corpus.inner_join(&meta, corpus_link, meta_link, &self.config.assembly.meta_suffix)?;
                tracing::debug!(
                    "Joined {} corpus rows with {} metadata rows into {} rows",
                    corpus.row_count(),
                    meta.row_count(),
                    joined.row_count()
                );
                joined
            }
            None if load_corpus => self.concatenate(registry, Role::Corpus, &request.corpus_headers)?,
            None => self.concatenate(registry, Role::Meta, &request.meta_headers)?,
        };

        if !table.has_column(text_header) {
            return Err(Error::build(format!(
                "text header '{}' is not a column of the assembled corpus",
                text_header
            )));
        }

        let corpus = Corpus::new(request.name.clone(), table, text_header)?;
        tracing::info!("Built corpus '{}' with {} documents", corpus.name(), corpus.len());
        corpora.add(corpus)
    }

    /// Load every file of a role in add order and stack the rows
    fn concatenate(&self, registry: &IngestionRegistry, role: Role, headers: &[CorpusHeader]) -> Result<Table> {
        let mut table = Table::empty();
        for file in registry.files_in(role) {
            let strategy = LoaderStrategy::for_file(file)?;
            let part = strategy.load(file, headers, &self.config.ingest)?;
            table
                .vstack(part)
                .map_err(|e| Error::build(format!("{} file {}: {}", role, file.path(), e)))?;
        }
        Ok(table)
    }
}
