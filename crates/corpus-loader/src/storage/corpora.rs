//! Assembled corpora keyed by unique name

use crate::error::{Error, Result};
use crate::types::Corpus;

/// Insertion-ordered collection of corpora with unique names
#[derive(Debug, Default)]
pub struct Corpora {
    corpora: Vec<Corpus>,
}

impl Corpora {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a corpus under its name
    pub fn add(&mut self, corpus: Corpus) -> Result<&Corpus> {
        if self.contains(corpus.name()) {
            return Err(Error::DuplicateName(corpus.name().to_string()));
        }
        tracing::debug!("Registered corpus '{}'", corpus.name());
        self.corpora.push(corpus);
        let index = self.corpora.len() - 1;
        Ok(&self.corpora[index])
    }

    /// Take a corpus out of the collection
    pub fn remove(&mut self, name: &str) -> Option<Corpus> {
        let index = self.position(name)?;
        Some(self.corpora.remove(index))
    }

    /// Look up a corpus by name
    pub fn get(&self, name: &str) -> Option<&Corpus> {
        self.corpora.iter().find(|c| c.name() == name)
    }

    /// Whether a corpus with this name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Corpora in registration order
    pub fn items(&self) -> &[Corpus] {
        &self.corpora
    }

    /// Names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.corpora.iter().map(Corpus::name).collect()
    }

    /// Most recently registered corpus
    pub fn latest(&self) -> Option<&Corpus> {
        self.corpora.last()
    }

    /// Give a registered corpus a new, unused name
    pub fn rename(&mut self, name: &str, new_name: &str) -> Result<()> {
        let index = self
            .position(name)
            .ok_or_else(|| Error::CorpusNotFound(name.to_string()))?;
        if new_name.is_empty() {
            return Err(Error::InvalidName("corpus name must not be empty".to_string()));
        }
        if name == new_name {
            return Ok(());
        }
        if self.contains(new_name) {
            return Err(Error::DuplicateName(new_name.to_string()));
        }

        self.corpora[index].rename(new_name);
        tracing::info!("Renamed corpus '{}' to '{}'", name, new_name);
        Ok(())
    }

    /// Number of corpora
    pub fn len(&self) -> usize {
        self.corpora.len()
    }

    /// Whether the collection is empty
    pub fn is_empty(&self) -> bool {
        self.corpora.is_empty()
    }

    /// Remove every corpus
    pub fn clear(&mut self) {
        self.corpora.clear();
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.corpora.iter().position(|c| c.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Column, DataType, Table, Value};

    fn corpus(name: &str) -> Corpus {
        let table = Table::from_columns(vec![Column::new(
            "document",
            DataType::Text,
            vec![Value::Text("text".into())],
        )])
        .unwrap();
        Corpus::new(name, table, "document").unwrap()
    }

    #[test]
    fn test_names_unique_on_add() {
        let mut corpora = Corpora::new();
        corpora.add(corpus("a")).unwrap();
        let err = corpora.add(corpus("a")).unwrap_err();
        assert!(matches!(err, Error::DuplicateName(ref n) if n == "a"));
        assert_eq!(corpora.len(), 1);
    }

    #[test]
    fn test_rename_rules() {
        let mut corpora = Corpora::new();
        corpora.add(corpus("a")).unwrap();
        corpora.add(corpus("b")).unwrap();

        assert!(matches!(corpora.rename("a", "b"), Err(Error::DuplicateName(_))));
        assert!(matches!(corpora.rename("a", ""), Err(Error::InvalidName(_))));
        assert!(matches!(corpora.rename("zzz", "c"), Err(Error::CorpusNotFound(_))));
        assert_eq!(corpora.names(), vec!["a", "b"]);

        corpora.rename("a", "a").unwrap();
        corpora.rename("a", "c").unwrap();
        assert_eq!(corpora.names(), vec!["c", "b"]);
        assert_eq!(corpora.latest().map(Corpus::name), Some("b"));
    }

    #[test]
    fn test_removed_corpus_renames_freely() {
        let mut corpora = Corpora::new();
        corpora.add(corpus("a")).unwrap();
        corpora.add(corpus("b")).unwrap();

        let mut removed = corpora.remove("a").unwrap();
        removed.rename("b");
        assert_eq!(removed.name(), "b");
        assert!(corpora.remove("a").is_none());

        corpora.clear();
        assert!(corpora.is_empty());
    }
}
