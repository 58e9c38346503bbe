//! Column descriptors shared by every file that contributes a column

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Supported column datatypes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    /// Free text
    #[serde(alias = "STRING")]
    Text,
    /// 64-bit signed integer
    Integer,
    /// 64-bit float
    Float,
    /// true/false
    Boolean,
    /// Date and time without timezone
    DateTime,
    /// Text drawn from a small set of values
    Category,
}

impl DataType {
    /// Every datatype, in display order
    pub fn all() -> &'static [DataType] {
        &[
            Self::Text,
            Self::Integer,
            Self::Float,
            Self::Boolean,
            Self::DateTime,
            Self::Category,
        ]
    }

    /// Upper-case display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Integer => "INTEGER",
            Self::Float => "FLOAT",
            Self::Boolean => "BOOLEAN",
            Self::DateTime => "DATETIME",
            Self::Category => "CATEGORY",
        }
    }

    /// Whether values of this type are stored as text
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::Text | Self::Category)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TEXT" | "STRING" => Ok(Self::Text),
            "INTEGER" | "INT" => Ok(Self::Integer),
            "FLOAT" => Ok(Self::Float),
            "BOOLEAN" | "BOOL" => Ok(Self::Boolean),
            "DATETIME" => Ok(Self::DateTime),
            "CATEGORY" => Ok(Self::Category),
            other => Err(format!(
                "Unknown datatype '{}'. Valid datatypes: {}",
                other,
                Self::all().iter().map(|d| d.name()).collect::<Vec<_>>().join(", ")
            )),
        }
    }
}

/// A named, typed, include-flagged output column.
///
/// Two headers with the same name are the same header regardless of
/// their datatype or include flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusHeader {
    pub name: String,
    pub datatype: DataType,
    pub include: bool,
}

impl CorpusHeader {
    /// Create an included header
    pub fn new(name: impl Into<String>, datatype: DataType) -> Self {
        Self {
            name: name.into(),
            datatype,
            include: true,
        }
    }

    /// Full (name, datatype, include) signature, used for schema comparison
    pub fn signature(&self) -> (&str, DataType, bool) {
        (&self.name, self.datatype, self.include)
    }
}

impl PartialEq for CorpusHeader {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for CorpusHeader {}

impl Hash for CorpusHeader {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Ordered mapping from column name to its single header descriptor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeaderList {
    headers: Vec<CorpusHeader>,
}

impl HeaderList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, replacing any header with the same name in place
    pub fn insert(&mut self, header: CorpusHeader) {
        match self.headers.iter_mut().find(|h| h.name == header.name) {
            Some(existing) => *existing = header,
            None => self.headers.push(header),
        }
    }

    /// Look up a header by name
    pub fn get(&self, name: &str) -> Option<&CorpusHeader> {
        self.headers.iter().find(|h| h.name == name)
    }

    /// Whether a header with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Change the include flag and/or datatype of a header.
    ///
    /// Returns false if no header has this name.
    pub fn update(&mut self, name: &str, include: Option<bool>, datatype: Option<DataType>) -> bool {
        let Some(header) = self.headers.iter_mut().find(|h| h.name == name) else {
            return false;
        };
        if let Some(include) = include {
            header.include = include;
        }
        if let Some(datatype) = datatype {
            header.datatype = datatype;
        }
        true
    }

    /// Headers in insertion order
    pub fn as_slice(&self) -> &[CorpusHeader] {
        &self.headers
    }

    /// Headers with include set, in insertion order
    pub fn included(&self) -> impl Iterator<Item = &CorpusHeader> {
        self.headers.iter().filter(|h| h.include)
    }

    /// Number of headers
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Remove every header
    pub fn clear(&mut self) {
        self.headers.clear();
    }
}

impl From<Vec<CorpusHeader>> for HeaderList {
    fn from(headers: Vec<CorpusHeader>) -> Self {
        let mut list = Self::new();
        for header in headers {
            list.insert(header);
        }
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn any_datatype() -> impl Strategy<Value = DataType> {
        prop::sample::select(DataType::all().to_vec())
    }

    proptest! {
        #[test]
        fn test_identity_is_name_only(
            name in "[a-z_]{1,12}",
            a in any_datatype(),
            b in any_datatype(),
            inc_a in any::<bool>(),
            inc_b in any::<bool>(),
        ) {
            let h1 = CorpusHeader { name: name.clone(), datatype: a, include: inc_a };
            let h2 = CorpusHeader { name: name.clone(), datatype: b, include: inc_b };
            prop_assert_eq!(&h1, &h2);

            let set: HashSet<CorpusHeader> = [h1.clone(), h2.clone()].into_iter().collect();
            prop_assert_eq!(set.len(), 1);

            let list = HeaderList::from(vec![h1, h2]);
            prop_assert_eq!(list.len(), 1);
            prop_assert_eq!(list.get(&name).map(|h| h.datatype), Some(b));
        }
    }

    #[test]
    fn test_datatype_parsing() {
        assert_eq!("string".parse::<DataType>().unwrap(), DataType::Text);
        assert_eq!("DateTime".parse::<DataType>().unwrap(), DataType::DateTime);
        assert_eq!("category".parse::<DataType>().unwrap(), DataType::Category);
        let err = "decimal".parse::<DataType>().unwrap_err();
        assert!(err.contains("INTEGER"));
    }

    #[test]
    fn test_update_edits_single_descriptor() {
        let mut list = HeaderList::from(vec![
            CorpusHeader::new("name", DataType::Text),
            CorpusHeader::new("age", DataType::Integer),
        ]);

        assert!(list.update("age", Some(false), Some(DataType::Float)));
        assert!(!list.update("missing", Some(false), None));

        let age = list.get("age").unwrap();
        assert!(!age.include);
        assert_eq!(age.datatype, DataType::Float);
        let included: Vec<&str> = list.included().map(|h| h.name.as_str()).collect();
        assert_eq!(included, vec!["name"]);
    }
}
