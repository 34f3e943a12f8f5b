//! Core data types used throughout the gedcheck library
//!
//! ## Overview
//!
//! - **Identity**: [`XRef`], the symbolic cross-reference that names a record
//! - **Classification**: [`RecordType`], the closed set of record kinds
//! - **Attributes**: [`Sex`], the only individual attribute integrity checks depend on
//!
//! ## Examples
//!
//! ```rust
//! use gedcheck::types::{RecordType, Sex, XRef};
//!
//! let xref = XRef::new("I1");
//! assert_eq!(xref.as_str(), "I1");
//! assert!(Sex::Male.is_defined());
//! assert_eq!(RecordType::Family.xref_prefix(), "F");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Symbolic cross-reference identifying one record within a graph
///
/// XRefs stand in for direct references so records tolerate forward
/// references and dangling links while they are being edited.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct XRef(String);

impl XRef {
    /// Create an XRef from any string-like value
    pub fn new(value: impl Into<String>) -> Self {
        XRef(value.into())
    }

    /// Borrow the identifier text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is blank (record not yet registered)
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for XRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for XRef {
    fn from(value: &str) -> Self {
        XRef(value.to_string())
    }
}

impl From<String> for XRef {
    fn from(value: String) -> Self {
        XRef(value)
    }
}

impl AsRef<str> for XRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Recorded sex of an individual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    /// No value recorded
    #[default]
    None,
    /// Male
    Male,
    /// Female
    Female,
    /// Recorded, but neither male nor female
    Undetermined,
}

impl Sex {
    /// Whether the value is male or female
    pub fn is_defined(self) -> bool {
        matches!(self, Sex::Male | Sex::Female)
    }
}

/// Closed set of record kinds held by a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    /// A person
    Individual,
    /// A couple and their children
    Family,
    /// A multimedia object with file references
    Multimedia,
    /// A source document
    Source,
    /// A free-text note
    Note,
}

impl RecordType {
    /// Prefix used when allocating identifiers for this record type
    pub fn xref_prefix(self) -> &'static str {
        match self {
            RecordType::Individual => "I",
            RecordType::Family => "F",
            RecordType::Multimedia => "O",
            RecordType::Source => "S",
            RecordType::Note => "N",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordType::Individual => "individual",
            RecordType::Family => "family",
            RecordType::Multimedia => "multimedia",
            RecordType::Source => "source",
            RecordType::Note => "note",
        };
        f.write_str(name)
    }
}
