//! The record graph: sole owner of every record
//!
//! The graph is an arena keyed by [`XRef`]. Records refer to each other only
//! through [`Link`]s, which are resolved here on demand.
//!
//! ## Overview
//!
//! - **Lookup**: `get` is O(1) through an identifier index
//! - **Order**: `all` yields records in insertion order, which is also
//!   the order the inspector reports problems in
//! - **Deletion**: `delete` removes one record and nothing else; links in
//!   other records that pointed at it are left dangling on purpose, so the
//!   inspector surfaces them instead of the graph silently patching them
//!
//! ## Examples
//!
//! ```rust
//! use gedcheck::graph::RecordGraph;
//! use gedcheck::record::{Family, Individual, Link};
//! use gedcheck::types::Sex;
//!
//! let mut graph = RecordGraph::new();
//! let father = graph.add(Individual::new(Sex::Male))?;
//! let mut family = Family::default();
//! family.husband = Some(Link::new(father.clone()));
//! let fam = graph.add(family)?;
//!
//! let family = graph.family(&fam).unwrap();
//! assert_eq!(graph.husband(family).map(|i| &i.xref), Some(&father));
//! # Ok::<(), gedcheck::GedcheckError>(())
//! ```
//!
//! # Thread Safety
//!
//! `RecordGraph` is not synchronized. Hosts that scan on a worker thread wrap
//! it in a [`SharedGraph`] and hold the lock for the whole scan.

use crate::collections::{HashMap, HashMapExt, XRefMap};
use crate::error::{GedcheckError, Result};
use crate::record::{Family, Individual, Link, LinkTarget, Record};
use crate::types::{RecordType, Sex, XRef};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace};

/// A graph behind a read/write lock, for hosts that scan off the UI thread
pub type SharedGraph = Arc<RwLock<RecordGraph>>;

/// Keyed, insertion-ordered collection of records
#[derive(Debug, Clone, Default)]
pub struct RecordGraph {
    records: Vec<Record>,
    index: XRefMap<usize>,
    last_allocated: HashMap<RecordType, u64>,
}

/// On-disk shape of a graph snapshot
#[derive(Serialize, Deserialize)]
struct GraphSnapshot {
    records: Vec<Record>,
}

impl RecordGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
            last_allocated: HashMap::new(),
        }
    }

    /// Build a graph from records, in order
    ///
    /// # Errors
    ///
    /// Returns [`GedcheckError::DuplicateXRef`] if two records share an identifier.
    pub fn from_records<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = Record>,
    {
        let mut graph = Self::new();
        for record in records {
            graph.add(record)?;
        }
        Ok(graph)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the graph holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Add a record, allocating an identifier if it has none
    ///
    /// Returns the record's identifier.
    ///
    /// # Errors
    ///
    /// Returns [`GedcheckError::DuplicateXRef`] if the identifier is taken.
    pub fn add(&mut self, record: impl Into<Record>) -> Result<XRef> {
        let mut record = record.into();
        if record.xref().is_empty() {
            let xref = self.allocate_xref(record.record_type());
            record.set_xref(xref);
        }

        let xref = record.xref().clone();
        if self.index.contains_key(&xref) {
            return Err(GedcheckError::DuplicateXRef(xref));
        }

        self.index.insert(xref.clone(), self.records.len());
        self.records.push(record);
        trace!("Added record {}", xref);
        Ok(xref)
    }

    /// Look up a record by identifier
    pub fn get(&self, xref: &XRef) -> Option<&Record> {
        self.index.get(xref).map(|&i| &self.records[i])
    }

    /// Look up a record by identifier, mutably
    pub fn get_mut(&mut self, xref: &XRef) -> Option<&mut Record> {
        match self.index.get(xref) {
            Some(&i) => Some(&mut self.records[i]),
            None => None,
        }
    }

    /// Whether a record with this identifier exists
    pub fn contains(&self, xref: &XRef) -> bool {
        self.index.contains_key(xref)
    }

    /// Remove a record
    ///
    /// Returns `false` if no record had this identifier. Links held by other
    /// records are not touched.
    pub fn delete(&mut self, xref: &XRef) -> bool {
        let Some(pos) = self.index.remove(xref) else {
            return false;
        };

        self.records.remove(pos);
        for record in &self.records[pos..] {
            if let Some(slot) = self.index.get_mut(record.xref()) {
                *slot -= 1;
            }
        }

        debug!("Deleted record {}", xref);
        true
    }

    /// Iterate over all records in insertion order
    pub fn all(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// Iterate over all individuals
    pub fn individuals(&self) -> impl Iterator<Item = &Individual> {
        self.records.iter().filter_map(Record::as_individual)
    }

    /// Iterate over all families
    pub fn families(&self) -> impl Iterator<Item = &Family> {
        self.records.iter().filter_map(Record::as_family)
    }

    /// Look up a record of a specific type
    ///
    /// Returns `None` if the identifier is absent or names another type.
    pub fn get_as<T: LinkTarget>(&self, xref: &XRef) -> Option<&T> {
        self.get(xref).and_then(T::from_record)
    }

    /// Look up a record of a specific type, mutably
    pub fn get_as_mut<T: LinkTarget>(&mut self, xref: &XRef) -> Option<&mut T> {
        self.get_mut(xref).and_then(T::from_record_mut)
    }

    /// Look up a record of a specific type, reporting why it is unavailable
    ///
    /// # Errors
    ///
    /// - [`GedcheckError::RecordNotFound`] if the identifier is absent
    /// - [`GedcheckError::RecordTypeMismatch`] if it names another record type
    pub fn require<T: LinkTarget>(&self, xref: &XRef) -> Result<&T> {
        let record = self
            .get(xref)
            .ok_or_else(|| GedcheckError::RecordNotFound(xref.clone()))?;
        T::from_record(record).ok_or_else(|| GedcheckError::RecordTypeMismatch {
            xref: xref.clone(),
            expected: T::RECORD_TYPE,
            actual: record.record_type(),
        })
    }

    /// Mutable counterpart of [`require`](Self::require)
    pub fn require_mut<T: LinkTarget>(&mut self, xref: &XRef) -> Result<&mut T> {
        let record = self
            .get_mut(xref)
            .ok_or_else(|| GedcheckError::RecordNotFound(xref.clone()))?;
        let actual = record.record_type();
        T::from_record_mut(record).ok_or_else(|| GedcheckError::RecordTypeMismatch {
            xref: xref.clone(),
            expected: T::RECORD_TYPE,
            actual,
        })
    }

    /// Resolve a typed link; `None` when dangling or of the wrong type
    pub fn resolve<T: LinkTarget>(&self, link: &Link<T>) -> Option<&T> {
        self.get_as(link.xref())
    }

    /// Resolve an optional typed link
    pub fn resolve_opt<T: LinkTarget>(&self, link: Option<&Link<T>>) -> Option<&T> {
        link.and_then(|l| self.resolve(l))
    }

    /// Look up an individual
    pub fn individual(&self, xref: &XRef) -> Option<&Individual> {
        self.get_as(xref)
    }

    /// Look up a family
    pub fn family(&self, xref: &XRef) -> Option<&Family> {
        self.get_as(xref)
    }

    /// Resolved husband of a family
    pub fn husband(&self, family: &Family) -> Option<&Individual> {
        self.resolve_opt(family.husband.as_ref())
    }

    /// Resolved wife of a family
    pub fn wife(&self, family: &Family) -> Option<&Individual> {
        self.resolve_opt(family.wife.as_ref())
    }

    /// Spouses sitting in the other sex's slot: as filled, and as they would
    /// be with husband and wife swapped
    ///
    /// A spouse without a definite sex fits either slot.
    pub fn spouse_mismatches(&self, family: &Family) -> (usize, usize) {
        let husband = self.husband(family).map(|i| i.sex);
        let wife = self.wife(family).map(|i| i.sex);
        let as_filled = usize::from(husband == Some(Sex::Female)) + usize::from(wife == Some(Sex::Male));
        let swapped = usize::from(husband == Some(Sex::Male)) + usize::from(wife == Some(Sex::Female));
        (as_filled, swapped)
    }

    /// Whether swapping husband and wife would seat more spouses correctly
    pub fn has_garbled_spouses(&self, family: &Family) -> bool {
        let (as_filled, swapped) = self.spouse_mismatches(family);
        as_filled > swapped
    }

    /// Family of an individual's parents
    ///
    /// Follows the first child-to-family link; individuals with several
    /// parent families are reported by the inspector, not resolved here.
    pub fn parents_family(&self, individual: &Individual) -> Option<&Family> {
        individual
            .child_to_family_links
            .first()
            .and_then(|l| self.resolve(l))
    }

    /// Resolved families in which the individual is a spouse
    pub fn spouse_families<'a>(
        &'a self,
        individual: &'a Individual,
    ) -> impl Iterator<Item = &'a Family> + 'a {
        individual
            .spouse_to_family_links
            .iter()
            .filter_map(move |l| self.resolve(l))
    }

    /// Resolved children of a family
    pub fn children<'a>(&'a self, family: &'a Family) -> impl Iterator<Item = &'a Individual> + 'a {
        family.children.iter().filter_map(move |l| self.resolve(l))
    }

    /// Wrap the graph for sharing with a worker thread
    pub fn into_shared(self) -> SharedGraph {
        Arc::new(RwLock::new(self))
    }

    /// Serialize the graph to a JSON snapshot
    pub fn to_json(&self) -> Result<String> {
        let snapshot = GraphSnapshot {
            records: self.records.clone(),
        };
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    /// Build a graph from a JSON snapshot
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: GraphSnapshot = serde_json::from_str(json)?;
        Self::from_records(snapshot.records)
    }

    /// Load a JSON snapshot from disk
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let graph = Self::from_json(&json)?;
        debug!("Loaded {} records from {:?}", graph.len(), path);
        Ok(graph)
    }

    /// Write a JSON snapshot to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        debug!("Saved {} records to {:?}", self.len(), path);
        Ok(())
    }

    fn allocate_xref(&mut self, record_type: RecordType) -> XRef {
        let prefix = record_type.xref_prefix();
        let counter = self.last_allocated.entry(record_type).or_insert(0);
        loop {
            *counter += 1;
            let candidate = XRef::new(format!("{}{}", prefix, counter));
            if !self.index.contains_key(&candidate) {
                return candidate;
            }
        }
    }
}
