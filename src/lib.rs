//! # gedcheck - Integrity inspection and repair for genealogical record graphs
//!
//! A library that finds and fixes structural damage in a graph of
//! genealogical records: one-sided relationship links, spouses in the wrong
//! slot, duplicate or looping parent/child relationships, and biologically
//! implausible data.
//!
//! ## Overview
//!
//! gedcheck works on an in-memory [`RecordGraph`]:
//! - Records (individuals, families, multimedia, sources, notes) are owned by
//!   the graph and refer to each other through typed, XRef-keyed links
//! - [`TreeInspector`] scans every record once and returns [`Problem`]s
//! - [`repair`](repair::repair) applies the remedy for one problem; the host
//!   decides which problems to act on and when to re-scan
//!
//! ## Architecture
//!
//! - **Arena graph**: records live in one keyed collection; links hold
//!   identifiers, never references, so deletions leave detectable dangling
//!   links instead of stale pointers
//! - **Single pass**: the scanner visits each record once; loop detection is
//!   memoized per scan so the whole pass stays close to linear
//! - **Collaborators**: progress reporting, media lookup and user decisions
//!   are traits supplied by the host
//!
//! ## Quick Start
//!
//! ```rust
//! use gedcheck::{Diagnosis, RecordGraph, TreeInspector};
//! use gedcheck::progress::NoProgress;
//! use gedcheck::record::{Family, Individual, Link};
//! use gedcheck::repair::{repair, DeclineInteraction};
//! use gedcheck::types::Sex;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut graph = RecordGraph::new();
//! let family = graph.add(Family::default())?;
//!
//! // The child points at the family, but the family does not list the child
//! let mut child = Individual::new(Sex::Female);
//! child.child_to_family_links.push(Link::new(family.clone()));
//! graph.add(child)?;
//!
//! let inspector = TreeInspector::builder().build()?;
//! let report = inspector.scan(&graph, &mut NoProgress);
//! let half_link = report
//!     .problems
//!     .iter()
//!     .find(|p| p.diagnosis == Diagnosis::HalfChildLink)
//!     .ok_or("half link not reported")?;
//!
//! repair(&mut graph, half_link, &mut DeclineInteraction)?;
//! assert_eq!(inspector.scan(&graph, &mut NoProgress).count(Diagnosis::HalfChildLink), 0);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! Plausibility limits (maximum lifespan, parent ages, sibling spread, ...)
//! are [`Thresholds`](config::Thresholds) passed in with
//! [`InspectionOptions`]. They can be loaded from JSON so hosts tune them
//! without rebuilding.
//!
//! ## Concurrency
//!
//! Nothing here is internally parallel. To scan on a worker thread, wrap the
//! graph in a [`SharedGraph`] and use
//! [`TreeInspector::scan_shared`], which holds the read lock for the whole pass.
//!
//! ## Error Handling
//!
//! Integrity findings are data, never errors. [`GedcheckError`] is reserved
//! for operations that cannot proceed: repairs on records that vanished,
//! repairs requested for informational diagnoses, bad configuration, and I/O.
//!
//! ## Module Organization
//!
//! - [`graph`], [`record`], [`types`]: the record model
//! - [`date`], [`facts`]: date parsing and derived facts
//! - [`inspector`], [`cycle`]: the scanner
//! - [`repair`]: the repair executor
//! - [`config`], [`progress`], [`media`]: host-facing configuration and collaborators

// Public API modules
pub mod config;
pub mod cycle;
pub mod date;
pub mod error;
pub mod facts;
pub mod graph;
pub mod inspector;
pub mod media;
pub mod progress;
pub mod record;
pub mod repair;
pub mod types;

// Internal modules (not part of public API)
mod collections;

// Re-export main types for convenience
pub use config::{InspectionOptions, Thresholds};
pub use cycle::{detect_cycle, CycleDetector, CyclePath};
pub use error::{GedcheckError, Result};
pub use graph::{RecordGraph, SharedGraph};
pub use inspector::{Diagnosis, InspectionReport, Problem, Resolution, TreeInspector, TreeInspectorBuilder};
pub use repair::{repair, repair_all, BatchRepairReport, Deferral, RepairOutcome, UserInteraction};
pub use types::{RecordType, Sex, XRef};
