//! Detection of loops in ancestry data
//!
//! An individual must never be their own ancestor or their own descendant.
//! Two depth-first walks run from every individual:
//!
//! - **Ancestors**: into the husband and wife of the individual's (first)
//!   parent family
//! - **Descendants**: into every child of every family the individual is a
//!   spouse in
//!
//! A loop exists when a walk reaches an individual that is still on the
//! current path. Walks use an explicit stack, so pathological depths cannot
//! exhaust the call stack, and every step checks path membership before
//! descending, so a walk always terminates.
//!
//! ## Memoization
//!
//! Once an individual's subtree has been fully explored in one direction
//! without finding a loop, that subtree is known to be loop-free and later
//! walks stop there. [`CycleDetector`] keeps these marks for one inspection
//! session; [`detect_cycle`] starts from clean marks on every call, for
//! one-off questions about a single person.
//!
//! ```text
//!         F1 (parents of A)
//!        /  \
//!       B    C        B is a child of F2,
//!       |             F2's husband is A
//!       F2 --------> ancestors(A) = B -> A  => loop
//! ```

use crate::collections::{HashSet, HashSetExt, XRefMap};
use crate::graph::RecordGraph;
use crate::record::Individual;
use crate::types::XRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// Direction of a relationship walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WalkDirection {
    /// Toward parents
    Ancestors,
    /// Toward children
    Descendants,
}

/// Witness path of a detected loop
///
/// Runs from the walk's root to the individual that was reached a second
/// time. Only one witness is reported even if several loops exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CyclePath {
    /// Direction the loop was found in
    pub direction: WalkDirection,
    /// Identifiers from the root to the repeated individual, inclusive
    pub chain: Vec<XRef>,
}

impl CyclePath {
    /// Individual the walk started from
    pub fn root(&self) -> Option<&XRef> {
        self.chain.first()
    }

    /// Individual that was visited twice
    pub fn repeated(&self) -> Option<&XRef> {
        self.chain.last()
    }
}

impl fmt::Display for CyclePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, xref) in self.chain.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{}", xref)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct VisitFlags {
    ancestors: bool,
    descendants: bool,
}

impl VisitFlags {
    fn get(self, direction: WalkDirection) -> bool {
        match direction {
            WalkDirection::Ancestors => self.ancestors,
            WalkDirection::Descendants => self.descendants,
        }
    }

    fn set(&mut self, direction: WalkDirection) {
        match direction {
            WalkDirection::Ancestors => self.ancestors = true,
            WalkDirection::Descendants => self.descendants = true,
        }
    }
}

/// Loop detector with marks scoped to one inspection session
///
/// Create one per scan and drop it afterwards; marks must not outlive the
/// graph state they were computed from.
#[derive(Debug, Default)]
pub struct CycleDetector {
    explored: XRefMap<VisitFlags>,
}

impl CycleDetector {
    /// Create a detector with no marks
    pub fn new() -> Self {
        Self::default()
    }

    /// Check one individual in both directions
    ///
    /// Directions already confirmed loop-free for this individual are skipped.
    pub fn check(&mut self, graph: &RecordGraph, individual: &Individual) -> Option<CyclePath> {
        for direction in [WalkDirection::Ancestors, WalkDirection::Descendants] {
            if self.is_explored(&individual.xref, direction) {
                continue;
            }
            if let Some(path) = walk(graph, individual, direction, &mut self.explored) {
                return Some(path);
            }
        }
        None
    }

    /// Whether `xref` has been confirmed loop-free in `direction`
    pub fn is_explored(&self, xref: &XRef, direction: WalkDirection) -> bool {
        self.explored.get(xref).is_some_and(|f| f.get(direction))
    }

    /// Number of individuals with at least one confirmed direction
    pub fn explored_count(&self) -> usize {
        self.explored.len()
    }
}

/// Check one individual without any marks from earlier calls
pub fn detect_cycle(graph: &RecordGraph, individual: &Individual) -> Option<CyclePath> {
    let mut explored = XRefMap::default();
    [WalkDirection::Ancestors, WalkDirection::Descendants]
        .into_iter()
        .find_map(|direction| walk(graph, individual, direction, &mut explored))
}

struct Frame<'g> {
    xref: &'g XRef,
    next: Vec<&'g Individual>,
    pos: usize,
}

fn neighbors<'g>(
    graph: &'g RecordGraph,
    individual: &'g Individual,
    direction: WalkDirection,
) -> Vec<&'g Individual> {
    match direction {
        WalkDirection::Ancestors => match graph.parents_family(individual) {
            Some(family) => graph
                .husband(family)
                .into_iter()
                .chain(graph.wife(family))
                .collect(),
            None => Vec::new(),
        },
        WalkDirection::Descendants => graph
            .spouse_families(individual)
            .flat_map(|family| graph.children(family))
            .collect(),
    }
}

fn walk<'g>(
    graph: &'g RecordGraph,
    root: &'g Individual,
    direction: WalkDirection,
    explored: &mut XRefMap<VisitFlags>,
) -> Option<CyclePath> {
    let mut on_path: HashSet<&'g XRef> = HashSet::new();
    let mut stack = vec![Frame {
        xref: &root.xref,
        next: neighbors(graph, root, direction),
        pos: 0,
    }];
    on_path.insert(&root.xref);

    while let Some(frame) = stack.last_mut() {
        if frame.pos < frame.next.len() {
            let next = frame.next[frame.pos];
            frame.pos += 1;

            if on_path.contains(&next.xref) {
                let mut chain: Vec<XRef> = stack.iter().map(|f| f.xref.clone()).collect();
                chain.push(next.xref.clone());
                trace!("Loop in {:?} walk from {}: {:?}", direction, root.xref, chain);
                return Some(CyclePath { direction, chain });
            }

            if explored.get(&next.xref).is_some_and(|f| f.get(direction)) {
                continue;
            }

            on_path.insert(&next.xref);
            stack.push(Frame {
                xref: &next.xref,
                next: neighbors(graph, next, direction),
                pos: 0,
            });
        } else if let Some(done) = stack.pop() {
            on_path.remove(done.xref);
            explored.entry(done.xref.clone()).or_default().set(direction);
        }
    }

    None
}
