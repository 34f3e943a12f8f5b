//! Derived facts over a record's events
//!
//! Read-only queries the plausibility checks are built on. All of them work in
//! whole years taken from each date's chronological year, and return `None`
//! when an input is missing or its date does not parse; a missing fact is
//! never a finding by itself.

use crate::graph::RecordGraph;
use crate::record::{EventKind, Family, Individual, RecordWithEvents};

/// Chronological year of the first event of `kind`
pub fn event_year<R: RecordWithEvents + ?Sized>(record: &R, kind: EventKind) -> Option<i32> {
    record.find_event(kind).and_then(|e| e.date.year())
}

/// Year of birth
pub fn birth_year(individual: &Individual) -> Option<i32> {
    event_year(individual, EventKind::Birth)
}

/// Year of death
pub fn death_year(individual: &Individual) -> Option<i32> {
    event_year(individual, EventKind::Death)
}

/// Whether a death event is recorded, dated or not
pub fn is_dead(individual: &Individual) -> bool {
    individual.find_event(EventKind::Death).is_some()
}

/// Age in years: at death if dead, otherwise at `reference_year`
///
/// `None` without a birth year, or when the person is dead but the death
/// year is unknown.
pub fn age(individual: &Individual, reference_year: i32) -> Option<i32> {
    let born = birth_year(individual)?;
    let end = if is_dead(individual) {
        death_year(individual)?
    } else {
        reference_year
    };
    Some(end - born)
}

/// Years between birth and death, when both are known
pub fn lifespan(individual: &Individual) -> Option<i32> {
    Some(death_year(individual)? - birth_year(individual)?)
}

/// Age at the earliest dated marriage across all of the individual's families
pub fn marriage_age(graph: &RecordGraph, individual: &Individual) -> Option<i32> {
    let born = birth_year(individual)?;
    let married = graph
        .spouse_families(individual)
        .filter_map(|f| event_year(f, EventKind::Marriage))
        .min()?;
    Some(married - born)
}

/// Earliest-born child across all of the individual's families
pub fn firstborn<'g>(graph: &'g RecordGraph, individual: &'g Individual) -> Option<&'g Individual> {
    graph
        .spouse_families(individual)
        .flat_map(|f| graph.children(f))
        .filter_map(|c| birth_year(c).map(|y| (y, c)))
        .min_by_key(|(y, _)| *y)
        .map(|(_, c)| c)
}

/// Age of the individual when their first child was born
pub fn firstborn_age(graph: &RecordGraph, individual: &Individual) -> Option<i32> {
    let born = birth_year(individual)?;
    let child = firstborn(graph, individual)?;
    Some(birth_year(child)? - born)
}

/// Absolute difference between the spouses' birth years
pub fn spouses_difference(graph: &RecordGraph, family: &Family) -> Option<i32> {
    let husband = birth_year(graph.husband(family)?)?;
    let wife = birth_year(graph.wife(family)?)?;
    Some((husband - wife).abs())
}

/// Spread between the earliest and latest known child birth years
pub fn siblings_spread(graph: &RecordGraph, family: &Family) -> Option<i32> {
    let years: Vec<i32> = graph.children(family).filter_map(birth_year).collect();
    let min = years.iter().min()?;
    let max = years.iter().max()?;
    Some(max - min)
}

/// Whether any event of the individual records a place
pub fn has_any_place(individual: &Individual) -> bool {
    individual.events.iter().any(|e| e.has_place())
}
