//! Repair executor
//!
//! [`repair`] applies the remedy for one [`Problem`] to the graph. Every
//! repair re-resolves its records by identifier first, so a problem whose
//! records were deleted or changed since the scan fails cleanly instead of
//! touching stale data.
//!
//! ## Remedies
//!
//! | Diagnosis | Effect |
//! |---|---|
//! | half links | add the missing inverse link |
//! | `GarbledSpouses` | swap the husband and wife slots while that seats more spouses correctly |
//! | `EmptyFamily` | delete the family (only if still empty) |
//! | `FatherAsChild` / `MotherAsChild` | drop the spouse from the child list |
//! | `PersonLonglived` | add an undated death event |
//! | `PersonSexless` | ask the [`UserInteraction`] for a sex |
//! | `DuplicateChildren` / `DateInvalid` | defer to a manual editor |
//! | media problems with resolution `Remove` | delete the multimedia record |
//! | `DanglingLink` | drop the links that do not resolve to a record of the linked type |
//! | informational diagnoses | [`GedcheckError::NotRepairable`] |
//!
//! Repairs are individually atomic but a batch is not transactional;
//! re-scanning after a partial batch reports exactly what is left.

use crate::error::{GedcheckError, Result};
use crate::graph::RecordGraph;
use crate::inspector::{Diagnosis, Problem};
use crate::record::{Event, EventKind, Family, Individual, Link, Multimedia, Record, RecordWithEvents};
use crate::types::{Sex, XRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Follow-up the host has to perform for a repair to complete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Deferral {
    /// Open this record in a manual editor
    OpenEditor(XRef),
    /// Ask the user for this individual's sex
    AskSex(XRef),
}

impl fmt::Display for Deferral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Deferral::OpenEditor(xref) => write!(f, "edit {} manually", xref),
            Deferral::AskSex(xref) => write!(f, "define the sex of {}", xref),
        }
    }
}

/// Result of a successful repair call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairOutcome {
    /// The graph was changed, or already had the intended state
    Repaired(String),
    /// Nothing was changed; the host must follow up
    Deferred(Deferral),
}

/// Decisions the repair executor delegates to the user
pub trait UserInteraction {
    /// Choose a sex for `individual`; `None` leaves the decision open
    fn choose_sex(&mut self, individual: &Individual) -> Option<Sex>;
}

/// Interaction that never decides anything
#[derive(Debug, Default, Clone, Copy)]
pub struct DeclineInteraction;

impl UserInteraction for DeclineInteraction {
    fn choose_sex(&mut self, _individual: &Individual) -> Option<Sex> {
        None
    }
}

impl<F> UserInteraction for F
where
    F: FnMut(&Individual) -> Option<Sex>,
{
    fn choose_sex(&mut self, individual: &Individual) -> Option<Sex> {
        self(individual)
    }
}

/// Apply the remedy for one problem
///
/// # Errors
///
/// - [`GedcheckError::NotRepairable`] for informational diagnoses
/// - [`GedcheckError::RecordNotFound`] when a record vanished since the scan
/// - [`GedcheckError::RecordTypeMismatch`] when the problem names records of
///   the wrong type
/// - [`GedcheckError::RepairFailed`] when the current graph state does not
///   allow the repair
pub fn repair(
    graph: &mut RecordGraph,
    problem: &Problem,
    interaction: &mut dyn UserInteraction,
) -> Result<RepairOutcome> {
    debug!("Repairing {}", problem);
    let subject = &problem.subject;

    match problem.diagnosis {
        Diagnosis::HalfSpouseLink => add_spouse_to_family(graph, subject, target(problem)?),
        Diagnosis::HalfChildLink => add_child_to_family(graph, subject, target(problem)?),
        Diagnosis::HalfFamilyHusbandLink | Diagnosis::HalfFamilyWifeLink => {
            link_spouse_back(graph, subject, target(problem)?)
        }
        Diagnosis::HalfFamilyChildLink => link_child_back(graph, subject, target(problem)?),
        Diagnosis::GarbledSpouses => {
            if !graph.has_garbled_spouses(graph.require::<Family>(subject)?) {
                return Ok(repaired(format!("Spouses of {} already sit in matching slots", subject)));
            }
            graph.require_mut::<Family>(subject)?.swap_spouses();
            Ok(repaired(format!("Swapped husband and wife of {}", subject)))
        }
        Diagnosis::EmptyFamily => remove_empty_family(graph, subject),
        Diagnosis::FatherAsChild => remove_spouse_from_children(graph, subject, |f| f.husband_xref()),
        Diagnosis::MotherAsChild => remove_spouse_from_children(graph, subject, |f| f.wife_xref()),
        Diagnosis::PersonLonglived => {
            let individual = graph.require_mut::<Individual>(subject)?;
            if individual.find_event(EventKind::Death).is_some() {
                return Ok(repaired(format!("{} already has a death record", subject)));
            }
            individual.events.push(Event::new(EventKind::Death));
            Ok(repaired(format!("Marked {} as deceased", subject)))
        }
        Diagnosis::PersonSexless => define_sex(graph, subject, interaction),
        Diagnosis::DuplicateChildren | Diagnosis::DateInvalid => {
            graph
                .get(subject)
                .ok_or_else(|| GedcheckError::RecordNotFound(subject.clone()))?;
            Ok(RepairOutcome::Deferred(Deferral::OpenEditor(subject.clone())))
        }
        Diagnosis::MediaWithoutFiles
        | Diagnosis::FileNotFound
        | Diagnosis::StorageNotFound
        | Diagnosis::ArchiveNotFound => {
            graph.require::<Multimedia>(subject)?;
            graph.delete(subject);
            Ok(repaired(format!("Removed multimedia record {}", subject)))
        }
        Diagnosis::DanglingLink => remove_dangling(graph, subject, target(problem)?),
        Diagnosis::LiveYearsInvalid
        | Diagnosis::StrangeSpouse
        | Diagnosis::StrangeParent
        | Diagnosis::DataLoop
        | Diagnosis::ChildWithoutParents
        | Diagnosis::FamilyWithoutFamily
        | Diagnosis::MediaBadData
        | Diagnosis::SeveralParents
        | Diagnosis::UnknownPlace
        | Diagnosis::HighSpousesDifference
        | Diagnosis::HighSiblingsDifference => Err(GedcheckError::NotRepairable(problem.diagnosis)),
    }
}

fn repaired(message: String) -> RepairOutcome {
    debug!("{}", message);
    RepairOutcome::Repaired(message)
}

fn target(problem: &Problem) -> Result<&XRef> {
    problem
        .target
        .as_ref()
        .ok_or_else(|| GedcheckError::repair_failed(&problem.subject, "problem names no target record"))
}

fn add_spouse_to_family(graph: &mut RecordGraph, person: &XRef, family: &XRef) -> Result<RepairOutcome> {
    let sex = graph.require::<Individual>(person)?.sex;
    // A missing spouse link and swapped slots usually come together
    if graph.has_garbled_spouses(graph.require::<Family>(family)?) {
        graph.require_mut::<Family>(family)?.swap_spouses();
        debug!("Swapped husband and wife of {} before linking {}", family, person);
    }
    let fam = graph.require::<Family>(family)?;

    let occupant = match sex {
        Sex::Male => fam.husband_xref(),
        Sex::Female => fam.wife_xref(),
        Sex::None | Sex::Undetermined => {
            return Err(GedcheckError::repair_failed(
                person,
                "sex is undefined, cannot choose husband or wife slot",
            ))
        }
    };
    match occupant {
        Some(current) if current == person => {
            return Ok(repaired(format!("{} already a spouse in {}", person, family)));
        }
        Some(current) if graph.individual(current).is_some() => {
            return Err(GedcheckError::repair_failed(
                person,
                format!("slot in {} is held by {}", family, current),
            ));
        }
        _ => {}
    }

    let fam = graph.require_mut::<Family>(family)?;
    let link = Some(Link::new(person.clone()));
    let slot = if sex == Sex::Male {
        fam.husband = link;
        "husband"
    } else {
        fam.wife = link;
        "wife"
    };
    Ok(repaired(format!("Set {} as {} of {}", person, slot, family)))
}

fn add_child_to_family(graph: &mut RecordGraph, person: &XRef, family: &XRef) -> Result<RepairOutcome> {
    graph.require::<Individual>(person)?;
    if graph.require_mut::<Family>(family)?.add_child(person) {
        Ok(repaired(format!("Added {} to the children of {}", person, family)))
    } else {
        Ok(repaired(format!("{} already a child of {}", person, family)))
    }
}

fn link_spouse_back(graph: &mut RecordGraph, family: &XRef, spouse: &XRef) -> Result<RepairOutcome> {
    if !graph.require::<Family>(family)?.has_spouse(spouse) {
        return Err(GedcheckError::repair_failed(
            family,
            format!("{} is no longer a spouse in this family", spouse),
        ));
    }
    graph.require_mut::<Individual>(spouse)?.add_spouse_to_family_link(family);
    Ok(repaired(format!("Linked spouse {} back to {}", spouse, family)))
}

fn link_child_back(graph: &mut RecordGraph, family: &XRef, child: &XRef) -> Result<RepairOutcome> {
    if !graph.require::<Family>(family)?.has_child(child) {
        return Err(GedcheckError::repair_failed(
            family,
            format!("{} is no longer a child of this family", child),
        ));
    }
    graph.require_mut::<Individual>(child)?.add_child_to_family_link(family);
    Ok(repaired(format!("Linked child {} back to {}", child, family)))
}

fn remove_empty_family(graph: &mut RecordGraph, family: &XRef) -> Result<RepairOutcome> {
    let fam = graph.require::<Family>(family)?;
    if fam.has_content() || graph.husband(fam).is_some() || graph.wife(fam).is_some() {
        return Err(GedcheckError::repair_failed(family, "family is no longer empty"));
    }
    graph.delete(family);
    Ok(repaired(format!("Removed empty family {}", family)))
}

fn remove_spouse_from_children(
    graph: &mut RecordGraph,
    family: &XRef,
    slot: impl Fn(&Family) -> Option<&XRef>,
) -> Result<RepairOutcome> {
    let spouse = slot(graph.require::<Family>(family)?)
        .cloned()
        .ok_or_else(|| GedcheckError::repair_failed(family, "spouse slot is empty"))?;

    let removed = graph.require_mut::<Family>(family)?.remove_child(&spouse);
    if let Some(individual) = graph.get_as_mut::<Individual>(&spouse) {
        individual.remove_child_to_family_links(family);
    }
    Ok(repaired(format!(
        "Removed {} child link(s) from {} to its own spouse {}",
        removed, family, spouse
    )))
}

fn define_sex(
    graph: &mut RecordGraph,
    person: &XRef,
    interaction: &mut dyn UserInteraction,
) -> Result<RepairOutcome> {
    let individual = graph.require::<Individual>(person)?;
    if individual.sex.is_defined() {
        return Ok(repaired(format!("Sex of {} is already defined", person)));
    }

    match interaction.choose_sex(individual) {
        Some(sex) if sex.is_defined() => {
            graph.require_mut::<Individual>(person)?.sex = sex;
            Ok(repaired(format!("Set sex of {} to {:?}", person, sex)))
        }
        _ => Ok(RepairOutcome::Deferred(Deferral::AskSex(person.clone()))),
    }
}

fn remove_dangling(graph: &mut RecordGraph, subject: &XRef, missing: &XRef) -> Result<RepairOutcome> {
    // Individuals link to families and families to individuals
    let resolves = match graph.get(subject) {
        Some(Record::Individual(_)) => graph.family(missing).is_some(),
        Some(Record::Family(_)) => graph.individual(missing).is_some(),
        Some(_) => false,
        None => return Err(GedcheckError::RecordNotFound(subject.clone())),
    };
    if resolves {
        return Err(GedcheckError::repair_failed(
            subject,
            format!("{} resolves again, link is no longer dangling", missing),
        ));
    }

    let record = graph
        .get_mut(subject)
        .ok_or_else(|| GedcheckError::RecordNotFound(subject.clone()))?;
    let removed = match record {
        Record::Individual(ind) => {
            ind.remove_child_to_family_links(missing) + ind.remove_spouse_to_family_links(missing)
        }
        Record::Family(fam) => {
            let mut removed = fam.remove_child(missing);
            if fam.husband.as_ref().is_some_and(|l| l.points_to(missing)) {
                fam.husband = None;
                removed += 1;
            }
            if fam.wife.as_ref().is_some_and(|l| l.points_to(missing)) {
                fam.wife = None;
                removed += 1;
            }
            removed
        }
        Record::Multimedia(_) | Record::Source(_) | Record::Note(_) => 0,
    };
    Ok(repaired(format!("Removed {} link(s) from {} to unresolvable {}", removed, subject, missing)))
}

/// Tally of a batch repair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchRepairReport {
    /// Problems repaired
    pub repaired: usize,
    /// Follow-ups for the host
    pub deferred: Vec<Deferral>,
    /// Problems whose repair failed, with the reason
    pub failed: Vec<(XRef, String)>,
    /// Informational problems left alone
    pub skipped: usize,
}

impl BatchRepairReport {
    /// Whether every actionable problem was repaired
    pub fn is_complete(&self) -> bool {
        self.deferred.is_empty() && self.failed.is_empty()
    }

    /// One-line summary of the batch
    pub fn summary(&self) -> String {
        format!(
            "{} repaired, {} deferred, {} failed, {} skipped",
            self.repaired,
            self.deferred.len(),
            self.failed.len(),
            self.skipped
        )
    }
}

/// Repair every actionable problem in order
///
/// Informational problems are counted as skipped. A failed repair is recorded
/// and the batch carries on with the next problem.
pub fn repair_all(
    graph: &mut RecordGraph,
    problems: &[Problem],
    interaction: &mut dyn UserInteraction,
) -> BatchRepairReport {
    let mut report = BatchRepairReport::default();

    for problem in problems {
        if !problem.resolution.is_actionable() {
            report.skipped += 1;
            continue;
        }
        match repair(graph, problem, interaction) {
            Ok(RepairOutcome::Repaired(_)) => report.repaired += 1,
            Ok(RepairOutcome::Deferred(deferral)) => report.deferred.push(deferral),
            Err(e) => {
                warn!("Repair of {} ({}) failed: {}", problem.subject, problem.diagnosis, e);
                report.failed.push((problem.subject.clone(), e.to_string()));
            }
        }
    }

    info!("Batch repair: {}", report.summary());
    report
}
