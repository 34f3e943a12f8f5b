//! Integrity scanner
//!
//! [`TreeInspector`] walks every record of a [`RecordGraph`] exactly once and
//! runs a fixed battery of structural and plausibility checks on it. Findings
//! come back as [`Problem`] values inside an [`InspectionReport`]; the scan
//! never mutates the graph and never fails because of bad data.
//!
//! ## Checks
//!
//! | Record | Checks |
//! |---|---|
//! | Individual | event dates, child/spouse back-links, several parent families, longevity, sex, birth/death order, marriage age, parenthood age, data loops, places (optional) |
//! | Family | event dates, husband/wife/child back-links, spouse roles, emptiness, missing spouses, parent listed as child, spouse age gap, duplicate children, sibling spread |
//! | Multimedia | file references, primary file availability |
//!
//! Each problem carries a suggested [`Resolution`]. Problems resolved by
//! [`Resolution::Skip`] are informational; everything else can be handed to
//! [`repair`](crate::repair::repair).
//!
//! ## Example
//!
//! ```rust
//! use gedcheck::graph::RecordGraph;
//! use gedcheck::inspector::{Diagnosis, TreeInspector};
//! use gedcheck::progress::NoProgress;
//! use gedcheck::record::Family;
//!
//! let mut graph = RecordGraph::new();
//! graph.add(Family::default())?;
//!
//! let inspector = TreeInspector::builder().build()?;
//! let report = inspector.scan(&graph, &mut NoProgress);
//! assert_eq!(report.count(Diagnosis::EmptyFamily), 1);
//! # Ok::<(), gedcheck::GedcheckError>(())
//! ```

use crate::collections::{HashSet, HashSetExt};
use crate::config::{InspectionOptions, Thresholds};
use crate::cycle::CycleDetector;
use crate::error::{GedcheckError, Result};
use crate::facts;
use crate::graph::{RecordGraph, SharedGraph};
use crate::media::{AssumePresent, MediaStatus, MediaStore};
use crate::progress::{NoProgress, ProgressScope, ScanProgress};
use crate::record::{Family, Individual, Multimedia, Record, RecordWithEvents};
use crate::types::{RecordType, Sex, XRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Kind of integrity finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Diagnosis {
    /// Living person older than the maximum lifespan
    PersonLonglived,
    /// Sex is neither male nor female
    PersonSexless,
    /// Death year precedes birth year
    LiveYearsInvalid,
    /// Implausible age at first marriage
    StrangeSpouse,
    /// Implausible age at first child's birth
    StrangeParent,
    /// Family with no content and no spouses
    EmptyFamily,
    /// Husband listed among the family's children
    FatherAsChild,
    /// Wife listed among the family's children
    MotherAsChild,
    /// Same child listed twice in one family
    DuplicateChildren,
    /// Event date that does not parse
    DateInvalid,
    /// Individual is their own ancestor or descendant
    DataLoop,
    /// Family has children but no spouses
    ChildWithoutParents,
    /// Family has content but neither spouses nor children
    FamilyWithoutFamily,
    /// Multimedia record without file references
    MediaWithoutFiles,
    /// Media storage directory is missing
    StorageNotFound,
    /// Media archive is missing
    ArchiveNotFound,
    /// Media file is missing
    FileNotFound,
    /// Media file cannot be read
    MediaBadData,
    /// Individual's spouse link is not mirrored by the family
    HalfSpouseLink,
    /// Individual's child link is not mirrored by the family
    HalfChildLink,
    /// Family's husband does not link back to the family
    HalfFamilyHusbandLink,
    /// Family's wife does not link back to the family
    HalfFamilyWifeLink,
    /// Family's child does not link back to the family
    HalfFamilyChildLink,
    /// Husband and wife would fit their sexes better with the slots swapped
    GarbledSpouses,
    /// Individual belongs to more than one parent family
    SeveralParents,
    /// No event of the individual records a place
    UnknownPlace,
    /// Spouses' birth years are abnormally far apart
    HighSpousesDifference,
    /// Siblings' birth years are abnormally far apart
    HighSiblingsDifference,
    /// Link to a record that does not exist or has another type
    DanglingLink,
}

impl Diagnosis {
    /// Every diagnosis, in catalog order
    pub const ALL: [Diagnosis; 29] = [
        Diagnosis::PersonLonglived,
        Diagnosis::PersonSexless,
        Diagnosis::LiveYearsInvalid,
        Diagnosis::StrangeSpouse,
        Diagnosis::StrangeParent,
        Diagnosis::EmptyFamily,
        Diagnosis::FatherAsChild,
        Diagnosis::MotherAsChild,
        Diagnosis::DuplicateChildren,
        Diagnosis::DateInvalid,
        Diagnosis::DataLoop,
        Diagnosis::ChildWithoutParents,
        Diagnosis::FamilyWithoutFamily,
        Diagnosis::MediaWithoutFiles,
        Diagnosis::StorageNotFound,
        Diagnosis::ArchiveNotFound,
        Diagnosis::FileNotFound,
        Diagnosis::MediaBadData,
        Diagnosis::HalfSpouseLink,
        Diagnosis::HalfChildLink,
        Diagnosis::HalfFamilyHusbandLink,
        Diagnosis::HalfFamilyWifeLink,
        Diagnosis::HalfFamilyChildLink,
        Diagnosis::GarbledSpouses,
        Diagnosis::SeveralParents,
        Diagnosis::UnknownPlace,
        Diagnosis::HighSpousesDifference,
        Diagnosis::HighSiblingsDifference,
        Diagnosis::DanglingLink,
    ];

    /// Stable kebab-case name, as used on the command line and in JSON
    pub fn name(self) -> &'static str {
        match self {
            Diagnosis::PersonLonglived => "person-longlived",
            Diagnosis::PersonSexless => "person-sexless",
            Diagnosis::LiveYearsInvalid => "live-years-invalid",
            Diagnosis::StrangeSpouse => "strange-spouse",
            Diagnosis::StrangeParent => "strange-parent",
            Diagnosis::EmptyFamily => "empty-family",
            Diagnosis::FatherAsChild => "father-as-child",
            Diagnosis::MotherAsChild => "mother-as-child",
            Diagnosis::DuplicateChildren => "duplicate-children",
            Diagnosis::DateInvalid => "date-invalid",
            Diagnosis::DataLoop => "data-loop",
            Diagnosis::ChildWithoutParents => "child-without-parents",
            Diagnosis::FamilyWithoutFamily => "family-without-family",
            Diagnosis::MediaWithoutFiles => "media-without-files",
            Diagnosis::StorageNotFound => "storage-not-found",
            Diagnosis::ArchiveNotFound => "archive-not-found",
            Diagnosis::FileNotFound => "file-not-found",
            Diagnosis::MediaBadData => "media-bad-data",
            Diagnosis::HalfSpouseLink => "half-spouse-link",
            Diagnosis::HalfChildLink => "half-child-link",
            Diagnosis::HalfFamilyHusbandLink => "half-family-husband-link",
            Diagnosis::HalfFamilyWifeLink => "half-family-wife-link",
            Diagnosis::HalfFamilyChildLink => "half-family-child-link",
            Diagnosis::GarbledSpouses => "garbled-spouses",
            Diagnosis::SeveralParents => "several-parents",
            Diagnosis::UnknownPlace => "unknown-place",
            Diagnosis::HighSpousesDifference => "high-spouses-difference",
            Diagnosis::HighSiblingsDifference => "high-siblings-difference",
            Diagnosis::DanglingLink => "dangling-link",
        }
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Diagnosis {
    type Err = GedcheckError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Diagnosis::ALL
            .into_iter()
            .find(|d| d.name() == wanted)
            .ok_or_else(|| GedcheckError::InvalidConfiguration(format!("unknown diagnosis '{}'", s)))
    }
}

/// Suggested remedy for a problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resolution {
    /// Informational; no automatic action
    Skip,
    /// Record a death event
    SetDeceased,
    /// Ask for the person's sex
    DefineSex,
    /// Delete a record or sever a link
    Remove,
    /// Open the record in an editor
    Edit,
    /// Restore a missing or wrong link
    Repair,
}

impl Resolution {
    /// Whether a repair action exists for this resolution
    pub fn is_actionable(self) -> bool {
        self != Resolution::Skip
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resolution::Skip => "skip",
            Resolution::SetDeceased => "set-deceased",
            Resolution::DefineSex => "define-sex",
            Resolution::Remove => "remove",
            Resolution::Edit => "edit",
            Resolution::Repair => "repair",
        };
        f.write_str(name)
    }
}

/// One diagnosed integrity problem
///
/// Created by the scanner only. The subject and target are stored as
/// identifiers and re-resolved on repair, so a problem stays meaningful (or
/// detectably stale) after the graph changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    /// Record the problem was found on
    pub subject: XRef,
    /// Type of the subject record
    pub subject_type: RecordType,
    /// Other record involved, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<XRef>,
    /// What is wrong
    pub diagnosis: Diagnosis,
    /// Suggested remedy
    pub resolution: Resolution,
    /// Human-readable detail
    pub detail: String,
}

impl Problem {
    fn new(subject: &XRef, subject_type: RecordType, diagnosis: Diagnosis, resolution: Resolution) -> Self {
        Self {
            subject: subject.clone(),
            subject_type,
            target: None,
            diagnosis,
            resolution,
            detail: String::new(),
        }
    }

    fn with_target(mut self, target: &XRef) -> Self {
        self.target = Some(target.clone());
        self
    }

    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    /// Display name of the subject, e.g. `John Smith [ I1 ]`
    ///
    /// Families show as `husband - wife`. Records that no longer resolve show
    /// the identifier only.
    pub fn record_name(&self, graph: &RecordGraph) -> String {
        let name = match graph.get(&self.subject) {
            Some(Record::Individual(ind)) => ind.display_name(),
            Some(Record::Family(fam)) => {
                let side = |ind: Option<&Individual>| {
                    ind.map(Individual::display_name).unwrap_or_else(|| "?".to_string())
                };
                format!("{} - {}", side(graph.husband(fam)), side(graph.wife(fam)))
            }
            Some(Record::Multimedia(media)) => media.title.clone(),
            Some(Record::Source(source)) => source.title.clone(),
            Some(Record::Note(_)) | None => String::new(),
        };

        if name.is_empty() {
            format!("[ {} ]", self.subject)
        } else {
            format!("{} [ {} ]", name, self.subject)
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.subject, self.diagnosis)?;
        if let Some(target) = &self.target {
            write!(f, " -> {}", target)?;
        }
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

/// Outcome of one inspection pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InspectionReport {
    /// Problems in record order
    pub problems: Vec<Problem>,
    /// Number of records visited
    pub records_checked: usize,
    /// Wall time of the pass
    pub elapsed_ms: u64,
}

impl InspectionReport {
    /// Whether no problems were found
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }

    /// Number of problems with the given diagnosis
    pub fn count(&self, diagnosis: Diagnosis) -> usize {
        self.problems.iter().filter(|p| p.diagnosis == diagnosis).count()
    }

    /// Problems found on one record
    pub fn by_subject<'a>(&'a self, subject: &XRef) -> impl Iterator<Item = &'a Problem> + 'a {
        let subject = subject.clone();
        self.problems.iter().filter(move |p| p.subject == subject)
    }

    /// Number of problems that have a repair action
    pub fn actionable(&self) -> usize {
        self.problems.iter().filter(|p| p.resolution.is_actionable()).count()
    }

    /// One-line summary of the pass
    pub fn summary(&self) -> String {
        if self.is_clean() {
            format!(
                "{} records checked in {}ms, no problems found",
                self.records_checked, self.elapsed_ms
            )
        } else {
            format!(
                "{} records checked in {}ms: {} problems ({} repairable)",
                self.records_checked,
                self.elapsed_ms,
                self.problems.len(),
                self.actionable()
            )
        }
    }

    /// Take the problem list
    pub fn into_problems(self) -> Vec<Problem> {
        self.problems
    }
}

/// Integrity scanner configured for a host
#[derive(Clone)]
pub struct TreeInspector {
    options: InspectionOptions,
    media: Arc<dyn MediaStore>,
}

impl fmt::Debug for TreeInspector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeInspector")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Default for TreeInspector {
    fn default() -> Self {
        Self {
            options: InspectionOptions::default(),
            media: Arc::new(AssumePresent),
        }
    }
}

impl TreeInspector {
    /// Create an inspector with the given options and no media store
    ///
    /// # Errors
    ///
    /// Returns [`GedcheckError::InvalidConfiguration`] for incoherent thresholds.
    pub fn new(options: InspectionOptions) -> Result<Self> {
        Self::builder().options(options).build()
    }

    /// Start configuring an inspector
    pub fn builder() -> TreeInspectorBuilder {
        TreeInspectorBuilder::new()
    }

    /// Options in effect
    pub fn options(&self) -> &InspectionOptions {
        &self.options
    }

    /// Inspect every record of `graph`
    ///
    /// `progress` receives `begin(len)`, one `increment()` per record and a
    /// final `end()`, which is issued even if a check panics.
    pub fn scan(&self, graph: &RecordGraph, progress: &mut dyn ScanProgress) -> InspectionReport {
        let started = Instant::now();
        let mut session = Session::new(graph, &self.options, self.media.as_ref());

        {
            let mut scope = ProgressScope::begin(progress, graph.len());
            for record in graph.all() {
                scope.increment();
                session.check(record);
            }
        }

        debug!(
            "Loop walks confirmed {} individuals",
            session.cycles.explored_count()
        );
        let report = InspectionReport {
            records_checked: graph.len(),
            problems: session.problems,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        info!("{}", report.summary());
        report
    }

    /// Inspect a shared graph, holding its read lock for the whole pass
    pub fn scan_shared(&self, graph: &SharedGraph, progress: &mut dyn ScanProgress) -> InspectionReport {
        let guard = graph.read();
        self.scan(&guard, progress)
    }
}

/// Inspect `graph` with `options`, without media verification or progress
///
/// # Errors
///
/// Returns [`GedcheckError::InvalidConfiguration`] for incoherent thresholds.
pub fn scan(graph: &RecordGraph, options: &InspectionOptions) -> Result<Vec<Problem>> {
    let inspector = TreeInspector::new(options.clone())?;
    Ok(inspector.scan(graph, &mut NoProgress).into_problems())
}

/// Builder for [`TreeInspector`]
///
/// # Default Values
///
/// - `options`: [`InspectionOptions::default`]
/// - `media_store`: every file reported present
#[derive(Default)]
pub struct TreeInspectorBuilder {
    options: InspectionOptions,
    media: Option<Arc<dyn MediaStore>>,
}

impl TreeInspectorBuilder {
    /// Create a builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all options at once
    pub fn options(mut self, options: InspectionOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the thresholds
    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.options.thresholds = thresholds;
        self
    }

    /// Report individuals without any place
    pub fn check_individual_places(mut self, enabled: bool) -> Self {
        self.options.check_individual_places = enabled;
        self
    }

    /// Fix the year living ages are computed at
    pub fn reference_year(mut self, year: i32) -> Self {
        self.options.reference_year = Some(year);
        self
    }

    /// Verify multimedia files against this store
    pub fn media_store(mut self, store: impl MediaStore + 'static) -> Self {
        self.media = Some(Arc::new(store));
        self
    }

    /// Build the inspector
    ///
    /// # Errors
    ///
    /// Returns [`GedcheckError::InvalidConfiguration`] for incoherent thresholds.
    pub fn build(self) -> Result<TreeInspector> {
        self.options.validate()?;
        Ok(TreeInspector {
            options: self.options,
            media: self.media.unwrap_or_else(|| Arc::new(AssumePresent)),
        })
    }
}

/// State of one pass: accumulated problems and the session's loop marks
struct Session<'a> {
    graph: &'a RecordGraph,
    options: &'a InspectionOptions,
    limits: &'a Thresholds,
    reference_year: i32,
    media: &'a dyn MediaStore,
    cycles: CycleDetector,
    problems: Vec<Problem>,
}

impl<'a> Session<'a> {
    fn new(graph: &'a RecordGraph, options: &'a InspectionOptions, media: &'a dyn MediaStore) -> Self {
        Self {
            graph,
            options,
            limits: &options.thresholds,
            reference_year: options.effective_reference_year(),
            media,
            cycles: CycleDetector::new(),
            problems: Vec::new(),
        }
    }

    fn check(&mut self, record: &'a Record) {
        let before = self.problems.len();
        match record {
            Record::Individual(ind) => self.check_individual(ind),
            Record::Family(fam) => self.check_family(fam),
            Record::Multimedia(media) => self.check_multimedia(media),
            Record::Source(_) | Record::Note(_) => {}
        }
        let found = self.problems.len() - before;
        if found > 0 {
            debug!("{} {}: {} problems", record.record_type(), record.xref(), found);
        }
    }

    fn push(&mut self, problem: Problem) {
        self.problems.push(problem);
    }

    fn check_events<R: RecordWithEvents>(&mut self, record: &R, subject_type: RecordType) {
        for event in record.events() {
            if event.date.parse().is_err() {
                self.push(
                    Problem::new(record.xref(), subject_type, Diagnosis::DateInvalid, Resolution::Edit)
                        .with_detail(format!("Invalid date ({})", event.date)),
                );
            }
        }
    }

    fn dangling(&mut self, subject: &XRef, subject_type: RecordType, target: &XRef, what: &str) {
        let detail = match self.graph.get(target) {
            Some(record) => format!(
                "{} link to {}, which is a record of type {}",
                what,
                target,
                record.record_type()
            ),
            None => format!("{} link to missing record {}", what, target),
        };
        self.push(
            Problem::new(subject, subject_type, Diagnosis::DanglingLink, Resolution::Repair)
                .with_target(target)
                .with_detail(detail),
        );
    }

    fn check_individual(&mut self, ind: &'a Individual) {
        let graph = self.graph;
        let me = &ind.xref;
        let person = |diagnosis, resolution| Problem::new(me, RecordType::Individual, diagnosis, resolution);

        self.check_events(ind, RecordType::Individual);

        for link in &ind.child_to_family_links {
            match graph.resolve(link) {
                None => self.dangling(me, RecordType::Individual, link.xref(), "Child-to-family"),
                Some(family) if !family.has_child(me) => self.push(
                    person(Diagnosis::HalfChildLink, Resolution::Repair)
                        .with_target(&family.xref)
                        .with_detail(format!(
                            "{} links to parents family {}, which does not list them as a child",
                            me, family.xref
                        )),
                ),
                Some(_) => {}
            }
        }

        if ind.child_to_family_links.len() > 1 {
            self.push(
                person(Diagnosis::SeveralParents, Resolution::Skip)
                    .with_detail(format!("{} belongs to several parent families", me)),
            );
        }

        for link in &ind.spouse_to_family_links {
            match graph.resolve(link) {
                None => self.dangling(me, RecordType::Individual, link.xref(), "Spouse-to-family"),
                Some(family) if !family.has_spouse(me) => self.push(
                    person(Diagnosis::HalfSpouseLink, Resolution::Repair)
                        .with_target(&family.xref)
                        .with_detail(format!(
                            "{} links to family {}, which does not list them as a spouse",
                            me, family.xref
                        )),
                ),
                Some(_) => {}
            }
        }

        if !facts::is_dead(ind) {
            if let Some(age) = facts::age(ind, self.reference_year) {
                if age >= self.limits.max_lifespan {
                    self.push(
                        person(Diagnosis::PersonLonglived, Resolution::SetDeceased)
                            .with_detail(format!("Person is {} years old and has no death record", age)),
                    );
                }
            }
        }

        if !ind.sex.is_defined() {
            self.push(person(Diagnosis::PersonSexless, Resolution::DefineSex).with_detail("Sex is not defined"));
        }

        if let Some(years) = facts::lifespan(ind).filter(|&years| years < 0) {
            self.push(
                person(Diagnosis::LiveYearsInvalid, Resolution::Skip)
                    .with_detail(format!("Death is recorded {} years before birth", -years)),
            );
        }

        if let Some(age) = facts::marriage_age(graph, ind) {
            if age < self.limits.min_marriage_age || age >= self.limits.max_lifespan {
                self.push(
                    person(Diagnosis::StrangeSpouse, Resolution::Skip)
                        .with_detail(format!("Age at first marriage is {}", age)),
                );
            }
        }

        if let Some(age) = facts::firstborn_age(graph, ind) {
            let max = match ind.sex {
                Sex::Female => Some(self.limits.max_mother_age),
                Sex::Male => Some(self.limits.max_father_age),
                Sex::None | Sex::Undetermined => None,
            };
            if age < self.limits.min_parent_age || max.is_some_and(|max| age >= max) {
                self.push(
                    person(Diagnosis::StrangeParent, Resolution::Skip)
                        .with_detail(format!("Age at first child's birth is {}", age)),
                );
            }
        }

        if let Some(path) = self.cycles.check(graph, ind) {
            self.push(
                person(Diagnosis::DataLoop, Resolution::Skip)
                    .with_detail(format!("Data loop detected: {}", path)),
            );
        }

        if self.options.check_individual_places && !facts::has_any_place(ind) {
            self.push(
                person(Diagnosis::UnknownPlace, Resolution::Skip)
                    .with_detail("No event of this person records a place"),
            );
        }
    }

    fn check_family(&mut self, fam: &'a Family) {
        let graph = self.graph;
        let me = &fam.xref;
        let family = |diagnosis, resolution| Problem::new(me, RecordType::Family, diagnosis, resolution);

        self.check_events(fam, RecordType::Family);

        let husband = graph.husband(fam);
        let wife = graph.wife(fam);

        for (slot, link, resolved, diagnosis) in [
            ("Husband", fam.husband.as_ref(), husband, Diagnosis::HalfFamilyHusbandLink),
            ("Wife", fam.wife.as_ref(), wife, Diagnosis::HalfFamilyWifeLink),
        ] {
            match (link, resolved) {
                (Some(link), None) => self.dangling(me, RecordType::Family, link.xref(), slot),
                (_, Some(spouse)) if spouse.index_of_spouse(me).is_none() => self.push(
                    family(diagnosis, Resolution::Repair)
                        .with_target(&spouse.xref)
                        .with_detail(format!(
                            "{} {} of family {} does not link back to it",
                            slot, spouse.xref, me
                        )),
                ),
                _ => {}
            }
        }

        if graph.has_garbled_spouses(fam) {
            self.push(
                family(Diagnosis::GarbledSpouses, Resolution::Repair)
                    .with_detail(format!("Husband and wife of family {} are swapped", me)),
            );
        }

        let mut dangling_children: Vec<&XRef> = Vec::new();
        for link in &fam.children {
            match graph.resolve(link) {
                None => {
                    if !dangling_children.contains(&link.xref()) {
                        dangling_children.push(link.xref());
                        self.dangling(me, RecordType::Family, link.xref(), "Child");
                    }
                }
                Some(child) if child.find_child_to_family_link(me).is_none() => self.push(
                    family(Diagnosis::HalfFamilyChildLink, Resolution::Repair)
                        .with_target(&child.xref)
                        .with_detail(format!(
                            "Child {} of family {} does not link back to it",
                            child.xref, me
                        )),
                ),
                Some(_) => {}
            }
        }

        if !fam.has_content() && husband.is_none() && wife.is_none() {
            self.push(family(Diagnosis::EmptyFamily, Resolution::Remove).with_detail("Family is empty"));
            return;
        }

        match (husband, wife) {
            (None, None) if !fam.children.is_empty() => self.push(
                family(Diagnosis::ChildWithoutParents, Resolution::Skip)
                    .with_detail("Family has children but no parents"),
            ),
            (None, None) => self.push(
                family(Diagnosis::FamilyWithoutFamily, Resolution::Skip)
                    .with_detail("Family record has neither spouses nor children"),
            ),
            _ => {
                if husband.is_some_and(|h| fam.has_child(&h.xref)) {
                    self.push(
                        family(Diagnosis::FatherAsChild, Resolution::Remove)
                            .with_detail("Husband is listed as a child of his own family"),
                    );
                }
                if wife.is_some_and(|w| fam.has_child(&w.xref)) {
                    self.push(
                        family(Diagnosis::MotherAsChild, Resolution::Remove)
                            .with_detail("Wife is listed as a child of her own family"),
                    );
                }
                if let Some(diff) = facts::spouses_difference(graph, fam) {
                    if diff > self.limits.max_spouses_diff {
                        self.push(
                            family(Diagnosis::HighSpousesDifference, Resolution::Skip)
                                .with_detail(format!("Spouses were born {} years apart", diff)),
                        );
                    }
                }
            }
        }

        let mut seen: HashSet<&XRef> = HashSet::with_capacity(fam.children.len());
        if !fam.children.iter().all(|c| seen.insert(c.xref())) {
            self.push(
                family(Diagnosis::DuplicateChildren, Resolution::Edit)
                    .with_detail("The same child is listed more than once"),
            );
        }

        if let Some(spread) = facts::siblings_spread(graph, fam) {
            if spread > self.limits.max_siblings_diff {
                self.push(
                    family(Diagnosis::HighSiblingsDifference, Resolution::Skip)
                        .with_detail(format!("Siblings were born {} years apart", spread)),
                );
            }
        }
    }

    fn check_multimedia(&mut self, media: &Multimedia) {
        let me = &media.xref;
        let Some(primary) = media.file_references.first() else {
            self.push(
                Problem::new(me, RecordType::Multimedia, Diagnosis::MediaWithoutFiles, Resolution::Remove)
                    .with_detail("Multimedia record has no files"),
            );
            return;
        };

        let check = self.media.verify(primary);
        let (diagnosis, resolution, detail) = match check.status {
            MediaStatus::Exists => return,
            MediaStatus::FileNotFound => (
                Diagnosis::FileNotFound,
                Resolution::Remove,
                format!("File not found: {}", check.file_name),
            ),
            MediaStatus::StorageNotFound => (
                Diagnosis::StorageNotFound,
                Resolution::Remove,
                format!("Media storage not found for {}", check.file_name),
            ),
            MediaStatus::ArchiveNotFound => (
                Diagnosis::ArchiveNotFound,
                Resolution::Remove,
                format!("Media archive not found for {}", check.file_name),
            ),
            MediaStatus::BadData => (
                Diagnosis::MediaBadData,
                Resolution::Skip,
                format!("Media file cannot be read: {}", check.file_name),
            ),
        };
        self.push(Problem::new(me, RecordType::Multimedia, diagnosis, resolution).with_detail(detail));
    }
}
