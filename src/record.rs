//! Record types and typed links
//!
//! Records never hold references to one another. Every relationship is a
//! [`Link`] carrying the target's [`XRef`] and the target's *type*; the
//! link is resolved against a [`RecordGraph`](crate::graph::RecordGraph)
//! each time it is followed, so deleting a record can never leave a stale
//! pointer behind, only a dangling identifier the inspector can report.
//!
//! ## Relationship links
//!
//! ```text
//! Individual.child_to_family_links[]  <->  Family.children[]
//! Individual.spouse_to_family_links[] <->  Family.husband / Family.wife
//! ```
//!
//! Both sides are stored; keeping them mirrored is what the inspector checks.

use crate::date::DateValue;
use crate::types::{RecordType, Sex, XRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Record types a [`Link`] can point at
pub trait LinkTarget: Sized {
    /// Record type the link expects
    const RECORD_TYPE: RecordType;

    /// Downcast a record to this type
    fn from_record(record: &Record) -> Option<&Self>;

    /// Downcast a record to this type, mutably
    fn from_record_mut(record: &mut Record) -> Option<&mut Self>;
}

/// Typed pointer to another record
///
/// Serializes as the bare XRef string.
#[derive(Serialize, Deserialize)]
#[serde(transparent, bound = "")]
pub struct Link<T: LinkTarget> {
    xref: XRef,
    #[serde(skip)]
    target: PhantomData<fn() -> T>,
}

impl<T: LinkTarget> Link<T> {
    /// Create a link to the given identifier
    pub fn new(xref: impl Into<XRef>) -> Self {
        Self {
            xref: xref.into(),
            target: PhantomData,
        }
    }

    /// Identifier of the referenced record
    pub fn xref(&self) -> &XRef {
        &self.xref
    }

    /// Re-point the link
    pub fn set_xref(&mut self, xref: XRef) {
        self.xref = xref;
    }

    /// Whether the link refers to `xref`
    pub fn points_to(&self, xref: &XRef) -> bool {
        &self.xref == xref
    }
}

impl<T: LinkTarget> Clone for Link<T> {
    fn clone(&self) -> Self {
        Self::new(self.xref.clone())
    }
}

impl<T: LinkTarget> PartialEq for Link<T> {
    fn eq(&self, other: &Self) -> bool {
        self.xref == other.xref
    }
}

impl<T: LinkTarget> Eq for Link<T> {}

impl<T: LinkTarget> fmt::Debug for Link<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Link<{}>({})", T::RECORD_TYPE, self.xref)
    }
}

/// Link from an individual to the family in which they are a child
pub type ChildToFamilyLink = Link<Family>;
/// Link from an individual to a family in which they are a spouse
pub type SpouseToFamilyLink = Link<Family>;
/// Link from a family to one of its children
pub type ChildLink = Link<Individual>;
/// Link from a family to its husband or wife
pub type SpouseLink = Link<Individual>;

/// Kind of an event or attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Birth of an individual
    Birth,
    /// Baptism or christening
    Baptism,
    /// Death of an individual
    Death,
    /// Burial
    Burial,
    /// Marriage of a couple
    Marriage,
    /// Divorce of a couple
    Divorce,
    /// Place of residence
    Residence,
    /// Occupation attribute
    Occupation,
    /// Any other event type
    Other,
}

/// An event or attribute attached to an individual or family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event type
    pub kind: EventKind,
    /// Date value as recorded
    #[serde(default)]
    pub date: DateValue,
    /// Place name, if recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
}

impl Event {
    /// Create an event without date or place
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            date: DateValue::default(),
            place: None,
        }
    }

    /// Create an event with a date
    pub fn dated(kind: EventKind, date: impl Into<DateValue>) -> Self {
        Self {
            kind,
            date: date.into(),
            place: None,
        }
    }

    /// Set the place, builder style
    pub fn at(mut self, place: impl Into<String>) -> Self {
        self.place = Some(place.into());
        self
    }

    /// Whether a non-blank place is recorded
    pub fn has_place(&self) -> bool {
        self.place.as_deref().is_some_and(|p| !p.trim().is_empty())
    }
}

/// Records that carry an event list
pub trait RecordWithEvents {
    /// Identifier of the record
    fn xref(&self) -> &XRef;

    /// All events, in recorded order
    fn events(&self) -> &[Event];

    /// First event of the given kind
    fn find_event(&self, kind: EventKind) -> Option<&Event> {
        self.events().iter().find(|e| e.kind == kind)
    }
}

/// A personal name split into its searchable parts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalName {
    /// Given names
    #[serde(default)]
    pub given: String,
    /// Family name
    #[serde(default)]
    pub surname: String,
}

impl fmt::Display for PersonalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.given.is_empty(), self.surname.is_empty()) {
            (false, false) => write!(f, "{} {}", self.given, self.surname),
            (false, true) => f.write_str(&self.given),
            (true, false) => f.write_str(&self.surname),
            (true, true) => f.write_str("?"),
        }
    }
}

/// A person
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Individual {
    /// Record identifier
    #[serde(default)]
    pub xref: XRef,
    /// Recorded names, primary first
    #[serde(default)]
    pub names: Vec<PersonalName>,
    /// Recorded sex
    #[serde(default)]
    pub sex: Sex,
    /// Notable root ancestor; display only
    #[serde(default)]
    pub patriarch: bool,
    /// Events and attributes
    #[serde(default)]
    pub events: Vec<Event>,
    /// Families in which this person is a child
    #[serde(default)]
    pub child_to_family_links: Vec<ChildToFamilyLink>,
    /// Families in which this person is a spouse
    #[serde(default)]
    pub spouse_to_family_links: Vec<SpouseToFamilyLink>,
    /// Attached notes
    #[serde(default)]
    pub notes: Vec<Link<Note>>,
    /// Source citations
    #[serde(default)]
    pub source_citations: Vec<Link<Source>>,
    /// Multimedia links
    #[serde(default)]
    pub media_links: Vec<Link<Multimedia>>,
}

impl Individual {
    /// Create an individual with the given sex and a blank identifier
    pub fn new(sex: Sex) -> Self {
        Self {
            sex,
            ..Default::default()
        }
    }

    /// Create an individual with a fixed identifier
    pub fn with_xref(xref: impl Into<XRef>, sex: Sex) -> Self {
        Self {
            xref: xref.into(),
            sex,
            ..Default::default()
        }
    }

    /// Primary name for display
    pub fn display_name(&self) -> String {
        self.names
            .first()
            .map(|n| n.to_string())
            .unwrap_or_else(|| "?".to_string())
    }

    /// Position of the spouse link to `family`, if any
    pub fn index_of_spouse(&self, family: &XRef) -> Option<usize> {
        self.spouse_to_family_links.iter().position(|l| l.points_to(family))
    }

    /// The child-to-family link pointing at `family`, if any
    pub fn find_child_to_family_link(&self, family: &XRef) -> Option<&ChildToFamilyLink> {
        self.child_to_family_links.iter().find(|l| l.points_to(family))
    }

    /// Add a child-to-family link unless one already points at `family`
    ///
    /// Returns `true` when a link was added.
    pub fn add_child_to_family_link(&mut self, family: &XRef) -> bool {
        if self.find_child_to_family_link(family).is_some() {
            return false;
        }
        self.child_to_family_links.push(Link::new(family.clone()));
        true
    }

    /// Add a spouse-to-family link unless one already points at `family`
    pub fn add_spouse_to_family_link(&mut self, family: &XRef) -> bool {
        if self.index_of_spouse(family).is_some() {
            return false;
        }
        self.spouse_to_family_links.push(Link::new(family.clone()));
        true
    }

    /// Remove every child-to-family link pointing at `family`
    pub fn remove_child_to_family_links(&mut self, family: &XRef) -> usize {
        let before = self.child_to_family_links.len();
        self.child_to_family_links.retain(|l| !l.points_to(family));
        before - self.child_to_family_links.len()
    }

    /// Remove every spouse-to-family link pointing at `family`
    pub fn remove_spouse_to_family_links(&mut self, family: &XRef) -> usize {
        let before = self.spouse_to_family_links.len();
        self.spouse_to_family_links.retain(|l| !l.points_to(family));
        before - self.spouse_to_family_links.len()
    }
}

impl RecordWithEvents for Individual {
    fn xref(&self) -> &XRef {
        &self.xref
    }

    fn events(&self) -> &[Event] {
        &self.events
    }
}

/// A couple and their children
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Family {
    /// Record identifier
    #[serde(default)]
    pub xref: XRef,
    /// Husband slot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub husband: Option<SpouseLink>,
    /// Wife slot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wife: Option<SpouseLink>,
    /// Children, in recorded order
    #[serde(default)]
    pub children: Vec<ChildLink>,
    /// Family events (marriage, divorce, ...)
    #[serde(default)]
    pub events: Vec<Event>,
    /// Attached notes
    #[serde(default)]
    pub notes: Vec<Link<Note>>,
    /// Source citations
    #[serde(default)]
    pub source_citations: Vec<Link<Source>>,
    /// Multimedia links
    #[serde(default)]
    pub media_links: Vec<Link<Multimedia>>,
    /// User reference numbers
    #[serde(default)]
    pub user_references: Vec<String>,
}

impl Family {
    /// Create a family with a fixed identifier and no content
    pub fn with_xref(xref: impl Into<XRef>) -> Self {
        Self {
            xref: xref.into(),
            ..Default::default()
        }
    }

    /// Identifier in the husband slot
    pub fn husband_xref(&self) -> Option<&XRef> {
        self.husband.as_ref().map(Link::xref)
    }

    /// Identifier in the wife slot
    pub fn wife_xref(&self) -> Option<&XRef> {
        self.wife.as_ref().map(Link::xref)
    }

    /// Position of `individual` in the child list
    pub fn index_of_child(&self, individual: &XRef) -> Option<usize> {
        self.children.iter().position(|c| c.points_to(individual))
    }

    /// Whether `individual` is listed among the children
    pub fn has_child(&self, individual: &XRef) -> bool {
        self.index_of_child(individual).is_some()
    }

    /// Whether `individual` occupies the husband or wife slot
    pub fn has_spouse(&self, individual: &XRef) -> bool {
        self.husband_xref() == Some(individual) || self.wife_xref() == Some(individual)
    }

    /// Append a child link unless the child is already listed
    pub fn add_child(&mut self, individual: &XRef) -> bool {
        if self.has_child(individual) {
            return false;
        }
        self.children.push(Link::new(individual.clone()));
        true
    }

    /// Remove every child link to `individual`
    pub fn remove_child(&mut self, individual: &XRef) -> usize {
        let before = self.children.len();
        self.children.retain(|c| !c.points_to(individual));
        before - self.children.len()
    }

    /// Exchange the husband and wife slots
    pub fn swap_spouses(&mut self) {
        std::mem::swap(&mut self.husband, &mut self.wife);
    }

    /// Whether the record carries any attached content of its own
    ///
    /// Spouses are not considered here; whether they resolve depends on the graph.
    pub fn has_content(&self) -> bool {
        !self.notes.is_empty()
            || !self.source_citations.is_empty()
            || !self.media_links.is_empty()
            || !self.user_references.is_empty()
            || !self.events.is_empty()
            || !self.children.is_empty()
    }
}

impl RecordWithEvents for Family {
    fn xref(&self) -> &XRef {
        &self.xref
    }

    fn events(&self) -> &[Event] {
        &self.events
    }
}

/// Reference from a multimedia record to a stored file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
    /// Location of the file; `stg:` and `arc:` prefixes select the media
    /// storage directory or archive instead of an absolute path
    pub path: String,
    /// Declared media format, e.g. `jpg`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl FileReference {
    /// Create a reference without a declared format
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            format: None,
        }
    }
}

/// A multimedia object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Multimedia {
    /// Record identifier
    #[serde(default)]
    pub xref: XRef,
    /// Title
    #[serde(default)]
    pub title: String,
    /// Files making up the object, primary first
    #[serde(default)]
    pub file_references: Vec<FileReference>,
}

/// A source document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Record identifier
    #[serde(default)]
    pub xref: XRef,
    /// Title
    #[serde(default)]
    pub title: String,
}

/// A free-text note
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Record identifier
    #[serde(default)]
    pub xref: XRef,
    /// Note body
    #[serde(default)]
    pub text: String,
}

/// Closed sum of all record kinds a graph owns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Record {
    /// A person
    Individual(Individual),
    /// A family
    Family(Family),
    /// A multimedia object
    Multimedia(Multimedia),
    /// A source
    Source(Source),
    /// A note
    Note(Note),
}

impl Record {
    /// Identifier of the record
    pub fn xref(&self) -> &XRef {
        match self {
            Record::Individual(r) => &r.xref,
            Record::Family(r) => &r.xref,
            Record::Multimedia(r) => &r.xref,
            Record::Source(r) => &r.xref,
            Record::Note(r) => &r.xref,
        }
    }

    pub(crate) fn set_xref(&mut self, xref: XRef) {
        match self {
            Record::Individual(r) => r.xref = xref,
            Record::Family(r) => r.xref = xref,
            Record::Multimedia(r) => r.xref = xref,
            Record::Source(r) => r.xref = xref,
            Record::Note(r) => r.xref = xref,
        }
    }

    /// Type tag of the record
    pub fn record_type(&self) -> RecordType {
        match self {
            Record::Individual(_) => RecordType::Individual,
            Record::Family(_) => RecordType::Family,
            Record::Multimedia(_) => RecordType::Multimedia,
            Record::Source(_) => RecordType::Source,
            Record::Note(_) => RecordType::Note,
        }
    }

    /// Downcast to an individual
    pub fn as_individual(&self) -> Option<&Individual> {
        Individual::from_record(self)
    }

    /// Downcast to a family
    pub fn as_family(&self) -> Option<&Family> {
        Family::from_record(self)
    }
}

macro_rules! impl_link_target {
    ($ty:ident, $variant:ident) => {
        impl LinkTarget for $ty {
            const RECORD_TYPE: RecordType = RecordType::$variant;

            fn from_record(record: &Record) -> Option<&Self> {
                match record {
                    Record::$variant(r) => Some(r),
                    _ => None,
                }
            }

            fn from_record_mut(record: &mut Record) -> Option<&mut Self> {
                match record {
                    Record::$variant(r) => Some(r),
                    _ => None,
                }
            }
        }

        impl From<$ty> for Record {
            fn from(value: $ty) -> Self {
                Record::$variant(value)
            }
        }
    };
}

impl_link_target!(Individual, Individual);
impl_link_target!(Family, Family);
impl_link_target!(Multimedia, Multimedia);
impl_link_target!(Source, Source);
impl_link_target!(Note, Note);
