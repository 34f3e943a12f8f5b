//! Integration tests for gedcheck
//!
//! Covers the full scan, repair and re-scan cycle on hand-built trees and on
//! seeded synthetic generations.

use ::gedcheck::*;
use gedcheck::date::DateValue;
use gedcheck::progress::NoProgress;
use gedcheck::record::{Event, EventKind, Family, Individual, Link};
use gedcheck::repair::DeclineInteraction;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

/// Builds trees with mirrored links, one call per relationship
pub struct TreeFixture {
    pub graph: RecordGraph,
}

impl Default for TreeFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeFixture {
    pub fn new() -> Self {
        Self {
            graph: RecordGraph::new(),
        }
    }

    /// Add a person with an optional birth year; identifiers are allocated
    pub fn person(&mut self, sex: Sex, birth_year: Option<i32>) -> XRef {
        let mut ind = Individual::new(sex);
        if let Some(year) = birth_year {
            ind.events.push(Event::dated(EventKind::Birth, DateValue::new(year.to_string())));
        }
        self.graph.add(ind).unwrap()
    }

    /// Add a person who lived `years` years
    pub fn deceased(&mut self, sex: Sex, birth_year: i32, years: i32) -> XRef {
        let xref = self.person(sex, Some(birth_year));
        self.individual_mut(&xref).events.push(Event::dated(
            EventKind::Death,
            DateValue::new((birth_year + years).to_string()),
        ));
        xref
    }

    /// Add a family with both spouse slots filled and linked back
    pub fn couple(&mut self, husband: &XRef, wife: &XRef) -> XRef {
        let fam = Family {
            husband: Some(Link::new(husband.clone())),
            wife: Some(Link::new(wife.clone())),
            ..Default::default()
        };
        let family = self.graph.add(fam).unwrap();
        self.individual_mut(husband).add_spouse_to_family_link(&family);
        self.individual_mut(wife).add_spouse_to_family_link(&family);
        family
    }

    /// Make `child` a child of `family`, on both sides
    pub fn child(&mut self, family: &XRef, child: &XRef) {
        self.graph
            .get_as_mut::<Family>(family)
            .unwrap()
            .add_child(child);
        self.individual_mut(child).add_child_to_family_link(family);
    }

    pub fn individual_mut(&mut self, xref: &XRef) -> &mut Individual {
        self.graph.get_as_mut::<Individual>(xref).unwrap()
    }

    pub fn family_mut(&mut self, xref: &XRef) -> &mut Family {
        self.graph.get_as_mut::<Family>(xref).unwrap()
    }

    pub fn build(self) -> RecordGraph {
        self.graph
    }
}

/// Seeded generator of consistent multi-generation trees
///
/// Every person has a birth and a death event, every child marries an
/// in-law, and each couple has one to four children born 25 years after
/// their parents' generation. Trees built this way scan clean.
pub struct GenerationGenerator {
    rng: StdRng,
}

impl GenerationGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn generate(&mut self, founders: usize, generations: usize) -> RecordGraph {
        let mut tree = TreeFixture::new();
        let mut couples: Vec<XRef> = (0..founders)
            .map(|_| {
                let husband = tree.deceased(Sex::Male, 1700, 70);
                let wife = tree.deceased(Sex::Female, 1702, 70);
                tree.couple(&husband, &wife)
            })
            .collect();

        for generation in 1..generations {
            let year = 1700 + 25 * generation as i32;
            let mut next = Vec::new();
            for family in &couples {
                for i in 0..self.rng.random_range(1..=4) {
                    let sex = if self.rng.random_bool(0.5) { Sex::Male } else { Sex::Female };
                    let child = tree.deceased(sex, year + i, 70);
                    tree.child(family, &child);

                    let in_law_sex = if sex == Sex::Male { Sex::Female } else { Sex::Male };
                    let in_law = tree.deceased(in_law_sex, year + 1, 70);
                    let (husband, wife) = if sex == Sex::Male { (child, in_law) } else { (in_law, child) };
                    next.push(tree.couple(&husband, &wife));
                }
            }
            couples = next;
        }

        info!("Generated {} records over {} generations", tree.graph.len(), generations);
        tree.build()
    }
}

pub fn inspector(reference_year: i32) -> TreeInspector {
    TreeInspector::builder().reference_year(reference_year).build().unwrap()
}

pub fn problems_of(report: &InspectionReport, diagnosis: Diagnosis) -> Vec<&Problem> {
    report.problems.iter().filter(|p| p.diagnosis == diagnosis).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn test_synthetic_tree_scans_clean() {
        let graph = GenerationGenerator::new(42).generate(3, 4);
        let report = inspector(1900).scan(&graph, &mut NoProgress);
        assert!(report.is_clean(), "unexpected: {:#?}", report.problems);
        assert_eq!(report.records_checked, graph.len());
    }

    #[test]
    fn test_every_one_sided_child_link_reported_once() {
        let mut tree = TreeFixture::new();
        let mut expected = Vec::new();
        for _ in 0..3 {
            let husband = tree.person(Sex::Male, Some(1800));
            let wife = tree.person(Sex::Female, Some(1802));
            let family = tree.couple(&husband, &wife);

            let orphan = tree.person(Sex::Female, Some(1830));
            tree.individual_mut(&orphan)
                .child_to_family_links
                .push(Link::new(family.clone()));
            expected.push((orphan, family));
        }
        let graph = tree.build();

        let report = inspector(1850).scan(&graph, &mut NoProgress);
        let half = problems_of(&report, Diagnosis::HalfChildLink);
        assert_eq!(half.len(), expected.len());
        for (orphan, family) in &expected {
            let matching: Vec<_> = half
                .iter()
                .filter(|p| &p.subject == orphan && p.target.as_ref() == Some(family))
                .collect();
            assert_eq!(matching.len(), 1, "{} -> {}", orphan, family);
            assert_eq!(matching[0].resolution, Resolution::Repair);
        }
    }

    #[test]
    fn test_half_link_repairs_close_the_loop() {
        let mut tree = TreeFixture::new();
        let husband = tree.person(Sex::Male, Some(1800));
        let wife = tree.person(Sex::Female, Some(1802));
        let family = tree.couple(&husband, &wife);
        let child = tree.person(Sex::Male, Some(1830));
        tree.individual_mut(&child)
            .child_to_family_links
            .push(Link::new(family.clone()));
        let second_wife = tree.person(Sex::Female, Some(1805));
        let second = tree.graph.add(Family::default()).unwrap();
        tree.family_mut(&second).husband = Some(Link::new(husband.clone()));
        tree.individual_mut(&husband).add_spouse_to_family_link(&second);
        tree.individual_mut(&second_wife)
            .spouse_to_family_links
            .push(Link::new(second.clone()));
        let mut graph = tree.build();

        let inspector = inspector(1850);
        let report = inspector.scan(&graph, &mut NoProgress);
        for diagnosis in [Diagnosis::HalfChildLink, Diagnosis::HalfSpouseLink] {
            let found = problems_of(&report, diagnosis);
            assert_eq!(found.len(), 1, "{}", diagnosis);
            let outcome = repair(&mut graph, found[0], &mut DeclineInteraction).unwrap();
            assert!(matches!(outcome, RepairOutcome::Repaired(_)));
        }

        let after = inspector.scan(&graph, &mut NoProgress);
        assert_eq!(after.count(Diagnosis::HalfChildLink), 0);
        assert_eq!(after.count(Diagnosis::HalfSpouseLink), 0);
        assert!(graph.family(&family).unwrap().has_child(&child));
        assert_eq!(graph.family(&second).unwrap().wife_xref(), Some(&second_wife));
    }

    #[test]
    #[traced_test]
    fn test_rescan_yields_identical_problems() {
        let mut graph = GenerationGenerator::new(7).generate(2, 4);
        // Damage: drop every fifth family's first child link on the family side
        let families: Vec<XRef> = graph.families().map(|f| f.xref.clone()).collect();
        for xref in families.iter().step_by(5) {
            if let Some(fam) = graph.get_as_mut::<Family>(xref) {
                if !fam.children.is_empty() {
                    fam.children.remove(0);
                }
                fam.swap_spouses();
            }
        }

        let inspector = inspector(1900);
        let first = inspector.scan(&graph, &mut NoProgress).into_problems();
        let second = inspector.scan(&graph, &mut NoProgress).into_problems();
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_three_generation_loop_is_detected() {
        // A fathers B via F2, B fathers A via F1
        let mut tree = TreeFixture::new();
        let a = tree.person(Sex::Male, None);
        let b = tree.person(Sex::Male, None);
        let a_wife = tree.person(Sex::Female, None);
        let b_wife = tree.person(Sex::Female, None);
        let f2 = tree.couple(&a, &a_wife);
        tree.child(&f2, &b);
        let f1 = tree.couple(&b, &b_wife);
        tree.child(&f1, &a);
        let graph = tree.build();

        let path = detect_cycle(&graph, graph.individual(&a).unwrap()).expect("loop through A");
        assert_eq!(path.root(), Some(&a));
        assert_eq!(path.repeated(), Some(&a));
        assert!(path.chain.contains(&b));

        let report = TreeInspector::default().scan(&graph, &mut NoProgress);
        assert!(report.count(Diagnosis::DataLoop) >= 1);
    }

    #[test]
    fn test_acyclic_chain_has_no_loop() {
        let mut tree = TreeFixture::new();
        let a = tree.person(Sex::Male, None);
        let b = tree.person(Sex::Male, None);
        let c = tree.person(Sex::Male, None);
        let wife_a = tree.person(Sex::Female, None);
        let wife_b = tree.person(Sex::Female, None);
        let fa = tree.couple(&a, &wife_a);
        tree.child(&fa, &b);
        let fb = tree.couple(&b, &wife_b);
        tree.child(&fb, &c);
        let graph = tree.build();

        for xref in [&a, &b, &c] {
            assert_eq!(detect_cycle(&graph, graph.individual(xref).unwrap()), None);
        }
        let report = TreeInspector::default().scan(&graph, &mut NoProgress);
        assert_eq!(report.count(Diagnosis::DataLoop), 0);
    }

    #[test]
    fn test_garbled_swap_is_self_inverse_and_settles() {
        let mut tree = TreeFixture::new();
        let wife = tree.person(Sex::Female, Some(1800));
        let husband = tree.person(Sex::Male, Some(1800));
        // Slots deliberately reversed
        let family = tree.couple(&wife, &husband);
        let mut graph = tree.build();
        let original = graph.family(&family).unwrap().clone();

        let mut twice = original.clone();
        twice.swap_spouses();
        twice.swap_spouses();
        assert_eq!(twice, original);

        let inspector = inspector(1850);
        let report = inspector.scan(&graph, &mut NoProgress);
        let garbled = problems_of(&report, Diagnosis::GarbledSpouses)[0].clone();

        repair(&mut graph, &garbled, &mut DeclineInteraction).unwrap();
        let fixed = graph.family(&family).unwrap().clone();
        assert_eq!(fixed.husband_xref(), Some(&husband));
        assert_eq!(fixed.wife_xref(), Some(&wife));

        // Replaying the stale problem must not garble the family again
        repair(&mut graph, &garbled, &mut DeclineInteraction).unwrap();
        assert_eq!(graph.family(&family).unwrap(), &fixed);
        assert!(inspector.scan(&graph, &mut NoProgress).is_clean());
    }

    #[test]
    fn test_sexless_wife_is_not_garbled() {
        let mut tree = TreeFixture::new();
        let husband = tree.person(Sex::Male, Some(1800));
        let wife = tree.person(Sex::None, Some(1802));
        let family = tree.couple(&husband, &wife);
        let mut graph = tree.build();

        let inspector = inspector(1850);
        let report = inspector.scan(&graph, &mut NoProgress);
        assert_eq!(report.count(Diagnosis::GarbledSpouses), 0);
        assert_eq!(problems_of(&report, Diagnosis::PersonSexless).len(), 1);

        let batch = repair_all(&mut graph, &report.problems, &mut DeclineInteraction);
        assert_eq!(batch.deferred, vec![Deferral::AskSex(wife.clone())]);
        let fam = graph.family(&family).unwrap();
        assert_eq!(fam.husband_xref(), Some(&husband));
        assert_eq!(fam.wife_xref(), Some(&wife));
        assert_eq!(inspector.scan(&graph, &mut NoProgress).count(Diagnosis::GarbledSpouses), 0);
    }

    #[test]
    fn test_empty_family_removal_is_terminal() {
        let mut tree = TreeFixture::new();
        let husband = tree.person(Sex::Male, Some(1800));
        let wife = tree.person(Sex::Female, Some(1800));
        tree.couple(&husband, &wife);
        let empty = tree.graph.add(Family::default()).unwrap();
        let mut graph = tree.build();

        let inspector = inspector(1850);
        let report = inspector.scan(&graph, &mut NoProgress);
        let found = problems_of(&report, Diagnosis::EmptyFamily);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].subject, empty);
        assert_eq!(found[0].resolution, Resolution::Remove);

        repair(&mut graph, found[0], &mut DeclineInteraction).unwrap();
        assert!(!graph.contains(&empty));
        for _ in 0..2 {
            let again = inspector.scan(&graph, &mut NoProgress);
            assert!(again.by_subject(&empty).next().is_none());
            assert!(again.is_clean(), "{:?}", again.problems);
        }
    }

    #[test]
    #[traced_test]
    fn test_longevity_scenario() {
        let mut graph = RecordGraph::new();
        let mut person = Individual::with_xref("I1", Sex::Male);
        person.events.push(Event::dated(EventKind::Birth, "1850"));
        graph.add(person).unwrap();

        let inspector = inspector(1980);
        let report = inspector.scan(&graph, &mut NoProgress);
        assert_eq!(report.problems.len(), 1, "{:?}", report.problems);
        let problem = &report.problems[0];
        assert_eq!(problem.subject, XRef::new("I1"));
        assert_eq!(problem.diagnosis, Diagnosis::PersonLonglived);
        assert_eq!(problem.resolution, Resolution::SetDeceased);
        assert!(problem.detail.contains("130"));

        repair(&mut graph, problem, &mut DeclineInteraction).unwrap();
        let person = graph.individual(&XRef::new("I1")).unwrap();
        assert!(person.events.iter().any(|e| e.kind == EventKind::Death));
        assert_eq!(inspector.scan(&graph, &mut NoProgress).count(Diagnosis::PersonLonglived), 0);
    }

    #[test]
    fn test_duplicate_children_scenario() {
        let mut tree = TreeFixture::new();
        let husband = tree.person(Sex::Male, Some(1800));
        let wife = tree.person(Sex::Female, Some(1802));
        let family = tree.couple(&husband, &wife);
        let child = tree.person(Sex::Male, Some(1830));
        tree.child(&family, &child);
        tree.family_mut(&family).children.push(Link::new(child.clone()));
        let mut graph = tree.build();

        let report = inspector(1850).scan(&graph, &mut NoProgress);
        let duplicates = problems_of(&report, Diagnosis::DuplicateChildren);
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].subject, family);
        assert_eq!(duplicates[0].resolution, Resolution::Edit);
        assert_eq!(report.problems.len(), 1, "{:?}", report.problems);

        let outcome = repair(&mut graph, duplicates[0], &mut DeclineInteraction).unwrap();
        assert_eq!(outcome, RepairOutcome::Deferred(Deferral::OpenEditor(family.clone())));
        assert_eq!(graph.family(&family).unwrap().children.len(), 2);
    }

    #[test]
    fn test_half_spouse_link_scenario() {
        let mut graph = RecordGraph::new();
        let mut person = Individual::with_xref("I2", Sex::Male);
        person.spouse_to_family_links.push(Link::new("F2"));
        graph.add(person).unwrap();
        let mut fam = Family::with_xref("F2");
        fam.events.push(Event::new(EventKind::Marriage));
        graph.add(fam).unwrap();

        let inspector = inspector(1850);
        let report = inspector.scan(&graph, &mut NoProgress);
        let half = problems_of(&report, Diagnosis::HalfSpouseLink);
        assert_eq!(half.len(), 1);
        assert_eq!(half[0].subject, XRef::new("I2"));
        assert_eq!(half[0].target, Some(XRef::new("F2")));

        repair(&mut graph, half[0], &mut DeclineInteraction).unwrap();
        assert_eq!(
            graph.family(&XRef::new("F2")).unwrap().husband_xref(),
            Some(&XRef::new("I2"))
        );
        assert_eq!(inspector.scan(&graph, &mut NoProgress).count(Diagnosis::HalfSpouseLink), 0);
    }

    #[test]
    fn test_half_spouse_link_with_garbled_family() {
        let mut tree = TreeFixture::new();
        let husband = tree.person(Sex::Male, Some(1800));
        let wife = tree.person(Sex::Female, Some(1802));
        let family = tree.couple(&husband, &wife);
        // Wife moved to the husband slot, husband dropped from the family
        {
            let fam = tree.family_mut(&family);
            fam.husband = Some(Link::new(wife.clone()));
            fam.wife = None;
        }
        let mut graph = tree.build();

        let inspector = inspector(1850);
        let report = inspector.scan(&graph, &mut NoProgress);
        assert_eq!(report.count(Diagnosis::GarbledSpouses), 1);
        let half = problems_of(&report, Diagnosis::HalfSpouseLink);
        assert_eq!(half.len(), 1);
        assert_eq!(half[0].subject, husband);

        repair(&mut graph, half[0], &mut DeclineInteraction).unwrap();
        let fam = graph.family(&family).unwrap();
        assert_eq!(fam.husband_xref(), Some(&husband));
        assert_eq!(fam.wife_xref(), Some(&wife));

        // The garbled problem from the same scan is now a no-op
        let batch = repair_all(&mut graph, &report.problems, &mut DeclineInteraction);
        assert!(batch.failed.is_empty(), "{:?}", batch.failed);
        assert!(inspector.scan(&graph, &mut NoProgress).is_clean());
    }

    #[test]
    fn test_link_to_record_of_wrong_type() {
        let mut tree = TreeFixture::new();
        let husband = tree.person(Sex::Male, Some(1800));
        let wife = tree.person(Sex::Female, Some(1802));
        let family = tree.couple(&husband, &wife);
        let child = tree.person(Sex::Female, Some(1830));
        tree.child(&family, &child);
        // A parents-family link that names the mother instead of a family
        tree.individual_mut(&child)
            .child_to_family_links
            .push(Link::new(wife.clone()));
        let mut graph = tree.build();

        let inspector = inspector(1850);
        let report = inspector.scan(&graph, &mut NoProgress);
        let dangling = problems_of(&report, Diagnosis::DanglingLink);
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].target, Some(wife.clone()));
        assert!(!dangling[0].detail.contains("missing"), "{}", dangling[0].detail);

        repair(&mut graph, dangling[0], &mut DeclineInteraction).unwrap();
        let child = graph.individual(&child).unwrap();
        assert_eq!(child.child_to_family_links.len(), 1);
        assert!(graph.contains(&wife));
        assert!(inspector.scan(&graph, &mut NoProgress).is_clean());
    }

    #[test]
    fn test_snapshot_round_trip_preserves_findings() {
        let mut tree = TreeFixture::new();
        let husband = tree.person(Sex::Male, Some(1800));
        let wife = tree.person(Sex::Female, Some(1802));
        let family = tree.couple(&husband, &wife);
        let child = tree.person(Sex::None, Some(1830));
        tree.individual_mut(&child)
            .child_to_family_links
            .push(Link::new(family));
        let graph = tree.build();

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("tree.json");
        graph.save(&path).unwrap();
        let loaded = RecordGraph::load(&path).unwrap();

        let inspector = inspector(1850);
        assert_eq!(
            inspector.scan(&graph, &mut NoProgress).into_problems(),
            inspector.scan(&loaded, &mut NoProgress).into_problems()
        );
    }
}
