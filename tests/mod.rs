//! Main test module for gedcheck
//!
//! This module includes all test suites:
//! - Integration tests for the scan, repair, re-scan cycle
//! - Chaos tests for randomly damaged trees
//! - Property-based tests for invariants
//! - Edge cases and concurrent access

pub mod integration;

#[cfg(test)]
mod edge_cases {
    use ::gedcheck::*;
    use gedcheck::media::FsMediaStore;
    use gedcheck::progress::{CallbackProgress, NoProgress, ProgressInfo};
    use gedcheck::record::{Event, EventKind, Family, FileReference, Individual, Link, Multimedia, PersonalName};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_empty_graph() {
        let graph = RecordGraph::new();
        let report = TreeInspector::default().scan(&graph, &mut NoProgress);
        assert!(report.is_clean());
        assert_eq!(report.records_checked, 0);
    }

    #[test]
    fn test_progress_sees_every_record() {
        let mut graph = RecordGraph::new();
        for _ in 0..25 {
            graph.add(Individual::new(Sex::Male)).unwrap();
        }

        let seen: Arc<Mutex<Vec<ProgressInfo>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut progress = CallbackProgress::new(Arc::new(move |info| sink.lock().push(info)));
        TreeInspector::default().scan(&graph, &mut progress);

        let seen = seen.lock();
        let last = seen.last().expect("progress reported");
        assert!(last.finished);
        assert_eq!(last.processed, 25);
        assert_eq!(last.total, 25);
    }

    #[test]
    fn test_unicode_names_in_record_names() {
        let mut husband = Individual::with_xref("I1", Sex::Male);
        husband.names.push(PersonalName {
            given: "Иван".to_string(),
            surname: "Петров".to_string(),
        });
        husband.spouse_to_family_links.push(Link::new("F1"));
        let wife = Individual::with_xref("I2", Sex::Female);
        let mut fam = Family::with_xref("F1");
        fam.husband = Some(Link::new("I1"));
        fam.wife = Some(Link::new("I2"));
        let graph = RecordGraph::from_records(vec![husband.into(), wife.into(), fam.into()]).unwrap();

        let report = TreeInspector::default().scan(&graph, &mut NoProgress);
        let half = report
            .problems
            .iter()
            .find(|p| p.diagnosis == Diagnosis::HalfFamilyWifeLink)
            .unwrap();
        assert_eq!(half.record_name(&graph), "Иван Петров - ? [ F1 ]");
    }

    #[test]
    fn test_undated_and_bc_dates_are_valid() {
        let mut person = Individual::with_xref("I1", Sex::Female);
        person.events.push(Event::new(EventKind::Birth));
        person.events.push(Event::dated(EventKind::Residence, "ABT 44 B.C."));
        person.events.push(Event::dated(EventKind::Occupation, "BET 1850 AND 1860"));
        let graph = RecordGraph::from_records(vec![person.into()]).unwrap();

        let report = TreeInspector::default().scan(&graph, &mut NoProgress);
        assert_eq!(report.count(Diagnosis::DateInvalid), 0, "{:?}", report.problems);
    }

    #[test]
    fn test_impossible_day_is_invalid() {
        let mut person = Individual::with_xref("I1", Sex::Male);
        person.events.push(Event::dated(EventKind::Birth, "29 FEB 1900"));
        let graph = RecordGraph::from_records(vec![person.into()]).unwrap();

        let report = TreeInspector::default().scan(&graph, &mut NoProgress);
        assert_eq!(report.count(Diagnosis::DateInvalid), 1);
    }

    #[test]
    fn test_self_parent_family() {
        // Husband listed as a child of his own family
        let mut husband = Individual::with_xref("I1", Sex::Male);
        husband.spouse_to_family_links.push(Link::new("F1"));
        husband.child_to_family_links.push(Link::new("F1"));
        let mut fam = Family::with_xref("F1");
        fam.husband = Some(Link::new("I1"));
        fam.children.push(Link::new("I1"));
        let mut graph = RecordGraph::from_records(vec![husband.into(), fam.into()]).unwrap();

        let inspector = TreeInspector::default();
        let report = inspector.scan(&graph, &mut NoProgress);
        assert_eq!(report.count(Diagnosis::FatherAsChild), 1);
        assert!(report.count(Diagnosis::DataLoop) >= 1);

        let batch = repair_all(&mut graph, &report.problems, &mut repair::DeclineInteraction);
        assert!(batch.failed.is_empty(), "{:?}", batch.failed);
        let after = inspector.scan(&graph, &mut NoProgress);
        assert_eq!(after.count(Diagnosis::FatherAsChild), 0);
        assert_eq!(after.count(Diagnosis::DataLoop), 0);
    }

    #[test]
    fn test_filesystem_media_end_to_end() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("family")).unwrap();
        std::fs::write(root.path().join("family").join("portrait.jpg"), b"jpeg").unwrap();

        let present = Multimedia {
            xref: XRef::new("O1"),
            title: "Portrait".to_string(),
            file_references: vec![FileReference::new("stg:portrait.jpg")],
        };
        let missing = Multimedia {
            xref: XRef::new("O2"),
            title: "Letter".to_string(),
            file_references: vec![FileReference::new("stg:letter.png")],
        };
        let mut graph = RecordGraph::from_records(vec![present.into(), missing.into()]).unwrap();

        let inspector = TreeInspector::builder()
            .media_store(FsMediaStore::new(root.path(), "family"))
            .build()
            .unwrap();
        let report = inspector.scan(&graph, &mut NoProgress);
        assert_eq!(report.problems.len(), 1, "{:?}", report.problems);
        assert_eq!(report.problems[0].diagnosis, Diagnosis::FileNotFound);
        assert_eq!(report.problems[0].subject, XRef::new("O2"));

        repair(&mut graph, &report.problems[0], &mut repair::DeclineInteraction).unwrap();
        assert!(!graph.contains(&XRef::new("O2")));
        assert!(inspector.scan(&graph, &mut NoProgress).is_clean());
    }

    #[test]
    fn test_user_interaction_decides_sex() {
        let mut graph = RecordGraph::from_records(vec![Individual::with_xref("I1", Sex::None).into()]).unwrap();
        let report = TreeInspector::default().scan(&graph, &mut NoProgress);
        let sexless = &report.problems[0];
        assert_eq!(sexless.diagnosis, Diagnosis::PersonSexless);

        let mut asked = 0;
        let mut choose = |_: &Individual| {
            asked += 1;
            Some(Sex::Female)
        };
        let outcome = repair(&mut graph, sexless, &mut choose).unwrap();
        assert!(matches!(outcome, RepairOutcome::Repaired(_)));
        assert_eq!(asked, 1);
        assert_eq!(graph.individual(&XRef::new("I1")).unwrap().sex, Sex::Female);
    }

    #[test]
    fn test_informational_problem_is_caller_error() {
        let mut person = Individual::with_xref("I1", Sex::Male);
        person.events.push(Event::dated(EventKind::Birth, "1900"));
        person.events.push(Event::dated(EventKind::Death, "1850"));
        let mut graph = RecordGraph::from_records(vec![person.into()]).unwrap();

        let report = TreeInspector::default().scan(&graph, &mut NoProgress);
        let invalid = report
            .problems
            .iter()
            .find(|p| p.diagnosis == Diagnosis::LiveYearsInvalid)
            .unwrap();
        let err = repair(&mut graph, invalid, &mut repair::DeclineInteraction).unwrap_err();
        assert!(err.is_caller_error());
    }
}

#[cfg(test)]
mod stress_tests {
    use ::gedcheck::*;
    use gedcheck::progress::NoProgress;
    use gedcheck::repair::DeclineInteraction;
    use std::sync::Arc;
    use std::thread;

    use crate::integration::GenerationGenerator;

    #[test]
    fn test_shared_graph_scans_while_repairing() {
        let mut graph = GenerationGenerator::new(11).generate(3, 4);
        // Break every family's back links so the writer has work to do
        let families: Vec<XRef> = graph.families().map(|f| f.xref.clone()).collect();
        for xref in &families {
            let spouses: Vec<XRef> = {
                let fam = graph.family(xref).unwrap();
                fam.husband_xref().into_iter().chain(fam.wife_xref()).cloned().collect()
            };
            for spouse in spouses {
                if let Some(ind) = graph.get_as_mut::<record::Individual>(&spouse) {
                    ind.remove_spouse_to_family_links(xref);
                }
            }
        }

        let shared = graph.into_shared();
        let inspector = Arc::new(TreeInspector::builder().reference_year(1900).build().unwrap());

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let shared = Arc::clone(&shared);
                let inspector = Arc::clone(&inspector);
                thread::spawn(move || {
                    let mut last = usize::MAX;
                    for _ in 0..10 {
                        let report = inspector.scan_shared(&shared, &mut NoProgress);
                        assert_eq!(report.records_checked, shared.read().len());
                        // Repairs only ever remove half links
                        let half = report.count(Diagnosis::HalfFamilyHusbandLink)
                            + report.count(Diagnosis::HalfFamilyWifeLink);
                        assert!(half <= last);
                        last = half;
                    }
                })
            })
            .collect();

        let writer = {
            let shared = Arc::clone(&shared);
            let inspector = Arc::clone(&inspector);
            thread::spawn(move || {
                let problems = inspector.scan_shared(&shared, &mut NoProgress).into_problems();
                for chunk in problems.chunks(4) {
                    let mut graph = shared.write();
                    repair_all(&mut graph, chunk, &mut DeclineInteraction);
                }
            })
        };

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }

        let report = inspector.scan_shared(&shared, &mut NoProgress);
        assert!(report.is_clean(), "{:?}", report.problems);
    }
}
