// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use rstest::rstest;

use super::{PRIORITIZER_PRIORITY_MAX, Prioritizer};
use crate::{Defaults, Document, ErrorKind, ModuleStream, ModuleStreamV2};

fn stream(version: u64, summary: &str) -> Document {
    let mut stream = ModuleStreamV2::new(Some("foo"), Some("stable"));
    stream.common.version = version;
    stream.common.context = Some("c0ffee42".into());
    stream.common.summary = Some(summary.into());
    stream.common.description = Some("A module.".into());
    stream.common.module_licenses.insert("MIT".into());
    ModuleStream::from(stream).into()
}

fn defaults(modified: u64, stream: &str) -> Document {
    let mut defaults = Defaults::new("foo");
    defaults.modified = modified;
    defaults.default_stream = Some(stream.into());
    defaults.into()
}

fn summaries(documents: &[Document]) -> Vec<String> {
    documents
        .iter()
        .filter_map(|d| match d {
            Document::Stream(s) => s.common().summary.clone(),
            _ => None,
        })
        .collect()
}

fn default_stream(documents: &[Document]) -> Option<String> {
    documents.iter().find_map(|d| match d {
        Document::Defaults(d) => d.default_stream.clone(),
        _ => None,
    })
}

#[rstest]
fn test_higher_priority_wins() {
    let mut prioritizer = Prioritizer::new();
    prioritizer
        .add(vec![stream(1, "low"), defaults(1, "low")], 0)
        .unwrap();
    prioritizer
        .add(vec![stream(1, "high"), defaults(1, "high")], 10)
        .unwrap();
    let resolved = prioritizer.resolve().unwrap();
    assert_eq!(summaries(&resolved), vec!["high"]);
    assert_eq!(default_stream(&resolved).as_deref(), Some("high"));
    assert_eq!(
        resolved.iter().filter(|d| matches!(d, Document::Defaults(_))).count(),
        1
    );
}

#[rstest]
fn test_same_priority_keeps_what_was_there_first() {
    let mut prioritizer = Prioritizer::new();
    prioritizer.add(vec![stream(1, "first")], 5).unwrap();
    prioritizer.add(vec![stream(1, "second")], 5).unwrap();
    let resolved = prioritizer.resolve().unwrap();
    assert_eq!(summaries(&resolved), vec!["first"]);
}

#[rstest]
fn test_same_priority_defaults_are_merged() {
    let mut prioritizer = Prioritizer::new();
    prioritizer.add(vec![defaults(1, "a")], 5).unwrap();
    prioritizer.add(vec![defaults(2, "b")], 5).unwrap();
    let resolved = prioritizer.resolve().unwrap();
    assert_eq!(default_stream(&resolved).as_deref(), Some("b"));
}

#[rstest]
fn test_only_latest_version_is_kept() {
    let mut prioritizer = Prioritizer::new();
    prioritizer.add(vec![stream(2, "newer")], 0).unwrap();
    prioritizer.add(vec![stream(1, "older")], 10).unwrap();
    let resolved = prioritizer.resolve().unwrap();
    assert_eq!(summaries(&resolved), vec!["newer"]);
}

#[rstest]
fn test_nothing_to_prioritize() {
    let err = Prioritizer::new().resolve().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NothingToPrioritize);
}

#[rstest]
#[case(-5)]
#[case(PRIORITIZER_PRIORITY_MAX + 1)]
fn test_priority_out_of_range(#[case] priority: i64) {
    let err = Prioritizer::new().add(vec![stream(1, "x")], priority).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PriorityOutOfRange);
}
