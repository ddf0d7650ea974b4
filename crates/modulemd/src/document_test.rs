// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use rstest::rstest;

use super::{Document, dump_documents, read_documents, read_documents_from_file};
use crate::fixtures::MINIMAL_V2;
use crate::{ErrorKind, ReadOptions};

static DEFAULTS: &str = r#"---
document: modulemd-defaults
version: 1
data:
  module: foo
  stream: "latest"
...
"#;

static PACKAGER: &str = r#"---
document: modulemd-packager
version: 3
data:
  name: bar
  stream: "1"
  summary: A packaged module
  description: A packaged module.
  configurations:
  - context: A
    platform: f32
  - context: B
    platform: f33
...
"#;

#[rstest]
fn test_read_documents_in_order() {
    let documents = read_documents(&format!("{DEFAULTS}{MINIMAL_V2}"), ReadOptions::default()).unwrap();
    assert_eq!(documents.len(), 2);
    assert!(matches!(documents[0], Document::Defaults(_)));
    assert!(matches!(documents[1], Document::Stream(_)));
    assert!(documents.iter().all(|d| d.module_name() == Some("foo")));
}

#[rstest]
fn test_packager_expands_to_streams() {
    let documents = read_documents(PACKAGER, ReadOptions::default()).unwrap();
    let contexts: Vec<_> = documents
        .iter()
        .filter_map(|d| match d {
            Document::Stream(s) => s.context(),
            _ => None,
        })
        .collect();
    assert_eq!(contexts, vec!["A", "B"]);
}

#[rstest]
fn test_first_bad_document_fails_the_read() {
    let broken = MINIMAL_V2.replace("  summary: An example module\n", "");
    let err = read_documents(&format!("{DEFAULTS}{broken}"), ReadOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[rstest]
fn test_dump_and_read_back() {
    let documents = read_documents(&format!("{MINIMAL_V2}{DEFAULTS}"), ReadOptions::default()).unwrap();
    let out = dump_documents(&documents).unwrap();
    assert!(out.starts_with(MINIMAL_V2), "{out}");

    let tmpdir = tempfile::tempdir().unwrap();
    let path = tmpdir.path().join("documents.yaml");
    std::fs::write(&path, &out).unwrap();
    let again = read_documents_from_file(&path, ReadOptions::default()).unwrap();
    assert_eq!(again, documents);
}

#[rstest]
fn test_missing_file() {
    let err = read_documents_from_file("/does/not/exist.yaml", ReadOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Open);
}
