// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use rstest::rstest;

use super::{DocumentType, read_subdocuments};
use crate::ErrorKind;
use crate::fixtures::MINIMAL_V2;

#[rstest]
fn test_read_single_document() {
    let docs = read_subdocuments(MINIMAL_V2).unwrap();
    assert_eq!(docs.len(), 1);
    let doc = &docs[0];
    assert!(doc.error().is_none());
    assert_eq!(doc.doctype(), Some(DocumentType::Modulemd));
    assert_eq!(doc.mdversion(), 2);
    let mut parser = doc.data_parser().unwrap();
    parser.expect_mapping_start("data").unwrap();
    assert_eq!(parser.next_key().unwrap().as_deref(), Some("name"));
}

#[rstest]
fn test_version_before_document() {
    let yaml = "---\nversion: 1\ndata: {module: foo}\ndocument: modulemd-defaults\n...\n";
    let docs = read_subdocuments(yaml).unwrap();
    assert_eq!(docs[0].doctype(), Some(DocumentType::Defaults));
    assert_eq!(docs[0].mdversion(), 1);
}

#[rstest]
#[case::missing_data("document: modulemd\nversion: 2\n", ErrorKind::MissingRequired, "Missing required key: data")]
#[case::missing_version("document: modulemd\ndata: {}\n", ErrorKind::MissingRequired, "Missing required key: version")]
#[case::missing_document("version: 2\ndata: {}\n", ErrorKind::MissingRequired, "Missing required key: document")]
#[case::unknown_type("document: modulemd-foo\nversion: 1\ndata: {}\n", ErrorKind::UnknownDocumentType, "Unknown document type")]
#[case::unknown_version("document: modulemd\nversion: 99\ndata: {}\n", ErrorKind::UnknownVersion, "document version: 99")]
#[case::zero_version("document: modulemd-defaults\nversion: 0\ndata: {}\n", ErrorKind::UnknownVersion, "document version: 0")]
#[case::signed_version("document: modulemd\nversion: +2\ndata: {}\n", ErrorKind::Parse, "not an unsigned integer")]
#[case::padded_version("document: modulemd\nversion: 2abc\ndata: {}\n", ErrorKind::Parse, "not an unsigned integer")]
#[case::unknown_key("document: modulemd\nextra: 1\nversion: 2\ndata: {}\n", ErrorKind::Parse, "Unexpected key")]
#[case::duplicate("document: modulemd\ndocument: modulemd\nversion: 2\ndata: {}\n", ErrorKind::Parse, "more than one")]
#[case::not_a_mapping("- document\n", ErrorKind::Parse, "Expected a mapping")]
fn test_bad_envelope(#[case] yaml: &str, #[case] kind: ErrorKind, #[case] message: &str) {
    let docs = read_subdocuments(yaml).unwrap();
    assert_eq!(docs.len(), 1);
    let err = docs[0].error().expect("an envelope error");
    assert_eq!(err.kind(), kind, "{err}");
    assert!(err.to_string().contains(message), "{err}");
    assert!(!docs[0].yaml().is_empty());
    assert_eq!(docs[0].doctype(), None);
}

#[rstest]
fn test_bad_document_does_not_stop_the_stream() {
    let yaml = format!("---\ndocument: nope\nversion: 1\ndata: {{}}\n...\n{MINIMAL_V2}");
    let docs = read_subdocuments(&yaml).unwrap();
    assert_eq!(docs.len(), 2);
    assert!(docs[0].error().is_some());
    assert!(docs[1].error().is_none());
}

#[rstest]
fn test_data_is_preserved() {
    let docs = read_subdocuments(MINIMAL_V2).unwrap();
    let yaml = docs[0].yaml();
    assert!(yaml.contains("stream: \"latest\""), "{yaml}");
    assert!(yaml.contains("version: 1\n"), "{yaml}");
    // re-reading the buffered text yields the same document
    let again = read_subdocuments(yaml).unwrap();
    assert_eq!(again[0].yaml(), yaml);
}

#[rstest]
fn test_not_yaml() {
    let err = read_subdocuments("foo: [bar\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unparseable);
}

#[rstest]
fn test_empty_stream() {
    assert!(read_subdocuments("").unwrap().is_empty());
}

#[rstest]
fn test_collection_key_fails_only_its_document() {
    let yaml = "---
document: modulemd-defaults
version: 1
data:
  module: foo
...
---
? [a]
: b
...
---
document: modulemd-defaults
version: 1
data:
  module: bar
...
";
    let docs = read_subdocuments(yaml).unwrap();
    assert_eq!(docs.len(), 3);
    assert!(docs[0].error().is_none());
    assert_eq!(docs[1].error().map(|e| e.kind()), Some(ErrorKind::Emit));
    assert!(docs[2].error().is_none());
    assert_eq!(docs[2].doctype(), Some(DocumentType::Defaults));
}
