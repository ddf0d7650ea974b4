// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

//! Helpers shared by the unit tests of this crate.

use crate::yaml::{CollectionStyle, Emitter, Event, YamlParser};

/// Position a parser on the value of the first key in a mapping document,
/// returning the parser and that key.
pub fn value_parser(yaml: &str) -> (YamlParser<'_>, String) {
    let mut parser = YamlParser::new(yaml);
    assert_eq!(parser.next_event().unwrap(), Event::StreamStart);
    assert_eq!(parser.next_event().unwrap(), Event::DocumentStart);
    assert_eq!(parser.next_event().unwrap(), Event::MappingStart);
    let key = parser.next_key().unwrap().expect("a key");
    (parser, key)
}

/// Emit a single document whose root is a block mapping filled by `build`.
pub fn emit_mapping(build: impl FnOnce(&mut Emitter) -> crate::Result<()>) -> String {
    let mut emitter = Emitter::new();
    emitter.start_stream().unwrap();
    emitter.start_document().unwrap();
    emitter.start_mapping(CollectionStyle::Block).unwrap();
    build(&mut emitter).unwrap();
    emitter.end_mapping().unwrap();
    emitter.end_document().unwrap();
    emitter.end_stream().unwrap();
    emitter.finish().unwrap()
}

/// Emit a stream of complete documents written by `build`.
pub fn emit_documents(build: impl FnOnce(&mut Emitter) -> crate::Result<()>) -> String {
    let mut emitter = Emitter::new();
    emitter.start_stream().unwrap();
    build(&mut emitter).unwrap();
    emitter.end_stream().unwrap();
    emitter.finish().unwrap()
}

/// Strip the `---`/`...` document markers from emitted text.
pub fn body(yaml: &str) -> &str {
    yaml.trim_start_matches("---\n").trim_end_matches("...\n")
}

/// A minimal, valid v2 stream document.
pub const MINIMAL_V2: &str = r#"---
document: modulemd
version: 2
data:
  name: foo
  stream: "latest"
  version: 1
  context: c0ffee42
  summary: An example module
  description: >-
    A module for the demonstration of the metadata format.
  license:
    module:
    - MIT
...
"#;
