// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use rstest::rstest;

use super::PackagerV3;
use crate::fixtures::emit_documents;
use crate::{ErrorKind, ReadOptions};

static PACKAGER: &str = r#"---
document: modulemd-packager
version: 3
data:
  name: foo
  stream: "latest"
  summary: An example module
  description: >-
    A module for the demonstration of the metadata format.
  license:
  - MIT
  configurations:
  - context: CTX1
    platform: f32
    buildrequires:
      appframework: v1
    requires:
      appframework: v1
  - context: CTX2
    platform: f33
  profiles:
    client:
      rpms:
      - foo-client
      default: true
    server:
      rpms:
      - foo-server
...
"#;

#[rstest]
fn test_read_packager() {
    let packager = PackagerV3::read_string(PACKAGER, ReadOptions::strict()).unwrap();
    assert_eq!(packager.build_config_contexts().collect::<Vec<_>>(), vec!["CTX1", "CTX2"]);
    assert_eq!(packager.build_config("CTX2").unwrap().platform, "f33");
    assert!(packager.common.profiles["client"].is_default);
    assert!(packager.common.module_licenses.contains("MIT"));
}

#[rstest]
fn test_packager_round_trip() {
    let packager = PackagerV3::read_string(PACKAGER, ReadOptions::default()).unwrap();
    let out = emit_documents(|emitter| packager.emit_yaml(emitter));
    assert_eq!(out, PACKAGER);
}

#[rstest]
fn test_to_module_makes_one_stream_per_configuration() {
    let packager = PackagerV3::read_string(PACKAGER, ReadOptions::default()).unwrap();
    let module = packager.to_module().unwrap();
    assert_eq!(module.module_name(), "foo");
    assert_eq!(module.streams().len(), 2);
    for stream in module.streams() {
        assert_eq!(stream.mdversion(), 3);
        assert!(stream.common().profiles.values().all(|p| !p.is_default));
    }
    let ctx1 = module.get_stream_by_nsvc("latest", 0, Some("CTX1")).unwrap();
    assert!(ctx1.depends_on_stream("platform", "f32"));
    assert!(ctx1.build_depends_on_stream("appframework", "v1"));

    let defaults = module.defaults().expect("implied defaults");
    let profiles = defaults.default_profiles_for("latest", None).unwrap();
    assert_eq!(profiles.iter().collect::<Vec<_>>(), vec!["client"]);
}

#[rstest]
fn test_to_module_index() {
    let packager = PackagerV3::read_string(PACKAGER, ReadOptions::default()).unwrap();
    let index = packager.to_module_index().unwrap();
    assert_eq!(index.stream_mdversion(), 3);
    assert_eq!(index.search_streams_by_glob(Some("foo:latest:0:*")).len(), 2);
    assert!(index.get_module("foo").unwrap().defaults().is_some());
}

#[rstest]
fn test_unnamed_packager_gets_generated_names() {
    let yaml = PACKAGER
        .replace("  name: foo\n", "")
        .replace("  stream: \"latest\"\n", "");
    let packager = PackagerV3::read_string(&yaml, ReadOptions::default()).unwrap();
    assert!(packager.to_defaults().is_none());
    let module = packager.to_module().unwrap();
    assert!(module.streams().iter().all(|s| s.common().is_autogen_module_name()));
    assert!(module.defaults().is_none());
}

#[rstest]
#[case::context_at_top(PACKAGER.replace("  stream: \"latest\"\n", "  stream: \"latest\"\n  context: c0ffee42\n"))]
#[case::missing_platform(PACKAGER.replace("    platform: f33\n", ""))]
fn test_invalid_packager(#[case] yaml: String) {
    let err = PackagerV3::read_string(&yaml, ReadOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation, "{err}");
}

#[rstest]
fn test_duplicate_context() {
    let yaml = PACKAGER.replace("context: CTX2", "context: CTX1");
    let err = PackagerV3::read_string(&yaml, ReadOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[rstest]
fn test_no_configurations_to_convert() {
    let packager = PackagerV3::new(Some("foo"), Some("latest"));
    let err = packager.to_module().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}
