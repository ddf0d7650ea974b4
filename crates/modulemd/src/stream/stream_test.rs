// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use rstest::rstest;

use super::{ModuleStream, ModuleStreamV1, ModuleStreamV2, ModuleStreamV3};
use crate::fixtures::{MINIMAL_V2, emit_documents};
use crate::{Dependencies, ErrorKind, ReadOptions};

static V1_STREAM: &str = r#"---
document: modulemd
version: 1
data:
  name: foo
  stream: stable
  version: 20180101
  summary: An example module
  description: A longer description.
  eol: 2028-06-30
  license:
    module: [MIT]
  dependencies:
    buildrequires:
      platform: f28
    requires:
      platform: f28
      bar: rolling
...
"#;

static V3_STREAM: &str = r#"---
document: modulemd
version: 3
data:
  name: foo
  stream: "latest"
  version: 3
  context: c0ffee43
  summary: An example module
  description: A longer description.
  license:
    module: [MIT]
  dependencies:
    platform: f32
    buildrequires:
      appframework: v1
    requires:
      appframework: v1
...
"#;

#[rstest]
fn test_minimal_v2_round_trip() {
    let stream = ModuleStream::read_string(MINIMAL_V2, ReadOptions::default(), None, None).unwrap();
    assert_eq!(stream.mdversion(), 2);
    assert_eq!(stream.nsvc_as_string().as_deref(), Some("foo:latest:1:c0ffee42"));
    let out = emit_documents(|emitter| stream.emit_yaml(emitter));
    assert_eq!(out, MINIMAL_V2);
}

#[rstest]
fn test_read_v1_dependencies_and_eol() {
    let stream = ModuleStream::read_string(V1_STREAM, ReadOptions::default(), None, None).unwrap();
    let ModuleStream::V1(v1) = &stream else {
        panic!("expected a v1 stream, got {stream:?}");
    };
    assert_eq!(v1.eol(), chrono::NaiveDate::from_ymd_opt(2028, 6, 30));
    assert!(stream.depends_on_stream("bar", "rolling"));
    assert!(stream.build_depends_on_stream("platform", "f28"));
    assert!(!stream.build_depends_on_stream("bar", "rolling"));
}

#[rstest]
fn test_read_v3_platform_dependency() {
    let stream = ModuleStream::read_string(V3_STREAM, ReadOptions::default(), None, None).unwrap();
    assert_eq!(stream.mdversion(), 3);
    assert!(stream.depends_on_stream("platform", "f32"));
    assert!(stream.build_depends_on_stream("appframework", "v1"));
    assert!(!stream.depends_on_stream("appframework", "v2"));
}

#[rstest]
fn test_read_string_overrides_names() {
    let stream =
        ModuleStream::read_string(MINIMAL_V2, ReadOptions::default(), Some("bar"), Some("next")).unwrap();
    assert_eq!(stream.module_name(), Some("bar"));
    assert_eq!(stream.stream_name(), Some("next"));
}

#[rstest]
fn test_autogen_names_are_not_emitted() {
    let yaml = MINIMAL_V2
        .replace("  name: foo\n", "")
        .replace("  stream: \"latest\"\n", "");
    let options = ReadOptions::default().with_autogen_module_name(true);
    let stream = ModuleStream::read_string(&yaml, options, None, None).unwrap();
    assert!(stream.common().is_autogen_module_name());
    assert!(stream.module_name().is_some());
    let out = emit_documents(|emitter| stream.emit_yaml(emitter));
    assert!(!out.contains("name:"), "{out}");
    assert!(!out.contains("stream:"), "{out}");
}

#[rstest]
#[case::two_documents(&format!("{MINIMAL_V2}{MINIMAL_V2}"), ErrorKind::Validation)]
#[case::wrong_document("---\ndocument: modulemd-defaults\nversion: 1\ndata:\n  module: foo\n...\n", ErrorKind::Validation)]
#[case::missing_summary(&MINIMAL_V2.replace("  summary: An example module\n", ""), ErrorKind::Validation)]
#[case::unknown_version(&MINIMAL_V2.replace("version: 2\n", "version: 9\n"), ErrorKind::UnknownVersion)]
fn test_read_string_errors(#[case] yaml: &str, #[case] expected: ErrorKind) {
    let err = ModuleStream::read_string(yaml, ReadOptions::default(), None, None).unwrap_err();
    assert_eq!(err.kind(), expected, "{err}");
}

#[rstest]
fn test_strict_rejects_unknown_keys() {
    let yaml = MINIMAL_V2.replace("  version: 1\n", "  version: 1\n  flavor: spicy\n");
    ModuleStream::read_string(&yaml, ReadOptions::default(), None, None)
        .expect("unknown keys are skipped when not strict");
    let err = ModuleStream::read_string(&yaml, ReadOptions::strict(), None, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownAttribute);
}

#[rstest]
#[case(1, true)]
#[case(2, true)]
#[case(3, true)]
#[case(0, true)]
#[case(4, false)]
fn test_new_by_mdversion(#[case] mdversion: u64, #[case] ok: bool) {
    assert_eq!(ModuleStream::new(mdversion, Some("foo"), Some("bar")).is_ok(), ok);
}

#[rstest]
fn test_v2_depends_on_any_alternative() {
    let mut stream = ModuleStreamV2::new(Some("foo"), Some("bar"));
    let mut first = Dependencies::default();
    first.add_runtime_stream("platform", "f28").unwrap();
    let mut second = Dependencies::default();
    second.add_runtime_stream("platform", "f29").unwrap();
    stream.add_dependencies(first);
    stream.add_dependencies(second);
    let stream = ModuleStream::from(stream);
    assert!(stream.depends_on_stream("platform", "f28"));
    assert!(stream.depends_on_stream("platform", "f29"));
    assert!(!stream.depends_on_stream("platform", "f30"));
}

#[rstest]
fn test_mdversion_per_variant() {
    assert_eq!(ModuleStream::from(ModuleStreamV1::default()).mdversion(), 1);
    assert_eq!(ModuleStream::from(ModuleStreamV2::default()).mdversion(), 2);
    assert_eq!(ModuleStream::from(ModuleStreamV3::default()).mdversion(), 3);
}

static RICH_V1: &str = r#"---
document: modulemd
version: 1
data:
  name: foo
  stream: stable
  version: 20180101
  context: c0ffee41
  arch: x86_64
  summary: An example module
  description: >-
    A module for the demonstration of the metadata format.
  servicelevels:
    bug_fixes:
      eol: 2026-10-01
    rawhide: {}
  license:
    module: [MIT]
    content: [Beerware, GPLv2+]
  xmd:
    some_key: some_data
    nested:
      list: [a, b]
  dependencies:
    buildrequires:
      platform: f28
    requires:
      platform: f28
  references:
    community: http://www.example.com/
    tracker: http://www.example.com/bugs
  profiles:
    default:
      description: The default profile
      rpms: [bar, baz]
  api:
    rpms: [bar]
  filter:
    rpms: [baz-nonfoo]
  buildopts:
    rpms:
      macros: |
        %demomacro 1
        %demomacro2 %{demomacro}23
  components:
    rpms:
      bar:
        rationale: We need this to demonstrate stuff.
        repository: https://pagure.io/bar.git
        ref: 26ca0c0
        buildorder: 10
        arches: [i686, x86_64]
        multilib: [x86_64]
  artifacts:
    rpms: [bar-0:1.23-1.module_deadbeef.x86_64]
...
"#;

static RICH_V2: &str = r#"---
document: modulemd
version: 2
data:
  name: foo
  stream: "latest"
  version: 20180102
  context: c0ffee42
  static_context: true
  summary: An example module
  description: A longer description.
  servicelevels:
    security_fixes:
      eol: 2030-06-30
  license:
    module: [MIT]
  xmd:
    build: {owner: someone, attempts: 3}
  dependencies:
  - buildrequires:
      platform: [-f27, -f28]
      extras: []
    requires:
      platform: [-f27, -f28]
  - buildrequires:
      platform: [f29]
    requires:
      platform: [f29]
  profiles:
    minimal:
      description: Minimal profile that installs only the foo package.
      rpms: [foo]
    default:
      rpms: [bar, foo]
  buildopts:
    rpms:
      macros: |
        %demomacro 1
      whitelist: [fooscl-1-bar]
    arches: [i686, x86_64]
  components:
    rpms:
      bar:
        rationale: We need this to demonstrate stuff.
        name: bar-real
        buildroot: true
        srpm-buildroot: true
        buildorder: 100
        arches: [x86_64]
      baz:
        rationale: Demonstrate updating the buildroot contents.
        buildorder: -1
    modules:
      includedmodule:
        rationale: Included in the stack, just because.
        repository: https://pagure.io/includedmodule.git
        ref: somecoolbranchname
        buildorder: 100
  artifacts:
    rpms: [bar-0:1.23-1.module_deadbeef.x86_64]
    rpm-map:
      sha256:
        ee47083ed80146eb2c84e9a94d0836393912185dcda62b9d93ee0c2ea5dc795b:
          name: bar
          epoch: 0
          version: 1.23
          release: 1.module_deadbeef
          arch: x86_64
          nevra: bar-0:1.23-1.module_deadbeef.x86_64
...
"#;

static RICH_V3: &str = r#"---
document: modulemd
version: 3
data:
  name: foo
  stream: "latest"
  version: 20180103
  context: CTX1
  arch: x86_64
  summary: An example module
  description: A longer description.
  license:
    module: [MIT]
    content: [GPLv2+]
  xmd:
    some_key: some_data
  dependencies:
    platform: f33
    buildrequires:
      appframework: v1
    requires:
      appframework: v1
  references:
    documentation: http://www.example.com/docs
  profiles:
    container:
      rpms: [bar, bar-devel]
  api:
    rpms: [bar, bar-devel]
  filter:
    rpms: [bar-extras]
  buildopts:
    rpms:
      macros: |
        %demomacro 1
    arches: [x86_64]
  components:
    rpms:
      bar:
        rationale: We need this to demonstrate stuff.
        buildorder: 2
        arches: [x86_64]
  artifacts:
    rpm-map:
      sha256:
        ee47083ed80146eb2c84e9a94d0836393912185dcda62b9d93ee0c2ea5dc795b:
          name: bar
          epoch: 0
          version: 1.23
          release: 1.module_deadbeef
          arch: x86_64
...
"#;

#[rstest]
#[case::v1(RICH_V1, 1)]
#[case::v2(RICH_V2, 2)]
#[case::v3(RICH_V3, 3)]
fn test_rich_stream_round_trip(#[case] yaml: &str, #[case] mdversion: u64) {
    let stream = ModuleStream::read_string(yaml, ReadOptions::strict(), None, None).unwrap();
    assert_eq!(stream.mdversion(), mdversion);
    let common = stream.common();
    assert!(common.xmd.is_some());
    assert!(!common.profiles.is_empty());
    assert!(common.buildopts.as_ref().and_then(|b| b.rpm_macros.as_deref()).is_some());
    assert!(common.rpm_components["bar"].buildorder > 0);

    let first = emit_documents(|emitter| stream.emit_yaml(emitter));
    let again = ModuleStream::read_string(&first, ReadOptions::strict(), None, None).unwrap();
    assert_eq!(again, stream, "{first}");
    let second = emit_documents(|emitter| again.emit_yaml(emitter));
    assert_eq!(second, first);
}

#[rstest]
fn test_rich_stream_details() {
    let v1 = ModuleStream::read_string(RICH_V1, ReadOptions::default(), None, None).unwrap();
    let macros = v1.common().buildopts.as_ref().and_then(|b| b.rpm_macros.clone());
    assert_eq!(
        macros.as_deref(),
        Some("%demomacro 1\n%demomacro2 %{demomacro}23\n")
    );
    assert_eq!(v1.common().rpm_components["bar"].arches.len(), 2);

    let stream = ModuleStream::read_string(RICH_V2, ReadOptions::default(), None, None).unwrap();
    let ModuleStream::V2(v2) = stream else {
        panic!("expected a v2 stream");
    };
    assert!(v2.static_context);
    assert_eq!(v2.dependencies.len(), 2);
    assert_eq!(v2.servicelevels.len(), 1);
    assert!(v2.common.includes_nevra("bar-0:1.23-1.module_deadbeef.x86_64"));
    assert_eq!(v2.common.module_components["includedmodule"].buildorder, 100);
    let entry = &v2.rpm_artifact_map["sha256"]
        ["ee47083ed80146eb2c84e9a94d0836393912185dcda62b9d93ee0c2ea5dc795b"];
    assert_eq!(entry.nevra(), "bar-0:1.23-1.module_deadbeef.x86_64");
}
