// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use rstest::rstest;

use super::{ModuleStream, ModuleStreamV1, ModuleStreamV2, expand_dependencies};
use crate::{Dependencies, ErrorKind};

fn v2_stream(dependencies: Vec<Dependencies>) -> ModuleStreamV2 {
    let mut stream = ModuleStreamV2::new(Some("foo"), Some("stable"));
    stream.common.version = 42;
    stream.common.summary = Some("An example module".into());
    stream.common.description = Some("A longer description.".into());
    stream.common.module_licenses.insert("MIT".into());
    for deps in dependencies {
        stream.add_dependencies(deps);
    }
    stream
}

fn deps(buildtime: &[(&str, &str)], runtime: &[(&str, &str)]) -> Dependencies {
    let mut deps = Dependencies::default();
    for (module, stream) in buildtime {
        deps.add_buildtime_stream(module, stream).unwrap();
    }
    for (module, stream) in runtime {
        deps.add_runtime_stream(module, stream).unwrap();
    }
    deps
}

#[rstest]
fn test_v1_to_v2_moves_dependencies() {
    let mut v1 = ModuleStreamV1::new(Some("foo"), Some("stable"));
    v1.common.summary = Some("An example module".into());
    v1.common.description = Some("A longer description.".into());
    v1.common.module_licenses.insert("MIT".into());
    v1.buildtime_deps.insert("platform".into(), "f28".into());
    v1.runtime_deps.insert("platform".into(), "f28".into());

    let upgraded = ModuleStream::from(v1).upgrade(2).unwrap();
    let ModuleStream::V2(v2) = &upgraded else {
        panic!("expected a v2 stream, got {upgraded:?}");
    };
    assert_eq!(v2.dependencies.len(), 1);
    assert!(upgraded.depends_on_stream("platform", "f28"));
    assert!(upgraded.build_depends_on_stream("platform", "f28"));
}

#[rstest]
fn test_v2_to_v3_single_keeps_context() {
    let mut stream = v2_stream(vec![deps(&[("platform", "f28")], &[("platform", "f28")])]);
    stream.common.context = Some("c0ffee42".into());
    let upgraded = ModuleStream::from(stream).upgrade(3).unwrap();
    assert_eq!(upgraded.mdversion(), 3);
    assert_eq!(upgraded.context(), Some("c0ffee42"));
    assert!(upgraded.depends_on_stream("platform", "f28"));
}

#[rstest]
fn test_v2_to_v3_expands_alternatives() {
    let stream = v2_stream(vec![
        deps(&[("platform", "f27")], &[("platform", "f27")]),
        deps(&[("platform", "f28")], &[("platform", "f28")]),
    ]);
    let module = ModuleStream::from(stream.clone()).upgrade_ext(3).unwrap();
    let contexts: Vec<_> = module.streams().iter().filter_map(|s| s.context()).collect();
    assert_eq!(contexts, vec!["AUTO0001", "AUTO0002"]);
    assert!(module.streams()[0].depends_on_stream("platform", "f27"));
    assert!(module.streams()[1].depends_on_stream("platform", "f28"));

    let err = ModuleStream::from(stream).upgrade(3).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Upgrade);
}

#[rstest]
fn test_expansion_is_a_cartesian_product() {
    let mut deps = deps(&[("platform", "f28")], &[("platform", "f28")]);
    deps.add_buildtime_stream("python", "3.6").unwrap();
    deps.add_buildtime_stream("python", "3.7").unwrap();
    deps.add_runtime_stream("nodejs", "10").unwrap();
    deps.add_runtime_stream("nodejs", "12").unwrap();
    let configs = expand_dependencies(&v2_stream(vec![deps]), "X").unwrap();
    assert_eq!(configs.len(), 4);
    for (n, config) in configs.iter().enumerate() {
        assert_eq!(config.context, format!("X{:04}", n + 1));
        assert_eq!(config.platform, "f28");
        assert!(!config.buildtime_requires.contains_key("platform"));
    }
}

#[rstest]
fn test_mismatched_platforms_are_dropped() {
    let mut deps = deps(&[("platform", "f28")], &[]);
    deps.add_runtime_stream("platform", "f28").unwrap();
    deps.add_runtime_stream("platform", "f29").unwrap();
    let configs = expand_dependencies(&v2_stream(vec![deps]), "AUTO").unwrap();
    assert_eq!(configs.len(), 1);
    assert_eq!(configs[0].platform, "f28");
}

#[rstest]
#[case::no_dependencies(vec![])]
#[case::no_platform(vec![deps(&[("python", "3.6")], &[])])]
#[case::exclusion(vec![deps(&[("platform", "f28")], &[("platform", "-f27")])])]
fn test_expansion_errors(#[case] dependencies: Vec<Dependencies>) {
    let err = ModuleStream::from(v2_stream(dependencies)).upgrade_ext(3).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Upgrade, "{err}");
}

#[rstest]
fn test_no_downgrade() {
    let stream = v2_stream(vec![deps(&[("platform", "f28")], &[("platform", "f28")])]);
    let err = ModuleStream::from(stream).upgrade(1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Upgrade);
}

#[rstest]
fn test_upgrade_to_same_version_is_a_copy() {
    let stream = ModuleStream::from(v2_stream(vec![]));
    assert_eq!(stream.upgrade(2).unwrap(), stream);
}

#[rstest]
#[case::to_v3(3)]
#[case::same_version(2)]
fn test_upgrade_keeps_autogen_names(#[case] mdversion: u64) {
    let mut stream = v2_stream(vec![deps(&[("platform", "f28")], &[("platform", "f28")])]);
    stream.common.module_name = None;
    stream.common.stream_name = None;
    stream.common.set_autogen_module_name(1);
    stream.common.set_autogen_stream_name(1);

    let module = ModuleStream::from(stream).upgrade_ext(mdversion).unwrap();
    let upgraded = &module.streams()[0];
    assert!(upgraded.common().is_autogen_module_name());
    assert!(upgraded.common().is_autogen_stream_name());
    assert_eq!(upgraded.module_name(), Some("__unnamed_module_1"));
}
