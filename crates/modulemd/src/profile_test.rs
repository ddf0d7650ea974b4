// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use rstest::rstest;

use super::Profile;
use crate::ErrorKind;
use crate::fixtures::{body, emit_mapping, value_parser};

#[rstest]
fn test_profile_parse() {
    let yaml = "default:\n  description: The default profile\n  rpms: [bar, foo]\n";
    let (mut parser, name) = value_parser(yaml);
    let profile = Profile::parse_yaml(&mut parser, &name, true).unwrap();
    assert_eq!(profile.name, "default");
    assert_eq!(profile.description.as_deref(), Some("The default profile"));
    assert_eq!(profile.rpms.iter().collect::<Vec<_>>(), vec!["bar", "foo"]);
    assert!(!profile.is_default);
}

#[rstest]
fn test_profile_default_flag_only_in_packager() {
    let yaml = "default:\n  rpms: [foo]\n  default: true\n";
    let (mut parser, name) = value_parser(yaml);
    let err = Profile::parse_yaml(&mut parser, &name, true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownAttribute);

    let (mut parser, name) = value_parser(yaml);
    let profile = Profile::parse_yaml_with_default(&mut parser, &name, true).unwrap();
    assert!(profile.is_default);
}

#[rstest]
fn test_profile_emit() {
    let mut profile = Profile::new("0");
    profile.add_rpm("X");
    profile.is_default = true;
    let yaml = emit_mapping(|e| profile.emit_yaml(e));
    assert_eq!(body(&yaml), "\"0\":\n  rpms:\n  - X\n");
}

#[rstest]
fn test_profile_round_trip() {
    let mut profile = Profile::new("devel");
    profile.description = Some("Development files".into());
    profile.add_rpm("foo-devel");
    profile.add_rpm("1.0");
    let yaml = emit_mapping(|e| profile.emit_yaml(e));
    let (mut parser, name) = value_parser(&yaml);
    let parsed = Profile::parse_yaml(&mut parser, &name, true).unwrap();
    assert_eq!(parsed, profile);
    assert_eq!(emit_mapping(|e| parsed.emit_yaml(e)), yaml);
}

#[rstest]
fn test_profile_ordering() {
    let a = Profile::new("a");
    let mut b = Profile::new("a");
    b.description = Some("described".into());
    assert!(a < b);
    assert!(Profile::new("b") > b);
}
