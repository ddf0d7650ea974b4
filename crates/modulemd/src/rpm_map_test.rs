// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use rstest::rstest;

use super::RpmMapEntry;
use crate::ErrorKind;
use crate::fixtures::{body, emit_mapping, value_parser};

#[rstest]
fn test_nevra() {
    let entry = RpmMapEntry::new("bar", 0, "1.23", "1.module_deadbeef", "x86_64");
    assert_eq!(entry.nevra(), "bar-0:1.23-1.module_deadbeef.x86_64");
}

#[rstest]
fn test_rpm_map_entry_round_trip() {
    let yaml = "entry:
  name: bar
  epoch: 0
  version: \"1.23\"
  release: 1.module_deadbeef
  arch: x86_64
  nevra: bar-0:1.23-1.module_deadbeef.x86_64
";
    let (mut parser, _) = value_parser(yaml);
    let entry = RpmMapEntry::parse_yaml(&mut parser, true).unwrap();
    assert_eq!(entry.version, "1.23");
    let emitted = emit_mapping(|e| {
        e.scalar("entry", Default::default())?;
        entry.emit_yaml(e)
    });
    assert_eq!(body(&emitted), yaml);
}

#[rstest]
#[case::mismatched_nevra(
    "e: {name: bar, epoch: 1, version: '1', release: '1', arch: noarch, nevra: bar-0:1-1.noarch}",
    ErrorKind::Validation
)]
#[case::missing_arch("e: {name: bar, epoch: 0, version: '1', release: '1'}", ErrorKind::Validation)]
#[case::bad_epoch(
    "e: {name: bar, epoch: '+1', version: '1', release: '1', arch: noarch}",
    ErrorKind::Parse
)]
fn test_rpm_map_entry_invalid(#[case] yaml: &str, #[case] kind: ErrorKind) {
    let (mut parser, _) = value_parser(yaml);
    let err = RpmMapEntry::parse_yaml(&mut parser, true).unwrap_err();
    assert_eq!(err.kind(), kind);
}
