// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use rstest::rstest;

use super::{generated_context, nsvc, validate_context, validate_nevra};

#[rstest]
#[case("a234567890", true)]
#[case("CTX1", true)]
#[case("a2345678901", false)]
#[case("_", false)]
#[case("", false)]
#[case("ctx-1", false)]
fn test_validate_context(#[case] context: &str, #[case] valid: bool) {
    assert_eq!(validate_context(context).is_ok(), valid, "{context}");
}

#[rstest]
fn test_generated_context_is_valid() {
    assert_eq!(generated_context("AUTO", 1), "AUTO0001");
    assert_eq!(generated_context("AUTO", 12), "AUTO0012");
    validate_context(&generated_context("AUTO", 9999)).unwrap();
}

#[rstest]
fn test_nsvc_format() {
    assert_eq!(nsvc(Some("foo"), Some("bar"), 3, None), "foo:bar:3:");
    assert_eq!(nsvc(Some("foo"), Some("bar"), 3, Some("c0ffee")), "foo:bar:3:c0ffee");
}

#[rstest]
#[case("bar-0:1.23-1.module_deadbeef.x86_64", true)]
#[case("python-foo-bar-12:1.0-1.el8.noarch", true)]
#[case("bar-1.23-1.module_deadbeef.x86_64", false)]
#[case("bar-x:1.23-1.noarch", false)]
#[case("bar-0:1.23-1", false)]
#[case("", false)]
fn test_validate_nevra(#[case] nevra: &str, #[case] valid: bool) {
    assert_eq!(validate_nevra(nevra), valid, "{nevra}");
}
