// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use chrono::NaiveDate;
use rstest::rstest;

use super::{Event, YamlParser};
use crate::ErrorKind;

/// Position a parser on the value of the single key in `{key: <value>}`.
fn value_parser(yaml: &str) -> YamlParser<'_> {
    let mut parser = YamlParser::new(yaml);
    assert_eq!(parser.next_event().unwrap(), Event::StreamStart);
    assert_eq!(parser.next_event().unwrap(), Event::DocumentStart);
    assert_eq!(parser.next_event().unwrap(), Event::MappingStart);
    parser.next_key().unwrap().expect("a key");
    parser
}

#[rstest]
#[case("value: 42", Some(42))]
#[case("value: 18446744073709551615", Some(u64::MAX))]
#[case("value: 18446744073709551616", None)]
#[case("value: +42", None)]
#[case("value: -1", None)]
#[case("value: 42abc", None)]
#[case("value: \"\"", None)]
fn test_parse_uint64(#[case] yaml: &str, #[case] expected: Option<u64>) {
    let res = value_parser(yaml).parse_uint64();
    match expected {
        Some(value) => assert_eq!(res.unwrap(), value),
        None => assert_eq!(res.unwrap_err().kind(), ErrorKind::Parse),
    }
}

#[rstest]
#[case("value: -42", Some(-42))]
#[case("value: 42", Some(42))]
#[case("value: +42", None)]
#[case("value: 9223372036854775808", None)]
#[case("value: 4 2", None)]
fn test_parse_int64(#[case] yaml: &str, #[case] expected: Option<i64>) {
    let res = value_parser(yaml).parse_int64();
    match expected {
        Some(value) => assert_eq!(res.unwrap(), value),
        None => assert_eq!(res.unwrap_err().kind(), ErrorKind::Parse),
    }
}

#[rstest]
#[case::valid("value: 2077-10-23", NaiveDate::from_ymd_opt(2077, 10, 23))]
#[case::feb_31("value: 2018-02-31", None)]
#[case::month_99("value: 2018-99-01", None)]
fn test_parse_date(#[case] yaml: &str, #[case] expected: Option<NaiveDate>) {
    assert_eq!(value_parser(yaml).parse_date().unwrap(), expected);
}

#[rstest]
#[case("value: 2018-02")]
#[case("value: 20180201")]
#[case("value: a-b-c")]
fn test_parse_date_malformed(#[case] yaml: &str) {
    let err = value_parser(yaml).parse_date().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[rstest]
fn test_parse_string_set_scalar_or_sequence() {
    let set = value_parser("value: single").parse_string_set().unwrap();
    assert_eq!(set.into_iter().collect::<Vec<_>>(), vec!["single"]);

    let set = value_parser("value: [b, a, b]").parse_string_set().unwrap();
    assert_eq!(set.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);

    let err = value_parser("value: {a: b}")
        .parse_string_set()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[rstest]
fn test_skip_value_consumes_one_nested_value() {
    let yaml = "skipped: {a: [1, {b: c}], d: [[e]]}\nkept: value\n";
    let mut parser = value_parser(yaml);
    parser.skip_value().unwrap();
    assert_eq!(parser.next_key().unwrap().as_deref(), Some("kept"));
    assert_eq!(parser.parse_string().unwrap(), "value");
    assert_eq!(parser.next_key().unwrap(), None);
}

#[rstest]
fn test_skip_unknown_strict() {
    let mut parser = value_parser("foo: bar");
    let err = parser.skip_unknown(true, "foo", "test").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownAttribute);

    let mut parser = value_parser("foo: bar");
    parser.skip_unknown(false, "foo", "test").unwrap();
    assert_eq!(parser.next_key().unwrap(), None);
}

#[rstest]
fn test_aliases_are_rejected() {
    let mut parser = value_parser("value: &anchor [a]\nother: *anchor\n");
    parser.skip_value().unwrap();
    parser.next_key().unwrap();
    let err = parser.skip_value().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[rstest]
fn test_scanner_failure_is_unparseable() {
    let mut parser = YamlParser::new("key: [unterminated\n");
    let mut res = Ok(Event::StreamStart);
    for _ in 0..8 {
        res = parser.next_event();
        if res.is_err() {
            break;
        }
    }
    assert_eq!(res.unwrap_err().kind(), ErrorKind::Unparseable);
}

#[rstest]
fn test_parse_xmd() {
    let yaml = "value: {flag: true, quoted: \"true\", list: [1, two], nested: {key: value}}";
    let xmd = value_parser(yaml).parse_xmd().unwrap();
    assert_eq!(xmd["flag"], serde_yaml::Value::Bool(true));
    assert_eq!(xmd["quoted"], serde_yaml::Value::String("true".into()));
    assert_eq!(xmd["list"][0], serde_yaml::Value::String("1".into()));
    assert_eq!(xmd["nested"]["key"], serde_yaml::Value::String("value".into()));
}
