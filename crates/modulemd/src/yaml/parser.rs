// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use chrono::NaiveDate;
use yaml_rust2::parser::{Event as RawEvent, Parser};
use yaml_rust2::scanner::TScalarStyle;

use super::ScalarStyle;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./parser_test.rs"]
mod parser_test;

/// A position in the YAML input, 1-based.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mark {
    pub line: usize,
    pub column: usize,
}

impl Display for Mark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// One YAML parse event, with anchors and tags discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    StreamStart,
    StreamEnd,
    DocumentStart,
    DocumentEnd,
    MappingStart,
    MappingEnd,
    SequenceStart,
    SequenceEnd,
    Scalar { value: String, style: ScalarStyle },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::StreamStart => "STREAM_START",
            Event::StreamEnd => "STREAM_END",
            Event::DocumentStart => "DOCUMENT_START",
            Event::DocumentEnd => "DOCUMENT_END",
            Event::MappingStart => "MAPPING_START",
            Event::MappingEnd => "MAPPING_END",
            Event::SequenceStart => "SEQUENCE_START",
            Event::SequenceEnd => "SEQUENCE_END",
            Event::Scalar { .. } => "SCALAR",
        }
    }
}

/// A pull parser producing [`Event`]s from YAML text.
pub struct YamlParser<'a> {
    inner: Parser<std::str::Chars<'a>>,
    mark: Mark,
}

impl<'a> YamlParser<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            inner: Parser::new(text.chars()),
            mark: Mark::default(),
        }
    }

    /// The position of the most recently read event.
    pub fn mark(&self) -> Mark {
        self.mark
    }

    /// Build a parse error located at the most recently read event.
    pub fn error<S: Into<String>>(&self, message: S) -> Error {
        Error::Parse {
            message: message.into(),
            mark: self.mark,
        }
    }

    pub fn next_event(&mut self) -> Result<Event> {
        let (raw, marker) = self
            .inner
            .next_token()
            .map_err(|err| Error::Unparseable(err.to_string()))?;
        self.mark = Mark {
            line: marker.line(),
            column: marker.col() + 1,
        };
        let event = match raw {
            RawEvent::StreamStart { .. } => Event::StreamStart,
            RawEvent::StreamEnd { .. } => Event::StreamEnd,
            RawEvent::DocumentStart { .. } => Event::DocumentStart,
            RawEvent::DocumentEnd { .. } => Event::DocumentEnd,
            RawEvent::MappingStart { .. } => Event::MappingStart,
            RawEvent::MappingEnd { .. } => Event::MappingEnd,
            RawEvent::SequenceStart { .. } => Event::SequenceStart,
            RawEvent::SequenceEnd { .. } => Event::SequenceEnd,
            RawEvent::Scalar(value, style, ..) => Event::Scalar {
                value,
                style: match style {
                    TScalarStyle::Plain => ScalarStyle::Plain,
                    TScalarStyle::SingleQuoted => ScalarStyle::SingleQuoted,
                    TScalarStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
                    TScalarStyle::Literal => ScalarStyle::Literal,
                    TScalarStyle::Folded => ScalarStyle::Folded,
                    #[allow(unreachable_patterns)]
                    _ => ScalarStyle::Any,
                },
            },
            RawEvent::Alias { .. } => {
                return Err(self.error("YAML aliases are not supported in modulemd documents"));
            }
            #[allow(unreachable_patterns)]
            _ => return Err(self.error("Unexpected end of the YAML event stream")),
        };
        tracing::trace!(event = event.name(), line = self.mark.line, "yaml event");
        Ok(event)
    }

    /// Read the start of a mapping, failing on anything else.
    pub fn expect_mapping_start(&mut self, context: &str) -> Result<()> {
        match self.next_event()? {
            Event::MappingStart => Ok(()),
            other => Err(self.error(format!(
                "Expected a mapping in {context}, got {}",
                other.name()
            ))),
        }
    }

    /// Read the start of a sequence, failing on anything else.
    pub fn expect_sequence_start(&mut self, context: &str) -> Result<()> {
        match self.next_event()? {
            Event::SequenceStart => Ok(()),
            other => Err(self.error(format!(
                "Expected a sequence in {context}, got {}",
                other.name()
            ))),
        }
    }

    /// Read the next key of a mapping whose start was already consumed.
    ///
    /// Returns `None` once the end of the mapping is reached.
    pub fn next_key(&mut self) -> Result<Option<String>> {
        match self.next_event()? {
            Event::MappingEnd => Ok(None),
            Event::Scalar { value, .. } => Ok(Some(value)),
            other => Err(self.error(format!(
                "Unexpected YAML event {} where a mapping key was expected",
                other.name()
            ))),
        }
    }

    /// Consume exactly one value, however deeply nested.
    pub fn skip_value(&mut self) -> Result<()> {
        let mut depth = 0usize;
        loop {
            match self.next_event()? {
                Event::Scalar { .. } if depth == 0 => return Ok(()),
                Event::Scalar { .. } => {}
                Event::MappingStart | Event::SequenceStart => depth += 1,
                Event::MappingEnd | Event::SequenceEnd if depth > 0 => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                other => {
                    return Err(self.error(format!(
                        "Unexpected YAML event {} while skipping a value",
                        other.name()
                    )));
                }
            }
        }
    }

    /// Reject (strict) or skip (lenient) the value of an unrecognized key.
    pub fn skip_unknown(&mut self, strict: bool, key: &str, context: &str) -> Result<()> {
        if strict {
            return Err(Error::UnknownAttribute {
                key: key.to_string(),
                context: context.to_string(),
                mark: self.mark,
            });
        }
        tracing::debug!("Skipping unknown key in {context}: {key}");
        self.skip_value()
    }

    pub fn parse_string(&mut self) -> Result<String> {
        match self.next_event()? {
            Event::Scalar { value, .. } => Ok(value),
            other => Err(self.error(format!("Expected a scalar, got {}", other.name()))),
        }
    }

    pub fn parse_uint64(&mut self) -> Result<u64> {
        let value = self.parse_string()?;
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(self.error(format!("{value:?} is not an unsigned integer")));
        }
        value
            .parse()
            .map_err(|_| self.error(format!("{value:?} is out of range for an unsigned integer")))
    }

    pub fn parse_int64(&mut self) -> Result<i64> {
        let value = self.parse_string()?;
        let digits = value.strip_prefix('-').unwrap_or(&value);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(self.error(format!("{value:?} is not an integer")));
        }
        value
            .parse()
            .map_err(|_| self.error(format!("{value:?} is out of range for an integer")))
    }

    pub fn parse_bool(&mut self) -> Result<bool> {
        let value = self.parse_string()?;
        match value.as_str() {
            "true" | "True" | "TRUE" => Ok(true),
            "false" | "False" | "FALSE" => Ok(false),
            _ => Err(self.error(format!("{value:?} is not a boolean"))),
        }
    }

    /// Parse a `YYYY-MM-DD` date.
    ///
    /// A well-formed but impossible date (such as `2018-02-31`) yields
    /// `None` rather than an error.
    pub fn parse_date(&mut self) -> Result<Option<NaiveDate>> {
        let value = self.parse_string()?;
        let parts = value
            .split('-')
            .map(|p| p.parse::<u32>().ok())
            .collect::<Option<Vec<_>>>();
        let (year, month, day) = match parts.as_deref() {
            Some([y, m, d]) => (*y, *m, *d),
            _ => return Err(self.error(format!("{value:?} is not a date in YYYY-MM-DD format"))),
        };
        let date = i32::try_from(year)
            .ok()
            .and_then(|y| NaiveDate::from_ymd_opt(y, month, day));
        if date.is_none() {
            tracing::debug!("Ignoring invalid calendar date {value}");
        }
        Ok(date)
    }

    /// Parse either a lone scalar or a sequence of scalars into a set.
    pub fn parse_string_set(&mut self) -> Result<BTreeSet<String>> {
        let mut set = BTreeSet::new();
        match self.next_event()? {
            Event::Scalar { value, .. } => {
                set.insert(value);
            }
            Event::SequenceStart => loop {
                match self.next_event()? {
                    Event::Scalar { value, .. } => {
                        set.insert(value);
                    }
                    Event::SequenceEnd => break,
                    other => {
                        return Err(self.error(format!(
                            "Unexpected YAML event {} in a list of strings",
                            other.name()
                        )));
                    }
                }
            },
            other => {
                return Err(self.error(format!(
                    "Expected a string or a list of strings, got {}",
                    other.name()
                )));
            }
        }
        Ok(set)
    }

    /// Parse a `{key: [..]}` wrapper mapping, returning the set under `key`.
    pub fn parse_string_set_from_map(
        &mut self,
        key: &str,
        strict: bool,
    ) -> Result<BTreeSet<String>> {
        self.expect_mapping_start(key)?;
        let mut set = BTreeSet::new();
        while let Some(k) = self.next_key()? {
            if k == key {
                set = self.parse_string_set()?;
            } else {
                self.skip_unknown(strict, &k, key)?;
            }
        }
        Ok(set)
    }

    /// Parse a mapping of names to string sets, such as `module: [stream, ..]`.
    pub fn parse_nested_set(&mut self) -> Result<BTreeMap<String, BTreeSet<String>>> {
        self.expect_mapping_start("nested set")?;
        let mut table = BTreeMap::new();
        while let Some(key) = self.next_key()? {
            let set = self.parse_string_set()?;
            if table.insert(key.clone(), set).is_some() {
                return Err(self.error(format!("Duplicate key {key:?} in mapping")));
            }
        }
        Ok(table)
    }

    /// Parse a mapping of names to single strings.
    pub fn parse_string_map(&mut self, context: &str) -> Result<BTreeMap<String, String>> {
        self.expect_mapping_start(context)?;
        let mut table = BTreeMap::new();
        while let Some(key) = self.next_key()? {
            let value = self.parse_string()?;
            table.insert(key, value);
        }
        Ok(table)
    }

    /// Parse an arbitrary subtree into a free-form value.
    ///
    /// Plain `true`/`false` scalars become booleans; every other scalar is
    /// kept as a string so that no information is lost on re-emission.
    pub fn parse_xmd(&mut self) -> Result<serde_yaml::Value> {
        let event = self.next_event()?;
        self.parse_xmd_value(event)
    }

    fn parse_xmd_value(&mut self, event: Event) -> Result<serde_yaml::Value> {
        use serde_yaml::Value;
        match event {
            Event::Scalar { value, style } => Ok(match (style, value.as_str()) {
                (ScalarStyle::Plain, "true") => Value::Bool(true),
                (ScalarStyle::Plain, "false") => Value::Bool(false),
                _ => Value::String(value),
            }),
            Event::SequenceStart => {
                let mut items = Vec::new();
                loop {
                    match self.next_event()? {
                        Event::SequenceEnd => break,
                        event => items.push(self.parse_xmd_value(event)?),
                    }
                }
                Ok(Value::Sequence(items))
            }
            Event::MappingStart => {
                let mut mapping = serde_yaml::Mapping::new();
                while let Some(key) = self.next_key()? {
                    let event = self.next_event()?;
                    let value = self.parse_xmd_value(event)?;
                    mapping.insert(Value::String(key), value);
                }
                Ok(Value::Mapping(mapping))
            }
            other => Err(self.error(format!(
                "Unexpected YAML event {} in xmd",
                other.name()
            ))),
        }
    }
}
