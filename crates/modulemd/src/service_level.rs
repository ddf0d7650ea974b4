// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use chrono::NaiveDate;

use crate::Result;
use crate::yaml::{CollectionStyle, Emitter, ScalarStyle, YamlParser};

#[cfg(test)]
#[path = "./service_level_test.rs"]
mod service_level_test;

/// A named support level for a stream and the date it ends.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceLevel {
    name: String,
    pub eol: Option<NaiveDate>,
}

impl ServiceLevel {
    /// Create a service level.
    ///
    /// # Panics
    ///
    /// If the name is empty.
    pub fn new<S: Into<String>>(name: S) -> Self {
        let name = name.into();
        assert!(!name.is_empty(), "a service level requires a name");
        Self { name, eol: None }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the end of life from its parts, leaving it unset if the date
    /// does not exist in the calendar.
    pub fn set_eol_ymd(&mut self, year: i32, month: u32, day: u32) {
        self.eol = NaiveDate::from_ymd_opt(year, month, day);
    }

    pub fn eol_string(&self) -> Option<String> {
        self.eol.map(|d| d.format("%Y-%m-%d").to_string())
    }

    pub fn parse_yaml(parser: &mut YamlParser, name: &str, strict: bool) -> Result<Self> {
        if name.is_empty() {
            return Err(parser.error("Service levels require a name"));
        }
        let mut sl = ServiceLevel::new(name);
        parser.expect_mapping_start("service level")?;
        while let Some(key) = parser.next_key()? {
            match key.as_str() {
                "eol" => sl.eol = parser.parse_date()?,
                _ => parser.skip_unknown(strict, &key, "service level")?,
            }
        }
        Ok(sl)
    }

    pub fn emit_yaml(&self, emitter: &mut Emitter) -> Result<()> {
        emitter.scalar(&self.name, ScalarStyle::Any)?;
        emitter.start_mapping(CollectionStyle::Block)?;
        if let Some(eol) = self.eol_string() {
            emitter.key_value("eol", eol)?;
        }
        emitter.end_mapping()
    }
}
