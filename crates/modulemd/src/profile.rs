// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use std::collections::BTreeSet;

use crate::Result;
use crate::yaml::{CollectionStyle, Emitter, ScalarStyle, YamlParser};

#[cfg(test)]
#[path = "./profile_test.rs"]
mod profile_test;

/// A named set of packages installed together, such as `default` or `devel`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Profile {
    pub name: String,
    pub description: Option<String>,
    pub rpms: BTreeSet<String>,
    /// Whether this profile is installed by default; this is carried into
    /// generated defaults rather than written out with the profile.
    pub is_default: bool,
}

impl Profile {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn add_rpm<S: Into<String>>(&mut self, rpm: S) {
        self.rpms.insert(rpm.into());
    }

    /// Read the profile body, the key of which is the profile name.
    pub fn parse_yaml(parser: &mut YamlParser, name: &str, strict: bool) -> Result<Self> {
        Self::parse_yaml_inner(parser, name, strict, false)
    }

    /// Like [`Self::parse_yaml`], but also accepting a `default` flag.
    pub(crate) fn parse_yaml_with_default(
        parser: &mut YamlParser,
        name: &str,
        strict: bool,
    ) -> Result<Self> {
        Self::parse_yaml_inner(parser, name, strict, true)
    }

    fn parse_yaml_inner(
        parser: &mut YamlParser,
        name: &str,
        strict: bool,
        accept_default: bool,
    ) -> Result<Self> {
        let mut profile = Profile::new(name);
        parser.expect_mapping_start("profile")?;
        while let Some(key) = parser.next_key()? {
            match key.as_str() {
                "description" => profile.description = Some(parser.parse_string()?),
                "rpms" => profile.rpms = parser.parse_string_set()?,
                "default" if accept_default => profile.is_default = parser.parse_bool()?,
                _ => parser.skip_unknown(strict, &key, "profile")?,
            }
        }
        Ok(profile)
    }

    pub fn emit_yaml(&self, emitter: &mut Emitter) -> Result<()> {
        self.emit_yaml_inner(emitter, false)
    }

    pub(crate) fn emit_yaml_with_default(&self, emitter: &mut Emitter) -> Result<()> {
        self.emit_yaml_inner(emitter, true)
    }

    fn emit_yaml_inner(&self, emitter: &mut Emitter, with_default: bool) -> Result<()> {
        emitter.scalar(&self.name, ScalarStyle::Any)?;
        emitter.start_mapping(CollectionStyle::Block)?;
        emitter.key_value_if_set("description", self.description.as_deref())?;
        emitter.string_set_if_non_empty("rpms", &self.rpms)?;
        if with_default && self.is_default {
            emitter.key_value_with_style("default", "true", ScalarStyle::Plain)?;
        }
        emitter.end_mapping()
    }
}
