// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use std::collections::BTreeSet;

use crate::Result;
use crate::yaml::{CollectionStyle, Emitter, ScalarStyle, YamlParser};

#[cfg(test)]
#[path = "./buildopts_test.rs"]
mod buildopts_test;

/// Options affecting how the components of a stream are built.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BuildOptions {
    /// Rpm macros made available to every component build.
    pub rpm_macros: Option<String>,
    /// Binary rpms allowed to be produced despite not matching a component.
    pub rpm_whitelist: BTreeSet<String>,
    /// When non-empty, the only architectures this stream is built for.
    pub arches: BTreeSet<String>,
}

impl BuildOptions {
    pub fn is_empty(&self) -> bool {
        self.rpm_macros.is_none() && self.rpm_whitelist.is_empty() && self.arches.is_empty()
    }

    pub fn parse_yaml(parser: &mut YamlParser, strict: bool) -> Result<Self> {
        let mut opts = BuildOptions::default();
        parser.expect_mapping_start("buildopts")?;
        while let Some(key) = parser.next_key()? {
            match key.as_str() {
                "rpms" => opts.parse_rpms(parser, strict)?,
                "arches" => opts.arches = parser.parse_string_set()?,
                _ => parser.skip_unknown(strict, &key, "buildopts")?,
            }
        }
        Ok(opts)
    }

    fn parse_rpms(&mut self, parser: &mut YamlParser, strict: bool) -> Result<()> {
        parser.expect_mapping_start("buildopts rpms")?;
        while let Some(key) = parser.next_key()? {
            match key.as_str() {
                "macros" => self.rpm_macros = Some(parser.parse_string()?),
                "whitelist" => self.rpm_whitelist = parser.parse_string_set()?,
                _ => parser.skip_unknown(strict, &key, "buildopts rpms")?,
            }
        }
        Ok(())
    }

    pub fn emit_yaml(&self, emitter: &mut Emitter) -> Result<()> {
        emitter.start_mapping(CollectionStyle::Block)?;
        if self.rpm_macros.is_some() || !self.rpm_whitelist.is_empty() {
            emitter.scalar("rpms", ScalarStyle::Any)?;
            emitter.start_mapping(CollectionStyle::Block)?;
            if let Some(macros) = &self.rpm_macros {
                emitter.key_value_with_style("macros", macros, ScalarStyle::Literal)?;
            }
            emitter.string_set_if_non_empty("whitelist", &self.rpm_whitelist)?;
            emitter.end_mapping()?;
        }
        if !self.arches.is_empty() {
            emitter.flow_string_set("arches", &self.arches)?;
        }
        emitter.end_mapping()
    }
}
