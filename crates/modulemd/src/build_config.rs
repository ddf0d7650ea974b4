// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use std::collections::BTreeMap;

use crate::buildopts::BuildOptions;
use crate::name::validate_context;
use crate::yaml::{CollectionStyle, Emitter, ScalarStyle, YamlParser};
use crate::{Error, Result};

#[cfg(test)]
#[path = "./build_config_test.rs"]
mod build_config_test;

/// One concrete build of a v3 stream: a context, a platform and a
/// single stream for every required module.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BuildConfig {
    pub context: String,
    pub platform: String,
    pub buildtime_requires: BTreeMap<String, String>,
    pub runtime_requires: BTreeMap<String, String>,
    pub buildopts: Option<BuildOptions>,
}

impl BuildConfig {
    pub fn new<C: Into<String>, P: Into<String>>(context: C, platform: P) -> Self {
        Self {
            context: context.into(),
            platform: platform.into(),
            ..Default::default()
        }
    }

    pub fn add_buildtime_requirement<M: Into<String>, S: Into<String>>(
        &mut self,
        module: M,
        stream: S,
    ) {
        self.buildtime_requires.insert(module.into(), stream.into());
    }

    pub fn add_runtime_requirement<M: Into<String>, S: Into<String>>(
        &mut self,
        module: M,
        stream: S,
    ) {
        self.runtime_requires.insert(module.into(), stream.into());
    }

    pub fn validate(&self) -> Result<()> {
        validate_context(&self.context)?;
        if self.platform.is_empty() {
            return Err(Error::Validation(format!(
                "Build configuration {:?} is missing a platform",
                self.context
            )));
        }
        for module in self
            .buildtime_requires
            .keys()
            .chain(self.runtime_requires.keys())
        {
            if module == "platform" {
                return Err(Error::Validation(format!(
                    "Build configuration {:?} must not list platform as a module requirement",
                    self.context
                )));
            }
        }
        Ok(())
    }

    pub fn parse_yaml(parser: &mut YamlParser, strict: bool) -> Result<Self> {
        parser.expect_mapping_start("build configuration")?;
        Self::parse_mapping_body(parser, strict)
    }

    /// Like [`Self::parse_yaml`], for a mapping whose start was already read.
    pub(crate) fn parse_mapping_body(parser: &mut YamlParser, strict: bool) -> Result<Self> {
        let mut config = BuildConfig::default();
        while let Some(key) = parser.next_key()? {
            match key.as_str() {
                "context" => config.context = parser.parse_string()?,
                "platform" => config.platform = parser.parse_string()?,
                "buildrequires" => config.buildtime_requires = parse_single_streams(parser)?,
                "requires" => config.runtime_requires = parse_single_streams(parser)?,
                "buildopts" => config.buildopts = Some(BuildOptions::parse_yaml(parser, strict)?),
                _ => parser.skip_unknown(strict, &key, "build configuration")?,
            }
        }
        if config.context.is_empty() {
            return Err(parser.error("Build configuration is missing its context"));
        }
        Ok(config)
    }

    pub fn emit_yaml(&self, emitter: &mut Emitter) -> Result<()> {
        emitter.start_mapping(CollectionStyle::Block)?;
        emitter.key_value("context", &self.context)?;
        emitter.key_value("platform", &self.platform)?;
        emit_single_streams(emitter, "buildrequires", &self.buildtime_requires)?;
        emit_single_streams(emitter, "requires", &self.runtime_requires)?;
        if let Some(opts) = &self.buildopts {
            emitter.scalar("buildopts", ScalarStyle::Any)?;
            opts.emit_yaml(emitter)?;
        }
        emitter.end_mapping()
    }
}

pub(crate) fn parse_single_streams(parser: &mut YamlParser) -> Result<BTreeMap<String, String>> {
    let mut requires = BTreeMap::new();
    for (module, streams) in parser.parse_nested_set()? {
        let mut streams = streams.into_iter();
        match (streams.next(), streams.next()) {
            (Some(stream), None) => {
                requires.insert(module, stream);
            }
            _ => {
                return Err(parser.error(format!(
                    "Module {module:?} must list exactly one stream in a build configuration"
                )));
            }
        }
    }
    Ok(requires)
}

pub(crate) fn emit_single_streams(
    emitter: &mut Emitter,
    key: &str,
    requires: &BTreeMap<String, String>,
) -> Result<()> {
    if requires.is_empty() {
        return Ok(());
    }
    emitter.scalar(key, ScalarStyle::Any)?;
    emitter.start_mapping(CollectionStyle::Block)?;
    for (module, stream) in requires {
        emitter.flow_string_set(module, [stream])?;
    }
    emitter.end_mapping()
}
