// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use std::collections::BTreeMap;

use super::common::{RpmArtifactMap, StreamCommon, emit_artifacts, parse_artifacts};
use crate::build_config::{BuildConfig, emit_single_streams, parse_single_streams};
use crate::rpm_map::RpmMapEntry;
use crate::yaml::{CollectionStyle, Emitter, ScalarStyle, YamlParser};
use crate::{Error, Result};

/// A stream built for exactly one platform, with a single stream for
/// every module that it requires.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleStreamV3 {
    pub common: StreamCommon,
    pub platform: Option<String>,
    pub buildtime_requires: BTreeMap<String, String>,
    pub runtime_requires: BTreeMap<String, String>,
    pub rpm_artifact_map: RpmArtifactMap,
}

impl ModuleStreamV3 {
    pub const MDVERSION: u64 = 3;

    pub fn new(module_name: Option<&str>, stream_name: Option<&str>) -> Self {
        Self {
            common: StreamCommon::new(module_name, stream_name),
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

    pub fn set_rpm_artifact_map_entry<D: Into<String>, C: Into<String>>(
        &mut self,
        entry: RpmMapEntry,
        digest: D,
        checksum: C,
    ) {
        self.rpm_artifact_map
            .entry(digest.into())
            .or_default()
            .insert(checksum.into(), entry);
    }

    pub fn rpm_artifact_map_entry(&self, digest: &str, checksum: &str) -> Option<&RpmMapEntry> {
        self.rpm_artifact_map.get(digest)?.get(checksum)
    }

    /// The build configuration that this stream was built from.
    pub fn as_build_config(&self) -> BuildConfig {
        BuildConfig {
            context: self.common.context.clone().unwrap_or_default(),
            platform: self.platform.clone().unwrap_or_default(),
            buildtime_requires: self.buildtime_requires.clone(),
            runtime_requires: self.runtime_requires.clone(),
            buildopts: self.common.buildopts.clone(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.common.validate()?;
        if self.platform.as_deref().is_none_or(str::is_empty) {
            return Err(Error::Validation("Platform is missing".into()));
        }
        for module in self
            .buildtime_requires
            .keys()
            .chain(self.runtime_requires.keys())
        {
            if module == "platform" {
                return Err(Error::Validation(
                    "The platform must not be listed as a module requirement".into(),
                ));
            }
        }
        Ok(())
    }

    pub(crate) fn parse_data(parser: &mut YamlParser, strict: bool) -> Result<Self> {
        let mut stream = ModuleStreamV3::default();
        parser.expect_mapping_start("data")?;
        while let Some(key) = parser.next_key()? {
            if stream.common.parse_key(parser, &key, strict)? {
                continue;
            }
            match key.as_str() {
                "dependencies" => {
                    parser.expect_mapping_start("dependencies")?;
                    while let Some(key) = parser.next_key()? {
                        match key.as_str() {
                            "platform" => stream.platform = Some(parser.parse_string()?),
                            "buildrequires" => {
                                stream.buildtime_requires = parse_single_streams(parser)?
                            }
                            "requires" => stream.runtime_requires = parse_single_streams(parser)?,
                            _ => parser.skip_unknown(strict, &key, "dependencies")?,
                        }
                    }
                }
                "artifacts" => parse_artifacts(
                    parser,
                    strict,
                    &mut stream.common.rpm_artifacts,
                    Some(&mut stream.rpm_artifact_map),
                )?,
                _ => parser.skip_unknown(strict, &key, "data")?,
            }
        }
        Ok(stream)
    }

    pub(crate) fn emit_yaml(&self, emitter: &mut Emitter) -> Result<()> {
        let common = &self.common;
        common.emit_base(emitter, Self::MDVERSION)?;
        common.emit_summary(emitter)?;
        common.emit_licenses(emitter, false)?;
        common.emit_xmd(emitter)?;
        emitter.scalar("dependencies", ScalarStyle::Any)?;
        emitter.start_mapping(CollectionStyle::Block)?;
        emitter.key_value_if_set("platform", self.platform.as_deref())?;
        emit_single_streams(emitter, "buildrequires", &self.buildtime_requires)?;
        emit_single_streams(emitter, "requires", &self.runtime_requires)?;
        emitter.end_mapping()?;
        common.emit_body(emitter)?;
        emit_artifacts(emitter, &common.rpm_artifacts, Some(&self.rpm_artifact_map))?;
        common.emit_end(emitter)
    }
}
