// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use std::collections::BTreeMap;

use super::common::{RpmArtifactMap, StreamCommon, emit_artifacts, parse_artifacts};
use crate::dependencies::Dependencies;
use crate::rpm_map::RpmMapEntry;
use crate::service_level::ServiceLevel;
use crate::yaml::{CollectionStyle, Emitter, Event, ScalarStyle, YamlParser};
use crate::{Error, Result};

/// A stream with any number of alternative dependency sets, each of
/// which may accept several streams of a module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleStreamV2 {
    pub common: StreamCommon,
    pub servicelevels: BTreeMap<String, ServiceLevel>,
    /// Whether the context was chosen by the packager rather than
    /// computed by the build system.
    pub static_context: bool,
    pub dependencies: Vec<Dependencies>,
    pub rpm_artifact_map: RpmArtifactMap,
}

impl ModuleStreamV2 {
    pub const MDVERSION: u64 = 2;

    pub fn new(module_name: Option<&str>, stream_name: Option<&str>) -> Self {
        Self {
            common: StreamCommon::new(module_name, stream_name),
            ..Default::default()
        }
    }

    pub fn add_servicelevel(&mut self, servicelevel: ServiceLevel) {
        self.servicelevels
            .insert(servicelevel.name().to_string(), servicelevel);
    }

    pub fn add_dependencies(&mut self, deps: Dependencies) {
        self.dependencies.push(deps);
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

    pub fn validate(&self) -> Result<()> {
        self.common.validate()?;
        if self.common.module_licenses.is_empty() {
            return Err(Error::Validation("Module license is missing".into()));
        }
        for deps in &self.dependencies {
            deps.validate()
                .map_err(|err| Error::wrap("Dependency failed to validate", err))?;
        }
        Ok(())
    }

    pub(crate) fn parse_data(parser: &mut YamlParser, strict: bool) -> Result<Self> {
        let mut stream = ModuleStreamV2::default();
        parser.expect_mapping_start("data")?;
        while let Some(key) = parser.next_key()? {
            if stream.common.parse_key(parser, &key, strict)? {
                continue;
            }
            match key.as_str() {
                "static_context" => stream.static_context = parser.parse_bool()?,
                "servicelevels" => {
                    parser.expect_mapping_start("servicelevels")?;
                    while let Some(name) = parser.next_key()? {
                        let sl = ServiceLevel::parse_yaml(parser, &name, strict)?;
                        stream.add_servicelevel(sl);
                    }
                }
                "dependencies" => {
                    parser.expect_sequence_start("dependencies")?;
                    loop {
                        match parser.next_event()? {
                            Event::SequenceEnd => break,
                            Event::MappingStart => {
                                let deps = Dependencies::parse_mapping_body(parser, strict)?;
                                stream.add_dependencies(deps);
                            }
                            other => {
                                return Err(parser.error(format!(
                                    "Unexpected YAML event {} in dependencies",
                                    other.name()
                                )));
                            }
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
        if self.static_context {
            emitter.key_value_with_style("static_context", "true", ScalarStyle::Plain)?;
        }
        common.emit_summary(emitter)?;
        if !self.servicelevels.is_empty() {
            emitter.scalar("servicelevels", ScalarStyle::Any)?;
            emitter.start_mapping(CollectionStyle::Block)?;
            for sl in self.servicelevels.values() {
                sl.emit_yaml(emitter)?;
            }
            emitter.end_mapping()?;
        }
        common.emit_licenses(emitter, true)?;
        common.emit_xmd(emitter)?;
        if !self.dependencies.is_empty() {
            emitter.scalar("dependencies", ScalarStyle::Any)?;
            emitter.start_sequence(CollectionStyle::Block)?;
            for deps in &self.dependencies {
                deps.emit_yaml(emitter)?;
            }
            emitter.end_sequence()?;
        }
        common.emit_body(emitter)?;
        emit_artifacts(emitter, &common.rpm_artifacts, Some(&self.rpm_artifact_map))?;
        common.emit_end(emitter)
    }
}
