// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use std::collections::BTreeMap;

use super::common::{StreamCommon, emit_artifacts, parse_artifacts};
use crate::service_level::ServiceLevel;
use crate::yaml::{CollectionStyle, Emitter, ScalarStyle, YamlParser};
use crate::{Error, Result};

/// The first stream format, with one stream per required module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleStreamV1 {
    pub common: StreamCommon,
    pub servicelevels: BTreeMap<String, ServiceLevel>,
    pub buildtime_deps: BTreeMap<String, String>,
    pub runtime_deps: BTreeMap<String, String>,
}

impl ModuleStreamV1 {
    pub const MDVERSION: u64 = 1;

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

    /// The deprecated stream-wide end of life, stored as the `rawhide`
    /// service level.
    pub fn eol(&self) -> Option<chrono::NaiveDate> {
        self.servicelevels.get("rawhide").and_then(|sl| sl.eol)
    }

    pub fn validate(&self) -> Result<()> {
        self.common.validate()?;
        if self.common.module_licenses.is_empty() {
            return Err(Error::Validation("Module license is missing".into()));
        }
        Ok(())
    }

    pub(crate) fn parse_data(parser: &mut YamlParser, strict: bool) -> Result<Self> {
        let mut stream = ModuleStreamV1::default();
        parser.expect_mapping_start("data")?;
        while let Some(key) = parser.next_key()? {
            if stream.common.parse_key(parser, &key, strict)? {
                continue;
            }
            match key.as_str() {
                "servicelevels" => {
                    parser.expect_mapping_start("servicelevels")?;
                    while let Some(name) = parser.next_key()? {
                        let sl = ServiceLevel::parse_yaml(parser, &name, strict)?;
                        stream.add_servicelevel(sl);
                    }
                }
                "eol" => {
                    let mut sl = ServiceLevel::new("rawhide");
                    sl.eol = parser.parse_date()?;
                    stream.add_servicelevel(sl);
                }
                "dependencies" => {
                    parser.expect_mapping_start("dependencies")?;
                    while let Some(key) = parser.next_key()? {
                        match key.as_str() {
                            "buildrequires" => {
                                stream.buildtime_deps = parser.parse_string_map("buildrequires")?
                            }
                            "requires" => {
                                stream.runtime_deps = parser.parse_string_map("requires")?
                            }
                            _ => parser.skip_unknown(strict, &key, "dependencies")?,
                        }
                    }
                }
                "artifacts" => {
                    parse_artifacts(parser, strict, &mut stream.common.rpm_artifacts, None)?
                }
                _ => parser.skip_unknown(strict, &key, "data")?,
            }
        }
        Ok(stream)
    }

    pub(crate) fn emit_yaml(&self, emitter: &mut Emitter) -> Result<()> {
        let common = &self.common;
        common.emit_base(emitter, Self::MDVERSION)?;
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
        if !self.buildtime_deps.is_empty() || !self.runtime_deps.is_empty() {
            emitter.scalar("dependencies", ScalarStyle::Any)?;
            emitter.start_mapping(CollectionStyle::Block)?;
            for (key, deps) in [("buildrequires", &self.buildtime_deps), ("requires", &self.runtime_deps)] {
                if deps.is_empty() {
                    continue;
                }
                emitter.scalar(key, ScalarStyle::Any)?;
                emitter.start_mapping(CollectionStyle::Block)?;
                for (module, stream) in deps {
                    emitter.key_value(module, stream)?;
                }
                emitter.end_mapping()?;
            }
            emitter.end_mapping()?;
        }
        common.emit_body(emitter)?;
        emit_artifacts(emitter, &common.rpm_artifacts, None)?;
        common.emit_end(emitter)
    }
}
