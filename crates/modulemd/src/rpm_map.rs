// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use crate::yaml::{CollectionStyle, Emitter, YamlParser};
use crate::{Error, Result};

#[cfg(test)]
#[path = "./rpm_map_test.rs"]
mod rpm_map_test;

/// The identity of one binary rpm listed in the artifacts of a stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RpmMapEntry {
    pub name: String,
    pub epoch: u64,
    pub version: String,
    pub release: String,
    pub arch: String,
}

impl RpmMapEntry {
    pub fn new<S: Into<String>>(name: S, epoch: u64, version: S, release: S, arch: S) -> Self {
        Self {
            name: name.into(),
            epoch,
            version: version.into(),
            release: release.into(),
            arch: arch.into(),
        }
    }

    /// The `name-epoch:version-release.arch` form of this entry.
    pub fn nevra(&self) -> String {
        format!(
            "{}-{}:{}-{}.{}",
            self.name, self.epoch, self.version, self.release, self.arch
        )
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("name", &self.name),
            ("version", &self.version),
            ("release", &self.release),
            ("arch", &self.arch),
        ] {
            if value.is_empty() {
                return Err(Error::Validation(format!("Rpm map entry is missing its {field}")));
            }
        }
        Ok(())
    }

    pub fn parse_yaml(parser: &mut YamlParser, strict: bool) -> Result<Self> {
        let mut entry = RpmMapEntry::default();
        let mut nevra = None;
        parser.expect_mapping_start("rpm-map entry")?;
        while let Some(key) = parser.next_key()? {
            match key.as_str() {
                "name" => entry.name = parser.parse_string()?,
                "epoch" => entry.epoch = parser.parse_uint64()?,
                "version" => entry.version = parser.parse_string()?,
                "release" => entry.release = parser.parse_string()?,
                "arch" => entry.arch = parser.parse_string()?,
                "nevra" => nevra = Some(parser.parse_string()?),
                _ => parser.skip_unknown(strict, &key, "rpm-map entry")?,
            }
        }
        entry.validate()?;
        if let Some(nevra) = nevra {
            if nevra != entry.nevra() {
                return Err(Error::Validation(format!(
                    "Rpm map entry nevra {nevra:?} does not match its fields ({})",
                    entry.nevra()
                )));
            }
        }
        Ok(entry)
    }

    pub fn emit_yaml(&self, emitter: &mut Emitter) -> Result<()> {
        self.validate()?;
        emitter.start_mapping(CollectionStyle::Block)?;
        emitter.key_value("name", &self.name)?;
        emitter.key_uint("epoch", self.epoch)?;
        emitter.key_value("version", &self.version)?;
        emitter.key_value("release", &self.release)?;
        emitter.key_value("arch", &self.arch)?;
        emitter.key_value("nevra", self.nevra())?;
        emitter.end_mapping()
    }
}
