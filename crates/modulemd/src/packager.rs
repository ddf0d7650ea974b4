// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use std::collections::BTreeMap;
use std::path::Path;

use crate::build_config::BuildConfig;
use crate::defaults::Defaults;
use crate::index::ModuleIndex;
use crate::module::Module;
use crate::options::ReadOptions;
use crate::profile::Profile;
use crate::stream::{ModuleStreamV3, StreamCommon};
use crate::subdocument::{DocumentType, SubdocumentInfo, read_subdocuments};
use crate::yaml::{CollectionStyle, Emitter, Event, ScalarStyle, YamlParser};
use crate::{Error, Result};

#[cfg(test)]
#[path = "./packager_test.rs"]
mod packager_test;

pub const PACKAGER_DOCUMENT: &str = "modulemd-packager";
pub const PACKAGER_VERSION_LATEST: u64 = 3;

/// The document a packager writes to describe how a module is built.
///
/// It carries the same descriptive fields as a stream, but rather than
/// one set of dependencies it lists every build configuration, each of
/// which becomes its own v3 stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackagerV3 {
    pub common: StreamCommon,
    /// Build configurations keyed by their context.
    pub build_configs: BTreeMap<String, BuildConfig>,
}

impl PackagerV3 {
    pub fn new(module_name: Option<&str>, stream_name: Option<&str>) -> Self {
        Self {
            common: StreamCommon::new(module_name, stream_name),
            ..Default::default()
        }
    }

    pub fn add_build_config(&mut self, config: BuildConfig) {
        self.build_configs.insert(config.context.clone(), config);
    }

    pub fn build_config(&self, context: &str) -> Option<&BuildConfig> {
        self.build_configs.get(context)
    }

    /// The contexts of every build configuration, sorted.
    pub fn build_config_contexts(&self) -> impl Iterator<Item = &str> {
        self.build_configs.keys().map(String::as_str)
    }

    pub fn validate(&self) -> Result<()> {
        if self.common.context.is_some() {
            return Err(Error::Validation(
                "Packager documents carry their contexts in the build configurations".into(),
            ));
        }
        self.common.validate()?;
        for config in self.build_configs.values() {
            config.validate()?;
        }
        Ok(())
    }

    /// Parse the `data` mapping of a packager document.
    pub fn parse_yaml(parser: &mut YamlParser, strict: bool) -> Result<Self> {
        let mut packager = PackagerV3::default();
        parser.expect_mapping_start("packager")?;
        while let Some(key) = parser.next_key()? {
            match key.as_str() {
                "name" => packager.common.module_name = Some(parser.parse_string()?),
                "stream" => packager.common.stream_name = Some(parser.parse_string()?),
                "context" => packager.common.context = Some(parser.parse_string()?),
                "summary" => packager.common.summary = Some(parser.parse_string()?),
                "description" => packager.common.description = Some(parser.parse_string()?),
                "license" => packager.common.module_licenses = parser.parse_string_set()?,
                "xmd" => packager.common.xmd = Some(parser.parse_xmd()?),
                "configurations" => {
                    parser.expect_sequence_start("configurations")?;
                    loop {
                        match parser.next_event()? {
                            Event::SequenceEnd => break,
                            Event::MappingStart => {
                                let config = BuildConfig::parse_mapping_body(parser, strict)?;
                                if packager.build_configs.contains_key(&config.context) {
                                    return Err(parser.error(format!(
                                        "Build configuration context {:?} is listed more than once",
                                        config.context
                                    )));
                                }
                                packager.add_build_config(config);
                            }
                            other => {
                                return Err(parser.error(format!(
                                    "Unexpected YAML event {} in configurations",
                                    other.name()
                                )));
                            }
                        }
                    }
                }
                "profiles" => {
                    parser.expect_mapping_start("profiles")?;
                    while let Some(name) = parser.next_key()? {
                        let profile = Profile::parse_yaml_with_default(parser, &name, strict)?;
                        packager.common.add_profile(profile);
                    }
                }
                "references" | "api" | "filter" | "components" => {
                    packager.common.parse_key(parser, &key, strict)?;
                }
                _ => parser.skip_unknown(strict, &key, "packager")?,
            }
        }
        Ok(packager)
    }

    pub fn read_yaml(info: &SubdocumentInfo, strict: bool) -> Result<Self> {
        if info.doctype() != Some(DocumentType::Packager) {
            return Err(Error::Validation(format!(
                "Expected a {PACKAGER_DOCUMENT} document"
            )));
        }
        Self::parse_yaml(&mut info.data_parser()?, strict)
    }

    /// Read a single packager document from a string.
    pub fn read_string(yaml: &str, options: ReadOptions) -> Result<Self> {
        let mut documents = read_subdocuments(yaml)?.into_iter();
        let info = match (documents.next(), documents.next()) {
            (Some(info), None) => info.into_result()?,
            _ => {
                return Err(Error::Validation(
                    "YAML must contain exactly one packager document".into(),
                ));
            }
        };
        let packager = Self::read_yaml(&info, options.strict)?;
        packager.validate()?;
        Ok(packager)
    }

    pub fn read_file<P: AsRef<Path>>(path: P, options: ReadOptions) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|err| Error::Open(path.to_owned(), err))?;
        Self::read_string(&yaml, options)
    }

    /// Write this packager document.
    pub fn emit_yaml(&self, emitter: &mut Emitter) -> Result<()> {
        self.validate()?;
        let common = &self.common;
        emitter.start_document_with_headers(PACKAGER_DOCUMENT, PACKAGER_VERSION_LATEST)?;
        emitter.start_mapping(CollectionStyle::Block)?;
        if !common.is_autogen_module_name() {
            emitter.key_value_if_set("name", common.module_name.as_deref())?;
        }
        if let Some(stream) = common.stream_name.as_deref().filter(|_| !common.is_autogen_stream_name()) {
            emitter.key_value_with_style("stream", stream, ScalarStyle::DoubleQuoted)?;
        }
        common.emit_summary(emitter)?;
        emitter.string_set_if_non_empty("license", &common.module_licenses)?;
        common.emit_xmd(emitter)?;
        if !self.build_configs.is_empty() {
            emitter.scalar("configurations", ScalarStyle::Any)?;
            emitter.start_sequence(CollectionStyle::Block)?;
            for config in self.build_configs.values() {
                config.emit_yaml(emitter)?;
            }
            emitter.end_sequence()?;
        }
        common.emit_body_with(emitter, true)?;
        emitter.end_mapping()?;
        emitter.end_document_with_headers()
    }

    /// The defaults implied by the profiles marked as default, if any.
    ///
    /// Nothing is implied unless both the module and stream are named.
    pub fn to_defaults(&self) -> Option<Defaults> {
        let (Some(module), Some(stream)) = (
            self.common.module_name.as_deref().filter(|_| !self.common.is_autogen_module_name()),
            self.common.stream_name.as_deref().filter(|_| !self.common.is_autogen_stream_name()),
        ) else {
            return None;
        };
        let mut defaults = Defaults::new(module);
        for profile in self.common.profiles.values().filter(|p| p.is_default) {
            defaults.add_default_profile_for_stream(stream, profile.name.clone());
        }
        (!defaults.profile_defaults.is_empty()).then_some(defaults)
    }

    /// One v3 stream for every build configuration, collected as a
    /// module together with any implied defaults.
    ///
    /// A packager without a module or stream name is given generated ones.
    pub fn to_module(&self) -> Result<Module> {
        self.to_module_numbered(1)
    }

    /// Like [`Self::to_module`], with `n` distinguishing generated names.
    pub(crate) fn to_module_numbered(&self, n: usize) -> Result<Module> {
        self.validate()?;
        if self.build_configs.is_empty() {
            return Err(Error::Validation(
                "Packager document has no build configurations to convert".into(),
            ));
        }
        let mut common = self.common.clone();
        common.set_autogen_module_name(n);
        common.set_autogen_stream_name(n);
        for profile in common.profiles.values_mut() {
            profile.is_default = false;
        }

        let mut module = Module::new(common.module_name.clone().unwrap_or_default());
        for config in self.build_configs.values() {
            let mut stream = ModuleStreamV3 {
                common: common.clone(),
                platform: Some(config.platform.clone()),
                buildtime_requires: config.buildtime_requires.clone(),
                runtime_requires: config.runtime_requires.clone(),
                ..Default::default()
            };
            stream.common.context = Some(config.context.clone());
            stream.common.buildopts = config.buildopts.clone();
            stream
                .validate()
                .map_err(|err| Error::wrap(format!("Build configuration {}", config.context), err))?;
            module.add_stream(stream.into(), ModuleStreamV3::MDVERSION)?;
        }
        if let Some(defaults) = self.to_defaults() {
            module.set_defaults(defaults);
        }
        Ok(module)
    }

    /// Like [`Self::to_module`], as a complete index.
    pub fn to_module_index(&self) -> Result<ModuleIndex> {
        let module = self.to_module()?;
        let mut index = ModuleIndex::new();
        for stream in module.streams() {
            index.add_module_stream(stream.clone())?;
        }
        if let Some(defaults) = module.defaults() {
            index.add_defaults(defaults.clone())?;
        }
        Ok(index)
    }
}

