// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use std::collections::BTreeMap;
use std::path::Path;

use crate::defaults::{DEFAULTS_VERSION_LATEST, Defaults};
use crate::module::Module;
use crate::options::ReadOptions;
use crate::packager::PackagerV3;
use crate::stream::{MODULESTREAM_VERSION_LATEST, ModuleStream};
use crate::subdocument::{DocumentType, SubdocumentInfo, read_subdocuments};
use crate::translation::Translation;
use crate::yaml::Emitter;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./index_test.rs"]
mod index_test;

/// Every module known from one or more documents.
///
/// All streams held by an index share one schema version, and so do
/// all defaults. Adding a newer document upgrades everything already
/// held to match, while older documents are upgraded as they are added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleIndex {
    modules: BTreeMap<String, Module>,
    stream_mdversion: u64,
    defaults_mdversion: u64,
}

/// Read every document of a YAML file into a new index.
///
/// The first document that cannot be read is returned as the error.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<ModuleIndex> {
    let mut index = ModuleIndex::new();
    let failures = index.update_from_file(path, ReadOptions::default())?;
    first_failure(failures)?;
    Ok(index)
}

/// Read every document of a YAML string into a new index.
///
/// The first document that cannot be read is returned as the error.
pub fn load_string(yaml: &str) -> Result<ModuleIndex> {
    let mut index = ModuleIndex::new();
    let failures = index.update_from_string(yaml, ReadOptions::default())?;
    first_failure(failures)?;
    Ok(index)
}

/// Write every document of an index to a YAML string.
pub fn dump_to_string(index: &ModuleIndex) -> Result<String> {
    index.dump_to_string()
}

fn first_failure(failures: Vec<SubdocumentInfo>) -> Result<()> {
    match failures.into_iter().find_map(SubdocumentInfo::into_error) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

impl ModuleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// The schema version shared by every stream, or 0 before the
    /// first stream is added.
    pub fn stream_mdversion(&self) -> u64 {
        self.stream_mdversion
    }

    /// The schema version shared by every defaults document, or 0
    /// before the first one is added.
    pub fn defaults_mdversion(&self) -> u64 {
        self.defaults_mdversion
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn get_module(&self, module_name: &str) -> Option<&Module> {
        self.modules.get(module_name)
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    /// The names of every module, sorted.
    pub fn module_names(&self) -> Vec<&str> {
        self.modules.keys().map(String::as_str).collect()
    }

    pub fn remove_module(&mut self, module_name: &str) -> bool {
        self.modules.remove(module_name).is_some()
    }

    fn get_or_create_module(&mut self, module_name: &str) -> &mut Module {
        self.modules
            .entry(module_name.to_string())
            .or_insert_with(|| Module::new(module_name))
    }

    /// Read every document of a YAML string into this index.
    ///
    /// Documents that cannot be read are skipped and returned with their
    /// error set; only text that is not YAML at all fails outright.
    pub fn update_from_string(&mut self, yaml: &str, options: ReadOptions) -> Result<Vec<SubdocumentInfo>> {
        let mut failures = Vec::new();
        for mut info in read_subdocuments(yaml)? {
            if info.error().is_some() {
                failures.push(info);
                continue;
            }
            if let Err(err) = self.add_subdocument(&info, options) {
                tracing::warn!("skipping subdocument: {err}");
                info.set_error(err);
                failures.push(info);
            }
        }
        Ok(failures)
    }

    pub fn update_from_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        options: ReadOptions,
    ) -> Result<Vec<SubdocumentInfo>> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|err| Error::Open(path.to_owned(), err))?;
        self.update_from_string(&yaml, options)
    }

    fn add_subdocument(&mut self, info: &SubdocumentInfo, options: ReadOptions) -> Result<()> {
        let Some(doctype) = info.doctype() else {
            return Err(Error::Validation("Invalid doctype encountered".into()));
        };
        match doctype {
            DocumentType::Modulemd => {
                let mut stream = ModuleStream::read_yaml(info, options.strict)?;
                if options.autogen_module_name {
                    let n = self.modules.len() + 1;
                    let common = stream.common_mut();
                    common.set_autogen_module_name(n);
                    common.set_autogen_stream_name(n);
                }
                stream.validate()?;
                self.add_module_stream(stream)
            }
            DocumentType::Packager => {
                let packager = PackagerV3::read_yaml(info, options.strict)?;
                let module = packager.to_module_numbered(self.modules.len() + 1)?;
                for stream in module.streams() {
                    self.add_module_stream(stream.clone())?;
                }
                if let Some(defaults) = module.defaults() {
                    self.add_defaults(defaults.clone())?;
                }
                Ok(())
            }
            DocumentType::Defaults => {
                let defaults = Defaults::read_yaml(info, options.strict)?;
                defaults.validate()?;
                self.add_defaults(defaults)
            }
            DocumentType::Translations => {
                let translation = Translation::parse_yaml(&mut info.data_parser()?, options.strict)?;
                self.add_translation(translation)
            }
        }
    }

    /// Add a stream to the module it names.
    ///
    /// A stream newer than the others in the index upgrades all of them
    /// to its schema version first, and an older one is upgraded to
    /// match them.
    pub fn add_module_stream(&mut self, stream: ModuleStream) -> Result<()> {
        let (Some(module_name), Some(_)) = (stream.module_name(), stream.stream_name()) else {
            return Err(Error::Validation(
                "The module and stream names are required when adding to ModuleIndex.".into(),
            ));
        };
        let module_name = module_name.to_string();
        if stream.mdversion() > self.stream_mdversion {
            tracing::debug!("Upgrading all streams to version {}", stream.mdversion());
            self.upgrade_streams(stream.mdversion())?;
        }
        let index_mdversion = self.stream_mdversion;
        match self.modules.get_mut(&module_name) {
            Some(module) => {
                module.add_stream(stream, index_mdversion)?;
            }
            None => {
                let mut module = Module::new(module_name.as_str());
                module.add_stream(stream, index_mdversion)?;
                self.modules.insert(module_name, module);
            }
        }
        Ok(())
    }

    /// Upgrade every stream to the given schema version, where 0 means
    /// the latest one.
    pub fn upgrade_streams(&mut self, mdversion: u64) -> Result<()> {
        let mdversion = match mdversion {
            0 => MODULESTREAM_VERSION_LATEST,
            v => v,
        };
        if mdversion < self.stream_mdversion {
            return Err(Error::Upgrade(format!(
                "Downgrades not permitted. mdversion {mdversion} < current {}",
                self.stream_mdversion
            )));
        }
        // nothing is changed unless every module upgrades
        let mut upgraded = self.modules.clone();
        for module in upgraded.values_mut() {
            if module.streams().is_empty() {
                continue;
            }
            module.upgrade_streams(mdversion).map_err(|err| {
                Error::wrap(
                    format!("Error upgrading streams for module {}", module.module_name()),
                    err,
                )
            })?;
        }
        self.modules = upgraded;
        self.stream_mdversion = mdversion;
        Ok(())
    }

    /// Set the defaults of the module they name, replacing any others.
    pub fn add_defaults(&mut self, defaults: Defaults) -> Result<()> {
        let defaults = if defaults.mdversion() < self.defaults_mdversion {
            defaults.upgrade(self.defaults_mdversion)?
        } else {
            defaults
        };
        let mdversion = defaults.mdversion();
        let module_name = defaults.module_name().to_string();
        self.get_or_create_module(&module_name).set_defaults(defaults);
        if mdversion > self.defaults_mdversion {
            tracing::debug!("Upgrading all defaults to version {mdversion}");
            self.upgrade_defaults(mdversion)?;
        }
        Ok(())
    }

    /// Upgrade every defaults document to the given schema version,
    /// where 0 means the latest one.
    pub fn upgrade_defaults(&mut self, mdversion: u64) -> Result<()> {
        let mdversion = match mdversion {
            0 => DEFAULTS_VERSION_LATEST,
            v => v,
        };
        if mdversion < self.defaults_mdversion {
            return Err(Error::Upgrade(format!(
                "Downgrades not permitted. mdversion {mdversion} < current {}",
                self.defaults_mdversion
            )));
        }
        if mdversion > DEFAULTS_VERSION_LATEST {
            return Err(Error::Upgrade(format!(
                "Unknown Defaults metadata version {mdversion}"
            )));
        }
        for module in self.modules.values_mut() {
            module
                .upgrade_defaults(mdversion)
                .map_err(|err| Error::wrap("Error upgrading previously-added defaults", err))?;
        }
        self.defaults_mdversion = mdversion;
        Ok(())
    }

    pub fn add_translation(&mut self, translation: Translation) -> Result<()> {
        translation.validate()?;
        let module_name = translation.module_name.clone();
        self.get_or_create_module(&module_name).add_translation(translation);
        Ok(())
    }

    /// Every stream whose `N:S:V:C:A` string matches the glob, or every
    /// stream when no pattern is given.
    pub fn search_streams_by_glob(&self, nsvca_pattern: Option<&str>) -> Vec<&ModuleStream> {
        self.modules
            .values()
            .flat_map(|m| m.search_streams_by_nsvca_glob(nsvca_pattern))
            .collect()
    }

    /// The default stream of every module that has one for the given
    /// intent, keyed by module name.
    pub fn default_streams(&self, intent: Option<&str>) -> BTreeMap<String, String> {
        self.modules
            .iter()
            .filter_map(|(name, module)| {
                let stream = module.defaults()?.default_stream_for(intent)?;
                Some((name.clone(), stream.to_string()))
            })
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        for module in self.modules.values() {
            module.validate()?;
        }
        Ok(())
    }

    /// Fold another index into this one.
    ///
    /// Streams from `from` replace any with the same stream name, version
    /// and context. With `override_defaults` the defaults from `from`
    /// replace these ones, otherwise both are merged. Translations are
    /// only taken when they are newer.
    pub fn merge(&mut self, from: &ModuleIndex, override_defaults: bool, strict_default_streams: bool) -> Result<()> {
        for (module_name, module) in &from.modules {
            tracing::debug!("Merging module {module_name}");
            self.get_or_create_module(module_name);

            for stream in module.streams() {
                if let Err(err) = self.add_module_stream(stream.clone()) {
                    tracing::info!(
                        "Could not add stream {} due to {err}",
                        stream.nsvca_as_string().unwrap_or_default()
                    );
                }
            }

            if let Some(defaults) = module.defaults() {
                let existing = self.modules.get(module_name).and_then(Module::defaults);
                let defaults = match existing {
                    Some(existing) if !override_defaults => {
                        Defaults::merge(defaults, existing, strict_default_streams)?
                    }
                    _ => defaults.clone(),
                };
                self.add_defaults(defaults)?;
            }

            for translation in module.translations() {
                let current = self
                    .modules
                    .get(module_name)
                    .and_then(|m| m.translation(&translation.module_stream));
                if current.is_none_or(|c| translation.modified > c.modified) {
                    self.add_translation(translation.clone())?;
                }
            }
            tracing::debug!("All documents merged for {module_name}");
        }
        Ok(())
    }

    /// Write every document of this index, module by module.
    ///
    /// Each module is written as its defaults, then its translations,
    /// then its streams in `N:S:V:C:A` order.
    pub fn dump_to_emitter(&self, emitter: &mut Emitter) -> Result<()> {
        if self.modules.is_empty() {
            return Err(Error::Validation("Index contains no modules.".into()));
        }
        for module in self.modules.values() {
            if let Some(defaults) = module.defaults() {
                defaults.emit_yaml(emitter)?;
            }
            for translation in module.translations() {
                translation.emit_yaml(emitter)?;
            }
            let mut streams: Vec<(String, &ModuleStream)> = module
                .streams()
                .iter()
                .map(|s| (s.nsvca_as_string().unwrap_or_default(), s))
                .collect();
            streams.sort_by(|a, b| a.0.cmp(&b.0));
            for (_, stream) in streams {
                stream
                    .validate()
                    .map_err(|err| Error::wrap("Could not validate stream to emit", err))?;
                stream.emit_yaml(emitter)?;
            }
        }
        Ok(())
    }

    pub fn dump_to_string(&self) -> Result<String> {
        let mut emitter = Emitter::new();
        emitter.start_stream()?;
        self.dump_to_emitter(&mut emitter)?;
        emitter.end_stream()?;
        emitter.finish()
    }

    pub fn dump_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let yaml = self.dump_to_string()?;
        std::fs::write(path, yaml).map_err(|err| Error::Open(path.to_owned(), err))
    }
}
