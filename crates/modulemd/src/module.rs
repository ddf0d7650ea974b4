// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use std::collections::BTreeMap;

use crate::defaults::Defaults;
use crate::stream::ModuleStream;
use crate::translation::{Translation, TranslationEntry};
use crate::{Error, Result};

#[cfg(test)]
#[path = "./module_test.rs"]
mod module_test;

/// Every stream, the defaults and the translations known for one module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Module {
    module_name: String,
    streams: Vec<ModuleStream>,
    defaults: Option<Defaults>,
    translations: BTreeMap<String, Translation>,
}

impl Module {
    pub fn new<S: Into<String>>(module_name: S) -> Self {
        Self {
            module_name: module_name.into(),
            ..Default::default()
        }
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn validate(&self) -> Result<()> {
        for stream in &self.streams {
            stream.validate().map_err(|err| {
                Error::wrap(
                    stream.nsvca_as_string().unwrap_or_else(|| self.module_name.clone()),
                    err,
                )
            })?;
        }
        if let Some(defaults) = &self.defaults {
            defaults.validate()?;
        }
        for translation in self.translations.values() {
            translation.validate()?;
        }
        Ok(())
    }

    pub fn defaults(&self) -> Option<&Defaults> {
        self.defaults.as_ref()
    }

    /// Replace the defaults of this module.
    ///
    /// Defaults that belong to another module are ignored.
    pub fn set_defaults(&mut self, defaults: Defaults) {
        if defaults.module_name() != self.module_name {
            tracing::warn!(
                "ignoring defaults for module {:?} given to module {:?}",
                defaults.module_name(),
                self.module_name
            );
            return;
        }
        self.defaults = Some(defaults);
    }

    pub fn clear_defaults(&mut self) {
        self.defaults = None;
    }

    /// Add a stream, replacing any with the same stream name, version and
    /// context.
    ///
    /// Streams older than `index_mdversion` are upgraded to it first.
    /// Returns the mdversion of the stream that was stored.
    pub fn add_stream(&mut self, stream: ModuleStream, index_mdversion: u64) -> Result<u64> {
        let Some(module_name) = stream.module_name() else {
            return Err(Error::Validation(format!(
                "Attempted to add stream with no module name to module '{}'",
                self.module_name
            )));
        };
        if module_name != self.module_name {
            return Err(Error::Validation(format!(
                "Attempted to add stream for module '{module_name}' to module '{}'",
                self.module_name
            )));
        }
        if stream.stream_name().is_none() {
            return Err(Error::Validation(format!(
                "Attempted to add stream with no stream name to module '{}'",
                self.module_name
            )));
        }

        let stream = if stream.mdversion() < index_mdversion {
            stream.upgrade(index_mdversion)?
        } else {
            stream
        };
        self.streams.retain(|s| {
            !(s.stream_name() == stream.stream_name()
                && s.version() == stream.version()
                && s.context() == stream.context())
        });
        let mdversion = stream.mdversion();
        self.streams.push(stream);
        Ok(mdversion)
    }

    pub fn streams(&self) -> &[ModuleStream] {
        &self.streams
    }

    /// The distinct stream names of this module, sorted.
    pub fn stream_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.streams.iter().filter_map(ModuleStream::stream_name).collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// The first stream that matches exactly.
    pub fn get_stream_by_nsvc(
        &self,
        stream_name: &str,
        version: u64,
        context: Option<&str>,
    ) -> Option<&ModuleStream> {
        self.streams.iter().find(|s| {
            s.stream_name() == Some(stream_name) && s.version() == version && s.context() == context
        })
    }

    /// Every stream with the given name, newest version first.
    pub fn get_streams_by_stream_name_as_list(&self, stream_name: &str) -> Vec<&ModuleStream> {
        self.search_streams(Some(stream_name), 0, None, None)
    }

    /// Streams matching every given field, where a version of 0 or a
    /// field of `None` matches anything. The text fields are globs.
    pub fn search_streams(
        &self,
        stream_name: Option<&str>,
        version: u64,
        context: Option<&str>,
        arch: Option<&str>,
    ) -> Vec<&ModuleStream> {
        let version = (version != 0).then(|| version.to_string());
        self.search_streams_by_glob(stream_name, version.as_deref(), context, arch)
    }

    /// Like [`Self::search_streams`], with the version as a glob as well.
    pub fn search_streams_by_glob(
        &self,
        stream_name: Option<&str>,
        version: Option<&str>,
        context: Option<&str>,
        arch: Option<&str>,
    ) -> Vec<&ModuleStream> {
        let mut found: Vec<&ModuleStream> = self
            .streams
            .iter()
            .filter(|s| {
                fnmatch(stream_name, s.stream_name())
                    && fnmatch(version, Some(&s.version().to_string()))
                    && fnmatch(context, s.context())
                    && fnmatch(arch, s.arch())
            })
            .collect();
        found.sort_by(|a, b| {
            a.stream_name()
                .cmp(&b.stream_name())
                .then_with(|| b.version().cmp(&a.version()))
                .then_with(|| a.context().cmp(&b.context()))
                .then_with(|| a.arch().cmp(&b.arch()))
        });
        found
    }

    /// Streams whose `N:S:V:C:A` string matches a glob.
    pub fn search_streams_by_nsvca_glob(&self, pattern: Option<&str>) -> Vec<&ModuleStream> {
        self.streams
            .iter()
            .filter(|s| fnmatch(pattern, s.nsvca_as_string().as_deref()))
            .collect()
    }

    /// Drop every stream with the given name.
    pub fn remove_streams_by_name(&mut self, stream_name: &str) {
        self.remove_streams_by_nsvca(stream_name, 0, None, None);
    }

    /// Drop every stream matching the given fields, where a version of 0
    /// or a field of `None` matches anything.
    pub fn remove_streams_by_nsvca(
        &mut self,
        stream_name: &str,
        version: u64,
        context: Option<&str>,
        arch: Option<&str>,
    ) {
        self.streams.retain(|s| {
            let matches = s.stream_name() == Some(stream_name)
                && (version == 0 || s.version() == version)
                && context.is_none_or(|c| s.context() == Some(c))
                && arch.is_none_or(|a| s.arch() == Some(a));
            !matches
        });
    }

    /// Upgrade every stream to the given mdversion, expanding a stream
    /// into several when its dependencies require it.
    pub fn upgrade_streams(&mut self, mdversion: u64) -> Result<()> {
        let mut upgraded = Vec::with_capacity(self.streams.len());
        for stream in &self.streams {
            if stream.mdversion() == mdversion {
                upgraded.push(stream.clone());
                continue;
            }
            let expanded = stream.upgrade_ext(mdversion).map_err(|err| {
                Error::wrap(
                    format!(
                        "Error upgrading module stream {}",
                        stream.nsvca_as_string().unwrap_or_default()
                    ),
                    err,
                )
            })?;
            upgraded.extend(expanded.streams);
        }
        self.streams = upgraded;
        Ok(())
    }

    pub fn upgrade_defaults(&mut self, mdversion: u64) -> Result<()> {
        if let Some(defaults) = &self.defaults {
            self.defaults = Some(defaults.upgrade(mdversion)?);
        }
        Ok(())
    }

    /// Keep the translations of one stream, unless newer ones are
    /// already known.
    ///
    /// Translations of another module are ignored.
    pub fn add_translation(&mut self, translation: Translation) {
        if translation.module_name != self.module_name {
            tracing::debug!(
                "ignoring translation for module {:?} given to module {:?}",
                translation.module_name,
                self.module_name
            );
            return;
        }
        match self.translations.get(&translation.module_stream) {
            Some(existing) if existing.modified > translation.modified => {}
            _ => {
                self.translations
                    .insert(translation.module_stream.clone(), translation);
            }
        }
    }

    pub fn translation(&self, stream_name: &str) -> Option<&Translation> {
        self.translations.get(stream_name)
    }

    pub fn translations(&self) -> impl Iterator<Item = &Translation> {
        self.translations.values()
    }

    /// The stream names that have translations, sorted.
    pub fn translated_streams(&self) -> impl Iterator<Item = &str> {
        self.translations.keys().map(String::as_str)
    }

    fn translation_entry(&self, stream: &ModuleStream, locale: &str) -> Option<&TranslationEntry> {
        self.translation(stream.stream_name()?)?.entry(locale)
    }

    /// The summary of a stream in the given locale, falling back to the
    /// untranslated one.
    pub fn localized_summary<'a>(&'a self, stream: &'a ModuleStream, locale: &str) -> Option<&'a str> {
        self.translation_entry(stream, locale)
            .and_then(|e| e.summary.as_deref())
            .or(stream.common().summary.as_deref())
    }

    pub fn localized_description<'a>(
        &'a self,
        stream: &'a ModuleStream,
        locale: &str,
    ) -> Option<&'a str> {
        self.translation_entry(stream, locale)
            .and_then(|e| e.description.as_deref())
            .or(stream.common().description.as_deref())
    }

    pub fn localized_profile_description<'a>(
        &'a self,
        stream: &'a ModuleStream,
        profile: &str,
        locale: &str,
    ) -> Option<&'a str> {
        self.translation_entry(stream, locale)
            .and_then(|e| e.profile_descriptions.get(profile))
            .map(String::as_str)
            .or_else(|| stream.common().profiles.get(profile)?.description.as_deref())
    }
}

/// Shell-style matching where a missing pattern matches anything and a
/// missing value matches nothing.
fn fnmatch(pattern: Option<&str>, value: Option<&str>) -> bool {
    match (pattern, value) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(pattern), Some(value)) => glob::Pattern::new(pattern)
            .map(|p| p.matches(value))
            .unwrap_or(pattern == value),
    }
}
