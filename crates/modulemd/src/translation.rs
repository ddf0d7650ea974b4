// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use std::collections::BTreeMap;

use crate::yaml::{CollectionStyle, Emitter, ScalarStyle, YamlParser};
use crate::{Error, Result};

#[cfg(test)]
#[path = "./translation_test.rs"]
mod translation_test;

pub const TRANSLATION_DOCUMENT: &str = "modulemd-translations";
pub const TRANSLATION_VERSION_LATEST: u64 = 1;

/// The localized strings of one stream for one locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TranslationEntry {
    pub locale: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub profile_descriptions: BTreeMap<String, String>,
}

impl TranslationEntry {
    pub fn new<S: Into<String>>(locale: S) -> Self {
        Self {
            locale: locale.into(),
            ..Default::default()
        }
    }

    pub fn parse_yaml(parser: &mut YamlParser, locale: &str, strict: bool) -> Result<Self> {
        let mut entry = TranslationEntry::new(locale);
        parser.expect_mapping_start("translation entry")?;
        while let Some(key) = parser.next_key()? {
            match key.as_str() {
                "summary" => entry.summary = Some(parser.parse_string()?),
                "description" => entry.description = Some(parser.parse_string()?),
                "profiles" => {
                    entry.profile_descriptions = parser.parse_string_map("translated profiles")?
                }
                _ => parser.skip_unknown(strict, &key, "translation entry")?,
            }
        }
        Ok(entry)
    }

    pub fn emit_yaml(&self, emitter: &mut Emitter) -> Result<()> {
        emitter.scalar(&self.locale, ScalarStyle::Any)?;
        emitter.start_mapping(CollectionStyle::Block)?;
        emitter.key_value_if_set("summary", self.summary.as_deref())?;
        emitter.key_value_if_set("description", self.description.as_deref())?;
        if !self.profile_descriptions.is_empty() {
            emitter.scalar("profiles", ScalarStyle::Any)?;
            emitter.start_mapping(CollectionStyle::Block)?;
            for (profile, description) in &self.profile_descriptions {
                emitter.key_value(profile, description)?;
            }
            emitter.end_mapping()?;
        }
        emitter.end_mapping()
    }
}

/// The translations of one module stream, keyed by locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Translation {
    pub module_name: String,
    pub module_stream: String,
    /// A `YYYYMMDDHHMM` timestamp; the newer translation wins when two meet.
    pub modified: u64,
    pub entries: BTreeMap<String, TranslationEntry>,
}

impl Translation {
    pub fn new<M: Into<String>, S: Into<String>>(module_name: M, module_stream: S, modified: u64) -> Self {
        Self {
            module_name: module_name.into(),
            module_stream: module_stream.into(),
            modified,
            entries: BTreeMap::new(),
        }
    }

    pub fn set_entry(&mut self, entry: TranslationEntry) {
        self.entries.insert(entry.locale.clone(), entry);
    }

    pub fn entry(&self, locale: &str) -> Option<&TranslationEntry> {
        self.entries.get(locale)
    }

    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn validate(&self) -> Result<()> {
        if self.module_name.is_empty() {
            return Err(Error::Validation("Translation is missing a module name".into()));
        }
        if self.module_stream.is_empty() {
            return Err(Error::Validation(format!(
                "Translation of {} is missing a module stream",
                self.module_name
            )));
        }
        if self.modified == 0 {
            return Err(Error::Validation(format!(
                "Translation of {}:{} is missing its modified timestamp",
                self.module_name, self.module_stream
            )));
        }
        Ok(())
    }

    /// Parse the `data` mapping of a translations document.
    pub fn parse_yaml(parser: &mut YamlParser, strict: bool) -> Result<Self> {
        let mut translation = Translation::default();
        parser.expect_mapping_start("translations")?;
        while let Some(key) = parser.next_key()? {
            match key.as_str() {
                "module" => translation.module_name = parser.parse_string()?,
                "stream" => translation.module_stream = parser.parse_string()?,
                "modified" => translation.modified = parser.parse_uint64()?,
                "translations" => {
                    parser.expect_mapping_start("translations")?;
                    while let Some(locale) = parser.next_key()? {
                        let entry = TranslationEntry::parse_yaml(parser, &locale, strict)?;
                        translation.set_entry(entry);
                    }
                }
                _ => parser.skip_unknown(strict, &key, "translations")?,
            }
        }
        translation.validate()?;
        Ok(translation)
    }

    /// Emit a complete translations document.
    pub fn emit_yaml(&self, emitter: &mut Emitter) -> Result<()> {
        self.validate()?;
        emitter.start_document_with_headers(TRANSLATION_DOCUMENT, TRANSLATION_VERSION_LATEST)?;
        emitter.start_mapping(CollectionStyle::Block)?;
        emitter.key_value("module", &self.module_name)?;
        emitter.key_value_with_style("stream", &self.module_stream, ScalarStyle::DoubleQuoted)?;
        emitter.key_uint("modified", self.modified)?;
        if !self.entries.is_empty() {
            emitter.scalar("translations", ScalarStyle::Any)?;
            emitter.start_mapping(CollectionStyle::Block)?;
            for entry in self.entries.values() {
                entry.emit_yaml(emitter)?;
            }
            emitter.end_mapping()?;
        }
        emitter.end_mapping()?;
        emitter.end_document_with_headers()
    }
}
