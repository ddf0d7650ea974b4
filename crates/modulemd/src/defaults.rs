// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::options::ReadOptions;
use crate::subdocument::{DocumentType, SubdocumentInfo, read_subdocuments};
use crate::yaml::{CollectionStyle, Emitter, ScalarStyle, YamlParser};
use crate::{Error, Result};

#[cfg(test)]
#[path = "./defaults_test.rs"]
mod defaults_test;

pub const DEFAULTS_DOCUMENT: &str = "modulemd-defaults";
pub const DEFAULTS_VERSION_LATEST: u64 = 1;

/// Default profiles, keyed by stream name.
pub type ProfileDefaults = BTreeMap<String, BTreeSet<String>>;

/// An alternate set of defaults for a named consumer, such as `server`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Intent {
    pub name: String,
    pub default_stream: Option<String>,
    pub profile_defaults: ProfileDefaults,
    stream_conflict: bool,
}

impl Intent {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// True when merging left this intent without a default stream
    /// because the merged defaults disagreed.
    pub fn has_stream_conflict(&self) -> bool {
        self.stream_conflict
    }

    fn parse_yaml(parser: &mut YamlParser, name: &str, strict: bool) -> Result<Self> {
        let mut intent = Intent::new(name);
        parser.expect_mapping_start("intent")?;
        while let Some(key) = parser.next_key()? {
            match key.as_str() {
                "stream" => intent.default_stream = Some(parser.parse_string()?),
                "profiles" => intent.profile_defaults = parse_profile_defaults(parser)?,
                _ => parser.skip_unknown(strict, &key, "intent")?,
            }
        }
        Ok(intent)
    }

    fn emit_yaml(&self, emitter: &mut Emitter) -> Result<()> {
        emitter.scalar(&self.name, ScalarStyle::Any)?;
        emitter.start_mapping(CollectionStyle::Block)?;
        if let Some(stream) = &self.default_stream {
            emitter.key_value_with_style("stream", stream, ScalarStyle::DoubleQuoted)?;
        }
        emit_profile_defaults(emitter, &self.profile_defaults)?;
        emitter.end_mapping()
    }
}

/// The stream and profiles of a module that are used when a user does
/// not ask for specific ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Defaults {
    module_name: String,
    /// A `YYYYMMDDHHMM` timestamp; the newer defaults win a merge.
    pub modified: u64,
    pub default_stream: Option<String>,
    pub profile_defaults: ProfileDefaults,
    pub intents: BTreeMap<String, Intent>,
    /// Set by a merge that found two default streams of the same age.
    /// Never written out, and kept by later merges of the same age.
    stream_conflict: bool,
}

impl Defaults {
    pub fn new<S: Into<String>>(module_name: S) -> Self {
        Self {
            module_name: module_name.into(),
            ..Default::default()
        }
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn mdversion(&self) -> u64 {
        DEFAULTS_VERSION_LATEST
    }

    /// True when merging left these defaults without a default stream
    /// because the merged defaults disagreed.
    pub fn has_stream_conflict(&self) -> bool {
        self.stream_conflict
    }

    pub fn add_default_profile_for_stream<S: Into<String>, P: Into<String>>(
        &mut self,
        stream: S,
        profile: P,
    ) {
        self.profile_defaults
            .entry(stream.into())
            .or_default()
            .insert(profile.into());
    }

    /// Declare that the stream has no default profiles, as opposed to
    /// not saying anything about it.
    pub fn set_empty_default_profiles_for_stream<S: Into<String>>(&mut self, stream: S) {
        self.profile_defaults.insert(stream.into(), BTreeSet::new());
    }

    pub fn add_intent(&mut self, intent: Intent) {
        self.intents.insert(intent.name.clone(), intent);
    }

    /// The default stream for an intent, falling back to the general one.
    pub fn default_stream_for(&self, intent: Option<&str>) -> Option<&str> {
        intent
            .and_then(|i| self.intents.get(i))
            .and_then(|i| i.default_stream.as_deref())
            .or(self.default_stream.as_deref())
    }

    /// The default profiles of a stream for an intent, falling back to the
    /// general ones.
    pub fn default_profiles_for(&self, stream: &str, intent: Option<&str>) -> Option<&BTreeSet<String>> {
        intent
            .and_then(|i| self.intents.get(i))
            .and_then(|i| i.profile_defaults.get(stream))
            .or_else(|| self.profile_defaults.get(stream))
    }

    pub fn validate(&self) -> Result<()> {
        if self.module_name.is_empty() {
            return Err(Error::Validation("Defaults are missing a module name".into()));
        }
        Ok(())
    }

    /// Upgrade to a newer schema version, where 0 means the latest one.
    pub fn upgrade(&self, mdversion: u64) -> Result<Defaults> {
        match mdversion {
            0 | DEFAULTS_VERSION_LATEST => Ok(self.clone()),
            _ => Err(Error::Upgrade(format!("Unknown defaults mdversion {mdversion}"))),
        }
    }

    /// Parse the `data` mapping of a defaults document.
    pub fn parse_yaml(parser: &mut YamlParser, strict: bool) -> Result<Self> {
        let mut defaults = Defaults::default();
        parser.expect_mapping_start("defaults")?;
        while let Some(key) = parser.next_key()? {
            match key.as_str() {
                "module" => defaults.module_name = parser.parse_string()?,
                "modified" => defaults.modified = parser.parse_uint64()?,
                "stream" => defaults.default_stream = Some(parser.parse_string()?),
                "profiles" => defaults.profile_defaults = parse_profile_defaults(parser)?,
                "intents" => {
                    parser.expect_mapping_start("intents")?;
                    while let Some(name) = parser.next_key()? {
                        let intent = Intent::parse_yaml(parser, &name, strict)?;
                        defaults.add_intent(intent);
                    }
                }
                _ => parser.skip_unknown(strict, &key, "defaults")?,
            }
        }
        if defaults.module_name.is_empty() {
            return Err(parser.error("Defaults are missing a module name"));
        }
        Ok(defaults)
    }

    pub fn read_yaml(info: &SubdocumentInfo, strict: bool) -> Result<Self> {
        if info.doctype() != Some(DocumentType::Defaults) {
            return Err(Error::Validation(format!(
                "Expected a {DEFAULTS_DOCUMENT} document"
            )));
        }
        Self::parse_yaml(&mut info.data_parser()?, strict)
    }

    /// Read a single defaults document from a string.
    pub fn read_string(yaml: &str, options: ReadOptions) -> Result<Self> {
        let mut documents = read_subdocuments(yaml)?.into_iter();
        let info = match (documents.next(), documents.next()) {
            (Some(info), None) => info.into_result()?,
            _ => {
                return Err(Error::Validation(
                    "YAML must contain exactly one defaults document".into(),
                ));
            }
        };
        let defaults = Self::read_yaml(&info, options.strict)?;
        defaults.validate()?;
        Ok(defaults)
    }

    pub fn read_file<P: AsRef<Path>>(path: P, options: ReadOptions) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|err| Error::Open(path.to_owned(), err))?;
        Self::read_string(&yaml, options)
    }

    /// Write these defaults as a complete document.
    pub fn emit_yaml(&self, emitter: &mut Emitter) -> Result<()> {
        self.validate()?;
        emitter.start_document_with_headers(DEFAULTS_DOCUMENT, self.mdversion())?;
        emitter.start_mapping(CollectionStyle::Block)?;
        emitter.key_value("module", &self.module_name)?;
        if self.modified != 0 {
            emitter.key_uint("modified", self.modified)?;
        }
        if let Some(stream) = &self.default_stream {
            emitter.key_value_with_style("stream", stream, ScalarStyle::DoubleQuoted)?;
        }
        emit_profile_defaults(emitter, &self.profile_defaults)?;
        if !self.intents.is_empty() {
            emitter.scalar("intents", ScalarStyle::Any)?;
            emitter.start_mapping(CollectionStyle::Block)?;
            for intent in self.intents.values() {
                intent.emit_yaml(emitter)?;
            }
            emitter.end_mapping()?;
        }
        emitter.end_mapping()?;
        emitter.end_document_with_headers()
    }

    /// Combine two sets of defaults for the same module.
    ///
    /// The newer of the two wins outright. When both were modified at the
    /// same time their contents are combined; conflicting default streams
    /// are an error when `strict_default_streams` is set and otherwise
    /// leave the stream unset. Such a conflict is remembered, so merging
    /// in a third set of the same age cannot set the stream again.
    pub fn merge(from: &Defaults, into: &Defaults, strict_default_streams: bool) -> Result<Defaults> {
        match from.modified.cmp(&into.modified) {
            std::cmp::Ordering::Greater => return Ok(from.clone()),
            std::cmp::Ordering::Less => return Ok(into.clone()),
            std::cmp::Ordering::Equal => {}
        }
        if from.module_name != into.module_name {
            return Err(Error::Validation(format!(
                "Module name mismatch in merge: {} != {}",
                from.module_name, into.module_name
            )));
        }

        let mut merged = into.clone();
        let place = format!("module {}", into.module_name);
        (merged.default_stream, merged.stream_conflict) = merge_default_stream(
            &place,
            StreamChoice::of(&from.default_stream, from.stream_conflict),
            StreamChoice::of(&into.default_stream, into.stream_conflict),
            strict_default_streams,
        )?;
        merge_profile_defaults(&mut merged.profile_defaults, &from.profile_defaults);

        for (name, intent) in &from.intents {
            let Some(existing) = merged.intents.get_mut(name) else {
                merged.intents.insert(name.clone(), intent.clone());
                continue;
            };
            (existing.default_stream, existing.stream_conflict) = merge_default_stream(
                &format!("{place} intent {name}"),
                StreamChoice::of(&intent.default_stream, intent.stream_conflict),
                StreamChoice::of(&existing.default_stream, existing.stream_conflict),
                strict_default_streams,
            )?;
            merge_profile_defaults(&mut existing.profile_defaults, &intent.profile_defaults);
        }
        Ok(merged)
    }
}

/// What one side of a merge says about the default stream.
#[derive(Debug, Clone, Copy)]
enum StreamChoice<'a> {
    Unset,
    Stream(&'a str),
    Conflict,
}

impl<'a> StreamChoice<'a> {
    fn of(stream: &'a Option<String>, conflict: bool) -> Self {
        match (stream, conflict) {
            (_, true) => StreamChoice::Conflict,
            (Some(stream), false) => StreamChoice::Stream(stream),
            (None, false) => StreamChoice::Unset,
        }
    }
}

/// Merge the default streams of two defaults of the same age, returning
/// the stream and whether it is in conflict.
fn merge_default_stream(
    place: &str,
    from: StreamChoice<'_>,
    into: StreamChoice<'_>,
    strict: bool,
) -> Result<(Option<String>, bool)> {
    match (from, into) {
        (StreamChoice::Conflict, _) | (_, StreamChoice::Conflict) => Ok((None, true)),
        (StreamChoice::Stream(from), StreamChoice::Stream(into)) if from != into => {
            if strict {
                return Err(Error::Validation(format!(
                    "Default stream mismatch in {place}: {into} != {from}"
                )));
            }
            tracing::info!("Default stream mismatch in {place}: {into} != {from}, leaving it unset");
            Ok((None, true))
        }
        (_, StreamChoice::Stream(stream)) | (StreamChoice::Stream(stream), StreamChoice::Unset) => {
            Ok((Some(stream.to_string()), false))
        }
        (StreamChoice::Unset, StreamChoice::Unset) => Ok((None, false)),
    }
}

fn merge_profile_defaults(into: &mut ProfileDefaults, from: &ProfileDefaults) {
    for (stream, profiles) in from {
        into.entry(stream.clone())
            .or_default()
            .extend(profiles.iter().cloned());
    }
}

fn parse_profile_defaults(parser: &mut YamlParser) -> Result<ProfileDefaults> {
    let mut profiles = ProfileDefaults::new();
    parser.expect_mapping_start("profiles")?;
    while let Some(stream) = parser.next_key()? {
        profiles.insert(stream, parser.parse_string_set()?);
    }
    Ok(profiles)
}

fn emit_profile_defaults(emitter: &mut Emitter, profiles: &ProfileDefaults) -> Result<()> {
    if profiles.is_empty() {
        return Ok(());
    }
    emitter.scalar("profiles", ScalarStyle::Any)?;
    emitter.start_mapping(CollectionStyle::Block)?;
    for (stream, set) in profiles {
        emitter.flow_string_set(stream, set)?;
    }
    emitter.end_mapping()
}
