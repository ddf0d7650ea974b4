// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use std::collections::{BTreeMap, BTreeSet};

use crate::yaml::{CollectionStyle, Emitter, ScalarStyle, YamlParser};
use crate::{Error, Result};

#[cfg(test)]
#[path = "./dependencies_test.rs"]
mod dependencies_test;

/// The streams of one module that a dependency accepts.
///
/// Streams are either all listed (an inclusion set, where an empty set
/// accepts any stream) or all excluded with a leading `-`. Mixing the two
/// cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StreamSet {
    Include(BTreeSet<String>),
    /// Stream names stored without their leading `-`.
    Exclude(BTreeSet<String>),
}

impl Default for StreamSet {
    fn default() -> Self {
        StreamSet::Include(BTreeSet::new())
    }
}

impl StreamSet {
    /// Build a set from streams as written in a document, where a leading
    /// `-` marks an excluded stream.
    pub fn from_streams<I, S>(streams: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = StreamSet::default();
        for stream in streams {
            set.insert(stream.as_ref())?;
        }
        Ok(set)
    }

    /// Add one stream as written in a document.
    pub fn insert(&mut self, literal: &str) -> Result<()> {
        if literal.starts_with('-') && !self.is_exclusion() && self.is_empty() {
            *self = StreamSet::Exclude(BTreeSet::new());
        }
        match (literal.strip_prefix('-'), self) {
            (None, StreamSet::Include(set)) => {
                set.insert(literal.to_string());
            }
            (Some(stream), StreamSet::Exclude(set)) => {
                set.insert(stream.to_string());
            }
            _ => {
                return Err(Error::Validation(format!(
                    "Stream {literal:?} cannot be mixed with streams of the opposite sign"
                )));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            StreamSet::Include(set) | StreamSet::Exclude(set) => set.is_empty(),
        }
    }

    pub fn is_exclusion(&self) -> bool {
        matches!(self, StreamSet::Exclude(_))
    }

    /// The streams as written in a document, sorted.
    pub fn literals(&self) -> Vec<String> {
        match self {
            StreamSet::Include(set) => set.iter().cloned().collect(),
            StreamSet::Exclude(set) => set.iter().map(|s| format!("-{s}")).collect(),
        }
    }

    /// True if this set lists the given stream exactly as written,
    /// including any leading `-`.
    pub fn contains_literal(&self, literal: &str) -> bool {
        match (self, literal.strip_prefix('-')) {
            (StreamSet::Include(set), None) => set.contains(literal),
            (StreamSet::Exclude(set), Some(stream)) => set.contains(stream),
            _ => false,
        }
    }

    fn validate(&self, module: &str) -> Result<()> {
        let (StreamSet::Include(set) | StreamSet::Exclude(set)) = self;
        if self.is_exclusion() && set.is_empty() {
            return Err(Error::Validation(format!(
                "Module {module:?} has an empty exclusion list"
            )));
        }
        for stream in set {
            if stream.is_empty() || stream.starts_with('-') {
                return Err(Error::Validation(format!(
                    "Module {module:?} lists an invalid stream {stream:?}"
                )));
            }
        }
        Ok(())
    }
}

/// One alternative set of build and run time module requirements of a
/// v2 stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Dependencies {
    pub buildtime: BTreeMap<String, StreamSet>,
    pub runtime: BTreeMap<String, StreamSet>,
}

impl Dependencies {
    pub fn add_buildtime_stream(&mut self, module: &str, stream: &str) -> Result<()> {
        self.buildtime.entry(module.to_string()).or_default().insert(stream)
    }

    /// Require the module at build time, in any stream.
    pub fn set_empty_buildtime_dependencies_for_module(&mut self, module: &str) {
        self.buildtime.insert(module.to_string(), StreamSet::default());
    }

    pub fn clear_buildtime_dependencies(&mut self) {
        self.buildtime.clear();
    }

    pub fn buildtime_modules(&self) -> impl Iterator<Item = &str> {
        self.buildtime.keys().map(String::as_str)
    }

    pub fn buildtime_streams(&self, module: &str) -> Option<Vec<String>> {
        self.buildtime.get(module).map(StreamSet::literals)
    }

    pub fn add_runtime_stream(&mut self, module: &str, stream: &str) -> Result<()> {
        self.runtime.entry(module.to_string()).or_default().insert(stream)
    }

    /// Require the module at run time, in any stream.
    pub fn set_empty_runtime_dependencies_for_module(&mut self, module: &str) {
        self.runtime.insert(module.to_string(), StreamSet::default());
    }

    pub fn clear_runtime_dependencies(&mut self) {
        self.runtime.clear();
    }

    pub fn runtime_modules(&self) -> impl Iterator<Item = &str> {
        self.runtime.keys().map(String::as_str)
    }

    pub fn runtime_streams(&self, module: &str) -> Option<Vec<String>> {
        self.runtime.get(module).map(StreamSet::literals)
    }

    pub fn requires_module_and_stream(&self, module: &str, stream: &str) -> bool {
        self.runtime
            .get(module)
            .is_some_and(|set| set.contains_literal(stream))
    }

    pub fn buildrequires_module_and_stream(&self, module: &str, stream: &str) -> bool {
        self.buildtime
            .get(module)
            .is_some_and(|set| set.contains_literal(stream))
    }

    pub fn validate(&self) -> Result<()> {
        for (module, set) in self.buildtime.iter().chain(self.runtime.iter()) {
            set.validate(module)?;
        }
        Ok(())
    }

    pub fn parse_yaml(parser: &mut YamlParser, strict: bool) -> Result<Self> {
        parser.expect_mapping_start("dependencies")?;
        Self::parse_mapping_body(parser, strict)
    }

    /// Like [`Self::parse_yaml`], for a mapping whose start was already read.
    pub(crate) fn parse_mapping_body(parser: &mut YamlParser, strict: bool) -> Result<Self> {
        let mut deps = Dependencies::default();
        while let Some(key) = parser.next_key()? {
            match key.as_str() {
                "buildrequires" => deps.buildtime = parse_requirements(parser)?,
                "requires" => deps.runtime = parse_requirements(parser)?,
                _ => parser.skip_unknown(strict, &key, "dependencies")?,
            }
        }
        deps.validate()?;
        Ok(deps)
    }

    pub fn emit_yaml(&self, emitter: &mut Emitter) -> Result<()> {
        emitter.start_mapping(CollectionStyle::Block)?;
        emit_requirements(emitter, "buildrequires", &self.buildtime)?;
        emit_requirements(emitter, "requires", &self.runtime)?;
        emitter.end_mapping()
    }
}

fn parse_requirements(parser: &mut YamlParser) -> Result<BTreeMap<String, StreamSet>> {
    let mark = parser.mark();
    parser
        .parse_nested_set()?
        .into_iter()
        .map(|(module, streams)| {
            let set = StreamSet::from_streams(&streams)
                .map_err(|err| Error::wrap(format!("{module} ({mark})"), err))?;
            Ok((module, set))
        })
        .collect()
}

fn emit_requirements(
    emitter: &mut Emitter,
    key: &str,
    requirements: &BTreeMap<String, StreamSet>,
) -> Result<()> {
    if requirements.is_empty() {
        return Ok(());
    }
    emitter.scalar(key, ScalarStyle::Any)?;
    emitter.start_mapping(CollectionStyle::Block)?;
    for (module, set) in requirements {
        emitter.flow_string_set(module, set.literals())?;
    }
    emitter.end_mapping()
}
