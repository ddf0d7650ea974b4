// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use std::collections::{BTreeMap, BTreeSet};

use crate::buildopts::BuildOptions;
use crate::component::{ComponentModule, ComponentRpm, validate_components};
use crate::name::{
    autogen_module_name,
    autogen_stream_name,
    nsvc,
    validate_context,
    validate_nevra,
};
use crate::profile::Profile;
use crate::rpm_map::RpmMapEntry;
use crate::yaml::{CollectionStyle, Emitter, ScalarStyle, YamlParser};
use crate::{Error, Result};

pub const MODULEMD_DOCUMENT: &str = "modulemd";

/// The fields that every version of a module stream carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamCommon {
    pub module_name: Option<String>,
    pub stream_name: Option<String>,
    pub version: u64,
    pub context: Option<String>,
    pub arch: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub module_licenses: BTreeSet<String>,
    pub content_licenses: BTreeSet<String>,
    pub xmd: Option<serde_yaml::Value>,
    pub community: Option<String>,
    pub documentation: Option<String>,
    pub tracker: Option<String>,
    pub profiles: BTreeMap<String, Profile>,
    pub rpm_api: BTreeSet<String>,
    pub rpm_filters: BTreeSet<String>,
    pub buildopts: Option<BuildOptions>,
    pub rpm_components: BTreeMap<String, ComponentRpm>,
    pub module_components: BTreeMap<String, ComponentModule>,
    pub rpm_artifacts: BTreeSet<String>,
    autogen_module_name: bool,
    autogen_stream_name: bool,
}

impl StreamCommon {
    pub fn new(module_name: Option<&str>, stream_name: Option<&str>) -> Self {
        Self {
            module_name: module_name.map(str::to_string),
            stream_name: stream_name.map(str::to_string),
            ..Default::default()
        }
    }

    pub fn add_profile(&mut self, profile: Profile) {
        self.profiles.insert(profile.name.clone(), profile);
    }

    pub fn add_rpm_component(&mut self, component: ComponentRpm) {
        self.rpm_components.insert(component.key.clone(), component);
    }

    pub fn add_module_component(&mut self, component: ComponentModule) {
        self.module_components.insert(component.key.clone(), component);
    }

    /// `N:S:V:C`, or `None` if the module or stream name is unset.
    pub fn nsvc_as_string(&self) -> Option<String> {
        let (module, stream) = (self.module_name.as_deref()?, self.stream_name.as_deref()?);
        Some(nsvc(
            Some(module),
            Some(stream),
            self.version,
            self.context.as_deref(),
        ))
    }

    /// `N:S:V[:C[:A]]`, dropping trailing parts that are unset.
    pub fn nsvca_as_string(&self) -> Option<String> {
        let (module, stream) = (self.module_name.as_deref()?, self.stream_name.as_deref()?);
        let mut out = format!("{module}:{stream}:{}", self.version);
        match (self.context.as_deref(), self.arch.as_deref()) {
            (context, Some(arch)) => {
                out.push_str(&format!(":{}:{arch}", context.unwrap_or_default()));
            }
            (Some(context), None) => {
                out.push(':');
                out.push_str(context);
            }
            (None, None) => {}
        }
        Some(out)
    }

    pub fn includes_nevra(&self, nevra: &str) -> bool {
        self.rpm_artifacts.contains(nevra)
    }

    pub fn is_autogen_module_name(&self) -> bool {
        self.autogen_module_name
    }

    pub fn is_autogen_stream_name(&self) -> bool {
        self.autogen_stream_name
    }

    /// Name a stream that has no module name, using `n` to keep the
    /// generated name unique within an index.
    pub(crate) fn set_autogen_module_name(&mut self, n: usize) {
        if self.module_name.is_none() {
            self.module_name = Some(autogen_module_name(n));
            self.autogen_module_name = true;
        }
    }

    pub(crate) fn set_autogen_stream_name(&mut self, n: usize) {
        if self.stream_name.is_none() {
            self.stream_name = Some(autogen_stream_name(n));
            self.autogen_stream_name = true;
        }
    }

    /// Forget a generated module name, leaving a real one untouched.
    pub fn clear_autogen_module_name(&mut self) {
        if self.autogen_module_name {
            self.module_name = None;
            self.autogen_module_name = false;
        }
    }

    pub fn clear_autogen_stream_name(&mut self) {
        if self.autogen_stream_name {
            self.stream_name = None;
            self.autogen_stream_name = false;
        }
    }

    /// Checks shared by every stream version.
    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(context) = &self.context {
            validate_context(context)?;
        }
        if self.summary.is_none() {
            return Err(Error::Validation("Summary is missing".into()));
        }
        if self.description.is_none() {
            return Err(Error::Validation("Description is missing".into()));
        }
        let arches = self
            .buildopts
            .as_ref()
            .map(|b| b.arches.clone())
            .unwrap_or_default();
        validate_components(&self.rpm_components, &self.module_components, &arches)?;
        for nevra in &self.rpm_artifacts {
            if !validate_nevra(nevra) {
                return Err(Error::Validation(format!(
                    "Artifact {nevra:?} was not in valid N-E:V-R.A format."
                )));
            }
        }
        Ok(())
    }

    /// Read one key of the stream data that is common to every version.
    ///
    /// Returns `false` without consuming anything if the key is not one
    /// of the common keys.
    pub(crate) fn parse_key(
        &mut self,
        parser: &mut YamlParser,
        key: &str,
        strict: bool,
    ) -> Result<bool> {
        match key {
            "name" => self.module_name = Some(parser.parse_string()?),
            "stream" => self.stream_name = Some(parser.parse_string()?),
            "version" => self.version = parser.parse_uint64()?,
            "context" => self.context = Some(parser.parse_string()?),
            "arch" => self.arch = Some(parser.parse_string()?),
            "summary" => self.summary = Some(parser.parse_string()?),
            "description" => self.description = Some(parser.parse_string()?),
            "license" => self.parse_licenses(parser, strict)?,
            "xmd" => self.xmd = Some(parser.parse_xmd()?),
            "references" => self.parse_references(parser, strict)?,
            "profiles" => {
                parser.expect_mapping_start("profiles")?;
                while let Some(name) = parser.next_key()? {
                    let profile = Profile::parse_yaml(parser, &name, strict)?;
                    self.add_profile(profile);
                }
            }
            "api" => self.rpm_api = parser.parse_string_set_from_map("rpms", strict)?,
            "filter" => self.rpm_filters = parser.parse_string_set_from_map("rpms", strict)?,
            "buildopts" => self.buildopts = Some(BuildOptions::parse_yaml(parser, strict)?),
            "components" => self.parse_components(parser, strict)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn parse_licenses(&mut self, parser: &mut YamlParser, strict: bool) -> Result<()> {
        parser.expect_mapping_start("license")?;
        while let Some(key) = parser.next_key()? {
            match key.as_str() {
                "module" => self.module_licenses = parser.parse_string_set()?,
                "content" => self.content_licenses = parser.parse_string_set()?,
                _ => parser.skip_unknown(strict, &key, "license")?,
            }
        }
        Ok(())
    }

    fn parse_references(&mut self, parser: &mut YamlParser, strict: bool) -> Result<()> {
        parser.expect_mapping_start("references")?;
        while let Some(key) = parser.next_key()? {
            match key.as_str() {
                "community" => self.community = Some(parser.parse_string()?),
                "documentation" => self.documentation = Some(parser.parse_string()?),
                "tracker" => self.tracker = Some(parser.parse_string()?),
                _ => parser.skip_unknown(strict, &key, "references")?,
            }
        }
        Ok(())
    }

    fn parse_components(&mut self, parser: &mut YamlParser, strict: bool) -> Result<()> {
        parser.expect_mapping_start("components")?;
        while let Some(key) = parser.next_key()? {
            match key.as_str() {
                "rpms" => {
                    parser.expect_mapping_start("rpm components")?;
                    while let Some(name) = parser.next_key()? {
                        let rpm = ComponentRpm::parse_yaml(parser, &name, strict)?;
                        self.add_rpm_component(rpm);
                    }
                }
                "modules" => {
                    parser.expect_mapping_start("module components")?;
                    while let Some(name) = parser.next_key()? {
                        let module = ComponentModule::parse_yaml(parser, &name, strict)?;
                        self.add_module_component(module);
                    }
                }
                _ => parser.skip_unknown(strict, &key, "components")?,
            }
        }
        Ok(())
    }

    /// Open a stream document and write the identity fields.
    pub(crate) fn emit_base(&self, emitter: &mut Emitter, mdversion: u64) -> Result<()> {
        emitter.start_document_with_headers(MODULEMD_DOCUMENT, mdversion)?;
        emitter.start_mapping(CollectionStyle::Block)?;
        if !self.autogen_module_name {
            emitter.key_value_if_set("name", self.module_name.as_deref())?;
        }
        if let Some(stream) = self.stream_name.as_deref().filter(|_| !self.autogen_stream_name) {
            emitter.key_value_with_style("stream", stream, ScalarStyle::DoubleQuoted)?;
        }
        if self.version != 0 {
            emitter.key_uint("version", self.version)?;
        }
        emitter.key_value_if_set("context", self.context.as_deref())
    }

    pub(crate) fn emit_summary(&self, emitter: &mut Emitter) -> Result<()> {
        emitter.key_value_if_set("arch", self.arch.as_deref())?;
        emitter.key_value_if_set("summary", self.summary.as_deref())?;
        if let Some(description) = &self.description {
            emitter.key_value_with_style("description", description, ScalarStyle::Folded)?;
        }
        Ok(())
    }

    /// Write the licenses; a module license is mandatory when `required`.
    pub(crate) fn emit_licenses(&self, emitter: &mut Emitter, required: bool) -> Result<()> {
        if self.module_licenses.is_empty() {
            if required {
                return Err(Error::Emit("Module licenses is not allowed to be empty".into()));
            }
            if self.content_licenses.is_empty() {
                return Ok(());
            }
        }
        emitter.scalar("license", ScalarStyle::Any)?;
        emitter.start_mapping(CollectionStyle::Block)?;
        emitter.string_set_if_non_empty("module", &self.module_licenses)?;
        emitter.string_set_if_non_empty("content", &self.content_licenses)?;
        emitter.end_mapping()
    }

    pub(crate) fn emit_xmd(&self, emitter: &mut Emitter) -> Result<()> {
        if let Some(xmd) = &self.xmd {
            emitter.scalar("xmd", ScalarStyle::Any)?;
            emitter.xmd(xmd)?;
        }
        Ok(())
    }

    /// Write everything from the references through the components.
    pub(crate) fn emit_body(&self, emitter: &mut Emitter) -> Result<()> {
        self.emit_body_with(emitter, false)
    }

    /// Like [`Self::emit_body`], optionally writing the `default` flag of
    /// each profile.
    pub(crate) fn emit_body_with(&self, emitter: &mut Emitter, profile_defaults: bool) -> Result<()> {
        if self.community.is_some() || self.documentation.is_some() || self.tracker.is_some() {
            emitter.scalar("references", ScalarStyle::Any)?;
            emitter.start_mapping(CollectionStyle::Block)?;
            emitter.key_value_if_set("community", self.community.as_deref())?;
            emitter.key_value_if_set("documentation", self.documentation.as_deref())?;
            emitter.key_value_if_set("tracker", self.tracker.as_deref())?;
            emitter.end_mapping()?;
        }
        if !self.profiles.is_empty() {
            emitter.scalar("profiles", ScalarStyle::Any)?;
            emitter.start_mapping(CollectionStyle::Block)?;
            for profile in self.profiles.values() {
                match profile_defaults {
                    true => profile.emit_yaml_with_default(emitter)?,
                    false => profile.emit_yaml(emitter)?,
                }
            }
            emitter.end_mapping()?;
        }
        emit_rpms_wrapper(emitter, "api", &self.rpm_api)?;
        emit_rpms_wrapper(emitter, "filter", &self.rpm_filters)?;
        if let Some(buildopts) = &self.buildopts {
            emitter.scalar("buildopts", ScalarStyle::Any)?;
            buildopts.emit_yaml(emitter)?;
        }
        if !self.rpm_components.is_empty() || !self.module_components.is_empty() {
            emitter.scalar("components", ScalarStyle::Any)?;
            emitter.start_mapping(CollectionStyle::Block)?;
            if !self.rpm_components.is_empty() {
                emitter.scalar("rpms", ScalarStyle::Any)?;
                emitter.start_mapping(CollectionStyle::Block)?;
                for rpm in self.rpm_components.values() {
                    rpm.emit_yaml(emitter)?;
                }
                emitter.end_mapping()?;
            }
            if !self.module_components.is_empty() {
                emitter.scalar("modules", ScalarStyle::Any)?;
                emitter.start_mapping(CollectionStyle::Block)?;
                for module in self.module_components.values() {
                    module.emit_yaml(emitter)?;
                }
                emitter.end_mapping()?;
            }
            emitter.end_mapping()?;
        }
        Ok(())
    }

    /// Close the data mapping and the document opened by [`Self::emit_base`].
    pub(crate) fn emit_end(&self, emitter: &mut Emitter) -> Result<()> {
        emitter.end_mapping()?;
        emitter.end_document_with_headers()
    }
}

fn emit_rpms_wrapper(emitter: &mut Emitter, key: &str, rpms: &BTreeSet<String>) -> Result<()> {
    if rpms.is_empty() {
        return Ok(());
    }
    emitter.scalar(key, ScalarStyle::Any)?;
    emitter.start_mapping(CollectionStyle::Block)?;
    emitter.string_set("rpms", rpms)?;
    emitter.end_mapping()
}

/// Rpm artifacts keyed by digest type and then checksum.
pub type RpmArtifactMap = BTreeMap<String, BTreeMap<String, RpmMapEntry>>;

/// Read the `artifacts` mapping; `rpm-map` is only accepted when a map
/// is given to fill.
pub(crate) fn parse_artifacts(
    parser: &mut YamlParser,
    strict: bool,
    rpms: &mut BTreeSet<String>,
    mut rpm_map: Option<&mut RpmArtifactMap>,
) -> Result<()> {
    parser.expect_mapping_start("artifacts")?;
    while let Some(key) = parser.next_key()? {
        match (key.as_str(), rpm_map.as_deref_mut()) {
            ("rpms", _) => *rpms = parser.parse_string_set()?,
            ("rpm-map", Some(map)) => {
                parser.expect_mapping_start("rpm-map")?;
                while let Some(digest) = parser.next_key()? {
                    parser.expect_mapping_start("rpm-map digest")?;
                    let entries = map.entry(digest).or_default();
                    while let Some(checksum) = parser.next_key()? {
                        let entry = RpmMapEntry::parse_yaml(parser, strict)?;
                        entries.insert(checksum, entry);
                    }
                }
            }
            _ => parser.skip_unknown(strict, &key, "artifacts")?,
        }
    }
    Ok(())
}

pub(crate) fn emit_artifacts(
    emitter: &mut Emitter,
    rpms: &BTreeSet<String>,
    rpm_map: Option<&RpmArtifactMap>,
) -> Result<()> {
    let rpm_map = rpm_map.filter(|m| m.values().any(|entries| !entries.is_empty()));
    if rpms.is_empty() && rpm_map.is_none() {
        return Ok(());
    }
    emitter.scalar("artifacts", ScalarStyle::Any)?;
    emitter.start_mapping(CollectionStyle::Block)?;
    emitter.string_set_if_non_empty("rpms", rpms)?;
    if let Some(map) = rpm_map {
        emitter.scalar("rpm-map", ScalarStyle::Any)?;
        emitter.start_mapping(CollectionStyle::Block)?;
        for (digest, entries) in map.iter().filter(|(_, e)| !e.is_empty()) {
            emitter.scalar(digest, ScalarStyle::Any)?;
            emitter.start_mapping(CollectionStyle::Block)?;
            for (checksum, entry) in entries {
                emitter.scalar(checksum, ScalarStyle::Any)?;
                entry.emit_yaml(emitter)?;
            }
            emitter.end_mapping()?;
        }
        emitter.end_mapping()?;
    }
    emitter.end_mapping()
}
