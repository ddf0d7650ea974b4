// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use std::collections::{BTreeMap, BTreeSet};

use crate::yaml::{CollectionStyle, Emitter, ScalarStyle, YamlParser};
use crate::{Error, Result};

#[cfg(test)]
#[path = "./component_test.rs"]
mod component_test;

/// The attributes shared by every kind of component in a stream.
pub trait Component {
    /// The name this component is listed under in the stream.
    fn key(&self) -> &str;
    fn rationale(&self) -> Option<&str>;
    /// The build batch of this component, zero when unset.
    fn buildorder(&self) -> i64;
    /// Components that must be built before this one.
    fn buildafter(&self) -> &BTreeSet<String>;
    /// Whether the output of this component is only used during the build.
    fn buildonly(&self) -> bool;
}

/// An rpm package built as part of a stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentRpm {
    pub key: String,
    pub rationale: Option<String>,
    /// The source package name, when it differs from the key.
    pub name: Option<String>,
    pub repository: Option<String>,
    pub cache: Option<String>,
    pub git_ref: Option<String>,
    pub buildroot: bool,
    pub srpm_buildroot: bool,
    pub buildorder: i64,
    pub buildafter: BTreeSet<String>,
    pub buildonly: bool,
    pub arches: BTreeSet<String>,
    pub multilib: BTreeSet<String>,
}

impl ComponentRpm {
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn parse_yaml(parser: &mut YamlParser, key: &str, strict: bool) -> Result<Self> {
        let mut rpm = ComponentRpm::new(key);
        parser.expect_mapping_start("rpm component")?;
        while let Some(k) = parser.next_key()? {
            match k.as_str() {
                "rationale" => rpm.rationale = Some(parser.parse_string()?),
                "name" => rpm.name = Some(parser.parse_string()?),
                "repository" => rpm.repository = Some(parser.parse_string()?),
                "cache" => rpm.cache = Some(parser.parse_string()?),
                "ref" => rpm.git_ref = Some(parser.parse_string()?),
                "buildroot" => rpm.buildroot = parser.parse_bool()?,
                "srpm-buildroot" => rpm.srpm_buildroot = parser.parse_bool()?,
                "buildorder" => rpm.buildorder = parser.parse_int64()?,
                "buildafter" => rpm.buildafter = parser.parse_string_set()?,
                "buildonly" => rpm.buildonly = parser.parse_bool()?,
                "arches" => rpm.arches = parser.parse_string_set()?,
                "multilib" => rpm.multilib = parser.parse_string_set()?,
                _ => parser.skip_unknown(strict, &k, "rpm component")?,
            }
        }
        if rpm.buildorder != 0 && !rpm.buildafter.is_empty() {
            return Err(parser.error(format!(
                "Component {key:?} cannot have both buildorder and buildafter"
            )));
        }
        Ok(rpm)
    }

    pub fn emit_yaml(&self, emitter: &mut Emitter) -> Result<()> {
        emitter.scalar(&self.key, ScalarStyle::Any)?;
        emitter.start_mapping(CollectionStyle::Block)?;
        emitter.key_value_if_set("rationale", self.rationale.as_deref())?;
        emitter.key_value_if_set("name", self.name.as_deref())?;
        emitter.key_value_if_set("repository", self.repository.as_deref())?;
        emitter.key_value_if_set("cache", self.cache.as_deref())?;
        emitter.key_value_if_set("ref", self.git_ref.as_deref())?;
        emit_flag(emitter, "buildroot", self.buildroot)?;
        emit_flag(emitter, "srpm-buildroot", self.srpm_buildroot)?;
        emit_ordering(emitter, self.buildorder, &self.buildafter)?;
        emit_flag(emitter, "buildonly", self.buildonly)?;
        if !self.arches.is_empty() {
            emitter.flow_string_set("arches", &self.arches)?;
        }
        if !self.multilib.is_empty() {
            emitter.flow_string_set("multilib", &self.multilib)?;
        }
        emitter.end_mapping()
    }
}

impl Component for ComponentRpm {
    fn key(&self) -> &str {
        &self.key
    }

    fn rationale(&self) -> Option<&str> {
        self.rationale.as_deref()
    }

    fn buildorder(&self) -> i64 {
        self.buildorder
    }

    fn buildafter(&self) -> &BTreeSet<String> {
        &self.buildafter
    }

    fn buildonly(&self) -> bool {
        self.buildonly
    }
}

/// Another module stream bundled into this one.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentModule {
    pub key: String,
    pub rationale: Option<String>,
    pub repository: Option<String>,
    pub git_ref: Option<String>,
    pub buildorder: i64,
    pub buildafter: BTreeSet<String>,
    pub buildonly: bool,
}

impl ComponentModule {
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn parse_yaml(parser: &mut YamlParser, key: &str, strict: bool) -> Result<Self> {
        let mut module = ComponentModule::new(key);
        parser.expect_mapping_start("module component")?;
        while let Some(k) = parser.next_key()? {
            match k.as_str() {
                "rationale" => module.rationale = Some(parser.parse_string()?),
                "repository" => module.repository = Some(parser.parse_string()?),
                "ref" => module.git_ref = Some(parser.parse_string()?),
                "buildorder" => module.buildorder = parser.parse_int64()?,
                "buildafter" => module.buildafter = parser.parse_string_set()?,
                "buildonly" => module.buildonly = parser.parse_bool()?,
                _ => parser.skip_unknown(strict, &k, "module component")?,
            }
        }
        if module.buildorder != 0 && !module.buildafter.is_empty() {
            return Err(parser.error(format!(
                "Component {key:?} cannot have both buildorder and buildafter"
            )));
        }
        Ok(module)
    }

    pub fn emit_yaml(&self, emitter: &mut Emitter) -> Result<()> {
        emitter.scalar(&self.key, ScalarStyle::Any)?;
        emitter.start_mapping(CollectionStyle::Block)?;
        emitter.key_value_if_set("rationale", self.rationale.as_deref())?;
        emitter.key_value_if_set("repository", self.repository.as_deref())?;
        emitter.key_value_if_set("ref", self.git_ref.as_deref())?;
        emit_ordering(emitter, self.buildorder, &self.buildafter)?;
        emit_flag(emitter, "buildonly", self.buildonly)?;
        emitter.end_mapping()
    }
}

impl Component for ComponentModule {
    fn key(&self) -> &str {
        &self.key
    }

    fn rationale(&self) -> Option<&str> {
        self.rationale.as_deref()
    }

    fn buildorder(&self) -> i64 {
        self.buildorder
    }

    fn buildafter(&self) -> &BTreeSet<String> {
        &self.buildafter
    }

    fn buildonly(&self) -> bool {
        self.buildonly
    }
}

fn emit_flag(emitter: &mut Emitter, key: &str, value: bool) -> Result<()> {
    if value {
        emitter.key_value_with_style(key, "true", ScalarStyle::Plain)?;
    }
    Ok(())
}

fn emit_ordering(emitter: &mut Emitter, buildorder: i64, buildafter: &BTreeSet<String>) -> Result<()> {
    if buildorder != 0 {
        emitter.key_value_with_style("buildorder", buildorder.to_string(), ScalarStyle::Plain)
    } else if !buildafter.is_empty() {
        emitter.string_set("buildafter", buildafter)
    } else {
        Ok(())
    }
}

/// Check the components of one stream against each other.
///
/// A stream orders its components either by `buildorder` or by
/// `buildafter`, never both; every `buildafter` entry must name a
/// component of the same kind; rpm arches must be a subset of the
/// stream's build arches when those are restricted.
pub fn validate_components(
    rpms: &BTreeMap<String, ComponentRpm>,
    modules: &BTreeMap<String, ComponentModule>,
    buildopts_arches: &BTreeSet<String>,
) -> Result<()> {
    let all = rpms
        .values()
        .map(|c| c as &dyn Component)
        .chain(modules.values().map(|c| c as &dyn Component));
    let (mut ordered, mut after) = (false, false);
    for component in all {
        ordered |= component.buildorder() != 0;
        after |= !component.buildafter().is_empty();
    }
    if ordered && after {
        return Err(Error::Validation(
            "Cannot mix buildorder and buildafter in the same stream".into(),
        ));
    }

    check_buildafter(rpms)?;
    check_buildafter(modules)?;

    if buildopts_arches.is_empty() {
        return Ok(());
    }
    for rpm in rpms.values() {
        if let Some(arch) = rpm.arches.difference(buildopts_arches).next() {
            return Err(Error::Validation(format!(
                "Component rpm {:?} lists arch {arch:?} which is not in the buildopts arches",
                rpm.key
            )));
        }
    }
    Ok(())
}

fn check_buildafter<C: Component>(components: &BTreeMap<String, C>) -> Result<()> {
    for component in components.values() {
        for dep in component.buildafter() {
            if dep == component.key() {
                return Err(Error::Validation(format!(
                    "Component {:?} cannot be built after itself",
                    component.key()
                )));
            }
            if !components.contains_key(dep) {
                return Err(Error::Validation(format!(
                    "Component {:?} is built after {dep:?}, which is not a component of this stream",
                    component.key()
                )));
            }
        }
    }
    Ok(())
}
