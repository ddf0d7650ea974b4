// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

mod common;
mod upgrade;
mod v1;
mod v2;
mod v3;

use std::path::Path;

pub use common::{MODULEMD_DOCUMENT, RpmArtifactMap, StreamCommon};
pub use upgrade::{DEFAULT_CONTEXT_PREFIX, expand_dependencies};
pub use v1::ModuleStreamV1;
pub use v2::ModuleStreamV2;
pub use v3::ModuleStreamV3;

use crate::module::Module;
use crate::options::ReadOptions;
use crate::subdocument::{DocumentType, SubdocumentInfo, read_subdocuments};
use crate::yaml::Emitter;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./stream_test.rs"]
mod stream_test;
#[cfg(test)]
#[path = "./upgrade_test.rs"]
mod upgrade_test;

/// The newest stream schema version.
pub const MODULESTREAM_VERSION_LATEST: u64 = ModuleStreamV3::MDVERSION;

/// A module stream in any of the supported schema versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleStream {
    V1(ModuleStreamV1),
    V2(ModuleStreamV2),
    V3(ModuleStreamV3),
}

macro_rules! each_variant {
    ($self:ident, $bind:ident, $for_each:stmt) => {
        each_variant!($self, $bind => { $for_each })
    };
    ($self:ident, $bind:ident => $for_each:tt) => {
        match $self {
            ModuleStream::V1($bind) => $for_each,
            ModuleStream::V2($bind) => $for_each,
            ModuleStream::V3($bind) => $for_each,
        }
    };
}

impl From<ModuleStreamV1> for ModuleStream {
    fn from(stream: ModuleStreamV1) -> Self {
        ModuleStream::V1(stream)
    }
}

impl From<ModuleStreamV2> for ModuleStream {
    fn from(stream: ModuleStreamV2) -> Self {
        ModuleStream::V2(stream)
    }
}

impl From<ModuleStreamV3> for ModuleStream {
    fn from(stream: ModuleStreamV3) -> Self {
        ModuleStream::V3(stream)
    }
}

impl ModuleStream {
    /// Create an empty stream of the given schema version, where 0
    /// means the latest one.
    pub fn new(mdversion: u64, module_name: Option<&str>, stream_name: Option<&str>) -> Result<Self> {
        match mdversion {
            0 | ModuleStreamV3::MDVERSION => Ok(ModuleStreamV3::new(module_name, stream_name).into()),
            ModuleStreamV1::MDVERSION => Ok(ModuleStreamV1::new(module_name, stream_name).into()),
            ModuleStreamV2::MDVERSION => Ok(ModuleStreamV2::new(module_name, stream_name).into()),
            _ => Err(Error::Validation(format!(
                "Unknown module stream mdversion {mdversion}"
            ))),
        }
    }

    pub fn mdversion(&self) -> u64 {
        match self {
            ModuleStream::V1(_) => ModuleStreamV1::MDVERSION,
            ModuleStream::V2(_) => ModuleStreamV2::MDVERSION,
            ModuleStream::V3(_) => ModuleStreamV3::MDVERSION,
        }
    }

    pub fn common(&self) -> &StreamCommon {
        each_variant!(self, s, &s.common)
    }

    pub fn common_mut(&mut self) -> &mut StreamCommon {
        each_variant!(self, s, &mut s.common)
    }

    pub fn module_name(&self) -> Option<&str> {
        self.common().module_name.as_deref()
    }

    pub fn stream_name(&self) -> Option<&str> {
        self.common().stream_name.as_deref()
    }

    pub fn version(&self) -> u64 {
        self.common().version
    }

    pub fn context(&self) -> Option<&str> {
        self.common().context.as_deref()
    }

    pub fn arch(&self) -> Option<&str> {
        self.common().arch.as_deref()
    }

    pub fn nsvc_as_string(&self) -> Option<String> {
        self.common().nsvc_as_string()
    }

    pub fn nsvca_as_string(&self) -> Option<String> {
        self.common().nsvca_as_string()
    }

    pub fn includes_nevra(&self, nevra: &str) -> bool {
        self.common().includes_nevra(nevra)
    }

    pub fn validate(&self) -> Result<()> {
        each_variant!(self, s, s.validate())
    }

    /// Write this stream as a complete document.
    pub fn emit_yaml(&self, emitter: &mut Emitter) -> Result<()> {
        each_variant!(self, s, s.emit_yaml(emitter))
    }

    /// Parse the stream held by an identified subdocument.
    ///
    /// The stream is not validated.
    pub fn read_yaml(info: &SubdocumentInfo, strict: bool) -> Result<Self> {
        if info.doctype() != Some(DocumentType::Modulemd) {
            return Err(Error::Validation(format!(
                "Expected a {MODULEMD_DOCUMENT} document, got {}",
                info.doctype().map(|d| d.to_string()).unwrap_or_else(|| "nothing".into())
            )));
        }
        let mut parser = info.data_parser()?;
        let stream = match info.mdversion() {
            ModuleStreamV1::MDVERSION => ModuleStreamV1::parse_data(&mut parser, strict)?.into(),
            ModuleStreamV2::MDVERSION => ModuleStreamV2::parse_data(&mut parser, strict)?.into(),
            ModuleStreamV3::MDVERSION => ModuleStreamV3::parse_data(&mut parser, strict)?.into(),
            other => return Err(Error::Validation(format!("Unknown module stream mdversion {other}"))),
        };
        Ok(stream)
    }

    /// Read a single stream document from a string.
    ///
    /// When given, `module_name` and `stream_name` replace the names found
    /// in the document. The stream is validated before it is returned.
    pub fn read_string(
        yaml: &str,
        options: ReadOptions,
        module_name: Option<&str>,
        stream_name: Option<&str>,
    ) -> Result<Self> {
        let mut documents = read_subdocuments(yaml)?.into_iter();
        let info = match (documents.next(), documents.next()) {
            (Some(info), None) => info,
            (None, _) => return Err(Error::Validation("YAML contained no subdocuments".into())),
            (Some(_), Some(_)) => {
                return Err(Error::Validation(
                    "YAML contained more than a single subdocument".into(),
                ));
            }
        };
        let mut stream = ModuleStream::read_yaml(&info.into_result()?, options.strict)?;
        let common = stream.common_mut();
        if let Some(name) = module_name {
            common.module_name = Some(name.to_string());
        }
        if let Some(name) = stream_name {
            common.stream_name = Some(name.to_string());
        }
        if options.autogen_module_name {
            common.set_autogen_module_name(0);
            common.set_autogen_stream_name(0);
        }
        stream.validate()?;
        Ok(stream)
    }

    pub fn read_file<P: AsRef<Path>>(
        path: P,
        options: ReadOptions,
        module_name: Option<&str>,
        stream_name: Option<&str>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|err| Error::Open(path.to_owned(), err))?;
        Self::read_string(&yaml, options, module_name, stream_name)
    }

    /// True if this stream requires the given stream of a module at run time.
    pub fn depends_on_stream(&self, module: &str, stream: &str) -> bool {
        match self {
            ModuleStream::V1(s) => s.runtime_deps.get(module).is_some_and(|v| v == stream),
            ModuleStream::V2(s) => s
                .dependencies
                .iter()
                .any(|deps| deps.requires_module_and_stream(module, stream)),
            ModuleStream::V3(s) => match module {
                "platform" => s.platform.as_deref() == Some(stream),
                _ => s.runtime_requires.get(module).is_some_and(|v| v == stream),
            },
        }
    }

    /// True if this stream requires the given stream of a module at build time.
    pub fn build_depends_on_stream(&self, module: &str, stream: &str) -> bool {
        match self {
            ModuleStream::V1(s) => s.buildtime_deps.get(module).is_some_and(|v| v == stream),
            ModuleStream::V2(s) => s
                .dependencies
                .iter()
                .any(|deps| deps.buildrequires_module_and_stream(module, stream)),
            ModuleStream::V3(s) => match module {
                "platform" => s.platform.as_deref() == Some(stream),
                _ => s.buildtime_requires.get(module).is_some_and(|v| v == stream),
            },
        }
    }

    /// Upgrade this stream to a newer schema version, where 0 means the
    /// latest one.
    ///
    /// Upgrading to v3 only succeeds if the dependencies expand to a
    /// single stream; use [`Self::upgrade_ext`] otherwise.
    pub fn upgrade(&self, mdversion: u64) -> Result<ModuleStream> {
        let mdversion = target_mdversion(self.mdversion(), mdversion)?;
        let mut current = self.clone();
        while current.mdversion() < mdversion {
            current = match current {
                ModuleStream::V1(s) => upgrade::v1_to_v2(&s)?.into(),
                ModuleStream::V2(s) => {
                    let mut streams = upgrade::v2_to_v3(&s, DEFAULT_CONTEXT_PREFIX)
                        .map_err(|err| Error::wrap("Upgrading to v3 failed", err))?;
                    match (streams.pop(), streams.is_empty()) {
                        (Some(stream), true) => stream.into(),
                        _ => {
                            return Err(Error::Upgrade(
                                "Stream v2 upgrade must contain only a single stream when \
                                 upgrading one stream; use upgrade_ext instead"
                                    .into(),
                            ));
                        }
                    }
                }
                ModuleStream::V3(_) => {
                    return Err(Error::Upgrade(format!(
                        "Cannot upgrade beyond metadata version {}",
                        current.mdversion()
                    )));
                }
            };
        }
        Ok(current)
    }

    /// Upgrade this stream, returning every stream that it expands into
    /// as a module.
    pub fn upgrade_ext(&self, mdversion: u64) -> Result<Module> {
        self.upgrade_ext_with_context_prefix(mdversion, DEFAULT_CONTEXT_PREFIX)
    }

    /// Like [`Self::upgrade_ext`], generating the contexts of expanded
    /// streams from `context_prefix` followed by a four digit counter.
    pub fn upgrade_ext_with_context_prefix(&self, mdversion: u64, context_prefix: &str) -> Result<Module> {
        let mdversion = target_mdversion(self.mdversion(), mdversion)?;
        let module_name = self.module_name().unwrap_or_default();
        let mut module = Module::new(module_name);
        let intermediate = mdversion.min(ModuleStreamV2::MDVERSION);
        let current = if self.mdversion() < intermediate {
            self.upgrade(intermediate)?
        } else {
            self.clone()
        };
        let streams = match current {
            ModuleStream::V2(s) if mdversion == ModuleStreamV3::MDVERSION => {
                upgrade::v2_to_v3(&s, context_prefix)
                    .map_err(|err| Error::wrap("Upgrading to v3 failed", err))?
                    .into_iter()
                    .map(ModuleStream::from)
                    .collect()
            }
            other => vec![other],
        };
        for stream in streams {
            module.add_stream(stream, mdversion)?;
        }
        Ok(module)
    }
}

fn target_mdversion(current: u64, requested: u64) -> Result<u64> {
    let requested = match requested {
        0 => MODULESTREAM_VERSION_LATEST,
        v => v,
    };
    if requested > MODULESTREAM_VERSION_LATEST {
        return Err(Error::Upgrade(format!(
            "Cannot upgrade beyond metadata version {MODULESTREAM_VERSION_LATEST}"
        )));
    }
    if requested < current {
        return Err(Error::Upgrade("ModuleStream downgrades are not supported.".into()));
    }
    Ok(requested)
}
