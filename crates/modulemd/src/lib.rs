// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

//! Read, validate, upgrade, merge and write modulemd YAML documents.

mod build_config;
mod buildopts;
mod component;
mod defaults;
mod dependencies;
mod document;
mod error;
mod index;
mod merger;
mod module;
pub mod name;
mod options;
mod packager;
mod prioritizer;
mod profile;
mod rpm_map;
mod service_level;
pub mod stream;
mod subdocument;
mod translation;
pub mod yaml;

#[cfg(test)]
mod fixtures;

pub use build_config::BuildConfig;
pub use buildopts::BuildOptions;
pub use component::{Component, ComponentModule, ComponentRpm, validate_components};
pub use defaults::{DEFAULTS_DOCUMENT, DEFAULTS_VERSION_LATEST, Defaults, Intent, ProfileDefaults};
pub use dependencies::{Dependencies, StreamSet};
pub use document::{Document, dump_documents, read_documents, read_documents_from_file};
pub use error::{Error, ErrorKind, Result};
pub use index::{ModuleIndex, dump_to_string, load_file, load_string};
pub use merger::{MERGER_PRIORITY_MAX, MERGER_PRIORITY_MIN, ModuleIndexMerger};
pub use module::Module;
pub use options::ReadOptions;
pub use packager::{PACKAGER_DOCUMENT, PACKAGER_VERSION_LATEST, PackagerV3};
pub use prioritizer::{PRIORITIZER_PRIORITY_MAX, PRIORITIZER_PRIORITY_MIN, Prioritizer};
pub use profile::Profile;
pub use rpm_map::RpmMapEntry;
pub use service_level::ServiceLevel;
pub use stream::{
    MODULESTREAM_VERSION_LATEST,
    ModuleStream,
    ModuleStreamV1,
    ModuleStreamV2,
    ModuleStreamV3,
    StreamCommon,
};
pub use subdocument::{DocumentType, SubdocumentInfo, read_subdocuments};
pub use translation::{TRANSLATION_DOCUMENT, TRANSLATION_VERSION_LATEST, Translation, TranslationEntry};
