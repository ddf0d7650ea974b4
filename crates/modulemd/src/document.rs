// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use std::path::Path;

use crate::defaults::Defaults;
use crate::options::ReadOptions;
use crate::packager::PackagerV3;
use crate::stream::ModuleStream;
use crate::subdocument::{DocumentType, read_subdocuments};
use crate::translation::Translation;
use crate::yaml::Emitter;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./document_test.rs"]
mod document_test;

/// Any one document of a YAML stream, as a flat list rather than an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Document {
    Stream(ModuleStream),
    Defaults(Defaults),
    Translation(Translation),
}

impl From<ModuleStream> for Document {
    fn from(stream: ModuleStream) -> Self {
        Document::Stream(stream)
    }
}

impl From<Defaults> for Document {
    fn from(defaults: Defaults) -> Self {
        Document::Defaults(defaults)
    }
}

impl From<Translation> for Document {
    fn from(translation: Translation) -> Self {
        Document::Translation(translation)
    }
}

impl Document {
    /// The module that this document belongs to, if it names one.
    pub fn module_name(&self) -> Option<&str> {
        match self {
            Document::Stream(s) => s.module_name(),
            Document::Defaults(d) => Some(d.module_name()),
            Document::Translation(t) => Some(&t.module_name),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Document::Stream(s) => s.validate(),
            Document::Defaults(d) => d.validate(),
            Document::Translation(t) => t.validate(),
        }
    }

    pub fn emit_yaml(&self, emitter: &mut Emitter) -> Result<()> {
        match self {
            Document::Stream(s) => s.emit_yaml(emitter),
            Document::Defaults(d) => d.emit_yaml(emitter),
            Document::Translation(t) => t.emit_yaml(emitter),
        }
    }
}

/// Read every document of a YAML string, in order.
///
/// Unlike [`crate::ModuleIndex::update_from_string`], the first document
/// that cannot be read fails the whole read. Packager documents are
/// converted into the streams and defaults that they describe.
pub fn read_documents(yaml: &str, options: ReadOptions) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    for (n, info) in read_subdocuments(yaml)?.into_iter().enumerate() {
        let info = info.into_result()?;
        match info.doctype() {
            Some(DocumentType::Modulemd) => {
                let mut stream = ModuleStream::read_yaml(&info, options.strict)?;
                if options.autogen_module_name {
                    let common = stream.common_mut();
                    common.set_autogen_module_name(n + 1);
                    common.set_autogen_stream_name(n + 1);
                }
                stream.validate()?;
                documents.push(stream.into());
            }
            Some(DocumentType::Defaults) => {
                let defaults = Defaults::read_yaml(&info, options.strict)?;
                defaults.validate()?;
                documents.push(defaults.into());
            }
            Some(DocumentType::Translations) => {
                let translation = Translation::parse_yaml(&mut info.data_parser()?, options.strict)?;
                documents.push(translation.into());
            }
            Some(DocumentType::Packager) => {
                let module = PackagerV3::read_yaml(&info, options.strict)?.to_module_numbered(n + 1)?;
                documents.extend(module.streams().iter().cloned().map(Document::from));
                documents.extend(module.defaults().cloned().map(Document::from));
            }
            None => return Err(Error::Validation("Invalid doctype encountered".into())),
        }
    }
    tracing::debug!(count = documents.len(), "read documents");
    Ok(documents)
}

pub fn read_documents_from_file<P: AsRef<Path>>(path: P, options: ReadOptions) -> Result<Vec<Document>> {
    let path = path.as_ref();
    let yaml = std::fs::read_to_string(path).map_err(|err| Error::Open(path.to_owned(), err))?;
    read_documents(&yaml, options)
}

/// Write every document, in order, as one YAML stream.
pub fn dump_documents(documents: &[Document]) -> Result<String> {
    let mut emitter = Emitter::new();
    emitter.start_stream()?;
    for document in documents {
        document.emit_yaml(&mut emitter)?;
    }
    emitter.end_stream()?;
    emitter.finish()
}
