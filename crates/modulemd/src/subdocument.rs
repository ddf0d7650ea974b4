// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use std::str::FromStr;

use crate::yaml::{CollectionStyle, Emitter, Event, Mark, ScalarStyle, YamlParser};
use crate::{Error, Result};

#[cfg(test)]
#[path = "./subdocument_test.rs"]
mod subdocument_test;

/// The kinds of document that can appear in a modulemd YAML stream.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, strum::EnumString,
)]
pub enum DocumentType {
    #[strum(serialize = "modulemd")]
    Modulemd,
    #[strum(serialize = "modulemd-defaults")]
    Defaults,
    #[strum(serialize = "modulemd-translations")]
    Translations,
    #[strum(serialize = "modulemd-packager")]
    Packager,
}

impl DocumentType {
    /// The schema versions that can be read for this kind of document.
    pub fn supported_versions(&self) -> std::ops::RangeInclusive<u64> {
        match self {
            DocumentType::Modulemd => 1..=3,
            DocumentType::Defaults => 1..=1,
            DocumentType::Translations => 1..=1,
            DocumentType::Packager => 3..=3,
        }
    }
}

/// One document of a YAML stream, identified but not yet parsed.
///
/// The document is held as self-contained YAML text so that it can be
/// parsed by the type-specific reader at any later time, or reported
/// back to the user when it fails.
#[derive(Debug)]
pub struct SubdocumentInfo {
    doctype: Option<DocumentType>,
    mdversion: u64,
    yaml: String,
    error: Option<Error>,
}

impl SubdocumentInfo {
    pub fn doctype(&self) -> Option<DocumentType> {
        self.doctype
    }

    pub fn mdversion(&self) -> u64 {
        self.mdversion
    }

    /// The document as YAML text, including its `document` and `version`.
    pub fn yaml(&self) -> &str {
        &self.yaml
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    fn failed(yaml: String, error: Error) -> Self {
        Self {
            doctype: None,
            mdversion: 0,
            yaml,
            error: Some(error),
        }
    }

    pub(crate) fn set_error(&mut self, error: Error) {
        self.error = Some(error);
    }

    pub fn into_error(self) -> Option<Error> {
        self.error
    }

    /// Turn a document that could not be identified into its error.
    pub fn into_result(mut self) -> Result<Self> {
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }

    /// A parser over this document, positioned on the value of `data`.
    pub fn data_parser(&self) -> Result<YamlParser<'_>> {
        let mut parser = YamlParser::new(&self.yaml);
        for expected in [Event::StreamStart, Event::DocumentStart, Event::MappingStart] {
            let event = parser.next_event()?;
            if event != expected {
                return Err(parser.error(format!(
                    "Expected {} at the start of a document, got {}",
                    expected.name(),
                    event.name()
                )));
            }
        }
        while let Some(key) = parser.next_key()? {
            if key == "data" {
                return Ok(parser);
            }
            parser.skip_value()?;
        }
        Err(parser.error("Document has no data"))
    }
}

/// Split a YAML stream into its documents, identifying each one.
///
/// Text that is not YAML at all is an error. A document that is YAML but
/// cannot be buffered, or does not have a valid `document`/`version`/`data`
/// envelope, is returned with its error set so that the remaining
/// documents can still be read.
pub fn read_subdocuments(text: &str) -> Result<Vec<SubdocumentInfo>> {
    let mut parser = YamlParser::new(text);
    let mut documents = Vec::new();
    match parser.next_event()? {
        Event::StreamStart => {}
        other => {
            return Err(parser.error(format!("Expected the start of a YAML stream, got {}", other.name())));
        }
    }
    loop {
        let event = match parser.next_event() {
            Ok(event) => event,
            Err(err) if documents.is_empty() => return Err(err),
            Err(err) => {
                tracing::warn!("Stopped reading YAML stream: {err}");
                documents.push(SubdocumentInfo::failed(String::new(), err));
                break;
            }
        };
        match event {
            Event::StreamEnd => break,
            Event::DocumentStart => {}
            other => {
                return Err(parser.error(format!(
                    "Unexpected YAML event {} between documents",
                    other.name()
                )));
            }
        }
        let events = match collect_document(&mut parser) {
            Ok(events) => events,
            Err(err) if documents.is_empty() => return Err(err),
            Err(err) => {
                documents.push(SubdocumentInfo::failed(String::new(), err));
                break;
            }
        };
        let info = match render_events(&events) {
            Ok(yaml) => match inspect_envelope(&yaml) {
                Ok((doctype, mdversion)) => SubdocumentInfo {
                    doctype: Some(doctype),
                    mdversion,
                    yaml,
                    error: None,
                },
                Err(err) => SubdocumentInfo::failed(yaml, err),
            },
            Err(err) => SubdocumentInfo::failed(String::new(), err),
        };
        tracing::debug!(
            doctype = ?info.doctype,
            mdversion = info.mdversion,
            ok = info.error.is_none(),
            "read subdocument"
        );
        documents.push(info);
    }
    Ok(documents)
}

/// Read every event of a document whose start was already consumed,
/// up to and excluding its end.
fn collect_document(parser: &mut YamlParser) -> Result<Vec<(Event, Mark)>> {
    let mut events = Vec::new();
    loop {
        let event = parser.next_event()?;
        if event == Event::DocumentEnd {
            return Ok(events);
        }
        if event == Event::StreamEnd {
            return Err(parser.error("Unexpected end of the YAML stream inside a document"));
        }
        events.push((event, parser.mark()));
    }
}

/// Write the events of one document back out as a YAML document.
///
/// Fails for valid YAML that modulemd never uses, such as a collection
/// as a mapping key.
fn render_events(events: &[(Event, Mark)]) -> Result<String> {
    let mut emitter = Emitter::new();
    emitter.start_stream()?;
    emitter.start_document()?;
    for (event, mark) in events {
        let written = match event {
            Event::MappingStart => emitter.start_mapping(CollectionStyle::Block),
            Event::MappingEnd => emitter.end_mapping(),
            Event::SequenceStart => emitter.start_sequence(CollectionStyle::Block),
            Event::SequenceEnd => emitter.end_sequence(),
            Event::Scalar { value, style } => {
                let style = match style {
                    ScalarStyle::Plain => ScalarStyle::Plain,
                    _ => ScalarStyle::DoubleQuoted,
                };
                emitter.scalar(value, style)
            }
            other => Err(Error::Emit(format!(
                "Unexpected YAML event {} inside a document",
                other.name()
            ))),
        };
        written.map_err(|err| Error::wrap(format!("At {mark}"), err))?;
    }
    emitter.end_document()?;
    emitter.end_stream()?;
    emitter.finish()
}

/// Identify a buffered document from its top-level `document` and
/// `version` keys.
fn inspect_envelope(yaml: &str) -> Result<(DocumentType, u64)> {
    let mut parser = YamlParser::new(yaml);
    for expected in [Event::StreamStart, Event::DocumentStart] {
        let event = parser.next_event()?;
        if event != expected {
            return Err(parser.error(format!("Expected {}, got {}", expected.name(), event.name())));
        }
    }
    parser.expect_mapping_start("the document envelope")?;

    let mut doctype: Option<(String, Mark)> = None;
    let mut version: Option<(u64, Mark)> = None;
    let mut has_data = false;
    while let Some(key) = parser.next_key()? {
        let seen = match key.as_str() {
            "document" => doctype.is_some(),
            "version" => version.is_some(),
            "data" => has_data,
            _ => return Err(parser.error(format!("Unexpected key in document: {key}"))),
        };
        if seen {
            return Err(parser.error(format!("Document contains more than one {key} key")));
        }
        match key.as_str() {
            "document" => doctype = Some((parser.parse_string()?, parser.mark())),
            "version" => version = Some((parser.parse_uint64()?, parser.mark())),
            _ => {
                has_data = true;
                parser.skip_value()?;
            }
        }
    }

    let missing = |key: &str| Error::MissingRequired {
        key: key.to_string(),
        mark: parser.mark(),
    };
    let Some((doctype, doctype_mark)) = doctype else {
        return Err(missing("document"));
    };
    let Some((version, version_mark)) = version else {
        return Err(missing("version"));
    };
    if !has_data {
        return Err(missing("data"));
    }
    let doctype = DocumentType::from_str(&doctype).map_err(|_| Error::UnknownDocumentType {
        doctype,
        mark: doctype_mark,
    })?;
    if !doctype.supported_versions().contains(&version) {
        return Err(Error::UnknownVersion {
            doctype: doctype.to_string(),
            version,
            mark: version_mark,
        });
    }
    Ok((doctype, version))
}
