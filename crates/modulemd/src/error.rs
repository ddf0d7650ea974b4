// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::yaml::Mark;

#[cfg(test)]
#[path = "./error_test.rs"]
mod error_test;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Diagnostic, Debug, Error)]
pub enum Error {
    #[error("Failed to open file {0:?}")]
    #[diagnostic(code(modulemd::open))]
    Open(PathBuf, #[source] std::io::Error),
    #[error("Unparseable YAML: {0}")]
    #[diagnostic(code(modulemd::unparseable))]
    Unparseable(String),
    #[error("{message} ({mark})")]
    #[diagnostic(code(modulemd::parse))]
    Parse { message: String, mark: Mark },
    #[error("Missing required key: {key} ({mark})")]
    #[diagnostic(code(modulemd::missing_required))]
    MissingRequired { key: String, mark: Mark },
    #[error("Unknown document type: {doctype} ({mark})")]
    #[diagnostic(
        code(modulemd::unknown_document_type),
        help("expected one of modulemd, modulemd-defaults, modulemd-translations or modulemd-packager")
    )]
    UnknownDocumentType { doctype: String, mark: Mark },
    #[error("Unknown {doctype} document version: {version} ({mark})")]
    #[diagnostic(code(modulemd::unknown_version))]
    UnknownVersion { doctype: String, version: u64, mark: Mark },
    #[error("{0}")]
    #[diagnostic(code(modulemd::validation))]
    Validation(String),
    #[error("{0}")]
    #[diagnostic(code(modulemd::upgrade))]
    Upgrade(String),
    #[error("Unexpected key in {context}: {key} ({mark})")]
    #[diagnostic(
        code(modulemd::unknown_attribute),
        help("unknown keys are only accepted when reading in lenient mode")
    )]
    UnknownAttribute {
        key: String,
        context: String,
        mark: Mark,
    },
    #[error("Priority {priority} is outside of the accepted range {min}..={max}")]
    #[diagnostic(code(modulemd::priority_out_of_range))]
    PriorityOutOfRange { priority: i64, min: i64, max: i64 },
    #[error("No module objects have been added to the prioritizer")]
    #[diagnostic(code(modulemd::nothing_to_prioritize))]
    NothingToPrioritize,
    #[error("{0}")]
    #[diagnostic(code(modulemd::emit))]
    Emit(String),
}

/// The broad category of an [`Error`], independent of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum ErrorKind {
    #[strum(serialize = "OpenError")]
    Open,
    #[strum(serialize = "UnparseableError")]
    Unparseable,
    #[strum(serialize = "ParseError")]
    Parse,
    #[strum(serialize = "MissingRequired")]
    MissingRequired,
    #[strum(serialize = "UnknownDocumentType")]
    UnknownDocumentType,
    #[strum(serialize = "UnknownVersion")]
    UnknownVersion,
    #[strum(serialize = "ValidationError")]
    Validation,
    #[strum(serialize = "UpgradeError")]
    Upgrade,
    #[strum(serialize = "UnknownAttribute")]
    UnknownAttribute,
    #[strum(serialize = "PriorityOutOfRange")]
    PriorityOutOfRange,
    #[strum(serialize = "NothingToPrioritize")]
    NothingToPrioritize,
    #[strum(serialize = "EmitError")]
    Emit,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Open(..) => ErrorKind::Open,
            Error::Unparseable(_) => ErrorKind::Unparseable,
            Error::Parse { .. } => ErrorKind::Parse,
            Error::MissingRequired { .. } => ErrorKind::MissingRequired,
            Error::UnknownDocumentType { .. } => ErrorKind::UnknownDocumentType,
            Error::UnknownVersion { .. } => ErrorKind::UnknownVersion,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Upgrade(_) => ErrorKind::Upgrade,
            Error::UnknownAttribute { .. } => ErrorKind::UnknownAttribute,
            Error::PriorityOutOfRange { .. } => ErrorKind::PriorityOutOfRange,
            Error::NothingToPrioritize => ErrorKind::NothingToPrioritize,
            Error::Emit(_) => ErrorKind::Emit,
        }
    }

    /// Prefix the message of this error, keeping its kind.
    ///
    /// Errors that carry structured data rather than a message are
    /// returned unchanged.
    pub fn wrap<S: AsRef<str>>(prefix: S, err: Self) -> Self {
        let prefix = prefix.as_ref();
        match err {
            Error::Validation(msg) => Error::Validation(format!("{prefix}: {msg}")),
            Error::Upgrade(msg) => Error::Upgrade(format!("{prefix}: {msg}")),
            Error::Emit(msg) => Error::Emit(format!("{prefix}: {msg}")),
            Error::Unparseable(msg) => Error::Unparseable(format!("{prefix}: {msg}")),
            Error::Parse { message, mark } => Error::Parse {
                message: format!("{prefix}: {message}"),
                mark,
            },
            other => other,
        }
    }
}
