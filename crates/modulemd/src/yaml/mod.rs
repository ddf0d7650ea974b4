// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

//! Typed primitives over a streaming YAML event parser and emitter.
//!
//! Every document parser in this crate pulls events through [`YamlParser`]
//! and every document writer pushes them through [`Emitter`]; nothing else
//! touches the underlying YAML library.

mod emitter;
mod parser;
mod quoting;

pub use emitter::{CollectionStyle, Emitter, ScalarStyle};
pub use parser::{Event, Mark, YamlParser};
pub use quoting::{is_numeric_like, is_reserved_word, needs_quoting};
