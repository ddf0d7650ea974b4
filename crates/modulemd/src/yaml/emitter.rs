// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use std::fmt::Write;

use super::quoting::{is_printable, needs_quoting, plain_allowed};
use crate::{Error, Result};

#[cfg(test)]
#[path = "./emitter_test.rs"]
mod emitter_test;

const BEST_WIDTH: usize = 80;

/// How a scalar should be written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ScalarStyle {
    /// Plain, unless the text would read back as something other than a
    /// string, in which case it is double-quoted.
    #[default]
    Any,
    /// Plain whenever the YAML syntax permits it, even for numbers.
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CollectionStyle {
    #[default]
    Block,
    Flow,
}

#[derive(Debug, Clone)]
enum Node {
    Scalar(String, ScalarStyle),
    Mapping(Vec<(String, ScalarStyle, Node)>, CollectionStyle),
    Sequence(Vec<Node>, CollectionStyle),
}

#[derive(Debug)]
enum Frame {
    Document(Option<Node>),
    Mapping {
        entries: Vec<(String, ScalarStyle, Node)>,
        key: Option<(String, ScalarStyle)>,
        style: CollectionStyle,
    },
    Sequence {
        items: Vec<Node>,
        style: CollectionStyle,
    },
}

/// A push-style YAML writer with deterministic layout.
///
/// Events are collected per document and rendered when the document ends:
/// two-space indentation, block sequences aligned with their parent key,
/// and scalars quoted only when a plain rendering would be misread.
#[derive(Debug, Default)]
pub struct Emitter {
    out: String,
    stack: Vec<Frame>,
    stream_started: bool,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_stream(&mut self) -> Result<()> {
        if self.stream_started {
            return Err(Error::Emit("The YAML stream was already started".into()));
        }
        self.stream_started = true;
        Ok(())
    }

    pub fn end_stream(&mut self) -> Result<()> {
        if !self.stack.is_empty() {
            return Err(Error::Emit(
                "The YAML stream was ended inside of a document".into(),
            ));
        }
        Ok(())
    }

    pub fn start_document(&mut self) -> Result<()> {
        if !self.stack.is_empty() {
            return Err(Error::Emit("Documents cannot be nested".into()));
        }
        self.stack.push(Frame::Document(None));
        Ok(())
    }

    pub fn end_document(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(Frame::Document(Some(root))) if self.stack.is_empty() => {
                self.out.push_str("---\n");
                render_root(&root, &mut self.out)?;
                self.out.push_str("...\n");
                Ok(())
            }
            Some(Frame::Document(None)) => Err(Error::Emit("Cannot emit an empty document".into())),
            _ => Err(Error::Emit("Unbalanced end of document".into())),
        }
    }

    pub fn start_mapping(&mut self, style: CollectionStyle) -> Result<()> {
        self.check_value_position("mapping")?;
        self.stack.push(Frame::Mapping {
            entries: Vec::new(),
            key: None,
            style,
        });
        Ok(())
    }

    pub fn end_mapping(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(Frame::Mapping {
                entries,
                key: None,
                style,
            }) => self.push_node(Node::Mapping(entries, style)),
            Some(Frame::Mapping { key: Some(_), .. }) => {
                Err(Error::Emit("Mapping ended with a key but no value".into()))
            }
            _ => Err(Error::Emit("Unbalanced end of mapping".into())),
        }
    }

    pub fn start_sequence(&mut self, style: CollectionStyle) -> Result<()> {
        self.check_value_position("sequence")?;
        self.stack.push(Frame::Sequence {
            items: Vec::new(),
            style,
        });
        Ok(())
    }

    pub fn end_sequence(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(Frame::Sequence { items, style }) => self.push_node(Node::Sequence(items, style)),
            _ => Err(Error::Emit("Unbalanced end of sequence".into())),
        }
    }

    pub fn scalar<S: AsRef<str>>(&mut self, value: S, style: ScalarStyle) -> Result<()> {
        let value = value.as_ref().to_string();
        if let Some(Frame::Mapping { key: key @ None, .. }) = self.stack.last_mut() {
            *key = Some((value, style));
            return Ok(());
        }
        self.push_node(Node::Scalar(value, style))
    }

    /// Consume the emitter, returning everything written so far.
    pub fn finish(self) -> Result<String> {
        if !self.stack.is_empty() {
            return Err(Error::Emit("Unfinished YAML document".into()));
        }
        Ok(self.out)
    }

    pub fn key_value<V: AsRef<str>>(&mut self, key: &str, value: V) -> Result<()> {
        self.key_value_with_style(key, value, ScalarStyle::Any)
    }

    pub fn key_value_with_style<V: AsRef<str>>(
        &mut self,
        key: &str,
        value: V,
        style: ScalarStyle,
    ) -> Result<()> {
        self.scalar(key, ScalarStyle::Any)?;
        self.scalar(value, style)
    }

    pub fn key_value_if_set(&mut self, key: &str, value: Option<&str>) -> Result<()> {
        match value {
            Some(value) => self.key_value(key, value),
            None => Ok(()),
        }
    }

    /// Emit an integer value, which is never quoted.
    pub fn key_uint(&mut self, key: &str, value: u64) -> Result<()> {
        self.key_value_with_style(key, value.to_string(), ScalarStyle::Plain)
    }

    pub fn sequence<I, S>(&mut self, items: I, style: CollectionStyle) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.start_sequence(style)?;
        for item in items {
            self.scalar(item, ScalarStyle::Any)?;
        }
        self.end_sequence()
    }

    /// Emit `key:` followed by a block sequence of strings.
    pub fn string_set<I, S>(&mut self, key: &str, items: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.scalar(key, ScalarStyle::Any)?;
        self.sequence(items, CollectionStyle::Block)
    }

    pub fn string_set_if_non_empty<I, S>(&mut self, key: &str, items: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut items = items.into_iter().peekable();
        if items.peek().is_none() {
            return Ok(());
        }
        self.string_set(key, items)
    }

    /// Emit `key: [a, b]`.
    pub fn flow_string_set<I, S>(&mut self, key: &str, items: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.scalar(key, ScalarStyle::Any)?;
        self.sequence(items, CollectionStyle::Flow)
    }

    /// Emit the `document`/`version` envelope and the `data` key, leaving
    /// the emitter positioned for the data value.
    pub fn start_document_with_headers(&mut self, document: &str, version: u64) -> Result<()> {
        self.start_document()?;
        self.start_mapping(CollectionStyle::Block)?;
        self.key_value("document", document)?;
        self.key_uint("version", version)?;
        self.scalar("data", ScalarStyle::Any)
    }

    /// Close the envelope opened by [`Self::start_document_with_headers`].
    pub fn end_document_with_headers(&mut self) -> Result<()> {
        self.end_mapping()?;
        self.end_document()
    }

    /// Emit a free-form value tree.
    pub fn xmd(&mut self, value: &serde_yaml::Value) -> Result<()> {
        use serde_yaml::Value;
        match value {
            Value::Null => self.scalar("~", ScalarStyle::Plain),
            Value::Bool(b) => self.scalar(b.to_string(), ScalarStyle::Plain),
            Value::Number(n) => self.scalar(n.to_string(), ScalarStyle::Plain),
            Value::String(s) => self.scalar(s, ScalarStyle::Any),
            Value::Sequence(items) => {
                self.start_sequence(CollectionStyle::Block)?;
                for item in items {
                    self.xmd(item)?;
                }
                self.end_sequence()
            }
            Value::Mapping(mapping) => {
                self.start_mapping(CollectionStyle::Block)?;
                for (key, value) in mapping {
                    match key {
                        Value::String(s) => self.scalar(s, ScalarStyle::Any)?,
                        Value::Bool(b) => self.scalar(b.to_string(), ScalarStyle::Plain)?,
                        Value::Number(n) => self.scalar(n.to_string(), ScalarStyle::Plain)?,
                        _ => {
                            return Err(Error::Emit(
                                "Only scalar keys are supported in xmd mappings".into(),
                            ));
                        }
                    }
                    self.xmd(value)?;
                }
                self.end_mapping()
            }
            Value::Tagged(_) => Err(Error::Emit("Tagged values are not supported in xmd".into())),
        }
    }

    fn check_value_position(&self, what: &str) -> Result<()> {
        match self.stack.last() {
            None => Err(Error::Emit(format!("A {what} must be inside of a document"))),
            Some(Frame::Mapping { key: None, .. }) => Err(Error::Emit(format!(
                "A {what} cannot be used as a mapping key"
            ))),
            Some(Frame::Document(Some(_))) => Err(Error::Emit(
                "A document can only hold a single root node".into(),
            )),
            _ => Ok(()),
        }
    }

    fn push_node(&mut self, node: Node) -> Result<()> {
        match self.stack.last_mut() {
            Some(Frame::Document(root @ None)) => {
                *root = Some(node);
                Ok(())
            }
            Some(Frame::Mapping { entries, key, .. }) => match key.take() {
                Some((key, key_style)) => {
                    entries.push((key, key_style, node));
                    Ok(())
                }
                None => Err(Error::Emit("Mapping keys must be scalars".into())),
            },
            Some(Frame::Sequence { items, .. }) => {
                items.push(node);
                Ok(())
            }
            _ => Err(Error::Emit("A value was emitted outside of a document".into())),
        }
    }
}

fn render_root(node: &Node, out: &mut String) -> Result<()> {
    match node {
        Node::Mapping(entries, CollectionStyle::Block) if !entries.is_empty() => {
            render_block_mapping(entries, 0, out)
        }
        Node::Sequence(items, CollectionStyle::Block) if !items.is_empty() => {
            render_block_sequence(items, 0, out)
        }
        Node::Scalar(value, style) if matches!(style, ScalarStyle::Folded | ScalarStyle::Literal) => {
            out.push_str(&render_block_scalar(value, *style, 0)?);
            Ok(())
        }
        node => {
            out.push_str(&render_inline(node, false)?);
            out.push('\n');
            Ok(())
        }
    }
}

fn render_block_mapping(
    entries: &[(String, ScalarStyle, Node)],
    indent: usize,
    out: &mut String,
) -> Result<()> {
    for (key, key_style, value) in entries {
        let key_style = match key_style {
            ScalarStyle::Folded | ScalarStyle::Literal => ScalarStyle::DoubleQuoted,
            style => *style,
        };
        let _ = write!(
            out,
            "{:indent$}{}:",
            "",
            render_scalar(key, key_style, false),
            indent = indent
        );
        match value {
            Node::Mapping(entries, CollectionStyle::Block) if !entries.is_empty() => {
                out.push('\n');
                render_block_mapping(entries, indent + 2, out)?;
            }
            Node::Sequence(items, CollectionStyle::Block) if !items.is_empty() => {
                out.push('\n');
                render_block_sequence(items, indent, out)?;
            }
            Node::Scalar(value, style)
                if matches!(style, ScalarStyle::Folded | ScalarStyle::Literal) =>
            {
                out.push(' ');
                out.push_str(&render_block_scalar(value, *style, indent + 2)?);
            }
            node => {
                out.push(' ');
                out.push_str(&render_inline(node, false)?);
                out.push('\n');
            }
        }
    }
    Ok(())
}

fn render_block_sequence(items: &[Node], indent: usize, out: &mut String) -> Result<()> {
    for item in items {
        let _ = write!(out, "{:indent$}- ", "", indent = indent);
        match item {
            Node::Mapping(entries, CollectionStyle::Block) if !entries.is_empty() => {
                let mut nested = String::new();
                render_block_mapping(entries, indent + 2, &mut nested)?;
                out.push_str(&nested[indent + 2..]);
            }
            Node::Sequence(items, CollectionStyle::Block) if !items.is_empty() => {
                let mut nested = String::new();
                render_block_sequence(items, indent + 2, &mut nested)?;
                out.push_str(&nested[indent + 2..]);
            }
            Node::Scalar(value, style)
                if matches!(style, ScalarStyle::Folded | ScalarStyle::Literal) =>
            {
                out.push_str(&render_block_scalar(value, *style, indent + 2)?);
            }
            node => {
                out.push_str(&render_inline(node, false)?);
                out.push('\n');
            }
        }
    }
    Ok(())
}

fn render_inline(node: &Node, flow: bool) -> Result<String> {
    Ok(match node {
        Node::Scalar(value, style) => {
            let style = match style {
                ScalarStyle::Folded | ScalarStyle::Literal => ScalarStyle::DoubleQuoted,
                style => *style,
            };
            render_scalar(value, style, flow)
        }
        Node::Sequence(items, _) => {
            let items = items
                .iter()
                .map(|item| render_inline(item, true))
                .collect::<Result<Vec<_>>>()?;
            format!("[{}]", items.join(", "))
        }
        Node::Mapping(entries, _) => {
            let entries = entries
                .iter()
                .map(|(key, key_style, value)| {
                    let key_style = match key_style {
                        ScalarStyle::Folded | ScalarStyle::Literal => ScalarStyle::DoubleQuoted,
                        style => *style,
                    };
                    Ok(format!(
                        "{}: {}",
                        render_scalar(key, key_style, true),
                        render_inline(value, true)?
                    ))
                })
                .collect::<Result<Vec<_>>>()?;
            format!("{{{}}}", entries.join(", "))
        }
    })
}

/// Render a single-line scalar in the requested style, falling back to
/// double quotes whenever that style cannot represent the text.
fn render_scalar(value: &str, style: ScalarStyle, flow: bool) -> String {
    match style {
        ScalarStyle::Any if !needs_quoting(value) && plain_allowed(value, flow) => value.to_string(),
        ScalarStyle::Plain if plain_allowed(value, flow) => value.to_string(),
        ScalarStyle::SingleQuoted if value.chars().all(is_printable) => {
            format!("'{}'", value.replace('\'', "''"))
        }
        _ => double_quoted(value),
    }
}

fn double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            '\u{85}' => out.push_str("\\N"),
            '\u{2028}' => out.push_str("\\L"),
            '\u{2029}' => out.push_str("\\P"),
            c if !is_printable(c) && (c as u32) <= 0xff => {
                let _ = write!(out, "\\x{:02X}", c as u32);
            }
            c if !is_printable(c) => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Render a folded (`>`) or literal (`|`) block scalar, including the
/// header and trailing newline. Falls back to a double-quoted line when
/// the text cannot be represented as a block scalar.
fn render_block_scalar(value: &str, style: ScalarStyle, indent: usize) -> Result<String> {
    let (body, chomp) = match value.strip_suffix('\n') {
        Some(body) if !body.ends_with('\n') => (body, ""),
        Some(_) => return Ok(format!("{}\n", double_quoted(value))),
        None => (value, "-"),
    };
    let segments = body.split('\n').collect::<Vec<_>>();
    let representable = !body.is_empty()
        && !body.starts_with('\n')
        && segments.iter().all(|segment| {
            segment.chars().all(|c| is_printable(c) && c != '\t')
                && !segment.starts_with(' ')
                && !segment.ends_with(' ')
        });
    if !representable {
        return Ok(format!("{}\n", double_quoted(value)));
    }

    let mut out = String::new();
    let indicator = if style == ScalarStyle::Literal { '|' } else { '>' };
    let _ = writeln!(out, "{indicator}{chomp}");
    let pad = " ".repeat(indent);
    if style == ScalarStyle::Literal {
        for segment in segments {
            if segment.is_empty() {
                out.push('\n');
            } else {
                let _ = writeln!(out, "{pad}{segment}");
            }
        }
        return Ok(out);
    }

    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        for line in fold_line(segment, BEST_WIDTH.saturating_sub(indent).max(20)) {
            let _ = writeln!(out, "{pad}{line}");
        }
    }
    Ok(out)
}

/// Break a paragraph at single spaces so that folding it back joins the
/// pieces with exactly those spaces.
fn fold_line(segment: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    if segment.is_empty() {
        return lines;
    }
    let mut current = String::new();
    for (i, word) in segment.split(' ').enumerate() {
        if i == 0 {
            current.push_str(word);
            continue;
        }
        let fits = current.chars().count() + 1 + word.chars().count() <= width;
        if !fits && !word.is_empty() && !current.is_empty() && !current.ends_with(' ') {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        } else {
            current.push(' ');
            current.push_str(word);
        }
    }
    lines.push(current);
    lines
}
