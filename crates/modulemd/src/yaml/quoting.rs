// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use once_cell::sync::Lazy;
use regex::Regex;

#[cfg(test)]
#[path = "./quoting_test.rs"]
mod quoting_test;

static DECIMAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-+]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][-+]?[0-9]+)?$")
        .expect("a valid regular expression")
});
static SPECIAL_FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-+]?\.(inf|Inf|INF|nan|NaN|NAN)$").expect("a valid regular expression")
});
static RADIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-+]?(0x[0-9a-fA-F]+|0o[0-7]+|0b[01]+)$").expect("a valid regular expression")
});

/// Words that a YAML 1.1 or 1.2 reader resolves to a non-string value.
const RESERVED_WORDS: &[&str] = &[
    "~", "null", "Null", "NULL", "true", "True", "TRUE", "false", "False", "FALSE", "yes", "Yes",
    "YES", "no", "No", "NO", "on", "On", "ON", "off", "Off", "OFF", "y", "Y", "n", "N",
];

/// True if a plain scalar with this text would be read back as a number.
pub fn is_numeric_like(value: &str) -> bool {
    DECIMAL.is_match(value) || SPECIAL_FLOAT.is_match(value) || RADIX.is_match(value)
}

pub fn is_reserved_word(value: &str) -> bool {
    RESERVED_WORDS.contains(&value)
}

/// True if this text must be quoted to survive a round trip as a string.
pub fn needs_quoting(value: &str) -> bool {
    value.is_empty() || is_numeric_like(value) || is_reserved_word(value)
}

/// True if this text can be written as a plain scalar without changing
/// the structure of the document around it.
pub(super) fn plain_allowed(value: &str, flow: bool) -> bool {
    let Some(first) = value.chars().next() else {
        return false;
    };
    let last = value.chars().last().unwrap_or(first);
    if first.is_whitespace() || last.is_whitespace() || last == ':' {
        return false;
    }
    if value.starts_with("---") || value.starts_with("...") {
        return false;
    }
    let leading_dash_ok = first == '-' && value.len() > 1 && !value[1..].starts_with(' ');
    if "-?:,[]{}#&*!|>'\"%@`".contains(first) && !leading_dash_ok {
        return false;
    }
    if value.contains(": ") || value.contains(" #") {
        return false;
    }
    if flow && value.contains([',', '[', ']', '{', '}']) {
        return false;
    }
    value.chars().all(is_printable) && !value.contains('\t')
}

pub(super) fn is_printable(c: char) -> bool {
    match c {
        '\u{0}'..='\u{1f}' | '\u{7f}' | '\u{85}' | '\u{2028}' | '\u{2029}' | '\u{feff}' => false,
        '\u{80}'..='\u{9f}' => false,
        _ => true,
    }
}
