// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{Error, Result};

#[cfg(test)]
#[path = "./name_test.rs"]
mod name_test;

/// The longest context string accepted by the v3 schema.
pub const CONTEXT_MAX_LEN: usize = 10;

pub(crate) const AUTOGEN_MODULE_PREFIX: &str = "__unnamed_module_";
pub(crate) const AUTOGEN_STREAM_PREFIX: &str = "__unnamed_stream_";

static CONTEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]{1,10}$").expect("a valid regular expression"));

/// Validate a build context, which must be 1 to 10 ascii alphanumerics.
pub fn validate_context(context: &str) -> Result<()> {
    if CONTEXT.is_match(context) {
        return Ok(());
    }
    Err(Error::Validation(format!(
        "Invalid context {context:?}: must be 1 to {CONTEXT_MAX_LEN} alphanumeric characters"
    )))
}

/// Generate the context used for the n-th (1-based) expanded stream.
pub fn generated_context(prefix: &str, n: usize) -> String {
    format!("{prefix}{n:04}")
}

pub(crate) fn autogen_module_name(n: usize) -> String {
    format!("{AUTOGEN_MODULE_PREFIX}{n}")
}

pub(crate) fn autogen_stream_name(n: usize) -> String {
    format!("{AUTOGEN_STREAM_PREFIX}{n}")
}

/// Format an `N:S:V:C` identifier, leaving missing parts empty.
pub fn nsvc(module: Option<&str>, stream: Option<&str>, version: u64, context: Option<&str>) -> String {
    format!(
        "{}:{}:{}:{}",
        module.unwrap_or_default(),
        stream.unwrap_or_default(),
        version,
        context.unwrap_or_default()
    )
}

/// Check that an rpm artifact is in `name-epoch:version-release.arch` form.
pub fn validate_nevra(nevra: &str) -> bool {
    let Some((rest, arch)) = nevra.rsplit_once('.') else {
        return false;
    };
    let Some((rest, release)) = rest.rsplit_once('-') else {
        return false;
    };
    let Some((rest, version)) = rest.rsplit_once(':') else {
        return false;
    };
    let Some((name, epoch)) = rest.rsplit_once('-') else {
        return false;
    };
    !name.is_empty()
        && !epoch.is_empty()
        && epoch.bytes().all(|b| b.is_ascii_digit())
        && !version.is_empty()
        && !release.is_empty()
        && !arch.is_empty()
}
