// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

//! Check that modulemd YAML files can be read and validated.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, ValueHint};
use colored::Colorize;
use miette::{Context, IntoDiagnostic, Result};
use modulemd::{ModuleIndex, ReadOptions, SubdocumentInfo};

/// Validate modulemd yaml files
#[derive(Debug, Parser)]
#[clap(name = "modulemd-validator", version, about)]
pub struct Opt {
    /// Only print the files that fail
    #[clap(short, long, conflicts_with_all = ["verbose", "debug"])]
    pub quiet: bool,

    /// Log more about what is being read, may be repeated
    #[clap(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Log everything, including each step of the parser
    #[clap(long)]
    pub debug: bool,

    /// Treat unknown attributes as errors
    #[clap(long, env = "MODULEMD_STRICT")]
    pub strict: bool,

    /// Yaml file(s) to validate
    #[arg(required = true, value_hint = ValueHint::FilePath, value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

impl Opt {
    /// The tracing directives selected by the verbosity flags.
    pub fn log_directives(&self) -> &'static str {
        if self.quiet {
            return "modulemd=error";
        }
        if self.debug {
            return "modulemd=trace";
        }
        match self.verbose {
            0 => "modulemd=warn",
            1 => "modulemd=info",
            _ => "modulemd=debug",
        }
    }
}

/// Install a stderr logger for the verbosity flags of `opt`.
///
/// `MODULEMD_LOG` adds directives to those chosen by the flags and
/// `RUST_LOG` replaces them entirely.
pub fn configure_logging(opt: &Opt) -> Result<()> {
    use tracing_subscriber::layer::SubscriberExt;

    let mut directives = opt.log_directives().to_string();
    if let Ok(extra) = std::env::var("MODULEMD_LOG") {
        directives = format!("{directives},{extra}");
    }
    if let Ok(overrides) = std::env::var("RUST_LOG") {
        directives = overrides;
    }
    let env_filter = tracing_subscriber::filter::EnvFilter::new(directives);
    let registry = tracing_subscriber::Registry::default().with(env_filter);
    let mut fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .without_time();
    if !opt.debug {
        fmt_layer = fmt_layer.with_target(false);
    }
    tracing::subscriber::set_global_default(registry.with(fmt_layer))
        .into_diagnostic()
        .wrap_err("Failed to set default logger")
}

/// The outcome of validating one file.
#[derive(Debug)]
pub enum Outcome {
    /// Every document was read and is valid.
    Valid,
    /// The file could not be read as YAML at all.
    Unreadable(modulemd::Error),
    /// Some documents failed, each reported with its own error.
    Invalid(Vec<SubdocumentInfo>),
}

/// Read every document of a file into a scratch index.
pub fn validate_file(path: &Path, options: ReadOptions) -> Outcome {
    let mut index = ModuleIndex::new();
    match index.update_from_file(path, options) {
        Err(err) => Outcome::Unreadable(err),
        Ok(failures) if failures.is_empty() => Outcome::Valid,
        Ok(failures) => Outcome::Invalid(failures),
    }
}

/// Validate every file named by `opt`, reporting on `out`.
///
/// Returns the exit code: 0 when every file is valid and 1 otherwise.
pub fn run(opt: &Opt, out: &mut impl Write) -> Result<i32> {
    let options = ReadOptions {
        strict: opt.strict,
        ..Default::default()
    };
    let mut code = 0;
    for path in &opt.files {
        tracing::debug!("validating {}", path.display());
        match validate_file(path, options) {
            Outcome::Valid => {
                if !opt.quiet {
                    writeln!(out, "{} {}", "OK".green(), path.display()).into_diagnostic()?;
                }
            }
            Outcome::Unreadable(err) => {
                code = 1;
                writeln!(
                    out,
                    "{} {}:\n{} {err}",
                    "Failed".red(),
                    path.display(),
                    "----->".red()
                )
                .into_diagnostic()?;
            }
            Outcome::Invalid(failures) => {
                code = 1;
                writeln!(
                    out,
                    "{} {}: {} document(s) failed",
                    "Failed".red(),
                    path.display(),
                    failures.len()
                )
                .into_diagnostic()?;
                for failure in &failures {
                    write_failure(out, failure)?;
                }
            }
        }
    }
    Ok(code)
}

fn write_failure(out: &mut impl Write, failure: &SubdocumentInfo) -> Result<()> {
    let message = failure
        .error()
        .map(ToString::to_string)
        .unwrap_or_else(|| "unknown error".to_string());
    if !failure.yaml().is_empty() {
        write!(out, "{}", failure.yaml()).into_diagnostic()?;
    }
    writeln!(out, "{} {message}", "----->".red()).into_diagnostic()
}
