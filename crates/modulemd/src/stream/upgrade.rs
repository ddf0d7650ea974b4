// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use itertools::Itertools;

use super::{ModuleStreamV1, ModuleStreamV2, ModuleStreamV3};
use crate::build_config::BuildConfig;
use crate::dependencies::{Dependencies, StreamSet};
use crate::name::generated_context;
use crate::{Error, Result};

/// The context prefix used for streams expanded from a v2 stream.
pub const DEFAULT_CONTEXT_PREFIX: &str = "AUTO";

pub(crate) fn v1_to_v2(from: &ModuleStreamV1) -> Result<ModuleStreamV2> {
    let mut to = ModuleStreamV2 {
        common: from.common.clone(),
        servicelevels: from.servicelevels.clone(),
        ..Default::default()
    };
    if !from.buildtime_deps.is_empty() || !from.runtime_deps.is_empty() {
        let mut deps = Dependencies::default();
        for (module, stream) in &from.buildtime_deps {
            deps.add_buildtime_stream(module, stream)?;
        }
        for (module, stream) in &from.runtime_deps {
            deps.add_runtime_stream(module, stream)?;
        }
        to.add_dependencies(deps);
    }
    Ok(to)
}

/// Expand a v2 stream into one v3 stream per concrete build configuration.
pub(crate) fn v2_to_v3(from: &ModuleStreamV2, context_prefix: &str) -> Result<Vec<ModuleStreamV3>> {
    let configs = expand_dependencies(from, context_prefix)
        .map_err(|err| Error::wrap("Unable to expand v2 to v3 stream dependencies", err))?;
    let mut streams = Vec::with_capacity(configs.len());
    for config in configs {
        let mut common = from.common.clone();
        common.context = Some(config.context);
        let stream = ModuleStreamV3 {
            common,
            platform: Some(config.platform),
            buildtime_requires: config.buildtime_requires,
            runtime_requires: config.runtime_requires,
            rpm_artifact_map: from.rpm_artifact_map.clone(),
        };
        stream.validate()?;
        streams.push(stream);
    }
    Ok(streams)
}

/// Compute the build configurations that a v2 stream's dependencies
/// describe, in a stable order and with their contexts assigned.
pub fn expand_dependencies(from: &ModuleStreamV2, context_prefix: &str) -> Result<Vec<BuildConfig>> {
    if from.dependencies.is_empty() {
        return Err(Error::Upgrade("Stream v2 has no dependencies.".into()));
    }

    let mut all = Vec::new();
    for (n, deps) in from.dependencies.iter().enumerate() {
        tracing::trace!("expanding stream v2 dependency #{}", n + 1);
        if deps.buildtime.is_empty() && deps.runtime.is_empty() {
            return Err(Error::Upgrade("Stream v2 has no module dependencies.".into()));
        }
        if !deps.buildtime.contains_key("platform") && !deps.runtime.contains_key("platform") {
            return Err(Error::Upgrade("Stream v2 has no platform dependencies.".into()));
        }
        let expanded = expand_one(deps)?;
        let resolved = resolve_platforms(expanded)
            .map_err(|err| Error::wrap("Unable to resolve platform for expanded dependencies", err))?;
        tracing::trace!(count = resolved.len(), "stream v2 dependency #{} expanded", n + 1);
        all.extend(resolved);
    }

    let mut deduped: Vec<BuildConfig> = Vec::with_capacity(all.len());
    for config in all {
        if !deduped.contains(&config) {
            deduped.push(config);
        }
    }

    match (deduped.as_mut_slice(), from.common.context.as_deref()) {
        ([only], Some(context)) => only.context = context.to_string(),
        (configs, _) => {
            for (i, config) in configs.iter_mut().enumerate() {
                config.context = generated_context(context_prefix, i + 1);
            }
        }
    }
    tracing::debug!(count = deduped.len(), "expanded v2 stream dependencies");
    Ok(deduped)
}

#[derive(Clone, Copy)]
enum Phase {
    Buildtime,
    Runtime,
}

/// The cartesian product of every stream of every module in one set of
/// dependencies. Each axis holds the streams of one module; later
/// modules vary slowest.
fn expand_one(deps: &Dependencies) -> Result<Vec<BuildConfig>> {
    let mut axes: Vec<(Phase, &str, Vec<&str>)> = Vec::new();
    for (phase, requirements) in [(Phase::Buildtime, &deps.buildtime), (Phase::Runtime, &deps.runtime)] {
        for (module, set) in requirements {
            axes.push((phase, module.as_str(), concrete_streams(phase, module, set)?));
        }
    }

    let combinations = axes
        .iter()
        .rev()
        .map(|(_, _, streams)| streams.iter().copied())
        .multi_cartesian_product();
    let mut configs = Vec::new();
    for combination in combinations {
        let mut config = BuildConfig::default();
        for ((phase, module, _), stream) in axes.iter().rev().zip(combination) {
            match phase {
                Phase::Buildtime => config.add_buildtime_requirement(*module, stream),
                Phase::Runtime => config.add_runtime_requirement(*module, stream),
            }
        }
        configs.push(config);
    }
    Ok(configs)
}

fn concrete_streams<'a>(phase: Phase, module: &str, set: &'a StreamSet) -> Result<Vec<&'a str>> {
    let which = match phase {
        Phase::Buildtime => "buildtime",
        Phase::Runtime => "runtime",
    };
    match set {
        StreamSet::Exclude(streams) => Err(Error::Upgrade(format!(
            "Cannot expand module {which} dependency {module} using stream exclusion (-{}).",
            streams.iter().next().map(String::as_str).unwrap_or_default()
        ))),
        StreamSet::Include(streams) if streams.is_empty() => Err(Error::Upgrade(format!(
            "Cannot expand module {which} dependency {module} for all active existing streams."
        ))),
        StreamSet::Include(streams) => Ok(streams.iter().map(String::as_str).collect()),
    }
}

/// Move the `platform` requirement of each configuration into its
/// platform field, dropping configurations that build and run on
/// different platforms.
fn resolve_platforms(configs: Vec<BuildConfig>) -> Result<Vec<BuildConfig>> {
    let mut resolved = Vec::with_capacity(configs.len());
    for mut config in configs {
        let build = config.buildtime_requires.remove("platform");
        let run = config.runtime_requires.remove("platform");
        let platform = match (build, run) {
            (Some(build), Some(run)) if build != run => {
                tracing::trace!("dropping expansion with build ({build}) and run ({run}) platform mismatch");
                continue;
            }
            (Some(platform), _) | (None, Some(platform)) => platform,
            (None, None) => return Err(Error::Upgrade("Internal error: platform missing.".into())),
        };
        config.platform = platform;
        resolved.push(config);
    }
    if resolved.is_empty() {
        return Err(Error::Upgrade("Stream v2 dependencies expanded to nothing.".into()));
    }
    Ok(resolved)
}
