// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use std::collections::BTreeMap;

use crate::index::ModuleIndex;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./merger_test.rs"]
mod merger_test;

pub const MERGER_PRIORITY_MIN: i64 = 0;
pub const MERGER_PRIORITY_MAX: i64 = 1000;

/// Combines indexes from several repositories into one.
///
/// Each index is associated with a priority. Indexes of equal priority
/// are peers and must agree with each other, while the streams of an
/// index of higher priority replace those of lower priority. Defaults
/// are merged across every priority the way [`Defaults::merge`] does.
///
/// [`Defaults::merge`]: crate::Defaults::merge
#[derive(Debug, Clone, Default)]
pub struct ModuleIndexMerger {
    tiers: BTreeMap<i64, Vec<ModuleIndex>>,
}

impl ModuleIndexMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an index to be merged at the given priority.
    pub fn associate_index(&mut self, index: ModuleIndex, priority: i64) -> Result<()> {
        if !(MERGER_PRIORITY_MIN..=MERGER_PRIORITY_MAX).contains(&priority) {
            return Err(Error::PriorityOutOfRange {
                priority,
                min: MERGER_PRIORITY_MIN,
                max: MERGER_PRIORITY_MAX,
            });
        }
        self.tiers.entry(priority).or_default().push(index);
        Ok(())
    }

    /// Merge every associated index, leaving conflicting default streams
    /// unset.
    pub fn resolve(&self) -> Result<ModuleIndex> {
        self.resolve_ext(false)
    }

    /// Merge every associated index.
    ///
    /// With `strict_default_streams`, two defaults of the same age that
    /// disagree on the default stream are an error rather than leaving
    /// the stream unset.
    pub fn resolve_ext(&self, strict_default_streams: bool) -> Result<ModuleIndex> {
        let mut merged = ModuleIndex::new();
        for (priority, indexes) in &self.tiers {
            tracing::debug!(priority, count = indexes.len(), "merging priority level");
            let mut tier = ModuleIndex::new();
            for index in indexes {
                check_peer_conflicts(&tier, index)?;
                tier.merge(index, false, strict_default_streams)?;
            }
            // Streams of a higher tier replace those with the same NSVC;
            // defaults are combined by their modification time.
            merged.merge(&tier, false, strict_default_streams)?;
        }
        Ok(merged)
    }
}

/// Fail if `index` holds a stream that is already in `tier` under the
/// same name, stream, version and context but with other content.
fn check_peer_conflicts(tier: &ModuleIndex, index: &ModuleIndex) -> Result<()> {
    for module in index.modules() {
        let Some(existing) = tier.get_module(module.module_name()) else {
            continue;
        };
        for stream in module.streams() {
            let Some(stream_name) = stream.stream_name() else {
                continue;
            };
            let peer = existing.get_stream_by_nsvc(stream_name, stream.version(), stream.context());
            match peer {
                Some(peer) if peer.mdversion() == stream.mdversion() && peer != stream => {
                    return Err(Error::Validation(format!(
                        "Stream {} differs between indexes of the same priority",
                        stream.nsvc_as_string().unwrap_or_default()
                    )));
                }
                _ => {}
            }
        }
    }
    Ok(())
}
