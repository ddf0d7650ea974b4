// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::defaults::Defaults;
use crate::document::Document;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./prioritizer_test.rs"]
mod prioritizer_test;

pub const PRIORITIZER_PRIORITY_MIN: i64 = 0;
pub const PRIORITIZER_PRIORITY_MAX: i64 = 1000;

/// Resolves flat lists of documents added at different priorities.
///
/// This predates [`crate::ModuleIndexMerger`] and works on plain
/// [`Document`] lists rather than indexes.
#[derive(Debug, Clone, Default)]
pub struct Prioritizer {
    tiers: BTreeMap<i64, Vec<Document>>,
}

impl Prioritizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add documents at a priority, where a higher priority wins.
    ///
    /// Documents added at a priority that already holds some are
    /// combined with them. When both hold a stream with the same
    /// `N:S:V:C`, the one that was there first is kept.
    pub fn add(&mut self, objects: Vec<Document>, priority: i64) -> Result<()> {
        if !(PRIORITIZER_PRIORITY_MIN..=PRIORITIZER_PRIORITY_MAX).contains(&priority) {
            return Err(Error::PriorityOutOfRange {
                priority,
                min: PRIORITIZER_PRIORITY_MIN,
                max: PRIORITIZER_PRIORITY_MAX,
            });
        }
        let mut combined = self.tiers.get(&priority).cloned().unwrap_or_default();
        combined.extend(objects);
        let merged = merge_defaults(dedupe(combined), None)?;
        tracing::debug!(priority, count = merged.len(), "prioritizer tier updated");
        self.tiers.insert(priority, merged);
        Ok(())
    }

    /// Combine every priority into one list of documents.
    ///
    /// Where priorities disagree the higher one wins, and of the streams
    /// that share a module, stream and context only the one with the
    /// highest version is kept.
    pub fn resolve(&self) -> Result<Vec<Document>> {
        let mut tiers = self.tiers.values().rev();
        let Some(highest) = tiers.next() else {
            return Err(Error::NothingToPrioritize);
        };
        let mut current = highest.clone();
        for lower in tiers {
            current = dedupe(merge_defaults(lower.clone(), Some(current))?);
        }
        Ok(keep_latest_versions(current))
    }
}

/// The identity used to spot duplicates within a list.
fn document_key(document: &Document) -> Option<String> {
    match document {
        Document::Stream(s) => s.nsvc_as_string().map(|k| format!("stream:{k}")),
        Document::Translation(t) => Some(format!("translation:{}:{}", t.module_name, t.module_stream)),
        Document::Defaults(_) => None,
    }
}

/// Drop every document whose key was already seen earlier in the list.
fn dedupe(documents: Vec<Document>) -> Vec<Document> {
    let mut seen = HashSet::new();
    documents
        .into_iter()
        .filter(|d| document_key(d).is_none_or(|key| seen.insert(key)))
        .collect()
}

/// Fold every defaults document for the same module into one, placing
/// the results after all other documents in module name order.
///
/// When `overrides` is given its documents take precedence over those of
/// `base`: they are listed first and their defaults replace the merged
/// defaults of `base` rather than being merged with them.
fn merge_defaults(base: Vec<Document>, overrides: Option<Vec<Document>>) -> Result<Vec<Document>> {
    let mut merged = Vec::new();
    let mut defaults: BTreeMap<String, Defaults> = BTreeMap::new();
    let mut overridden: BTreeMap<String, Defaults> = BTreeMap::new();

    let overrides = overrides.unwrap_or_default();
    for document in overrides {
        match document {
            Document::Defaults(d) => fold_defaults(&mut overridden, d)?,
            other => merged.push(other),
        }
    }
    for document in base {
        match document {
            Document::Defaults(d) => fold_defaults(&mut defaults, d)?,
            other => merged.push(other),
        }
    }
    defaults.extend(overridden);
    merged.extend(defaults.into_values().map(Document::Defaults));
    Ok(merged)
}

fn fold_defaults(into: &mut BTreeMap<String, Defaults>, defaults: Defaults) -> Result<()> {
    let name = defaults.module_name().to_string();
    let folded = match into.remove(&name) {
        Some(existing) => Defaults::merge(&defaults, &existing, false)?,
        None => defaults,
    };
    into.insert(name, folded);
    Ok(())
}

/// Keep only the newest version of each module stream and context,
/// preserving the order in which they first appear.
fn keep_latest_versions(documents: Vec<Document>) -> Vec<Document> {
    let mut latest: HashMap<(String, String, String), u64> = HashMap::new();
    for document in &documents {
        if let Some((key, version)) = stream_identity(document) {
            let entry = latest.entry(key).or_insert(version);
            *entry = (*entry).max(version);
        }
    }
    let mut kept = HashSet::new();
    documents
        .into_iter()
        .filter(|d| match stream_identity(d) {
            Some((key, version)) => latest.get(&key) == Some(&version) && kept.insert(key),
            None => true,
        })
        .collect()
}

fn stream_identity(document: &Document) -> Option<((String, String, String), u64)> {
    let Document::Stream(stream) = document else {
        return None;
    };
    let key = (
        stream.module_name()?.to_string(),
        stream.stream_name()?.to_string(),
        stream.context().unwrap_or_default().to_string(),
    );
    Some((key, stream.version()))
}
