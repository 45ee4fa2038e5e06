// 🏷️ Name Aliases - Known spellings that differ between the rosters
//
// Maps a source B spelling to the source A spelling of the same athlete.
// Loaded from JSON so new cases don't require a rebuild.
//
// Example file:
// {
//   "Coraline Foveau": "Coco Foveau",
//   "Michael Friedl (M)": "Mike Friedl (sr)"
// }

use crate::records::SourceBRecord;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameAliases {
    map: BTreeMap<String, String>,
}

impl NameAliases {
    pub fn new() -> Self {
        NameAliases { map: BTreeMap::new() }
    }

    /// Load aliases from a JSON object file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read aliases file: {:?}", path.as_ref()))?;

        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let map: BTreeMap<String, String> =
            serde_json::from_str(content).context("Failed to parse aliases JSON")?;

        Ok(NameAliases { map })
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        NameAliases {
            map: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, source_b_name: &str, source_a_name: &str) {
        self.map
            .insert(source_b_name.to_string(), source_a_name.to_string());
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Exact lookup, no chaining: an alias target is never re-aliased
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.map.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Rewrite source B names in place; returns how many were changed
    pub fn apply(&self, records: &mut [SourceBRecord]) -> usize {
        let mut rewritten = 0;

        for record in records.iter_mut() {
            if let Some(target) = self.map.get(&record.name) {
                debug!(from = %record.name, to = %target, "applying name alias");
                record.name = target.clone();
                rewritten += 1;
            }
        }

        rewritten
    }
}

// ============================================================================
// TESTS
// ============================================================================
