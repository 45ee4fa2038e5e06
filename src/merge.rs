// 🔗 Merge - Join match results back to both rosters
// One MergedRecord per source A record, in source A order, with the
// derived identity id.

use crate::identity::identity_id;
use crate::matcher::{MatchResult, MatchStage};
use crate::nationality::NormalizedSourceB;
use crate::records::SourceARecord;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    pub source_a: SourceARecord,
    pub match_result: MatchResult,

    /// The consumed source B sailor (None when Unmatched)
    pub source_b: Option<NormalizedSourceB>,

    /// 8-digit id from source A name + year of birth
    pub identity_id: String,
}

impl MergedRecord {
    pub fn to_row(&self) -> MergedRow {
        let b = self.source_b.as_ref();

        MergedRow {
            source_a_name: self.source_a.name.clone(),
            matched_name: self.match_result.matched_name.clone(),
            score: self.match_result.score,
            stage: self.match_result.stage,
            source_a_year_of_birth: self.source_a.year_of_birth,
            source_a_country: self.source_a.country.clone(),
            source_a_nationality: self.source_a.nationality.clone(),
            source_a_external_id: self.source_a.external_id.clone(),
            source_a_alt_id: self.source_a.alt_id.clone(),
            source_b_sail_no: b.map(|s| s.record.sail_no.clone()),
            source_b_profile_url: b.map(|s| s.record.profile_url.clone()),
            source_b_year_of_birth: b.and_then(|s| s.record.year_of_birth),
            source_b_nationality_raw: b.map(|s| s.record.nationality_raw.clone()),
            source_b_country: b.map(|s| s.country.clone()),
            source_b_nationality_code: b.map(|s| s.nationality_code.clone()),
            identity_id: self.identity_id.clone(),
        }
    }
}

/// Flat CSV shape of a MergedRecord (column order = field order)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRow {
    pub source_a_name: String,
    pub matched_name: Option<String>,
    pub score: u8,
    pub stage: MatchStage,
    pub source_a_year_of_birth: Option<i32>,
    pub source_a_country: Option<String>,
    pub source_a_nationality: Option<String>,
    pub source_a_external_id: String,
    pub source_a_alt_id: Option<String>,
    pub source_b_sail_no: Option<String>,
    pub source_b_profile_url: Option<String>,
    pub source_b_year_of_birth: Option<i32>,
    pub source_b_nationality_raw: Option<String>,
    pub source_b_country: Option<String>,
    pub source_b_nationality_code: Option<String>,
    pub identity_id: String,
}

/// `results` must be the matcher output for `source_a`, same order
pub fn merge_records(
    source_a: &[SourceARecord],
    results: &[MatchResult],
    sailors: &[NormalizedSourceB],
) -> Result<Vec<MergedRecord>> {
    if source_a.len() != results.len() {
        bail!(
            "match results ({}) don't line up with source A records ({})",
            results.len(),
            source_a.len()
        );
    }

    // First occurrence per name, same rule as the candidate pool
    let mut by_name: HashMap<&str, &NormalizedSourceB> = HashMap::new();
    for sailor in sailors {
        by_name.entry(sailor.record.name.as_str()).or_insert(sailor);
    }

    let mut merged = Vec::with_capacity(source_a.len());

    for (record, result) in source_a.iter().zip(results) {
        if record.name != result.source_a_name {
            bail!(
                "match result for '{}' found where '{}' was expected",
                result.source_a_name,
                record.name
            );
        }

        let source_b = match result.matched_name.as_deref() {
            Some(name) => match by_name.get(name) {
                Some(sailor) => Some((*sailor).clone()),
                None => bail!("matched source B name '{}' is not in the roster", name),
            },
            None => None,
        };

        merged.push(MergedRecord {
            source_a: record.clone(),
            match_result: result.clone(),
            source_b,
            identity_id: identity_id(&record.name, record.year_of_birth),
        });
    }

    Ok(merged)
}

// ============================================================================
// TESTS
// ============================================================================
