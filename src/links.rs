// 🧾 Link Table - identity_id → every external identifier we know
// Long form: one row per present identifier. Blank identifiers produce
// no row at all.

use crate::merge::MergedRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdType {
    /// Source A primary id
    Primary,

    /// Source A alternate id
    Alt,

    /// Source B sail number
    SourceBSailNo,
}

impl IdType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdType::Primary => "primary",
            IdType::Alt => "alt",
            IdType::SourceBSailNo => "source_b_sail_no",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
    pub identity_id: String,
    pub id_type: IdType,
    pub external_value: String,
}

/// Identifier entries for one merged record: primary, alt, sail number
pub fn link_entries(record: &MergedRecord) -> Vec<LinkEntry> {
    let candidates = [
        (IdType::Primary, Some(record.source_a.external_id.as_str())),
        (IdType::Alt, record.source_a.alt_id.as_deref()),
        (
            IdType::SourceBSailNo,
            record.source_b.as_ref().map(|b| b.record.sail_no.as_str()),
        ),
    ];

    candidates
        .into_iter()
        .filter_map(|(id_type, value)| {
            let value = value?.trim();
            if value.is_empty() {
                return None;
            }
            Some(LinkEntry {
                identity_id: record.identity_id.clone(),
                id_type,
                external_value: value.to_string(),
            })
        })
        .collect()
}

pub fn build_link_table(records: &[MergedRecord]) -> Vec<LinkEntry> {
    records.iter().flat_map(link_entries).collect()
}

// ============================================================================
// TESTS
// ============================================================================
