// 🌍 Nationality Normalizer - Demonym → canonical country + code
//
// Source B publishes free-text nationalities ("French", " german ").
// Source A carries canonical codes ("FRA"). The registry bridges the two with
// a case/whitespace-insensitive exact lookup. No fuzzy matching here.

use crate::error::RosterError;
use crate::records::{CountryMapping, SourceBRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Source B record after the nationality join
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSourceB {
    pub record: SourceBRecord,
    pub country: String,
    pub nationality_code: String,
}

/// Result of normalizing a whole roster
#[derive(Debug, Clone, Default)]
pub struct NormalizationOutcome {
    /// Mapped records, input order preserved
    pub records: Vec<NormalizedSourceB>,

    /// Records whose demonym had no mapping (excluded from matching)
    pub dropped: Vec<SourceBRecord>,
}

impl NormalizationOutcome {
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }
}

#[derive(Debug, Clone)]
struct RegistryEntry {
    row: usize,
    country: String,
    nationality_code: String,
}

pub struct NationalityRegistry {
    by_demonym: HashMap<String, RegistryEntry>,
}

impl NationalityRegistry {
    /// Build the lookup; two rows with the same normalized demonym is an error
    pub fn from_mappings(mappings: &[CountryMapping]) -> Result<Self, RosterError> {
        let mut by_demonym: HashMap<String, RegistryEntry> = HashMap::new();

        for (i, mapping) in mappings.iter().enumerate() {
            let row = i + 1;
            let key = normalize_demonym(&mapping.demonym);

            if let Some(existing) = by_demonym.get(&key) {
                return Err(RosterError::DuplicateDemonym {
                    demonym: key,
                    first_row: existing.row,
                    second_row: row,
                });
            }

            by_demonym.insert(
                key,
                RegistryEntry {
                    row,
                    country: mapping.canonical_country.trim().to_string(),
                    nationality_code: mapping.canonical_nationality_code.trim().to_string(),
                },
            );
        }

        Ok(NationalityRegistry { by_demonym })
    }

    pub fn len(&self) -> usize {
        self.by_demonym.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_demonym.is_empty()
    }

    /// Canonical (country, nationality code) for a raw demonym
    pub fn lookup(&self, nationality_raw: &str) -> Option<(&str, &str)> {
        self.by_demonym
            .get(&normalize_demonym(nationality_raw))
            .map(|e| (e.country.as_str(), e.nationality_code.as_str()))
    }

    /// Attach country + code to every record; unmapped records are dropped
    pub fn normalize(&self, records: Vec<SourceBRecord>) -> NormalizationOutcome {
        let mut outcome = NormalizationOutcome::default();

        for record in records {
            match self.lookup(&record.nationality_raw) {
                Some((country, code)) => {
                    let country = country.to_string();
                    let nationality_code = code.to_string();
                    outcome.records.push(NormalizedSourceB {
                        record,
                        country,
                        nationality_code,
                    });
                }
                None => {
                    debug!(
                        name = %record.name,
                        nationality = %record.nationality_raw,
                        "no country mapping, dropping source B record"
                    );
                    outcome.dropped.push(record);
                }
            }
        }

        if !outcome.dropped.is_empty() {
            warn!(
                dropped = outcome.dropped.len(),
                kept = outcome.records.len(),
                "source B records without a nationality mapping were excluded from matching"
            );
        }

        outcome
    }
}

/// Join key normalization: trim + lowercase
pub fn normalize_demonym(raw: &str) -> String {
    raw.trim().to_lowercase()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_mapping(demonym: &str, country: &str, code: &str) -> CountryMapping {
        CountryMapping {
            demonym: demonym.to_string(),
            canonical_country: country.to_string(),
            canonical_nationality_code: code.to_string(),
        }
    }

    fn create_test_sailor(name: &str, nationality: &str) -> SourceBRecord {
        SourceBRecord {
            name: name.to_string(),
            year_of_birth: Some(1990),
            nationality_raw: nationality.to_string(),
            sail_no: String::new(),
            profile_url: String::new(),
        }
    }

    #[test]
    fn test_lookup_is_case_and_whitespace_insensitive() {
        let registry = NationalityRegistry::from_mappings(&[
            create_test_mapping(" French ", "France", "FRA"),
        ])
        .unwrap();

        assert_eq!(registry.lookup("FRENCH"), Some(("France", "FRA")));
        assert_eq!(registry.lookup("  french\t"), Some(("France", "FRA")));
        assert_eq!(registry.lookup("frenchy"), None);
    }

    #[test]
    fn test_duplicate_demonym_fails_fast() {
        let result = NationalityRegistry::from_mappings(&[
            create_test_mapping("French", "France", "FRA"),
            create_test_mapping("Spanish", "Spain", "ESP"),
            create_test_mapping("french ", "French Polynesia", "PYF"),
        ]);

        match result {
            Err(RosterError::DuplicateDemonym { demonym, first_row, second_row }) => {
                assert_eq!(demonym, "french");
                assert_eq!(first_row, 1);
                assert_eq!(second_row, 3);
            }
            _ => panic!("expected duplicate demonym error"),
        }
    }

    #[test]
    fn test_normalize_drops_unmapped_and_keeps_order() {
        let registry = NationalityRegistry::from_mappings(&[
            create_test_mapping("french", "France", "FRA"),
            create_test_mapping("spanish", "Spain", "ESP"),
        ])
        .unwrap();

        let outcome = registry.normalize(vec![
            create_test_sailor("A", "Spanish"),
            create_test_sailor("B", "Atlantean"),
            create_test_sailor("C", "french"),
            create_test_sailor("D", ""),
        ]);

        let names: Vec<&str> = outcome.records.iter().map(|r| r.record.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
        assert_eq!(outcome.records[0].nationality_code, "ESP");
        assert_eq!(outcome.records[1].country, "France");
        assert_eq!(outcome.dropped_count(), 2);
    }

    #[test]
    fn test_empty_registry_drops_everything() {
        let registry = NationalityRegistry::from_mappings(&[]).unwrap();
        assert!(registry.is_empty());

        let outcome = registry.normalize(vec![create_test_sailor("A", "french")]);
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.dropped_count(), 1);
    }
}
