// ⚙️ Identity Resolver - Whole batch in one pass
//
//   aliases → nationality join → candidate pool → staged matching
//           → merge (+ identity ids) → link table
//
// Inputs are static tables; nothing is mutated after creation and every
// output is derived in this single pass.

use crate::aliases::NameAliases;
use crate::links::{build_link_table, LinkEntry};
use crate::matcher::{CandidatePool, MatchStage, MatcherConfig, StagedMatcher};
use crate::merge::{merge_records, MergedRecord, MergedRow};
use crate::nationality::NationalityRegistry;
use crate::records::{
    load_country_mappings, load_source_a, load_source_b, write_csv, CountryMapping,
    SourceARecord, SourceBRecord,
};
use crate::similarity::{SimilarityScorer, WeightedRatio};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

// ============================================================================
// INPUTS
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ResolverInputs {
    pub source_a: Vec<SourceARecord>,
    pub source_b: Vec<SourceBRecord>,
    pub country_mappings: Vec<CountryMapping>,
}

impl ResolverInputs {
    /// Load all three tables; any missing name aborts here
    pub fn load(source_a: &Path, source_b: &Path, country_mappings: &Path) -> Result<Self> {
        let inputs = ResolverInputs {
            source_a: load_source_a(source_a).context("Failed to load source A roster")?,
            source_b: load_source_b(source_b).context("Failed to load source B roster")?,
            country_mappings: load_country_mappings(country_mappings)
                .context("Failed to load country mappings")?,
        };

        info!(
            source_a = inputs.source_a.len(),
            source_b = inputs.source_b.len(),
            mappings = inputs.country_mappings.len(),
            "inputs loaded"
        );

        Ok(inputs)
    }
}

// ============================================================================
// REPORT
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolutionReport {
    pub run_id: String,
    pub resolved_at: DateTime<Utc>,

    /// One per source A record, source A order
    pub merged: Vec<MergedRecord>,
    pub links: Vec<LinkEntry>,

    pub stage_counts: BTreeMap<MatchStage, usize>,
    pub source_a_count: usize,
    pub source_b_count: usize,

    /// Source B records excluded for an unmapped nationality
    pub dropped_source_b: usize,

    /// Source B names rewritten by the alias table
    pub aliases_applied: usize,

    /// Matchable source B names nobody claimed
    pub unclaimed_source_b: usize,
}

impl ResolutionReport {
    pub fn matched_count(&self) -> usize {
        self.merged
            .iter()
            .filter(|m| m.match_result.is_matched())
            .count()
    }

    pub fn stage_count(&self, stage: MatchStage) -> usize {
        self.stage_counts.get(&stage).copied().unwrap_or(0)
    }

    pub fn merged_rows(&self) -> Vec<MergedRow> {
        self.merged.iter().map(MergedRecord::to_row).collect()
    }

    pub fn summary(&self) -> String {
        format!(
            "Run {}: {} of {} source A athletes matched (exact {}, fuzzy {}, yob {}, country {}), {} unmatched; {} source B dropped, {} unclaimed; {} link rows",
            self.run_id,
            self.matched_count(),
            self.source_a_count,
            self.stage_count(MatchStage::Exact),
            self.stage_count(MatchStage::Fuzzy91),
            self.stage_count(MatchStage::YobPm1),
            self.stage_count(MatchStage::CountryMatch),
            self.stage_count(MatchStage::Unmatched),
            self.dropped_source_b,
            self.unclaimed_source_b,
            self.links.len(),
        )
    }

    /// Write the merged table and the link table
    pub fn write_outputs(&self, merged_path: &Path, links_path: &Path) -> Result<()> {
        write_csv(merged_path, &self.merged_rows())
            .with_context(|| format!("Failed to write merged table: {:?}", merged_path))?;
        write_csv(links_path, &self.links)
            .with_context(|| format!("Failed to write link table: {:?}", links_path))?;
        Ok(())
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

pub struct IdentityResolver<S: SimilarityScorer> {
    matcher: StagedMatcher<S>,
    aliases: NameAliases,
}

impl IdentityResolver<WeightedRatio> {
    /// Default scorer, default thresholds, no aliases
    pub fn new() -> Self {
        IdentityResolver::with_scorer(WeightedRatio::new())
    }
}

impl Default for IdentityResolver<WeightedRatio> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SimilarityScorer> IdentityResolver<S> {
    pub fn with_scorer(scorer: S) -> Self {
        IdentityResolver {
            matcher: StagedMatcher::new(scorer),
            aliases: NameAliases::new(),
        }
    }

    pub fn config(mut self, config: MatcherConfig) -> Self {
        self.matcher.config = config;
        self
    }

    pub fn aliases(mut self, aliases: NameAliases) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn resolve(&self, inputs: ResolverInputs) -> Result<ResolutionReport> {
        let ResolverInputs {
            source_a,
            mut source_b,
            country_mappings,
        } = inputs;

        let source_b_count = source_b.len();

        // 1. Known spelling differences
        let aliases_applied = self.aliases.apply(&mut source_b);

        // 2. Nationality join (unmapped → dropped)
        let registry = NationalityRegistry::from_mappings(&country_mappings)?;
        let normalized = registry.normalize(source_b);

        // 3. Pool + staged matching in source A order
        let pool = CandidatePool::from_sailors(&normalized.records);
        let run = self.matcher.match_all(&source_a, pool);

        // 4. Merge + identity ids, then the long link table
        let merged = merge_records(&source_a, &run.results, &normalized.records)?;
        let links = build_link_table(&merged);

        let report = ResolutionReport {
            run_id: uuid::Uuid::new_v4().to_string(),
            resolved_at: Utc::now(),
            stage_counts: run.stage_counts(),
            source_a_count: source_a.len(),
            source_b_count,
            dropped_source_b: normalized.dropped_count(),
            aliases_applied,
            unclaimed_source_b: run.remaining.len(),
            merged,
            links,
        };

        info!(
            run_id = %report.run_id,
            matched = report.matched_count(),
            source_a = report.source_a_count,
            links = report.links.len(),
            "identity resolution complete"
        );

        Ok(report)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RosterError;
    use std::collections::HashSet;

    fn create_test_athlete(name: &str, yob: Option<i32>, nationality: Option<&str>, id: &str) -> SourceARecord {
        SourceARecord {
            name: name.to_string(),
            year_of_birth: yob,
            country: None,
            nationality: nationality.map(|n| n.to_string()),
            external_id: id.to_string(),
            alt_id: None,
        }
    }

    fn create_test_sailor(name: &str, yob: Option<i32>, nationality: &str, sail_no: &str) -> SourceBRecord {
        SourceBRecord {
            name: name.to_string(),
            year_of_birth: yob,
            nationality_raw: nationality.to_string(),
            sail_no: sail_no.to_string(),
            profile_url: format!("https://example.org/{}", sail_no),
        }
    }

    fn french() -> Vec<CountryMapping> {
        vec![CountryMapping {
            demonym: "french".to_string(),
            canonical_country: "France".to_string(),
            canonical_nationality_code: "FRA".to_string(),
        }]
    }

    #[test]
    fn test_alias_enables_exact_match() {
        let inputs = ResolverInputs {
            source_a: vec![create_test_athlete("Coco Foveau", Some(1998), Some("FRA"), "lh-1")],
            source_b: vec![create_test_sailor("Coraline Foveau", Some(1998), "French", "F-191")],
            country_mappings: french(),
        };

        let resolver = IdentityResolver::new()
            .aliases(NameAliases::from_pairs([("Coraline Foveau", "Coco Foveau")]));
        let report = resolver.resolve(inputs).unwrap();

        let record = &report.merged[0];
        assert_eq!(record.match_result.stage, MatchStage::Exact);
        assert_eq!(record.match_result.score, 100);
        assert_eq!(record.identity_id, crate::identity::identity_id("Coco Foveau", Some(1998)));
        assert_eq!(report.aliases_applied, 1);
        assert_eq!(report.links.len(), 2);
    }

    #[test]
    fn test_without_alias_names_are_too_far_apart() {
        let inputs = ResolverInputs {
            source_a: vec![create_test_athlete("Coco Foveau", Some(1998), Some("FRA"), "lh-1")],
            source_b: vec![create_test_sailor("Coraline Foveau", Some(1998), "French", "F-191")],
            country_mappings: french(),
        };

        let report = IdentityResolver::new().resolve(inputs).unwrap();

        assert_eq!(report.merged[0].match_result.stage, MatchStage::Unmatched);
        assert_eq!(report.unclaimed_source_b, 1);
    }

    #[test]
    fn test_unmapped_sailor_is_never_a_candidate() {
        let inputs = ResolverInputs {
            source_a: vec![create_test_athlete("Jane Doe", Some(1995), None, "lh-2")],
            source_b: vec![create_test_sailor("Jane Doe", Some(1995), "Atlantean", "AT-1")],
            country_mappings: french(),
        };

        let report = IdentityResolver::new().resolve(inputs).unwrap();

        assert_eq!(report.dropped_source_b, 1);
        assert_eq!(report.merged[0].match_result.stage, MatchStage::Unmatched);
        assert_eq!(report.links.len(), 1);
    }

    #[test]
    fn test_duplicate_demonym_aborts_run() {
        let mut mappings = french();
        mappings.push(CountryMapping {
            demonym: " French".to_string(),
            canonical_country: "France".to_string(),
            canonical_nationality_code: "FRA".to_string(),
        });

        let inputs = ResolverInputs {
            source_a: vec![],
            source_b: vec![],
            country_mappings: mappings,
        };

        let err = IdentityResolver::new().resolve(inputs).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RosterError>(),
            Some(RosterError::DuplicateDemonym { .. })
        ));
    }

    #[test]
    fn test_report_is_injective_and_complete() {
        let inputs = ResolverInputs {
            source_a: vec![
                create_test_athlete("Jane Doe", Some(1995), Some("FRA"), "1"),
                create_test_athlete("Jane Doe", Some(1995), Some("FRA"), "2"),
                create_test_athlete("Foveau Coco", Some(1998), Some("FRA"), "3"),
                create_test_athlete("Nobody", None, None, "4"),
            ],
            source_b: vec![
                create_test_sailor("Jane Doe", Some(1995), "french", "F-1"),
                create_test_sailor("Coco Foveau", Some(1998), "French ", "F-2"),
            ],
            country_mappings: french(),
        };

        let report = IdentityResolver::new().resolve(inputs).unwrap();

        assert_eq!(report.merged.len(), 4);
        assert_eq!(report.source_a_count, 4);

        let mut seen = HashSet::new();
        for record in &report.merged {
            if let Some(name) = &record.match_result.matched_name {
                assert!(seen.insert(name.clone()), "{} matched twice", name);
            }
        }

        assert_eq!(report.stage_count(MatchStage::Exact), 1);
        assert_eq!(report.stage_count(MatchStage::Fuzzy91), 1);
        assert_eq!(report.stage_count(MatchStage::Unmatched), 2);
        assert_eq!(report.matched_count(), 2);

        // 4 primary ids + 2 sail numbers
        assert_eq!(report.links.len(), 6);
        assert!(report.summary().contains("2 of 4 source A athletes matched"));
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let inputs = ResolverInputs {
            source_a: vec![
                create_test_athlete("Jane Doe", Some(1995), Some("FRA"), "1"),
                create_test_athlete("Foveau Coco", Some(1998), Some("FRA"), "3"),
            ],
            source_b: vec![
                create_test_sailor("Coco Foveau", Some(1998), "french", "F-2"),
                create_test_sailor("Jane Doe", Some(1995), "french", "F-1"),
            ],
            country_mappings: french(),
        };

        let resolver = IdentityResolver::new();
        let first = resolver.resolve(inputs.clone()).unwrap();
        let second = resolver.resolve(inputs).unwrap();

        assert_eq!(first.merged, second.merged);
        assert_eq!(first.links, second.links);
        assert_ne!(first.run_id, second.run_id);
    }
}
