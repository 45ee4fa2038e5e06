// 🎯 Staged Matcher - Link source A athletes to source B sailors
// Four strategies, strongest first: Exact, Fuzzy (91+), Birth year ±1 (80+),
// Nationality (90+). Anything left is Unmatched.
//
// Source A records are processed in input order. Every accepted match
// removes the source B name from the pool, so no sailor is linked twice and
// later records only see what earlier ones left behind.

use crate::nationality::NormalizedSourceB;
use crate::records::SourceARecord;
use crate::similarity::SimilarityScorer;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

// ============================================================================
// MATCH STAGE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MatchStage {
    /// Identical name string
    Exact,

    /// Best similarity over the whole pool, 91+
    Fuzzy91,

    /// Best similarity among sailors born within ±1 year, 80+
    #[serde(rename = "YOBPm1")]
    YobPm1,

    /// Best similarity among sailors with the same nationality code, 90+
    CountryMatch,

    /// Nothing accepted
    Unmatched,
}

impl MatchStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStage::Exact => "Exact",
            MatchStage::Fuzzy91 => "Fuzzy91",
            MatchStage::YobPm1 => "YOBPm1",
            MatchStage::CountryMatch => "CountryMatch",
            MatchStage::Unmatched => "Unmatched",
        }
    }

    pub fn all() -> [MatchStage; 5] {
        [
            MatchStage::Exact,
            MatchStage::Fuzzy91,
            MatchStage::YobPm1,
            MatchStage::CountryMatch,
            MatchStage::Unmatched,
        ]
    }
}

// ============================================================================
// MATCH RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub source_a_name: String,

    /// Consumed source B name (None when Unmatched)
    pub matched_name: Option<String>,

    /// Similarity 0..=100 (100 for Exact, 0 for Unmatched)
    pub score: u8,

    pub stage: MatchStage,
}

impl MatchResult {
    fn unmatched(source_a_name: &str) -> Self {
        MatchResult {
            source_a_name: source_a_name.to_string(),
            matched_name: None,
            score: 0,
            stage: MatchStage::Unmatched,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.matched_name.is_some()
    }
}

// ============================================================================
// CANDIDATE POOL
// ============================================================================

/// A source B sailor still eligible for matching
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub name: String,
    pub year_of_birth: Option<i32>,
    pub nationality_code: Option<String>,
}

/// Ordered set of available source B names.
/// Unique by name (first occurrence wins); removal keeps the order of the rest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidatePool {
    candidates: Vec<Candidate>,
}

impl CandidatePool {
    pub fn new() -> Self {
        CandidatePool { candidates: Vec::new() }
    }

    pub fn from_candidates(candidates: Vec<Candidate>) -> Self {
        let mut pool = CandidatePool::new();
        for candidate in candidates {
            pool.push(candidate);
        }
        pool
    }

    /// Build the pool from the normalized source B roster
    pub fn from_sailors(sailors: &[NormalizedSourceB]) -> Self {
        let mut pool = CandidatePool::new();
        let mut duplicates = 0;

        for sailor in sailors {
            let added = pool.push(Candidate {
                name: sailor.record.name.clone(),
                year_of_birth: sailor.record.year_of_birth,
                nationality_code: Some(sailor.nationality_code.trim().to_string())
                    .filter(|c| !c.is_empty()),
            });
            if !added {
                duplicates += 1;
            }
        }

        if duplicates > 0 {
            warn!(
                duplicates,
                "source B roster repeats names; only the first occurrence is matchable"
            );
        }

        pool
    }

    /// Append unless the name is already present
    pub fn push(&mut self, candidate: Candidate) -> bool {
        if self.contains(&candidate.name) {
            return false;
        }
        self.candidates.push(candidate);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.candidates.iter().any(|c| c.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.name == name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Candidate> {
        let position = self.candidates.iter().position(|c| c.name == name)?;
        Some(self.candidates.remove(position))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Minimum score for the fuzzy stage (default: 91)
    pub fuzzy_threshold: u8,

    /// Minimum score for the birth-year stage (default: 80)
    pub birth_year_threshold: u8,

    /// Allowed birth-year difference for the birth-year stage (default: 1)
    pub birth_year_tolerance: u32,

    /// Minimum score for the nationality stage (default: 90)
    pub nationality_threshold: u8,

    /// Run the birth-year stage (default: true)
    pub birth_year_stage: bool,

    /// Run the nationality stage (default: true)
    pub nationality_stage: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        MatcherConfig {
            fuzzy_threshold: 91,
            birth_year_threshold: 80,
            birth_year_tolerance: 1,
            nationality_threshold: 90,
            birth_year_stage: true,
            nationality_stage: true,
        }
    }
}

impl MatcherConfig {
    /// Load from a JSON file; missing keys keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read matcher config: {:?}", path.as_ref()))?;

        serde_json::from_str(&content).context("Failed to parse matcher config JSON")
    }

    /// Exact + fuzzy only
    pub fn name_only() -> Self {
        MatcherConfig {
            birth_year_stage: false,
            nationality_stage: false,
            ..Default::default()
        }
    }
}

// ============================================================================
// MATCH RUN
// ============================================================================

#[derive(Debug, Clone)]
pub struct MatchRun {
    /// One result per source A record, input order
    pub results: Vec<MatchResult>,

    /// Source B candidates nobody claimed
    pub remaining: CandidatePool,
}

impl MatchRun {
    pub fn stage_counts(&self) -> BTreeMap<MatchStage, usize> {
        let mut counts: BTreeMap<MatchStage, usize> =
            MatchStage::all().iter().map(|s| (*s, 0)).collect();

        for result in &self.results {
            *counts.entry(result.stage).or_insert(0) += 1;
        }

        counts
    }

    pub fn matched_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_matched()).count()
    }

    /// No source B name appears in two results
    pub fn is_injective(&self) -> bool {
        let mut seen = HashSet::new();
        self.results
            .iter()
            .filter_map(|r| r.matched_name.as_deref())
            .all(|name| seen.insert(name))
    }
}

// ============================================================================
// STAGED MATCHER
// ============================================================================

pub struct StagedMatcher<S: SimilarityScorer> {
    pub config: MatcherConfig,
    scorer: S,
}

impl<S: SimilarityScorer> StagedMatcher<S> {
    /// Matcher with default thresholds
    pub fn new(scorer: S) -> Self {
        StagedMatcher {
            config: MatcherConfig::default(),
            scorer,
        }
    }

    pub fn with_config(config: MatcherConfig, scorer: S) -> Self {
        StagedMatcher { config, scorer }
    }

    /// Match every source A record in order, consuming the pool
    pub fn match_all(&self, records: &[SourceARecord], mut pool: CandidatePool) -> MatchRun {
        let mut results = Vec::with_capacity(records.len());

        for record in records {
            results.push(self.match_one(record, &mut pool));
        }

        let run = MatchRun { results, remaining: pool };

        for (stage, count) in run.stage_counts() {
            info!(stage = stage.as_str(), count, "match stage total");
        }

        run
    }

    /// Run the stages for one record against the current pool
    pub fn match_one(&self, record: &SourceARecord, pool: &mut CandidatePool) -> MatchResult {
        let available: &CandidatePool = pool;
        let accepted = self
            .check_exact(record, available)
            .or_else(|| self.check_fuzzy(record, available))
            .or_else(|| self.check_birth_year(record, available))
            .or_else(|| self.check_nationality(record, available));

        match accepted {
            Some((matched_name, score, stage)) => {
                pool.remove(&matched_name);
                debug!(
                    source_a = %record.name,
                    source_b = %matched_name,
                    score,
                    stage = stage.as_str(),
                    "matched"
                );
                MatchResult {
                    source_a_name: record.name.clone(),
                    matched_name: Some(matched_name),
                    score,
                    stage,
                }
            }
            None => {
                debug!(source_a = %record.name, "unmatched");
                MatchResult::unmatched(&record.name)
            }
        }
    }

    /// Stage 1: identical string, case-sensitive, no normalization
    fn check_exact(
        &self,
        record: &SourceARecord,
        pool: &CandidatePool,
    ) -> Option<(String, u8, MatchStage)> {
        pool.get(&record.name)
            .map(|c| (c.name.clone(), 100, MatchStage::Exact))
    }

    /// Stage 2: best similarity over the whole pool
    fn check_fuzzy(
        &self,
        record: &SourceARecord,
        pool: &CandidatePool,
    ) -> Option<(String, u8, MatchStage)> {
        self.accept_best(
            &record.name,
            pool.iter(),
            self.config.fuzzy_threshold,
            MatchStage::Fuzzy91,
        )
    }

    /// Stage 3: best similarity among sailors born within the tolerance
    fn check_birth_year(
        &self,
        record: &SourceARecord,
        pool: &CandidatePool,
    ) -> Option<(String, u8, MatchStage)> {
        if !self.config.birth_year_stage {
            return None;
        }

        let year = record.year_of_birth?;
        let tolerance = self.config.birth_year_tolerance;

        let candidates = pool.iter().filter(|c| {
            c.year_of_birth
                .map(|y| y.abs_diff(year) <= tolerance)
                .unwrap_or(false)
        });

        self.accept_best(
            &record.name,
            candidates,
            self.config.birth_year_threshold,
            MatchStage::YobPm1,
        )
    }

    /// Stage 4: best similarity among sailors with the same nationality code
    fn check_nationality(
        &self,
        record: &SourceARecord,
        pool: &CandidatePool,
    ) -> Option<(String, u8, MatchStage)> {
        if !self.config.nationality_stage {
            return None;
        }

        let code = record
            .nationality
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())?;

        let candidates = pool
            .iter()
            .filter(|c| c.nationality_code.as_deref() == Some(code));

        self.accept_best(
            &record.name,
            candidates,
            self.config.nationality_threshold,
            MatchStage::CountryMatch,
        )
    }

    fn accept_best<'a, I>(
        &self,
        name: &str,
        candidates: I,
        threshold: u8,
        stage: MatchStage,
    ) -> Option<(String, u8, MatchStage)>
    where
        I: Iterator<Item = &'a Candidate>,
    {
        let (best, score) = self.best_candidate(name, candidates)?;

        if score >= threshold {
            Some((best.name.clone(), score, stage))
        } else {
            None
        }
    }

    /// Highest score wins; on a tie the earlier candidate in pool order wins
    fn best_candidate<'a, I>(&self, name: &str, candidates: I) -> Option<(&'a Candidate, u8)>
    where
        I: Iterator<Item = &'a Candidate>,
    {
        let mut best: Option<(&'a Candidate, u8)> = None;

        for candidate in candidates {
            let score = self.scorer.score(name, &candidate.name);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((candidate, score)),
            }
        }

        best
    }
}

// ============================================================================
// TESTS
// ============================================================================
