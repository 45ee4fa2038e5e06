// Athlete Identity - Core Library
// Links athletes across two federation rosters and assigns stable ids

pub mod records;
pub mod error;
pub mod aliases;        // Source B → source A spelling fixes
pub mod nationality;    // Demonym → country + code
pub mod similarity;     // Name similarity 0..100
pub mod matcher;        // Staged matching + candidate pool
pub mod identity;       // 8-digit identity ids
pub mod merge;          // Match results joined back to both rosters
pub mod links;          // Long-form identifier table
pub mod pipeline;       // Whole batch in one pass

// Re-export commonly used types
pub use records::{
    SourceARecord, SourceBRecord, CountryMapping, RosterFormat,
    load_source_a, load_source_a_csv, load_source_a_json, load_source_b,
    load_country_mappings, detect_format, parse_year, write_csv,
};
pub use error::RosterError;
pub use aliases::NameAliases;
pub use nationality::{NationalityRegistry, NormalizedSourceB, NormalizationOutcome};
pub use similarity::{SimilarityScorer, WeightedRatio, canonicalize};
pub use matcher::{
    Candidate, CandidatePool, MatchResult, MatchRun, MatchStage, MatcherConfig, StagedMatcher,
};
pub use identity::{identity_id, collision_probability};
pub use merge::{MergedRecord, MergedRow, merge_records};
pub use links::{IdType, LinkEntry, build_link_table};
pub use pipeline::{IdentityResolver, ResolutionReport, ResolverInputs};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
