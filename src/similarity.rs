// 🔤 Name Similarity - 0..100 score between two athlete names
//
// Names are canonicalized first (NFKD, combining marks stripped, lowercase,
// punctuation to spaces, whitespace collapsed) so "José  Álvarez" and
// "jose alvarez" compare equal. The default scorer then takes the best of a
// plain ratio, a sliding-window partial ratio, and token sort/set ratios,
// weighted so that reordered or partially matching names score a little
// below an exact match.

use std::collections::BTreeSet;
use strsim::normalized_levenshtein;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Anything that can score two names on a 0..=100 scale
pub trait SimilarityScorer {
    fn score(&self, a: &str, b: &str) -> u8;
}

impl<F> SimilarityScorer for F
where
    F: Fn(&str, &str) -> u8,
{
    fn score(&self, a: &str, b: &str) -> u8 {
        self(a, b)
    }
}

/// Canonical comparison form of a name
pub fn canonicalize(name: &str) -> String {
    let folded: String = name
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();

    let spaced: String = folded
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// WEIGHTED RATIO
// ============================================================================

#[derive(Debug, Clone)]
pub struct WeightedRatio {
    /// Scale applied to token-based ratios (default: 0.95)
    pub token_scale: f64,

    /// Scale applied to partial ratios (default: 0.90)
    pub partial_scale: f64,

    /// Scale for partial ratios when one name is > 8x longer (default: 0.60)
    pub long_partial_scale: f64,

    /// Length ratio at which partial matching kicks in (default: 1.5)
    pub partial_length_ratio: f64,
}

impl WeightedRatio {
    pub fn new() -> Self {
        WeightedRatio {
            token_scale: 0.95,
            partial_scale: 0.90,
            long_partial_scale: 0.60,
            partial_length_ratio: 1.5,
        }
    }

    /// Score two already-canonicalized names
    pub fn score_canonical(&self, p1: &str, p2: &str) -> f64 {
        if p1.is_empty() || p2.is_empty() {
            return 0.0;
        }

        let base = ratio(p1, p2);

        let len1 = p1.chars().count() as f64;
        let len2 = p2.chars().count() as f64;
        let len_ratio = len1.max(len2) / len1.min(len2);

        if len_ratio < self.partial_length_ratio {
            let sorted = token_sort_ratio(p1, p2, false) * self.token_scale;
            let set = token_set_ratio(p1, p2, false) * self.token_scale;
            return base.max(sorted).max(set);
        }

        let partial_scale = if len_ratio > 8.0 {
            self.long_partial_scale
        } else {
            self.partial_scale
        };

        let partial = partial_ratio(p1, p2) * partial_scale;
        let sorted = token_sort_ratio(p1, p2, true) * self.token_scale * partial_scale;
        let set = token_set_ratio(p1, p2, true) * self.token_scale * partial_scale;

        base.max(partial).max(sorted).max(set)
    }
}

impl Default for WeightedRatio {
    fn default() -> Self {
        Self::new()
    }
}

impl SimilarityScorer for WeightedRatio {
    fn score(&self, a: &str, b: &str) -> u8 {
        let p1 = canonicalize(a);
        let p2 = canonicalize(b);
        self.score_canonical(&p1, &p2).round().clamp(0.0, 100.0) as u8
    }
}

// ============================================================================
// BUILDING BLOCKS (all on canonical strings, 0.0..=100.0)
// ============================================================================

/// Normalized Levenshtein similarity as a percentage
pub fn ratio(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b) * 100.0
}

/// Best ratio of the shorter string against every same-length window
/// of the longer one
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let (shorter, longer) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };

    let short_len = shorter.chars().count();
    if short_len == 0 {
        return 0.0;
    }

    let long_chars: Vec<char> = longer.chars().collect();
    let mut best: f64 = 0.0;

    for start in 0..=(long_chars.len() - short_len) {
        let window: String = long_chars[start..start + short_len].iter().collect();
        let score = ratio(shorter, &window);
        if score > best {
            best = score;
            if best >= 100.0 {
                break;
            }
        }
    }

    best
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Ratio after sorting tokens, so "doe jane" == "jane doe"
pub fn token_sort_ratio(a: &str, b: &str, partial: bool) -> f64 {
    let s1 = sorted_tokens(a);
    let s2 = sorted_tokens(b);

    if partial {
        partial_ratio(&s1, &s2)
    } else {
        ratio(&s1, &s2)
    }
}

/// Ratio on the shared tokens plus each side's leftovers
pub fn token_set_ratio(a: &str, b: &str, partial: bool) -> f64 {
    let t1: BTreeSet<&str> = a.split_whitespace().collect();
    let t2: BTreeSet<&str> = b.split_whitespace().collect();

    let intersection: Vec<&str> = t1.intersection(&t2).copied().collect();
    let diff_1to2: Vec<&str> = t1.difference(&t2).copied().collect();
    let diff_2to1: Vec<&str> = t2.difference(&t1).copied().collect();

    let sect = intersection.join(" ");
    let combined_1to2 = format!("{} {}", sect, diff_1to2.join(" ")).trim().to_string();
    let combined_2to1 = format!("{} {}", sect, diff_2to1.join(" ")).trim().to_string();

    let score = |x: &str, y: &str| {
        if x.is_empty() || y.is_empty() {
            0.0
        } else if partial {
            partial_ratio(x, y)
        } else {
            ratio(x, y)
        }
    };

    score(&sect, &combined_1to2)
        .max(score(&sect, &combined_2to1))
        .max(score(&combined_1to2, &combined_2to1))
}

// ============================================================================
// TESTS
// ============================================================================
