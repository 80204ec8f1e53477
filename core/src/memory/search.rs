//! Entry ranking
//!
//! Fuzzy scoring aligns the query against the best-matching span of each
//! field (semi-global edit distance), so a match scores the same wherever it
//! sits in the field. Multi-word queries are also scored word by word and
//! the better of the two readings wins. Field scores are weighted and the
//! strongest field decides the entry's score.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::schema::Entry;
use super::Category;

/// Relative importance of each searched field, on a 0-1 scale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldWeights {
    #[serde(default = "full_weight")]
    pub key: f64,
    #[serde(default = "full_weight")]
    pub value: f64,
    #[serde(default = "default_reason_weight")]
    pub reason: f64,
    #[serde(default = "default_context_weight")]
    pub context: f64,
}

fn full_weight() -> f64 {
    1.0
}

fn default_reason_weight() -> f64 {
    0.8
}

fn default_context_weight() -> f64 {
    0.6
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            key: full_weight(),
            value: full_weight(),
            reason: default_reason_weight(),
            context: default_context_weight(),
        }
    }
}

/// One ranked search result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub category: Category,
    pub entry: Entry,
    pub score: f64,
}

/// How a query is compared against entries.
#[derive(Debug, Clone)]
pub enum Matcher {
    Exact,
    Fuzzy { threshold: f64, weights: FieldWeights },
}

impl Matcher {
    /// Score an entry, `None` when it does not match.
    pub fn score(&self, query: &str, entry: &Entry) -> Option<f64> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        match self {
            Matcher::Exact => exact_match(query, entry).then_some(1.0),
            Matcher::Fuzzy { threshold, weights } => {
                let score = fuzzy_score(query, entry, weights);
                (score > 0.0 && score >= *threshold).then_some(score)
            }
        }
    }
}

fn searched_fields(entry: &Entry) -> [Option<&str>; 4] {
    [
        Some(entry.key.as_str()),
        Some(entry.value.as_str()),
        entry.reason.as_deref(),
        entry.context.as_deref(),
    ]
}

/// Case-insensitive substring containment across the searched fields.
pub fn exact_match(query: &str, entry: &Entry) -> bool {
    let needle = query.to_lowercase();
    searched_fields(entry)
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Weighted best-field similarity in `0.0..=1.0`.
pub fn fuzzy_score(query: &str, entry: &Entry, weights: &FieldWeights) -> f64 {
    let query: Vec<char> = query.to_lowercase().chars().collect();
    let words: Vec<Vec<char>> = query
        .split(|c| c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_vec())
        .collect();

    let field_weights = [weights.key, weights.value, weights.reason, weights.context];

    searched_fields(entry)
        .into_iter()
        .zip(field_weights)
        .filter_map(|(field, weight)| field.map(|f| (f, weight)))
        .map(|(field, weight)| {
            let text: Vec<char> = field.to_lowercase().chars().collect();
            weight * field_similarity(&query, &words, &text)
        })
        .fold(0.0, f64::max)
}

fn field_similarity(query: &[char], words: &[Vec<char>], text: &[char]) -> f64 {
    if text.is_empty() {
        return 0.0;
    }
    let whole = span_similarity(query, text);
    if words.len() < 2 {
        return whole;
    }
    let per_word = words.iter().map(|w| span_similarity(w, text)).sum::<f64>() / words.len() as f64;
    whole.max(per_word)
}

/// `1 - d / |pattern|` where `d` is the edit distance between `pattern` and
/// its closest substring of `text`.
pub fn span_similarity(pattern: &[char], text: &[char]) -> f64 {
    if pattern.is_empty() {
        return 0.0;
    }
    let distance = substring_edit_distance(pattern, text);
    1.0 - distance as f64 / pattern.len() as f64
}

/// Levenshtein distance with free leading and trailing text, i.e. the
/// smallest edit distance from `pattern` to any substring of `text`.
pub fn substring_edit_distance(pattern: &[char], text: &[char]) -> usize {
    let m = pattern.len();
    if m == 0 {
        return 0;
    }
    if text.is_empty() {
        return m;
    }

    // prev[j]: distance of pattern[..i] ending at text position j
    let mut prev = vec![0usize; text.len() + 1];
    let mut curr = vec![0usize; text.len() + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=text.len() {
            let cost = if pattern[i - 1] == text[j - 1] { 0 } else { 1 };
            curr[j] = std::cmp::min(
                std::cmp::min(
                    prev[j] + 1,     // deletion
                    curr[j - 1] + 1, // insertion
                ),
                prev[j - 1] + cost, // substitution
            );
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev.into_iter().min().unwrap_or(m)
}

/// Sort by descending score and keep the first `limit` hits.
///
/// Ties keep category order, then entry key, so truncating at a smaller
/// limit always yields a prefix of the larger result.
pub fn rank(mut hits: Vec<SearchHit>, limit: usize) -> Vec<SearchHit> {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
            .then_with(|| a.entry.key.cmp(&b.entry.key))
    });
    hits.truncate(limit);
    hits
}
