use std::collections::HashSet;

use tracing::info;

use crate::model::{Chunk, FuzzyMatch, OutOfOrderSection, TocEntry, ValidationReport};

/// A chunk key is only considered a fuzzy candidate above this ratio.
pub const FUZZY_CANDIDATE_THRESHOLD: f64 = 0.8;
/// The best candidate must exceed this ratio to count as matched.
pub const FUZZY_ACCEPT_THRESHOLD: f64 = 0.9;

pub trait SimilarityMetric {
    /// Similarity in `[0, 1]`, 1 meaning identical.
    fn ratio(&self, left: &str, right: &str) -> f64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedLevenshtein;

impl SimilarityMetric for NormalizedLevenshtein {
    fn ratio(&self, left: &str, right: &str) -> f64 {
        strsim::normalized_levenshtein(left, right)
    }
}

pub fn validate_structure(entries: &[TocEntry], chunks: &[Chunk]) -> ValidationReport {
    validate_structure_with(entries, chunks, &NormalizedLevenshtein)
}

pub fn validate_structure_with(
    entries: &[TocEntry],
    chunks: &[Chunk],
    metric: &dyn SimilarityMetric,
) -> ValidationReport {
    let toc_keys = distinct_in_order(entries.iter().map(|entry| entry.full_path.as_str()));
    let chunk_keys = distinct_in_order(chunks.iter().map(|chunk| chunk.start_heading.as_str()));
    let chunk_key_set = chunk_keys.iter().copied().collect::<HashSet<&str>>();
    let toc_key_set = toc_keys.iter().copied().collect::<HashSet<&str>>();

    let mut matched = Vec::<String>::new();
    let mut missing = Vec::<String>::new();
    let mut fuzzy_matches = Vec::<FuzzyMatch>::new();

    for toc_path in &toc_keys {
        if chunk_key_set.contains(toc_path) {
            matched.push(toc_path.to_string());
            continue;
        }

        match best_fuzzy_candidate(toc_path, &chunk_keys, metric) {
            Some((chunk_path, ratio)) if ratio > FUZZY_ACCEPT_THRESHOLD => {
                matched.push(toc_path.to_string());
                fuzzy_matches.push(FuzzyMatch {
                    toc_path: toc_path.to_string(),
                    chunk_path: chunk_path.to_string(),
                    ratio,
                });
            }
            _ => missing.push(toc_path.to_string()),
        }
    }

    let extra = chunk_keys
        .iter()
        .filter(|key| !toc_key_set.contains(*key))
        .map(|key| key.to_string())
        .collect::<Vec<String>>();

    let out_of_order = find_out_of_order(entries, chunks);
    let match_percentage = match_percentage(matched.len(), toc_keys.len());

    info!(
        toc_sections = toc_keys.len(),
        parsed_sections = chunk_keys.len(),
        matched = matched.len(),
        fuzzy = fuzzy_matches.len(),
        missing = missing.len(),
        extra = extra.len(),
        out_of_order = out_of_order.len(),
        "validated structure"
    );

    ValidationReport {
        toc_section_count: toc_keys.len(),
        parsed_section_count: chunk_keys.len(),
        matched_sections: matched,
        missing_sections: missing,
        extra_sections: extra,
        out_of_order_sections: out_of_order,
        fuzzy_matches,
        match_percentage,
    }
}

/// First key with the highest ratio strictly above the candidate threshold.
fn best_fuzzy_candidate<'a>(
    toc_path: &str,
    chunk_keys: &[&'a str],
    metric: &dyn SimilarityMetric,
) -> Option<(&'a str, f64)> {
    let mut best: Option<(&'a str, f64)> = None;

    for &chunk_path in chunk_keys {
        let ratio = metric.ratio(toc_path, chunk_path);
        let best_ratio = best.map(|(_, value)| value).unwrap_or(0.0);
        if ratio > FUZZY_CANDIDATE_THRESHOLD && ratio > best_ratio {
            best = Some((chunk_path, ratio));
        }
    }

    best
}

/// Pairwise positional comparison of ToC order against chunk order, the
/// latter restricted to headings that appear literally in the ToC.
pub fn find_out_of_order(entries: &[TocEntry], chunks: &[Chunk]) -> Vec<OutOfOrderSection> {
    let toc_order = entries
        .iter()
        .map(|entry| entry.full_path.as_str())
        .collect::<Vec<&str>>();
    let toc_set = toc_order.iter().copied().collect::<HashSet<&str>>();
    let chunk_order = chunks
        .iter()
        .map(|chunk| chunk.start_heading.as_str())
        .filter(|heading| toc_set.contains(heading));

    toc_order
        .iter()
        .zip(chunk_order)
        .enumerate()
        .filter(|(_, (expected, found))| *expected != found)
        .map(|(position, (expected, found))| OutOfOrderSection {
            expected: expected.to_string(),
            found: found.to_string(),
            position,
        })
        .collect()
}

pub fn match_percentage(matched: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    matched as f64 / total as f64 * 100.0
}

fn distinct_in_order<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::<&str>::new();
    keys.filter(|key| seen.insert(*key)).collect()
}
