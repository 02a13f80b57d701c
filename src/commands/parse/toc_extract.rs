use std::collections::HashSet;

use anyhow::Result;
use tracing::{debug, info};

use super::line_classify::{LineClassifier, numeric_section_key};
use super::page_source::{Page, PageSource};
use crate::error::PipelineError;
use crate::model::TocEntry;

pub const TOC_MARKERS: [&str; 2] = ["Table of Contents", "CONTENTS"];
pub const TOC_ROW_THRESHOLD: usize = 5;
pub const TOC_WINDOW_PAGES: usize = 5;

#[derive(Debug, Clone)]
pub struct TocExtraction {
    pub entries: Vec<TocEntry>,
    /// 1-based numbers of every page claimed as ToC source.
    pub toc_pages: Vec<usize>,
    pub duplicate_count: usize,
    pub page_count: usize,
    pub empty_page_count: usize,
}

pub fn extract_toc(
    source: &dyn PageSource,
    classifier: &LineClassifier,
    doc_title: &str,
) -> Result<TocExtraction> {
    let pages = source.load_pages()?;
    let extraction = extract_toc_from_pages(&pages, classifier, doc_title)?;

    info!(
        source = %source.describe(),
        toc_pages = ?extraction.toc_pages,
        entries = extraction.entries.len(),
        duplicates = extraction.duplicate_count,
        "extracted table of contents"
    );

    Ok(extraction)
}

pub fn extract_toc_from_pages(
    pages: &[Page],
    classifier: &LineClassifier,
    doc_title: &str,
) -> Result<TocExtraction> {
    let claimed = claim_toc_pages(pages, classifier);
    if claimed.is_empty() {
        return Err(PipelineError::NoTocDetected.into());
    }

    let mut entries = Vec::<TocEntry>::new();
    let mut seen_ids = HashSet::<String>::new();
    let mut duplicate_count = 0usize;

    for index in &claimed {
        for line in pages[*index].lines() {
            let Some(entry) = classifier.parse_toc_line(doc_title, line) else {
                continue;
            };
            if !seen_ids.insert(entry.section_id.clone()) {
                debug!(section_id = %entry.section_id, "dropping duplicate ToC entry");
                duplicate_count += 1;
                continue;
            }
            entries.push(entry);
        }
    }

    sort_toc_entries(&mut entries)?;

    Ok(TocExtraction {
        entries,
        toc_pages: claimed.iter().map(|index| pages[*index].number).collect(),
        duplicate_count,
        page_count: pages.len(),
        empty_page_count: pages.iter().filter(|page| page.text.is_none()).count(),
    })
}

pub fn is_toc_page(text: &str, classifier: &LineClassifier) -> bool {
    if TOC_MARKERS.iter().any(|marker| text.contains(marker)) {
        return true;
    }

    text.lines()
        .filter(|line| classifier.is_toc_row_shaped(line))
        .count()
        >= TOC_ROW_THRESHOLD
}

/// Indices of pages claimed as ToC source, in page order. Each detected ToC
/// page that is not already claimed opens a window of up to
/// `TOC_WINDOW_PAGES` consecutive pages.
pub fn claim_toc_pages(pages: &[Page], classifier: &LineClassifier) -> Vec<usize> {
    let mut visited = vec![false; pages.len()];
    let mut claimed = Vec::<usize>::new();

    for (index, page) in pages.iter().enumerate() {
        let Some(text) = page.text.as_deref() else {
            continue;
        };
        if visited[index] || !is_toc_page(text, classifier) {
            continue;
        }

        let window_end = (index + TOC_WINDOW_PAGES).min(pages.len());
        for window_index in index..window_end {
            if !visited[window_index] {
                visited[window_index] = true;
                claimed.push(window_index);
            }
        }
    }

    claimed
}

/// Stable sort by numeric section id. Fails before reordering anything if any
/// id has a non-integer segment.
pub fn sort_toc_entries(entries: &mut Vec<TocEntry>) -> Result<(), PipelineError> {
    let mut keyed = std::mem::take(entries)
        .into_iter()
        .map(|entry| numeric_section_key(&entry.section_id).map(|key| (key, entry)))
        .collect::<Result<Vec<(Vec<u64>, TocEntry)>, PipelineError>>()?;

    keyed.sort_by(|(left, _), (right, _)| left.cmp(right));
    entries.extend(keyed.into_iter().map(|(_, entry)| entry));

    Ok(())
}
