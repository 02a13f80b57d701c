use anyhow::{Context, Result};
use regex::Regex;

use crate::error::PipelineError;
use crate::model::TocEntry;

// ToC row: "2.1.3 Power Negotiation ............. 45"
const TOC_LINE_PATTERN: &str =
    r"^\s*(?P<section_id>[0-9]+(?:\.[0-9]+)*)\s+(?P<title>.+?)\s*\.{2,}\s*(?P<page>[0-9]+)\s*$";
// Body heading, matched against the trimmed line: "2.1.3 Power Negotiation"
const HEADING_LINE_PATTERN: &str = r"^(?P<section_id>[0-9]+(?:\.[0-9]+)*)\s+(?P<title>.+)$";
// Page-detection pre-filter, looser than the full ToC row.
// Digits are ASCII-only in all three patterns.
const TOC_ROW_SHAPE_PATTERN: &str = r"^\s*[0-9]+(?:\.[0-9]+)*\s+.+\.+\s+[0-9]+$";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingLine {
    pub section_id: String,
    pub title: String,
    /// The trimmed source line.
    pub text: String,
}

impl HeadingLine {
    pub fn level(&self) -> usize {
        section_level(&self.section_id)
    }
}

/// Stateless line matchers. The three patterns are kept separate because
/// they differ deliberately in strictness.
#[derive(Debug, Clone)]
pub struct LineClassifier {
    toc_line: Regex,
    heading_line: Regex,
    toc_row_shape: Regex,
}

impl LineClassifier {
    pub fn new() -> Result<Self> {
        Ok(Self {
            toc_line: Regex::new(TOC_LINE_PATTERN).context("failed to compile ToC line regex")?,
            heading_line: Regex::new(HEADING_LINE_PATTERN)
                .context("failed to compile section heading regex")?,
            toc_row_shape: Regex::new(TOC_ROW_SHAPE_PATTERN)
                .context("failed to compile ToC row shape regex")?,
        })
    }

    pub fn parse_toc_line(&self, doc_title: &str, line: &str) -> Option<TocEntry> {
        let captures = self.toc_line.captures(line)?;

        let section_id = captures.name("section_id")?.as_str();
        let title = captures.name("title")?.as_str().trim();
        let page = captures.name("page")?.as_str().parse::<u32>().ok()?;

        Some(TocEntry {
            doc_title: doc_title.to_string(),
            section_id: section_id.to_string(),
            title: title.to_string(),
            page,
            level: section_level(section_id),
            parent_id: parent_section_id(section_id),
            full_path: format!("{section_id} {title}"),
        })
    }

    pub fn parse_heading_line(&self, line: &str) -> Option<HeadingLine> {
        let trimmed = line.trim();
        let captures = self.heading_line.captures(trimmed)?;

        let section_id = captures.name("section_id")?.as_str();
        let title = captures
            .name("title")?
            .as_str()
            .split_whitespace()
            .collect::<Vec<&str>>()
            .join(" ");

        Some(HeadingLine {
            section_id: section_id.to_string(),
            title,
            text: trimmed.to_string(),
        })
    }

    pub fn is_toc_row_shaped(&self, line: &str) -> bool {
        self.toc_row_shape.is_match(line)
    }
}

pub fn section_level(section_id: &str) -> usize {
    section_id.matches('.').count() + 1
}

pub fn parent_section_id(section_id: &str) -> Option<String> {
    section_id
        .rsplit_once('.')
        .map(|(parent, _)| parent.to_string())
}

/// Component-wise integer key, so "2.10" orders after "2.9".
pub fn numeric_section_key(section_id: &str) -> Result<Vec<u64>, PipelineError> {
    section_id
        .split('.')
        .map(|segment| {
            segment
                .parse::<u64>()
                .map_err(|_| PipelineError::MalformedSectionId {
                    section_id: section_id.to_string(),
                })
        })
        .collect()
}
