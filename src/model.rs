use serde::{Deserialize, Serialize};

/// One row of the document's own table of contents.
///
/// Field order matches the persisted JSONL layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub doc_title: String,
    pub section_id: String,
    pub title: String,
    pub page: u32,
    pub level: usize,
    pub parent_id: Option<String>,
    pub full_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: usize,
    pub end: usize,
}

/// Body text attributed to a single heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub section_path: String,
    pub start_heading: String,
    pub section_id: String,
    pub title: String,
    pub level: usize,
    pub content: String,
    pub tables: Vec<String>,
    pub figures: Vec<String>,
    pub page_range: PageRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutOfOrderSection {
    pub expected: String,
    pub found: String,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyMatch {
    pub toc_path: String,
    pub chunk_path: String,
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub toc_section_count: usize,
    pub parsed_section_count: usize,
    pub matched_sections: Vec<String>,
    pub missing_sections: Vec<String>,
    pub extra_sections: Vec<String>,
    pub out_of_order_sections: Vec<OutOfOrderSection>,
    pub fuzzy_matches: Vec<FuzzyMatch>,
    pub match_percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolVersions {
    pub usbpd: String,
    pub pdftotext: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCounts {
    pub page_count: usize,
    pub empty_page_count: usize,
    pub toc_entry_count: usize,
    pub toc_duplicate_count: usize,
    pub chunk_count: usize,
    pub matched_count: usize,
    pub missing_count: usize,
    pub extra_count: usize,
    pub out_of_order_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputPaths {
    pub toc: String,
    pub chunks: String,
    pub validation_report: String,
    pub db: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub started_at: String,
    pub completed_at: String,
    pub doc_title: String,
    pub input_path: String,
    pub input_sha256: String,
    pub tool_versions: ToolVersions,
    pub toc_pages: Vec<usize>,
    pub match_percentage: f64,
    pub counts: RunCounts,
    pub outputs: OutputPaths,
}
