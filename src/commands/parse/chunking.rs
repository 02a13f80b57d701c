use anyhow::Result;
use tracing::info;

use super::line_classify::{HeadingLine, LineClassifier};
use super::page_source::{Page, PageSource};
use crate::model::{Chunk, PageRange};

pub const SECTION_PATH_SEPARATOR: &str = " > ";
const TABLE_MARKER: &str = "Table";
const FIGURE_MARKER: &str = "Figure";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingFrame {
    pub heading: String,
    pub level: usize,
}

/// Ancestor chain of the open chunk. Levels strictly increase bottom to top.
#[derive(Debug, Clone, Default)]
pub struct HeadingStack {
    frames: Vec<HeadingFrame>,
}

impl HeadingStack {
    pub fn push_heading(&mut self, heading: &str, level: usize) {
        while self.frames.last().is_some_and(|frame| frame.level >= level) {
            self.frames.pop();
        }
        self.frames.push(HeadingFrame {
            heading: heading.to_string(),
            level,
        });
    }

    pub fn section_path(&self) -> String {
        self.frames
            .iter()
            .map(|frame| frame.heading.as_str())
            .collect::<Vec<&str>>()
            .join(SECTION_PATH_SEPARATOR)
    }

    #[cfg(test)]
    pub fn frames(&self) -> &[HeadingFrame] {
        &self.frames
    }
}

/// Accumulator for the single forward chunking pass. At most one chunk is
/// open; finalized chunks are never touched again.
#[derive(Debug, Default)]
pub struct ChunkerState {
    stack: HeadingStack,
    open: Option<Chunk>,
    finalized: Vec<Chunk>,
}

impl ChunkerState {
    pub fn on_heading(&mut self, heading: &HeadingLine, page_number: usize) {
        if let Some(mut open) = self.open.take() {
            let start = open.page_range.start;
            open.page_range.end = page_number.saturating_sub(1).max(start);
            self.finalized.push(open);
        }

        let level = heading.level();
        self.stack.push_heading(&heading.text, level);

        self.open = Some(Chunk {
            section_path: self.stack.section_path(),
            start_heading: heading.text.clone(),
            section_id: heading.section_id.clone(),
            title: heading.title.clone(),
            level,
            content: String::new(),
            tables: Vec::new(),
            figures: Vec::new(),
            page_range: PageRange {
                start: page_number,
                end: page_number,
            },
        });
    }

    /// Lines arriving before the first heading are dropped.
    pub fn on_body_line(&mut self, line: &str) {
        let Some(open) = self.open.as_mut() else {
            return;
        };

        open.content.push_str(line);
        open.content.push('\n');

        if line.contains(TABLE_MARKER) {
            open.tables.push(line.trim().to_string());
        }
        if line.contains(FIGURE_MARKER) {
            open.figures.push(line.trim().to_string());
        }
    }

    /// The last open chunk keeps the end page it was opened with.
    pub fn finish(mut self) -> Vec<Chunk> {
        if let Some(open) = self.open.take() {
            self.finalized.push(open);
        }
        self.finalized
    }

    #[cfg(test)]
    pub fn stack(&self) -> &HeadingStack {
        &self.stack
    }

    #[cfg(test)]
    pub fn open_chunk(&self) -> Option<&Chunk> {
        self.open.as_ref()
    }

    #[cfg(test)]
    pub fn finalized(&self) -> &[Chunk] {
        &self.finalized
    }
}

pub fn chunk_document(source: &dyn PageSource, classifier: &LineClassifier) -> Result<Vec<Chunk>> {
    let pages = source.load_pages()?;
    let chunks = chunk_pages(&pages, classifier);

    info!(source = %source.describe(), chunks = chunks.len(), "chunked document");
    Ok(chunks)
}

pub fn chunk_pages(pages: &[Page], classifier: &LineClassifier) -> Vec<Chunk> {
    let mut state = ChunkerState::default();

    for page in pages.iter().filter(|page| page.text.is_some()) {
        for line in page.lines() {
            match classifier.parse_heading_line(line) {
                Some(heading) => state.on_heading(&heading, page.number),
                None => state.on_body_line(line),
            }
        }
    }

    state.finish()
}
