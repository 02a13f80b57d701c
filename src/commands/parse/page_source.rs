use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::cli::SourceArgs;

const FORM_FEED: char = '\u{000C}';
const RUNNING_LINE_MIN_PAGES: usize = 3;
const RUNNING_LINE_MAX_CHARS: usize = 120;

/// One page of extracted text. `text` is `None` only when the page carried
/// no text at all; whitespace-only text is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub number: usize,
    pub text: Option<String>,
}

impl Page {
    pub fn new(number: usize, raw: String) -> Self {
        let text = if raw.is_empty() { None } else { Some(raw) };
        Self { number, text }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.as_deref().unwrap_or_default().lines()
    }
}

/// An ordered, re-traversable sequence of pages. Each `load_pages` call is a
/// complete traversal that acquires and releases the underlying reader.
pub trait PageSource {
    fn load_pages(&self) -> Result<Vec<Page>>;

    fn describe(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct PdftotextSource {
    pdf_path: PathBuf,
    max_pages: Option<usize>,
}

impl PdftotextSource {
    pub fn new(pdf_path: impl Into<PathBuf>, max_pages: Option<usize>) -> Self {
        Self {
            pdf_path: pdf_path.into(),
            max_pages,
        }
    }
}

impl PageSource for PdftotextSource {
    fn load_pages(&self) -> Result<Vec<Page>> {
        let mut command = Command::new("pdftotext");
        command.arg("-enc").arg("UTF-8").arg("-f").arg("1");
        if let Some(max_pages) = self.max_pages {
            command.arg("-l").arg(max_pages.to_string());
        }
        command.arg(&self.pdf_path).arg("-");

        let output = command.output().with_context(|| {
            format!("failed to execute pdftotext for {}", self.pdf_path.display())
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "pdftotext returned non-zero exit status for {}: {}",
                self.pdf_path.display(),
                stderr.trim()
            );
        }

        let raw = String::from_utf8_lossy(&output.stdout);
        let pages = split_form_feed_pages(&raw, self.max_pages);
        debug!(path = %self.pdf_path.display(), pages = pages.len(), "pdftotext traversal");
        Ok(pages)
    }

    fn describe(&self) -> String {
        format!("pdftotext:{}", self.pdf_path.display())
    }
}

/// Pre-extracted text with pages separated by form feeds, the layout
/// `pdftotext` itself emits.
#[derive(Debug, Clone)]
pub struct TextDumpSource {
    path: PathBuf,
    max_pages: Option<usize>,
}

impl TextDumpSource {
    pub fn new(path: impl Into<PathBuf>, max_pages: Option<usize>) -> Self {
        Self {
            path: path.into(),
            max_pages,
        }
    }
}

impl PageSource for TextDumpSource {
    fn load_pages(&self) -> Result<Vec<Page>> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read text dump {}", self.path.display()))?;
        Ok(split_form_feed_pages(&raw, self.max_pages))
    }

    fn describe(&self) -> String {
        format!("text:{}", self.path.display())
    }
}

#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    pages: Vec<String>,
}

#[cfg(test)]
impl InMemorySource {
    pub fn new<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pages: pages.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
impl PageSource for InMemorySource {
    fn load_pages(&self) -> Result<Vec<Page>> {
        Ok(self
            .pages
            .iter()
            .enumerate()
            .map(|(index, text)| Page::new(index + 1, text.clone()))
            .collect())
    }

    fn describe(&self) -> String {
        format!("memory:{} pages", self.pages.len())
    }
}

/// Removes header and footer lines that repeat across pages from whatever the
/// inner source yields.
pub struct RunningLineFilter<S> {
    inner: S,
}

impl<S: PageSource> RunningLineFilter<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: PageSource> PageSource for RunningLineFilter<S> {
    fn load_pages(&self) -> Result<Vec<Page>> {
        let mut pages = self.inner.load_pages()?;
        let removed = strip_running_lines(&mut pages);
        info!(source = %self.inner.describe(), removed, "stripped running header/footer lines");
        Ok(pages)
    }

    fn describe(&self) -> String {
        format!("{} (running lines stripped)", self.inner.describe())
    }
}

pub fn open_page_source(args: &SourceArgs) -> Box<dyn PageSource> {
    let is_text_dump = args
        .input_pdf
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("txt"))
        .unwrap_or(false);

    match (is_text_dump, args.strip_running_lines) {
        (true, false) => Box::new(TextDumpSource::new(&args.input_pdf, args.max_pages)),
        (true, true) => Box::new(RunningLineFilter::new(TextDumpSource::new(
            &args.input_pdf,
            args.max_pages,
        ))),
        (false, false) => Box::new(PdftotextSource::new(&args.input_pdf, args.max_pages)),
        (false, true) => Box::new(RunningLineFilter::new(PdftotextSource::new(
            &args.input_pdf,
            args.max_pages,
        ))),
    }
}

pub fn doc_title_for(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default()
        .to_string()
}

pub fn pdftotext_version() -> Option<String> {
    let output = Command::new("pdftotext").arg("-v").output().ok()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let source = if stdout.trim().is_empty() {
        stderr.trim()
    } else {
        stdout.trim()
    };

    source
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
}

pub fn split_form_feed_pages(raw: &str, max_pages: Option<usize>) -> Vec<Page> {
    let mut texts: Vec<String> = raw
        .split(FORM_FEED)
        .map(|chunk| chunk.replace('\u{0000}', ""))
        .collect();

    while let Some(last_page) = texts.last() {
        if last_page.trim().is_empty() {
            texts.pop();
            continue;
        }
        break;
    }

    if let Some(max_pages) = max_pages {
        texts.truncate(max_pages);
    }

    texts
        .into_iter()
        .enumerate()
        .map(|(index, text)| Page::new(index + 1, text))
        .collect()
}

/// Returns the number of lines removed.
pub fn strip_running_lines(pages: &mut [Page]) -> usize {
    let header_candidates = detect_repeated_edge_lines(pages, true);
    let footer_candidates = detect_repeated_edge_lines(pages, false);
    let mut removed = 0usize;

    for page in pages.iter_mut() {
        let Some(text) = page.text.as_ref() else {
            continue;
        };
        let mut lines = text.lines().map(str::to_string).collect::<Vec<String>>();

        if let Some(index) = lines.iter().position(|line| !line.trim().is_empty()) {
            if header_candidates.contains(&normalize_edge_line(&lines[index])) {
                lines.remove(index);
                removed += 1;
            }
        }

        if let Some(index) = lines.iter().rposition(|line| !line.trim().is_empty()) {
            if footer_candidates.contains(&normalize_edge_line(&lines[index])) {
                lines.remove(index);
                removed += 1;
            }
        }

        *page = Page::new(page.number, lines.join("\n"));
    }

    removed
}

fn detect_repeated_edge_lines(pages: &[Page], header: bool) -> HashSet<String> {
    let mut counts = HashMap::<String, usize>::new();
    for page in pages {
        let candidate = if header {
            page.lines().map(str::trim).find(|line| !line.is_empty())
        } else {
            page.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .last()
        };

        let Some(candidate) = candidate else {
            continue;
        };

        let normalized = normalize_edge_line(candidate);
        if normalized.is_empty() || normalized.len() > RUNNING_LINE_MAX_CHARS {
            continue;
        }
        *counts.entry(normalized).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .filter_map(|(candidate, count)| (count >= RUNNING_LINE_MIN_PAGES).then_some(candidate))
        .collect()
}

fn normalize_edge_line(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
        .to_ascii_lowercase()
}
