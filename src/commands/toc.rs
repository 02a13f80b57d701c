use anyhow::Result;

use crate::cli::TocArgs;
use crate::commands::parse::{LineClassifier, doc_title_for, extract_toc, open_page_source};
use crate::error::PipelineError;

pub fn run(args: TocArgs) -> Result<()> {
    let input_path = &args.source.input_pdf;
    if !input_path.exists() {
        return Err(PipelineError::InputNotFound(input_path.clone()).into());
    }

    let source = open_page_source(&args.source);
    let classifier = LineClassifier::new()?;
    let toc = extract_toc(source.as_ref(), &classifier, &doc_title_for(input_path))?;

    if toc.entries.is_empty() {
        println!("ToC pages found but no entries parsed.");
        return Ok(());
    }

    for entry in &toc.entries {
        let indent = "  ".repeat(entry.level.saturating_sub(1));
        println!("{}{} (p. {})", indent, entry.full_path, entry.page);
    }

    Ok(())
}
