use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use super::chunking::chunk_document;
use super::line_classify::LineClassifier;
use super::page_source::{doc_title_for, open_page_source, pdftotext_version};
use super::result_store::{RUN_MANIFEST_FILE_NAME, persist_to_sqlite, save_outputs};
use super::structural_validation::validate_structure;
use super::toc_extract::extract_toc;
use crate::cli::ParseArgs;
use crate::error::PipelineError;
use crate::model::{OutputPaths, RunCounts, RunManifest, ToolVersions};
use crate::util::{now_utc_string, sha256_file, utc_compact_string, write_json_pretty};

pub fn run(args: ParseArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let input_path = args.source.input_pdf.clone();
    if !input_path.exists() {
        return Err(PipelineError::InputNotFound(input_path).into());
    }

    println!("Processing PDF: {}", input_path.display());
    info!(input = %input_path.display(), run_id = %run_id, "starting parse");

    let source = open_page_source(&args.source);
    let classifier = LineClassifier::new()?;
    let doc_title = doc_title_for(&input_path);

    println!("Extracting Table of Contents...");
    let toc = extract_toc(source.as_ref(), &classifier, &doc_title)?;

    println!("Chunking document content...");
    let chunks = chunk_document(source.as_ref(), &classifier)?;

    println!("Validating document structure...");
    let report = validate_structure(&toc.entries, &chunks);

    println!("Saving outputs...");
    let input_sha256 = sha256_file(&input_path)?;
    let outputs = save_outputs(&args.output_dir, &toc.entries, &chunks, &report)?;
    if let Some(db_path) = &args.db_path {
        persist_to_sqlite(db_path, &doc_title, &input_sha256, &toc.entries, &chunks)?;
    }

    let manifest = RunManifest {
        manifest_version: 1,
        run_id,
        started_at,
        completed_at: now_utc_string(),
        doc_title,
        input_path: input_path.display().to_string(),
        input_sha256,
        tool_versions: ToolVersions {
            usbpd: env!("CARGO_PKG_VERSION").to_string(),
            pdftotext: pdftotext_version(),
        },
        toc_pages: toc.toc_pages.clone(),
        match_percentage: report.match_percentage,
        counts: RunCounts {
            page_count: toc.page_count,
            empty_page_count: toc.empty_page_count,
            toc_entry_count: toc.entries.len(),
            toc_duplicate_count: toc.duplicate_count,
            chunk_count: chunks.len(),
            matched_count: report.matched_sections.len(),
            missing_count: report.missing_sections.len(),
            extra_count: report.extra_sections.len(),
            out_of_order_count: report.out_of_order_sections.len(),
        },
        outputs: OutputPaths {
            toc: outputs.toc.display().to_string(),
            chunks: outputs.chunks.display().to_string(),
            validation_report: outputs.validation_report.display().to_string(),
            db: args.db_path.as_ref().map(|path| path.display().to_string()),
        },
    };
    let manifest_path = args.output_dir.join(RUN_MANIFEST_FILE_NAME);
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote run manifest");

    println!("\nProcessing complete. Output files:");
    for (name, path) in outputs.named() {
        println!("- {}: {}", name, absolute_display(path)?);
    }
    if let Some(db_path) = &args.db_path {
        println!("- db: {}", absolute_display(db_path)?);
    }

    println!("\nValidation Results:");
    println!("- Match Percentage: {:.1}%", report.match_percentage);
    println!("- Missing Sections: {}", report.missing_sections.len());
    println!("- Extra Sections: {}", report.extra_sections.len());

    Ok(())
}

fn absolute_display(path: &Path) -> Result<String> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("failed to resolve {}", path.display()))?;
    Ok(absolute.display().to_string())
}
