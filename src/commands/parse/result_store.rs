use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use tracing::info;

use crate::model::{Chunk, TocEntry, ValidationReport};
use crate::util::{ensure_directory, now_utc_string, write_json_pretty, write_jsonl};

pub const TOC_FILE_NAME: &str = "usb_pd.jsonl";
pub const CHUNKS_FILE_NAME: &str = "usb_pd_chunks.jsonl";
pub const REPORT_FILE_NAME: &str = "validation_report.json";
pub const RUN_MANIFEST_FILE_NAME: &str = "run_manifest.json";

#[derive(Debug, Clone)]
pub struct SavedOutputs {
    pub toc: PathBuf,
    pub chunks: PathBuf,
    pub validation_report: PathBuf,
}

impl SavedOutputs {
    pub fn named(&self) -> [(&'static str, &Path); 3] {
        [
            ("toc", self.toc.as_path()),
            ("chunks", self.chunks.as_path()),
            ("validation_report", self.validation_report.as_path()),
        ]
    }
}

pub fn save_outputs(
    output_dir: &Path,
    entries: &[TocEntry],
    chunks: &[Chunk],
    report: &ValidationReport,
) -> Result<SavedOutputs> {
    ensure_directory(output_dir)?;

    let outputs = SavedOutputs {
        toc: output_dir.join(TOC_FILE_NAME),
        chunks: output_dir.join(CHUNKS_FILE_NAME),
        validation_report: output_dir.join(REPORT_FILE_NAME),
    };

    write_jsonl(&outputs.toc, entries)?;
    write_jsonl(&outputs.chunks, chunks)?;
    write_json_pretty(&outputs.validation_report, report)?;

    info!(
        output_dir = %output_dir.display(),
        toc_entries = entries.len(),
        chunks = chunks.len(),
        "saved outputs"
    );

    Ok(outputs)
}

/// Replaces every stored row for `doc_id` inside a single transaction.
pub fn persist_to_sqlite(
    db_path: &Path,
    doc_id: &str,
    input_sha256: &str,
    entries: &[TocEntry],
    chunks: &[Chunk],
) -> Result<()> {
    if let Some(parent) = db_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        ensure_directory(parent)?;
    }

    let mut connection = Connection::open(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;

    let tx = connection.transaction()?;
    tx.execute("DELETE FROM chunks WHERE doc_id = ?1", params![doc_id])?;
    tx.execute("DELETE FROM toc_entries WHERE doc_id = ?1", params![doc_id])?;
    tx.execute(
        "
        INSERT INTO docs(doc_id, sha256, ingested_at)
        VALUES(?1, ?2, ?3)
        ON CONFLICT(doc_id) DO UPDATE SET
          sha256=excluded.sha256,
          ingested_at=excluded.ingested_at
        ",
        params![doc_id, input_sha256, now_utc_string()],
    )?;

    {
        let mut toc_statement = tx.prepare(
            "
            INSERT INTO toc_entries(
              doc_id, order_index, section_id, title, page, level, parent_id, full_path
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )?;
        for (order_index, entry) in entries.iter().enumerate() {
            toc_statement.execute(params![
                doc_id,
                order_index as i64,
                &entry.section_id,
                &entry.title,
                entry.page,
                entry.level as i64,
                &entry.parent_id,
                &entry.full_path
            ])?;
        }

        let mut chunk_statement = tx.prepare(
            "
            INSERT INTO chunks(
              doc_id, chunk_seq, section_id, start_heading, section_path, level,
              page_start, page_end, content, tables_json, figures_json
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ",
        )?;
        for (chunk_seq, chunk) in chunks.iter().enumerate() {
            let tables_json = serde_json::to_string(&chunk.tables)
                .context("failed to serialize chunk tables")?;
            let figures_json = serde_json::to_string(&chunk.figures)
                .context("failed to serialize chunk figures")?;
            chunk_statement.execute(params![
                doc_id,
                chunk_seq as i64,
                &chunk.section_id,
                &chunk.start_heading,
                &chunk.section_path,
                chunk.level as i64,
                chunk.page_range.start as i64,
                chunk.page_range.end as i64,
                &chunk.content,
                tables_json,
                figures_json
            ])?;
        }
    }

    tx.commit()
        .with_context(|| format!("failed to commit {}", db_path.display()))?;

    info!(
        path = %db_path.display(),
        doc_id,
        toc_entries = entries.len(),
        chunks = chunks.len(),
        "persisted structure to sqlite"
    );

    Ok(())
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS docs (
              doc_id TEXT PRIMARY KEY,
              sha256 TEXT NOT NULL,
              ingested_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS toc_entries (
              doc_id TEXT NOT NULL,
              order_index INTEGER NOT NULL,
              section_id TEXT NOT NULL,
              title TEXT NOT NULL,
              page INTEGER NOT NULL,
              level INTEGER NOT NULL,
              parent_id TEXT,
              full_path TEXT NOT NULL,
              PRIMARY KEY(doc_id, section_id),
              FOREIGN KEY(doc_id) REFERENCES docs(doc_id)
            );

            CREATE TABLE IF NOT EXISTS chunks (
              doc_id TEXT NOT NULL,
              chunk_seq INTEGER NOT NULL,
              section_id TEXT NOT NULL,
              start_heading TEXT NOT NULL,
              section_path TEXT NOT NULL,
              level INTEGER NOT NULL,
              page_start INTEGER NOT NULL,
              page_end INTEGER NOT NULL,
              content TEXT NOT NULL,
              tables_json TEXT NOT NULL,
              figures_json TEXT NOT NULL,
              PRIMARY KEY(doc_id, chunk_seq),
              FOREIGN KEY(doc_id) REFERENCES docs(doc_id)
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_section ON chunks(doc_id, section_id);
            ",
        )
        .context("failed to ensure sqlite schema")?;
    Ok(())
}
