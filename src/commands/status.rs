use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::parse::RUN_MANIFEST_FILE_NAME;
use crate::model::RunManifest;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_path = args.output_dir.join(RUN_MANIFEST_FILE_NAME);

    info!(output_dir = %args.output_dir.display(), "status requested");

    if !manifest_path.exists() {
        bail!("run manifest missing: {}", manifest_path.display());
    }

    let manifest = load_manifest(&manifest_path)?;
    info!(
        run_id = %manifest.run_id,
        doc_title = %manifest.doc_title,
        input = %manifest.input_path,
        started_at = %manifest.started_at,
        completed_at = %manifest.completed_at,
        toc_pages = ?manifest.toc_pages,
        pages = manifest.counts.page_count,
        toc_entries = manifest.counts.toc_entry_count,
        chunks = manifest.counts.chunk_count,
        match_percentage = manifest.match_percentage,
        missing = manifest.counts.missing_count,
        extra = manifest.counts.extra_count,
        out_of_order = manifest.counts.out_of_order_count,
        "loaded run manifest"
    );

    for output in [
        &manifest.outputs.toc,
        &manifest.outputs.chunks,
        &manifest.outputs.validation_report,
    ] {
        if !Path::new(output).exists() {
            warn!(path = %output, "recorded output missing");
        }
    }

    if let Some(db_path) = manifest.outputs.db.as_deref() {
        if Path::new(db_path).exists() {
            let conn = Connection::open(db_path)
                .with_context(|| format!("failed to open {db_path}"))?;
            let toc_count = query_count(&conn, "SELECT COUNT(*) FROM toc_entries").unwrap_or(0);
            let chunks_count = query_count(&conn, "SELECT COUNT(*) FROM chunks").unwrap_or(0);

            info!(
                path = %db_path,
                toc_entries = toc_count,
                chunks = chunks_count,
                "database status"
            );
        } else {
            warn!(path = %db_path, "database file missing");
        }
    }

    Ok(())
}

fn load_manifest(path: &Path) -> Result<RunManifest> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn query_count(conn: &Connection, sql: &str) -> Result<i64> {
    let count = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}
