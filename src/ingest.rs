//! Loading fortune files into jars, and removing jars.
//!
//! A fortune file is plain text with records separated by lines holding a
//! single `%`:
//!
//! ```text
//! You will meet a tall dark stranger.
//! %
//! Today is a good day
//! to read the manual.
//! %
//! ```
//!
//! Each file becomes one jar named after the file (`linux.txt` → `linux`).
//! Loading a file replaces the jar wholesale inside a single transaction.

use anyhow::{Context, Result as AnyResult};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::config::Config;
use crate::db;
use crate::error::{FortuneError, Result};
use crate::models::IngestReport;
use crate::store::JarStore;

/// The line that separates two fortunes.
pub const DELIMITER: &str = "%";

/// Split `reader` into fortune bodies.
///
/// Every kept line is followed by `\n`. Records that are empty or contain only
/// whitespace are dropped. Text after the last delimiter is kept as a final
/// record.
pub fn parse_records<R: BufRead>(reader: R) -> std::io::Result<Vec<String>> {
    let mut records = Vec::new();
    let mut current = String::new();

    for line in reader.lines() {
        let line = line?;
        if line.trim() == DELIMITER {
            flush_record(&mut current, &mut records);
            continue;
        }
        current.push_str(&line);
        current.push('\n');
    }
    flush_record(&mut current, &mut records);

    Ok(records)
}

fn flush_record(current: &mut String, records: &mut Vec<String>) {
    let body = std::mem::take(current);
    if !body.trim().is_empty() {
        records.push(body);
    }
}

/// Jar name for a fortune file: the base name up to its first `.`.
pub fn jar_name_from_path(path: &Path) -> Result<String> {
    let base = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = base.split('.').next().unwrap_or_default().to_string();

    if name.is_empty() {
        return Err(FortuneError::InvalidJarName(base));
    }
    Ok(name)
}

/// Parse `path` and replace the jar named after it.
pub async fn ingest_file(store: &JarStore, path: &Path) -> Result<IngestReport> {
    let jar = jar_name_from_path(path)?;

    let io_err = |source| FortuneError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_err)?;
    let records = parse_records(BufReader::new(file)).map_err(io_err)?;

    store.replace_jar(&jar, &records).await?;
    tracing::info!(jar = %jar, fortunes = records.len(), "jar replaced");

    Ok(IngestReport {
        jar,
        path: path.to_path_buf(),
        fortunes: records.len(),
    })
}

/// CLI entry point for `ingest`. Stops at the first file that fails.
pub async fn run_ingest(config: &Config, files: &[impl AsRef<Path>]) -> AnyResult<()> {
    let store = JarStore::new(db::connect(config).await?);

    for file in files {
        let path = file.as_ref();
        let report = ingest_file(&store, path)
            .await
            .with_context(|| format!("Failed to ingest {}", path.display()))?;
        println!(
            "Writing '{}' to jar '{}'... done ({} fortunes).",
            report.path.display(),
            report.jar,
            report.fortunes
        );
    }

    store.close().await;
    Ok(())
}

/// CLI entry point for `delete`.
pub async fn run_delete(config: &Config, jars: &[String]) -> AnyResult<()> {
    let store = JarStore::new(db::connect(config).await?);

    for jar in jars {
        store
            .delete_jar(jar)
            .await
            .with_context(|| format!("Failed to delete jar '{}'", jar))?;
        tracing::info!(jar = %jar, "jar deleted");
        println!("Deleting jar '{}'... done.", jar);
    }

    store.close().await;
    Ok(())
}
