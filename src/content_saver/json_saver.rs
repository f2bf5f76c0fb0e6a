use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::timeout;

use crate::assembler::CanonicalDocument;
use crate::crawl_engine::SessionReport;

/// Timeout for blocking JSON serialization
/// Prevents hangs on pathological data structures
const BLOCKING_SERIALIZATION_TIMEOUT: Duration = Duration::from_secs(10);

/// File name of the session report at the output root
pub const REPORT_FILE_NAME: &str = "report.json";

async fn to_pretty_json<T>(data: T) -> Result<String>
where
    T: Serialize + Send + 'static,
{
    // JSON serialization (keep spawn_blocking - CPU intensive)
    let blocking_task = tokio::task::spawn_blocking(move || serde_json::to_string_pretty(&data));

    match timeout(BLOCKING_SERIALIZATION_TIMEOUT, blocking_task).await {
        Ok(Ok(result)) => Ok(result?),
        Ok(Err(e)) => Err(anyhow!("JSON serialization task panicked: {e}")),
        Err(_) => {
            log::warn!("JSON serialization timeout (timeout: {BLOCKING_SERIALIZATION_TIMEOUT:?})");
            Err(anyhow!(
                "JSON serialization timed out after {BLOCKING_SERIALIZATION_TIMEOUT:?}"
            ))
        }
    }
}

async fn write_file(path: &Path, contents: String) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow!("Path has no parent directory: {}", path.display()))?;
    tokio::fs::create_dir_all(parent)
        .await
        .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Save one canonical document under its mirrored path in `output_dir`.
///
/// Returns the written path.
///
/// # Errors
///
/// Fails if the page URL has no host, or on serialization or I/O errors.
pub async fn save_document(document: &CanonicalDocument, output_dir: &Path) -> Result<PathBuf> {
    let path = output_dir.join(document.relative_path()?);
    let json = to_pretty_json(document.document.clone()).await?;
    write_file(&path, json).await?;
    log::debug!("Saved schema for {} to {}", document.page_url, path.display());
    Ok(path)
}

/// Save the whole session report as `report.json` in `output_dir`.
///
/// # Errors
///
/// Fails on serialization or I/O errors.
pub async fn save_report(report: &SessionReport, output_dir: &Path) -> Result<PathBuf> {
    let path = output_dir.join(REPORT_FILE_NAME);
    let json = to_pretty_json(report.clone()).await?;
    write_file(&path, json).await?;
    Ok(path)
}
