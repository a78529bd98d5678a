//! Local copies of generated reports

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// `todos-YYYYMMDD-HHMMSS.pdf` for `at`
pub fn report_filename(at: DateTime<Utc>) -> String {
    format!("todos-{}.pdf", at.format("%Y%m%d-%H%M%S"))
}

/// Write `bytes` to `dir/filename`, creating `dir` if needed.
///
/// Failures are logged and swallowed: the caller still has the bytes.
pub async fn persist(dir: &Path, filename: &str, bytes: &[u8]) -> Option<PathBuf> {
    match write_report(dir, filename, bytes).await {
        Ok(path) => {
            info!("Saved report to {}", path.display());
            Some(path)
        }
        Err(e) => {
            warn!("Could not save report {} in {}: {}", filename, dir.display(), e);
            None
        }
    }
}

async fn write_report(dir: &Path, filename: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(filename);
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}
