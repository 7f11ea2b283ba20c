//! Crash-safe whole-file JSONL writes.
//!
//! Data goes to a sibling temporary file that is renamed over the target
//! once fully flushed. A rename within one filesystem is atomic on POSIX, so
//! readers see either the old file or the complete new one.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs::File;

use crate::{JsonlWriter, Result};

/// Atomically writes a slice of values to a JSONL file.
///
/// # Errors
///
/// See [`write_jsonl_atomic_iter`].
pub async fn write_jsonl_atomic<T, P>(path: P, values: &[T]) -> Result<usize>
where
    T: Serialize,
    P: AsRef<Path>,
{
    write_jsonl_atomic_iter(path, values.iter()).await
}

/// Atomically writes an iterator of values to a JSONL file.
///
/// Returns the number of records written. On failure the target is left
/// untouched and the temporary file is removed on a best-effort basis.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created or written, if
/// a value fails to serialize, or if the final rename fails.
pub async fn write_jsonl_atomic_iter<T, I, P>(path: P, values: I) -> Result<usize>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let temp_path = make_temp_path(path);

    let written = match write_to_temp_file(&temp_path, values).await {
        Ok(written) => written,
        Err(e) => {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e);
        }
    };

    tokio::fs::rename(&temp_path, path).await?;
    tracing::debug!(path = %path.display(), records = written, "wrote JSONL file");
    Ok(written)
}

/// `dep_graph.jsonl` becomes `dep_graph.jsonl.tmp`; `index` becomes `index.tmp`.
fn make_temp_path(path: &Path) -> PathBuf {
    let mut temp_path = path.to_path_buf();
    let new_extension = match path.extension() {
        Some(ext) => {
            let mut new_ext = ext.to_os_string();
            new_ext.push(".tmp");
            new_ext
        }
        None => std::ffi::OsString::from("tmp"),
    };
    temp_path.set_extension(new_extension);
    temp_path
}

async fn write_to_temp_file<T, I>(temp_path: &Path, values: I) -> Result<usize>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let file = File::create(temp_path).await?;
    let mut writer = JsonlWriter::new(file);
    writer.write_all(values).await?;
    writer.flush().await?;
    let written = writer.records_written();
    writer.into_inner().sync_all().await?;
    Ok(written)
}
