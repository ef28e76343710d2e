//! # Scratch Storage
//!
//! Uploads are streamed to disk before any codec work starts. Each saved file is
//! a [`ScratchFile`] guard that deletes the file when dropped, so a request
//! releases its storage on every exit path, errors included.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use uuid::Uuid;

use crate::common::config::StorageConfig;

/// Make an uploaded file name safe to use on disk and in response headers.
///
/// Keeps ASCII alphanumerics, `.`, `-` and `_`; everything else becomes `_`.
/// Leading dots are stripped so no hidden or relative names come out.
pub fn sanitize_filename(name: &str) -> String {
    // browsers on Windows may send a full path
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Directory holding in-flight uploads.
pub struct ScratchDir {
    root: PathBuf,
    buffer_size: usize,
    /// Keeps a temporary root alive; removed with its contents on drop.
    _temp: Option<TempDir>,
}

impl ScratchDir {
    /// Open the configured upload directory, or create a temporary one.
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let (root, temp) = match &config.upload_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create upload dir {}", dir.display()))?;
                (dir.clone(), None)
            }
            None => {
                let temp = TempDir::new().context("Failed to create temporary upload dir")?;
                (temp.path().to_path_buf(), Some(temp))
            }
        };

        Ok(Self {
            root,
            buffer_size: config.buffer_size.max(1),
            _temp: temp,
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Start writing a new upload. The on-disk name is unique per call.
    pub async fn create(&self, original_name: &str) -> Result<Upload> {
        let path = self
            .root
            .join(format!("{}_{}", Uuid::new_v4(), sanitize_filename(original_name)));
        let file = File::create(&path)
            .await
            .with_context(|| format!("Failed to create {}", path.display()))?;

        Ok(Upload {
            writer: BufWriter::with_capacity(self.buffer_size, file),
            file: ScratchFile { path, size: 0 },
        })
    }

    /// Save a complete buffer in one go.
    pub async fn save_bytes(&self, original_name: &str, data: &[u8]) -> Result<ScratchFile> {
        let mut upload = self.create(original_name).await?;
        upload.write_chunk(data).await?;
        upload.finish().await
    }
}

/// An upload being written. Dropping it before [`Upload::finish`] removes the
/// partial file.
pub struct Upload {
    writer: BufWriter<File>,
    file: ScratchFile,
}

impl Upload {
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.writer.write_all(chunk).await?;
        self.file.size += chunk.len() as u64;
        Ok(())
    }

    /// Flush everything to disk and hand over the finished file.
    pub async fn finish(mut self) -> Result<ScratchFile> {
        self.writer.flush().await?;
        debug!(
            "Saved upload {} ({} bytes)",
            self.file.path.display(),
            self.file.size
        );
        Ok(self.file)
    }
}

/// A file in scratch storage, deleted when dropped.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    size: u64,
}

impl ScratchFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {}", self.path.display(), e),
        }
    }
}
