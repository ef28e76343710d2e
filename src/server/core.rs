//! # Stego Core - Bounded Codec Worker Pool
//!
//! The codec is synchronous and CPU-heavy. [`StegoCore`] runs each operation on
//! tokio's blocking thread pool, with a semaphore capping how many run at
//! once so a burst of large uploads cannot exhaust memory.
//!
//! HTTP concerns (multipart parsing, responses) live in
//! [`routes`](super::routes); this layer only reads scratch files and calls the
//! codec.

use anyhow::{anyhow, Result};
use log::{error, info};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::codec::{self, capacity, CodecKind, Decoded, MediaClass};

/// Runs codec operations on file-backed carriers with bounded concurrency.
#[derive(Clone)]
pub struct StegoCore {
    permits: Arc<Semaphore>,
    pool_size: usize,
}

impl StegoCore {
    /// Create a core allowing `pool_size` concurrent operations (at least one).
    ///
    /// # Example
    /// ```ignore
    /// let core = StegoCore::new(4);
    /// ```
    pub fn new(pool_size: usize) -> Self {
        let pool_size = pool_size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(pool_size)),
            pool_size,
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Run a blocking job once a pool slot is free.
    async fn run<T, F>(&self, job: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let _permit = self.permits.acquire().await?;
        tokio::task::spawn_blocking(job)
            .await
            .map_err(|e| anyhow!("Codec task panicked: {}", e))?
    }

    /// Maximum payload size for a carrier on disk.
    ///
    /// Raster images are read and their dimensions decoded; other classes are
    /// sized from file metadata alone. An unreadable carrier yields 0.
    pub async fn capacity(&self, media_path: &Path, ext: &str) -> Result<u64> {
        let path = media_path.to_path_buf();
        let ext = ext.to_string();
        self.run(move || Ok(capacity_of_file(&path, &ext))).await
    }

    /// Embed the contents of `data_path` into the carrier at `media_path`.
    pub async fn encode(&self, media_path: &Path, data_path: &Path, ext: &str) -> Result<Vec<u8>> {
        let media_path = media_path.to_path_buf();
        let data_path = data_path.to_path_buf();
        let ext = ext.to_string();

        self.run(move || {
            let carrier = std::fs::read(&media_path)?;
            let payload = std::fs::read(&data_path)?;
            let output = codec::encode(&carrier, &payload, &ext)?;
            info!(
                "Embedded {} bytes with {:?}, output {} bytes",
                payload.len(),
                CodecKind::select(&ext),
                output.len()
            );
            Ok(output)
        })
        .await
    }

    /// Recover the payload hidden in the carrier at `media_path`.
    pub async fn decode(&self, media_path: &Path, ext: &str) -> Result<Decoded> {
        let media_path = media_path.to_path_buf();
        let ext = ext.to_string();

        self.run(move || {
            let carrier = std::fs::read(&media_path)?;
            Ok(codec::decode(&carrier, &ext)?)
        })
        .await
    }
}

fn capacity_of_file(path: &Path, ext: &str) -> u64 {
    let class = MediaClass::from_extension(ext);
    let result = match class {
        MediaClass::RasterImage => {
            std::fs::read(path).map(|carrier| codec::estimate_capacity(&carrier, ext))
        }
        _ => std::fs::metadata(path).map(|meta| capacity::from_file_size(meta.len(), class)),
    };

    result.unwrap_or_else(|e| {
        error!("Capacity calculation failed for {}: {}", path.display(), e);
        0
    })
}
