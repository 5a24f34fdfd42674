use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::audio::{self, AudioDecoder};
use crate::config::ExtractConfig;
use crate::error::{AppError, AudioError, Result};

/// Per-item processing states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    /// Waiting to be processed
    Pending,
    /// Currently being decoded and encoded
    Processing,
    /// Audio written to `output`
    Done,
    /// Decoding or writing failed
    Error,
}

/// A video file queued for audio extraction
#[derive(Debug, Clone)]
pub struct MediaItem {
    pub id: u64,
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub status: ItemStatus,
    pub output: Option<PathBuf>,
}

/// Result of adding files to the queue
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddOutcome {
    pub added: Vec<u64>,
    /// Not a recognised video extension
    pub skipped: Vec<PathBuf>,
    /// Could not be read; the rest of the files were still queued
    pub unreadable: Vec<PathBuf>,
}

/// Snapshot of batch progress
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchProgress {
    pub total: usize,
    pub done: usize,
    pub failed: usize,
    /// Id of the item being processed
    pub current: Option<u64>,
}

/// Summary of a `process_all` run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Sequential audio extraction over a list of video files
pub struct Extractor {
    config: ExtractConfig,
    output_dir: PathBuf,
    decoder: Arc<dyn AudioDecoder>,
    items: Vec<MediaItem>,
    next_id: u64,
    progress_tx: watch::Sender<BatchProgress>,
    progress_rx: watch::Receiver<BatchProgress>,
}

impl Extractor {
    pub fn new(
        config: ExtractConfig,
        output_dir: impl Into<PathBuf>,
        decoder: Arc<dyn AudioDecoder>,
    ) -> Self {
        let (progress_tx, progress_rx) = watch::channel(BatchProgress::default());
        Self {
            config,
            output_dir: output_dir.into(),
            decoder,
            items: Vec::new(),
            next_id: 1,
            progress_tx,
            progress_rx,
        }
    }

    /// Get a receiver for progress updates
    pub fn progress_receiver(&self) -> watch::Receiver<BatchProgress> {
        self.progress_rx.clone()
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    /// Queue files, skipping anything that is not a recognised video or
    /// cannot be read
    pub async fn add_files<I, P>(&mut self, paths: I) -> AddOutcome
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut outcome = AddOutcome::default();

        for path in paths {
            let path = path.as_ref();
            let is_video = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| self.config.accepts_extension(e))
                .unwrap_or(false);

            if !is_video {
                outcome.skipped.push(path.to_path_buf());
                continue;
            }

            let meta = match tokio::fs::metadata(path).await {
                Ok(meta) if meta.is_file() => meta,
                Ok(_) => {
                    warn!("Not a regular file: {:?}", path);
                    outcome.unreadable.push(path.to_path_buf());
                    continue;
                }
                Err(e) => {
                    warn!("Cannot read {:?}: {}", path, e);
                    outcome.unreadable.push(path.to_path_buf());
                    continue;
                }
            };
            let id = self.next_id;
            self.next_id += 1;

            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            debug!("Queued {} ({} bytes) as #{}", name, meta.len(), id);

            self.items.push(MediaItem {
                id,
                path: path.to_path_buf(),
                name,
                size: meta.len(),
                status: ItemStatus::Pending,
                output: None,
            });
            outcome.added.push(id);
        }

        if !outcome.skipped.is_empty() {
            warn!("Some files were skipped because they are not videos.");
        }

        self.publish(None);
        outcome
    }

    /// Remove an item by id
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        let removed = self.items.len() != before;
        if removed {
            self.publish(None);
        }
        removed
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.publish(None);
    }

    /// Extract audio from every item not already done.
    ///
    /// A failure marks only that item as [`ItemStatus::Error`]; the batch
    /// carries on.
    pub async fn process_all(&mut self) -> Result<BatchReport> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let mut report = BatchReport::default();

        for idx in 0..self.items.len() {
            if self.items[idx].status == ItemStatus::Done {
                continue;
            }

            let id = self.items[idx].id;
            self.items[idx].status = ItemStatus::Processing;
            self.publish(Some(id));
            info!(
                "Extracting audio from {} ({})",
                self.items[idx].name,
                self.decoder.name()
            );

            report.processed += 1;
            let output = self.unique_output_path(idx);
            let result = self.extract(&self.items[idx], output).await;
            match result {
                Ok(output) => {
                    info!("Wrote {:?}", output);
                    let item = &mut self.items[idx];
                    item.status = ItemStatus::Done;
                    item.output = Some(output);
                    report.succeeded += 1;
                }
                Err(e) => {
                    error!("Failed to extract audio from {}: {}", self.items[idx].name, e);
                    let item = &mut self.items[idx];
                    item.status = ItemStatus::Error;
                    item.output = None;
                    report.failed += 1;
                }
            }
        }

        self.publish(None);
        Ok(report)
    }

    /// Output path for item `idx` that no other item in the list already owns.
    ///
    /// Sources sharing a stem (`talk.mp4`, `talk.webm`) get `audio-talk.wav`,
    /// then `audio-talk (1).wav`, and so on.
    fn unique_output_path(&self, idx: usize) -> PathBuf {
        let claimed: HashSet<&Path> = self
            .items
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != idx)
            .filter_map(|(_, item)| item.output.as_deref())
            .collect();

        let name = &self.items[idx].name;
        let mut n = 0;
        loop {
            let candidate = self.output_dir.join(audio::numbered_output_file_name(
                name,
                &self.config.prefix,
                n,
            ));
            if !claimed.contains(candidate.as_path()) {
                return candidate;
            }
            n += 1;
        }
    }

    async fn extract(&self, item: &MediaItem, output: PathBuf) -> Result<PathBuf> {
        let bytes = tokio::fs::read(&item.path).await.map_err(AudioError::Io)?;
        let hint = item
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_string);

        let decoder = self.decoder.clone();
        let wav = tokio::task::spawn_blocking(move || {
            let audio = decoder.decode(bytes, hint.as_deref())?;
            Ok::<_, AudioError>(audio::encode_wav(&audio))
        })
        .await
        .map_err(|e| AppError::Other(format!("decode task failed: {}", e)))??;

        tokio::fs::write(&output, wav.as_bytes()).await?;
        Ok(output)
    }

    fn publish(&self, current: Option<u64>) {
        let count = |status: ItemStatus| {
            self.items.iter().filter(|i| i.status == status).count()
        };
        let progress = BatchProgress {
            total: self.items.len(),
            done: count(ItemStatus::Done),
            failed: count(ItemStatus::Error),
            current,
        };
        let _ = self.progress_tx.send(progress);
    }
}
