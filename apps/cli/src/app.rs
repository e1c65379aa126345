//! Batch driver: uploads every matching file in the upload folder.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use videoup_store::FileStore;
use videoup_transfer::format_bytes;
use videoup_uploader::{
    UploadCoordinator, UploadDisposition, UploadEvent, UploadOutcome, UploadRequest,
};
use videoup_vimeo::{Client, public_link};

use crate::config::Config;
use crate::passphrase;

/// Result counts of one batch run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub uploaded: usize,
    pub skipped: usize,
    pub failed: Vec<String>,
    /// Set when the run stopped early on Ctrl-C.
    pub interrupted: bool,
}

impl Summary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && !self.interrupted
    }
}

/// Runs one batch until every file is attempted or Ctrl-C is pressed.
pub async fn run(config: Config) -> anyhow::Result<Summary> {
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("SIGINT received, stopping after saving progress");
            on_signal.cancel();
        }
    });

    run_until(config, cancel).await
}

/// Uploads files sequentially, stopping early once `cancel` fires.
///
/// Cancelling mid-file drops the in-flight request. The session record is
/// already saved, so the next run resumes from the remote's offset.
pub async fn run_until(config: Config, cancel: CancellationToken) -> anyhow::Result<Summary> {
    let store = FileStore::open(config.store_folder())
        .with_context(|| format!("opening store in {}", config.store_folder().display()))?;
    let client = Client::new(&config.vimeo.personal_access_token, config.timeouts())?
        .with_base_url(config.vimeo.api_base.clone());

    let (event_tx, event_rx) = mpsc::channel(64);
    let printer = tokio::spawn(print_events(event_rx));

    let coordinator = UploadCoordinator::new(Arc::new(store), Arc::new(client))
        .with_policy(config.retry_policy())
        .with_events(event_tx);

    let files = scan_folder(&config.upload_folder_path, &config)?;
    tracing::info!(
        folder = %config.upload_folder_path.display(),
        count = files.len(),
        "found files to upload"
    );

    let mut summary = Summary::default();

    for path in files {
        if cancel.is_cancelled() {
            summary.interrupted = true;
            break;
        }

        let request = match build_request(&path, &config) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "skipping file");
                summary.failed.push(path.display().to_string());
                continue;
            }
        };

        let result = tokio::select! {
            r = coordinator.upload(&request) => r,
            _ = cancel.cancelled() => {
                tracing::warn!(name = %request.identifier, "upload interrupted");
                summary.interrupted = true;
                break;
            }
        };

        match result {
            Ok(outcome) => {
                match outcome.disposition {
                    UploadDisposition::AlreadyComplete => summary.skipped += 1,
                    _ => summary.uploaded += 1,
                }
                if let Some(line) = report_line(&request.calculated_name, &outcome) {
                    println!("{line}");
                }
                if let Some(finished) = &config.finished_folder_path {
                    move_finished(&path, finished);
                }
            }
            Err(failure) => {
                // Already logged by the coordinator; keep going.
                summary.failed.push(failure.identifier);
            }
        }
    }

    drop(coordinator);
    let _ = printer.await;

    tracing::info!(
        uploaded = summary.uploaded,
        skipped = summary.skipped,
        failed = summary.failed.len(),
        "batch finished"
    );
    Ok(summary)
}

/// Matching files directly inside `folder`, sorted by name.
pub fn scan_folder(folder: &Path, config: &Config) -> anyhow::Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(folder)
        .with_context(|| format!("reading upload folder {}", folder.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && config.accepts(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Builds the upload request for one file with a fresh passphrase.
pub fn build_request(path: &Path, config: &Config) -> anyhow::Result<UploadRequest> {
    let identifier = path
        .file_name()
        .and_then(|n| n.to_str())
        .context("file name is not valid UTF-8")?
        .to_string();
    let calculated_name = path
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or(&identifier)
        .to_string();
    let total_size = std::fs::metadata(path)
        .with_context(|| format!("reading size of {}", path.display()))?
        .len();

    Ok(UploadRequest {
        identifier,
        calculated_name,
        description: config.description.clone(),
        local_path: path.to_path_buf(),
        total_size,
        chunk_size: config.chunk_size(),
        access_secret: passphrase::generate(),
        settings: config.vimeo.upload_settings.clone(),
    })
}

/// `title / link / password` for a file uploaded by this run.
///
/// Skipped files print nothing. The link is omitted when the record never
/// learned the video's URI, and the password when this run did not set it.
fn report_line(title: &str, outcome: &UploadOutcome) -> Option<String> {
    if outcome.disposition == UploadDisposition::AlreadyComplete {
        return None;
    }
    let link = if outcome.resource_uri.is_empty() {
        "(link unknown)".to_string()
    } else {
        public_link(&outcome.resource_uri)
    };
    let password = outcome
        .access_secret
        .as_deref()
        .unwrap_or("(password set by the first attempt)");
    Some(format!("{title} / {link} / {password}"))
}

fn move_finished(path: &Path, finished: &Path) {
    let Some(name) = path.file_name() else {
        return;
    };
    let target = finished.join(name);
    if let Err(e) = std::fs::create_dir_all(finished).and_then(|_| std::fs::rename(path, &target)) {
        tracing::warn!(
            from = %path.display(),
            to = %target.display(),
            error = %e,
            "could not move finished file"
        );
    }
}

async fn print_events(mut rx: mpsc::Receiver<UploadEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            UploadEvent::Started { name, .. } => println!("uploading {name}"),
            UploadEvent::Resumed {
                name,
                offset,
                total,
            } => println!(
                "resuming {name} at {} of {}",
                format_bytes(offset),
                format_bytes(total)
            ),
            UploadEvent::Progress {
                name, percentage, ..
            } => println!("  {name}: {percentage:.1}%"),
            UploadEvent::Completed { .. } | UploadEvent::Failed { .. } => {}
        }
    }
}
