//! Direct-URL file downloads with streamed progress.

use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::DownloadConfig;
use crate::error::DownloadError;

/// Download lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    Idle,
    /// Request sent, waiting for response headers
    Checking,
    /// Receiving the body; `percent` is known only with a Content-Length
    Downloading {
        received: u64,
        total: Option<u64>,
        percent: Option<u8>,
    },
    Done,
    Error,
}

/// A completed download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
}

impl DownloadedFile {
    /// Size in megabytes with two decimals, e.g. `12.34 MB`
    pub fn size_label(&self) -> String {
        format!("{:.2} MB", self.size as f64 / (1024.0 * 1024.0))
    }
}

/// Pick a file name from the last path segment of `url`.
///
/// Falls back to `default` when the segment has no extension or the URL does
/// not parse.
pub fn file_name_from_url(url: &str, default: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path()
                .rsplit('/')
                .next()
                .filter(|last| last.contains('.'))
                .map(str::to_string)
        })
        .unwrap_or_else(|| default.to_string())
}

fn percent(received: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    ((received as f64 / total as f64) * 100.0).round().min(255.0) as u8
}

fn is_video_content_type(content_type: &str) -> bool {
    content_type.starts_with("video/") || content_type.starts_with("application/octet-stream")
}

/// HTTP downloader publishing its status on a watch channel
pub struct Downloader {
    client: Client,
    default_file_name: String,
    status_tx: watch::Sender<DownloadStatus>,
    status_rx: watch::Receiver<DownloadStatus>,
}

impl Downloader {
    pub fn new(config: &DownloadConfig) -> Result<Self, DownloadError> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let client = builder.build()?;
        let (status_tx, status_rx) = watch::channel(DownloadStatus::Idle);

        Ok(Self {
            client,
            default_file_name: config.default_file_name.clone(),
            status_tx,
            status_rx,
        })
    }

    /// Get a receiver for status changes
    pub fn status_receiver(&self) -> watch::Receiver<DownloadStatus> {
        self.status_rx.clone()
    }

    /// Get the current status
    pub fn status(&self) -> DownloadStatus {
        *self.status_rx.borrow()
    }

    /// Download `url` into `dest_dir`
    pub async fn download(
        &self,
        url: &str,
        dest_dir: &Path,
    ) -> Result<DownloadedFile, DownloadError> {
        let result = self.fetch(url, dest_dir).await;
        match &result {
            Ok(file) => {
                info!("Downloaded {} ({})", file.name, file.size_label());
                self.set_status(DownloadStatus::Done);
            }
            Err(e) => {
                warn!("Download of {} failed: {}", url, e);
                self.set_status(DownloadStatus::Error);
            }
        }
        result
    }

    async fn fetch(&self, url: &str, dest_dir: &Path) -> Result<DownloadedFile, DownloadError> {
        let parsed = Url::parse(url).map_err(|e| DownloadError::InvalidUrl(e.to_string()))?;

        self.set_status(DownloadStatus::Checking);
        let response = self.client.get(parsed).send().await?;

        if !response.status().is_success() {
            return Err(DownloadError::HttpStatus(response.status()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !is_video_content_type(&content_type) {
            warn!(
                "Unexpected content type {:?}, downloading anyway",
                content_type
            );
        }

        let total = response.content_length().filter(|&n| n > 0);
        let name = file_name_from_url(url, &self.default_file_name);
        let path = dest_dir.join(&name);
        let partial = dest_dir.join(format!(".{}.part", name));

        tokio::fs::create_dir_all(dest_dir).await?;

        // The body lands under a temporary name and only replaces `path` once
        // it is complete
        let size = match self.stream_body(response, total, &partial).await {
            Ok(size) => size,
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(&partial).await {
                    debug!("Could not remove {:?}: {}", partial, rm);
                }
                return Err(e);
            }
        };
        tokio::fs::rename(&partial, &path).await?;

        Ok(DownloadedFile { path, name, size })
    }

    async fn stream_body(
        &self,
        response: reqwest::Response,
        total: Option<u64>,
        partial: &Path,
    ) -> Result<u64, DownloadError> {
        let mut file = tokio::fs::File::create(partial).await?;
        let mut received = 0u64;

        self.set_status(DownloadStatus::Downloading {
            received,
            total,
            percent: total.map(|_| 0),
        });

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            received += chunk.len() as u64;

            let pct = total.map(|t| percent(received, t));
            debug!("Received {} bytes ({:?}%)", received, pct);
            self.set_status(DownloadStatus::Downloading {
                received,
                total,
                percent: pct,
            });
        }
        file.flush().await?;

        Ok(received)
    }

    fn set_status(&self, status: DownloadStatus) {
        let _ = self.status_tx.send(status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and return the base URL
    async fn serve_once(response: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket.write_all(&response).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn http_response(status: &str, content_type: &str, body: &[u8]) -> Vec<u8> {
        let mut out = format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            content_type,
            body.len()
        )
        .into_bytes();
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(
            file_name_from_url("https://cdn.example.com/media/clip.mp4?sig=1", "video.mp4"),
            "clip.mp4"
        );
        assert_eq!(
            file_name_from_url("https://example.com/watch/abc", "video.mp4"),
            "video.mp4"
        );
        assert_eq!(file_name_from_url("https://example.com/", "video.mp4"), "video.mp4");
        assert_eq!(file_name_from_url("not a url", "fallback.bin"), "fallback.bin");
    }

    #[test]
    fn test_percent_and_size_label() {
        assert_eq!(percent(0, 200), 0);
        assert_eq!(percent(1, 200), 1);
        assert_eq!(percent(200, 200), 100);
        assert_eq!(percent(5, 0), 0);

        let file = DownloadedFile {
            path: PathBuf::from("v.mp4"),
            name: "v.mp4".into(),
            size: 3 * 1024 * 1024 + 512 * 1024,
        };
        assert_eq!(file.size_label(), "3.50 MB");
    }

    #[test]
    fn test_video_content_types() {
        assert!(is_video_content_type("video/mp4"));
        assert!(is_video_content_type("application/octet-stream"));
        assert!(!is_video_content_type("text/html; charset=utf-8"));
    }

    #[tokio::test]
    async fn test_download_writes_body() {
        let body = b"not really a video but bytes all the same".to_vec();
        let base = serve_once(http_response("200 OK", "video/mp4", &body)).await;
        let dir = tempfile::tempdir().unwrap();

        let downloader = Downloader::new(&DownloadConfig::default()).unwrap();
        let file = downloader
            .download(&format!("{}/files/sample.webm", base), dir.path())
            .await
            .unwrap();

        assert_eq!(file.name, "sample.webm");
        assert_eq!(file.size, body.len() as u64);
        assert_eq!(std::fs::read(&file.path).unwrap(), body);
        assert_eq!(downloader.status(), DownloadStatus::Done);

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("sample.webm")]);
    }

    #[tokio::test]
    async fn test_truncated_body_leaves_no_file() {
        let mut response = b"HTTP/1.1 200 OK\r\nContent-Type: video/mp4\r\nContent-Length: 1000\r\nConnection: close\r\n\r\n".to_vec();
        response.extend_from_slice(b"only nine");
        let base = serve_once(response).await;
        let dir = tempfile::tempdir().unwrap();

        let downloader = Downloader::new(&DownloadConfig::default()).unwrap();
        let result = downloader
            .download(&format!("{}/cut.mp4", base), dir.path())
            .await;

        assert!(matches!(result, Err(DownloadError::NetworkError(_))));
        assert_eq!(downloader.status(), DownloadStatus::Error);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_failed_download_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("cut.mp4");
        std::fs::write(&existing, b"earlier complete download").unwrap();

        let mut response = b"HTTP/1.1 200 OK\r\nContent-Type: video/mp4\r\nContent-Length: 500\r\nConnection: close\r\n\r\n".to_vec();
        response.extend_from_slice(b"partial");
        let base = serve_once(response).await;

        let downloader = Downloader::new(&DownloadConfig::default()).unwrap();
        assert!(downloader
            .download(&format!("{}/cut.mp4", base), dir.path())
            .await
            .is_err());
        assert_eq!(
            std::fs::read(&existing).unwrap(),
            b"earlier complete download".to_vec()
        );
    }

    #[tokio::test]
    async fn test_http_error_is_reported() {
        let base = serve_once(http_response("404 Not Found", "text/plain", b"gone")).await;
        let dir = tempfile::tempdir().unwrap();

        let downloader = Downloader::new(&DownloadConfig::default()).unwrap();
        let err = downloader
            .download(&format!("{}/missing", base), dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::HttpStatus(s) if s.as_u16() == 404));
        assert_eq!(err.to_string(), "Failed to access URL (404)");
        assert_eq!(downloader.status(), DownloadStatus::Error);
        assert!(!dir.path().join("video.mp4").exists());
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let downloader = Downloader::new(&DownloadConfig::default()).unwrap();
        let err = downloader
            .download("::nope::", Path::new("."))
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::InvalidUrl(_)));
    }
}
