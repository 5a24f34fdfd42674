use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub extract: ExtractConfig,
    pub download: DownloadConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Where results are written (default: current directory)
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Prepended to the source stem of every extracted WAV file
    pub prefix: String,
    /// File extensions accepted as video input (lowercase, no dot)
    pub video_extensions: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            prefix: "audio-".to_string(),
            video_extensions: ["mp4", "webm", "mkv", "mov", "m4v", "avi", "ogv"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ExtractConfig {
    /// Whether a file extension names an accepted video format
    pub fn accepts_extension(&self, ext: &str) -> bool {
        self.video_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// File name used when the URL path has none
    pub default_file_name: String,
    /// User-Agent header sent with requests
    pub user_agent: String,
    /// Whole-request timeout in seconds (0 = none)
    pub timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            default_file_name: "video.mp4".to_string(),
            user_agent: concat!("filekit/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
