use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    #[error("Page range error: {0}")]
    PageRange(#[from] PageRangeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Application error: {0}")]
    Other(String),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Configuration file already exists at {0:?}")]
    AlreadyExists(std::path::PathBuf),
}

/// Audio decoding and encoding errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Unsupported media format: {0}")]
    UnsupportedFormat(String),

    #[error("No decodable audio track found")]
    NoAudioTrack,

    #[error("Audio decoding failed: {0}")]
    DecodeError(String),

    #[error("Invalid audio buffer: {0}")]
    InvalidBuffer(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Direct-URL download errors
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to access URL ({})", .0.as_u16())]
    HttpStatus(reqwest::StatusCode),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Failed to write download: {0}")]
    WriteError(#[from] std::io::Error),
}

/// Page selection errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PageRangeError {
    #[error("Invalid page range or no pages selected")]
    Empty,

    #[error("Document has no pages")]
    NoPages,
}

pub type Result<T> = std::result::Result<T, AppError>;
