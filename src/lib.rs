pub mod app;
pub mod audio;
pub mod config;
pub mod download;
pub mod error;
pub mod format;
pub mod pdf;

pub use app::{Extractor, ItemStatus};
pub use audio::{encode_wav, DecodedAudio, WavFile};
pub use config::AppConfig;
pub use error::{AppError, Result};
