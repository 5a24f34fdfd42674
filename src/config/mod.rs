mod schema;

pub use schema::*;

use crate::error::{ConfigError, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Get the configuration directory path
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("filekit")
}

/// Get the default configuration file path
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Load configuration from the default location or return defaults
pub fn load_config() -> Result<AppConfig> {
    load_config_from(&config_path())
}

/// Load configuration from `path`, falling back to defaults if it is missing
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        info!("Loading configuration from {:?}", path);
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: AppConfig = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    } else {
        info!("No configuration file found, using defaults");
        Ok(AppConfig::default())
    }
}

/// Save configuration to `path`
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<()> {
    // Ensure directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(ConfigError::ReadError)?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::ValidationError(e.to_string()))?;
    std::fs::write(path, content).map_err(ConfigError::ReadError)?;

    info!("Configuration saved to {:?}", path);
    Ok(())
}

/// Write a default configuration to `path`, refusing to replace an existing
/// file
pub fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(ConfigError::AlreadyExists(path.to_path_buf()).into());
    }
    save_config_to(&AppConfig::default(), path)
}

impl AppConfig {
    /// Get the effective output directory
    pub fn output_dir(&self) -> PathBuf {
        self.general
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.extract.video_extensions.is_empty() {
            return Err(ConfigError::ValidationError(
                "extract.video_extensions must not be empty".into(),
            ));
        }
        if self.download.default_file_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "download.default_file_name must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.extract.prefix, "audio-");
        assert_eq!(config.download.default_file_name, "video.mp4");
        assert_eq!(config.output_dir(), PathBuf::from("."));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[general]\noutput_dir = \"/tmp/out\"\n\n[extract]\nprefix = \"track-\"\n",
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.output_dir(), PathBuf::from("/tmp/out"));
        assert_eq!(config.extract.prefix, "track-");
        assert!(config.extract.accepts_extension("MKV"));
        assert_eq!(config.download.timeout_secs, 300);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = AppConfig::default();
        config.extract.video_extensions = vec!["mp4".into()];
        save_config_to(&config, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.extract.video_extensions, vec!["mp4".to_string()]);
        assert!(!loaded.extract.accepts_extension("webm"));
    }

    #[test]
    fn test_write_default_config_to_custom_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles").join("work.toml");

        write_default_config(&path).unwrap();
        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.extract.prefix, "audio-");
        assert_eq!(loaded.download.default_file_name, "video.mp4");
    }

    #[test]
    fn test_write_default_config_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[extract]\nprefix = \"mine-\"\n").unwrap();

        let err = write_default_config(&path).unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::AlreadyExists(ref p)) if p == &path));
        assert_eq!(load_config_from(&path).unwrap().extract.prefix, "mine-");
    }

    #[test]
    fn test_invalid_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "[extract\nprefix = 1").unwrap();
        assert!(matches!(
            load_config_from(&path),
            Err(AppError::Config(ConfigError::ParseError(_)))
        ));

        std::fs::write(&path, "[extract]\nvideo_extensions = []\n").unwrap();
        assert!(matches!(
            load_config_from(&path),
            Err(AppError::Config(ConfigError::ValidationError(_)))
        ));
    }
}
