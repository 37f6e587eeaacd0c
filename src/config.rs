use crate::error::ConfigError;
use crate::render::{DEFAULT_FILE_NAME, Layout};
use serde::Deserialize;
use std::{fs, io, path::Path};

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
    #[serde(default = "default_file_name")]
    pub file_name: String,
    #[serde(default = "default_preview_dir")]
    pub preview_dir: String,
    /// Write a preview copy before saving.
    #[serde(default)]
    pub preview: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            file_name: default_file_name(),
            preview_dir: default_preview_dir(),
            preview: false,
        }
    }
}

fn default_output_dir() -> String {
    "out".to_string()
}

fn default_file_name() -> String {
    DEFAULT_FILE_NAME.to_string()
}

fn default_preview_dir() -> String {
    "out/preview".to_string()
}

#[derive(Debug, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Like `load`, but a missing file means "all defaults".
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        let cfg = Config::parse("").unwrap();
        assert_eq!(cfg.output.dir, "out");
        assert_eq!(cfg.output.file_name, "invoice.pdf");
        assert!(!cfg.output.preview);
        assert_eq!(cfg.log.filter, "info");
        assert_eq!(cfg.layout, Layout::default());
    }

    #[test]
    fn test_partial_sections() {
        let cfg = Config::parse(
            r#"
            [output]
            dir = "invoices"
            preview = true

            [layout]
            title = "RECHNUNG"
            row_height = 8.0

            [log]
            filter = "invoice_form=debug"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.output.dir, "invoices");
        assert_eq!(cfg.output.file_name, "invoice.pdf");
        assert!(cfg.output.preview);
        assert_eq!(cfg.layout.title, "RECHNUNG");
        assert_eq!(cfg.layout.row_height, 8.0);
        assert_eq!(cfg.layout.header_y, 80.0);
        assert_eq!(cfg.log.filter, "invoice_form=debug");
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_or_default(dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg.output.dir, "out");
        assert!(Config::load(dir.path().join("nope.toml")).is_err());
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            Config::parse("[output\ndir = 1"),
            Err(ConfigError::Parse(_))
        ));
    }
}
