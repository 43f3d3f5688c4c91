use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strum::{Display, EnumString};

use crate::error::{Error, Result};

pub const DEFAULT_COMMAND_BUFFER: usize = 256;
pub const DEFAULT_UPDATE_BUFFER: usize = 1024;
pub const DEFAULT_LOG_FILTER: &str = "info,lookout=info";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookoutConfig {
    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Channel sizes of the timeline actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,
    #[serde(default = "default_update_buffer")]
    pub update_buffer: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Write log files here instead of stderr.
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

fn default_command_buffer() -> usize {
    DEFAULT_COMMAND_BUFFER
}

fn default_update_buffer() -> usize {
    DEFAULT_UPDATE_BUFFER
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_buffer: DEFAULT_COMMAND_BUFFER,
            update_buffer: DEFAULT_UPDATE_BUFFER,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            directory: None,
        }
    }
}

impl LookoutConfig {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            Error::Configuration("Could not determine config directory".to_string())
        })?;
        Ok(config_dir.join("lookout").join("config.toml"))
    }

    /// Load the user config, or defaults if it is missing or cannot be loaded.
    ///
    /// The error behind a fallback is returned alongside the defaults so it
    /// can be reported once logging is up.
    pub fn load() -> Result<(Self, Option<Error>)> {
        Ok(Self::load_or_default(&Self::config_path()?))
    }

    /// Lenient counterpart of [`Self::from_path`].
    pub fn load_or_default(path: &Path) -> (Self, Option<Error>) {
        if !path.exists() {
            return (Self::default(), None);
        }

        match Self::from_path(path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Load a config file that must exist and parse.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.runtime.command_buffer == 0 || self.runtime.update_buffer == 0 {
            return Err(Error::Configuration(
                "runtime buffers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let file = write_config("");
        let config = LookoutConfig::from_path(file.path()).unwrap();
        assert_eq!(config, LookoutConfig::default());
        assert_eq!(config.runtime.command_buffer, 256);
        assert_eq!(config.runtime.update_buffer, 1024);
        assert_eq!(config.log.filter, "info,lookout=info");
        assert_eq!(config.output.format, OutputFormat::Table);
    }

    #[test]
    fn test_partial_sections() {
        let file = write_config(
            r#"
[runtime]
update_buffer = 16

[log]
directory = "/tmp/lookout-logs"

[output]
format = "json"
"#,
        );
        let config = LookoutConfig::from_path(file.path()).unwrap();
        assert_eq!(config.runtime.command_buffer, 256);
        assert_eq!(config.runtime.update_buffer, 16);
        assert_eq!(
            config.log.directory.as_deref(),
            Some(Path::new("/tmp/lookout-logs"))
        );
        assert_eq!(config.log.filter, DEFAULT_LOG_FILTER);
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_from_path_surfaces_parse_errors() {
        let file = write_config("[output]\nformat = \"yaml\"\n");
        let err = LookoutConfig::from_path(file.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn test_zero_buffer_is_rejected() {
        let file = write_config("[runtime]\ncommand_buffer = 0\n");
        let err = LookoutConfig::from_path(file.path()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = LookoutConfig::from_path(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_load_or_default_hands_back_parse_error() {
        let file = write_config("[runtime\ncommand_buffer = 8\n");
        let (config, err) = LookoutConfig::load_or_default(file.path());
        assert_eq!(config, LookoutConfig::default());
        assert!(matches!(err, Some(Error::ConfigParse(_))));
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let (config, err) = LookoutConfig::load_or_default(&dir.path().join("config.toml"));
        assert_eq!(config, LookoutConfig::default());
        assert!(err.is_none());

        let file = write_config("[output]\nformat = \"json\"\n");
        let (config, err) = LookoutConfig::load_or_default(file.path());
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(err.is_none());
    }

    #[test]
    fn test_output_format_parses_from_str() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::Table.to_string(), "table");
    }
}
