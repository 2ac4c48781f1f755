use std::path::{Path, PathBuf};
use std::str::FromStr;

use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use tracing::Level;

use crate::corpus::{CorpusSource, Label};
use crate::error::ConfigError;

/// Optional config file looked up in the working directory (any extension
/// the `config` crate understands, e.g. `arsenic-detect.toml`).
pub const CONFIG_FILE_STEM: &str = "arsenic-detect";
/// Environment variables with this prefix override file values,
/// e.g. `ARSENIC_BIND_ADDR=127.0.0.1:9000`.
pub const ENV_PREFIX: &str = "ARSENIC";

/// Runtime settings for the detection service and its HTTP front end.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Address the HTTP server binds to.
    pub bind_addr:        String,
    /// Root holding the `infected/` and `not_infected/` reference directories.
    pub training_dir:     PathBuf,
    /// Where uploaded query images are stored.
    pub upload_dir:       PathBuf,
    /// Cap on reference images loaded per class.
    pub max_per_class:    usize,
    /// Largest accepted request body for uploads, in bytes.
    pub max_upload_bytes: usize,
    /// Origins allowed by CORS; `*` allows any.
    pub allowed_origins:  Vec<String>,
    /// Maximum log level: trace, debug, info, warn or error.
    pub log_level:        String,
    /// Zip archive fetched at startup when `training_dir` does not exist.
    pub training_archive_url: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            bind_addr:        "0.0.0.0:8000".to_owned(),
            training_dir:     PathBuf::from("training_data"),
            upload_dir:       PathBuf::from("uploads"),
            max_per_class:    500,
            max_upload_bytes: 20 * 1024 * 1024,
            allowed_origins:  vec![
                "http://localhost:5173".to_owned(),
                "http://localhost:3000".to_owned(),
                "*".to_owned(),
            ],
            log_level:        "info".to_owned(),
            training_archive_url: None,
        }
    }
}

impl ServiceConfig {
    /// Defaults, then the optional config file, then `ARSENIC_*` variables.
    pub fn load() -> Result<ServiceConfig, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(CONFIG_FILE_STEM).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("allowed_origins"),
            );
        ServiceConfig::finish(builder)
    }

    /// Defaults overridden by the given TOML document.
    pub fn from_toml_str(text: &str) -> Result<ServiceConfig, ConfigError> {
        ServiceConfig::finish(Config::builder().add_source(File::from_str(text, FileFormat::Toml)))
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<ServiceConfig, ConfigError> {
        let cfg: ServiceConfig = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_per_class == 0 {
            return Err(ConfigError::Invalid("max_per_class must be at least 1".into()));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid("max_upload_bytes must be at least 1".into()));
        }
        if self.bind_addr.trim().is_empty() {
            return Err(ConfigError::Invalid("bind_addr must not be empty".into()));
        }
        if let Some(url) = &self.training_archive_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!("training_archive_url `{}` is not an http(s) URL", url)));
            }
        }
        self.level()?;
        Ok(())
    }

    pub fn level(&self) -> Result<Level, ConfigError> {
        Level::from_str(self.log_level.trim())
            .map_err(|_| ConfigError::Invalid(format!("unknown log_level `{}`", self.log_level)))
    }

    pub fn class_dir(&self, label: Label) -> PathBuf {
        self.training_dir.join(label.dir_name())
    }

    pub fn corpus_source(&self) -> CorpusSource {
        CorpusSource::from_training_root(&self.training_dir, self.max_per_class)
    }

    pub fn upload_path(&self, file_name: &str) -> PathBuf {
        self.upload_dir.join(Path::new(file_name))
    }
}
