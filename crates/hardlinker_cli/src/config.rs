//! Application configuration.
//!
//! Mirror settings come from a YAML file; remote credentials come from the
//! environment. Both are read once at startup.

use hardlinker_api::{ClientConfig, DEFAULT_PORT};
use hardlinker_engine::{ConsumerConfig, RetryConfig, DEFAULT_EVENT_FILTER};
use hardlinker_fs::{ExclusionPattern, LinkError, LinkPipeline};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/config/config.yaml";

const ENV_API_KEY: &str = "SYNCTHING_API_KEY";
const ENV_HOST: &str = "SYNCTHING_HOST";
const ENV_PORT: &str = "SYNCTHING_PORT";
const ENV_HTTPS: &str = "SYNCTHING_HTTPS";
const ENV_CERT_FILE: &str = "SYNCTHING_CERT_FILE";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read {path:?}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML or has wrong types.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The configuration file has no content.
    #[error("configuration is empty")]
    Empty,

    /// The exclusion pattern does not compile.
    #[error("invalid excludes pattern: {0}")]
    Excludes(#[source] LinkError),

    /// A required environment variable is unset or empty.
    #[error("environment variable {0} is required")]
    MissingEnv(&'static str),

    /// An environment variable has an unusable value.
    #[error("environment variable {name} has invalid value {value:?}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
    },

    /// The configured certificate file does not exist.
    #[error("certificate file {0:?} does not exist")]
    CertFile(PathBuf),
}

/// Event type filters, written either as `"A,B"` or as a YAML list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FilterList {
    Joined(String),
    List(Vec<String>),
}

impl FilterList {
    fn into_filters(self) -> Vec<String> {
        let items = match self {
            FilterList::Joined(joined) => joined.split(',').map(str::to_string).collect(),
            FilterList::List(list) => list,
        };
        items
            .into_iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    #[serde(default = "default_source")]
    source: PathBuf,
    #[serde(default = "default_destination")]
    destination: PathBuf,
    #[serde(default, alias = "filter")]
    filters: Option<FilterList>,
    #[serde(default)]
    excludes: Option<String>,
    #[serde(default)]
    poll_timeout_secs: Option<u64>,
    #[serde(default)]
    backoff_secs: Option<u64>,
    #[serde(default)]
    batch_limit: Option<u32>,
}

fn default_source() -> PathBuf {
    PathBuf::from("/files/source/")
}

fn default_destination() -> PathBuf {
    PathBuf::from("/files/destination/")
}

/// Remote connection settings from the environment.
///
/// The API key is only checked when a client is built, so commands that never
/// talk to the remote run without it.
#[derive(Debug, Clone)]
pub struct RemoteSettings {
    /// `SYNCTHING_API_KEY`.
    pub api_key: Option<String>,
    /// `SYNCTHING_HOST`.
    pub host: String,
    /// `SYNCTHING_PORT`.
    pub port: u16,
    /// `SYNCTHING_HTTPS`.
    pub use_https: bool,
    /// `SYNCTHING_CERT_FILE`.
    pub cert_file: Option<PathBuf>,
}

impl RemoteSettings {
    fn from_env<F>(env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| env(name).filter(|value| !value.trim().is_empty());

        let port = match var(ENV_PORT) {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidEnv {
                    name: ENV_PORT,
                    value,
                })?,
            None => DEFAULT_PORT,
        };

        let use_https = var(ENV_HTTPS).is_some_and(|value| {
            matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
        });

        Ok(Self {
            api_key: var(ENV_API_KEY),
            host: var(ENV_HOST).unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            use_https,
            cert_file: var(ENV_CERT_FILE).map(PathBuf::from),
        })
    }
}

/// Complete application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root of the synchronized tree.
    pub source: PathBuf,
    /// Root of the hardlink mirror.
    pub destination: PathBuf,
    /// Event types to subscribe to.
    pub filters: Vec<String>,
    /// Compiled exclusion pattern.
    pub excludes: ExclusionPattern,
    /// Long-poll timeout.
    pub poll_timeout: Duration,
    /// Delay after a failed poll.
    pub backoff: Duration,
    /// Maximum events per poll; `None` lets the remote decide.
    pub batch_limit: Option<u32>,
    /// Remote connection settings.
    pub remote: RemoteSettings,
}

impl AppConfig {
    /// Loads the YAML file at `path` and reads the process environment.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text, |name| std::env::var(name).ok())
    }

    /// Builds the configuration from YAML text and an environment lookup.
    pub fn from_yaml<F>(text: &str, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value: serde_yaml::Value = serde_yaml::from_str(text)?;
        if value.is_null() {
            return Err(ConfigError::Empty);
        }
        let file: FileConfig = serde_yaml::from_value(value)?;

        let mut filters = file
            .filters
            .map(FilterList::into_filters)
            .unwrap_or_default();
        if filters.is_empty() {
            filters.push(DEFAULT_EVENT_FILTER.to_string());
        }

        let excludes = ExclusionPattern::new(file.excludes.as_deref().unwrap_or(""))
            .map_err(ConfigError::Excludes)?;

        Ok(Self {
            source: file.source,
            destination: file.destination,
            filters,
            excludes,
            poll_timeout: Duration::from_secs(file.poll_timeout_secs.unwrap_or(60).max(1)),
            backoff: Duration::from_secs(file.backoff_secs.unwrap_or(5)),
            batch_limit: match file.batch_limit {
                Some(0) => None,
                Some(limit) => Some(limit),
                None => Some(10),
            },
            remote: RemoteSettings::from_env(env)?,
        })
    }

    /// Builds the REST client configuration.
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        let remote = &self.remote;
        let api_key = remote
            .api_key
            .clone()
            .ok_or(ConfigError::MissingEnv(ENV_API_KEY))?;

        let mut config = ClientConfig::new(api_key)
            .with_host(remote.host.clone())
            .with_port(remote.port)
            .with_https(remote.use_https);

        if let Some(cert) = &remote.cert_file {
            if !cert.is_file() {
                return Err(ConfigError::CertFile(cert.clone()));
            }
            config = config.with_cert_file(cert);
        }

        Ok(config)
    }

    /// Builds the event consumer configuration.
    pub fn consumer_config(&self) -> ConsumerConfig {
        ConsumerConfig::new()
            .with_filters(self.filters.iter().cloned())
            .with_batch_limit(self.batch_limit)
            .with_poll_timeout(self.poll_timeout)
            .with_retry(RetryConfig::fixed(self.backoff))
    }

    /// Builds the link pipeline.
    pub fn pipeline(&self) -> LinkPipeline {
        LinkPipeline::new(&self.source, &self.destination, self.excludes.clone())
    }
}
