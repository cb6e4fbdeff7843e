use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

const SERVICE_VAR: &str = "OBJECT_STORAGE_SERVICE";
const ENDPOINT_VAR: &str = "OBJECT_STORAGE_ENDPOINT";
const ACCESS_KEY_VAR: &str = "OBJECT_STORAGE_ACCESS_KEY";
const SECRET_KEY_VAR: &str = "OBJECT_STORAGE_SECRET_KEY";
const REGION_VAR: &str = "OBJECT_STORAGE_REGION";
const SECURE_VAR: &str = "OBJECT_STORAGE_SECURE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unsupported storage service: {0:?}")]
    UnsupportedBackend(String),
    #[error("{0} is required for the selected storage service")]
    MissingSetting(&'static str),
    #[error("Failed to read override file {path}: {source}")]
    OverrideFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
    #[error("Invalid storage credentials: {0}")]
    Credentials(String),
    #[error("Failed to build storage client: {0}")]
    Client(String),
    #[error("Storage service {requested:?} requested but profile was resolved for {resolved:?}")]
    Mismatch { requested: String, resolved: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub profile: ConnectionProfile,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Maximum upload size in bytes
    pub max_upload_size: u64,
}

/// The object storage services the gateway can front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Aws,
    Minio,
    Nebius,
}

/// Everything needed to reach one backend. Resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionProfile {
    pub backend: Backend,
    /// Bare `host` or `host:port`, never carrying a scheme.
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub secure: bool,
}

struct BackendDefaults {
    endpoint: &'static str,
    /// `None` means the credential must be supplied.
    access_key: Option<&'static str>,
    secret_key: Option<&'static str>,
    region: &'static str,
    secure: bool,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Aws => "aws",
            Backend::Minio => "minio",
            Backend::Nebius => "nebius",
        }
    }

    /// MinIO only serves path-style requests; the cloud stores prefer virtual hosts.
    pub fn uses_path_style(&self) -> bool {
        matches!(self, Backend::Minio)
    }

    fn defaults(&self) -> BackendDefaults {
        match self {
            Backend::Minio => BackendDefaults {
                endpoint: "127.0.0.1:9000",
                access_key: Some("minioadmin"),
                secret_key: Some("minioadmin"),
                region: "us-east-1",
                secure: false,
            },
            Backend::Aws => BackendDefaults {
                endpoint: "s3.amazonaws.com",
                access_key: None,
                secret_key: None,
                region: "us-east-1",
                secure: true,
            },
            Backend::Nebius => BackendDefaults {
                endpoint: "storage.eu-west1.nebius.cloud",
                access_key: None,
                secret_key: None,
                region: "eu-west1",
                secure: true,
            },
        }
    }
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aws" => Ok(Backend::Aws),
            "minio" => Ok(Backend::Minio),
            "nebius" => Ok(Backend::Nebius),
            other => Err(ConfigError::UnsupportedBackend(other.to_string())),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:59090".to_string(),
            max_upload_size: 50 * 1024 * 1024, // 50MB
        }
    }
}

/// Layered key/value source: process environment first, override files on top.
struct Settings {
    values: HashMap<String, String>,
}

impl Settings {
    fn new<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            values: vars.into_iter().collect(),
        }
    }

    /// Apply a dotenv-style file over the current values. Missing files are skipped.
    fn overlay_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            return Ok(());
        }

        let to_error = |source| ConfigError::OverrideFile {
            path: path.to_path_buf(),
            source,
        };

        for item in dotenvy::from_path_iter(path).map_err(to_error)? {
            let (key, value) = item.map_err(to_error)?;
            self.values.insert(key, value);
        }

        tracing::debug!(path = %path.display(), "Applied configuration override file");
        Ok(())
    }

    /// Value for `key`, treating an empty string the same as unset.
    fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }
}

impl Config {
    /// Load configuration from the process environment and the override
    /// files in the working directory.
    pub fn load() -> Result<Self, ConfigError> {
        Self::resolve(std::env::vars(), Path::new("."))
    }

    /// Resolve configuration from `vars`, overlaid by `<dir>/.env` and then
    /// `<dir>/.env.<backend>`.
    pub fn resolve<I>(vars: I, dir: &Path) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut settings = Settings::new(vars);
        settings.overlay_file(&dir.join(".env"))?;

        let backend: Backend = settings
            .values
            .get(SERVICE_VAR)
            .map(|s| s.to_lowercase())
            .unwrap_or_else(|| Backend::Minio.as_str().to_string())
            .parse()?;

        settings.overlay_file(&dir.join(format!(".env.{backend}")))?;

        let profile = load_profile(backend, &settings)?;
        let server = load_server(&settings);

        Ok(Config { server, profile })
    }
}

fn load_profile(backend: Backend, settings: &Settings) -> Result<ConnectionProfile, ConfigError> {
    let defaults = backend.defaults();

    let access_key = settings
        .get(ACCESS_KEY_VAR)
        .or(defaults.access_key)
        .ok_or(ConfigError::MissingSetting(ACCESS_KEY_VAR))?
        .to_string();
    let secret_key = settings
        .get(SECRET_KEY_VAR)
        .or(defaults.secret_key)
        .ok_or(ConfigError::MissingSetting(SECRET_KEY_VAR))?
        .to_string();

    let secure = settings
        .get(SECURE_VAR)
        .map(parse_secure)
        .unwrap_or(defaults.secure);

    Ok(ConnectionProfile {
        backend,
        endpoint: normalize_endpoint(&settings.get_or(ENDPOINT_VAR, defaults.endpoint)),
        access_key,
        secret_key,
        region: settings.get_or(REGION_VAR, defaults.region),
        secure,
    })
}

fn load_server(settings: &Settings) -> ServerConfig {
    let defaults = ServerConfig::default();

    let max_upload_size = settings
        .get("MAX_UPLOAD_SIZE")
        .and_then(|s| s.parse().ok())
        .unwrap_or(defaults.max_upload_size);

    ServerConfig {
        bind_address: settings.get_or("BIND_ADDRESS", &defaults.bind_address),
        max_upload_size,
    }
}

/// Only a case-insensitive `"true"` enables TLS.
pub fn parse_secure(value: &str) -> bool {
    value.to_lowercase() == "true"
}

/// Strip any URL scheme and the default HTTPS port so callers get `host[:port]`.
pub fn normalize_endpoint(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    let without_slash = without_scheme.trim_end_matches('/');

    without_slash
        .strip_suffix(":443")
        .unwrap_or(without_slash)
        .to_string()
}
