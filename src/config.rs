//! Operator configuration: a small TOML record with `$dir`/`$base`
//! interpolation, resolved at load time.

use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::Deserialize;
use snafu::ResultExt;

use crate::error::{self, ConfigError};
use crate::sign::SignatureHash;

/// The loaded configuration, all paths absolute or config-relative
/// resolved.
#[derive(Debug, Clone)]
pub struct Config {
    pub responder_cert: PathBuf,
    pub responder_key: PathBuf,
    pub ca_database: PathBuf,
    /// Ceiling on the `max-age` cache directive, seconds.
    pub max_age: Option<u64>,
    /// `nextUpdate` horizon in days; one day when unset.
    pub default_ttl_days: Option<i64>,
    /// `sha256` (default) or `sha1`.
    pub signature_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    responder_cert: String,
    responder_key: String,
    ca_database: String,
    max_age: Option<u64>,
    default_ttl_days: Option<i64>,
    signature_hash: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).context(error::ReadSnafu { path })?;
        let raw: RawConfig = toml::from_str(&text).context(error::ParseSnafu { path })?;

        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        let dir = dir.map(Path::to_path_buf).unwrap_or_else(|| ".".into());
        let base = std::env::current_dir().unwrap_or_else(|_| ".".into());

        Ok(Self {
            responder_cert: resolve(&dir, &base, &raw.responder_cert),
            responder_key: resolve(&dir, &base, &raw.responder_key),
            ca_database: resolve(&dir, &base, &raw.ca_database),
            max_age: raw.max_age,
            default_ttl_days: raw.default_ttl_days,
            signature_hash: raw.signature_hash,
        })
    }

    pub fn ttl(&self) -> Duration {
        Duration::days(self.default_ttl_days.unwrap_or(1))
    }

    pub fn signature_hash(&self) -> Result<SignatureHash, ConfigError> {
        match &self.signature_hash {
            None => Ok(SignatureHash::default()),
            Some(name) => {
                SignatureHash::from_name(name).ok_or_else(|| {
                    error::UnknownHashSnafu { value: name.clone() }.build()
                })
            }
        }
    }
}

/// `$dir` is the configuration file's directory, `$base` the working
/// directory at load time; anything still relative resolves against `$dir`.
fn resolve(dir: &Path, base: &Path, value: &str) -> PathBuf {
    let expanded = value
        .replace("$dir", &dir.to_string_lossy())
        .replace("$base", &base.to_string_lossy());
    let path = PathBuf::from(expanded);
    if path.is_absolute() {
        path
    } else {
        dir.join(path)
    }
}
