//! Runtime configuration
//!
//! Every setting has a default and can be overridden through the
//! environment:
//!
//! | Variable | Default |
//! |---|---|
//! | `NDEF_HCE_STORAGE_DIR` | `<data dir>/ndef-hce` |
//! | `NDEF_HCE_URL_TEMPLATE` | `https://example.com/tag/{id}` |
//! | `NDEF_HCE_LOOKUP_TIMEOUT_MS` | `200` |
//! | `NDEF_HCE_MAX_NDEF_SIZE` | `2048` |

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::binding::{DEFAULT_URL_TEMPLATE, ID_PLACEHOLDER};
use crate::ndef::file::NLEN_SIZE;
use crate::type4::cc::DEFAULT_MAX_NDEF_SIZE;

pub const STORAGE_DIR_VAR: &str = "NDEF_HCE_STORAGE_DIR";
pub const URL_TEMPLATE_VAR: &str = "NDEF_HCE_URL_TEMPLATE";
pub const LOOKUP_TIMEOUT_VAR: &str = "NDEF_HCE_LOOKUP_TIMEOUT_MS";
pub const MAX_NDEF_SIZE_VAR: &str = "NDEF_HCE_MAX_NDEF_SIZE";

pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_millis(200);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a number, got {value:?}")]
    NotANumber { var: &'static str, value: String },

    #[error("{var} out of range: {value}")]
    OutOfRange { var: &'static str, value: u64 },

    #[error("URL template must contain {placeholder}: {template:?}")]
    MissingPlaceholder {
        placeholder: &'static str,
        template: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub storage_dir: PathBuf,
    pub url_template: String,
    pub lookup_timeout: Duration,
    /// Maximum NDEF file size advertised in the Capability Container
    pub max_ndef_size: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            max_ndef_size: DEFAULT_MAX_NDEF_SIZE,
        }
    }
}

impl Config {
    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(dir) = lookup(STORAGE_DIR_VAR).filter(|v| !v.is_empty()) {
            config.storage_dir = PathBuf::from(dir);
        }

        if let Some(template) = lookup(URL_TEMPLATE_VAR).filter(|v| !v.is_empty()) {
            if !template.contains(ID_PLACEHOLDER) {
                return Err(ConfigError::MissingPlaceholder {
                    placeholder: ID_PLACEHOLDER,
                    template,
                });
            }
            config.url_template = template;
        }

        if let Some(value) = lookup(LOOKUP_TIMEOUT_VAR) {
            let millis = parse_number(LOOKUP_TIMEOUT_VAR, &value)?;
            if millis == 0 {
                return Err(ConfigError::OutOfRange {
                    var: LOOKUP_TIMEOUT_VAR,
                    value: millis,
                });
            }
            config.lookup_timeout = Duration::from_millis(millis);
        }

        if let Some(value) = lookup(MAX_NDEF_SIZE_VAR) {
            let size = parse_number(MAX_NDEF_SIZE_VAR, &value)?;
            // Must at least hold NLEN, and fit the 2 byte CC field
            if size < NLEN_SIZE as u64 || size > u16::MAX as u64 {
                return Err(ConfigError::OutOfRange {
                    var: MAX_NDEF_SIZE_VAR,
                    value: size,
                });
            }
            config.max_ndef_size = size as u16;
        }

        Ok(config)
    }
}

fn parse_number(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::NotANumber {
        var,
        value: value.to_string(),
    })
}

/// Get the default storage directory
fn default_storage_dir() -> PathBuf {
    if let Some(data) = dirs::data_dir() {
        return data.join("ndef-hce");
    }
    PathBuf::from("/var/lib/ndef-hce")
}
