//! Client configuration from the environment
//!
//! The service URL comes from `IM_URL`. The auth file is looked up in this
//! order:
//! 1. `IM_AUTH_FILE` environment variable
//! 2. current directory: `auth.dat`
//! 3. `./.im/auth.dat`
//! 4. `<config dir>/im-client/auth.dat` (e.g. `~/.config/im-client/auth.dat`)

use crate::auth::AuthData;
use crate::client::ImClient;
use crate::error::{ImError, Result};
use std::path::PathBuf;

pub const URL_ENV: &str = "IM_URL";
pub const AUTH_FILE_ENV: &str = "IM_AUTH_FILE";

const AUTH_FILE_NAME: &str = "auth.dat";
const LOCAL_DIR: &str = ".im";
const CONFIG_DIR_NAME: &str = "im-client";

/// Connection settings for an IM service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub url: String,
    pub auth_file: Option<PathBuf>,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth_file: None,
        }
    }

    pub fn with_auth_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.auth_file = Some(path.into());
        self
    }

    /// Create ClientConfig from environment variables
    pub fn from_env() -> Result<Self> {
        let url =
            std::env::var(URL_ENV).map_err(|_| ImError::MissingEnvVar(URL_ENV.to_string()))?;
        let auth_file = std::env::var(AUTH_FILE_ENV).ok().map(PathBuf::from);
        Ok(Self { url, auth_file })
    }

    /// Load the auth data and build a client.
    ///
    /// Without an explicit auth file, [`find_auth_file`] is used.
    pub fn connect(&self) -> Result<ImClient> {
        let auth_file = match &self.auth_file {
            Some(path) => path.clone(),
            None => find_auth_file()?,
        };
        let auth = AuthData::from_file(&auth_file)?;
        tracing::debug!(
            "Connecting to {} with auth file {}",
            self.url,
            auth_file.display()
        );
        Ok(ImClient::new(&self.url, auth))
    }
}

/// Locate the auth file
pub fn find_auth_file() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(AUTH_FILE_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!("{} points to a missing file: {}", AUTH_FILE_ENV, path.display());
    }

    let current_dir = std::env::current_dir()?;
    let candidates = [
        current_dir.join(AUTH_FILE_NAME),
        current_dir.join(LOCAL_DIR).join(AUTH_FILE_NAME),
    ];
    if let Some(path) = candidates.into_iter().find(|p| p.exists()) {
        return Ok(path);
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global = config_dir.join(CONFIG_DIR_NAME).join(AUTH_FILE_NAME);
        if global.exists() {
            return Ok(global);
        }
    }

    Err(ImError::AuthFileNotFound)
}
