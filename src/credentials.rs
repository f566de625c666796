//! API key storage and resolution.
//!
//! The repair formatter needs an OpenAI API key. Resolution order:
//! the `OPENAI_API_KEY` environment variable, then the invocation's env
//! file (`--env-file`, default `.env`), then the saved credentials file
//! written by `emissary setup`.

use crate::error::{EmissaryError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_VAR: &str = "OPENAI_API_KEY";

/// Persisted credentials, stored under the user cache directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
}

impl Credentials {
    /// Load credentials from `path`. A missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(EmissaryError::Usage(format!(
                    "cannot read credentials file '{}': {e}",
                    path.display()
                )));
            }
        };
        serde_json::from_str(&raw).map_err(|e| {
            EmissaryError::Usage(format!(
                "credentials file '{}' is corrupt: {e}",
                path.display()
            ))
        })
    }

    /// Write credentials to `path`, creating parent directories and
    /// restricting the file to the owner.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                EmissaryError::Usage(format!(
                    "cannot create credentials directory '{}': {e}",
                    parent.display()
                ))
            })?;
        }
        let encoded = serde_json::to_string_pretty(self)
            .map_err(|e| EmissaryError::Usage(format!("cannot encode credentials: {e}")))?;
        std::fs::write(path, encoded).map_err(|e| {
            EmissaryError::Usage(format!(
                "cannot write credentials file '{}': {e}",
                path.display()
            ))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(path, perms).map_err(|e| {
                EmissaryError::Usage(format!(
                    "cannot restrict credentials file '{}': {e}",
                    path.display()
                ))
            })?;
        }
        Ok(())
    }
}

/// Default credentials file location.
pub fn credentials_path() -> Result<PathBuf> {
    let cache = dirs::cache_dir().ok_or_else(|| {
        EmissaryError::Usage("cannot determine the user cache directory".to_string())
    })?;
    Ok(cache.join("emissary").join("credentials.json"))
}

/// Resolve the API key for this invocation, or `None` when nothing is
/// configured anywhere.
pub fn resolve_api_key(env_file: &Path) -> Result<Option<String>> {
    if let Ok(key) = std::env::var(ENV_VAR)
        && !key.is_empty()
    {
        return Ok(Some(key));
    }

    if let Some(key) = key_from_env_file(env_file)? {
        return Ok(Some(key));
    }

    let credentials = Credentials::load(&credentials_path()?)?;
    Ok(credentials.openai_api_key.filter(|key| !key.is_empty()))
}

/// Scan a dotenv-style file for the API key. A missing file is fine; the
/// default `.env` usually does not exist.
fn key_from_env_file(path: &Path) -> Result<Option<String>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(EmissaryError::Usage(format!(
                "cannot read env file '{}': {e}",
                path.display()
            )));
        }
    };
    Ok(parse_env_assignment(&raw, ENV_VAR))
}

/// Find `name=value` in dotenv text. Comments and unrelated lines are
/// skipped; surrounding quotes on the value are stripped.
fn parse_env_assignment(text: &str, name: &str) -> Option<String> {
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        if key.trim() != name {
            continue;
        }
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
            .unwrap_or(value);
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }
    None
}
