//! Cached sign-in state
//!
//! Stores the bearer token and the role claims returned at login in
//! ~/.config/lobby/credentials.json with restricted permissions (0o600).
//! The roles are only used for client-side routing; the backend enforces
//! access on every request.

use lobby_client::AuthContext;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Cached token and claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Credentials {
    pub fn new(token: String, roles: Vec<String>) -> Self {
        Self { token, roles }
    }

    /// The auth context handed to session logic
    pub fn auth_context(&self) -> AuthContext {
        AuthContext::new(self.token.clone(), self.roles.clone())
    }
}

fn credentials_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lobby")
}

fn credentials_file() -> PathBuf {
    credentials_dir().join("credentials.json")
}

/// Load the cached credentials, if any
pub fn load() -> Option<Credentials> {
    let path = credentials_file();
    if !path.exists() {
        return None;
    }
    let content = fs::read_to_string(&path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Persist credentials with owner-only permissions
pub fn save(credentials: &Credentials) -> io::Result<()> {
    let dir = credentials_dir();
    if !dir.exists() {
        fs::create_dir_all(&dir)?;
        #[cfg(unix)]
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o700))?;
    }

    let path = credentials_file();
    let content = serde_json::to_string_pretty(credentials)?;
    fs::write(&path, content)?;

    #[cfg(unix)]
    fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;

    Ok(())
}

/// Drop the cached credentials (logout, or a rejected token)
pub fn clear() -> io::Result<()> {
    let path = credentials_file();
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}
