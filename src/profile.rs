//! Local user profile.
//!
//! Every client carries a user id that is stable for its lifetime and, when
//! file persistence is enabled, across runs. The id is generated locally;
//! `identify` and `alias` only annotate it. Persistence failures degrade to
//! an in-memory profile rather than failing client construction.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::traits::IdentityProvider;

#[derive(Debug, Serialize, Deserialize)]
struct StoredProfile {
    #[serde(rename = "userId")]
    user_id: String,
}

/// Locally generated user identity.
#[derive(Debug, Clone)]
pub struct Profile {
    user_id: String,
    identity: Option<String>,
    alias: Option<String>,
    store_path: Option<PathBuf>,
}

impl Profile {
    /// An ephemeral profile: a fresh id, gone when the process exits.
    pub fn new() -> Self {
        Self {
            user_id: Uuid::new_v4().to_string(),
            identity: None,
            alias: None,
            store_path: None,
        }
    }

    /// A profile persisted at `path`: reuses the stored id when present,
    /// otherwise generates one and writes it.
    pub fn with_store(path: PathBuf) -> Self {
        let user_id = match Self::read_stored(&path) {
            Some(stored) => stored,
            None => {
                let user_id = Uuid::new_v4().to_string();
                Self::write_stored(&path, &user_id);
                user_id
            }
        };

        Self {
            user_id,
            identity: None,
            alias: None,
            store_path: Some(path),
        }
    }

    /// A profile persisted in the platform data directory, or an ephemeral
    /// one when no data directory exists.
    pub fn from_default_store() -> Self {
        match dirs::data_dir() {
            Some(dir) => Self::with_store(dir.join("meridian").join("profile.json")),
            None => Self::new(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Attach an external identity to this profile.
    pub fn identify(&mut self, identity: impl Into<String>) {
        self.identity = Some(identity.into());
    }

    /// Attach a human-readable alias to this profile.
    pub fn set_alias(&mut self, alias: impl Into<String>) {
        self.alias = Some(alias.into());
    }

    /// Discard the current identity: a new user id, no identity, no alias.
    pub fn reset(&mut self) {
        self.user_id = Uuid::new_v4().to_string();
        self.identity = None;
        self.alias = None;
        if let Some(path) = &self.store_path {
            Self::write_stored(path, &self.user_id);
        }
    }

    fn read_stored(path: &PathBuf) -> Option<String> {
        let raw = fs::read_to_string(path).ok()?;
        match serde_json::from_str::<StoredProfile>(&raw) {
            Ok(stored) if !stored.user_id.is_empty() => Some(stored.user_id),
            _ => {
                warn!(path = %path.display(), "unreadable profile store, regenerating");
                None
            }
        }
    }

    fn write_stored(path: &PathBuf, user_id: &str) {
        let stored = StoredProfile {
            user_id: user_id.to_string(),
        };
        let write = || -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let raw = serde_json::to_string(&stored)
                .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
            fs::write(path, raw)
        };
        if let Err(err) = write() {
            warn!(path = %path.display(), error = %err, "failed to persist profile");
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for Profile {
    fn user_id(&self) -> String {
        self.user_id.clone()
    }
}
