//! Credential store
//!
//! Flat-file user database backing the signup and login forms. Records live
//! in a pretty-printed JSON array:
//!
//! ```json
//! [
//!   { "username": "alice", "password": "$2b$10$...", "profileImage": "alice.png" }
//! ]
//! ```
//!
//! Passwords are stored as bcrypt hashes. The file is rewritten atomically
//! after every signup and re-read before every login, so edits made to it
//! while the server runs are picked up.
//!
//! The messaging relay never talks to this store; the HTTP layer only lets a
//! browser reach the chat page after a successful login.

use std::fs;
use std::path::{Path, PathBuf};

use bcrypt::{hash, verify};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::utils::{atomic_write, cleanup_temp_files, AtomicError};

/// One stored account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    /// bcrypt hash
    pub password: String,
    #[serde(rename = "profileImage", default)]
    pub profile_image: Option<String>,
}

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Username already exists")]
    DuplicateUsername(String),
    #[error("User not found")]
    UserNotFound,
    #[error("Invalid password")]
    InvalidPassword,
    #[error("Hash error: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    Storage(#[from] AtomicError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// JSON-file backed user store
#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    cost: u32,
    users: RwLock<Vec<UserRecord>>,
}

impl CredentialStore {
    /// Open the store at `path`, creating an empty database if none exists
    pub fn open(path: impl Into<PathBuf>, cost: u32) -> Result<Self, AuthError> {
        let path = path.into();

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
            let cleaned = cleanup_temp_files(dir)?;
            if cleaned > 0 {
                warn!(cleaned, "removed leftover temp files from {}", dir.display());
            }
        }

        if !path.exists() {
            atomic_write(&path, "[]")?;
            info!("Created empty user database at {}", path.display());
        }

        let store = Self {
            path,
            cost,
            users: RwLock::new(Vec::new()),
        };
        store.reload();
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the database file. A file that cannot be read or parsed is
    /// logged and the in-memory copy is kept.
    ///
    /// Holds the write lock across the read so it cannot interleave with a signup.
    pub fn reload(&self) {
        let mut users = self.users.write();
        match Self::read_file(&self.path) {
            Ok(loaded) => {
                info!(users = loaded.len(), "Loaded users from {}", self.path.display());
                *users = loaded;
            }
            Err(e) => error!("Error reading {}: {}", self.path.display(), e),
        }
    }

    fn read_file(path: &Path) -> Result<Vec<UserRecord>, AuthError> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Hash the password and persist a new account
    pub fn create_account(
        &self,
        username: &str,
        password: &str,
        profile_image: Option<String>,
    ) -> Result<UserRecord, AuthError> {
        if self.contains(username) {
            return Err(AuthError::DuplicateUsername(username.to_string()));
        }

        let record = UserRecord {
            username: username.to_string(),
            password: hash(password, self.cost)?,
            profile_image,
        };

        let mut users = self.users.write();
        // re-check under the write lock, hashing ran unlocked
        if users.iter().any(|u| u.username == username) {
            return Err(AuthError::DuplicateUsername(username.to_string()));
        }

        users.push(record.clone());
        if let Err(e) = Self::persist(&self.path, &users) {
            users.pop();
            error!("Error saving user database: {}", e);
            return Err(e);
        }

        info!(username = %username, "User saved to {}", self.path.display());
        Ok(record)
    }

    fn persist(path: &Path, users: &[UserRecord]) -> Result<(), AuthError> {
        let json = serde_json::to_string_pretty(users)?;
        atomic_write(path, &json)?;
        Ok(())
    }

    /// Check a username/password pair against the database on disk
    pub fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserRecord, AuthError> {
        self.reload();

        let user = self.get(username).ok_or(AuthError::UserNotFound)?;

        if verify(password, &user.password).unwrap_or(false) {
            Ok(user)
        } else {
            Err(AuthError::InvalidPassword)
        }
    }

    pub fn get(&self, username: &str) -> Option<UserRecord> {
        self.users.read().iter().find(|u| u.username == username).cloned()
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.read().iter().any(|u| u.username == username)
    }

    pub fn user_count(&self) -> usize {
        self.users.read().len()
    }
}
