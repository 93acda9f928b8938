//! Disk-backed cache of the last successful login.
//!
//! The blob is versioned and keyed by email: on a schema-version or email
//! mismatch the cache is ignored, never repaired. Whether the cached cookies
//! are still honored by the server is decided by a live probe, not here.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::auth::CookieJar;
use crate::error::{Error, Result};

/// Current schema version of the cached blob.
const CACHE_VERSION: u32 = 1;

/// The persisted form of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedSession {
    /// Schema version; mismatches invalidate the blob
    pub version: u32,
    /// Email the session belongs to
    pub email: String,
    /// Login token, if one was held
    pub token: Option<String>,
    /// Cookie jar, verbatim
    pub cookies: CookieJar,
}

impl CachedSession {
    /// Package session state for persistence.
    pub fn new(email: impl Into<String>, token: Option<String>, cookies: CookieJar) -> Self {
        Self {
            version: CACHE_VERSION,
            email: email.into(),
            token,
            cookies,
        }
    }
}

/// A fixed on-disk location holding one [`CachedSession`].
#[derive(Debug, Clone)]
pub struct SessionCache {
    path: PathBuf,
}

impl SessionCache {
    /// The default cache location under the platform cache directory.
    pub fn default_location() -> Result<Self> {
        let dir = dirs::cache_dir()
            .ok_or_else(|| Error::InvalidInput("no cache directory on this platform".into()))?;
        Ok(Self {
            path: dir.join("mint-rs").join("session.json"),
        })
    }

    /// Use an explicit cache file path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The cache file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cached session for `email`.
    ///
    /// Returns `None` when the file is missing, unreadable, from a different
    /// schema version, or belongs to a different email. All of those are
    /// cache misses, not errors.
    pub fn load(&self, email: &str) -> Option<CachedSession> {
        let bytes = fs::read(&self.path).ok()?;
        let cached: CachedSession = match serde_json::from_slice(&bytes) {
            Ok(c) => c,
            Err(err) => {
                tracing::debug!("ignoring unreadable session cache: {err}");
                return None;
            }
        };
        if cached.version != CACHE_VERSION {
            tracing::debug!(
                "ignoring session cache with schema version {} (want {})",
                cached.version,
                CACHE_VERSION
            );
            return None;
        }
        if cached.email != email {
            tracing::debug!("ignoring session cache for a different account");
            return None;
        }
        Some(cached)
    }

    /// Persist a session, creating parent directories as needed.
    pub fn store(&self, session: &CachedSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(session)?)?;
        tracing::info!("cached login to {}", self.path.display());
        Ok(())
    }

    /// Remove the cached session, if any.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
