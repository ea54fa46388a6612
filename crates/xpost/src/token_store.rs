//! On-disk persistence for the OAuth 2.0 token.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use xpost_oauth::StoredToken;

use crate::error::{XpostError, XpostResult};

/// The token file, e.g. `~/.xpost/tokens.json`.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored token.
    ///
    /// A missing file is `Ok(None)`; a file that exists but does not parse is
    /// [`XpostError::MalformedTokenFile`], never silently absent.
    ///
    /// # Errors
    ///
    /// I/O failures other than not-found, and malformed contents.
    pub fn load(&self) -> XpostResult<Option<StoredToken>> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let token: StoredToken =
            serde_json::from_slice(&raw).map_err(|e| XpostError::MalformedTokenFile {
                path: self.path.clone(),
                message: e.to_string(),
            })?;

        if token.access_token.is_empty() {
            return Err(XpostError::MalformedTokenFile {
                path: self.path.clone(),
                message: "access_token is empty".into(),
            });
        }

        debug!(path = %self.path.display(), expires_at = token.expires_at, "Loaded OAuth 2.0 token");
        Ok(Some(token))
    }

    /// Write the token atomically: temp file, owner-only permissions, rename.
    ///
    /// # Errors
    ///
    /// Any I/O failure while writing or renaming.
    pub fn save(&self, token: &StoredToken) -> XpostResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        let contents = serde_json::to_vec_pretty(token)?;

        // A leftover temp file would keep its old mode.
        match fs::remove_file(&tmp) {
            Err(e) if e.kind() != ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }
        {
            let mut file = create_owner_only(&tmp)?;
            file.write_all(&contents)?;
            file.sync_all()?;
        }

        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "Saved OAuth 2.0 token");
        Ok(())
    }
}

/// Create `path` exclusively, readable and writable by the owner only.
fn create_owner_only(path: &Path) -> std::io::Result<fs::File> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}
