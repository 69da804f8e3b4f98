// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-wide credential store.
//!
//! Holds the current [`Credential`] in memory and mirrors every change to a
//! durable backend so the session survives restarts. Reads never touch the
//! backend; they always see the most recent `set`/`clear`.

use crate::error::ClientError;
use crate::models::Credential;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

/// Durable storage behind the credential store.
pub trait CredentialBackend: Send + Sync {
    /// Load the persisted credential, `None` when nothing was stored yet.
    fn load(&self) -> Result<Option<Credential>, ClientError>;
    fn save(&self, credential: &Credential) -> Result<(), ClientError>;
    fn remove(&self) -> Result<(), ClientError>;
}

/// JSON file backend (owner-only permissions on Unix).
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialBackend for FileBackend {
    fn load(&self) -> Result<Option<Credential>, ClientError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ClientError::Storage(format!(
                    "reading {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| ClientError::Storage(format!("parsing {}: {}", self.path.display(), e)))
    }

    fn save(&self, credential: &Credential) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                ClientError::Storage(format!("creating {}: {}", parent.display(), e))
            })?;
        }

        let json = serde_json::to_vec_pretty(credential)
            .map_err(|e| ClientError::Storage(format!("encoding credential: {}", e)))?;

        // Write then rename so a crash never leaves a half-written file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .map_err(|e| ClientError::Storage(format!("writing {}: {}", tmp.display(), e)))?;
        restrict_permissions(&tmp)?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| ClientError::Storage(format!("replacing {}: {}", self.path.display(), e)))
    }

    fn remove(&self) -> Result<(), ClientError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::Storage(format!(
                "removing {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), ClientError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .map_err(|e| ClientError::Storage(format!("chmod {}: {}", path.display(), e)))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), ClientError> {
    Ok(())
}

/// Non-durable backend for tests and one-shot use.
#[derive(Default)]
pub struct MemoryBackend {
    slot: Mutex<Option<Credential>>,
}

impl CredentialBackend for MemoryBackend {
    fn load(&self) -> Result<Option<Credential>, ClientError> {
        Ok(self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, credential: &Credential) -> Result<(), ClientError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(credential.clone());
        Ok(())
    }

    fn remove(&self) -> Result<(), ClientError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

/// Shared handle to the current credential. Cheap to clone.
#[derive(Clone)]
pub struct CredentialStore {
    current: Arc<RwLock<Credential>>,
    backend: Arc<dyn CredentialBackend>,
    /// Held across persist and swap so memory and backend never diverge.
    writer: Arc<Mutex<()>>,
}

impl CredentialStore {
    /// Open the store, loading whatever the backend persisted.
    ///
    /// An unreadable backend is treated as signed out.
    pub fn open(backend: Arc<dyn CredentialBackend>) -> Self {
        let initial = match backend.load() {
            Ok(Some(credential)) => credential.normalized(),
            Ok(None) => Credential::empty(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load stored credential, starting signed out");
                Credential::empty()
            }
        };

        Self {
            current: Arc::new(RwLock::new(initial)),
            backend,
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// Store persisted in a JSON file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::open(Arc::new(FileBackend::new(path)))
    }

    /// Store that forgets everything when the process exits.
    pub fn in_memory() -> Self {
        Self::open(Arc::new(MemoryBackend::default()))
    }

    /// Current credential; empty when signed out.
    pub fn get(&self) -> Credential {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Replace the current credential.
    ///
    /// A persistence failure is logged and the in-memory change still applies.
    pub fn set(&self, credential: Credential) {
        let credential = credential.normalized();
        let _writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = self.backend.save(&credential) {
            tracing::warn!(error = %e, "Failed to persist credential, continuing anyway");
        }
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = credential;
    }

    /// Forget the current credential.
    pub fn clear(&self) {
        let _writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = self.backend.remove() {
            tracing::warn!(error = %e, "Failed to remove persisted credential");
        }
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Credential::empty();
    }
}
