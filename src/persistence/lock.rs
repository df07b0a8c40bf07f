//! Run lock guarding the snapshot against overlapping job invocations.

use chrono::{DateTime, Utc};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::error::{Error, Result};
use crate::utils::ensure_dir;

/// Exclusive lock file held for the duration of one run. Removed on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    /// Content written at acquisition; identifies this holder
    stamp: String,
}

impl RunLock {
    /// Create the lock file at `path`.
    ///
    /// An existing lock younger than `stale_after` means another run is in
    /// progress and yields [`Error::Locked`]. An older one is taken over.
    pub fn acquire(path: impl Into<PathBuf>, stale_after: Duration) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(parent)?;
        }

        match Self::create(&path) {
            Ok(lock) => Ok(lock),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let holder = fs::read_to_string(&path).unwrap_or_default();
                let age = fs::metadata(&path)
                    .and_then(|m| m.modified())
                    .ok()
                    .and_then(|t| t.elapsed().ok());
                match age {
                    Some(age) if age >= stale_after => {
                        log::warn!(
                            "Taking over stale run lock {} (age {}s, holder: {})",
                            path.display(),
                            age.as_secs(),
                            holder.trim()
                        );
                        Self::take_over(path, holder)
                    }
                    _ => Err(Error::Locked { path, holder: holder.trim().to_string() }),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Move the stale file aside, then create a fresh lock.
    ///
    /// The rename succeeds for exactly one contender; the others see the
    /// stale file gone, or a fresh lock in its place, and back off.
    fn take_over(path: PathBuf, holder: String) -> Result<Self> {
        let aside = PathBuf::from(format!("{}.stale.{}", path.display(), std::process::id()));
        match fs::rename(&path, &aside) {
            Ok(()) => {
                if let Err(e) = fs::remove_file(&aside) {
                    log::warn!("Failed to remove stale lock {}: {}", aside.display(), e);
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::Locked { path, holder: holder.trim().to_string() });
            }
            Err(e) => return Err(e.into()),
        }
        match Self::create(&path) {
            Ok(lock) => Ok(lock),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let holder = fs::read_to_string(&path).unwrap_or_default();
                Err(Error::Locked { path, holder: holder.trim().to_string() })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn create(path: &Path) -> std::io::Result<Self> {
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        let started: DateTime<Utc> = Utc::now();
        let stamp = format!("pid={} started={}", std::process::id(), started.to_rfc3339());
        writeln!(file, "{}", stamp)?;
        log::debug!("Acquired run lock {}", path.display());
        Ok(Self { path: path.to_path_buf(), stamp })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim() == self.stamp => {
                if let Err(e) = fs::remove_file(&self.path) {
                    log::warn!("Failed to release run lock {}: {}", self.path.display(), e);
                }
            }
            Ok(content) => log::warn!(
                "Run lock {} now belongs to {}; leaving it in place",
                self.path.display(),
                content.trim()
            ),
            Err(e) => log::warn!("Run lock {} unreadable on release: {}", self.path.display(), e),
        }
    }
}
