//! File system utilities for the supply monitor

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Ensures a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    } else if !path.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("Path exists but is not a directory: {:?}", path),
        ));
    }
    Ok(())
}

/// Gets the application's config directory without creating it
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tetherwatch"))
}

/// Replaces `path` with `contents` so readers see either the old or the new file.
///
/// The bytes go to a temporary file in the target's directory, are synced, and
/// the temporary is renamed over `path`.
pub fn write_file_atomic<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> io::Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    ensure_dir(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(contents.as_ref())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
