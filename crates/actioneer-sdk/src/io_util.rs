use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use std::path::Path;
use std::{fs, thread, time::Duration};

/// File-system helpers shared by the staging area, the log writer and settings.
///
/// Directory and file operations return plain `io::Result` so callers can
/// attach the offending path to their own error types.
pub struct IOUtil;

impl IOUtil {
    /// Recursively delete a directory, retrying transient failures.
    ///
    /// A missing directory is not an error. A symlink is unlinked, never followed.
    pub fn delete_directory(path: &Path) -> io::Result<()> {
        let meta = match fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };

        if meta.file_type().is_symlink() {
            return fs::remove_file(path);
        }

        let max_retries = 3;
        let mut last_err = None;

        for attempt in 0..max_retries {
            match fs::remove_dir_all(path) {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
                Err(e) => {
                    tracing::debug!(
                        "Failed to delete '{}' (attempt {}): {}",
                        path.display(),
                        attempt + 1,
                        e
                    );
                    last_err = Some(e);
                    if attempt < max_retries - 1 {
                        thread::sleep(Duration::from_millis(100));
                    }
                }
            }
        }

        Err(last_err.unwrap_or_else(|| io::Error::other("delete failed")))
    }

    /// Delete a directory (if present) and recreate it empty.
    pub fn reset_directory(path: &Path) -> io::Result<()> {
        Self::delete_directory(path)?;
        fs::create_dir_all(path)
    }

    /// Create a directory and its parents when missing.
    pub fn ensure_directory(path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    /// Delete a file. A missing file is not an error.
    pub fn delete_file(path: &Path) -> io::Result<()> {
        match fs::remove_file(path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    /// Copy `src` to `dst`, replacing any existing file. Returns bytes copied.
    ///
    /// Unlike `fs::copy` the source is opened first, so a missing source never
    /// truncates an existing destination.
    pub fn copy_file(src: &Path, dst: &Path) -> io::Result<u64> {
        let mut reader = fs::File::open(src)?;
        let mut writer = fs::File::create(dst)?;
        io::copy(&mut reader, &mut writer)
    }

    /// Serialize a value as JSON and write it to a file.
    pub fn save_object<T: Serialize>(path: &Path, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, json.as_bytes())
            .with_context(|| format!("Failed to write object to '{}'", path.display()))?;
        Ok(())
    }

    /// Read a file and deserialize it from JSON.
    pub fn load_object<T: DeserializeOwned>(path: &Path) -> Result<T> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file '{}'", path.display()))?;
        let value = serde_json::from_str(&json)
            .with_context(|| format!("Failed to deserialize JSON from '{}'", path.display()))?;
        Ok(value)
    }
}
