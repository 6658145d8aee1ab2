//! File-system abstraction for the build pipeline
//!
//! Every read, write and delete a build performs goes through the [`Runtime`]
//! trait. [`NativeRuntime`] talks to the local disk; tests and embedders can
//! substitute their own implementation.

mod native;

pub use native::NativeRuntime;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur during runtime operations
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),

    /// Other runtime error
    #[error("Runtime error: {0}")]
    Other(String),
}

/// File metadata
#[derive(Debug, Clone)]
pub struct FileMetadata {
    /// File size in bytes
    pub size: u64,
    /// Whether this is a directory
    pub is_dir: bool,
    /// Whether this is a file
    pub is_file: bool,
}

/// Platform runtime trait
///
/// Paths handed to a runtime are always absolute; the build resolves them
/// against the project directory before any I/O happens.
#[async_trait]
pub trait Runtime: Send + Sync + std::fmt::Debug {
    /// Read a file from the filesystem
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>>;

    /// Write a file to the filesystem
    async fn write_file(&self, path: &Path, content: &[u8]) -> RuntimeResult<()>;

    /// Get file metadata
    async fn metadata(&self, path: &Path) -> RuntimeResult<FileMetadata>;

    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Create a directory and all of its missing parents
    async fn create_dir_all(&self, path: &Path) -> RuntimeResult<()>;

    /// Remove a directory tree. Removing a missing directory succeeds.
    async fn remove_dir_all(&self, path: &Path) -> RuntimeResult<()>;

    /// List the entry names of a directory
    async fn read_dir(&self, path: &Path) -> RuntimeResult<Vec<String>>;
}

/// Read a file as UTF-8 text.
pub async fn read_to_string(runtime: &dyn Runtime, path: &Path) -> RuntimeResult<String> {
    let bytes = runtime.read_file(path).await?;
    String::from_utf8(bytes)
        .map_err(|e| RuntimeError::Io(format!("{} is not valid UTF-8: {}", path.display(), e)))
}

/// Write a file, creating its parent directory first.
pub async fn write_file_all(
    runtime: &dyn Runtime,
    path: &Path,
    content: &[u8],
) -> RuntimeResult<()> {
    if let Some(parent) = path.parent() {
        runtime.create_dir_all(parent).await?;
    }
    runtime.write_file(path, content).await
}

/// Recursively list the files under `root`.
///
/// Paths are relative to `root`, use `/` separators and come back sorted.
pub async fn list_files(runtime: &dyn Runtime, root: &Path) -> RuntimeResult<Vec<String>> {
    let mut files = Vec::new();
    let mut pending = vec![(root.to_path_buf(), String::new())];

    while let Some((dir, prefix)) = pending.pop() {
        for name in runtime.read_dir(&dir).await? {
            let path = dir.join(&name);
            let relative = if prefix.is_empty() {
                name
            } else {
                format!("{}/{}", prefix, name)
            };

            if runtime.metadata(&path).await?.is_dir {
                pending.push((path, relative));
            } else {
                files.push(relative);
            }
        }
    }

    files.sort();
    Ok(files)
}
