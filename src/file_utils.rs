use anyhow::{Result, Context};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::errors::ExportError;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    /// Create the export directory, refusing to reuse an existing path.
    ///
    /// Only the last component is created; parents must exist.
    pub fn create_output_dir<P: AsRef<Path>>(path: P) -> Result<(), ExportError> {
        let path = path.as_ref();
        match fs::create_dir(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(ExportError::AlreadyExists(path.to_path_buf())),
            Err(e) => Err(ExportError::io(path, e)),
        }
    }

    // @generates: Output path for one cue file
    // @params: output_dir, cue id, extension
    pub fn cue_output_path<P: AsRef<Path>>(output_dir: P, cue_id: &str, extension: &str) -> PathBuf {
        let mut output_filename = cue_id.to_string();
        output_filename.push('.');
        output_filename.push_str(extension);

        output_dir.as_ref().join(output_filename)
    }

    /// Read a file to bytes
    pub fn read_bytes<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
        fs::read(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Remove a directory and everything in it, ignoring a missing directory
    pub fn remove_dir_all<P: AsRef<Path>>(path: P) -> Result<()> {
        match fs::remove_dir_all(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove directory: {:?}", path.as_ref())),
        }
    }
}
