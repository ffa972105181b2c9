//! File system utilities

use anyhow::{anyhow, Result};
use std::fs;
use std::path::Path;

/// Create a directory (and parents) if it does not exist yet.
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .map_err(|e| anyhow!("failed to create directory {}: {}", path.display(), e))?;
    }
    Ok(())
}

/// Extension of a filename, without the leading dot.
pub fn get_file_extension(filename: &str) -> Option<&str> {
    Path::new(filename).extension().and_then(|ext| ext.to_str())
}

/// Replace characters that are unsafe in filenames on common filesystems.
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' => '_',
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}
