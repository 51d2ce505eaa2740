//! File outputs: parent-directory creation and absolute-path reporting.

use std::fs;
use std::path::{Path, PathBuf};

/// Write bytes to `path`, creating parent directories as needed, and return
/// the resolved absolute path.
pub(crate) fn write_output(path: impl AsRef<Path>, bytes: &[u8]) -> std::io::Result<String> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, bytes)?;

    let absolute = path
        .canonicalize()
        .unwrap_or_else(|_| PathBuf::from(path));
    Ok(absolute.display().to_string())
}
