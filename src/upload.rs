//! Uploaded project file validation

use crate::browser::path_to_linux;
use crate::error::{ArtusError, Result};

/// Check an uploaded file and return the name it is stored under
///
/// `filename` is the name sent by the browser, possibly a full Windows
/// path; only its last component is kept.
pub fn validate_upload(filename: Option<&str>, size: u64, expected_ext: &str) -> Result<String> {
    let filename = filename
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ArtusError::Resource("No file uploaded".to_string()))?;

    let extension = filename.rsplit('.').next().unwrap_or_default();
    if !extension.eq_ignore_ascii_case(expected_ext) {
        return Err(ArtusError::Resource(format!(
            "Reqtify project expected (*.{expected_ext})"
        )));
    }

    if size == 0 {
        return Err(ArtusError::Resource("Can't upload empty file".to_string()));
    }

    let linux_path = path_to_linux(filename);
    let basename = linux_path.rsplit('/').next().unwrap_or(&linux_path);
    tracing::debug!("Accepted upload '{}' ({} bytes)", basename, size);
    Ok(basename.to_string())
}
