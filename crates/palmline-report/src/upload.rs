//! Upload validation: filename extension and payload size.

use crate::ReportError;

/// Accepted filename extensions, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "bmp"];

/// Maximum upload size (16 MiB).
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Extension after the last `.`, if the name has one.
#[must_use]
pub fn extension(filename: &str) -> Option<&str> {
    filename.rsplit_once('.').map(|(_, ext)| ext)
}

/// Whether `filename` ends in one of [`ALLOWED_EXTENSIONS`].
#[must_use]
pub fn is_allowed_filename(filename: &str) -> bool {
    extension(filename).is_some_and(|ext| {
        ALLOWED_EXTENSIONS
            .iter()
            .any(|allowed| ext.eq_ignore_ascii_case(allowed))
    })
}

/// Check an upload before any decoding happens.
///
/// # Errors
///
/// Returns [`ReportError::MissingFilename`] if `filename` is absent or
/// empty, [`ReportError::UnsupportedExtension`] if its extension is not
/// allowed, [`ReportError::EmptyUpload`] for an empty payload, and
/// [`ReportError::TooLarge`] above [`MAX_UPLOAD_BYTES`].
pub fn validate_upload(filename: Option<&str>, bytes: &[u8]) -> Result<(), ReportError> {
    let filename = filename
        .filter(|name| !name.is_empty())
        .ok_or(ReportError::MissingFilename)?;
    if !is_allowed_filename(filename) {
        return Err(ReportError::UnsupportedExtension(
            extension(filename).unwrap_or_default().to_string(),
        ));
    }
    if bytes.is_empty() {
        return Err(ReportError::EmptyUpload);
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(ReportError::TooLarge {
            size: bytes.len(),
            limit: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}
