//! Upload constants and validation for images submitted for prediction.

use crate::error::CoreError;

/// Default maximum accepted upload size (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Content types accepted for prediction uploads.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// File-name extensions accepted for prediction uploads.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// An image format the service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
}

impl ImageKind {
    /// Extension used when storing a blob of this kind.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// Parse an allowed content type; parameters such as `; charset=` are ignored.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            _ => None,
        }
    }
}

/// Validate the declared metadata and size of an uploaded file.
///
/// Runs before any external call is made. The bytes themselves are checked
/// again when decoded.
pub fn validate_upload(
    content_type: Option<&str>,
    file_name: Option<&str>,
    size: usize,
    max_bytes: usize,
) -> Result<ImageKind, CoreError> {
    let declared = content_type.ok_or_else(|| {
        CoreError::Validation("Uploaded file has no content type".into())
    })?;
    let kind = ImageKind::from_content_type(declared).ok_or_else(|| {
        CoreError::Validation(format!(
            "Invalid file type '{declared}'. Only JPEG and PNG are supported."
        ))
    })?;

    if let Some(name) = file_name.filter(|n| !n.is_empty()) {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(CoreError::Validation(format!(
                "File extension of '{name}' does not match allowed types (JPEG, PNG)."
            )));
        }
    }

    if size == 0 {
        return Err(CoreError::Validation("Uploaded file is empty".into()));
    }
    if size > max_bytes {
        return Err(CoreError::Validation(format!(
            "File too large. Maximum size is {} bytes.",
            max_bytes
        )));
    }

    Ok(kind)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn accepts_jpeg_and_png() {
        assert_eq!(
            validate_upload(Some("image/jpeg"), Some("leaf.JPG"), 10, 100).unwrap(),
            ImageKind::Jpeg
        );
        assert_eq!(
            validate_upload(Some("image/png"), Some("leaf.png"), 10, 100).unwrap(),
            ImageKind::Png
        );
    }

    #[test]
    fn content_type_parameters_are_ignored() {
        assert_eq!(
            ImageKind::from_content_type("Image/PNG; foo=bar"),
            Some(ImageKind::Png)
        );
    }

    #[test]
    fn rejects_other_content_types() {
        assert_matches!(
            validate_upload(Some("image/gif"), Some("leaf.gif"), 10, 100),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            validate_upload(None, Some("leaf.png"), 10, 100),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn rejects_mismatched_extension() {
        assert_matches!(
            validate_upload(Some("image/png"), Some("leaf.exe"), 10, 100),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            validate_upload(Some("image/png"), Some("leaf"), 10, 100),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn missing_file_name_is_allowed() {
        assert!(validate_upload(Some("image/png"), None, 10, 100).is_ok());
    }

    #[test]
    fn enforces_size_bounds() {
        assert_matches!(
            validate_upload(Some("image/png"), None, 0, 100),
            Err(CoreError::Validation(_))
        );
        assert!(validate_upload(Some("image/png"), None, 100, 100).is_ok());
        assert_matches!(
            validate_upload(Some("image/png"), None, 101, 100),
            Err(CoreError::Validation(msg)) if msg.contains("too large")
        );
    }
}
