use crate::config::StorageConfig;
use thiserror::Error;
use tracing::debug;

/// Reasons an upload is rejected before anything is written
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Device ID must not be empty")]
    EmptyDeviceId,

    #[error("Uploaded file is empty")]
    EmptyFile,

    #[error("Uploaded file is too large: {size} bytes (max {max_size} bytes)")]
    TooLarge { size: u64, max_size: u64 },

    #[error("Unsupported content type: {}", .content_type.as_deref().unwrap_or("<none>"))]
    UnsupportedType { content_type: Option<String> },
}

/// Upload checks applied in order: non-empty, size limit, content type
#[derive(Debug, Clone)]
pub struct UploadValidator {
    max_size: u64,
    allowed_types: Vec<String>,
}

impl UploadValidator {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            max_size: config.max_file_size_bytes,
            allowed_types: config
                .allowed_content_types
                .iter()
                .map(|t| t.trim().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Validate an upload. The first failing check wins.
    pub fn validate(
        &self,
        size: u64,
        content_type: Option<&str>,
        file_name: Option<&str>,
    ) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_size {
            return Err(ValidationError::TooLarge {
                size,
                max_size: self.max_size,
            });
        }

        let allowed = content_type
            .map(essence)
            .is_some_and(|t| self.allowed_types.iter().any(|a| *a == t));

        if !allowed {
            return Err(ValidationError::UnsupportedType {
                content_type: content_type.map(str::to_string),
            });
        }

        debug!(size, content_type = ?content_type, file_name = ?file_name, "Upload accepted");
        Ok(())
    }
}

impl Default for UploadValidator {
    fn default() -> Self {
        Self::new(&StorageConfig::default())
    }
}

/// Media type without parameters, lowercased: "Audio/WAV; rate=16000" -> "audio/wav"
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
