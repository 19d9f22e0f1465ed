use crate::file_store::FileStoreError;
use crate::validation::ValidationError;
use thiserror::Error;

/// Errors returned by voiceprint service operations
#[derive(Error, Debug)]
pub enum VoiceprintError {
    #[error("Invalid upload: {0}")]
    Validation(#[from] ValidationError),

    #[error("Voiceprint {voiceprint_id} not found for device {device_id}")]
    NotFound {
        device_id: String,
        voiceprint_id: String,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] FileStoreError),

    #[error("Could not allocate a unique file name after {attempts} attempts")]
    NameExhausted { attempts: u32 },
}

impl VoiceprintError {
    /// True when the caller sent something wrong, false for server-side failures
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            VoiceprintError::Validation(_) | VoiceprintError::NotFound { .. }
        )
    }

    /// Short machine-readable code for response envelopes
    pub fn code(&self) -> &'static str {
        match self {
            VoiceprintError::Validation(ValidationError::EmptyDeviceId) => "EMPTY_DEVICE_ID",
            VoiceprintError::Validation(ValidationError::EmptyFile) => "EMPTY_FILE",
            VoiceprintError::Validation(ValidationError::TooLarge { .. }) => "FILE_TOO_LARGE",
            VoiceprintError::Validation(ValidationError::UnsupportedType { .. }) => {
                "UNSUPPORTED_TYPE"
            }
            VoiceprintError::NotFound { .. } => "NOT_FOUND",
            VoiceprintError::Storage(_) | VoiceprintError::NameExhausted { .. } => "STORAGE_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, VoiceprintError>;
