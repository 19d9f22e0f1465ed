use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle status of a stored voiceprint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceprintStatus {
    #[default]
    Active,
    Inactive,
}

impl fmt::Display for VoiceprintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceprintStatus::Active => write!(f, "active"),
            VoiceprintStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// Stored voiceprint metadata
///
/// Only constructed through [`VoiceprintDraft::finalize`], so `file_path`
/// always points at bytes that were written successfully.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voiceprint {
    /// Unique voiceprint ID, global across devices
    pub id: String,
    /// Display label
    pub name: String,
    /// Location of the audio file on disk
    pub file_path: String,
    /// File name as supplied by the uploader
    pub original_file_name: Option<String>,
    /// Audio size in bytes
    pub file_size: u64,
    /// When the record was created
    pub created_time: DateTime<Utc>,
    /// Last metadata change, if any
    pub updated_time: Option<DateTime<Utc>>,
    /// Free-form description
    pub description: Option<String>,
    /// Active or inactive
    pub status: VoiceprintStatus,
}

impl Voiceprint {
    /// A record is usable by recognition only with an id, a name, a file and
    /// an active status.
    pub fn is_valid(&self) -> bool {
        !self.id.trim().is_empty()
            && !self.name.trim().is_empty()
            && !self.file_path.trim().is_empty()
            && self.status == VoiceprintStatus::Active
    }

    /// Human readable size, e.g. "512 B", "5.00 KB", "1.50 MB"
    pub fn formatted_file_size(&self) -> String {
        const KB: u64 = 1024;
        const MB: u64 = 1024 * 1024;

        if self.file_size < KB {
            format!("{} B", self.file_size)
        } else if self.file_size < MB {
            format!("{:.2} KB", self.file_size as f64 / KB as f64)
        } else {
            format!("{:.2} MB", self.file_size as f64 / MB as f64)
        }
    }

    /// Lowercase extension of the original file name, or "unknown"
    pub fn file_extension(&self) -> String {
        self.original_file_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// A voiceprint whose identity is assigned but whose file is not yet written
#[derive(Debug, Clone)]
pub struct VoiceprintDraft {
    id: String,
    name: String,
    description: Option<String>,
    status: VoiceprintStatus,
    created_time: DateTime<Utc>,
}

impl VoiceprintDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            status: VoiceprintStatus::Active,
            created_time: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attach the persisted file. Call only after the write returned success.
    pub fn finalize(
        self,
        file_path: String,
        file_size: u64,
        original_file_name: Option<String>,
    ) -> Voiceprint {
        Voiceprint {
            id: self.id,
            name: self.name,
            file_path,
            original_file_name,
            file_size,
            created_time: self.created_time,
            updated_time: None,
            description: self.description,
            status: self.status,
        }
    }
}
