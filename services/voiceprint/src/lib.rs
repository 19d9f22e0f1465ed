//! Nier Voiceprint Service
//!
//! Per-device storage for voiceprint samples: short audio recordings used by
//! the speaker recognition pipeline to tell speakers apart. Each
//! upload is validated, written to disk under its device's directory, and
//! indexed in memory so it can be listed, deleted and exported.
//!
//! ## Architecture
//!
//! ```text
//!  add ──▶ UploadValidator ──▶ FileNameGenerator ──▶ FileStore ──▶ VoiceprintRepository
//!                                                       ▲                 │
//!  remove ──────────────────────────────────────────────┘ (after index)   │
//!                                                                         ▼
//!  export / statistics ◀──────────────────────────────────────── ExportAggregator
//! ```
//!
//! Files live at `{root_dir}/{device_id}/{yyyyMMdd_HHmmss}_{token}.{ext}`.
//! Metadata is memory-resident: empty at startup, gone at shutdown. A crash
//! between a file write and its index insert can leave an orphan file, but
//! the index never references a file that was not fully written.
//!
//! ## Example
//!
//! ```rust,no_run
//! use voiceprint_service::{Config, NewVoiceprint, VoiceprintService};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let service = VoiceprintService::new(&config.storage);
//!
//!     let audio = std::fs::read("sample.wav")?;
//!     let voiceprint = service.add(
//!         "dev-1",
//!         NewVoiceprint {
//!             name: Some("Alice"),
//!             bytes: &audio,
//!             content_type: Some("audio/wav"),
//!             original_file_name: Some("sample.wav"),
//!             ..Default::default()
//!         },
//!     )?;
//!
//!     println!("{} -> {}", voiceprint.id, voiceprint.file_path);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod file_name;
pub mod file_store;
pub mod index;
pub mod model;
pub mod service;
pub mod telemetry;
pub mod validation;

pub use config::{Config, ServiceConfig, StorageConfig};
pub use error::VoiceprintError;
pub use export::{DeviceExport, ExportAggregator, ExportPayload, FullExport, VoiceprintStats};
pub use file_name::{FileNameGenerator, TimestampFileNameGenerator};
pub use file_store::{FileStore, FileStoreError, LocalFileStore};
pub use index::{InMemoryIndex, VoiceprintRepository};
pub use model::{Voiceprint, VoiceprintDraft, VoiceprintStatus};
pub use service::{NewVoiceprint, VoiceprintService, VoiceprintServiceBuilder, VoiceprintUpdate};
pub use validation::{UploadValidator, ValidationError};
