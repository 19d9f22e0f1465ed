use crate::config::StorageConfig;
use crate::error::{Result, VoiceprintError};
use crate::export::{ExportAggregator, ExportPayload, VoiceprintStats};
use crate::file_name::{file_stem, FileNameGenerator, TimestampFileNameGenerator};
use crate::file_store::{FileStore, FileStoreError, LocalFileStore};
use crate::index::{InMemoryIndex, VoiceprintRepository};
use crate::model::{Voiceprint, VoiceprintDraft, VoiceprintStatus};
use crate::validation::{UploadValidator, ValidationError};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Name given to uploads with neither a name nor a usable file name
pub const UNNAMED_VOICEPRINT: &str = "Unnamed voiceprint";

/// An upload as received by the request layer
#[derive(Debug, Clone, Copy, Default)]
pub struct NewVoiceprint<'a> {
    /// Display name; falls back to the file name stem
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    /// Audio bytes
    pub bytes: &'a [u8],
    /// Declared content type, e.g. "audio/wav"
    pub content_type: Option<&'a str>,
    /// File name as sent by the client
    pub original_file_name: Option<&'a str>,
}

/// Metadata changes; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct VoiceprintUpdate {
    pub name: Option<String>,
    /// An empty description clears it
    pub description: Option<String>,
    pub status: Option<VoiceprintStatus>,
}

/// Per-device voiceprint storage: validation, file persistence and metadata
///
/// Safe to share between request threads. Add path order is
/// validate → ensure directory → write file → insert metadata, so metadata
/// never points at a file that was not written.
pub struct VoiceprintService {
    repository: Arc<dyn VoiceprintRepository>,
    file_store: Arc<dyn FileStore>,
    name_generator: Arc<dyn FileNameGenerator>,
    validator: UploadValidator,
    max_name_attempts: u32,
}

impl VoiceprintService {
    /// In-memory metadata with files under `config.root_dir`
    pub fn new(config: &StorageConfig) -> Self {
        VoiceprintServiceBuilder::new(config.clone()).build()
    }

    pub fn builder(config: StorageConfig) -> VoiceprintServiceBuilder {
        VoiceprintServiceBuilder::new(config)
    }

    /// Validate, persist and index a new voiceprint
    #[instrument(skip(self, upload), fields(device_id = %device_id, size_bytes = upload.bytes.len()))]
    pub fn add(&self, device_id: &str, upload: NewVoiceprint<'_>) -> Result<Voiceprint> {
        let validated = require_device_id(device_id).and_then(|()| {
            self.validator.validate(
                upload.bytes.len() as u64,
                upload.content_type,
                upload.original_file_name,
            )
        });
        if let Err(e) = validated {
            warn!(error = %e, "Rejected voiceprint upload");
            metrics::counter!("voiceprint.uploads.rejected").increment(1);
            return Err(e.into());
        }

        let draft = VoiceprintDraft::new(display_name(upload.name, upload.original_file_name))
            .with_description(non_blank(upload.description).map(str::to_string));

        let dir = self.file_store.ensure_directory(device_id)?;
        let (path, file_size) = self.persist(&dir, &upload)?;

        let voiceprint = draft.finalize(
            path.to_string_lossy().into_owned(),
            file_size,
            upload.original_file_name.map(str::to_string),
        );
        self.repository.insert(device_id, voiceprint.clone());

        info!(
            voiceprint_id = %voiceprint.id,
            name = %voiceprint.name,
            file_path = %voiceprint.file_path,
            "Voiceprint added"
        );
        metrics::counter!("voiceprint.uploads.accepted").increment(1);

        Ok(voiceprint)
    }

    /// Write the upload under a fresh generated name, retrying on collisions
    fn persist(&self, dir: &Path, upload: &NewVoiceprint<'_>) -> Result<(PathBuf, u64)> {
        let attempts = self.max_name_attempts.max(1);

        for attempt in 1..=attempts {
            let path = dir.join(self.name_generator.generate(upload.original_file_name));

            match self.file_store.write(&path, upload.bytes) {
                Ok(size) => return Ok((path, size)),
                Err(FileStoreError::AlreadyExists { path }) => {
                    warn!(attempt, path = %path.display(), "Generated file name taken, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(VoiceprintError::NameExhausted { attempts })
    }

    /// Voiceprints of one device in upload order
    pub fn list(&self, device_id: &str) -> Vec<Voiceprint> {
        debug!(device_id = %device_id, "Listing voiceprints");
        self.repository.list(device_id)
    }

    pub fn list_all(&self) -> Vec<Voiceprint> {
        self.repository.list_all()
    }

    /// One device when `device_id` is given and not blank, otherwise everything
    pub fn find(&self, device_id: Option<&str>) -> Vec<Voiceprint> {
        match device_id.filter(|d| !d.trim().is_empty()) {
            Some(device_id) => self.list(device_id),
            None => self.list_all(),
        }
    }

    pub fn get(&self, device_id: &str, voiceprint_id: &str) -> Result<Voiceprint> {
        self.repository
            .get(device_id, voiceprint_id)
            .ok_or_else(|| not_found(device_id, voiceprint_id))
    }

    /// Remove a voiceprint and then its file
    ///
    /// The metadata removal is what counts; a file that cannot be deleted is
    /// logged and left behind.
    #[instrument(skip(self), fields(device_id = %device_id, voiceprint_id = %voiceprint_id))]
    pub fn remove(&self, device_id: &str, voiceprint_id: &str) -> Result<Voiceprint> {
        require_device_id(device_id)?;

        let removed = self
            .repository
            .remove(device_id, voiceprint_id)
            .ok_or_else(|| {
                warn!("Voiceprint to delete not found");
                not_found(device_id, voiceprint_id)
            })?;

        if !self.file_store.delete(Path::new(&removed.file_path)) {
            warn!(file_path = %removed.file_path, "Voiceprint file not reclaimed");
        }

        info!(name = %removed.name, "Voiceprint deleted");
        metrics::counter!("voiceprint.deletes").increment(1);

        Ok(removed)
    }

    /// Change name, description or status and stamp the update time
    #[instrument(skip(self, update), fields(device_id = %device_id, voiceprint_id = %voiceprint_id))]
    pub fn update(
        &self,
        device_id: &str,
        voiceprint_id: &str,
        update: VoiceprintUpdate,
    ) -> Result<Voiceprint> {
        require_device_id(device_id)?;

        let name = non_blank(update.name.as_deref()).map(str::to_string);
        let description = update.description.as_deref().map(|d| d.trim().to_string());

        let updated = self
            .repository
            .update(device_id, voiceprint_id, &mut |voiceprint| {
                if let Some(name) = &name {
                    voiceprint.name = name.clone();
                }
                if let Some(description) = &description {
                    voiceprint.description =
                        (!description.is_empty()).then(|| description.clone());
                }
                if let Some(status) = update.status {
                    voiceprint.status = status;
                }
                voiceprint.updated_time = Some(Utc::now());
            })
            .ok_or_else(|| not_found(device_id, voiceprint_id))?;

        info!(status = %updated.status, "Voiceprint updated");
        Ok(updated)
    }

    pub fn export(&self, device_id: Option<&str>) -> ExportPayload {
        info!(device_id = ?device_id, "Exporting voiceprints");
        ExportAggregator::new(self.repository.as_ref()).export(device_id)
    }

    pub fn statistics(&self) -> VoiceprintStats {
        ExportAggregator::new(self.repository.as_ref()).statistics()
    }
}

/// Builder for VoiceprintService with replaceable components
pub struct VoiceprintServiceBuilder {
    config: StorageConfig,
    repository: Option<Arc<dyn VoiceprintRepository>>,
    file_store: Option<Arc<dyn FileStore>>,
    name_generator: Option<Arc<dyn FileNameGenerator>>,
}

impl VoiceprintServiceBuilder {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            repository: None,
            file_store: None,
            name_generator: None,
        }
    }

    pub fn repository(mut self, repository: Arc<dyn VoiceprintRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn file_store(mut self, file_store: Arc<dyn FileStore>) -> Self {
        self.file_store = Some(file_store);
        self
    }

    pub fn name_generator(mut self, name_generator: Arc<dyn FileNameGenerator>) -> Self {
        self.name_generator = Some(name_generator);
        self
    }

    pub fn build(self) -> VoiceprintService {
        let root_dir = self.config.root_dir.clone();

        VoiceprintService {
            repository: self
                .repository
                .unwrap_or_else(|| Arc::new(InMemoryIndex::new())),
            file_store: self
                .file_store
                .unwrap_or_else(|| Arc::new(LocalFileStore::new(root_dir))),
            name_generator: self
                .name_generator
                .unwrap_or_else(|| Arc::new(TimestampFileNameGenerator)),
            validator: UploadValidator::new(&self.config),
            max_name_attempts: self.config.max_name_attempts,
        }
    }
}

fn not_found(device_id: &str, voiceprint_id: &str) -> VoiceprintError {
    VoiceprintError::NotFound {
        device_id: device_id.to_string(),
        voiceprint_id: voiceprint_id.to_string(),
    }
}

/// Blank device ids are a client error for every mutating operation
fn require_device_id(device_id: &str) -> std::result::Result<(), ValidationError> {
    if device_id.trim().is_empty() {
        return Err(ValidationError::EmptyDeviceId);
    }
    Ok(())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Given name, else the file name without extension, else a placeholder
fn display_name(name: Option<&str>, original_file_name: Option<&str>) -> String {
    non_blank(name)
        .or_else(|| non_blank(original_file_name.map(file_stem)))
        .unwrap_or(UNNAMED_VOICEPRINT)
        .to_string()
}
