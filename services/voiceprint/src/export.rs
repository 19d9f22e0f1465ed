use crate::index::VoiceprintRepository;
use crate::model::Voiceprint;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Export of one device's voiceprints
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceExport {
    pub export_time: DateTime<Utc>,
    pub device_id: String,
    pub voiceprints: Vec<Voiceprint>,
    pub total_count: usize,
}

/// Export of every device's voiceprints
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullExport {
    pub export_time: DateTime<Utc>,
    /// Always null; keeps the payload shape aligned with [`DeviceExport`]
    pub device_id: Option<String>,
    pub voiceprints_by_device: HashMap<String, Vec<Voiceprint>>,
    pub total_devices: usize,
    pub total_voiceprints: usize,
}

/// Result of an export request
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ExportPayload {
    Device(DeviceExport),
    All(FullExport),
}

impl ExportPayload {
    pub fn export_time(&self) -> DateTime<Utc> {
        match self {
            ExportPayload::Device(export) => export.export_time,
            ExportPayload::All(export) => export.export_time,
        }
    }

    /// Number of voiceprints contained in the payload
    pub fn total_voiceprints(&self) -> usize {
        match self {
            ExportPayload::Device(export) => export.total_count,
            ExportPayload::All(export) => export.total_voiceprints,
        }
    }
}

/// Aggregate counts over the whole store
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceprintStats {
    pub total_devices: usize,
    pub total_voiceprints: usize,
    pub average_per_device: f64,
    pub total_bytes: u64,
    pub per_device_counts: HashMap<String, usize>,
}

/// Builds exports and statistics from repository snapshots
pub struct ExportAggregator<'a> {
    repository: &'a dyn VoiceprintRepository,
}

impl<'a> ExportAggregator<'a> {
    pub fn new(repository: &'a dyn VoiceprintRepository) -> Self {
        Self { repository }
    }

    /// Export one device, or all devices when `device_id` is `None` or blank
    pub fn export(&self, device_id: Option<&str>) -> ExportPayload {
        let export_time = Utc::now();

        match device_id.filter(|d| !d.trim().is_empty()) {
            Some(device_id) => {
                let voiceprints = self.repository.list(device_id);
                ExportPayload::Device(DeviceExport {
                    export_time,
                    device_id: device_id.to_string(),
                    total_count: voiceprints.len(),
                    voiceprints,
                })
            }
            None => {
                let voiceprints_by_device = self.repository.snapshot();
                ExportPayload::All(FullExport {
                    export_time,
                    device_id: None,
                    total_devices: voiceprints_by_device.len(),
                    total_voiceprints: voiceprints_by_device.values().map(Vec::len).sum(),
                    voiceprints_by_device,
                })
            }
        }
    }

    pub fn statistics(&self) -> VoiceprintStats {
        let snapshot = self.repository.snapshot();

        let total_devices = snapshot.len();
        let total_voiceprints: usize = snapshot.values().map(Vec::len).sum();
        let total_bytes: u64 = snapshot.values().flatten().map(|v| v.file_size).sum();
        let average_per_device = if total_devices == 0 {
            0.0
        } else {
            total_voiceprints as f64 / total_devices as f64
        };

        VoiceprintStats {
            total_devices,
            total_voiceprints,
            average_per_device,
            total_bytes,
            per_device_counts: snapshot
                .into_iter()
                .map(|(device_id, records)| (device_id, records.len()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::InMemoryIndex;
    use crate::model::VoiceprintDraft;

    fn create_test_index() -> InMemoryIndex {
        let index = InMemoryIndex::new();
        for (device, name, size) in [("dev-1", "a", 100), ("dev-1", "b", 200), ("dev-2", "c", 300)] {
            let voiceprint = VoiceprintDraft::new(name).finalize(format!("/tmp/{name}.wav"), size, None);
            index.insert(device, voiceprint);
        }
        index
    }

    #[test]
    fn test_export_single_device() {
        let index = create_test_index();
        let aggregator = ExportAggregator::new(&index);

        match aggregator.export(Some("dev-1")) {
            ExportPayload::Device(export) => {
                assert_eq!(export.device_id, "dev-1");
                assert_eq!(export.total_count, 2);
                assert_eq!(export.voiceprints[0].name, "a");
            }
            ExportPayload::All(_) => panic!("Expected device export"),
        }
    }

    #[test]
    fn test_export_keeps_device_id_untrimmed() {
        let index = create_test_index();
        let padded = VoiceprintDraft::new("padded").finalize("/tmp/p.wav".to_string(), 10, None);
        index.insert(" dev-1 ", padded);

        let before = Utc::now();
        let payload = ExportAggregator::new(&index).export(Some(" dev-1 "));
        assert!(payload.export_time() >= before && payload.export_time() <= Utc::now());

        match payload {
            ExportPayload::Device(export) => {
                assert_eq!(export.device_id, " dev-1 ");
                assert_eq!(export.total_count, 1);
                assert_eq!(export.voiceprints[0].name, "padded");
            }
            ExportPayload::All(_) => panic!("Expected device export"),
        }
    }

    #[test]
    fn test_export_unknown_device_is_empty() {
        let index = create_test_index();
        let payload = ExportAggregator::new(&index).export(Some("dev-9"));
        assert_eq!(payload.total_voiceprints(), 0);
    }

    #[test]
    fn test_export_all() {
        let index = create_test_index();
        let aggregator = ExportAggregator::new(&index);

        for device_id in [None, Some(""), Some("   ")] {
            match aggregator.export(device_id) {
                ExportPayload::All(export) => {
                    assert!(export.device_id.is_none());
                    assert_eq!(export.total_devices, 2);
                    assert_eq!(export.total_voiceprints, 3);
                    assert_eq!(export.voiceprints_by_device["dev-2"].len(), 1);
                }
                ExportPayload::Device(_) => panic!("Expected full export"),
            }
        }
    }

    #[test]
    fn test_export_json_shape() {
        let index = create_test_index();
        let json = serde_json::to_value(ExportAggregator::new(&index).export(None)).unwrap();

        assert!(json["deviceId"].is_null());
        assert_eq!(json["totalVoiceprints"], 3);
        assert!(json["voiceprintsByDevice"]["dev-1"].is_array());
        assert!(json["exportTime"].is_string());
    }

    #[test]
    fn test_statistics() {
        let index = create_test_index();
        let stats = ExportAggregator::new(&index).statistics();

        assert_eq!(stats.total_devices, 2);
        assert_eq!(stats.total_voiceprints, 3);
        assert_eq!(stats.average_per_device, 1.5);
        assert_eq!(stats.total_bytes, 600);
        assert_eq!(stats.per_device_counts["dev-1"], 2);
    }

    #[test]
    fn test_statistics_empty() {
        let index = InMemoryIndex::new();
        let stats = ExportAggregator::new(&index).statistics();

        assert_eq!(stats.total_devices, 0);
        assert_eq!(stats.average_per_device, 0.0);
        assert!(stats.per_device_counts.is_empty());
    }
}
