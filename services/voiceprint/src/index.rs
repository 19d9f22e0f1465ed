use crate::model::Voiceprint;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Device-partitioned voiceprint metadata
///
/// Implementations must be safe to share across threads. Records within a
/// device keep insertion order.
pub trait VoiceprintRepository: Send + Sync {
    /// Records of one device in insertion order; empty for unknown devices
    fn list(&self, device_id: &str) -> Vec<Voiceprint>;

    /// All records, partition order unspecified
    fn list_all(&self) -> Vec<Voiceprint>;

    fn get(&self, device_id: &str, voiceprint_id: &str) -> Option<Voiceprint>;

    /// Append a finalized record to the device's partition
    fn insert(&self, device_id: &str, voiceprint: Voiceprint);

    /// Remove the first record with `voiceprint_id`, returning it
    fn remove(&self, device_id: &str, voiceprint_id: &str) -> Option<Voiceprint>;

    /// Apply `change` to a record in place and return the updated copy
    fn update(
        &self,
        device_id: &str,
        voiceprint_id: &str,
        change: &mut dyn FnMut(&mut Voiceprint),
    ) -> Option<Voiceprint>;

    /// Every known device with its records
    fn snapshot(&self) -> HashMap<String, Vec<Voiceprint>>;
}

type Partition = Arc<RwLock<Vec<Voiceprint>>>;

/// In-memory repository with one lock per device partition
///
/// The partition map lock is held only to look up or create a partition;
/// record mutations happen under the partition's own lock, so devices never
/// wait on each other's writes. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    partitions: RwLock<HashMap<String, Partition>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn partition(&self, device_id: &str) -> Option<Partition> {
        self.partitions.read().get(device_id).cloned()
    }

    fn partition_or_create(&self, device_id: &str) -> Partition {
        if let Some(partition) = self.partition(device_id) {
            return partition;
        }

        self.partitions
            .write()
            .entry(device_id.to_string())
            .or_default()
            .clone()
    }

    fn partitions(&self) -> Vec<(String, Partition)> {
        self.partitions
            .read()
            .iter()
            .map(|(device_id, partition)| (device_id.clone(), partition.clone()))
            .collect()
    }
}

impl VoiceprintRepository for InMemoryIndex {
    fn list(&self, device_id: &str) -> Vec<Voiceprint> {
        match self.partition(device_id) {
            Some(partition) => {
                let records = partition.read().clone();
                records
            }
            None => Vec::new(),
        }
    }

    fn list_all(&self) -> Vec<Voiceprint> {
        self.partitions()
            .into_iter()
            .flat_map(|(_, partition)| {
                let records = partition.read().clone();
                records
            })
            .collect()
    }

    fn get(&self, device_id: &str, voiceprint_id: &str) -> Option<Voiceprint> {
        self.partition(device_id)?
            .read()
            .iter()
            .find(|v| v.id == voiceprint_id)
            .cloned()
    }

    fn insert(&self, device_id: &str, voiceprint: Voiceprint) {
        self.partition_or_create(device_id).write().push(voiceprint);
    }

    fn remove(&self, device_id: &str, voiceprint_id: &str) -> Option<Voiceprint> {
        let partition = self.partition(device_id)?;
        let mut records = partition.write();
        let position = records.iter().position(|v| v.id == voiceprint_id)?;
        Some(records.remove(position))
    }

    fn update(
        &self,
        device_id: &str,
        voiceprint_id: &str,
        change: &mut dyn FnMut(&mut Voiceprint),
    ) -> Option<Voiceprint> {
        let partition = self.partition(device_id)?;
        let mut records = partition.write();
        let record = records.iter_mut().find(|v| v.id == voiceprint_id)?;
        change(record);
        Some(record.clone())
    }

    fn snapshot(&self) -> HashMap<String, Vec<Voiceprint>> {
        self.partitions()
            .into_iter()
            .map(|(device_id, partition)| {
                let records = partition.read().clone();
                (device_id, records)
            })
            .collect()
    }
}
