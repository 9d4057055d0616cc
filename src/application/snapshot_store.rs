// Latest refreshed snapshot per device
use crate::domain::device::DeviceIndex;
use crate::domain::snapshot::DeviceSnapshot;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Snapshots are immutable; a refresh replaces the stored one wholesale
#[derive(Default)]
pub struct SnapshotStore {
    snapshots: RwLock<HashMap<DeviceIndex, Arc<DeviceSnapshot>>>,
}

impl SnapshotStore {
    pub async fn put(&self, snapshot: DeviceSnapshot) -> Arc<DeviceSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.snapshots
            .write()
            .await
            .insert(snapshot.device, snapshot.clone());
        snapshot
    }

    pub async fn get(&self, device: DeviceIndex) -> Option<Arc<DeviceSnapshot>> {
        self.snapshots.read().await.get(&device).cloned()
    }
}
