// Application state for HTTP handlers
use crate::application::device_service::DeviceService;
use crate::application::growth_service::GrowthService;
use crate::application::snapshot_store::SnapshotStore;

pub struct AppState {
    pub device_service: DeviceService,
    pub growth_service: GrowthService,
    pub snapshots: SnapshotStore,
}
