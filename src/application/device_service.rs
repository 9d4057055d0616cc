// Device service - Use case for listing and resolving devices
use crate::domain::device::{Device, DeviceCatalog, DeviceIndex};
use std::sync::Arc;

#[derive(Clone)]
pub struct DeviceService {
    catalog: Arc<DeviceCatalog>,
}

impl DeviceService {
    pub fn new(catalog: Arc<DeviceCatalog>) -> Self {
        Self { catalog }
    }

    pub fn list_devices(&self) -> Vec<Device> {
        self.catalog.devices().to_vec()
    }

    pub fn resolve(&self, index: usize) -> Option<Device> {
        self.catalog.get(DeviceIndex::new(index)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::device::{Channel, TEMPERATURE_FIELDS};

    #[test]
    fn test_resolve_device() {
        let catalog = DeviceCatalog::new(
            vec![
                Device::new(DeviceIndex::new(0), None, Channel::new(405675, None, 8)),
                Device::new(DeviceIndex::new(1), None, Channel::new(441742, None, 8)),
            ],
            Channel::new(890567, None, TEMPERATURE_FIELDS),
        );
        let service = DeviceService::new(Arc::new(catalog));

        assert_eq!(service.list_devices().len(), 2);
        assert_eq!(service.resolve(1).map(|d| d.channel.id), Some(441742));
        assert!(service.resolve(2).is_none());
    }
}
