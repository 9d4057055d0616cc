// Device and channel domain model

/// Upper bound on `fieldN` columns a channel can declare
pub const MAX_FIELDS: usize = 8;

/// Temperature channel fields: one interior/exterior pair per device
pub const TEMPERATURE_FIELDS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceIndex(usize);

impl DeviceIndex {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn get(self) -> usize {
        self.0
    }

    /// One-based number used in labels and file names
    pub fn number(self) -> usize {
        self.0 + 1
    }
}

/// Provider column name for a one-based field number
pub fn field_name(number: usize) -> String {
    format!("field{}", number)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub id: u64,
    pub read_key: Option<String>,
    pub fields: Vec<String>,
}

impl Channel {
    pub fn new(id: u64, read_key: Option<String>, field_count: usize) -> Self {
        Self {
            id,
            read_key,
            fields: (1..=field_count).map(field_name).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub index: DeviceIndex,
    pub name: String,
    pub channel: Channel,
}

impl Device {
    pub fn new(index: DeviceIndex, name: Option<String>, channel: Channel) -> Self {
        let name = name.unwrap_or_else(|| Self::default_name(index));
        Self {
            index,
            name,
            channel,
        }
    }

    fn default_name(index: DeviceIndex) -> String {
        format!("IODR #{}", index.number())
    }
}

/// OD devices plus the shared temperature channel
#[derive(Debug, Clone)]
pub struct DeviceCatalog {
    devices: Vec<Device>,
    temperature: Channel,
}

impl DeviceCatalog {
    pub fn new(devices: Vec<Device>, temperature: Channel) -> Self {
        Self {
            devices,
            temperature,
        }
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn get(&self, index: DeviceIndex) -> Option<&Device> {
        self.devices.get(index.get())
    }

    pub fn temperature(&self) -> &Channel {
        &self.temperature
    }
}
