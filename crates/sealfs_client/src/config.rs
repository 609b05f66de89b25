//! Syncer configuration.

use sealfs_types::DeviceId;

/// Configuration for a [`crate::Syncer`].
#[derive(Debug, Clone)]
pub struct SyncerConfig {
    /// Identity of the local device; recorded as the author of every push.
    pub device_id: DeviceId,
    /// Capacity of the entry-synced event channel.
    ///
    /// Delivery is fire-and-forget: subscribers that lag more than this many
    /// events observe a gap.
    pub event_buffer: usize,
}

impl SyncerConfig {
    /// Creates a configuration with default buffer sizes.
    #[must_use]
    pub fn new(device_id: DeviceId) -> Self {
        Self {
            device_id,
            event_buffer: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SyncerConfig::new(DeviceId::new("alice@laptop"));
        assert_eq!(config.device_id.as_str(), "alice@laptop");
        assert!(config.event_buffer > 0);
    }
}
