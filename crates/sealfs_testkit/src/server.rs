//! In-memory fake of the remote collaborators.
//!
//! Faithful to the contracts the engine relies on: vlob updates are gated on
//! the exact next version, blocks are write-once, and unknown devices are a
//! trustchain failure. Per-operation counters let tests assert how much
//! network traffic a sync produced, and an offline switch simulates
//! transport faults.

use async_trait::async_trait;
use parking_lot::RwLock;
use sealfs_client::{
    BlockClient, Device, DeviceDirectory, SignedVlob, SyncError, SyncResult, VlobClient,
};
use sealfs_types::{BlockId, DeviceId, EntryId, Timestamp, VerifyKey, Version};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct StoredVlob {
    author: DeviceId,
    timestamp: Timestamp,
    blob: Vec<u8>,
}

/// The remote side: versioned object store, block store, device directory.
#[derive(Default)]
pub struct InMemoryServer {
    vlobs: RwLock<HashMap<EntryId, Vec<StoredVlob>>>,
    blocks: RwLock<HashMap<BlockId, Vec<u8>>>,
    devices: RwLock<HashMap<DeviceId, VerifyKey>>,
    offline: AtomicBool,
    vlob_reads: AtomicU64,
    vlob_writes: AtomicU64,
    block_reads: AtomicU64,
    block_writes: AtomicU64,
}

impl InMemoryServer {
    /// Creates an empty server.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a device's verification key in the directory.
    pub fn register_device(&self, device_id: DeviceId, verify_key: VerifyKey) {
        self.devices.write().insert(device_id, verify_key);
    }

    /// Opens an authenticated session for a registered device.
    pub fn session(self: &Arc<Self>, device_id: DeviceId) -> Arc<DeviceSession> {
        Arc::new(DeviceSession {
            server: Arc::clone(self),
            device_id,
        })
    }

    /// Simulates the transport going down (or up).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Returns the current head version of a vlob, if it exists.
    #[must_use]
    pub fn head_version(&self, id: EntryId) -> Option<Version> {
        let vlobs = self.vlobs.read();
        let versions = vlobs.get(&id)?;
        Some(Version::new(versions.len() as u64))
    }

    /// Returns the stored ciphertext of a block, if any.
    #[must_use]
    pub fn raw_block(&self, id: BlockId) -> Option<Vec<u8>> {
        self.blocks.read().get(&id).cloned()
    }

    /// Total network operations served since the last counter reset.
    #[must_use]
    pub fn network_calls(&self) -> u64 {
        self.vlob_reads.load(Ordering::SeqCst)
            + self.vlob_writes.load(Ordering::SeqCst)
            + self.block_reads.load(Ordering::SeqCst)
            + self.block_writes.load(Ordering::SeqCst)
    }

    /// Vlob reads served since the last counter reset.
    #[must_use]
    pub fn vlob_reads(&self) -> u64 {
        self.vlob_reads.load(Ordering::SeqCst)
    }

    /// Vlob creates/updates served since the last counter reset.
    #[must_use]
    pub fn vlob_writes(&self) -> u64 {
        self.vlob_writes.load(Ordering::SeqCst)
    }

    /// Resets all call counters.
    pub fn reset_counters(&self) {
        self.vlob_reads.store(0, Ordering::SeqCst);
        self.vlob_writes.store(0, Ordering::SeqCst);
        self.block_reads.store(0, Ordering::SeqCst);
        self.block_writes.store(0, Ordering::SeqCst);
    }

    fn check_online(&self) -> SyncResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(SyncError::BackendUnavailable {
                message: "server offline".to_owned(),
            })
        } else {
            Ok(())
        }
    }
}

/// An authenticated handle onto the server.
///
/// The real transport authenticates a device during its handshake; here the
/// session simply carries the device id and the store records it as the
/// author of every accepted write.
pub struct DeviceSession {
    server: Arc<InMemoryServer>,
    device_id: DeviceId,
}

impl DeviceSession {
    /// The server this session is connected to.
    #[must_use]
    pub fn server(&self) -> &Arc<InMemoryServer> {
        &self.server
    }
}

#[async_trait]
impl VlobClient for DeviceSession {
    async fn vlob_read(&self, id: EntryId, version: Option<Version>) -> SyncResult<SignedVlob> {
        self.server.check_online()?;
        self.server.vlob_reads.fetch_add(1, Ordering::SeqCst);
        let vlobs = self.server.vlobs.read();
        let versions = vlobs.get(&id).ok_or_else(|| SyncError::RemoteNotFound {
            what: format!("vlob {id}"),
        })?;
        let (index, version) = match version {
            Some(v) => (
                v.as_u64()
                    .checked_sub(1)
                    .ok_or_else(|| SyncError::RemoteNotFound {
                        what: format!("vlob {id} at {v}"),
                    })? as usize,
                v,
            ),
            None => (versions.len() - 1, Version::new(versions.len() as u64)),
        };
        let stored = versions.get(index).ok_or_else(|| SyncError::RemoteNotFound {
            what: format!("vlob {id} at {version}"),
        })?;
        Ok(SignedVlob {
            author: stored.author.clone(),
            timestamp: stored.timestamp,
            version,
            blob: stored.blob.clone(),
        })
    }

    async fn vlob_create(&self, id: EntryId, timestamp: Timestamp, blob: Vec<u8>) -> SyncResult<()> {
        self.server.check_online()?;
        self.server.vlob_writes.fetch_add(1, Ordering::SeqCst);
        let mut vlobs = self.server.vlobs.write();
        if vlobs.contains_key(&id) {
            return Err(SyncError::VersionConflict {
                id,
                expected: Version::new(1),
            });
        }
        vlobs.insert(
            id,
            vec![StoredVlob {
                author: self.device_id.clone(),
                timestamp,
                blob,
            }],
        );
        Ok(())
    }

    async fn vlob_update(
        &self,
        id: EntryId,
        expected_version: Version,
        timestamp: Timestamp,
        blob: Vec<u8>,
    ) -> SyncResult<()> {
        self.server.check_online()?;
        self.server.vlob_writes.fetch_add(1, Ordering::SeqCst);
        let mut vlobs = self.server.vlobs.write();
        let versions = vlobs.get_mut(&id).ok_or_else(|| SyncError::RemoteNotFound {
            what: format!("vlob {id}"),
        })?;
        let next = Version::new(versions.len() as u64 + 1);
        if expected_version != next {
            return Err(SyncError::VersionConflict {
                id,
                expected: expected_version,
            });
        }
        versions.push(StoredVlob {
            author: self.device_id.clone(),
            timestamp,
            blob,
        });
        Ok(())
    }
}

#[async_trait]
impl BlockClient for DeviceSession {
    async fn block_read(&self, id: BlockId) -> SyncResult<Vec<u8>> {
        self.server.check_online()?;
        self.server.block_reads.fetch_add(1, Ordering::SeqCst);
        self.server
            .blocks
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| SyncError::RemoteNotFound {
                what: format!("block {id}"),
            })
    }

    async fn block_post(&self, id: BlockId, ciphertext: Vec<u8>) -> SyncResult<()> {
        self.server.check_online()?;
        self.server.block_writes.fetch_add(1, Ordering::SeqCst);
        let mut blocks = self.server.blocks.write();
        if blocks.contains_key(&id) {
            // Write-once: the first payload stays.
            return Err(SyncError::BlockAlreadyExists { id });
        }
        blocks.insert(id, ciphertext);
        Ok(())
    }
}

#[async_trait]
impl DeviceDirectory for DeviceSession {
    async fn get_device(&self, device_id: &DeviceId) -> SyncResult<Device> {
        self.server.check_online()?;
        self.server
            .devices
            .read()
            .get(device_id)
            .cloned()
            .map(|verify_key| Device {
                device_id: device_id.clone(),
                verify_key,
            })
            .ok_or_else(|| SyncError::Trustchain {
                device_id: device_id.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(server: &Arc<InMemoryServer>) -> Arc<DeviceSession> {
        server.session(DeviceId::new("alice@laptop"))
    }

    #[tokio::test]
    async fn updates_are_gated_on_the_exact_next_version() {
        let server = Arc::new(InMemoryServer::new());
        let session = session(&server);
        let id = EntryId::generate();
        session
            .vlob_create(id, Timestamp::from_millis(0), vec![1])
            .await
            .unwrap();

        // Skipping ahead or replaying an old version is rejected.
        for wrong in [Version::new(1), Version::new(3)] {
            let err = session
                .vlob_update(id, wrong, Timestamp::from_millis(1), vec![2])
                .await
                .unwrap_err();
            assert!(matches!(err, SyncError::VersionConflict { .. }));
        }
        assert_eq!(server.head_version(id), Some(Version::new(1)));

        session
            .vlob_update(id, Version::new(2), Timestamp::from_millis(1), vec![2])
            .await
            .unwrap();
        assert_eq!(server.head_version(id), Some(Version::new(2)));
    }

    #[tokio::test]
    async fn reads_address_stored_versions() {
        let server = Arc::new(InMemoryServer::new());
        let session = session(&server);
        let id = EntryId::generate();
        session
            .vlob_create(id, Timestamp::from_millis(0), vec![1])
            .await
            .unwrap();
        session
            .vlob_update(id, Version::new(2), Timestamp::from_millis(1), vec![2])
            .await
            .unwrap();

        let head = session.vlob_read(id, None).await.unwrap();
        assert_eq!(head.version, Version::new(2));
        assert_eq!(head.blob, vec![2]);

        let old = session.vlob_read(id, Some(Version::new(1))).await.unwrap();
        assert_eq!(old.blob, vec![1]);

        let err = session
            .vlob_read(id, Some(Version::new(3)))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::RemoteNotFound { .. }));
    }

    #[tokio::test]
    async fn counters_track_served_operations() {
        let server = Arc::new(InMemoryServer::new());
        let session = session(&server);
        let id = EntryId::generate();
        session
            .vlob_create(id, Timestamp::from_millis(0), vec![1])
            .await
            .unwrap();
        session.vlob_read(id, None).await.unwrap();
        assert_eq!(server.vlob_writes(), 1);
        assert_eq!(server.vlob_reads(), 1);
        assert_eq!(server.network_calls(), 2);
        server.reset_counters();
        assert_eq!(server.network_calls(), 0);
    }
}
