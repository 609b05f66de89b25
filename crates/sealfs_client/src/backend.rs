//! Capability traits for the remote collaborators.
//!
//! The engine never talks to the network directly: it consumes these traits,
//! implemented over whatever transport the application provides. In-memory
//! implementations live in `sealfs_testkit`.
//!
//! The authenticated session behind a `VlobClient` knows which device it
//! belongs to, so writes carry no explicit author: the store records the
//! session's device as the author of each accepted version.

use crate::error::SyncResult;
use async_trait::async_trait;
use sealfs_types::{BlockId, DeviceId, EntryId, Timestamp, VerifyKey, Version};

/// One version of a vlob as returned by the store.
///
/// `author`, `timestamp` and `version` are the transport's claims; they must
/// be checked against the signed payload before the content is trusted.
#[derive(Debug, Clone)]
pub struct SignedVlob {
    /// Device the store claims authored this version.
    pub author: DeviceId,
    /// Timestamp the store claims for this version.
    pub timestamp: Timestamp,
    /// Version number assigned by the store.
    pub version: Version,
    /// The sealed, signed manifest bytes.
    pub blob: Vec<u8>,
}

/// Client of the versioned object store.
///
/// `vlob_update` is gated on an expected version: the write is accepted only
/// if it would create exactly that version. This optimistic gate is the sole
/// admission-control mechanism preventing lost updates.
#[async_trait]
pub trait VlobClient: Send + Sync {
    /// Reads a vlob at a specific version, or at its head when `version` is
    /// `None`.
    async fn vlob_read(&self, id: EntryId, version: Option<Version>) -> SyncResult<SignedVlob>;

    /// Creates a vlob, establishing version 1.
    async fn vlob_create(&self, id: EntryId, timestamp: Timestamp, blob: Vec<u8>) -> SyncResult<()>;

    /// Writes a new vlob version.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::SyncError::VersionConflict`] when
    /// `expected_version` is not the store's current head plus one.
    async fn vlob_update(
        &self,
        id: EntryId,
        expected_version: Version,
        timestamp: Timestamp,
        blob: Vec<u8>,
    ) -> SyncResult<()>;
}

/// Client of the content block store.
///
/// The block store is append-only per id: a given id is posted at most once
/// and the stored bytes never change afterwards.
#[async_trait]
pub trait BlockClient: Send + Sync {
    /// Reads the ciphertext previously posted under `id`.
    async fn block_read(&self, id: BlockId) -> SyncResult<Vec<u8>>;

    /// Posts ciphertext under a freshly allocated id.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::SyncError::BlockAlreadyExists`] if the id was
    /// already posted; the stored content is left untouched.
    async fn block_post(&self, id: BlockId, ciphertext: Vec<u8>) -> SyncResult<()>;
}

/// A device entry from the trustchain directory.
#[derive(Debug, Clone)]
pub struct Device {
    /// The device's identity.
    pub device_id: DeviceId,
    /// Key used to verify manifests signed by this device.
    pub verify_key: VerifyKey,
}

/// Directory resolving device identities to verification keys.
#[async_trait]
pub trait DeviceDirectory: Send + Sync {
    /// Resolves a device id.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::SyncError::Trustchain`] for unknown or revoked
    /// devices.
    async fn get_device(&self, device_id: &DeviceId) -> SyncResult<Device>;
}
