//! Error types for the sync engine.

use sealfs_types::{BlockId, CodecError, DeviceId, EntryId, Version};
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Digest or signature mismatch on remote content.
    ///
    /// Fatal for the current operation: the object is never cached and the
    /// fetch is not retried (corruption or tampering, not a transient
    /// fault).
    #[error("integrity error: {reason}")]
    Integrity {
        /// What failed to verify.
        reason: String,
    },

    /// The claimed author is unknown to, or rejected by, the device
    /// directory.
    #[error("untrusted author: {device_id}")]
    Trustchain {
        /// The claimed authoring device.
        device_id: DeviceId,
    },

    /// An optimistic write lost a version race.
    ///
    /// Expected during concurrent mutation; drives the internal
    /// merge-and-retry loop and is not surfaced to callers.
    #[error("version conflict on {id}: expected {expected}")]
    VersionConflict {
        /// The contended entry.
        id: EntryId,
        /// The version the write expected to create.
        expected: Version,
    },

    /// A block id was posted twice.
    ///
    /// The block store is write-once; the engine never re-posts an
    /// allocated id, so this indicates an id collision or a logic error.
    #[error("block already exists: {id}")]
    BlockAlreadyExists {
        /// The rejected block id.
        id: BlockId,
    },

    /// The requested remote object does not exist.
    #[error("remote object not found: {what}")]
    RemoteNotFound {
        /// Description of the missing object.
        what: String,
    },

    /// The remote store could not be reached.
    ///
    /// Surfaced to the caller unchanged; retry and backoff belong to the
    /// transport collaborator, not to this engine.
    #[error("backend unavailable: {message}")]
    BackendUnavailable {
        /// Transport-level failure description.
        message: String,
    },

    /// A manifest is not in the local cache.
    ///
    /// Callers fall back to the remote loader.
    #[error("manifest not in local cache: {id}")]
    LocalManifestMiss {
        /// The missing entry.
        id: EntryId,
    },

    /// A block is not in the local cache.
    #[error("block not in local cache: {id}")]
    LocalBlockMiss {
        /// The missing block.
        id: BlockId,
    },

    /// An entry had an unexpected kind (file where a folder was expected,
    /// or the reverse).
    #[error("unexpected manifest kind for {id}: expected {expected}")]
    UnexpectedKind {
        /// The offending entry.
        id: EntryId,
        /// The kind the operation required.
        expected: &'static str,
    },

    /// Manifest CBOR encoding/decoding failed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The sync operation was cancelled at a suspension point.
    #[error("sync cancelled")]
    Cancelled,
}

impl SyncError {
    /// Shorthand for an integrity failure.
    pub(crate) fn integrity(reason: impl Into<String>) -> Self {
        Self::Integrity {
            reason: reason.into(),
        }
    }
}
