//! Local cache capability.
//!
//! The engine depends on a narrow `get/set` interface rather than a concrete
//! persistence implementation, so the merge/sync logic can be exercised
//! against an in-memory cache in tests and backed by a durable store in the
//! application.

use crate::error::{SyncError, SyncResult};
use parking_lot::RwLock;
use sealfs_types::{BlockAccess, BlockId, EntryId, LocalManifest, RemoteManifest};
use std::collections::HashMap;

/// Capability over the device-local cache.
///
/// Two manifest slots exist per entry: the *local* manifest (the live,
/// possibly dirty view foreground operations mutate) and the *base* manifest
/// (the last verified remote version it derives from, kept for three-way
/// merges). Blocks are split into *clean* (downloaded, verified) and *dirty*
/// (written locally, pending upload).
pub trait LocalStorage: Send + Sync {
    /// Returns the live local manifest of an entry.
    ///
    /// # Errors
    ///
    /// Fails with [`SyncError::LocalManifestMiss`] when the entry is not
    /// cached; callers fall back to the remote loader.
    fn get_manifest(&self, id: EntryId) -> SyncResult<LocalManifest>;

    /// Stores the live local manifest of an entry.
    fn set_manifest(&self, id: EntryId, manifest: LocalManifest);

    /// Returns the last verified remote manifest of an entry.
    ///
    /// # Errors
    ///
    /// Fails with [`SyncError::LocalManifestMiss`] when no base is cached.
    fn get_base_manifest(&self, id: EntryId) -> SyncResult<RemoteManifest>;

    /// Records a verified remote manifest as the entry's new base.
    fn set_base_manifest(&self, id: EntryId, manifest: RemoteManifest);

    /// Returns a cached block's plaintext.
    ///
    /// # Errors
    ///
    /// Fails with [`SyncError::LocalBlockMiss`] when the block is not
    /// cached.
    fn get_block(&self, id: BlockId) -> SyncResult<Vec<u8>>;

    /// Caches a downloaded, verified block.
    fn set_clean_block(&self, access: &BlockAccess, block: Vec<u8>);

    /// Caches a locally written block pending upload.
    fn set_dirty_block(&self, access: &BlockAccess, block: Vec<u8>);

    /// Returns true if the block is dirty (written locally, not uploaded).
    fn is_dirty_block(&self, id: BlockId) -> bool;

    /// Reclassifies a block as clean after a successful upload.
    fn mark_block_clean(&self, id: BlockId);
}

/// In-memory [`LocalStorage`] implementation.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    manifests: RwLock<HashMap<EntryId, LocalManifest>>,
    base_manifests: RwLock<HashMap<EntryId, RemoteManifest>>,
    blocks: RwLock<HashMap<BlockId, Vec<u8>>>,
    dirty: RwLock<std::collections::HashSet<BlockId>>,
}

impl MemoryStorage {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a block is present, clean or dirty.
    #[must_use]
    pub fn contains_block(&self, id: BlockId) -> bool {
        self.blocks.read().contains_key(&id)
    }
}

impl LocalStorage for MemoryStorage {
    fn get_manifest(&self, id: EntryId) -> SyncResult<LocalManifest> {
        self.manifests
            .read()
            .get(&id)
            .cloned()
            .ok_or(SyncError::LocalManifestMiss { id })
    }

    fn set_manifest(&self, id: EntryId, manifest: LocalManifest) {
        self.manifests.write().insert(id, manifest);
    }

    fn get_base_manifest(&self, id: EntryId) -> SyncResult<RemoteManifest> {
        self.base_manifests
            .read()
            .get(&id)
            .cloned()
            .ok_or(SyncError::LocalManifestMiss { id })
    }

    fn set_base_manifest(&self, id: EntryId, manifest: RemoteManifest) {
        self.base_manifests.write().insert(id, manifest);
    }

    fn get_block(&self, id: BlockId) -> SyncResult<Vec<u8>> {
        self.blocks
            .read()
            .get(&id)
            .cloned()
            .ok_or(SyncError::LocalBlockMiss { id })
    }

    fn set_clean_block(&self, access: &BlockAccess, block: Vec<u8>) {
        self.blocks.write().insert(access.id, block);
        self.dirty.write().remove(&access.id);
    }

    fn set_dirty_block(&self, access: &BlockAccess, block: Vec<u8>) {
        self.blocks.write().insert(access.id, block);
        self.dirty.write().insert(access.id);
    }

    fn is_dirty_block(&self, id: BlockId) -> bool {
        self.dirty.read().contains(&id)
    }

    fn mark_block_clean(&self, id: BlockId) {
        self.dirty.write().remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealfs_types::{DeviceId, LocalFolderManifest, Timestamp};

    #[test]
    fn manifest_miss_then_hit() {
        let storage = MemoryStorage::new();
        let id = EntryId::generate();
        assert!(matches!(
            storage.get_manifest(id),
            Err(SyncError::LocalManifestMiss { .. })
        ));

        let manifest = LocalFolderManifest::new_placeholder(
            id,
            DeviceId::new("alice@laptop"),
            Timestamp::from_millis(0),
        );
        storage.set_manifest(id, manifest.clone().into());
        assert_eq!(storage.get_manifest(id).unwrap(), manifest.into());
    }

    #[test]
    fn dirty_block_lifecycle() {
        let storage = MemoryStorage::new();
        let access = BlockAccess::for_content(b"data");
        storage.set_dirty_block(&access, b"data".to_vec());
        assert!(storage.is_dirty_block(access.id));
        assert_eq!(storage.get_block(access.id).unwrap(), b"data");

        storage.mark_block_clean(access.id);
        assert!(!storage.is_dirty_block(access.id));
        assert!(storage.contains_block(access.id));
    }
}
