//! Remote loader: turns encrypted remote bytes into trusted local objects.
//!
//! Nothing fetched from the remote stores is trusted as-is. Blocks must
//! decrypt and match the digest pinned by their access descriptor; manifests
//! must carry a valid signature from a directory-known author and agree with
//! the version/author/id the transport claimed. Anything that fails a check
//! is rejected without touching the local cache.

use crate::backend::{BlockClient, DeviceDirectory, VlobClient};
use crate::error::{SyncError, SyncResult};
use crate::storage::LocalStorage;
use sealfs_types::{
    unseal_and_verify, BlockAccess, Digest, LocalManifest, ManifestAccess, RemoteManifest, Version,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Fetches, decrypts and verifies remote blocks and manifests.
pub struct RemoteLoader<V, B, D, S> {
    vlobs: Arc<V>,
    blocks: Arc<B>,
    devices: Arc<D>,
    storage: Arc<S>,
}

impl<V, B, D, S> RemoteLoader<V, B, D, S>
where
    V: VlobClient,
    B: BlockClient,
    D: DeviceDirectory,
    S: LocalStorage,
{
    /// Creates a loader over the given collaborators.
    pub fn new(vlobs: Arc<V>, blocks: Arc<B>, devices: Arc<D>, storage: Arc<S>) -> Self {
        Self {
            vlobs,
            blocks,
            devices,
            storage,
        }
    }

    /// Loads a block, verifies it against its access descriptor and caches
    /// the plaintext.
    ///
    /// # Errors
    ///
    /// Fails with [`SyncError::Integrity`] on decryption failure or digest
    /// mismatch; the block is not cached in that case. Transport faults
    /// propagate unchanged.
    pub async fn load_block(&self, access: &BlockAccess) -> SyncResult<Vec<u8>> {
        let ciphertext = self.blocks.block_read(access.id).await?;
        let block = access.key.decrypt(&ciphertext).map_err(|_| {
            warn!(block = %access.id, "block decryption failed");
            SyncError::integrity(format!("block {} failed decryption", access.id))
        })?;
        if Digest::of(&block) != access.digest {
            warn!(block = %access.id, "block digest mismatch");
            return Err(SyncError::integrity(format!(
                "block {} digest mismatch",
                access.id
            )));
        }
        self.storage.set_clean_block(access, block.clone());
        Ok(block)
    }

    /// Loads and verifies a remote manifest without caching it.
    ///
    /// Used by the conflict-resolution loop to fetch base and target
    /// versions; pass `None` for the store's head.
    ///
    /// # Errors
    ///
    /// Fails with [`SyncError::Trustchain`] for unknown authors and
    /// [`SyncError::Integrity`] for signature failures or payloads that
    /// disagree with the transport's claims.
    pub async fn load_remote_manifest(
        &self,
        access: &ManifestAccess,
        version: Option<Version>,
    ) -> SyncResult<RemoteManifest> {
        let vlob = self.vlobs.vlob_read(access.id, version).await?;
        let author = self.devices.get_device(&vlob.author).await?;
        let payload =
            unseal_and_verify(&access.key, &author.verify_key, &vlob.blob).map_err(|e| {
                warn!(entry = %access.id, author = %vlob.author, "manifest verification failed");
                SyncError::integrity(format!("manifest {}: {e}", access.id))
            })?;
        let manifest = RemoteManifest::decode(&payload)?;

        // The signed payload is authoritative; the transport's claims must
        // agree with it, and the manifest must be the one we asked for.
        if manifest.version() != vlob.version {
            return Err(SyncError::integrity(format!(
                "manifest {} claims {}, store claims {}",
                access.id,
                manifest.version(),
                vlob.version
            )));
        }
        if manifest.author() != &vlob.author {
            return Err(SyncError::integrity(format!(
                "manifest {} author mismatch",
                access.id
            )));
        }
        if manifest.timestamp() != vlob.timestamp {
            return Err(SyncError::integrity(format!(
                "manifest {} signed at {}, store claims {}",
                access.id,
                manifest.timestamp(),
                vlob.timestamp
            )));
        }
        if manifest.id() != access.id {
            return Err(SyncError::integrity(format!(
                "fetched manifest {} through access {}",
                manifest.id(),
                access.id
            )));
        }
        debug!(entry = %access.id, version = %manifest.version(), "manifest verified");
        Ok(manifest)
    }

    /// Loads the head manifest, records it as the entry's new base and
    /// returns the hydrated local view.
    pub async fn load_manifest(&self, access: &ManifestAccess) -> SyncResult<LocalManifest> {
        let remote = self.load_remote_manifest(access, None).await?;
        self.storage.set_base_manifest(access.id, remote.clone());
        Ok(remote.into_local())
    }
}
