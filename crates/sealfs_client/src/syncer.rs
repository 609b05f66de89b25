//! Recursive folder/file synchronization.
//!
//! The syncer drives the optimistic-concurrency protocol against the
//! versioned object store: read the local manifest, push a new version with
//! an expected version number, and on a lost race fetch the winning version,
//! three-way merge, and retry. After a push is accepted the *live* local
//! manifest (which may have mutated during the round trip) is reconciled
//! with the accepted version under the entry's exclusive lock.
//!
//! Children are synced depth-first before their parent, so a pushed folder
//! manifest only ever references children that are stable remote objects.
//! Placeholders that appeared after the sync started are stripped from the
//! pushed snapshot and stay dirty for the next cycle.

use crate::backend::{BlockClient, DeviceDirectory, VlobClient};
use crate::config::SyncerConfig;
use crate::error::{SyncError, SyncResult};
use crate::events::{EventBus, SyncEvent};
use crate::loader::RemoteLoader;
use crate::locks::EntryLocks;
use crate::merge::{merge_local_folder_manifests, merge_remote_folder_manifests};
use crate::storage::LocalStorage;
use parking_lot::RwLock;
use sealfs_types::{
    seal_and_sign, DeviceId, EntryId, LocalFileManifest, LocalFolderManifest, LocalManifest,
    ManifestAccess, RemoteFileManifest, RemoteFolderManifest, RemoteManifest, SigningKey,
    Timestamp, Version,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Which children of a folder to sync before the folder itself.
#[derive(Debug, Clone)]
pub enum Recursion {
    /// Apply uniformly to all children.
    All(bool),
    /// Only the named children, each synced recursively.
    Children(BTreeSet<String>),
    /// Per-child recursion flags.
    ///
    /// Needed when an entry's parent chain contains placeholders: the chain
    /// must be pushed bottom-up with only some children descended into.
    PerChild(BTreeMap<String, bool>),
}

impl Recursion {
    /// Returns true if any child is selected.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::All(enabled) => *enabled,
            Self::Children(names) => !names.is_empty(),
            Self::PerChild(flags) => !flags.is_empty(),
        }
    }

    fn selects(&self, name: &str) -> bool {
        match self {
            Self::All(enabled) => *enabled,
            Self::Children(names) => names.contains(name),
            Self::PerChild(flags) => flags.contains_key(name),
        }
    }

    fn child_recursion(&self, name: &str) -> Recursion {
        match self {
            Self::All(enabled) => Self::All(*enabled),
            Self::Children(_) => Self::All(true),
            Self::PerChild(flags) => Self::All(flags.get(name).copied().unwrap_or(false)),
        }
    }
}

/// Per-entry position in the sync cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No sync needed; matches the last known remote version.
    Clean,
    /// Local changes pending.
    Dirty,
    /// Upload or creation in flight.
    Pushing,
    /// Lost a version race; merging with the winning version.
    ConflictResolving,
    /// Push accepted; folding in edits made during the round trip.
    Reconciling,
}

/// Partial-success report of a recursive sync pass.
///
/// A failure on one entry does not abort its siblings; each failed entry is
/// reported with its own error.
#[derive(Debug, Default)]
pub struct SyncOutcome {
    /// Entries synced in this pass, as `(path, entry id)`.
    pub synced: Vec<(String, EntryId)>,
    /// Entries that failed, as `(path, error)`.
    pub failed: Vec<(String, SyncError)>,
}

impl SyncOutcome {
    /// Returns true if no entry failed.
    #[must_use]
    pub fn is_full_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn absorb(&mut self, other: SyncOutcome) {
        self.synced.extend(other.synced);
        self.failed.extend(other.failed);
    }
}

type BoxedSyncFuture<'a> = Pin<Box<dyn Future<Output = SyncResult<SyncOutcome>> + Send + 'a>>;

/// Orchestrates recursive synchronization of an entry tree.
pub struct Syncer<V, B, D, S> {
    device_id: DeviceId,
    signing_key: SigningKey,
    vlobs: Arc<V>,
    blocks: Arc<B>,
    storage: Arc<S>,
    loader: RemoteLoader<V, B, D, S>,
    locks: EntryLocks,
    events: EventBus,
    states: RwLock<HashMap<EntryId, SyncState>>,
    remote_heads: RwLock<HashMap<EntryId, Version>>,
    cancelled: AtomicBool,
}

impl<V, B, D, S> Syncer<V, B, D, S>
where
    V: VlobClient,
    B: BlockClient,
    D: DeviceDirectory,
    S: LocalStorage,
{
    /// Creates a syncer over the given collaborators.
    pub fn new(
        config: SyncerConfig,
        signing_key: SigningKey,
        vlobs: Arc<V>,
        blocks: Arc<B>,
        devices: Arc<D>,
        storage: Arc<S>,
    ) -> Self {
        let loader = RemoteLoader::new(
            Arc::clone(&vlobs),
            Arc::clone(&blocks),
            devices,
            Arc::clone(&storage),
        );
        Self {
            device_id: config.device_id,
            signing_key,
            vlobs,
            blocks,
            storage,
            loader,
            locks: EntryLocks::new(),
            events: EventBus::new(config.event_buffer),
            states: RwLock::new(HashMap::new()),
            remote_heads: RwLock::new(HashMap::new()),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Returns the remote loader, for direct block/manifest fetches.
    pub fn loader(&self) -> &RemoteLoader<V, B, D, S> {
        &self.loader
    }

    /// Returns the event bus carrying entry-synced notifications.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Returns an entry's last observed sync state.
    pub fn state_of(&self, id: EntryId) -> SyncState {
        self.states.read().get(&id).copied().unwrap_or(SyncState::Clean)
    }

    /// Requests cancellation; the sync stops at the next suspension point.
    ///
    /// Cancellation before a push is accepted leaves local and remote state
    /// untouched. Cancellation after an accepted push is still committed
    /// remotely; the next sync simply re-fetches and reconciles.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Clears a previous cancellation request.
    pub fn reset_cancel(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    /// Records the remote head version of an entry.
    ///
    /// Fed by this syncer's own reads and pushes, and by external change
    /// monitors. A clean entry whose recorded head equals its base version
    /// is synced without any network call.
    pub fn note_remote_head(&self, id: EntryId, version: Version) {
        self.remote_heads.write().insert(id, version);
    }

    /// Synchronizes one entry, recursing into children as requested.
    ///
    /// Children are synced before the entry itself. Failures of individual
    /// children are collected in the returned [`SyncOutcome`] rather than
    /// aborting the pass; only cancellation stops it.
    pub async fn sync_entry(
        &self,
        path: &str,
        access: &ManifestAccess,
        recursion: Recursion,
    ) -> SyncResult<SyncOutcome> {
        self.sync_entry_boxed(path.to_owned(), access.clone(), recursion)
            .await
    }

    fn sync_entry_boxed(
        &self,
        path: String,
        access: ManifestAccess,
        recursion: Recursion,
    ) -> BoxedSyncFuture<'_> {
        Box::pin(async move {
            self.check_cancelled()?;
            let manifest = match self.storage.get_manifest(access.id) {
                Ok(manifest) => manifest,
                // Referenced by a parent but never loaded on this device:
                // fall back to the remote loader.
                Err(SyncError::LocalManifestMiss { .. }) => {
                    let loaded = self.loader.load_manifest(&access).await?;
                    let _guard = self.locks.acquire(access.id).await;
                    match self.storage.get_manifest(access.id) {
                        Ok(existing) => existing,
                        Err(_) => {
                            self.storage.set_manifest(access.id, loaded.clone());
                            loaded
                        }
                    }
                }
                Err(e) => return Err(e),
            };
            match manifest {
                LocalManifest::Folder(_) => self.sync_folder(&path, &access, recursion).await,
                LocalManifest::File(_) => {
                    let mut outcome = SyncOutcome::default();
                    self.sync_file(&path, &access).await?;
                    outcome.synced.push((path, access.id));
                    Ok(outcome)
                }
            }
        })
    }

    fn check_cancelled(&self) -> SyncResult<()> {
        if self.cancelled.load(Ordering::SeqCst) {
            Err(SyncError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn set_state(&self, id: EntryId, state: SyncState) {
        trace!(entry = %id, ?state, "sync state");
        self.states.write().insert(id, state);
    }

    fn known_remote_head(&self, id: EntryId) -> Option<Version> {
        self.remote_heads.read().get(&id).copied()
    }

    async fn sync_folder(
        &self,
        path: &str,
        access: &ManifestAccess,
        recursion: Recursion,
    ) -> SyncResult<SyncOutcome> {
        let mut outcome = SyncOutcome::default();

        // Children first, depth-first: once the folder itself is pushed it
        // must only reference already-synced children.
        if recursion.is_enabled() {
            let snapshot = self.folder_manifest(access.id)?;
            let selected: Vec<(String, ManifestAccess)> = snapshot
                .children
                .iter()
                .filter(|(name, _)| recursion.selects(name))
                .map(|(name, child)| (name.clone(), child.clone()))
                .collect();
            for (name, child_access) in selected {
                let child_path = join_path(path, &name);
                let child_recursion = recursion.child_recursion(&name);
                match self
                    .sync_entry_boxed(child_path.clone(), child_access, child_recursion)
                    .await
                {
                    Ok(child_outcome) => outcome.absorb(child_outcome),
                    Err(SyncError::Cancelled) => return Err(SyncError::Cancelled),
                    Err(e) => {
                        warn!(path = %child_path, error = %e, "child sync failed");
                        outcome.failed.push((child_path, e));
                    }
                }
            }
        }

        // Snapshot the live manifest and strip out placeholder children:
        // they were created after this sync started and are not yet safe to
        // publish. They stay locally dirty for the next cycle. A child with
        // no cached manifest is remote-known and kept.
        self.check_cancelled()?;
        let mut base_manifest = self.folder_manifest(access.id)?;
        base_manifest
            .children
            .retain(|_, child| match self.storage.get_manifest(child.id) {
                Ok(manifest) => !manifest.is_placeholder(),
                Err(_) => true,
            });

        let target_remote = if base_manifest.need_sync {
            self.set_state(access.id, SyncState::Dirty);
            Some(self.push_folder(access, &base_manifest).await?)
        } else {
            self.look_for_remote_changes(access, &base_manifest).await?
        };
        let Some(target_remote) = target_remote else {
            trace!(path, "folder already in sync");
            self.set_state(access.id, SyncState::Clean);
            return Ok(outcome);
        };

        // Reconcile with the live manifest, which may have been modified
        // while the push was in flight. Cache writes happen only under the
        // entry's exclusive lock.
        self.set_state(access.id, SyncState::Reconciling);
        let still_dirty;
        {
            let _guard = self.locks.acquire(access.id).await;
            let current = self.folder_manifest(access.id)?;
            let target_local = remote_folder_to_local(target_remote.clone());
            let merged = merge_local_folder_manifests(&base_manifest, &current, &target_local);
            still_dirty = merged.need_sync;
            self.storage
                .set_base_manifest(access.id, RemoteManifest::Folder(target_remote.clone()));
            self.storage.set_manifest(access.id, merged.into());
        }
        self.note_remote_head(access.id, target_remote.version);
        self.set_state(
            access.id,
            if still_dirty {
                SyncState::Dirty
            } else {
                SyncState::Clean
            },
        );
        self.events.publish(SyncEvent::EntrySynced {
            path: path.to_owned(),
            entry_id: access.id,
        });
        outcome.synced.push((path.to_owned(), access.id));
        Ok(outcome)
    }

    /// Download-only path for a clean folder.
    ///
    /// Returns `None` when the remote head equals the local base version.
    /// When the recorded head already matches, not even a read is issued.
    async fn look_for_remote_changes(
        &self,
        access: &ManifestAccess,
        manifest: &LocalFolderManifest,
    ) -> SyncResult<Option<RemoteFolderManifest>> {
        debug_assert!(!manifest.is_placeholder());
        if self.known_remote_head(access.id) == Some(manifest.base_version) {
            return Ok(None);
        }
        let remote = self.loader.load_remote_manifest(access, None).await?;
        self.note_remote_head(access.id, remote.version());
        if remote.version() == manifest.base_version {
            return Ok(None);
        }
        debug!(
            entry = %access.id,
            local = %manifest.base_version,
            remote = %remote.version(),
            "remote moved ahead, downloading"
        );
        match remote {
            RemoteManifest::Folder(folder) => Ok(Some(folder)),
            RemoteManifest::File(_) => Err(SyncError::UnexpectedKind {
                id: access.id,
                expected: "folder",
            }),
        }
    }

    /// Pushes a dirty folder, driving the merge-and-retry loop.
    ///
    /// The loop has no iteration cap: every retry targets a strictly higher
    /// version, so it terminates once concurrent writers quiesce. Under a
    /// pathological write storm it is theoretically unbounded.
    async fn push_folder(
        &self,
        access: &ManifestAccess,
        base_manifest: &LocalFolderManifest,
    ) -> SyncResult<RemoteFolderManifest> {
        let is_placeholder = base_manifest.is_placeholder();
        self.set_state(access.id, SyncState::Pushing);
        let mut to_sync = RemoteFolderManifest {
            id: access.id,
            author: self.device_id.clone(),
            timestamp: Timestamp::now(),
            version: base_manifest.base_version.next(),
            children: base_manifest.children.clone(),
        };

        loop {
            self.check_cancelled()?;
            let payload = RemoteManifest::Folder(to_sync.clone()).encode()?;
            let blob = seal_and_sign(&self.signing_key, &access.key, &payload)
                .map_err(|e| SyncError::integrity(format!("sealing manifest {}: {e}", access.id)))?;
            let pushed = if is_placeholder {
                self.vlobs
                    .vlob_create(access.id, to_sync.timestamp, blob)
                    .await
            } else {
                self.vlobs
                    .vlob_update(access.id, to_sync.version, to_sync.timestamp, blob)
                    .await
            };
            match pushed {
                Ok(()) => {
                    debug!(entry = %access.id, version = %to_sync.version, "push accepted");
                    self.note_remote_head(access.id, to_sync.version);
                    return Ok(to_sync);
                }
                // A placeholder has no previous remote version, so no
                // optimistic conflict is possible on its first push.
                Err(SyncError::VersionConflict { .. }) if !is_placeholder => {
                    self.set_state(access.id, SyncState::ConflictResolving);
                    debug!(entry = %access.id, version = %to_sync.version, "push lost version race");
                    let base = self.load_merge_base(access, to_sync.version.prev()).await;
                    let target = self.loader.load_remote_manifest(access, None).await?;
                    self.note_remote_head(access.id, target.version());
                    let RemoteManifest::Folder(target) = target else {
                        return Err(SyncError::UnexpectedKind {
                            id: access.id,
                            expected: "folder",
                        });
                    };
                    let (merged, sync_needed) =
                        merge_remote_folder_manifests(base.as_ref(), &to_sync, &target);
                    if !sync_needed {
                        // The winning writer already made our change, e.g.
                        // both sides deleted the same entry.
                        debug!(entry = %access.id, "conflict resolved without retry");
                        return Ok(target);
                    }
                    to_sync = merged;
                    self.set_state(access.id, SyncState::Pushing);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Fetches the merge base for a lost version race.
    ///
    /// The locally cached base manifest is preferred; otherwise the exact
    /// version is fetched remotely. An irretrievable base degrades the merge
    /// to a two-way union, which never drops entries but cannot propagate
    /// deletions.
    async fn load_merge_base(
        &self,
        access: &ManifestAccess,
        version: Option<Version>,
    ) -> Option<RemoteFolderManifest> {
        let version = version.filter(|v| !v.is_placeholder())?;
        if let Ok(RemoteManifest::Folder(folder)) = self.storage.get_base_manifest(access.id) {
            if folder.version == version {
                return Some(folder);
            }
        }
        match self.loader.load_remote_manifest(access, Some(version)).await {
            Ok(RemoteManifest::Folder(folder)) => Some(folder),
            Ok(RemoteManifest::File(_)) => None,
            Err(e) => {
                debug!(entry = %access.id, %version, error = %e, "merge base unavailable");
                None
            }
        }
    }

    /// Synchronizes a file entry.
    ///
    /// Dirty blocks are uploaded before the manifest. Files have no child
    /// map to union, so a lost version race adopts the winning version as
    /// the new base and keeps the local content pending for the next cycle.
    async fn sync_file(&self, path: &str, access: &ManifestAccess) -> SyncResult<()> {
        self.check_cancelled()?;
        let base_manifest = self.file_manifest(access.id)?;

        if !base_manifest.need_sync {
            return self.download_file_changes(path, access, &base_manifest).await;
        }

        self.set_state(access.id, SyncState::Dirty);
        // Blocks are immutable and write-once: upload every block written
        // locally since the last push, then reclassify it as clean.
        for block in &base_manifest.blocks {
            if !self.storage.is_dirty_block(block.id) {
                continue;
            }
            self.check_cancelled()?;
            let plaintext = self.storage.get_block(block.id)?;
            let ciphertext = block
                .key
                .encrypt(&plaintext)
                .map_err(|e| SyncError::integrity(format!("sealing block {}: {e}", block.id)))?;
            match self.blocks.block_post(block.id, ciphertext).await {
                Ok(()) => {}
                // A previous attempt uploaded this block but was interrupted
                // before reclassifying it; the id is ours and blocks are
                // immutable, so the upload already stands.
                Err(SyncError::BlockAlreadyExists { .. }) => {
                    debug!(block = %block.id, "block already uploaded, reclassifying");
                }
                Err(e) => return Err(e),
            }
            self.storage.mark_block_clean(block.id);
        }

        let is_placeholder = base_manifest.is_placeholder();
        self.set_state(access.id, SyncState::Pushing);
        let to_sync = RemoteFileManifest {
            id: access.id,
            author: self.device_id.clone(),
            timestamp: Timestamp::now(),
            version: base_manifest.base_version.next(),
            size: base_manifest.size,
            blocks: base_manifest.blocks.clone(),
        };

        self.check_cancelled()?;
        let payload = RemoteManifest::File(to_sync.clone()).encode()?;
        let blob = seal_and_sign(&self.signing_key, &access.key, &payload)
            .map_err(|e| SyncError::integrity(format!("sealing manifest {}: {e}", access.id)))?;
        let pushed = if is_placeholder {
            self.vlobs
                .vlob_create(access.id, to_sync.timestamp, blob)
                .await
        } else {
            self.vlobs
                .vlob_update(access.id, to_sync.version, to_sync.timestamp, blob)
                .await
        };

        let accepted = match pushed {
            Ok(()) => {
                self.note_remote_head(access.id, to_sync.version);
                to_sync
            }
            Err(SyncError::VersionConflict { .. }) if !is_placeholder => {
                self.set_state(access.id, SyncState::ConflictResolving);
                debug!(entry = %access.id, "file push lost version race, adopting remote head");
                let target = self.loader.load_remote_manifest(access, None).await?;
                self.note_remote_head(access.id, target.version());
                let RemoteManifest::File(target) = target else {
                    return Err(SyncError::UnexpectedKind {
                        id: access.id,
                        expected: "file",
                    });
                };
                self.reconcile_file(path, access, &base_manifest, target, true)
                    .await?;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        self.reconcile_file(path, access, &base_manifest, accepted, false)
            .await
    }

    /// Download-only path for a clean file.
    async fn download_file_changes(
        &self,
        path: &str,
        access: &ManifestAccess,
        manifest: &LocalFileManifest,
    ) -> SyncResult<()> {
        debug_assert!(!manifest.is_placeholder());
        if self.known_remote_head(access.id) == Some(manifest.base_version) {
            return Ok(());
        }
        let remote = self.loader.load_remote_manifest(access, None).await?;
        self.note_remote_head(access.id, remote.version());
        if remote.version() == manifest.base_version {
            return Ok(());
        }
        {
            let _guard = self.locks.acquire(access.id).await;
            let live = self.storage.get_manifest(access.id)?;
            if live.need_sync() {
                // Mutated while we were reading; the next cycle pushes and
                // reconciles instead of clobbering the edit here.
                return Ok(());
            }
            self.storage.set_base_manifest(access.id, remote.clone());
            self.storage.set_manifest(access.id, remote.into_local());
        }
        self.set_state(access.id, SyncState::Clean);
        self.events.publish(SyncEvent::EntrySynced {
            path: path.to_owned(),
            entry_id: access.id,
        });
        Ok(())
    }

    /// Writes a file's post-sync manifest under the entry lock.
    ///
    /// With `lost_race` the remote `result` is a concurrent writer's version
    /// and the local content stays pending; otherwise `result` is our own
    /// accepted push and the file is clean unless it was edited during the
    /// round trip.
    async fn reconcile_file(
        &self,
        path: &str,
        access: &ManifestAccess,
        base_manifest: &LocalFileManifest,
        result: RemoteFileManifest,
        lost_race: bool,
    ) -> SyncResult<()> {
        self.set_state(access.id, SyncState::Reconciling);
        let still_dirty;
        {
            let _guard = self.locks.acquire(access.id).await;
            let live = self.file_manifest(access.id)?;
            let edited_during_sync =
                live.blocks != base_manifest.blocks || live.size != base_manifest.size;
            let keeps_local_content = lost_race || edited_during_sync;
            still_dirty = if lost_race {
                live.blocks != result.blocks || live.size != result.size
            } else {
                edited_during_sync
            };
            let merged = LocalFileManifest {
                id: access.id,
                author: if keeps_local_content {
                    live.author.clone()
                } else {
                    result.author.clone()
                },
                timestamp: if keeps_local_content {
                    live.timestamp
                } else {
                    result.timestamp
                },
                base_version: result.version,
                need_sync: still_dirty,
                size: if keeps_local_content { live.size } else { result.size },
                blocks: if keeps_local_content {
                    live.blocks.clone()
                } else {
                    result.blocks.clone()
                },
            };
            self.storage
                .set_base_manifest(access.id, RemoteManifest::File(result));
            self.storage.set_manifest(access.id, merged.into());
        }
        self.set_state(
            access.id,
            if still_dirty {
                SyncState::Dirty
            } else {
                SyncState::Clean
            },
        );
        self.events.publish(SyncEvent::EntrySynced {
            path: path.to_owned(),
            entry_id: access.id,
        });
        Ok(())
    }

    fn folder_manifest(&self, id: EntryId) -> SyncResult<LocalFolderManifest> {
        match self.storage.get_manifest(id)? {
            LocalManifest::Folder(folder) => Ok(folder),
            LocalManifest::File(_) => Err(SyncError::UnexpectedKind {
                id,
                expected: "folder",
            }),
        }
    }

    fn file_manifest(&self, id: EntryId) -> SyncResult<LocalFileManifest> {
        match self.storage.get_manifest(id)? {
            LocalManifest::File(file) => Ok(file),
            LocalManifest::Folder(_) => Err(SyncError::UnexpectedKind {
                id,
                expected: "file",
            }),
        }
    }
}

fn remote_folder_to_local(remote: RemoteFolderManifest) -> LocalFolderManifest {
    match RemoteManifest::Folder(remote).into_local() {
        LocalManifest::Folder(folder) => folder,
        LocalManifest::File(_) => unreachable!("folder hydrates to folder"),
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{parent}{name}")
    } else {
        format!("{parent}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recursion_all() {
        let r = Recursion::All(true);
        assert!(r.is_enabled());
        assert!(r.selects("anything"));
        assert!(matches!(r.child_recursion("x"), Recursion::All(true)));

        let r = Recursion::All(false);
        assert!(!r.is_enabled());
    }

    #[test]
    fn recursion_subset() {
        let r = Recursion::Children(["a".to_owned()].into());
        assert!(r.is_enabled());
        assert!(r.selects("a"));
        assert!(!r.selects("b"));
        // Explicitly listed children are descended into fully.
        assert!(matches!(r.child_recursion("a"), Recursion::All(true)));
    }

    #[test]
    fn recursion_per_child() {
        let r = Recursion::PerChild([("a".to_owned(), false), ("b".to_owned(), true)].into());
        assert!(r.selects("a"));
        assert!(!r.selects("c"));
        assert!(matches!(r.child_recursion("a"), Recursion::All(false)));
        assert!(matches!(r.child_recursion("b"), Recursion::All(true)));
    }

    #[test]
    fn join_paths() {
        assert_eq!(join_path("/", "docs"), "/docs");
        assert_eq!(join_path("/docs", "notes.txt"), "/docs/notes.txt");
    }

    #[test]
    fn outcome_absorb() {
        let mut outcome = SyncOutcome::default();
        assert!(outcome.is_full_success());
        let mut child = SyncOutcome::default();
        child.synced.push(("/a".to_owned(), EntryId::generate()));
        child
            .failed
            .push(("/b".to_owned(), SyncError::Cancelled));
        outcome.absorb(child);
        assert_eq!(outcome.synced.len(), 1);
        assert!(!outcome.is_full_success());
    }
}
