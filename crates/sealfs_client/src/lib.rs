//! # sealfs Client
//!
//! Synchronization and conflict-resolution engine for sealfs.
//!
//! This crate provides:
//! - `RemoteLoader` for fetching, decrypting and verifying remote objects
//! - Pure three-way merge functions for folder manifests
//! - `Syncer` driving the optimistic-concurrency retry loop
//! - Capability traits for the remote stores and the local cache
//! - Per-entry locks and an entry-synced event bus
//!
//! ## Architecture
//!
//! The engine reconciles a local, possibly-stale replica with a remote,
//! versioned, cryptographically-sealed store:
//! 1. Children are synced depth-first, before their parent
//! 2. A dirty manifest is pushed with an expected version; the store's
//!    version gate is the only admission control
//! 3. A version race triggers a remote three-way merge and a retry
//! 4. After a successful push, a local three-way merge folds in edits made
//!    during the round trip
//!
//! ## Key invariants
//!
//! - The remote store is the single authority on version ordering
//! - Remote content is never trusted before signature and digest checks
//! - A placeholder (`base_version == 0`) is only ever created, never updated
//! - The local cache is only mutated under the entry's exclusive lock

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod config;
mod error;
mod events;
mod loader;
mod locks;
mod merge;
mod storage;
mod syncer;

pub use backend::{BlockClient, Device, DeviceDirectory, SignedVlob, VlobClient};
pub use config::SyncerConfig;
pub use error::{SyncError, SyncResult};
pub use events::{EventBus, SyncEvent};
pub use loader::RemoteLoader;
pub use locks::EntryLocks;
pub use merge::{merge_local_folder_manifests, merge_remote_folder_manifests};
pub use storage::{LocalStorage, MemoryStorage};
pub use syncer::{Recursion, SyncOutcome, SyncState, Syncer};
