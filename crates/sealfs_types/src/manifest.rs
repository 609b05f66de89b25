//! Local and remote manifest variants.
//!
//! A *remote* manifest is the authoritative snapshot stored in the versioned
//! object store: signed by its author and stamped with a monotonic version.
//! A *local* manifest is the same content hydrated for one device, augmented
//! with `base_version` (the remote version it derives from) and `need_sync`
//! (local changes not yet pushed).
//!
//! Children maps are `BTreeMap` so CBOR encoding is deterministic: the same
//! manifest always serializes to the same bytes regardless of insertion
//! order.

use crate::access::{BlockAccess, ManifestAccess};
use crate::error::{CodecError, CodecResult};
use crate::types::{DeviceId, EntryId, Timestamp, Version};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Authoritative remote snapshot of a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFolderManifest {
    /// Stable entry identity, must match the access used to fetch it.
    pub id: EntryId,
    /// Device that authored this version.
    pub author: DeviceId,
    /// Authoring time, covered by the signature.
    pub timestamp: Timestamp,
    /// Version assigned by the remote store, starts at 1.
    pub version: Version,
    /// Child name to access descriptor, names unique.
    pub children: BTreeMap<String, ManifestAccess>,
}

/// Authoritative remote snapshot of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFileManifest {
    /// Stable entry identity, must match the access used to fetch it.
    pub id: EntryId,
    /// Device that authored this version.
    pub author: DeviceId,
    /// Authoring time, covered by the signature.
    pub timestamp: Timestamp,
    /// Version assigned by the remote store, starts at 1.
    pub version: Version,
    /// Total plaintext size in bytes.
    pub size: u64,
    /// Content blocks, in file order.
    pub blocks: Vec<BlockAccess>,
}

/// A remote manifest of either kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteManifest {
    /// A file snapshot.
    File(RemoteFileManifest),
    /// A folder snapshot.
    Folder(RemoteFolderManifest),
}

impl RemoteManifest {
    /// Returns the entry id.
    #[must_use]
    pub fn id(&self) -> EntryId {
        match self {
            Self::File(m) => m.id,
            Self::Folder(m) => m.id,
        }
    }

    /// Returns the remote version.
    #[must_use]
    pub fn version(&self) -> Version {
        match self {
            Self::File(m) => m.version,
            Self::Folder(m) => m.version,
        }
    }

    /// Returns the authoring device.
    #[must_use]
    pub fn author(&self) -> &DeviceId {
        match self {
            Self::File(m) => &m.author,
            Self::Folder(m) => &m.author,
        }
    }

    /// Returns the authoring timestamp.
    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        match self {
            Self::File(m) => m.timestamp,
            Self::Folder(m) => m.timestamp,
        }
    }

    /// Encodes to CBOR.
    pub fn encode(&self) -> CodecResult<Vec<u8>> {
        let mut out = Vec::new();
        ciborium::into_writer(self, &mut out).map_err(|e| CodecError::Encode(e.to_string()))?;
        Ok(out)
    }

    /// Decodes from CBOR.
    pub fn decode(bytes: &[u8]) -> CodecResult<Self> {
        ciborium::from_reader(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }

    /// Hydrates this remote snapshot into the device-local view.
    ///
    /// The local copy derives from this exact remote version, so
    /// `base_version` is set to it and `need_sync` is false.
    #[must_use]
    pub fn into_local(self) -> LocalManifest {
        match self {
            Self::File(m) => LocalManifest::File(LocalFileManifest {
                id: m.id,
                author: m.author,
                timestamp: m.timestamp,
                base_version: m.version,
                need_sync: false,
                size: m.size,
                blocks: m.blocks,
            }),
            Self::Folder(m) => LocalManifest::Folder(LocalFolderManifest {
                id: m.id,
                author: m.author,
                timestamp: m.timestamp,
                base_version: m.version,
                need_sync: false,
                children: m.children,
            }),
        }
    }
}

/// Device-local view of a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFolderManifest {
    /// Stable entry identity.
    pub id: EntryId,
    /// Last device to modify this copy.
    pub author: DeviceId,
    /// Last modification time.
    pub timestamp: Timestamp,
    /// Remote version this copy derives from; 0 for a placeholder.
    pub base_version: Version,
    /// True when local changes have not been pushed yet.
    pub need_sync: bool,
    /// Child name to access descriptor, names unique.
    pub children: BTreeMap<String, ManifestAccess>,
}

impl LocalFolderManifest {
    /// Creates a placeholder folder: never pushed, empty, dirty.
    #[must_use]
    pub fn new_placeholder(id: EntryId, author: DeviceId, timestamp: Timestamp) -> Self {
        Self {
            id,
            author,
            timestamp,
            base_version: Version::PLACEHOLDER,
            need_sync: true,
            children: BTreeMap::new(),
        }
    }

    /// Returns true if this folder has never been pushed.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.base_version.is_placeholder()
    }

    /// Inserts (or replaces) a child and marks the folder dirty.
    pub fn insert_child(&mut self, name: impl Into<String>, access: ManifestAccess) {
        self.children.insert(name.into(), access);
        self.need_sync = true;
    }

    /// Removes a child and marks the folder dirty.
    ///
    /// Returns the removed access, if the name was present.
    pub fn remove_child(&mut self, name: &str) -> Option<ManifestAccess> {
        let removed = self.children.remove(name);
        if removed.is_some() {
            self.need_sync = true;
        }
        removed
    }
}

/// Device-local view of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFileManifest {
    /// Stable entry identity.
    pub id: EntryId,
    /// Last device to modify this copy.
    pub author: DeviceId,
    /// Last modification time.
    pub timestamp: Timestamp,
    /// Remote version this copy derives from; 0 for a placeholder.
    pub base_version: Version,
    /// True when local changes have not been pushed yet.
    pub need_sync: bool,
    /// Total plaintext size in bytes.
    pub size: u64,
    /// Content blocks, in file order.
    pub blocks: Vec<BlockAccess>,
}

impl LocalFileManifest {
    /// Creates a placeholder file: never pushed, empty, dirty.
    #[must_use]
    pub fn new_placeholder(id: EntryId, author: DeviceId, timestamp: Timestamp) -> Self {
        Self {
            id,
            author,
            timestamp,
            base_version: Version::PLACEHOLDER,
            need_sync: true,
            size: 0,
            blocks: Vec::new(),
        }
    }

    /// Returns true if this file has never been pushed.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.base_version.is_placeholder()
    }
}

/// A local manifest of either kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocalManifest {
    /// A file view.
    File(LocalFileManifest),
    /// A folder view.
    Folder(LocalFolderManifest),
}

impl LocalManifest {
    /// Returns the entry id.
    #[must_use]
    pub fn id(&self) -> EntryId {
        match self {
            Self::File(m) => m.id,
            Self::Folder(m) => m.id,
        }
    }

    /// Returns the remote version this copy derives from.
    #[must_use]
    pub fn base_version(&self) -> Version {
        match self {
            Self::File(m) => m.base_version,
            Self::Folder(m) => m.base_version,
        }
    }

    /// Returns true when local changes have not been pushed yet.
    #[must_use]
    pub fn need_sync(&self) -> bool {
        match self {
            Self::File(m) => m.need_sync,
            Self::Folder(m) => m.need_sync,
        }
    }

    /// Returns true if this entry has never been pushed.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.base_version().is_placeholder()
    }

    /// Returns the folder view, if this is a folder.
    #[must_use]
    pub fn as_folder(&self) -> Option<&LocalFolderManifest> {
        match self {
            Self::Folder(m) => Some(m),
            Self::File(_) => None,
        }
    }

    /// Returns the file view, if this is a file.
    #[must_use]
    pub fn as_file(&self) -> Option<&LocalFileManifest> {
        match self {
            Self::File(m) => Some(m),
            Self::Folder(_) => None,
        }
    }

    /// Dehydrates this local view into a remote snapshot.
    ///
    /// The resulting version is `base_version`; a caller pushing a new
    /// version bumps it before upload.
    #[must_use]
    pub fn to_remote(&self) -> RemoteManifest {
        match self {
            Self::File(m) => RemoteManifest::File(RemoteFileManifest {
                id: m.id,
                author: m.author.clone(),
                timestamp: m.timestamp,
                version: m.base_version,
                size: m.size,
                blocks: m.blocks.clone(),
            }),
            Self::Folder(m) => RemoteManifest::Folder(RemoteFolderManifest {
                id: m.id,
                author: m.author.clone(),
                timestamp: m.timestamp,
                version: m.base_version,
                children: m.children.clone(),
            }),
        }
    }
}

impl From<LocalFolderManifest> for LocalManifest {
    fn from(m: LocalFolderManifest) -> Self {
        Self::Folder(m)
    }
}

impl From<LocalFileManifest> for LocalManifest {
    fn from(m: LocalFileManifest) -> Self {
        Self::File(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(version: u64) -> RemoteFolderManifest {
        let mut children = BTreeMap::new();
        children.insert("notes.txt".to_owned(), ManifestAccess::generate());
        children.insert("photos".to_owned(), ManifestAccess::generate());
        RemoteFolderManifest {
            id: EntryId::generate(),
            author: DeviceId::new("alice@laptop"),
            timestamp: Timestamp::from_millis(1_700_000_000_000),
            version: Version::new(version),
            children,
        }
    }

    #[test]
    fn encode_decode_round_trip() {
        let manifest = RemoteManifest::Folder(folder(3));
        let bytes = manifest.encode().unwrap();
        assert_eq!(RemoteManifest::decode(&bytes).unwrap(), manifest);
    }

    #[test]
    fn encoding_is_deterministic() {
        let a = folder(1);
        // Rebuild the children map in reverse insertion order.
        let mut b = a.clone();
        b.children = a.children.iter().rev().map(|(k, v)| (k.clone(), v.clone())).collect();
        assert_eq!(
            RemoteManifest::Folder(a).encode().unwrap(),
            RemoteManifest::Folder(b).encode().unwrap()
        );
    }

    #[test]
    fn hydrate_dehydrate_round_trip() {
        let remote = RemoteManifest::Folder(folder(7));
        let local = remote.clone().into_local();
        assert_eq!(local.base_version(), Version::new(7));
        assert!(!local.need_sync());
        assert_eq!(local.to_remote(), remote);
    }

    #[test]
    fn placeholder_flags() {
        let m = LocalFolderManifest::new_placeholder(
            EntryId::generate(),
            DeviceId::new("bob@phone"),
            Timestamp::from_millis(0),
        );
        assert!(m.is_placeholder());
        assert!(m.need_sync);
        let m = LocalManifest::from(m);
        assert!(m.is_placeholder());
    }

    fn arb_folder() -> impl proptest::strategy::Strategy<Value = RemoteFolderManifest> {
        use proptest::prelude::*;
        (
            prop::collection::btree_map(
                "[a-zA-Z0-9 ._-]{1,16}",
                prop::num::u8::ANY.prop_map(|_| ManifestAccess::generate()),
                0..8,
            ),
            1u64..1_000,
            0i64..4_000_000_000_000,
        )
            .prop_map(|(children, version, millis)| RemoteFolderManifest {
                id: EntryId::generate(),
                author: DeviceId::new("alice@laptop"),
                timestamp: Timestamp::from_millis(millis),
                version: Version::new(version),
                children,
            })
    }

    proptest::proptest! {
        // Any well-formed folder manifest survives the codec and the
        // hydrate/dehydrate pair unchanged.
        #[test]
        fn codec_and_hydration_preserve_arbitrary_folders(folder in arb_folder()) {
            use proptest::prelude::*;
            let manifest = RemoteManifest::Folder(folder);
            let bytes = manifest.encode().unwrap();
            prop_assert_eq!(RemoteManifest::decode(&bytes).unwrap(), manifest.clone());

            let local = manifest.clone().into_local();
            prop_assert!(!local.need_sync());
            prop_assert_eq!(local.to_remote(), manifest);
        }
    }

    #[test]
    fn child_mutation_marks_dirty() {
        let remote = RemoteManifest::Folder(folder(1));
        let LocalManifest::Folder(mut local) = remote.into_local() else {
            panic!("expected folder");
        };
        assert!(!local.need_sync);
        local.insert_child("new.txt", ManifestAccess::generate());
        assert!(local.need_sync);
        local.need_sync = false;
        assert!(local.remove_child("new.txt").is_some());
        assert!(local.need_sync);
        local.need_sync = false;
        assert!(local.remove_child("missing").is_none());
        assert!(!local.need_sync);
    }
}
