//! Access descriptors: what is needed to locate and unlock a remote object.

use crate::crypto::{Digest, SecretKey};
use crate::types::{BlockId, EntryId};
use serde::{Deserialize, Serialize};

/// Access descriptor for a versioned manifest object.
///
/// Owning an access means being able to fetch and decrypt every version of
/// the entry it points at. Accesses are stored in folder manifests' children
/// maps; an access no manifest references is orphaned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestAccess {
    /// Stable entry identity.
    pub id: EntryId,
    /// Symmetric key sealing every version of this entry.
    pub key: SecretKey,
}

impl ManifestAccess {
    /// Creates an access for a freshly created entry, with a new id and key.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            id: EntryId::generate(),
            key: SecretKey::generate(),
        }
    }
}

/// Access descriptor for an immutable content block.
///
/// Unlike manifests, blocks carry a digest of their plaintext: the block
/// store is content-addressed and write-once, so the digest pins the exact
/// bytes the access was created for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockAccess {
    /// Block identity in the block store.
    pub id: BlockId,
    /// Symmetric key sealing the block content.
    pub key: SecretKey,
    /// SHA-256 digest of the plaintext.
    pub digest: Digest,
    /// Plaintext size in bytes.
    pub size: u64,
}

impl BlockAccess {
    /// Creates an access for new block content, with a fresh id and key.
    #[must_use]
    pub fn for_content(content: &[u8]) -> Self {
        Self {
            id: BlockId::generate(),
            key: SecretKey::generate(),
            digest: Digest::of(content),
            size: content.len() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_access_pins_content() {
        let access = BlockAccess::for_content(b"some data");
        assert_eq!(access.size, 9);
        assert_eq!(access.digest, Digest::of(b"some data"));
        assert_ne!(access.digest, Digest::of(b"other data"));
    }

    #[test]
    fn generated_accesses_are_distinct() {
        let a = ManifestAccess::generate();
        let b = ManifestAccess::generate();
        assert_ne!(a.id, b.id);
        assert_ne!(a.key, b.key);
    }
}
