//! # sealfs Types
//!
//! Data model for the sealfs synchronization engine.
//!
//! This crate provides:
//! - Identifier and version newtypes
//! - Access descriptors for remote manifests and blocks
//! - Local and remote manifest variants with CBOR encoding
//! - Hydration/dehydration between remote and device-local views
//! - Crypto wrappers (AES-256-GCM sealing, SHA-256 digests, ed25519 signing)
//!
//! This is a pure data crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod access;
mod crypto;
mod error;
mod manifest;
mod types;

pub use access::{BlockAccess, ManifestAccess};
pub use crypto::{
    seal_and_sign, unseal_and_verify, Digest, SecretKey, SigningKey, VerifyKey, DIGEST_SIZE,
    KEY_SIZE, NONCE_SIZE, SIGNATURE_SIZE,
};
pub use error::{CodecError, CodecResult, CryptoError, CryptoResult};
pub use manifest::{
    LocalFileManifest, LocalFolderManifest, LocalManifest, RemoteFileManifest,
    RemoteFolderManifest, RemoteManifest,
};
pub use types::{BlockId, DeviceId, EntryId, Timestamp, Version};
