//! Crypto wrappers: AES-256-GCM sealing, SHA-256 digests, ed25519 signatures.
//!
//! The primitives themselves come from the RustCrypto and dalek crates; this
//! module only fixes how they are combined (sign-then-seal envelopes, nonce
//! layout, digest comparison) for the rest of the engine.

use crate::error::{CryptoError, CryptoResult};
use aes_gcm::{
    aead::{generic_array::GenericArray, Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use ed25519_dalek::{Signer, Verifier};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of an AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// Size of the GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;
/// Size of a SHA-256 digest in bytes.
pub const DIGEST_SIZE: usize = 32;
/// Size of an ed25519 signature in bytes.
pub const SIGNATURE_SIZE: usize = 64;

/// Symmetric key sealing one remote object.
///
/// Every manifest and block has its own key, carried by the access
/// descriptor that references it. The key is zeroized on drop.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    bytes: [u8; KEY_SIZE],
}

impl SecretKey {
    /// Generates a new random key.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Creates a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the slice is not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeySize {
                got: bytes.len(),
                expected: KEY_SIZE,
            });
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(bytes);
        Ok(Self { bytes: key })
    }

    /// Seals plaintext under this key.
    ///
    /// Output layout is `nonce || ciphertext`, with a fresh random nonce per
    /// call.
    pub fn encrypt(&self, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        let cipher = Aes256Gcm::new(GenericArray::from_slice(&self.bytes));
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| CryptoError::Decryption)?;
        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Opens a sealed payload.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Decryption`] if the ciphertext was tampered
    /// with or sealed under a different key.
    pub fn decrypt(&self, sealed: &[u8]) -> CryptoResult<Vec<u8>> {
        if sealed.len() < NONCE_SIZE {
            return Err(CryptoError::Truncated { len: sealed.len() });
        }
        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_SIZE);
        let cipher = Aes256Gcm::new(GenericArray::from_slice(&self.bytes));
        let nonce = Nonce::from_slice(nonce_bytes);
        cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CryptoError::Decryption)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material.
        f.write_str("SecretKey(..)")
    }
}

/// SHA-256 digest of a plaintext block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest([u8; DIGEST_SIZE]);

impl Digest {
    /// Computes the digest of the given bytes.
    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        use sha2::{Digest as _, Sha256};
        let out = Sha256::digest(bytes);
        let mut digest = [0u8; DIGEST_SIZE];
        digest.copy_from_slice(&out);
        Self(digest)
    }

    /// Returns the raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Device signing key for authoring remote manifests.
#[derive(Clone)]
pub struct SigningKey(ed25519_dalek::SigningKey);

impl SigningKey {
    /// Generates a new random signing key.
    #[must_use]
    pub fn generate() -> Self {
        Self(ed25519_dalek::SigningKey::generate(&mut rand::rngs::OsRng))
    }

    /// Returns the matching verification key.
    #[must_use]
    pub fn verify_key(&self) -> VerifyKey {
        VerifyKey(self.0.verifying_key())
    }

    /// Signs a message, returning the detached signature bytes.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_SIZE] {
        self.0.sign(message).to_bytes()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(..)")
    }
}

/// Device verification key, resolved through the device directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyKey(ed25519_dalek::VerifyingKey);

impl VerifyKey {
    /// Verifies a detached signature over a message.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::SignatureInvalid`] if the signature does not
    /// match.
    pub fn verify(&self, message: &[u8], signature: &[u8; SIGNATURE_SIZE]) -> CryptoResult<()> {
        let signature = ed25519_dalek::Signature::from_bytes(signature);
        self.0
            .verify(message, &signature)
            .map_err(|_| CryptoError::SignatureInvalid)
    }
}

/// Signs a payload with the author key, then seals `signature || payload`
/// under the object's symmetric key.
///
/// This is the envelope format of every vlob: the store only ever sees the
/// sealed bytes, and a reader must hold both the symmetric key (from the
/// access descriptor) and the author's verification key (from the device
/// directory) to accept the content.
pub fn seal_and_sign(
    signing_key: &SigningKey,
    secret_key: &SecretKey,
    payload: &[u8],
) -> CryptoResult<Vec<u8>> {
    let signature = signing_key.sign(payload);
    let mut signed = Vec::with_capacity(SIGNATURE_SIZE + payload.len());
    signed.extend_from_slice(&signature);
    signed.extend_from_slice(payload);
    secret_key.encrypt(&signed)
}

/// Opens a sealed envelope and verifies its signature, returning the payload.
///
/// # Errors
///
/// Returns [`CryptoError::Decryption`] if unsealing fails,
/// [`CryptoError::MalformedEnvelope`] if the plaintext is shorter than a
/// signature, and [`CryptoError::SignatureInvalid`] if the signature does not
/// verify against `verify_key`.
pub fn unseal_and_verify(
    secret_key: &SecretKey,
    verify_key: &VerifyKey,
    sealed: &[u8],
) -> CryptoResult<Vec<u8>> {
    let signed = secret_key.decrypt(sealed)?;
    if signed.len() < SIGNATURE_SIZE {
        return Err(CryptoError::MalformedEnvelope { len: signed.len() });
    }
    let (signature, payload) = signed.split_at(SIGNATURE_SIZE);
    let mut sig = [0u8; SIGNATURE_SIZE];
    sig.copy_from_slice(signature);
    verify_key.verify(payload, &sig)?;
    Ok(payload.to_vec())
}
