//! Error types for the sealfs data model.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors from the crypto wrappers.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// A key was constructed from a slice of the wrong length.
    #[error("invalid key size: got {got} bytes, expected {expected}")]
    InvalidKeySize {
        /// Actual byte length.
        got: usize,
        /// Required byte length.
        expected: usize,
    },

    /// Ciphertext was too short to contain a nonce.
    #[error("ciphertext truncated: {len} bytes")]
    Truncated {
        /// Actual ciphertext length.
        len: usize,
    },

    /// Authenticated decryption failed.
    ///
    /// The ciphertext was tampered with or sealed under a different key.
    #[error("decryption failed")]
    Decryption,

    /// A signature did not verify against the expected key.
    #[error("signature verification failed")]
    SignatureInvalid,

    /// A signed envelope was malformed (e.g. shorter than a signature).
    #[error("malformed signed envelope: {len} bytes")]
    MalformedEnvelope {
        /// Actual envelope length.
        len: usize,
    },
}

/// Result type for manifest codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors from manifest CBOR encoding/decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    /// CBOR serialization failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// CBOR deserialization failed.
    #[error("decode error: {0}")]
    Decode(String),
}
