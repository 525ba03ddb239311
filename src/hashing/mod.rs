//! BLAKE3 helpers for encoder fingerprints and stub seeds.

use blake3::Hasher;

/// Computes a 64-bit hash of the input data using BLAKE3, truncated from 256 bits.
///
/// 64 bits is plenty for the handful of encoder versions and label seeds a process
/// ever sees; nothing here relies on collision resistance for security.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let bytes: [u8; 8] = hash.as_bytes()[0..8]
        .try_into()
        .expect("BLAKE3 always produces at least 8 bytes");
    u64::from_le_bytes(bytes)
}

/// Fingerprints an encoder from its backend kind, model identity and output dimension.
///
/// Fields are length-prefixed so that adjacent fields cannot be re-split into an
/// identical byte stream.
#[inline]
pub fn hash_encoder_identity(backend: &str, model_identity: &str, embedding_dim: usize) -> u64 {
    let mut hasher = Hasher::new();
    for part in [backend.as_bytes(), model_identity.as_bytes()] {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    hasher.update(&(embedding_dim as u64).to_le_bytes());

    let hash = hasher.finalize();
    let bytes: [u8; 8] = hash.as_bytes()[0..8]
        .try_into()
        .expect("BLAKE3 always produces at least 8 bytes");
    u64::from_le_bytes(bytes)
}

#[inline]
pub fn hash_label(label: &str) -> u64 {
    hash_to_u64(label.as_bytes())
}
