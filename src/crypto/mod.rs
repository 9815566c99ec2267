//! Cryptography module for the identity core
//!
//! This module provides:
//! - Key pair generation and armored key parsing (RSA, pinned profile)
//! - Single-recipient hybrid message encryption (RSA-OAEP + AES-256-GCM)
//! - Message armor and transport encoding

mod armor;
mod cipher;
mod keys;

pub use cipher::{CipherService, ENVELOPE_VERSION};
pub use keys::{
    compute_fingerprint, short_fingerprint, KeyHandle, KeyPairProvider, KeyProfile,
    FINGERPRINT_LEN,
};

/// Two key pairs generated once per test binary; RSA generation is slow.
#[cfg(test)]
pub(crate) fn test_key_pairs() -> &'static [KeyHandle] {
    use std::sync::OnceLock;

    static KEYS: OnceLock<Vec<KeyHandle>> = OnceLock::new();
    KEYS.get_or_init(|| {
        let provider = KeyPairProvider::new();
        (0..2)
            .map(|_| provider.generate_key_pair().expect("test key generation"))
            .collect()
    })
}
