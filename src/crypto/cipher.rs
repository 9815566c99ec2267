use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng as AesRng, Payload},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::rngs::OsRng;
use rsa::Oaep;
use sha2::Sha256;
use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

use super::armor::{armor, dearmor};
use super::keys::KeyHandle;
use crate::error::{SmaError, SmaResult};

/// Envelope layout version written as the first byte
pub const ENVELOPE_VERSION: u8 = 1;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const SESSION_KEY_LEN: usize = 32;

/// Single-recipient hybrid encryption.
///
/// A fresh AES-256-GCM key encrypts the message and is itself wrapped with
/// RSA-OAEP for the recipient. The envelope is
/// `version | wrapped_len (u16 BE) | wrapped_key | nonce | ciphertext`,
/// armored, then base64 encoded for transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct CipherService;

impl CipherService {
    pub fn new() -> Self {
        Self
    }

    /// Encrypt `plaintext` for exactly one recipient.
    pub fn encrypt(&self, plaintext: &[u8], recipient: &KeyHandle) -> SmaResult<String> {
        let mut rng = OsRng;
        let mut session_key = Aes256Gcm::generate_key(&mut AesRng);
        let cipher = Aes256Gcm::new(&session_key);

        let wrapped = recipient.public_key().encrypt(
            &mut rng,
            Oaep::new::<Sha256>(),
            session_key.as_slice(),
        );
        session_key.as_mut_slice().zeroize();
        let wrapped = wrapped.map_err(|e| SmaError::EncryptionError(e.to_string()))?;

        let wrapped_len = u16::try_from(wrapped.len())
            .map_err(|_| SmaError::EncryptionError("wrapped key too large".to_string()))?;

        let capacity = 3 + wrapped.len() + NONCE_LEN + plaintext.len() + TAG_LEN;
        let mut envelope = Vec::with_capacity(capacity);
        envelope.push(ENVELOPE_VERSION);
        envelope.extend_from_slice(&wrapped_len.to_be_bytes());
        envelope.extend_from_slice(&wrapped);

        let nonce = Aes256Gcm::generate_nonce(&mut AesRng);
        let ciphertext = cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: plaintext,
                    aad: &envelope,
                },
            )
            .map_err(|e| SmaError::EncryptionError(e.to_string()))?;

        envelope.extend_from_slice(&nonce);
        envelope.extend_from_slice(&ciphertext);

        debug!(
            recipient = recipient.short_fingerprint(),
            plaintext_len = plaintext.len(),
            envelope_len = envelope.len(),
            "Encrypted message"
        );
        Ok(BASE64.encode(armor(&envelope)))
    }

    /// Decrypt a payload produced by [`CipherService::encrypt`] with the
    /// holder's private key.
    pub fn decrypt(&self, payload: &str, holder: &KeyHandle) -> SmaResult<Vec<u8>> {
        let armored = BASE64.decode(payload.trim())?;
        let armored = String::from_utf8(armored)
            .map_err(|_| SmaError::DecryptionError("armor is not valid UTF-8".to_string()))?;
        let envelope = dearmor(&armored)?;
        let private_key = holder.private_key()?;

        let (header, nonce, ciphertext) = split_envelope(&envelope)?;
        let wrapped = &header[3..];

        let session_key = Zeroizing::new(
            private_key
                .decrypt(Oaep::new::<Sha256>(), wrapped)
                .map_err(|_| {
                    SmaError::DecryptionError(format!(
                        "message was not encrypted for {}",
                        holder.short_fingerprint()
                    ))
                })?,
        );
        if session_key.len() != SESSION_KEY_LEN {
            return Err(SmaError::DecryptionError("invalid session key".to_string()));
        }

        let cipher = Aes256Gcm::new_from_slice(&session_key)
            .map_err(|e| SmaError::DecryptionError(e.to_string()))?;
        let plaintext = cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: header,
                },
            )
            .map_err(|_| SmaError::DecryptionError("message authentication failed".to_string()))?;

        debug!(
            holder = holder.short_fingerprint(),
            plaintext_len = plaintext.len(),
            "Decrypted message"
        );
        Ok(plaintext)
    }
}

/// Split an envelope into (authenticated header, nonce, ciphertext)
fn split_envelope(envelope: &[u8]) -> SmaResult<(&[u8], &[u8], &[u8])> {
    if envelope.len() < 3 {
        return Err(SmaError::DecryptionError("envelope too short".to_string()));
    }
    if envelope[0] != ENVELOPE_VERSION {
        return Err(SmaError::DecryptionError(format!(
            "unsupported envelope version {}",
            envelope[0]
        )));
    }

    let wrapped_len = u16::from_be_bytes([envelope[1], envelope[2]]) as usize;
    let header_len = 3 + wrapped_len;
    if envelope.len() < header_len + NONCE_LEN + TAG_LEN {
        return Err(SmaError::DecryptionError("envelope truncated".to_string()));
    }

    let (header, rest) = envelope.split_at(header_len);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);
    Ok((header, nonce, ciphertext))
}
