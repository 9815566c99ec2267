//! Identity and encrypted-messaging core for the S.M.A terminal messenger.
//!
//! Identities ("rooms") are RSA key pairs keyed by a 12-character
//! fingerprint, persisted in a single JSON config file and used to encrypt
//! message payloads for exactly one recipient.

pub mod app;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod logging;
pub mod store;

pub use app::{initialize, App, AppConfig, Bootstrap, BootstrapOutcome, BootstrapPhase};
pub use crypto::{CipherService, KeyHandle, KeyPairProvider, KeyProfile, FINGERPRINT_LEN};
pub use error::{KeyParseReason, SmaError, SmaResult};
pub use identity::{Identity, IdentityStore};
pub use store::ConfigState;
