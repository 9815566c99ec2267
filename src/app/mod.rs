pub mod bootstrap;
pub mod config;

pub use bootstrap::{initialize, Bootstrap, BootstrapOutcome, BootstrapPhase, Bootstrapped};
pub use config::AppConfig;

use tracing::info;

use crate::crypto::{CipherService, KeyHandle, KeyPairProvider};
use crate::error::{SmaError, SmaResult};
use crate::identity::{Identity, IdentityStore};
use crate::store::ConfigState;

/// Owns the bootstrapped state and routes identity and cipher calls for the
/// surrounding UI. Every mutation is saved before it becomes visible.
pub struct App {
    config: AppConfig,
    state: ConfigState,
    provider: KeyPairProvider,
    cipher: CipherService,
    outcome: BootstrapOutcome,
}

impl App {
    /// Validate the config and run the startup sequence once
    pub fn new(config: AppConfig) -> SmaResult<Self> {
        config.validate()?;
        let provider = KeyPairProvider::new();
        let booted = Bootstrap::new(&config.config_path, provider).run()?;

        if let Ok(identity) = booted.state.default_identity() {
            info!(identity = %identity.fingerprint, outcome = ?booted.outcome, "Identity ready");
        }

        Ok(Self {
            config,
            state: booted.state,
            provider,
            cipher: CipherService::new(),
            outcome: booted.outcome,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn state(&self) -> &ConfigState {
        &self.state
    }

    pub fn bootstrap_outcome(&self) -> BootstrapOutcome {
        self.outcome
    }

    pub fn identities(&self) -> &IdentityStore {
        &self.state.identities
    }

    pub fn default_identity(&self) -> SmaResult<&Identity> {
        self.state.default_identity()
    }

    pub fn identity(&self, fingerprint: &str) -> SmaResult<&Identity> {
        self.state.get_identity(fingerprint)
    }

    /// Generate a new owned identity and persist it. Returns its fingerprint.
    pub fn create_identity(&mut self, make_default: bool) -> SmaResult<String> {
        let key = self.provider.generate_key_pair()?;
        let identity = Identity::from_key(&key, false)?;
        let fingerprint = identity.fingerprint.clone();

        self.commit(|state| {
            state.add_identity(identity);
            if make_default {
                state.set_default_identity(&fingerprint)?;
            }
            Ok(())
        })?;

        info!(identity = %fingerprint, "Created identity");
        Ok(fingerprint)
    }

    /// Add someone else's public key. An identity we already own is left
    /// untouched so its private key is never dropped.
    pub fn import_identity(&mut self, armored_public: &str, is_public: bool) -> SmaResult<String> {
        let key = self.provider.parse_public_key(armored_public)?;
        let fingerprint = key.short_fingerprint().to_string();

        if self
            .state
            .get_identity(&fingerprint)
            .map_or(false, Identity::is_owned)
        {
            info!(identity = %fingerprint, "Identity already owned, import skipped");
            return Ok(fingerprint);
        }

        let identity = Identity::from_key(&key, is_public)?;
        self.commit(|state| {
            state.add_identity(identity);
            Ok(())
        })?;

        info!(identity = %fingerprint, "Imported identity");
        Ok(fingerprint)
    }

    pub fn set_default_identity(&mut self, fingerprint: &str) -> SmaResult<()> {
        self.commit(|state| state.set_default_identity(fingerprint))
    }

    /// Armored public key of `fingerprint`, or of the default identity
    pub fn export_public_key(&self, fingerprint: Option<&str>) -> SmaResult<String> {
        Ok(self.resolve(fingerprint)?.public_key.clone())
    }

    /// Encrypt `plaintext` for the identity `fingerprint`
    pub fn encrypt_for(&self, fingerprint: &str, plaintext: &[u8]) -> SmaResult<String> {
        let identity = self.state.get_identity(fingerprint)?;
        let key = self.provider.parse_public_key(&identity.public_key)?;
        self.cipher.encrypt(plaintext, &key)
    }

    /// Decrypt `payload` as `fingerprint`, or as the default identity
    pub fn decrypt_as(&self, fingerprint: Option<&str>, payload: &str) -> SmaResult<Vec<u8>> {
        let identity = self.resolve(fingerprint)?;
        let key = self.private_key_of(identity)?;
        self.cipher.decrypt(payload, &key)
    }

    fn resolve(&self, fingerprint: Option<&str>) -> SmaResult<&Identity> {
        match fingerprint {
            Some(fp) => self.state.get_identity(fp),
            None => self.state.default_identity(),
        }
    }

    fn private_key_of(&self, identity: &Identity) -> SmaResult<KeyHandle> {
        match identity.private_key.as_deref() {
            Some(armored) if !armored.is_empty() => self.provider.parse_private_key(armored, &[]),
            _ => Err(SmaError::NotAPrivateKeyError {
                fingerprint: identity.fingerprint.clone(),
            }),
        }
    }

    /// Apply `change` to a copy of the state, save it, then swap it in.
    fn commit<F>(&mut self, change: F) -> SmaResult<()>
    where
        F: FnOnce(&mut ConfigState) -> SmaResult<()>,
    {
        let mut next = self.state.clone();
        change(&mut next)?;
        next.save(&self.config.config_path)?;
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::test_key_pairs;

    /// App over a pre-seeded state file so no key generation is needed
    fn seeded_app(dir: &std::path::Path) -> App {
        let path = dir.join("config.json");
        let mut state = ConfigState::new();
        state.add_identity(Identity::from_key(&test_key_pairs()[0], false).unwrap());
        state.save(&path).unwrap();

        App::new(AppConfig::new(path)).unwrap()
    }

    #[test]
    fn test_app_loads_existing_state() {
        let tmp = tempfile::tempdir().unwrap();
        let app = seeded_app(tmp.path());

        assert_eq!(app.bootstrap_outcome(), BootstrapOutcome::Loaded);
        assert_eq!(
            app.default_identity().unwrap().fingerprint,
            test_key_pairs()[0].short_fingerprint()
        );
    }

    #[test]
    fn test_import_encrypt_and_decrypt() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = seeded_app(tmp.path());
        let bob = &test_key_pairs()[1];

        let bob_fp = app
            .import_identity(&bob.armored_public_key().unwrap(), true)
            .unwrap();
        assert_eq!(bob_fp, bob.short_fingerprint());
        assert!(!app.identity(&bob_fp).unwrap().is_owned());

        // Persisted immediately
        let reloaded = ConfigState::load(&app.config().config_path).unwrap();
        assert!(reloaded.identities.contains(&bob_fp));

        let payload = app.encrypt_for(&bob_fp, b"hi bob").unwrap();
        let plain = CipherService::new().decrypt(&payload, bob).unwrap();
        assert_eq!(plain, b"hi bob");

        // We do not hold bob's private key
        let err = app.decrypt_as(Some(&bob_fp), &payload).unwrap_err();
        assert!(matches!(err, SmaError::NotAPrivateKeyError { .. }));
    }

    #[test]
    fn test_decrypt_as_default_identity() {
        let tmp = tempfile::tempdir().unwrap();
        let app = seeded_app(tmp.path());
        let own_fp = app.default_identity().unwrap().fingerprint.clone();

        let payload = app.encrypt_for(&own_fp, b"note to self").unwrap();
        assert_eq!(app.decrypt_as(None, &payload).unwrap(), b"note to self");
    }

    #[test]
    fn test_importing_own_key_keeps_private_half() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = seeded_app(tmp.path());
        let own = &test_key_pairs()[0];

        app.import_identity(&own.armored_public_key().unwrap(), true)
            .unwrap();
        assert!(app.identity(own.short_fingerprint()).unwrap().is_owned());
    }

    #[test]
    fn test_unknown_identity_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = seeded_app(tmp.path());

        assert!(matches!(
            app.encrypt_for("nope", b"x"),
            Err(SmaError::IdentityNotFound(_))
        ));
        assert!(matches!(
            app.set_default_identity("nope"),
            Err(SmaError::IdentityNotFound(_))
        ));
        assert!(app.export_public_key(Some("nope")).is_err());
    }

    #[test]
    fn test_set_default_identity_persists() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = seeded_app(tmp.path());
        let bob = &test_key_pairs()[1];

        let bob_fp = app
            .import_identity(&bob.armored_public_key().unwrap(), false)
            .unwrap();
        app.set_default_identity(&bob_fp).unwrap();

        let reloaded = ConfigState::load(&app.config().config_path).unwrap();
        assert_eq!(reloaded.default_identity, bob_fp);
        assert_eq!(
            app.export_public_key(None).unwrap(),
            bob.armored_public_key().unwrap()
        );
    }

    #[test]
    fn test_failed_save_leaves_memory_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = seeded_app(tmp.path());
        let before = app.state().clone();

        // Point the app at a path whose parent is a file
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        app.config.config_path = blocker.join("config.json");

        let bob = &test_key_pairs()[1];
        let err = app
            .import_identity(&bob.armored_public_key().unwrap(), false)
            .unwrap_err();
        assert!(matches!(err, SmaError::WriteError { .. }));
        assert_eq!(app.state(), &before);
    }

    #[test]
    fn test_fresh_app_provisions_identity() {
        let tmp = tempfile::tempdir().unwrap();
        let app = App::new(AppConfig::new(tmp.path().join("fresh.json"))).unwrap();

        assert_eq!(app.bootstrap_outcome(), BootstrapOutcome::Provisioned);
        assert_eq!(app.identities().len(), 1);
        assert!(app.default_identity().unwrap().is_owned());
    }
}
