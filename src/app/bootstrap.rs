use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::crypto::KeyPairProvider;
use crate::error::{SmaError, SmaResult};
use crate::identity::Identity;
use crate::store::ConfigState;

/// Startup phases:
/// `Start -> Loading -> {Loaded | Absent -> Provisioning -> Persisted} -> Ready`,
/// with `Fatal` reachable from `Loading` and `Provisioning`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapPhase {
    Start,
    Loading,
    Loaded,
    Absent,
    Provisioning,
    Persisted,
    Ready,
    Fatal,
}

impl BootstrapPhase {
    pub fn can_transition_to(self, next: BootstrapPhase) -> bool {
        use BootstrapPhase::*;

        matches!(
            (self, next),
            (Start, Loading)
                | (Loading, Loaded)
                | (Loading, Absent)
                | (Loading, Fatal)
                | (Absent, Provisioning)
                | (Provisioning, Persisted)
                | (Provisioning, Fatal)
                | (Loaded, Ready)
                | (Persisted, Ready)
        )
    }
}

/// How the state came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// An existing config file was read
    Loaded,
    /// No file existed; a fresh identity was generated and saved
    Provisioned,
}

/// Result of a successful bootstrap
#[derive(Debug)]
pub struct Bootstrapped {
    pub state: ConfigState,
    pub outcome: BootstrapOutcome,
    /// Every phase visited, in order
    pub trail: Vec<BootstrapPhase>,
}

/// One-shot startup sequence. `run` consumes the value, so a bootstrap can
/// never go back to `Loading`.
pub struct Bootstrap {
    path: PathBuf,
    provider: KeyPairProvider,
    phase: BootstrapPhase,
    trail: Vec<BootstrapPhase>,
}

impl Bootstrap {
    pub fn new<P: Into<PathBuf>>(path: P, provider: KeyPairProvider) -> Self {
        Self {
            path: path.into(),
            provider,
            phase: BootstrapPhase::Start,
            trail: vec![BootstrapPhase::Start],
        }
    }

    /// Load the config file, or provision and persist a fresh identity when
    /// it does not exist. Every other failure is fatal.
    pub fn run(mut self) -> SmaResult<Bootstrapped> {
        self.advance(BootstrapPhase::Loading);

        let (state, outcome) = match ConfigState::load(&self.path) {
            Ok(state) => {
                self.advance(BootstrapPhase::Loaded);
                (state, BootstrapOutcome::Loaded)
            }
            Err(e) if e.is_not_found() => {
                self.advance(BootstrapPhase::Absent);
                info!(path = %self.path.display(), "No config found, provisioning a new identity");
                (self.provision()?, BootstrapOutcome::Provisioned)
            }
            Err(e) => return Err(self.fail(e)),
        };

        self.advance(BootstrapPhase::Ready);
        Ok(Bootstrapped {
            state,
            outcome,
            trail: self.trail,
        })
    }

    fn provision(&mut self) -> SmaResult<ConfigState> {
        self.advance(BootstrapPhase::Provisioning);

        let state = match self.provision_state() {
            Ok(state) => state,
            Err(e) => return Err(self.fail(e)),
        };

        self.advance(BootstrapPhase::Persisted);
        Ok(state)
    }

    fn provision_state(&self) -> SmaResult<ConfigState> {
        let key = self.provider.generate_key_pair()?;
        let identity = Identity::from_key(&key, false)?;

        let mut state = ConfigState::new();
        state.add_identity(identity);
        state.save(&self.path)?;
        Ok(state)
    }

    fn fail(&mut self, source: SmaError) -> SmaError {
        warn!(path = %self.path.display(), error = %source, "Initialization failed");
        self.advance(BootstrapPhase::Fatal);
        SmaError::FatalInitError {
            path: self.path.clone(),
            source: Box::new(source),
        }
    }

    fn advance(&mut self, next: BootstrapPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "invalid bootstrap transition {:?} -> {:?}",
            self.phase,
            next
        );
        debug!(from = ?self.phase, to = ?next, "Bootstrap transition");
        self.phase = next;
        self.trail.push(next);
    }
}

/// Load or provision the state at `path` with the default key profile
pub fn initialize<P: AsRef<Path>>(path: P) -> SmaResult<ConfigState> {
    Bootstrap::new(path.as_ref(), KeyPairProvider::new())
        .run()
        .map(|booted| booted.state)
}
