//! High-level session wrapper binding a seeded RNG and balance tuning to a
//! mutable game state.

use anyhow::Context;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::action::Action;
use crate::config::BalanceConfig;
use crate::state::{DispatchOutcome, GameState};

/// One running game: the state aggregate plus the tuning it was created
/// with. The rendering layer owns exactly one of these per run.
#[derive(Debug, Clone)]
pub struct GameSession {
    state: GameState,
    balance: BalanceConfig,
}

impl GameSession {
    /// Fresh session with default tuning.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_balance(seed, BalanceConfig::default())
    }

    /// Fresh session with explicit tuning.
    #[must_use]
    pub fn with_balance(seed: u64, balance: BalanceConfig) -> Self {
        let mut state = GameState::with_balance(&balance);
        state.seed = seed;
        state.rng = Some(ChaCha20Rng::seed_from_u64(seed));
        Self { state, balance }
    }

    /// Fresh session with tuning parsed from a JSON override.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or violates a reducer
    /// invariant.
    pub fn with_config_json(seed: u64, json: &str) -> anyhow::Result<Self> {
        let balance = BalanceConfig::from_json(json).context("invalid balance config")?;
        balance.validate().context("unusable balance config")?;
        Ok(Self::with_balance(seed, balance))
    }

    /// Rebind an existing state snapshot, reattaching an RNG from its seed
    /// when the snapshot carries none (deserialized states never do).
    #[must_use]
    pub fn from_state(state: GameState, balance: BalanceConfig) -> Self {
        let mut session = Self { state, balance };
        if session.state.rng.is_none() {
            session.state.rng = Some(ChaCha20Rng::seed_from_u64(session.state.seed));
        }
        session
    }

    /// Apply one action against this session's tuning.
    pub fn dispatch(&mut self, action: Action) -> DispatchOutcome {
        self.state.dispatch_with_config(action, &self.balance)
    }

    /// Borrow the underlying immutable game state.
    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Borrow the underlying mutable game state.
    pub const fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    /// Apply a closure to the mutable game state.
    pub fn with_state_mut<R>(&mut self, f: impl FnOnce(&mut GameState) -> R) -> R {
        f(&mut self.state)
    }

    /// Tuning this session runs with.
    #[must_use]
    pub const fn balance(&self) -> &BalanceConfig {
        &self.balance
    }

    /// Deterministically reseed the session.
    pub fn reseed(&mut self, seed: u64) {
        self.state.seed = seed;
        self.state.rng = Some(ChaCha20Rng::seed_from_u64(seed));
    }

    /// Consume the session, returning the underlying game state.
    #[must_use]
    pub fn into_state(self) -> GameState {
        self.state
    }
}
