//! Vesper Game Engine
//!
//! Platform-agnostic core game logic for Vesper, a first-person
//! push-your-luck horror dice game. This crate owns the day/time/round
//! progression machine, the dice scoring engine, the combat layer, and the
//! per-die transformation math; rendering, physics, audio, and input live
//! elsewhere and talk to the core exclusively through [`Action`] dispatch
//! and read-only [`GameState`] snapshots.

pub mod action;
pub mod combat;
pub mod config;
pub mod constants;
pub mod numbers;
pub mod scoring;
pub mod session;
pub mod state;
pub mod transform;

// Re-export commonly used types
pub use action::Action;
pub use combat::{CombatPhase, CombatState, Enemy, EnemyKind, EnemySpawn};
pub use config::{BalanceConfig, ConfigError};
pub use scoring::{
    DiceIds, DiceRoll, DiceValues, SCORE_CATEGORY_COUNT, ScoreCategory, ScoreCategoryData,
    achieved_bucket_total, calculate_scores, initialize_empty_scores, update_best_scores,
};
pub use session::GameSession;
pub use state::{
    DispatchOutcome, GamePhase, GameState, RejectReason, ScoringState, TimeOfDay, daily_target_for,
};
pub use transform::{
    DiceTransformation, TransformationEffects, TransformationKind, apply_transformation,
    calculate_transformation_effects,
};
