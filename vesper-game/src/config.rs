//! Balance configuration for the core loop.
//!
//! The defaults mirror `constants.rs`; a rendering layer may load an
//! override from JSON (difficulty mods, playtest tuning) without touching
//! the reducer itself.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    BASE_PLAYER_HP, COMBO_BONUS_STEP, CORRUPTION_PER_THROW, DAILY_TARGET_BASE,
    DAILY_TARGET_GROWTH, ENEMY_DAMAGE_DIE, MAX_ATTEMPTS_PER_ROUND, MAX_DAYS_MARKED,
    ROLLS_PER_PERIOD, VICTORY_BONUS_PER_ROUND, VISUAL_DIE_FACES,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceConfig {
    /// Corruption added on every throw before item modifiers.
    #[serde(default = "default_corruption_per_throw")]
    pub corruption_per_throw: f32,
    /// Score threshold for day one; later days grow exponentially.
    #[serde(default = "default_daily_target_base")]
    pub daily_target_base: f32,
    #[serde(default = "default_daily_target_growth")]
    pub daily_target_growth: f32,
    /// Multiplicative bonus per consecutive repeat of a category.
    #[serde(default = "default_combo_bonus_step")]
    pub combo_bonus_step: f32,
    #[serde(default = "default_max_attempts_per_round")]
    pub max_attempts_per_round: u32,
    /// Completed rounds per time-of-day period.
    #[serde(default = "default_rolls_per_period")]
    pub rolls_per_period: u32,
    #[serde(default = "default_max_days_marked")]
    pub max_days_marked: u32,
    #[serde(default = "default_base_player_hp")]
    pub base_player_hp: i32,
    /// Faces of the enemy damage die. The displayed d6 is cosmetic only.
    #[serde(default = "default_enemy_damage_die")]
    pub enemy_damage_die: i32,
    #[serde(default = "default_visual_die_faces")]
    pub visual_die_faces: u8,
    /// Display points per fast-forwarded round on combat victory.
    #[serde(default = "default_victory_bonus_per_round")]
    pub victory_bonus_per_round: i32,
}

fn default_corruption_per_throw() -> f32 {
    CORRUPTION_PER_THROW
}
fn default_daily_target_base() -> f32 {
    DAILY_TARGET_BASE
}
fn default_daily_target_growth() -> f32 {
    DAILY_TARGET_GROWTH
}
fn default_combo_bonus_step() -> f32 {
    COMBO_BONUS_STEP
}
fn default_max_attempts_per_round() -> u32 {
    MAX_ATTEMPTS_PER_ROUND
}
fn default_rolls_per_period() -> u32 {
    ROLLS_PER_PERIOD
}
fn default_max_days_marked() -> u32 {
    MAX_DAYS_MARKED
}
fn default_base_player_hp() -> i32 {
    BASE_PLAYER_HP
}
fn default_enemy_damage_die() -> i32 {
    ENEMY_DAMAGE_DIE
}
fn default_visual_die_faces() -> u8 {
    VISUAL_DIE_FACES
}
fn default_victory_bonus_per_round() -> i32 {
    VICTORY_BONUS_PER_ROUND
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            corruption_per_throw: default_corruption_per_throw(),
            daily_target_base: default_daily_target_base(),
            daily_target_growth: default_daily_target_growth(),
            combo_bonus_step: default_combo_bonus_step(),
            max_attempts_per_round: default_max_attempts_per_round(),
            rolls_per_period: default_rolls_per_period(),
            max_days_marked: default_max_days_marked(),
            base_player_hp: default_base_player_hp(),
            enemy_damage_die: default_enemy_damage_die(),
            visual_die_faces: default_visual_die_faces(),
            victory_bonus_per_round: default_victory_bonus_per_round(),
        }
    }
}

/// Validation failures for an externally supplied balance override.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("rolls_per_period must be at least 1")]
    ZeroRollsPerPeriod,
    #[error("max_attempts_per_round must be at least 1")]
    ZeroAttempts,
    #[error("daily_target_growth must be at least 1.0")]
    ShrinkingTarget,
    #[error("enemy_damage_die must be at least 1")]
    ZeroDamageDie,
}

impl BalanceConfig {
    /// Parse a balance override from JSON. Missing fields fall back to the
    /// built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse a balance override, falling back to defaults on any parse error.
    #[must_use]
    pub fn load_or_default(json: &str) -> Self {
        Self::from_json(json).unwrap_or_default()
    }

    /// Check the invariants the reducer relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rolls_per_period == 0 {
            return Err(ConfigError::ZeroRollsPerPeriod);
        }
        if self.max_attempts_per_round == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if self.daily_target_growth < 1.0 {
            return Err(ConfigError::ShrinkingTarget);
        }
        if self.enemy_damage_die < 1 {
            return Err(ConfigError::ZeroDamageDie);
        }
        Ok(())
    }
}
