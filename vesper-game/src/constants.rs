//! Centralized balance and tuning constants for Vesper game logic.
//!
//! These values define the deterministic math for the core loop. Keeping
//! them together ensures that gameplay can only be adjusted via code
//! changes reviewed in version control, or through an explicit
//! [`BalanceConfig`](crate::config::BalanceConfig) override.

// Logging keys -------------------------------------------------------------
pub(crate) const LOG_BOOTING: &str = "log.booting";
pub(crate) const LOG_GAME_STARTED: &str = "log.game.started";
pub(crate) const LOG_GAME_RESUMED: &str = "log.game.resumed";
pub(crate) const LOG_GAME_MENU: &str = "log.game.menu";
pub(crate) const LOG_GAME_OVER_CORRUPTION: &str = "log.game.over.corruption";
pub(crate) const LOG_ACTION_REJECTED: &str = "log.action.rejected";
pub(crate) const LOG_ROUND_THROW: &str = "log.round.throw";
pub(crate) const LOG_ROUND_SETTLED: &str = "log.round.settled";
pub(crate) const LOG_ROUND_SUCCESS: &str = "log.round.success";
pub(crate) const LOG_ROUND_RETRY: &str = "log.round.retry";
pub(crate) const LOG_ROUND_EXHAUSTED: &str = "log.round.exhausted";
pub(crate) const LOG_TIME_ADVANCED: &str = "log.time.advanced";
pub(crate) const LOG_DAY_COMPLETE: &str = "log.day.complete";
pub(crate) const LOG_DAY_TARGET_MET: &str = "log.day.target-met";
pub(crate) const LOG_DAY_TARGET_MISSED: &str = "log.day.target-missed";
pub(crate) const LOG_ITEM_SELECTED: &str = "log.item.selected";
pub(crate) const LOG_COMBAT_START: &str = "log.combat.start";
pub(crate) const LOG_COMBAT_ENEMY_ROLL: &str = "log.combat.enemy-roll";
pub(crate) const LOG_COMBAT_ABILITY_USED: &str = "log.combat.ability-used";
pub(crate) const LOG_COMBAT_ENEMY_DOWN: &str = "log.combat.enemy-down";
pub(crate) const LOG_COMBAT_AWAIT: &str = "log.combat.await-player";
pub(crate) const LOG_COMBAT_VICTORY: &str = "log.combat.victory";
pub(crate) const LOG_COMBAT_DEFEAT: &str = "log.combat.defeat";
pub(crate) const LOG_COMBAT_END: &str = "log.combat.end";

// Round and day pacing -----------------------------------------------------
pub(crate) const MAX_ATTEMPTS_PER_ROUND: u32 = 2;
pub(crate) const ROLLS_PER_PERIOD: u32 = 3;
pub(crate) const MAX_DAYS_MARKED: u32 = 31;

// Corruption meter ---------------------------------------------------------
pub(crate) const CORRUPTION_PER_THROW: f32 = 0.02;
pub(crate) const CORRUPTION_MAX: f32 = 1.0;

// Daily target economy -----------------------------------------------------
pub(crate) const DAILY_TARGET_BASE: f32 = 30.0;
pub(crate) const DAILY_TARGET_GROWTH: f32 = 1.5;

// Scoring ------------------------------------------------------------------
pub(crate) const COMBO_BONUS_STEP: f32 = 0.15;

// Combat -------------------------------------------------------------------
pub(crate) const BASE_PLAYER_HP: i32 = 10;
/// Enemy damage is rolled on a d4; the d6 the player sees is cosmetic.
pub(crate) const ENEMY_DAMAGE_DIE: i32 = 4;
pub(crate) const VISUAL_DIE_FACES: u8 = 6;
pub(crate) const VICTORY_BONUS_PER_ROUND: i32 = 10;
