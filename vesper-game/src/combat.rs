//! Turn-based combat layered on the round machine.
//!
//! Combat runs as a nested phase machine inside [`GameState`]: enemies
//! spawn, roll attacks, and trade turns with the player, whose abilities
//! are the score categories achieved this period. Each ability consumes
//! the physical dice that backed it, so one settled throw can never feed
//! the same dice into two abilities within a combat round.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::BalanceConfig;
use crate::constants::{
    LOG_COMBAT_ABILITY_USED, LOG_COMBAT_AWAIT, LOG_COMBAT_DEFEAT, LOG_COMBAT_END,
    LOG_COMBAT_ENEMY_DOWN, LOG_COMBAT_ENEMY_ROLL, LOG_COMBAT_START, LOG_COMBAT_VICTORY,
};
use crate::scoring::{DiceIds, DiceRoll, ScoreCategory, calculate_scores};
use crate::state::{GamePhase, GameState, RejectReason, default_balance};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatPhase {
    EnemySpawn,
    AwaitPlayer,
    EnemyRoll,
    PlayerTurn,
    Resolve,
}

impl CombatPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EnemySpawn => "enemy_spawn",
            Self::AwaitPlayer => "await_player",
            Self::EnemyRoll => "enemy_roll",
            Self::PlayerTurn => "player_turn",
            Self::Resolve => "resolve",
        }
    }
}

impl fmt::Display for CombatPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Shade,
    Marionette,
    Maw,
}

impl EnemyKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shade => "shade",
            Self::Marionette => "marionette",
            Self::Maw => "maw",
        }
    }
}

impl fmt::Display for EnemyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spawn-list element supplied by the encounter layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawn {
    pub kind: EnemyKind,
    #[serde(default)]
    pub position: [f32; 3],
    pub hp: i32,
}

/// A live enemy. Dead enemies are dropped from the list immediately; any
/// death presentation is the rendering layer's business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub position: [f32; 3],
    pub hp: i32,
    pub max_hp: i32,
    /// Portal opening progress, advanced by the rendering layer.
    #[serde(default)]
    pub portal_progress: f32,
    /// Entrance animation progress, advanced by the rendering layer.
    #[serde(default)]
    pub entrance_progress: f32,
    /// Damage the enemy will deal at resolve, rolled on the damage die.
    #[serde(default)]
    pub attack_roll: Option<i32>,
    /// Cosmetic face shown on the enemy's die; never used for damage.
    #[serde(default)]
    pub dice_value: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatState {
    /// `None` while no encounter is running.
    #[serde(default)]
    pub phase: Option<CombatPhase>,
    #[serde(default)]
    pub enemies: Vec<Enemy>,
    pub player_hp: i32,
    pub max_player_hp: i32,
    #[serde(default)]
    pub selected_ability: Option<ScoreCategory>,
    #[serde(default)]
    pub selected_enemy_id: Option<u32>,
    /// Die ids already consumed by abilities this combat round.
    #[serde(default)]
    pub used_dice_ids: Vec<u32>,
    /// Last settle snapshot; the source for remaining-ability queries.
    #[serde(default)]
    pub current_dice_roll: Option<DiceRoll>,
    /// Display points banked by the last victory fast-forward.
    #[serde(default)]
    pub last_victory_bonus: Option<i32>,
    #[serde(default)]
    next_enemy_id: u32,
}

impl Default for CombatState {
    fn default() -> Self {
        Self::with_balance(default_balance())
    }
}

impl CombatState {
    #[must_use]
    pub fn with_balance(cfg: &BalanceConfig) -> Self {
        Self {
            phase: None,
            enemies: Vec::new(),
            player_hp: cfg.base_player_hp,
            max_player_hp: cfg.base_player_hp,
            selected_ability: None,
            selected_enemy_id: None,
            used_dice_ids: Vec::new(),
            current_dice_roll: None,
            last_victory_bonus: None,
            next_enemy_id: 1,
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.phase.is_some()
    }

    #[must_use]
    pub fn enemy(&self, id: u32) -> Option<&Enemy> {
        self.enemies.iter().find(|enemy| enemy.id == id)
    }

    /// Clear the encounter, keeping the player's HP pool.
    fn reset_preserving_hp(&mut self) {
        let player_hp = self.player_hp;
        let max_player_hp = self.max_player_hp;
        let last_victory_bonus = self.last_victory_bonus;
        *self = Self {
            player_hp,
            max_player_hp,
            last_victory_bonus,
            ..Self::with_balance(default_balance())
        };
    }
}

impl GameState {
    pub(crate) fn combat_start(&mut self, spawns: &[EnemySpawn]) -> Result<(), RejectReason> {
        if self.phase == GamePhase::Menu {
            return Err(RejectReason::InvalidPhase {
                action: "combat_start",
                phase: self.phase,
            });
        }
        if self.combat.is_active() {
            return Err(RejectReason::CombatAlreadyActive);
        }
        let mut enemies = Vec::with_capacity(spawns.len());
        for spawn in spawns {
            let id = self.combat.next_enemy_id;
            self.combat.next_enemy_id += 1;
            enemies.push(Enemy {
                id,
                kind: spawn.kind,
                position: spawn.position,
                hp: spawn.hp,
                max_hp: spawn.hp,
                portal_progress: 0.0,
                entrance_progress: 0.0,
                attack_roll: None,
                dice_value: None,
            });
        }
        self.combat.enemies = enemies;
        self.combat.used_dice_ids.clear();
        self.combat.current_dice_roll = None;
        self.combat.selected_ability = None;
        self.combat.selected_enemy_id = None;
        self.combat.last_victory_bonus = None;
        self.combat.phase = Some(CombatPhase::EnemySpawn);
        self.push_log(LOG_COMBAT_START);
        Ok(())
    }

    pub(crate) fn combat_enemy_roll(&mut self, cfg: &BalanceConfig) -> Result<(), RejectReason> {
        match self.combat.phase {
            None => return Err(RejectReason::CombatInactive),
            Some(
                CombatPhase::EnemySpawn | CombatPhase::AwaitPlayer | CombatPhase::EnemyRoll,
            ) => {}
            Some(phase) => {
                return Err(RejectReason::CombatWrongPhase {
                    action: "combat_enemy_roll",
                    phase,
                });
            }
        }
        match self.rng.as_mut() {
            Some(rng) => {
                for enemy in &mut self.combat.enemies {
                    enemy.attack_roll = Some(rng.random_range(1..=cfg.enemy_damage_die));
                    enemy.dice_value = Some(rng.random_range(1..=cfg.visual_die_faces));
                }
            }
            None => {
                // Deterministic midpoints keep headless runs reproducible.
                for enemy in &mut self.combat.enemies {
                    enemy.attack_roll = Some((1 + cfg.enemy_damage_die) / 2);
                    enemy.dice_value = Some(cfg.visual_die_faces.div_ceil(2));
                }
            }
        }
        self.combat.used_dice_ids.clear();
        self.combat.phase = Some(CombatPhase::PlayerTurn);
        self.push_log(LOG_COMBAT_ENEMY_ROLL);
        Ok(())
    }

    pub(crate) fn combat_select_ability(
        &mut self,
        category: ScoreCategory,
    ) -> Result<(), RejectReason> {
        self.require_player_turn("combat_select_ability")?;
        self.combat.selected_ability = Some(category);
        // Re-arming invalidates the previous target.
        self.combat.selected_enemy_id = None;
        Ok(())
    }

    pub(crate) fn combat_select_enemy(&mut self, enemy_id: u32) -> Result<(), RejectReason> {
        self.require_player_turn("combat_select_enemy")?;
        if self.combat.enemy(enemy_id).is_none() {
            return Err(RejectReason::UnknownEnemy { id: enemy_id });
        }
        self.combat.selected_enemy_id = Some(enemy_id);
        Ok(())
    }

    pub(crate) fn combat_use_ability(
        &mut self,
        enemy_id: Option<u32>,
    ) -> Result<(), RejectReason> {
        self.require_player_turn("combat_use_ability")?;
        let category = self
            .combat
            .selected_ability
            .ok_or(RejectReason::NoAbilitySelected)?;
        let target = enemy_id
            .or(self.combat.selected_enemy_id)
            .ok_or(RejectReason::NoTargetSelected)?;

        let entry = self
            .scoring
            .current_scores
            .iter()
            .find(|entry| entry.category == category && entry.achieved)
            .ok_or(RejectReason::AbilityNotAchieved { category })?;
        if !entry.dice_ids.is_empty()
            && entry
                .dice_ids
                .iter()
                .any(|id| self.combat.used_dice_ids.contains(id))
        {
            return Err(RejectReason::DiceAlreadyUsed { category });
        }
        let damage = entry.score;
        let consumed: DiceIds = entry.dice_ids.clone();

        let enemy = self
            .combat
            .enemies
            .iter_mut()
            .find(|enemy| enemy.id == target)
            .ok_or(RejectReason::UnknownEnemy { id: target })?;
        enemy.hp = (enemy.hp - damage).max(0);
        let downed = enemy.hp == 0;

        for id in consumed {
            if !self.combat.used_dice_ids.contains(&id) {
                self.combat.used_dice_ids.push(id);
            }
        }
        self.push_log(LOG_COMBAT_ABILITY_USED);
        if downed {
            self.push_log(LOG_COMBAT_ENEMY_DOWN);
            self.combat.enemies.retain(|enemy| enemy.hp > 0);
        }
        self.combat.selected_ability = None;
        self.combat.selected_enemy_id = None;
        Ok(())
    }

    pub(crate) fn combat_resolve(&mut self, cfg: &BalanceConfig) -> Result<(), RejectReason> {
        self.require_player_turn("combat_resolve")?;
        self.combat.phase = Some(CombatPhase::Resolve);

        // Enemies felled earlier this round contribute nothing.
        let incoming: i32 = self
            .combat
            .enemies
            .iter()
            .filter_map(|enemy| enemy.attack_roll)
            .sum();
        self.combat.player_hp = (self.combat.player_hp - incoming).max(0);

        if self.combat.player_hp == 0 {
            self.is_game_over = true;
            self.phase = GamePhase::Menu;
            self.combat.reset_preserving_hp();
            self.push_log(LOG_COMBAT_DEFEAT);
            return Ok(());
        }
        if !self.combat.enemies.is_empty() {
            self.combat.phase = Some(CombatPhase::AwaitPlayer);
            self.push_log(LOG_COMBAT_AWAIT);
            return Ok(());
        }

        // Victory: the bonus is paid out by fast-forwarding the round clock
        // to the next period, never as a direct score credit.
        let period = cfg.rolls_per_period.max(1);
        let remaining = period - (self.successful_rolls % period);
        for _ in 0..remaining {
            self.complete_round_progress(cfg);
        }
        let bonus = i32::try_from(remaining).unwrap_or(0) * cfg.victory_bonus_per_round;
        self.combat.reset_preserving_hp();
        self.combat.last_victory_bonus = Some(bonus);
        self.sync_period_scores_after_combat();
        self.push_log(LOG_COMBAT_VICTORY);
        Ok(())
    }

    pub(crate) fn combat_end(&mut self) -> Result<(), RejectReason> {
        if !self.combat.is_active() {
            return Err(RejectReason::CombatInactive);
        }
        self.combat.reset_preserving_hp();
        self.push_log(LOG_COMBAT_END);
        Ok(())
    }

    fn require_player_turn(&self, action: &'static str) -> Result<(), RejectReason> {
        match self.combat.phase {
            None => Err(RejectReason::CombatInactive),
            Some(CombatPhase::PlayerTurn) => Ok(()),
            Some(phase) => Err(RejectReason::CombatWrongPhase { action, phase }),
        }
    }

    /// Categories still usable this combat round: achieved this period and
    /// reachable from the dice of the last settle that are not yet spent.
    #[must_use]
    pub fn available_abilities(&self) -> Vec<ScoreCategory> {
        let Some(roll) = &self.combat.current_dice_roll else {
            return Vec::new();
        };
        let remaining = unused_subset(roll, &self.combat.used_dice_ids);
        let reachable = calculate_scores(&remaining, self.current_attempts, &[], false);
        ScoreCategory::ALL
            .iter()
            .copied()
            .filter(|category| {
                let still_reachable = reachable
                    .iter()
                    .any(|entry| entry.category == *category && entry.achieved);
                let achieved_this_period = self
                    .scoring
                    .current_scores
                    .iter()
                    .any(|entry| entry.category == *category && entry.achieved);
                still_reachable && achieved_this_period
            })
            .collect()
    }
}

// Rebuild a roll from the dice whose ids are still unspent. Rolls without
// stable ids cannot be tracked per-die and pass through whole.
fn unused_subset(roll: &DiceRoll, used: &[u32]) -> DiceRoll {
    if roll.dice_ids.is_empty() {
        return roll.clone();
    }
    let mut subset = DiceRoll::default();
    for (index, value) in roll.values.iter().enumerate() {
        let Some(id) = roll.dice_ids.get(index).copied() else {
            continue;
        };
        if used.contains(&id) {
            continue;
        }
        subset.values.push(*value);
        subset.dice_ids.push(id);
        if let Some(multiplier) = roll.score_multipliers.get(index) {
            subset.score_multipliers.push(*multiplier);
        }
        subset.total += i32::from(*value);
    }
    subset
}
