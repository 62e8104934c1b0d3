//! Inbound action interface.
//!
//! The rendering/input/physics layer translates raw intents into these
//! actions one-to-one and dispatches them through the reducer. The tag
//! encoding keeps the wire shape stable for the web layer.

use serde::{Deserialize, Serialize};

use crate::combat::EnemySpawn;
use crate::scoring::{DiceRoll, ScoreCategory};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    StartGame,
    ReturnToMenu,
    ThrowDice {
        /// Extra corruption per throw from passive items.
        #[serde(default)]
        corruption_per_roll: f32,
    },
    DiceSettled {
        dice_roll: DiceRoll,
        #[serde(default)]
        combo_multiplier_active: bool,
    },
    SuccessfulRoll {
        /// Corruption relief from the cigarette passive.
        #[serde(default)]
        cigarette_bonus: f32,
    },
    FailedRoll,
    ItemSelected,
    CombatStart {
        enemies: Vec<EnemySpawn>,
    },
    CombatEnemyRoll,
    CombatSelectAbility {
        category: ScoreCategory,
    },
    CombatSelectEnemy {
        enemy_id: u32,
    },
    CombatUseAbility {
        /// Explicit target; falls back to the stored selection.
        #[serde(default)]
        enemy_id: Option<u32>,
    },
    CombatResolve,
    CombatEnd,
}

impl Action {
    /// Stable action name used in rejection messages and journals.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::StartGame => "start_game",
            Self::ReturnToMenu => "return_to_menu",
            Self::ThrowDice { .. } => "throw_dice",
            Self::DiceSettled { .. } => "dice_settled",
            Self::SuccessfulRoll { .. } => "successful_roll",
            Self::FailedRoll => "failed_roll",
            Self::ItemSelected => "item_selected",
            Self::CombatStart { .. } => "combat_start",
            Self::CombatEnemyRoll => "combat_enemy_roll",
            Self::CombatSelectAbility { .. } => "combat_select_ability",
            Self::CombatSelectEnemy { .. } => "combat_select_enemy",
            Self::CombatUseAbility { .. } => "combat_use_ability",
            Self::CombatResolve => "combat_resolve",
            Self::CombatEnd => "combat_end",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_encode_with_stable_tags() {
        let json = serde_json::to_string(&Action::ThrowDice {
            corruption_per_roll: 0.01,
        })
        .unwrap();
        assert!(json.contains(r#""type":"throw_dice""#));

        let decoded: Action = serde_json::from_str(r#"{ "type": "failed_roll" }"#).unwrap();
        assert_eq!(decoded, Action::FailedRoll);
    }

    #[test]
    fn payload_defaults_apply_when_omitted() {
        let decoded: Action = serde_json::from_str(r#"{ "type": "successful_roll" }"#).unwrap();
        assert_eq!(
            decoded,
            Action::SuccessfulRoll {
                cigarette_bonus: 0.0
            }
        );

        let decoded: Action = serde_json::from_str(r#"{ "type": "combat_use_ability" }"#).unwrap();
        assert_eq!(decoded, Action::CombatUseAbility { enemy_id: None });
    }

    #[test]
    fn names_match_wire_tags() {
        assert_eq!(Action::CombatResolve.name(), "combat_resolve");
        assert_eq!(
            Action::DiceSettled {
                dice_roll: DiceRoll::default(),
                combo_multiplier_active: false
            }
            .name(),
            "dice_settled"
        );
    }
}
