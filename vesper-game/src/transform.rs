//! Cumulative per-die transformations.
//!
//! Items and curses attach transformations to individual dice; the
//! rendering/physics layer reads the composed effect bundle for sizing,
//! mass, and tinting, while the scoring path consumes the composed value
//! and score modifiers. Composition checks field *presence*, never
//! truthiness: a transformation that sets a multiplier to zero must
//! compose as zero.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Linear RGB tint applied to a die material.
pub type Tint = [f32; 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformationKind {
    TarotBoost,
    HellCorruption,
    WaxPolish,
    LeadHeart,
}

impl TransformationKind {
    pub const ALL: [TransformationKind; 4] = [
        Self::TarotBoost,
        Self::HellCorruption,
        Self::WaxPolish,
        Self::LeadHeart,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TarotBoost => "tarot_boost",
            Self::HellCorruption => "hell_corruption",
            Self::WaxPolish => "wax_polish",
            Self::LeadHeart => "lead_heart",
        }
    }
}

impl fmt::Display for TransformationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransformationKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tarot_boost" => Ok(Self::TarotBoost),
            "hell_corruption" => Ok(Self::HellCorruption),
            "wax_polish" => Ok(Self::WaxPolish),
            "lead_heart" => Ok(Self::LeadHeart),
            _ => Err(()),
        }
    }
}

/// One applied transformation. Fields left `None` do not participate in
/// composition; `Some(0.0)` does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiceTransformation {
    pub kind: TransformationKind,
    /// Round counter at application time, supplied by the caller.
    pub applied_at: u32,
    #[serde(default)]
    pub size_multiplier: Option<f32>,
    #[serde(default)]
    pub mass_multiplier: Option<f32>,
    #[serde(default)]
    pub friction_multiplier: Option<f32>,
    #[serde(default)]
    pub score_multiplier: Option<f32>,
    #[serde(default)]
    pub value_modifier: Option<i32>,
    #[serde(default)]
    pub color_tint: Option<Tint>,
    #[serde(default)]
    pub emissive: Option<Tint>,
    #[serde(default)]
    pub emissive_intensity: Option<f32>,
    #[serde(default)]
    pub reroll_chance: Option<f32>,
    pub stackable: bool,
}

impl DiceTransformation {
    /// Fixed template for a transformation kind.
    #[must_use]
    pub fn from_kind(kind: TransformationKind, applied_at: u32) -> Self {
        let blank = Self {
            kind,
            applied_at,
            size_multiplier: None,
            mass_multiplier: None,
            friction_multiplier: None,
            score_multiplier: None,
            value_modifier: None,
            color_tint: None,
            emissive: None,
            emissive_intensity: None,
            reroll_chance: None,
            stackable: true,
        };
        match kind {
            TransformationKind::TarotBoost => Self {
                size_multiplier: Some(1.08),
                score_multiplier: Some(1.2),
                ..blank
            },
            TransformationKind::HellCorruption => Self {
                color_tint: Some([0.55, 0.08, 0.08]),
                emissive: Some([0.35, 0.0, 0.0]),
                emissive_intensity: Some(0.6),
                stackable: false,
                ..blank
            },
            TransformationKind::WaxPolish => Self {
                friction_multiplier: Some(0.75),
                ..blank
            },
            TransformationKind::LeadHeart => Self {
                mass_multiplier: Some(1.6),
                value_modifier: Some(1),
                stackable: false,
                ..blank
            },
        }
    }
}

/// The composed effect of a transformation list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationEffects {
    pub size_multiplier: f32,
    pub mass_multiplier: f32,
    pub friction_multiplier: f32,
    pub score_multiplier: f32,
    pub value_modifier: i32,
    pub emissive_intensity: f32,
    pub reroll_chance: f32,
    pub color_tint: Option<Tint>,
    pub emissive: Option<Tint>,
}

impl Default for TransformationEffects {
    fn default() -> Self {
        Self {
            size_multiplier: 1.0,
            mass_multiplier: 1.0,
            friction_multiplier: 1.0,
            score_multiplier: 1.0,
            value_modifier: 0,
            emissive_intensity: 0.0,
            reroll_chance: 0.0,
            color_tint: None,
            emissive: None,
        }
    }
}

/// Append the template for `kind` unless a non-stackable copy already exists.
///
/// Returns `false` (leaving the list untouched) when the template is
/// non-stackable and one of that kind is already applied.
pub fn apply_transformation(
    list: &mut Vec<DiceTransformation>,
    kind: TransformationKind,
    applied_at: u32,
) -> bool {
    let template = DiceTransformation::from_kind(kind, applied_at);
    if !template.stackable && list.iter().any(|existing| existing.kind == kind) {
        return false;
    }
    list.push(template);
    true
}

/// Fold a transformation list into one effect bundle.
///
/// Multipliers compose multiplicatively, the value modifier additively,
/// emissive intensity and reroll chance take the maximum, and tints are
/// last-applied-wins.
#[must_use]
pub fn calculate_transformation_effects(list: &[DiceTransformation]) -> TransformationEffects {
    let mut effects = TransformationEffects::default();
    for transformation in list {
        if let Some(size) = transformation.size_multiplier {
            effects.size_multiplier *= size;
        }
        if let Some(mass) = transformation.mass_multiplier {
            effects.mass_multiplier *= mass;
        }
        if let Some(friction) = transformation.friction_multiplier {
            effects.friction_multiplier *= friction;
        }
        if let Some(score) = transformation.score_multiplier {
            effects.score_multiplier *= score;
        }
        if let Some(value) = transformation.value_modifier {
            effects.value_modifier += value;
        }
        if let Some(intensity) = transformation.emissive_intensity {
            effects.emissive_intensity = effects.emissive_intensity.max(intensity);
        }
        if let Some(chance) = transformation.reroll_chance {
            effects.reroll_chance = effects.reroll_chance.max(chance);
        }
        if let Some(tint) = transformation.color_tint {
            effects.color_tint = Some(tint);
        }
        if let Some(emissive) = transformation.emissive {
            effects.emissive = Some(emissive);
        }
    }
    effects
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stacking_tarot_boosts_compounds() {
        let mut list = Vec::new();
        assert!(apply_transformation(&mut list, TransformationKind::TarotBoost, 1));
        assert!(apply_transformation(&mut list, TransformationKind::TarotBoost, 2));
        let effects = calculate_transformation_effects(&list);
        assert!((effects.size_multiplier - 1.08 * 1.08).abs() < 1e-6);
        assert!((effects.score_multiplier - 1.44).abs() < 1e-6);
    }

    #[test]
    fn non_stackable_second_application_is_refused() {
        let mut list = Vec::new();
        assert!(apply_transformation(&mut list, TransformationKind::HellCorruption, 1));
        assert!(!apply_transformation(&mut list, TransformationKind::HellCorruption, 2));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn zero_multiplier_is_a_value_not_an_absence() {
        let mut frozen = DiceTransformation::from_kind(TransformationKind::LeadHeart, 1);
        frozen.mass_multiplier = Some(0.0);
        let effects = calculate_transformation_effects(&[frozen]);
        assert!(
            effects.mass_multiplier.abs() < f32::EPSILON,
            "a defined zero must compose as zero, not default to 1"
        );
    }

    #[test]
    fn tint_is_last_applied_wins_and_intensity_is_max() {
        let mut first = DiceTransformation::from_kind(TransformationKind::HellCorruption, 1);
        first.emissive_intensity = Some(0.9);
        let mut second = DiceTransformation::from_kind(TransformationKind::HellCorruption, 2);
        second.color_tint = Some([0.1, 0.2, 0.3]);
        second.emissive_intensity = Some(0.4);
        let effects = calculate_transformation_effects(&[first, second]);
        assert_eq!(effects.color_tint, Some([0.1, 0.2, 0.3]));
        assert!((effects.emissive_intensity - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn value_modifiers_add() {
        let lead = DiceTransformation::from_kind(TransformationKind::LeadHeart, 1);
        let mut second = DiceTransformation::from_kind(TransformationKind::WaxPolish, 2);
        second.value_modifier = Some(2);
        let effects = calculate_transformation_effects(&[lead, second]);
        assert_eq!(effects.value_modifier, 3);
    }

    #[test]
    fn empty_list_is_identity() {
        let effects = calculate_transformation_effects(&[]);
        assert_eq!(effects, TransformationEffects::default());
    }

    #[test]
    fn kind_string_round_trip() {
        for kind in TransformationKind::ALL {
            assert_eq!(kind.as_str().parse::<TransformationKind>(), Ok(kind));
        }
    }
}
