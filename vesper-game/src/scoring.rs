//! Dice-roll scoring engine.
//!
//! Pure classification of a settled throw into the nine fixed score
//! categories, plus the per-period high-water-mark merge. The input roll
//! must already be filtered to dice that settled inside the scoring
//! receptacle; the physics layer owns that classification.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::numbers::round_f32_to_i32;

/// Face values of one throw, stored inline.
pub type DiceValues = SmallVec<[u8; 6]>;
/// Physical die identifiers, stored inline.
pub type DiceIds = SmallVec<[u32; 6]>;
/// Per-die score weights, stored inline.
pub type DiceMultipliers = SmallVec<[f32; 6]>;

pub const SCORE_CATEGORY_COUNT: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    HighestTotal,
    Pair,
    TwoPair,
    ThreeOfKind,
    FourOfKind,
    RunOf3,
    RunOf4,
    RunOf5,
    RunOf6,
}

impl ScoreCategory {
    /// All categories in their stable display order.
    pub const ALL: [ScoreCategory; SCORE_CATEGORY_COUNT] = [
        Self::HighestTotal,
        Self::Pair,
        Self::TwoPair,
        Self::ThreeOfKind,
        Self::FourOfKind,
        Self::RunOf3,
        Self::RunOf4,
        Self::RunOf5,
        Self::RunOf6,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HighestTotal => "highest_total",
            Self::Pair => "pair",
            Self::TwoPair => "two_pair",
            Self::ThreeOfKind => "three_of_kind",
            Self::FourOfKind => "four_of_kind",
            Self::RunOf3 => "run_of_3",
            Self::RunOf4 => "run_of_4",
            Self::RunOf5 => "run_of_5",
            Self::RunOf6 => "run_of_6",
        }
    }

    /// The exact run length a run category requires, if it is one.
    #[must_use]
    pub const fn required_run_len(self) -> Option<usize> {
        match self {
            Self::RunOf3 => Some(3),
            Self::RunOf4 => Some(4),
            Self::RunOf5 => Some(5),
            Self::RunOf6 => Some(6),
            _ => None,
        }
    }
}

impl fmt::Display for ScoreCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoreCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "highest_total" => Ok(Self::HighestTotal),
            "pair" => Ok(Self::Pair),
            "two_pair" => Ok(Self::TwoPair),
            "three_of_kind" => Ok(Self::ThreeOfKind),
            "four_of_kind" => Ok(Self::FourOfKind),
            "run_of_3" => Ok(Self::RunOf3),
            "run_of_4" => Ok(Self::RunOf4),
            "run_of_5" => Ok(Self::RunOf5),
            "run_of_6" => Ok(Self::RunOf6),
            _ => Err(()),
        }
    }
}

/// One settled throw as reported by the physics layer.
///
/// Only dice inside the receptacle may appear here. `dice_ids` and
/// `score_multipliers` are parallel to `values` when present; integrations
/// without stable die identities may leave them empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DiceRoll {
    pub values: DiceValues,
    pub total: i32,
    #[serde(default)]
    pub dice_ids: DiceIds,
    #[serde(default)]
    pub score_multipliers: DiceMultipliers,
}

impl DiceRoll {
    /// Build a roll from plain face values, computing the unweighted total.
    #[must_use]
    pub fn from_values(values: &[u8]) -> Self {
        Self {
            values: DiceValues::from_slice(values),
            total: values.iter().map(|v| i32::from(*v)).sum(),
            dice_ids: DiceIds::new(),
            score_multipliers: DiceMultipliers::new(),
        }
    }

    /// Attach physical die identifiers, parallel to `values`.
    #[must_use]
    pub fn with_ids(mut self, ids: &[u32]) -> Self {
        self.dice_ids = DiceIds::from_slice(ids);
        self
    }

    /// Score weight for the die at `index`, defaulting to 1.0.
    #[must_use]
    pub fn multiplier_at(&self, index: usize) -> f32 {
        self.score_multipliers.get(index).copied().unwrap_or(1.0)
    }

    fn id_at(&self, index: usize) -> Option<u32> {
        self.dice_ids.get(index).copied()
    }
}

/// Per-category result of classifying one or more throws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCategoryData {
    pub category: ScoreCategory,
    pub score: i32,
    pub achieved: bool,
    #[serde(default)]
    pub dice_values: DiceValues,
    #[serde(default)]
    pub dice_ids: DiceIds,
    #[serde(default)]
    pub combo_count: u32,
    #[serde(default = "default_one_f32")]
    pub multi_score_multiplier: f32,
    #[serde(default)]
    pub last_updated_attempt: Option<u32>,
}

fn default_one_f32() -> f32 {
    1.0
}

impl ScoreCategoryData {
    fn empty(category: ScoreCategory) -> Self {
        Self {
            category,
            score: 0,
            achieved: false,
            dice_values: DiceValues::new(),
            dice_ids: DiceIds::new(),
            combo_count: 0,
            multi_score_multiplier: 1.0,
            last_updated_attempt: None,
        }
    }
}

/// All nine categories, zeroed and unachieved, in stable order.
#[must_use]
pub fn initialize_empty_scores() -> Vec<ScoreCategoryData> {
    ScoreCategory::ALL
        .iter()
        .map(|category| ScoreCategoryData::empty(*category))
        .collect()
}

/// Sum of the achieved category scores; feeds the daily best bookkeeping.
#[must_use]
pub fn achieved_bucket_total(scores: &[ScoreCategoryData]) -> i32 {
    scores
        .iter()
        .filter(|entry| entry.achieved)
        .map(|entry| entry.score)
        .sum()
}

/// Classify one throw into the nine categories.
///
/// Categories are evaluated independently; one throw may satisfy several at
/// once. Run categories match the longest strictly-consecutive run of
/// distinct values by exact length only: a run of five does not also score
/// as a run of four. An empty roll yields every category unachieved.
#[must_use]
pub fn calculate_scores(
    roll: &DiceRoll,
    attempt_number: u32,
    previous_scores: &[ScoreCategoryData],
    combo_active: bool,
) -> Vec<ScoreCategoryData> {
    calculate_scores_with_step(
        roll,
        attempt_number,
        previous_scores,
        combo_active,
        crate::constants::COMBO_BONUS_STEP,
    )
}

/// [`calculate_scores`] with an explicit combo bonus step.
#[must_use]
pub fn calculate_scores_with_step(
    roll: &DiceRoll,
    attempt_number: u32,
    previous_scores: &[ScoreCategoryData],
    combo_active: bool,
    combo_bonus_step: f32,
) -> Vec<ScoreCategoryData> {
    let mut out = initialize_empty_scores();
    if roll.values.is_empty() {
        return out;
    }

    // Face value -> indices of the dice showing it, ascending.
    let mut groups: BTreeMap<u8, SmallVec<[usize; 6]>> = BTreeMap::new();
    for (index, value) in roll.values.iter().enumerate() {
        groups.entry(*value).or_default().push(index);
    }

    score_highest_total(roll, &mut out);
    score_of_a_kind(roll, &groups, &mut out);
    score_two_pair(roll, &groups, &mut out);
    score_runs(roll, &groups, &mut out);

    for entry in &mut out {
        if !entry.achieved {
            continue;
        }
        entry.last_updated_attempt = Some(attempt_number);
        if combo_active {
            apply_combo(entry, previous_scores, combo_bonus_step);
        }
    }
    out
}

fn entry_mut(out: &mut [ScoreCategoryData], category: ScoreCategory) -> &mut ScoreCategoryData {
    let index = ScoreCategory::ALL
        .iter()
        .position(|candidate| *candidate == category)
        .unwrap_or(0);
    &mut out[index]
}

fn mark(
    out: &mut [ScoreCategoryData],
    category: ScoreCategory,
    score: i32,
    dice_values: DiceValues,
    dice_ids: DiceIds,
) {
    let entry = entry_mut(out, category);
    entry.score = score;
    entry.achieved = true;
    entry.dice_values = dice_values;
    entry.dice_ids = dice_ids;
}

fn score_highest_total(roll: &DiceRoll, out: &mut [ScoreCategoryData]) {
    let weighted: f32 = roll
        .values
        .iter()
        .enumerate()
        .map(|(index, value)| f32::from(*value) * roll.multiplier_at(index))
        .sum();
    let ids: DiceIds = roll.dice_ids.iter().copied().collect();
    mark(
        out,
        ScoreCategory::HighestTotal,
        round_f32_to_i32(weighted),
        roll.values.clone(),
        ids,
    );
}

fn score_of_a_kind(
    roll: &DiceRoll,
    groups: &BTreeMap<u8, SmallVec<[usize; 6]>>,
    out: &mut [ScoreCategoryData],
) {
    for (required, category) in [
        (2usize, ScoreCategory::Pair),
        (3, ScoreCategory::ThreeOfKind),
        (4, ScoreCategory::FourOfKind),
    ] {
        let best = groups
            .iter()
            .rev()
            .find(|(_, indices)| indices.len() >= required);
        if let Some((value, indices)) = best {
            let used = &indices[..required];
            let score = i32::from(*value) * i32::try_from(required).unwrap_or(0);
            let dice_values: DiceValues = used.iter().map(|_| *value).collect();
            let dice_ids: DiceIds = used.iter().filter_map(|index| roll.id_at(*index)).collect();
            mark(out, category, score, dice_values, dice_ids);
        }
    }
}

fn score_two_pair(
    roll: &DiceRoll,
    groups: &BTreeMap<u8, SmallVec<[usize; 6]>>,
    out: &mut [ScoreCategoryData],
) {
    // Two distinct values holding exactly a pair each, preferring the
    // highest. A value showing three or more times is a triple or quad,
    // not a pair, and does not count here.
    let mut pairs = groups
        .iter()
        .rev()
        .filter(|(_, indices)| indices.len() == 2)
        .take(2);
    let (Some((high, high_indices)), Some((low, low_indices))) = (pairs.next(), pairs.next())
    else {
        return;
    };
    let score = (i32::from(*high) + i32::from(*low)) * 2;
    let mut dice_values = DiceValues::new();
    let mut dice_ids = DiceIds::new();
    for (value, indices) in [(high, high_indices), (low, low_indices)] {
        for index in &indices[..2] {
            dice_values.push(*value);
            if let Some(id) = roll.id_at(*index) {
                dice_ids.push(id);
            }
        }
    }
    mark(out, ScoreCategory::TwoPair, score, dice_values, dice_ids);
}

fn score_runs(
    roll: &DiceRoll,
    groups: &BTreeMap<u8, SmallVec<[usize; 6]>>,
    out: &mut [ScoreCategoryData],
) {
    let distinct: Vec<u8> = groups.keys().copied().collect();
    if distinct.is_empty() {
        return;
    }

    // Longest strictly-consecutive stretch of distinct values; ties go to
    // the higher-valued stretch.
    let mut best_start = 0usize;
    let mut best_len = 1usize;
    let mut start = 0usize;
    for index in 1..distinct.len() {
        if distinct[index] != distinct[index - 1].saturating_add(1) {
            start = index;
        }
        let len = index - start + 1;
        if len >= best_len {
            best_len = len;
            best_start = start;
        }
    }

    let category = match best_len {
        3 => ScoreCategory::RunOf3,
        4 => ScoreCategory::RunOf4,
        5 => ScoreCategory::RunOf5,
        6 => ScoreCategory::RunOf6,
        _ => return,
    };
    let run = &distinct[best_start..best_start + best_len];
    let score: i32 = run.iter().map(|value| i32::from(*value)).sum();
    let dice_values: DiceValues = run.iter().copied().collect();
    let dice_ids: DiceIds = run
        .iter()
        .filter_map(|value| {
            groups
                .get(value)
                .and_then(|indices| indices.first())
                .and_then(|index| roll.id_at(*index))
        })
        .collect();
    mark(out, category, score, dice_values, dice_ids);
}

fn apply_combo(
    entry: &mut ScoreCategoryData,
    previous_scores: &[ScoreCategoryData],
    combo_bonus_step: f32,
) {
    let Some(previous) = previous_scores
        .iter()
        .find(|candidate| candidate.category == entry.category && candidate.achieved)
    else {
        return;
    };
    if !dice_overlap(&entry.dice_ids, &previous.dice_ids) {
        return;
    }
    entry.combo_count = previous.combo_count.saturating_add(1);
    #[allow(clippy::cast_precision_loss)]
    let multiplier = 1.0 + combo_bonus_step * entry.combo_count as f32;
    entry.multi_score_multiplier = multiplier;
    #[allow(clippy::cast_precision_loss)]
    let boosted = entry.score as f32 * multiplier;
    entry.score = round_f32_to_i32(boosted);
}

// Integrations without stable die ids still get combos on a bare repeat.
fn dice_overlap(current: &DiceIds, previous: &DiceIds) -> bool {
    if current.is_empty() || previous.is_empty() {
        return true;
    }
    current.iter().any(|id| previous.contains(id))
}

/// High-water-mark merge of a fresh classification into the period best.
///
/// A category is replaced only when the new score is strictly higher, or
/// when it was not yet achieved and now is. Order and the fixed category
/// set are preserved.
#[must_use]
pub fn update_best_scores(
    current_best: &[ScoreCategoryData],
    new_scores: &[ScoreCategoryData],
) -> Vec<ScoreCategoryData> {
    ScoreCategory::ALL
        .iter()
        .map(|category| {
            let old = current_best
                .iter()
                .find(|entry| entry.category == *category);
            let new = new_scores.iter().find(|entry| entry.category == *category);
            match (old, new) {
                (Some(old), Some(new)) => {
                    if new.score > old.score || (!old.achieved && new.achieved) {
                        new.clone()
                    } else {
                        old.clone()
                    }
                }
                (Some(only), None) | (None, Some(only)) => only.clone(),
                (None, None) => ScoreCategoryData::empty(*category),
            }
        })
        .collect()
}
