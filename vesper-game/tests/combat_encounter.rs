#![allow(clippy::field_reassign_with_default)]

use vesper_game::{
    Action, CombatPhase, DiceRoll, EnemyKind, EnemySpawn, GamePhase, GameSession, ScoreCategory,
    TimeOfDay,
};

fn spawn(kind: EnemyKind, hp: i32) -> EnemySpawn {
    EnemySpawn {
        kind,
        position: [0.0, 0.0, 0.0],
        hp,
    }
}

/// Start a run and bank a pair of fives plus a run of three.
fn arm_session(seed: u64) -> GameSession {
    let mut session = GameSession::new(seed);
    assert!(session.dispatch(Action::StartGame).is_applied());
    assert!(session.dispatch(Action::ItemSelected).is_applied());
    assert!(
        session
            .dispatch(Action::ThrowDice {
                corruption_per_roll: 0.0
            })
            .is_applied()
    );
    assert!(
        session
            .dispatch(Action::DiceSettled {
                dice_roll: DiceRoll::from_values(&[5, 5, 1, 2, 3]).with_ids(&[1, 2, 3, 4, 5]),
                combo_multiplier_active: false,
            })
            .is_applied()
    );
    session
}

#[test]
fn encounter_runs_spawn_roll_turn_resolve() {
    let mut session = arm_session(17);
    assert!(
        session
            .dispatch(Action::CombatStart {
                enemies: vec![spawn(EnemyKind::Shade, 9), spawn(EnemyKind::Maw, 40)],
            })
            .is_applied()
    );
    assert_eq!(session.state().combat.phase, Some(CombatPhase::EnemySpawn));

    assert!(session.dispatch(Action::CombatEnemyRoll).is_applied());
    assert_eq!(session.state().combat.phase, Some(CombatPhase::PlayerTurn));
    assert!(
        session
            .state()
            .combat
            .enemies
            .iter()
            .all(|enemy| enemy.attack_roll.is_some() && enemy.dice_value.is_some())
    );

    // Pair of fives (10) fells the shade outright.
    assert!(
        session
            .dispatch(Action::CombatSelectAbility {
                category: ScoreCategory::Pair
            })
            .is_applied()
    );
    assert!(
        session
            .dispatch(Action::CombatSelectEnemy { enemy_id: 1 })
            .is_applied()
    );
    assert!(
        session
            .dispatch(Action::CombatUseAbility { enemy_id: None })
            .is_applied()
    );
    assert_eq!(session.state().combat.enemies.len(), 1);
    assert_eq!(session.state().combat.enemies[0].kind, EnemyKind::Maw);

    let hp_before = session.state().combat.player_hp;
    assert!(session.dispatch(Action::CombatResolve).is_applied());
    assert_eq!(session.state().combat.phase, Some(CombatPhase::AwaitPlayer));
    let taken = hp_before - session.state().combat.player_hp;
    assert!(
        (1..=4).contains(&taken),
        "one surviving attacker hits for a d4, took {taken}"
    );

    // Next combat round: dice come back and the turn returns.
    assert!(session.dispatch(Action::CombatEnemyRoll).is_applied());
    assert!(session.state().combat.used_dice_ids.is_empty());
    assert!(
        session
            .state()
            .available_abilities()
            .contains(&ScoreCategory::Pair)
    );
}

#[test]
fn clearing_the_room_fast_forwards_the_period_clock() {
    let mut session = arm_session(23);
    session.with_state_mut(|state| state.successful_rolls = 1);
    assert_eq!(session.state().time_of_day, TimeOfDay::Morning);

    assert!(
        session
            .dispatch(Action::CombatStart {
                enemies: vec![spawn(EnemyKind::Marionette, 6)],
            })
            .is_applied()
    );
    assert!(session.dispatch(Action::CombatEnemyRoll).is_applied());
    assert!(
        session
            .dispatch(Action::CombatSelectAbility {
                category: ScoreCategory::RunOf3
            })
            .is_applied()
    );
    assert!(
        session
            .dispatch(Action::CombatUseAbility { enemy_id: Some(1) })
            .is_applied()
    );
    assert!(session.state().combat.enemies.is_empty());
    assert!(session.dispatch(Action::CombatResolve).is_applied());

    // Two rounds remained until midday; the victory banks exactly those.
    let state = session.state();
    assert_eq!(state.successful_rolls, 3);
    assert_eq!(state.time_of_day, TimeOfDay::Midday);
    assert_eq!(state.combat.phase, None);
    assert_eq!(state.combat.last_victory_bonus, Some(20));
    assert!(!state.is_game_over);
    assert!(
        state
            .scoring
            .current_scores
            .iter()
            .all(|entry| !entry.achieved)
    );
}

#[test]
fn losing_the_fight_ends_the_run() {
    let mut session = arm_session(29);
    assert!(
        session
            .dispatch(Action::CombatStart {
                enemies: vec![spawn(EnemyKind::Maw, 1000); 5],
            })
            .is_applied()
    );
    let mut rounds = 0;
    while !session.state().is_game_over {
        assert!(session.dispatch(Action::CombatEnemyRoll).is_applied());
        assert!(session.dispatch(Action::CombatResolve).is_applied());
        rounds += 1;
        assert!(rounds < 50, "five maws must overwhelm the player quickly");
    }
    assert_eq!(session.state().phase, GamePhase::Menu);
    assert_eq!(session.state().combat.phase, None);
    assert_eq!(session.state().combat.player_hp, 0);

    // Starting again recovers cleanly from the defeat.
    assert!(session.dispatch(Action::StartGame).is_applied());
    assert!(!session.state().is_game_over);
    assert_eq!(session.state().phase, GamePhase::ItemSelection);
}

#[test]
fn highest_total_raises_the_hp_ceiling_between_fights() {
    let mut session = arm_session(31);
    let first_max = session.state().combat.max_player_hp;
    assert_eq!(first_max, 16, "5+5+1+2+3 set the opening ceiling");

    assert!(
        session
            .dispatch(Action::SuccessfulRoll {
                cigarette_bonus: 0.0
            })
            .is_applied()
    );
    assert!(
        session
            .dispatch(Action::ThrowDice {
                corruption_per_roll: 0.0
            })
            .is_applied()
    );
    assert!(
        session
            .dispatch(Action::DiceSettled {
                dice_roll: DiceRoll::from_values(&[6, 6, 6, 6]),
                combo_multiplier_active: false,
            })
            .is_applied()
    );
    assert_eq!(session.state().combat.max_player_hp, 24);
    assert_eq!(session.state().combat.player_hp, 24);

    // A weaker throw later never lowers the ceiling.
    assert!(
        session
            .dispatch(Action::SuccessfulRoll {
                cigarette_bonus: 0.0
            })
            .is_applied()
    );
    assert!(
        session
            .dispatch(Action::ThrowDice {
                corruption_per_roll: 0.0
            })
            .is_applied()
    );
    assert!(
        session
            .dispatch(Action::DiceSettled {
                dice_roll: DiceRoll::from_values(&[1, 1]),
                combo_multiplier_active: false,
            })
            .is_applied()
    );
    assert_eq!(session.state().combat.max_player_hp, 24);
}
