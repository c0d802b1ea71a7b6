use barb_engine::attack::{choose_mode, AttackMode};
use barb_engine::history::ActionKind;
use barb_engine::turn::{run_turn, BonusAction, BonusOutcome, Turn, TurnExit, TurnPhase};
use barb_engine::{
    Answer, Character, CombatService, Dice, Interrupted, MemoryStore, Oracle, ScriptedOracle,
    SessionState, Settings, TurnError,
};
use serde_json::json;

fn barbarian(subclass: Option<&str>, gwm: bool) -> Character {
    serde_json::from_value(json!({
        "name": "Test Barbarian",
        "classes": [{ "name": "barbarian", "level": 5, "subclass": subclass }],
        "weapon": { "name": "Greataxe", "die": 12 },
        "base_stats": { "strength_modifier": 4, "constitution_modifier": 2 },
        "attack_modifiers": { "strength": 4, "proficiency": 3 },
        "features": {
            "brutal_strike": { "enabled": true },
            "great_weapon_master": { "enabled": gwm }
        }
    }))
    .expect("fixture parses")
}

fn service(character: Character, rages: u32, outcomes: Vec<u32>) -> (CombatService, MemoryStore) {
    let store = MemoryStore::new();
    let state = SessionState {
        heroic_inspiration: false,
        rages_remaining: rages,
        ..SessionState::default()
    };
    let svc = CombatService::new(
        character,
        state,
        Settings::default(),
        Dice::from_scripted(outcomes),
        Box::new(store.clone()),
    );
    (svc, store)
}

#[test]
fn accepting_rage_at_turn_start_spends_one_rage() {
    let (mut svc, store) = service(barbarian(None, false), 3, vec![]);
    let mut oracle = ScriptedOracle::new([Answer::Default]);
    let mut turn = Turn::new();
    let raged = turn.begin(&mut svc, &mut oracle).expect("turn starts");

    assert!(oracle.was_asked("Activate Rage? (3 remaining)"));
    assert!(matches!(
        raged,
        Some(BonusOutcome::RageStarted { remaining: 2, surge: None })
    ));
    assert!(svc.state().rage_active);
    assert_eq!(svc.state().rages_remaining, 2);
    assert_eq!(turn.phase(), TurnPhase::InTurn);
    assert!(!turn.bonus_action_used());
    assert_eq!(store.saved_session().expect("saved").rages_remaining, 2);
    assert_eq!(svc.history().current().expect("open").actions.len(), 1);
}

#[test]
fn interrupted_rage_prompt_leaves_rage_off() {
    let (mut svc, _) = service(barbarian(None, false), 3, vec![]);
    let mut oracle = ScriptedOracle::default();
    let mut turn = Turn::new();
    let raged = turn.begin(&mut svc, &mut oracle).expect("turn starts");

    assert!(raged.is_none());
    assert!(!svc.state().rage_active);
    assert_eq!(svc.state().rages_remaining, 3);
}

#[test]
fn no_rage_prompt_without_rages_left() {
    let (mut svc, _) = service(barbarian(None, false), 0, vec![]);
    let mut oracle = ScriptedOracle::default();
    Turn::new().begin(&mut svc, &mut oracle).expect("turn starts");
    assert!(oracle.asked().is_empty());
}

#[test]
fn wild_magic_rage_rolls_a_surge_that_can_be_repeated() {
    let (mut svc, _) = service(barbarian(Some("wild_magic"), false), 3, vec![3, 5]);
    let mut oracle = ScriptedOracle::new([Answer::Yes]);
    let mut turn = Turn::new();
    turn.begin(&mut svc, &mut oracle).expect("turn starts");

    let surge = svc.current_surge().expect("surge rolled");
    assert_eq!(surge.roll, 3);
    assert!(surge.bonus_action_repeatable);

    let actions = turn.bonus_actions(&svc);
    assert_eq!(actions, vec![BonusAction::EndRage, BonusAction::SurgeEffect]);

    let outcome = turn
        .take_bonus_action(&mut svc, &mut oracle, BonusAction::SurgeEffect)
        .expect("surge repeats");
    match outcome {
        BonusOutcome::Surge(s) => {
            assert_eq!(s.rolled, Some(5));
            assert!(s.summary.contains("5 force damage"));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(turn.bonus_actions(&svc).is_empty());
}

#[test]
fn attacks_are_capped_per_turn() {
    let (mut svc, _) = service(barbarian(None, false), 0, vec![3, 4, 2, 5]);
    let mut oracle = ScriptedOracle::new([Answer::No, Answer::No]);
    let mut turn = Turn::new();
    turn.begin(&mut svc, &mut oracle).expect("turn starts");
    assert_eq!(turn.max_attacks(), 2);

    turn.attack(&mut svc, &mut oracle, AttackMode::Reckless).expect("first");
    turn.attack(&mut svc, &mut oracle, AttackMode::Reckless).expect("second");
    let third = turn.attack(&mut svc, &mut oracle, AttackMode::Reckless);
    assert_eq!(third, Err(TurnError::NoAttacksLeft { used: 2, max: 2 }));
}

#[test]
fn only_one_bonus_action_per_turn() {
    let (mut svc, _) = service(barbarian(None, false), 3, vec![]);
    let mut oracle = ScriptedOracle::new([Answer::Yes]);
    let mut turn = Turn::new();
    turn.begin(&mut svc, &mut oracle).expect("turn starts");

    let ended = turn
        .take_bonus_action(&mut svc, &mut oracle, BonusAction::EndRage)
        .expect("rage ends");
    assert_eq!(ended, BonusOutcome::RageEnded);
    assert!(!svc.state().rage_active);

    let again = turn.take_bonus_action(&mut svc, &mut oracle, BonusAction::ActivateRage);
    assert_eq!(again, Err(TurnError::BonusActionUsed));
    assert_eq!(svc.state().rages_remaining, 2);
}

#[test]
fn unoffered_bonus_action_is_refused() {
    let (mut svc, _) = service(barbarian(None, true), 0, vec![]);
    let mut oracle = ScriptedOracle::default();
    let mut turn = Turn::new();
    turn.begin(&mut svc, &mut oracle).expect("turn starts");

    let hew = turn.take_bonus_action(&mut svc, &mut oracle, BonusAction::GreatWeaponHew);
    assert!(matches!(hew, Err(TurnError::Unavailable(_))));
    assert!(!turn.bonus_action_used());
}

#[test]
fn critical_hit_unlocks_the_hew() {
    let (mut svc, _) = service(barbarian(None, true), 0, vec![20, 5, 6, 10]);
    // hit, add brutal? no, then the hew: pick normal, miss, decline reroll
    let mut oracle = ScriptedOracle::new([
        Answer::Yes,
        Answer::No,
        Answer::Pick(0),
        Answer::No,
        Answer::No,
    ]);
    let mut turn = Turn::new();
    turn.begin(&mut svc, &mut oracle).expect("turn starts");

    let first = turn
        .attack(&mut svc, &mut oracle, AttackMode::Normal)
        .expect("attack");
    assert!(first.critical);
    assert!(turn.critical_hit());
    assert!(turn.hew_available());
    assert_eq!(turn.bonus_actions(&svc), vec![BonusAction::GreatWeaponHew]);

    let hew = turn
        .take_bonus_action(&mut svc, &mut oracle, BonusAction::GreatWeaponHew)
        .expect("hew");
    match hew {
        BonusOutcome::Hew(a) => assert!(!a.hit),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(turn.bonus_action_used());
    assert!(!turn.hew_available());
    assert_eq!(turn.attacks_used(), 1);
}

#[test]
fn hew_needs_great_weapon_master() {
    let (mut svc, _) = service(barbarian(None, false), 0, vec![20, 5, 6]);
    let mut oracle = ScriptedOracle::new([Answer::Yes, Answer::No]);
    let mut turn = Turn::new();
    turn.begin(&mut svc, &mut oracle).expect("turn starts");
    turn.attack(&mut svc, &mut oracle, AttackMode::Normal).expect("attack");

    assert!(turn.critical_hit());
    assert!(!turn.hew_available());
    assert!(turn.bonus_actions(&svc).is_empty());
}

#[test]
fn ending_the_turn_restores_once_per_turn_features() {
    let (mut svc, store) = service(barbarian(None, false), 0, vec![14, 6, 3]);
    let mut oracle = ScriptedOracle::default();
    let mut turn = Turn::new();
    turn.begin(&mut svc, &mut oracle).expect("turn starts");
    turn.attack(&mut svc, &mut oracle, AttackMode::BrutalStrike)
        .expect("attack");
    // Interrupted hit question: a miss, so spend brutal strike directly.
    svc.use_brutal_strike();
    assert!(!svc.state().brutal_strike_available);

    turn.end(&mut svc).expect("turn ends");
    assert_eq!(turn.phase(), TurnPhase::Ended);
    assert!(svc.state().brutal_strike_available);
    assert_eq!(svc.state().current_turn, 2);
    assert_eq!(svc.history().count(), 1);
    assert_eq!(store.saved_session().expect("saved").current_turn, 2);
}

#[test]
fn actions_need_an_open_turn() {
    let (mut svc, _) = service(barbarian(None, false), 0, vec![]);
    let mut oracle = ScriptedOracle::default();
    let mut turn = Turn::new();

    assert_eq!(
        turn.attack(&mut svc, &mut oracle, AttackMode::Normal).map(|_| ()),
        Err(TurnError::NotInTurn)
    );
    assert_eq!(turn.end(&mut svc), Err(TurnError::NotInTurn));
    assert!(turn.bonus_actions(&svc).is_empty());

    turn.begin(&mut svc, &mut oracle).expect("turn starts");
    turn.end(&mut svc).expect("turn ends");
    assert_eq!(turn.end(&mut svc), Err(TurnError::NotInTurn));
    assert!(turn.begin(&mut svc, &mut oracle).is_err());
}

#[test]
fn run_turn_drives_the_menu_until_the_turn_ends() {
    let (mut svc, _) = service(barbarian(None, false), 0, vec![8, 9]);
    let mut oracle = ScriptedOracle::new([
        Answer::Pick(0), // attack
        Answer::Pick(1), // reckless
        Answer::No,      // missed
        Answer::Pick(1), // end turn
    ]);
    let mut lines = Vec::new();
    let exit = run_turn(&mut svc, &mut Turn::new(), &mut oracle, |l| lines.push(l))
        .expect("turn runs");

    assert_eq!(exit, TurnExit::Ended);
    assert_eq!(svc.state().current_turn, 2);
    assert!(lines.iter().any(|l| l.starts_with("[ATTACK][reckless]") && l.ends_with("MISS")));
    assert_eq!(lines.last().map(String::as_str), Some("[TURN] ended, 0 damage dealt"));
}

#[test]
fn run_turn_stops_on_an_interrupted_menu() {
    let (mut svc, _) = service(barbarian(None, false), 0, vec![]);
    let mut oracle = ScriptedOracle::default();
    let mut turn = Turn::new();
    let result = run_turn(&mut svc, &mut turn, &mut oracle, |_| {});

    assert_eq!(result, Err(TurnError::Interrupted(Interrupted)));
    assert_eq!(svc.state().current_turn, 1);
    assert!(turn.is_open_for(&svc));
}

#[test]
fn leaving_and_coming_back_keeps_the_turn_budget() {
    let (mut svc, _) = service(barbarian(None, false), 3, vec![3, 4, 5, 6]);
    let mut oracle = ScriptedOracle::new([
        Answer::Yes,     // rage
        Answer::Pick(0), // attack
        Answer::Pick(1), // reckless
        Answer::No,      // missed
        Answer::Pick(0), // attack
        Answer::Pick(1), // reckless
        Answer::No,      // missed
        Answer::Pick(2), // back to main menu
    ]);
    let mut turn = Turn::new();
    let exit = run_turn(&mut svc, &mut turn, &mut oracle, |_| {}).expect("first visit");
    assert_eq!(exit, TurnExit::Left);
    assert_eq!(turn.attacks_remaining(), 0);

    // No attack left on the menu: bonus action, end turn, back.
    let mut oracle = ScriptedOracle::new([
        Answer::Pick(0), // bonus action
        Answer::Pick(0), // end rage
        Answer::Pick(0), // end turn
    ]);
    let mut lines = Vec::new();
    let exit = run_turn(&mut svc, &mut turn, &mut oracle, |l| lines.push(l)).expect("second visit");
    assert_eq!(exit, TurnExit::Ended);
    assert_eq!(lines.first().map(String::as_str), Some("[TURN] 1 resumes"));
    assert!(!oracle.was_asked("Activate Rage"));
    assert!(!oracle.was_asked("Choose attack type"));

    assert_eq!(svc.state().current_turn, 2);
    assert_eq!(svc.state().rages_remaining, 2);
    assert_eq!(svc.history().count(), 1);
    let summary = &svc.history().turns()[0];
    assert_eq!(summary.turn_number, 1);
    let attacks = summary
        .actions
        .iter()
        .filter(|a| a.kind == ActionKind::Attack)
        .count();
    assert_eq!(attacks, 2);
    assert_eq!(summary.actions.len(), 4);
}

#[test]
fn a_finished_turn_is_replaced_by_the_next_one() {
    let (mut svc, _) = service(barbarian(None, false), 0, vec![]);
    let mut turn = Turn::new();
    let mut oracle = ScriptedOracle::new([Answer::Pick(2)]);
    run_turn(&mut svc, &mut turn, &mut oracle, |_| {}).expect("leave");
    assert_eq!(turn.phase(), TurnPhase::InTurn);

    turn.end(&mut svc).expect("turn ends");
    let mut oracle = ScriptedOracle::new([Answer::Pick(2)]);
    let mut lines = Vec::new();
    run_turn(&mut svc, &mut turn, &mut oracle, |l| lines.push(l)).expect("next turn");
    assert_eq!(lines, vec!["[TURN] 2 begins".to_string()]);
    assert_eq!(turn.number(), 2);
    assert_eq!(turn.attacks_remaining(), 2);
}

/// Answers every menu with the same index, valid or not.
struct FixedPick(usize);

impl Oracle for FixedPick {
    fn confirm(&mut self, _question: &str, _default: bool) -> Result<bool, Interrupted> {
        Ok(false)
    }

    fn choose(&mut self, _question: &str, _options: &[String]) -> Result<usize, Interrupted> {
        Ok(self.0)
    }
}

#[test]
fn out_of_range_menu_picks_read_as_interrupted() {
    let (mut svc, _) = service(barbarian(None, false), 3, vec![]);
    assert_eq!(choose_mode(&svc, &mut FixedPick(7)), Err(Interrupted));

    let mut turn = Turn::new();
    let result = run_turn(&mut svc, &mut turn, &mut FixedPick(7), |_| {});
    assert_eq!(result, Err(TurnError::Interrupted(Interrupted)));
    assert!(!svc.state().rage_active);
}
