//! One combat turn: optional rage at the start, a budget of attacks, a
//! single bonus action, then cleanup.

use tracing::{debug, info};

use crate::attack::{choose_mode, describe_roll, resolve_attack, AttackMode, AttackOutcome, FollowUp};
use crate::damage::describe_damage;
use crate::error::{Interrupted, TurnError};
use crate::history::TurnAction;
use crate::oracle::{confirm_or_decline, Oracle};
use crate::service::CombatService;
use crate::surge::{SurgeBonusOutcome, SurgeEffect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    NotStarted,
    InTurn,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BonusAction {
    ActivateRage,
    EndRage,
    /// Extra attack after a critical hit.
    GreatWeaponHew,
    /// Re-use the active wild magic effect.
    SurgeEffect,
}

impl BonusAction {
    pub fn label(self) -> &'static str {
        match self {
            BonusAction::ActivateRage => "Activate Rage",
            BonusAction::EndRage => "End Rage",
            BonusAction::GreatWeaponHew => "Great Weapon Master hew",
            BonusAction::SurgeEffect => "Wild Magic effect",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BonusOutcome {
    RageStarted {
        remaining: u32,
        surge: Option<SurgeEffect>,
    },
    RageEnded,
    Hew(AttackOutcome),
    Surge(SurgeBonusOutcome),
}

/// How [`run_turn`] finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnExit {
    Ended,
    /// Player backed out to the main menu without ending the turn.
    Left,
}

#[derive(Debug, Clone)]
pub struct Turn {
    phase: TurnPhase,
    number: u32,
    attacks_used: u32,
    max_attacks: u32,
    bonus_action_used: bool,
    critical_hit: bool,
    hew_available: bool,
}

impl Default for Turn {
    fn default() -> Self {
        Self::new()
    }
}

impl Turn {
    pub fn new() -> Self {
        Self {
            phase: TurnPhase::NotStarted,
            number: 0,
            attacks_used: 0,
            max_attacks: 0,
            bonus_action_used: false,
            critical_hit: false,
            hew_available: false,
        }
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn attacks_used(&self) -> u32 {
        self.attacks_used
    }

    pub fn max_attacks(&self) -> u32 {
        self.max_attacks
    }

    pub fn attacks_remaining(&self) -> u32 {
        self.max_attacks.saturating_sub(self.attacks_used)
    }

    pub fn bonus_action_used(&self) -> bool {
        self.bonus_action_used
    }

    pub fn critical_hit(&self) -> bool {
        self.critical_hit
    }

    pub fn hew_available(&self) -> bool {
        self.hew_available
    }

    /// Whether this turn is still open for the service's current turn number.
    pub fn is_open_for(&self, service: &CombatService) -> bool {
        self.phase == TurnPhase::InTurn && self.number == service.state().current_turn
    }

    fn ensure_in_turn(&self) -> Result<(), TurnError> {
        match self.phase {
            TurnPhase::InTurn => Ok(()),
            _ => Err(TurnError::NotInTurn),
        }
    }

    /// Start the turn. Offers rage first when it is available; declining or
    /// an interrupted prompt leaves rage off.
    pub fn begin(
        &mut self,
        service: &mut CombatService,
        oracle: &mut dyn Oracle,
    ) -> Result<Option<BonusOutcome>, TurnError> {
        if self.phase != TurnPhase::NotStarted {
            return Err(TurnError::Unavailable("starting a turn".to_string()));
        }

        let mut raged = None;
        if service.can_activate_rage() {
            let question = format!(
                "Activate Rage? ({} remaining)",
                service.state().rages_remaining
            );
            if confirm_or_decline(oracle, &question, true) && service.activate_rage() {
                raged = Some(BonusOutcome::RageStarted {
                    remaining: service.state().rages_remaining,
                    surge: service.current_surge().cloned(),
                });
            }
        }

        service.start_turn_history();
        // Rage at the start of the turn doesn't spend the bonus action.
        if let Some(rage) = &raged {
            service.record(TurnAction::bonus_action(
                BonusAction::ActivateRage.label(),
                &bonus_result_text(rage),
            ));
        }
        self.number = service.state().current_turn;
        self.max_attacks = service.character().max_attacks();
        self.phase = TurnPhase::InTurn;
        info!(turn = self.number, attacks = self.max_attacks, "turn started");
        Ok(raged)
    }

    pub fn attack(
        &mut self,
        service: &mut CombatService,
        oracle: &mut dyn Oracle,
        mode: AttackMode,
    ) -> Result<AttackOutcome, TurnError> {
        self.ensure_in_turn()?;
        if self.attacks_used >= self.max_attacks {
            return Err(TurnError::NoAttacksLeft {
                used: self.attacks_used,
                max: self.max_attacks,
            });
        }
        let outcome = resolve_attack(service, oracle, mode, FollowUp::RollDamage);
        self.attacks_used += 1;
        self.note_critical(service, &outcome);
        Ok(outcome)
    }

    fn note_critical(&mut self, service: &CombatService, outcome: &AttackOutcome) {
        if outcome.critical {
            self.critical_hit = true;
            if service.character().features.great_weapon_master.enabled {
                debug!("great weapon master hew unlocked");
                self.hew_available = true;
            }
        }
    }

    /// Bonus actions the player can take right now.
    pub fn bonus_actions(&self, service: &CombatService) -> Vec<BonusAction> {
        if self.phase != TurnPhase::InTurn || self.bonus_action_used {
            return Vec::new();
        }
        let mut actions = Vec::new();
        if service.can_activate_rage() {
            actions.push(BonusAction::ActivateRage);
        }
        if service.state().rage_active {
            actions.push(BonusAction::EndRage);
        }
        if self.hew_available && service.character().features.great_weapon_master.enabled {
            actions.push(BonusAction::GreatWeaponHew);
        }
        if service.surge_bonus_action_available() {
            actions.push(BonusAction::SurgeEffect);
        }
        actions
    }

    pub fn take_bonus_action(
        &mut self,
        service: &mut CombatService,
        oracle: &mut dyn Oracle,
        action: BonusAction,
    ) -> Result<BonusOutcome, TurnError> {
        self.ensure_in_turn()?;
        if self.bonus_action_used {
            return Err(TurnError::BonusActionUsed);
        }
        if !self.bonus_actions(service).contains(&action) {
            return Err(TurnError::Unavailable(action.label().to_string()));
        }

        let outcome = match action {
            BonusAction::ActivateRage => {
                if !service.activate_rage() {
                    return Err(TurnError::Unavailable(action.label().to_string()));
                }
                BonusOutcome::RageStarted {
                    remaining: service.state().rages_remaining,
                    surge: service.current_surge().cloned(),
                }
            }
            BonusAction::EndRage => {
                service.end_rage();
                BonusOutcome::RageEnded
            }
            BonusAction::GreatWeaponHew => {
                let mode = choose_mode(service, oracle)?;
                let outcome = resolve_attack(service, oracle, mode, FollowUp::RollDamage);
                self.hew_available = false;
                self.note_critical(service, &outcome);
                BonusOutcome::Hew(outcome)
            }
            BonusAction::SurgeEffect => match service.use_surge_bonus_action() {
                Some(surge) => BonusOutcome::Surge(surge),
                None => return Err(TurnError::Unavailable(action.label().to_string())),
            },
        };

        self.bonus_action_used = true;
        self.hew_available = false;
        service.record(TurnAction::bonus_action(
            action.label(),
            &bonus_result_text(&outcome),
        ));
        Ok(outcome)
    }

    /// Close the turn: history is sealed, the turn counter advances and
    /// once-per-turn features come back.
    pub fn end(&mut self, service: &mut CombatService) -> Result<(), TurnError> {
        self.ensure_in_turn()?;
        let dealt = service.history().current_damage();
        service.end_turn_history();
        service.advance_turn();
        self.phase = TurnPhase::Ended;
        info!(turn = self.number, damage = dealt, "turn ended");
        Ok(())
    }
}

fn bonus_result_text(outcome: &BonusOutcome) -> String {
    match outcome {
        BonusOutcome::RageStarted { remaining, surge } => match surge {
            Some(s) => format!("rage activated ({} left), wild magic {}", remaining, s.roll),
            None => format!("rage activated ({} left)", remaining),
        },
        BonusOutcome::RageEnded => "rage ended".to_string(),
        BonusOutcome::Hew(a) => match &a.damage {
            Some(d) => format!("hit for {}", d.weapon_total),
            None if a.hit => "hit".to_string(),
            None => "miss".to_string(),
        },
        BonusOutcome::Surge(s) => s.summary.clone(),
    }
}

/// Tagged lines describing a bonus action's result.
pub fn describe_bonus(outcome: &BonusOutcome) -> Vec<String> {
    match outcome {
        BonusOutcome::RageStarted { remaining, surge } => {
            let mut lines = vec![format!("[RAGE] activated ({} left)", remaining)];
            if let Some(s) = surge {
                lines.push(format!("[SURGE] d8={} {}", s.roll, s.description));
            }
            lines
        }
        BonusOutcome::RageEnded => vec!["[RAGE] ended".to_string()],
        BonusOutcome::Hew(a) => describe_attack(a),
        BonusOutcome::Surge(s) => {
            let mut line = format!("[SURGE] {}", s.summary);
            if let Some(dc) = s.save_dc {
                line.push_str(&format!(" (save DC {})", dc));
            }
            vec![line]
        }
    }
}

pub fn describe_attack(outcome: &AttackOutcome) -> Vec<String> {
    let last = outcome.rolls.len().saturating_sub(1);
    let mut lines: Vec<String> = outcome
        .rolls
        .iter()
        .enumerate()
        .map(|(i, r)| describe_roll(r, i == last && outcome.hit))
        .collect();
    if let (Some(d), Some(opts)) = (&outcome.damage, outcome.damage_options) {
        lines.extend(describe_damage(d, opts));
    }
    lines
}

fn menu(turn: &Turn, service: &CombatService) -> Vec<(String, MenuItem)> {
    let mut items = Vec::new();
    if turn.attacks_remaining() > 0 {
        items.push((
            format!("Attack ({} of {} left)", turn.attacks_remaining(), turn.max_attacks()),
            MenuItem::Attack,
        ));
    }
    if !turn.bonus_actions(service).is_empty() {
        items.push(("Bonus action".to_string(), MenuItem::Bonus));
    }
    items.push(("End turn".to_string(), MenuItem::End));
    items.push(("Back to main menu".to_string(), MenuItem::Leave));
    items
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuItem {
    Attack,
    Bonus,
    End,
    Leave,
}

/// Drive a turn through the oracle, reporting each result to `log`.
///
/// A `turn` still open for the current turn number is resumed with whatever
/// budget it has left; otherwise a new one begins. Leaving or an interrupted
/// menu choice ([`TurnError::Interrupted`]) keeps the turn open in `turn`.
pub fn run_turn(
    service: &mut CombatService,
    turn: &mut Turn,
    oracle: &mut dyn Oracle,
    mut log: impl FnMut(String),
) -> Result<TurnExit, TurnError> {
    if turn.is_open_for(service) {
        log(format!("[TURN] {} resumes", turn.number()));
    } else {
        *turn = Turn::new();
        if let Some(rage) = turn.begin(service, oracle)? {
            describe_bonus(&rage).into_iter().for_each(&mut log);
        }
        log(format!("[TURN] {} begins", turn.number()));
    }

    loop {
        let items = menu(turn, service);
        let labels: Vec<String> = items.iter().map(|(l, _)| l.clone()).collect();
        let pick = oracle.choose(&format!("Turn {}: choose an action", turn.number()), &labels)?;
        let Some(&(_, item)) = items.get(pick) else {
            return Err(TurnError::Interrupted(Interrupted));
        };
        match item {
            MenuItem::Attack => {
                let mode = choose_mode(service, oracle)?;
                let outcome = turn.attack(service, oracle, mode)?;
                describe_attack(&outcome).into_iter().for_each(&mut log);
            }
            MenuItem::Bonus => {
                let actions = turn.bonus_actions(service);
                let mut labels: Vec<String> = actions.iter().map(|a| a.label().to_string()).collect();
                labels.push("Back".to_string());
                let pick = oracle.choose("Choose a bonus action", &labels)?;
                if let Some(&action) = actions.get(pick) {
                    let outcome = turn.take_bonus_action(service, oracle, action)?;
                    describe_bonus(&outcome).into_iter().for_each(&mut log);
                }
            }
            MenuItem::End => {
                let dealt = service.history().current_damage();
                turn.end(service)?;
                log(format!("[TURN] ended, {} damage dealt", dealt));
                return Ok(TurnExit::Ended);
            }
            MenuItem::Leave => return Ok(TurnExit::Left),
        }
    }
}
