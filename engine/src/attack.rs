//! Attack rolls and the hit/miss conversation around them.
//!
//! The engine never knows the target's armor class; whether an attack hit is
//! always asked. Damage only follows a confirmed hit.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::damage::{roll_damage, DamageOptions, DamageResult};
use crate::dice::{AdMode, Dice, ATTACK_DIE};
use crate::error::Interrupted;
use crate::history::TurnAction;
use crate::oracle::{confirm_or_decline, Oracle};
use crate::service::CombatService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackMode {
    /// One d20.
    Normal,
    /// Reckless attack: two d20s, keep the higher.
    Reckless,
    /// Give up advantage for the brutal strike die: one d20.
    BrutalStrike,
}

impl AttackMode {
    pub fn label(self) -> &'static str {
        match self {
            AttackMode::Normal => "normal",
            AttackMode::Reckless => "reckless",
            AttackMode::BrutalStrike => "brutal",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            AttackMode::Normal => "Normal attack",
            AttackMode::Reckless => "Reckless attack (advantage)",
            AttackMode::BrutalStrike => "Brutal Strike (forgo advantage, +1d10)",
        }
    }

    fn ad_mode(self) -> AdMode {
        match self {
            AttackMode::Reckless => AdMode::Advantage,
            AttackMode::Normal | AttackMode::BrutalStrike => AdMode::Normal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttackRoll {
    pub mode: AttackMode,
    pub raw_rolls: Vec<u32>,
    /// The kept d20.
    pub roll: u32,
    pub modifier: i32,
    pub total: i32,
    pub critical: bool,
    pub fumble: bool,
    /// `12 + 10 = 22`
    pub breakdown: String,
    /// `d20(12, 7) + 10 [Advantage]`
    pub explanation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    /// Confirmed hits go straight to the damage resolver.
    RollDamage,
    /// Only the attack rolls are recorded.
    LogOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttackOutcome {
    /// Every attack roll made, including a house-rule reroll.
    pub rolls: Vec<AttackRoll>,
    pub hit: bool,
    /// Any roll in this attack was a natural 20.
    pub critical: bool,
    pub damage: Option<DamageResult>,
    pub damage_options: Option<DamageOptions>,
}

fn format_modifier(modifier: i32) -> String {
    if modifier >= 0 {
        format!("+ {}", modifier)
    } else {
        format!("- {}", modifier.abs())
    }
}

fn format_d20_sequence(raw: &[u32]) -> String {
    raw.iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Roll the d20(s) for `mode` and total them. No prompts, no state.
pub fn roll_attack(dice: &mut Dice, mode: AttackMode, modifier: i32, force_max: bool) -> AttackRoll {
    let (raw_rolls, roll) = dice.d20(mode.ad_mode(), force_max);
    let total = roll as i32 + modifier;
    let suffix = match mode {
        AttackMode::Normal => "",
        AttackMode::Reckless => " [Advantage]",
        AttackMode::BrutalStrike => " [Brutal Strike: no advantage]",
    };
    AttackRoll {
        mode,
        breakdown: format!("{} {} = {}", roll, format_modifier(modifier), total),
        explanation: format!(
            "d20({}) {}{}",
            format_d20_sequence(&raw_rolls),
            format_modifier(modifier),
            suffix
        ),
        raw_rolls,
        roll,
        modifier,
        total,
        critical: roll == ATTACK_DIE,
        fumble: roll == 1,
    }
}

/// Modes the player may pick right now.
pub fn available_modes(service: &CombatService) -> Vec<AttackMode> {
    let mut modes = vec![AttackMode::Normal, AttackMode::Reckless];
    if service.brutal_strike_offered() {
        modes.push(AttackMode::BrutalStrike);
    }
    modes
}

/// Ask the player which kind of attack to make.
pub fn choose_mode(service: &CombatService, oracle: &mut dyn Oracle) -> Result<AttackMode, Interrupted> {
    let modes = available_modes(service);
    let options: Vec<String> = modes.iter().map(|m| m.title().to_string()).collect();
    let idx = oracle.choose("Choose attack type", &options)?;
    modes.get(idx).copied().ok_or(Interrupted)
}

fn ask_hit(oracle: &mut dyn Oracle, roll: &AttackRoll) -> bool {
    let mut question = format!(
        "Attack roll {} ({}). Did it hit?",
        roll.total, roll.explanation
    );
    if roll.critical {
        question.push_str(" NATURAL 20!");
    } else if roll.fumble {
        question.push_str(" Natural 1.");
    }
    // An interrupted hit/miss question reads as a miss.
    confirm_or_decline(oracle, &question, true)
}

fn roll_and_ask(
    service: &mut CombatService,
    oracle: &mut dyn Oracle,
    mode: AttackMode,
) -> (AttackRoll, bool) {
    let modifier = service.character().attack_modifier();
    let force_max = service.settings().always_crit();
    let roll = roll_attack(service.dice(), mode, modifier, force_max);
    info!(mode = mode.label(), total = roll.total, critical = roll.critical, "attack roll");
    let hit = ask_hit(oracle, &roll);
    service.record(TurnAction::attack(mode.label(), roll.total, hit));
    (roll, hit)
}

fn damage_options_for(
    service: &CombatService,
    oracle: &mut dyn Oracle,
    roll: &AttackRoll,
    rerolled: bool,
) -> DamageOptions {
    let mut opts = DamageOptions {
        critical: roll.critical,
        brutal: roll.mode == AttackMode::BrutalStrike,
        savage: false,
    };
    // A plain hit may still take the brutal die; an advantage hit never does.
    if roll.mode == AttackMode::Normal && !rerolled && service.brutal_strike_offered() {
        opts.brutal = confirm_or_decline(oracle, "Add Brutal Strike damage (+1d10)?", false);
    }
    if service.savage_attacks_offered() {
        opts.savage = confirm_or_decline(
            oracle,
            "Use Savage Attacks (reroll weapon dice, keep the higher)?",
            false,
        );
    }
    opts
}

/// Make one attack: roll, confirm hit, apply the miss-reroll house rule and,
/// for [`FollowUp::RollDamage`], resolve damage on a hit.
pub fn resolve_attack(
    service: &mut CombatService,
    oracle: &mut dyn Oracle,
    mode: AttackMode,
    follow: FollowUp,
) -> AttackOutcome {
    let mode = if mode == AttackMode::BrutalStrike && !service.brutal_strike_offered() {
        warn!("brutal strike not available; attacking normally");
        AttackMode::Normal
    } else {
        mode
    };

    let (first, mut hit) = roll_and_ask(service, oracle, mode);
    let mut rolls = vec![first];

    // House rule: a missed normal attack may be rerolled once with advantage.
    if !hit
        && mode == AttackMode::Normal
        && confirm_or_decline(oracle, "The attack missed. Reroll it with advantage?", true)
    {
        debug!("house-rule reroll");
        let (second, second_hit) = roll_and_ask(service, oracle, AttackMode::Reckless);
        hit = second_hit;
        rolls.push(second);
    }

    let damage_options = if hit && follow == FollowUp::RollDamage {
        rolls
            .last()
            .map(|deciding| damage_options_for(service, oracle, deciding, rolls.len() > 1))
    } else {
        None
    };
    let damage = damage_options.map(|opts| roll_damage(service, oracle, opts));

    AttackOutcome {
        hit,
        critical: rolls.iter().any(|r| r.critical),
        damage,
        damage_options,
        rolls,
    }
}

/// Tagged one-liner for an attack roll.
pub fn describe_roll(roll: &AttackRoll, hit: bool) -> String {
    let outcome = match (roll.critical, hit) {
        (true, true) => "CRIT!",
        (_, true) => "HIT",
        (_, false) => "MISS",
    };
    format!(
        "[ATTACK][{}] {} = {} → {}",
        roll.mode.label(),
        roll.explanation,
        roll.total,
        outcome
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reckless_keeps_the_higher_die() {
        let mut dice = Dice::from_scripted(vec![7, 15]);
        let roll = roll_attack(&mut dice, AttackMode::Reckless, 10, false);
        assert_eq!(roll.raw_rolls, vec![7, 15]);
        assert_eq!(roll.roll, 15);
        assert_eq!(roll.total, 25);
        assert_eq!(roll.breakdown, "15 + 10 = 25");
        assert_eq!(roll.explanation, "d20(7, 15) + 10 [Advantage]");
    }

    #[test]
    fn negative_modifier_and_fumble() {
        let mut dice = Dice::from_scripted(vec![1]);
        let roll = roll_attack(&mut dice, AttackMode::BrutalStrike, -1, false);
        assert!(roll.fumble);
        assert!(!roll.critical);
        assert_eq!(roll.total, 0);
        assert_eq!(roll.breakdown, "1 - 1 = 0");
        assert_eq!(describe_roll(&roll, false), "[ATTACK][brutal] d20(1) - 1 [Brutal Strike: no advantage] = 0 → MISS");
    }

    #[test]
    fn forced_crit_on_every_die() {
        let mut dice = Dice::from_seed(1);
        let roll = roll_attack(&mut dice, AttackMode::Reckless, 5, true);
        assert_eq!(roll.raw_rolls, vec![20, 20]);
        assert!(roll.critical);
    }
}
