//! Weapon damage resolution.
//!
//! Order is fixed: weapon dice (doubled on a crit), the savage-attacks
//! keep-higher reroll, the brutal strike die, the heroic inspiration reroll
//! of the lowest die, flat bonuses, then supplemental dice. Heroic
//! inspiration has to see the final kept dice, so it runs after every
//! weapon die is settled and before anything is summed.

use serde::Serialize;
use tracing::{debug, warn};

use crate::character::Weapon;
use crate::dice::Dice;
use crate::history::TurnAction;
use crate::oracle::{confirm_or_decline, Oracle};
use crate::service::CombatService;

/// Size of the brutal strike bonus die. Crits don't double it.
pub const BRUTAL_STRIKE_DIE: u32 = 10;

/// Heroic inspiration is only offered when the lowest die is at most this.
pub const HEROIC_THRESHOLD: u32 = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DamageOptions {
    pub critical: bool,
    /// Add the brutal strike die.
    pub brutal: bool,
    /// Reroll the weapon dice and keep the higher result.
    pub savage: bool,
}

impl DamageOptions {
    /// Comma-separated names of the options in effect; empty when none.
    pub fn flags(&self) -> String {
        [
            (self.critical, "critical"),
            (self.brutal, "brutal"),
            (self.savage, "savage"),
        ]
        .iter()
        .filter(|(on, _)| *on)
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DieRoll {
    pub value: u32,
    pub die: u32,
    pub source: String,
}

impl DieRoll {
    fn notation(&self) -> String {
        format!("d{}({})", self.die, self.value)
    }
}

/// Both sets of weapon dice from a keep-higher reroll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeepHigher {
    pub original: Vec<u32>,
    pub reroll: Vec<u32>,
    pub used_reroll: bool,
}

impl KeepHigher {
    pub fn kept(&self) -> &[u32] {
        if self.used_reroll {
            &self.reroll
        } else {
            &self.original
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeroicUse {
    pub original_roll: u32,
    pub new_roll: u32,
    pub source: String,
}

/// A supplemental die, reported separately from weapon damage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtraDamage {
    pub source: String,
    pub kind: String,
    pub die: u32,
    pub amount: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DamageResult {
    pub weapon_total: i32,
    /// Kept weapon dice plus the brutal strike die, after any heroic reroll.
    pub dice: Vec<DieRoll>,
    pub flat_bonus: i32,
    pub additional: Vec<ExtraDamage>,
    /// Dice notation for checking by hand, e.g. `d10(6) + d10(8) + 10`.
    pub breakdown: String,
    /// Prose trace of every term.
    pub explanation: String,
    pub keep_higher: Option<KeepHigher>,
    pub heroic: Option<HeroicUse>,
}

impl DamageResult {
    pub fn additional_total(&self) -> i32 {
        self.additional.iter().map(|d| d.amount as i32).sum()
    }
}

struct WeaponRoll {
    kept: Vec<DieRoll>,
    keep_higher: Option<KeepHigher>,
    term: String,
}

/// Marks terms rolled under great weapon fighting (1s and 2s rerolled once).
fn gwf_note(reroll_low: bool) -> &'static str {
    if reroll_low { " (GWF)" } else { "" }
}

fn sum(values: &[u32]) -> u32 {
    values.iter().sum()
}

fn roll_weapon_dice(
    dice: &mut Dice,
    weapon: &Weapon,
    reroll_low: bool,
    critical: bool,
    savage: bool,
) -> WeaponRoll {
    let count = if critical { 2 } else { 1 };
    let roll_set = |dice: &mut Dice| -> Vec<u32> {
        (0..count)
            .map(|_| dice.roll(weapon.die, reroll_low, false))
            .collect()
    };
    let original = roll_set(dice);

    let label = |savage_die: bool, i: usize| match (critical, savage_die) {
        (true, false) => format!("{} crit die {}", weapon.name, i + 1),
        (true, true) => format!("{} savage die {}", weapon.name, i + 1),
        (false, false) => format!("{} damage", weapon.name),
        (false, true) => format!("{} savage", weapon.name),
    };
    let to_rolls = |values: &[u32], savage_die: bool| -> Vec<DieRoll> {
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| DieRoll {
                value,
                die: weapon.die,
                source: label(savage_die, i),
            })
            .collect()
    };

    let gwf = gwf_note(reroll_low);
    if !savage {
        let term = if critical {
            format!("2d{} {} critical{}", weapon.die, weapon.name, gwf)
        } else {
            format!("1d{} {} damage{}", weapon.die, weapon.name, gwf)
        };
        return WeaponRoll {
            kept: to_rolls(&original, false),
            keep_higher: None,
            term,
        };
    }

    let reroll = roll_set(dice);
    let (orig_sum, reroll_sum) = (sum(&original), sum(&reroll));
    let used_reroll = reroll_sum > orig_sum;
    let term = match (critical, used_reroll) {
        (true, true) => format!(
            "2d{} {} critical{} + Savage Attacks ({}+{}={} > {}+{}={})",
            weapon.die, weapon.name, gwf, reroll[0], reroll[1], reroll_sum, original[0], original[1], orig_sum
        ),
        (true, false) => format!(
            "2d{} {} critical{} + Savage Attacks didn't help ({}+{}={} ≤ {}+{}={})",
            weapon.die, weapon.name, gwf, reroll[0], reroll[1], reroll_sum, original[0], original[1], orig_sum
        ),
        (false, true) => format!(
            "1d{} {}{} + Savage Attacks (rerolled {} > {})",
            weapon.die, weapon.name, gwf, reroll_sum, orig_sum
        ),
        (false, false) => format!(
            "1d{} {}{} + Savage Attacks didn't help (rerolled {} ≤ {})",
            weapon.die, weapon.name, gwf, reroll_sum, orig_sum
        ),
    };
    let kept = if used_reroll {
        to_rolls(&reroll, true)
    } else {
        to_rolls(&original, false)
    };
    WeaponRoll {
        kept,
        keep_higher: Some(KeepHigher {
            original,
            reroll,
            used_reroll,
        }),
        term,
    }
}

/// Offer heroic inspiration on the lowest die. Returns the substitution if
/// the player took it.
fn offer_heroic_inspiration(
    service: &mut CombatService,
    oracle: &mut dyn Oracle,
    rolled: &mut [DieRoll],
) -> Option<HeroicUse> {
    if !service.state().heroic_inspiration {
        return None;
    }
    // First of equal lows wins.
    let (idx, lowest) = rolled
        .iter()
        .enumerate()
        .min_by_key(|(_, r)| r.value)
        .map(|(i, r)| (i, r.clone()))?;
    if lowest.value > HEROIC_THRESHOLD {
        return None;
    }

    let question = format!(
        "You rolled a {} on your {}. Use Heroic Inspiration to reroll it?",
        lowest.value, lowest.source
    );
    if !confirm_or_decline(oracle, &question, true) {
        debug!(roll = lowest.value, "heroic inspiration declined");
        return None;
    }
    if !service.use_heroic_inspiration() {
        return None;
    }

    let new_roll = service.dice().roll(lowest.die, false, false);
    rolled[idx].value = new_roll;
    Some(HeroicUse {
        original_roll: lowest.value,
        new_roll,
        source: lowest.source,
    })
}

fn format_flat(flat: i32) -> String {
    match flat {
        0 => String::new(),
        n if n > 0 => format!(" + {}", n),
        n => format!(" - {}", n.abs()),
    }
}

/// Compute damage with the options exactly as given.
///
/// Consumes heroic inspiration when the player accepts it; an interrupted
/// prompt counts as a decline. Once-per-turn features are not touched here,
/// see [`roll_damage`].
pub fn compute_damage(
    service: &mut CombatService,
    oracle: &mut dyn Oracle,
    opts: DamageOptions,
) -> DamageResult {
    let character = service.character().clone();
    let reroll_low = character.rerolls_low();

    let weapon = roll_weapon_dice(
        service.dice(),
        &character.weapon,
        reroll_low,
        opts.critical,
        opts.savage,
    );
    let mut rolled = weapon.kept;
    let mut terms = vec![weapon.term];

    if opts.brutal {
        let value = service.dice().roll(BRUTAL_STRIKE_DIE, reroll_low, false);
        rolled.push(DieRoll {
            value,
            die: BRUTAL_STRIKE_DIE,
            source: "Brutal Strike".to_string(),
        });
        terms.push(format!("1d{} Brutal Strike{}", BRUTAL_STRIKE_DIE, gwf_note(reroll_low)));
    }

    let heroic = offer_heroic_inspiration(service, oracle, &mut rolled);

    let rage = service.current_rage_damage();
    let flat_bonus = character.flat_damage_bonus() + rage;
    terms.extend(
        character
            .damage_bonuses
            .iter()
            .map(|(source, value)| format!("{} {}", value, source.replace('_', " "))),
    );
    if rage > 0 {
        terms.push(format!("{} rage", rage));
    }

    let additional: Vec<ExtraDamage> = character
        .additional_damage_dice
        .iter()
        .map(|(source, extra)| ExtraDamage {
            source: source.clone(),
            kind: extra.description.clone(),
            die: extra.die,
            amount: service.dice().roll(extra.die, false, false),
        })
        .collect();

    let dice_total: i32 = rolled.iter().map(|r| r.value as i32).sum();
    let weapon_total = dice_total + flat_bonus;

    let breakdown = format!(
        "{}{}",
        rolled
            .iter()
            .map(DieRoll::notation)
            .collect::<Vec<_>>()
            .join(" + "),
        format_flat(flat_bonus)
    );

    let mut explanation = terms.join(" + ");
    if let Some(h) = &heroic {
        explanation.push_str(&format!(
            " [Heroic Inspiration: {} {}→{}]",
            h.source, h.original_roll, h.new_roll
        ));
    }
    for extra in &additional {
        explanation.push_str(&format!(" + {} {}", extra.amount, extra.kind));
    }

    debug!(total = weapon_total, %breakdown, "damage computed");
    DamageResult {
        weapon_total,
        dice: rolled,
        flat_bonus,
        additional,
        breakdown,
        explanation,
        keep_higher: weapon.keep_higher,
        heroic,
    }
}

/// Roll damage as the player would: options the character can't use right
/// now are dropped, used once-per-turn features are marked spent, and the
/// result goes into the turn history.
pub fn roll_damage(
    service: &mut CombatService,
    oracle: &mut dyn Oracle,
    requested: DamageOptions,
) -> DamageResult {
    let opts = DamageOptions {
        critical: requested.critical,
        brutal: requested.brutal && service.brutal_strike_offered(),
        savage: requested.savage && service.savage_attacks_offered(),
    };
    if opts != requested {
        warn!(?requested, ?opts, "dropped damage options that are not available");
    }

    let result = compute_damage(service, oracle, opts);

    if opts.brutal {
        service.use_brutal_strike();
    }
    if opts.savage {
        service.use_savage_attacks();
    }
    service.record(TurnAction::damage(
        result.weapon_total,
        &result.breakdown,
        &opts.flags(),
    ));
    result
}

/// One-line tagged summaries for the terminal.
pub fn describe_damage(result: &DamageResult, opts: DamageOptions) -> Vec<String> {
    let prefix = if opts.critical { "crit: " } else { "" };
    let mut lines = vec![
        format!("[DMG] {}{} weapon damage", prefix, result.weapon_total),
        format!("[DMG] dice: {}", result.breakdown),
        format!("[DMG] breakdown: {}", result.explanation),
    ];
    for extra in &result.additional {
        lines.push(format!(
            "[DMG] +{} {} (d{} {})",
            extra.amount, extra.kind, extra.die, extra.source
        ));
    }
    if let Some(h) = &result.heroic {
        lines.push(format!(
            "[HEROIC] {} {} → {}",
            h.source, h.original_roll, h.new_roll
        ));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_list_only_active_options() {
        assert_eq!(DamageOptions::default().flags(), "");
        let opts = DamageOptions {
            critical: true,
            brutal: false,
            savage: true,
        };
        assert_eq!(opts.flags(), "critical, savage");
    }

    #[test]
    fn flat_formatting_handles_sign() {
        assert_eq!(format_flat(0), "");
        assert_eq!(format_flat(12), " + 12");
        assert_eq!(format_flat(-1), " - 1");
    }
}
