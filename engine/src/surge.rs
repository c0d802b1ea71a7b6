//! Wild magic surge table, rolled when a wild magic barbarian starts raging.

use serde::{Deserialize, Serialize};

use crate::character::Character;
use crate::dice::Dice;

pub const SURGE_DIE: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurgeKind {
    Offensive,
    Defensive,
    Utility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurgeDuration {
    Instant,
    Rage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurgeElement {
    Necrotic,
    Teleport,
    Force,
    Protective,
    Terrain,
    Radiant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurgeEffect {
    pub roll: u32,
    pub description: String,
    pub kind: SurgeKind,
    pub duration: SurgeDuration,
    pub element: SurgeElement,
    #[serde(default)]
    pub bonus_action_repeatable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save: Option<String>,
}

struct Row {
    description: &'static str,
    kind: SurgeKind,
    duration: SurgeDuration,
    element: SurgeElement,
    repeatable: bool,
    save: Option<&'static str>,
}

const TABLE: [Row; SURGE_DIE as usize] = [
    Row {
        description: "Each creature of your choice within 30 feet must make a Constitution save or take 1d12 necrotic damage. You gain 1d12 temporary hit points.",
        kind: SurgeKind::Offensive,
        duration: SurgeDuration::Instant,
        element: SurgeElement::Necrotic,
        repeatable: false,
        save: Some("Constitution"),
    },
    Row {
        description: "You teleport up to 30 feet. Until rage ends, you can use this as a bonus action each turn.",
        kind: SurgeKind::Utility,
        duration: SurgeDuration::Rage,
        element: SurgeElement::Teleport,
        repeatable: true,
        save: None,
    },
    Row {
        description: "A spirit appears within 5 feet of a creature within 30 feet. At turn end, creatures within 5 feet make a Dexterity save or take 1d6 force damage. Repeatable as a bonus action.",
        kind: SurgeKind::Offensive,
        duration: SurgeDuration::Rage,
        element: SurgeElement::Force,
        repeatable: true,
        save: Some("Dexterity"),
    },
    Row {
        description: "One weapon deals force damage and gains the light and thrown (20/60 ft) properties. It returns to your hand at turn end.",
        kind: SurgeKind::Offensive,
        duration: SurgeDuration::Rage,
        element: SurgeElement::Force,
        repeatable: false,
        save: None,
    },
    Row {
        description: "When a creature hits you with an attack, it takes 1d6 force damage.",
        kind: SurgeKind::Defensive,
        duration: SurgeDuration::Rage,
        element: SurgeElement::Force,
        repeatable: false,
        save: None,
    },
    Row {
        description: "You and allies within 10 feet gain +1 AC.",
        kind: SurgeKind::Defensive,
        duration: SurgeDuration::Rage,
        element: SurgeElement::Protective,
        repeatable: false,
        save: None,
    },
    Row {
        description: "Ground within 15 feet becomes difficult terrain for your enemies.",
        kind: SurgeKind::Utility,
        duration: SurgeDuration::Rage,
        element: SurgeElement::Terrain,
        repeatable: false,
        save: None,
    },
    Row {
        description: "A creature within 30 feet makes a Constitution save or takes 1d6 radiant damage and is blinded until the start of your next turn. Repeatable as a bonus action.",
        kind: SurgeKind::Offensive,
        duration: SurgeDuration::Rage,
        element: SurgeElement::Radiant,
        repeatable: true,
        save: Some("Constitution"),
    },
];

/// Effect for a d8 result. Out-of-range rolls clamp to the table.
pub fn effect_for_roll(roll: u32) -> SurgeEffect {
    let roll = roll.clamp(1, SURGE_DIE);
    let row = &TABLE[(roll - 1) as usize];
    SurgeEffect {
        roll,
        description: row.description.to_string(),
        kind: row.kind,
        duration: row.duration,
        element: row.element,
        bonus_action_repeatable: row.repeatable,
        save: row.save.map(str::to_string),
    }
}

pub fn roll_surge(dice: &mut Dice) -> SurgeEffect {
    effect_for_roll(dice.roll(SURGE_DIE, false, false))
}

/// DC = 8 + proficiency + constitution modifier.
pub fn save_dc(character: &Character) -> i32 {
    8 + character.proficiency_bonus() + character.base_stats.constitution_modifier
}

/// What re-using a repeatable surge effect as a bonus action produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurgeBonusOutcome {
    pub effect_roll: u32,
    pub summary: String,
    pub save_dc: Option<i32>,
    pub rolled: Option<u32>,
}

/// Re-apply a repeatable effect. `None` when the effect can't be repeated.
pub fn use_bonus_action(
    effect: &SurgeEffect,
    character: &Character,
    dice: &mut Dice,
) -> Option<SurgeBonusOutcome> {
    if !effect.bonus_action_repeatable {
        return None;
    }
    let save_dc = effect.save.as_ref().map(|_| save_dc(character));
    let (rolled, summary) = match (effect.roll, effect.element) {
        (3, SurgeElement::Force) => {
            let n = dice.roll(6, false, false);
            (Some(n), format!("spirit explosion: {} force damage", n))
        }
        (8, SurgeElement::Radiant) => {
            let n = dice.roll(6, false, false);
            (Some(n), format!("radiant bolt: {} radiant damage + blinded", n))
        }
        (_, SurgeElement::Teleport) => (None, "teleport up to 30 feet".to_string()),
        _ => (None, "effect repeated".to_string()),
    };
    Some(SurgeBonusOutcome {
        effect_roll: effect.roll,
        summary,
        save_dc,
        rolled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeatable_rows_are_two_three_and_eight() {
        let repeatable: Vec<u32> = (1..=SURGE_DIE)
            .map(effect_for_roll)
            .filter(|e| e.bonus_action_repeatable)
            .map(|e| e.roll)
            .collect();
        assert_eq!(repeatable, vec![2, 3, 8]);
    }

    #[test]
    fn only_repeatable_effects_roll_again() {
        let character: Character = serde_json::from_value(serde_json::json!({
            "name": "Surge",
            "classes": [{ "name": "barbarian", "level": 5, "subclass": "wild_magic" }],
            "weapon": { "name": "Greataxe", "die": 12 },
            "base_stats": { "constitution_modifier": 2 }
        }))
        .expect("fixture parses");
        let mut dice = Dice::from_scripted(vec![4]);

        assert!(use_bonus_action(&effect_for_roll(1), &character, &mut dice).is_none());
        assert_eq!(dice.draws(), 0);

        let bolt = use_bonus_action(&effect_for_roll(8), &character, &mut dice).expect("repeatable");
        assert_eq!(bolt.rolled, Some(4));
        assert_eq!(bolt.save_dc, Some(13));
        assert!(bolt.summary.contains("4 radiant damage"));
    }

    #[test]
    fn out_of_range_rolls_clamp() {
        assert_eq!(effect_for_roll(0).roll, 1);
        assert_eq!(effect_for_roll(42).roll, 8);
    }
}
