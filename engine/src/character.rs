//! The player character. Loaded once at startup and read-only afterwards.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::progression;

pub const BARBARIAN: &str = "barbarian";
pub const FIGHTER: &str = "fighter";
pub const WILD_MAGIC: &str = "wild_magic";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    pub die: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassLevel {
    pub name: String,
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subclass: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BaseStats {
    #[serde(default)]
    pub strength_modifier: i32,
    #[serde(default)]
    pub constitution_modifier: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttackModifiers {
    #[serde(default)]
    pub strength: i32,
    #[serde(default)]
    pub proficiency: i32,
    #[serde(default)]
    pub magic_weapon: i32,
}

/// An optional mechanic. Absent features deserialize as disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub once_per_turn: bool,
}

impl Default for Feature {
    fn default() -> Self {
        Self {
            enabled: false,
            once_per_turn: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Features {
    #[serde(default)]
    pub brutal_strike: Feature,
    #[serde(default)]
    pub savage_attacks: Feature,
    /// Reroll 1s and 2s on weapon damage dice.
    #[serde(default)]
    pub great_weapon_fighting: Feature,
    /// Bonus-action attack after a critical hit.
    #[serde(default, alias = "gwm")]
    pub great_weapon_master: Feature,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraDie {
    pub die: u32,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    #[serde(default)]
    pub classes: Vec<ClassLevel>,
    #[serde(default)]
    pub primary_class: Option<String>,
    pub weapon: Weapon,
    #[serde(default)]
    pub base_stats: BaseStats,
    #[serde(default)]
    pub attack_modifiers: AttackModifiers,
    #[serde(default)]
    pub features: Features,
    #[serde(default)]
    pub damage_bonuses: IndexMap<String, i32>,
    #[serde(default)]
    pub additional_damage_dice: IndexMap<String, ExtraDie>,
}

impl Character {
    pub fn level(&self) -> u32 {
        self.classes.iter().map(|c| c.level).sum()
    }

    pub fn class_level(&self, class: &str) -> u32 {
        self.classes
            .iter()
            .filter(|c| c.name.eq_ignore_ascii_case(class))
            .map(|c| c.level)
            .sum()
    }

    pub fn subclass(&self, class: &str) -> Option<&str> {
        self.classes
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(class))
            .and_then(|c| c.subclass.as_deref())
    }

    pub fn barbarian_level(&self) -> u32 {
        self.class_level(BARBARIAN)
    }

    pub fn fighter_level(&self) -> u32 {
        self.class_level(FIGHTER)
    }

    pub fn is_wild_magic(&self) -> bool {
        self.subclass(BARBARIAN)
            .is_some_and(|s| s.eq_ignore_ascii_case(WILD_MAGIC))
    }

    pub fn can_rage(&self) -> bool {
        self.barbarian_level() >= 1
    }

    /// Attack modifier = strength + proficiency + magic weapon.
    pub fn attack_modifier(&self) -> i32 {
        let m = self.attack_modifiers;
        m.strength + m.proficiency + m.magic_weapon
    }

    pub fn proficiency_bonus(&self) -> i32 {
        progression::proficiency_bonus(self.level())
    }

    pub fn max_attacks(&self) -> u32 {
        progression::max_attacks(self.barbarian_level(), self.fighter_level())
    }

    pub fn rage_damage(&self) -> i32 {
        progression::rage_damage(self.barbarian_level())
    }

    pub fn max_rages(&self) -> u32 {
        progression::max_rages(self.barbarian_level())
    }

    /// Sum of every named flat damage bonus.
    pub fn flat_damage_bonus(&self) -> i32 {
        self.damage_bonuses.values().sum()
    }

    /// Weapon damage dice reroll 1s and 2s once.
    pub fn rerolls_low(&self) -> bool {
        self.features.great_weapon_fighting.enabled
    }

    pub fn display_class(&self) -> String {
        match &self.primary_class {
            Some(c) => c.clone(),
            None => self
                .classes
                .first()
                .map(|c| c.name.clone())
                .unwrap_or_else(|| "adventurer".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_features_resolve_to_disabled_once_per_turn() {
        let json = r#"{"name":"Grok","weapon":{"name":"Greataxe","die":12}}"#;
        let c: Character = serde_json::from_str(json).expect("parses");
        assert!(!c.features.brutal_strike.enabled);
        assert!(c.features.savage_attacks.once_per_turn);
        assert_eq!(c.level(), 0);
        assert_eq!(c.max_attacks(), 1);
        assert!(!c.can_rage());
    }

    #[test]
    fn class_lookup_ignores_case() {
        let json = r#"{
            "name":"Grok",
            "classes":[{"name":"Barbarian","level":6,"subclass":"Wild_Magic"},{"name":"fighter","level":1}],
            "weapon":{"name":"Greataxe","die":12}
        }"#;
        let c: Character = serde_json::from_str(json).expect("parses");
        assert_eq!(c.level(), 7);
        assert_eq!(c.barbarian_level(), 6);
        assert!(c.is_wild_magic());
        assert_eq!(c.max_rages(), 4);
        assert_eq!(c.max_attacks(), 2);
    }
}
