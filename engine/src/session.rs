//! Mutable per-session resources. Every change goes through a method here so
//! the invariants hold no matter who drives them.

use serde::{Deserialize, Serialize};

use crate::character::{Character, Feature};
use crate::surge::SurgeEffect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedDuration {
    Encounter,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EffectDuration {
    Rounds(u32),
    Named(NamedDuration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectType {
    DamageBonus,
    DamageDie,
    Modifier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EffectValue {
    Number(i32),
    Text(String),
}

/// Persisted with the session; resolution doesn't read these yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempEffect {
    pub name: String,
    pub description: String,
    pub duration: EffectDuration,
    pub effect_type: EffectType,
    pub value: EffectValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default = "first_turn")]
    pub current_turn: u32,
    #[serde(default = "yes")]
    pub heroic_inspiration: bool,
    #[serde(default)]
    pub rage_active: bool,
    #[serde(default)]
    pub rages_remaining: u32,
    #[serde(default = "yes")]
    pub brutal_strike_available: bool,
    #[serde(default = "yes")]
    pub savage_attacks_available: bool,
    #[serde(default, alias = "current_wild_magic")]
    pub current_surge: Option<SurgeEffect>,
    #[serde(default)]
    pub temp_effects: Vec<TempEffect>,
}

fn first_turn() -> u32 {
    1
}

fn yes() -> bool {
    true
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            current_turn: 1,
            heroic_inspiration: true,
            rage_active: false,
            rages_remaining: 0,
            brutal_strike_available: true,
            savage_attacks_available: true,
            current_surge: None,
            temp_effects: Vec::new(),
        }
    }
}

impl SessionState {
    /// Fresh state for a character: full rages, everything available.
    pub fn for_character(character: &Character) -> Self {
        Self {
            rages_remaining: character.max_rages(),
            ..Self::default()
        }
    }

    /// Fix up shapes that older files may carry.
    pub fn normalize(&mut self) {
        if self.current_turn == 0 {
            self.current_turn = 1;
        }
        if !self.rage_active {
            self.current_surge = None;
        }
    }

    pub fn can_start_rage(&self, character: &Character) -> bool {
        character.can_rage() && !self.rage_active && self.rages_remaining > 0
    }

    /// Spend one rage and record the surge, all or nothing.
    pub fn start_rage(&mut self, character: &Character, surge: Option<SurgeEffect>) -> bool {
        if !self.can_start_rage(character) {
            return false;
        }
        self.rages_remaining -= 1;
        self.rage_active = true;
        self.current_surge = surge;
        true
    }

    /// Ending rage also ends any surge effect.
    pub fn end_rage(&mut self) -> bool {
        let was_active = self.rage_active;
        self.rage_active = false;
        self.current_surge = None;
        was_active
    }

    /// Returns false when there was nothing to consume.
    pub fn use_heroic_inspiration(&mut self) -> bool {
        std::mem::replace(&mut self.heroic_inspiration, false)
    }

    pub fn restore_heroic_inspiration(&mut self) {
        self.heroic_inspiration = true;
    }

    pub fn toggle_heroic_inspiration(&mut self) {
        self.heroic_inspiration = !self.heroic_inspiration;
    }

    pub fn brutal_strike_offered(&self, character: &Character) -> bool {
        character.features.brutal_strike.enabled && self.brutal_strike_available
    }

    pub fn savage_attacks_offered(&self, character: &Character) -> bool {
        character.features.savage_attacks.enabled && self.savage_attacks_available
    }

    pub fn use_brutal_strike(&mut self, character: &Character) {
        consume(&mut self.brutal_strike_available, character.features.brutal_strike);
    }

    pub fn use_savage_attacks(&mut self, character: &Character) {
        consume(&mut self.savage_attacks_available, character.features.savage_attacks);
    }

    /// Turn end: the counter moves on and once-per-turn features come back.
    pub fn advance_turn(&mut self) {
        self.current_turn += 1;
        self.brutal_strike_available = true;
        self.savage_attacks_available = true;
    }

    /// New combat. Heroic inspiration and rages remaining carry over.
    pub fn reset_combat(&mut self) {
        self.current_turn = 1;
        self.rage_active = false;
        self.current_surge = None;
        self.temp_effects.clear();
        self.brutal_strike_available = true;
        self.savage_attacks_available = true;
    }

    pub fn long_rest(&mut self, character: &Character) {
        self.rages_remaining = character.max_rages();
        self.heroic_inspiration = true;
        self.reset_combat();
    }
}

fn consume(flag: &mut bool, feature: Feature) {
    if feature.once_per_turn {
        *flag = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_effect_durations_accept_numbers_and_names() {
        let json = r#"[
            {"name":"Bless","description":"+1d4","duration":10,"effect_type":"damage_die","value":"1d4"},
            {"name":"Hex","description":"+1d6","duration":"manual","effect_type":"damage_bonus","value":3}
        ]"#;
        let effects: Vec<TempEffect> = serde_json::from_str(json).expect("parses");
        assert_eq!(effects[0].duration, EffectDuration::Rounds(10));
        assert_eq!(effects[1].duration, EffectDuration::Named(NamedDuration::Manual));
        assert_eq!(effects[1].value, EffectValue::Number(3));
    }

    #[test]
    fn legacy_session_shape_gets_defaults() {
        let json = r#"{"heroic_inspiration":false,"current_turn":0,"temp_effects":[]}"#;
        let mut s: SessionState = serde_json::from_str(json).expect("parses");
        s.normalize();
        assert_eq!(s.current_turn, 1);
        assert!(s.brutal_strike_available);
        assert!(!s.heroic_inspiration);
    }
}
