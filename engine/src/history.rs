//! Append-only record of what happened, grouped by turn.

use std::fmt;

use chrono::Local;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Attack,
    Damage,
    BonusAction,
}

impl ActionKind {
    pub fn icon(self) -> &'static str {
        match self {
            ActionKind::Attack => "⚔️",
            ActionKind::Damage => "💥",
            ActionKind::BonusAction => "🎯",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnAction {
    pub kind: ActionKind,
    pub timestamp: String,
    pub details: String,
    pub result: String,
    /// Weapon damage dealt; only damage actions carry one.
    pub damage: Option<i32>,
}

impl TurnAction {
    pub fn attack(mode_label: &str, total: i32, hit: bool) -> Self {
        Self {
            kind: ActionKind::Attack,
            timestamp: now(),
            details: format!("{} attack ({})", mode_label, total),
            result: if hit { "HIT" } else { "MISS" }.to_string(),
            damage: None,
        }
    }

    pub fn damage(amount: i32, breakdown: &str, flags: &str) -> Self {
        let details = if flags.is_empty() {
            breakdown.to_string()
        } else {
            format!("{} ({})", breakdown, flags)
        };
        Self {
            kind: ActionKind::Damage,
            timestamp: now(),
            details,
            result: format!("{} damage", amount),
            damage: Some(amount),
        }
    }

    pub fn bonus_action(name: &str, result: &str) -> Self {
        Self {
            kind: ActionKind::BonusAction,
            timestamp: now(),
            details: name.to_string(),
            result: result.to_string(),
            damage: None,
        }
    }
}

impl fmt::Display for TurnAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} → {}", self.kind.icon(), self.details, self.result)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnSummary {
    pub turn_number: u32,
    pub started_at: String,
    pub actions: Vec<TurnAction>,
    pub total_damage: i32,
}

impl TurnSummary {
    fn new(turn_number: u32) -> Self {
        Self {
            turn_number,
            started_at: now(),
            actions: Vec::new(),
            total_damage: 0,
        }
    }

    fn push(&mut self, action: TurnAction) {
        self.total_damage += action.damage.unwrap_or(0);
        self.actions.push(action);
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TurnHistory {
    turns: Vec<TurnSummary>,
    current: Option<TurnSummary>,
    outside_turns: Vec<TurnAction>,
}

impl TurnHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a fresh accumulator. An unclosed previous turn is closed first;
    /// one still open for `turn_number` is kept.
    pub fn start_turn(&mut self, turn_number: u32) {
        if self.current.as_ref().is_some_and(|t| t.turn_number == turn_number) {
            return;
        }
        self.end_turn();
        self.current = Some(TurnSummary::new(turn_number));
    }

    pub fn end_turn(&mut self) {
        if let Some(turn) = self.current.take() {
            self.turns.push(turn);
        }
    }

    pub fn record(&mut self, action: TurnAction) {
        match self.current.as_mut() {
            Some(turn) => turn.push(action),
            None => self.outside_turns.push(action),
        }
    }

    /// Completed turns.
    pub fn count(&self) -> usize {
        self.turns.len()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
        self.current = None;
        self.outside_turns.clear();
    }

    pub fn turns(&self) -> &[TurnSummary] {
        &self.turns
    }

    pub fn current(&self) -> Option<&TurnSummary> {
        self.current.as_ref()
    }

    pub fn outside_turns(&self) -> &[TurnAction] {
        &self.outside_turns
    }

    /// Damage dealt so far in the open turn.
    pub fn current_damage(&self) -> i32 {
        self.current.as_ref().map_or(0, |t| t.total_damage)
    }
}

fn now() -> String {
    Local::now().format("%H:%M:%S").to_string()
}
