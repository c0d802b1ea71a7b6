use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Sides of the attack die; the only die `force_max` applies to.
pub const ATTACK_DIE: u32 = 20;

/// Highest first draw that the reroll-low policy rerolls.
pub const REROLL_LOW_THRESHOLD: u32 = 2;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AdMode {
    Normal,
    Advantage,
}

/// Source of every die outcome in the engine.
///
/// Seeded dice are fully deterministic. Scripted dice hand out queued
/// outcomes first (clamped into the die's range) and fall back to a seeded
/// generator once the script runs dry.
pub struct Dice {
    rng: ChaCha8Rng,
    script: VecDeque<u32>,
    draws: u64,
}

impl Dice {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            script: VecDeque::new(),
            draws: 0,
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
            script: VecDeque::new(),
            draws: 0,
        }
    }

    pub fn from_scripted(outcomes: Vec<u32>) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(0),
            script: outcomes.into(),
            draws: 0,
        }
    }

    /// Number of underlying draws taken so far. Forced results don't count.
    pub fn draws(&self) -> u64 {
        self.draws
    }

    fn draw(&mut self, sides: u32) -> u32 {
        self.draws += 1;
        match self.script.pop_front() {
            Some(v) => v.clamp(1, sides),
            None => self.rng.gen_range(1..=sides),
        }
    }

    /// Roll one die of `sides` faces.
    ///
    /// `force_max` only affects the d20 and returns 20 without drawing.
    /// `reroll_low` rerolls a first draw of 1 or 2 exactly once and keeps the
    /// second draw whatever it shows.
    pub fn roll(&mut self, sides: u32, reroll_low: bool, force_max: bool) -> u32 {
        if force_max && sides == ATTACK_DIE {
            return sides;
        }
        let first = self.draw(sides);
        if reroll_low && first <= REROLL_LOW_THRESHOLD {
            return self.draw(sides);
        }
        first
    }

    /// Roll the attack die. Returns every raw d20 and the kept one.
    pub fn d20(&mut self, mode: AdMode, force_max: bool) -> (Vec<u32>, u32) {
        match mode {
            AdMode::Normal => {
                let r = self.roll(ATTACK_DIE, false, force_max);
                (vec![r], r)
            }
            AdMode::Advantage => {
                let a = self.roll(ATTACK_DIE, false, force_max);
                let b = self.roll(ATTACK_DIE, false, force_max);
                (vec![a, b], a.max(b))
            }
        }
    }
}
