//! Level-driven step functions: proficiency, rage uses, rage damage and
//! attacks per turn.

/// Rage count used to represent the level-20 "unlimited" entry.
pub const UNLIMITED_RAGES: u32 = 999;

/// Proficiency bonus for a total character level.
pub fn proficiency_bonus(total_level: u32) -> i32 {
    match total_level {
        0..=4 => 2,
        5..=8 => 3,
        9..=12 => 4,
        13..=16 => 5,
        _ => 6,
    }
}

/// Rages per long rest for a barbarian level.
pub fn max_rages(barbarian_level: u32) -> u32 {
    match barbarian_level {
        0 => 0,
        1..=2 => 2,
        3..=5 => 3,
        6..=11 => 4,
        12..=16 => 5,
        17..=19 => 6,
        _ => UNLIMITED_RAGES,
    }
}

/// Flat damage bonus while raging.
pub fn rage_damage(barbarian_level: u32) -> i32 {
    match barbarian_level {
        0 => 0,
        1..=8 => 2,
        9..=15 => 3,
        _ => 4,
    }
}

pub fn max_attacks(barbarian_level: u32, fighter_level: u32) -> u32 {
    let mut attacks = 1;
    if barbarian_level >= 5 {
        attacks = attacks.max(2);
    }
    let fighter = match fighter_level {
        0..=4 => 1,
        5..=10 => 2,
        11..=19 => 3,
        _ => 4,
    };
    attacks.max(fighter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rage_tables_step_at_the_right_levels() {
        assert_eq!(max_rages(2), 2);
        assert_eq!(max_rages(3), 3);
        assert_eq!(max_rages(6), 4);
        assert_eq!(max_rages(12), 5);
        assert_eq!(max_rages(17), 6);
        assert_eq!(max_rages(20), UNLIMITED_RAGES);
        assert_eq!(rage_damage(8), 2);
        assert_eq!(rage_damage(9), 3);
        assert_eq!(rage_damage(16), 4);
    }

    #[test]
    fn attacks_take_the_best_class() {
        assert_eq!(max_attacks(4, 0), 1);
        assert_eq!(max_attacks(5, 0), 2);
        assert_eq!(max_attacks(5, 11), 3);
        assert_eq!(max_attacks(0, 20), 4);
    }

    #[test]
    fn proficiency_by_total_level() {
        assert_eq!(proficiency_bonus(1), 2);
        assert_eq!(proficiency_bonus(5), 3);
        assert_eq!(proficiency_bonus(12), 4);
        assert_eq!(proficiency_bonus(13), 5);
        assert_eq!(proficiency_bonus(20), 6);
    }
}
