use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TestingMode {
    /// Every d20 comes up 20.
    #[serde(default)]
    pub always_crit: bool,
    /// Loaded and toggleable, not consulted when resolving damage.
    #[serde(default)]
    pub force_heroic_inspiration: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_animations")]
    pub enable_crit_animations: bool,
    #[serde(default)]
    pub testing_mode: Option<TestingMode>,
}

fn default_animations() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable_crit_animations: default_animations(),
            testing_mode: None,
        }
    }
}

impl Settings {
    pub fn animations_enabled(&self) -> bool {
        self.enable_crit_animations
    }

    pub fn always_crit(&self) -> bool {
        self.testing_mode.is_some_and(|t| t.always_crit)
    }

    pub fn force_heroic_inspiration(&self) -> bool {
        self.testing_mode.is_some_and(|t| t.force_heroic_inspiration)
    }

    pub fn toggle_crit_animations(&mut self) {
        self.enable_crit_animations = !self.enable_crit_animations;
    }

    pub fn set_always_crit(&mut self, enabled: bool) {
        self.testing_mode.get_or_insert_with(TestingMode::default).always_crit = enabled;
    }

    pub fn set_force_heroic_inspiration(&mut self, enabled: bool) {
        self.testing_mode
            .get_or_insert_with(TestingMode::default)
            .force_heroic_inspiration = enabled;
    }

    /// Switching testing mode on starts with always-crit enabled.
    pub fn toggle_testing_mode(&mut self) {
        self.testing_mode = match self.testing_mode {
            Some(_) => None,
            None => Some(TestingMode {
                always_crit: true,
                force_heroic_inspiration: false,
            }),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn testing_mode_toggle_round_trip() {
        let mut s = Settings::default();
        assert!(!s.always_crit());
        s.toggle_testing_mode();
        assert!(s.always_crit());
        assert!(!s.force_heroic_inspiration());
        s.toggle_testing_mode();
        assert_eq!(s.testing_mode, None);
    }

    #[test]
    fn setters_create_testing_mode_on_demand() {
        let mut s = Settings::default();
        s.set_force_heroic_inspiration(true);
        assert!(s.force_heroic_inspiration());
        assert!(!s.always_crit());
    }
}
