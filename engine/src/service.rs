//! Owns the character, the session resources, settings, dice and history for
//! one run of the assistant. Resolvers borrow it mutably; every resource
//! change is committed to the store before the method returns.

use tracing::{debug, info, warn};

use crate::character::Character;
use crate::dice::Dice;
use crate::history::{TurnAction, TurnHistory};
use crate::session::SessionState;
use crate::settings::Settings;
use crate::store::{Loaded, StateStore};
use crate::surge::{self, SurgeBonusOutcome, SurgeEffect};

pub struct CombatService {
    character: Character,
    state: SessionState,
    settings: Settings,
    dice: Dice,
    history: TurnHistory,
    store: Box<dyn StateStore>,
}

impl CombatService {
    pub fn new(
        character: Character,
        state: SessionState,
        settings: Settings,
        dice: Dice,
        store: Box<dyn StateStore>,
    ) -> Self {
        Self {
            character,
            state,
            settings,
            dice,
            history: TurnHistory::new(),
            store,
        }
    }

    pub fn from_loaded(loaded: Loaded, dice: Dice, store: Box<dyn StateStore>) -> Self {
        Self::new(loaded.character, loaded.session, loaded.settings, dice, store)
    }

    pub fn character(&self) -> &Character {
        &self.character
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn history(&self) -> &TurnHistory {
        &self.history
    }

    pub fn dice(&mut self) -> &mut Dice {
        &mut self.dice
    }

    pub(crate) fn record(&mut self, action: TurnAction) {
        debug!(%action, "history");
        self.history.record(action);
    }

    pub(crate) fn start_turn_history(&mut self) {
        self.history.start_turn(self.state.current_turn);
    }

    pub(crate) fn end_turn_history(&mut self) {
        self.history.end_turn();
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Persist the session. A failed save is logged, never rolled back.
    fn commit(&mut self, what: &'static str) {
        if let Err(e) = self.store.save_session(&self.state) {
            warn!(error = %e, what, "failed to persist session state");
        }
    }

    fn commit_settings(&mut self, what: &'static str) {
        if let Err(e) = self.store.save_settings(&self.settings) {
            warn!(error = %e, what, "failed to persist settings");
        }
    }

    /* ---------------- rage ---------------- */

    pub fn can_activate_rage(&self) -> bool {
        self.state.can_start_rage(&self.character)
    }

    /// Spend a rage. Wild magic characters also roll a surge. Returns false
    /// (and changes nothing) when rage can't start.
    pub fn activate_rage(&mut self) -> bool {
        if !self.can_activate_rage() {
            return false;
        }
        let surge = self
            .character
            .is_wild_magic()
            .then(|| surge::roll_surge(&mut self.dice));
        if !self.state.start_rage(&self.character, surge) {
            return false;
        }
        info!(
            remaining = self.state.rages_remaining,
            surge = ?self.state.current_surge.as_ref().map(|s| s.roll),
            "rage activated"
        );
        self.commit("rage activated");
        true
    }

    pub fn end_rage(&mut self) -> bool {
        let ended = self.state.end_rage();
        if ended {
            info!("rage ended");
            self.commit("rage ended");
        }
        ended
    }

    /// Flat bonus added to weapon damage while raging.
    pub fn current_rage_damage(&self) -> i32 {
        if self.state.rage_active {
            self.character.rage_damage()
        } else {
            0
        }
    }

    pub fn current_surge(&self) -> Option<&SurgeEffect> {
        self.state.current_surge.as_ref()
    }

    pub fn surge_bonus_action_available(&self) -> bool {
        self.current_surge()
            .is_some_and(|s| s.bonus_action_repeatable)
    }

    /// Re-use the active surge effect, rolling whatever dice it calls for.
    pub fn use_surge_bonus_action(&mut self) -> Option<SurgeBonusOutcome> {
        let effect = self.state.current_surge.clone()?;
        surge::use_bonus_action(&effect, &self.character, &mut self.dice)
    }

    /* ---------------- heroic inspiration ---------------- */

    pub fn use_heroic_inspiration(&mut self) -> bool {
        let used = self.state.use_heroic_inspiration();
        if used {
            info!("heroic inspiration consumed");
            self.commit("heroic inspiration used");
        }
        used
    }

    pub fn restore_heroic_inspiration(&mut self) {
        self.state.restore_heroic_inspiration();
        self.commit("heroic inspiration restored");
    }

    pub fn toggle_heroic_inspiration(&mut self) {
        self.state.toggle_heroic_inspiration();
        self.commit("heroic inspiration toggled");
    }

    /* ---------------- once-per-turn features ---------------- */

    pub fn brutal_strike_offered(&self) -> bool {
        self.state.brutal_strike_offered(&self.character)
    }

    pub fn savage_attacks_offered(&self) -> bool {
        self.state.savage_attacks_offered(&self.character)
    }

    pub fn use_brutal_strike(&mut self) {
        self.state.use_brutal_strike(&self.character);
        self.commit("brutal strike used");
    }

    pub fn use_savage_attacks(&mut self) {
        self.state.use_savage_attacks(&self.character);
        self.commit("savage attacks used");
    }

    /* ---------------- turn and rest ---------------- */

    /// Move to the next turn and make once-per-turn features available.
    pub fn advance_turn(&mut self) {
        self.state.advance_turn();
        info!(turn = self.state.current_turn, "advanced turn");
        self.commit("turn advanced");
    }

    pub fn reset_combat(&mut self) {
        self.state.reset_combat();
        self.history.clear();
        info!("combat reset");
        self.commit("combat reset");
    }

    pub fn long_rest(&mut self) {
        self.state.long_rest(&self.character);
        self.history.clear();
        info!(rages = self.state.rages_remaining, "long rest");
        self.commit("long rest");
    }

    /* ---------------- settings ---------------- */

    pub fn toggle_crit_animations(&mut self) {
        self.settings.toggle_crit_animations();
        self.commit_settings("crit animations toggled");
    }

    pub fn set_always_crit(&mut self, enabled: bool) {
        self.settings.set_always_crit(enabled);
        self.commit_settings("always crit set");
    }

    pub fn set_force_heroic_inspiration(&mut self, enabled: bool) {
        self.settings.set_force_heroic_inspiration(enabled);
        self.commit_settings("force heroic inspiration set");
    }

    pub fn toggle_testing_mode(&mut self) {
        self.settings.toggle_testing_mode();
        self.commit_settings("testing mode toggled");
    }
}
