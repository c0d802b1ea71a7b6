//! Combat assistant for a barbarian at the table: dice with reroll policies,
//! attack and damage resolution, and the per-session resources they spend.

pub mod attack;
pub mod character;
pub mod content;
pub mod damage;
pub mod dice;
pub mod error;
pub mod history;
pub mod oracle;
pub mod progression;
pub mod service;
pub mod session;
pub mod settings;
pub mod store;
pub mod surge;
pub mod turn;

pub use attack::{resolve_attack, roll_attack, AttackMode, AttackOutcome, AttackRoll, FollowUp};
pub use character::Character;
pub use damage::{compute_damage, roll_damage, DamageOptions, DamageResult};
pub use dice::{AdMode, Dice};
pub use error::{ConfigError, Interrupted, StoreError, TurnError};
pub use history::{TurnAction, TurnHistory};
pub use oracle::{Answer, Oracle, ScriptedOracle};
pub use service::CombatService;
pub use session::SessionState;
pub use settings::Settings;
pub use store::{FileStore, Loaded, MemoryStore, StateStore};
pub use turn::{run_turn, BonusAction, BonusOutcome, Turn, TurnExit, TurnPhase};
