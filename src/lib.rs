// In: src/lib.rs

//! Pokemon Battle Client Core
//!
//! Turn-based raid battles against a boss, fed by a buffered pool of moves
//! fetched from a remote move service. Damage comes from a remote calculator
//! when one is reachable and from the local formula otherwise.

// --- MODULE DECLARATIONS ---
pub mod battle;
pub mod config;
pub mod errors;
pub mod moves;
pub mod player;
pub mod pokemon;
pub mod services;
pub mod session;
pub mod skill_buffer;
pub mod species;

// --- PUBLIC API RE-EXPORTS ---

// --- From the `schema` crate ---
pub use schema::{BaseStats, PokemonTemplate, PokemonType, Skill};

// --- From this crate's modules (`src/`) ---

// Battle engine, runner and state.
pub use battle::calculators::{compute_damage, DamageInput};
pub use battle::engine::BattleEngine;
pub use battle::runner::{BattleInfo, BattleReport, BattleRunner, CombatantInfo};
pub use battle::selection::{FixedChoice, HumanController, HumanInput, RandomDelayBot, SelectionStrategy};
pub use battle::state::{BattleEvent, BattleOutcome, BattlePhase, BattleState, TurnRng};

// Core runtime types for a battle.
pub use player::{BattlePlayer, PlayerAction, PlayerType};
pub use pokemon::Combatant;

// Catalog access.
pub use species::{effectiveness, get_move, get_template, instantiate};

// Session and move pool.
pub use config::GameConfig;
pub use services::Services;
pub use session::{Action, GameSession, GameState, Screen};
pub use skill_buffer::{BufferStatus, SkillBuffer};

// Crate-specific error and result types.
pub use errors::{
    BattleError, CatalogError, GameError, GameResult, SelectionRejected, ServiceError, SkillBufferError,
};
