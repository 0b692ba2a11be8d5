use crate::pokemon::Combatant;
use serde::{Deserialize, Serialize};

/// Where a seat's move selections come from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerType {
    /// The local human at the controls.
    Human,
    /// A locally simulated raid member.
    Bot,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum PlayerAction {
    // The index refers to the move's position in the combatant's move list.
    UseMove { move_index: usize },

    // No move this turn; the seat deals no damage.
    Pass,
}

/// One attacking seat in a battle.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BattlePlayer {
    // A unique identifier. For the human this is their session id,
    // for a mock raid member something like "mock-player-2".
    pub player_id: String,
    pub player_name: String,
    pub player_type: PlayerType,
    pub combatant: Combatant,
}

impl BattlePlayer {
    /// Create a new BattlePlayer
    pub fn new(
        player_id: impl Into<String>,
        player_name: impl Into<String>,
        player_type: PlayerType,
        combatant: Combatant,
    ) -> Self {
        Self {
            player_id: player_id.into(),
            player_name: player_name.into(),
            player_type,
            combatant,
        }
    }

    pub fn human(player_name: impl Into<String>, combatant: Combatant) -> Self {
        Self::new("player-1", player_name, PlayerType::Human, combatant)
    }

    pub fn is_alive(&self) -> bool {
        self.combatant.is_alive()
    }
}
