//! A module for defining AI behaviors for simulated raid members.

use crate::battle::state::{BattleState, TurnRng};
use crate::player::PlayerAction;
use crate::species::effectiveness;
use ordered_float::OrderedFloat;

/// A trait for any system that can decide on a battle action.
/// This provides a common interface for different AI difficulties or strategies.
pub trait Behavior: Send + Sync {
    /// Inspects the battle state and decides on the next action for the given attacker.
    fn decide_action(&self, player_index: usize, battle_state: &BattleState, rng: &mut TurnRng) -> PlayerAction;
}

/// Picks one of the known moves uniformly at random.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomBehavior;

impl Behavior for RandomBehavior {
    fn decide_action(&self, player_index: usize, battle_state: &BattleState, rng: &mut TurnRng) -> PlayerAction {
        let Some(player) = battle_state.attackers.get(player_index) else {
            return PlayerAction::Pass;
        };
        let moves = &player.combatant.moves;
        if moves.is_empty() {
            return PlayerAction::Pass;
        }
        PlayerAction::UseMove {
            move_index: rng.pick_index(moves.len(), "bot move choice"),
        }
    }
}

/// Picks the move with the best expected damage against the defender.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringBehavior;

impl ScoringBehavior {
    pub fn new() -> Self {
        Self
    }

    /// Expected value of a move: power, scaled by type effectiveness and accuracy.
    fn score_move(&self, move_index: usize, player_index: usize, state: &BattleState) -> f64 {
        let attacker = &state.attackers[player_index].combatant;
        let Some(skill) = attacker.move_at(move_index) else {
            return -1.0;
        };
        if !skill.is_damaging() {
            return 0.0;
        }

        let multiplier = effectiveness(skill.move_type, state.defender.pokemon_type);
        // Same-type attack bonus.
        let stab = if skill.move_type == attacker.pokemon_type { 1.5 } else { 1.0 };

        f64::from(skill.power) * multiplier * stab * f64::from(skill.accuracy) / 100.0
    }
}

impl Behavior for ScoringBehavior {
    fn decide_action(&self, player_index: usize, battle_state: &BattleState, _rng: &mut TurnRng) -> PlayerAction {
        let Some(player) = battle_state.attackers.get(player_index) else {
            return PlayerAction::Pass;
        };

        (0..player.combatant.moves.len())
            .max_by_key(|&index| OrderedFloat(self.score_move(index, player_index, battle_state)))
            .map(|move_index| PlayerAction::UseMove { move_index })
            .unwrap_or(PlayerAction::Pass)
    }
}
