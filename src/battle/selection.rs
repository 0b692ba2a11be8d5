//! Where each attacking seat's move choice comes from.
//!
//! The runner asks every living seat's strategy once per selection phase and
//! cancels whatever is still pending when the phase closes, so a strategy may
//! take as long as it likes.
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::battle::ai::{Behavior, RandomBehavior};
use crate::battle::state::{BattleState, TurnRng};
use crate::config::BattleConfig;
use crate::player::PlayerAction;

#[async_trait]
pub trait SelectionStrategy: Send + Sync {
    /// Decide this seat's action for the turn in `snapshot`.
    /// `None` means the seat will not choose; it forfeits when time runs out.
    async fn select(&self, player_index: usize, snapshot: &BattleState) -> Option<PlayerAction>;
}

/// A move choice from the human, tagged with the turn it was made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanChoice {
    pub turn_number: u32,
    pub move_index: usize,
}

/// Seat driven by the local player through a [`HumanController`].
#[derive(Debug)]
pub struct HumanInput {
    inputs: tokio::sync::Mutex<mpsc::UnboundedReceiver<HumanChoice>>,
}

/// Sending half held by the UI.
#[derive(Debug, Clone)]
pub struct HumanController {
    sender: mpsc::UnboundedSender<HumanChoice>,
}

impl HumanInput {
    pub fn channel() -> (Self, HumanController) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                inputs: tokio::sync::Mutex::new(receiver),
            },
            HumanController { sender },
        )
    }
}

impl HumanController {
    /// Returns false once the battle is gone.
    pub fn choose(&self, turn_number: u32, move_index: usize) -> bool {
        self.sender
            .send(HumanChoice {
                turn_number,
                move_index,
            })
            .is_ok()
    }
}

#[async_trait]
impl SelectionStrategy for HumanInput {
    async fn select(&self, player_index: usize, snapshot: &BattleState) -> Option<PlayerAction> {
        let known_moves = snapshot
            .attackers
            .get(player_index)
            .map_or(0, |player| player.combatant.moves.len());
        let mut inputs = self.inputs.lock().await;
        while let Some(choice) = inputs.recv().await {
            if choice.turn_number != snapshot.turn_number {
                tracing::debug!(
                    choice_turn = choice.turn_number,
                    current_turn = snapshot.turn_number,
                    "discarding stale human choice"
                );
                continue;
            }
            // An empty slot is not a choice; keep waiting for one that is.
            if choice.move_index >= known_moves {
                tracing::debug!(move_index = choice.move_index, known_moves, "ignoring empty move slot");
                continue;
            }
            return Some(PlayerAction::UseMove {
                move_index: choice.move_index,
            });
        }
        None
    }
}

/// Simulated raid member: "thinks" for a random delay, then asks its behavior.
pub struct RandomDelayBot {
    behavior: Box<dyn Behavior>,
    delay_min: Duration,
    delay_max: Duration,
    rng: Mutex<TurnRng>,
}

impl RandomDelayBot {
    pub fn new(behavior: Box<dyn Behavior>, delay_min: Duration, delay_max: Duration, rng: TurnRng) -> Self {
        Self {
            behavior,
            delay_min,
            delay_max: delay_max.max(delay_min),
            rng: Mutex::new(rng),
        }
    }

    /// Uniform random choice inside the configured thinking window.
    pub fn from_config(config: &BattleConfig) -> Self {
        Self::new(
            Box::new(RandomBehavior),
            config.bot_delay_min,
            config.bot_delay_max,
            TurnRng::new_random(),
        )
    }

    fn draw<T>(&self, f: impl FnOnce(&mut TurnRng) -> T) -> Option<T> {
        match self.rng.lock() {
            Ok(mut rng) => Some(f(&mut rng)),
            Err(_) => {
                tracing::error!("bot rng poisoned");
                None
            }
        }
    }
}

#[async_trait]
impl SelectionStrategy for RandomDelayBot {
    async fn select(&self, player_index: usize, snapshot: &BattleState) -> Option<PlayerAction> {
        let spread = self.delay_max - self.delay_min;
        let delay = self.draw(|rng| self.delay_min + spread.mul_f64(rng.next_outcome("bot thinking delay")))?;
        tokio::time::sleep(delay).await;

        let action = self.draw(|rng| self.behavior.decide_action(player_index, snapshot, rng))?;
        tracing::debug!(player_index, ?delay, ?action, "bot selected");
        Some(action)
    }
}

/// Always answers the same way after a fixed delay. Used for replays and tests.
#[derive(Debug, Clone)]
pub struct FixedChoice {
    action: Option<PlayerAction>,
    delay: Duration,
}

impl FixedChoice {
    pub fn new(action: Option<PlayerAction>, delay: Duration) -> Self {
        Self { action, delay }
    }

    pub fn move_after(move_index: usize, delay: Duration) -> Self {
        Self::new(Some(PlayerAction::UseMove { move_index }), delay)
    }

    /// A seat that never chooses.
    pub fn idle() -> Self {
        Self::new(None, Duration::ZERO)
    }
}

#[async_trait]
impl SelectionStrategy for FixedChoice {
    async fn select(&self, _player_index: usize, _snapshot: &BattleState) -> Option<PlayerAction> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.action.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::tests::common::{raid_state, TestCombatantBuilder};
    use pretty_assertions::assert_eq;
    use tokio::time::Instant;

    fn snapshot(turn_number: u32) -> BattleState {
        let mut state = raid_state(
            vec![TestCombatantBuilder::new("charmander").build()],
            TestCombatantBuilder::new("snorlax").build(),
        );
        state.turn_number = turn_number;
        state
    }

    #[tokio::test]
    async fn human_input_skips_choices_for_other_turns() {
        let (input, controller) = HumanInput::channel();
        assert!(controller.choose(1, 3));
        assert!(controller.choose(2, 1));

        let action = input.select(0, &snapshot(2)).await;
        assert_eq!(action, Some(PlayerAction::UseMove { move_index: 1 }));
    }

    #[tokio::test]
    async fn human_input_waits_past_an_empty_move_slot() {
        let (input, controller) = HumanInput::channel();
        assert!(controller.choose(1, 9));
        assert!(controller.choose(1, 2));

        let action = input.select(0, &snapshot(1)).await;
        assert_eq!(action, Some(PlayerAction::UseMove { move_index: 2 }));
    }

    #[tokio::test]
    async fn human_input_ends_when_controller_is_dropped() {
        let (input, controller) = HumanInput::channel();
        drop(controller);
        assert_eq!(input.select(0, &snapshot(1)).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn bot_waits_inside_its_window_then_decides() {
        let bot = RandomDelayBot::new(
            Box::new(RandomBehavior),
            Duration::from_secs(5),
            Duration::from_secs(20),
            TurnRng::new_for_test(vec![0.5, 0.3]),
        );
        let started = Instant::now();

        let action = bot.select(0, &snapshot(1)).await;

        assert_eq!(started.elapsed(), Duration::from_millis(12_500));
        assert_eq!(action, Some(PlayerAction::UseMove { move_index: 1 }));
    }

    #[tokio::test(start_paused = true)]
    async fn fixed_choice_is_deterministic() {
        let seat = FixedChoice::move_after(2, Duration::from_secs(7));
        let started = Instant::now();
        assert_eq!(
            seat.select(0, &snapshot(1)).await,
            Some(PlayerAction::UseMove { move_index: 2 })
        );
        assert_eq!(started.elapsed(), Duration::from_secs(7));
        assert_eq!(FixedChoice::idle().select(0, &snapshot(1)).await, None);
    }
}
