use crate::player::{BattlePlayer, PlayerAction};
use crate::pokemon::Combatant;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Per-battle phase. `Victory` and `Defeat` are terminal.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattlePhase {
    Entering,
    Selection,
    Resolution,
    Counter,
    Victory,
    Defeat,
}

impl BattlePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, BattlePhase::Victory | BattlePhase::Defeat)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleOutcome {
    Win,
    Lose,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BattleEvent {
    // Battle Lifecycle
    BattleStarted {
        defender: String,
        attackers: usize,
    },
    BattleEnded {
        outcome: BattleOutcome,
    },

    // Turn Management
    TurnStarted {
        turn_number: u32,
    },
    SelectionOpened {
        turn_number: u32,
        timeout_ms: u64,
    },
    MoveSelected {
        player_index: usize,
        player_name: String,
    },
    SelectionTimedOut {
        turn_number: u32,
    },
    SelectionForfeited {
        player_index: usize,
        player_name: String,
    },
    TurnEnded {
        turn_number: u32,
    },

    // Attacks
    MoveUsed {
        attacker: String,
        move_name: String,
    },
    MoveMissed {
        attacker: String,
        move_name: String,
    },
    MoveHadNoDamage {
        attacker: String,
        move_name: String,
    },
    CriticalHit {
        attacker: String,
    },
    AttackTypeEffectiveness {
        multiplier: f64,
    },
    DamageDealt {
        attacker: String,
        target: String,
        damage: u32,
    },
    DamageEstimatedLocally {
        reason: String,
    },
    TotalDamageApplied {
        target: String,
        total: u32,
        remaining_hp: u16,
    },
    CounterAttack {
        attacker: String,
        target: String,
        move_name: String,
    },
    CombatantFainted {
        name: String,
    },
}

impl BattleEvent {
    /// Formats the event into a human-readable log line.
    /// Returns None for silent events that should not produce user-visible text.
    pub fn format(&self) -> Option<String> {
        match self {
            // === Lifecycle Events ===
            BattleEvent::BattleStarted { defender, attackers } => {
                if *attackers > 1 {
                    Some(format!("{} appeared! {} trainers join the raid!", defender, attackers))
                } else {
                    Some(format!("A wild {} appeared!", defender))
                }
            }
            BattleEvent::BattleEnded { outcome } => match outcome {
                BattleOutcome::Win => Some("The enemy was defeated! You win!".to_string()),
                BattleOutcome::Lose => Some("Every trainer is out of the fight...".to_string()),
            },

            // === Turn Management Events ===
            BattleEvent::TurnStarted { turn_number } => {
                Some(format!("=== Turn {} ===", turn_number))
            }
            BattleEvent::SelectionOpened { timeout_ms, .. } => Some(format!(
                "Choose a move within {} seconds!",
                timeout_ms / 1000
            )),
            BattleEvent::MoveSelected { player_name, .. } => {
                Some(format!("{} has chosen a move.", player_name))
            }
            BattleEvent::SelectionTimedOut { .. } => Some("Time's up! Resolving...".to_string()),
            BattleEvent::SelectionForfeited { player_name, .. } => {
                Some(format!("{} did not choose a move and skips this turn.", player_name))
            }
            BattleEvent::TurnEnded { .. } => {
                None // Silent - the next turn banner makes it obvious
            }

            // === Attack Events ===
            BattleEvent::MoveUsed { attacker, move_name } => {
                Some(format!("{} used {}!", attacker, move_name))
            }
            BattleEvent::MoveMissed { attacker, .. } => {
                Some(format!("{}'s attack missed!", attacker))
            }
            BattleEvent::MoveHadNoDamage { move_name, .. } => {
                Some(format!("{} dealt no damage.", move_name))
            }
            BattleEvent::CriticalHit { .. } => Some("A critical hit!".to_string()),
            BattleEvent::AttackTypeEffectiveness { multiplier } => match *multiplier {
                m if m > 1.0 => Some("It's super effective!".to_string()),
                m if m < 1.0 && m > 0.0 => Some("It's not very effective...".to_string()),
                0.0 => Some("It had no effect!".to_string()),
                _ => None, // Normal effectiveness, no message
            },
            BattleEvent::DamageDealt { attacker, target, damage } => {
                Some(format!("{} dealt {} damage to {}!", attacker, damage, target))
            }
            BattleEvent::DamageEstimatedLocally { .. } => {
                None // Silent - only traced
            }
            BattleEvent::TotalDamageApplied { target, total, .. } => {
                Some(format!("{} took {} damage in total!", target, total))
            }
            BattleEvent::CounterAttack { attacker, target, move_name } => {
                Some(format!("{} strikes back at {} with {}!", attacker, target, move_name))
            }
            BattleEvent::CombatantFainted { name } => Some(format!("{} fainted!", name)),
        }
    }
}

/// Event bus for collecting the events of one engine step.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    events: Vec<BattleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<BattleEvent> {
        self.events
    }

    /// Human-readable lines for every non-silent event.
    pub fn formatted_lines(&self) -> Vec<String> {
        self.events.iter().filter_map(BattleEvent::format).collect()
    }

    /// Return true if the event bus contains no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Return the number of events in the bus.
    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl std::fmt::Display for EventBus {
    /// Format the EventBus for printing. Shows debug format of all events.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for event in &self.events {
            writeln!(f, "  {:?}", event)?;
        }
        Ok(())
    }
}

/// Random oracle for one battle. Every random decision goes through it, so
/// tests can script exact outcomes.
#[derive(Debug)]
pub struct TurnRng {
    source: RngSource,
}

#[derive(Debug)]
enum RngSource {
    Scripted { outcomes: Vec<f64>, index: usize },
    Live(StdRng),
}

impl TurnRng {
    /// Scripted draws, each in `[0, 1)`. Running out is a test-authoring error.
    pub fn new_for_test(outcomes: Vec<f64>) -> Self {
        Self {
            source: RngSource::Scripted { outcomes, index: 0 },
        }
    }

    pub fn new_random() -> Self {
        Self {
            source: RngSource::Live(StdRng::from_os_rng()),
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            source: RngSource::Live(StdRng::seed_from_u64(seed)),
        }
    }

    /// A uniform draw in `[0, 1)`.
    pub fn next_outcome(&mut self, reason: &str) -> f64 {
        let outcome = match &mut self.source {
            RngSource::Scripted { outcomes, index } => {
                if *index >= outcomes.len() {
                    // Add the reason to the panic message for better debugging!
                    panic!(
                        "TurnRng exhausted! Tried to get a value for: '{}'. Need more random values.",
                        reason
                    );
                }
                let outcome = outcomes[*index];
                *index += 1;
                outcome
            }
            RngSource::Live(rng) => rng.random::<f64>(),
        };
        tracing::trace!(outcome, reason, "rng draw");
        outcome
    }

    /// Bernoulli trial against a percentage, e.g. move accuracy.
    pub fn roll_percent(&mut self, percent: u8, reason: &str) -> bool {
        self.next_outcome(reason) * 100.0 < f64::from(percent)
    }

    /// Bernoulli trial with probability `1 / denominator`.
    pub fn one_in(&mut self, denominator: u32, reason: &str) -> bool {
        self.next_outcome(reason) < 1.0 / f64::from(denominator.max(1))
    }

    /// Uniform index into a collection of `len` items; `len` must be non-zero.
    pub fn pick_index(&mut self, len: usize, reason: &str) -> usize {
        let index = (self.next_outcome(reason) * len as f64) as usize;
        index.min(len.saturating_sub(1))
    }

    /// The damage spread factor, uniform in `[0.85, 1.0]`.
    pub fn damage_factor(&mut self) -> f64 {
        0.85 + self.next_outcome("damage factor") * 0.15
    }
}

/// Most-recent-K battle log lines.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BattleLog {
    capacity: usize,
    lines: VecDeque<String>,
}

impl BattleLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            lines: VecDeque::new(),
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// The battle session: one defender against one or more attacking seats.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BattleState {
    pub battle_id: String,
    pub attackers: Vec<BattlePlayer>,
    pub defender: Combatant,
    pub phase: BattlePhase,
    pub turn_number: u32,
    /// One slot per attacker, filled during the selection phase.
    pub action_queue: Vec<Option<PlayerAction>>,
    /// Set once the countdown has elapsed for the current turn.
    pub selection_expired: bool,
    /// Countdown left in the current selection phase, as last reported.
    pub countdown_remaining_ms: u64,
    pub log: BattleLog,
    pub result: Option<BattleOutcome>,
}

impl BattleState {
    pub fn new(
        battle_id: impl Into<String>,
        attackers: Vec<BattlePlayer>,
        defender: Combatant,
        log_capacity: usize,
    ) -> Self {
        let seats = attackers.len();
        Self {
            battle_id: battle_id.into(),
            attackers,
            defender,
            phase: BattlePhase::Entering,
            turn_number: 1,
            action_queue: vec![None; seats],
            selection_expired: false,
            countdown_remaining_ms: 0,
            log: BattleLog::new(log_capacity),
            result: None,
        }
    }

    pub fn is_over(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Indices of attackers with HP left, in seat order.
    pub fn living_attackers(&self) -> Vec<usize> {
        self.attackers
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_alive())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn all_attackers_fainted(&self) -> bool {
        self.attackers.iter().all(|p| !p.is_alive())
    }

    /// True once every living attacker has a queued action.
    pub fn all_selected(&self) -> bool {
        self.attackers
            .iter()
            .zip(&self.action_queue)
            .all(|(player, action)| !player.is_alive() || action.is_some())
    }

    /// Record an event in the bounded log.
    pub fn record(&mut self, event: &BattleEvent) {
        if let Some(line) = event.format() {
            self.log.push(line);
        }
    }
}
