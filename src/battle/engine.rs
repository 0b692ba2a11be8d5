use std::sync::Arc;

use schema::{PokemonType, Skill};

use crate::battle::calculators::{compute_damage, move_hits, roll_critical, DamageInput};
use crate::battle::state::{BattleEvent, BattleOutcome, BattlePhase, BattleState, EventBus, TurnRng};
use crate::config::BattleConfig;
use crate::errors::{BattleError, BattleResult, SelectionRejected};
use crate::player::{BattlePlayer, PlayerAction};
use crate::pokemon::Combatant;
use crate::services::{DamageRequest, DamageService};

/// The side dealing damage in one exchange.
#[derive(Debug, Clone)]
struct Striker {
    name: String,
    level: u8,
    attack: u16,
}

/// The side receiving it.
#[derive(Debug, Clone)]
struct Target {
    name: String,
    defense: u16,
    pokemon_type: PokemonType,
}

impl Striker {
    fn of(combatant: &Combatant) -> Self {
        Self {
            name: combatant.name.clone(),
            level: combatant.level,
            attack: combatant.stats.attack,
        }
    }
}

impl Target {
    fn of(combatant: &Combatant) -> Self {
        Self {
            name: combatant.name.clone(),
            defense: combatant.stats.defense,
            pokemon_type: combatant.pokemon_type,
        }
    }
}

/// Turn state machine for one battle: N attackers against one defender.
///
/// The engine never sleeps. Countdown and intro timing belong to the caller,
/// which reports them through [`BattleEngine::finish_intro`] and
/// [`BattleEngine::expire_selection`].
pub struct BattleEngine {
    state: BattleState,
    config: BattleConfig,
    damage: Arc<dyn DamageService>,
    rng: TurnRng,
}

impl BattleEngine {
    pub fn new(
        battle_id: impl Into<String>,
        attackers: Vec<BattlePlayer>,
        defender: Combatant,
        config: BattleConfig,
        damage: Arc<dyn DamageService>,
        rng: TurnRng,
    ) -> BattleResult<Self> {
        if attackers.is_empty() {
            return Err(BattleError::NoAttackers);
        }
        if defender.moves.is_empty() {
            return Err(BattleError::DefenderWithoutMoves(defender.name.clone()));
        }

        let state = BattleState::new(battle_id, attackers, defender, config.log_capacity);
        Ok(Self {
            state,
            config,
            damage,
            rng,
        })
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    pub fn phase(&self) -> BattlePhase {
        self.state.phase
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    fn emit(&mut self, bus: &mut EventBus, event: BattleEvent) {
        self.state.record(&event);
        bus.push(event);
    }

    fn require_phase(&self, expected: BattlePhase) -> BattleResult<()> {
        if self.state.phase != expected {
            return Err(BattleError::WrongPhase(format!("{:?}", self.state.phase)));
        }
        Ok(())
    }

    /// Announce the encounter. The engine stays in `Entering` until the
    /// introduction is over.
    pub fn enter(&mut self) -> BattleResult<EventBus> {
        self.require_phase(BattlePhase::Entering)?;
        let mut bus = EventBus::new();
        let event = BattleEvent::BattleStarted {
            defender: self.state.defender.name.clone(),
            attackers: self.state.attackers.len(),
        };
        self.emit(&mut bus, event);
        tracing::info!(battle_id = %self.state.battle_id, "battle started");
        Ok(bus)
    }

    /// End of the introduction: open the first selection phase.
    pub fn finish_intro(&mut self) -> BattleResult<EventBus> {
        self.require_phase(BattlePhase::Entering)?;
        let mut bus = EventBus::new();
        self.state.turn_number = 1;
        self.open_selection(&mut bus);
        Ok(bus)
    }

    fn open_selection(&mut self, bus: &mut EventBus) {
        self.state.phase = BattlePhase::Selection;
        self.state.action_queue = vec![None; self.state.attackers.len()];
        self.state.selection_expired = false;
        self.state.countdown_remaining_ms = self.config.selection_timeout.as_millis() as u64;

        let turn_number = self.state.turn_number;
        self.emit(bus, BattleEvent::TurnStarted { turn_number });
        let timeout_ms = self.state.countdown_remaining_ms;
        self.emit(bus, BattleEvent::SelectionOpened { turn_number, timeout_ms });
        tracing::debug!(turn_number, "selection phase opened");
    }

    /// Choose a move for one attacker this turn.
    pub fn submit_selection(
        &mut self,
        player_index: usize,
        move_index: usize,
    ) -> Result<EventBus, SelectionRejected> {
        self.submit_action(player_index, PlayerAction::UseMove { move_index })
    }

    /// Queue an action for one attacker. Everything outside an open selection
    /// window, and every second choice from the same seat, is rejected.
    pub fn submit_action(
        &mut self,
        player_index: usize,
        action: PlayerAction,
    ) -> Result<EventBus, SelectionRejected> {
        if self.state.is_over() {
            return Err(SelectionRejected::BattleOver);
        }
        match self.state.phase {
            BattlePhase::Resolution | BattlePhase::Counter => {
                return Err(SelectionRejected::ResolutionInProgress)
            }
            BattlePhase::Entering => return Err(SelectionRejected::NotOpen),
            BattlePhase::Selection | BattlePhase::Victory | BattlePhase::Defeat => {}
        }
        if self.state.selection_expired {
            return Err(SelectionRejected::TimeExpired);
        }

        let player = self
            .state
            .attackers
            .get(player_index)
            .ok_or(SelectionRejected::UnknownAttacker(player_index))?;
        if !player.is_alive() {
            return Err(SelectionRejected::AttackerFainted(player_index));
        }
        if self.state.action_queue[player_index].is_some() {
            return Err(SelectionRejected::AlreadySelected(player_index));
        }
        if let PlayerAction::UseMove { move_index } = action {
            if player.combatant.move_at(move_index).is_none() {
                return Err(SelectionRejected::InvalidMoveIndex(move_index));
            }
        }

        let player_name = player.player_name.clone();
        self.state.action_queue[player_index] = Some(action);

        let mut bus = EventBus::new();
        self.emit(&mut bus, BattleEvent::MoveSelected { player_index, player_name });
        Ok(bus)
    }

    /// True once the current selection phase may end.
    pub fn selection_complete(&self) -> bool {
        self.state.phase == BattlePhase::Selection
            && (self.state.selection_expired || self.state.all_selected())
    }

    pub fn set_countdown_remaining(&mut self, remaining_ms: u64) {
        self.state.countdown_remaining_ms = remaining_ms;
    }

    /// The countdown elapsed. Every living attacker without a choice forfeits.
    pub fn expire_selection(&mut self) -> BattleResult<EventBus> {
        self.require_phase(BattlePhase::Selection)?;
        let mut bus = EventBus::new();
        if self.state.selection_expired {
            return Ok(bus);
        }

        self.state.selection_expired = true;
        self.state.countdown_remaining_ms = 0;
        let turn_number = self.state.turn_number;
        self.emit(&mut bus, BattleEvent::SelectionTimedOut { turn_number });

        for player_index in self.state.living_attackers() {
            if self.state.action_queue[player_index].is_none() {
                self.state.action_queue[player_index] = Some(PlayerAction::Pass);
                let player_name = self.state.attackers[player_index].player_name.clone();
                self.emit(&mut bus, BattleEvent::SelectionForfeited { player_index, player_name });
            }
        }
        tracing::debug!(turn_number, "selection countdown expired");
        Ok(bus)
    }

    /// Run the resolution and, unless the defender falls, the counter phase.
    pub async fn play_turn(&mut self) -> BattleResult<EventBus> {
        let mut bus = self.resolve_attacks().await?;
        if self.state.phase == BattlePhase::Counter {
            let counter = self.counter_attack().await?;
            for event in counter.into_events() {
                bus.push(event);
            }
        }
        Ok(bus)
    }

    /// Apply every selected attack in seat order. Damage is summed and taken
    /// from the defender once.
    pub async fn resolve_attacks(&mut self) -> BattleResult<EventBus> {
        self.require_phase(BattlePhase::Selection)?;
        if !self.selection_complete() {
            return Err(BattleError::WrongPhase("Selection (still open)".to_string()));
        }
        self.state.phase = BattlePhase::Resolution;

        let mut bus = EventBus::new();
        let target = Target::of(&self.state.defender);
        let mut total: u32 = 0;
        let mut attacks = 0;

        for player_index in 0..self.state.attackers.len() {
            let Some(PlayerAction::UseMove { move_index }) = self.state.action_queue[player_index] else {
                continue;
            };
            let player = &self.state.attackers[player_index];
            if !player.is_alive() {
                continue;
            }
            let Some(skill) = player.combatant.move_at(move_index).cloned() else {
                continue;
            };
            let striker = Striker::of(&player.combatant);

            self.emit(
                &mut bus,
                BattleEvent::MoveUsed {
                    attacker: striker.name.clone(),
                    move_name: skill.name.clone(),
                },
            );
            let damage = self.strike(&striker, &target, &skill, &mut bus).await;
            total = total.saturating_add(damage);
            attacks += 1;
        }

        let fainted = self.state.defender.take_damage(total);
        if attacks > 0 {
            let event = BattleEvent::TotalDamageApplied {
                target: target.name.clone(),
                total,
                remaining_hp: self.state.defender.current_hp(),
            };
            self.emit(&mut bus, event);
        }
        tracing::debug!(
            turn = self.state.turn_number,
            attacks,
            total,
            remaining_hp = self.state.defender.current_hp(),
            "resolution phase done"
        );

        if self.state.defender.is_fainted() {
            if fainted {
                self.emit(&mut bus, BattleEvent::CombatantFainted { name: target.name });
            }
            self.finish(BattleOutcome::Win, &mut bus);
        } else {
            self.state.phase = BattlePhase::Counter;
        }
        Ok(bus)
    }

    /// The defender strikes back at one random living attacker.
    pub async fn counter_attack(&mut self) -> BattleResult<EventBus> {
        self.require_phase(BattlePhase::Counter)?;
        let mut bus = EventBus::new();

        let living = self.state.living_attackers();
        if living.is_empty() {
            self.finish(BattleOutcome::Lose, &mut bus);
            return Ok(bus);
        }

        let move_index = self.rng.pick_index(self.state.defender.moves.len(), "counter move");
        let target_index = living[self.rng.pick_index(living.len(), "counter target")];

        let skill = self.state.defender.moves[move_index].clone();
        let striker = Striker::of(&self.state.defender);
        let target = Target::of(&self.state.attackers[target_index].combatant);

        self.emit(
            &mut bus,
            BattleEvent::CounterAttack {
                attacker: striker.name.clone(),
                target: target.name.clone(),
                move_name: skill.name.clone(),
            },
        );
        let damage = self.strike(&striker, &target, &skill, &mut bus).await;

        if self.state.attackers[target_index].combatant.take_damage(damage) {
            self.emit(&mut bus, BattleEvent::CombatantFainted { name: target.name });
        }

        if self.state.all_attackers_fainted() {
            self.finish(BattleOutcome::Lose, &mut bus);
        } else {
            let turn_number = self.state.turn_number;
            self.emit(&mut bus, BattleEvent::TurnEnded { turn_number });
            self.state.turn_number += 1;
            self.open_selection(&mut bus);
        }
        Ok(bus)
    }

    /// One exchange: accuracy, critical roll, then damage from the service
    /// or, if it fails, from the local formula without type effectiveness.
    async fn strike(&mut self, striker: &Striker, target: &Target, skill: &Skill, bus: &mut EventBus) -> u32 {
        if !skill.is_damaging() {
            self.emit(
                bus,
                BattleEvent::MoveHadNoDamage {
                    attacker: striker.name.clone(),
                    move_name: skill.name.clone(),
                },
            );
            return 0;
        }
        if !move_hits(skill, &mut self.rng) {
            self.emit(
                bus,
                BattleEvent::MoveMissed {
                    attacker: striker.name.clone(),
                    move_name: skill.name.clone(),
                },
            );
            return 0;
        }

        let is_critical = roll_critical(&mut self.rng, self.config.crit_denominator);
        let request = DamageRequest {
            attacker_level: striker.level,
            attacker_attack: striker.attack,
            defender_defense: target.defense,
            skill_power: skill.power,
            skill_type: skill.move_type,
            defender_type: target.pokemon_type,
            is_critical,
        };

        let service = Arc::clone(&self.damage);
        let (damage, multiplier) = match service.calculate_damage(&request).await {
            Ok(response) => (response.damage.max(1), Some(response.type_effectiveness)),
            Err(err) => {
                tracing::warn!(error = %err, move_id = %skill.id, "damage service failed, computing locally");
                self.emit(bus, BattleEvent::DamageEstimatedLocally { reason: err.to_string() });
                let input = DamageInput {
                    attacker_level: request.attacker_level,
                    attacker_attack: request.attacker_attack,
                    defender_defense: request.defender_defense,
                    move_power: request.skill_power,
                    type_multiplier: None,
                    is_critical,
                };
                (compute_damage(&input, &mut self.rng), None)
            }
        };

        if is_critical {
            self.emit(bus, BattleEvent::CriticalHit { attacker: striker.name.clone() });
        }
        if let Some(multiplier) = multiplier {
            self.emit(bus, BattleEvent::AttackTypeEffectiveness { multiplier });
        }
        self.emit(
            bus,
            BattleEvent::DamageDealt {
                attacker: striker.name.clone(),
                target: target.name.clone(),
                damage,
            },
        );
        damage
    }

    fn finish(&mut self, outcome: BattleOutcome, bus: &mut EventBus) {
        self.state.phase = match outcome {
            BattleOutcome::Win => BattlePhase::Victory,
            BattleOutcome::Lose => BattlePhase::Defeat,
        };
        self.state.result = Some(outcome);
        self.emit(bus, BattleEvent::BattleEnded { outcome });
        tracing::info!(
            battle_id = %self.state.battle_id,
            ?outcome,
            turns = self.state.turn_number,
            "battle finished"
        );
    }
}

impl std::fmt::Debug for BattleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BattleEngine")
            .field("state", &self.state)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
