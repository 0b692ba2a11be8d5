use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinSet;
use tokio::time::{interval_at, sleep, sleep_until, Instant, MissedTickBehavior};

use crate::battle::engine::BattleEngine;
use crate::battle::selection::SelectionStrategy;
use crate::battle::state::{BattleEvent, BattleOutcome, BattlePhase, BattleState, EventBus};
use crate::errors::{BattleError, BattleResult};
use crate::player::{PlayerAction, PlayerType};
use crate::pokemon::Combatant;

const EVENT_CHANNEL_CAPACITY: usize = 256;
const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// Drives a [`BattleEngine`] in real time: the intro delay, the selection
/// countdown, and the seats' strategies.
pub struct BattleRunner {
    engine: BattleEngine,
    seats: Vec<Arc<dyn SelectionStrategy>>,
    events: broadcast::Sender<BattleEvent>,
    info: watch::Sender<BattleInfo>,
}

/// Snapshot of the battle for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BattleInfo {
    pub battle_id: String,
    pub turn_number: u32,
    pub phase: BattlePhase,
    pub attackers: Vec<CombatantInfo>,
    pub defender: CombatantInfo,
    pub log: Vec<String>,
    pub countdown_remaining_ms: u64,
    pub result: Option<BattleOutcome>,
}

/// Information about a combatant for UI queries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombatantInfo {
    pub name: String,
    pub owner: Option<String>,
    pub player_type: Option<PlayerType>,
    pub level: u8,
    pub current_hp: u16,
    pub max_hp: u16,
    pub is_fainted: bool,
    pub has_selected: bool,
}

impl CombatantInfo {
    fn of(combatant: &Combatant) -> Self {
        Self {
            name: combatant.name.clone(),
            owner: None,
            player_type: None,
            level: combatant.level,
            current_hp: combatant.current_hp(),
            max_hp: combatant.max_hp,
            is_fainted: combatant.is_fainted(),
            has_selected: false,
        }
    }
}

impl BattleInfo {
    pub fn from_state(state: &BattleState) -> Self {
        let attackers = state
            .attackers
            .iter()
            .zip(&state.action_queue)
            .map(|(player, action)| CombatantInfo {
                owner: Some(player.player_name.clone()),
                player_type: Some(player.player_type),
                has_selected: matches!(action, Some(PlayerAction::UseMove { .. })),
                ..CombatantInfo::of(&player.combatant)
            })
            .collect();

        Self {
            battle_id: state.battle_id.clone(),
            turn_number: state.turn_number,
            phase: state.phase,
            attackers,
            defender: CombatantInfo::of(&state.defender),
            log: state.log.lines().map(str::to_string).collect(),
            countdown_remaining_ms: state.countdown_remaining_ms,
            result: state.result,
        }
    }
}

/// Final result of a finished battle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BattleReport {
    pub outcome: BattleOutcome,
    pub turns: u32,
    pub info: BattleInfo,
}

#[derive(Debug)]
struct SeatSelection {
    turn_number: u32,
    player_index: usize,
    action: PlayerAction,
}

impl BattleRunner {
    /// One strategy per attacker, in seat order.
    pub fn new(engine: BattleEngine, seats: Vec<Arc<dyn SelectionStrategy>>) -> BattleResult<Self> {
        let attackers = engine.state().attackers.len();
        if seats.len() != attackers {
            return Err(BattleError::SeatCountMismatch {
                seats: seats.len(),
                attackers,
            });
        }

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (info, _) = watch::channel(BattleInfo::from_state(engine.state()));
        Ok(Self {
            engine,
            seats,
            events,
            info,
        })
    }

    /// Every event from now on, in order.
    pub fn subscribe(&self) -> broadcast::Receiver<BattleEvent> {
        self.events.subscribe()
    }

    /// Latest battle snapshot, refreshed after every step and countdown tick.
    pub fn watch(&self) -> watch::Receiver<BattleInfo> {
        self.info.subscribe()
    }

    pub fn get_battle_info(&self) -> BattleInfo {
        BattleInfo::from_state(self.engine.state())
    }

    fn publish(&self, bus: EventBus) {
        for event in bus.into_events() {
            // No subscribers is fine.
            let _ = self.events.send(event);
        }
        self.info.send_replace(BattleInfo::from_state(self.engine.state()));
    }

    /// Play the battle to its end.
    pub async fn run(mut self) -> BattleResult<BattleReport> {
        let bus = self.engine.enter()?;
        self.publish(bus);

        sleep(self.engine.config().intro_duration).await;
        let bus = self.engine.finish_intro()?;
        self.publish(bus);

        loop {
            self.run_selection_phase().await?;

            let bus = self.engine.play_turn().await?;
            self.publish(bus);

            if let Some(outcome) = self.engine.state().result {
                let info = self.get_battle_info();
                return Ok(BattleReport {
                    outcome,
                    turns: info.turn_number,
                    info,
                });
            }
        }
    }

    /// Collect selections until every living seat has chosen or the
    /// countdown fires, then cancel whatever is still thinking.
    async fn run_selection_phase(&mut self) -> BattleResult<()> {
        let turn_number = self.engine.state().turn_number;
        let snapshot = Arc::new(self.engine.state().clone());
        let (sender, mut selections) = mpsc::channel::<SeatSelection>(self.seats.len());

        let mut thinking = JoinSet::new();
        for player_index in snapshot.living_attackers() {
            let seat = Arc::clone(&self.seats[player_index]);
            let sender = sender.clone();
            let snapshot = Arc::clone(&snapshot);
            thinking.spawn(async move {
                if let Some(action) = seat.select(player_index, &snapshot).await {
                    let _ = sender
                        .send(SeatSelection {
                            turn_number,
                            player_index,
                            action,
                        })
                        .await;
                }
            });
        }
        drop(sender);

        let timeout = self.engine.config().selection_timeout;
        let deadline = Instant::now() + timeout;
        let countdown = sleep_until(deadline);
        tokio::pin!(countdown);
        let mut ticker = interval_at(Instant::now() + COUNTDOWN_TICK, COUNTDOWN_TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while !self.engine.selection_complete() {
            tokio::select! {
                _ = &mut countdown => {
                    let bus = self.engine.expire_selection()?;
                    self.publish(bus);
                }
                Some(selection) = selections.recv() => {
                    if selection.turn_number != turn_number {
                        tracing::debug!(?selection, turn_number, "discarding stale selection");
                        continue;
                    }
                    match self.engine.submit_action(selection.player_index, selection.action) {
                        Ok(bus) => self.publish(bus),
                        Err(rejected) => tracing::debug!(
                            player_index = selection.player_index,
                            %rejected,
                            "selection rejected"
                        ),
                    }
                }
                _ = ticker.tick() => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    self.engine.set_countdown_remaining(remaining.as_millis() as u64);
                    self.info.send_replace(self.get_battle_info());
                }
            }
        }

        // Late thinkers are discarded, not applied to the next phase.
        thinking.abort_all();
        Ok(())
    }
}

impl std::fmt::Debug for BattleRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BattleRunner")
            .field("engine", &self.engine)
            .field("seats", &self.seats.len())
            .finish_non_exhaustive()
    }
}
