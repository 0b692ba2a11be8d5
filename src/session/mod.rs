//! The game session: owns the skill buffer and the services, feeds actions
//! through the [`reducer`] and runs the effects it asks for.
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::battle::engine::BattleEngine;
use crate::battle::runner::{BattleReport, BattleRunner};
use crate::battle::selection::{RandomDelayBot, SelectionStrategy};
use crate::battle::state::TurnRng;
use crate::config::GameConfig;
use crate::errors::{BattleError, GameResult, ServiceError, SkillBufferError};
use crate::services::{await_sprite_typing, Services, SpriteUpload, TypedSprite};
use crate::skill_buffer::{ReplenishOutcome, SkillBuffer};
use crate::species::instantiate;

pub mod party;
pub mod state;

pub use state::{reducer, Action, ActiveBattle, Effect, GameState, Screen, SpriteImages, Transition};

/// The starter every new game begins with.
const STARTER: &str = "charmander";
const DEFAULT_PLAYER_NAME: &str = "You";

pub struct GameSession {
    config: GameConfig,
    services: Services,
    buffer: Arc<SkillBuffer>,
    state: Arc<watch::Sender<GameState>>,
    background: Mutex<JoinSet<()>>,
    battles_started: AtomicU32,
}

/// Run one reducer step in place and hand back its effects.
///
/// The buffer mirror is re-read from the live buffer under the same watch
/// lock, so racing writers cannot leave it stale.
fn apply(state: &watch::Sender<GameState>, buffer: &SkillBuffer, action: Action) -> Vec<Effect> {
    tracing::trace!(?action, "dispatch");
    let mut effects = Vec::new();
    state.send_modify(|current| {
        let transition = reducer(std::mem::take(current), action);
        *current = transition.state;
        current.skill_buffer = buffer.buffered();
        effects = transition.effects;
    });
    effects
}

impl GameSession {
    pub fn new(config: GameConfig, services: Services) -> GameResult<Self> {
        let starter = instantiate(STARTER, None)?;
        let buffer = Arc::new(SkillBuffer::new(Arc::clone(&services.moves), config.retry));
        let (state, _) = watch::channel(GameState::new(config.element, vec![starter]));

        Ok(Self {
            config,
            services,
            buffer,
            state: Arc::new(state),
            background: Mutex::new(JoinSet::new()),
            battles_started: AtomicU32::new(0),
        })
    }

    /// Copy of the current state.
    pub fn state(&self) -> GameState {
        self.state.borrow().clone()
    }

    /// Every state change from now on.
    pub fn watch(&self) -> watch::Receiver<GameState> {
        self.state.subscribe()
    }

    pub fn skill_buffer(&self) -> &Arc<SkillBuffer> {
        &self.buffer
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    fn background(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.background.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The background set with finished tasks already joined.
    fn reaped_background(&self) -> MutexGuard<'_, JoinSet<()>> {
        let mut tasks = self.background();
        while let Some(joined) = tasks.try_join_next() {
            if let Err(err) = joined {
                tracing::warn!(error = %err, "background task ended abnormally");
            }
        }
        tasks
    }

    /// Background tasks spawned and not yet joined.
    pub fn pending_background_tasks(&self) -> usize {
        self.background().len()
    }

    /// Apply an action and every action its effects produce, in order.
    ///
    /// Background replenishment is spawned, not awaited; see [`Self::settle`].
    pub async fn dispatch(&self, action: Action) {
        let mut pending = VecDeque::from([action]);
        while let Some(action) = pending.pop_front() {
            for effect in apply(&self.state, &self.buffer, action) {
                pending.extend(self.run_effect(effect).await);
            }
        }
    }

    /// Wait for background work spawned by earlier dispatches.
    pub async fn settle(&self) {
        let mut tasks = std::mem::take(&mut *self.background());
        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                tracing::warn!(error = %err, "background task ended abnormally");
            }
        }
    }

    async fn run_effect(&self, effect: Effect) -> Vec<Action> {
        tracing::debug!(?effect, "running effect");
        match effect {
            Effect::InitializeSkills { element } => match self.buffer.initialize(element).await {
                Ok(buffered) => vec![Action::SkillsLoaded { buffered }],
                Err(err) => {
                    tracing::error!(error = %err, "could not load the move pool");
                    vec![Action::SetError(state::RECONNECT_MESSAGE.to_string())]
                }
            },

            Effect::DrawSkillPool => vec![self.draw_skill_pool()],

            Effect::RefillForEncounter { element } => self.refill_for_encounter(element).await,

            Effect::ReplenishSkills { element } => {
                let buffer = Arc::clone(&self.buffer);
                let state = Arc::clone(&self.state);
                self.reaped_background().spawn(async move {
                    match buffer.replenish(element).await {
                        Ok(ReplenishOutcome::Appended { .. }) => {}
                        Ok(ReplenishOutcome::AlreadyInFlight) => buffer.wait_for_idle().await,
                        // The next encounter refills on its own if this one came up short.
                        Err(err) => tracing::warn!(error = %err, "background replenish failed"),
                    }
                    apply(
                        &state,
                        &buffer,
                        Action::PreloadingComplete {
                            buffered: buffer.buffered(),
                        },
                    );
                });
                Vec::new()
            }
        }
    }

    fn draw_skill_pool(&self) -> Action {
        match self.buffer.consume() {
            Ok(moves) => Action::SkillPoolDrawn { moves },
            Err(SkillBufferError::InsufficientBuffer { available, .. }) => Action::SkillPoolShort { available },
            Err(err) => Action::SetError(err.to_string()),
        }
    }

    async fn refill_for_encounter(&self, element: schema::PokemonType) -> Vec<Action> {
        match self.buffer.replenish(element).await {
            Ok(ReplenishOutcome::Appended { buffer_size }) => {
                tracing::info!(buffer_size, "refilled for the pending encounter");
            }
            Ok(ReplenishOutcome::AlreadyInFlight) => self.buffer.wait_for_idle().await,
            Err(err) => {
                tracing::error!(error = %err, "could not refill the move pool");
                return vec![Action::SetError(state::RECONNECT_MESSAGE.to_string())];
            }
        }

        let buffered = self.buffer.buffered();
        match self.buffer.consume() {
            Ok(moves) => vec![Action::PreloadingComplete { buffered }, Action::SkillPoolDrawn { moves }],
            Err(err) => {
                tracing::error!(error = %err, "move pool still short after a refill");
                vec![Action::SetError(state::RECONNECT_MESSAGE.to_string())]
            }
        }
    }

    /// Walk into the configured boss.
    pub async fn trigger_encounter(&self) -> GameResult<()> {
        let enemy = instantiate(&self.config.boss_id, None)?;
        tracing::info!(enemy = %enemy.name, "encounter triggered");
        self.dispatch(Action::StartSkillSelection { enemy }).await;
        Ok(())
    }

    /// Play the battle set up by `StartBattle` to its end.
    ///
    /// `human` fills seat 0; the configured number of bots fill the rest.
    /// Snapshots are mirrored into the session state while the battle runs,
    /// and the outcome is dispatched as `EndBattle`.
    pub async fn play_battle(&self, human: Arc<dyn SelectionStrategy>) -> GameResult<BattleReport> {
        let current = self.state();
        let Some(active) = current.battle else {
            return Err(BattleError::WrongPhase(format!("{:?}", current.screen)).into());
        };
        let player_name = current
            .nickname
            .unwrap_or_else(|| DEFAULT_PLAYER_NAME.to_string());

        let attackers = party::raid_party(&player_name, active.player, self.config.mock_players)?;
        let mut seats = vec![human];
        for _ in 0..self.config.mock_players {
            seats.push(Arc::new(RandomDelayBot::from_config(&self.config.battle)) as Arc<dyn SelectionStrategy>);
        }

        let battle_id = format!("battle-{}", self.battles_started.fetch_add(1, Ordering::Relaxed) + 1);
        let engine = BattleEngine::new(
            battle_id.as_str(),
            attackers,
            active.enemy,
            self.config.battle.clone(),
            Arc::clone(&self.services.damage),
            TurnRng::new_random(),
        )?;
        let runner = BattleRunner::new(engine, seats)?;

        let mut snapshots = runner.watch();
        let state = Arc::clone(&self.state);
        let buffer = Arc::clone(&self.buffer);
        let mirror = tokio::spawn(async move {
            while snapshots.changed().await.is_ok() {
                let info = snapshots.borrow_and_update().clone();
                apply(&state, &buffer, Action::UpdateBattle(info));
            }
        });

        tracing::info!(%battle_id, "battle started");
        let result = runner.run().await;
        // The runner is gone, so the mirror has seen its last snapshot.
        if let Err(err) = mirror.await {
            tracing::warn!(error = %err, "battle snapshot mirror ended abnormally");
        }

        match result {
            Ok(report) => {
                tracing::info!(%battle_id, outcome = ?report.outcome, turns = report.turns, "battle finished");
                self.dispatch(Action::EndBattle(report.outcome)).await;
                Ok(report)
            }
            Err(err) => {
                tracing::error!(%battle_id, error = %err, "battle aborted");
                self.dispatch(Action::SetError(err.to_string())).await;
                Err(err.into())
            }
        }
    }

    /// Upload a photo, wait for the generated sprites, and apply them.
    pub async fn upload_sprite(&self, image: SpriteUpload) -> GameResult<TypedSprite> {
        let Some(service) = self.services.sprites.clone() else {
            return Err(ServiceError::Rejected("no sprite service configured".to_string()).into());
        };

        let upload_id = service.upload(image).await?;
        tracing::info!(%upload_id, "photo uploaded, waiting for sprites");
        let sprite = await_sprite_typing(service.as_ref(), &upload_id, self.config.poll).await?;

        self.dispatch(Action::SetSpriteImages {
            front: sprite.front_image.clone(),
            back: sprite.back_image.clone(),
        })
        .await;
        self.dispatch(Action::SetPokemonType(sprite.pokemon_type)).await;
        Ok(sprite)
    }
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("screen", &self.state.borrow().screen)
            .field("buffer", &self.buffer)
            .field("services", &self.services)
            .finish_non_exhaustive()
    }
}
