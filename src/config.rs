//! Runtime configuration for the battle client.
//!
//! Every knob has a default matching the shipped game; `GameConfig::from_env`
//! overrides them from the process environment.
use schema::PokemonType;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Number of moves fetched per batch and consumed per encounter.
pub const BATCH_SIZE: usize = 12;
/// Number of moves the player drafts for a battle.
pub const DRAFT_SIZE: usize = 4;

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub services: ServiceConfig,
    pub battle: BattleConfig,
    pub retry: RetryPolicy,
    pub poll: PollPolicy,
    /// Elemental type requested from the move service.
    pub element: PokemonType,
    /// Boss template used for raid encounters.
    pub boss_id: String,
    /// Mock players joining the human in a raid.
    pub mock_players: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            services: ServiceConfig::default(),
            battle: BattleConfig::default(),
            retry: RetryPolicy::default(),
            poll: PollPolicy::default(),
            element: PokemonType::Fire,
            boss_id: "snorlax".to_string(),
            mock_players: 3,
        }
    }
}

impl GameConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `POKEMON_API_BASE_URL` - Backend base URL (default: none, offline services)
    /// - `POKEMON_MOVE_API_URL` - Move-fetch endpoint (default: `<base>/api/v1/skills`)
    /// - `POKEMON_REQUEST_TIMEOUT_MS` - Per-request timeout (default: 10000)
    /// - `POKEMON_ELEMENT` - Elemental type for move batches (default: fire)
    /// - `BATTLE_SELECTION_TIMEOUT_MS` - Selection countdown (default: 30000)
    /// - `BATTLE_INTRO_MS` - Introduction sequence length (default: 1500)
    /// - `BATTLE_BOT_DELAY_MIN_MS` / `BATTLE_BOT_DELAY_MAX_MS` - Bot thinking window (default: 5000/20000)
    /// - `BATTLE_LOG_CAPACITY` - Lines kept in the battle log (default: 20)
    /// - `BATTLE_MOCK_PLAYERS` - Mock raid members (default: 3)
    /// - `BATTLE_BOSS` - Boss template id (default: snorlax)
    /// - `SKILL_FETCH_ATTEMPTS` - Attempts per move batch (default: 3)
    /// - `SKILL_FETCH_BACKOFF_MS` - First retry delay, doubled each retry (default: 1000)
    /// - `SPRITE_POLL_INTERVAL_MS` / `SPRITE_POLL_ATTEMPTS` - Sprite typing poll (default: 2000/30)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.services.base_url = env::var("POKEMON_API_BASE_URL").ok().filter(|v| !v.is_empty());
        config.services.move_url = env::var("POKEMON_MOVE_API_URL").ok().filter(|v| !v.is_empty());
        if let Some(ms) = read_env::<u64>("POKEMON_REQUEST_TIMEOUT_MS") {
            config.services.request_timeout = Duration::from_millis(ms.max(1));
        }
        if let Ok(label) = env::var("POKEMON_ELEMENT") {
            config.element = PokemonType::from_label(&label);
        }

        if let Some(ms) = read_env::<u64>("BATTLE_SELECTION_TIMEOUT_MS") {
            config.battle.selection_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = read_env::<u64>("BATTLE_INTRO_MS") {
            config.battle.intro_duration = Duration::from_millis(ms);
        }
        if let Some(ms) = read_env::<u64>("BATTLE_BOT_DELAY_MIN_MS") {
            config.battle.bot_delay_min = Duration::from_millis(ms);
        }
        if let Some(ms) = read_env::<u64>("BATTLE_BOT_DELAY_MAX_MS") {
            config.battle.bot_delay_max = Duration::from_millis(ms);
        }
        if config.battle.bot_delay_max < config.battle.bot_delay_min {
            config.battle.bot_delay_max = config.battle.bot_delay_min;
        }
        if let Some(capacity) = read_env::<usize>("BATTLE_LOG_CAPACITY") {
            config.battle.log_capacity = capacity.max(1);
        }
        if let Some(count) = read_env::<usize>("BATTLE_MOCK_PLAYERS") {
            config.mock_players = count;
        }
        if let Ok(boss) = env::var("BATTLE_BOSS") {
            config.boss_id = boss;
        }

        if let Some(attempts) = read_env::<u32>("SKILL_FETCH_ATTEMPTS") {
            config.retry.max_attempts = attempts.max(1);
        }
        if let Some(ms) = read_env::<u64>("SKILL_FETCH_BACKOFF_MS") {
            config.retry.initial_delay = Duration::from_millis(ms);
        }

        if let Some(ms) = read_env::<u64>("SPRITE_POLL_INTERVAL_MS") {
            config.poll.interval = Duration::from_millis(ms);
        }
        if let Some(attempts) = read_env::<u32>("SPRITE_POLL_ATTEMPTS") {
            config.poll.max_attempts = attempts.max(1);
        }

        config
    }
}

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub base_url: Option<String>,
    pub move_url: Option<String>,
    pub request_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            move_url: None,
            request_timeout: Duration::from_millis(10_000),
        }
    }
}

impl ServiceConfig {
    pub fn is_offline(&self) -> bool {
        self.base_url.is_none() && self.move_url.is_none()
    }
}

#[derive(Clone, Debug)]
pub struct BattleConfig {
    pub selection_timeout: Duration,
    pub intro_duration: Duration,
    pub bot_delay_min: Duration,
    pub bot_delay_max: Duration,
    pub log_capacity: usize,
    /// Chance of a critical hit, as `1 / crit_denominator`.
    pub crit_denominator: u32,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            selection_timeout: Duration::from_millis(30_000),
            intro_duration: Duration::from_millis(1_500),
            bot_delay_min: Duration::from_millis(5_000),
            bot_delay_max: Duration::from_millis(20_000),
            log_capacity: 20,
            crit_denominator: 16,
        }
    }
}

/// Exponential backoff for batch fetches: `initial_delay`, doubled after each
/// failed attempt, `max_attempts` attempts in total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the given failed attempt (0-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.initial_delay.saturating_mul(1u32 << attempt.min(16))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2_000),
            max_attempts: 30,
        }
    }
}

fn read_env<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.trim().parse().ok())
}
