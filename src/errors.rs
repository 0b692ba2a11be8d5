use std::time::Duration;
use thiserror::Error;

/// Main error type for the battle client
#[derive(Debug, Error)]
pub enum GameError {
    /// Error related to catalog lookups
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    /// Error related to the skill buffer
    #[error("skill buffer error: {0}")]
    SkillBuffer(#[from] SkillBufferError),
    /// Error surfaced by a remote service
    #[error("service error: {0}")]
    Service(#[from] ServiceError),
    /// Error related to building or driving a battle
    #[error("battle error: {0}")]
    Battle(#[from] BattleError),
}

/// Errors related to the static type & skill catalog
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The specified template was not found
    #[error("template not found: {0}")]
    TemplateNotFound(String),
    /// The specified move was not found
    #[error("move not found: {0}")]
    MoveNotFound(String),
    /// Embedded catalog data is malformed or incomplete
    #[error("malformed catalog data: {0}")]
    MalformedData(String),
}

/// Errors raised by the skill buffer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkillBufferError {
    /// Fewer moves are buffered than one encounter needs
    #[error("skill buffer holds {available} moves, {required} required")]
    InsufficientBuffer { available: usize, required: usize },
    /// Every attempt of a batch fetch failed
    #[error("move fetch failed after {attempts} attempts: {last_error}")]
    FetchExhausted { attempts: u32, last_error: String },
}

/// Errors produced by remote service clients
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("service reported failure: {0}")]
    Rejected(String),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("gave up after {attempts} polls ({waited:?})")]
    PollTimeout { attempts: u32, waited: Duration },
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ServiceError::Status(status.as_u16())
        } else {
            ServiceError::Transport(err.to_string())
        }
    }
}

/// Errors related to invalid battle setup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleError {
    /// A battle needs at least one attacker
    #[error("a battle needs at least one attacker")]
    NoAttackers,
    /// The defender has no moves to counter with
    #[error("defender {0} has no moves")]
    DefenderWithoutMoves(String),
    /// Every attacker needs exactly one selection strategy
    #[error("{seats} selection strategies for {attackers} attackers")]
    SeatCountMismatch { seats: usize, attackers: usize },
    /// The engine was driven from a phase that does not allow the call
    #[error("operation not valid during {0}")]
    WrongPhase(String),
}

/// Reasons a move selection is turned away during the selection phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectionRejected {
    #[error("the selection window is not open yet")]
    NotOpen,
    #[error("the battle is already decided")]
    BattleOver,
    #[error("the turn is already resolving")]
    ResolutionInProgress,
    #[error("the selection window has closed")]
    TimeExpired,
    #[error("attacker {0} already chose a move this turn")]
    AlreadySelected(usize),
    #[error("attacker {0} has fainted")]
    AttackerFainted(usize),
    #[error("attacker {0} does not exist")]
    UnknownAttacker(usize),
    #[error("move slot {0} is empty")]
    InvalidMoveIndex(usize),
}

/// Type alias for Results using GameError
pub type GameResult<T> = Result<T, GameError>;

/// Type alias for Results using CatalogError
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Type alias for Results using ServiceError
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Type alias for Results using SkillBufferError
pub type SkillBufferResult<T> = Result<T, SkillBufferError>;

/// Type alias for Results using BattleError
pub type BattleResult<T> = Result<T, BattleError>;
