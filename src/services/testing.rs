//! Scripted service doubles shared by unit tests.
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use schema::{PokemonType, Skill};
use tokio::time::Instant;

use super::{
    DamageRequest, DamageResponse, DamageService, MoveSource, ProcessResponse, SpriteTypingService,
    SpriteUpload,
};
use crate::errors::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStep {
    Succeed,
    Fail,
}

/// Move source following a script of successes and failures; once the script
/// runs out every call succeeds. Moves are numbered `m0, m1, ...` across calls.
#[derive(Debug)]
pub struct ScriptedMoveSource {
    script: Mutex<VecDeque<FetchStep>>,
    latency: Duration,
    calls: AtomicUsize,
    issued: AtomicUsize,
    call_times: Mutex<Vec<Instant>>,
}

impl ScriptedMoveSource {
    pub fn new(script: Vec<FetchStep>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
            issued: AtomicUsize::new(0),
            call_times: Mutex::new(Vec::new()),
        }
    }

    pub fn reliable() -> Self {
        Self::new(vec![])
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().unwrap().clone()
    }
}

pub fn numbered_skill(n: usize, element: PokemonType) -> Skill {
    Skill {
        id: format!("m{}", n),
        name: format!("Move {}", n),
        move_type: element,
        power: 40,
        accuracy: 100,
        description: String::new(),
    }
}

#[async_trait]
impl MoveSource for ScriptedMoveSource {
    async fn fetch_batch(&self, element: PokemonType, count: usize) -> ServiceResult<Vec<Skill>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_times.lock().unwrap().push(Instant::now());
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(FetchStep::Succeed);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match step {
            FetchStep::Succeed => {
                let start = self.issued.fetch_add(count, Ordering::SeqCst);
                Ok((start..start + count)
                    .map(|n| numbered_skill(n, element))
                    .collect())
            }
            FetchStep::Fail => Err(ServiceError::Transport("connection refused".to_string())),
        }
    }
}

/// Damage service that is never reachable.
#[derive(Debug, Default)]
pub struct UnreachableDamageService {
    calls: AtomicUsize,
}

impl UnreachableDamageService {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DamageService for UnreachableDamageService {
    async fn calculate_damage(&self, _request: &DamageRequest) -> ServiceResult<DamageResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ServiceError::Transport("damage service unreachable".to_string()))
    }
}

/// Damage service answering every request with the same numbers.
#[derive(Debug)]
pub struct FixedDamageService {
    pub damage: u32,
    pub type_effectiveness: f64,
    requests: Mutex<Vec<DamageRequest>>,
}

impl FixedDamageService {
    pub fn new(damage: u32, type_effectiveness: f64) -> Self {
        Self {
            damage,
            type_effectiveness,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<DamageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DamageService for FixedDamageService {
    async fn calculate_damage(&self, request: &DamageRequest) -> ServiceResult<DamageResponse> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(DamageResponse {
            damage: self.damage,
            type_effectiveness: self.type_effectiveness,
            is_critical: request.is_critical,
            message: String::new(),
        })
    }
}

/// Sprite service replaying a fixed sequence of poll responses.
#[derive(Debug)]
pub struct ScriptedSpriteService {
    responses: Mutex<VecDeque<ServiceResult<ProcessResponse>>>,
    polls: AtomicUsize,
}

impl ScriptedSpriteService {
    pub fn new(responses: Vec<ServiceResult<ProcessResponse>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            polls: AtomicUsize::new(0),
        }
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpriteTypingService for ScriptedSpriteService {
    async fn upload(&self, _image: SpriteUpload) -> ServiceResult<String> {
        Ok("upload-1".to_string())
    }

    async fn check_status(&self, _upload_id: &str) -> ServiceResult<ProcessResponse> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::Transport("script exhausted".to_string())))
    }
}
