//! Ready pool of moves shared by the current encounter and the background
//! refill for the next one.
//!
//! Consumption only takes from the front and replenishment only appends, so
//! the two may interleave freely. The in-flight flag is the one guard: it
//! keeps at most one replenish fetch outstanding.
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use schema::{PokemonType, Skill};
use serde::Serialize;
use tokio::sync::Notify;

use crate::config::{RetryPolicy, BATCH_SIZE};
use crate::errors::{SkillBufferError, SkillBufferResult};
use crate::services::MoveSource;

/// Advisory snapshot; a refill may land between reading it and consuming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BufferStatus {
    pub buffer_size: usize,
    pub in_flight: bool,
    pub has_enough: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplenishOutcome {
    /// A batch was appended; the buffer now holds `buffer_size` moves.
    Appended { buffer_size: usize },
    /// Another replenish was already running, nothing was fetched.
    AlreadyInFlight,
}

pub struct SkillBuffer {
    source: Arc<dyn MoveSource>,
    retry: RetryPolicy,
    queue: Mutex<VecDeque<Skill>>,
    in_flight: AtomicBool,
    idle: Notify,
}

/// Clears the in-flight flag however the replenish ends.
struct InFlightGuard<'a> {
    buffer: &'a SkillBuffer,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.buffer.in_flight.store(false, Ordering::Release);
        self.buffer.idle.notify_waiters();
    }
}

impl SkillBuffer {
    pub fn new(source: Arc<dyn MoveSource>, retry: RetryPolicy) -> Self {
        Self {
            source,
            retry,
            queue: Mutex::new(VecDeque::new()),
            in_flight: AtomicBool::new(false),
            idle: Notify::new(),
        }
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<Skill>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clear the buffer and load two batches back to back.
    ///
    /// If a batch exhausts its retries the error is returned and whatever was
    /// already appended stays in the buffer.
    pub async fn initialize(&self, element: PokemonType) -> SkillBufferResult<Vec<Skill>> {
        self.queue().clear();
        tracing::info!(%element, "initializing skill buffer");

        for batch in 1..=2 {
            let moves = self.fetch_with_retry(element).await.inspect_err(|err| {
                tracing::error!(batch, error = %err, "skill buffer initialization failed");
            })?;
            self.queue().extend(moves);
        }

        let snapshot = self.buffered();
        tracing::info!(buffer_size = snapshot.len(), "skill buffer ready");
        Ok(snapshot)
    }

    /// Take the first batch of moves in FIFO order.
    pub fn consume(&self) -> SkillBufferResult<Vec<Skill>> {
        let mut queue = self.queue();
        if queue.len() < BATCH_SIZE {
            tracing::warn!(available = queue.len(), "skill buffer too small to consume");
            return Err(SkillBufferError::InsufficientBuffer {
                available: queue.len(),
                required: BATCH_SIZE,
            });
        }
        let consumed: Vec<Skill> = queue.drain(..BATCH_SIZE).collect();
        tracing::debug!(remaining = queue.len(), "consumed a batch of moves");
        Ok(consumed)
    }

    /// Fetch and append one batch unless a replenish is already running.
    pub async fn replenish(&self, element: PokemonType) -> SkillBufferResult<ReplenishOutcome> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("replenish already in flight, skipping");
            return Ok(ReplenishOutcome::AlreadyInFlight);
        }
        let _guard = InFlightGuard { buffer: self };

        let moves = self.fetch_with_retry(element).await?;
        let buffer_size = {
            let mut queue = self.queue();
            queue.extend(moves);
            queue.len()
        };
        tracing::info!(buffer_size, "skill buffer replenished");
        Ok(ReplenishOutcome::Appended { buffer_size })
    }

    pub fn status(&self) -> BufferStatus {
        let buffer_size = self.queue().len();
        BufferStatus {
            buffer_size,
            in_flight: self.is_replenishing(),
            has_enough: buffer_size >= BATCH_SIZE,
        }
    }

    /// Copy of the buffered moves, front first.
    pub fn buffered(&self) -> Vec<Skill> {
        self.queue().iter().cloned().collect()
    }

    pub fn has_enough(&self) -> bool {
        self.queue().len() >= BATCH_SIZE
    }

    pub fn is_replenishing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Resolve once no replenish is running.
    pub async fn wait_for_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if !self.is_replenishing() {
                return;
            }
            notified.await;
        }
    }

    /// Drop every buffered move. An in-flight replenish still appends its batch.
    pub fn reset(&self) {
        self.queue().clear();
    }

    async fn fetch_with_retry(&self, element: PokemonType) -> SkillBufferResult<Vec<Skill>> {
        let attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match self.source.fetch_batch(element, BATCH_SIZE).await {
                Ok(moves) => {
                    if attempt > 0 {
                        tracing::info!(attempt = attempt + 1, "move fetch succeeded after retry");
                    }
                    return Ok(moves);
                }
                Err(err) if attempt + 1 < attempts => {
                    let delay = self.retry.delay_after(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        ?delay,
                        error = %err,
                        "move fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::error!(attempts, error = %err, "move fetch exhausted its retries");
                    return Err(SkillBufferError::FetchExhausted {
                        attempts,
                        last_error: err.to_string(),
                    });
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn seed(&self, moves: Vec<Skill>) {
        self.queue().extend(moves);
    }
}

impl std::fmt::Debug for SkillBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkillBuffer")
            .field("status", &self.status())
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
