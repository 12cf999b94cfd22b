//! Background jobs for tile images.
//!
//! The board has a single owner. Slow work (downloads, uploads, decoding) runs
//! on a rayon pool and reports back over a channel; the owner applies results
//! when it drains them. Every job targets one tile and carries that tile's
//! generation at submission time. Submitting again for the same tile, or
//! calling [`Dispatcher::invalidate`], bumps the generation so results still
//! in flight are dropped instead of overwriting newer state.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use thiserror::Error;

use crate::board::Coord;
use crate::signal::CancelToken;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Failed to start worker pool: {0}")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),
}

/// A finished job whose tile has not changed since submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult<T> {
    pub coord: Coord,
    pub generation: u64,
    pub output: T,
}

struct Message<T> {
    coord: Coord,
    generation: u64,
    /// `None` when the job was skipped or panicked.
    output: Option<T>,
}

/// Runs tile jobs on a thread pool and hands back fresh results.
pub struct Dispatcher<T: Send + 'static> {
    pool: rayon::ThreadPool,
    sender: Sender<Message<T>>,
    receiver: Receiver<Message<T>>,
    generations: HashMap<Coord, u64>,
    cancel: CancelToken,
    pending: usize,
}

impl<T: Send + 'static> Dispatcher<T> {
    /// Start a pool with `threads` workers (0 = rayon's default).
    pub fn new(threads: usize, cancel: CancelToken) -> Result<Self, WorkerError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("bingoboard-worker-{index}"))
            .build()?;
        let (sender, receiver) = mpsc::channel();
        Ok(Self {
            pool,
            sender,
            receiver,
            generations: HashMap::new(),
            cancel,
            pending: 0,
        })
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending
    }

    #[must_use]
    pub fn generation(&self, coord: Coord) -> u64 {
        self.generations.get(&coord).copied().unwrap_or(0)
    }

    fn bump(&mut self, coord: Coord) -> u64 {
        let generation = self.generations.entry(coord).or_insert(0);
        *generation += 1;
        *generation
    }

    /// Queue `job` for the tile at `coord`, superseding earlier jobs for it.
    pub fn submit<F>(&mut self, coord: Coord, job: F) -> u64
    where
        F: FnOnce(&CancelToken) -> T + Send + 'static,
    {
        let generation = self.bump(coord);
        let sender = self.sender.clone();
        let cancel = self.cancel.clone();
        self.pending += 1;

        self.pool.spawn(move || {
            let output = if cancel.is_cancelled() {
                None
            } else {
                match catch_unwind(AssertUnwindSafe(|| job(&cancel))) {
                    Ok(output) => Some(output),
                    Err(_) => {
                        log::error!("Background job for tile {coord:?} panicked");
                        None
                    }
                }
            };
            // The receiver only disappears when the dispatcher is dropped.
            let _ = sender.send(Message {
                coord,
                generation,
                output,
            });
        });
        generation
    }

    /// Drop any in-flight result for `coord`.
    pub fn invalidate(&mut self, coord: Coord) {
        self.bump(coord);
    }

    /// Drop every in-flight result, e.g. after the board is cleared or resized.
    pub fn invalidate_all(&mut self) {
        for generation in self.generations.values_mut() {
            *generation += 1;
        }
    }

    fn accept(&mut self, message: Message<T>) -> Option<JobResult<T>> {
        self.pending = self.pending.saturating_sub(1);
        let output = message.output?;
        if self.cancel.is_cancelled() {
            return None;
        }
        if self.generation(message.coord) != message.generation {
            log::debug!(
                "Discarding stale result for tile {:?} (generation {})",
                message.coord,
                message.generation
            );
            return None;
        }
        Some(JobResult {
            coord: message.coord,
            generation: message.generation,
            output,
        })
    }

    /// Next fresh result if one is ready, without blocking.
    pub fn try_recv(&mut self) -> Option<JobResult<T>> {
        while let Ok(message) = self.receiver.try_recv() {
            if let Some(result) = self.accept(message) {
                return Some(result);
            }
        }
        None
    }

    /// Wait up to `timeout` for the next fresh result.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<JobResult<T>> {
        let deadline = std::time::Instant::now() + timeout;
        while self.pending > 0 {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(message) => {
                    if let Some(result) = self.accept(message) {
                        return Some(result);
                    }
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return None,
            }
        }
        None
    }

    /// Block until every submitted job has reported; return the fresh results.
    pub fn drain(&mut self) -> Vec<JobResult<T>> {
        let mut results = Vec::new();
        while self.pending > 0 {
            match self.receiver.recv() {
                Ok(message) => results.extend(self.accept(message)),
                Err(_) => break,
            }
        }
        results
    }
}
