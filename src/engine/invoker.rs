use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tracing::{error, info, warn};
use ulid::Ulid;

use crate::limits::{MAX_COMMAND_ATTEMPTS, MAX_PENDING_COMMANDS};
use crate::model::{Booking, BookingStatus, Ms};
use crate::observability;

use super::{BookingCommand, Engine, EngineError};

#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Succeeded { booking_id: Ulid },
    Failed { error: EngineError, attempts: u32 },
}

/// One attempted command, recorded whether it succeeded or not.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub command: BookingCommand,
    pub outcome: CommandOutcome,
    pub at: Ms,
}

/// A queued command that exhausted its attempts. Never silently dropped.
#[derive(Debug, Clone)]
pub struct FailedCommand {
    pub command: BookingCommand,
    pub error: EngineError,
    pub attempts: u32,
    pub at: Ms,
}

struct PendingCommand {
    command: BookingCommand,
    queued_at: Ms,
}

/// Entry point for the route layer: immediate execution, or a bounded FIFO
/// queue drained strictly in order. Only retryable store failures are
/// re-attempted; domain failures move to the failed list after one try.
pub struct CommandInvoker {
    engine: Arc<Engine>,
    pending: Mutex<VecDeque<PendingCommand>>,
    history: Mutex<Vec<HistoryEntry>>,
    failed: Mutex<Vec<FailedCommand>>,
}

impl CommandInvoker {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            pending: Mutex::new(VecDeque::new()),
            history: Mutex::new(Vec::new()),
            failed: Mutex::new(Vec::new()),
        }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Execute now, propagating the exact error kind to the caller.
    pub async fn execute_immediately(
        &self,
        command: BookingCommand,
    ) -> Result<Booking, EngineError> {
        self.run_instrumented(&command).await
    }

    /// Append to the queue. Fails once the queue is full rather than
    /// growing without bound.
    pub fn queue_command(&self, command: BookingCommand) -> Result<(), EngineError> {
        let mut pending = self.pending.lock().expect("pending queue poisoned");
        if pending.len() >= MAX_PENDING_COMMANDS {
            return Err(EngineError::Validation("command queue full"));
        }
        info!("command queued: {}", command.describe());
        pending.push_back(PendingCommand {
            command,
            queued_at: self.engine.clock.now_ms(),
        });
        metrics::gauge!(observability::QUEUE_PENDING).set(pending.len() as f64);
        Ok(())
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().expect("pending queue poisoned").len()
    }

    /// Drain the queue in FIFO order. A command failing with a retryable
    /// error is re-attempted up to `MAX_COMMAND_ATTEMPTS` in place; any
    /// other failure consumes its single attempt. Failures accumulate in
    /// the failed list and processing always moves on to the next command.
    pub async fn process_queue(&self) -> (Vec<Booking>, Vec<EngineError>) {
        let mut results = Vec::new();
        let mut errors = Vec::new();

        loop {
            let item = {
                let mut pending = self.pending.lock().expect("pending queue poisoned");
                let item = pending.pop_front();
                metrics::gauge!(observability::QUEUE_PENDING).set(pending.len() as f64);
                item
            };
            let Some(item) = item else { break };

            let mut attempts = 0u32;
            let outcome = loop {
                attempts += 1;
                match self.run_instrumented(&item.command).await {
                    Ok(booking) => break Ok(booking),
                    Err(e) if e.is_retryable() && attempts < MAX_COMMAND_ATTEMPTS => {
                        metrics::counter!(observability::QUEUE_RETRIES_TOTAL).increment(1);
                        warn!(
                            attempts,
                            "command failed, retrying: {} ({e})",
                            item.command.describe()
                        );
                    }
                    Err(e) => break Err(e),
                }
            };

            let at = self.engine.clock.now_ms();
            match outcome {
                Ok(booking) => {
                    self.push_history(HistoryEntry {
                        command: item.command,
                        outcome: CommandOutcome::Succeeded {
                            booking_id: booking.id,
                        },
                        at,
                    });
                    results.push(booking);
                }
                Err(e) => {
                    error!(
                        attempts,
                        "command failed after {}ms in queue: {} ({e})",
                        at - item.queued_at,
                        item.command.describe()
                    );
                    metrics::counter!(observability::QUEUE_FAILED_TOTAL).increment(1);
                    self.push_history(HistoryEntry {
                        command: item.command.clone(),
                        outcome: CommandOutcome::Failed {
                            error: e.clone(),
                            attempts,
                        },
                        at,
                    });
                    self.failed
                        .lock()
                        .expect("failed list poisoned")
                        .push(FailedCommand {
                            command: item.command,
                            error: e.clone(),
                            attempts,
                            at,
                        });
                    errors.push(e);
                }
            }
        }

        (results, errors)
    }

    /// Last `limit` attempted commands, oldest first.
    pub fn history(&self, limit: usize) -> Vec<HistoryEntry> {
        let history = self.history.lock().expect("history poisoned");
        let skip = history.len().saturating_sub(limit);
        history[skip..].to_vec()
    }

    pub fn get_failed_commands(&self) -> Vec<FailedCommand> {
        self.failed.lock().expect("failed list poisoned").clone()
    }

    /// Best-effort undo of the most recent successful queued command.
    ///
    /// Transitions only move along the lifecycle table, so the sole legal
    /// inverse is neutralizing a creation that is still `requested` — done
    /// as a genuine cancel command acting for the customer. Anything else
    /// (acceptances, terminal transitions) has no table-valid inverse.
    pub async fn undo_last_command(&self) -> Result<Booking, EngineError> {
        let last = self
            .history
            .lock()
            .expect("history poisoned")
            .last()
            .cloned()
            .ok_or(EngineError::CannotUndo("no command to undo"))?;

        let booking_id = match last.outcome {
            CommandOutcome::Succeeded { booking_id } => booking_id,
            CommandOutcome::Failed { .. } => {
                return Err(EngineError::CannotUndo("last command failed"));
            }
        };
        let BookingCommand::Create { customer_id, .. } = last.command else {
            return Err(EngineError::CannotUndo("no valid inverse transition"));
        };

        let booking = self.engine.store.get(booking_id).await?;
        if booking.status != BookingStatus::Requested {
            return Err(EngineError::CannotUndo("booking already progressed"));
        }

        let inverse = BookingCommand::Cancel {
            booking_id,
            actor_id: customer_id,
        };
        let cancelled = self.run_instrumented(&inverse).await?;
        metrics::counter!(observability::UNDO_TOTAL).increment(1);
        info!(booking = %booking_id, "creation undone");

        self.push_history(HistoryEntry {
            command: inverse,
            outcome: CommandOutcome::Succeeded {
                booking_id: cancelled.id,
            },
            at: self.engine.clock.now_ms(),
        });
        Ok(cancelled)
    }

    fn push_history(&self, entry: HistoryEntry) {
        self.history.lock().expect("history poisoned").push(entry);
    }

    async fn run_instrumented(&self, command: &BookingCommand) -> Result<Booking, EngineError> {
        let label = observability::command_label(command);
        let start = Instant::now();
        let result = command.execute(&self.engine).await;
        metrics::histogram!(observability::COMMAND_DURATION_SECONDS, "command" => label)
            .record(start.elapsed().as_secs_f64());
        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(observability::COMMANDS_TOTAL, "command" => label, "status" => status)
            .increment(1);
        result
    }
}
