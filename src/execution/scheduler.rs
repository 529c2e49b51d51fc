use super::PositionManager;
use crate::api::{Advisor, ExchangeError, IndicatorSource};
use crate::models::{CycleOutcome, Decision, IndicatorReading, Side};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Error)]
pub enum CycleError {
    /// An order call failed without a response. Whether the order reached
    /// the book is unknown, so the loop stops instead of guessing.
    #[error("order submission failed while {step} {side}: {source}")]
    Order {
        step: &'static str,
        side: Side,
        #[source]
        source: ExchangeError,
    },
}

/// Loop phases, logged at each transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    FetchingIndicator,
    AwaitingDecision,
    Acting,
    Sleeping,
}

/// Runs fetch -> decide -> act -> sleep until told to stop.
///
/// No state survives a cycle. The wait is measured from the end of a cycle,
/// so the effective period is the interval plus processing time.
pub struct CycleScheduler {
    indicator: Arc<dyn IndicatorSource>,
    advisor: Arc<dyn Advisor>,
    positions: PositionManager,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
    max_cycles: Option<u64>,
}

impl CycleScheduler {
    pub fn new(
        indicator: Arc<dyn IndicatorSource>,
        advisor: Arc<dyn Advisor>,
        positions: PositionManager,
        interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            indicator,
            advisor,
            positions,
            interval,
            shutdown,
            max_cycles: None,
        }
    }

    /// Stop after `cycles` cycles instead of running until shutdown
    pub fn with_max_cycles(mut self, cycles: u64) -> Self {
        self.max_cycles = Some(cycles);
        self
    }

    fn cancelled(&self) -> bool {
        *self.shutdown.borrow()
    }

    fn enter(&self, cycle: u64, phase: CyclePhase) {
        tracing::debug!(cycle, phase = ?phase, "Phase transition");
    }

    /// Run until shutdown or the cycle budget is spent.
    ///
    /// Returns the number of cycles that ran to completion. Only an order
    /// transport failure ends the loop with an error.
    pub async fn run(&mut self) -> Result<u64, CycleError> {
        let mut completed = 0u64;

        while !self.budget_spent(completed) {
            if completed > 0 {
                self.enter(completed, CyclePhase::Sleeping);
                tracing::info!("✅ Cycle complete. Waiting {}s...", self.interval.as_secs());

                if !self.sleep().await {
                    break;
                }
            }

            let cycle = completed + 1;
            self.enter(cycle, CyclePhase::Idle);

            tracing::info!("===========================================");
            tracing::info!("🕒 Checking market... {}", Utc::now().format("%Y-%m-%d %H:%M:%S"));

            match self.run_cycle(cycle).await? {
                CycleOutcome::Cancelled => break,
                outcome => {
                    completed += 1;
                    tracing::debug!(cycle, outcome = ?outcome, "Cycle finished");
                }
            }
        }

        if self.budget_spent(completed) {
            tracing::info!("Cycle budget of {} reached, stopping", completed);
        }
        tracing::info!("Scheduler stopped after {} cycles", completed);
        Ok(completed)
    }

    fn budget_spent(&self, completed: u64) -> bool {
        self.max_cycles.is_some_and(|max| completed >= max)
    }

    /// Sleep for one interval. Returns false if shutdown arrived first.
    async fn sleep(&mut self) -> bool {
        if self.cancelled() {
            return false;
        }

        let wake_at = tokio::time::Instant::now() + self.interval;
        loop {
            let changed = tokio::select! {
                _ = tokio::time::sleep_until(wake_at) => None,
                changed = self.shutdown.changed() => Some(changed.is_ok()),
            };

            match changed {
                None => break,
                Some(true) if self.cancelled() => return false,
                // Woken without a stop request: keep the original deadline
                Some(true) => continue,
                Some(false) => {
                    // Sender gone, nobody can stop us any more: finish the wait
                    tokio::time::sleep_until(wake_at).await;
                    break;
                }
            }
        }

        !self.cancelled()
    }

    /// One fetch -> decide -> act pass, without the trailing sleep
    pub async fn run_cycle(&self, cycle: u64) -> Result<CycleOutcome, CycleError> {
        if self.cancelled() {
            return Ok(CycleOutcome::Cancelled);
        }

        self.enter(cycle, CyclePhase::FetchingIndicator);
        let reading = match self.indicator.fetch_indicator().await {
            Ok(value) => IndicatorReading::Value(value),
            Err(e) => {
                tracing::warn!(cycle, error = %e, "❌ Failed to fetch indicator");
                IndicatorReading::Unavailable
            }
        };

        let value = match reading {
            IndicatorReading::Value(value) => value,
            IndicatorReading::Unavailable => {
                tracing::info!(cycle, "Skipping this cycle (no indicator data)");
                return Ok(CycleOutcome::SkippedNoIndicator);
            }
        };
        tracing::info!(cycle, indicator = value, "📈 Current indicator value: {}", value);

        if self.cancelled() {
            return Ok(CycleOutcome::Cancelled);
        }

        self.enter(cycle, CyclePhase::AwaitingDecision);
        let decision = match self.advisor.advise(value).await {
            Ok(decision) => decision,
            Err(e) => {
                tracing::warn!(cycle, error = %e, "❌ Advisor failed, defaulting to NOTHING");
                Decision::Nothing
            }
        };

        let side = match decision.side() {
            Some(side) => side,
            None => {
                tracing::info!(cycle, %decision, "⏸ Decided to do NOTHING, no action this cycle");
                return Ok(CycleOutcome::SkippedNothing);
            }
        };

        if self.cancelled() {
            return Ok(CycleOutcome::Cancelled);
        }

        self.enter(cycle, CyclePhase::Acting);
        tracing::info!(cycle, %decision, "Acting on decision");

        // Close then open, unconditionally and without looking at the close result
        self.positions
            .close_opposite(side)
            .await
            .map_err(|source| CycleError::Order {
                step: "closing opposite of",
                side,
                source,
            })?;

        self.positions
            .open(side)
            .await
            .map_err(|source| CycleError::Order {
                step: "opening",
                side,
                source,
            })?;

        Ok(CycleOutcome::Acted(side))
    }
}
