// Elapsed on-site work timer

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Where ticks come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickSource {
    /// A background task adds one second per period
    Interval(Duration),
    /// Ticks only arrive through [`WorkTimer::tick`]
    Manual,
}

impl Default for TickSource {
    fn default() -> Self {
        TickSource::Interval(Duration::from_secs(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    Idle,
    Running,
    Stopped,
}

#[derive(Debug)]
struct TimerState {
    phase: TimerPhase,
    elapsed_seconds: u64,
}

/// One-shot stopwatch with one-second granularity.
///
/// Idle -> Running -> Stopped, never back. The ticker and `stop` share one
/// lock, so no tick can land after `stop` has read the frozen value.
#[derive(Debug)]
pub struct WorkTimer {
    state: Arc<Mutex<TimerState>>,
    source: TickSource,
    ticker: Option<JoinHandle<()>>,
}

impl WorkTimer {
    pub fn new(source: TickSource) -> Self {
        Self {
            state: Arc::new(Mutex::new(TimerState {
                phase: TimerPhase::Idle,
                elapsed_seconds: 0,
            })),
            source,
            ticker: None,
        }
    }

    fn lock(state: &Mutex<TimerState>) -> MutexGuard<'_, TimerState> {
        state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn phase(&self) -> TimerPhase {
        Self::lock(&self.state).phase
    }

    pub fn elapsed_seconds(&self) -> u64 {
        Self::lock(&self.state).elapsed_seconds
    }

    pub fn is_running(&self) -> bool {
        self.phase() == TimerPhase::Running
    }

    /// Start counting from zero. Returns false if the timer was already used.
    ///
    /// With an interval source this must be called from inside a Tokio runtime.
    pub fn start(&mut self) -> bool {
        {
            let mut state = Self::lock(&self.state);
            if state.phase != TimerPhase::Idle {
                return false;
            }
            state.phase = TimerPhase::Running;
        }

        if let TickSource::Interval(period) = self.source {
            let state = self.state.clone();
            self.ticker = Some(tokio::spawn(async move {
                let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
                loop {
                    interval.tick().await;
                    let mut guard = Self::lock(&state);
                    if guard.phase != TimerPhase::Running {
                        break;
                    }
                    guard.elapsed_seconds += 1;
                }
            }));
        }
        debug!(source = ?self.source, "Work timer started");
        true
    }

    /// Advance by one second if running. Returns the elapsed value after the tick.
    pub fn tick(&self) -> u64 {
        let mut state = Self::lock(&self.state);
        if state.phase == TimerPhase::Running {
            state.elapsed_seconds += 1;
        }
        state.elapsed_seconds
    }

    /// Freeze the timer. Repeated calls return the same frozen value.
    pub fn stop(&mut self) -> u64 {
        let elapsed = {
            let mut state = Self::lock(&self.state);
            if state.phase == TimerPhase::Running {
                state.phase = TimerPhase::Stopped;
            }
            state.elapsed_seconds
        };
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        debug!(elapsed_seconds = elapsed, "Work timer stopped");
        elapsed
    }
}

impl Drop for WorkTimer {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}
