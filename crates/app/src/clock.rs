//! Elapsed time of a live session.
//!
//! The clock publishes the elapsed seconds once per second while it is running. The publishing
//! task belongs to the clock: it is aborted when the clock is paused, stopped or dropped.

use std::{sync::Arc, time::Duration};

use log::debug;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Idle,
    Running,
    Paused,
    Stopped,
}

#[derive(Debug)]
pub struct SessionClock {
    state: ClockState,
    accumulated: Duration,
    running_since: Option<Instant>,
    ticks: Arc<watch::Sender<u64>>,
    ticker: Option<JoinHandle<()>>,
}

impl SessionClock {
    #[must_use]
    pub fn new() -> Self {
        let (ticks, _) = watch::channel(0);
        Self {
            state: ClockState::Idle,
            accumulated: Duration::ZERO,
            running_since: None,
            ticks: Arc::new(ticks),
            ticker: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> ClockState {
        self.state
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.accumulated + self.running_since.map_or(Duration::ZERO, |since| since.elapsed())
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed().as_secs()
    }

    /// Receiver of the elapsed seconds, updated every second while the clock is running.
    #[must_use]
    pub fn ticks(&self) -> watch::Receiver<u64> {
        self.ticks.subscribe()
    }

    /// Starts the clock from zero. Must be called within a Tokio runtime.
    pub fn start(&mut self) {
        self.abort_ticker();
        self.accumulated = Duration::ZERO;
        self.ticks.send_replace(0);
        self.run();
        debug!("session clock started");
    }

    pub fn pause(&mut self) {
        if self.state != ClockState::Running {
            return;
        }
        self.halt();
        self.state = ClockState::Paused;
    }

    pub fn resume(&mut self) {
        if self.state != ClockState::Paused {
            return;
        }
        self.run();
    }

    /// Stops the clock and returns the total running time.
    pub fn stop(&mut self) -> Duration {
        if self.state == ClockState::Running {
            self.halt();
        }
        self.state = ClockState::Stopped;
        debug!("session clock stopped after {}s", self.accumulated.as_secs());
        self.accumulated
    }

    fn run(&mut self) {
        let since = Instant::now();
        let base = self.accumulated;
        let ticks = Arc::clone(&self.ticks);
        self.running_since = Some(since);
        self.state = ClockState::Running;
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(since + TICK, TICK);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                ticks.send_replace((base + since.elapsed()).as_secs());
            }
        }));
    }

    fn halt(&mut self) {
        self.abort_ticker();
        self.accumulated = self.elapsed();
        self.running_since = None;
        self.ticks.send_replace(self.accumulated.as_secs());
    }

    fn abort_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SessionClock {
    fn drop(&mut self) {
        self.abort_ticker();
    }
}
