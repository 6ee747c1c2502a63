//! Tick pacing and timing statistics

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use log::warn;

const MAX_HISTORY: usize = 100;

/// Timing of one completed tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickStats {
    pub tick: u64,
    /// Time spent doing work, excluding any pacing sleep.
    pub duration: Duration,
}

/// Measures ticks and, when a rate is set, sleeps off the rest of each step.
pub struct Ticker {
    step: Option<Duration>,
    started: Option<Instant>,
    tick_count: u64,
    history: VecDeque<TickStats>,
    max_history: usize,
}

impl Ticker {
    /// `None` runs unpaced. Rates that are not positive and finite are
    /// treated the same way.
    pub fn new(tick_rate_hz: Option<f64>) -> Self {
        let step = match tick_rate_hz {
            Some(hz) if hz.is_finite() && hz > 0.0 => Some(Duration::from_secs_f64(1.0 / hz)),
            Some(hz) => {
                warn!("Ignoring invalid tick rate {hz}; running unpaced");
                None
            }
            None => None,
        };
        Self {
            step,
            started: None,
            tick_count: 0,
            history: VecDeque::with_capacity(MAX_HISTORY),
            max_history: MAX_HISTORY,
        }
    }

    pub fn step(&self) -> Option<Duration> {
        self.step
    }

    pub fn begin(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Closes the current tick, records it and sleeps until the next step
    /// is due.
    pub fn end(&mut self) -> TickStats {
        let duration = self.started.take().map_or(Duration::ZERO, |t| t.elapsed());
        self.tick_count += 1;
        let stats = TickStats {
            tick: self.tick_count,
            duration,
        };

        self.history.push_back(stats);
        if self.history.len() > self.max_history {
            self.history.pop_front();
        }

        if let Some(remaining) = self.step.and_then(|step| step.checked_sub(duration)) {
            std::thread::sleep(remaining);
        }
        stats
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn recent_stats(&self) -> impl Iterator<Item = &TickStats> {
        self.history.iter()
    }

    pub fn average_tick_time(&self) -> Option<Duration> {
        if self.history.is_empty() {
            return None;
        }
        let total: Duration = self.history.iter().map(|s| s.duration).sum();
        Some(total / self.history.len() as u32)
    }
}
