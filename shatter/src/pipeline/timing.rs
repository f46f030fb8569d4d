//! Per-cell stage timings.

use std::fmt;
use std::time::{Duration, Instant};

/// Stages of the per-cell pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Fetch,
    Arrangement,
    Decompose,
    Overlap,
    Enrich,
    Deliver,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Fetch,
        Stage::Arrangement,
        Stage::Decompose,
        Stage::Overlap,
        Stage::Enrich,
        Stage::Deliver,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::Arrangement => "arrangement",
            Stage::Decompose => "decompose",
            Stage::Overlap => "overlap",
            Stage::Enrich => "enrich",
            Stage::Deliver => "deliver",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Wall-clock time spent in each stage of one cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageTimings {
    durations: [Duration; 6],
}

impl StageTimings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f`, adding its elapsed time to `stage`.
    pub fn time<T>(&mut self, stage: Stage, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.record(stage, start.elapsed());
        out
    }

    pub fn record(&mut self, stage: Stage, elapsed: Duration) {
        self.durations[stage.slot()] += elapsed;
    }

    pub fn get(&self, stage: Stage) -> Duration {
        self.durations[stage.slot()]
    }

    pub fn total(&self) -> Duration {
        self.durations.iter().sum()
    }

    /// Stage with the largest time; `None` until something was recorded.
    /// Ties go to the earlier stage.
    pub fn slowest(&self) -> Option<(Stage, Duration)> {
        Stage::ALL
            .iter()
            .map(|&s| (s, self.get(s)))
            .filter(|(_, d)| !d.is_zero())
            .fold(None, |best, (s, d)| match best {
                Some((_, bd)) if bd >= d => best,
                _ => Some((s, d)),
            })
    }
}

impl fmt::Display for StageTimings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = Stage::ALL
            .iter()
            .map(|s| format!("{}={}ms", s.name(), self.get(*s).as_millis()))
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}
