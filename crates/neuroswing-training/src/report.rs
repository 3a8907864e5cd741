use std::{fmt, time::Duration};

use chrono::TimeDelta;

use crate::EvaluationResult;

/// Simulated ticks per second of episode time.
pub const TICK_RATE: u64 = 60;

/// Minimum, maximum and sum of a per-agent quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spread<T> {
    pub min: T,
    pub max: T,
    pub total: T,
}

impl Spread<u64> {
    fn of_ticks(results: &[EvaluationResult]) -> Self {
        let ticks = || results.iter().map(|r| r.ticks);
        Self {
            min: ticks().min().unwrap_or(0),
            max: ticks().max().unwrap_or(0),
            total: ticks().sum(),
        }
    }
}

impl Spread<Duration> {
    fn of_wall_time(results: &[EvaluationResult]) -> Self {
        let elapsed = || results.iter().map(|r| r.elapsed);
        Self {
            min: elapsed().min().unwrap_or_default(),
            max: elapsed().max().unwrap_or_default(),
            total: elapsed().sum(),
        }
    }
}

/// Progress summary of one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    pub generation: u64,
    pub best_agent: usize,
    pub best_score: f64,
    /// Cumulative ticks over the whole training, this generation included.
    pub total_ticks: u64,
    /// Ticks consumed per agent in this generation.
    pub ticks: Spread<u64>,
    /// Evaluation wall time per agent in this generation.
    pub wall: Spread<Duration>,
}

impl GenerationReport {
    /// Builds the report from results ranked best first.
    #[must_use]
    pub fn new(generation: u64, ranked: &[EvaluationResult], total_ticks: u64) -> Self {
        let (best_agent, best_score) = ranked
            .first()
            .map_or((0, f64::NAN), |r| (r.agent_index, r.score));
        Self {
            generation,
            best_agent,
            best_score,
            total_ticks,
            ticks: Spread::of_ticks(ranked),
            wall: Spread::of_wall_time(ranked),
        }
    }

    /// Cumulative simulated time in whole seconds.
    #[must_use]
    pub fn simulated_seconds(&self) -> u64 {
        (self.total_ticks + TICK_RATE / 2) / TICK_RATE
    }

    fn uniform_ticks(&self) -> bool {
        self.ticks.min == self.ticks.max
    }
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Generation: {}; Best Score: {:.3}; Total Time: {}",
            self.generation,
            self.best_score,
            self.simulated_seconds()
        )?;
        if !self.uniform_ticks() {
            write!(
                f,
                "; Gen Time: {}; Min Time: {}; Max Time: {}",
                self.ticks.total, self.ticks.min, self.ticks.max
            )?;
        }
        write!(
            f,
            "; Wall: {:.3?} (min {:.3?}, max {:.3?})",
            self.wall.total, self.wall.min, self.wall.max
        )
    }
}

/// Renders a duration as its two most significant units, e.g. `"2 hours, 5 minutes"`.
#[must_use]
pub fn format_duration(duration: TimeDelta) -> String {
    const UNITS: [(&str, i64); 5] = [
        ("year", 365 * 24 * 3600),
        ("day", 24 * 3600),
        ("hour", 3600),
        ("minute", 60),
        ("second", 1),
    ];

    let mut rest = duration.num_seconds().max(0);
    let mut parts = Vec::with_capacity(UNITS.len());
    for (unit, seconds) in UNITS {
        parts.push((rest / seconds, unit));
        rest %= seconds;
    }

    let Some(first) = parts.iter().position(|&(n, _)| n > 0) else {
        return plural(0, "second");
    };
    let mut text = plural(parts[first].0, parts[first].1);
    if let Some(&(n, unit)) = parts.get(first + 1)
        && n > 0
    {
        text.push_str(", ");
        text.push_str(&plural(n, unit));
    }
    text
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}
