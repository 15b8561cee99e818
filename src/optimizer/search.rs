//! Grid search over rolled months and deferred rate

use log::trace;
use serde::{Deserialize, Serialize};

use super::result::Trial;

/// Most deferred-rate points evaluated per rolled month
pub const MAX_DEFERRED_STEPS: u32 = 10_000;

/// Grid resolution for the structure search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchGrid {
    /// Deferred-rate increment (decimal, 0.0001 = 1bp)
    pub deferred_step: f64,
    /// Rolled-months increment
    pub rolled_step: u32,
}

impl Default for SearchGrid {
    fn default() -> Self {
        Self {
            deferred_step: 0.0001,
            rolled_step: 1,
        }
    }
}

/// Inclusive upper bounds of the search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchBounds {
    pub max_rolled_months: u32,
    pub max_deferred_rate: f64,
}

impl SearchGrid {
    /// Step actually walked up to `cap`: `deferred_step`, coarsened so the
    /// grid never exceeds `MAX_DEFERRED_STEPS` points
    fn effective_step(&self, cap: f64) -> f64 {
        self.deferred_step.max(cap / MAX_DEFERRED_STEPS as f64)
    }

    /// Number of deferred steps up to `cap`, rounded to the nearest step
    pub fn deferred_steps(&self, cap: f64) -> u32 {
        if !self.deferred_step.is_finite() || self.deferred_step <= 0.0 || !cap.is_finite() || cap <= 0.0 {
            return 0;
        }
        ((cap / self.effective_step(cap)).round() as u32).min(MAX_DEFERRED_STEPS)
    }

    /// Deferred rate at step `i`, never past `cap`
    pub fn deferred_at(&self, step: u32, cap: f64) -> f64 {
        (step as f64 * self.effective_step(cap)).min(cap)
    }

    /// Evaluate every grid point and keep the one with the highest net.
    ///
    /// Points are visited rolled-major in ascending order; a later point
    /// only replaces the incumbent when its net is strictly greater.
    pub fn search<F>(&self, bounds: SearchBounds, mut evaluate: F) -> Option<Trial>
    where
        F: FnMut(u32, f64) -> Trial,
    {
        let rolled_step = self.rolled_step.max(1) as usize;
        let deferred_steps = self.deferred_steps(bounds.max_deferred_rate);
        let mut best: Option<Trial> = None;
        let mut visited = 0usize;

        for rolled in (0..=bounds.max_rolled_months).step_by(rolled_step) {
            for step in 0..=deferred_steps {
                let deferred = self.deferred_at(step, bounds.max_deferred_rate.max(0.0));
                let trial = evaluate(rolled, deferred);
                visited += 1;

                if !trial.net.is_finite() {
                    continue;
                }
                match &best {
                    Some(incumbent) if trial.net <= incumbent.net => {}
                    _ => best = Some(trial),
                }
            }
        }

        trace!(
            "searched {} structures, best {:?}",
            visited,
            best.map(|t| (t.rolled_months, t.deferred_rate, t.net))
        );
        best
    }
}
