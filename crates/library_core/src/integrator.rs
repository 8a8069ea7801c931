//! Explicit Euler integration of reading progress, `dP/dt = K/5`.
//!
//! The integrator keeps its full `(t, P)` history. That history is what sizes a
//! reading session and it is exposed untouched in every snapshot row.

use serde::Serialize;

/// Relative slack (in units of `h`) when comparing the current time with a target.
const TIME_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EulerIntegrator {
    step_size: f64,
    k: f64,
    value: f64,
    history: Vec<(f64, f64)>,
}

impl EulerIntegrator {
    /// Starts at `(0, initial)`. Requires `step_size > 0`.
    pub fn new(step_size: f64, k: f64, initial: f64) -> Self {
        debug_assert!(step_size > 0.0, "integrator step size must be positive");
        Self {
            step_size,
            k,
            value: initial,
            history: vec![(0.0, initial)],
        }
    }

    pub fn derivative(&self) -> f64 {
        self.k / 5.0
    }

    /// Advances one Euler step and returns the new value.
    pub fn step(&mut self) -> f64 {
        let (_, last) = self.history[self.history.len() - 1];
        // t_n = n * h keeps the grid exact instead of accumulating rounding error.
        let time = self.history.len() as f64 * self.step_size;
        self.value = last + self.step_size * self.derivative();
        self.history.push((time, self.value));
        self.value
    }

    /// Steps while the last recorded time is before `t_final`; returns the value.
    pub fn integrate_until(&mut self, t_final: f64) -> f64 {
        let slack = TIME_EPSILON * self.step_size;
        while self.time() < t_final - slack {
            self.step();
        }
        self.value
    }

    pub fn time(&self) -> f64 {
        self.history[self.history.len() - 1].0
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn k(&self) -> f64 {
        self.k
    }

    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    pub fn history(&self) -> &[(f64, f64)] {
        &self.history
    }
}

/// Time needed to read `pages`, integrating in chunks of `macro_step`.
///
/// Returns a whole number of macro-steps: reading ends at the first chunk boundary
/// where the accumulated value reaches the target. Requires `macro_step > 0` and a
/// positive derivative.
pub fn reading_duration(integrator: &mut EulerIntegrator, pages: f64, macro_step: f64) -> f64 {
    debug_assert!(macro_step > 0.0 && integrator.derivative() > 0.0);
    let mut chunks = 0u32;
    while integrator.value() < pages {
        let target = integrator.time() + macro_step;
        integrator.integrate_until(target);
        chunks += 1;
    }
    chunks as f64 * macro_step
}
