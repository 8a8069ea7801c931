//! Random variates driving arrivals, service times and branching decisions.
//!
//! One [VariateGenerator] is owned per simulation world, so independent runs never
//! share a stream. Every draw overwrites the generator's last raw uniform, which the
//! engine copies into the per-step variate map.

use bevy_ecs::prelude::Resource;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use serde::Serialize;

/// One sampled variate: the raw uniform `U` and the value derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VariateDraw {
    pub raw: f64,
    pub value: f64,
}

#[derive(Debug, Resource)]
pub struct VariateGenerator {
    rng: StdRng,
    last: Option<f64>,
}

impl VariateGenerator {
    /// Seeded generators yield identical streams across runs; `None` seeds from the OS.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, last: None }
    }

    fn next_unit(&mut self) -> f64 {
        let u: f64 = self.rng.gen();
        self.last = Some(u);
        u
    }

    /// `a + (b - a) * U`. Requires `a <= b`.
    pub fn uniform(&mut self, a: f64, b: f64) -> f64 {
        debug_assert!(a <= b, "uniform bounds must be ordered");
        let u = self.next_unit();
        a + (b - a) * u
    }

    /// `-mean * ln(1 - U)`. Requires `mean > 0`.
    pub fn exponential(&mut self, mean: f64) -> f64 {
        debug_assert!(mean > 0.0, "exponential mean must be positive");
        let u = self.next_unit();
        -mean * (1.0 - u).ln()
    }

    /// `floor(a + (b - a + 1) * U)`, an integer in `[a, b]`.
    pub fn uniform_discrete(&mut self, a: i64, b: i64) -> i64 {
        debug_assert!(a <= b, "discrete uniform bounds must be ordered");
        let u = self.next_unit();
        let value = (a as f64 + (b - a + 1) as f64 * u).floor() as i64;
        // Guards the floating-point edge where U rounds the product up to b + 1.
        value.min(b)
    }

    /// The raw uniform behind the most recent draw, if any.
    pub fn last_variate(&self) -> Option<f64> {
        self.last
    }

    pub fn draw_uniform(&mut self, a: f64, b: f64) -> VariateDraw {
        let value = self.uniform(a, b);
        self.record(value)
    }

    pub fn draw_exponential(&mut self, mean: f64) -> VariateDraw {
        let value = self.exponential(mean);
        self.record(value)
    }

    pub fn draw_uniform_discrete(&mut self, a: i64, b: i64) -> VariateDraw {
        let value = self.uniform_discrete(a, b) as f64;
        self.record(value)
    }

    fn record(&self, value: f64) -> VariateDraw {
        VariateDraw {
            raw: self.last.unwrap_or_default(),
            value,
        }
    }
}
