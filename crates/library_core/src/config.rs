//! Simulation options.
//!
//! All times are in simulated minutes. Defaults reproduce the reference library
//! exercise: an 8 hour day, one arrival every 4 minutes, two employees and room for
//! twenty people.

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Allowed deviation of the action probability sum from 1.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Probabilities of the three things an arriving person may want to do.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionProbabilities {
    pub request: f64,
    pub return_book: f64,
    pub inquire: f64,
}

impl Default for ActionProbabilities {
    fn default() -> Self {
        Self {
            request: 0.45,
            return_book: 0.45,
            inquire: 0.10,
        }
    }
}

impl ActionProbabilities {
    pub fn new(request: f64, return_book: f64, inquire: f64) -> Self {
        Self {
            request,
            return_book,
            inquire,
        }
    }

    pub fn sum(&self) -> f64 {
        self.request + self.return_book + self.inquire
    }
}

/// Service-time distributions per action kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceTimes {
    /// Inquiry: uniform between these bounds.
    pub inquiry_min: f64,
    pub inquiry_max: f64,
    /// Book request: exponential search time with this mean.
    pub request_search_mean: f64,
    /// Book return: uniform between these bounds.
    pub return_min: f64,
    pub return_max: f64,
}

impl Default for ServiceTimes {
    fn default() -> Self {
        Self {
            inquiry_min: 2.0,
            inquiry_max: 5.0,
            request_search_mean: 6.0,
            return_min: 2.0,
            return_max: 3.5,
        }
    }
}

/// Inclusive range a book's page count is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRange {
    pub min: u32,
    pub max: u32,
}

impl Default for PageRange {
    fn default() -> Self {
        Self { min: 100, max: 350 }
    }
}

/// Page-count tiers selecting the constant K of `dP/dt = K/5`.
///
/// Books up to `short_max_pages` read at `short_k`, up to `medium_max_pages` at
/// `medium_k`, anything longer at `long_k`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookTiers {
    pub short_max_pages: u32,
    pub medium_max_pages: u32,
    pub short_k: f64,
    pub medium_k: f64,
    pub long_k: f64,
}

impl Default for BookTiers {
    fn default() -> Self {
        Self {
            short_max_pages: 200,
            medium_max_pages: 300,
            short_k: 100.0,
            medium_k: 90.0,
            long_k: 70.0,
        }
    }
}

impl BookTiers {
    pub fn reading_constant(&self, pages: u32) -> f64 {
        if pages <= self.short_max_pages {
            self.short_k
        } else if pages <= self.medium_max_pages {
            self.medium_k
        } else {
            self.long_k
        }
    }
}

/// Euler integration settings for reading progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadingConfig {
    /// Euler step `h`.
    pub step_size: f64,
    /// Chunk of time integrated at once when sizing a reading session.
    pub macro_step: f64,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            step_size: 0.1,
            macro_step: 10.0,
        }
    }
}

/// Complete configuration of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct LibraryConfig {
    /// Simulation horizon (minutes). A `SimulationEnd` event fires here.
    pub horizon: f64,
    /// Maximum number of events processed before the run is cut short.
    pub max_iterations: usize,
    /// Fixed time between consecutive arrivals.
    pub inter_arrival: f64,
    pub actions: ActionProbabilities,
    pub service: ServiceTimes,
    /// Probability that a person leaves with the requested book instead of reading it.
    pub leave_probability: f64,
    pub pages: PageRange,
    pub tiers: BookTiers,
    pub reading: ReadingConfig,
    pub employees: usize,
    pub capacity: usize,
    /// Seed for the variate stream; `None` draws one from the OS.
    pub seed: Option<u64>,
    /// Number of pending events listed in each snapshot row.
    pub upcoming_events_shown: usize,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            horizon: 480.0,
            max_iterations: 100_000,
            inter_arrival: 4.0,
            actions: ActionProbabilities::default(),
            service: ServiceTimes::default(),
            leave_probability: 0.6,
            pages: PageRange::default(),
            tiers: BookTiers::default(),
            reading: ReadingConfig::default(),
            employees: 2,
            capacity: 20,
            seed: None,
            upcoming_events_shown: 5,
        }
    }
}

impl LibraryConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_horizon(mut self, horizon: f64) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_inter_arrival(mut self, inter_arrival: f64) -> Self {
        self.inter_arrival = inter_arrival;
        self
    }

    pub fn with_actions(mut self, request: f64, return_book: f64, inquire: f64) -> Self {
        self.actions = ActionProbabilities::new(request, return_book, inquire);
        self
    }

    pub fn with_service_times(mut self, service: ServiceTimes) -> Self {
        self.service = service;
        self
    }

    pub fn with_leave_probability(mut self, probability: f64) -> Self {
        self.leave_probability = probability;
        self
    }

    pub fn with_pages(mut self, min: u32, max: u32) -> Self {
        self.pages = PageRange { min, max };
        self
    }

    pub fn with_tiers(mut self, tiers: BookTiers) -> Self {
        self.tiers = tiers;
        self
    }

    pub fn with_reading(mut self, step_size: f64, macro_step: f64) -> Self {
        self.reading = ReadingConfig {
            step_size,
            macro_step,
        };
        self
    }

    pub fn with_employees(mut self, employees: usize) -> Self {
        self.employees = employees;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_upcoming_events_shown(mut self, count: usize) -> Self {
        self.upcoming_events_shown = count;
        self
    }

    /// Checks every construction rule and reports the first violation.
    ///
    /// Probabilities are never renormalized: a sum away from 1 is an error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.horizon > 0.0) {
            return Err(ConfigError::NonPositiveHorizon(self.horizon));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::ZeroIterationCap);
        }
        if !(self.inter_arrival > 0.0) {
            return Err(ConfigError::NonPositiveInterArrival(self.inter_arrival));
        }

        for (name, value) in [
            ("actions.request", self.actions.request),
            ("actions.return_book", self.actions.return_book),
            ("actions.inquire", self.actions.inquire),
            ("leave_probability", self.leave_probability),
        ] {
            check_probability(name, value)?;
        }
        let sum = self.actions.sum();
        if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(ConfigError::ProbabilitiesDoNotSumToOne {
                sum,
                tolerance: PROBABILITY_TOLERANCE,
            });
        }

        let service = &self.service;
        for (name, value) in [
            ("service.inquiry_min", service.inquiry_min),
            ("service.return_min", service.return_min),
        ] {
            if !(value >= 0.0) {
                return Err(ConfigError::NegativeDuration { name, value });
            }
        }
        check_range("service.inquiry", service.inquiry_min, service.inquiry_max)?;
        check_range("service.return", service.return_min, service.return_max)?;
        if !(service.request_search_mean > 0.0) {
            return Err(ConfigError::NonPositiveMean {
                name: "service.request_search_mean",
                value: service.request_search_mean,
            });
        }

        if self.pages.min == 0 {
            return Err(ConfigError::ZeroPageCount);
        }
        check_range("pages", self.pages.min as f64, self.pages.max as f64)?;
        if self.tiers.short_max_pages > self.tiers.medium_max_pages {
            return Err(ConfigError::UnorderedTierThresholds {
                short_max: self.tiers.short_max_pages,
                medium_max: self.tiers.medium_max_pages,
            });
        }
        for (name, value) in [
            ("tiers.short_k", self.tiers.short_k),
            ("tiers.medium_k", self.tiers.medium_k),
            ("tiers.long_k", self.tiers.long_k),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositiveReadingConstant { name, value });
            }
        }

        if !(self.reading.step_size > 0.0) {
            return Err(ConfigError::NonPositiveStepSize(self.reading.step_size));
        }
        if !(self.reading.macro_step > 0.0) {
            return Err(ConfigError::NonPositiveMacroStep(self.reading.macro_step));
        }

        if self.employees == 0 {
            return Err(ConfigError::NoEmployees);
        }
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ProbabilityOutOfRange { name, value })
    }
}

fn check_range(name: &'static str, min: f64, max: f64) -> Result<(), ConfigError> {
    if min <= max {
        Ok(())
    } else {
        Err(ConfigError::InvertedRange { name, min, max })
    }
}
