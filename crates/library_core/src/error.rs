//! Construction-time validation errors.
//!
//! Every rule of [crate::config::LibraryConfig::validate] has its own variant so callers
//! can tell exactly which field rejected the run.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("simulation horizon must be positive, got {0}")]
    NonPositiveHorizon(f64),

    #[error("iteration cap must be at least 1")]
    ZeroIterationCap,

    #[error("inter-arrival interval must be positive, got {0}")]
    NonPositiveInterArrival(f64),

    #[error("probability `{name}` must lie in [0, 1], got {value}")]
    ProbabilityOutOfRange { name: &'static str, value: f64 },

    #[error("action probabilities must sum to 1 (within {tolerance}), got {sum}")]
    ProbabilitiesDoNotSumToOne { sum: f64, tolerance: f64 },

    #[error("`{name}` bounds are inverted: min {min} > max {max}")]
    InvertedRange {
        name: &'static str,
        min: f64,
        max: f64,
    },

    #[error("`{name}` must not be negative, got {value}")]
    NegativeDuration { name: &'static str, value: f64 },

    #[error("exponential mean `{name}` must be positive, got {value}")]
    NonPositiveMean { name: &'static str, value: f64 },

    #[error("minimum page count must be at least 1")]
    ZeroPageCount,

    #[error("book tier thresholds must be ordered: short {short_max} > medium {medium_max}")]
    UnorderedTierThresholds { short_max: u32, medium_max: u32 },

    #[error("reading constant `{name}` must be positive, got {value}")]
    NonPositiveReadingConstant { name: &'static str, value: f64 },

    #[error("integrator step size must be positive, got {0}")]
    NonPositiveStepSize(f64),

    #[error("integration macro-step must be positive, got {0}")]
    NonPositiveMacroStep(f64),

    #[error("at least one employee is required")]
    NoEmployees,

    #[error("capacity must be at least 1")]
    ZeroCapacity,
}
