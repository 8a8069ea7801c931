//! Parameter variation framework for exploring library configurations.
//!
//! A [ParameterSpace] holds a base [LibraryConfig] plus the values to vary. Grid
//! search expands the Cartesian product; every combination is replicated once per
//! seed.

use std::collections::HashSet;

use library_core::LibraryConfig;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

/// Golden-ratio multiplier used to spread derived seeds.
const SEED_SPREAD: u64 = 0x9e37_79b9;

/// A single configuration to run, tagged for tracking and reproducibility.
#[derive(Debug, Clone, Serialize)]
pub struct ParameterSet {
    pub config: LibraryConfig,
    /// Identifies the parameter combination; replications share it.
    pub experiment_id: String,
    /// Replication index within the experiment.
    pub run_id: usize,
    pub seed: u64,
}

impl ParameterSet {
    pub fn new(config: LibraryConfig, experiment_id: String, run_id: usize, seed: u64) -> Self {
        Self {
            config,
            experiment_id,
            run_id,
            seed,
        }
    }

    /// The config with this set's seed applied.
    pub fn library_config(&self) -> LibraryConfig {
        self.config.clone().with_seed(self.seed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Combination {
    capacity: usize,
    employees: usize,
    inter_arrival: f64,
    leave_probability: f64,
}

impl Combination {
    fn apply(&self, base: &LibraryConfig) -> LibraryConfig {
        base.clone()
            .with_capacity(self.capacity)
            .with_employees(self.employees)
            .with_inter_arrival(self.inter_arrival)
            .with_leave_probability(self.leave_probability)
    }

    /// Bit-exact identity for duplicate detection.
    fn key(&self) -> (usize, usize, u64, u64) {
        (
            self.capacity,
            self.employees,
            self.inter_arrival.to_bits(),
            self.leave_probability.to_bits(),
        )
    }
}

/// Defines a parameter space for exploration.
#[derive(Debug, Clone)]
pub struct ParameterSpace {
    base: LibraryConfig,
    capacities: Vec<usize>,
    employees: Vec<usize>,
    inter_arrivals: Vec<f64>,
    leave_probabilities: Vec<f64>,
    seeds: Vec<u64>,
}

impl Default for ParameterSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterSpace {
    pub fn new() -> Self {
        Self {
            base: LibraryConfig::default(),
            capacities: vec![],
            employees: vec![],
            inter_arrivals: vec![],
            leave_probabilities: vec![],
            seeds: vec![],
        }
    }

    /// Create a new parameter space for grid search.
    pub fn grid() -> Self {
        Self::new()
    }

    /// Set base config (used for every unspecified parameter).
    pub fn with_base(mut self, base: LibraryConfig) -> Self {
        self.base = base;
        self
    }

    pub fn capacity(mut self, values: Vec<usize>) -> Self {
        self.capacities = values;
        self
    }

    pub fn employees(mut self, values: Vec<usize>) -> Self {
        self.employees = values;
        self
    }

    pub fn inter_arrival(mut self, values: Vec<f64>) -> Self {
        self.inter_arrivals = values;
        self
    }

    pub fn leave_probability(mut self, values: Vec<f64>) -> Self {
        self.leave_probabilities = values;
        self
    }

    /// Seeds to replicate every combination with.
    ///
    /// Without explicit seeds each combination runs once with a seed derived from its
    /// index, or with the base config's seed when it has one.
    pub fn seeds(mut self, seeds: Vec<u64>) -> Self {
        self.seeds = seeds;
        self
    }

    /// Shorthand for `seeds(first..first + count)`.
    pub fn replications(self, first: u64, count: usize) -> Self {
        self.seeds((first..first + count as u64).collect())
    }

    fn values<T: Copy>(values: &[T], default: T) -> Vec<T> {
        if values.is_empty() {
            vec![default]
        } else {
            values.to_vec()
        }
    }

    fn combinations(&self) -> Vec<Combination> {
        let capacities = Self::values(&self.capacities, self.base.capacity);
        let employees = Self::values(&self.employees, self.base.employees);
        let inter_arrivals = Self::values(&self.inter_arrivals, self.base.inter_arrival);
        let leaves = Self::values(&self.leave_probabilities, self.base.leave_probability);

        capacities
            .iter()
            .flat_map(|&capacity| employees.iter().map(move |&staff| (capacity, staff)))
            .flat_map(|(capacity, employees)| {
                inter_arrivals
                    .iter()
                    .map(move |&inter_arrival| (capacity, employees, inter_arrival))
            })
            .flat_map(|(capacity, employees, inter_arrival)| {
                leaves.iter().map(move |&leave_probability| Combination {
                    capacity,
                    employees,
                    inter_arrival,
                    leave_probability,
                })
            })
            .collect()
    }

    fn seeds_for(&self, experiment_index: usize) -> Vec<u64> {
        if !self.seeds.is_empty() {
            return self.seeds.clone();
        }
        let seed = self
            .base
            .seed
            .unwrap_or_else(|| (experiment_index as u64).wrapping_mul(SEED_SPREAD));
        vec![seed]
    }

    fn expand(&self, experiment_index: usize, combination: &Combination) -> Vec<ParameterSet> {
        let config = combination.apply(&self.base);
        self.seeds_for(experiment_index)
            .into_iter()
            .enumerate()
            .map(|(run_id, seed)| {
                ParameterSet::new(
                    config.clone(),
                    format!("exp_{experiment_index}"),
                    run_id,
                    seed,
                )
            })
            .collect()
    }

    /// Generate all parameter sets using grid search (Cartesian product × seeds).
    pub fn generate(&self) -> Vec<ParameterSet> {
        self.combinations()
            .iter()
            .enumerate()
            .flat_map(|(index, combination)| self.expand(index, combination))
            .collect()
    }

    /// Sample up to `count` distinct combinations at random, each replicated per seed.
    ///
    /// Stops early once every distinct combination has been drawn.
    pub fn sample_random(&self, count: usize, seed: u64) -> Vec<ParameterSet> {
        let mut pool = self.combinations();
        let mut seen = HashSet::new();
        pool.retain(|combination| seen.insert(combination.key()));

        let mut rng = StdRng::seed_from_u64(seed);
        pool.shuffle(&mut rng);
        pool.truncate(count);

        pool.iter()
            .enumerate()
            .flat_map(|(index, combination)| self.expand(index, combination))
            .collect()
    }
}
