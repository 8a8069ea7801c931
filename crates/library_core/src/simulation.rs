//! Engine entry point: validate a config, run to completion, report.

use std::collections::BTreeMap;

use bevy_ecs::prelude::{Schedule, World};
use serde::Serialize;
use tracing::{info, warn};

use crate::clock::SimulationClock;
use crate::config::LibraryConfig;
use crate::ecs::PersonId;
use crate::error::ConfigError;
use crate::library::Library;
use crate::runner::{initialize_simulation, run_until_stopped, simulation_schedule, RunStatus};
use crate::scenario::build_scenario;
use crate::snapshot::{SnapshotLog, SnapshotRow};
use crate::telemetry::{Counters, LibraryTelemetry};

/// Rows and stop reason of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub status: RunStatus,
    pub rows: Vec<SnapshotRow>,
}

impl SimulationReport {
    pub fn final_row(&self) -> Option<&SnapshotRow> {
        self.rows.last()
    }

    /// Complete `(t, P)` history of every reading session seen in the rows.
    pub fn integration_histories(&self) -> BTreeMap<PersonId, Vec<(f64, f64)>> {
        let mut histories = BTreeMap::new();
        for row in &self.rows {
            for (person, integrator) in &row.integrations {
                histories
                    .entry(*person)
                    .or_insert_with(|| integrator.history().to_vec());
            }
        }
        histories
    }
}

/// Summary figures of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalMetrics {
    /// Mean residence of people who left; 0 when nobody left.
    pub mean_residence_time: f64,
    /// Share of simulated time the library was closed, in percent.
    pub percent_time_closed: f64,
    pub closed_time: f64,
    pub rejections: u64,
    pub arrivals: u64,
    pub departures: u64,
    pub requests: u64,
    pub returns: u64,
    pub inquiries: u64,
    /// People still inside when the run stopped.
    pub still_inside: usize,
    pub total_simulated_time: f64,
}

impl FinalMetrics {
    fn from_state(counters: &Counters, still_inside: usize, total_simulated_time: f64) -> Self {
        let mean_residence_time = if counters.departures > 0 {
            counters.residence_time_total / counters.departures as f64
        } else {
            0.0
        };
        let percent_time_closed = if total_simulated_time > 0.0 {
            counters.closed_time_total / total_simulated_time * 100.0
        } else {
            0.0
        };
        Self {
            mean_residence_time,
            percent_time_closed,
            closed_time: counters.closed_time_total,
            rejections: counters.rejections,
            arrivals: counters.arrivals,
            departures: counters.departures,
            requests: counters.requests,
            returns: counters.returns,
            inquiries: counters.inquiries,
            still_inside,
            total_simulated_time,
        }
    }
}

/// One library simulation with its own world, schedule and variate stream.
pub struct LibrarySimulation {
    world: World,
    schedule: Schedule,
    status: Option<RunStatus>,
}

impl LibrarySimulation {
    /// Validates `config` and builds the engine state, including the initial row.
    pub fn initialize(config: LibraryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut world = World::new();
        build_scenario(&mut world, config);
        initialize_simulation(&mut world);
        Ok(Self {
            world,
            schedule: simulation_schedule(),
            status: None,
        })
    }

    /// Runs until `SimulationEnd`, the iteration cap, or an empty event list.
    ///
    /// Later calls process nothing and return the same rows and status.
    pub fn run(&mut self) -> SimulationReport {
        let status = match self.status {
            Some(status) => status,
            None => {
                let cap = self.config().max_iterations;
                let (status, processed) =
                    run_until_stopped(&mut self.world, &mut self.schedule, cap);
                match status {
                    RunStatus::IterationCapReached => {
                        warn!(cap, clock = self.now(), "iteration cap reached before simulation end")
                    }
                    _ => info!(?status, events = processed, clock = self.now(), "simulation finished"),
                }
                self.status = Some(status);
                status
            }
        };
        SimulationReport {
            status,
            rows: self.rows().to_vec(),
        }
    }

    pub fn compute_final_metrics(&self) -> FinalMetrics {
        FinalMetrics::from_state(
            self.world.resource::<Counters>(),
            self.world.resource::<Library>().persons_inside(),
            self.now(),
        )
    }

    pub fn status(&self) -> Option<RunStatus> {
        self.status
    }

    pub fn rows(&self) -> &[SnapshotRow] {
        &self.world.resource::<SnapshotLog>().rows
    }

    pub fn telemetry(&self) -> &LibraryTelemetry {
        self.world.resource::<LibraryTelemetry>()
    }

    pub fn config(&self) -> &LibraryConfig {
        self.world.resource::<LibraryConfig>()
    }

    pub fn now(&self) -> f64 {
        self.world.resource::<SimulationClock>().now()
    }

    pub fn world(&self) -> &World {
        &self.world
    }
}
