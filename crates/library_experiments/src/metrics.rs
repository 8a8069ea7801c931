//! Metrics extraction from finished simulations.

use library_core::{LibrarySimulation, RunStatus};
use serde::Serialize;

use crate::parameters::ParameterSet;

/// Aggregated metrics from a single simulation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub experiment_id: String,
    pub run_id: usize,
    pub seed: u64,
    pub capacity: usize,
    pub employees: usize,
    pub inter_arrival: f64,
    pub leave_probability: f64,
    pub status: RunStatus,
    pub arrivals: u64,
    pub departures: u64,
    pub rejections: u64,
    pub still_inside: usize,
    /// Rejections over arrivals.
    pub rejection_rate: f64,
    pub percent_time_closed: f64,
    /// Residence time statistics over everyone who left.
    pub avg_residence_time: f64,
    pub median_residence_time: f64,
    pub p90_residence_time: f64,
    /// Time between arrival and the start of service.
    pub avg_queue_wait: f64,
    /// People who stayed to read.
    pub readers: usize,
    pub total_simulated_time: f64,
}

impl SimulationResult {
    /// Average, median and 90th percentile of `values`; zeros when empty.
    pub(crate) fn calculate_stats(values: &[f64]) -> (f64, f64, f64) {
        if values.is_empty() {
            return (0.0, 0.0, 0.0);
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let avg = sorted.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };
        let p90_idx = ((n - 1) as f64 * 0.9) as usize;
        let p90 = sorted[p90_idx.min(n - 1)];

        (avg, median, p90)
    }
}

/// Extract metrics from a finished simulation.
pub fn extract_metrics(
    param_set: &ParameterSet,
    simulation: &LibrarySimulation,
    status: RunStatus,
) -> SimulationResult {
    let metrics = simulation.compute_final_metrics();
    let departures = &simulation.telemetry().departures;

    let residence: Vec<f64> = departures.iter().map(|d| d.residence_time()).collect();
    let (avg_residence_time, median_residence_time, p90_residence_time) =
        SimulationResult::calculate_stats(&residence);
    let waits: Vec<f64> = departures.iter().filter_map(|d| d.queue_wait()).collect();
    let (avg_queue_wait, _, _) = SimulationResult::calculate_stats(&waits);
    let readers = departures.iter().filter(|d| d.reading.is_some()).count();

    let rejection_rate = if metrics.arrivals > 0 {
        metrics.rejections as f64 / metrics.arrivals as f64
    } else {
        0.0
    };

    let config = simulation.config();
    SimulationResult {
        experiment_id: param_set.experiment_id.clone(),
        run_id: param_set.run_id,
        seed: param_set.seed,
        capacity: config.capacity,
        employees: config.employees,
        inter_arrival: config.inter_arrival,
        leave_probability: config.leave_probability,
        status,
        arrivals: metrics.arrivals,
        departures: metrics.departures,
        rejections: metrics.rejections,
        still_inside: metrics.still_inside,
        rejection_rate,
        percent_time_closed: metrics.percent_time_closed,
        avg_residence_time,
        median_residence_time,
        p90_residence_time,
        avg_queue_wait,
        readers,
        total_simulated_time: metrics.total_simulated_time,
    }
}
