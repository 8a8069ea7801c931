//! Result export utilities.
//!
//! Batch results and single-run reports are written as pretty-printed JSON.

use std::io::Write;
use std::path::Path;

use library_core::SimulationReport;

use crate::error::ExperimentError;
use crate::metrics::SimulationResult;

#[path = "export/json.rs"]
mod json;
#[path = "export/writer_utils.rs"]
mod writer_utils;

/// Export simulation results to a JSON file holding one object per run.
///
/// # Errors
///
/// Fails on an empty result list, file creation, or serialization errors.
pub fn export_to_json(
    results: &[SimulationResult],
    path: impl AsRef<Path>,
) -> Result<(), ExperimentError> {
    writer_utils::ensure_not_empty(results)?;
    let file = writer_utils::create_output_file(path)?;
    json::write_json_impl(results, file)
}

/// Write results as JSON to any writer (e.g. stdout).
pub fn write_results_json<W: Write>(
    results: &[SimulationResult],
    writer: W,
) -> Result<(), ExperimentError> {
    json::write_json_impl(results, writer)
}

/// Write a full run report (status and every snapshot row) as JSON.
pub fn write_report_json<W: Write>(
    report: &SimulationReport,
    writer: W,
) -> Result<(), ExperimentError> {
    json::write_json_impl(report, writer)
}
