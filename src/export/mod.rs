//! Export functionality for simulation data.
//!
//! Provides the per-step CSV time series and a JSON summary of a finished run.

mod csv_export;
mod json_export;

pub use csv_export::{CsvExporter, TimeSeriesRecord, CSV_HEADER};
pub use json_export::{export_summary_json, RunSummary};
