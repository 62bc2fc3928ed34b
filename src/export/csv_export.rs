//! CSV time-series export of per-step glucose and infusion.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::simulation::{StepObserver, StepRecord};

/// Column names, written once before any rows.
///
/// Downstream plotting scripts select columns by these exact names.
pub const CSV_HEADER: [&str; 3] = ["Time", "Glycemia", "Insulin Infusion"];

/// Record for CSV time-series export
#[derive(Debug, Clone, Serialize)]
pub struct TimeSeriesRecord {
    /// Simulated time at the start of the step (min)
    pub time_min: f64,
    /// Blood glucose (mg/dL)
    pub blood_glucose_mg_dl: f64,
    /// Insulin infusion (μU/min)
    pub insulin_infusion_uU_min: f64,
}

impl From<&StepRecord> for TimeSeriesRecord {
    fn from(r: &StepRecord) -> Self {
        Self {
            time_min: r.time_min,
            blood_glucose_mg_dl: r.blood_glucose_mg_per_dL,
            insulin_infusion_uU_min: r.insulin_infusion_uU_per_min,
        }
    }
}

/// CSV exporter for time-series data
///
/// Buffered; rows reach the file in step order and are flushed by
/// [`CsvExporter::finish`].
pub struct CsvExporter {
    writer: csv::Writer<File>,
    /// Write one row every `sample_every` steps
    sample_every: u64,
    /// Steps observed so far
    seen: u64,
    /// Rows written so far
    written: u64,
    /// Path to output file
    path: PathBuf,
}

impl CsvExporter {
    /// Create the file (and its parent directory) and write the header.
    pub fn new<P: AsRef<Path>>(path: P, sample_every: u64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating export directory {}", dir.display()))?;
        }

        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(CSV_HEADER)?;

        log::info!("CSV export started: {}", path.display());

        Ok(Self {
            writer,
            sample_every: sample_every.max(1),
            seen: 0,
            written: 0,
            path,
        })
    }

    /// Record a step if it falls on the sampling interval
    pub fn maybe_record(&mut self, record: &StepRecord) -> Result<bool> {
        let due = self.seen % self.sample_every == 0;
        self.seen += 1;
        if due {
            self.record(record)?;
        }
        Ok(due)
    }

    /// Force record a step regardless of interval
    pub fn record(&mut self, record: &StepRecord) -> Result<()> {
        self.writer.serialize(TimeSeriesRecord::from(record))?;
        self.written += 1;
        Ok(())
    }

    /// Finish writing and return the output path
    pub fn finish(mut self) -> Result<PathBuf> {
        self.writer.flush()?;
        log::info!(
            "CSV export completed: {} ({} rows)",
            self.path.display(),
            self.written
        );
        Ok(self.path)
    }

    /// Get the output path
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_written(&self) -> u64 {
        self.written
    }
}

impl StepObserver for CsvExporter {
    fn observe(&mut self, record: &StepRecord) -> Result<()> {
        self.maybe_record(record).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(t: f64) -> StepRecord {
        StepRecord {
            time_min: t,
            blood_glucose_mg_per_dL: 100.0 + t,
            insulin_infusion_uU_per_min: 5.0,
        }
    }

    #[test]
    fn test_header_written_without_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        CsvExporter::new(&path, 1).unwrap().finish().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim_end(), "Time,Glycemia,Insulin Infusion");
    }

    #[test]
    fn test_rows_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut exporter = CsvExporter::new(&path, 1).unwrap();
        exporter.observe(&record(1.0)).unwrap();
        exporter.observe(&record(2.0)).unwrap();
        exporter.finish().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "1.0,101.0,5.0");
        assert_eq!(lines[2], "2.0,102.0,5.0");
    }

    #[test]
    fn test_sampling_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sampled.csv");
        let mut exporter = CsvExporter::new(&path, 10).unwrap();
        for i in 0..25 {
            exporter.observe(&record(i as f64)).unwrap();
        }
        assert_eq!(exporter.rows_written(), 3);
        exporter.finish().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 4);
    }
}
