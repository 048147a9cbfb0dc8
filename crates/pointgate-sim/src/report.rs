//! Reporting sinks for the simulation's three CSV streams.
//!
//! The estimator and the arrival generator emit typed records through the
//! [`ReportSink`] capability injected at construction; where the records end
//! up (CSV files, memory, nowhere) is the sink's business.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

// ============================================================================
// Records
// ============================================================================

/// One reporting record. Epochs are 1-based in all streams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReportRecord {
    /// Per-epoch arrival count.
    Arrivals { epoch: usize, count: usize },
    /// Per-epoch cycle sum (total queue-wait + service millis).
    CycleSum { epoch: usize, sum_ms: f64 },
    /// Periodic steady-state estimate.
    SteadyState {
        epoch: usize,
        overall_mean_ms: f64,
        confidence_interval: f64,
    },
}

// ============================================================================
// ReportSink
// ============================================================================

/// Destination for reporting records.
pub trait ReportSink: Send {
    fn emit(&mut self, record: &ReportRecord);
}

/// Discards every record. For tests and quiet runs.
#[derive(Debug, Default)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn emit(&mut self, _record: &ReportRecord) {}
}

/// Collects records in memory. For tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<ReportRecord>,
}

impl ReportSink for MemorySink {
    fn emit(&mut self, record: &ReportRecord) {
        self.records.push(record.clone());
    }
}

// ============================================================================
// CsvSink
// ============================================================================

/// Writes records to per-stream CSV files. Streams this sink was not given a
/// file for are dropped silently, so the arrival thread and the service loop
/// can each hold a sink over just their own files.
pub struct CsvSink {
    arrivals: Option<BufWriter<File>>,
    cycle_sums: Option<BufWriter<File>>,
    steady_state: Option<BufWriter<File>>,
}

impl CsvSink {
    /// A sink carrying only the per-epoch arrivals stream.
    pub fn arrivals(path: &Path) -> Result<Self, SimError> {
        Ok(Self {
            arrivals: Some(create_stream(path, "Epoch,Object")?),
            cycle_sums: None,
            steady_state: None,
        })
    }

    /// A sink carrying the estimator's streams: cycle sums and steady-state
    /// samples.
    pub fn estimator_streams(cycle_sums: &Path, steady_state: &Path) -> Result<Self, SimError> {
        Ok(Self {
            arrivals: None,
            cycle_sums: Some(create_stream(cycle_sums, "cycle sums(ms)")?),
            steady_state: Some(create_stream(
                steady_state,
                "Epoch,Overall mean,confidence interval",
            )?),
        })
    }
}

impl ReportSink for CsvSink {
    fn emit(&mut self, record: &ReportRecord) {
        let result = match record {
            ReportRecord::Arrivals { epoch, count } => self
                .arrivals
                .as_mut()
                .map(|w| writeln!(w, "{epoch},{count}").and_then(|()| w.flush())),
            ReportRecord::CycleSum { epoch, sum_ms } => self
                .cycle_sums
                .as_mut()
                .map(|w| writeln!(w, "{epoch},{sum_ms:.4}").and_then(|()| w.flush())),
            ReportRecord::SteadyState {
                epoch,
                overall_mean_ms,
                confidence_interval,
            } => self.steady_state.as_mut().map(|w| {
                writeln!(w, "{epoch},{overall_mean_ms:.2},{confidence_interval:.2}")
                    .and_then(|()| w.flush())
            }),
        };

        if let Some(Err(err)) = result {
            // Reporting failures must not kill the simulation.
            tracing::error!(%err, "failed to write report record");
        }
    }
}

fn create_stream(path: &Path, header: &str) -> Result<BufWriter<File>, SimError> {
    let file = File::create(path).map_err(|source| SimError::OutputFile {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{header}").map_err(|source| SimError::OutputFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(writer)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_csv_sink_writes_headers_and_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cycle_path = dir.path().join("cycles.csv");
        let steady_path = dir.path().join("steady.csv");

        let mut sink =
            CsvSink::estimator_streams(&cycle_path, &steady_path).expect("create sink");
        sink.emit(&ReportRecord::CycleSum {
            epoch: 1,
            sum_ms: 30.25,
        });
        sink.emit(&ReportRecord::SteadyState {
            epoch: 2,
            overall_mean_ms: 10.571,
            confidence_interval: 0.4567,
        });
        drop(sink);

        let cycles = fs::read_to_string(&cycle_path).expect("read cycles");
        assert_eq!(cycles, "cycle sums(ms)\n1,30.2500\n");

        let steady = fs::read_to_string(&steady_path).expect("read steady");
        assert_eq!(
            steady,
            "Epoch,Overall mean,confidence interval\n2,10.57,0.46\n"
        );
    }

    #[test]
    fn test_arrivals_sink_ignores_other_streams() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("arrivals.csv");

        let mut sink = CsvSink::arrivals(&path).expect("create sink");
        sink.emit(&ReportRecord::Arrivals { epoch: 1, count: 4 });
        sink.emit(&ReportRecord::CycleSum {
            epoch: 1,
            sum_ms: 1.0,
        });
        drop(sink);

        let contents = fs::read_to_string(&path).expect("read arrivals");
        assert_eq!(contents, "Epoch,Object\n1,4\n");
    }

    #[test]
    fn test_memory_sink_collects() {
        let mut sink = MemorySink::default();
        sink.emit(&ReportRecord::Arrivals { epoch: 1, count: 3 });
        sink.emit(&ReportRecord::Arrivals { epoch: 2, count: 4 });
        assert_eq!(sink.records.len(), 2);
    }
}
