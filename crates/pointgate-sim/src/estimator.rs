//! Regenerative-method statistics over completed service cycles.
//!
//! Each arrival epoch is treated as one regeneration cycle. Every serviced
//! object adds its (queue-wait + service) millis to the running cycle sum;
//! the batch-ending object closes the cycle and updates the live estimates:
//! overall mean, deviation from the expected cycle sum, variance of the
//! deviation, and a 90% confidence half-width.
//!
//! Two constants are load-bearing for comparability with recorded outputs:
//! the variance divides by `n - 1`, and the confidence half-width uses the
//! two-sided z value 1.645.

use crate::report::{ReportRecord, ReportSink};

/// Two-sided z value for a 90% confidence interval.
pub const Z_90: f64 = 1.645;

/// Steady-state rows are emitted every `SAMPLE_EVERY` epochs once the run is
/// long, and every epoch before that.
const SAMPLE_EVERY: usize = 100;
const SAMPLE_ALL_BELOW: usize = 1000;

// ============================================================================
// Estimator
// ============================================================================

/// Live regenerative statistics. Owns its per-epoch sequences; the report
/// sink is injected at construction.
pub struct Estimator {
    sink: Box<dyn ReportSink>,

    /// Accumulating sum for the cycle currently in progress (ms).
    current_sum: f64,
    /// Finalized cycle sums, one per completed epoch (ms).
    cycle_sums: Vec<f64>,
    /// Arrival counts, one per completed epoch.
    arrivals: Vec<usize>,
    /// Deviation of each cycle sum from its expected value (ms).
    deviations: Vec<f64>,

    sum_of_cycle_sums: f64,
    sum_of_numbers: u64,
    overall_mean: f64,
    sum_of_squared_deviation: f64,
    variance: Option<f64>,
    mean_cycle_length: Option<f64>,
    confidence_interval: Option<f64>,
}

impl Estimator {
    pub fn new(sink: Box<dyn ReportSink>) -> Self {
        Self {
            sink,
            current_sum: 0.0,
            cycle_sums: Vec::new(),
            arrivals: Vec::new(),
            deviations: Vec::new(),
            sum_of_cycle_sums: 0.0,
            sum_of_numbers: 0,
            overall_mean: 0.0,
            sum_of_squared_deviation: 0.0,
            variance: None,
            mean_cycle_length: None,
            confidence_interval: None,
        }
    }

    /// Records one serviced object.
    ///
    /// `arrivals` is the size of the burst the object arrived with; it is
    /// only consulted on the batch-ending object, which closes the cycle.
    pub fn record(&mut self, queue_wait_ms: f64, service_ms: f64, end_batch: bool, arrivals: usize) {
        self.current_sum += queue_wait_ms + service_ms;
        if end_batch {
            self.close_cycle(arrivals);
        }
    }

    fn close_cycle(&mut self, arrivals: usize) {
        let cycle_sum = self.current_sum;
        self.current_sum = 0.0;

        self.cycle_sums.push(cycle_sum);
        self.arrivals.push(arrivals);
        let epoch = self.cycle_sums.len();
        self.sink.emit(&ReportRecord::CycleSum {
            epoch,
            sum_ms: cycle_sum,
        });

        self.sum_of_cycle_sums += cycle_sum;
        self.sum_of_numbers += arrivals as u64;
        self.overall_mean = self.sum_of_cycle_sums / self.sum_of_numbers as f64;

        let deviation = cycle_sum - (arrivals as f64) * self.overall_mean;
        self.deviations.push(deviation);
        self.sum_of_squared_deviation += deviation * deviation;

        // One cycle gives no spread estimate; the n-1 divisor needs at
        // least two.
        if epoch > 1 {
            let epochs = epoch as f64;
            let variance = self.sum_of_squared_deviation / (epochs - 1.0);
            let mean_cycle_length = self.sum_of_numbers as f64 / epochs;
            let confidence_interval =
                Z_90 * variance.sqrt() / (mean_cycle_length * epochs.sqrt());

            self.variance = Some(variance);
            self.mean_cycle_length = Some(mean_cycle_length);
            self.confidence_interval = Some(confidence_interval);

            if epoch % SAMPLE_EVERY == 0 || epoch < SAMPLE_ALL_BELOW {
                self.sink.emit(&ReportRecord::SteadyState {
                    epoch,
                    overall_mean_ms: self.overall_mean,
                    confidence_interval,
                });
            }
        }

        tracing::debug!(
            epoch,
            cycle_sum_ms = cycle_sum,
            overall_mean_ms = self.overall_mean,
            "closed regeneration cycle"
        );
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Completed regeneration cycles.
    pub fn epochs_completed(&self) -> usize {
        self.cycle_sums.len()
    }

    /// Live overall mean (ms per arrival). Zero before the first epoch
    /// completes.
    pub fn overall_mean(&self) -> f64 {
        self.overall_mean
    }

    /// Variance of the cycle-sum deviation. `None` until two epochs have
    /// completed.
    pub fn variance(&self) -> Option<f64> {
        self.variance
    }

    /// Mean arrivals per cycle. `None` until two epochs have completed.
    pub fn mean_cycle_length(&self) -> Option<f64> {
        self.mean_cycle_length
    }

    /// 90% confidence half-width. `None` until two epochs have completed.
    pub fn confidence_interval(&self) -> Option<f64> {
        self.confidence_interval
    }

    /// Finalized per-epoch cycle sums, for read-only reporting.
    pub fn cycle_sums(&self) -> &[f64] {
        &self.cycle_sums
    }
}

// ============================================================================
// Tests
// ============================================================================
