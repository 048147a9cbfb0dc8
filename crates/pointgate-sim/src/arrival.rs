//! Synthetic arrival generation.
//!
//! The producer side of the simulation: once per inter-arrival interval it
//! draws a burst size from a Gaussian (or uses a fixed override for
//! sensitivity runs), records the count, and enqueues the burst. Terminates
//! at the epoch ceiling or the run-wide object ceiling.

use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::context::SimContext;
use crate::report::{ReportRecord, ReportSink};

// ============================================================================
// Gaussian sampler
// ============================================================================

/// Gaussian sampler using the Box-Muller polar method.
///
/// Each round trip produces two independent deviates; the second is cached
/// and returned on the next call.
pub struct Gaussian {
    rng: SmallRng,
    spare: Option<f64>,
}

impl Gaussian {
    /// Seeds from system entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
            spare: None,
        }
    }

    /// Fixed seed, for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            spare: None,
        }
    }

    /// Draws one deviate with mean `mu` and standard deviation `sigma`.
    pub fn sample(&mut self, mu: f64, sigma: f64) -> f64 {
        if let Some(x) = self.spare.take() {
            return mu + sigma * x;
        }

        loop {
            let u1: f64 = self.rng.gen_range(-1.0..1.0);
            let u2: f64 = self.rng.gen_range(-1.0..1.0);
            let w = u1 * u1 + u2 * u2;
            if w > 0.0 && w < 1.0 {
                let mult = (-2.0 * w.ln() / w).sqrt();
                self.spare = Some(u2 * mult);
                return mu + sigma * (u1 * mult);
            }
        }
    }
}

// ============================================================================
// Arrival plan
// ============================================================================

/// Parameters of the arrival process.
#[derive(Debug, Clone)]
pub struct ArrivalPlan {
    /// Mean burst size.
    pub mean: f64,
    /// Burst size standard deviation.
    pub sigma: f64,
    /// Inter-arrival sleep between bursts.
    pub interval: Duration,
    /// Sensitivity override: fixed burst size instead of Gaussian draws.
    pub rate_override: Option<usize>,
    /// Number of arrival epochs to run.
    pub epochs: usize,
    /// Run-wide ceiling on total objects.
    pub max_objects: usize,
}

impl ArrivalPlan {
    /// Draws the next burst size: the fixed override when set, otherwise
    /// `|N(mean, sigma)| + 1` (always at least one arrival).
    pub fn draw(&self, gaussian: &mut Gaussian) -> usize {
        match self.rate_override {
            Some(rate) => rate,
            None => gaussian.sample(self.mean, self.sigma).abs() as usize + 1,
        }
    }
}

/// Runs the arrival loop until the epoch or object ceiling is reached, then
/// flags the context so the consumer can drain and exit.
pub fn run_arrival_loop(
    ctx: &SimContext,
    plan: &ArrivalPlan,
    gaussian: &mut Gaussian,
    sink: &mut dyn ReportSink,
) {
    while ctx.objects_created() <= plan.max_objects {
        let count = plan.draw(gaussian);
        let epoch = ctx.advance_epoch();

        sink.emit(&ReportRecord::Arrivals { epoch, count });
        tracing::debug!(epoch, count, "arrival burst");

        ctx.queue.enqueue_batch(count);
        ctx.add_objects(count);

        if epoch >= plan.epochs {
            break;
        }

        std::thread::sleep(plan.interval);
    }

    ctx.finish_arrivals();
}

// ============================================================================
// Tests
// ============================================================================
