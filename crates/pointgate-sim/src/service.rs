//! The service factory: what one dequeued object costs the server.
//!
//! Each service step mirrors the production request path: re-enforce a
//! policy definition (reset to an empty baseline, then reconcile a selected
//! rule batch) and answer a query by sweeping the registered data points
//! through the policy engine. Rule-batch size and query size can be pinned
//! for sensitivity runs, or drawn uniformly for free runs.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use pointgate_policy::{Decision, RuleKind, RuleRecord, RuleStore, engine, reconciler};
use pointgate_types::{DataPoint, SemanticType, Timestamp, UserCode, Value};

use crate::context::SimContext;
use crate::estimator::Estimator;

/// Rules per synthetic policy file. Policy files come in multiples of this.
pub const RULES_PER_FILE: usize = 8;

/// Locations the synthetic fleet is spread over.
const LOCATIONS: [&str; 8] = [
    "boston",
    "vancouver",
    "toronto",
    "seattle",
    "calgary",
    "montreal",
    "ottawa",
    "halifax",
];

const SEMANTIC_TYPES: [SemanticType; 12] = [
    SemanticType::Temperature,
    SemanticType::Voltage,
    SemanticType::Current,
    SemanticType::Frequency,
    SemanticType::Power,
    SemanticType::Password,
    SemanticType::Heading,
    SemanticType::FuelLevel,
    SemanticType::PositionX,
    SemanticType::PositionY,
    SemanticType::Altitude,
    SemanticType::Speed,
];

// ============================================================================
// ServicePlan
// ============================================================================

/// Sensitivity knobs for the service step.
#[derive(Debug, Clone, Default)]
pub struct ServicePlan {
    /// Fixed policy-file code (rule count = code × [`RULES_PER_FILE`]).
    /// `None` draws uniformly from 1..=6 per service.
    pub rule_files: Option<usize>,
    /// Query-size code 1..=11 (200 B, then 500 B steps up to 5 KB). Zero
    /// runs the full output sweep instead of a sized reply.
    pub query_size_code: u16,
    /// Log each data point that passes the policy check.
    pub show_output: bool,
}

impl ServicePlan {
    /// Synthetic reply size in bytes for a query-size code.
    fn reply_size(code: u16) -> usize {
        if code == 1 {
            200
        } else {
            (usize::from(code) - 1) * 500
        }
    }
}

// ============================================================================
// ServiceFactory
// ============================================================================

/// Performs the per-object service work against its own rule store.
pub struct ServiceFactory {
    store: RuleStore,
    plan: ServicePlan,
    rng: SmallRng,
}

impl ServiceFactory {
    /// Builds a factory around a seeded store.
    pub fn new(store: RuleStore, plan: ServicePlan, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self { store, plan, rng }
    }

    /// One service step: policy re-enforcement plus the query sweep.
    /// Returns the number of data points the policy allowed through.
    pub fn process(&mut self) -> usize {
        // Reset to the empty baseline policy, then enforce the batch chosen
        // for this service.
        reconciler::apply_batch(&mut self.store, std::iter::empty());

        let files = self
            .plan
            .rule_files
            .unwrap_or_else(|| self.rng.gen_range(1..=6));
        reconciler::apply_batch(&mut self.store, synthetic_rules(files * RULES_PER_FILE));

        let mut allowed = 0;
        for dp in self.store.data_points() {
            if engine::check(&self.store, dp) == Decision::Allow {
                allowed += 1;
                if self.plan.show_output {
                    tracing::info!(name = %dp.name, value = ?dp.value, "allowed");
                }
            }
        }

        if self.plan.query_size_code > 0 {
            // Shape the reply payload to the selected query size.
            let reply = vec![0_u8; ServicePlan::reply_size(self.plan.query_size_code)];
            std::hint::black_box(&reply);
        }

        allowed
    }

    pub fn store(&self) -> &RuleStore {
        &self.store
    }
}

// ============================================================================
// Synthetic fleet and rules
// ============================================================================

/// Generates `count` distinct policy rules cycling over types and locations.
/// Physical types get bounded comparator rules; password-like types get
/// access rules.
pub fn synthetic_rules(count: usize) -> Vec<RuleRecord> {
    (0..count)
        .map(|i| {
            let semantic_type = SEMANTIC_TYPES[i % SEMANTIC_TYPES.len()];
            let location = LOCATIONS[(i / SEMANTIC_TYPES.len()) % LOCATIONS.len()];
            let (kind, min, max) = if semantic_type.is_access_gated() {
                (RuleKind::Access, 0.0, 0.0)
            } else {
                (RuleKind::Comparator, 0.0, 100.0)
            };
            RuleRecord {
                kind,
                semantic_type,
                location: location.to_string(),
                min,
                max,
                time_secs: 0,
                user: UserCode::Invalid,
                group: pointgate_types::GroupCode::Invalid,
            }
        })
        .collect()
}

/// Registers `count` synthetic data points spread over the same types and
/// locations the rules cover.
pub fn seed_data_points(store: &mut RuleStore, count: usize) {
    for i in 0..count {
        let semantic_type = SEMANTIC_TYPES[i % SEMANTIC_TYPES.len()];
        let location = LOCATIONS[(i / SEMANTIC_TYPES.len()) % LOCATIONS.len()];
        let type_tag = format!("type:{semantic_type:?}");
        let dp = DataPoint::new(
            &format!("dp{i:04}"),
            1,
            Value::U16((i % 120) as u16),
            Timestamp::from_secs(1_600_000_000),
        )
        .with_guid(0x1000_0000 + i as u32)
        .with_tag(&type_tag)
        .with_tag(&format!("location:{location}"));

        if let Err(err) = store.add(std::sync::Arc::new(dp), None) {
            tracing::warn!(%err, "failed to register synthetic data point");
        }
    }
}

// ============================================================================
// Service loop
// ============================================================================

/// Drains the queue until the arrival side finishes and the queue is empty,
/// feeding every serviced object to the estimator.
pub fn run_service_loop(ctx: &SimContext, factory: &mut ServiceFactory, estimator: &mut Estimator) {
    loop {
        while let Some(mut object) = ctx.queue.dequeue_front() {
            object.mark_service_start();
            factory.process();
            object.mark_service_end();

            let wait_ms = object
                .queue_wait()
                .map_or(0.0, |d| d.as_secs_f64() * 1000.0);
            let service_ms = object
                .service_time()
                .map_or(0.0, |d| d.as_secs_f64() * 1000.0);

            tracing::debug!(
                wait_ms,
                service_ms,
                end_batch = object.end_batch,
                "serviced object"
            );
            estimator.record(wait_ms, service_ms, object.end_batch, object.batch_size);
        }

        if ctx.arrivals_done() && ctx.queue.is_empty() {
            break;
        }

        std::thread::sleep(std::time::Duration::from_millis(1));
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::NullSink;

    #[test]
    fn test_synthetic_rules_have_distinct_keys() {
        let rules = synthetic_rules(48);
        let mut keys = std::collections::HashSet::new();
        for record in rules {
            let rule = pointgate_policy::PolicyRule::from(record);
            assert!(keys.insert(rule.key()), "duplicate key in synthetic batch");
        }
        assert_eq!(keys.len(), 48);
    }

    #[test]
    fn test_seed_data_points_registers_fleet() {
        let mut store = RuleStore::new(256, 64);
        seed_data_points(&mut store, 24);
        assert_eq!(store.data_point_count(), 24);
        assert!(store.find_by_name("dp0000", 1).is_some());
        assert!(store.find_by_id(0x1000_0001, 1).is_some());
    }

    #[test]
    fn test_service_step_enforces_selected_batch() {
        let mut store = RuleStore::new(256, 64);
        seed_data_points(&mut store, 24);

        let plan = ServicePlan {
            rule_files: Some(2),
            query_size_code: 1,
            show_output: false,
        };
        let mut factory = ServiceFactory::new(store, plan, Some(11));
        factory.process();

        assert_eq!(factory.store().policy_count(), 2 * RULES_PER_FILE);
    }

    #[test]
    fn test_service_step_is_stable_across_calls() {
        let mut store = RuleStore::new(256, 64);
        seed_data_points(&mut store, 24);

        let plan = ServicePlan {
            rule_files: Some(3),
            query_size_code: 2,
            show_output: false,
        };
        let mut factory = ServiceFactory::new(store, plan, Some(11));
        let first = factory.process();
        let second = factory.process();

        // Same batch, same fleet: the sweep outcome does not drift.
        assert_eq!(first, second);
        assert_eq!(factory.store().policy_count(), 3 * RULES_PER_FILE);
    }

    #[test]
    fn test_full_run_drains_queue_into_estimator() {
        let ctx = SimContext::new();
        ctx.queue.enqueue_batch(3);
        ctx.queue.enqueue_batch(4);
        ctx.finish_arrivals();

        let mut store = RuleStore::new(64, 64);
        seed_data_points(&mut store, 12);
        let mut factory = ServiceFactory::new(
            store,
            ServicePlan {
                rule_files: Some(1),
                query_size_code: 1,
                show_output: false,
            },
            Some(5),
        );
        let mut estimator = Estimator::new(Box::new(NullSink));

        run_service_loop(&ctx, &mut factory, &mut estimator);

        assert!(ctx.queue.is_empty());
        assert_eq!(estimator.epochs_completed(), 2);
        assert!(estimator.variance().is_some());
    }
}
