//! The evaluation engine.
//!
//! PIPELINE (fixed):
//!   1. Snapshot the tenant's config once per evaluation.
//!   2. Fetch records from the signal source as of a date.
//!   3. Score each record, roll up to the customer maximum.
//!   4. Classify and count buckets.
//!
//! RULES:
//!   - Scores are never read back from storage; every evaluation
//!     recomputes them from current signals and the config snapshot.
//!   - A config write during an evaluation does not affect it.
//!   - Customers are scored independently of one another.

use crate::{
    config::TenantScoringConfig,
    error::ScoreResult,
    event::RiskEvent,
    rollup::{rollup_records, BucketCounts, CustomerRisk},
    source::SignalSource,
    store::RiskStore,
    tenant_config,
    types::TenantId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub evaluation_id: String,
    pub tenant_id: TenantId,
    pub as_of: NaiveDate,
    /// The config snapshot every score in this report was computed with.
    pub config: TenantScoringConfig,
    /// Riskiest first.
    pub customers: Vec<CustomerRisk>,
    pub buckets: BucketCounts,
}

impl EvaluationReport {
    pub fn customer(&self, customer_id: &str) -> Option<&CustomerRisk> {
        self.customers.iter().find(|c| c.customer_id == customer_id)
    }

    pub fn top(&self, n: usize) -> &[CustomerRisk] {
        &self.customers[..n.min(self.customers.len())]
    }
}

pub struct RiskEngine {
    tenant_id: TenantId,
    config: TenantScoringConfig,
}

impl RiskEngine {
    pub fn new(tenant_id: impl Into<TenantId>, config: TenantScoringConfig) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            config,
        }
    }

    /// Engine bound to the tenant's config as stored right now.
    pub fn for_tenant(store: &RiskStore, tenant_id: &str) -> ScoreResult<Self> {
        Ok(Self::new(tenant_id, tenant_config::load(store, tenant_id)?))
    }

    /// Like `for_tenant`, with file-loaded defaults under the overrides.
    pub fn for_tenant_with_defaults(
        store: &RiskStore,
        tenant_id: &str,
        defaults: &TenantScoringConfig,
    ) -> ScoreResult<Self> {
        Ok(Self::new(
            tenant_id,
            tenant_config::load_with_defaults(store, tenant_id, defaults)?,
        ))
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn config(&self) -> &TenantScoringConfig {
        &self.config
    }

    /// Score every customer of the tenant.
    pub fn evaluate(
        &self,
        source: &dyn SignalSource,
        as_of: NaiveDate,
    ) -> ScoreResult<EvaluationReport> {
        let records = source.fetch_records(&self.tenant_id, None, as_of)?;
        let customers = rollup_records(&records, &self.config);
        let buckets: BucketCounts = customers.iter().map(|c| c.bucket).collect();

        let report = EvaluationReport {
            evaluation_id: uuid::Uuid::new_v4().to_string(),
            tenant_id: self.tenant_id.clone(),
            as_of,
            config: self.config.clone(),
            customers,
            buckets,
        };

        log::info!(
            "tenant={} evaluation={} as_of={as_of}: {} records, {} customers (ok={} alert={} critical={})",
            self.tenant_id,
            report.evaluation_id,
            records.len(),
            report.customers.len(),
            buckets.ok,
            buckets.alert,
            buckets.critical,
        );
        Ok(report)
    }

    /// Score one customer. `None` when the source has no records for them.
    pub fn evaluate_customer(
        &self,
        source: &dyn SignalSource,
        customer_id: &str,
        as_of: NaiveDate,
    ) -> ScoreResult<Option<CustomerRisk>> {
        let records = source.fetch_records(&self.tenant_id, Some(customer_id), as_of)?;
        let risk = rollup_records(&records, &self.config).into_iter().next();
        if let Some(r) = &risk {
            log::debug!(
                "tenant={} customer={customer_id}: score={} bucket={} across {} record(s)",
                self.tenant_id,
                r.score,
                r.bucket,
                r.record_count,
            );
        }
        Ok(risk)
    }

    /// Append an `EvaluationCompleted` entry for `report` to the event log.
    pub fn record_evaluation(
        &self,
        store: &RiskStore,
        report: &EvaluationReport,
    ) -> ScoreResult<()> {
        tenant_config::record(
            store,
            &RiskEvent::EvaluationCompleted {
                tenant_id: report.tenant_id.clone(),
                evaluation_id: report.evaluation_id.clone(),
                as_of: report.as_of.to_string(),
                customers: report.customers.len(),
                buckets: report.buckets,
            },
        )
    }
}
