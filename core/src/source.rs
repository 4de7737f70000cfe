//! Signal source seam.
//!
//! The engine never reaches into storage directly: it asks a
//! `SignalSource` for the records of a tenant as of a given date.
//! `RiskStore` is the production source; `StaticSource` serves
//! signals that were fetched or built elsewhere.

use crate::{
    error::ScoreResult,
    signal::CustomerRecord,
    store::RiskStore,
    types::TenantId,
};
use chrono::NaiveDate;

pub trait SignalSource {
    /// Records for every customer of `tenant_id`, or only `customer_id`
    /// when given. Windows (30/90-day ticket counts, latest NPS) are
    /// evaluated relative to `as_of`.
    fn fetch_records(
        &self,
        tenant_id: &str,
        customer_id: Option<&str>,
        as_of: NaiveDate,
    ) -> ScoreResult<Vec<CustomerRecord>>;
}

impl SignalSource for RiskStore {
    fn fetch_records(
        &self,
        tenant_id: &str,
        customer_id: Option<&str>,
        as_of: NaiveDate,
    ) -> ScoreResult<Vec<CustomerRecord>> {
        self.customer_records(tenant_id, customer_id, as_of)
    }
}

/// Pre-built records keyed by tenant. `as_of` is ignored: the signals
/// were already windowed when they were built.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Vec<(TenantId, CustomerRecord)>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, tenant_id: &str, record: CustomerRecord) -> Self {
        self.push(tenant_id, record);
        self
    }

    pub fn push(&mut self, tenant_id: &str, record: CustomerRecord) {
        self.records.push((tenant_id.to_string(), record));
    }
}

impl SignalSource for StaticSource {
    fn fetch_records(
        &self,
        tenant_id: &str,
        customer_id: Option<&str>,
        _as_of: NaiveDate,
    ) -> ScoreResult<Vec<CustomerRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|(tenant, _)| tenant == tenant_id)
            .filter(|(_, r)| customer_id.map_or(true, |c| r.customer_id == c))
            .map(|(_, r)| r.clone())
            .collect())
    }
}
