//! Customer-level rollup.
//!
//! A customer with several contracts is only as safe as the riskiest
//! one: the representative score is the maximum across their records,
//! and that maximum is what gets classified.

use crate::{
    bucket::{classify, RiskBucket},
    config::TenantScoringConfig,
    scoring::{compute_breakdown, ScoreBreakdown},
    signal::CustomerRecord,
    types::{ContractId, CustomerId, Score},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRisk {
    pub customer_id: CustomerId,
    pub score: Score,
    pub bucket: RiskBucket,
    pub record_count: usize,
    /// Contract whose record produced the representative score.
    pub riskiest_contract: Option<ContractId>,
    pub breakdown: ScoreBreakdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BucketCounts {
    pub ok: usize,
    pub alert: usize,
    pub critical: usize,
}

impl BucketCounts {
    pub fn add(&mut self, bucket: RiskBucket) {
        match bucket {
            RiskBucket::Ok => self.ok += 1,
            RiskBucket::Alert => self.alert += 1,
            RiskBucket::Critical => self.critical += 1,
        }
    }

    pub fn get(&self, bucket: RiskBucket) -> usize {
        match bucket {
            RiskBucket::Ok => self.ok,
            RiskBucket::Alert => self.alert,
            RiskBucket::Critical => self.critical,
        }
    }

    pub fn total(&self) -> usize {
        self.ok + self.alert + self.critical
    }
}

impl FromIterator<RiskBucket> for BucketCounts {
    fn from_iter<I: IntoIterator<Item = RiskBucket>>(iter: I) -> Self {
        let mut counts = BucketCounts::default();
        for bucket in iter {
            counts.add(bucket);
        }
        counts
    }
}

/// Maximum of a customer's record scores, or `None` with no records.
pub fn representative_score<I>(scores: I) -> Option<Score>
where
    I: IntoIterator<Item = Score>,
{
    scores.into_iter().max()
}

/// Score every record and collapse to one entry per customer, sorted
/// by descending score (ties broken by customer id).
pub fn rollup_records(
    records: &[CustomerRecord],
    config: &TenantScoringConfig,
) -> Vec<CustomerRisk> {
    let mut by_customer: BTreeMap<&str, CustomerRisk> = BTreeMap::new();

    for record in records {
        let breakdown = compute_breakdown(&record.signal, config);
        log::debug!(
            "rollup: customer={} contract={:?} score={}",
            record.customer_id,
            record.contract_id,
            breakdown.total,
        );

        let entry = by_customer
            .entry(record.customer_id.as_str())
            .or_insert_with(|| CustomerRisk {
                customer_id: record.customer_id.clone(),
                score: breakdown.total,
                bucket: RiskBucket::Ok,
                record_count: 0,
                riskiest_contract: record.contract_id.clone(),
                breakdown,
            });

        entry.record_count += 1;
        if breakdown.total > entry.score {
            entry.score = breakdown.total;
            entry.riskiest_contract = record.contract_id.clone();
            entry.breakdown = breakdown;
        }
    }

    let mut customers: Vec<CustomerRisk> = by_customer
        .into_values()
        .map(|mut c| {
            c.bucket = classify(c.score, &config.thresholds);
            c
        })
        .collect();

    customers.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.customer_id.cmp(&b.customer_id))
    });
    customers
}
