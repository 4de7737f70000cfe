//! Deterministic demo tenant.
//!
//! Populates the signal tables with a synthetic ISP customer base so the
//! runner and the integration tests have something realistic to score.
//! The same seed always yields the same rows.

use crate::{
    error::ScoreResult,
    rng::{Stream, StreamRng},
    store::RiskStore,
};
use chrono::{Duration, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DemoSummary {
    pub customers: usize,
    pub contracts: usize,
    pub tickets: usize,
    pub nps_responses: usize,
}

pub fn customer_id(index: usize) -> String {
    format!("cli-{index:05}")
}

/// Seed `customers` synthetic customers for `tenant_id`, with activity
/// spread over the 120 days leading up to `as_of`.
pub fn seed_demo_tenant(
    store: &RiskStore,
    tenant_id: &str,
    seed: u64,
    customers: usize,
    as_of: NaiveDate,
) -> ScoreResult<DemoSummary> {
    let mut contracts_rng = StreamRng::for_stream(seed, Stream::Contracts);
    let mut tickets_rng = StreamRng::for_stream(seed, Stream::Tickets);
    let mut nps_rng = StreamRng::for_stream(seed, Stream::Nps);
    let mut status_rng = StreamRng::for_stream(seed, Stream::RiskStatus);

    let mut summary = DemoSummary {
        customers,
        ..Default::default()
    };

    for index in 0..customers {
        let customer = customer_id(index);

        // Most customers hold one plan; some add a second line.
        let contract_count = if contracts_rng.chance(0.2) { 2 } else { 1 };
        for n in 0..contract_count {
            let contract = format!("{customer}-ct{n}");
            let days_overdue = if status_rng.chance(0.7) {
                0
            } else {
                status_rng.range_inclusive(1, 120)
            };
            let quality = status_rng.next_f64() * 25.0;
            let behavioral = status_rng.next_f64() * 20.0;
            store.upsert_risk_record(
                tenant_id,
                &customer,
                &contract,
                Some(days_overdue),
                Some((quality * 10.0).round() / 10.0),
                Some((behavioral * 10.0).round() / 10.0),
            )?;
            summary.contracts += 1;
        }

        // Skewed toward few tickets; a small tail of repeat callers.
        let ticket_count = match tickets_rng.next_u64_below(100) {
            0..=44 => 0,
            45..=69 => 1,
            70..=84 => 2,
            85..=94 => 3,
            _ => tickets_rng.range_inclusive(4, 9),
        };
        for t in 0..ticket_count {
            let days_ago = tickets_rng.range_inclusive(0, 119);
            store.insert_ticket(
                tenant_id,
                &format!("{tenant_id}-{customer}-tk{t}"),
                &customer,
                as_of - Duration::days(days_ago),
                Some("sem conexão"),
            )?;
            summary.tickets += 1;
        }

        if nps_rng.chance(0.6) {
            let rating = nps_rng.range_inclusive(0, 10);
            let days_ago = nps_rng.range_inclusive(0, 180);
            store.insert_nps_response(
                tenant_id,
                &customer,
                Some(rating),
                None,
                as_of - Duration::days(days_ago),
            )?;
            summary.nps_responses += 1;
        }
    }

    log::info!(
        "tenant={tenant_id} demo: seeded {} customers, {} contracts, {} tickets, {} nps responses",
        summary.customers,
        summary.contracts,
        summary.tickets,
        summary.nps_responses,
    );
    Ok(summary)
}
