use super::RiskStore;
use crate::{
    error::ScoreResult,
    signal::{CustomerRecord, NpsClassification, RiskSignal, SignalInputs},
};
use chrono::NaiveDate;
use rusqlite::params;
use std::collections::{BTreeMap, BTreeSet};

/// Ticket counts for the trailing windows ending at `as_of` (inclusive).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TicketWindowCounts {
    pub last_30d: i64,
    pub last_90d: i64,
}

struct RiskStatusRow {
    customer_id: String,
    contract_id: String,
    days_overdue: Option<i64>,
    quality_raw_score: Option<f64>,
    behavioral_raw_score: Option<f64>,
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

impl RiskStore {
    // ── Signal feed: writes ────────────────────────────────────

    pub fn insert_ticket(
        &self,
        tenant_id: &str,
        ticket_id: &str,
        customer_id: &str,
        opened_on: NaiveDate,
        subject: Option<&str>,
    ) -> ScoreResult<()> {
        self.conn.execute(
            "INSERT INTO support_ticket (ticket_id, tenant_id, customer_id, opened_on, subject)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![ticket_id, tenant_id, customer_id, iso(opened_on), subject],
        )?;
        Ok(())
    }

    /// Record an NPS answer. `classification` overrides the one derived
    /// from `rating` when the survey tool already supplied it.
    pub fn insert_nps_response(
        &self,
        tenant_id: &str,
        customer_id: &str,
        rating: Option<i64>,
        classification: Option<NpsClassification>,
        responded_on: NaiveDate,
    ) -> ScoreResult<()> {
        self.conn.execute(
            "INSERT INTO nps_response (tenant_id, customer_id, rating, classification, responded_on)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                tenant_id,
                customer_id,
                rating,
                classification.map(|c| c.as_str()),
                iso(responded_on),
            ],
        )?;
        Ok(())
    }

    pub fn upsert_risk_record(
        &self,
        tenant_id: &str,
        customer_id: &str,
        contract_id: &str,
        days_overdue: Option<i64>,
        quality_raw_score: Option<f64>,
        behavioral_raw_score: Option<f64>,
    ) -> ScoreResult<()> {
        self.conn.execute(
            "INSERT INTO customer_risk_record (
                tenant_id, customer_id, contract_id,
                days_overdue, quality_raw_score, behavioral_raw_score
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(tenant_id, contract_id) DO UPDATE SET
                customer_id          = excluded.customer_id,
                days_overdue         = excluded.days_overdue,
                quality_raw_score    = excluded.quality_raw_score,
                behavioral_raw_score = excluded.behavioral_raw_score",
            params![
                tenant_id,
                customer_id,
                contract_id,
                days_overdue,
                quality_raw_score,
                behavioral_raw_score,
            ],
        )?;
        Ok(())
    }

    // ── Signal feed: reads ─────────────────────────────────────

    pub fn ticket_window_counts(
        &self,
        tenant_id: &str,
        customer_id: Option<&str>,
        as_of: NaiveDate,
    ) -> ScoreResult<BTreeMap<String, TicketWindowCounts>> {
        let mut stmt = self.conn.prepare(
            "SELECT customer_id,
                    COALESCE(SUM(opened_on > date(?2, '-30 days')), 0),
                    COUNT(*)
             FROM support_ticket
             WHERE tenant_id = ?1
               AND opened_on > date(?2, '-90 days')
               AND opened_on <= ?2
               AND (?3 IS NULL OR customer_id = ?3)
             GROUP BY customer_id",
        )?;
        let counts = stmt
            .query_map(params![tenant_id, iso(as_of), customer_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    TicketWindowCounts {
                        last_30d: row.get(1)?,
                        last_90d: row.get(2)?,
                    },
                ))
            })?
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(counts)
    }

    /// Most recent NPS classification per customer, answered on or
    /// before `as_of`.
    pub fn latest_nps_classifications(
        &self,
        tenant_id: &str,
        customer_id: Option<&str>,
        as_of: NaiveDate,
    ) -> ScoreResult<BTreeMap<String, NpsClassification>> {
        let mut stmt = self.conn.prepare(
            "SELECT customer_id, rating, classification
             FROM nps_response
             WHERE tenant_id = ?1
               AND responded_on <= ?2
               AND (?3 IS NULL OR customer_id = ?3)
             ORDER BY customer_id ASC, responded_on DESC, response_id DESC",
        )?;
        let rows = stmt
            .query_map(params![tenant_id, iso(as_of), customer_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<i64>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut latest = BTreeMap::new();
        for (customer, rating, label) in rows {
            // Rows arrive newest first per customer; keep the first one.
            latest.entry(customer).or_insert_with(|| match (label, rating) {
                (Some(label), _) => NpsClassification::from_label(&label),
                (None, Some(rating)) => NpsClassification::from_rating(rating),
                (None, None) => NpsClassification::Unknown,
            });
        }
        Ok(latest)
    }

    fn risk_status_rows(
        &self,
        tenant_id: &str,
        customer_id: Option<&str>,
    ) -> ScoreResult<Vec<RiskStatusRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT customer_id, contract_id, days_overdue,
                    quality_raw_score, behavioral_raw_score
             FROM customer_risk_record
             WHERE tenant_id = ?1 AND (?2 IS NULL OR customer_id = ?2)
             ORDER BY customer_id ASC, contract_id ASC",
        )?;
        let rows = stmt
            .query_map(params![tenant_id, customer_id], |row| {
                Ok(RiskStatusRow {
                    customer_id: row.get(0)?,
                    contract_id: row.get(1)?,
                    days_overdue: row.get(2)?,
                    quality_raw_score: row.get(3)?,
                    behavioral_raw_score: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Assemble scoreable records for a tenant (or one customer).
    ///
    /// Each contract's risk-status row becomes one record carrying the
    /// customer's ticket counts and latest NPS class. Customers with
    /// tickets or NPS answers but no risk-status row still get a single
    /// contract-less record.
    pub fn customer_records(
        &self,
        tenant_id: &str,
        customer_id: Option<&str>,
        as_of: NaiveDate,
    ) -> ScoreResult<Vec<CustomerRecord>> {
        let tickets = self.ticket_window_counts(tenant_id, customer_id, as_of)?;
        let nps = self.latest_nps_classifications(tenant_id, customer_id, as_of)?;
        let status_rows = self.risk_status_rows(tenant_id, customer_id)?;

        let base_inputs = |customer: &str| {
            let counts = tickets.get(customer).copied().unwrap_or_default();
            SignalInputs {
                ticket_count_30d: Some(counts.last_30d),
                ticket_count_90d: Some(counts.last_90d),
                nps_classification: nps.get(customer).copied(),
                ..Default::default()
            }
        };

        let mut records = Vec::with_capacity(status_rows.len());
        let mut covered = BTreeSet::new();

        for row in status_rows {
            let inputs = SignalInputs {
                days_overdue: row.days_overdue,
                quality_raw_score: row.quality_raw_score,
                behavioral_raw_score: row.behavioral_raw_score,
                ..base_inputs(row.customer_id.as_str())
            };
            records.push(CustomerRecord {
                signal: RiskSignal::from_inputs(&inputs),
                contract_id: Some(row.contract_id),
                customer_id: row.customer_id.clone(),
            });
            covered.insert(row.customer_id);
        }

        let signal_only: BTreeSet<&String> = tickets
            .keys()
            .chain(nps.keys())
            .filter(|c| !covered.contains(*c))
            .collect();
        for customer in signal_only {
            records.push(CustomerRecord {
                customer_id: customer.clone(),
                contract_id: None,
                signal: RiskSignal::from_inputs(&base_inputs(customer.as_str())),
            });
        }

        Ok(records)
    }

    pub fn ticket_count(&self, tenant_id: &str) -> ScoreResult<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM support_ticket WHERE tenant_id = ?1",
                params![tenant_id],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    pub fn risk_record_count(&self, tenant_id: &str) -> ScoreResult<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM customer_risk_record WHERE tenant_id = ?1",
                params![tenant_id],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }
}
