//! Raw per-customer inputs to scoring.
//!
//! Signals are rebuilt on every evaluation from externally fetched
//! records and never persisted by the engine. Missing fields degrade to
//! zero; negative counts are clamped rather than rejected.

use crate::types::{ContractId, CustomerId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NpsClassification {
    Promoter,
    Neutral,
    Detractor,
    #[default]
    Unknown,
}

impl NpsClassification {
    /// Classify a 0–10 survey rating. Out-of-range ratings are Unknown.
    pub fn from_rating(rating: i64) -> Self {
        match rating {
            0..=6 => Self::Detractor,
            7..=8 => Self::Neutral,
            9..=10 => Self::Promoter,
            _ => Self::Unknown,
        }
    }

    /// Parse a stored classification label. Accepts the English labels
    /// and the Portuguese ones the survey tool exports.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "promoter" | "promotor" => Self::Promoter,
            "neutral" | "neutro" | "passive" => Self::Neutral,
            "detractor" | "detrator" => Self::Detractor,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Promoter => "promoter",
            Self::Neutral => "neutral",
            Self::Detractor => "detractor",
            Self::Unknown => "unknown",
        }
    }
}

/// Validated scoring inputs for one customer record.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskSignal {
    pub ticket_count_30d: u32,
    pub ticket_count_90d: u32,
    pub nps_classification: NpsClassification,
    pub days_overdue: u32,
    pub quality_raw_score: f64,
    pub behavioral_raw_score: f64,
}

/// Signal fields as they arrive from external storage: any may be
/// absent, and nothing guarantees they are non-negative.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalInputs {
    pub ticket_count_30d: Option<i64>,
    pub ticket_count_90d: Option<i64>,
    pub nps_classification: Option<NpsClassification>,
    pub days_overdue: Option<i64>,
    pub quality_raw_score: Option<f64>,
    pub behavioral_raw_score: Option<f64>,
}

impl RiskSignal {
    pub fn from_inputs(inputs: &SignalInputs) -> Self {
        Self {
            ticket_count_30d: non_negative_count("ticket_count_30d", inputs.ticket_count_30d),
            ticket_count_90d: non_negative_count("ticket_count_90d", inputs.ticket_count_90d),
            nps_classification: inputs.nps_classification.unwrap_or_default(),
            days_overdue: non_negative_count("days_overdue", inputs.days_overdue),
            quality_raw_score: non_negative_raw("quality_raw_score", inputs.quality_raw_score),
            behavioral_raw_score: non_negative_raw(
                "behavioral_raw_score",
                inputs.behavioral_raw_score,
            ),
        }
    }
}

fn non_negative_count(field: &str, value: Option<i64>) -> u32 {
    match value {
        None => 0,
        Some(v) if v < 0 => {
            log::warn!("signal: {field}={v} is negative, clamped to 0");
            0
        }
        Some(v) => u32::try_from(v).unwrap_or(u32::MAX),
    }
}

fn non_negative_raw(field: &str, value: Option<f64>) -> f64 {
    match value {
        None => 0.0,
        Some(v) if !v.is_finite() => {
            log::warn!("signal: {field} is not finite, treated as 0");
            0.0
        }
        Some(v) if v < 0.0 => {
            log::warn!("signal: {field}={v} is negative, clamped to 0");
            0.0
        }
        Some(v) => v,
    }
}

/// One scoreable record. Customers holding several contracts produce
/// one record per contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: CustomerId,
    pub contract_id: Option<ContractId>,
    pub signal: RiskSignal,
}
