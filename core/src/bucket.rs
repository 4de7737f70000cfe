//! Bucket classifier: maps a total score onto the three ordinal tiers.

use crate::{
    config::{BucketThresholds, TenantScoringConfig},
    scoring::compute_total_score,
    signal::RiskSignal,
    types::Score,
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBucket {
    Ok,
    Alert,
    Critical,
}

impl RiskBucket {
    pub const ALL: [RiskBucket; 3] = [RiskBucket::Ok, RiskBucket::Alert, RiskBucket::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Alert => "alert",
            Self::Critical => "critical",
        }
    }

    /// Label shown on the operator dashboard.
    pub fn dashboard_label(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Alert => "ALERTA",
            Self::Critical => "CRÍTICO",
        }
    }
}

impl fmt::Display for RiskBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dashboard_label())
    }
}

/// CRITICAL is tested first so a misconfigured `alert_min` above
/// `critical_min` still lets high scores land in CRITICAL.
pub fn classify(score: Score, thresholds: &BucketThresholds) -> RiskBucket {
    if score >= thresholds.critical_min {
        RiskBucket::Critical
    } else if score >= thresholds.alert_min {
        RiskBucket::Alert
    } else {
        RiskBucket::Ok
    }
}

/// Score plus tier. Derived on every read, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskScoreResult {
    pub score: Score,
    pub bucket: RiskBucket,
}

impl RiskScoreResult {
    pub fn from_score(score: Score, thresholds: &BucketThresholds) -> Self {
        Self { score, bucket: classify(score, thresholds) }
    }
}

/// Score and classify a single signal.
pub fn evaluate_signal(signal: &RiskSignal, config: &TenantScoringConfig) -> RiskScoreResult {
    RiskScoreResult::from_score(compute_total_score(signal, config), &config.thresholds)
}
