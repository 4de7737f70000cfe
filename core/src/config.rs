use crate::{
    error::{ScoreError, ScoreResult},
    types::{Score, MAX_SCORE},
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Ticket count (30-day window) at which the full base weight applies.
pub const REPEAT_OFFENDER_THRESHOLD: u32 = 2;

/// Tickets past the threshold that still add increment points.
/// Anything beyond this plateaus.
pub const MAX_INCREMENT_STEPS: u32 = 4;

/// Baseline the external quality signal is normalised against.
pub const QUALITY_BASELINE: f64 = 25.0;

/// Baseline the external behavioral signal is normalised against.
pub const BEHAVIORAL_BASELINE: f64 = 20.0;

// ── Score weights ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub ticket_base_weight: u32,
    pub ticket_increment_weight: u32,
    pub detractor_weight: u32,
    pub quality_weight: u32,
    pub behavioral_weight: u32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            ticket_base_weight: 25,
            ticket_increment_weight: 5,
            detractor_weight: 30,
            quality_weight: 20,
            behavioral_weight: 20,
        }
    }
}

impl ScoreWeights {
    /// Ceiling on the support component: base plus four increments.
    pub fn support_cap(&self) -> u64 {
        self.ticket_base_weight as u64
            + MAX_INCREMENT_STEPS as u64 * self.ticket_increment_weight as u64
    }
}

// ── Bucket thresholds ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketThresholds {
    pub ok_max: Score,
    pub alert_min: Score,
    pub alert_max: Score,
    pub critical_min: Score,
}

impl Default for BucketThresholds {
    fn default() -> Self {
        Self {
            ok_max: 39,
            alert_min: 40,
            alert_max: 69,
            critical_min: 70,
        }
    }
}

impl BucketThresholds {
    /// Cut points must satisfy `ok_max < alert_min <= alert_max < critical_min`.
    pub fn validate(&self) -> ScoreResult<()> {
        let ordered = self.ok_max < self.alert_min
            && self.alert_min <= self.alert_max
            && self.alert_max < self.critical_min;
        if ordered {
            Ok(())
        } else {
            Err(ScoreError::InvalidThresholds {
                ok_max: self.ok_max,
                alert_min: self.alert_min,
                alert_max: self.alert_max,
                critical_min: self.critical_min,
            })
        }
    }
}

// ── Financial bands ────────────────────────────────────────────────

/// Points awarded once a customer is at least `min_days_overdue` late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialBand {
    pub min_days_overdue: u32,
    pub points: u32,
}

/// Step function from days overdue to points. Bands are ordered by
/// `min_days_overdue`; the highest band reached wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FinancialBands {
    pub bands: Vec<FinancialBand>,
}

impl Default for FinancialBands {
    fn default() -> Self {
        let band = |min_days_overdue, points| FinancialBand { min_days_overdue, points };
        Self {
            bands: vec![band(1, 5), band(16, 10), band(31, 20), band(61, 30), band(91, 40)],
        }
    }
}

impl FinancialBands {
    /// Highest points any band can award.
    pub fn max_points(&self) -> u32 {
        self.bands.last().map(|b| b.points).unwrap_or(0)
    }

    /// Bands must start above zero days and rise strictly in both
    /// days and points.
    pub fn validate(&self) -> ScoreResult<()> {
        let invalid = |reason: String| Err(ScoreError::InvalidFinancialBands { reason });

        if let Some(first) = self.bands.first() {
            if first.min_days_overdue == 0 {
                return invalid("first band must start at 1 day overdue or later".into());
            }
            if first.points == 0 {
                return invalid("first band must award at least 1 point".into());
            }
        }
        for pair in self.bands.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if hi.min_days_overdue <= lo.min_days_overdue {
                return invalid(format!(
                    "band thresholds not increasing: {} then {}",
                    lo.min_days_overdue, hi.min_days_overdue
                ));
            }
            if hi.points <= lo.points {
                return invalid(format!(
                    "band points not increasing at {} days: {} then {}",
                    hi.min_days_overdue, lo.points, hi.points
                ));
            }
        }
        Ok(())
    }
}

// ── Tenant configuration ───────────────────────────────────────────

/// Everything a scoring call needs from the tenant. Passed explicitly
/// into every computation; the engine keeps no global config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantScoringConfig {
    pub weights: ScoreWeights,
    pub thresholds: BucketThresholds,
    pub financial_bands: FinancialBands,
}

impl TenantScoringConfig {
    /// Load the tenant-independent defaults from the data/ directory.
    /// In tests, use `TenantScoringConfig::default()`.
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/scoring/tenant_defaults.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: TenantScoringConfig = serde_json::from_str(&content)?;
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid scoring defaults in {path}: {e}"))?;
        Ok(config)
    }

    /// Score reachable when every signal sits at its baseline and every
    /// band is exhausted.
    pub fn max_achievable_score(&self) -> u64 {
        self.weights.support_cap()
            + self.weights.detractor_weight as u64
            + self.financial_bands.max_points() as u64
            + self.weights.quality_weight as u64
            + self.weights.behavioral_weight as u64
    }

    pub fn validate(&self) -> ScoreResult<()> {
        self.thresholds.validate()?;
        self.financial_bands.validate()?;
        let max_score = self.max_achievable_score();
        if max_score > MAX_SCORE as u64 {
            return Err(ScoreError::WeightsExceedCap { max_score, cap: MAX_SCORE });
        }
        Ok(())
    }
}

// ── Config keys ────────────────────────────────────────────────────

/// Keys under which each config section lives in the tenant
/// key-value store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigKey {
    ScoreWeights,
    BucketThresholds,
    FinancialBands,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 3] = [
        ConfigKey::ScoreWeights,
        ConfigKey::BucketThresholds,
        ConfigKey::FinancialBands,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ScoreWeights => "score_weights",
            Self::BucketThresholds => "bucket_thresholds",
            Self::FinancialBands => "financial_bands",
        }
    }
}

impl FromStr for ConfigKey {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ScoreError::UnknownConfigKey { key: s.to_string() })
    }
}
