//! Score calculator: pure functions from a `RiskSignal` plus tenant
//! configuration to a bounded integer risk score.
//!
//! Rounding is half-away-from-zero throughout. The fractional ticket
//! fallbacks are computed with exact integer arithmetic; the raw
//! quality/behavioral rescaling goes through `f64::round`.

use crate::{
    config::{
        FinancialBands, ScoreWeights, TenantScoringConfig, BEHAVIORAL_BASELINE,
        QUALITY_BASELINE, REPEAT_OFFENDER_THRESHOLD,
    },
    signal::{NpsClassification, RiskSignal},
    types::{Score, MAX_SCORE},
};
use serde::{Deserialize, Serialize};

/// Per-component contributions behind a total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub support: Score,
    pub nps: Score,
    pub financial: Score,
    pub quality: Score,
    pub behavioral: Score,
    pub total: Score,
}

/// Support-ticket component.
///
/// The 30-day count takes precedence: any recent ticket decides the
/// outcome and the 90-day count is only consulted when the 30-day
/// window is empty. Every branch is capped at `base + 4 * increment`.
pub fn compute_support_score(
    ticket_count_30d: u32,
    ticket_count_90d: u32,
    weights: &ScoreWeights,
) -> Score {
    let base = weights.ticket_base_weight;

    let raw: u64 = if ticket_count_30d >= REPEAT_OFFENDER_THRESHOLD {
        let extra = (ticket_count_30d - REPEAT_OFFENDER_THRESHOLD) as u64;
        (base as u64).saturating_add(extra.saturating_mul(weights.ticket_increment_weight as u64))
    } else if ticket_count_30d == 1 {
        round_percent(base, 32)
    } else if ticket_count_90d >= 3 {
        round_percent(base, 40)
    } else if ticket_count_90d >= 1 {
        round_percent(base, 20)
    } else {
        0
    };

    saturate(raw.min(weights.support_cap()))
}

/// Only detractors contribute; promoters earn no discount.
pub fn compute_nps_score(classification: NpsClassification, weights: &ScoreWeights) -> Score {
    match classification {
        NpsClassification::Detractor => weights.detractor_weight,
        _ => 0,
    }
}

/// Step function over days overdue: the highest band reached wins.
pub fn compute_financial_score(days_overdue: u32, bands: &FinancialBands) -> Score {
    bands
        .bands
        .iter()
        .take_while(|band| days_overdue >= band.min_days_overdue)
        .last()
        .map(|band| band.points)
        .unwrap_or(0)
}

pub fn compute_quality_score(quality_raw_score: f64, weights: &ScoreWeights) -> Score {
    rescale(quality_raw_score, QUALITY_BASELINE, weights.quality_weight)
}

pub fn compute_behavioral_score(behavioral_raw_score: f64, weights: &ScoreWeights) -> Score {
    rescale(behavioral_raw_score, BEHAVIORAL_BASELINE, weights.behavioral_weight)
}

/// Every component plus the clamped total.
pub fn compute_breakdown(signal: &RiskSignal, config: &TenantScoringConfig) -> ScoreBreakdown {
    let weights = &config.weights;

    let support =
        compute_support_score(signal.ticket_count_30d, signal.ticket_count_90d, weights);
    let nps = compute_nps_score(signal.nps_classification, weights);
    let financial = compute_financial_score(signal.days_overdue, &config.financial_bands);
    let quality = compute_quality_score(signal.quality_raw_score, weights);
    let behavioral = compute_behavioral_score(signal.behavioral_raw_score, weights);

    let sum = [support, nps, financial, quality, behavioral]
        .iter()
        .map(|&c| c as u64)
        .sum::<u64>();

    ScoreBreakdown {
        support,
        nps,
        financial,
        quality,
        behavioral,
        total: sum.min(MAX_SCORE as u64) as Score,
    }
}

/// The authoritative risk score for one record, always in `0..=500`.
/// Consumers must call this rather than trust any previously stored
/// score, which may predate the current weights or ticket counts.
pub fn compute_total_score(signal: &RiskSignal, config: &TenantScoringConfig) -> Score {
    compute_breakdown(signal, config).total
}

/// `round(value * percent / 100)` in integers, halves rounded up.
fn round_percent(value: u32, percent: u64) -> u64 {
    (value as u64 * percent * 2 + 100) / 200
}

fn rescale(raw: f64, baseline: f64, weight: u32) -> Score {
    if !raw.is_finite() || raw <= 0.0 {
        return 0;
    }
    // Float-to-int `as` saturates at the target bounds.
    ((raw / baseline) * weight as f64).round() as Score
}

fn saturate(value: u64) -> Score {
    Score::try_from(value).unwrap_or(Score::MAX)
}
