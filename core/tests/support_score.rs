//! Support-ticket component: thresholds, precedence and the plateau.

use isp_risk_core::{
    config::ScoreWeights,
    rng::StreamRng,
    scoring::compute_support_score,
};

fn defaults() -> ScoreWeights {
    ScoreWeights::default()
}

#[test]
fn repeat_offender_threshold_awards_exactly_the_base_weight() {
    let mut rng = StreamRng::new(0x5EED, 0);
    for _ in 0..200 {
        let weights = ScoreWeights {
            ticket_base_weight: rng.range_inclusive(0, 100) as u32,
            ticket_increment_weight: rng.range_inclusive(0, 30) as u32,
            ..defaults()
        };
        let t90 = rng.range_inclusive(0, 50) as u32;
        assert_eq!(
            compute_support_score(2, t90, &weights),
            weights.ticket_base_weight,
            "weights={weights:?} t90={t90}"
        );
    }
}

#[test]
fn fractional_fallbacks_with_default_weights() {
    let w = defaults();
    assert_eq!(compute_support_score(1, 0, &w), 8); // round(25 * 0.32)
    assert_eq!(compute_support_score(0, 3, &w), 10); // round(25 * 0.4)
    assert_eq!(compute_support_score(0, 1, &w), 5); // round(25 * 0.2)
    assert_eq!(compute_support_score(0, 2, &w), 5);
    assert_eq!(compute_support_score(0, 0, &w), 0);
}

#[test]
fn single_recent_ticket_ignores_the_ninety_day_count() {
    let w = defaults();
    // Three or more older tickets would score 10 on their own, but a
    // single ticket in the last 30 days decides the outcome.
    assert_eq!(compute_support_score(1, 3, &w), 8);
    assert_eq!(compute_support_score(1, 40, &w), 8);
}

#[test]
fn increments_then_plateau_at_base_plus_four_increments() {
    let w = defaults();
    let expected = [(2, 25), (3, 30), (4, 35), (5, 40), (6, 45), (7, 45), (50, 45)];
    for (t30, score) in expected {
        assert_eq!(compute_support_score(t30, 0, &w), score, "t30={t30}");
    }
    assert_eq!(compute_support_score(u32::MAX, u32::MAX, &w), 45);
}

#[test]
fn support_score_is_monotone_until_the_cap() {
    let mut rng = StreamRng::new(0xC0FFEE, 1);
    for _ in 0..100 {
        let weights = ScoreWeights {
            ticket_base_weight: rng.range_inclusive(0, 200) as u32,
            ticket_increment_weight: rng.range_inclusive(0, 60) as u32,
            ..defaults()
        };
        let cap = weights.support_cap() as u32;
        let mut previous = compute_support_score(2, 0, &weights);
        for t30 in 3..30u32 {
            let score = compute_support_score(t30, 0, &weights);
            assert!(score >= previous, "t30={t30} dropped from {previous} to {score}");
            assert!(score <= cap, "t30={t30} score {score} above cap {cap}");
            if t30 >= 6 {
                assert_eq!(score, cap, "t30={t30} should sit on the plateau");
            }
            previous = score;
        }
    }
}

#[test]
fn zero_weights_score_nothing() {
    let w = ScoreWeights {
        ticket_base_weight: 0,
        ticket_increment_weight: 0,
        ..defaults()
    };
    for (t30, t90) in [(0, 0), (0, 5), (1, 0), (2, 2), (9, 9)] {
        assert_eq!(compute_support_score(t30, t90, &w), 0);
    }
}
