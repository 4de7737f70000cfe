//! End-to-end evaluation over the SQLite signal feed.

use chrono::{Duration, NaiveDate};
use isp_risk_core::{
    bucket::RiskBucket,
    config::{BucketThresholds, ScoreWeights},
    demo,
    engine::RiskEngine,
    rollup::BucketCounts,
    signal::{CustomerRecord, NpsClassification, RiskSignal},
    source::{SignalSource, StaticSource},
    store::{RiskStore, TicketWindowCounts},
    tenant_config,
};

const TENANT: &str = "acme";

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 1).unwrap()
}

fn days_ago(n: i64) -> NaiveDate {
    as_of() - Duration::days(n)
}

fn tickets(store: &RiskStore, customer: &str, ages: &[i64]) {
    for age in ages {
        let id = format!("{TENANT}-{customer}-{age}");
        store
            .insert_ticket(TENANT, &id, customer, days_ago(*age), None)
            .unwrap();
    }
}

/// Five customers exercising each scoring path:
///
/// | customer | support        | nps       | records            | total |
/// |----------|----------------|-----------|--------------------|-------|
/// | c1       | 3 in 30d → 30  | detractor | ct1: nothing       | 60    |
/// | c2       | 1 in 30d → 8   | none      | none               | 8     |
/// | c3       | 3 in 90d → 10  | none      | ct3: 91 days → 40  | 50    |
/// | c4       | 2 in 90d → 5   | promoter  | none               | 5     |
/// | c5       | none           | detractor | ct-a 40, ct-b 30   | 70    |
fn fixture() -> RiskStore {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = RiskStore::in_memory_migrated().unwrap();

    tickets(&store, "c1", &[1, 5, 10]);
    store.insert_nps_response(TENANT, "c1", Some(3), None, days_ago(20)).unwrap();
    store.upsert_risk_record(TENANT, "c1", "ct1", Some(0), Some(0.0), Some(0.0)).unwrap();

    tickets(&store, "c2", &[5, 40, 50, 60]);

    // 100 days ago is outside both windows; -1 is after as_of.
    tickets(&store, "c3", &[40, 50, 60, 100, -1]);
    store.upsert_risk_record(TENANT, "c3", "ct3", Some(91), None, None).unwrap();

    // Exactly 30 days ago falls in the 90-day window only; exactly 90
    // days ago falls in neither.
    tickets(&store, "c4", &[30, 89, 90]);
    store
        .insert_nps_response(TENANT, "c4", None, Some(NpsClassification::Promoter), days_ago(2))
        .unwrap();

    store.upsert_risk_record(TENANT, "c5", "ct-a", Some(0), Some(25.0), Some(20.0)).unwrap();
    store.upsert_risk_record(TENANT, "c5", "ct-b", Some(61), None, None).unwrap();
    store.insert_nps_response(TENANT, "c5", Some(10), None, days_ago(100)).unwrap();
    store.insert_nps_response(TENANT, "c5", Some(2), None, days_ago(10)).unwrap();
    store.insert_nps_response(TENANT, "c5", Some(10), None, days_ago(-3)).unwrap();

    // Another tenant's activity must never leak in.
    store.insert_ticket("other", "other-c1-1", "c1", days_ago(1), None).unwrap();
    store.insert_ticket("other", "other-c1-2", "c1", days_ago(2), None).unwrap();
    store.upsert_risk_record("other", "c9", "ct9", Some(120), None, None).unwrap();

    store
}

#[test]
fn ticket_windows_are_trailing_and_inclusive_of_as_of() {
    let store = fixture();
    let counts = store.ticket_window_counts(TENANT, None, as_of()).unwrap();

    assert_eq!(counts["c1"], TicketWindowCounts { last_30d: 3, last_90d: 3 });
    assert_eq!(counts["c2"], TicketWindowCounts { last_30d: 1, last_90d: 4 });
    assert_eq!(counts["c3"], TicketWindowCounts { last_30d: 0, last_90d: 3 });
    assert_eq!(counts["c4"], TicketWindowCounts { last_30d: 0, last_90d: 2 });
    assert!(!counts.contains_key("c5"));
}

#[test]
fn latest_nps_answer_wins_and_future_answers_are_ignored() {
    let store = fixture();
    let nps = store.latest_nps_classifications(TENANT, None, as_of()).unwrap();

    assert_eq!(nps["c1"], NpsClassification::Detractor);
    assert_eq!(nps["c4"], NpsClassification::Promoter);
    assert_eq!(nps["c5"], NpsClassification::Detractor);
    assert!(!nps.contains_key("c2"));
}

#[test]
fn records_cover_contracts_and_signal_only_customers() {
    let store = fixture();
    let records = store.fetch_records(TENANT, None, as_of()).unwrap();

    let mut keys: Vec<(String, Option<String>)> = records
        .iter()
        .map(|r| (r.customer_id.clone(), r.contract_id.clone()))
        .collect();
    keys.sort();
    assert_eq!(
        keys,
        vec![
            ("c1".to_string(), Some("ct1".to_string())),
            ("c2".to_string(), None),
            ("c3".to_string(), Some("ct3".to_string())),
            ("c4".to_string(), None),
            ("c5".to_string(), Some("ct-a".to_string())),
            ("c5".to_string(), Some("ct-b".to_string())),
        ]
    );

    let c3 = records.iter().find(|r| r.customer_id == "c3").unwrap();
    assert_eq!(c3.signal.days_overdue, 91);
    assert_eq!(c3.signal.quality_raw_score, 0.0);
}

#[test]
fn tenant_evaluation_scores_and_ranks_every_customer() {
    let store = fixture();
    let engine = RiskEngine::for_tenant(&store, TENANT).unwrap();
    let report = engine.evaluate(&store, as_of()).unwrap();

    let ranked: Vec<(&str, u32, RiskBucket)> = report
        .customers
        .iter()
        .map(|c| (c.customer_id.as_str(), c.score, c.bucket))
        .collect();
    assert_eq!(
        ranked,
        vec![
            ("c5", 70, RiskBucket::Critical),
            ("c1", 60, RiskBucket::Alert),
            ("c3", 50, RiskBucket::Alert),
            ("c2", 8, RiskBucket::Ok),
            ("c4", 5, RiskBucket::Ok),
        ]
    );
    assert_eq!(report.buckets, BucketCounts { ok: 2, alert: 2, critical: 1 });
    assert_eq!(report.tenant_id, TENANT);
    assert_eq!(report.as_of, as_of());
    assert!(!report.evaluation_id.is_empty());

    let c5 = report.customer("c5").unwrap();
    assert_eq!(c5.record_count, 2);
    assert_eq!(c5.riskiest_contract.as_deref(), Some("ct-a"));
    assert_eq!(report.top(2).len(), 2);
    assert_eq!(report.top(50).len(), 5);
}

#[test]
fn single_customer_evaluation() {
    let store = fixture();
    let engine = RiskEngine::for_tenant(&store, TENANT).unwrap();

    let c5 = engine.evaluate_customer(&store, "c5", as_of()).unwrap().unwrap();
    assert_eq!(c5.score, 70);
    assert_eq!(c5.breakdown.nps, 30);
    assert_eq!(c5.breakdown.quality, 20);
    assert_eq!(c5.breakdown.behavioral, 20);

    let c2 = engine.evaluate_customer(&store, "c2", as_of()).unwrap().unwrap();
    assert_eq!(c2.score, 8);
    assert_eq!(c2.riskiest_contract, None);

    assert!(engine.evaluate_customer(&store, "nobody", as_of()).unwrap().is_none());
}

#[test]
fn engine_keeps_its_config_snapshot() {
    let store = fixture();
    let before = RiskEngine::for_tenant(&store, TENANT).unwrap();

    tenant_config::save_thresholds(
        &store,
        TENANT,
        BucketThresholds { ok_max: 29, alert_min: 30, alert_max: 54, critical_min: 55 },
    )
    .unwrap();

    let old = before.evaluate(&store, as_of()).unwrap();
    assert_eq!(old.customer("c1").unwrap().bucket, RiskBucket::Alert);

    let after = RiskEngine::for_tenant(&store, TENANT).unwrap();
    let new = after.evaluate(&store, as_of()).unwrap();
    assert_eq!(new.customer("c1").unwrap().bucket, RiskBucket::Critical);
    assert_eq!(new.customer("c3").unwrap().bucket, RiskBucket::Alert);
}

#[test]
fn scores_follow_the_current_weights() {
    let store = fixture();
    tenant_config::save_weights(
        &store,
        TENANT,
        ScoreWeights { detractor_weight: 0, ..ScoreWeights::default() },
    )
    .unwrap();

    let engine = RiskEngine::for_tenant(&store, TENANT).unwrap();
    let c1 = engine.evaluate_customer(&store, "c1", as_of()).unwrap().unwrap();
    assert_eq!(c1.score, 30);
    assert_eq!(c1.bucket, RiskBucket::Ok);
}

#[test]
fn completed_evaluations_are_logged() {
    let store = fixture();
    let engine = RiskEngine::for_tenant(&store, TENANT).unwrap();
    let report = engine.evaluate(&store, as_of()).unwrap();
    engine.record_evaluation(&store, &report).unwrap();

    assert_eq!(store.event_count(TENANT, "evaluation_completed").unwrap(), 1);
    assert_eq!(store.event_count("other", "evaluation_completed").unwrap(), 0);
}

#[test]
fn static_source_filters_by_tenant_and_customer() {
    let signal = RiskSignal { ticket_count_30d: 2, ..Default::default() };
    let source = StaticSource::new()
        .with_record(
            "a",
            CustomerRecord { customer_id: "x".into(), contract_id: None, signal },
        )
        .with_record(
            "a",
            CustomerRecord { customer_id: "y".into(), contract_id: None, signal: RiskSignal::default() },
        )
        .with_record(
            "b",
            CustomerRecord { customer_id: "x".into(), contract_id: None, signal },
        );

    let engine = RiskEngine::new("a", Default::default());
    let report = engine.evaluate(&source, as_of()).unwrap();
    assert_eq!(report.customers.len(), 2);
    assert_eq!(report.customers[0].customer_id, "x");
    assert_eq!(report.customers[0].score, 25);

    let only_y = source.fetch_records("a", Some("y"), as_of()).unwrap();
    assert_eq!(only_y.len(), 1);
}

#[test]
fn demo_tenant_is_deterministic() {
    let seed_and_score = |seed: u64| {
        let store = RiskStore::in_memory_migrated().unwrap();
        let summary = demo::seed_demo_tenant(&store, "demo", seed, 60, as_of()).unwrap();
        assert_eq!(summary.customers, 60);
        assert_eq!(store.risk_record_count("demo").unwrap(), summary.contracts as i64);
        assert_eq!(store.ticket_count("demo").unwrap(), summary.tickets as i64);

        let engine = RiskEngine::for_tenant(&store, "demo").unwrap();
        engine.evaluate(&store, as_of()).unwrap()
    };

    let a = seed_and_score(7);
    let b = seed_and_score(7);

    assert_eq!(a.customers.len(), 60);
    assert_eq!(a.customers, b.customers);
    assert_eq!(a.buckets.total(), 60);
    assert!(a.customers.iter().all(|c| c.score <= 155));
    assert_eq!(demo::customer_id(3), "cli-00003");
}
