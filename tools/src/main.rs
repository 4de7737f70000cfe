//! risk-runner: headless churn-risk evaluator.
//!
//! Usage:
//!   risk-runner --tenant acme --db risk.db --as-of 2026-10-01
//!   risk-runner --tenant demo --seed-demo 200 --seed 7
//!   risk-runner --tenant acme --db risk.db --ipc-mode

use anyhow::{Context, Result};
use chrono::NaiveDate;
use isp_risk_core::{
    bucket::RiskBucket,
    config::{ConfigKey, TenantScoringConfig},
    demo,
    engine::{EvaluationReport, RiskEngine},
    store::RiskStore,
    tenant_config,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetConfig,
    SaveWeights { value: serde_json::Value },
    SaveThresholds { value: serde_json::Value },
    SaveFinancialBands { value: serde_json::Value },
    ResetConfig,
    Evaluate {
        #[serde(default)]
        limit: Option<usize>,
    },
    EvaluateCustomer { customer_id: String },
    Quit,
}

struct RunnerContext {
    store: RiskStore,
    tenant_id: String,
    as_of: NaiveDate,
    defaults: TenantScoringConfig,
}

impl RunnerContext {
    fn engine(&self) -> Result<RiskEngine> {
        Ok(RiskEngine::for_tenant_with_defaults(
            &self.store,
            &self.tenant_id,
            &self.defaults,
        )?)
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let seed = parse_arg(&args, "--seed", 42u64);
    let seed_demo = parse_arg(&args, "--seed-demo", 0usize);
    let limit = parse_arg(&args, "--limit", 10usize);
    let tenant_id = parse_str(&args, "--tenant").unwrap_or("demo").to_string();
    let db = parse_str(&args, "--db").unwrap_or(":memory:");
    let data_dir = parse_str(&args, "--data-dir").unwrap_or("./data");
    let as_of = match parse_str(&args, "--as-of") {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("--as-of must be YYYY-MM-DD, got '{s}'"))?,
        None => chrono::Local::now().date_naive(),
    };

    let defaults = match TenantScoringConfig::load(data_dir) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Using built-in scoring defaults: {e}");
            TenantScoringConfig::default()
        }
    };

    if !ipc_mode {
        println!("ISP churn risk: risk-runner");
        println!("  tenant:    {tenant_id}");
        println!("  db:        {db}");
        println!("  as_of:     {as_of}");
        println!("  data_dir:  {data_dir}");
        println!();
    }

    let store = RiskStore::open(db)?;
    store.migrate()?;

    if seed_demo > 0 {
        demo::seed_demo_tenant(&store, &tenant_id, seed, seed_demo, as_of)?;
    }

    let ctx = RunnerContext {
        store,
        tenant_id,
        as_of,
        defaults,
    };

    if ipc_mode {
        run_ipc_loop(&ctx)?;
    } else {
        let engine = ctx.engine()?;
        let report = engine.evaluate(&ctx.store, ctx.as_of)?;
        engine.record_evaluation(&ctx.store, &report)?;
        print_summary(&report, limit);
    }

    Ok(())
}

fn run_ipc_loop(ctx: &RunnerContext) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                writeln!(stdout, "{}", serde_json::json!({ "error": e.to_string() }))?;
                stdout.flush()?;
                continue;
            }
        };

        if matches!(cmd, IpcCommand::Quit) {
            break;
        }

        let reply = match handle_command(ctx, cmd) {
            Ok(value) => value,
            Err(e) => serde_json::json!({ "error": e.to_string() }),
        };
        writeln!(stdout, "{reply}")?;
        stdout.flush()?;
    }
    Ok(())
}

fn handle_command(ctx: &RunnerContext, cmd: IpcCommand) -> Result<serde_json::Value> {
    let tenant = ctx.tenant_id.as_str();
    let reply = match cmd {
        IpcCommand::GetConfig => serde_json::to_value(ctx.engine()?.config())?,
        IpcCommand::SaveWeights { value } => {
            tenant_config::save_json(&ctx.store, tenant, ConfigKey::ScoreWeights, value)?;
            serde_json::to_value(ctx.engine()?.config())?
        }
        IpcCommand::SaveThresholds { value } => {
            tenant_config::save_json(&ctx.store, tenant, ConfigKey::BucketThresholds, value)?;
            serde_json::to_value(ctx.engine()?.config())?
        }
        IpcCommand::SaveFinancialBands { value } => {
            tenant_config::save_json(&ctx.store, tenant, ConfigKey::FinancialBands, value)?;
            serde_json::to_value(ctx.engine()?.config())?
        }
        IpcCommand::ResetConfig => {
            let removed = tenant_config::reset(&ctx.store, tenant)?;
            serde_json::json!({ "removed": removed })
        }
        IpcCommand::Evaluate { limit } => {
            let engine = ctx.engine()?;
            let mut report = engine.evaluate(&ctx.store, ctx.as_of)?;
            engine.record_evaluation(&ctx.store, &report)?;
            if let Some(n) = limit {
                report.customers.truncate(n);
            }
            serde_json::to_value(&report)?
        }
        IpcCommand::EvaluateCustomer { customer_id } => {
            let risk = ctx
                .engine()?
                .evaluate_customer(&ctx.store, &customer_id, ctx.as_of)?;
            serde_json::to_value(&risk)?
        }
        IpcCommand::Quit => serde_json::Value::Null,
    };
    Ok(reply)
}

fn print_summary(report: &EvaluationReport, limit: usize) {
    println!("=== EVALUATION SUMMARY ===");
    println!("  evaluation:  {}", report.evaluation_id);
    println!("  customers:   {}", report.customers.len());
    for bucket in RiskBucket::ALL {
        println!("  {:<11}  {}", bucket.dashboard_label(), report.buckets.get(bucket));
    }

    println!();
    println!("=== RISKIEST CUSTOMERS ===");
    if report.customers.is_empty() {
        println!("  (No signals for this tenant)");
        return;
    }
    for c in report.top(limit) {
        let b = &c.breakdown;
        println!(
            "  {:<12} {:>3} {:<8} | sup {:>2} nps {:>2} fin {:>2} qual {:>2} beh {:>2} | {} record(s)",
            c.customer_id,
            c.score,
            c.bucket.dashboard_label(),
            b.support,
            b.nps,
            b.financial,
            b.quality,
            b.behavioral,
            c.record_count,
        );
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn parse_str<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
