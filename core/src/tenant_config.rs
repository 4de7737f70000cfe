//! Tenant configuration service.
//!
//! Each tenant may override any of the three config sections. Loading
//! falls back to defaults, section by section, whenever a document is
//! missing, unparseable or invalid. Saving validates the candidate
//! against the rest of the tenant's config and either overwrites the
//! stored section (last writer wins) or rejects it, leaving the
//! previous value in effect. Both outcomes are written to the event log.

use crate::{
    config::{BucketThresholds, ConfigKey, FinancialBands, ScoreWeights, TenantScoringConfig},
    error::ScoreResult,
    event::{EventLogEntry, RiskEvent},
    store::RiskStore,
};
use serde::{de::DeserializeOwned, Serialize};

/// Current config for `tenant_id`, built on the compiled-in defaults.
pub fn load(store: &RiskStore, tenant_id: &str) -> ScoreResult<TenantScoringConfig> {
    load_with_defaults(store, tenant_id, &TenantScoringConfig::default())
}

/// Current config for `tenant_id`, using `defaults` for any section the
/// tenant has not overridden.
pub fn load_with_defaults(
    store: &RiskStore,
    tenant_id: &str,
    defaults: &TenantScoringConfig,
) -> ScoreResult<TenantScoringConfig> {
    let config = TenantScoringConfig {
        weights: load_section(store, tenant_id, ConfigKey::ScoreWeights, defaults.weights, |_| {
            Ok(())
        })?,
        thresholds: load_section(
            store,
            tenant_id,
            ConfigKey::BucketThresholds,
            defaults.thresholds,
            BucketThresholds::validate,
        )?,
        financial_bands: load_section(
            store,
            tenant_id,
            ConfigKey::FinancialBands,
            defaults.financial_bands.clone(),
            FinancialBands::validate,
        )?,
    };

    if let Err(e) = config.validate() {
        log::warn!("tenant={tenant_id} config: stored sections invalid together ({e}), using defaults");
        return Ok(defaults.clone());
    }
    Ok(config)
}

fn load_section<T, V>(
    store: &RiskStore,
    tenant_id: &str,
    key: ConfigKey,
    default: T,
    validate: V,
) -> ScoreResult<T>
where
    T: DeserializeOwned,
    V: Fn(&T) -> ScoreResult<()>,
{
    let Some(stored) = store.get_config_value(tenant_id, key.as_str())? else {
        return Ok(default);
    };

    match stored.parse::<T>() {
        Ok(value) => match validate(&value) {
            Ok(()) => Ok(value),
            Err(e) => {
                log::warn!("tenant={tenant_id} config: {} invalid ({e}), using defaults", key.as_str());
                Ok(default)
            }
        },
        Err(e) => {
            log::warn!("tenant={tenant_id} config: {} unreadable ({e}), using defaults", key.as_str());
            Ok(default)
        }
    }
}

pub fn save_weights(store: &RiskStore, tenant_id: &str, weights: ScoreWeights) -> ScoreResult<()> {
    let mut candidate = load(store, tenant_id)?;
    candidate.weights = weights;
    save_section(store, tenant_id, ConfigKey::ScoreWeights, &weights, &candidate)
}

pub fn save_thresholds(
    store: &RiskStore,
    tenant_id: &str,
    thresholds: BucketThresholds,
) -> ScoreResult<()> {
    let mut candidate = load(store, tenant_id)?;
    candidate.thresholds = thresholds;
    save_section(store, tenant_id, ConfigKey::BucketThresholds, &thresholds, &candidate)
}

pub fn save_financial_bands(
    store: &RiskStore,
    tenant_id: &str,
    bands: FinancialBands,
) -> ScoreResult<()> {
    let mut candidate = load(store, tenant_id)?;
    candidate.financial_bands = bands.clone();
    save_section(store, tenant_id, ConfigKey::FinancialBands, &bands, &candidate)
}

/// Save a section supplied as untyped JSON (the runner's command
/// channel). A document that does not parse is rejected like any
/// other invalid value.
pub fn save_json(
    store: &RiskStore,
    tenant_id: &str,
    key: ConfigKey,
    value: serde_json::Value,
) -> ScoreResult<()> {
    let parsed = match key {
        ConfigKey::ScoreWeights => serde_json::from_value(value)
            .map(|w| save_weights(store, tenant_id, w)),
        ConfigKey::BucketThresholds => serde_json::from_value(value)
            .map(|t| save_thresholds(store, tenant_id, t)),
        ConfigKey::FinancialBands => serde_json::from_value(value)
            .map(|b| save_financial_bands(store, tenant_id, b)),
    };
    match parsed {
        Ok(saved) => saved,
        Err(e) => {
            reject(store, tenant_id, key, e.to_string())?;
            Err(e.into())
        }
    }
}

/// Drop every override so the tenant runs on defaults again.
pub fn reset(store: &RiskStore, tenant_id: &str) -> ScoreResult<usize> {
    let removed = store.delete_tenant_config(tenant_id)?;
    record(store, &RiskEvent::ConfigReset { tenant_id: tenant_id.to_string() })?;
    log::info!("tenant={tenant_id} config: reset, {removed} section(s) removed");
    Ok(removed)
}

fn save_section<T: Serialize>(
    store: &RiskStore,
    tenant_id: &str,
    key: ConfigKey,
    value: &T,
    candidate: &TenantScoringConfig,
) -> ScoreResult<()> {
    if let Err(e) = candidate.validate() {
        reject(store, tenant_id, key, e.to_string())?;
        return Err(e);
    }

    store.put_config_value(tenant_id, key.as_str(), value)?;
    record(
        store,
        &RiskEvent::ConfigSaved {
            tenant_id: tenant_id.to_string(),
            key,
            value: serde_json::to_value(value)?,
        },
    )?;
    log::info!("tenant={tenant_id} config: {} saved", key.as_str());
    Ok(())
}

fn reject(store: &RiskStore, tenant_id: &str, key: ConfigKey, reason: String) -> ScoreResult<()> {
    log::warn!("tenant={tenant_id} config: {} rejected: {reason}", key.as_str());
    record(
        store,
        &RiskEvent::ConfigRejected {
            tenant_id: tenant_id.to_string(),
            key,
            reason,
        },
    )
}

pub(crate) fn record(store: &RiskStore, event: &RiskEvent) -> ScoreResult<()> {
    store.append_event(&EventLogEntry::from_event(event)?)
}
