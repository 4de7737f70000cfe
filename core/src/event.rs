//! Audit events.
//!
//! Config writes (accepted or rejected) and completed evaluations are
//! appended to the event log so an operator can see which configuration
//! a dashboard was rendered against.

use crate::{
    config::ConfigKey,
    rollup::BucketCounts,
    types::TenantId,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RiskEvent {
    ConfigSaved {
        tenant_id: TenantId,
        key: ConfigKey,
        value: serde_json::Value,
    },
    ConfigRejected {
        tenant_id: TenantId,
        key: ConfigKey,
        reason: String,
    },
    ConfigReset {
        tenant_id: TenantId,
    },
    EvaluationCompleted {
        tenant_id: TenantId,
        evaluation_id: String,
        as_of: String,
        customers: usize,
        buckets: BucketCounts,
    },
}

impl RiskEvent {
    pub fn tenant_id(&self) -> &str {
        match self {
            Self::ConfigSaved { tenant_id, .. }
            | Self::ConfigRejected { tenant_id, .. }
            | Self::ConfigReset { tenant_id }
            | Self::EvaluationCompleted { tenant_id, .. } => tenant_id,
        }
    }

    /// Stable name for the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::ConfigSaved { .. } => "config_saved",
            Self::ConfigRejected { .. } => "config_rejected",
            Self::ConfigReset { .. } => "config_reset",
            Self::EvaluationCompleted { .. } => "evaluation_completed",
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub tenant_id: TenantId,
    pub event_type: String,
    pub payload: String, // JSON-serialized RiskEvent
    pub recorded_at: String,
}

impl EventLogEntry {
    pub fn from_event(event: &RiskEvent) -> serde_json::Result<Self> {
        Ok(Self {
            id: None,
            tenant_id: event.tenant_id().to_string(),
            event_type: event.type_name().to_string(),
            payload: serde_json::to_string(event)?,
            recorded_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    pub fn decode(&self) -> serde_json::Result<RiskEvent> {
        serde_json::from_str(&self.payload)
    }
}
