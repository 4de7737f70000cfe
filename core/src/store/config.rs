use super::RiskStore;
use crate::error::ScoreResult;
use rusqlite::{params, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};

/// A raw config document as stored, before it is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredConfigValue {
    pub value_json: String,
    pub updated_at: String,
}

impl StoredConfigValue {
    pub fn parse<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.value_json)
    }
}

impl RiskStore {
    // ── Tenant key-value config ────────────────────────────────

    pub fn get_config_value(
        &self,
        tenant_id: &str,
        config_key: &str,
    ) -> ScoreResult<Option<StoredConfigValue>> {
        let value = self
            .conn
            .query_row(
                "SELECT value_json, updated_at
                 FROM tenant_config
                 WHERE tenant_id = ?1 AND config_key = ?2",
                params![tenant_id, config_key],
                |row| {
                    Ok(StoredConfigValue {
                        value_json: row.get(0)?,
                        updated_at: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(value)
    }

    /// Overwrite a config section wholesale. No version check: the
    /// last writer wins.
    pub fn put_config_value<T: Serialize>(
        &self,
        tenant_id: &str,
        config_key: &str,
        value: &T,
    ) -> ScoreResult<()> {
        let value_json = serde_json::to_string(value)?;
        self.put_config_raw(tenant_id, config_key, &value_json)
    }

    /// Store a document verbatim, without parsing it. Loading copes
    /// with unparseable documents by falling back to defaults.
    pub fn put_config_raw(
        &self,
        tenant_id: &str,
        config_key: &str,
        value_json: &str,
    ) -> ScoreResult<()> {
        let updated_at = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO tenant_config (tenant_id, config_key, value_json, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(tenant_id, config_key) DO UPDATE SET
                value_json = excluded.value_json,
                updated_at = excluded.updated_at",
            params![tenant_id, config_key, value_json, updated_at],
        )?;
        Ok(())
    }

    /// Drop every override for a tenant. Returns the number of sections removed.
    pub fn delete_tenant_config(&self, tenant_id: &str) -> ScoreResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM tenant_config WHERE tenant_id = ?1",
            params![tenant_id],
        )?;
        Ok(removed)
    }

    pub fn configured_tenants(&self) -> ScoreResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT tenant_id FROM tenant_config ORDER BY tenant_id",
        )?;
        let tenants = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tenants)
    }
}
