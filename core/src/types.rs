//! Shared primitive types used across the engine.

/// Identifier of one ISP organisation. Data and configuration never
/// cross tenant boundaries.
pub type TenantId = String;

/// A customer within a tenant.
pub type CustomerId = String;

/// A contract (service plan) held by a customer. One customer may hold
/// several, each with its own risk-status record.
pub type ContractId = String;

/// A bounded risk score in `0..=MAX_SCORE`.
pub type Score = u32;

/// Global cap on any total risk score.
pub const MAX_SCORE: Score = 500;
