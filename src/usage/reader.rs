//! Collaborator contract for operation-usage analytics.
//!
//! The reader hides the analytics store behind "given target + period
//! (+ coordinate), return counts and top-N breakdowns". The CLI and the
//! reclassification core only consume this trait; tests substitute
//! in-memory readers.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// Lookback window for usage queries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    /// The last `days` days, ending now.
    pub fn last_days(days: u32) -> Self {
        let to = Utc::now();
        Self {
            from: to - Duration::days(i64::from(days)),
            to,
        }
    }
}

/// Aggregated call counts for one operation against a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopOperation {
    pub operation_name: String,
    pub operation_hash: String,
    pub count: u64,
}

/// Aggregated call counts for one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopClient {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Error)]
pub enum UsageError {
    #[error("usage analytics store unavailable: {0}")]
    Unavailable(String),
    #[error("usage query failed: {0}")]
    Query(String),
}

/// Read access to historical operation-usage data.
#[async_trait]
pub trait OperationsReader: Send + Sync {
    /// Total matching requests for a target over a period, optionally
    /// restricted to one schema coordinate. Traffic from excluded
    /// clients is never counted.
    async fn count_requests(
        &self,
        target: &str,
        period: &DateRange,
        coordinate: Option<&str>,
        excluded_clients: &[String],
    ) -> Result<u64, UsageError>;

    /// Per-coordinate request counts for a whole target.
    async fn count_coordinates_of_target(
        &self,
        target: &str,
        period: &DateRange,
    ) -> Result<HashMap<String, u64>, UsageError>;

    /// Top operations touching any coordinate of the given types,
    /// keyed by coordinate.
    async fn get_top_operations_for_types(
        &self,
        target: &str,
        period: &DateRange,
        limit: usize,
        type_names: &[String],
    ) -> Result<HashMap<String, Vec<TopOperation>>, UsageError>;

    /// Top clients still calling one coordinate.
    async fn get_top_clients_for_coordinate(
        &self,
        target: &str,
        period: &DateRange,
        limit: usize,
        coordinate: &str,
    ) -> Result<Vec<TopClient>, UsageError>;

    /// Whether any of the targets has ever reported operations.
    async fn has_collected_operations(&self, targets: &[String]) -> Result<bool, UsageError>;
}
