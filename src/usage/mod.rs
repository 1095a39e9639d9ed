//! Usage analytics: the reader contract, the coalescing loader, and
//! usage-based reclassification of breaking schema changes.

pub mod cache;
pub mod loader;
pub mod reader;
pub mod reclassify;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use cache::TtlCache;
use reader::{OperationsReader, UsageError};

pub use reader::{DateRange, TopClient, TopOperation};
pub use reclassify::{ReclassifyOutcome, reclassify_changes};

/// Parameters for the usage-safety decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageValidationConfig {
    /// Lookback window in days.
    pub period_days: u32,
    /// Traffic share (percent) below which a breaking change is
    /// considered safe. `0.0` means only zero-traffic changes qualify.
    pub percentage_threshold: f64,
    /// Client names whose traffic never counts.
    pub excluded_clients: Vec<String>,
    /// Additional target ids for cross-target aggregation.
    pub target_ids: Vec<String>,
    /// How many affected operations/clients to attach as evidence.
    pub top_operations_limit: usize,
}

impl Default for UsageValidationConfig {
    fn default() -> Self {
        Self {
            period_days: 7,
            percentage_threshold: 0.0,
            excluded_clients: Vec::new(),
            target_ids: Vec::new(),
            top_operations_limit: 10,
        }
    }
}

const ELIGIBILITY_CACHE_CAPACITY: usize = 500;
const ELIGIBILITY_CACHE_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Answers "has this target ever reported operations" with a bounded
/// cache in front: once a target has operations that fact never
/// reverts, so a long TTL is harmless.
pub struct OperationsEligibility<'a> {
    reader: &'a dyn OperationsReader,
    cache: TtlCache<String, bool>,
}

impl<'a> OperationsEligibility<'a> {
    pub fn new(reader: &'a dyn OperationsReader) -> Self {
        Self {
            reader,
            cache: TtlCache::new(ELIGIBILITY_CACHE_CAPACITY, ELIGIBILITY_CACHE_TTL),
        }
    }

    pub async fn has_collected_operations_ever(
        &mut self,
        targets: &[String],
    ) -> Result<bool, UsageError> {
        let key = targets.join(",");
        if let Some(known) = self.cache.get(&key) {
            return Ok(known);
        }
        let has_operations = self.reader.has_collected_operations(targets).await?;
        // Only a positive answer is durable; a target with no traffic
        // today may report tomorrow.
        if has_operations {
            self.cache.insert(key, true);
        }
        Ok(has_operations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct EligibilityReader {
        answer: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl OperationsReader for EligibilityReader {
        async fn count_requests(
            &self,
            _target: &str,
            _period: &DateRange,
            _coordinate: Option<&str>,
            _excluded_clients: &[String],
        ) -> Result<u64, UsageError> {
            Ok(0)
        }

        async fn count_coordinates_of_target(
            &self,
            _target: &str,
            _period: &DateRange,
        ) -> Result<HashMap<String, u64>, UsageError> {
            Ok(HashMap::new())
        }

        async fn get_top_operations_for_types(
            &self,
            _target: &str,
            _period: &DateRange,
            _limit: usize,
            _type_names: &[String],
        ) -> Result<HashMap<String, Vec<TopOperation>>, UsageError> {
            Ok(HashMap::new())
        }

        async fn get_top_clients_for_coordinate(
            &self,
            _target: &str,
            _period: &DateRange,
            _limit: usize,
            _coordinate: &str,
        ) -> Result<Vec<TopClient>, UsageError> {
            Ok(Vec::new())
        }

        async fn has_collected_operations(
            &self,
            _targets: &[String],
        ) -> Result<bool, UsageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer)
        }
    }

    #[tokio::test]
    async fn positive_answers_are_cached() {
        let reader = EligibilityReader {
            answer: true,
            ..Default::default()
        };
        let mut eligibility = OperationsEligibility::new(&reader);
        let targets = vec!["t1".to_string()];

        assert!(eligibility.has_collected_operations_ever(&targets).await.unwrap());
        assert!(eligibility.has_collected_operations_ever(&targets).await.unwrap());
        assert_eq!(reader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn negative_answers_are_asked_again() {
        let reader = EligibilityReader::default();
        let mut eligibility = OperationsEligibility::new(&reader);
        let targets = vec!["t1".to_string()];

        assert!(!eligibility.has_collected_operations_ever(&targets).await.unwrap());
        assert!(!eligibility.has_collected_operations_ever(&targets).await.unwrap());
        assert_eq!(reader.calls.load(Ordering::SeqCst), 2);
    }
}
