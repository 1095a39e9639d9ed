//! Usage-based reclassification of breaking schema changes.
//!
//! The diff engine tags changes structurally; this module refines the
//! Breaking ones against real traffic. A breaking change nobody calls
//! is safe in practice. A breaking change with residual traffic stays
//! breaking and gets evidence attached: the top operations and clients
//! responsible.
//!
//! Per schema check the pipeline is: structural classification
//! (external) → usage reclassification (here) → optional manual
//! approval (terminal). Approved changes are never reprocessed.

use std::collections::HashMap;

use tracing::debug;

use crate::schema::{AffectedClient, AffectedOperation, SchemaChange, Criticality, UsageStatistics};

use super::UsageValidationConfig;
use super::loader::TopOperationsLoader;
use super::reader::{DateRange, OperationsReader, UsageError};

/// Result of reclassifying one change list.
#[derive(Debug)]
pub struct ReclassifyOutcome {
    /// The input changes, in input order, each with a definitive
    /// `is_safe_based_on_usage` and optional statistics.
    pub changes: Vec<SchemaChange>,
    /// True only if every breaking change is usage-safe or approved.
    pub is_safe: bool,
    /// Non-fatal problems encountered, e.g. an unreachable analytics
    /// store (which fails closed).
    pub warnings: Vec<String>,
}

fn overall_verdict(changes: &[SchemaChange]) -> bool {
    changes
        .iter()
        .filter(|change| change.criticality == Criticality::Breaking)
        .all(|change| change.is_safe_based_on_usage || change.approval.is_some())
}

/// Fail-closed outcome: every unapproved breaking change stays unsafe
/// with no statistics.
fn fail_closed(mut changes: Vec<SchemaChange>, warning: String) -> ReclassifyOutcome {
    for change in &mut changes {
        if change.criticality == Criticality::Breaking && change.approval.is_none() {
            change.is_safe_based_on_usage = false;
            change.usage_statistics = None;
        }
    }
    let is_safe = overall_verdict(&changes);
    ReclassifyOutcome {
        changes,
        is_safe,
        warnings: vec![warning],
    }
}

async fn total_traffic(
    reader: &dyn OperationsReader,
    target: &str,
    period: &DateRange,
    config: &UsageValidationConfig,
) -> Result<u64, UsageError> {
    let mut targets: Vec<&str> = vec![target];
    targets.extend(config.target_ids.iter().map(String::as_str));
    targets.dedup();

    let mut total = 0u64;
    for target in targets {
        total += reader
            .count_requests(target, period, None, &config.excluded_clients)
            .await?;
    }
    Ok(total)
}

fn statistics(
    operations: Vec<super::reader::TopOperation>,
    clients: Vec<super::reader::TopClient>,
    limit: usize,
) -> UsageStatistics {
    let mut operations: Vec<AffectedOperation> = operations
        .into_iter()
        .map(|op| AffectedOperation {
            name: op.operation_name,
            hash: op.operation_hash,
            count: op.count,
        })
        .collect();
    // Descending by call count; lexical hash order keeps ties stable.
    operations.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.hash.cmp(&b.hash)));
    operations.truncate(limit);

    let mut clients: Vec<AffectedClient> = clients
        .into_iter()
        .map(|client| AffectedClient {
            name: client.name,
            count: client.count,
        })
        .collect();
    clients.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    clients.truncate(limit);

    UsageStatistics {
        top_affected_operations: operations,
        top_affected_clients: clients,
    }
}

/// Reclassify a change list against live usage data.
///
/// Only changes that are Breaking and carry no approval are examined.
/// Zero matching requests over the period marks the change safe based
/// on usage; traffic below the configured percentage threshold does the
/// same. Anything else keeps the change breaking and attaches the top
/// operations and clients responsible.
///
/// Any reader failure fails the whole step closed: changes keep their
/// strict structural classification and a warning is surfaced.
pub async fn reclassify_changes(
    reader: &dyn OperationsReader,
    target: &str,
    config: &UsageValidationConfig,
    changes: Vec<SchemaChange>,
) -> ReclassifyOutcome {
    let period = DateRange::last_days(config.period_days);

    let pending = changes
        .iter()
        .filter(|c| c.criticality == Criticality::Breaking && c.approval.is_none())
        .count();
    if pending == 0 {
        let is_safe = overall_verdict(&changes);
        return ReclassifyOutcome {
            changes,
            is_safe,
            warnings: Vec::new(),
        };
    }

    let total = match total_traffic(reader, target, &period, config).await {
        Ok(total) => total,
        Err(error) => {
            return fail_closed(
                changes,
                format!("could not verify usage of breaking changes: {error}"),
            );
        }
    };

    debug!(target_id = target, total, pending, "reclassifying breaking changes");

    let original = changes.clone();
    let mut loader = TopOperationsLoader::new(reader);
    let mut count_memo: HashMap<String, u64> = HashMap::new();
    let mut reclassified = Vec::with_capacity(changes.len());

    for mut change in changes {
        if change.criticality != Criticality::Breaking || change.approval.is_some() {
            reclassified.push(change);
            continue;
        }

        let Some(coordinate) = change.path.clone() else {
            // No coordinate to measure: cannot verify, stays breaking.
            change.is_safe_based_on_usage = false;
            reclassified.push(change);
            continue;
        };

        let count = match count_memo.get(&coordinate) {
            Some(count) => *count,
            None => {
                let result = reader
                    .count_requests(target, &period, Some(&coordinate), &config.excluded_clients)
                    .await;
                match result {
                    Ok(count) => {
                        count_memo.insert(coordinate.clone(), count);
                        count
                    }
                    Err(error) => {
                        return fail_closed(
                            original,
                            format!("could not verify usage of breaking changes: {error}"),
                        );
                    }
                }
            }
        };

        if count == 0 {
            change.is_safe_based_on_usage = true;
            change.usage_statistics = None;
            reclassified.push(change);
            continue;
        }

        let percentage = if total == 0 {
            100.0
        } else {
            (count as f64 / total as f64) * 100.0
        };
        if config.percentage_threshold > 0.0 && percentage < config.percentage_threshold {
            change.is_safe_based_on_usage = true;
            change.usage_statistics = None;
            reclassified.push(change);
            continue;
        }

        let limit = config.top_operations_limit;
        let operations = loader.load(target, &period, limit, &coordinate).await;
        let clients = reader
            .get_top_clients_for_coordinate(target, &period, limit, &coordinate)
            .await;
        let (operations, clients) = match (operations, clients) {
            (Ok(operations), Ok(clients)) => (operations, clients),
            (Err(error), _) | (_, Err(error)) => {
                return fail_closed(
                    original,
                    format!("could not verify usage of breaking changes: {error}"),
                );
            }
        };

        change.is_safe_based_on_usage = false;
        change.usage_statistics = Some(statistics(operations, clients, limit));
        reclassified.push(change);
    }

    let is_safe = overall_verdict(&reclassified);
    ReclassifyOutcome {
        changes: reclassified,
        is_safe,
        warnings: Vec::new(),
    }
}
