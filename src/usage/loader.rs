//! Coalescing loader for top-operation lookups.
//!
//! Many changed coordinates share a type name (`User.name` and
//! `User.email` both live on `User`). The loader issues one reader call
//! per `(target, period, limit, type name)` and resolves every
//! coordinate from the memoized result, so a check with dozens of
//! changes on the same type costs a single analytics query.

use std::collections::HashMap;

use super::reader::{DateRange, OperationsReader, TopOperation, UsageError};

#[derive(PartialEq, Eq, Hash, Clone)]
struct LoaderKey {
    target: String,
    period: DateRange,
    limit: usize,
    type_name: String,
}

/// Extract the type name from a schema coordinate (`User.name` →
/// `User`).
pub fn type_name_of(coordinate: &str) -> &str {
    coordinate.split('.').next().unwrap_or(coordinate)
}

pub struct TopOperationsLoader<'a> {
    reader: &'a dyn OperationsReader,
    cache: HashMap<LoaderKey, HashMap<String, Vec<TopOperation>>>,
    reader_calls: usize,
}

impl<'a> TopOperationsLoader<'a> {
    pub fn new(reader: &'a dyn OperationsReader) -> Self {
        Self {
            reader,
            cache: HashMap::new(),
            reader_calls: 0,
        }
    }

    /// Top operations for one coordinate, memoized per type name.
    pub async fn load(
        &mut self,
        target: &str,
        period: &DateRange,
        limit: usize,
        coordinate: &str,
    ) -> Result<Vec<TopOperation>, UsageError> {
        let key = LoaderKey {
            target: target.to_string(),
            period: period.clone(),
            limit,
            type_name: type_name_of(coordinate).to_string(),
        };

        if !self.cache.contains_key(&key) {
            self.reader_calls += 1;
            let by_coordinate = self
                .reader
                .get_top_operations_for_types(
                    target,
                    period,
                    limit,
                    std::slice::from_ref(&key.type_name),
                )
                .await?;
            self.cache.insert(key.clone(), by_coordinate);
        }

        Ok(self
            .cache
            .get(&key)
            .and_then(|by_coordinate| by_coordinate.get(coordinate))
            .cloned()
            .unwrap_or_default())
    }

    /// Number of reader round trips issued so far.
    pub fn reader_calls(&self) -> usize {
        self.reader_calls
    }
}
