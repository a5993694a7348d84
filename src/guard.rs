//! Pre-execution query guard. Scores the raw operation document for nesting
//! depth and estimated complexity and rejects anything over the configured
//! thresholds before a resolver (or even the typed deserializer) touches it.
//! Evaluation is O(document size) with no allocation beyond the descriptor,
//! so the guard stays cheap even under hostile input.

use serde_json::Value;

use crate::config::GuardConfig;
use crate::error::{AppError, AppResult};

/// Ephemeral shape metrics of one inbound document. Computed, compared
/// against the thresholds, and discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryShape {
    pub depth: usize,
    pub cost: u64,
}

pub struct QueryGuard {
    max_depth: usize,
    max_complexity: u64,
}

impl QueryGuard {
    pub fn new(config: GuardConfig) -> Self {
        Self { max_depth: config.max_depth, max_complexity: config.max_complexity }
    }

    /// Accept or reject the document. Depth is checked before complexity, so
    /// a document failing both reports `depth_exceeded`.
    pub fn evaluate(&self, doc: &Value) -> AppResult<QueryShape> {
        let shape = QueryShape::of(doc);
        if shape.depth > self.max_depth {
            return Err(AppError::depth_exceeded(shape.depth, self.max_depth));
        }
        if shape.cost > self.max_complexity {
            return Err(AppError::complexity_exceeded(shape.cost, self.max_complexity));
        }
        Ok(shape)
    }
}

impl Default for QueryGuard {
    fn default() -> Self {
        Self::new(GuardConfig::default())
    }
}

impl QueryShape {
    pub fn of(doc: &Value) -> Self {
        Self { depth: depth_of(doc), cost: cost_of(doc) }
    }
}

/// Maximum container nesting. Scalars are depth 0, so an empty document
/// (or `{}`) scores 0 and passes trivially.
fn depth_of(doc: &Value) -> usize {
    match doc {
        Value::Object(map) if map.is_empty() => 0,
        Value::Array(items) if items.is_empty() => 0,
        Value::Object(map) => 1 + map.values().map(depth_of).max().unwrap_or(0),
        Value::Array(items) => 1 + items.iter().map(depth_of).max().unwrap_or(0),
        _ => 0,
    }
}

/// Estimated execution cost: one unit per field and one per array element,
/// with a numeric `limit` field multiplying the cost of its sibling fields
/// (the requested list size). Charging elements keeps the bound tight for
/// bodies that pad a single field with a huge array.
fn cost_of(doc: &Value) -> u64 {
    match doc {
        Value::Object(map) => {
            let multiplier = map
                .get("limit")
                .and_then(Value::as_u64)
                .unwrap_or(1)
                .max(1);
            let fields: u64 = map
                .iter()
                .filter(|(k, _)| k.as_str() != "limit")
                .map(|(_, v)| 1 + cost_of(v))
                .sum();
            fields.saturating_mul(multiplier)
        }
        Value::Array(items) => items.iter().map(|v| 1 + cost_of(v)).sum(),
        _ => 0,
    }
}
