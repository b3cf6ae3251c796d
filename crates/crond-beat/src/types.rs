use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A discrete occurrence worth alerting on (job failure, skipped run, …).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub dimension: BTreeMap<String, String>,
    /// Unix milliseconds. Filled in at construction when absent on the wire.
    #[serde(default = "now_millis")]
    pub timestamp: i64,
}

impl Event {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            dimension: BTreeMap::new(),
            timestamp: now_millis(),
        }
    }

    pub fn with_dimension(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.dimension.insert(key.into(), value.into());
        self
    }
}

/// A single numeric sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: i64,
    #[serde(default)]
    pub dimension: BTreeMap<String, String>,
    #[serde(default = "now_millis")]
    pub timestamp: i64,
}

impl Metric {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
            dimension: BTreeMap::new(),
            timestamp: now_millis(),
        }
    }

    pub fn with_dimension(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.dimension.insert(key.into(), value.into());
        self
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_event_without_timestamp_gets_one() {
        let e: Event = serde_json::from_str(r#"{"name":"x","content":"y"}"#).unwrap();
        assert!(e.timestamp > 0);
        assert!(e.dimension.is_empty());
    }

    #[test]
    fn dimensions_accumulate() {
        let m = Metric::new("crond_heart_beat", 1)
            .with_dimension("host", "db-1")
            .with_dimension("biz", "42");
        assert_eq!(m.dimension.len(), 2);
        assert_eq!(m.dimension["host"], "db-1");
    }
}
