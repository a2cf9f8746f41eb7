use std::collections::{BTreeMap, VecDeque};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

pub const OVERALL_PROGRESS: &str = "overall_progress";
pub const TASK_COMPLETION_RATE: &str = "task_completion_rate";
pub const TIME_TO_LAUNCH: &str = "time_to_launch";
pub const ACTIVE_BLOCKERS: &str = "active_blockers";
pub const VELOCITY: &str = "velocity";

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    pub fn between(previous: f64, current: f64) -> Self {
        if current > previous {
            Self::Increasing
        } else if current < previous {
            Self::Decreasing
        } else {
            Self::Stable
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MetricSample {
    pub value: f64,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    /// Oldest first, never longer than the store's cap.
    pub history: VecDeque<MetricSample>,
    pub last_updated: DateTime<Utc>,
    pub trend: Trend,
}

/// Named metrics with bounded FIFO history.
pub struct MetricStore {
    metrics: RwLock<BTreeMap<String, Metric>>,
    history_cap: usize,
}

impl MetricStore {
    pub fn new(history_cap: usize) -> Self {
        Self {
            metrics: RwLock::new(BTreeMap::new()),
            history_cap: history_cap.max(1),
        }
    }

    /// Set a metric's current value. The trend compares against the previous
    /// current value; a first sample is stable.
    pub async fn record(&self, name: &str, value: f64) -> Metric {
        let now = Utc::now();
        let mut metrics = self.metrics.write().await;
        let metric = metrics.entry(name.to_string()).or_insert_with(|| Metric {
            name: name.to_string(),
            value,
            history: VecDeque::new(),
            last_updated: now,
            trend: Trend::Stable,
        });

        metric.trend = if metric.history.is_empty() {
            Trend::Stable
        } else {
            Trend::between(metric.value, value)
        };
        metric.value = value;
        metric.last_updated = now;
        metric.history.push_back(MetricSample { value, at: now });
        while metric.history.len() > self.history_cap {
            metric.history.pop_front();
        }
        metric.clone()
    }

    pub async fn get(&self, name: &str) -> Option<Metric> {
        self.metrics.read().await.get(name).cloned()
    }

    pub async fn value(&self, name: &str) -> Option<f64> {
        self.metrics.read().await.get(name).map(|m| m.value)
    }

    /// Snapshot sorted by name.
    pub async fn all(&self) -> Vec<Metric> {
        self.metrics.read().await.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trend_follows_previous_value() {
        let store = MetricStore::new(10);
        assert_eq!(store.record("m", 10.0).await.trend, Trend::Stable);
        assert_eq!(store.record("m", 12.0).await.trend, Trend::Increasing);
        assert_eq!(store.record("m", 12.0).await.trend, Trend::Stable);
        assert_eq!(store.record("m", 3.0).await.trend, Trend::Decreasing);
    }

    #[tokio::test]
    async fn test_history_is_capped_fifo() {
        let store = MetricStore::new(100);
        for i in 0..150 {
            store.record(VELOCITY, i as f64).await;
        }
        let metric = store.get(VELOCITY).await.unwrap();
        assert_eq!(metric.history.len(), 100);
        assert_eq!(metric.history.front().unwrap().value, 50.0);
        assert_eq!(metric.value, 149.0);
    }

    #[tokio::test]
    async fn test_reads_do_not_mutate() {
        let store = MetricStore::new(5);
        store.record(OVERALL_PROGRESS, 42.0).await;
        let before = store.get(OVERALL_PROGRESS).await.unwrap();
        let _ = store.all().await;
        let _ = store.value(OVERALL_PROGRESS).await;
        let after = store.get(OVERALL_PROGRESS).await.unwrap();
        assert_eq!(before.history, after.history);
        assert_eq!(before.last_updated, after.last_updated);
    }
}
