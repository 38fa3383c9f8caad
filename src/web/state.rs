use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::model::RulPredictor;
use crate::types::HealthStatus;

/// Shared state for the web server. The predictor is read-only after
/// startup; only the counters mutate.
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<RulPredictor>,
    pub stats: ServiceStats,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(predictor: RulPredictor) -> Self {
        Self {
            predictor: Arc::new(predictor),
            stats: ServiceStats::new(),
            started_at: Utc::now(),
        }
    }
}

/// In-process request counters, reset on restart.
#[derive(Clone)]
pub struct ServiceStats {
    inner: Arc<RwLock<StatsData>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StatsData {
    pub total_requests: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub last_rul: Option<f64>,
    pub last_status: Option<HealthStatus>,
}

impl ServiceStats {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(StatsData::default())),
        }
    }

    pub async fn record_accepted(&self, rul: f64, status: HealthStatus) {
        let mut data = self.inner.write().await;
        data.total_requests += 1;
        data.accepted += 1;
        data.last_rul = Some(rul);
        data.last_status = Some(status);
    }

    pub async fn record_rejected(&self) {
        let mut data = self.inner.write().await;
        data.total_requests += 1;
        data.rejected += 1;
    }

    pub async fn snapshot(&self) -> StatsData {
        self.inner.read().await.clone()
    }
}

impl Default for ServiceStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counters_track_outcomes() {
        let stats = ServiceStats::new();
        stats.record_accepted(87.5, HealthStatus::Monitor).await;
        stats.record_rejected().await;
        stats.record_accepted(42.0, HealthStatus::Critical).await;

        let snapshot = stats.snapshot().await;
        assert_eq!(snapshot.total_requests, 3);
        assert_eq!(snapshot.accepted, 2);
        assert_eq!(snapshot.rejected, 1);
        assert_eq!(snapshot.last_rul, Some(42.0));
        assert_eq!(snapshot.last_status, Some(HealthStatus::Critical));
    }
}
