use serde::{Deserialize, Serialize};

/// Three-way health classification derived from a predicted RUL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Monitor,
    Critical,
}

impl HealthStatus {
    /// Bucket a raw RUL value. Boundaries are exclusive: exactly 100 is
    /// monitor, exactly 50 is critical.
    pub fn from_rul(rul: f64) -> Self {
        if rul > 100.0 {
            HealthStatus::Healthy
        } else if rul > 50.0 {
            HealthStatus::Monitor
        } else {
            HealthStatus::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Monitor => "monitor",
            HealthStatus::Critical => "critical",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "green",
            HealthStatus::Monitor => "yellow",
            HealthStatus::Critical => "red",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
