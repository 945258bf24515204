use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub mod keys;
pub mod kv;
pub mod palette;
pub mod platform;
pub mod schedule;
pub mod watch;

/// Full feed payload produced by an external collaborator and read from disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusFeed {
    #[serde(default)]
    pub features: Vec<FeatureRecord>,
    #[serde(default)]
    pub evals: Vec<EvalRecord>,
    #[serde(default)]
    pub alerts: Vec<AlertRecord>,
    #[serde(default)]
    pub learnings: Vec<LearningRecord>,
    #[serde(default, rename = "generatedAt")]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: FeatureStatus,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default, rename = "updatedAt")]
    pub updated_at: Option<String>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

impl FeatureRecord {
    pub fn snapshot(&self) -> FeatureSnapshot {
        FeatureSnapshot {
            id: self.id.clone(),
            status: self.status,
        }
    }
}

/// Minimal `{id, status}` projection used only for change detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSnapshot {
    pub id: String,
    pub status: FeatureStatus,
}

impl FeatureSnapshot {
    pub fn new(id: impl Into<String>, status: FeatureStatus) -> Self {
        Self {
            id: id.into(),
            status,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureStatus {
    Open,
    InProgress,
    Blocked,
    Completed,
}

impl Default for FeatureStatus {
    fn default() -> Self {
        Self::Open
    }
}

impl FeatureStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureStatus::Open => "OPEN",
            FeatureStatus::InProgress => "IN_PROGRESS",
            FeatureStatus::Blocked => "BLOCKED",
            FeatureStatus::Completed => "COMPLETED",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, FeatureStatus::Completed)
    }
}

impl fmt::Display for FeatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureStatus {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalized = input.trim().to_lowercase();
        match normalized.as_str() {
            "open" => Ok(FeatureStatus::Open),
            "in-progress" | "in_progress" | "inprogress" => Ok(FeatureStatus::InProgress),
            "blocked" => Ok(FeatureStatus::Blocked),
            "completed" | "done" => Ok(FeatureStatus::Completed),
            other => Err(format!("Unknown status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub passed: Option<bool>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub message: String,
    #[serde(default)]
    pub severity: AlertSeverity,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Critical,
    Warning,
    Info,
}

impl Default for AlertSeverity {
    fn default() -> Self {
        Self::Info
    }
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Critical => "critical",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Info => "info",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

impl StatusFeed {
    pub fn snapshots(&self) -> Vec<FeatureSnapshot> {
        self.features.iter().map(FeatureRecord::snapshot).collect()
    }
}

/// Hex digest of a raw feed payload, used to skip work on unchanged polls.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Deserialize an ID that can be either a string or a number into a String
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let val: serde_json::Value = serde_json::Value::deserialize(deserializer)?;
    match val {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        _ => Err(serde::de::Error::custom("expected string or number for id")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_parses_with_numeric_ids_and_unknown_fields() {
        let payload = r#"{
            "features": [
                {"id": 7, "name": "Feed export", "status": "OPEN", "tags": ["beta"]},
                {"id": "F2", "name": "Digest cache", "status": "COMPLETED"}
            ],
            "alerts": [{"id": "A1", "message": "eval drift", "severity": "warning"}],
            "generatedAt": "2026-08-01T09:00:00Z",
            "schemaHint": "v2"
        }"#;

        let feed: StatusFeed = serde_json::from_str(payload).expect("feed parses");
        assert_eq!(feed.features.len(), 2);
        assert_eq!(feed.features[0].id, "7");
        assert_eq!(feed.features[1].status, FeatureStatus::Completed);
        assert_eq!(feed.alerts[0].severity, AlertSeverity::Warning);
        assert!(feed.extra.contains_key("schemaHint"));
    }

    #[test]
    fn status_from_str_is_lenient() {
        assert_eq!(
            "in_progress".parse::<FeatureStatus>().unwrap(),
            FeatureStatus::InProgress
        );
        assert_eq!(
            " COMPLETED ".parse::<FeatureStatus>().unwrap(),
            FeatureStatus::Completed
        );
        assert!("mystery".parse::<FeatureStatus>().is_err());
    }

    #[test]
    fn snapshots_project_id_and_status_only() {
        let feed: StatusFeed = serde_json::from_str(
            r#"{"features": [{"id": "F1", "name": "One", "status": "BLOCKED", "owner": "ana"}]}"#,
        )
        .expect("feed parses");
        let snaps = feed.snapshots();
        assert_eq!(snaps, vec![FeatureSnapshot::new("F1", FeatureStatus::Blocked)]);
    }

    #[test]
    fn sha256_hex_is_stable_and_input_sensitive() {
        let a = sha256_hex("{\"features\":[]}");
        let b = sha256_hex("{\"features\":[]}");
        let c = sha256_hex("{\"features\":[1]}");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
