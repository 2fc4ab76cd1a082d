use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One ranked classifier output.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

/// Notification mechanism with its own failure domain.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Actuator,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Channel::Email => "email",
            Channel::Actuator => "actuator",
        })
    }
}

/// Outcome of one dispatch attempt. Lives for the duration of a request;
/// logged, never persisted.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NotificationEvent {
    pub channel: Channel,
    pub success: bool,
    pub error: Option<String>,
}

impl NotificationEvent {
    pub fn delivered(channel: Channel) -> Self {
        Self {
            channel,
            success: true,
            error: None,
        }
    }

    pub fn failed(channel: Channel, error: impl Into<String>) -> Self {
        Self {
            channel,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Append-only record of an elephant detection.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SightingRecord {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
    pub label: String,
    pub accuracy: f32,
}
