//! Job domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The two durable queues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueName {
    Indexing,
    Generation,
}

impl std::str::FromStr for QueueName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "indexing" => Ok(Self::Indexing),
            "generation" => Ok(Self::Generation),
            _ => Err(format!("Invalid queue name: {s}")),
        }
    }
}

impl std::fmt::Display for QueueName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Indexing => "indexing",
            Self::Generation => "generation",
        };
        write!(f, "{name}")
    }
}

/// Job lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Waiting,
    Active,
    Completed,
    Failed,
}

impl JobState {
    /// Whether the job can never run again
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::str::FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(Self::Waiting),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid job state: {s}")),
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self {
            Self::Waiting => "waiting",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        write!(f, "{state}")
    }
}

/// One durable job
///
/// Mutated only by the worker the queue assigned it to; producers never touch
/// a job after enqueueing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub queue: QueueName,
    pub payload: serde_json::Value,
    pub state: JobState,
    pub attempts: i32,
    pub max_attempts: i32,
    /// 0-100
    pub progress: i32,
    pub result: Option<serde_json::Value>,
    pub failed_reason: Option<String>,
    pub owner_user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Deserialize the payload into its typed form
    ///
    /// # Errors
    /// Returns the serde error when the payload doesn't match `T`.
    pub fn typed_payload<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_names_round_trip() {
        assert_eq!("indexing".parse::<QueueName>().unwrap(), QueueName::Indexing);
        assert_eq!(QueueName::Generation.to_string(), "generation");
        assert!("priority".parse::<QueueName>().is_err());
    }

    #[test]
    fn terminal_states() {
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(!JobState::Waiting.is_terminal());
        assert!(!JobState::Active.is_terminal());
    }
}
