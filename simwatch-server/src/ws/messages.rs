use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use simwatch_core::{JobConfig, JobEvent};

/// Requests a client can send over the job socket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Launch a job with the given flag/value configuration.
    StartJob {
        #[serde(default)]
        config: BTreeMap<String, Value>,
    },
}

/// Events the server pushes to a connected client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Log {
        session_id: Uuid,
        message: String,
    },
    Completed {
        session_id: Uuid,
        message: String,
    },
    Failed {
        session_id: Uuid,
        message: String,
        exit_code: i32,
    },
    /// Protocol-level failure on this connection (malformed request,
    /// duplicate start); not tied to a job event.
    Error {
        message: String,
    },
}

impl ServerMessage {
    /// Pair a supervisor event with the session it belongs to.
    pub fn from_event(session_id: Uuid, event: JobEvent) -> Self {
        match event {
            JobEvent::Log { message } => Self::Log {
                session_id,
                message,
            },
            JobEvent::Completed { message } => Self::Completed {
                session_id,
                message,
            },
            JobEvent::Failed { message, exit_code } => Self::Failed {
                session_id,
                message,
                exit_code,
            },
        }
    }
}

/// Flatten client-supplied config values to strings.
///
/// Strings pass through verbatim; any other JSON value uses its display
/// form, so `5` becomes `"5"` and `true` becomes `"true"`.
pub fn coerce_config(raw: BTreeMap<String, Value>) -> JobConfig {
    raw.into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn start_job_parses_mixed_scalar_config() {
        let raw = r#"{"type": "start_job", "config": {"epochs": 5, "lr": "0.01", "gpu": true}}"#;
        let ClientMessage::StartJob { config } = serde_json::from_str(raw).unwrap();

        let config = coerce_config(config);
        assert_eq!(config.get("epochs").map(String::as_str), Some("5"));
        assert_eq!(config.get("lr").map(String::as_str), Some("0.01"));
        assert_eq!(config.get("gpu").map(String::as_str), Some("true"));
    }

    #[test]
    fn start_job_config_defaults_to_empty() {
        let ClientMessage::StartJob { config } =
            serde_json::from_str(r#"{"type": "start_job"}"#).unwrap();
        assert!(config.is_empty());
    }

    #[test]
    fn unknown_message_types_are_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type": "stop_job"}"#).is_err());
    }

    #[test]
    fn server_messages_tag_by_type() {
        let session_id = Uuid::new_v4();

        let log = ServerMessage::from_event(
            session_id,
            JobEvent::Log {
                message: "round 1".to_owned(),
            },
        );
        assert_eq!(
            serde_json::to_value(&log).unwrap(),
            json!({"type": "log", "session_id": session_id, "message": "round 1"})
        );

        let failed = ServerMessage::from_event(
            session_id,
            JobEvent::Failed {
                message: "job exited with code 3".to_owned(),
                exit_code: 3,
            },
        );
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({
                "type": "failed",
                "session_id": session_id,
                "message": "job exited with code 3",
                "exit_code": 3,
            })
        );
    }
}
