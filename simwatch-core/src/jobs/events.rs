use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events a supervised job delivers to its session, in order.
///
/// A job's stream is zero or more `Log` events followed by exactly one
/// terminal event, `Completed` or `Failed`. An `exit_code` of `-1` marks a
/// job that never produced one: the launch itself failed, the process was
/// killed by a signal, or its output stream broke mid-run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobEvent {
    /// One line of console output
    Log { message: String },
    /// Terminal: the process exited cleanly
    Completed { message: String },
    /// Terminal: the job failed to launch, exited non-zero, or lost its
    /// output stream
    Failed { message: String, exit_code: i32 },
}

impl JobEvent {
    /// Whether this event ends the session's stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobEvent::Completed { .. } | JobEvent::Failed { .. })
    }
}

/// Destination for job events, keyed by the originating session.
///
/// Implementations must be callable from the relay task, which is not the
/// task that called [`JobSupervisor::start`](crate::jobs::JobSupervisor::start).
/// Delivery is best-effort by design: a sink whose receiver is gone drops
/// the event rather than failing the job.
#[async_trait]
pub trait JobEventSink: Send + Sync {
    async fn emit(&self, session_id: Uuid, event: JobEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_tag_by_kind() {
        let log = serde_json::to_value(JobEvent::Log {
            message: "round 1".to_owned(),
        })
        .unwrap();
        assert_eq!(log["kind"], "log");
        assert_eq!(log["message"], "round 1");
        assert!(log.get("exit_code").is_none());

        let failed = serde_json::to_value(JobEvent::Failed {
            message: "job exited with code 3".to_owned(),
            exit_code: 3,
        })
        .unwrap();
        assert_eq!(failed["kind"], "failed");
        assert_eq!(failed["exit_code"], 3);
    }

    #[test]
    fn only_completed_and_failed_are_terminal() {
        assert!(!JobEvent::Log {
            message: String::new()
        }
        .is_terminal());
        assert!(JobEvent::Completed {
            message: String::new()
        }
        .is_terminal());
        assert!(JobEvent::Failed {
            message: String::new(),
            exit_code: -1
        }
        .is_terminal());
    }
}
