use dashmap::DashMap;
use std::fmt;
use std::io::{self, BufRead};
use std::sync::Arc;
use thiserror::Error;
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::jobs::events::{JobEvent, JobEventSink};
use crate::jobs::runner::{JobConfig, RunnerConfig};

/// Lifecycle of one supervised job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Session reserved, command under construction
    Pending,
    /// Process spawned, relay attached
    Running,
}

#[derive(Error, Debug)]
pub enum JobError {
    #[error("session {0} already has a running job")]
    DuplicateSession(Uuid),
}

struct JobSession {
    state: JobState,
    relay: Option<JoinHandle<()>>,
}

/// Launches external jobs and relays their console output, one live job
/// per session.
///
/// Each started job owns a child process and a relay task. The relay
/// forwards lines from the job's merged output stream to the session's
/// sink as they arrive, reaps the process once the stream closes, emits
/// exactly one terminal event, and releases the session. `start` never
/// waits for any of that.
#[derive(Clone)]
pub struct JobSupervisor {
    runner: Arc<RunnerConfig>,
    sessions: Arc<DashMap<Uuid, JobSession>>,
}

impl fmt::Debug for JobSupervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobSupervisor")
            .field("program", &self.runner.program)
            .field("script", &self.runner.script)
            .field("active_jobs", &self.sessions.len())
            .finish()
    }
}

impl JobSupervisor {
    pub fn new(runner: RunnerConfig) -> Self {
        Self {
            runner: Arc::new(runner),
            sessions: Arc::new(DashMap::new()),
        }
    }

    /// Launch a job for a session and return as soon as it is off the
    /// ground.
    ///
    /// Fails with [`JobError::DuplicateSession`] while the session already
    /// has a live job; the running job is unaffected. A spawn failure is
    /// not an error to the caller: it is delivered through the sink as a
    /// single `Failed` event with exit code `-1`, and the session is
    /// released immediately.
    pub async fn start(
        &self,
        session_id: Uuid,
        config: JobConfig,
        sink: Arc<dyn JobEventSink>,
    ) -> Result<(), JobError> {
        use dashmap::mapref::entry::Entry;

        // Reserve the session before any slow work so a racing second
        // start is rejected without touching this one.
        match self.sessions.entry(session_id) {
            Entry::Occupied(_) => return Err(JobError::DuplicateSession(session_id)),
            Entry::Vacant(slot) => {
                slot.insert(JobSession {
                    state: JobState::Pending,
                    relay: None,
                });
            }
        }

        debug!(
            %session_id,
            program = %self.runner.program,
            script = %self.runner.script,
            args = config.len(),
            "launching job"
        );

        let (mut child, output) = match self.launch(&config) {
            Ok(launched) => launched,
            Err(err) => {
                warn!(%session_id, error = %err, "job failed to launch");
                sink.emit(
                    session_id,
                    JobEvent::Failed {
                        message: err.to_string(),
                        exit_code: -1,
                    },
                )
                .await;
                self.sessions.remove(&session_id);
                return Ok(());
            }
        };

        let sessions = Arc::clone(&self.sessions);
        let relay = tokio::spawn(async move {
            let stream_ok = relay_output(output, session_id, sink.as_ref()).await;

            let code = match child.wait().await {
                Ok(status) => status.code(),
                Err(err) => {
                    error!(%session_id, error = %err, "failed to reap job process");
                    None
                }
            };

            let event = match code {
                Some(0) if stream_ok => JobEvent::Completed {
                    message: "job completed successfully".to_owned(),
                },
                Some(0) => JobEvent::Failed {
                    message: "job output stream failed".to_owned(),
                    exit_code: -1,
                },
                Some(code) => JobEvent::Failed {
                    message: format!("job exited with code {code}"),
                    exit_code: code,
                },
                None => JobEvent::Failed {
                    message: "job terminated without an exit code".to_owned(),
                    exit_code: -1,
                },
            };

            info!(%session_id, exit_code = code.unwrap_or(-1), "job finished");
            sink.emit(session_id, event).await;
            sessions.remove(&session_id);
        });

        if let Some(mut session) = self.sessions.get_mut(&session_id) {
            session.state = JobState::Running;
            session.relay = Some(relay);
        }

        Ok(())
    }

    /// Spawn the job with stdout and stderr funneled into one anonymous
    /// pipe, so interleaved output reaches the relay in the exact order
    /// the process produced it.
    ///
    /// The parent's write ends close when the `Command` drops; the read
    /// end sees end-of-stream once the child has exited.
    fn launch(&self, config: &JobConfig) -> io::Result<(Child, io::PipeReader)> {
        let (reader, writer) = io::pipe()?;
        let mut command = self.runner.command(config);
        command.stdout(writer.try_clone()?).stderr(writer);
        let child = command.spawn()?;
        Ok((child, reader))
    }

    /// Current state of a session's job, if it has one.
    pub fn state(&self, session_id: &Uuid) -> Option<JobState> {
        self.sessions.get(session_id).map(|session| session.state)
    }

    /// Number of sessions with a live job.
    pub fn active_jobs(&self) -> usize {
        self.sessions.len()
    }

    /// Wait for every in-flight relay to deliver its terminal event.
    ///
    /// Jobs are not killed; this waits for them. Used where losing a
    /// terminal event matters more than stopping quickly.
    pub async fn shutdown(&self) {
        let ids: Vec<Uuid> = self.sessions.iter().map(|entry| *entry.key()).collect();
        for id in ids {
            let relay = self
                .sessions
                .get_mut(&id)
                .and_then(|mut session| session.relay.take());
            if let Some(relay) = relay {
                let _ = relay.await;
            }
        }
    }
}

/// Forward every line of the merged output stream to the sink, in
/// production order.
///
/// The pipe is read on a blocking worker; lines hop to the async side
/// through a channel that preserves their order. Returns `false` if the
/// stream errored before end-of-stream; the caller still reaps the
/// process.
async fn relay_output(output: io::PipeReader, session_id: Uuid, sink: &dyn JobEventSink) -> bool {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let reader = tokio::task::spawn_blocking(move || {
        for line in io::BufReader::new(output).lines() {
            match line {
                Ok(line) => {
                    // Receiver gone means the relay was dropped; stop quietly
                    if tx.send(line).is_err() {
                        return true;
                    }
                }
                Err(err) => {
                    warn!(%session_id, error = %err, "job output stream failed mid-run");
                    return false;
                }
            }
        }
        true
    });

    while let Some(line) = rx.recv().await {
        sink.emit(session_id, JobEvent::Log { message: line }).await;
    }

    reader.await.unwrap_or(false)
}
