use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::process::Command;

/// Job configuration as received from the client.
///
/// Flattened into `--key value` argument pairs in lexicographic key order;
/// keys and values are passed through unvalidated, malformed ones are the
/// launched process's problem.
pub type JobConfig = BTreeMap<String, String>;

/// Where and how external jobs are launched.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Interpreter or binary that runs the job
    pub program: String,
    /// Script handed to the program as its first argument
    pub script: String,
    /// Working directory for the spawned process
    pub project_root: PathBuf,
}

impl RunnerConfig {
    /// Build the launch command: `program script --key value ...` with the
    /// working directory pinned to the project root. Output wiring is the
    /// supervisor's job; both streams end up in one merged pipe.
    pub(crate) fn command(&self, config: &JobConfig) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(&self.script);
        for (key, value) in config {
            cmd.arg(format!("--{key}")).arg(value);
        }
        cmd.current_dir(&self.project_root);
        cmd
    }
}
