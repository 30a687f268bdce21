use std::{fmt, sync::Arc};

use chrono::Duration;
use tracing::warn;

use simwatch_core::{JobSupervisor, RevocationCache, RunnerConfig, TokenService};

use crate::auth::operators::OperatorDirectory;
use crate::infra::config::Config;
use crate::ws::SessionRegistry;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub operators: Arc<OperatorDirectory>,
    pub tokens: Arc<TokenService>,
    pub supervisor: JobSupervisor,
    pub sessions: Arc<SessionRegistry>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    /// Wire up the shared services from a loaded configuration.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let operators = match &config.operators_file {
            Some(path) => OperatorDirectory::load(path)?,
            None => OperatorDirectory::default(),
        };
        if operators.is_empty() {
            warn!("operator directory is empty; all logins will be rejected");
        }

        let revocations = Arc::new(RevocationCache::new());
        let tokens = TokenService::new(
            config.token_secret.as_bytes(),
            Duration::hours(config.token_ttl_hours),
            revocations,
        );
        let runner = RunnerConfig {
            program: config.job_program.clone(),
            script: config.job_script.clone(),
            project_root: config.project_root.clone(),
        };

        Ok(Self {
            config: Arc::new(config),
            operators: Arc::new(operators),
            tokens: Arc::new(tokens),
            supervisor: JobSupervisor::new(runner),
            sessions: Arc::new(SessionRegistry::new()),
        })
    }
}
