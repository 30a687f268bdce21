use anyhow::Context;
use std::{env, path::PathBuf};

/// Server configuration loaded via environment variables (and optionally a
/// `.env` file).
#[derive(Debug, Clone)]
pub struct Config {
    // Server settings
    pub server_host: String,
    pub server_port: u16,

    // Token settings
    pub token_secret: String,
    pub token_ttl_hours: i64,

    // Job runner settings
    pub job_program: String,
    pub job_script: String,
    pub project_root: PathBuf,

    // Operator credentials
    pub operators_file: Option<PathBuf>,

    // CORS settings
    pub cors_allowed_origins: Vec<String>,

    // Development settings
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from any variable source.
    ///
    /// Absent optional values fall back to defaults; a value that is
    /// present but unparseable is a startup error, never a silent default.
    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            server_host: get("SIMWATCH_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            server_port: match get("SIMWATCH_PORT") {
                Some(raw) => raw
                    .parse()
                    .with_context(|| format!("SIMWATCH_PORT {raw:?} is not a valid port"))?,
                None => 8000,
            },

            token_secret: get("SIMWATCH_TOKEN_SECRET")
                .context("SIMWATCH_TOKEN_SECRET must be set")?,
            token_ttl_hours: match get("SIMWATCH_TOKEN_TTL_HOURS") {
                Some(raw) => raw.parse().with_context(|| {
                    format!("SIMWATCH_TOKEN_TTL_HOURS {raw:?} is not a number of hours")
                })?,
                None => 24,
            },

            job_program: get("SIMWATCH_JOB_PROGRAM").unwrap_or_else(|| "python".to_string()),
            job_script: get("SIMWATCH_JOB_SCRIPT").context("SIMWATCH_JOB_SCRIPT must be set")?,
            project_root: get("SIMWATCH_PROJECT_ROOT")
                .context("SIMWATCH_PROJECT_ROOT must be set")?
                .into(),

            operators_file: get("SIMWATCH_OPERATORS_FILE").map(PathBuf::from),

            cors_allowed_origins: get("SIMWATCH_CORS_ORIGINS")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),

            dev_mode: match get("SIMWATCH_DEV_MODE") {
                Some(raw) => raw
                    .parse()
                    .with_context(|| format!("SIMWATCH_DEV_MODE {raw:?} is not a boolean"))?,
                None => false,
            },
        })
    }

    /// Validate that the configured project root exists before any job is
    /// launched against it. The server calls this once during startup.
    pub fn ensure_project_root(&self) -> anyhow::Result<()> {
        if !self.project_root.is_dir() {
            anyhow::bail!(
                "SIMWATCH_PROJECT_ROOT {:?} is not a directory",
                self.project_root
            );
        }
        Ok(())
    }
}
