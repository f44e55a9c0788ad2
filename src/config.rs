use anyhow::{Context, Result};
use clap::Parser;
use std::{env, str::FromStr, time::Duration};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub blob_root: String,
    pub database_url: String,
    pub request_timeout: Duration,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Attachment migration service")]
pub struct Args {
    /// Host to bind to (overrides MIGRATOR_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides MIGRATOR_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory holding blob containers (overrides MIGRATOR_BLOB_ROOT)
    #[arg(long)]
    pub blob_root: Option<String>,

    /// Database URL (overrides MIGRATOR_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Deadline for one copy request in seconds (overrides MIGRATOR_REQUEST_TIMEOUT_SECS)
    #[arg(long)]
    pub request_timeout_secs: Option<u64>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        Ok((Self::merge(args)?, migrate))
    }

    /// CLI values win; the environment fills the gaps; then defaults.
    fn merge(args: Args) -> Result<Self> {
        let env_host = env::var("MIGRATOR_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = parse_env("MIGRATOR_PORT", 3000u16)?;
        let env_blob_root =
            env::var("MIGRATOR_BLOB_ROOT").unwrap_or_else(|_| "./data/blobs".into());
        let env_db = env::var("MIGRATOR_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/meta/migrator.db".into());
        let env_timeout = parse_env("MIGRATOR_REQUEST_TIMEOUT_SECS", 60u64)?;

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            blob_root: args.blob_root.unwrap_or(env_blob_root),
            database_url: args.database_url.unwrap_or(env_db),
            request_timeout: Duration::from_secs(args.request_timeout_secs.unwrap_or(env_timeout)),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", key, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", key)),
    }
}
