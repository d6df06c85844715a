use anyhow::{Context, Result};
use clap::Parser;
use std::env;

const DEFAULT_ALLOWED_ORIGINS: &str =
    "http://localhost:3000,http://127.0.0.1:3000,http://localhost:5500,http://127.0.0.1:5500";

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub default_plant: String,
    pub allowed_origins: Vec<String>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "IBC container tracking API")]
pub struct Args {
    /// Host to bind to (overrides IBC_TRACKER_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides IBC_TRACKER_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Plant used as default location and center (overrides IBC_TRACKER_DEFAULT_PLANT)
    #[arg(long)]
    pub default_plant: Option<String>,

    /// Comma-separated CORS origins, `*` for any (overrides IBC_TRACKER_ALLOWED_ORIGINS)
    #[arg(long)]
    pub allowed_origins: Option<String>,

    /// Apply the schema and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        Ok((Self::from_args(args)?, migrate))
    }

    /// Merge explicit arguments over the environment.
    pub fn from_args(args: Args) -> Result<Self> {
        // --- Environment fallback ---
        let env_host = env::var("IBC_TRACKER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("IBC_TRACKER_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing IBC_TRACKER_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 8000,
            Err(err) => return Err(err).context("reading IBC_TRACKER_PORT"),
        };
        let env_db =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://./data/ibc_tracker.db".into());
        let env_plant =
            env::var("IBC_TRACKER_DEFAULT_PLANT").unwrap_or_else(|_| "Planta Bogotá".into());
        let env_origins = env::var("IBC_TRACKER_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.into());

        // --- Merge ---
        let default_plant = args.default_plant.unwrap_or(env_plant).trim().to_string();
        if default_plant.is_empty() {
            anyhow::bail!("default plant must not be blank");
        }

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            database_url: args.database_url.unwrap_or(env_db),
            default_plant,
            allowed_origins: split_origins(&args.allowed_origins.unwrap_or(env_origins)),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
