//! logbook-server - structured log ingestion, search and alerting over HTTP.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use logbook_alerts::WebhookConfig;
use logbook_server::{LogbookServer, ServerConfig};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "logbook-server")]
#[command(about = "Structured logging server with alerting")]
#[command(version)]
struct Cli {
    /// Log output format
    #[arg(long, value_enum, default_value = "text", env = "LOGBOOK_LOG_FORMAT", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the server
    Serve(ServeArgs),

    /// Validate a config file and print the effective configuration
    CheckConfig {
        /// Path to config file
        #[arg(short, long, env = "LOGBOOK_CONFIG")]
        config: PathBuf,
    },

    /// Generate a sample config file
    InitConfig {
        /// Path to write config
        #[arg(short, long, default_value = "logbook.toml")]
        output: PathBuf,
    },
}

#[derive(clap::Args)]
struct ServeArgs {
    /// Path to config file
    #[arg(short, long, env = "LOGBOOK_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "LOGBOOK_BIND")]
    bind: Option<SocketAddr>,

    /// Store entries in this JSON-lines file instead of memory
    #[arg(long, env = "LOGBOOK_STORAGE_PATH")]
    storage_path: Option<PathBuf>,

    /// Maximum number of entries kept
    #[arg(long, env = "LOGBOOK_MAX_ENTRIES")]
    max_entries: Option<usize>,

    /// Accepted API key (repeatable)
    #[arg(long = "api-key", env = "LOGBOOK_API_KEYS", value_delimiter = ',')]
    api_keys: Vec<String>,

    /// Webhook to notify on ERROR and CRITICAL entries (repeatable)
    #[arg(long = "webhook-url", env = "LOGBOOK_WEBHOOK_URLS", value_delimiter = ',')]
    webhook_urls: Vec<String>,

    /// Also write alerts to this process's log
    #[arg(long, env = "LOGBOOK_LOG_ALERTS")]
    log_alerts: bool,

    /// Delete entries older than this many seconds
    #[arg(long, env = "LOGBOOK_RETENTION_SECS")]
    retention_secs: Option<u64>,

    /// Requests allowed per client per second
    #[arg(long, env = "LOGBOOK_RATE_LIMIT")]
    rate_limit: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    match cli.command {
        Commands::Serve(args) => serve(args).await?,
        Commands::CheckConfig { config } => check_config(&config)?,
        Commands::InitConfig { output } => init_config(&output)?,
    }

    Ok(())
}

fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("logbook=info".parse()?);
    let (text, json) = match format {
        LogFormat::Text => (Some(fmt::layer()), None),
        LogFormat::Json => (None, Some(fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(json)
        .init();
    Ok(())
}

fn load_config(args: ServeArgs) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!(config = %path.display(), "loading config");
            ServerConfig::from_file(path)?
        }
        None => ServerConfig::default(),
    };

    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(path) = args.storage_path {
        config = config.with_file_storage(path);
    }
    if let Some(max_entries) = args.max_entries {
        config = config.with_max_entries(max_entries);
    }
    for key in args.api_keys {
        config = config.with_api_key(key);
    }
    for (i, url) in args.webhook_urls.into_iter().enumerate() {
        config = config.with_webhook(WebhookConfig::new(format!("webhook-{i}"), url)?);
    }
    if args.log_alerts {
        config = config.with_log_alerts(true);
    }
    if let Some(secs) = args.retention_secs {
        config = config.with_retention(std::time::Duration::from_secs(secs));
    }
    if let Some(limit) = args.rate_limit {
        config = config.with_rate_limit(limit, std::time::Duration::from_secs(1));
    }

    config.validate()?;
    Ok(config)
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = load_config(args)?;
    info!(
        bind = %config.bind_addr,
        storage = ?config.storage.backend,
        "starting logbook-server"
    );

    let server = LogbookServer::from_config(config)?;
    server.serve_with_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

fn check_config(path: &Path) -> anyhow::Result<()> {
    let config = ServerConfig::from_file(path)?;
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn init_config(output: &Path) -> anyhow::Result<()> {
    if output.exists() {
        anyhow::bail!("{} already exists", output.display());
    }

    let config = ServerConfig::default();
    std::fs::write(output, toml::to_string_pretty(&config)?)?;
    println!("Wrote sample config to {}", output.display());
    Ok(())
}
