//! modgate
//!
//! Serves private Go modules from package repositories and publishes
//! releases into them.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌────────────────────────────────────────────────┐
//!                        │                    MODGATE                     │
//!                        │                                                │
//!   go toolchain         │  ┌─────────┐    ┌─────────┐    ┌───────────┐   │
//!   ─────────────────────┼─▶│  http   │───▶│protocol │───▶│  routing  │   │
//!   GET /mod/@v/...      │  │ server  │    │ parsing │    │ (globs)   │   │
//!                        │  └─────────┘    └─────────┘    └─────┬─────┘   │
//!                        │                                      ▼         │
//!   modgate publish      │  ┌─────────┐                  ┌───────────┐   │     ┌─────────────┐
//!   ─────────────────────┼─▶│ publish │─────────────────▶│repository │───┼────▶│ CodeArtifact│
//!                        │  │pipeline │                  │  adapter  │   │     └─────────────┘
//!                        │  └─────────┘                  └───────────┘   │
//!                        │                                                │
//!                        │  config · lifecycle · observability · toolchain│
//!                        └────────────────────────────────────────────────┘
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use modgate::lifecycle::{load_routes, signals, Shutdown};
use modgate::observability::{logging, metrics};
use modgate::publish::{GitCli, PublishPipeline};
use modgate::toolchain::run_go;
use modgate::{HttpServer, ProxyConfig};

#[derive(Parser)]
#[command(name = "modgate")]
#[command(version, about = "Private Go module proxy and release publisher", long_about = None)]
struct Cli {
    /// Configuration file (default: $MODGATE_CONFIG, then nearest .modgate.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the module proxy
    Serve {
        /// Listen address, overriding the configuration
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Publish the module in the current directory at a tag
    Publish {
        /// Version tag, e.g. v1.2.3
        version: String,
    },
    /// Run the go tool with the proxy injected
    Go {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<OsString>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "modgate failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let work_dir = std::env::current_dir()?;

    let loaded = load_routes(cli.config.as_deref(), &work_dir);
    let level = match &loaded {
        Ok((_, config, _)) => config.observability.log_level.clone(),
        Err(_) => "info".to_string(),
    };
    logging::init_logging(&level);

    let (path, config, router) = loaded?;
    tracing::info!(
        config = %path.display(),
        routes = router.len(),
        "Configuration loaded"
    );
    let router = Arc::new(router);

    match cli.command {
        Commands::Serve { bind } => {
            serve(config, router, bind).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Publish { version } => {
            let pipeline = PublishPipeline::new(router, Arc::new(GitCli::new()), work_dir);
            let report = pipeline.publish(&version).await?;
            tracing::info!(
                module = %report.module,
                version = %report.version,
                pattern = %report.pattern,
                "Release published"
            );
            Ok(ExitCode::SUCCESS)
        }
        Commands::Go { args } => {
            let code = run_go(Path::new("go"), &args, config, router).await?;
            Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
        }
    }
}

async fn serve(
    config: ProxyConfig,
    router: Arc<modgate::PatternRouter>,
    bind: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let bind_address = bind.unwrap_or_else(|| config.listener.bind_address.clone());

    tracing::info!(
        bind_address = %bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        fallthrough_on_missing = config.fallthrough_on_missing,
        "Starting proxy"
    );

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let shutdown = Arc::new(Shutdown::new());
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config, router);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
