//! Running `go` behind an ephemeral proxy.

use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::process::Command;

use crate::config::ProxyConfig;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::routing::PatternRouter;
use crate::toolchain::env::proxy_env;

/// Errors starting the wrapped tool.
#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("failed to bind local proxy: {0}")]
    Bind(#[source] std::io::Error),

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Run `program args...` with the proxy injected and return its exit code.
///
/// The translator listens on an ephemeral loopback port for the lifetime
/// of the child and is shut down once it exits.
pub async fn run_go(
    program: &Path,
    args: &[OsString],
    config: ProxyConfig,
    router: Arc<PatternRouter>,
) -> Result<i32, ToolchainError> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(ToolchainError::Bind)?;
    let addr = listener.local_addr().map_err(ToolchainError::Bind)?;
    let proxy_url = format!("http://{addr}");

    let env = proxy_env(
        &proxy_url,
        router.patterns(),
        std::env::var("GOPROXY").ok().as_deref(),
        std::env::var("GONOSUMDB").ok().as_deref(),
    );

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, router);
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tracing::debug!(proxy = %proxy_url, goproxy = %env[0].1, gonosumdb = %env[1].1, "Starting build tool");
    let status = Command::new(program)
        .args(args)
        .envs(env.iter().map(|(k, v)| (*k, v.as_str())))
        .kill_on_drop(true)
        .status()
        .await;

    shutdown.trigger();
    match server_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "Local proxy stopped with error"),
        Err(e) => tracing::warn!(error = %e, "Local proxy task failed"),
    }

    let status = status.map_err(|source| ToolchainError::Spawn {
        program: program.display().to_string(),
        source,
    })?;

    // Killed by a signal: no code to pass through.
    Ok(status.code().unwrap_or(1))
}
