//! Demo server hosting the dispatch core behind the Axum adapter.
//!
//! Registers a handful of routes and a logging interceptor, then serves
//! them. Useful for poking at the engine with curl; embedders will
//! normally wire [`micro_router::App`] into their own transport instead.

use clap::Parser;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use micro_router::config::{load_config, AppConfig};
use micro_router::errors::BoxError;
use micro_router::interceptor::{Flow, InterceptContext, Interceptor};
use micro_router::observability::{logging, metrics};
use micro_router::{App, HttpServer};

#[derive(Parser, Debug)]
#[command(name = "micro-router", about = "Demo server for the dispatch core")]
struct Cli {
    /// Path to the TOML config file. Defaults are used when absent.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Include failure detail in 500 bodies (overrides the config).
    #[arg(long)]
    debug: bool,
}

/// Logs every request it sees and lets dispatch continue.
struct RequestLog;

impl Interceptor for RequestLog {
    fn before(&self, ctx: &mut InterceptContext<'_>) -> Result<Flow, BoxError> {
        tracing::info!(method = %ctx.method, path = %ctx.path, "Incoming request");
        Ok(Flow::Continue)
    }
}

fn build_app(config: &AppConfig, debug: bool) -> Result<App, BoxError> {
    let mut app = App::new()
        .with_base_path(&config.router.base_path)
        .with_debug(config.router.debug || debug);

    app.interceptor("request-log", Arc::new(RequestLog));
    app.before(["request-log"]);

    app.get("/health", |_req, res, _params| {
        res.as_json(&json!({"status": "ok"}), None, false);
        Ok(())
    })?;

    app.get("/hello/{name}", |_req, res, params| {
        res.set_response(format!("Hello, {}!", params[0]), None, None, false);
        Ok(())
    })?;

    app.get("/items/{id:int}", |_req, res, params| {
        res.as_json(&json!({"item": params[0]}), None, false);
        Ok(())
    })?;

    Ok(app)
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();

    let config = if cli.config.exists() {
        load_config(&cli.config)?
    } else {
        AppConfig::default()
    };

    logging::init(&config.observability.log_filter);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        base_path = %config.router.base_path,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let app = Arc::new(build_app(&config, cli.debug)?);
    tracing::info!(routes = app.routes().len(), "Routes registered");

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    HttpServer::new(app, &config).run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
