#![forbid(unsafe_code)]

mod config;
mod options;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use depgate_handler::handler::{self, HandlerConfig};
use depgate_handler::{Metrics, Request, UsageTracker};
use depgate_schema::Schema;
use depgate_validation::Accumulation;
use futures_util::FutureExt;
use serde::Serialize;
use structopt::StructOpt;
use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use config::Config;
use options::{Command, Options};

// Use Jemalloc only for musl-64 bits platforms
#[cfg(all(target_env = "musl", target_pointer_width = "64"))]
#[global_allocator]
static ALLOC: jemallocator::Jemalloc = jemallocator::Jemalloc;

fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

#[derive(Serialize)]
struct FileReport<'a> {
    file: &'a str,
    #[serde(flatten)]
    response: depgate_handler::CheckResponse,
}

fn check_files(schema: &Schema, accumulation: Accumulation, files: &[String]) -> Result<()> {
    let mut failed = 0;

    for file in files {
        let query = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to load document '{}'.", file))?;
        let response = match depgate_handler::check(schema, &Request::new(query), accumulation) {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(file = %file, error = %err, "Failed to parse document.");
                failed += 1;
                continue;
            }
        };

        if !response.is_valid() {
            for err in &response.errors {
                tracing::warn!(file = %file, error = %err, "Validation error.");
            }
            failed += 1;
        }

        println!(
            "{}",
            serde_json::to_string(&FileReport { file, response })?
        );
    }

    if failed > 0 {
        bail!("{} of {} documents failed validation.", failed, files.len());
    }
    Ok(())
}

async fn serve(config: Config, schema: Schema) -> Result<()> {
    let metrics = Metrics::new().context("Failed to register metrics.")?;
    let handler_config = HandlerConfig {
        schema: Arc::new(schema),
        accumulation: config.accumulation,
        tracker: UsageTracker::default(),
        metrics: Arc::new(metrics),
    };

    let bind_addr: SocketAddr = config
        .bind
        .parse()
        .context(format!("Failed to parse bind addr '{}'", config.bind))?;
    let (addr, server) = warp::serve(handler::routes(handler_config))
        .bind_with_graceful_shutdown(bind_addr, signal::ctrl_c().map(|_| ()));
    tracing::info!(addr = %addr, accumulation = ?config.accumulation, "Listening");
    server.await;
    tracing::info!("Server shutdown");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let options: Options = Options::from_args();
    init_tracing();

    let config = Config::load(&options.config)?;
    let schema = config.load_schema()?;
    tracing::info!(schema = %config.schema.display(), "Schema loaded.");

    match options.command {
        Command::Serve => serve(config, schema).await,
        Command::Check {
            per_operation,
            files,
        } => {
            let accumulation = if per_operation {
                Accumulation::Operation
            } else {
                config.accumulation
            };
            check_files(&schema, accumulation, &files)
        }
    }
}
