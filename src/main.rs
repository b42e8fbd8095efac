use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use jobharvest::auth;
use jobharvest::collectors::Platform;
use jobharvest::config::{Command, Config, HarvestArgs};
use jobharvest::harvest::{self, SourceSpec};
use jobharvest::host::HttpPageHost;
use jobharvest::routes::{self, AppState};

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("jobharvest=info,tower_http=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(config.log_json);

    match config.resolved_command() {
        Command::Serve {
            listen_addr,
            api_token,
            harvest,
        } => serve(&listen_addr, api_token, &harvest).await,
        Command::Harvest {
            query,
            location,
            platforms,
            urls,
            budget,
            harvest,
        } => run_harvest(query, &location, platforms, urls, budget, &harvest).await,
        Command::Token => {
            println!("{}", auth::generate_token());
            Ok(())
        }
    }
}

async fn serve(listen_addr: &str, api_token: Option<String>, args: &HarvestArgs) -> anyhow::Result<()> {
    let host = HttpPageHost::new(args.fetch_timeout())?;
    let shutdown = host.shutdown_token();

    let mut options = args.to_options();
    options.cancel = shutdown.clone();

    if api_token.is_none() {
        tracing::warn!("No API token configured, /api/v1 is open");
    }
    let state = AppState {
        host: Arc::new(host),
        options,
        api_token_hash: api_token.as_deref().map(auth::hash_token),
    };
    let app = routes::app(state);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!("Listening on {listen_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received, exiting gracefully");
            shutdown.cancel();
        })
        .await?;

    Ok(())
}

async fn run_harvest(
    query: Option<String>,
    location: &str,
    platforms: Vec<Platform>,
    urls: Vec<String>,
    budget: usize,
    args: &HarvestArgs,
) -> anyhow::Result<()> {
    let mut sources: Vec<SourceSpec> = urls.into_iter().map(SourceSpec::new).collect();
    if let Some(query) = query.as_deref() {
        let platforms = if platforms.is_empty() {
            Platform::ALL.to_vec()
        } else {
            platforms
        };
        sources.extend(harvest::search_sources(query, location, &platforms));
    }

    let host = HttpPageHost::new(args.fetch_timeout())?;
    let shutdown = host.shutdown_token();
    let mut options = args.to_options();
    options.cancel = shutdown.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, returning partial results");
            shutdown.cancel();
        }
    });

    let result = harvest::start_harvest(&host, &sources, budget, &options, |source, page, items| {
        tracing::info!("Source '{source}' page {page}: {items} records so far");
    })
    .await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
