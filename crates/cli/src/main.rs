//! Athena IPAM command line.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse arguments** with `clap`.
//! 2. **Load configuration**: defaults, `athena.toml`, then `ATHENA_*`
//!    environment variables (see [`config`]).
//! 3. **Wire observability**: a JSON `tracing-subscriber` layer on stderr and,
//!    when `--otlp-endpoint` is set, an OpenTelemetry OTLP exporter.
//! 4. **Construct infrastructure**: an [`transport::HttpTransport`] injected
//!    into [`client::IpamClient`].
//! 5. **Run one command** on a current-thread runtime and print its JSON
//!    result to stdout.

mod commands;
mod config;
mod telemetry;

use anyhow::Context;
use clap::Parser;
use client::IpamClient;
use transport::HttpTransport;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let _telemetry = telemetry::init(cli.otlp_endpoint.as_deref())?;

    let config = config::load(&cli.config)?;
    tracing::debug!(
        scheme = %config.scheme,
        authority = %config.authority(),
        verify_ssl = config.verify_ssl,
        "Configuration loaded"
    );

    let transport = HttpTransport::new(&config).context("failed to build HTTP transport")?;
    let client = IpamClient::new(transport, config);

    let output = commands::execute(&client, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
