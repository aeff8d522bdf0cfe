use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use serde_json::{Value, json};
use std::time::Duration;

use credmark_terminal::config::GATEWAY;
use credmark_terminal::log_builder;
use credmark_terminal::gateway::{
    BlockNumber, ChainContext, ComputationGateway, ComputationRequest, GatewayOutcome, HistoricalWindow, HttpGateway,
};

/// Runs one model on the gateway and prints the outcome as JSON.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model slug, e.g. `cmk-price`
    slug: String,

    /// Model input as a JSON literal
    #[arg(long, default_value = "{}")]
    input: String,

    #[arg(long, default_value_t = GATEWAY.default_chain_id)]
    chain_id: u64,

    /// Block number or `latest`
    #[arg(long, default_value = "latest")]
    block: String,

    /// Pin a model version instead of the gateway's latest
    #[arg(long)]
    model_version: Option<String>,

    /// Historical window, e.g. "30 days". Needs `--interval`.
    #[arg(long, requires = "interval")]
    window: Option<String>,

    /// Historical sampling interval, e.g. "1 day". Needs `--window`.
    #[arg(long, requires = "window")]
    interval: Option<String>,

    #[arg(long, default_value = GATEWAY.url)]
    gateway_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    log_builder(log::LevelFilter::Warn, env_logger::Env::default()).init();

    let args = Args::parse();
    let request = build_request(&args)?;
    request.validate().map_err(|e| anyhow!(e))?;

    let gateway = HttpGateway::new(args.gateway_url.clone(), Duration::from_millis(GATEWAY.timeout_ms))?;
    log::info!("Running {} via {}", request.slug(), gateway.signature());

    let outcome = gateway.run(&request).await;
    let (printed, failed) = outcome_json(outcome);
    println!(
        "{}",
        serde_json::to_string_pretty(&printed).context("failed to format the outcome")?
    );
    if failed {
        bail!("{} did not succeed", args.slug);
    }
    Ok(())
}

fn build_request(args: &Args) -> Result<ComputationRequest> {
    let input: Value = serde_json::from_str(&args.input)
        .with_context(|| format!("--input is not valid JSON: {}", args.input))?;
    let block: BlockNumber = args.block.parse().map_err(|e: String| anyhow!(e))?;
    let mut context = ChainContext::latest(args.chain_id).at_block(block);
    if let Some(version) = &args.model_version {
        context = context.with_version(version.clone());
    }

    let base = ComputationRequest::new(args.slug.clone(), input, context);
    Ok(match (&args.window, &args.interval) {
        (Some(window), Some(interval)) => {
            ComputationRequest::historical(&base, &HistoricalWindow::new(window.clone(), interval.clone()))
        }
        _ => base,
    })
}

/// `{"output": ...}` or `{"error": ...}`, plus whether it was a failure.
fn outcome_json(outcome: GatewayOutcome) -> (Value, bool) {
    match outcome {
        GatewayOutcome::Success(output) => (json!({ "output": output }), false),
        GatewayOutcome::DomainError(error) => (json!({ "error": error }), true),
        GatewayOutcome::TransportError(message) => (json!({ "transportError": message }), true),
    }
}
