use anyhow::Context;
use clap::Parser;
use std::time::Duration;
use trader_runner::core::{Address, ChainRpc};
use trader_runner::utils::logger;
use trader_runner::utils::validation::validate_url;
use trader_runner::JsonRpcClient;

#[derive(Parser)]
#[command(name = "rpc-check")]
#[command(about = "Probe an RPC endpoint and print native balances")]
struct Args {
    /// JSON-RPC endpoint
    #[arg(long)]
    rpc: String,

    /// Expected error message for the eth_newFilter probe
    #[arg(long, default_value = "Invalid params")]
    filter_probe_error: String,

    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    /// Addresses to query
    addresses: Vec<String>,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    validate_url("rpc", &args.rpc)?;
    let client = JsonRpcClient::new(
        args.rpc.clone(),
        args.filter_probe_error.clone(),
        Duration::from_secs(args.timeout_secs),
    )?;

    let supported = client
        .supports_filters()
        .await
        .with_context(|| format!("probing {}", args.rpc))?;
    println!(
        "🔌 eth_newFilter: {}",
        if supported { "supported" } else { "NOT supported" }
    );

    for raw in &args.addresses {
        let address = Address::parse(raw)?;
        let balance = client
            .get_balance(&address)
            .await
            .with_context(|| format!("querying balance of {}", address))?;
        println!("💰 {}: {} xDAI ({} wei)", address, balance, balance.as_u128());
    }

    if !supported {
        std::process::exit(1);
    }
    Ok(())
}
