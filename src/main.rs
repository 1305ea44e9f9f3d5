use clap::Parser;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use trader_runner::app::report::RUN_REPORT_FILE;
use trader_runner::config::LogFormat;
use trader_runner::utils::{logger, validation::Validate};
use trader_runner::{
    build_bootstrap_sequence, Backends, CliConfig, JsonRpcClient, LocalStorage, RunReport,
    RunnerConfig, RunnerError, StepSequence, SystemCommandRunner,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliConfig::parse();

    match args.log_format {
        LogFormat::Text => logger::init_cli_logger(args.verbose),
        LogFormat::Json => logger::init_json_logger(args.verbose),
    }

    tracing::info!("🚀 Starting trader-runner");

    let mut config = match args.resolve() {
        Ok(config) => config,
        Err(e) => exit_with(e),
    };

    if config.chain.rpc_url.is_none() {
        match prompt_rpc_url().await {
            Ok(rpc) => config.chain.rpc_url = Some(rpc),
            Err(e) => exit_with(e),
        }
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        exit_with(e);
    }

    let run_id = args
        .run_id
        .clone()
        .unwrap_or_else(|| format!("run_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S")));

    let config = Arc::new(config);
    let rpc_url = match config.rpc_url() {
        Ok(url) => url.to_string(),
        Err(e) => exit_with(e),
    };
    let rpc = match JsonRpcClient::new(
        rpc_url,
        config.chain.filter_probe_error.clone(),
        config.request_timeout(),
    ) {
        Ok(rpc) => rpc,
        Err(e) => exit_with(e),
    };

    let storage = Arc::new(LocalStorage::new(config.working_directory()));
    if let Err(e) = storage.ensure_base_dir() {
        exit_with(e);
    }
    let backends = Backends {
        rpc: Arc::new(rpc),
        runner: Arc::new(SystemCommandRunner::new()),
        storage: storage.clone(),
    };

    let mut sequence = match build_bootstrap_sequence(config.clone(), backends, run_id.clone()) {
        Ok(sequence) => sequence,
        Err(e) => exit_with(e),
    };
    sequence.filter(&args.only, &args.skip);

    display_summary(&config, &run_id, &sequence);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No commands will be executed");
        return Ok(());
    }

    match sequence.execute_all().await {
        Ok(context) => {
            let report = RunReport::from_context(&context);
            let report_path = config.store_file(RUN_REPORT_FILE);
            if let Err(e) = report.write(storage.as_ref(), &report_path).await {
                tracing::warn!("⚠️ Could not write run report: {}", e);
            }

            tracing::info!("🎉 Bootstrap completed successfully!");
            println!("✅ Trader service is deployed and running");
            if let Some(service_id) = context.service_id {
                println!("🪪 Service id: {}", service_id);
            }
            if let Some(safe) = &context.safe_address {
                println!("🔐 Safe: {}", safe);
            }
            println!("📄 Report: {}", storage.base_path().join(report_path).display());
        }
        Err(e) => exit_with(e),
    }

    Ok(())
}

async fn prompt_rpc_url() -> Result<String, RunnerError> {
    println!("Please enter a GNOSIS RPC URL:");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    match lines.next_line().await? {
        Some(line) if !line.trim().is_empty() => Ok(line.trim().to_string()),
        _ => Err(RunnerError::MissingConfigError {
            field: "chain.rpc_url".to_string(),
        }),
    }
}

fn exit_with(e: RunnerError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ trader-runner failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    std::process::exit(e.severity().exit_code().max(1));
}

fn display_summary(config: &RunnerConfig, run_id: &str, sequence: &StepSequence) {
    println!("📋 Bootstrap Summary:");
    println!("  Run ID: {}", run_id);
    println!(
        "  Service: {} @ {}",
        config.service.repository, config.service.version
    );
    println!("  Working directory: {}", config.working_directory().display());
    println!("  RPC: {}", config.rpc_url().unwrap_or("<unset>"));
    println!("  Chain ID: {}", config.chain.chain_id);
    println!(
        "  Funding threshold: {} xDAI (safe: {} xDAI)",
        config.funding_threshold(),
        config.safe_funding_threshold()
    );
    match config.funding_timeout() {
        Some(timeout) => println!("  Funding timeout: {:?}", timeout),
        None => println!("  Funding timeout: none (waits indefinitely)"),
    }

    println!();
    println!("📝 Execution Order:");
    for (index, (name, description)) in sequence.describe().into_iter().enumerate() {
        println!("  {}. {} - {}", index + 1, name, description);
    }
    println!();
}
