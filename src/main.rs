use anyhow::Result;
use env_logger::Builder;
use log::{info, warn, LevelFilter};
use solana_privacy_scanner::analyzer::heuristics::HeuristicId;
use solana_privacy_scanner::monitor::DEFAULT_CLUSTER;
use solana_privacy_scanner::{
    generator, load_snapshot, load_source_unit, scan_wallet, Analyzer, CancellationToken, Report, ScanConfig,
    ScanControl, ScanInput,
};
use solana_pubkey::Pubkey;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_LIMIT: usize = 100;

// Simple CLI without clap
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or_default(),
                record.level(),
                record.args()
            )
        })
        .filter(None, LevelFilter::Info)
        .parse_default_env()
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && (args[1] == "--version" || args[1] == "-v") {
        println!("Solana Privacy Scanner v{}", solana_privacy_scanner::VERSION);
        return Ok(());
    }

    if args.len() > 1 && args[1] == "--list-heuristics" {
        for id in HeuristicId::ALL {
            println!("{:<28} {}", id.as_str(), id.description());
        }
        return Ok(());
    }

    if args.len() < 3 {
        print_usage(&args[0]);
        return Ok(());
    }

    let command = args[1].as_str();
    let target = &args[2];

    // Parse optional arguments
    let mut output_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut cluster = DEFAULT_CLUSTER.to_string();
    let mut limit = DEFAULT_LIMIT;
    let mut timeout: Option<u64> = None;

    let mut i = 3;
    while i < args.len() {
        let value = args.get(i + 1);
        match (args[i].as_str(), value) {
            ("--output" | "-o", Some(value)) => output_path = Some(PathBuf::from(value)),
            ("--config", Some(value)) => config_path = Some(PathBuf::from(value)),
            ("--cluster" | "-c", Some(value)) => cluster = value.clone(),
            ("--limit" | "-l", Some(value)) => limit = value.parse()?,
            ("--timeout" | "-t", Some(value)) => timeout = Some(value.parse()?),
            (flag, None) if flag.starts_with('-') => {
                println!("Error: Missing value for {}", flag);
                return Ok(());
            }
            (other, _) => {
                println!("Unknown argument: {}", other);
                i += 1;
                continue;
            }
        }
        i += 2;
    }

    let mut config = match &config_path {
        Some(path) => ScanConfig::load(path)?,
        None => ScanConfig::load_default()?,
    };
    if timeout.is_some() {
        config.timeout_secs = timeout;
    }

    // Ctrl-C cancels the scan; whatever finished is still reported
    let token = CancellationToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling scan");
            signal_token.cancel();
        }
    });
    let mut control = ScanControl::new(token);
    if let Some(secs) = timeout {
        control = control.with_timeout(Duration::from_secs(secs));
    }

    let result = match command {
        "scan-snapshot" => {
            let input = ScanInput::Ledger(load_snapshot(&PathBuf::from(target))?);
            Analyzer::new(config)?.scan_with_control(&input, &control)
        }
        "scan-source" => {
            let input = ScanInput::Source(load_source_unit(&PathBuf::from(target))?);
            Analyzer::new(config)?.scan_with_control(&input, &control)
        }
        "scan-wallet" => {
            let address = Pubkey::from_str(target)?;
            println!("Scanning wallet: {}", address);
            scan_wallet(&address, &cluster, limit, config, &control).await
        }
        other => {
            println!("Unknown command: {}", other);
            print_usage(&args[0]);
            return Ok(());
        }
    };

    let report = match result {
        Ok(report) => report,
        Err(e) => match e.partial_report() {
            Some(partial) => {
                warn!("{}; reporting partial results", e);
                partial.clone()
            }
            None => return Err(e.into()),
        },
    };

    emit(&report, output_path)
}

fn emit(report: &Report, output_path: Option<PathBuf>) -> Result<()> {
    for failure in report.failures() {
        warn!("Heuristic {} failed: {}", failure.heuristic, failure.cause);
    }
    if !report.warnings().is_empty() {
        info!("{} input records were skipped", report.warnings().len());
    }

    match output_path {
        Some(path) => {
            generator::save_report(report, &path)?;
            let summary = report.summary();
            println!(
                "Found {} issues ({} critical, {} high, {} medium, {} low)",
                summary.total, summary.critical, summary.high, summary.medium, summary.low
            );
            println!("Saved to: {}", path.display());
        }
        None => println!("{}", report.to_json()?),
    }
    Ok(())
}

fn print_usage(program: &str) {
    println!("Solana Privacy Scanner v{}", solana_privacy_scanner::VERSION);
    println!("\nUsage:");
    println!("  {} scan-snapshot <FILE> [OPTIONS]", program);
    println!("  {} scan-source <FILE> [OPTIONS]", program);
    println!("  {} scan-wallet <ADDRESS> [OPTIONS]", program);
    println!("  {} --list-heuristics", program);
    println!("  {} --version", program);
    println!("\nOptions:");
    println!("  --output, -o PATH     Save the report to the specified file path");
    println!("  --config PATH         Load configuration from PATH");
    println!("  --cluster, -c URL     Use the specified RPC URL (default: mainnet-beta)");
    println!("  --limit, -l N         Transactions to fetch for scan-wallet (default: {})", DEFAULT_LIMIT);
    println!("  --timeout, -t SECS    Abort the scan after SECS seconds");
    println!("  --version, -v         Show version information");
}
