use breach_sweep::{
    breach::ApiEndpoints,
    breach::api::{DEFAULT_EMAIL_SEARCH_URL, DEFAULT_PASSWORD_RANGE_URL},
    proxy::ClientConfig,
    Orchestrator, Result, RunConfig, RunReport, SetupError,
};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit code when the proxy list is missing or has no usable entry
const EXIT_NO_PROXIES: u8 = 2;

/// Exit code when no input list could be loaded
const EXIT_NO_INPUTS: u8 = 3;

/// Exit code when an output file could not be written
const EXIT_SINK_FAILURE: u8 = 4;

/// Check passwords and emails against breach APIs through rotating proxies
#[derive(Parser)]
#[command(name = "breach-sweep")]
#[command(about = "Check passwords and emails against breach APIs through rotating proxies")]
struct Cli {
    /// Directory containing passwords.txt, emails.txt and/or both.txt
    #[arg(short, long, default_value = ".")]
    input_dir: PathBuf,

    /// Directory the result files are written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Proxy list (HOST:PORT:USER:PASS per line), relative to the input dir
    #[arg(short, long, default_value = "proxies.txt")]
    proxies: PathBuf,

    /// Maximum number of requests in flight
    #[arg(short = 'n', long, default_value = "100")]
    concurrency: usize,

    /// Connect timeout in seconds
    #[arg(long, default_value = "20")]
    connect_timeout: u64,

    /// Overall request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Password range endpoint (hash prefix is appended)
    #[arg(long, default_value = DEFAULT_PASSWORD_RANGE_URL)]
    password_api: String,

    /// Email search endpoint (escaped address is appended)
    #[arg(long, default_value = DEFAULT_EMAIL_SEARCH_URL)]
    email_api: String,

    /// Verify TLS certificates (off by default so intercepting proxies work)
    #[arg(long)]
    verify_tls: bool,

    /// Write the run summary as JSON to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "breach_sweep=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let outcome = run(cli).await;
    if let Err(e) = &outcome {
        error!("{:#}", e);
    }
    ExitCode::from(exit_code(&outcome))
}

/// Map the run outcome to the process exit status
fn exit_code(outcome: &Result<RunReport>) -> u8 {
    match outcome {
        Ok(report) if report.is_success() => 0,
        Ok(_) => EXIT_SINK_FAILURE,
        Err(e) => match e.downcast_ref::<SetupError>() {
            Some(SetupError::ProxyFile { .. } | SetupError::NoProxies { .. }) => EXIT_NO_PROXIES,
            Some(SetupError::NoInputs { .. } | SetupError::InputFile { .. }) => EXIT_NO_INPUTS,
            None => 1,
        },
    }
}

async fn run(cli: Cli) -> Result<RunReport> {
    if !cli.verify_tls {
        warn!("TLS certificate verification is disabled for proxy and target");
    }

    let client = ClientConfig::new()
        .with_connect_timeout(Duration::from_secs(cli.connect_timeout))
        .with_timeout(Duration::from_secs(cli.timeout))
        .with_verify_tls(cli.verify_tls);

    let endpoints = ApiEndpoints::new()
        .with_password_range(cli.password_api)
        .with_email_search(cli.email_api);

    let config = RunConfig::new()
        .with_input_dir(cli.input_dir)
        .with_output_dir(cli.output_dir)
        .with_proxies_file(cli.proxies)
        .with_concurrency(cli.concurrency)
        .with_client(client)
        .with_endpoints(endpoints);

    println!("Proxies: {:?}", config.proxies_path());
    println!("Checking with concurrency {}", config.concurrency);
    println!();

    let mut orchestrator = Orchestrator::new(config);
    let report = orchestrator.run().await?;

    print_summary(&report);

    if let Some(path) = cli.report {
        std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;
        println!("Saved run report to {:?}", path);
    }

    Ok(report)
}

fn print_summary(report: &RunReport) {
    let outcomes = &report.outcomes;
    println!(
        "Results: {} clean, {} compromised, {} breached emails, {} failed requests ({} checks in {}ms)",
        outcomes.clean,
        outcomes.compromised,
        outcomes.breached,
        outcomes.failed,
        report.workers,
        report.elapsed_ms
    );
    if outcomes.lost > 0 {
        println!("  {} checks aborted without a result", outcomes.lost);
    }

    for writer in &report.writers {
        match &writer.error {
            None => println!("  {} ({} lines)", writer.sink, writer.lines_written),
            Some(e) => eprintln!("  {} FAILED: {}", writer.sink, e),
        }
    }

    if !report.is_success() {
        eprintln!(
            "{} output file(s) could not be written",
            report.failed_writers().count()
        );
    }
}
