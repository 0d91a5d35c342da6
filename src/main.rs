use anyhow::Context;
use clap::Parser;
use steplog::cli::{collect_secrets, resolve_config, run_pipeline, Cli, Outcome};
use steplog::hang::{HangDetector, IntervalTicker};
use steplog::output::StepOutputWriter;
use tracing::{debug, error};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // stdout carries records only
    tracing_subscriber::fmt()
        .with_env_filter(cli.log_level())
        .with_writer(std::io::stderr)
        .with_target(cli.verbose >= 2)
        .init();

    debug!("steplog started with verbosity level: {}", cli.verbose);

    match run(&cli).await {
        Ok(outcome) => {
            for message in outcome.errors() {
                eprintln!("error: {message}");
            }
            std::process::exit(outcome.exit_code());
        }
        Err(e) => {
            error!("Fatal error: {:#}", e);
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<Outcome> {
    let config = resolve_config(cli).context("Failed to load configuration")?;
    let secrets = collect_secrets(cli).context("Failed to collect secrets")?;

    let output = StepOutputWriter::new(&secrets, config.logger_opts(Box::new(std::io::stdout())));
    let detector = HangDetector::new(
        IntervalTicker::new(config.hang.tick_interval),
        config.hang.threshold,
    );

    let outcome = run_pipeline(tokio::io::stdin(), output, detector)
        .await
        .context("Failed to process step output")?;
    Ok(outcome)
}
