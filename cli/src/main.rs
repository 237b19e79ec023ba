//! CLI entrypoint for cryptovox
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use cryptovox_application::NoProgress;
use cryptovox_domain::Query;
use cryptovox_infrastructure::{ConfigLoader, FileConfig, VoiceAssistantService};
use cryptovox_presentation::{Cli, ConsoleFormatter, OutputFormat, ProgressReporter, SimpleProgress};
use std::io::IsTerminal;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_guard = init_logging(&cli)?;

    if cli.show_config {
        for line in ConfigLoader::describe_sources(cli.config.as_deref()) {
            println!("{line}");
        }
        return Ok(());
    }

    if !cli.interactive && cli.question.is_none() {
        bail!("A question is required. Use --interactive to read questions from stdin.");
    }

    let config = load_config(&cli)?;

    info!("Starting cryptovox");

    // === Dependency Injection ===
    let service = match VoiceAssistantService::create(&config).await {
        Ok(service) => service,
        Err(e) => {
            report_error(cli.output, &format!("failed to start the voice assistant: {e}"));
            drop(log_guard);
            std::process::exit(1);
        }
    };

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted");
                cancel.cancel();
            }
        });
    }

    let outcome = if cli.interactive {
        run_interactive(&cli, &service, &cancel).await
    } else {
        let question = cli.question.as_deref().unwrap_or_default();
        Ok(ask(&cli, &service, question, &cancel).await)
    };

    service.shutdown().await;
    if !outcome? {
        drop(log_guard);
        std::process::exit(1);
    }
    drop(log_guard);
    Ok(())
}

fn init_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));

    match &cli.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
            Ok(None)
        }
    }
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    let loaded = if cli.no_config {
        ConfigLoader::load_without_files()
    } else {
        ConfigLoader::load(cli.config.as_deref())
    };
    loaded.map_err(|e| anyhow!("invalid configuration: {e}"))
}

/// Answer one question and print it. Failures are printed in the chosen
/// format; returns whether the question was answered.
async fn ask(
    cli: &Cli,
    service: &VoiceAssistantService,
    question: &str,
    cancel: &CancellationToken,
) -> bool {
    let query = match Query::try_new(question) {
        Ok(q) => q,
        Err(e) => {
            report_error(cli.output, &e.to_string());
            return false;
        }
    };

    let result = if cli.quiet {
        service.answer(query, &NoProgress, cancel).await
    } else if std::io::stderr().is_terminal() {
        let reporter = ProgressReporter::new(cli.echo_stream());
        let result = service.answer(query, &reporter, cancel).await;
        reporter.finish();
        result
    } else {
        let progress = SimpleProgress::new(cli.echo_stream());
        service.answer(query, &progress, cancel).await
    };

    match result {
        Ok(output) => {
            println!("{}", ConsoleFormatter::format_answer(cli.output, question, &output));
            if cli.verbose > 0 && cli.output == OutputFormat::Text {
                eprintln!("{}", ConsoleFormatter::format_stats(&output));
            }
            true
        }
        Err(e) => {
            warn!(error = %e, "Query failed");
            report_error(cli.output, &e.to_string());
            false
        }
    }
}

/// JSON envelopes go to stdout so they can be piped; text errors to stderr.
fn report_error(format: OutputFormat, message: &str) {
    let formatted = ConsoleFormatter::format_error(format, message);
    match format {
        OutputFormat::Json => println!("{formatted}"),
        OutputFormat::Text => eprintln!("{formatted}"),
    }
}

async fn run_interactive(
    cli: &Cli,
    service: &VoiceAssistantService,
    cancel: &CancellationToken,
) -> Result<bool> {
    if !cli.quiet {
        eprintln!("{}", ConsoleFormatter::format_banner(&service.tool_names()));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit" | "/exit" | "/quit") {
            break;
        }
        // A failed question is already reported; keep reading.
        ask(cli, service, question, cancel).await;
        if cancel.is_cancelled() {
            break;
        }
    }
    Ok(true)
}
