//! baton command line: picks an event source, wires it to a [`ProgressPrinter`],
//! and turns the outcome into an exit code.

mod cli_args;
pub mod event_source;

pub use cli_args::Cli;

use anyhow::Result;
use baton_config::{Config, OutputMode};
use baton_core::{ConsoleSink, Event, PrinterOptions, ProgressPrinter, TerminalSink};
use clap::Parser;
use event_source::SourceError;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Exit code for a run stopped with Ctrl-C.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;
/// Exit code when the event source itself failed.
pub const SOURCE_ERROR_EXIT_CODE: i32 = 1;

pub async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let config = Config::load_with_overrides(
        cli.config.as_deref(),
        cli.stream_override(),
        cli.output_override(),
    )?;

    initialize_logging(&cli, &config);
    debug!("loaded config: {:?}", config);

    let sink = console_sink(config.progress.output);
    let printer = ProgressPrinter::new(sink, PrinterOptions::from(&config.progress));
    let label = cli.run_label();

    let code = if !cli.command.is_empty() {
        info!("running agent command: {}", cli.command.join(" "));
        render_run(&printer, &label, run_child(&cli.command, &printer), interrupted()).await
    } else if let Some(path) = &cli.input {
        info!("reading events from {}", path.display());
        let source = async { event_source::pump_file(path, &printer).await.map(|_| 0) };
        render_run(&printer, &label, source, interrupted()).await
    } else {
        debug!("reading events from stdin");
        let source = async { event_source::pump_stdin(&printer).await.map(|_| 0) };
        render_run(&printer, &label, source, interrupted()).await
    };

    Ok(code)
}

/// Drive one run from `start` to `done`.
///
/// `source` resolves to the exit code of whatever produced the events. If
/// `interrupt` resolves first the source is dropped and the run ends as
/// `interrupted`. A source failure is shown as an error line.
pub async fn render_run<S, I>(printer: &ProgressPrinter, label: &str, source: S, interrupt: I) -> i32
where
    S: Future<Output = Result<i32, SourceError>>,
    I: Future<Output = ()>,
{
    let started = Instant::now();
    printer.start(label);

    let outcome = tokio::select! {
        result = source => Some(result),
        _ = interrupt => None,
    };
    let elapsed_ms = started.elapsed().as_millis() as u64;

    // `done` blocks for at most 200 ms joining the spinner thread. This must also
    // run on a current-thread runtime, so no `block_in_place`.
    match outcome {
        Some(Ok(code)) => {
            let status = if code == 0 && printer.status() != "error" {
                "success"
            } else {
                "error"
            };
            printer.done(status, elapsed_ms);
            code
        }
        Some(Err(e)) => {
            warn!("event source failed: {}", e);
            printer.on_event(&Event::error(e.to_string()));
            printer.done("error", elapsed_ms);
            SOURCE_ERROR_EXIT_CODE
        }
        None => {
            printer.done("interrupted", elapsed_ms);
            INTERRUPTED_EXIT_CODE
        }
    }
}

async fn run_child(command: &[String], printer: &ProgressPrinter) -> Result<i32, SourceError> {
    let status = event_source::run_command(command, printer).await?;
    // Killed by a signal: no code, report as a failure.
    Ok(status.code().unwrap_or(SOURCE_ERROR_EXIT_CODE))
}

async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

fn console_sink(mode: OutputMode) -> Arc<dyn TerminalSink> {
    let sink = match mode {
        OutputMode::Auto => ConsoleSink::detect(),
        OutputMode::Plain => ConsoleSink::with_interactive(false),
        OutputMode::Interactive => ConsoleSink::with_interactive(true),
    };
    Arc::new(sink)
}

fn initialize_logging(cli: &Cli, config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,baton={level},baton_cli={level},baton_core={level},baton_config={level}"
        ))
    });

    // The progress view owns stdout; diagnostics go to stderr.
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
