use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use crossbeam_channel::RecvTimeoutError;
use glob::glob;
use mindwave_core::{
    AcquisitionController, AcquisitionError, Connector, FrameCounters, Metric, SerialConnector,
    SessionReport, build_report,
};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{info, warn};

mod config;

use config::Config;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("MINDWAVE_BUILD_COMMIT"),
    ", built ",
    env!("MINDWAVE_BUILD_DATE"),
    ")"
);

const EXAMPLES: &str = "Examples:\n  mindwave decode session.bin -o report.json\n  mindwave decode 'dumps/*.bin' --stdout --pretty\n  mindwave capture /dev/rfcomm0 --duration 30 --watch attention,meditation -o report.json";

#[derive(Parser, Debug)]
#[command(name = "mindwave")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Decoder and capture tool for NeuroSky MindWave (ThinkGear) headsets.",
    long_about = None,
    after_help = EXAMPLES
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a recorded ThinkGear byte dump into a versioned JSON report.
    Decode {
        /// Path (or glob matching exactly one file) of a raw byte dump
        input: PathBuf,

        #[command(flatten)]
        output: OutputArgs,

        /// Exit with a non-zero code if any frame was discarded
        #[arg(long)]
        strict: bool,

        /// List discard counters after decoding
        #[arg(long)]
        list_discards: bool,
    },
    /// Capture from a headset's serial port for a fixed duration.
    Capture {
        /// Serial port, e.g. /dev/rfcomm0 or COM6 (overrides the config file)
        port: Option<String>,

        /// Baud rate [default: 57600]
        #[arg(long)]
        baud: Option<u32>,

        /// Capture length in seconds [default: 60]
        #[arg(long)]
        duration: Option<u64>,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print each new value of these metrics to stderr
        #[arg(long, value_delimiter = ',', num_args = 1..)]
        watch: Vec<Metric>,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Output report path (JSON)
    #[arg(short = 'o', long, required_unless_present = "stdout")]
    report: Option<PathBuf>,

    /// Write JSON report to stdout
    #[arg(long, conflicts_with = "report")]
    stdout: bool,

    /// Pretty-print JSON output
    #[arg(long, conflicts_with = "compact")]
    pretty: bool,

    /// Compact JSON output (default)
    #[arg(long)]
    compact: bool,

    /// Suppress non-error output
    #[arg(long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let quiet = match &cli.command {
        Commands::Decode { output, .. } | Commands::Capture { output, .. } => output.quiet,
    };
    init_tracing(quiet);

    let result = match cli.command {
        Commands::Decode {
            input,
            output,
            strict,
            list_discards,
        } => cmd_decode(input, output, strict, list_discards),
        Commands::Capture {
            port,
            baud,
            duration,
            config,
            watch,
            output,
        } => cmd_capture(port, baud, duration, config, watch, output),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_tracing(quiet: bool) {
    let default = if quiet { "mindwave=warn" } else { "mindwave=info" };
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default.to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

fn cmd_decode(
    input: PathBuf,
    output: OutputArgs,
    strict: bool,
    list_discards: bool,
) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&input)?;
    validate_input_file(&resolved_input)?;
    if let Some(report_path) = output.report.as_ref() {
        ensure_distinct_output(&resolved_input, report_path)?;
    }

    let rep = mindwave_core::decode_file(&resolved_input).context("ThinkGear decode failed")?;
    write_report(&rep, &output)?;

    if list_discards && !output.quiet {
        print_discards(&rep.frames);
    }
    if strict && rep.frames.discarded() > 0 {
        return Err(CliError::new(
            format!("{} frame(s) discarded", rep.frames.discarded()),
            Some("use --list-discards to inspect".to_string()),
        ));
    }
    Ok(())
}

fn cmd_capture(
    port: Option<String>,
    baud: Option<u32>,
    duration: Option<u64>,
    config_path: Option<PathBuf>,
    watch: Vec<Metric>,
    output: OutputArgs,
) -> Result<(), CliError> {
    let config = match config_path {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration");
            Config::load(&path)?
        }
        None => Config::default(),
    };

    let port = port.or(config.serial.port.clone()).ok_or_else(|| {
        CliError::new(
            "no serial port given",
            Some("pass PORT or set serial.port in the config file".to_string()),
        )
    })?;
    let connector = SerialConnector::new(port)
        .baud_rate(baud.unwrap_or(config.serial.baud_rate))
        .read_timeout(config.serial.read_timeout());
    let endpoint = connector.describe();
    let duration = Duration::from_secs(duration.unwrap_or(config.capture.duration_secs));

    let mut controller = AcquisitionController::new(connector);
    for metric in watch {
        controller.register(metric, move |reading| {
            let now = OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default();
            eprintln!("{now} {metric}={}", reading.value());
        });
    }
    let feed = controller.subscribe(config.capture.feed_capacity);

    controller.start().map_err(|err| {
        CliError::new(
            format!("failed to start capture on {endpoint}: {err}"),
            Some("check the port name, pairing and permissions".to_string()),
        )
    })?;

    let deadline = Instant::now() + duration;
    let mut samples = 0u64;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match feed.recv_timeout(remaining) {
            Ok(_) => samples += 1,
            Err(RecvTimeoutError::Timeout) => break,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    let (counters, lost) = match controller.stop() {
        Ok(counters) => (counters, None),
        Err(AcquisitionError::SourceLost(err)) => {
            warn!(error = %err, "capture ended early");
            (controller.counters(), Some(err))
        }
        Err(err) => return Err(anyhow!(err).context("capture failed").into()),
    };
    info!(samples, frames = counters.frames_decoded, "capture finished");

    let rep = build_report(&endpoint, None, counters, &controller.snapshot());
    write_report(&rep, &output)?;

    if let Some(err) = lost {
        return Err(CliError::new(
            format!("serial connection lost: {err}"),
            Some("the report holds the samples captured before the loss".to_string()),
        ));
    }
    Ok(())
}

fn write_report(rep: &SessionReport, output: &OutputArgs) -> Result<(), CliError> {
    let json = serialize_report(rep, output.pretty, output.compact)?;

    if output.stdout {
        print!("{}", json);
        return Ok(());
    }

    let report = output.report.as_ref().ok_or_else(|| {
        CliError::new(
            "missing output path",
            Some("use -o/--report or --stdout".to_string()),
        )
    })?;
    if let Some(parent) = report.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    fs::write(report, json)
        .with_context(|| format!("Failed to write report: {}", report.display()))?;

    if !output.quiet {
        eprintln!("OK: report written -> {}", report.display());
    }
    Ok(())
}

fn serialize_report(rep: &SessionReport, pretty: bool, compact: bool) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn print_discards(frames: &FrameCounters) {
    eprintln!("Discarded frames:");
    eprintln!("  checksum_mismatches {}", frames.checksum_mismatches);
    eprintln!("  oversized_frames {}", frames.oversized_frames);
    eprintln!("  malformed_payloads {}", frames.malformed_payloads);
    eprintln!("  bytes_skipped {}", frames.bytes_skipped);
}

fn ensure_distinct_output(input: &Path, report_path: &Path) -> Result<(), CliError> {
    let input_abs = fs::canonicalize(input)
        .with_context(|| format!("Failed to resolve input path: {}", input.display()))?;
    let report_dir = match report_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::canonicalize(parent),
        _ => fs::canonicalize("."),
    };
    // A missing output directory is created later and cannot hold the input.
    let Ok(report_dir) = report_dir else {
        return Ok(());
    };
    let file_name = report_path
        .file_name()
        .ok_or_else(|| anyhow!("Invalid report path: {}", report_path.display()))?;
    if report_dir.join(file_name) == input_abs {
        return Err(CliError::new(
            format!(
                "report path must differ from input: {}",
                report_path.display()
            ),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("pass a raw ThinkGear byte dump".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("pass a raw ThinkGear byte dump".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    match matches.len() {
        0 => Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern".to_string()),
        )),
        1 => Ok(matches.remove(0)),
        count => {
            let mut listed: Vec<String> = matches
                .iter()
                .take(3)
                .map(|p| p.display().to_string())
                .collect();
            if count > 3 {
                listed.push("...".to_string());
            }
            Err(CliError::new(
                format!(
                    "multiple files match pattern '{}' ({} matches); matches: {}",
                    pattern,
                    count,
                    listed.join(", ")
                ),
                Some("pass a single dump file, or run once per file".to_string()),
            ))
        }
    }
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
