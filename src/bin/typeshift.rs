//! CLI binary for typeshift.
//!
//! A thin shim over the library crate: maps flags to `ClientConfig`, drives a
//! `WorkflowController` through select → choose → convert, and saves the
//! artifact.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use typeshift::catalog::{self, TargetFormatOption};
use typeshift::config::DEFAULT_BASE_URL;
use typeshift::{
    ClientConfig, NoopObserver, SelectedFile, SharedObserver, TaskSnapshot, TaskStatus,
    TypeShiftError, WorkflowController, WorkflowObserver,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Shows a spinner while a conversion (real or simulated) is outstanding.
struct SpinnerObserver {
    bar: Mutex<Option<ProgressBar>>,
}

impl SpinnerObserver {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(None),
        })
    }

    fn spinner() -> ProgressBar {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<ProgressBar>> {
        self.bar
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl WorkflowObserver for SpinnerObserver {
    fn on_transition(&self, from: TaskStatus, to: TaskStatus) {
        if to == TaskStatus::Converting {
            *self.slot() = Some(Self::spinner());
        } else if from == TaskStatus::Converting {
            if let Some(bar) = self.slot().take() {
                bar.finish_and_clear();
            }
        }
    }

    fn on_snapshot(&self, snapshot: &TaskSnapshot) {
        if !snapshot.is_converting() {
            return;
        }
        if let Some(bar) = self.slot().as_ref() {
            let name = snapshot
                .selected_file
                .as_ref()
                .map(|f| f.filename.as_str())
                .unwrap_or_default();
            let target = snapshot.target_code().unwrap_or_default();
            bar.set_prefix(if snapshot.is_simulated {
                "Simulating"
            } else {
                "Converting"
            });
            bar.set_message(format!("{name} → {target}"));
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert with the default target (first in the list)
  typeshift report.pdf

  # Pick the target and where to save it
  typeshift report.pdf --to XLSX -o out/

  # Show which targets a file can become
  typeshift --list-formats photo.png

  # Work offline: produce a placeholder artifact
  typeshift photo.png --to JPG --simulate

  # Fall back to simulation when the service is down
  typeshift photo.png --auto-simulate

SUPPORTED CONVERSIONS:
  From         To
  ─────────    ──────────────────────────
  pdf          DOCX, XLSX, CSV, PNG, JPG
  docx         PDF, XLSX, CSV
  csv          XLSX, PDF
  xlsx         PDF, CSV
  jpg, jpeg    PDF, PNG
  png          PDF, JPG

ENVIRONMENT VARIABLES:
  TYPESHIFT_API_URL        Conversion service base URL
  TYPESHIFT_TIMEOUT        Request timeout in seconds
  TYPESHIFT_AUTO_SIMULATE  Simulate when the service is unreachable
  RUST_LOG                 Override the log filter
"#;

/// Convert files through a remote conversion service.
#[derive(Parser, Debug)]
#[command(
    name = "typeshift",
    version,
    about = "Convert PDF, DOCX, CSV, Excel and image files through a conversion service",
    long_about = "Send a file to a conversion service and save the converted result. The \
target format is chosen from the formats offered for the file's extension. When the service \
is unreachable a local simulation can stand in for it.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// File to convert.
    #[arg(required_unless_present = "list_formats")]
    file: Option<PathBuf>,

    /// Target format code (e.g. DOCX, XLSX, PNG). Default: first offered.
    #[arg(short, long, env = "TYPESHIFT_TO")]
    to: Option<String>,

    /// Where to save the result: a file path, or a directory that receives
    /// the suggested filename.
    #[arg(short, long, env = "TYPESHIFT_OUTPUT", default_value = ".")]
    output: PathBuf,

    /// Base URL of the conversion service.
    #[arg(long, env = "TYPESHIFT_API_URL", default_value = DEFAULT_BASE_URL)]
    api_url: String,

    /// Request timeout in seconds.
    #[arg(long, env = "TYPESHIFT_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// TCP connect timeout in seconds.
    #[arg(long, env = "TYPESHIFT_CONNECT_TIMEOUT", default_value_t = 10)]
    connect_timeout: u64,

    /// Skip the service and produce a simulated artifact.
    #[arg(long)]
    simulate: bool,

    /// Simulate automatically if the service is unreachable.
    #[arg(long, env = "TYPESHIFT_AUTO_SIMULATE")]
    auto_simulate: bool,

    /// Simulated latency in milliseconds.
    #[arg(long, env = "TYPESHIFT_SIMULATION_DELAY_MS", default_value_t = 2000)]
    simulation_delay_ms: u64,

    /// List target formats (for FILE, or the whole catalog) and exit.
    #[arg(long)]
    list_formats: bool,

    /// Print the final task snapshot as JSON.
    #[arg(long, env = "TYPESHIFT_JSON")]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "TYPESHIFT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "TYPESHIFT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "TYPESHIFT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner covers the interesting part; keep INFO logs out of its way.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── List-formats mode ────────────────────────────────────────────────
    if cli.list_formats {
        return list_formats(&cli);
    }

    // ── Build controller ─────────────────────────────────────────────────
    let config = ClientConfig::builder()
        .base_url(cli.api_url.clone())
        .request_timeout_secs(cli.timeout)
        .connect_timeout_secs(cli.connect_timeout)
        .simulation_delay_ms(cli.simulation_delay_ms)
        .auto_simulate(cli.auto_simulate)
        .build()
        .context("Invalid configuration")?;

    let observer: SharedObserver = if show_progress {
        SpinnerObserver::new() as Arc<dyn WorkflowObserver>
    } else {
        Arc::new(NoopObserver)
    };
    let controller = WorkflowController::from_config(&config)
        .context("Failed to create conversion client")?
        .with_observer(observer);

    // ── Select and choose ────────────────────────────────────────────────
    let path = cli.file.as_ref().context("No input file given")?;
    let file = SelectedFile::load(path).await?;

    if let Err(e) = controller.select_file(file) {
        if let Some(task_error) = controller.snapshot().error {
            anyhow::bail!("{e}\n{}", task_error.message);
        }
        return Err(e.into());
    }

    if let Some(ref code) = cli.to {
        controller.choose_target(code).map_err(|e| match e {
            TypeShiftError::UnknownTarget { .. } => {
                anyhow::anyhow!("{e}\nAvailable: {}", format_codes(controller.candidates()))
            }
            other => other.into(),
        })?;
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let mut snapshot = if cli.simulate {
        controller.simulate().await?
    } else {
        controller.convert().await?
    };

    if snapshot.offers_simulation() && config.auto_simulate {
        if !cli.quiet {
            eprintln!(
                "{} Service unreachable, falling back to simulation",
                yellow("⚠")
            );
        }
        snapshot = controller.simulate().await?;
    }

    if snapshot.status == TaskStatus::Failed {
        return Err(report_failure(&cli, &snapshot));
    }

    // ── Save artifact ────────────────────────────────────────────────────
    let saved = controller
        .save_artifact(&cli.output)
        .await
        .with_context(|| format!("Failed to save result to {}", cli.output.display()))?;

    if cli.json {
        let body = serde_json::json!({
            "task": controller.snapshot(),
            "saved_to": saved,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&body).context("Failed to serialise output")?
        );
    } else if !cli.quiet {
        let size = snapshot
            .artifact
            .as_ref()
            .map(|a| a.size_bytes)
            .unwrap_or_default();
        eprintln!(
            "{}  {} → {}  {}{}",
            green("✔"),
            snapshot
                .selected_file
                .as_ref()
                .map(|f| f.filename.as_str())
                .unwrap_or_default(),
            bold(&saved.display().to_string()),
            dim(&format!("{size} bytes")),
            if snapshot.is_simulated {
                format!("  {}", yellow("(simulated)"))
            } else {
                String::new()
            },
        );
    }

    Ok(())
}

/// Print the targets for `cli.file`, or the whole catalog when none given.
fn list_formats(cli: &Cli) -> Result<()> {
    match cli.file.as_ref() {
        Some(path) => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            let targets = catalog::lookup(&name);
            if targets.is_empty() {
                anyhow::bail!("{}", TypeShiftError::UnsupportedType { filename: name });
            }
            if cli.json {
                println!("{}", serde_json::to_string_pretty(targets)?);
            } else {
                for (i, t) in targets.iter().enumerate() {
                    let marker = if i == 0 { green("*") } else { " ".to_string() };
                    println!("{marker} {:<5} {:<20} {}", t.code, t.label, dim(t.description));
                }
            }
        }
        None => {
            if cli.json {
                let map: serde_json::Map<String, serde_json::Value> = catalog::source_extensions()
                    .filter_map(|ext| {
                        let targets = catalog::targets_for_extension(ext)?;
                        Some((ext.to_string(), serde_json::to_value(targets).ok()?))
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&map)?);
            } else {
                for ext in catalog::source_extensions() {
                    let targets = catalog::targets_for_extension(ext).unwrap_or_default();
                    println!("{:<5} → {}", bold(ext), format_codes(targets));
                }
                println!("{}", dim(&format!("accepted: {}", catalog::accepted_extensions())));
            }
        }
    }
    Ok(())
}

/// Print the recorded failure and turn it into the process error.
fn report_failure(cli: &Cli, snapshot: &TaskSnapshot) -> anyhow::Error {
    let message = snapshot
        .error
        .as_ref()
        .map(|e| e.message.clone())
        .unwrap_or_else(|| "Conversion failed".to_string());

    if cli.json {
        if let Ok(body) = serde_json::to_string_pretty(snapshot) {
            println!("{body}");
        }
    } else if !cli.quiet {
        eprintln!("{}  {}", red("✘"), message);
        if snapshot.offers_simulation() {
            eprintln!(
                "   {}",
                dim("Re-run with --simulate (or --auto-simulate) to try the flow offline.")
            );
        }
    }
    anyhow::anyhow!(message)
}

fn format_codes(targets: &[TargetFormatOption]) -> String {
    targets.iter().map(|t| t.code).collect::<Vec<_>>().join(", ")
}
