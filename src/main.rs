use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;
use tree_materializer::config::{self, AppConfig};
use tree_materializer::core::{
    materialize, CoreError, DefaultOrder, NestedOrder, Node, TreeOptions, TreeSerializer,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

/// Materialize a filtered, ordered directory tree as JSON.
#[derive(Debug, Parser)]
#[command(name = "tree-materializer", version)]
struct Cli {
    /// Directory to materialize. Defaults to the configured root, then ".".
    root: Option<PathBuf>,

    /// Include glob over root-relative paths; replaces the configured set.
    #[arg(short, long = "include", value_name = "GLOB")]
    include: Vec<String>,

    /// Exclude glob over entry names; replaces the configured set.
    #[arg(short, long = "exclude", value_name = "GLOB")]
    exclude: Vec<String>,

    /// Name of the marker directory that gets the special orderings.
    #[arg(long, value_name = "NAME", conflicts_with = "no_marker")]
    marker: Option<String>,

    /// Disable marker-based ordering entirely.
    #[arg(long)]
    no_marker: bool,

    #[arg(long, value_enum)]
    nested_order: Option<NestedOrder>,

    #[arg(long, value_enum)]
    default_order: Option<DefaultOrder>,

    /// Destination file. Defaults to the configured output file.
    #[arg(short, long, value_name = "FILE", conflicts_with = "stdout")]
    output: Option<PathBuf>,

    /// Print the rendering instead of writing a file.
    #[arg(long)]
    stdout: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Emit single-line JSON.
    #[arg(long)]
    compact: bool,

    /// Configuration file to use instead of the platform default.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Abandon the run if it takes longer than this.
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Persist the effective configuration, including these overrides.
    #[arg(long)]
    save_config: bool,

    /// Start from a configuration file shared by someone else.
    #[arg(long, value_name = "FILE")]
    import_config: Option<PathBuf>,

    /// Write the effective configuration to FILE.
    #[arg(long, value_name = "FILE")]
    export_config: Option<PathBuf>,
}

/// Folds command-line overrides into the loaded configuration.
fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if !cli.include.is_empty() {
        config.include_patterns = cli.include.iter().cloned().collect();
    }
    if !cli.exclude.is_empty() {
        config.exclude_patterns = cli.exclude.iter().cloned().collect();
    }
    if cli.no_marker {
        config.marker = None;
    } else if let Some(marker) = &cli.marker {
        config.marker = Some(marker.clone());
    }
    if let Some(order) = cli.nested_order {
        config.nested_order = order;
    }
    if let Some(order) = cli.default_order {
        config.default_order = order;
    }
    if let Some(root) = &cli.root {
        config.root_directory = Some(root.clone());
    }
    if let Some(output) = &cli.output {
        config.output_file = output.clone();
    }
    if cli.compact {
        config.pretty_json = false;
    }
}

/// Runs blocking `work` off the async runtime, under an optional deadline.
///
/// On timeout the worker thread is abandoned, not cancelled. The runtime must
/// be shut down with [`shutdown_runtime`] so that it does not wait for it.
async fn run_blocking_with_deadline<T, F>(
    work: F,
    timeout: Option<Duration>,
) -> Result<T, CoreError>
where
    F: FnOnce() -> Result<T, CoreError> + Send + 'static,
    T: Send + 'static,
{
    let task = tokio::task::spawn_blocking(work);

    let joined = match timeout {
        Some(limit) => tokio::time::timeout(limit, task)
            .await
            .map_err(|_| CoreError::TimedOut(limit))?,
        None => task.await,
    };

    joined?
}

async fn run_materialization(
    root: PathBuf,
    options: TreeOptions,
    timeout: Option<Duration>,
) -> Result<Node, CoreError> {
    run_blocking_with_deadline(move || materialize(&root, &options), timeout).await
}

fn build_runtime() -> std::io::Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
}

/// Drops the runtime without joining blocking tasks that outlived their deadline.
fn shutdown_runtime(runtime: Runtime) {
    runtime.shutdown_background();
}

fn render(tree: &Node, format: OutputFormat, pretty: bool) -> Result<Vec<u8>, CoreError> {
    match format {
        OutputFormat::Json => TreeSerializer::to_json(tree, pretty),
        OutputFormat::Text => Ok(TreeSerializer::render_ascii(tree).into_bytes()),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut app_config = match &cli.import_config {
        Some(path) => config::settings::import_config(path)?,
        None => AppConfig::load(cli.config.as_deref())?,
    };
    apply_overrides(&mut app_config, &cli);

    if cli.save_config {
        config::settings::save_config(&app_config, cli.config.as_deref())?;
    }
    if let Some(path) = &cli.export_config {
        config::settings::export_config(&app_config, path)?;
    }

    let root = app_config
        .root_directory
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    let timeout = cli.timeout_secs.map(Duration::from_secs);

    tracing::info!("Materializing {:?}", root);
    let tree = run_materialization(root.clone(), app_config.tree_options(), timeout)
        .await
        .with_context(|| format!("Failed to materialize {:?}", root))?;

    let bytes = render(&tree, cli.format, app_config.pretty_json)?;

    if cli.stdout {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&bytes)?;
        stdout.write_all(b"\n")?;
        stdout.flush()?;
    } else {
        write_output(&bytes, &app_config.output_file)?;
    }

    Ok(())
}

fn write_output(bytes: &[u8], dest: &Path) -> Result<()> {
    TreeSerializer::write_atomic(bytes, dest)
        .with_context(|| format!("Failed to write output to {:?}", dest))
}

fn main() -> ExitCode {
    // Logs go to stderr so that --stdout output stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let runtime = match build_runtime() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to start the async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(run(cli));
    shutdown_runtime(runtime);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
