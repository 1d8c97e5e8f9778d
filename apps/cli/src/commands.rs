//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use apidoc_core::{ConvertResult, ProgressReporter, SourceSpec, convert_sources, load_metadata};
use apidoc_metadata::{member_identity, type_identity};
use apidoc_shared::{AppConfig, RenderConfig, init_config, load_config, load_config_from};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// apidoc: render .NET API documentation as Markdown.
#[derive(Parser)]
#[command(
    name = "apidoc",
    version,
    about = "Render .NET API metadata and XML documentation comments as Markdown.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.apidoc/apidoc.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Convert metadata and doc comments into Markdown documents.
    Convert {
        /// Metadata graph (JSON); repeat for several assemblies.
        #[arg(long)]
        metadata: Vec<PathBuf>,

        /// XML doc file for the metadata file in the same position.
        #[arg(long)]
        docs: Vec<PathBuf>,

        /// Output directory (defaults to `defaults.output_dir`).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Heading level of page titles (1-6).
        #[arg(long)]
        heading_level: Option<u8>,

        /// Base URL that relative links are resolved against.
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Print the documentation identity of every type and member.
    Identities {
        /// Metadata graph (JSON).
        metadata: PathBuf,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "apidoc=info",
        1 => "apidoc=debug",
        _ => "apidoc=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(cli.config.as_deref())?;
    match cli.command {
        Command::Convert {
            metadata,
            docs,
            out,
            heading_level,
            base_url,
        } => {
            let overrides = Overrides {
                out,
                heading_level,
                base_url,
            };
            cmd_convert(&config, &metadata, &docs, overrides)
        }
        Command::Identities { metadata } => cmd_identities(&metadata),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => Ok(load_config_from(path)?),
        None => Ok(load_config()?),
    }
}

/// Flags that override config file values.
#[derive(Debug, Default)]
struct Overrides {
    out: Option<PathBuf>,
    heading_level: Option<u8>,
    base_url: Option<String>,
}

impl Overrides {
    fn apply(self, mut config: AppConfig) -> (AppConfig, PathBuf) {
        if let Some(level) = self.heading_level {
            config.defaults.heading_level = level;
        }
        if let Some(url) = self.base_url {
            config.render.base_url = Some(url);
        }
        let out = self
            .out
            .unwrap_or_else(|| PathBuf::from(&config.defaults.output_dir));
        (config, out)
    }
}

/// Pair `--docs` with `--metadata` by position; fall back to `[[sources]]`.
fn source_specs(config: &AppConfig, metadata: &[PathBuf], docs: &[PathBuf]) -> Result<Vec<SourceSpec>> {
    if metadata.is_empty() {
        if !docs.is_empty() {
            return Err(eyre!("--docs given without --metadata"));
        }
        return Ok(config.sources.iter().map(SourceSpec::from).collect());
    }
    if docs.len() > metadata.len() {
        return Err(eyre!(
            "{} --docs files for {} --metadata files",
            docs.len(),
            metadata.len()
        ));
    }
    Ok(metadata
        .iter()
        .enumerate()
        .map(|(i, path)| {
            let spec = SourceSpec::new(path);
            match docs.get(i) {
                Some(doc) => spec.with_docs(doc),
                None => spec,
            }
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_convert(
    config: &AppConfig,
    metadata: &[PathBuf],
    docs: &[PathBuf],
    overrides: Overrides,
) -> Result<()> {
    let specs = source_specs(config, metadata, docs)?;
    if specs.is_empty() {
        return Err(eyre!(
            "no sources: pass --metadata or add [[sources]] to the config file"
        ));
    }

    let (config, out) = overrides.apply(config.clone());
    let render = RenderConfig::try_from(&config)?;

    info!(sources = specs.len(), out = %out.display(), "converting");

    let reporter = CliProgress::new();
    let (result, manifest) = convert_sources(&specs, &render, &out, &reporter)?;

    if result.stats.orphaned > 0 {
        warn!(
            orphaned = result.stats.orphaned,
            "doc entries without a matching member"
        );
    }

    println!();
    println!("  Documentation written!");
    println!("  Documents:    {}", manifest.documents.len());
    println!("  Documented:   {}", result.stats.documented);
    println!("  Undocumented: {}", result.stats.undocumented);
    println!("  Path:         {}", out.display());
    println!("  Time:         {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn cmd_identities(path: &Path) -> Result<()> {
    let assembly = load_metadata(path)?;
    info!(assembly = %assembly.name, types = assembly.types.len(), "listing identities");

    for ty in &assembly.types {
        println!("{}", type_identity(ty));
        for member in &ty.members {
            println!("{}", member_identity(ty, member)?);
        }
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config written to {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn document_written(&self, name: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Writing [{current}/{total}] {name}"));
    }

    fn done(&self, _result: &ConvertResult) {
        self.spinner.finish_and_clear();
    }
}
