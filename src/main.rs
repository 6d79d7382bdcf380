use catalog_imaging::config::{self, CatalogConfig};
use catalog_imaging::imaging::{self, OptimizationSettings};
use catalog_imaging::output;
use catalog_imaging::pipeline::{self, PipelineError, PipelineEvent};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "catalog-imaging")]
#[command(about = "Composite and byte-budget JPEG optimization for product photos")]
#[command(long_about = "\
Composite and byte-budget JPEG optimization for product photos

Combines up to four photos per composite on a white canvas, then re-encodes
every output as a JPEG that fits under a file size budget.

Layouts by image count:
  1  scaled to fit the canvas bounds
  2  side by side (portraits) or stacked (landscapes)
  3  main image plus two half-size images beside or below it
  4  2x2 grid with uniform cells
  5+ split into groups of four, one composite each

Run 'catalog-imaging gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Directory containing config.toml
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    /// Log debug detail (every optimizer attempt)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Combine photos into composites without optimizing them
    Combine {
        /// Image files or directories of images
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Output directory
        #[arg(long = "output", short = 'o')]
        out_dir: PathBuf,
    },
    /// Fit one image under the configured byte budget
    Optimize {
        input: PathBuf,
        /// Output file
        #[arg(long = "output", short = 'o')]
        out_file: PathBuf,
    },
    /// Run the full pipeline: combine (if enabled) → optimize (if enabled) → write
    Publish {
        /// Image files or directories of images
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Output directory
        #[arg(long = "output", short = 'o')]
        out_dir: PathBuf,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli)?;
    Ok(())
}

fn run(cli: Cli) -> Result<(), PipelineError> {
    match cli.command {
        Command::Combine { inputs, out_dir } => {
            let mut config = config::load_config(&cli.config_dir)?;
            config.combination.enabled = true;
            config.optimization.enabled = false;
            init_thread_pool(&config.processing);
            publish(&inputs, &out_dir, &config)?;
        }
        Command::Optimize { input, out_file } => {
            let config = config::load_config(&cli.config_dir)?;
            init_thread_pool(&config.processing);
            let settings = OptimizationSettings::from(&config.optimization);
            let bytes = std::fs::read(&input)?;
            let result = imaging::optimize(&bytes, &settings)?;
            if let Some(parent) = out_file.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&out_file, &result.data)?;
            output::print_optimization(&input, &out_file, &result, settings.budget_bytes());
        }
        Command::Publish { inputs, out_dir } => {
            let config = config::load_config(&cli.config_dir)?;
            init_thread_pool(&config.processing);
            publish(&inputs, &out_dir, &config)?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }
    Ok(())
}

/// Expand inputs, prepare with a printer thread, then write outputs and manifest.
fn publish(inputs: &[PathBuf], out_dir: &Path, config: &CatalogConfig) -> Result<(), PipelineError> {
    let paths = pipeline::collect_inputs(inputs);
    let (tx, rx) = mpsc::channel::<PipelineEvent>();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_event(&event) {
                println!("{}", line);
            }
        }
    });
    let prepared = pipeline::prepare(&paths, config, Some(tx));
    // The sender is gone once prepare returns, so the printer drains and exits.
    printer.join().ok();

    let prepared = prepared?;
    let written = pipeline::write_outputs(&prepared, out_dir, &config.output.prefix)?;
    pipeline::write_manifest(&prepared, &written, out_dir)?;
    output::print_written(out_dir, &written);
    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Structured logs go to stderr so progress output on stdout stays clean.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "catalog_imaging=debug"
    } else {
        "catalog_imaging=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
