use clap::Parser;
use clap::builder::PossibleValuesParser;
use dataset_prep::config::{self, PrepConfig};
use dataset_prep::imaging::TargetSize;
use dataset_prep::prepare::{self, PrepareError, PrepareOptions};
use dataset_prep::{logging, output};
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "dataset-prep")]
#[command(version)]
#[command(about = "Prepare an image dataset by resizing and converting to grayscale.")]
#[command(long_about = "\
Prepare an image dataset by resizing and converting to grayscale.

Every file directly inside --raw_dir whose name contains a dot is decoded,
converted to 8-bit grayscale, resized to exactly --img_size x --img_size with
a Lanczos3 filter, and written to --processed_dir under the same file name.
The output format follows the file extension.

Files that cannot be processed are reported and skipped. Subdirectories of
--raw_dir are ignored.

Example:

  dataset-prep --raw_dir raw_crack_images --processed_dir processed_images --img_size 256")]
struct Cli {
    /// Path to the directory with raw images
    #[arg(long = "raw_dir", required_unless_present = "print_config")]
    raw_dir: Option<PathBuf>,

    /// Path to the directory to save processed images
    #[arg(long = "processed_dir", required_unless_present = "print_config")]
    processed_dir: Option<PathBuf>,

    /// The target size (width and height) for the processed images [default: 128]
    #[arg(long = "img_size")]
    img_size: Option<NonZeroU32>,

    /// TOML config file (see --print-config)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reject files whose extension cannot hold grayscale output before
    /// decoding, and exit with status 1 if the raw directory is missing
    #[arg(long)]
    strict: bool,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Log verbosity
    #[arg(long, value_parser = PossibleValuesParser::new(config::LOG_LEVELS.iter().copied()))]
    log_level: Option<String>,

    /// Print a documented config file and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", config::stock_config_toml());
        return Ok(ExitCode::SUCCESS);
    }

    let settings = resolve_settings(&cli)?;
    logging::init_logging(&settings.logging.level);

    let (Some(raw_dir), Some(processed_dir)) = (&cli.raw_dir, &cli.processed_dir) else {
        return Err("--raw_dir and --processed_dir are required".into());
    };

    let options = PrepareOptions {
        size: settings.processing.size,
        strict: settings.processing.strict,
    };
    let reporter = output::ProgressReporter::new(settings.output.progress);
    let outcome = prepare::prepare(raw_dir, processed_dir, &options, |event| {
        reporter.handle(event)
    });
    reporter.finish();

    match outcome {
        Ok(report) => output::print_summary(&report),
        Err(e @ (PrepareError::SourceNotFound(_) | PrepareError::SourceNotDirectory(_))) => {
            eprintln!("{}", output::format_setup_error(&e));
            // A missing source exits 0 unless strict.
            if options.strict {
                return Ok(ExitCode::FAILURE);
            }
        }
        Err(e) => return Err(e.into()),
    }

    println!("{}", output::completion_message());
    Ok(ExitCode::SUCCESS)
}

/// Stock defaults, then the `--config` file, then command-line flags.
fn resolve_settings(cli: &Cli) -> Result<PrepConfig, config::ConfigError> {
    let mut settings = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => PrepConfig::default(),
    };

    if let Some(edge) = cli.img_size {
        settings.processing.size = TargetSize::square(edge);
    }
    if cli.strict {
        settings.processing.strict = true;
    }
    if cli.no_progress {
        settings.output.progress = false;
    }
    if let Some(level) = &cli.log_level {
        settings.logging.level = level.clone();
    }

    settings.validate()?;
    Ok(settings)
}
