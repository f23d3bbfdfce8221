use clap::{Parser, Subcommand};
use image_resizer::config::{self, RequestDefaults};
use image_resizer::{ImageResizer, Rejection, ResizeRequest, RustBackend, output};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "image-resizer")]
#[command(about = "Scale, rotate and re-encode an image as JPEG")]
#[command(long_about = "\
Scale, rotate and re-encode an image as JPEG

The source file is copied into a scratch folder and never modified. The
result is written to a fixed file name in that folder, and its path is
printed on stdout:

  photo.jpg
    → <scratch>/staging-XXXX/photoResizerCopy.jpg   (working copy, deleted afterwards)
    → <scratch>/tempResizedImage.jpg                (result, overwritten by each run)

Scaling makes the longer side (after EXIF orientation) equal --max-side.
Rotation is clockwise and applied after scaling: 0, 90, 180 or 270.

Run 'image-resizer gen-config' to generate a documented resizer.toml.")]
#[command(version)]
struct Cli {
    /// Configuration file (missing file = stock defaults)
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Log level: trace, debug, info, warn, error (RUST_LOG overrides)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resize one image and print the output path
    Resize(ResizeArgs),
    /// Print a stock resizer.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct ResizeArgs {
    /// Image to resize
    path: String,

    /// Longer side of the result, in pixels
    #[arg(long)]
    max_side: Option<u32>,

    /// JPEG quality 1-100; 0 or negative means maximum
    #[arg(long, allow_negative_numbers = true)]
    quality: Option<i32>,

    /// Clockwise rotation in degrees: 0, 90, 180 or 270
    #[arg(long, allow_negative_numbers = true)]
    rotation: Option<i32>,

    /// Keep images smaller than --max-side at their size
    #[arg(long, value_name = "BOOL")]
    only_scale_down: Option<bool>,

    /// Scratch folder (overrides storage.temp_dir)
    #[arg(long)]
    temp_dir: Option<PathBuf>,

    /// Print the result or rejection as JSON
    #[arg(long)]
    json: bool,
}

impl ResizeArgs {
    fn to_request(&self, defaults: &RequestDefaults) -> ResizeRequest {
        let mut request = ResizeRequest::with_defaults(self.path.clone(), defaults);
        if let Some(max_side) = self.max_side {
            request.max_side = max_side;
        }
        if let Some(quality) = self.quality {
            request.quality = quality;
        }
        if let Some(rotation) = self.rotation {
            request.rotation = rotation;
        }
        if let Some(only_scale_down) = self.only_scale_down {
            request.only_scale_down = only_scale_down;
        }
        request
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            Ok(ExitCode::SUCCESS)
        }
        Command::Resize(args) => {
            let mut config = config::load_config(&cli.config)?;
            if let Some(dir) = &args.temp_dir {
                config.storage.temp_dir = Some(dir.clone());
            }
            let request = args.to_request(&config.defaults);

            let resizer = ImageResizer::new(RustBackend::new(), config.storage);
            match resizer.resize_image(&request).await {
                Ok(path) => {
                    output::print_resolution(&path, args.json)?;
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => {
                    warn!(stage = ?err.stage(), "resize rejected");
                    output::print_rejection(&Rejection::from(&err), args.json)?;
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

/// Install the stderr log subscriber. `RUST_LOG` takes precedence over `level`.
fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
