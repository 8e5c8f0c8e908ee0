use clap::{Parser, Subcommand};
use imagesmith::cache::CacheStats;
use imagesmith::config::{self, ProcessorConfig};
use imagesmith::imaging::{ImageBackend, OutputFormat, RustBackend};
use imagesmith::info::ImageInfo;
use imagesmith::output;
use imagesmith::process::Processor;
use imagesmith::recipe::{self, RenderOptions};
use std::path::{Path, PathBuf};

/// Per-render flags; each overrides the recipe's value when given.
#[derive(clap::Args, Clone)]
struct RenderArgs {
    /// TOML recipe with output settings and the operation list
    #[arg(long, short)]
    recipe: Option<PathBuf>,

    /// Directory artifacts are written to (default: next to each source)
    #[arg(long, short)]
    output_dir: Option<PathBuf>,

    /// Output format: webp, png, jpg, gif, avif, bmp, tiff
    #[arg(long, short)]
    format: Option<OutputFormat>,

    /// Render even if the artifact is already cached
    #[arg(long)]
    force: bool,

    /// Image used when a source cannot be read
    #[arg(long)]
    fallback: Option<PathBuf>,
}

impl RenderArgs {
    fn options(&self) -> Result<RenderOptions, recipe::RecipeError> {
        let mut options = match &self.recipe {
            Some(path) => recipe::load_recipe(path)?,
            None => RenderOptions::default(),
        };
        if let Some(dir) = &self.output_dir {
            options.output_dir = Some(dir.clone());
        }
        if let Some(format) = self.format {
            options.format = format;
        }
        if self.force {
            options.force = true;
        }
        if let Some(fallback) = &self.fallback {
            options.fallback = Some(fallback.clone());
        }
        Ok(options)
    }
}

fn version_string() -> &'static str {
    let on_tag = env!("IMAGESMITH_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("IMAGESMITH_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "imagesmith")]
#[command(about = "Render images through cached operation pipelines")]
#[command(long_about = "\
Render images through cached operation pipelines

Each render applies an ordered list of operations to a source image and
writes the result as <stem>-<signature>.<ext>. The signature covers the
source's modification time, every operation and its parameters, and the
encoder settings, so an identical request is served from the existing file
without decoding anything.

Operations come from a TOML recipe:

  format = \"webp\"
  output_dir = \"cache\"

  [[operations]]
  op = \"fit\"
  width = 300
  height = 200
  mode = \"fill\"

  [[operations]]
  op = \"watermark\"
  path = \"logo.png\"
  placement = \"bottom-right\"

A step that fails (missing watermark, crop outside the image, ...) is
reported and skipped; the rest of the pipeline still runs.

Set RUST_LOG=imagesmith=debug to see cache decisions.
Run 'imagesmith gen-config' to generate a documented imagesmith.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Processor config file (default: ./imagesmith.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render one or more sources through a recipe
    Render {
        #[arg(required = true)]
        sources: Vec<PathBuf>,
        #[command(flatten)]
        args: RenderArgs,
    },
    /// Show the signature and artifact path a render would use
    Plan {
        source: PathBuf,
        #[command(flatten)]
        args: RenderArgs,
    },
    /// Show size and type of an image, optionally as an embeddable URI
    Info {
        file: PathBuf,
        /// Also print a base64 data URI of the file
        #[arg(long)]
        data_uri: bool,
        /// Also print an SVG placeholder data URI with the same proportions
        #[arg(long)]
        placeholder: bool,
    },
    /// Print a stock imagesmith.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Render { sources, args } => {
            let processor = Processor::new(load_config(cli.config.as_deref())?)?;
            let options = args.options()?;
            let mut stats = CacheStats::default();
            for (i, source) in sources.iter().enumerate() {
                let render = processor.process(source, &options)?;
                stats.record(render.outcome);
                output::print_render(i + 1, source, &render);
            }
            println!("Cache: {}", stats);
        }
        Command::Plan { source, args } => {
            let processor = Processor::new(load_config(cli.config.as_deref())?)?;
            let options = args.options()?;
            let plan = processor.plan(&source, &options)?;
            output::print_plan(&source, &plan, &options.operations);
        }
        Command::Info {
            file,
            data_uri,
            placeholder,
        } => {
            let dims = RustBackend::new().identify(&file)?;
            let info = ImageInfo::new(&file, dims.width, dims.height);
            output::print_info(&info);
            if data_uri {
                println!("{}", info.inline_data_uri()?);
            }
            if placeholder {
                println!("{}", info.svg_placeholder()?);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// The explicit `--config` file, or `imagesmith.toml` in the working
/// directory when there is one.
fn load_config(path: Option<&Path>) -> Result<ProcessorConfig, config::ConfigError> {
    match path {
        Some(path) => config::load_config(path),
        None => config::discover_config(Path::new(".")),
    }
}
