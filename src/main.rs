use clap::{ArgAction, Parser, Subcommand};
use quicksize::crop::{self, CropRect, MAX_EXTENT};
use quicksize::nodes::{
    BindingError, Bindings, CropNode, CropRequest, Node, ORIENTATION_INPUT, PRESET_INPUT,
};
use quicksize::output::{self, CropSummary, SizeReport};
use quicksize::registry::NodeRegistry;
use quicksize::resolution::Orientation;
use quicksize::{config, imaging};
use std::path::PathBuf;
use thiserror::Error;

fn version_string() -> &'static str {
    let on_tag = env!("QUICKSIZE_ON_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("QUICKSIZE_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Error, Debug)]
enum CliError {
    #[error("unknown node {0:?} (run `quicksize nodes` to list them)")]
    UnknownNode(String),
    #[error("{0} is not a size node")]
    NotASizeNode(String),
    #[error("invalid --set: {0}")]
    Binding(#[from] BindingError),
}

#[derive(Parser)]
#[command(name = "quicksize")]
#[command(about = "Preset image sizes and bounds-safe crops")]
#[command(long_about = "\
Preset image sizes and bounds-safe crops

Size nodes turn a model family, an aspect preset and an orientation into a
fixed width and height. The crop node cuts a rectangle out of one or more
images, clamping it so it always fits.

Examples:

  quicksize nodes
  quicksize size --node flux --preset 16:9 --orientation vertical
  quicksize size --node wan --set model_size='Wan 5B' --set video_size=720p
  quicksize crop --input a.png --input b.png --output out.png --x 64 --width 256

Presets and orientation fall back to defaults when unknown. Run
'quicksize gen-config' to generate a documented quicksize.toml, including
how to define your own size nodes.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (missing file means stock defaults)
    #[arg(long, default_value = "quicksize.toml", global = true)]
    config: PathBuf,

    /// Log more: -v info, -vv debug, -vvv trace. QUICKSIZE_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct SizeArgs {
    /// Node id or alias (flux, qwen, sd15, sdxl, wan, or a configured id)
    #[arg(long)]
    node: String,

    /// Aspect preset, e.g. 16:9
    #[arg(long)]
    preset: Option<String>,

    /// Overrides [size] orientation from the config
    #[arg(long, value_enum)]
    orientation: Option<Orientation>,

    /// Bind any other node input, e.g. --set 1.5x=true
    #[arg(long = "set", value_name = "NAME=VALUE")]
    set: Vec<String>,

    /// Snap both dimensions down to a multiple of N
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    align: Option<u32>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
struct CropArgs {
    /// Input image; repeat to crop a batch of equally sized images
    #[arg(long, required = true)]
    input: Vec<PathBuf>,

    /// Output image; batches write <stem>_<n>.<ext>
    #[arg(long)]
    output: PathBuf,

    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..=MAX_EXTENT as i64))]
    x: u32,

    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..=MAX_EXTENT as i64))]
    y: u32,

    #[arg(long, default_value_t = 512, value_parser = clap::value_parser!(u32).range(1..=MAX_EXTENT as i64))]
    width: u32,

    #[arg(long, default_value_t = 512, value_parser = clap::value_parser!(u32).range(1..=MAX_EXTENT as i64))]
    height: u32,

    /// Skip clamping the rectangle inside the image before slicing
    #[arg(long)]
    no_constrain: bool,
}

#[derive(Subcommand)]
enum Command {
    /// List registered nodes with their inputs and outputs
    Nodes {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Resolve a width and height from a size node
    Size(SizeArgs),
    /// Crop one or more images to a rectangle
    Crop(CropArgs),
    /// Print a stock quicksize.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Nodes { json } => {
            let config = config::load_config(&cli.config)?;
            let registry = NodeRegistry::from_config(&config)?;
            if json {
                let summaries = output::node_summaries(&registry);
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                output::print_node_list(&registry);
            }
        }
        Command::Size(args) => {
            let config = config::load_config(&cli.config)?;
            let registry = NodeRegistry::from_config(&config)?;
            run_size(&registry, &config, args)?;
        }
        Command::Crop(args) => {
            let config = config::load_config(&cli.config)?;
            run_crop(&config, args)?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_env("QUICKSIZE_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_size(
    registry: &NodeRegistry,
    config: &config::QuickSizeConfig,
    args: SizeArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let entry = registry
        .find(&args.node)
        .ok_or_else(|| CliError::UnknownNode(args.node.clone()))?;
    let Node::Size(node) = entry.create() else {
        return Err(CliError::NotASizeNode(entry.id.clone()).into());
    };
    // --align beats the node's own alignment, which beats [size] align.
    let align = args.align.or(node.align()).or(config.size.align);
    let node = node.with_alignment(align);

    let mut bindings = Bindings::new();
    for assignment in &args.set {
        bindings.assign(assignment).map_err(CliError::from)?;
    }
    if let Some(preset) = &args.preset {
        bindings.set(PRESET_INPUT, preset);
    }
    let orientation = match (args.orientation, bindings.get(ORIENTATION_INPUT)) {
        (Some(o), _) => o,
        (None, Some(raw)) => Orientation::from_binding(raw),
        (None, None) => config.size.orientation,
    };
    bindings.set(ORIENTATION_INPUT, orientation.as_str());

    let resolution = node.invoke(&bindings);
    let report = SizeReport::new(&node, orientation, &resolution);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_size(&node, &report);
    }
    Ok(())
}

fn run_crop(
    config: &config::QuickSizeConfig,
    args: CropArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let batch = imaging::load_batch(&args.input)?;
    let (frames, source_height, source_width, _) = batch.dim();
    let request = CropRequest {
        rect: CropRect::new(args.x, args.y, args.width, args.height),
        constrain_to_image: config.crop.constrain_to_image && !args.no_constrain,
    };
    let bounds = crop::effective_bounds(
        request.rect,
        source_width,
        source_height,
        request.constrain_to_image,
    );
    let cropped = CropNode.do_crop(batch.view(), request);
    let written = imaging::save_batch(cropped, &args.output)?;
    output::print_crop(&CropSummary {
        frames,
        source_width,
        source_height,
        bounds,
        written,
    });
    Ok(())
}
