//! Parameter report for the zoo's models.
//!
//! Builds each requested architecture and prints its parameter count and
//! size in MiB; ``--json`` prints one JSON summary per line instead.
//!
//! ```bash
//! $ RUST_LOG=info cargo run -p param_report -- --num-classes 10 --in-channels 1
//! ```

use bmzoo::models::registry::{Architecture, ModelConfig};
use bmzoo::utility::summary::ModelSummary;
use burn::backend::NdArray;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Models to report; defaults to every `ResNet`.
    #[arg(long, value_delimiter = ',')]
    models: Vec<String>,

    /// Report every architecture in the zoo.
    #[arg(long, default_value = "false")]
    all: bool,

    /// Number of output classes.
    #[arg(long, default_value_t = 10)]
    num_classes: usize,

    /// Number of input channels.
    #[arg(long, default_value_t = 1)]
    in_channels: usize,

    /// Download and load pretrained backbone weights.
    #[arg(long, default_value = "false")]
    pretrained: bool,

    /// Print JSON lines.
    #[arg(long, default_value = "false")]
    json: bool,
}

fn selected(args: &Args) -> anyhow::Result<Vec<Architecture>> {
    if args.all {
        return Ok(Architecture::all().collect());
    }
    if args.models.is_empty() {
        return Ok(Architecture::all().filter(Architecture::is_resnet).collect());
    }
    Ok(args
        .models
        .iter()
        .map(|name| Architecture::try_from_name(name))
        .collect::<Result<_, _>>()?)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    type B = NdArray<f32>;
    let device = Default::default();

    for arch in selected(&args)? {
        let model = ModelConfig::new(arch)
            .with_num_classes(args.num_classes)
            .with_in_channels(args.in_channels)
            .with_pretrained(args.pretrained)
            .init::<B>(&device)?;

        let summary = ModelSummary::of::<B, _>(&arch.to_string(), &model);
        log::debug!("{summary:?}");

        if args.json {
            println!("{}", serde_json::to_string(&summary)?);
        } else {
            println!("{summary}");
        }
    }

    Ok(())
}
