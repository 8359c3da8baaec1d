use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use courier_core::{Layout, SearchMode, SessionConfig};
use courier_sim::{parse_canvas, simulate, write_summary, SimOptions};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LayoutArg {
    Canvas,
    Native,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Live,
    Cached,
}

#[derive(Parser, Debug)]
#[command(name = "courier-sim", version, about = "Run one courier delivery round headlessly")]
struct Args {
    /// Map image (png, jpeg or bmp)
    #[arg(long = "map", value_name = "PATH")]
    map: PathBuf,

    /// Stretch onto the canvas or keep the image's own size
    #[arg(long, value_enum, default_value_t = LayoutArg::Canvas)]
    layout: LayoutArg,

    /// Canvas size used by the canvas layout
    #[arg(long, value_name = "WxH", value_parser = parse_canvas, default_value = "1000x700")]
    canvas: (u32, u32),

    /// Sample pixels on every search or search the classified grid
    #[arg(long, value_enum, default_value_t = ModeArg::Live)]
    mode: ModeArg,

    #[arg(long)]
    seed: Option<u64>,

    /// Virtual time cap in seconds
    #[arg(long = "max-seconds", default_value_t = 600.0)]
    max_seconds: f64,

    /// Also write the JSON summary here
    #[arg(long = "summary", value_name = "PATH")]
    summary: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level = match args.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder().with_ansi(false).with_max_level(level).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
    info!(?args, "starting simulator");

    let mut config = SessionConfig { seed: args.seed, ..SessionConfig::default() };
    config.canvas_width = args.canvas.0;
    config.canvas_height = args.canvas.1;
    config.search.mode = match args.mode {
        ModeArg::Live => SearchMode::Live,
        ModeArg::Cached => SearchMode::Cached,
    };
    let layout = match args.layout {
        LayoutArg::Canvas => config.canvas_layout(),
        LayoutArg::Native => Layout::Native,
    };
    if !args.max_seconds.is_finite() || args.max_seconds < 0.0 {
        anyhow::bail!("--max-seconds must be a non-negative number");
    }
    let opts = SimOptions { map: args.map, layout, max_time: Duration::from_secs_f64(args.max_seconds) };

    let summary = simulate(&opts, config)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    if let Some(path) = &args.summary {
        write_summary(path, &summary)?;
        info!(path = %path.display(), "summary written");
    }
    Ok(())
}
