use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{ArgAction, Parser, Subcommand};

use strobe::{
    CpuRendererFactory, DirAssetResolver, EncoderFactory, FfmpegEncoderFactory,
    FfmpegEncoderOpts, Fps, FrameIndex, Orchestrator, OrchestratorOpts,
    PngSequenceEncoderFactory, RenderManifest, RenderSettings, Resolution, SceneParams,
};

const BACKGROUND: [u8; 4] = [7, 10, 18, 255];

#[derive(Parser, Debug)]
#[command(name = "strobe", version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render every job of a manifest.
    Render(RenderArgs),
    /// Render a single frame of a built-in scene as a PNG.
    Frame(FrameArgs),
    /// List built-in scenes.
    Scenes,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Render manifest JSON.
    #[arg(long)]
    manifest: PathBuf,

    /// Override the manifest's `max_parallelism`.
    #[arg(long)]
    parallel: Option<usize>,

    /// Write PNG sequences (one directory per job) instead of MP4 files.
    #[arg(long)]
    png: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Scene name (see `strobe scenes`).
    #[arg(long)]
    scene: String,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Timeline duration in seconds.
    #[arg(long, default_value_t = 6.0)]
    duration: f64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Scenes => cmd_scenes(),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let manifest = RenderManifest::from_path(&args.manifest)?;
    let registry = strobe::scenes::registry()?;
    let jobs = manifest.to_jobs(&registry)?;

    let encoders: Arc<dyn EncoderFactory> = if args.png {
        Arc::new(PngSequenceEncoderFactory)
    } else {
        Arc::new(FfmpegEncoderFactory::new(FfmpegEncoderOpts {
            overwrite: true,
            bg_rgba: BACKGROUND,
        }))
    };
    let renderers = Arc::new(CpuRendererFactory::new(RenderSettings {
        clear_rgba: Some(BACKGROUND),
    }));
    let assets = Arc::new(DirAssetResolver::new(manifest.assets_root()));
    let opts = OrchestratorOpts {
        max_parallelism: args.parallel.unwrap_or(manifest.max_parallelism),
        ..OrchestratorOpts::default()
    };

    let report = Orchestrator::new(renderers, encoders, assets, opts).run_jobs(jobs)?;
    print!("{}", report.summary());
    if !report.all_succeeded() {
        anyhow::bail!("{} job(s) failed", report.failed().count());
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let registry = strobe::scenes::registry()?;
    let descriptor = registry.get(&args.scene)?;
    let params = SceneParams {
        duration_secs: args.duration,
        fps: Fps::integer(args.fps)?,
        resolution: Resolution::new(args.width, args.height)?,
    };

    let mut scene = strobe::instantiate(descriptor.as_ref(), params, None)?;
    let tick = scene.seek(FrameIndex(args.frame))?;
    let snapshot = scene.snapshot(tick)?;

    let mut renderer = strobe::CpuRenderer::new(RenderSettings {
        clear_rgba: Some(BACKGROUND),
    });
    let frame = strobe::FrameRenderer::render(&mut renderer, &snapshot, params.resolution)?;

    strobe::ensure_parent_dir(&args.out)?;
    strobe::write_png(&args.out, &frame)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_scenes() -> anyhow::Result<()> {
    for name in strobe::scenes::registry()?.names() {
        println!("{name}");
    }
    Ok(())
}
