//! Landmark-driven VTuber avatar with recording and live style switching.

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::io;
use std::path::PathBuf;
use vtuber_avatar::{
    app::{log_controls, prompt_style, AvatarApp},
    config::Config,
    headless::{FeedSource, HeadlessPresenter, SceneLogFactory},
    perception::JsonLinesFeed,
    session::Command,
    style::AvatarStyle,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Avatar style (cute, anime, cool, warm); skips the startup prompt
    #[arg(short, long)]
    style: Option<AvatarStyle>,

    /// Camera index to use
    #[arg(long, default_value = "0")]
    cam: i32,

    /// Landmark feed with one JSON frame per line ("-" for stdin)
    #[arg(short, long)]
    landmarks: Option<PathBuf>,

    /// Run without a window, driven by the landmark feed alone
    #[arg(long)]
    headless: bool,

    /// Start recording with the first frame
    #[arg(short, long)]
    record: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Write the default configuration to this path and exit
    #[arg(long)]
    write_config: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if let Some(path) = &args.write_config {
        Config::default()
            .to_file(path)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        info!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    info!("VTuber Avatar");

    // Load configuration if provided
    let config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            match Config::from_file(path) {
                Ok(cfg) => cfg,
                Err(e) => {
                    warn!("Failed to load config file: {e}. Using defaults.");
                    Config::default()
                }
            }
        }
        None => Config::default(),
    };
    config.validate().context("Invalid configuration")?;

    let style = match args.style {
        Some(style) => style,
        None => {
            let default = config.avatar.default_style;
            // The feed may be on stdin, so never prompt there
            if args.landmarks.as_deref() == Some(std::path::Path::new("-")) {
                default
            } else {
                prompt_style(&mut io::stdin().lock(), &mut io::stdout(), default)?
            }
        }
    };

    log_controls(&config.keys);

    if args.headless {
        run_headless(&args, config, style)
    } else {
        run_windowed(&args, config, style)
    }
}

fn run_headless(args: &Args, config: Config, style: AvatarStyle) -> Result<()> {
    let path = args
        .landmarks
        .as_ref()
        .context("--headless needs a landmark feed (--landmarks)")?;
    let feed = JsonLinesFeed::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let mut app = AvatarApp::new(
        config,
        style,
        FeedSource::new(feed),
        HeadlessPresenter::new(),
        SceneLogFactory,
    );
    if args.record {
        app.apply(Command::ToggleRecording)?;
    }

    let frames = app.run()?;
    info!("Processed {frames} frames");
    Ok(())
}

#[cfg(feature = "opencv")]
fn run_windowed(args: &Args, config: Config, style: AvatarStyle) -> Result<()> {
    use vtuber_avatar::opencv_backend::{CameraSource, VideoFileFactory, WindowPresenter, WINDOW_NAME};

    let feed = args
        .landmarks
        .as_ref()
        .map(JsonLinesFeed::open)
        .transpose()
        .context("Failed to open landmark feed")?;

    // Capture failure before the loop is fatal
    let source = CameraSource::open(args.cam, feed, config.preview.mirror).context("Error: Could not open webcam")?;
    let presenter = WindowPresenter::new(WINDOW_NAME)?;

    let mut app = AvatarApp::new(config, style, source, presenter, VideoFileFactory);
    if args.record {
        app.apply(Command::ToggleRecording)?;
    }

    let frames = app.run()?;
    info!("Processed {frames} frames");
    Ok(())
}

#[cfg(not(feature = "opencv"))]
fn run_windowed(args: &Args, _config: Config, _style: AvatarStyle) -> Result<()> {
    anyhow::bail!(
        "Camera {} requested, but this build has no OpenCV support; rebuild with --features opencv or use --headless",
        args.cam
    )
}
