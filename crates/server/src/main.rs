use std::path::PathBuf;
use std::process;

use clap::Parser;
use tokio::net::TcpListener;

use captioner_core::pipeline::caption_pipeline::CaptionPipeline;
use captioner_core::shared::config::{CaptionerConfig, TranscriptionStrategy};
use captioner_server::{router, AppState};

/// HTTP service that transcribes uploads and renders captioned videos.
#[derive(Parser)]
#[command(name = "captioner-server", version)]
struct Cli {
    /// JSON config file (default: <config dir>/Captioner/config.json if present).
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    /// Whisper model file; skips the cache and download.
    #[arg(long)]
    model: Option<PathBuf>,

    /// How audio reaches the model: direct or extract.
    #[arg(long)]
    strategy: Option<TranscriptionStrategy>,

    /// Remotion project directory the renderer runs in.
    #[arg(long)]
    remotion_dir: Option<PathBuf>,

    /// Root for per-job temp files and rendered outputs.
    #[arg(long)]
    work_dir: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{e}");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli)?;

    // Model resolution may download over blocking HTTP, so it happens
    // before the async runtime exists.
    log::info!("Loading speech model...");
    let pipeline = CaptionPipeline::from_config(&config)?;
    log::info!("Model {} ready", pipeline.model_id());

    let swept = pipeline.resources().sweep_stale();
    if swept.workspaces > 0 || swept.outputs > 0 {
        log::info!(
            "Removed {} stale workspaces and {} stale outputs from {}",
            swept.workspaces,
            swept.outputs,
            pipeline.resources().root().display()
        );
    }

    let app = router(AppState::new(pipeline), config.server.body_limit_bytes);
    let address = config.server.bind_address();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let listener = TcpListener::bind(&address).await?;
        log::info!("Listening on {address}");
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                log::info!("Shutting down");
            })
            .await?;
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

fn load_config(cli: Cli) -> Result<CaptionerConfig, Box<dyn std::error::Error>> {
    let mut config = CaptionerConfig::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(model) = cli.model {
        config.model.path = Some(model);
    }
    if let Some(strategy) = cli.strategy {
        config.transcription.strategy = strategy;
    }
    if let Some(dir) = cli.remotion_dir {
        config.render.working_dir = Some(dir);
    }
    if let Some(dir) = cli.work_dir {
        config.work_dir = Some(dir);
    }
    Ok(config)
}
