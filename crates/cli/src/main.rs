use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use captioner_core::pipeline::caption_pipeline::CaptionPipeline;
use captioner_core::shared::config::{CaptionerConfig, TranscriptionStrategy};
use captioner_core::shared::constants::{BATCH_OUTPUT_FILENAME, BATCH_SEGMENTS_FILENAME};

/// Transcribe speech in a video and burn the captions back in with Remotion.
#[derive(Parser)]
#[command(name = "captioner", version)]
struct Cli {
    #[command(flatten)]
    shared: SharedArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct SharedArgs {
    /// JSON config file (default: <config dir>/Captioner/config.json if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Whisper model file; skips the cache and download.
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// How audio reaches the model: direct or extract.
    #[arg(long, global = true)]
    strategy: Option<TranscriptionStrategy>,

    /// Remotion project directory the renderer runs in.
    #[arg(long, global = true)]
    remotion_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Write the video's speech as a JSON array of segments.
    Transcribe {
        video: PathBuf,
        segments: PathBuf,
    },
    /// Render captions from a segments file over the video.
    Render {
        video: PathBuf,
        segments: PathBuf,
        #[arg(long, default_value = BATCH_OUTPUT_FILENAME)]
        output: PathBuf,
    },
    /// Transcribe, then render.
    Run {
        video: PathBuf,
        #[arg(long, default_value = BATCH_SEGMENTS_FILENAME)]
        segments: PathBuf,
        #[arg(long, default_value = BATCH_OUTPUT_FILENAME)]
        output: PathBuf,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.shared)?;
    let pipeline = CaptionPipeline::from_config(&config)?;

    match cli.command {
        Command::Transcribe { video, segments } => {
            let result = pipeline.transcribe_to_file(&video, &segments)?;
            log::info!("{} segments written to {}", result.len(), segments.display());
        }
        Command::Render {
            video,
            segments,
            output,
        } => {
            let produced = pipeline.render_from_file(&video, &segments, &output)?;
            log::info!("Output written to {}", produced.display());
        }
        Command::Run {
            video,
            segments,
            output,
        } => {
            let produced = pipeline.run(&video, &segments, &output)?;
            log::info!("Done! Result saved to {}", produced.display());
        }
    }

    Ok(())
}

fn load_config(args: &SharedArgs) -> Result<CaptionerConfig, Box<dyn std::error::Error>> {
    let mut config = CaptionerConfig::load(args.config.as_deref())?;
    if let Some(ref model) = args.model {
        config.model.path = Some(model.clone());
    }
    if let Some(strategy) = args.strategy {
        config.transcription.strategy = strategy;
    }
    if let Some(ref dir) = args.remotion_dir {
        config.render.working_dir = Some(dir.clone());
    }
    // A one-shot run has nothing to gain from loading the model early.
    config.model.preload = false;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_defaults_match_batch_file_names() {
        let cli = Cli::parse_from(["captioner", "run", "clip.mp4"]);
        match cli.command {
            Command::Run {
                segments, output, ..
            } => {
                assert_eq!(segments, PathBuf::from("transcription.json"));
                assert_eq!(output, PathBuf::from("output.mp4"));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_shared_flags_override_config() {
        let cli = Cli::parse_from([
            "captioner",
            "render",
            "clip.mp4",
            "segments.json",
            "--strategy",
            "extract",
            "--remotion-dir",
            "/srv/remotion",
            "--model",
            "/models/ggml-base.en.bin",
        ]);
        let config = load_config(&cli.shared).unwrap();
        assert_eq!(config.transcription.strategy, TranscriptionStrategy::Extract);
        assert_eq!(config.render.working_dir, Some(PathBuf::from("/srv/remotion")));
        assert_eq!(config.model.path, Some(PathBuf::from("/models/ggml-base.en.bin")));
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let parsed = Cli::try_parse_from([
            "captioner",
            "transcribe",
            "a.mp4",
            "b.json",
            "--strategy",
            "both",
        ]);
        assert!(parsed.is_err());
    }
}
