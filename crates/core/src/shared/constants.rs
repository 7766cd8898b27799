pub const WHISPER_MODEL_ID: &str = "whisper-tiny.en";
pub const WHISPER_MODEL_FILENAME: &str = "ggml-tiny.en.bin";
pub const WHISPER_MODEL_URL: &str =
    "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-tiny.en.bin";
pub const WHISPER_SAMPLE_RATE: u32 = 16000;
pub const WHISPER_LANGUAGE: &str = "en";
pub const WHISPER_BEAM_SIZE: i32 = 5;

pub const REMOTION_PROGRAM: &str = "npx";
pub const REMOTION_PREFIX_ARGS: &[&str] = &["remotion", "render"];
pub const REMOTION_ENTRY_POINT: &str = "src/remotion/index.ts";
pub const REMOTION_COMPOSITION_ID: &str = "CaptionVideo";
/// Software GL path; avoids failures on hosts without a usable GPU.
pub const REMOTION_GL_BACKEND: &str = "angle";
/// One internal render worker per job.
pub const REMOTION_CONCURRENCY: u32 = 1;

pub const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 30 * 60;
pub const DEFAULT_TRANSCRIBE_TIMEOUT_SECS: u64 = 10 * 60;
pub const DEFAULT_MAX_CONCURRENT_RENDERS: usize = 1;

pub const OUTPUT_VIDEO_EXTENSION: &str = "mp4";
pub const OUTPUT_VIDEO_MIME: &str = "video/mp4";
pub const OUTPUT_DOWNLOAD_NAME: &str = "captioned_video.mp4";

pub const BATCH_SEGMENTS_FILENAME: &str = "transcription.json";
pub const BATCH_OUTPUT_FILENAME: &str = "output.mp4";

pub const APP_DIR_NAME: &str = "Captioner";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 512 * 1024 * 1024;
