use std::path::Path;

use crate::audio::domain::audio_error::AudioError;
use crate::audio::domain::audio_reader::AudioReader;
use crate::audio::domain::audio_segment::AudioSegment;

/// Decodes the best audio stream of any container ffmpeg understands,
/// resampled to mono f32 at the requested rate.
pub struct FfmpegAudioReader;

impl AudioReader for FfmpegAudioReader {
    fn read_audio(
        &self,
        path: &Path,
        target_sample_rate: u32,
    ) -> Result<Option<AudioSegment>, AudioError> {
        decode_mono(path, target_sample_rate).map_err(|e| AudioError::Decode {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

fn decode_mono(
    path: &Path,
    target_sample_rate: u32,
) -> Result<Option<AudioSegment>, ffmpeg_next::Error> {
    ffmpeg_next::init()?;

    let mut ictx = ffmpeg_next::format::input(path)?;

    let audio_stream = match ictx.streams().best(ffmpeg_next::media::Type::Audio) {
        Some(stream) => stream,
        None => return Ok(None),
    };
    let audio_stream_index = audio_stream.index();

    let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(audio_stream.parameters())?;
    let mut decoder = codec_ctx.decoder().audio()?;

    let mut resampler = ffmpeg_next::software::resampling::Context::get(
        decoder.format(),
        decoder.channel_layout(),
        decoder.rate(),
        ffmpeg_next::format::Sample::F32(ffmpeg_next::format::sample::Type::Planar),
        ffmpeg_next::ChannelLayout::MONO,
        target_sample_rate,
    )?;

    let mut frames = FramePair::new();
    let mut samples: Vec<f32> = Vec::new();

    for (stream, packet) in ictx.packets() {
        if stream.index() != audio_stream_index {
            continue;
        }
        decoder.send_packet(&packet)?;
        drain(&mut decoder, &mut resampler, &mut frames, &mut samples)?;
    }

    decoder.send_eof()?;
    drain(&mut decoder, &mut resampler, &mut frames, &mut samples)?;

    // The resampler may still hold buffered samples.
    if let Ok(Some(delay)) = resampler.flush(&mut frames.resampled) {
        if delay.output > 0 {
            push_plane(&frames.resampled, &mut samples);
        }
    }

    log::debug!(
        "Decoded {} samples at {target_sample_rate} Hz from {}",
        samples.len(),
        path.display()
    );
    Ok(Some(AudioSegment::mono(samples, target_sample_rate)))
}

struct FramePair {
    decoded: AudioFrame,
    resampled: AudioFrame,
}

impl FramePair {
    fn new() -> Self {
        Self {
            decoded: AudioFrame::empty(),
            resampled: AudioFrame::empty(),
        }
    }
}

type AudioFrame = ffmpeg_next::util::frame::audio::Audio;

/// Pull every frame the decoder has ready through the resampler.
fn drain(
    decoder: &mut ffmpeg_next::decoder::Audio,
    resampler: &mut ffmpeg_next::software::resampling::Context,
    frames: &mut FramePair,
    out: &mut Vec<f32>,
) -> Result<(), ffmpeg_next::Error> {
    while decoder.receive_frame(&mut frames.decoded).is_ok() {
        resampler.run(&frames.decoded, &mut frames.resampled)?;
        push_plane(&frames.resampled, out);
    }
    Ok(())
}

/// Append the samples of a planar mono f32 frame.
fn push_plane(frame: &AudioFrame, out: &mut Vec<f32>) {
    if frame.samples() == 0 {
        return;
    }
    out.extend_from_slice(frame.plane::<f32>(0));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_audio_nonexistent_file() {
        let path = if cfg!(windows) {
            Path::new("Z:\\nonexistent\\clip.mp4")
        } else {
            Path::new("/nonexistent/clip.mp4")
        };
        let err = FfmpegAudioReader.read_audio(path, 16000).unwrap_err();
        assert!(err.to_string().contains("clip.mp4"));
    }

    #[test]
    fn test_read_audio_garbage_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.mp4");
        std::fs::write(&path, b"definitely not a media container").unwrap();
        let result = FfmpegAudioReader.read_audio(&path, 16000);
        assert!(matches!(result, Err(AudioError::Decode { .. })));
    }
}
