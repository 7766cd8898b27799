use std::path::Path;

use crate::audio::domain::audio_error::AudioError;
use crate::audio::domain::audio_segment::AudioSegment;
use crate::audio::domain::audio_writer::AudioWriter;

/// Writes audio as 32-bit float PCM WAV.
pub struct WavAudioWriter;

impl AudioWriter for WavAudioWriter {
    fn write_audio(&self, path: &Path, audio: &AudioSegment) -> Result<(), AudioError> {
        write_wav(path, audio).map_err(|e| AudioError::Write {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

fn write_wav(path: &Path, audio: &AudioSegment) -> Result<(), hound::Error> {
    let spec = hound::WavSpec {
        channels: audio.channels(),
        sample_rate: audio.sample_rate(),
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in audio.samples() {
        writer.write_sample(sample)?;
    }
    writer.finalize()
}
