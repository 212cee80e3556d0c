//! WAV import for source samples
//!
//! Non-real-time loading of WAV files into immutable [`SourceSample`]s.
//! Handles integer WAVs at any bit depth (scaled to [-1, 1]) and float
//! WAVs, and deinterleaves stereo into per-channel buffers. The file's own
//! sample rate is recorded on the sample; the voice resampler compensates
//! at trigger time, so no rate conversion happens here.

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::sample::{NoteSet, SourceSample};

/// Load a WAV file into a shared [`SourceSample`].
///
/// `notes` is the set of MIDI notes the sample responds to, `root_note`
/// the note at which it plays back unshifted. `attack_secs`/`release_secs`
/// are the per-sample envelope hints applied at voice trigger time.
#[allow(clippy::too_many_arguments)]
pub fn load_sample(
    name: &str,
    path: &Path,
    notes: NoteSet,
    root_note: u8,
    looping: bool,
    attack_secs: f32,
    release_secs: f32,
) -> Result<Arc<SourceSample>, Box<dyn Error>> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    // Read raw interleaved samples as f32
    let raw_samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => {
            reader.samples::<f32>().map(|s| s.unwrap_or(0.0)).collect()
        }
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.unwrap_or(0) as f32 / max_val)
                .collect()
        }
    };

    let channels: Vec<Vec<f32>> = if spec.channels >= 2 {
        // Deinterleave stereo: L R L R ... -> (L L ..., R R ...).
        // Channels beyond the first two are dropped.
        let stride = spec.channels as usize;
        let num_frames = raw_samples.len() / stride;
        let mut left = Vec::with_capacity(num_frames);
        let mut right = Vec::with_capacity(num_frames);
        for frame in raw_samples.chunks_exact(stride) {
            left.push(frame[0]);
            right.push(frame[1]);
        }
        vec![left, right]
    } else {
        vec![raw_samples]
    };

    let sample = SourceSample::new(
        name,
        &channels,
        spec.sample_rate as f64,
        notes,
        root_note,
        looping,
        attack_secs,
        release_secs,
    );

    info!(
        name,
        path = %path.display(),
        frames = sample.len(),
        channels = sample.num_channels(),
        rate = spec.sample_rate,
        "loaded source sample"
    );

    Ok(Arc::new(sample))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_test_wav(path: &Path, channels: u16, data: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in data {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_load_mono_int_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_test_wav(&path, 1, &[0, 16384, -16384, 32767]);

        let sample = load_sample(
            "mono",
            &path,
            NoteSet::from_range(0..=127),
            60,
            false,
            0.01,
            0.1,
        )
        .unwrap();

        assert_eq!(sample.num_channels(), 1);
        assert_eq!(sample.len(), 4);
        assert_eq!(sample.source_sample_rate(), 22050.0);
        assert!((sample.channel(0)[1] - 0.5).abs() < 1e-3);
        assert!((sample.channel(0)[2] + 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_load_stereo_wav_deinterleaves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        // Interleaved L R L R
        write_test_wav(&path, 2, &[16384, -16384, 8192, -8192]);

        let sample = load_sample(
            "stereo",
            &path,
            NoteSet::from_range(0..=127),
            60,
            false,
            0.0,
            0.0,
        )
        .unwrap();

        assert_eq!(sample.num_channels(), 2);
        assert_eq!(sample.len(), 2);
        assert!(sample.channel(0)[0] > 0.0 && sample.channel(0)[1] > 0.0);
        assert!(sample.channel(1)[0] < 0.0 && sample.channel(1)[1] < 0.0);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = load_sample(
            "nope",
            Path::new("/definitely/not/here.wav"),
            NoteSet::from_range(0..=127),
            60,
            false,
            0.0,
            0.0,
        );
        assert!(result.is_err());
    }
}
