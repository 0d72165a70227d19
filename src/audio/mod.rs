use std::path::Path;

use hound::{SampleFormat, WavReader};

use crate::errors::Result;

/// Reads a WAV file as mono `f32` samples in `[-1, 1]` plus its sample rate.
///
/// Multi-channel audio is averaged down to one channel.
pub fn load_wav(path: impl AsRef<Path>) -> Result<(Vec<f32>, u32)> {
    let mut reader = WavReader::open(path.as_ref())?;
    let spec = reader.spec();
    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let channels = usize::from(spec.channels.max(1));
    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };
    Ok((samples, spec.sample_rate))
}

pub fn peak(samples: &[f32]) -> f32 {
    samples
        .iter()
        .fold(0.0_f32, |max, &value| max.max(value.abs()))
}

/// Scales samples so the loudest one reaches `target`. Silence is untouched.
pub fn normalize_peak_to(samples: &mut [f32], target: f32) {
    let peak = peak(samples);
    if peak > 0.0 {
        let gain = target / peak;
        for sample in samples.iter_mut() {
            *sample *= gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};

    fn write_wav(path: &Path, spec: WavSpec, samples: &[i16]) {
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn normalize_peak_scales_to_target() {
        let mut samples = vec![0.5_f32, -0.25_f32];
        normalize_peak_to(&mut samples, 0.25);
        assert!((samples[0] - 0.25).abs() < 1e-6);
        assert!((samples[1] + 0.125).abs() < 1e-6);

        let mut silence = vec![0.0_f32; 4];
        normalize_peak_to(&mut silence, 0.999);
        assert!(silence.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn load_wav_reads_mono_pcm() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        write_wav(&path, spec, &[0, 16384, -16384]);

        let (samples, rate) = load_wav(&path).unwrap();
        assert_eq!(rate, 22050);
        assert_eq!(samples.len(), 3);
        assert!((samples[1] - 0.5).abs() < 1e-4);
        assert!((samples[2] + 0.5).abs() < 1e-4);
    }

    #[test]
    fn load_wav_mixes_stereo_down() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        write_wav(&path, spec, &[16384, 0, 16384, 16384]);

        let (samples, rate) = load_wav(&path).unwrap();
        assert_eq!(rate, 16000);
        assert_eq!(samples.len(), 2);
        assert!((samples[0] - 0.25).abs() < 1e-4);
        assert!((samples[1] - 0.5).abs() < 1e-4);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_wav(dir.path().join("nope.wav")).is_err());
    }
}
