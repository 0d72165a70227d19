//! Turns a prosody-labelled corpus into training data: parsed phoneme labels,
//! spectrogram `.npy` files and a `train.txt` manifest.
//!
//! Spectrogram extraction itself is provided by the caller through
//! [`SpectrogramExtractor`]; this module owns everything around it. The
//! binary only exposes label parsing, so a training pipeline embeds this
//! module with its own extractor to produce `.npy` data.

use std::{
    fmt, fs,
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use ndarray::{Array1, Array2};
use ndarray_npy::write_npy;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    audio,
    config::AudioParameters,
    constants::{AUDIO_SUBDIR, Dataset, LINEAR_SUBDIR, MANIFEST_FILE, MEL_SUBDIR},
    errors::Result,
    nlp::chinese::prosody_label::{DelimiterTags, InlineDigitTags, LabelFormat, ParsedLabel, parse_label},
};

pub fn label_format(dataset: Dataset) -> &'static dyn LabelFormat {
    match dataset {
        Dataset::DataBaker => &InlineDigitTags,
        Dataset::ThCoss => &DelimiterTags,
    }
}

/// Reads every non-blank, trimmed line of a label file, or of all `*.txt`
/// files below a directory in path order.
pub fn read_labels(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let mut files = Vec::new();
    if path.is_dir() {
        collect_label_files(path, &mut files)?;
        files.sort();
    } else {
        files.push(path.to_path_buf());
    }

    let mut lines = Vec::new();
    for file in &files {
        let content = fs::read_to_string(file)?;
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
        lines.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
    }
    debug!("read {} label lines from {} files", lines.len(), files.len());
    Ok(lines)
}

fn collect_label_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_label_files(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "txt") {
            files.push(path);
        }
    }
    Ok(())
}

/// Parses consecutive (text, pinyin) line pairs. Records that fail to parse
/// are logged and left out; a dangling last line is ignored.
pub fn parse_labels(
    lines: &[String],
    format: &dyn LabelFormat,
    use_prosody: bool,
) -> Vec<ParsedLabel> {
    if lines.len() % 2 != 0 {
        warn!("label lines do not pair up, ignoring the last one");
    }
    let results: Vec<_> = lines
        .par_chunks_exact(2)
        .map(|pair| (&pair[0], parse_label(format, &pair[0], &pair[1], use_prosody)))
        .collect();

    let mut parsed = Vec::with_capacity(results.len());
    let mut skipped = 0usize;
    for (text, result) in results {
        match result {
            Ok(label) => parsed.push(label),
            Err(err) => {
                skipped += 1;
                warn!("skipping {text:?}: {err}");
            }
        }
    }
    info!("parsed {} labels, skipped {skipped}", parsed.len());
    parsed
}

/// Location and identity of one corpus on disk.
#[derive(Debug, Clone)]
pub struct Corpus {
    pub dataset: Dataset,
    pub input_dir: PathBuf,
    pub speaker: u32,
    pub language: u32,
    /// Prepended to sentence ids in output file names.
    pub prefix: String,
}

impl Corpus {
    pub fn new(dataset: Dataset, input_dir: impl Into<PathBuf>) -> Self {
        Self {
            dataset,
            input_dir: input_dir.into(),
            speaker: 0,
            language: 1,
            prefix: String::new(),
        }
    }

    pub fn with_speaker(mut self, speaker: u32) -> Self {
        self.speaker = speaker;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn label_path(&self) -> PathBuf {
        match self.dataset.label_dir() {
            Some(dir) => self.input_dir.join(dir),
            None => self.input_dir.clone(),
        }
    }

    pub fn wav_path(&self, sentence_id: &str) -> PathBuf {
        self.input_dir
            .join(self.dataset.wave_dir())
            .join(format!("{sentence_id}.wav"))
    }

    pub fn load_labels(&self, use_prosody: bool) -> Result<Vec<ParsedLabel>> {
        let lines = read_labels(self.label_path())?;
        Ok(parse_labels(&lines, label_format(self.dataset), use_prosody))
    }
}

pub struct Spectrograms {
    /// Audio aligned to the spectrogram frames.
    pub audio: Array1<f32>,
    /// Shape `(num_mels, frames)`.
    pub mel: Array2<f32>,
    /// Shape `(num_freq, frames)`.
    pub linear: Array2<f32>,
    pub time_steps: usize,
    pub mel_frames: usize,
}

pub trait SpectrogramExtractor: Sync {
    /// Computes spectrograms for peak-normalised mono samples, including any
    /// silence trimming `params` ask for. `None` rejects the utterance.
    fn wav_to_spectrograms(
        &self,
        samples: &[f32],
        sample_rate: u32,
        params: &AudioParameters,
    ) -> Option<Spectrograms>;
}

pub struct OutputDirs {
    pub root: PathBuf,
    pub mels: PathBuf,
    pub linear: PathBuf,
    pub audio: PathBuf,
}

impl OutputDirs {
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let dirs = Self {
            mels: root.join(MEL_SUBDIR),
            linear: root.join(LINEAR_SUBDIR),
            audio: root.join(AUDIO_SUBDIR),
            root,
        };
        for dir in [&dirs.mels, &dirs.linear, &dirs.audio] {
            fs::create_dir_all(dir)?;
        }
        Ok(dirs)
    }
}

/// One line of `train.txt`.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestRecord {
    pub audio_file: String,
    pub mel_file: String,
    pub linear_file: String,
    pub time_steps: usize,
    pub mel_frames: usize,
    pub text: String,
    pub speaker: u32,
    pub language: u32,
}

impl fmt::Display for ManifestRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}|{}|{}|{}|{}",
            self.audio_file,
            self.mel_file,
            self.linear_file,
            self.time_steps,
            self.mel_frames,
            self.text,
            self.speaker,
            self.language
        )
    }
}

/// Converts one labelled utterance. Unreadable or mismatched audio and
/// extractor rejections yield `Ok(None)`; output failures are errors.
pub fn process_utterance<E: SpectrogramExtractor + ?Sized>(
    extractor: &E,
    out: &OutputDirs,
    corpus: &Corpus,
    label: &ParsedLabel,
    params: &AudioParameters,
) -> Result<Option<ManifestRecord>> {
    let wav_path = corpus.wav_path(&label.sentence_id);
    if !wav_path.is_file() {
        warn!(
            "{} is labelled but missing from the wave folder, skipping",
            wav_path.display()
        );
        return Ok(None);
    }
    let (mut samples, sample_rate) = match audio::load_wav(&wav_path) {
        Ok(loaded) => loaded,
        Err(err) => {
            warn!("failed to read {}: {err}", wav_path.display());
            return Ok(None);
        }
    };
    if sample_rate != params.sample_rate {
        warn!(
            "{} is sampled at {sample_rate} Hz, expected {}; skipping",
            wav_path.display(),
            params.sample_rate
        );
        return Ok(None);
    }

    if params.rescale {
        audio::normalize_peak_to(&mut samples, params.rescaling_max);
    }

    let Some(spectrograms) = extractor.wav_to_spectrograms(&samples, sample_rate, params) else {
        debug!("extractor rejected {}", label.sentence_id);
        return Ok(None);
    };

    let index = format!("{}{}", corpus.prefix, label.sentence_id);
    let audio_file = format!("audio-{index}.npy");
    let mel_file = format!("mel-{index}.npy");
    let linear_file = format!("linear-{index}.npy");
    write_npy(out.audio.join(&audio_file), &spectrograms.audio)?;
    write_npy(out.mels.join(&mel_file), &spectrograms.mel.t().as_standard_layout())?;
    write_npy(
        out.linear.join(&linear_file),
        &spectrograms.linear.t().as_standard_layout(),
    )?;

    Ok(Some(ManifestRecord {
        audio_file,
        mel_file,
        linear_file,
        time_steps: spectrograms.time_steps,
        mel_frames: spectrograms.mel_frames,
        text: label.phonemes.clone(),
        speaker: corpus.speaker,
        language: corpus.language,
    }))
}

pub fn build_from_path<E: SpectrogramExtractor + ?Sized>(
    extractor: &E,
    out: &OutputDirs,
    corpus: &Corpus,
    labels: &[ParsedLabel],
    params: &AudioParameters,
) -> Result<Vec<ManifestRecord>> {
    let records = labels
        .par_iter()
        .map(|label| process_utterance(extractor, out, corpus, label, params))
        .collect::<Result<Vec<_>>>()?;
    Ok(records.into_iter().flatten().collect())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManifestSummary {
    pub utterances: usize,
    pub mel_frames: usize,
    pub time_steps: usize,
    pub hours: f64,
}

pub fn write_metadata(
    records: &[ManifestRecord],
    out_dir: impl AsRef<Path>,
    sample_rate: u32,
) -> Result<ManifestSummary> {
    let path = out_dir.as_ref().join(MANIFEST_FILE);
    let mut writer = BufWriter::new(File::create(&path)?);
    for record in records {
        writeln!(writer, "{record}")?;
    }
    writer.flush()?;

    let mel_frames: usize = records.iter().map(|r| r.mel_frames).sum();
    let time_steps: usize = records.iter().map(|r| r.time_steps).sum();
    let hours = time_steps as f64 / f64::from(sample_rate.max(1)) / 3600.0;
    info!(
        "wrote {} utterances, {mel_frames} mel frames, {time_steps} audio timesteps ({hours:.2} hours) to {}",
        records.len(),
        path.display()
    );
    if let Some(longest) = records.iter().map(|r| r.text.chars().count()).max() {
        let max_frames = records.iter().map(|r| r.mel_frames).max().unwrap_or(0);
        let max_steps = records.iter().map(|r| r.time_steps).max().unwrap_or(0);
        info!("max text length {longest}, max mel frames {max_frames}, max timesteps {max_steps}");
    }

    Ok(ManifestSummary {
        utterances: records.len(),
        mel_frames,
        time_steps,
        hours,
    })
}

/// Writes parsed labels as `sentence_id|phonemes` lines.
pub fn write_labels(labels: &[ParsedLabel], path: impl AsRef<Path>) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    for label in labels {
        writeln!(writer, "{}|{}", label.sentence_id, label.phonemes)?;
    }
    writer.flush()?;
    Ok(())
}
