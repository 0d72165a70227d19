use std::{fs, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    constants::{
        DEFAULT_FMAX, DEFAULT_FMIN, DEFAULT_HOP_SIZE, DEFAULT_N_FFT, DEFAULT_NUM_MELS,
        DEFAULT_RESCALING_MAX, DEFAULT_SAMPLE_RATE, DEFAULT_WIN_SIZE,
    },
    errors::{FrontendError, Result},
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HyperParameters {
    #[serde(default)]
    pub audio: AudioParameters,
    #[serde(default)]
    pub frontend: FrontendParameters,
}

/// Parameters handed through to the spectrogram extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioParameters {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_true")]
    pub rescale: bool,
    #[serde(default = "default_rescaling_max")]
    pub rescaling_max: f32,
    #[serde(default = "default_true")]
    pub trim_silence: bool,
    #[serde(default = "default_num_mels")]
    pub num_mels: usize,
    #[serde(default = "default_n_fft")]
    pub n_fft: usize,
    #[serde(default = "default_hop_size")]
    pub hop_size: usize,
    #[serde(default = "default_win_size")]
    pub win_size: usize,
    #[serde(default = "default_fmin")]
    pub fmin: f32,
    #[serde(default = "default_fmax")]
    pub fmax: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrontendParameters {
    /// Keep `/` prosodic-phrase markers instead of collapsing them to word spacing.
    #[serde(default)]
    pub use_prosody: bool,
    /// G2P granularity; 2 and above drops the in-word syllable separator.
    #[serde(default)]
    pub level: u8,
    #[serde(default)]
    pub cross_word_third_tone: bool,
}

impl Default for AudioParameters {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            rescale: true,
            rescaling_max: DEFAULT_RESCALING_MAX,
            trim_silence: true,
            num_mels: DEFAULT_NUM_MELS,
            n_fft: DEFAULT_N_FFT,
            hop_size: DEFAULT_HOP_SIZE,
            win_size: DEFAULT_WIN_SIZE,
            fmin: DEFAULT_FMIN,
            fmax: DEFAULT_FMAX,
        }
    }
}

const fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

const fn default_true() -> bool {
    true
}

const fn default_rescaling_max() -> f32 {
    DEFAULT_RESCALING_MAX
}

const fn default_num_mels() -> usize {
    DEFAULT_NUM_MELS
}

const fn default_n_fft() -> usize {
    DEFAULT_N_FFT
}

const fn default_hop_size() -> usize {
    DEFAULT_HOP_SIZE
}

const fn default_win_size() -> usize {
    DEFAULT_WIN_SIZE
}

const fn default_fmin() -> f32 {
    DEFAULT_FMIN
}

const fn default_fmax() -> f32 {
    DEFAULT_FMAX
}

const SECTIONS: [&str; 2] = ["audio", "frontend"];

impl HyperParameters {
    pub fn load_from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let buf = fs::read_to_string(&path).with_context(|| {
            format!(
                "failed to read hyper-parameters from {}",
                path.as_ref().display()
            )
        })?;
        serde_json::from_str(&buf).with_context(|| {
            format!(
                "failed to parse hyper-parameters JSON at {}",
                path.as_ref().display()
            )
        })
    }

    /// Applies `name=value` overrides separated by commas.
    ///
    /// Names may be qualified (`audio.sample_rate`) or bare (`sample_rate`), in
    /// which case the section declaring the field is used. Values are read as
    /// JSON literals and fall back to plain strings.
    pub fn apply_overrides(&mut self, overrides: &str) -> Result<()> {
        let mut tree = serde_json::to_value(&*self)?;
        for pair in overrides.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, raw) = pair.split_once('=').ok_or_else(|| {
                FrontendError::Config(format!("override {pair:?} is not name=value"))
            })?;
            let (name, raw) = (name.trim(), raw.trim());
            let value = serde_json::from_str::<Value>(raw)
                .unwrap_or_else(|_| Value::String(raw.to_string()));
            let slot = resolve_field(&mut tree, name)
                .ok_or_else(|| FrontendError::Config(format!("unknown hyper-parameter {name}")))?;
            *slot = value;
        }
        *self = serde_json::from_value(tree)?;
        Ok(())
    }
}

fn resolve_field<'a>(tree: &'a mut Value, name: &str) -> Option<&'a mut Value> {
    if let Some((section, field)) = name.split_once('.') {
        return tree.get_mut(section)?.get_mut(field);
    }
    let section = SECTIONS
        .iter()
        .find(|section| tree.get(**section).and_then(|s| s.get(name)).is_some())?;
    tree.get_mut(*section)?.get_mut(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_use_defaults() {
        let hps: HyperParameters =
            serde_json::from_str(r#"{"frontend": {"use_prosody": true}}"#).unwrap();
        assert!(hps.frontend.use_prosody);
        assert_eq!(hps.frontend.level, 0);
        assert_eq!(hps.audio.sample_rate, DEFAULT_SAMPLE_RATE);
        assert!(hps.audio.rescale);
    }

    #[test]
    fn overrides_resolve_bare_and_qualified_names() {
        let mut hps = HyperParameters::default();
        hps.apply_overrides("sample_rate=48000, frontend.level=2,use_prosody=true")
            .unwrap();
        assert_eq!(hps.audio.sample_rate, 48000);
        assert_eq!(hps.frontend.level, 2);
        assert!(hps.frontend.use_prosody);
    }

    #[test]
    fn unknown_override_is_rejected() {
        let mut hps = HyperParameters::default();
        let err = hps.apply_overrides("nonsense=1").unwrap_err();
        assert!(matches!(err, FrontendError::Config(_)));
        assert!(hps.apply_overrides("sample_rate").is_err());
    }

    #[test]
    fn mistyped_override_fails_to_deserialize() {
        let mut hps = HyperParameters::default();
        assert!(hps.apply_overrides("num_mels=many").is_err());
        assert_eq!(hps.audio.num_mels, DEFAULT_NUM_MELS);
    }

    #[test]
    fn load_from_file_reads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hparams.json");
        fs::write(&path, r#"{"audio": {"sample_rate": 16000, "rescale": false}}"#).unwrap();
        let hps = HyperParameters::load_from_file(&path).unwrap();
        assert_eq!(hps.audio.sample_rate, 16000);
        assert!(!hps.audio.rescale);
        assert_eq!(hps.audio.hop_size, DEFAULT_HOP_SIZE);
    }
}
