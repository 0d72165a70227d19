use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Prosody-labelled corpora the preprocessor knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    /// DataBaker: inline digit tags, `ProsodyLabeling/*.txt`, `Wave/<id>.wav`.
    DataBaker,
    /// TH-CoSS: delimiter tags, prompt `*.txt` files, `wav/<id>.wav`.
    ThCoss,
}

impl Dataset {
    pub fn as_code(&self) -> &'static str {
        match self {
            Dataset::DataBaker => "databaker",
            Dataset::ThCoss => "thcoss",
        }
    }

    pub fn label_dir(&self) -> Option<&'static str> {
        match self {
            Dataset::DataBaker => Some("ProsodyLabeling"),
            Dataset::ThCoss => None,
        }
    }

    pub fn wave_dir(&self) -> &'static str {
        match self {
            Dataset::DataBaker => "Wave",
            Dataset::ThCoss => "wav",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

impl FromStr for Dataset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "databaker" | "biaobei" => Ok(Dataset::DataBaker),
            "thcoss" | "th-coss" => Ok(Dataset::ThCoss),
            _ => Err(anyhow::anyhow!("unsupported dataset {s}")),
        }
    }
}

pub const DEFAULT_SAMPLE_RATE: u32 = 22050;
pub const DEFAULT_RESCALING_MAX: f32 = 0.999;
pub const DEFAULT_NUM_MELS: usize = 80;
pub const DEFAULT_N_FFT: usize = 2048;
pub const DEFAULT_HOP_SIZE: usize = 275;
pub const DEFAULT_WIN_SIZE: usize = 1100;
pub const DEFAULT_FMIN: f32 = 55.0;
pub const DEFAULT_FMAX: f32 = 7600.0;

pub const MANIFEST_FILE: &str = "train.txt";
pub const MEL_SUBDIR: &str = "mels";
pub const LINEAR_SUBDIR: &str = "linear";
pub const AUDIO_SUBDIR: &str = "audio";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_codes_round_trip() {
        for dataset in [Dataset::DataBaker, Dataset::ThCoss] {
            assert_eq!(dataset.to_string().parse::<Dataset>().unwrap(), dataset);
        }
        assert_eq!("TH-CoSS".parse::<Dataset>().unwrap(), Dataset::ThCoss);
        assert!("ljspeech".parse::<Dataset>().is_err());
    }
}
