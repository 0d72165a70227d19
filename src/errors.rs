use thiserror::Error;

/// Per-record failures of the prosody label parsers.
///
/// None of these abort a batch: the caller logs the record and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LabelError {
    #[error("empty label")]
    Empty,
    #[error("label does not start with a sentence id: {0:?}")]
    MissingSentenceId(String),
    #[error(
        "label {sentence_id}: text and pinyin are misaligned \
         ({syllables_used} of {syllables_total} syllables consumed, {chars_left} characters left)"
    )]
    Misaligned {
        sentence_id: String,
        syllables_used: usize,
        syllables_total: usize,
        chars_left: usize,
    },
}

#[derive(Error, Debug)]
pub enum FrontendError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
    #[error("NPY write error: {0}")]
    Npy(#[from] ndarray_npy::WriteNpyError),
    #[error(transparent)]
    Label(#[from] LabelError),
}

pub type Result<T> = std::result::Result<T, FrontendError>;
