use std::{
    io::{self, BufRead, Write},
    net::SocketAddr,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::runtime::Builder;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};
use zh_prosody_frontend::{
    config::HyperParameters,
    constants::Dataset,
    nlp::chinese::{g2p::G2p, tone_sandhi::ToneSandhi},
    preprocess::{self, Corpus},
    server::{AppState, serve},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Hyper-parameter JSON file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Hyper-parameter overrides as comma-separated name=value pairs
    #[arg(long, global = true, default_value = "")]
    hparams: String,

    /// Extra segmentation words, one per line with an optional frequency
    #[arg(long = "user-dict", global = true)]
    user_dict: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert Mandarin text to toned pinyin with prosodic boundaries
    G2p {
        /// Granularity; 2 and above joins a word's syllables
        #[arg(long)]
        level: Option<u8>,

        /// Text to convert; lines are read from stdin when omitted
        text: Vec<String>,
    },
    /// Parse a prosody-labelled corpus into an `id|phonemes` file
    Labels {
        #[arg(long)]
        dataset: Dataset,

        /// Corpus root directory
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        output: PathBuf,

        /// Keep prosodic-phrase markers
        #[arg(long)]
        use_prosody: bool,
    },
    /// Serve the converters over HTTP
    Serve {
        #[arg(long, default_value = "0.0.0.0:8080")]
        listen: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("invalid log filter")?;

    fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();

    let mut hps = match &args.config {
        Some(path) => HyperParameters::load_from_file(path)?,
        None => HyperParameters::default(),
    };
    hps.apply_overrides(&args.hparams)
        .context("failed to apply hyper-parameter overrides")?;

    match args.command {
        Command::G2p { level, text } => {
            let g2p = build_g2p(&hps, args.user_dict.as_deref())?;
            let level = level.unwrap_or(hps.frontend.level);
            let stdout = io::stdout();
            let mut out = stdout.lock();
            if text.is_empty() {
                for line in io::stdin().lock().lines() {
                    let line = line.context("failed to read stdin")?;
                    writeln!(out, "{}", g2p.convert(&line, level))?;
                }
            } else {
                writeln!(out, "{}", g2p.convert(&text.join(" "), level))?;
            }
            Ok(())
        }
        Command::Labels {
            dataset,
            input,
            output,
            use_prosody,
        } => {
            let corpus = Corpus::new(dataset, input);
            let labels = corpus
                .load_labels(use_prosody || hps.frontend.use_prosody)
                .with_context(|| format!("failed to read labels from {}", corpus.label_path().display()))?;
            preprocess::write_labels(&labels, &output)
                .with_context(|| format!("failed to write {}", output.display()))?;
            info!("wrote {} labels to {}", labels.len(), output.display());
            Ok(())
        }
        Command::Serve { listen } => {
            let g2p = build_g2p(&hps, args.user_dict.as_deref())?;
            let state = AppState::new(g2p, hps.frontend.level, hps.frontend.use_prosody);
            let listen: SocketAddr = listen.parse().context("invalid listen address")?;

            let runtime = Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("failed to build tokio runtime")?;

            runtime
                .block_on(async { serve(listen, state).await })
                .context("server terminated unexpectedly")
        }
    }
}

fn build_g2p(hps: &HyperParameters, user_dict: Option<&Path>) -> Result<G2p> {
    let g2p = match user_dict {
        Some(path) => G2p::with_user_dict(path)?,
        None => G2p::new(),
    };
    let sandhi = ToneSandhi::new().with_cross_word_third_tone(hps.frontend.cross_word_third_tone);
    Ok(g2p.with_sandhi(sandhi))
}
