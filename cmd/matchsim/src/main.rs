//! matchsim - Decision-stream simulator for the phonetic slide matcher.
//!
//! Replays a timestamped word script against a song library and prints the
//! navigation decisions the engine would emit during a live performance.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use tracing::debug;

use stanza_engine::{
    DecisionAction, DecisionContext, DecisionEngine, DecisionPolicy, MatchSessionState, ScorerKind,
    Thresholds,
};
use stanza_index::{
    IndexCache, IndexService, MemoryCache, RedbCache, Song, SongPhonemeIndex,
};
use stanza_phoneme::{CmudictOptions, DictEntry, SharedDictionary, Tokenizer, parse_cmudict};
use stanza_vector::VectorizeParams;

/// Decision-stream simulator for the phonetic slide matcher.
#[derive(Parser, Debug)]
#[command(name = "matchsim")]
#[command(about = "Replay a word script against a song library and print decisions")]
struct Args {
    /// Song library JSON (array of songs with id/title/slides)
    #[arg(long)]
    library: PathBuf,

    /// Word script JSON (array of {word, timestamp_ms})
    #[arg(long)]
    script: PathBuf,

    /// Pronunciation dictionary: CMUdict text, or a JSON word->phonemes map
    #[arg(long)]
    dict: Option<PathBuf>,

    /// Starting song id (default: first in the library)
    #[arg(long)]
    song: Option<String>,

    /// Starting slide index
    #[arg(long, default_value_t = 0)]
    slide: usize,

    /// Scoring strategy
    #[arg(long, value_enum, default_value_t = ScorerArg::Token)]
    scorer: ScorerArg,

    /// Context window size
    #[arg(long, default_value_t = 3)]
    window: usize,

    /// Context decay factor
    #[arg(long, default_value_t = 0.85)]
    decay: f32,

    /// Accept-next threshold override
    #[arg(long)]
    accept_next: Option<f64>,

    /// Accept-any threshold override
    #[arg(long)]
    accept_any: Option<f64>,

    /// Blank threshold override
    #[arg(long)]
    blank: Option<f64>,

    /// Cross-song threshold override
    #[arg(long)]
    cross_song: Option<f64>,

    /// Persist indexes to a redb cache in this directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Print every decision (default: only navigations and blanks)
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Emit decisions as JSON lines instead of text
    #[arg(long)]
    json: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ScorerArg {
    Vector,
    Token,
    Keyword,
}

impl From<ScorerArg> for ScorerKind {
    fn from(arg: ScorerArg) -> Self {
        match arg {
            ScorerArg::Vector => ScorerKind::Vector,
            ScorerArg::Token => ScorerKind::Token,
            ScorerArg::Keyword => ScorerKind::Keyword,
        }
    }
}

/// One recognized word with its arrival time.
#[derive(Debug, Clone, Deserialize)]
struct ScriptEvent {
    word: String,
    #[serde(rename = "timestamp_ms", alias = "timestamp")]
    timestamp_ms: u64,
}

fn load_dictionary(dict: &SharedDictionary, path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading dictionary {}", path.display()))?;
    let entries = if path.extension().is_some_and(|e| e == "json") {
        serde_json::from_str::<HashMap<String, DictEntry>>(&text)
            .with_context(|| format!("parsing dictionary JSON {}", path.display()))?
    } else {
        parse_cmudict(&text, &CmudictOptions::default())
    };
    debug!("loaded {} pronunciation entries", entries.len());
    dict.replace(entries);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let library: Vec<Song> = serde_json::from_str(
        &std::fs::read_to_string(&args.library)
            .with_context(|| format!("reading library {}", args.library.display()))?,
    )
    .context("parsing library JSON")?;
    if library.is_empty() {
        bail!("library is empty");
    }

    let events: Vec<ScriptEvent> = serde_json::from_str(
        &std::fs::read_to_string(&args.script)
            .with_context(|| format!("reading script {}", args.script.display()))?,
    )
    .context("parsing script JSON")?;

    let dict = SharedDictionary::new();
    if let Some(path) = &args.dict {
        load_dictionary(&dict, path)?;
    }
    let tokenizer = Tokenizer::new(dict);

    let params = VectorizeParams {
        window: args.window,
        decay: args.decay,
    };
    let cache: Arc<dyn IndexCache> = match &args.cache_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating cache dir {}", dir.display()))?;
            Arc::new(RedbCache::open(dir.join("indexes.redb")).context("opening index cache")?)
        }
        None => Arc::new(MemoryCache::new()),
    };
    let service = IndexService::new(cache, params);

    let mut indexes: HashMap<String, SongPhonemeIndex> = HashMap::new();
    for song in &library {
        if let Some(index) = service.load_or_build(song, &tokenizer).await {
            indexes.insert(song.id.clone(), index);
        }
    }

    let mut thresholds = Thresholds::default();
    if let Some(v) = args.accept_next {
        thresholds.accept_next = v;
    }
    if let Some(v) = args.accept_any {
        thresholds.accept_any = v;
    }
    if let Some(v) = args.blank {
        thresholds.blank = v;
    }
    if let Some(v) = args.cross_song {
        thresholds.cross_song = v;
    }
    let policy = DecisionPolicy::default();

    let engine = DecisionEngine::new(tokenizer, ScorerKind::from(args.scorer).build(params));
    let queue: Vec<String> = library.iter().map(|s| s.id.clone()).collect();

    let mut current_song_id = match &args.song {
        Some(id) => {
            if !library.iter().any(|s| &s.id == id) {
                bail!("song {id} not found in library");
            }
            id.clone()
        }
        None => library[0].id.clone(),
    };
    let mut slide_index = args.slide;
    let mut session = MatchSessionState::default();
    let mut window: Vec<String> = Vec::new();

    for event in &events {
        window.push(event.word.clone());
        let transcript = window.join(" ");
        let current = library.iter().find(|s| s.id == current_song_id);
        let ctx = DecisionContext {
            current_song: current,
            slide_index,
            library: &library,
            queue: &queue,
            equal_priority: &[],
            indexes: &indexes,
            transcript_window: &transcript,
            thresholds: &thresholds,
            policy: &policy,
            session,
            now_ms: event.timestamp_ms,
        };
        let (decision, new_session) = engine.decide(&ctx);
        session = new_session;

        let interesting = !matches!(decision.action, DecisionAction::None);
        if interesting || args.verbose {
            if args.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "timestamp_ms": event.timestamp_ms,
                        "decision": decision,
                    })
                );
            } else {
                print_decision(event.timestamp_ms, &decision);
            }
        }

        match &decision.action {
            DecisionAction::Advance { target_index } => {
                slide_index = *target_index;
                window.clear();
            }
            DecisionAction::Update {
                target_index,
                target_song_id,
            } => {
                if let Some(id) = target_song_id {
                    current_song_id = id.clone();
                }
                slide_index = *target_index;
                window.clear();
            }
            _ => {}
        }
    }

    println!("final position: song {current_song_id}, slide {slide_index}");
    Ok(())
}

fn print_decision(ts: u64, decision: &stanza_engine::Decision) {
    let score = decision
        .best
        .as_ref()
        .map(|b| format!("{:.2}", b.score))
        .unwrap_or_else(|| "-".into());
    match &decision.action {
        DecisionAction::None => {
            println!("[{ts:>6} ms] stay (score {score}) \"{}\"", decision.transcript_window);
        }
        DecisionAction::Advance { target_index } => {
            println!(
                "[{ts:>6} ms] advance -> slide {} (score {score}) \"{}\"",
                target_index + 1,
                decision.transcript_window
            );
        }
        DecisionAction::Update {
            target_index,
            target_song_id,
        } => match target_song_id {
            Some(song) => println!(
                "[{ts:>6} ms] jump -> {song} slide {} (score {score}) \"{}\"",
                target_index + 1,
                decision.transcript_window
            ),
            None => println!(
                "[{ts:>6} ms] jump -> slide {} (score {score}) \"{}\"",
                target_index + 1,
                decision.transcript_window
            ),
        },
        DecisionAction::Blank { position } => {
            let pos = position.map(|p| format!("{p:?}")).unwrap_or_else(|| "-".into());
            println!("[{ts:>6} ms] blank ({pos}, score {score})");
        }
    }
}
