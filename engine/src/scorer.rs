use std::collections::{HashMap, HashSet};

use stanza_index::{Song, SongPhonemeIndex};
use stanza_phoneme::{Tokenizer, normalize_text, word_count};
use stanza_vector::{VectorizeParams, cosine, tail_context};

use crate::types::MatchCandidate;

/// A transcript window prepared for scoring: tokenized once per decision
/// cycle and shared by every strategy.
#[derive(Debug, Clone)]
pub struct TranscriptQuery {
    /// The raw transcript window, whitespace included.
    pub window: String,

    /// Phonetic tokens of the window.
    pub tokens: Vec<String>,

    /// Spoken word count (after normalization), for the min-token gates.
    pub word_count: usize,
}

impl TranscriptQuery {
    pub fn new(tokenizer: &Tokenizer, window: &str) -> Self {
        Self {
            window: window.to_string(),
            tokens: tokenizer.tokens(window),
            word_count: word_count(window),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty() || self.word_count == 0
    }
}

/// Raw per-slide score from one strategy, before cross-song weighting.
#[derive(Debug, Clone)]
pub struct SlideScore {
    pub slide_id: String,

    /// Best-matching phoneme position, when the strategy has one.
    pub position: Option<usize>,

    /// Similarity in `[0, 1]`.
    pub score: f64,
}

/// A slide-scoring strategy. The engine treats vector, token and keyword
/// matching as interchangeable backends behind this interface.
pub trait Scorer: Send + Sync {
    /// Score every slide of one song against the query. Returns one entry
    /// per slide in arbitrary order; callers sort after weighting.
    fn score_song(
        &self,
        query: &TranscriptQuery,
        song: &Song,
        index: &SongPhonemeIndex,
    ) -> Vec<SlideScore>;
}

/// Strategy selector, for configuration surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScorerKind {
    Vector,
    Token,
    Keyword,
}

impl ScorerKind {
    pub fn build(self, params: VectorizeParams) -> Box<dyn Scorer> {
        match self {
            ScorerKind::Vector => Box::new(VectorScorer { params }),
            ScorerKind::Token => Box::new(TokenScorer),
            ScorerKind::Keyword => Box::new(KeywordScorer),
        }
    }
}

/// Cosine matching over decayed phoneme context vectors.
///
/// The query's trailing context vector is compared against every stored
/// position of every slide; a slide scores as its best position.
pub struct VectorScorer {
    pub params: VectorizeParams,
}

impl Scorer for VectorScorer {
    fn score_song(
        &self,
        query: &TranscriptQuery,
        song: &Song,
        index: &SongPhonemeIndex,
    ) -> Vec<SlideScore> {
        let Some(query_vec) = tail_context(&query.tokens, &self.params) else {
            return vec![];
        };

        song.slides
            .iter()
            .map(|slide| {
                let mut best = SlideScore {
                    slide_id: slide.id.clone(),
                    position: None,
                    score: 0.0,
                };
                if let Some(data) = index.slides.get(&slide.id) {
                    for (pos, ctx) in data.contexts.iter().enumerate() {
                        let s = cosine(&query_vec, ctx).max(0.0);
                        if s > best.score {
                            best.score = s;
                            best.position = Some(pos);
                        }
                    }
                }
                best
            })
            .collect()
    }
}

/// Anywhere-aligned phonetic prefix matching.
///
/// The query's token prefix may align at any offset inside a slide, so a
/// singer can be matched mid-slide; matches deeper into the slide pay a
/// small positional penalty.
pub struct TokenScorer;

impl Scorer for TokenScorer {
    fn score_song(
        &self,
        query: &TranscriptQuery,
        song: &Song,
        index: &SongPhonemeIndex,
    ) -> Vec<SlideScore> {
        song.slides
            .iter()
            .map(|slide| {
                let tokens = index
                    .slides
                    .get(&slide.id)
                    .map(|d| d.phonemes.as_slice())
                    .unwrap_or(&[]);
                let (score, position) = anywhere_prefix_score(&query.tokens, tokens);
                SlideScore {
                    slide_id: slide.id.clone(),
                    position,
                    score,
                }
            })
            .collect()
    }
}

/// Best contiguous run of query tokens starting at any offset of the slide
/// sequence, mapped through a concave schedule with a positional penalty.
fn anywhere_prefix_score(query: &[String], slide: &[String]) -> (f64, Option<usize>) {
    if query.is_empty() || slide.is_empty() {
        return (0.0, None);
    }

    let mut best = 0usize;
    let mut best_pos = None;
    for j in 0..slide.len() {
        let mut k = 0usize;
        while k < query.len() && j + k < slide.len() && query[k] == slide[j + k] {
            k += 1;
        }
        if k > best {
            best = k;
            best_pos = Some(j);
        }
    }

    let mut base = match best {
        0 => return (0.0, None),
        1 => 0.60,
        2 => 0.85,
        3 => 0.95,
        k => (0.98 + (0.005 * (k - 3) as f64).min(0.02)).min(1.0),
    };
    if let Some(j) = best_pos {
        if j > 0 {
            base -= (0.03 * j as f64).min(0.15);
        }
    }
    (base.clamp(0.0, 1.0), best_pos)
}

/// Jaccard word-overlap matching on the raw slide text. The original MVP
/// strategy, kept for transcripts the phonetic paths handle poorly
/// (heavy dialect, sparse dictionaries).
pub struct KeywordScorer;

impl Scorer for KeywordScorer {
    fn score_song(
        &self,
        query: &TranscriptQuery,
        song: &Song,
        _index: &SongPhonemeIndex,
    ) -> Vec<SlideScore> {
        let q_words: HashSet<String> = normalize_text(&query.window)
            .split_whitespace()
            .filter(|w| w.len() > 2)
            .map(str::to_string)
            .collect();

        song.slides
            .iter()
            .map(|slide| {
                let s_words: HashSet<String> = normalize_text(&slide.text)
                    .split_whitespace()
                    .map(str::to_string)
                    .collect();
                let score = if q_words.is_empty() || s_words.is_empty() {
                    0.0
                } else {
                    let overlap = q_words.intersection(&s_words).count();
                    let union = q_words.len() + s_words.len() - overlap;
                    overlap as f64 / union as f64
                };
                SlideScore {
                    slide_id: slide.id.clone(),
                    position: None,
                    score,
                }
            })
            .collect()
    }
}

/// Cross-song weighting applied on top of raw slide scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankWeights {
    /// Multiplier for the active song and equal-priority songs.
    pub active_song: f64,

    /// Multiplier when the candidate is the precomputed next slide.
    pub next_slide: f64,

    /// Per-position bias favoring songs earlier in the play queue.
    pub queue_step: f64,
}

impl Default for RankWeights {
    fn default() -> Self {
        Self {
            active_song: 1.15,
            next_slide: 1.2,
            queue_step: 0.05,
        }
    }
}

/// Everything needed to rank candidates across a library.
pub struct RankContext<'a> {
    pub library: &'a [Song],

    /// Prebuilt indexes keyed by song id. Songs without an index are
    /// skipped; building them is the caller's (async) concern.
    pub indexes: &'a HashMap<String, SongPhonemeIndex>,

    /// Song ids in play order. Falls back to library order when empty.
    pub queue: &'a [String],

    /// The song currently displayed.
    pub active_song_id: Option<&'a str>,

    /// Songs weighted like the active one, e.g. the next song at a queue
    /// boundary the singer may be transitioning into.
    pub equal_priority: &'a [String],

    /// The precomputed next slide of the active song.
    pub next_slide_id: Option<&'a str>,
}

/// Score every slide of every indexed song, apply the cross-song weights,
/// and return candidates sorted best-first.
pub fn rank_candidates(
    scorer: &dyn Scorer,
    query: &TranscriptQuery,
    ctx: &RankContext<'_>,
    weights: &RankWeights,
) -> Vec<MatchCandidate> {
    if query.is_empty() {
        return vec![];
    }

    let order: Vec<&str> = if ctx.queue.is_empty() {
        ctx.library.iter().map(|s| s.id.as_str()).collect()
    } else {
        ctx.queue.iter().map(|s| s.as_str()).collect()
    };
    let order_index: HashMap<&str, usize> =
        order.iter().enumerate().map(|(i, id)| (*id, i)).collect();

    let mut out = Vec::new();
    for song in ctx.library {
        let Some(index) = ctx.indexes.get(&song.id) else {
            continue;
        };

        let song_weight = if Some(song.id.as_str()) == ctx.active_song_id
            || ctx.equal_priority.iter().any(|id| *id == song.id)
        {
            weights.active_song
        } else {
            1.0
        };
        let queue_pos = order_index
            .get(song.id.as_str())
            .copied()
            .unwrap_or(order.len().saturating_sub(1));
        let list_bias =
            1.0 + weights.queue_step * (order.len().saturating_sub(1 + queue_pos)) as f64;

        for slide_score in scorer.score_song(query, song, index) {
            let next_bonus = if Some(slide_score.slide_id.as_str()) == ctx.next_slide_id {
                weights.next_slide
            } else {
                1.0
            };
            let Some(slide_index) = song.slide_index(&slide_score.slide_id) else {
                continue;
            };
            out.push(MatchCandidate {
                song_id: song.id.clone(),
                slide_id: slide_score.slide_id,
                slide_index,
                position: slide_score.position,
                score: slide_score.score * song_weight * next_bonus * list_bias,
            });
        }
    }

    out.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    out
}
