use std::collections::HashMap;

use stanza_index::{Song, SongPhonemeIndex};
use stanza_phoneme::Tokenizer;
use tracing::debug;

use crate::scorer::{RankContext, RankWeights, Scorer, TranscriptQuery, rank_candidates};
use crate::types::{
    BlankPosition, Decision, DecisionAction, DecisionPolicy, MatchCandidate, MatchSessionState,
    Thresholds,
};

/// Everything one decision cycle reads. The engine retains nothing across
/// calls; whatever must persist is threaded through `session`.
pub struct DecisionContext<'a> {
    /// The song currently displayed, if any.
    pub current_song: Option<&'a Song>,

    /// Index of the displayed slide within the current song.
    pub slide_index: usize,

    /// All candidate songs.
    pub library: &'a [Song],

    /// Song ids in play order; empty falls back to library order.
    pub queue: &'a [String],

    /// Songs to weight like the active one at a queue boundary.
    pub equal_priority: &'a [String],

    /// Prebuilt indexes keyed by song id.
    pub indexes: &'a HashMap<String, SongPhonemeIndex>,

    /// The rolling transcript window.
    pub transcript_window: &'a str,

    pub thresholds: &'a Thresholds,
    pub policy: &'a DecisionPolicy,

    /// Temporal state from the previous cycle.
    pub session: MatchSessionState,

    /// Current time in milliseconds, supplied by the caller so the
    /// decision stays a pure function of its inputs.
    pub now_ms: u64,
}

/// The slide-navigation decision engine.
///
/// `decide` is synchronous, allocation-light and side-effect-free; it is
/// safe to call on every transcript delta. Malformed or absent state never
/// panics; it degrades to `DecisionAction::None`.
pub struct DecisionEngine {
    tokenizer: Tokenizer,
    scorer: Box<dyn Scorer>,
    weights: RankWeights,
}

impl DecisionEngine {
    pub fn new(tokenizer: Tokenizer, scorer: Box<dyn Scorer>) -> Self {
        Self::with_weights(tokenizer, scorer, RankWeights::default())
    }

    pub fn with_weights(
        tokenizer: Tokenizer,
        scorer: Box<dyn Scorer>,
        weights: RankWeights,
    ) -> Self {
        Self {
            tokenizer,
            scorer,
            weights,
        }
    }

    /// Evaluate one transcript update. Returns the decision and the updated
    /// session state for the caller to thread into the next call.
    pub fn decide(&self, ctx: &DecisionContext<'_>) -> (Decision, MatchSessionState) {
        let mut state = ctx.session;
        let thr = ctx.thresholds;
        let query = TranscriptQuery::new(&self.tokenizer, ctx.transcript_window);

        // Silence must never blank or advance.
        if query.is_empty() {
            return (decision(DecisionAction::None, None, &query), state);
        }

        let current = ctx.current_song;
        let next_slide_id = current.and_then(|s| s.next_slide_id(ctx.slide_index));
        let tail_matched = current_slide_tokens(ctx)
            .map(|tokens| tail_matches(&query.tokens, tokens, ctx.policy.tail_run))
            .unwrap_or(false);
        let advance_ready = tail_matched
            && query.word_count >= thr.min_advance_tokens
            && next_slide_id.is_some();

        let rank_ctx = RankContext {
            library: ctx.library,
            indexes: ctx.indexes,
            queue: ctx.queue,
            active_song_id: current.map(|s| s.id.as_str()),
            equal_priority: ctx.equal_priority,
            next_slide_id,
        };
        let candidates = rank_candidates(self.scorer.as_ref(), &query, &rank_ctx, &self.weights);
        let best = candidates.first().cloned();

        // Exact tail alignment is the strongest signal the matcher has;
        // when ordered first it outranks every score check.
        if ctx.policy.tail_override_first && advance_ready {
            navigate(&mut state, ctx.now_ms);
            debug!("tail match: advancing to slide {}", ctx.slide_index + 1);
            return (
                decision(
                    DecisionAction::Advance {
                        target_index: ctx.slide_index + 1,
                    },
                    best,
                    &query,
                ),
                state,
            );
        }

        // Nothing scoreable at all: absent library/queue/index data stays put.
        let Some(best_c) = best else {
            return (decision(DecisionAction::None, None, &query), state);
        };

        // Hysteresis: while blanked, a merely decent signal for the current
        // slide resumes display rather than waiting for a full accept.
        if state.blanked {
            if let Some(score) = current_slide_score(ctx, &candidates) {
                if score >= thr.resume {
                    navigate(&mut state, ctx.now_ms);
                    return (
                        decision(
                            DecisionAction::Update {
                                target_index: ctx.slide_index,
                                target_song_id: None,
                            },
                            Some(best_c),
                            &query,
                        ),
                        state,
                    );
                }
            }
        }

        if best_c.score < thr.blank {
            return (blank(ctx, &mut state, Some(best_c), &query), state);
        }

        // Alternative ordering: the tail override only fires for transcripts
        // that cleared the blank bar.
        if !ctx.policy.tail_override_first && advance_ready {
            navigate(&mut state, ctx.now_ms);
            return (
                decision(
                    DecisionAction::Advance {
                        target_index: ctx.slide_index + 1,
                    },
                    Some(best_c),
                    &query,
                ),
                state,
            );
        }

        let boost = recency_boost(ctx.policy, ctx.now_ms, state.last_nav_ms);

        if let Some(song) = current.filter(|s| s.id == best_c.song_id) {
            let is_next = Some(best_c.slide_id.as_str()) == next_slide_id;
            if is_next
                && best_c.score * boost >= thr.accept_next
                && query.word_count >= thr.min_advance_tokens
                && (!ctx.policy.require_tail_for_next || tail_matched)
            {
                navigate(&mut state, ctx.now_ms);
                debug!(
                    "accepting next slide {} of {} (score {:.2})",
                    best_c.slide_index, song.id, best_c.score
                );
                let target_index = best_c.slide_index;
                return (
                    decision(DecisionAction::Advance { target_index }, Some(best_c), &query),
                    state,
                );
            }
            if best_c.slide_index != ctx.slide_index
                && best_c.score >= thr.accept_any
                && query.word_count >= thr.min_update_tokens
            {
                navigate(&mut state, ctx.now_ms);
                debug!(
                    "in-song jump to slide {} of {} (score {:.2})",
                    best_c.slide_index, song.id, best_c.score
                );
                let target_index = best_c.slide_index;
                return (
                    decision(
                        DecisionAction::Update {
                            target_index,
                            target_song_id: None,
                        },
                        Some(best_c),
                        &query,
                    ),
                    state,
                );
            }
            return (decision(DecisionAction::None, Some(best_c), &query), state);
        }

        // Cross-song jumps clear a strictly higher bar.
        if best_c.score >= thr.cross_song {
            navigate(&mut state, ctx.now_ms);
            debug!(
                "cross-song jump to {} slide {} (score {:.2})",
                best_c.song_id, best_c.slide_index, best_c.score
            );
            let target_index = best_c.slide_index;
            let target_song_id = Some(best_c.song_id.clone());
            return (
                decision(
                    DecisionAction::Update {
                        target_index,
                        target_song_id,
                    },
                    Some(best_c),
                    &query,
                ),
                state,
            );
        }

        (blank(ctx, &mut state, Some(best_c), &query), state)
    }
}

fn decision(
    action: DecisionAction,
    best: Option<MatchCandidate>,
    query: &TranscriptQuery,
) -> Decision {
    Decision {
        action,
        best,
        transcript_window: query.window.clone(),
    }
}

fn navigate(state: &mut MatchSessionState, now_ms: u64) {
    state.last_nav_ms = Some(now_ms);
    state.blanked = false;
    state.blank_position = None;
}

fn blank(
    ctx: &DecisionContext<'_>,
    state: &mut MatchSessionState,
    best: Option<MatchCandidate>,
    query: &TranscriptQuery,
) -> Decision {
    let position = blank_position(ctx.current_song, ctx.slide_index);
    state.blanked = true;
    state.blank_position = position;
    Decision {
        action: DecisionAction::Blank { position },
        best,
        transcript_window: query.window.clone(),
    }
}

/// `Start` on the first slide, `End` on the last, otherwise no direction.
fn blank_position(song: Option<&Song>, slide_index: usize) -> Option<BlankPosition> {
    let song = song?;
    if song.slides.is_empty() {
        return None;
    }
    if slide_index == 0 {
        Some(BlankPosition::Start)
    } else if slide_index + 1 == song.slides.len() {
        Some(BlankPosition::End)
    } else {
        None
    }
}

fn current_slide_tokens<'a>(ctx: &'a DecisionContext<'_>) -> Option<&'a [String]> {
    let song = ctx.current_song?;
    let slide = song.slides.get(ctx.slide_index)?;
    let index = ctx.indexes.get(&song.id)?;
    index.slides.get(&slide.id).map(|d| d.phonemes.as_slice())
}

fn current_slide_score(ctx: &DecisionContext<'_>, candidates: &[MatchCandidate]) -> Option<f64> {
    let song = ctx.current_song?;
    let slide = song.slides.get(ctx.slide_index)?;
    candidates
        .iter()
        .find(|c| c.song_id == song.id && c.slide_id == slide.id)
        .map(|c| c.score)
}

/// True when the last `run` phonetic tokens of the query equal the last
/// `run` tokens of the slide (capped at the slide length).
fn tail_matches(query: &[String], slide: &[String], run: usize) -> bool {
    if run == 0 || query.is_empty() || slide.is_empty() {
        return false;
    }
    let n = run.min(slide.len());
    if query.len() < n {
        return false;
    }
    query[query.len() - n..] == slide[slide.len() - n..]
}

/// Score multiplier after a recent navigation: starts at `recency_boost`
/// and decays exponentially toward 1.0 (about 1.05 after five seconds with
/// the defaults).
fn recency_boost(policy: &DecisionPolicy, now_ms: u64, last_nav_ms: Option<u64>) -> f64 {
    let Some(last) = last_nav_ms else {
        return 1.0;
    };
    let elapsed = now_ms.saturating_sub(last) as f64;
    1.0 + (policy.recency_boost - 1.0) * (-elapsed / policy.recency_decay_ms as f64).exp()
}
