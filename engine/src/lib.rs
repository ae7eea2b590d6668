//! Scoring strategies and the slide-navigation decision engine.
//!
//! Consumes a rolling speech transcript, scores it against precomputed song
//! indexes, and emits stay/advance/jump/blank decisions for a presentation
//! layer to act on. The engine itself is pure: temporal state lives in a
//! `MatchSessionState` the caller threads through every call.

pub mod decide;
pub mod scorer;
pub mod types;

pub use decide::{DecisionContext, DecisionEngine};
pub use scorer::{
    KeywordScorer, RankContext, RankWeights, Scorer, ScorerKind, SlideScore, TokenScorer,
    TranscriptQuery, VectorScorer, rank_candidates,
};
pub use types::{
    BlankPosition, Decision, DecisionAction, DecisionPolicy, MatchCandidate, MatchSessionState,
    Thresholds,
};
