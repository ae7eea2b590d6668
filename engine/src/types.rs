use serde::Serialize;

/// Which end of the song a blank screen leans toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlankPosition {
    Start,
    End,
}

/// One scored (song, slide, position) match.
///
/// Scores are comparable only within a single ranking call: cross-song
/// weighting is already folded in, so the value is not a raw similarity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCandidate {
    #[serde(rename = "song_id")]
    pub song_id: String,

    #[serde(rename = "slide_id")]
    pub slide_id: String,

    /// Position of the slide within its song.
    #[serde(rename = "slide_index")]
    pub slide_index: usize,

    /// Best-matching phoneme position inside the slide, when the scoring
    /// strategy produces one.
    #[serde(rename = "position", skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,

    #[serde(rename = "score")]
    pub score: f64,
}

/// What the presentation layer should do with the current slide.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum DecisionAction {
    /// Stay put. Also the answer to malformed or absent state.
    None,

    /// Move forward to the given slide of the current song.
    Advance { target_index: usize },

    /// Jump to a slide, possibly in another song.
    Update {
        target_index: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        target_song_id: Option<String>,
    },

    /// Confidence is too low to show anything.
    Blank {
        #[serde(skip_serializing_if = "Option::is_none")]
        position: Option<BlankPosition>,
    },
}

/// The outcome of one decision cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    #[serde(flatten)]
    pub action: DecisionAction,

    /// Best candidate this cycle, when any song could be scored.
    #[serde(rename = "best", skip_serializing_if = "Option::is_none")]
    pub best: Option<MatchCandidate>,

    /// The transcript window the decision was computed from.
    #[serde(rename = "transcript_window")]
    pub transcript_window: String,
}

/// Score thresholds and word-count gates. Owned by the caller and passed
/// into every decision call; there is no hidden global configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Confidence to adopt the precomputed next slide.
    pub accept_next: f64,

    /// Confidence to jump to any other slide within the current song.
    pub accept_any: f64,

    /// Below this, blank the display.
    pub blank: f64,

    /// Confidence to jump to a different song. A strictly higher bar than
    /// the in-song thresholds.
    pub cross_song: f64,

    /// While blanked, confidence on the current slide that clears the
    /// blank again (hysteresis against blank/unblank flicker).
    pub resume: f64,

    /// Minimum spoken words before an advance may fire.
    pub min_advance_tokens: usize,

    /// Minimum spoken words before an in-song jump may fire.
    pub min_update_tokens: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            accept_next: 0.7,
            accept_any: 0.6,
            blank: 0.45,
            cross_song: 0.8,
            resume: 0.55,
            min_advance_tokens: 5,
            min_update_tokens: 5,
        }
    }
}

/// Tunable override-ordering policy.
///
/// The interaction between the exact-tail override, the blank check and
/// next-slide adoption is deliberately configuration, not contract.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionPolicy {
    /// Evaluate the exact-tail override before the blank threshold.
    /// When false the override still fires, but only for transcripts
    /// that clear the blank bar.
    pub tail_override_first: bool,

    /// Require an exact tail match in addition to `accept_next` before
    /// adopting the next slide (the strict variant).
    pub require_tail_for_next: bool,

    /// Number of trailing phonetic tokens compared for a tail match.
    pub tail_run: usize,

    /// Score multiplier immediately after a navigation event.
    pub recency_boost: f64,

    /// Time constant of the exponential boost decay, in milliseconds.
    pub recency_decay_ms: u64,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            tail_override_first: true,
            require_tail_for_next: false,
            tail_run: 4,
            recency_boost: 2.5,
            recency_decay_ms: 1500,
        }
    }
}

/// Caller-threaded temporal state: passed into `decide`, returned updated.
/// Keeping it explicit keeps the engine referentially transparent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MatchSessionState {
    /// When the engine last navigated (advance or update), for the
    /// recency boost.
    pub last_nav_ms: Option<u64>,

    /// Whether the display is currently blanked.
    pub blanked: bool,

    /// Direction of the current blank, when one was decided.
    pub blank_position: Option<BlankPosition>,
}
