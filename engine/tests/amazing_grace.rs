//! End-to-end decision-stream scenarios over hand-timed hymn fixtures.
//!
//! Words arrive one at a time with realistic timestamps, the transcript
//! window grows between navigations and resets after them, exactly as a
//! presentation layer drives the engine.

use std::collections::HashMap;

use stanza_engine::{
    Decision, DecisionAction, DecisionContext, DecisionEngine, DecisionPolicy, MatchSessionState,
    Thresholds, TokenScorer,
};
use stanza_index::{Slide, Song, SongPhonemeIndex, build_index};
use stanza_phoneme::{SharedDictionary, Tokenizer};
use stanza_vector::VectorizeParams;

struct SpeechEvent {
    word: &'static str,
    timestamp: u64,
}

const fn ev(word: &'static str, timestamp: u64) -> SpeechEvent {
    SpeechEvent { word, timestamp }
}

// Slide 1 words in order; the engine must advance after the last one.
const CASE1_SLIDE1: &[SpeechEvent] = &[
    ev("Amazing", 0),
    ev("grace", 220),
    ev("how", 420),
    ev("sweet", 590),
    ev("the", 760),
    ev("sound", 900),
    ev("That", 1120),
    ev("saved", 1320),
    ev("a", 1440),
    ev("wretch", 1600),
    ev("like", 1780),
    ev("me", 1960),
];

// Slide 2's first four words while slide 1 is showing; nothing may move.
const CASE2_SLIDE2_PARTIAL: &[SpeechEvent] = &[
    ev("I", 0),
    ev("once", 220),
    ev("was", 420),
    ev("lost", 620),
];

// All of slide 2; the engine must advance to slide 3.
const CASE3_SLIDE2_FULL: &[SpeechEvent] = &[
    ev("I", 0),
    ev("once", 220),
    ev("was", 420),
    ev("lost", 620),
    ev("but", 840),
    ev("now", 1040),
    ev("am", 1200),
    ev("found", 1380),
    ev("Was", 1600),
    ev("blind", 1800),
    ev("but", 1980),
    ev("now", 2140),
    ev("I", 2280),
    ev("see", 2440),
];

fn slide(id: &str, text: &str) -> Slide {
    Slide {
        id: id.into(),
        text: text.into(),
    }
}

fn hymn_library() -> Vec<Song> {
    vec![
        Song {
            id: "amazing-grace".into(),
            title: "Amazing Grace".into(),
            slides: vec![
                slide(
                    "ag-1",
                    "Amazing grace how sweet the sound\nThat saved a wretch like me",
                ),
                slide(
                    "ag-2",
                    "I once was lost but now am found\nWas blind but now I see",
                ),
                slide(
                    "ag-3",
                    "Twas grace that taught my heart to fear\nAnd grace my fears relieved",
                ),
                slide(
                    "ag-4",
                    "How precious did that grace appear\nThe hour I first believed",
                ),
            ],
        },
        Song {
            id: "how-great-thou-art".into(),
            title: "How Great Thou Art".into(),
            slides: vec![
                slide(
                    "hgta-1",
                    "O Lord my God when I in awesome wonder\nConsider all the worlds Thy hands have made",
                ),
                slide(
                    "hgta-2",
                    "Then sings my soul my Savior God to Thee\nHow great Thou art how great Thou art",
                ),
            ],
        },
    ]
}

/// Drives the engine the way the presentation layer does: words append to
/// the window, navigation decisions move the slide and reset the window.
struct Simulator {
    engine: DecisionEngine,
    library: Vec<Song>,
    indexes: HashMap<String, SongPhonemeIndex>,
    queue: Vec<String>,
    thresholds: Thresholds,
    policy: DecisionPolicy,
    current_song_id: String,
    slide_index: usize,
    window: Vec<String>,
    session: MatchSessionState,
}

impl Simulator {
    fn new() -> Self {
        let tokenizer = Tokenizer::new(SharedDictionary::new());
        let library = hymn_library();
        let params = VectorizeParams::default();
        let indexes = library
            .iter()
            .map(|s| (s.id.clone(), build_index(s, &tokenizer, &params)))
            .collect();
        let queue = library.iter().map(|s| s.id.clone()).collect();
        Self {
            engine: DecisionEngine::new(tokenizer, Box::new(TokenScorer)),
            library,
            indexes,
            queue,
            thresholds: Thresholds::default(),
            policy: DecisionPolicy::default(),
            current_song_id: "amazing-grace".into(),
            slide_index: 0,
            window: Vec::new(),
            session: MatchSessionState::default(),
        }
    }

    fn feed(&mut self, events: &[SpeechEvent]) -> Vec<(u64, Decision)> {
        let mut stream = Vec::new();
        for event in events {
            self.window.push(event.word.to_string());
            let transcript = self.window.join(" ");
            let current = self.library.iter().find(|s| s.id == self.current_song_id);
            let ctx = DecisionContext {
                current_song: current,
                slide_index: self.slide_index,
                library: &self.library,
                queue: &self.queue,
                equal_priority: &[],
                indexes: &self.indexes,
                transcript_window: &transcript,
                thresholds: &self.thresholds,
                policy: &self.policy,
                session: self.session,
                now_ms: event.timestamp,
            };
            let (decision, session) = self.engine.decide(&ctx);
            self.session = session;
            match &decision.action {
                DecisionAction::Advance { target_index } => {
                    self.slide_index = *target_index;
                    self.window.clear();
                }
                DecisionAction::Update {
                    target_index,
                    target_song_id,
                } => {
                    if let Some(id) = target_song_id {
                        self.current_song_id = id.clone();
                    }
                    self.slide_index = *target_index;
                    self.window.clear();
                }
                _ => {}
            }
            stream.push((event.timestamp, decision));
        }
        stream
    }
}

fn is_move_to(decision: &Decision, index: usize) -> bool {
    matches!(
        decision.action,
        DecisionAction::Advance { target_index } if target_index == index
    ) || matches!(
        &decision.action,
        DecisionAction::Update { target_index, .. } if *target_index == index
    )
}

#[test]
fn advances_to_slide_two_after_the_last_word() {
    let mut sim = Simulator::new();
    let stream = sim.feed(CASE1_SLIDE1);

    let last_word_ts = CASE1_SLIDE1.last().unwrap().timestamp;
    let advance = stream
        .iter()
        .find(|(_, d)| matches!(d.action, DecisionAction::Advance { target_index: 1 }))
        .expect("no advance to slide 2 in the stream");
    assert!(
        advance.0 <= last_word_ts + 500,
        "advance at {} ms, last word at {} ms",
        advance.0,
        last_word_ts
    );
    assert_eq!(sim.slide_index, 1);

    // No slide-2 transition before the slide was finished.
    for (ts, decision) in &stream {
        if *ts < last_word_ts {
            assert!(!is_move_to(decision, 1), "early transition at {ts} ms");
        }
    }
}

#[test]
fn partial_slide_two_words_do_not_move_anything() {
    let mut sim = Simulator::new();
    let stream = sim.feed(CASE2_SLIDE2_PARTIAL);

    for (ts, decision) in &stream {
        assert!(
            matches!(decision.action, DecisionAction::None),
            "unexpected {:?} at {ts} ms",
            decision.action
        );
    }
    assert_eq!(sim.slide_index, 0);
    assert_eq!(sim.current_song_id, "amazing-grace");
}

#[test]
fn full_slide_two_advances_to_slide_three() {
    let mut sim = Simulator::new();
    sim.slide_index = 1;
    let stream = sim.feed(CASE3_SLIDE2_FULL);

    let last_word_ts = CASE3_SLIDE2_FULL.last().unwrap().timestamp;
    let advance = stream
        .iter()
        .find(|(_, d)| matches!(d.action, DecisionAction::Advance { target_index: 2 }))
        .expect("no advance to slide 3 in the stream");
    assert!(advance.0 <= last_word_ts + 500);
    assert_eq!(sim.slide_index, 2);
}

#[test]
fn consecutive_slides_chain_advances() {
    let mut sim = Simulator::new();
    sim.feed(CASE1_SLIDE1);
    assert_eq!(sim.slide_index, 1);
    sim.feed(CASE3_SLIDE2_FULL);
    assert_eq!(sim.slide_index, 2);
}

#[test]
fn decision_stream_is_reproducible() {
    let mut a = Simulator::new();
    let mut b = Simulator::new();
    assert_eq!(a.feed(CASE1_SLIDE1), b.feed(CASE1_SLIDE1));
}
