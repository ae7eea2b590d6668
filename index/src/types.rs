use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single lyric slide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slide {
    /// Unique identifier within the song.
    #[serde(rename = "id")]
    pub id: String,

    /// Display text; lines separated by newlines.
    #[serde(rename = "text")]
    pub text: String,
}

/// A song: an ordered list of slides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Song {
    /// Unique identifier within the library.
    #[serde(rename = "id")]
    pub id: String,

    /// Human-readable title.
    #[serde(rename = "title", default)]
    pub title: String,

    /// Slides in presentation order.
    #[serde(rename = "slides", default)]
    pub slides: Vec<Slide>,
}

impl Song {
    /// Position of a slide within the song, if present.
    pub fn slide_index(&self, slide_id: &str) -> Option<usize> {
        self.slides.iter().position(|s| s.id == slide_id)
    }

    /// Identifier of the slide after `index`, when one exists.
    pub fn next_slide_id(&self, index: usize) -> Option<&str> {
        self.slides.get(index + 1).map(|s| s.id.as_str())
    }
}

/// Phoneme sequence and context vectors for one slide, aligned 1:1 by
/// position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlidePhonemeVectors {
    #[serde(rename = "slide_id")]
    pub slide_id: String,

    /// Phonetic tokens for the slide text.
    #[serde(rename = "phonemes")]
    pub phonemes: Vec<String>,

    /// One context vector per token position.
    #[serde(rename = "contexts")]
    pub contexts: Vec<Vec<f32>>,
}

/// Precomputed phonetic index for one song. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongPhonemeIndex {
    #[serde(rename = "song_id")]
    pub song_id: String,

    /// Context-window size the vectors were built with.
    #[serde(rename = "window")]
    pub window: usize,

    /// Per-slide phoneme data, keyed by slide id.
    #[serde(rename = "slides")]
    pub slides: HashMap<String, SlidePhonemeVectors>,
}
