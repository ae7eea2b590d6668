use std::collections::HashMap;

use stanza_phoneme::Tokenizer;
use stanza_vector::{VectorizeParams, context_vectors};

use crate::types::{SlidePhonemeVectors, Song, SongPhonemeIndex};

/// Build the phonetic index for a song.
///
/// Slides are tokenized and vectorized independently: context windows never
/// read across slide boundaries, so the first phoneme of a slide has an
/// empty history even when the previous slide ends mid-sentence.
pub fn build_index(song: &Song, tokenizer: &Tokenizer, params: &VectorizeParams) -> SongPhonemeIndex {
    let mut slides = HashMap::with_capacity(song.slides.len());
    for slide in &song.slides {
        let phonemes = tokenizer.tokens(&slide.text);
        let contexts = context_vectors(&phonemes, params);
        slides.insert(
            slide.id.clone(),
            SlidePhonemeVectors {
                slide_id: slide.id.clone(),
                phonemes,
                contexts,
            },
        );
    }
    SongPhonemeIndex {
        song_id: song.id.clone(),
        window: params.window,
        slides,
    }
}
