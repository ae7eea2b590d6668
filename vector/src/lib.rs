//! Articulatory feature vectors for phonetic tokens.
//!
//! Each phoneme maps to a fixed 13-dimensional feature vector encoding
//! place, manner and voicing for consonants and frontness/height/rounding
//! for vowels, so that acoustically similar sounds are nearby in vector
//! space. Context vectors concatenate a token with its decayed preceding
//! window for position-sensitive cosine matching.

pub mod context;
pub mod cosine;
pub mod features;

pub use context::{VectorizeParams, context_vectors, tail_context};
pub use cosine::cosine;
pub use features::{PHONEME_DIM, phoneme_vec};
