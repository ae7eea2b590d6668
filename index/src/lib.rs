//! Per-song phonetic index: build, cache, and serve.
//!
//! A `SongPhonemeIndex` holds, for every slide, the slide's phonetic token
//! sequence and one context vector per token position. Indexes are immutable
//! once built; cache keys cover slide content, vectorization parameters and
//! the dictionary version, so any change to lyrics, parameters or
//! pronunciations invalidates cached entries automatically.

pub mod build;
pub mod cache;
pub mod error;
pub mod keys;
pub mod service;
pub mod types;

pub use build::build_index;
pub use cache::{IndexCache, MemoryCache, RedbCache};
pub use error::IndexError;
pub use keys::cache_key;
pub use service::IndexService;
pub use types::{SlidePhonemeVectors, Slide, Song, SongPhonemeIndex};
