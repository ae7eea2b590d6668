use std::sync::{Arc, RwLock};

use stanza_phoneme::Tokenizer;
use stanza_vector::VectorizeParams;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::build::build_index;
use crate::cache::IndexCache;
use crate::keys::cache_key;
use crate::types::{Song, SongPhonemeIndex};

/// Loads song indexes from the cache, building and persisting on miss.
///
/// Builds run on the blocking pool, off the scoring hot path, and belong to
/// a cancellation generation: `cancel_pending` discards every in-flight
/// build so a song-set change can never leak a stale index into later
/// scoring calls. Cache failures degrade to rebuilding; they are logged and
/// never surfaced.
pub struct IndexService {
    cache: Arc<dyn IndexCache>,
    params: VectorizeParams,
    generation: RwLock<CancellationToken>,
}

impl IndexService {
    pub fn new(cache: Arc<dyn IndexCache>, params: VectorizeParams) -> Self {
        Self {
            cache,
            params,
            generation: RwLock::new(CancellationToken::new()),
        }
    }

    pub fn params(&self) -> &VectorizeParams {
        &self.params
    }

    /// Token observing the current build generation. Cancelled tokens stay
    /// cancelled; `cancel_pending` installs a fresh generation.
    pub fn generation(&self) -> CancellationToken {
        self.generation.read().unwrap().clone()
    }

    /// Discard all in-flight builds. Their results are dropped instead of
    /// being persisted or returned; subsequent calls build fresh.
    pub fn cancel_pending(&self) {
        let mut generation = self.generation.write().unwrap();
        generation.cancel();
        *generation = CancellationToken::new();
    }

    /// Return the index for a song, from cache when possible.
    ///
    /// Returns `None` only when the build generation was cancelled while
    /// this build was in flight.
    pub async fn load_or_build(
        &self,
        song: &Song,
        tokenizer: &Tokenizer,
    ) -> Option<SongPhonemeIndex> {
        let key = cache_key(song, &self.params, tokenizer.dict().version());
        match self.cache.get(&key) {
            Ok(Some(index)) => return Some(index),
            Ok(None) => {}
            Err(e) => warn!("index cache read failed, rebuilding: {e}"),
        }
        self.build_and_store(song, tokenizer, &key).await
    }

    /// Build unconditionally, replacing any cached entry.
    pub async fn rebuild(&self, song: &Song, tokenizer: &Tokenizer) -> Option<SongPhonemeIndex> {
        let key = cache_key(song, &self.params, tokenizer.dict().version());
        self.build_and_store(song, tokenizer, &key).await
    }

    async fn build_and_store(
        &self,
        song: &Song,
        tokenizer: &Tokenizer,
        key: &str,
    ) -> Option<SongPhonemeIndex> {
        let generation = self.generation();
        let params = self.params;
        let song = song.clone();
        let tokenizer = tokenizer.clone();

        debug!("building phoneme index for {}", song.id);
        let built = tokio::task::spawn_blocking(move || build_index(&song, &tokenizer, &params))
            .await
            .ok()?;

        if generation.is_cancelled() {
            debug!("discarding index build for {}: generation cancelled", built.song_id);
            return None;
        }

        if let Err(e) = self.cache.put(key, &built) {
            warn!("index cache write failed for {key}: {e}");
        }
        Some(built)
    }
}
