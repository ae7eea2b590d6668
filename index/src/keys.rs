use stanza_vector::VectorizeParams;

use crate::types::Song;

/// Cache key for a song index.
/// Format: `{song_id}|{dict_version}|{content_hash_hex}`
///
/// The hash covers every slide id/text pair plus the vectorization
/// parameters and the dictionary version, so lyric edits, parameter changes
/// and dictionary reloads all produce a fresh key.
pub fn cache_key(song: &Song, params: &VectorizeParams, dict_version: u64) -> String {
    let mut content = String::new();
    for slide in &song.slides {
        content.push_str(&slide.id);
        content.push('\u{1f}');
        content.push_str(&slide.text);
        content.push('\u{1e}');
    }
    content.push_str(&format!(
        "w={};d={};v={}",
        params.window, params.decay, dict_version
    ));
    format!("{}|{}|{}", song.id, dict_version, djb2(&content))
}

/// djb2-xor string hash, rendered as lowercase hex. Stable across
/// sessions, cheap, and collision-tolerant for this use: a collision only
/// ever resurrects a stale cached index for the same song id.
fn djb2(input: &str) -> String {
    let mut hash: u32 = 5381;
    for b in input.bytes() {
        hash = hash.wrapping_shl(5).wrapping_add(hash) ^ (b as u32);
    }
    format!("{hash:x}")
}
