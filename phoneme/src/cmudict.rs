use std::collections::HashMap;

use crate::dict::DictEntry;

/// Options for parsing CMUdict-format text.
#[derive(Debug, Clone, Default)]
pub struct CmudictOptions {
    /// Stop after this many entries. `None` ingests everything.
    pub max_entries: Option<usize>,
    /// Keep `word(1)`-style pronunciation variants under their suffixed
    /// keys instead of dropping them. Default: first occurrence wins.
    pub keep_variants: bool,
}

/// Parse the plain-text CMUdict format into dictionary entries.
///
/// Lines beginning with `;` are comments. Each entry is of the form:
///
/// ```text
/// WORD  PH OW1 N IY0 M Z
/// ```
///
/// Words are lowercased and `(n)` variant suffixes are stripped unless
/// `keep_variants` is set. Fetching the file is the caller's concern; this
/// function is pure.
pub fn parse_cmudict(text: &str, opts: &CmudictOptions) -> HashMap<String, DictEntry> {
    let mut map = HashMap::new();
    for line in text.lines() {
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        let Some((raw_word, phones)) = line.split_once(char::is_whitespace) else {
            continue;
        };
        let phones = phones.trim();
        if phones.is_empty() {
            continue;
        }

        let mut word = raw_word.to_lowercase();
        if !opts.keep_variants {
            word = strip_variant_suffix(&word);
            if map.contains_key(&word) {
                continue;
            }
        }

        map.insert(word, DictEntry::Phones(phones.to_string()));
        if let Some(max) = opts.max_entries {
            if map.len() >= max {
                break;
            }
        }
    }
    map
}

/// Strip a `(n)` pronunciation-variant suffix: `"read(2)"` -> `"read"`.
fn strip_variant_suffix(word: &str) -> String {
    if let Some(open) = word.rfind('(') {
        if word.ends_with(')') && word[open + 1..word.len() - 1].chars().all(|c| c.is_ascii_digit())
        {
            return word[..open].to_string();
        }
    }
    word.to_string()
}
