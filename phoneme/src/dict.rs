use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::Deserialize;

/// A dictionary entry: either a space-delimited phoneme string
/// (`"K IH1 NG"`) or an explicit list of symbols. Both shapes occur in
/// pronunciation JSON in the wild.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DictEntry {
    Phones(String),
    Symbols(Vec<String>),
}

impl DictEntry {
    fn to_symbols(&self) -> Vec<String> {
        match self {
            DictEntry::Phones(s) => s.split_whitespace().map(str::to_string).collect(),
            DictEntry::Symbols(v) => v.clone(),
        }
    }
}

/// Word to phoneme-sequence map with a monotonically increasing version.
///
/// Lookups are pure functions of (word, version); only `replace` and
/// `extend` mutate, and each bumps the version so downstream index caches
/// can treat it as part of their key.
#[derive(Debug, Default)]
pub struct PhonemeDictionary {
    entries: HashMap<String, Vec<String>>,
    version: u64,
}

impl PhonemeDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all entries. Bumps the version.
    pub fn replace(&mut self, entries: HashMap<String, DictEntry>) {
        self.entries = entries
            .into_iter()
            .map(|(w, e)| (w, e.to_symbols()))
            .collect();
        self.version += 1;
    }

    /// Merge additional entries over the existing ones. Bumps the version.
    pub fn extend(&mut self, entries: HashMap<String, DictEntry>) {
        for (w, e) in entries {
            self.entries.insert(w, e.to_symbols());
        }
        self.version += 1;
    }

    /// Retrieve the raw phoneme sequence for a word, if present.
    /// The key is normalized (lowercase, punctuation stripped, possessive
    /// `'s` removed) before lookup.
    pub fn lookup(&self, word: &str) -> Option<&[String]> {
        self.entries
            .get(&normalize_word(word))
            .map(|v| v.as_slice())
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cheaply clonable handle to a dictionary shared between the tokenizer,
/// the index builder, and the caller that loads pronunciations.
///
/// Single-writer, many-reader: replacing the dictionary mid-session is safe
/// because every index carries the version it was built against.
#[derive(Debug, Clone, Default)]
pub struct SharedDictionary {
    inner: Arc<RwLock<PhonemeDictionary>>,
}

impl SharedDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the dictionary contents.
    pub fn replace(&self, entries: HashMap<String, DictEntry>) {
        self.inner.write().unwrap().replace(entries);
    }

    /// Merge additional entries over the existing ones.
    pub fn extend(&self, entries: HashMap<String, DictEntry>) {
        self.inner.write().unwrap().extend(entries);
    }

    /// Phoneme sequence for a word, cloned out of the shared map.
    pub fn lookup(&self, word: &str) -> Option<Vec<String>> {
        self.inner.read().unwrap().lookup(word).map(|v| v.to_vec())
    }

    pub fn version(&self) -> u64 {
        self.inner.read().unwrap().version()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().is_empty()
    }
}

/// Normalize a word for dictionary lookup: lowercase, keep only letters,
/// digits, apostrophes and hyphens, strip a trailing possessive `'s`.
pub(crate) fn normalize_word(word: &str) -> String {
    let mut s: String = word
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '\'' || *c == '\u{2019}' || *c == '-')
        .collect();
    for suffix in ["'s", "\u{2019}s"] {
        if let Some(stripped) = s.strip_suffix(suffix) {
            s = stripped.to_string();
            break;
        }
    }
    s
}
