use crate::dict::SharedDictionary;

/// Converts text into phonetic tokens.
///
/// Dictionary hits contribute one token per phoneme (stress digits stripped,
/// lowercased); unknown words contribute a single grapheme-reduced token.
/// Both slide text and live transcript go through the same path so that the
/// two sides of a comparison always speak the same token language.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    dict: SharedDictionary,
}

impl Tokenizer {
    pub fn new(dict: SharedDictionary) -> Self {
        Self { dict }
    }

    pub fn dict(&self) -> &SharedDictionary {
        &self.dict
    }

    /// Phonetic token sequence for arbitrary text.
    pub fn tokens(&self, text: &str) -> Vec<String> {
        let mut out = Vec::new();
        for word in normalize_text(text).split_whitespace() {
            if let Some(phones) = self.dict.lookup(word) {
                if !phones.is_empty() {
                    out.extend(phones.iter().map(|p| strip_stress(p)));
                    continue;
                }
            }
            let fallback = simple_phonetic(word);
            if !fallback.is_empty() {
                out.push(fallback);
            }
        }
        out
    }
}

/// Lowercase, replace every non-letter/digit with a space, collapse runs of
/// whitespace. Unicode-aware.
pub fn normalize_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut last_space = true;
    for c in lowered.chars() {
        if c.is_alphanumeric() {
            out.push(c);
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    out.trim_end().to_string()
}

/// Number of words in the text after normalization.
pub fn word_count(text: &str) -> usize {
    normalize_text(text).split_whitespace().count()
}

/// Strip stress digits from an ARPAbet symbol and lowercase it:
/// `"IH1"` -> `"ih"`.
fn strip_stress(phoneme: &str) -> String {
    phoneme
        .chars()
        .filter(|c| !c.is_ascii_digit())
        .collect::<String>()
        .to_lowercase()
}

/// Deterministic grapheme reducer for words missing from the dictionary.
///
/// Collapses the word to a consonant skeleton: silent-letter digraphs are
/// rewritten, common digraphs are mapped to single consonants, then all
/// vowels after the first character and repeated letters are dropped.
/// Non-empty alphabetic input always yields a non-empty token.
pub fn simple_phonetic(word: &str) -> String {
    let mut w: String = word
        .to_lowercase()
        .chars()
        .filter(char::is_ascii_lowercase)
        .collect();
    if w.is_empty() {
        return String::new();
    }

    for (prefix, rep) in [("kn", "n"), ("gn", "n"), ("wr", "r"), ("ps", "s")] {
        if let Some(rest) = w.strip_prefix(prefix) {
            w = format!("{rep}{rest}");
        }
    }
    if let Some(rest) = w.strip_suffix("mb") {
        w = format!("{rest}m");
    }
    for (digraph, rep) in [
        ("gh", "g"),
        ("ph", "f"),
        ("th", "t"),
        ("sh", "s"),
        ("ch", "k"),
        ("ck", "k"),
        ("dg", "j"),
    ] {
        w = w.replace(digraph, rep);
    }

    let mut chars = w.chars();
    let first = chars.next().expect("non-empty after filtering");
    let mut kept = String::new();
    kept.push(first);
    for c in chars {
        if "aeiouy".contains(c) {
            continue;
        }
        if kept.ends_with(c) {
            continue;
        }
        kept.push(c);
    }
    kept
}
