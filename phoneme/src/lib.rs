//! Phoneme dictionary and phonetic tokenization.
//!
//! Converts lyric or transcript text into sequences of phonetic tokens using
//! an ARPAbet-style pronunciation dictionary, falling back to a deterministic
//! grapheme reducer for words the dictionary does not know.

pub mod cmudict;
pub mod dict;
pub mod tokenize;

pub use cmudict::{CmudictOptions, parse_cmudict};
pub use dict::{DictEntry, PhonemeDictionary, SharedDictionary};
pub use tokenize::{Tokenizer, normalize_text, simple_phonetic, word_count};
