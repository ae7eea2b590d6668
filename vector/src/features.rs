//! Phoneme-to-feature-vector mapping.
//!
//! Dimensions (13 total):
//! - `[0]` consonant flag (1) vs vowel (0)
//! - `[1..=4]` one-hot place of articulation: bilabial, labiodental,
//!   alveolar/post-alveolar, velar/palatal
//! - `[5..=8]` one-hot manner: stop/affricate, fricative, nasal,
//!   liquid/glide
//! - `[9]` voicing (1 voiced, 0 voiceless)
//! - `[10..=12]` vowel frontness, height, roundedness in `[0,1]`
//!
//! Consonants leave the vowel dimensions at 0; vowels leave place, manner
//! and voicing at 0.

/// Length of a single phoneme feature vector.
pub const PHONEME_DIM: usize = 13;

#[derive(Clone, Copy)]
enum Place {
    Bilabial,
    Labiodental,
    Alveolar,
    Velar,
}

#[derive(Clone, Copy)]
enum Manner {
    Stop,
    Fricative,
    Nasal,
    Liquid,
}

fn consonant(place: Place, manner: Manner, voiced: bool) -> [f32; PHONEME_DIM] {
    let mut v = [0.0; PHONEME_DIM];
    v[0] = 1.0;
    let place_idx = match place {
        Place::Bilabial => 1,
        Place::Labiodental => 2,
        Place::Alveolar => 3,
        Place::Velar => 4,
    };
    v[place_idx] = 1.0;
    let manner_idx = match manner {
        Manner::Stop => 5,
        Manner::Fricative => 6,
        Manner::Nasal => 7,
        Manner::Liquid => 8,
    };
    v[manner_idx] = 1.0;
    if voiced {
        v[9] = 1.0;
    }
    v
}

fn vowel(front: f32, height: f32, rounded: f32) -> [f32; PHONEME_DIM] {
    let mut v = [0.0; PHONEME_DIM];
    v[10] = front;
    v[11] = height;
    v[12] = rounded;
    v
}

/// Feature vector for an ARPAbet symbol. Trailing stress digits are
/// stripped and matching is case-insensitive, so `"IH1"`, `"ih"` and
/// `"IH"` are the same phoneme.
fn arpa_vec(symbol: &str) -> Option<[f32; PHONEME_DIM]> {
    use Manner::*;
    use Place::*;
    let v = match symbol {
        // Stops
        "p" => consonant(Bilabial, Stop, false),
        "b" => consonant(Bilabial, Stop, true),
        "t" => consonant(Alveolar, Stop, false),
        "d" => consonant(Alveolar, Stop, true),
        "k" => consonant(Velar, Stop, false),
        "g" => consonant(Velar, Stop, true),
        // Affricates share the stop slot
        "ch" => consonant(Alveolar, Stop, false),
        "jh" => consonant(Alveolar, Stop, true),
        // Fricatives
        "f" => consonant(Labiodental, Fricative, false),
        "v" => consonant(Labiodental, Fricative, true),
        "th" => consonant(Alveolar, Fricative, false),
        "dh" => consonant(Alveolar, Fricative, true),
        "s" => consonant(Alveolar, Fricative, false),
        "z" => consonant(Alveolar, Fricative, true),
        "sh" => consonant(Alveolar, Fricative, false),
        "zh" => consonant(Alveolar, Fricative, true),
        "hh" => consonant(Alveolar, Fricative, false),
        // Nasals
        "m" => consonant(Bilabial, Nasal, true),
        "n" => consonant(Alveolar, Nasal, true),
        "ng" => consonant(Velar, Nasal, true),
        // Liquids and glides
        "l" => consonant(Alveolar, Liquid, true),
        "r" => consonant(Alveolar, Liquid, true),
        "w" => consonant(Bilabial, Liquid, true),
        "y" => consonant(Velar, Liquid, true),
        // Vowels
        "iy" => vowel(1.0, 1.0, 0.0),
        "ih" => vowel(1.0, 0.8, 0.0),
        "ey" => vowel(0.8, 0.7, 0.0),
        "eh" => vowel(0.8, 0.6, 0.0),
        "ae" => vowel(1.0, 0.3, 0.0),
        "aa" => vowel(0.2, 0.2, 0.0),
        "ah" => vowel(0.5, 0.5, 0.0),
        "ao" => vowel(0.2, 0.4, 1.0),
        "aw" => vowel(0.3, 0.3, 1.0),
        "ay" => vowel(0.7, 0.6, 0.0),
        "ow" => vowel(0.2, 0.8, 1.0),
        "oy" => vowel(0.2, 0.7, 1.0),
        "uh" => vowel(0.1, 0.7, 1.0),
        "uw" => vowel(0.1, 0.9, 1.0),
        "er" => vowel(0.5, 0.7, 0.0),
        _ => return None,
    };
    Some(v)
}

/// Nearest phoneme for a bare grapheme, used when a token comes from the
/// grapheme fallback instead of the dictionary.
fn grapheme_vec(c: char) -> Option<[f32; PHONEME_DIM]> {
    let symbol = match c {
        'b' => "b",
        'p' => "p",
        'd' => "d",
        't' => "t",
        'g' => "g",
        'k' => "k",
        'v' => "v",
        'f' => "f",
        'z' => "z",
        's' => "s",
        'j' => "jh",
        'c' => "ch",
        'l' => "l",
        'r' => "r",
        'm' => "m",
        'n' => "n",
        'h' => "hh",
        'w' => "w",
        'y' => "y",
        'a' => "aa",
        'e' => "eh",
        'i' => "iy",
        'o' => "ao",
        'u' => "uw",
        _ => return None,
    };
    arpa_vec(symbol)
}

/// Feature vector for any phonetic token.
///
/// ARPAbet symbols (stress digits tolerated, any case) map directly.
/// Fallback tokens map through the first grapheme of their consonant
/// skeleton. Anything unrecognized is the zero vector, never an error.
pub fn phoneme_vec(token: &str) -> [f32; PHONEME_DIM] {
    let stripped: String = token
        .chars()
        .filter(|c| !c.is_ascii_digit())
        .collect::<String>()
        .to_lowercase();
    if let Some(v) = arpa_vec(&stripped) {
        return v;
    }
    if let Some(c) = stripped.chars().next() {
        if let Some(v) = grapheme_vec(c) {
            return v;
        }
    }
    [0.0; PHONEME_DIM]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stress_and_case_are_ignored() {
        assert_eq!(phoneme_vec("IH1"), phoneme_vec("ih"));
        assert_eq!(phoneme_vec("K"), phoneme_vec("k"));
    }

    #[test]
    fn consonant_layout() {
        let k = phoneme_vec("k");
        assert_eq!(k[0], 1.0); // consonant flag
        assert_eq!(k[4], 1.0); // velar
        assert_eq!(k[5], 1.0); // stop
        assert_eq!(k[9], 0.0); // voiceless
        let g = phoneme_vec("g");
        assert_eq!(g[9], 1.0); // voiced
    }

    #[test]
    fn vowel_layout() {
        let iy = phoneme_vec("iy");
        assert_eq!(iy[0], 0.0);
        assert_eq!(iy[10], 1.0);
        assert_eq!(iy[11], 1.0);
        assert_eq!(iy[12], 0.0);
    }

    #[test]
    fn fallback_tokens_use_first_grapheme() {
        // "grc" is the skeleton for an unknown word like "grace"
        assert_eq!(phoneme_vec("grc"), phoneme_vec("g"));
    }

    #[test]
    fn unknown_symbols_are_zero() {
        assert_eq!(phoneme_vec("q"), [0.0; PHONEME_DIM]);
        assert_eq!(phoneme_vec("xx"), phoneme_vec("x"));
        assert_eq!(phoneme_vec(""), [0.0; PHONEME_DIM]);
    }
}
