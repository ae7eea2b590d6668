use serde::{Deserialize, Serialize};

use crate::features::{PHONEME_DIM, phoneme_vec};

/// Context-window parameters. Part of every index cache key: changing
/// either invalidates previously built indexes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorizeParams {
    /// Number of preceding phonemes included with each position.
    /// 0 means only the current phoneme.
    #[serde(rename = "window")]
    pub window: usize,

    /// Exponential decay applied per step of distance (1.0 = no decay).
    #[serde(rename = "decay")]
    pub decay: f32,
}

impl Default for VectorizeParams {
    fn default() -> Self {
        Self {
            window: 3,
            decay: 0.85,
        }
    }
}

impl VectorizeParams {
    /// Dimension of every context vector built with these parameters.
    pub fn dim(&self) -> usize {
        (self.window + 1) * PHONEME_DIM
    }
}

/// Context vector for one position: the feature vectors of the token and
/// its `window` predecessors concatenated current-first, each scaled by
/// `decay^distance`, L2-normalized. Out-of-range positions contribute the
/// zero vector; a fully zero concatenation stays zero.
fn window_vec(tokens: &[String], center: usize, params: &VectorizeParams) -> Vec<f32> {
    let mut out = vec![0.0f32; params.dim()];
    for dist in 0..=params.window {
        let offset = dist * PHONEME_DIM;
        let Some(idx) = center.checked_sub(dist) else {
            break;
        };
        let base = phoneme_vec(&tokens[idx]);
        let weight = params.decay.powi(dist as i32);
        for d in 0..PHONEME_DIM {
            out[offset + d] = base[d] * weight;
        }
    }
    normalize(&mut out);
    out
}

/// One context vector per token position, aligned 1:1 with the input.
pub fn context_vectors(tokens: &[String], params: &VectorizeParams) -> Vec<Vec<f32>> {
    (0..tokens.len())
        .map(|i| window_vec(tokens, i, params))
        .collect()
}

/// The context vector at the final position, the live-query side of a
/// cosine comparison. `None` for an empty token sequence.
pub fn tail_context(tokens: &[String], params: &VectorizeParams) -> Option<Vec<f32>> {
    if tokens.is_empty() {
        return None;
    }
    Some(window_vec(tokens, tokens.len() - 1, params))
}

fn normalize(v: &mut [f32]) {
    let sum: f64 = v.iter().map(|x| (*x as f64) * (*x as f64)).sum();
    if sum == 0.0 {
        return;
    }
    let inv = 1.0 / sum.sqrt();
    for x in v.iter_mut() {
        *x = (*x as f64 * inv) as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cosine::cosine;

    fn toks(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn dimension_is_constant() {
        let params = VectorizeParams::default();
        let vecs = context_vectors(&toks(&["k", "ih", "ng"]), &params);
        assert_eq!(vecs.len(), 3);
        for v in &vecs {
            assert_eq!(v.len(), params.dim());
        }
    }

    #[test]
    fn vectors_are_unit_length() {
        let params = VectorizeParams::default();
        for v in context_vectors(&toks(&["k", "ih", "ng"]), &params) {
            let norm: f64 = v.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-6, "norm {norm}");
        }
    }

    #[test]
    fn unknown_tokens_normalize_to_zero() {
        let params = VectorizeParams::default();
        let vecs = context_vectors(&toks(&["q"]), &params);
        assert!(vecs[0].iter().all(|x| *x == 0.0));
    }

    #[test]
    fn tail_context_matches_last_position() {
        let params = VectorizeParams::default();
        let tokens = toks(&["g", "r", "ey", "s"]);
        let all = context_vectors(&tokens, &params);
        let tail = tail_context(&tokens, &params).unwrap();
        assert_eq!(tail, all[3]);
        assert!(tail_context(&[], &params).is_none());
    }

    #[test]
    fn same_tail_same_vector_regardless_of_earlier_text() {
        // A window of 1 only sees one predecessor, so longer histories with
        // the same last two phonemes produce identical tail vectors.
        let params = VectorizeParams {
            window: 1,
            decay: 0.85,
        };
        let a = tail_context(&toks(&["k", "ih", "ng"]), &params).unwrap();
        let b = tail_context(&toks(&["s", "ih", "ng"]), &params).unwrap();
        assert!((cosine(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn decay_weights_older_positions_less() {
        let no_decay = VectorizeParams {
            window: 2,
            decay: 1.0,
        };
        let decayed = VectorizeParams {
            window: 2,
            decay: 0.5,
        };
        let tokens = toks(&["k", "k", "k"]);
        let a = tail_context(&tokens, &no_decay).unwrap();
        let b = tail_context(&tokens, &decayed).unwrap();
        // With decay the current phoneme dominates the normalized vector.
        assert!(b[0] > a[0]);
    }

    #[test]
    fn deterministic() {
        let params = VectorizeParams::default();
        let tokens = toks(&["dh", "ah", "k", "ih", "ng"]);
        assert_eq!(
            context_vectors(&tokens, &params),
            context_vectors(&tokens, &params)
        );
    }
}
