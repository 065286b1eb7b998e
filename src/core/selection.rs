//! Selection policies — which candidates of a pool take part in a resolution.

use rand::seq::{index, SliceRandom};
use rand::Rng;

use crate::schema::node::{clamp_probability, ConfigNode, SequenceCursor, SelectionMode};

/// The numeric knobs a policy reads. Fields a mode does not use are ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionParams {
    pub count: u32,
    pub probability: f64,
    pub shuffle: bool,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            count: 1,
            probability: 0.5,
            shuffle: false,
        }
    }
}

impl SelectionParams {
    pub fn from_node(node: &ConfigNode) -> Self {
        Self {
            count: node.select_count,
            probability: node.select_probability,
            shuffle: node.shuffle,
        }
    }
}

/// Chosen indices into a pool, in output order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub indices: Vec<usize>,
    /// Whether `indices` were randomly permuted rather than kept in pool order.
    pub shuffled: bool,
}

/// Pick indices from a pool of `pool_size` candidates.
///
/// An empty pool always yields an empty selection and leaves `cursor`
/// untouched. `count` beyond the pool size selects the whole pool, and the
/// probability is clamped to 0.1..=1.0 before use.
pub fn select<R: Rng + ?Sized>(
    pool_size: usize,
    mode: SelectionMode,
    params: &SelectionParams,
    cursor: &SequenceCursor,
    rng: &mut R,
) -> Selection {
    if pool_size == 0 {
        return Selection::default();
    }

    let probability = clamp_probability(params.probability);

    let mut indices = match mode {
        SelectionMode::SingleRandom => vec![rng.gen_range(0..pool_size)],
        SelectionMode::SingleSequential => vec![cursor.advance(pool_size)],
        SelectionMode::SingleProbability => {
            if rng.gen_bool(probability) {
                vec![rng.gen_range(0..pool_size)]
            } else {
                Vec::new()
            }
        }
        SelectionMode::MultipleCount => {
            let amount = (params.count.max(1) as usize).min(pool_size);
            let mut picked = index::sample(rng, pool_size, amount).into_vec();
            picked.sort_unstable();
            picked
        }
        SelectionMode::MultipleProbability => {
            (0..pool_size).filter(|_| rng.gen_bool(probability)).collect()
        }
        SelectionMode::All => (0..pool_size).collect(),
    };

    let shuffled = mode.uses_shuffle() && params.shuffle;
    if shuffled {
        indices.shuffle(rng);
    }

    Selection { indices, shuffled }
}
