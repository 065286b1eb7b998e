//! Resolution — turning a configuration tree into an ordered list of fragments.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::core::brackets;
use crate::core::selection::{select, SelectionParams};
use crate::schema::node::{ConfigNode, ContentType};

/// Resolve `node` into a flat, ordered list of fragments.
///
/// Disabled nodes produce nothing. A `string` node selects among its
/// non-empty fragments and wraps each chosen one in braces at a depth drawn
/// independently from its bracket range. A `nested` node selects among its
/// enabled children and concatenates their resolutions; its own bracket
/// range is not applied on top of them.
///
/// The same tree, rng state and sequential cursors always give the same
/// output. `single_sequential` nodes advance their cursor on every call.
pub fn resolve<R: Rng + ?Sized>(node: &ConfigNode, rng: &mut R) -> Vec<String> {
    let mut output = Vec::new();
    resolve_into(node, rng, &mut output);
    debug!(node = %node.name, fragments = output.len(), "resolved prompt tree");
    output
}

/// Resolve with a fresh `StdRng`, seeded from `seed` when given and from
/// system entropy otherwise.
pub fn resolve_seeded(node: &ConfigNode, seed: Option<u64>) -> Vec<String> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    resolve(node, &mut rng)
}

/// Rewind every `single_sequential` cursor in the subtree to the start.
pub fn reset_cursors(node: &ConfigNode) {
    node.cursor.reset();
    for child in &node.nested_configs {
        reset_cursors(child);
    }
}

fn resolve_into<R: Rng + ?Sized>(node: &ConfigNode, rng: &mut R, output: &mut Vec<String>) {
    if !node.enabled {
        trace!(node = %node.name, "skipping disabled node");
        return;
    }

    let params = SelectionParams::from_node(node);

    match node.content_type {
        ContentType::String => {
            let pool: Vec<&str> = node.active_fragments().collect();
            let selection = select(pool.len(), node.selection_mode, &params, &node.cursor, rng);
            trace!(
                node = %node.name,
                mode = node.selection_mode.name(),
                pool = pool.len(),
                chosen = ?selection.indices,
                shuffled = selection.shuffled,
                "selected fragments"
            );

            let depths = brackets::depth_range(node.bracket_min, node.bracket_max);
            for index in selection.indices {
                let depth = rng.gen_range(depths.clone());
                output.push(brackets::format(pool[index], depth));
            }
        }
        ContentType::Nested => {
            let pool: Vec<&ConfigNode> = node.active_children().collect();
            let selection = select(pool.len(), node.selection_mode, &params, &node.cursor, rng);
            trace!(
                node = %node.name,
                mode = node.selection_mode.name(),
                pool = pool.len(),
                chosen = ?selection.indices,
                shuffled = selection.shuffled,
                "selected children"
            );

            for index in selection.indices {
                resolve_into(pool[index], rng, output);
            }
        }
    }
}
