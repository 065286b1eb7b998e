//! Emphasis weighting: wrapping fragments in nested `{}` pairs.

use std::ops::RangeInclusive;

/// Deepest emphasis a node may request.
pub const MAX_DEPTH: u8 = 5;

/// Placeholder fragment used by [`preview`].
pub const PREVIEW_TAG: &str = "tag";

/// Wrap `text` in `depth` pairs of braces. Depth 0 returns the text as-is.
pub fn format(text: &str, depth: u8) -> String {
    let depth = usize::from(depth);
    let mut out = String::with_capacity(text.len() + depth * 2);
    out.extend(std::iter::repeat('{').take(depth));
    out.push_str(text);
    out.extend(std::iter::repeat('}').take(depth));
    out
}

/// Every depth between `min` and `max`, rendered on a placeholder tag and
/// joined with `separator`, e.g. `tag / {tag} / {{tag}}`.
pub fn preview(min: u8, max: u8, separator: &str) -> String {
    depth_range(min, max)
        .map(|depth| format(PREVIEW_TAG, depth))
        .collect::<Vec<_>>()
        .join(separator)
}

/// The inclusive depth range for a node's bracket bounds, capped at
/// [`MAX_DEPTH`]. An inverted pair is read as `max..=max`.
pub fn depth_range(min: u8, max: u8) -> RangeInclusive<u8> {
    let max = max.min(MAX_DEPTH);
    min.min(max)..=max
}
