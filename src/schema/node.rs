//! Configuration node — the tree the resolver walks.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;

use crate::core::brackets::MAX_DEPTH;
use crate::core::content::format_list;

/// Lowest accepted `select_count`.
pub const SELECT_COUNT_MIN: u32 = 1;
/// Highest accepted `select_count`.
pub const SELECT_COUNT_MAX: u32 = 10;
/// Lowest accepted `select_probability`.
pub const PROBABILITY_MIN: f64 = 0.1;
/// Highest accepted `select_probability`.
pub const PROBABILITY_MAX: f64 = 1.0;
/// Probability assigned by [`ConfigNode::create`].
pub const DEFAULT_PROBABILITY: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("node name must not be empty")]
    EmptyName,
    #[error("bracket depth {value} is outside 0..=5")]
    BracketOutOfRange { value: u8 },
    #[error("bracket range is inverted: min {min} > max {max}")]
    BracketOrder { min: u8, max: u8 },
    #[error("select count {value} is outside 1..=10")]
    SelectCountOutOfRange { value: u32 },
    #[error("select probability {value} is outside 0.1..=1.0")]
    ProbabilityOutOfRange { value: f64 },
    #[error("child {index}: {source}")]
    Child {
        index: usize,
        source: Box<ValidationError>,
    },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("RON serialization error: {0}")]
    Serialize(#[from] ron::Error),
}

/// Which pool of a node is the active candidate pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// Literal fragments from `string_contents`.
    #[default]
    String,
    /// Child nodes from `nested_configs`.
    Nested,
}

/// How many candidates a node picks, and which.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// One candidate, uniformly at random.
    #[default]
    SingleRandom,
    /// One candidate, walking the pool in order across resolutions.
    SingleSequential,
    /// One random candidate with probability `select_probability`, else none.
    SingleProbability,
    /// `select_count` distinct candidates, kept in pool order.
    MultipleCount,
    /// Each candidate independently with probability `select_probability`.
    MultipleProbability,
    /// Every candidate.
    All,
}

impl SelectionMode {
    pub const ALL_MODES: [SelectionMode; 6] = [
        Self::SingleRandom,
        Self::SingleSequential,
        Self::SingleProbability,
        Self::MultipleCount,
        Self::MultipleProbability,
        Self::All,
    ];

    /// The snake_case name used in RON files and tool output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SingleRandom => "single_random",
            Self::SingleSequential => "single_sequential",
            Self::SingleProbability => "single_probability",
            Self::MultipleCount => "multiple_count",
            Self::MultipleProbability => "multiple_probability",
            Self::All => "all",
        }
    }

    pub fn uses_count(&self) -> bool {
        matches!(self, Self::MultipleCount)
    }

    pub fn uses_probability(&self) -> bool {
        matches!(self, Self::SingleProbability | Self::MultipleProbability)
    }

    pub fn uses_shuffle(&self) -> bool {
        matches!(self, Self::MultipleProbability | Self::All)
    }
}

/// Position of a `single_sequential` node within its pool.
///
/// Atomic so that nodes can sit behind `Arc` in a shared tree. Two
/// resolutions of the same node racing each other still need external
/// ordering if the sequence itself matters.
#[derive(Debug, Default)]
pub struct SequenceCursor(AtomicUsize);

impl SequenceCursor {
    pub fn position(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    /// Return the current index into a pool of `pool_size` and step forward,
    /// wrapping to 0 after the last entry. An empty pool returns 0 and leaves
    /// the cursor where it is.
    pub fn advance(&self, pool_size: usize) -> usize {
        if pool_size == 0 {
            return 0;
        }
        let (Ok(previous) | Err(previous)) =
            self.0
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                    Some((current % pool_size + 1) % pool_size)
                });
        previous % pool_size
    }

    pub fn reset(&self) {
        self.0.store(0, Ordering::Relaxed);
    }
}

impl Clone for SequenceCursor {
    fn clone(&self) -> Self {
        Self(AtomicUsize::new(self.position()))
    }
}

impl PartialEq for SequenceCursor {
    fn eq(&self, other: &Self) -> bool {
        self.position() == other.position()
    }
}

/// A node of the prompt configuration tree.
///
/// Nodes are edited by replacement: [`ConfigNode::copy_with`] returns a new
/// node with the requested fields changed and the edit-boundary clamping
/// applied. Children are held behind `Arc`, so rebuilding one path of a tree
/// shares every untouched subtree with the previous version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigNode {
    pub name: String,
    pub enabled: bool,
    pub content_type: ContentType,
    pub string_contents: Vec<String>,
    pub nested_configs: Vec<Arc<ConfigNode>>,
    pub selection_mode: SelectionMode,
    pub select_count: u32,
    pub select_probability: f64,
    pub shuffle: bool,
    pub bracket_min: u8,
    pub bracket_max: u8,
    #[serde(skip)]
    pub cursor: SequenceCursor,
}

impl Default for ConfigNode {
    fn default() -> Self {
        Self::create("")
    }
}

/// Field overrides for [`ConfigNode::copy_with`]. Unset fields keep the
/// value of the node being copied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeOverrides {
    pub name: Option<String>,
    pub enabled: Option<bool>,
    pub content_type: Option<ContentType>,
    pub string_contents: Option<Vec<String>>,
    pub nested_configs: Option<Vec<Arc<ConfigNode>>>,
    pub selection_mode: Option<SelectionMode>,
    pub select_count: Option<u32>,
    pub select_probability: Option<f64>,
    pub shuffle: Option<bool>,
    pub bracket_min: Option<u8>,
    pub bracket_max: Option<u8>,
}

impl NodeOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    pub fn string_contents<S: AsRef<str>>(mut self, contents: &[S]) -> Self {
        self.string_contents = Some(contents.iter().map(|s| s.as_ref().to_string()).collect());
        self
    }

    pub fn nested_configs(mut self, children: Vec<Arc<ConfigNode>>) -> Self {
        self.nested_configs = Some(children);
        self
    }

    pub fn selection_mode(mut self, mode: SelectionMode) -> Self {
        self.selection_mode = Some(mode);
        self
    }

    pub fn select_count(mut self, count: u32) -> Self {
        self.select_count = Some(count);
        self
    }

    pub fn select_probability(mut self, probability: f64) -> Self {
        self.select_probability = Some(probability);
        self
    }

    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = Some(shuffle);
        self
    }

    pub fn bracket_min(mut self, depth: u8) -> Self {
        self.bracket_min = Some(depth);
        self
    }

    pub fn bracket_max(mut self, depth: u8) -> Self {
        self.bracket_max = Some(depth);
        self
    }
}

impl ConfigNode {
    /// Create a node with the editor defaults: enabled, `single_random`,
    /// probability 0.5, no emphasis and empty pools.
    pub fn create(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            enabled: true,
            content_type: ContentType::String,
            string_contents: Vec::new(),
            nested_configs: Vec::new(),
            selection_mode: SelectionMode::SingleRandom,
            select_count: SELECT_COUNT_MIN,
            select_probability: DEFAULT_PROBABILITY,
            shuffle: false,
            bracket_min: 0,
            bracket_max: 0,
            cursor: SequenceCursor::default(),
        }
    }

    /// A `string` node holding `fragments`.
    pub fn leaf<S: AsRef<str>>(name: impl Into<String>, fragments: &[S]) -> Self {
        Self::create(name).copy_with(
            NodeOverrides::new()
                .content_type(ContentType::String)
                .string_contents(fragments),
        )
    }

    /// A `nested` node holding `children`.
    pub fn group(name: impl Into<String>, children: Vec<ConfigNode>) -> Self {
        Self::create(name).copy_with(
            NodeOverrides::new()
                .content_type(ContentType::Nested)
                .nested_configs(children.into_iter().map(Arc::new).collect()),
        )
    }

    /// Return a copy of this node with `overrides` applied.
    ///
    /// Values are clamped the way the editor's controls clamp them: the name
    /// and fragments are trimmed (empty fragments dropped), `select_count` to
    /// 1..=10, `select_probability` to 0.1..=1.0 and bracket depths to 0..=5.
    /// Raising `bracket_min` above `bracket_max` drags the maximum up; lowering
    /// `bracket_max` below `bracket_min` drags the minimum down. When both are
    /// given the minimum is applied first.
    pub fn copy_with(&self, overrides: NodeOverrides) -> ConfigNode {
        let mut node = self.clone();

        if let Some(name) = overrides.name {
            node.name = name.trim().to_string();
        }
        if let Some(enabled) = overrides.enabled {
            node.enabled = enabled;
        }
        if let Some(content_type) = overrides.content_type {
            node.content_type = content_type;
        }
        if let Some(contents) = overrides.string_contents {
            node.string_contents = format_list(&contents);
        }
        if let Some(children) = overrides.nested_configs {
            node.nested_configs = children;
        }
        if let Some(mode) = overrides.selection_mode {
            node.selection_mode = mode;
        }
        if let Some(count) = overrides.select_count {
            node.select_count = clamp_count(count);
        }
        if let Some(probability) = overrides.select_probability {
            node.select_probability = clamp_probability(probability);
        }
        if let Some(shuffle) = overrides.shuffle {
            node.shuffle = shuffle;
        }
        if let Some(min) = overrides.bracket_min {
            node.bracket_min = min.min(MAX_DEPTH);
            if node.bracket_max < node.bracket_min {
                node.bracket_max = node.bracket_min;
            }
        }
        if let Some(max) = overrides.bracket_max {
            node.bracket_max = max.min(MAX_DEPTH);
            if node.bracket_min > node.bracket_max {
                node.bracket_min = node.bracket_max;
            }
        }

        node
    }

    /// Check the invariants of this node and, for `nested` nodes, of every
    /// child recursively. Stops at the first problem found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(e) = self.field_errors().into_iter().next() {
            return Err(e);
        }

        if self.content_type == ContentType::Nested {
            for (index, child) in self.nested_configs.iter().enumerate() {
                child.validate().map_err(|e| ValidationError::Child {
                    index,
                    source: Box::new(e),
                })?;
            }
        }
        Ok(())
    }

    /// Every invariant this node violates on its own, children not included.
    pub fn field_errors(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(ValidationError::EmptyName);
        }
        for value in [self.bracket_min, self.bracket_max] {
            if value > MAX_DEPTH {
                errors.push(ValidationError::BracketOutOfRange { value });
            }
        }
        if self.bracket_min > self.bracket_max {
            errors.push(ValidationError::BracketOrder {
                min: self.bracket_min,
                max: self.bracket_max,
            });
        }
        if !(SELECT_COUNT_MIN..=SELECT_COUNT_MAX).contains(&self.select_count) {
            errors.push(ValidationError::SelectCountOutOfRange {
                value: self.select_count,
            });
        }
        if !(PROBABILITY_MIN..=PROBABILITY_MAX).contains(&self.select_probability) {
            errors.push(ValidationError::ProbabilityOutOfRange {
                value: self.select_probability,
            });
        }

        errors
    }

    /// The candidate fragments of a `string` node: non-empty entries, trimmed.
    pub fn active_fragments(&self) -> impl Iterator<Item = &str> {
        self.string_contents
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    /// The candidate children of a `nested` node: enabled children only.
    pub fn active_children(&self) -> impl Iterator<Item = &ConfigNode> {
        self.nested_configs
            .iter()
            .map(|child| child.as_ref())
            .filter(|child| child.enabled)
    }

    /// Number of candidates the resolver would present to the selection
    /// policy for this node.
    pub fn pool_size(&self) -> usize {
        match self.content_type {
            ContentType::String => self.active_fragments().count(),
            ContentType::Nested => self.active_children().count(),
        }
    }

    /// Apply the edit-boundary clamping to every field of this subtree.
    /// Used for trees that did not come through `copy_with`, such as files.
    pub fn normalized(&self) -> ConfigNode {
        let children = self
            .nested_configs
            .iter()
            .map(|child| Arc::new(child.normalized()))
            .collect();
        self.copy_with(
            NodeOverrides::new()
                .name(self.name.clone())
                .string_contents(&self.string_contents)
                .nested_configs(children)
                .select_count(self.select_count)
                .select_probability(self.select_probability)
                .bracket_min(self.bracket_min)
                .bracket_max(self.bracket_max.max(self.bracket_min)),
        )
    }

    /// Load a tree from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<ConfigNode, LoadError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a tree from a RON string. The result is normalized.
    pub fn parse_ron(input: &str) -> Result<ConfigNode, LoadError> {
        let raw: ConfigNode = ron::from_str(input)?;
        Ok(raw.normalized())
    }

    /// Render this tree as pretty-printed RON.
    pub fn to_ron(&self) -> Result<String, LoadError> {
        let config = ron::ser::PrettyConfig::new().struct_names(true);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }
}

fn clamp_count(count: u32) -> u32 {
    count.clamp(SELECT_COUNT_MIN, SELECT_COUNT_MAX)
}

/// Clamp a probability to the accepted range. NaN maps to the lower bound.
pub fn clamp_probability(probability: f64) -> f64 {
    if probability.is_nan() {
        return PROBABILITY_MIN;
    }
    probability.clamp(PROBABILITY_MIN, PROBABILITY_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_assigns_defaults() {
        let node = ConfigNode::create("hair");
        assert_eq!(node.name, "hair");
        assert!(node.enabled);
        assert_eq!(node.content_type, ContentType::String);
        assert_eq!(node.selection_mode, SelectionMode::SingleRandom);
        assert_eq!(node.select_probability, 0.5);
        assert_eq!((node.bracket_min, node.bracket_max), (0, 0));
        assert!(node.string_contents.is_empty());
        assert!(node.nested_configs.is_empty());
    }

    #[test]
    fn copy_with_no_overrides_is_equal() {
        let node = ConfigNode::leaf("colors", &["red", "blue"]).copy_with(
            NodeOverrides::new()
                .selection_mode(SelectionMode::All)
                .shuffle(true)
                .bracket_max(3),
        );
        let copy = node.copy_with(NodeOverrides::new());
        assert_eq!(copy, node);
    }

    #[test]
    fn copy_with_leaves_original_untouched() {
        let node = ConfigNode::create("a");
        let renamed = node.copy_with(NodeOverrides::new().name("b"));
        assert_eq!(node.name, "a");
        assert_eq!(renamed.name, "b");
    }

    #[test]
    fn copy_with_trims_name_and_fragments() {
        let node = ConfigNode::create("x").copy_with(
            NodeOverrides::new()
                .name("  outfit  ")
                .string_contents(&[" hat ", "", "   ", "coat"]),
        );
        assert_eq!(node.name, "outfit");
        assert_eq!(node.string_contents, vec!["hat", "coat"]);
    }

    #[test]
    fn copy_with_clamps_numeric_fields() {
        let node = ConfigNode::create("x").copy_with(
            NodeOverrides::new()
                .select_count(0)
                .select_probability(3.0),
        );
        assert_eq!(node.select_count, 1);
        assert_eq!(node.select_probability, 1.0);

        let node = node.copy_with(
            NodeOverrides::new()
                .select_count(99)
                .select_probability(0.0),
        );
        assert_eq!(node.select_count, 10);
        assert_eq!(node.select_probability, 0.1);

        let node = node.copy_with(NodeOverrides::new().select_probability(f64::NAN));
        assert_eq!(node.select_probability, 0.1);
    }

    #[test]
    fn raising_bracket_min_drags_max() {
        let node = ConfigNode::create("x").copy_with(NodeOverrides::new().bracket_min(3));
        assert_eq!((node.bracket_min, node.bracket_max), (3, 3));
    }

    #[test]
    fn lowering_bracket_max_drags_min() {
        let node = ConfigNode::create("x").copy_with(
            NodeOverrides::new().bracket_min(4).bracket_max(4),
        );
        let node = node.copy_with(NodeOverrides::new().bracket_max(1));
        assert_eq!((node.bracket_min, node.bracket_max), (1, 1));
    }

    #[test]
    fn bracket_depth_capped_at_five() {
        let node = ConfigNode::create("x").copy_with(NodeOverrides::new().bracket_max(9));
        assert_eq!(node.bracket_max, 5);
        assert_eq!(node.bracket_min, 0);
    }

    #[test]
    fn validate_rejects_empty_name() {
        let node = ConfigNode::create("   ");
        assert_eq!(node.validate(), Err(ValidationError::EmptyName));
    }

    #[test]
    fn validate_rejects_inverted_brackets() {
        let mut node = ConfigNode::create("x");
        node.bracket_min = 3;
        node.bracket_max = 1;
        assert_eq!(
            node.validate(),
            Err(ValidationError::BracketOrder { min: 3, max: 1 })
        );
    }

    #[test]
    fn validate_reports_child_index() {
        let mut bad = ConfigNode::create("bad");
        bad.select_count = 0;
        let root = ConfigNode::group("root", vec![ConfigNode::create("ok"), bad]);
        match root.validate() {
            Err(ValidationError::Child { index, source }) => {
                assert_eq!(index, 1);
                assert_eq!(*source, ValidationError::SelectCountOutOfRange { value: 0 });
            }
            other => panic!("expected child error, got {:?}", other),
        }
    }

    #[test]
    fn pool_size_counts_enabled_children_only() {
        let disabled = ConfigNode::leaf("a", &["x"])
            .copy_with(NodeOverrides::new().enabled(false));
        let root = ConfigNode::group("root", vec![disabled, ConfigNode::leaf("b", &["y"])]);
        assert_eq!(root.pool_size(), 1);
    }

    #[test]
    fn pool_size_follows_content_type() {
        let node = ConfigNode::leaf("x", &["a", "b"]).copy_with(
            NodeOverrides::new().content_type(ContentType::Nested),
        );
        assert_eq!(node.pool_size(), 0);
    }

    #[test]
    fn sequence_cursor_wraps() {
        let cursor = SequenceCursor::default();
        let picks: Vec<usize> = (0..4).map(|_| cursor.advance(3)).collect();
        assert_eq!(picks, vec![0, 1, 2, 0]);
        cursor.reset();
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn sequence_cursor_empty_pool_does_not_move() {
        let cursor = SequenceCursor::default();
        cursor.advance(3);
        assert_eq!(cursor.advance(0), 0);
        assert_eq!(cursor.position(), 1);
        assert_eq!(cursor.advance(3), 1);
    }

    #[test]
    fn field_errors_reports_every_problem() {
        let mut node = ConfigNode::create("");
        node.select_count = 0;
        node.bracket_min = 9;
        let errors = node.field_errors();
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyName,
                ValidationError::BracketOutOfRange { value: 9 },
                ValidationError::BracketOrder { min: 9, max: 0 },
                ValidationError::SelectCountOutOfRange { value: 0 },
            ]
        );
        assert_eq!(node.validate(), Err(ValidationError::EmptyName));
    }

    #[test]
    fn field_errors_ignores_children() {
        let root = ConfigNode::group("root", vec![ConfigNode::create("")]);
        assert!(root.field_errors().is_empty());
        assert!(root.validate().is_err());
    }

    #[test]
    fn sequence_cursor_survives_pool_shrink() {
        let cursor = SequenceCursor::default();
        for _ in 0..4 {
            cursor.advance(5);
        }
        assert_eq!(cursor.advance(2), 0);
        assert_eq!(cursor.advance(2), 1);
    }

    #[test]
    fn parse_ron_normalizes() {
        let input = r#"(
            name: " root ",
            content_type: nested,
            selection_mode: all,
            nested_configs: [
                (
                    name: "colors",
                    string_contents: ["red", " ", "blue "],
                    select_probability: 7.0,
                    bracket_min: 4,
                    bracket_max: 2,
                ),
            ],
        )"#;
        let root = ConfigNode::parse_ron(input).unwrap();
        assert_eq!(root.name, "root");
        assert_eq!(root.selection_mode, SelectionMode::All);
        let colors = &root.nested_configs[0];
        assert_eq!(colors.string_contents, vec!["red", "blue"]);
        assert_eq!(colors.select_probability, 1.0);
        assert_eq!((colors.bracket_min, colors.bracket_max), (4, 4));
        assert!(root.validate().is_ok());
    }

    #[test]
    fn ron_round_trip() {
        let root = ConfigNode::group(
            "root",
            vec![ConfigNode::leaf("colors", &["red", "blue"])
                .copy_with(NodeOverrides::new().bracket_max(2))],
        );
        let text = root.to_ron().unwrap();
        let parsed = ConfigNode::parse_ron(&text).unwrap();
        assert_eq!(parsed, root);
    }

    #[test]
    fn mode_names_are_snake_case() {
        for mode in SelectionMode::ALL_MODES {
            let text = ron::to_string(&mode).unwrap();
            assert_eq!(text, mode.name());
        }
    }
}
