//! Edit drafts — the uncommitted state of a node being edited.
//!
//! An editor opens a draft from a committed node, mutates it freely, and
//! either commits it (validated, producing a new node) or discards it.
//! The committed node is never touched in between.

use std::sync::Arc;

use super::node::{ConfigNode, ContentType, NodeOverrides, SelectionMode, ValidationError};
use super::tree::{self, NodePath, TreeError};
use crate::core::brackets;
use crate::core::content::{dedupe_list, format_list, parse_list, sort_list};

#[derive(Debug, Clone)]
pub struct NodeDraft {
    original: ConfigNode,
    working: ConfigNode,
    /// Raw name text; trimmed only on commit so typing is not disturbed.
    name: String,
}

impl NodeDraft {
    pub fn from_node(node: &ConfigNode) -> Self {
        Self {
            original: node.clone(),
            working: node.clone(),
            name: node.name.clone(),
        }
    }

    /// A draft for a brand-new node with the default settings.
    pub fn new_node(name: &str) -> Self {
        let mut draft = Self::from_node(&ConfigNode::create(name));
        draft.name = name.to_string();
        draft
    }

    /// The node this draft would commit to, without validation.
    pub fn preview_node(&self) -> ConfigNode {
        self.working
            .copy_with(NodeOverrides::new().name(self.name.clone()))
    }

    /// Whether committing would change anything.
    pub fn is_dirty(&self) -> bool {
        self.preview_node() != self.original
    }

    /// Validate and return the edited node. The draft is consumed.
    pub fn commit(self) -> Result<ConfigNode, ValidationError> {
        let node = self.preview_node();
        node.validate()?;
        Ok(node)
    }

    /// Drop every change and hand back the node the draft was opened from.
    pub fn discard(self) -> ConfigNode {
        self.original
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.apply(NodeOverrides::new().enabled(enabled));
    }

    pub fn set_content_type(&mut self, content_type: ContentType) {
        self.apply(NodeOverrides::new().content_type(content_type));
    }

    pub fn set_selection_mode(&mut self, mode: SelectionMode) {
        self.apply(NodeOverrides::new().selection_mode(mode));
    }

    pub fn set_select_count(&mut self, count: u32) {
        self.apply(NodeOverrides::new().select_count(count));
    }

    pub fn set_select_probability(&mut self, probability: f64) {
        self.apply(NodeOverrides::new().select_probability(probability));
    }

    pub fn set_shuffle(&mut self, shuffle: bool) {
        self.apply(NodeOverrides::new().shuffle(shuffle));
    }

    pub fn set_bracket_min(&mut self, depth: u8) {
        self.apply(NodeOverrides::new().bracket_min(depth));
    }

    pub fn set_bracket_max(&mut self, depth: u8) {
        self.apply(NodeOverrides::new().bracket_max(depth));
    }

    /// The bracket range rendered on a placeholder tag.
    pub fn bracket_preview(&self, separator: &str) -> String {
        brackets::preview(self.working.bracket_min, self.working.bracket_max, separator)
    }

    /// Fragments as editable text, one per line.
    pub fn contents_text(&self) -> String {
        self.working.string_contents.join("\n")
    }

    /// Replace the fragments from free text (lines and commas separate).
    pub fn set_contents_text(&mut self, text: &str) {
        self.working.string_contents = parse_list(text);
    }

    pub fn add_fragment(&mut self, fragment: &str) {
        self.working
            .string_contents
            .extend(format_list(&[fragment]));
    }

    pub fn remove_fragment(&mut self, index: usize) -> Option<String> {
        if index < self.working.string_contents.len() {
            Some(self.working.string_contents.remove(index))
        } else {
            None
        }
    }

    pub fn sort_contents(&mut self) {
        self.working.string_contents = sort_list(&self.working.string_contents);
    }

    pub fn dedupe_contents(&mut self) {
        self.working.string_contents = dedupe_list(&self.working.string_contents);
    }

    pub fn children(&self) -> &[Arc<ConfigNode>] {
        &self.working.nested_configs
    }

    pub fn push_child(&mut self, child: ConfigNode) {
        self.working.nested_configs.push(Arc::new(child));
    }

    /// Put back a child returned from its own editor.
    pub fn replace_child(&mut self, index: usize, child: ConfigNode) -> Result<(), TreeError> {
        self.working = tree::edit_child(&self.working, &NodePath::root().child(index), child)?;
        Ok(())
    }

    pub fn remove_child(&mut self, index: usize) -> Result<Arc<ConfigNode>, TreeError> {
        let (node, removed) = tree::remove_child(&self.working, &NodePath::root().child(index))?;
        self.working = node;
        Ok(removed)
    }

    pub fn move_child(&mut self, from: usize, to: usize) -> Result<(), TreeError> {
        self.working = tree::move_child(&self.working, &NodePath::root(), from, to)?;
        Ok(())
    }

    /// Open a draft for the child at `index`, for recursive editing.
    pub fn edit_child(&self, index: usize) -> Result<NodeDraft, TreeError> {
        let child = tree::get(&self.working, &NodePath::root().child(index))?;
        Ok(NodeDraft::from_node(child))
    }

    fn apply(&mut self, overrides: NodeOverrides) {
        self.working = self.working.copy_with(overrides);
    }
}
