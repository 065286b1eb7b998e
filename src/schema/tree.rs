//! Path-addressed edits on a configuration tree.
//!
//! Every edit returns a new root. Only the nodes along the edited path are
//! copied; all other subtrees are shared with the previous tree via `Arc`.
//!
//! A shared subtree keeps one `SequenceCursor` per node, so resolving either
//! version advances `single_sequential` nodes in both. Nodes on the rebuilt
//! path get their own copy of the cursor at its current position. Call
//! `reset_cursors` on the new root when the versions must start apart.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use super::node::ConfigNode;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("the root cannot be addressed as a child")]
    EmptyPath,
    #[error("no node at path {path}")]
    InvalidPath { path: NodePath },
    #[error("index {index} out of range for {len} children")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Child indices leading from the root to a node. The empty path is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// The path of this node's child at `index`.
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// The parent path and the last index, or `None` for the root.
    pub fn split_last(&self) -> Option<(NodePath, usize)> {
        let (&last, parent) = self.0.split_last()?;
        Some((NodePath(parent.to_vec()), last))
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for index in &self.0 {
            write!(f, "/{}", index)?;
        }
        Ok(())
    }
}

/// The node at `path`.
pub fn get<'a>(root: &'a ConfigNode, path: &NodePath) -> Result<&'a ConfigNode, TreeError> {
    let mut node = root;
    for &index in path.indices() {
        node = node
            .nested_configs
            .get(index)
            .map(|child| child.as_ref())
            .ok_or_else(|| TreeError::InvalidPath { path: path.clone() })?;
    }
    Ok(node)
}

/// Replace the node at `path` with `new_child`.
///
/// Untouched siblings stay shared with `root`, sequential cursors included.
pub fn edit_child(
    root: &ConfigNode,
    path: &NodePath,
    new_child: ConfigNode,
) -> Result<ConfigNode, TreeError> {
    let (parent, index) = path.split_last().ok_or(TreeError::EmptyPath)?;
    let (tree, ()) = with_children_at(root, parent.indices(), path, |children| {
        let slot = children
            .get_mut(index)
            .ok_or_else(|| TreeError::InvalidPath { path: path.clone() })?;
        *slot = Arc::new(new_child);
        Ok(())
    })?;
    Ok(tree)
}

/// Insert `child` into the children of the node at `parent`, at `index`
/// or at the end when `index` is `None`.
pub fn insert_child(
    root: &ConfigNode,
    parent: &NodePath,
    index: Option<usize>,
    child: ConfigNode,
) -> Result<ConfigNode, TreeError> {
    let (tree, ()) = with_children_at(root, parent.indices(), parent, |children| {
        let len = children.len();
        let index = index.unwrap_or(len);
        if index > len {
            return Err(TreeError::IndexOutOfRange { index, len });
        }
        children.insert(index, Arc::new(child));
        Ok(())
    })?;
    Ok(tree)
}

/// Remove the node at `path`, returning the new tree and the removed node.
pub fn remove_child(
    root: &ConfigNode,
    path: &NodePath,
) -> Result<(ConfigNode, Arc<ConfigNode>), TreeError> {
    let (parent, index) = path.split_last().ok_or(TreeError::EmptyPath)?;
    with_children_at(root, parent.indices(), path, |children| {
        if index >= children.len() {
            return Err(TreeError::InvalidPath { path: path.clone() });
        }
        Ok(children.remove(index))
    })
}

/// Move a child of the node at `parent` from position `from` to `to`.
pub fn move_child(
    root: &ConfigNode,
    parent: &NodePath,
    from: usize,
    to: usize,
) -> Result<ConfigNode, TreeError> {
    let (tree, ()) = with_children_at(root, parent.indices(), parent, |children| {
        let len = children.len();
        for index in [from, to] {
            if index >= len {
                return Err(TreeError::IndexOutOfRange { index, len });
            }
        }
        let child = children.remove(from);
        children.insert(to, child);
        Ok(())
    })?;
    Ok(tree)
}

/// Copy the spine down to the node at `path`, run `edit` on that node's
/// children, and rebuild the spine around the result.
fn with_children_at<T, F>(
    node: &ConfigNode,
    path: &[usize],
    full_path: &NodePath,
    edit: F,
) -> Result<(ConfigNode, T), TreeError>
where
    F: FnOnce(&mut Vec<Arc<ConfigNode>>) -> Result<T, TreeError>,
{
    let mut copy = node.clone();
    match path.split_first() {
        None => {
            let out = edit(&mut copy.nested_configs)?;
            Ok((copy, out))
        }
        Some((&index, rest)) => {
            let child = copy
                .nested_configs
                .get(index)
                .ok_or_else(|| TreeError::InvalidPath {
                    path: full_path.clone(),
                })?;
            let (new_child, out) = with_children_at(child, rest, full_path, edit)?;
            copy.nested_configs[index] = Arc::new(new_child);
            Ok((copy, out))
        }
    }
}
