//! Configuration data model: nodes, edit drafts and path-addressed tree edits.

pub mod draft;
pub mod node;
pub mod tree;
