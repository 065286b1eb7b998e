//! Prompt Weaver — weighted, randomized prompt generation.
//!
//! A prompt is described by a tree of configuration nodes. Leaf nodes hold
//! pools of literal fragments, group nodes hold child nodes, and every node
//! carries a selection mode and an emphasis range. Resolving the tree picks
//! fragments according to each node's policy, wraps them in `{}` emphasis
//! brackets, and flattens everything into an ordered list of tags.

pub mod core;
pub mod schema;
