//! Resolution runtime: bracket weighting, content list utilities,
//! selection policies, the recursive resolver and the generation engine.

pub mod brackets;
pub mod content;
pub mod engine;
pub mod resolver;
pub mod selection;
