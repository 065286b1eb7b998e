//! The generation engine: a root tree plus seed and output options.
//!
//! Wraps the resolver with a reproducible seed schedule, joins fragments
//! into a prompt string, and loads trees and options from RON files.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::resolver::{reset_cursors, resolve};
use crate::schema::node::{ConfigNode, LoadError, ValidationError};

/// Separator used when joining fragments, unless configured otherwise.
pub const DEFAULT_SEPARATOR: &str = ", ";

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("tree load error: {0}")]
    Load(#[from] LoadError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid configuration tree: {0}")]
    Validation(#[from] ValidationError),
    #[error("no configuration tree was provided")]
    MissingTree,
}

/// Output options, loadable from a RON file such as
/// `(separator: " | ", seed: Some(7))`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    pub separator: String,
    pub seed: Option<u64>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            seed: None,
        }
    }
}

impl GenerationOptions {
    pub fn load_from_ron(path: &Path) -> Result<GenerationOptions, EngineError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<GenerationOptions, EngineError> {
        Ok(ron::from_str(input)?)
    }
}

/// Holds a finished tree and generates prompts from it. Built via
/// `PromptEngine::builder()`.
pub struct PromptEngine {
    tree: ConfigNode,
    separator: String,
    seed: u64,
    generation_count: u64,
}

/// Builder for constructing a `PromptEngine`.
pub struct PromptEngineBuilder {
    tree_path: Option<String>,
    options_path: Option<String>,
    strict: bool,
    /// Directly provided tree (for callers that built it in memory).
    tree: Option<ConfigNode>,
    /// Overrides the separator from the options file.
    separator: Option<String>,
    /// Overrides the seed from the options file.
    seed: Option<u64>,
}

impl PromptEngine {
    pub fn builder() -> PromptEngineBuilder {
        PromptEngineBuilder {
            tree_path: None,
            options_path: None,
            strict: false,
            tree: None,
            separator: None,
            seed: None,
        }
    }

    /// Resolve the tree once and return the fragments.
    ///
    /// Each call uses the next seed in the engine's schedule, so two engines
    /// built with the same seed produce the same sequence of prompts.
    pub fn generate_fragments(&mut self) -> Vec<String> {
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(self.generation_count));
        self.generation_count += 1;
        resolve(&self.tree, &mut rng)
    }

    /// Resolve the tree once and join the fragments with the separator.
    pub fn generate(&mut self) -> String {
        self.generate_fragments().join(&self.separator)
    }

    /// Generate `count` prompts in a row.
    pub fn generate_variants(&mut self, count: usize) -> Vec<String> {
        (0..count).map(|_| self.generate()).collect()
    }

    pub fn tree(&self) -> &ConfigNode {
        &self.tree
    }

    /// Swap in an edited tree. The seed schedule continues where it was.
    pub fn replace_tree(&mut self, tree: ConfigNode) {
        debug!(node = %tree.name, "replacing engine tree");
        self.tree = tree;
    }

    /// Rewind the seed schedule and every sequential cursor in the tree.
    pub fn reset(&mut self) {
        self.generation_count = 0;
        reset_cursors(&self.tree);
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }
}

impl PromptEngineBuilder {
    pub fn tree_path(mut self, path: &str) -> Self {
        self.tree_path = Some(path.to_string());
        self
    }

    pub fn options_path(mut self, path: &str) -> Self {
        self.options_path = Some(path.to_string());
        self
    }

    /// Fail `build()` when the tree does not validate, instead of logging a
    /// warning and resolving it anyway.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Provide the tree directly.
    pub fn with_tree(mut self, tree: ConfigNode) -> Self {
        self.tree = Some(tree);
        self
    }

    pub fn separator(mut self, separator: &str) -> Self {
        self.separator = Some(separator.to_string());
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<PromptEngine, EngineError> {
        let options = match self.options_path {
            Some(ref path) => GenerationOptions::load_from_ron(Path::new(path))?,
            None => GenerationOptions::default(),
        };

        // A file tree takes precedence over a directly provided one
        let tree = match self.tree_path {
            Some(ref path) => ConfigNode::load_from_ron(Path::new(path))?,
            None => self.tree.ok_or(EngineError::MissingTree)?,
        };

        if let Err(e) = tree.validate() {
            if self.strict {
                return Err(EngineError::Validation(e));
            }
            warn!(node = %tree.name, error = %e, "configuration tree failed validation");
        }

        let seed = self
            .seed
            .or(options.seed)
            .unwrap_or_else(rand::random::<u64>);
        let separator = self.separator.unwrap_or(options.separator);
        debug!(node = %tree.name, seed, "built prompt engine");

        Ok(PromptEngine {
            tree,
            separator,
            seed,
            generation_count: 0,
        })
    }
}
