//! Tree construction configuration with builder pattern.
//!
//! # Example
//!
//! ```
//! use arbor::config::TreeConfig;
//! use arbor::Tree;
//!
//! let config = TreeConfig::builder().max_leaves(63).build().unwrap();
//! let tree = Tree::from_config(&config);
//! assert_eq!(tree.max_leaves(), 63);
//! ```

use std::num::NonZeroUsize;

use bon::Builder;

use crate::repr::Tree;
use crate::utils::Parallelism;

// =============================================================================
// ConfigError
// =============================================================================

/// Errors that can occur during configuration validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A tree needs room for at least its root leaf.
    #[error("max_leaves must be at least 1, got {0}")]
    InvalidMaxLeaves(usize),
}

// =============================================================================
// TreeConfig
// =============================================================================

/// Capacity and threading for a single tree.
#[derive(Debug, Clone, Builder)]
#[builder(derive(Clone, Debug), finish_fn(vis = "", name = __build_internal))]
pub struct TreeConfig {
    /// Maximum number of leaves. Default: 31.
    #[builder(default = 31)]
    pub max_leaves: usize,

    /// Number of threads used for scoring. `None` uses the global pool.
    pub n_threads: Option<NonZeroUsize>,
}

impl<S: tree_config_builder::IsComplete> TreeConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidMaxLeaves`] if `max_leaves == 0`.
    pub fn build(self) -> Result<TreeConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl TreeConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_leaves == 0 {
            return Err(ConfigError::InvalidMaxLeaves(self.max_leaves));
        }
        Ok(())
    }

    /// Thread count in [`crate::run_with_threads`] form (0 = auto).
    pub fn thread_count(&self) -> usize {
        self.n_threads.map_or(0, NonZeroUsize::get)
    }

    /// Parallelism implied by `n_threads` in the current pool.
    pub fn parallelism(&self) -> Parallelism {
        Parallelism::from_threads(self.thread_count())
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_leaves: 31,
            n_threads: None,
        }
    }
}

impl Tree {
    /// Create an unsplit tree sized by `config`.
    pub fn from_config(config: &TreeConfig) -> Self {
        Tree::new(config.max_leaves)
    }
}
