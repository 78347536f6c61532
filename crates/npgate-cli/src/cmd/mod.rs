pub mod audit;
pub mod check;
pub mod config;
pub mod init;
pub mod publish;
pub mod taxonomy;

use anyhow::Context;
use npgate_core::config::Config;
use npgate_core::taxonomy::TaxonomyStore;
use std::path::PathBuf;

/// `check` and `publish` exit with this when the draft was rejected.
pub const EXIT_VIOLATIONS: i32 = 1;
/// `check` and `publish` exit with this when the input could not be evaluated.
pub const EXIT_INVALID_INPUT: i32 = 2;

/// Global flags shared by every subcommand.
pub struct Invocation {
    pub root: PathBuf,
    pub taxonomy: Option<PathBuf>,
    pub json: bool,
}

impl Invocation {
    pub fn config(&self) -> anyhow::Result<Config> {
        Config::load_or_default(&self.root).context("failed to load config")
    }

    pub fn taxonomy_path(&self, config: &Config) -> PathBuf {
        match &self.taxonomy {
            Some(p) => p.clone(),
            None => config.taxonomy_path(&self.root),
        }
    }

    pub fn load_taxonomy(&self, config: &Config) -> anyhow::Result<TaxonomyStore> {
        let path = self.taxonomy_path(config);
        TaxonomyStore::load(&path)
            .with_context(|| format!("failed to load taxonomy {}", path.display()))
    }
}
