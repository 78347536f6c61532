use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const NPGATE_DIR: &str = ".npgate";
pub const DRAFTS_DIR: &str = ".npgate/drafts";
pub const PUBLISHED_DIR: &str = ".npgate/published";
pub const AUDITS_DIR: &str = ".npgate/audits";

pub const CONFIG_FILE: &str = ".npgate/config.yaml";

pub const DOCUMENT_EXT: &str = "yaml";
pub const VERDICT_SUFFIX: &str = ".verdict.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn drafts_dir(root: &Path) -> PathBuf {
    root.join(DRAFTS_DIR)
}

pub fn published_dir(root: &Path) -> PathBuf {
    root.join(PUBLISHED_DIR)
}

pub fn audits_dir(root: &Path) -> PathBuf {
    root.join(AUDITS_DIR)
}

pub fn draft_path(root: &Path, slug: &str) -> PathBuf {
    drafts_dir(root).join(format!("{slug}.{DOCUMENT_EXT}"))
}

pub fn draft_verdict_path(root: &Path, slug: &str) -> PathBuf {
    drafts_dir(root).join(format!("{slug}{VERDICT_SUFFIX}"))
}

pub fn published_path(root: &Path, slug: &str) -> PathBuf {
    published_dir(root).join(format!("{slug}.{DOCUMENT_EXT}"))
}

/// Slugs become file names; reject anything that could escape the target
/// directory.
pub fn is_safe_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}
