use crate::document::ArticleDocument;
use crate::error::{GateError, Result};
use crate::io;
use crate::paths;
use crate::taxonomy::TaxonomyStore;
use crate::validator::{ValidationVerdict, Validator};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

/// The publish side effect the gate stands in front of. Implementations talk
/// to whatever CMS the caller owns.
pub trait Publisher {
    fn publish(&mut self, doc: &ArticleDocument) -> Result<()>;

    /// Retain a document that failed the gate for manual correction.
    fn save_draft(&mut self, doc: &ArticleDocument, verdict: &ValidationVerdict) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Disposition / GateOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Published,
    Draft,
}

impl Disposition {
    pub fn as_str(self) -> &'static str {
        match self {
            Disposition::Published => "published",
            Disposition::Draft => "draft",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateOutcome {
    pub slug: String,
    pub disposition: Disposition,
    pub verdict: ValidationVerdict,
}

// ---------------------------------------------------------------------------
// PublicationGate
// ---------------------------------------------------------------------------

/// Runs the validator before a publish action and fails closed: anything
/// other than a passing verdict keeps the article in draft.
pub struct PublicationGate<'a> {
    validator: Validator,
    taxonomy: &'a TaxonomyStore,
    strict: bool,
}

impl<'a> PublicationGate<'a> {
    pub fn new(validator: Validator, taxonomy: &'a TaxonomyStore) -> Self {
        Self {
            validator,
            taxonomy,
            strict: false,
        }
    }

    /// In strict mode warnings block publication too.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn check_before_publish(&self, doc: &ArticleDocument) -> ValidationVerdict {
        match self.validator.validate(doc, self.taxonomy) {
            Ok(verdict) if self.strict => verdict.into_strict(),
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::error!(slug = %doc.slug, error = %e, "document could not be validated");
                ValidationVerdict::invalid_document(e.to_string())
            }
        }
    }

    /// Check `doc` and hand it to `publisher`: published on pass, saved as a
    /// draft otherwise. The publisher's own errors are returned as-is.
    pub fn submit<P: Publisher + ?Sized>(
        &self,
        doc: &ArticleDocument,
        publisher: &mut P,
    ) -> Result<GateOutcome> {
        let verdict = self.check_before_publish(doc);
        let disposition = if verdict.passed {
            publisher.publish(doc)?;
            tracing::info!(slug = %doc.slug, "published");
            Disposition::Published
        } else {
            publisher.save_draft(doc, &verdict)?;
            tracing::warn!(
                slug = %doc.slug,
                violations = verdict.violations.len(),
                "publication blocked, kept as draft"
            );
            Disposition::Draft
        };
        Ok(GateOutcome {
            slug: doc.slug.clone(),
            disposition,
            verdict,
        })
    }
}

// ---------------------------------------------------------------------------
// FsPublisher
// ---------------------------------------------------------------------------

/// Publisher backed by the project directory: published documents land in
/// `.npgate/published/`, drafts and their verdicts in `.npgate/drafts/`.
#[derive(Debug, Clone)]
pub struct FsPublisher {
    root: PathBuf,
}

impl FsPublisher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn checked_slug<'d>(&self, doc: &'d ArticleDocument) -> Result<&'d str> {
        if paths::is_safe_slug(&doc.slug) {
            Ok(&doc.slug)
        } else {
            Err(GateError::InvalidDocument(format!(
                "slug '{}' cannot be used as a file name",
                doc.slug
            )))
        }
    }
}

impl Publisher for FsPublisher {
    fn publish(&mut self, doc: &ArticleDocument) -> Result<()> {
        let slug = self.checked_slug(doc)?;
        let data = serde_yaml::to_string(doc)?;
        io::atomic_write(&paths::published_path(&self.root, slug), data.as_bytes())?;
        io::remove_if_exists(&paths::draft_path(&self.root, slug))?;
        io::remove_if_exists(&paths::draft_verdict_path(&self.root, slug))?;
        Ok(())
    }

    fn save_draft(&mut self, doc: &ArticleDocument, verdict: &ValidationVerdict) -> Result<()> {
        let slug = self.checked_slug(doc)?;
        let data = serde_yaml::to_string(doc)?;
        io::atomic_write(&paths::draft_path(&self.root, slug), data.as_bytes())?;
        let verdict_data = serde_yaml::to_string(verdict)?;
        io::atomic_write(
            &paths::draft_verdict_path(&self.root, slug),
            verdict_data.as_bytes(),
        )?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
