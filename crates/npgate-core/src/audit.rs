use crate::document::ArticleDocument;
use crate::error::{GateError, Result};
use crate::paths;
use crate::taxonomy::TaxonomyStore;
use crate::validator::{Grade, Validator, Violation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// CorpusSource
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum EntryContent {
    Document(ArticleDocument),
    /// Not subject to audit (e.g. an unpublished CMS post).
    Skipped(String),
    /// Fetching or translating this article failed.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct CorpusEntry {
    pub id: String,
    pub title: Option<String>,
    pub content: EntryContent,
}

/// A collection of already-published articles. Failing to enumerate the
/// corpus is an error; a failure for one article is carried in its entry.
pub trait CorpusSource {
    fn describe(&self) -> String;
    fn entries(&self) -> Result<Vec<CorpusEntry>>;
}

// ---------------------------------------------------------------------------
// DirectorySource
// ---------------------------------------------------------------------------

/// Every draft file (`.yaml`, `.yml`, `.json`) directly inside a directory,
/// in file-name order. Gate verdict files are ignored. Entries are keyed by
/// slug; a file repeating an earlier slug becomes an entry error keyed by
/// its file name.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn is_document(path: &Path) -> bool {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if name.ends_with(paths::VERDICT_SUFFIX) {
            return false;
        }
        matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml") | Some("json")
        )
    }
}

impl CorpusSource for DirectorySource {
    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    fn entries(&self) -> Result<Vec<CorpusEntry>> {
        let listing = std::fs::read_dir(&self.dir).map_err(|e| {
            GateError::Corpus(format!("cannot read {}: {e}", self.dir.display()))
        })?;
        let mut files: Vec<PathBuf> = listing
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && Self::is_document(p))
            .collect();
        files.sort();

        // slug -> file that claimed it first
        let mut owners: HashMap<String, String> = HashMap::new();
        Ok(files
            .into_iter()
            .map(|path| {
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                match ArticleDocument::load(&path) {
                    Ok(doc) => match owners.get(&doc.slug) {
                        Some(first) => CorpusEntry {
                            content: EntryContent::Failed(format!(
                                "slug '{}' is already used by {first}",
                                doc.slug
                            )),
                            id: file_name,
                            title: Some(doc.title),
                        },
                        None => {
                            owners.insert(doc.slug.clone(), file_name);
                            CorpusEntry {
                                id: doc.slug.clone(),
                                title: Some(doc.title.clone()),
                                content: EntryContent::Document(doc),
                            }
                        }
                    },
                    Err(e) => CorpusEntry {
                        id: file_name,
                        title: None,
                        content: EntryContent::Failed(e.to_string()),
                    },
                }
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// AuditReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub title: String,
    pub violations: Vec<Violation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Violation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditError {
    pub id: String,
    pub message: String,
}

/// How much of a report the text rendering shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Detail {
    /// Failures with their violations, and entry errors.
    #[default]
    Failures,
    /// Also warnings on failures, and the articles that only warned.
    Warnings,
    /// Also the articles that passed cleanly.
    All,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub generated_at: DateTime<Utc>,
    pub source: String,
    /// Articles that were validated (excludes skipped and errored ones).
    pub checked: usize,
    pub passed: usize,
    /// Ids of the articles that passed without warnings.
    #[serde(default)]
    pub passed_ids: Vec<String>,
    pub skipped: usize,
    /// One entry per article that failed validation.
    pub failures: Vec<AuditEntry>,
    /// Articles that passed with warnings only.
    #[serde(default)]
    pub warned: Vec<AuditEntry>,
    /// Articles that could not be fetched, translated or validated.
    #[serde(default)]
    pub errors: Vec<AuditError>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.errors.is_empty()
    }

    pub fn render_text(&self, detail: Detail) -> String {
        let mut out = String::new();
        let rule = "=".repeat(60);
        let _ = writeln!(out, "Audit of {} at {}", self.source, self.generated_at.to_rfc3339());
        let _ = writeln!(
            out,
            "checked: {} | pass: {} | warn: {} | fail: {} | errors: {} | skipped: {}",
            self.checked,
            self.passed,
            self.warned.len(),
            self.failures.len(),
            self.errors.len(),
            self.skipped
        );
        let _ = writeln!(out, "{rule}");

        for (i, entry) in self.failures.iter().enumerate() {
            let _ = writeln!(out, "\n[{}] {}", i + 1, entry.title);
            let _ = writeln!(out, "    id: {}", entry.id);
            for v in &entry.violations {
                let _ = writeln!(out, "    - {v}");
            }
            if detail != Detail::Failures {
                for w in &entry.warnings {
                    let _ = writeln!(out, "    ~ warning {w}");
                }
            }
        }

        if detail != Detail::Failures && !self.warned.is_empty() {
            let _ = writeln!(out, "\nWarnings:");
            for entry in &self.warned {
                let _ = writeln!(out, "    {} ({})", entry.title, entry.id);
                for w in &entry.warnings {
                    let _ = writeln!(out, "        ~ {w}");
                }
            }
        }

        if detail == Detail::All && !self.passed_ids.is_empty() {
            let _ = writeln!(out, "\nPassed:");
            for id in &self.passed_ids {
                let _ = writeln!(out, "    {id}");
            }
        }

        if !self.errors.is_empty() {
            let _ = writeln!(out, "\nErrors:");
            for e in &self.errors {
                let _ = writeln!(out, "    {}: {}", e.id, e.message);
            }
        }

        let _ = writeln!(out, "\n{rule}");
        if self.is_clean() {
            let _ = writeln!(out, "All checked articles conform.");
        } else {
            let _ = writeln!(
                out,
                "{} article(s) need fixes, {} could not be checked.",
                self.failures.len(),
                self.errors.len()
            );
        }
        out
    }
}

// ---------------------------------------------------------------------------
// AuditReporter
// ---------------------------------------------------------------------------

/// Batch counterpart of the publication gate. Advisory only: it never
/// blocks anything and never stops on a single bad article.
pub struct AuditReporter<'a> {
    validator: Validator,
    taxonomy: &'a TaxonomyStore,
    only: Option<String>,
}

impl<'a> AuditReporter<'a> {
    pub fn new(validator: Validator, taxonomy: &'a TaxonomyStore) -> Self {
        Self {
            validator,
            taxonomy,
            only: None,
        }
    }

    /// Audit just the entry with this id. Running fails when the source
    /// has no such entry.
    pub fn only(mut self, id: impl Into<String>) -> Self {
        self.only = Some(id.into());
        self
    }

    pub fn run(&self, source: &dyn CorpusSource) -> Result<AuditReport> {
        let mut entries = source.entries()?;
        if let Some(id) = &self.only {
            entries.retain(|e| &e.id == id);
            if entries.is_empty() {
                return Err(GateError::Corpus(format!(
                    "no article '{id}' in {}",
                    source.describe()
                )));
            }
        }
        tracing::info!(source = %source.describe(), articles = entries.len(), "auditing corpus");

        let mut report = AuditReport {
            generated_at: Utc::now(),
            source: source.describe(),
            checked: 0,
            passed: 0,
            passed_ids: Vec::new(),
            skipped: 0,
            failures: Vec::new(),
            warned: Vec::new(),
            errors: Vec::new(),
        };

        for entry in entries {
            let doc = match entry.content {
                EntryContent::Document(doc) => doc,
                EntryContent::Skipped(reason) => {
                    tracing::debug!(id = %entry.id, %reason, "skipped");
                    report.skipped += 1;
                    continue;
                }
                EntryContent::Failed(message) => {
                    tracing::warn!(id = %entry.id, %message, "article could not be loaded");
                    report.errors.push(AuditError {
                        id: entry.id,
                        message,
                    });
                    continue;
                }
            };

            let verdict = match self.validator.validate(&doc, self.taxonomy) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(id = %entry.id, error = %e, "article could not be validated");
                    report.errors.push(AuditError {
                        id: entry.id,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            report.checked += 1;
            let grade = verdict.grade();
            let audit_entry = AuditEntry {
                id: entry.id,
                title: entry.title.unwrap_or_else(|| doc.title.clone()),
                violations: verdict.violations,
                warnings: verdict.warnings,
            };
            match grade {
                Grade::Pass => {
                    report.passed += 1;
                    report.passed_ids.push(audit_entry.id);
                }
                Grade::Warn => report.warned.push(audit_entry),
                Grade::Fail => report.failures.push(audit_entry),
            }
        }

        tracing::info!(
            checked = report.checked,
            failed = report.failures.len(),
            errors = report.errors.len(),
            "audit complete"
        );
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
