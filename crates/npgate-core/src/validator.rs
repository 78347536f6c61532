use crate::config::ValidationConfig;
use crate::document::ArticleDocument;
use crate::error::Result;
use crate::taxonomy::TaxonomyStore;
use crate::types::{Category, Language};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

// ---------------------------------------------------------------------------
// ViolationKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    UnknownTag,
    CategoryMismatch,
    TagCountOutOfRange,
    MissingRequiredSection,
    SectionOutOfOrder,
    MissingMetadataField,
    WordCountBelowMinimum,
    ForbiddenPattern,
    ForbiddenTitleWord,
    /// Warning only: an optional heading is absent.
    MissingRecommendedSection,
    /// Warning only: the title is longer than the configured limit.
    TitleTooLong,
    /// Warning only: not every scenario case is discussed.
    IncompleteScenarios,
    /// Warning only: an expected system tag is absent.
    MissingSystemTag,
    /// Warning only: the URL does not sit under the primary genre.
    UrlStructureMismatch,
    /// Produced by the publication gate when the document could not be
    /// validated at all.
    InvalidDocument,
}

impl ViolationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ViolationKind::UnknownTag => "unknown_tag",
            ViolationKind::CategoryMismatch => "category_mismatch",
            ViolationKind::TagCountOutOfRange => "tag_count_out_of_range",
            ViolationKind::MissingRequiredSection => "missing_required_section",
            ViolationKind::SectionOutOfOrder => "section_out_of_order",
            ViolationKind::MissingMetadataField => "missing_metadata_field",
            ViolationKind::WordCountBelowMinimum => "word_count_below_minimum",
            ViolationKind::ForbiddenPattern => "forbidden_pattern",
            ViolationKind::ForbiddenTitleWord => "forbidden_title_word",
            ViolationKind::MissingRecommendedSection => "missing_recommended_section",
            ViolationKind::TitleTooLong => "title_too_long",
            ViolationKind::IncompleteScenarios => "incomplete_scenarios",
            ViolationKind::MissingSystemTag => "missing_system_tag",
            ViolationKind::UrlStructureMismatch => "url_structure_mismatch",
            ViolationKind::InvalidDocument => "invalid_document",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Violation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub detail: String,
}

impl Violation {
    pub fn new(kind: ViolationKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

// ---------------------------------------------------------------------------
// Grade / ValidationVerdict
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Pass,
    Warn,
    Fail,
}

impl Grade {
    pub fn as_str(self) -> &'static str {
        match self {
            Grade::Pass => "pass",
            Grade::Warn => "warn",
            Grade::Fail => "fail",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of validating one document. `passed` is true exactly when
/// `violations` is empty; `warnings` never affect it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub passed: bool,
    pub violations: Vec<Violation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Violation>,
}

impl ValidationVerdict {
    pub fn from_findings(violations: Vec<Violation>, warnings: Vec<Violation>) -> Self {
        Self {
            passed: violations.is_empty(),
            violations,
            warnings,
        }
    }

    /// Failing verdict for a document that could not be validated.
    pub fn invalid_document(detail: impl Into<String>) -> Self {
        Self::from_findings(
            vec![Violation::new(ViolationKind::InvalidDocument, detail)],
            Vec::new(),
        )
    }

    pub fn grade(&self) -> Grade {
        if !self.violations.is_empty() {
            Grade::Fail
        } else if !self.warnings.is_empty() {
            Grade::Warn
        } else {
            Grade::Pass
        }
    }

    /// Promote every warning to a violation.
    pub fn into_strict(self) -> Self {
        let mut violations = self.violations;
        violations.extend(self.warnings);
        Self::from_findings(violations, Vec::new())
    }

    pub fn has(&self, kind: ViolationKind) -> bool {
        self.violations.iter().any(|v| v.kind == kind)
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// Checks article documents against a taxonomy and a [`ValidationConfig`].
/// Validation is a pure in-memory computation; one validator can be shared
/// across threads.
#[derive(Debug, Clone)]
pub struct Validator {
    config: ValidationConfig,
    forbidden: Vec<(String, Regex)>,
    forbidden_title: Vec<(String, Regex)>,
    scenarios: BTreeMap<Language, Vec<(String, Regex)>>,
}

impl Validator {
    /// Compile the configured patterns. An invalid pattern is a config
    /// error reported here, not during validation.
    pub fn new(config: ValidationConfig) -> Result<Self> {
        let forbidden = config
            .forbidden_patterns
            .iter()
            .map(|p| Ok((p.name.clone(), p.compile()?)))
            .collect::<Result<Vec<_>>>()?;
        let forbidden_title = config
            .forbidden_title_patterns
            .iter()
            .map(|p| Ok((p.name.clone(), p.compile()?)))
            .collect::<Result<Vec<_>>>()?;
        let scenarios = config
            .scenario_markers
            .iter()
            .map(|(lang, markers)| {
                let compiled = markers
                    .iter()
                    .map(|p| Ok((p.name.clone(), p.compile()?)))
                    .collect::<Result<Vec<_>>>()?;
                Ok((*lang, compiled))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;
        Ok(Self {
            config,
            forbidden,
            forbidden_title,
            scenarios,
        })
    }

    /// Run every check and return the complete set of findings. Fails only
    /// with `InvalidDocument` when the document breaks the input contract.
    pub fn validate(
        &self,
        doc: &ArticleDocument,
        taxonomy: &TaxonomyStore,
    ) -> Result<ValidationVerdict> {
        doc.check_well_formed()?;

        let mut violations = Vec::new();
        let mut warnings = Vec::new();

        self.check_tags(doc, taxonomy, &mut violations);
        self.check_system_tags(doc, &mut warnings);
        self.check_url(doc, taxonomy, &mut warnings);
        self.check_sections(doc, &mut violations, &mut warnings);
        self.check_order(doc, &mut violations);
        self.check_metadata(doc, &mut violations);
        self.check_length(doc, &mut violations);
        self.check_forbidden(doc, &mut violations);
        self.check_scenarios(doc, &mut warnings);
        self.check_title(doc, &mut violations, &mut warnings);

        Ok(ValidationVerdict::from_findings(violations, warnings))
    }

    fn check_tags(&self, doc: &ArticleDocument, taxonomy: &TaxonomyStore, out: &mut Vec<Violation>) {
        let mut seen = HashSet::new();
        let mut counts: BTreeMap<Category, u32> = BTreeMap::new();

        for selection in &doc.tag_selections {
            if !seen.insert((selection.slug.as_str(), selection.category)) {
                continue;
            }
            match taxonomy.get(&selection.slug) {
                None => out.push(Violation::new(
                    ViolationKind::UnknownTag,
                    format!(
                        "'{}' is not in the taxonomy; valid {} slugs: {}",
                        selection.slug,
                        selection.category,
                        taxonomy.slugs_in(selection.category).join(", ")
                    ),
                )),
                Some(entry) if entry.category != selection.category => out.push(Violation::new(
                    ViolationKind::CategoryMismatch,
                    format!(
                        "'{}' was asserted as {} but is a {} tag",
                        selection.slug, selection.category, entry.category
                    ),
                )),
                Some(entry) => *counts.entry(entry.category).or_default() += 1,
            }
        }

        for (category, limit) in &self.config.tag_limits {
            let count = counts.get(category).copied().unwrap_or(0);
            if !limit.allows(count) {
                out.push(Violation::new(
                    ViolationKind::TagCountOutOfRange,
                    format!(
                        "{count} valid {category} tag(s); expected {}",
                        limit.describe()
                    ),
                ));
            }
        }
    }

    fn check_system_tags(&self, doc: &ArticleDocument, out: &mut Vec<Violation>) {
        for tag in &self.config.expected_system_tags {
            if !doc.system_tags.contains(tag) {
                out.push(Violation::new(
                    ViolationKind::MissingSystemTag,
                    format!("system tag '{tag}' is missing"),
                ));
            }
        }
    }

    /// Live articles are served under `{prefix}/{primary_genre}/`, where the
    /// primary genre is the first valid genre tag.
    fn check_url(&self, doc: &ArticleDocument, taxonomy: &TaxonomyStore, out: &mut Vec<Violation>) {
        let Some(url) = doc.url.as_deref() else {
            return;
        };
        let Some(prefix) = self.config.url_prefixes.get(&doc.language) else {
            return;
        };
        let primary = doc.tag_selections.iter().find(|t| {
            t.category == Category::Genre
                && taxonomy.get(&t.slug).map(|e| e.category) == Some(Category::Genre)
        });
        let Some(primary) = primary else {
            return;
        };
        let path = url_path(url);
        let expected = format!("{}/{}/", prefix.trim_end_matches('/'), primary.slug);
        if !path.starts_with(&expected) {
            out.push(Violation::new(
                ViolationKind::UrlStructureMismatch,
                format!("url path '{path}' should start with '{expected}'"),
            ));
        }
    }

    /// Configured headings in check order: canonical order first, then any
    /// remaining keys.
    fn heading_check_order(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.config
            .canonical_order
            .iter()
            .map(String::as_str)
            .filter(|k| self.config.headings.contains_key(*k))
            .chain(self.config.headings.keys().map(String::as_str))
            .filter(|k| seen.insert(*k))
            .collect()
    }

    fn check_sections(
        &self,
        doc: &ArticleDocument,
        violations: &mut Vec<Violation>,
        warnings: &mut Vec<Violation>,
    ) {
        for key in self.heading_check_order() {
            if doc.position(key).is_some() {
                continue;
            }
            if self.config.headings[key].is_required() {
                violations.push(Violation::new(
                    ViolationKind::MissingRequiredSection,
                    format!("required section '{key}' is missing"),
                ));
            } else {
                warnings.push(Violation::new(
                    ViolationKind::MissingRecommendedSection,
                    format!("recommended section '{key}' is missing"),
                ));
            }
        }
    }

    fn check_order(&self, doc: &ArticleDocument, out: &mut Vec<Violation>) {
        // Furthest section reached so far while walking the canonical order.
        let mut furthest: Option<(&str, usize)> = None;
        for key in &self.config.canonical_order {
            let Some(pos) = doc.position(key) else {
                continue;
            };
            match furthest {
                Some((prev, prev_pos)) if pos < prev_pos => out.push(Violation::new(
                    ViolationKind::SectionOutOfOrder,
                    format!("'{key}' appears before '{prev}' but belongs after it"),
                )),
                _ => furthest = Some((key.as_str(), pos)),
            }
        }
    }

    fn check_metadata(&self, doc: &ArticleDocument, out: &mut Vec<Violation>) {
        for field in &self.config.required_metadata_fields {
            let detail = match doc.metadata_fields.get(field) {
                Some(value) if !value.trim().is_empty() => continue,
                Some(_) => format!("metadata field '{field}' is empty"),
                None => format!("metadata field '{field}' is missing"),
            };
            out.push(Violation::new(ViolationKind::MissingMetadataField, detail));
        }
    }

    fn check_length(&self, doc: &ArticleDocument, out: &mut Vec<Violation>) {
        let Some(minimum) = self.config.minimum_for(doc.language) else {
            return;
        };
        if doc.word_count < minimum {
            out.push(Violation::new(
                ViolationKind::WordCountBelowMinimum,
                format!(
                    "{} {} measured, {minimum} required for '{}'",
                    doc.word_count,
                    doc.language.count_unit(),
                    doc.language
                ),
            ));
        }
    }

    fn check_forbidden(&self, doc: &ArticleDocument, out: &mut Vec<Violation>) {
        for (name, re) in &self.forbidden {
            let hit = doc.sections.iter().find_map(|s| {
                re.find(&s.heading)
                    .or_else(|| re.find(&s.body))
                    .map(|m| (s.heading.as_str(), m.as_str()))
            });
            if let Some((heading, matched)) = hit {
                out.push(Violation::new(
                    ViolationKind::ForbiddenPattern,
                    format!("'{name}' matched \"{matched}\" in section '{heading}'"),
                ));
            }
        }
    }

    fn check_scenarios(&self, doc: &ArticleDocument, out: &mut Vec<Violation>) {
        let Some(markers) = self.scenarios.get(&doc.language) else {
            return;
        };
        let missing: Vec<&str> = markers
            .iter()
            .filter(|(_, re)| !doc.sections.iter().any(|s| re.is_match(&s.body)))
            .map(|(name, _)| name.as_str())
            .collect();
        if !missing.is_empty() {
            out.push(Violation::new(
                ViolationKind::IncompleteScenarios,
                format!(
                    "{}/{} scenario cases found; missing: {}",
                    markers.len() - missing.len(),
                    markers.len(),
                    missing.join(", ")
                ),
            ));
        }
    }

    fn check_title(
        &self,
        doc: &ArticleDocument,
        violations: &mut Vec<Violation>,
        warnings: &mut Vec<Violation>,
    ) {
        for (name, re) in &self.forbidden_title {
            if let Some(m) = re.find(&doc.title) {
                violations.push(Violation::new(
                    ViolationKind::ForbiddenTitleWord,
                    format!("'{name}' matched \"{}\" in the title", m.as_str()),
                ));
            }
        }
        if let Some(max) = self.config.max_title_chars {
            let len = doc.title.chars().count();
            if len > max {
                warnings.push(Violation::new(
                    ViolationKind::TitleTooLong,
                    format!("title is {len} characters, limit {max}"),
                ));
            }
        }
    }
}

/// Path part of an absolute URL; relative input is returned as is.
fn url_path(url: &str) -> &str {
    match url.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("/", |i| &rest[i..]),
        None => url,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
