use crate::error::{GateError, Result};
use crate::types::{Category, Language};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// Section / TagSelection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Canonical heading key, e.g. `bottom_line`, not the rendered heading.
    pub heading: String,
    #[serde(default)]
    pub body: String,
}

/// A claim that the article is tagged with `slug` under `category`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagSelection {
    pub slug: String,
    pub category: Category,
}

// ---------------------------------------------------------------------------
// ArticleDocument
// ---------------------------------------------------------------------------

/// Storage-independent view of a candidate article. Callers translate their
/// native format (draft file, CMS post) into this before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleDocument {
    pub slug: String,
    pub title: String,
    pub language: Language,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default, rename = "tags")]
    pub tag_selections: Vec<TagSelection>,
    #[serde(default, rename = "metadata")]
    pub metadata_fields: BTreeMap<String, String>,
    /// Tags outside the taxonomy, e.g. `nowpattern`, `deep-pattern`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub system_tags: Vec<String>,
    /// Public URL once the article is live.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub word_count: u32,
}

/// Draft file shape: identical to [`ArticleDocument`] except that
/// `word_count` may be omitted and is then measured from the section bodies.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DraftFile {
    slug: String,
    title: String,
    language: Language,
    #[serde(default)]
    sections: Vec<Section>,
    #[serde(default)]
    tags: Vec<TagSelection>,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
    #[serde(default)]
    system_tags: Vec<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    word_count: Option<u32>,
}

impl From<DraftFile> for ArticleDocument {
    fn from(draft: DraftFile) -> Self {
        let word_count = draft
            .word_count
            .unwrap_or_else(|| measure_sections(draft.language, &draft.sections));
        Self {
            slug: draft.slug,
            title: draft.title,
            language: draft.language,
            sections: draft.sections,
            tag_selections: draft.tags,
            metadata_fields: draft.metadata,
            system_tags: draft.system_tags,
            url: draft.url,
            word_count,
        }
    }
}

/// Length of all section bodies under the language's counting rule.
pub fn measure_sections(language: Language, sections: &[Section]) -> u32 {
    sections
        .iter()
        .map(|s| language.measure(&s.body))
        .fold(0u32, |acc, n| acc.saturating_add(n))
}

impl ArticleDocument {
    pub fn new(slug: impl Into<String>, title: impl Into<String>, language: Language) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
            language,
            sections: Vec::new(),
            tag_selections: Vec::new(),
            metadata_fields: BTreeMap::new(),
            system_tags: Vec::new(),
            url: None,
            word_count: 0,
        }
    }

    pub fn with_section(mut self, heading: impl Into<String>, body: impl Into<String>) -> Self {
        self.sections.push(Section {
            heading: heading.into(),
            body: body.into(),
        });
        self
    }

    pub fn with_tag(mut self, slug: impl Into<String>, category: Category) -> Self {
        self.tag_selections.push(TagSelection {
            slug: slug.into(),
            category,
        });
        self
    }

    pub fn with_metadata(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata_fields.insert(field.into(), value.into());
        self
    }

    pub fn with_system_tag(mut self, slug: impl Into<String>) -> Self {
        self.system_tags.push(slug.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_word_count(mut self, word_count: u32) -> Self {
        self.word_count = word_count;
        self
    }

    /// Parse a draft file. `.json` is parsed as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
        let parsed = if is_json {
            Self::from_json_str(&data)
        } else {
            Self::from_yaml_str(&data)
        };
        parsed.map_err(|e| match e {
            GateError::InvalidDocument(msg) => {
                GateError::InvalidDocument(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    pub fn from_yaml_str(data: &str) -> Result<Self> {
        let draft: DraftFile =
            serde_yaml::from_str(data).map_err(|e| GateError::InvalidDocument(e.to_string()))?;
        Ok(draft.into())
    }

    pub fn from_json_str(data: &str) -> Result<Self> {
        let draft: DraftFile =
            serde_json::from_str(data).map_err(|e| GateError::InvalidDocument(e.to_string()))?;
        Ok(draft.into())
    }

    pub fn section(&self, heading: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.heading == heading)
    }

    /// Position of the first section with `heading`.
    pub fn position(&self, heading: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.heading == heading)
    }

    /// Check the caller-side contract: heading keys are non-empty and
    /// unique, tag slugs are non-empty.
    pub fn check_well_formed(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for (i, section) in self.sections.iter().enumerate() {
            let key = section.heading.trim();
            if key.is_empty() {
                return Err(GateError::InvalidDocument(format!(
                    "section {i} has an empty heading key"
                )));
            }
            if !seen.insert(key) {
                return Err(GateError::InvalidDocument(format!(
                    "heading '{key}' appears more than once"
                )));
            }
        }
        if let Some(i) = self
            .tag_selections
            .iter()
            .position(|t| t.slug.trim().is_empty())
        {
            return Err(GateError::InvalidDocument(format!(
                "tag selection {i} has an empty slug"
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DRAFT: &str = r#"
slug: hormuz-escalation
title: Strait of Hormuz standoff
language: en
sections:
  - heading: bottom_line
    body: Tanker insurance is the real chokepoint.
  - heading: now_pattern
    body: Escalation spiral with a narrow off-ramp.
tags:
  - slug: geopolitics
    category: genre
  - slug: p-escalation-spiral
    category: dynamics
metadata:
  bottom_line: Tanker insurance is the real chokepoint.
"#;

    #[test]
    fn parses_draft_and_measures_word_count() {
        let doc = ArticleDocument::from_yaml_str(DRAFT).unwrap();
        assert_eq!(doc.slug, "hormuz-escalation");
        assert_eq!(doc.language, Language::En);
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.tag_selections[1].category, Category::Dynamics);
        assert_eq!(doc.word_count, 12);
        assert_eq!(doc.position("now_pattern"), Some(1));
    }

    #[test]
    fn explicit_word_count_wins() {
        let yaml = format!("{DRAFT}word_count: 4800\n");
        let doc = ArticleDocument::from_yaml_str(&yaml).unwrap();
        assert_eq!(doc.word_count, 4800);
    }

    #[test]
    fn system_tags_and_url_are_optional() {
        let doc = ArticleDocument::from_yaml_str(DRAFT).unwrap();
        assert!(doc.system_tags.is_empty());
        assert_eq!(doc.url, None);

        let yaml = format!("{DRAFT}system_tags: [nowpattern]\nurl: https://nowpattern.com/en/geopolitics/hormuz/\n");
        let doc = ArticleDocument::from_yaml_str(&yaml).unwrap();
        assert_eq!(doc.system_tags, vec!["nowpattern"]);
        assert_eq!(doc.url.as_deref(), Some("https://nowpattern.com/en/geopolitics/hormuz/"));
    }

    #[test]
    fn unknown_category_is_invalid_document() {
        let yaml = DRAFT.replace("category: dynamics", "category: mood");
        assert!(matches!(
            ArticleDocument::from_yaml_str(&yaml),
            Err(GateError::InvalidDocument(_))
        ));
    }

    #[test]
    fn sections_must_be_a_sequence() {
        let yaml = "slug: a\ntitle: A\nlanguage: ja\nsections: nope\n";
        assert!(matches!(
            ArticleDocument::from_yaml_str(yaml),
            Err(GateError::InvalidDocument(_))
        ));
    }

    #[test]
    fn load_json_by_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("draft.json");
        std::fs::write(
            &path,
            r#"{"slug": "a", "title": "A", "language": "ja", "sections": [{"heading": "bottom_line", "body": "要点 です"}]}"#,
        )
        .unwrap();
        let doc = ArticleDocument::load(&path).unwrap();
        assert_eq!(doc.word_count, 4);
    }

    #[test]
    fn load_error_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "title: [unclosed").unwrap();
        let err = ArticleDocument::load(&path).unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn duplicate_heading_is_not_well_formed() {
        let doc = ArticleDocument::new("a", "A", Language::En)
            .with_section("bottom_line", "x")
            .with_section("bottom_line", "y");
        assert!(matches!(
            doc.check_well_formed(),
            Err(GateError::InvalidDocument(msg)) if msg.contains("bottom_line")
        ));
    }

    #[test]
    fn empty_tag_slug_is_not_well_formed() {
        let doc = ArticleDocument::new("a", "A", Language::En).with_tag(" ", Category::Genre);
        assert!(doc.check_well_formed().is_err());
    }
}
