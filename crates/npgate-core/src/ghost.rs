//! Ghost CMS corpus sources.
//!
//! Published Nowpattern articles live in Ghost as rendered HTML. These
//! sources translate each post back into an [`ArticleDocument`] so the
//! audit can run the same structural rules the gate applies to drafts.

use crate::audit::{CorpusEntry, CorpusSource, EntryContent};
use crate::config::GhostConfig;
use crate::document::{ArticleDocument, Section, TagSelection};
use crate::error::{GateError, Result};
use crate::types::{Category, Language};
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

const PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, Deserialize)]
pub struct GhostTag {
    pub slug: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GhostPost {
    pub id: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tags: Vec<GhostTag>,
    #[serde(default)]
    pub custom_excerpt: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostsPage {
    posts: Vec<GhostPost>,
    #[serde(default)]
    meta: Option<PageMeta>,
}

#[derive(Debug, Deserialize)]
struct PageMeta {
    pagination: Pagination,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(default)]
    pages: u32,
}

// ---------------------------------------------------------------------------
// HTML → ArticleDocument
// ---------------------------------------------------------------------------

static HEADING_RE: OnceLock<Regex> = OnceLock::new();
static TAG_RE: OnceLock<Regex> = OnceLock::new();
static CLASS_RE: OnceLock<Regex> = OnceLock::new();

fn heading_re() -> &'static Regex {
    HEADING_RE.get_or_init(|| Regex::new(r"(?is)<h[23][^>]*>(.*?)</h[23]>").unwrap())
}

fn class_re() -> &'static Regex {
    CLASS_RE.get_or_init(|| {
        Regex::new(r#"(?is)<[a-z][a-z0-9]*\s[^>]*?\bclass\s*=\s*["']([^"']*)["'][^>]*>"#).unwrap()
    })
}

fn tag_re() -> &'static Regex {
    TAG_RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").unwrap())
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Visible text of an HTML fragment with whitespace collapsed.
pub fn strip_html(html: &str) -> String {
    let without_tags = tag_re().replace_all(html, " ");
    decode_entities(&without_tags)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn post_language(post: &GhostPost) -> Option<Language> {
    post.tags
        .iter()
        .find_map(|t| Language::all().iter().copied().find(|l| l.tag_slug() == t.slug))
}

/// Translate a Ghost post into a document. The error string is recorded
/// against the post in the audit report.
pub fn post_to_document(
    post: &GhostPost,
    ghost: &GhostConfig,
    metadata_fields: &[String],
) -> std::result::Result<ArticleDocument, String> {
    let language =
        post_language(post).ok_or_else(|| "post has no lang-ja or lang-en tag".to_string())?;
    let html = post.html.as_deref().unwrap_or("");

    // (key, marker start, marker end) for every heading an alias maps and
    // every element carrying a known block class, in document order.
    let mut mapped: Vec<(&str, usize, usize)> = heading_re()
        .captures_iter(html)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let key = ghost.heading_key(&strip_html(caps.get(1)?.as_str()))?;
            Some((key, whole.start(), whole.end()))
        })
        .collect();
    mapped.extend(class_re().captures_iter(html).filter_map(|caps| {
        let whole = caps.get(0)?;
        let key = ghost.block_key(caps.get(1)?.as_str())?;
        Some((key, whole.start(), whole.end()))
    }));
    mapped.sort_by_key(|&(_, start, _)| start);

    // Unmapped headings stay inside the preceding section's body.
    let mut sections: Vec<Section> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for (i, &(key, _, end)) in mapped.iter().enumerate() {
        if !seen.insert(key) {
            continue;
        }
        // A marker nested in this one (a classed span inside a heading)
        // leaves the body empty.
        let body_end = mapped
            .get(i + 1)
            .map_or(html.len(), |&(_, start, _)| start)
            .max(end);
        sections.push(Section {
            heading: key.to_string(),
            body: strip_html(&html[end..body_end]),
        });
    }

    let mut metadata: BTreeMap<String, String> = sections
        .iter()
        .filter(|s| !s.body.is_empty() && metadata_fields.iter().any(|f| f == &s.heading))
        .map(|s| (s.heading.clone(), s.body.clone()))
        .collect();
    if let Some(excerpt) = post.custom_excerpt.as_deref().filter(|e| !e.trim().is_empty()) {
        metadata.insert("excerpt".to_string(), excerpt.trim().to_string());
    }

    let (system, taxonomy_tags): (Vec<&GhostTag>, Vec<&GhostTag>) =
        post.tags.iter().partition(|t| ghost.is_system_tag(&t.slug));
    let tag_selections = taxonomy_tags
        .into_iter()
        .map(|t| TagSelection {
            slug: t.slug.clone(),
            category: Category::from_slug_convention(&t.slug),
        })
        .collect();

    Ok(ArticleDocument {
        slug: post.slug.clone().unwrap_or_else(|| post.id.clone()),
        title: post.title.clone().unwrap_or_default(),
        language,
        sections,
        tag_selections,
        metadata_fields: metadata,
        system_tags: system.into_iter().map(|t| t.slug.clone()).collect(),
        url: post.url.clone(),
        word_count: language.measure(&strip_html(html)),
    })
}

fn posts_to_entries(
    posts: Vec<GhostPost>,
    ghost: &GhostConfig,
    metadata_fields: &[String],
) -> Vec<CorpusEntry> {
    posts
        .into_iter()
        .map(|post| {
            let id = post.slug.clone().unwrap_or_else(|| post.id.clone());
            let content = match post.status.as_deref() {
                Some(status) if status != "published" => {
                    EntryContent::Skipped(format!("status={status}"))
                }
                _ => match post_to_document(&post, ghost, metadata_fields) {
                    Ok(doc) => EntryContent::Document(doc),
                    Err(message) => EntryContent::Failed(message),
                },
            };
            CorpusEntry {
                id,
                title: post.title,
                content,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// GhostExportSource
// ---------------------------------------------------------------------------

/// A JSON file holding a Ghost `{"posts": [...]}` API response.
#[derive(Debug, Clone)]
pub struct GhostExportSource {
    path: PathBuf,
    ghost: GhostConfig,
    metadata_fields: Vec<String>,
}

impl GhostExportSource {
    pub fn new(path: impl Into<PathBuf>, ghost: GhostConfig, metadata_fields: Vec<String>) -> Self {
        Self {
            path: path.into(),
            ghost,
            metadata_fields,
        }
    }
}

impl CorpusSource for GhostExportSource {
    fn describe(&self) -> String {
        format!("ghost export {}", self.path.display())
    }

    fn entries(&self) -> Result<Vec<CorpusEntry>> {
        let data = std::fs::read_to_string(&self.path).map_err(|e| {
            GateError::Corpus(format!("cannot read {}: {e}", self.path.display()))
        })?;
        let page: PostsPage = serde_json::from_str(&data).map_err(|e| {
            GateError::Corpus(format!("{} is not a Ghost posts response: {e}", self.path.display()))
        })?;
        Ok(posts_to_entries(page.posts, &self.ghost, &self.metadata_fields))
    }
}

// ---------------------------------------------------------------------------
// GhostApiSource
// ---------------------------------------------------------------------------

/// Published posts from the Ghost Content API.
pub struct GhostApiSource {
    base_url: String,
    key: String,
    ghost: GhostConfig,
    metadata_fields: Vec<String>,
    slug: Option<String>,
    client: reqwest::blocking::Client,
}

impl GhostApiSource {
    pub fn new(
        base_url: impl Into<String>,
        key: impl Into<String>,
        ghost: GhostConfig,
        metadata_fields: Vec<String>,
    ) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            key: key.into(),
            ghost,
            metadata_fields,
            slug: None,
            client,
        })
    }

    /// Fetch only the post with this slug instead of paging the whole site.
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    fn fetch_slug(&self, slug: &str) -> Result<PostsPage> {
        let url = format!("{}/ghost/api/content/posts/slug/{slug}/", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("key", self.key.as_str()),
                ("include", "tags"),
                ("formats", "html"),
            ])
            .send()?
            .error_for_status()?;
        Ok(resp.json()?)
    }

    fn fetch_page(&self, page: u32) -> Result<PostsPage> {
        let url = format!("{}/ghost/api/content/posts/", self.base_url);
        let page_param = page.to_string();
        let limit_param = PAGE_SIZE.to_string();
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("key", self.key.as_str()),
                ("include", "tags"),
                ("formats", "html"),
                ("limit", limit_param.as_str()),
                ("page", page_param.as_str()),
            ])
            .send()?
            .error_for_status()?;
        Ok(resp.json()?)
    }
}

impl CorpusSource for GhostApiSource {
    fn describe(&self) -> String {
        format!("ghost api {}", self.base_url)
    }

    fn entries(&self) -> Result<Vec<CorpusEntry>> {
        if let Some(slug) = &self.slug {
            let found = self
                .fetch_slug(slug)
                .map_err(|e| GateError::Corpus(format!("{}: post '{slug}': {e}", self.describe())))?;
            return Ok(posts_to_entries(found.posts, &self.ghost, &self.metadata_fields));
        }

        let first = self
            .fetch_page(1)
            .map_err(|e| GateError::Corpus(format!("{}: {e}", self.describe())))?;
        let pages = first.meta.as_ref().map(|m| m.pagination.pages).unwrap_or(1);
        tracing::debug!(pages, "fetched first page of posts");

        let mut entries = posts_to_entries(first.posts, &self.ghost, &self.metadata_fields);
        for page in 2..=pages {
            match self.fetch_page(page) {
                Ok(next) => {
                    entries.extend(posts_to_entries(next.posts, &self.ghost, &self.metadata_fields))
                }
                Err(e) => {
                    tracing::warn!(page, error = %e, "stopping pagination");
                    entries.push(CorpusEntry {
                        id: format!("page-{page}"),
                        title: None,
                        content: EntryContent::Failed(e.to_string()),
                    });
                    break;
                }
            }
        }
        Ok(entries)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
