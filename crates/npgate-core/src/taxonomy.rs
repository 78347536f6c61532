use crate::error::{GateError, Result};
use crate::types::{Category, Language};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// TaxonomyEntry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    pub slug: String,
    pub name_ja: String,
    pub name_en: String,
    pub category: Category,
    #[serde(default)]
    pub description_ja: String,
    #[serde(default)]
    pub description_en: String,
}

impl TaxonomyEntry {
    pub fn name(&self, language: Language) -> &str {
        match language {
            Language::Ja => &self.name_ja,
            Language::En => &self.name_en,
        }
    }

    pub fn description(&self, language: Language) -> &str {
        match language {
            Language::Ja => &self.description_ja,
            Language::En => &self.description_en,
        }
    }
}

// ---------------------------------------------------------------------------
// On-disk shape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawTaxonomy {
    genres: Option<Vec<RawEntry>>,
    events: Option<Vec<RawEntry>>,
    dynamics: Option<Vec<RawEntry>>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    slug: Option<String>,
    name_ja: Option<String>,
    name_en: Option<String>,
    #[serde(default)]
    description_ja: Option<String>,
    #[serde(default)]
    description_en: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// TaxonomyStore
// ---------------------------------------------------------------------------

/// Read-only tag vocabulary indexed by slug and by display name in both
/// languages. Built once per process and shared by reference.
#[derive(Debug, Clone)]
pub struct TaxonomyStore {
    entries: Vec<TaxonomyEntry>,
    by_slug: HashMap<String, usize>,
    by_name: HashMap<(Language, String), Vec<usize>>,
}

impl TaxonomyStore {
    /// Load a taxonomy document. `.yaml`/`.yml` files are parsed as YAML,
    /// anything else as JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let raw: RawTaxonomy = if is_yaml {
            serde_yaml::from_str(&data)
                .map_err(|e| GateError::MalformedTaxonomy(format!("{}: {e}", path.display())))?
        } else {
            serde_json::from_str(&data)
                .map_err(|e| GateError::MalformedTaxonomy(format!("{}: {e}", path.display())))?
        };
        let store = Self::from_raw(raw)?;
        tracing::debug!(
            path = %path.display(),
            entries = store.len(),
            "loaded taxonomy"
        );
        Ok(store)
    }

    pub fn from_json_str(data: &str) -> Result<Self> {
        let raw: RawTaxonomy =
            serde_json::from_str(data).map_err(|e| GateError::MalformedTaxonomy(e.to_string()))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawTaxonomy) -> Result<Self> {
        let mut problems = Vec::new();
        let mut entries = Vec::new();

        let groups = [
            (Category::Genre, raw.genres),
            (Category::Event, raw.events),
            (Category::Dynamics, raw.dynamics),
        ];
        for (category, group) in groups {
            let Some(group) = group else {
                problems.push(format!("missing group '{}'", category.group_name()));
                continue;
            };
            for (i, item) in group.into_iter().enumerate() {
                let at = format!("{}[{i}]", category.group_name());
                let slug = non_empty(item.slug);
                let name_ja = non_empty(item.name_ja);
                let name_en = non_empty(item.name_en);
                match (slug, name_ja, name_en) {
                    (Some(slug), Some(name_ja), Some(name_en)) => entries.push(TaxonomyEntry {
                        slug,
                        name_ja,
                        name_en,
                        category,
                        description_ja: item.description_ja.unwrap_or_default(),
                        description_en: item.description_en.unwrap_or_default(),
                    }),
                    (slug, name_ja, name_en) => {
                        let mut missing = Vec::new();
                        if slug.is_none() {
                            missing.push("slug");
                        }
                        if name_ja.is_none() {
                            missing.push("name_ja");
                        }
                        if name_en.is_none() {
                            missing.push("name_en");
                        }
                        let label = slug.map(|s| format!(" ('{s}')")).unwrap_or_default();
                        problems.push(format!("{at}{label} lacks {}", missing.join(", ")));
                    }
                }
            }
        }

        let mut by_slug: HashMap<String, usize> = HashMap::new();
        for (i, entry) in entries.iter().enumerate() {
            if let Some(&first) = by_slug.get(&entry.slug) {
                problems.push(format!(
                    "slug '{}' is declared under both {} and {}",
                    entry.slug, entries[first].category, entry.category
                ));
            } else {
                by_slug.insert(entry.slug.clone(), i);
            }
        }

        if !problems.is_empty() {
            return Err(GateError::MalformedTaxonomy(problems.join("; ")));
        }

        let mut by_name: HashMap<(Language, String), Vec<usize>> = HashMap::new();
        for (i, entry) in entries.iter().enumerate() {
            for &lang in Language::all() {
                by_name
                    .entry((lang, entry.name(lang).to_string()))
                    .or_default()
                    .push(i);
            }
        }

        Ok(Self {
            entries,
            by_slug,
            by_name,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, grouped by category in document order.
    pub fn entries(&self) -> &[TaxonomyEntry] {
        &self.entries
    }

    pub fn lookup_by_slug(&self, slug: &str) -> Result<&TaxonomyEntry> {
        self.get(slug)
            .ok_or_else(|| GateError::TagNotFound(slug.to_string()))
    }

    pub fn get(&self, slug: &str) -> Option<&TaxonomyEntry> {
        self.by_slug.get(slug).map(|&i| &self.entries[i])
    }

    /// Reverse lookup from a displayed tag name to its entry. A name shared
    /// by several entries is a data error in the taxonomy document and is
    /// reported rather than resolved.
    pub fn lookup_by_display_name(&self, name: &str, language: Language) -> Result<&TaxonomyEntry> {
        let key = (language, name.trim().to_string());
        match self.by_name.get(&key).map(|v| v.as_slice()) {
            Some([only]) => Ok(&self.entries[*only]),
            Some(many) if !many.is_empty() => Err(GateError::AmbiguousDisplayName {
                name: key.1,
                slugs: many.iter().map(|&i| self.entries[i].slug.clone()).collect(),
            }),
            _ => Err(GateError::TagNotFound(format!("{language}:{}", key.1))),
        }
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &TaxonomyEntry> {
        self.entries.iter().filter(move |e| e.category == category)
    }

    pub fn slugs_in(&self, category: Category) -> Vec<&str> {
        self.in_category(category).map(|e| e.slug.as_str()).collect()
    }

    /// Display names used by more than one entry, as `(language, name, slugs)`.
    pub fn duplicate_names(&self) -> Vec<(Language, String, Vec<String>)> {
        let mut dups: Vec<_> = self
            .by_name
            .iter()
            .filter(|(_, idx)| idx.len() > 1)
            .map(|((lang, name), idx)| {
                (
                    *lang,
                    name.clone(),
                    idx.iter().map(|&i| self.entries[i].slug.clone()).collect(),
                )
            })
            .collect();
        dups.sort();
        dups
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"{
  "genres": [
    {"slug": "geopolitics", "name_ja": "地政学・安全保障", "name_en": "Geopolitics & Security"},
    {"slug": "energy", "name_ja": "エネルギー", "name_en": "Energy", "description_en": "Oil, gas, power"}
  ],
  "events": [
    {"slug": "event-deal", "name_ja": "取引・再編", "name_en": "Deal & Restructuring"}
  ],
  "dynamics": [
    {"slug": "p-escalation-spiral", "name_ja": "対立の螺旋", "name_en": "Escalation Spiral"}
  ]
}"#;

    #[test]
    fn loads_three_groups() {
        let store = TaxonomyStore::from_json_str(SAMPLE).unwrap();
        assert_eq!(store.len(), 4);
        assert_eq!(store.slugs_in(Category::Genre), vec!["geopolitics", "energy"]);
        let entry = store.lookup_by_slug("p-escalation-spiral").unwrap();
        assert_eq!(entry.category, Category::Dynamics);
        assert_eq!(entry.name(Language::En), "Escalation Spiral");
        assert_eq!(store.get("energy").unwrap().description_en, "Oil, gas, power");
    }

    #[test]
    fn slug_lookup_miss_is_not_found() {
        let store = TaxonomyStore::from_json_str(SAMPLE).unwrap();
        let err = store.lookup_by_slug("p-unknown").unwrap_err();
        assert!(matches!(err, GateError::TagNotFound(s) if s == "p-unknown"));
    }

    #[test]
    fn reverse_lookup_by_display_name() {
        let store = TaxonomyStore::from_json_str(SAMPLE).unwrap();
        let entry = store
            .lookup_by_display_name("対立の螺旋", Language::Ja)
            .unwrap();
        assert_eq!(entry.slug, "p-escalation-spiral");
        let entry = store
            .lookup_by_display_name(" Energy ", Language::En)
            .unwrap();
        assert_eq!(entry.slug, "energy");
        assert!(store
            .lookup_by_display_name("Energy", Language::Ja)
            .is_err());
    }

    #[test]
    fn duplicate_display_name_is_surfaced() {
        let json = r#"{
  "genres": [
    {"slug": "a", "name_ja": "同じ", "name_en": "A"},
    {"slug": "b", "name_ja": "同じ", "name_en": "B"}
  ],
  "events": [],
  "dynamics": []
}"#;
        let store = TaxonomyStore::from_json_str(json).unwrap();
        let err = store
            .lookup_by_display_name("同じ", Language::Ja)
            .unwrap_err();
        match err {
            GateError::AmbiguousDisplayName { slugs, .. } => assert_eq!(slugs, vec!["a", "b"]),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.duplicate_names().len(), 1);
    }

    #[test]
    fn missing_name_is_malformed() {
        let json = r#"{"genres": [{"slug": "a", "name_ja": "ア"}], "events": [], "dynamics": []}"#;
        let err = TaxonomyStore::from_json_str(json).unwrap_err();
        match err {
            GateError::MalformedTaxonomy(msg) => {
                assert!(msg.contains("genres[0]"));
                assert!(msg.contains("name_en"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_slug_is_malformed() {
        let json = r#"{"genres": [], "events": [{"name_ja": "ア", "name_en": "A"}], "dynamics": []}"#;
        assert!(matches!(
            TaxonomyStore::from_json_str(json),
            Err(GateError::MalformedTaxonomy(_))
        ));
    }

    #[test]
    fn slug_collision_across_groups_is_malformed() {
        let json = r#"{
  "genres": [{"slug": "energy", "name_ja": "エネルギー", "name_en": "Energy"}],
  "events": [],
  "dynamics": [{"slug": "energy", "name_ja": "力学", "name_en": "Dynamics"}]
}"#;
        let err = TaxonomyStore::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("slug 'energy'"));
    }

    #[test]
    fn missing_group_is_malformed() {
        let json = r#"{"genres": [], "events": []}"#;
        let err = TaxonomyStore::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("dynamics"));
    }

    #[test]
    fn loads_yaml_by_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("taxonomy.yaml");
        std::fs::write(
            &path,
            "genres:\n  - slug: energy\n    name_ja: エネルギー\n    name_en: Energy\nevents: []\ndynamics: []\n",
        )
        .unwrap();
        let store = TaxonomyStore::load(&path).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unparseable_file_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("taxonomy.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            TaxonomyStore::load(&path),
            Err(GateError::MalformedTaxonomy(_))
        ));
    }
}
