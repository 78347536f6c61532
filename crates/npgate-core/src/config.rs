use crate::error::{GateError, Result};
use crate::paths;
use crate::types::{Category, Language, Requirement};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// TagLimit / NamedPattern
// ---------------------------------------------------------------------------

/// Allowed number of tags in one category. `max: None` means unbounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagLimit {
    #[serde(default)]
    pub min: u32,
    #[serde(default)]
    pub max: Option<u32>,
}

impl TagLimit {
    pub fn allows(&self, count: u32) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }

    pub fn describe(&self) -> String {
        match self.max {
            Some(max) if max == self.min => format!("exactly {max}"),
            Some(max) => format!("{}..={max}", self.min),
            None => format!("at least {}", self.min),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPattern {
    pub name: String,
    pub pattern: String,
}

impl NamedPattern {
    fn new(name: &str, pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
        }
    }

    pub fn compile(&self) -> Result<Regex> {
        Regex::new(&self.pattern).map_err(|e| {
            GateError::InvalidConfig(format!("pattern '{}' does not compile: {e}", self.name))
        })
    }
}

// ---------------------------------------------------------------------------
// ValidationConfig
// ---------------------------------------------------------------------------

/// Every rule the structural validator enforces. Built once and injected
/// into [`crate::validator::Validator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_headings")]
    pub headings: BTreeMap<String, Requirement>,
    #[serde(default = "default_canonical_order")]
    pub canonical_order: Vec<String>,
    #[serde(default = "default_minimums")]
    pub minimum_word_count_by_language: BTreeMap<Language, u32>,
    #[serde(default = "default_required_metadata")]
    pub required_metadata_fields: Vec<String>,
    #[serde(default = "default_tag_limits")]
    pub tag_limits: BTreeMap<Category, TagLimit>,
    #[serde(default = "default_forbidden_patterns")]
    pub forbidden_patterns: Vec<NamedPattern>,
    #[serde(default = "default_forbidden_title_patterns")]
    pub forbidden_title_patterns: Vec<NamedPattern>,
    #[serde(default = "default_max_title_chars")]
    pub max_title_chars: Option<usize>,
    /// Non-taxonomy tags every article should carry.
    #[serde(default)]
    pub expected_system_tags: Vec<String>,
    /// Per language, the scenario cases the body must mention.
    #[serde(default = "default_scenario_markers")]
    pub scenario_markers: BTreeMap<Language, Vec<NamedPattern>>,
    /// Per language, the path prefix in front of `/{primary_genre}/`.
    /// Only checked for documents that carry a URL.
    #[serde(default = "default_url_prefixes")]
    pub url_prefixes: BTreeMap<Language, String>,
}

/// Article structure in reading order, with whether each block must exist.
const DEFAULT_STRUCTURE: &[(&str, Requirement)] = &[
    ("bottom_line", Requirement::Required),
    ("tag_badge", Requirement::Optional),
    ("summary", Requirement::Optional),
    ("why_it_matters", Requirement::Optional),
    ("what_happened", Requirement::Optional),
    ("big_picture", Requirement::Optional),
    ("between_the_lines", Requirement::Required),
    ("now_pattern", Requirement::Required),
    ("pattern_history", Requirement::Optional),
    ("whats_next", Requirement::Optional),
    ("open_loop", Requirement::Required),
];

fn default_headings() -> BTreeMap<String, Requirement> {
    DEFAULT_STRUCTURE
        .iter()
        .map(|(k, r)| (k.to_string(), *r))
        .collect()
}

fn default_canonical_order() -> Vec<String> {
    DEFAULT_STRUCTURE.iter().map(|(k, _)| k.to_string()).collect()
}

fn default_minimums() -> BTreeMap<Language, u32> {
    let mut m = BTreeMap::new();
    m.insert(Language::Ja, 6000);
    m.insert(Language::En, 5000);
    m
}

fn default_required_metadata() -> Vec<String> {
    [
        "bottom_line",
        "bottom_line_pattern",
        "bottom_line_scenario",
        "bottom_line_watch",
        "between_the_lines",
        "open_loop_trigger",
        "open_loop_series",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_tag_limits() -> BTreeMap<Category, TagLimit> {
    let mut m = BTreeMap::new();
    m.insert(Category::Genre, TagLimit { min: 1, max: Some(2) });
    m
}

fn default_forbidden_patterns() -> Vec<NamedPattern> {
    vec![
        NamedPattern::new("speed log heading", r"(?i)speed\s+log"),
        NamedPattern::new("numbered observation log", r"観測ログ\s*#?\d+"),
        NamedPattern::new("tags footer", r"Tags:\s*#"),
    ]
}

fn default_forbidden_title_patterns() -> Vec<NamedPattern> {
    vec![
        NamedPattern::new("observation log", "観測ログ"),
        NamedPattern::new("issue number", r"#\d{4}"),
        NamedPattern::new("speed log", "Speed Log"),
        NamedPattern::new("format label", "Deep Pattern"),
    ]
}

fn default_max_title_chars() -> Option<usize> {
    Some(80)
}

fn default_scenario_markers() -> BTreeMap<Language, Vec<NamedPattern>> {
    let mut m = BTreeMap::new();
    m.insert(
        Language::Ja,
        vec![
            NamedPattern::new("base", "基本"),
            NamedPattern::new("bull", "楽観"),
            NamedPattern::new("bear", "悲観"),
        ],
    );
    m.insert(
        Language::En,
        vec![
            NamedPattern::new("base", r"(?i)base\s*case"),
            NamedPattern::new("bull", r"(?i)bull\s*case|optimistic"),
            NamedPattern::new("bear", r"(?i)bear\s*case|pessimistic"),
        ],
    );
    m
}

fn default_url_prefixes() -> BTreeMap<Language, String> {
    let mut m = BTreeMap::new();
    m.insert(Language::Ja, String::new());
    m.insert(Language::En, "/en".to_string());
    m
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            headings: default_headings(),
            canonical_order: default_canonical_order(),
            minimum_word_count_by_language: default_minimums(),
            required_metadata_fields: default_required_metadata(),
            tag_limits: default_tag_limits(),
            forbidden_patterns: default_forbidden_patterns(),
            forbidden_title_patterns: default_forbidden_title_patterns(),
            max_title_chars: default_max_title_chars(),
            expected_system_tags: Vec::new(),
            scenario_markers: default_scenario_markers(),
            url_prefixes: default_url_prefixes(),
        }
    }
}

impl ValidationConfig {
    /// A config with no rules at all. Useful as a base for narrow checks.
    pub fn empty() -> Self {
        Self {
            headings: BTreeMap::new(),
            canonical_order: Vec::new(),
            minimum_word_count_by_language: BTreeMap::new(),
            required_metadata_fields: Vec::new(),
            tag_limits: BTreeMap::new(),
            forbidden_patterns: Vec::new(),
            forbidden_title_patterns: Vec::new(),
            max_title_chars: None,
            expected_system_tags: Vec::new(),
            scenario_markers: BTreeMap::new(),
            url_prefixes: BTreeMap::new(),
        }
    }

    /// Rules for articles already rendered by Ghost. The badge and summary
    /// blocks are required there, and only metadata that survives rendering
    /// as a section is demanded.
    pub fn for_rendered_posts() -> Self {
        let mut rules = Self::default();
        rules.headings.insert("tag_badge".to_string(), Requirement::Required);
        rules.headings.insert("summary".to_string(), Requirement::Required);
        rules.required_metadata_fields = vec!["bottom_line".to_string(), "between_the_lines".to_string()];
        rules.expected_system_tags = vec!["nowpattern".to_string(), "deep-pattern".to_string()];
        rules
    }

    pub fn minimum_for(&self, language: Language) -> Option<u32> {
        self.minimum_word_count_by_language.get(&language).copied()
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        for key in &self.canonical_order {
            if !self.headings.contains_key(key) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("canonical_order lists '{key}' which is not declared under headings"),
                });
            }
        }

        for (key, requirement) in &self.headings {
            if requirement.is_required() && !self.canonical_order.contains(key) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("required heading '{key}' has no place in canonical_order"),
                });
            }
        }

        let mut seen = std::collections::HashSet::new();
        for key in &self.canonical_order {
            if !seen.insert(key) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("canonical_order lists '{key}' more than once"),
                });
            }
        }

        for lang in Language::all() {
            if self.minimum_for(*lang).is_none() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("no minimum length configured for '{lang}'; length is not checked"),
                });
            }
        }

        for (category, limit) in &self.tag_limits {
            if let Some(max) = limit.max {
                if limit.min > max {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Error,
                        message: format!(
                            "tag limit for '{category}' has min {} greater than max {max}",
                            limit.min
                        ),
                    });
                }
            }
        }

        for pattern in self
            .forbidden_patterns
            .iter()
            .chain(&self.forbidden_title_patterns)
            .chain(self.scenario_markers.values().flatten())
        {
            if let Err(e) = pattern.compile() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: e.to_string(),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// GhostConfig
// ---------------------------------------------------------------------------

/// How rendered Ghost posts are translated into article documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GhostConfig {
    #[serde(default = "default_ghost_url")]
    pub url: String,
    /// Heading key → rendered heading texts that denote it (substring,
    /// case-insensitive).
    #[serde(default = "default_heading_aliases")]
    pub heading_aliases: BTreeMap<String, Vec<String>>,
    /// CSS class → heading key, for blocks rendered as styled elements
    /// rather than under a heading.
    #[serde(default = "default_block_classes")]
    pub block_classes: BTreeMap<String, String>,
    /// Tag slugs that carry no taxonomy meaning.
    #[serde(default = "default_system_tags")]
    pub system_tags: Vec<String>,
}

fn default_ghost_url() -> String {
    "https://nowpattern.com".to_string()
}

fn default_heading_aliases() -> BTreeMap<String, Vec<String>> {
    let table: &[(&str, &[&str])] = &[
        ("bottom_line", &["BOTTOM LINE"]),
        ("why_it_matters", &["Why it matters"]),
        ("what_happened", &["What happened", "何が起きたか", "観測事実"]),
        ("big_picture", &["Big Picture", "全体像", "歴史的文脈"]),
        ("between_the_lines", &["Between the Lines", "行間を読む", "行間"]),
        ("now_pattern", &["NOW PATTERN"]),
        ("pattern_history", &["Pattern History", "パターンの歴史", "パターン史"]),
        ("whats_next", &["What's Next", "今後のシナリオ", "今後の展望", "シナリオ分析"]),
        ("open_loop", &["OPEN LOOP", "What to Watch Next", "追跡ポイント", "注目すべきトリガー"]),
    ];
    table
        .iter()
        .map(|(k, aliases)| (k.to_string(), aliases.iter().map(|a| a.to_string()).collect()))
        .collect()
}

fn default_block_classes() -> BTreeMap<String, String> {
    [("np-tag-badge", "tag_badge"), ("np-summary", "summary")]
        .iter()
        .map(|(class, key)| (class.to_string(), key.to_string()))
        .collect()
}

fn default_system_tags() -> Vec<String> {
    ["nowpattern", "deep-pattern", "lang-ja", "lang-en"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for GhostConfig {
    fn default() -> Self {
        Self {
            url: default_ghost_url(),
            heading_aliases: default_heading_aliases(),
            block_classes: default_block_classes(),
            system_tags: default_system_tags(),
        }
    }
}

impl GhostConfig {
    /// Heading key for a rendered heading, if any alias matches.
    pub fn heading_key(&self, heading_text: &str) -> Option<&str> {
        let lowered = heading_text.to_lowercase();
        self.heading_aliases
            .iter()
            .find(|(_, aliases)| {
                aliases
                    .iter()
                    .any(|a| lowered.contains(&a.to_lowercase()))
            })
            .map(|(key, _)| key.as_str())
    }

    /// Heading key for an element's `class` attribute value, if one of its
    /// classes is a known block.
    pub fn block_key(&self, class_attr: &str) -> Option<&str> {
        class_attr
            .split_whitespace()
            .find_map(|class| self.block_classes.get(class))
            .map(String::as_str)
    }

    pub fn is_system_tag(&self, slug: &str) -> bool {
        self.system_tags.iter().any(|t| t == slug)
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub project: ProjectConfig,
    /// Taxonomy document, relative to the project root unless absolute.
    #[serde(default = "default_taxonomy_path")]
    pub taxonomy: PathBuf,
    #[serde(default)]
    pub gate: ValidationConfig,
    /// Rules for the corpus audit of rendered posts.
    #[serde(default = "ValidationConfig::for_rendered_posts")]
    pub audit: ValidationConfig,
    #[serde(default)]
    pub ghost: GhostConfig,
}

fn default_version() -> u32 {
    1
}

fn default_taxonomy_path() -> PathBuf {
    PathBuf::from("nowpattern_taxonomy.json")
}

impl Config {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            version: 1,
            project: ProjectConfig {
                name: project_name.into(),
            },
            taxonomy: default_taxonomy_path(),
            gate: ValidationConfig::default(),
            audit: ValidationConfig::for_rendered_posts(),
            ghost: GhostConfig::default(),
        }
    }

    pub fn audit_rules(&self) -> &ValidationConfig {
        &self.audit
    }

    pub fn taxonomy_path(&self, root: &Path) -> PathBuf {
        if self.taxonomy.is_absolute() {
            self.taxonomy.clone()
        } else {
            root.join(&self.taxonomy)
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(GateError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Load the project config, or the built-in defaults when the project
    /// has not been initialized.
    pub fn load_or_default(root: &Path) -> Result<Self> {
        match Self::load(root) {
            Err(GateError::NotInitialized) => {
                tracing::debug!(root = %root.display(), "no config found, using defaults");
                let name = root
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("nowpattern");
                Ok(Self::new(name))
            }
            other => other,
        }
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings: Vec<ConfigWarning> = self
            .gate
            .validate()
            .into_iter()
            .map(|w| ConfigWarning {
                level: w.level,
                message: format!("gate: {}", w.message),
            })
            .collect();
        warnings.extend(self.audit.validate().into_iter().map(|w| ConfigWarning {
            level: w.level,
            message: format!("audit: {}", w.message),
        }));
        for key in self.ghost.heading_aliases.keys() {
            if !self.audit.headings.contains_key(key) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("ghost: heading alias '{key}' maps to an undeclared heading"),
                });
            }
        }
        for (class, key) in &self.ghost.block_classes {
            if !self.audit.headings.contains_key(key) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("ghost: block class '{class}' maps to undeclared heading '{key}'"),
                });
            }
        }
        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::new("nowpattern");
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.project.name, "nowpattern");
        assert_eq!(parsed.gate, ValidationConfig::default());
        assert_eq!(parsed.audit, ValidationConfig::for_rendered_posts());
    }

    #[test]
    fn minimal_config_fills_defaults() {
        let yaml = "project:\n  name: np\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.version, 1);
        assert_eq!(cfg.gate.minimum_for(Language::Ja), Some(6000));
        assert_eq!(cfg.gate.minimum_for(Language::En), Some(5000));
        assert_eq!(cfg.gate.headings["open_loop"], Requirement::Required);
        assert_eq!(cfg.taxonomy, PathBuf::from("nowpattern_taxonomy.json"));
    }

    #[test]
    fn partial_gate_section_keeps_other_defaults() {
        let yaml = r#"
project:
  name: np
gate:
  minimum_word_count_by_language:
    en: 6000
  required_metadata_fields: []
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.gate.minimum_for(Language::En), Some(6000));
        assert_eq!(cfg.gate.minimum_for(Language::Ja), None);
        assert!(cfg.gate.required_metadata_fields.is_empty());
        assert_eq!(cfg.gate.canonical_order.len(), 11);
    }

    #[test]
    fn audit_rules_only_demand_what_a_rendered_post_carries() {
        let cfg: Config = serde_yaml::from_str("project:\n  name: np\n").unwrap();
        let rules = cfg.audit_rules();
        assert_eq!(rules, &ValidationConfig::for_rendered_posts());
        assert_eq!(
            rules.required_metadata_fields,
            vec!["bottom_line".to_string(), "between_the_lines".to_string()]
        );
        assert_eq!(rules.headings["tag_badge"], Requirement::Required);
        assert_eq!(rules.headings["summary"], Requirement::Required);
        assert_eq!(rules.expected_system_tags, vec!["nowpattern", "deep-pattern"]);
        assert!(cfg.gate.expected_system_tags.is_empty());
    }

    #[test]
    fn block_classes_resolve_from_class_attribute() {
        let ghost = GhostConfig::default();
        assert_eq!(ghost.block_key("np-tag-badge"), Some("tag_badge"));
        assert_eq!(ghost.block_key("card np-summary wide"), Some("summary"));
        assert_eq!(ghost.block_key("np-fast-read"), None);
    }

    #[test]
    fn validate_flags_alias_to_undeclared_heading() {
        let mut cfg = Config::new("np");
        cfg.ghost
            .block_classes
            .insert("np-sidebar".to_string(), "sidebar".to_string());
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Warning && w.message.contains("np-sidebar")));
    }

    #[test]
    fn default_rules_validate_cleanly() {
        assert!(Config::new("np").validate().is_empty());
    }

    #[test]
    fn validate_flags_inconsistent_rules() {
        let mut rules = ValidationConfig::default();
        rules.canonical_order.push("appendix".to_string());
        rules.headings.insert("sidebar".to_string(), Requirement::Required);
        rules.minimum_word_count_by_language.remove(&Language::En);
        rules.tag_limits.insert(Category::Event, TagLimit { min: 3, max: Some(1) });
        rules.forbidden_patterns.push(NamedPattern::new("broken", "(unclosed"));
        rules
            .scenario_markers
            .entry(Language::En)
            .or_default()
            .push(NamedPattern::new("stray", "[unclosed"));

        let warnings = rules.validate();
        let messages: Vec<&str> = warnings.iter().map(|w| w.message.as_str()).collect();
        assert!(messages.iter().any(|m| m.contains("'appendix'")));
        assert!(messages.iter().any(|m| m.contains("'sidebar'")));
        assert!(messages.iter().any(|m| m.contains("'en'")));
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("event")));
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("broken")));
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("stray")));
    }

    #[test]
    fn tag_limit_bounds() {
        let limit = TagLimit { min: 1, max: Some(2) };
        assert!(!limit.allows(0));
        assert!(limit.allows(2));
        assert!(!limit.allows(3));
        assert_eq!(limit.describe(), "1..=2");
        assert!(TagLimit { min: 0, max: None }.allows(40));
    }

    #[test]
    fn heading_alias_lookup_is_case_insensitive() {
        let ghost = GhostConfig::default();
        assert_eq!(ghost.heading_key("⚡ Now Pattern"), Some("now_pattern"));
        assert_eq!(ghost.heading_key("行間を読む"), Some("between_the_lines"));
        assert_eq!(ghost.heading_key("What&#x27;s Next"), None);
        assert_eq!(ghost.heading_key("Footnotes"), None);
    }

    #[test]
    fn load_missing_config_is_not_initialized() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(GateError::NotInitialized)
        ));
        let cfg = Config::load_or_default(dir.path()).unwrap();
        assert_eq!(cfg.gate, ValidationConfig::default());
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::new("np");
        cfg.taxonomy = PathBuf::from("data/taxonomy.json");
        cfg.save(dir.path()).unwrap();
        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.taxonomy_path(dir.path()), dir.path().join("data/taxonomy.json"));
    }
}
