//! Shared fixtures for unit tests.

use crate::document::ArticleDocument;
use crate::taxonomy::TaxonomyStore;
use crate::types::{Category, Language};

pub const TAXONOMY_JSON: &str = r#"{
  "genres": [
    {"slug": "geopolitics", "name_ja": "地政学・安全保障", "name_en": "Geopolitics & Security"},
    {"slug": "energy", "name_ja": "エネルギー", "name_en": "Energy"},
    {"slug": "finance", "name_ja": "金融・市場", "name_en": "Finance & Markets"}
  ],
  "events": [
    {"slug": "event-deal", "name_ja": "取引・再編", "name_en": "Deal & Restructuring"}
  ],
  "dynamics": [
    {"slug": "p-escalation-spiral", "name_ja": "対立の螺旋", "name_en": "Escalation Spiral"},
    {"slug": "p-moral-hazard", "name_ja": "モラルハザード", "name_en": "Moral Hazard"}
  ]
}"#;

pub fn taxonomy() -> TaxonomyStore {
    TaxonomyStore::from_json_str(TAXONOMY_JSON).unwrap()
}

/// A document that satisfies every default rule for `language`.
pub fn complete_doc(slug: &str, language: Language) -> ArticleDocument {
    let scenarios = match language {
        Language::Ja => "基本シナリオは保険料の高止まり。楽観シナリオは停戦、悲観シナリオは封鎖。",
        Language::En => "Base case: premiums hold. Bull case: a ceasefire. Bear case: closure.",
    };
    ArticleDocument::new(slug, "Tanker insurance is the real Hormuz chokepoint", language)
        .with_section("bottom_line", "Insurers, not navies, decide who sails.")
        .with_section("tag_badge", "geopolitics / escalation")
        .with_section("summary", "War-risk cover, not warships, sets the pace of the standoff.")
        .with_section("why_it_matters", "A fifth of seaborne oil passes here.")
        .with_section("what_happened", "Premiums tripled in a week.")
        .with_section("big_picture", "Every Gulf crisis since 1984 ran through Lloyd's.")
        .with_section("between_the_lines", "Nobody wants to be the first to blink.")
        .with_section("now_pattern", "Escalation spiral with a narrow off-ramp.")
        .with_section("pattern_history", "1987 reflagging, 2019 tanker seizures.")
        .with_section("whats_next", scenarios)
        .with_section("open_loop", "Watch the next war-risk circular.")
        .with_tag("geopolitics", Category::Genre)
        .with_tag("event-deal", Category::Event)
        .with_tag("p-escalation-spiral", Category::Dynamics)
        .with_metadata("bottom_line", "Insurers, not navies, decide who sails.")
        .with_metadata("bottom_line_pattern", "Escalation spiral")
        .with_metadata("bottom_line_scenario", "Premiums stay high through Q3")
        .with_metadata("bottom_line_watch", "JWC circular, 2026-11-02")
        .with_metadata("between_the_lines", "Nobody wants to be the first to blink.")
        .with_metadata("open_loop_trigger", "Next JWC listed-areas update")
        .with_metadata("open_loop_series", "Chokepoint insurance")
        .with_word_count(7000)
}
