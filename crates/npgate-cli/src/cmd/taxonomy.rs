use super::Invocation;
use crate::output::{print_json, print_table};
use clap::Subcommand;
use npgate_core::taxonomy::TaxonomyEntry;
use npgate_core::types::{Category, Language};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum TaxonomySubcommand {
    /// List taxonomy entries
    List {
        /// Only entries of this category: genre, event or dynamics
        #[arg(long)]
        category: Option<Category>,
    },

    /// Show one entry by slug
    Show { slug: String },

    /// Resolve a display name to its slug
    Resolve {
        /// Display name, e.g. "地政学・安全保障"
        name: String,
        /// Language of the display name: ja or en
        #[arg(long, default_value = "ja")]
        lang: Language,
    },

    /// Load the taxonomy and report problems
    Check,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(ctx: &Invocation, subcmd: TaxonomySubcommand) -> anyhow::Result<()> {
    match subcmd {
        TaxonomySubcommand::List { category } => list(ctx, category),
        TaxonomySubcommand::Show { slug } => show(ctx, &slug),
        TaxonomySubcommand::Resolve { name, lang } => resolve(ctx, &name, lang),
        TaxonomySubcommand::Check => check(ctx),
    }
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

fn list(ctx: &Invocation, category: Option<Category>) -> anyhow::Result<()> {
    let config = ctx.config()?;
    let taxonomy = ctx.load_taxonomy(&config)?;
    let entries: Vec<&TaxonomyEntry> = taxonomy
        .entries()
        .iter()
        .filter(|e| category.map_or(true, |c| e.category == c))
        .collect();

    if ctx.json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No taxonomy entries.");
        return Ok(());
    }
    let rows = entries
        .iter()
        .map(|e| {
            vec![
                e.slug.clone(),
                e.category.to_string(),
                e.name_ja.clone(),
                e.name_en.clone(),
            ]
        })
        .collect();
    print_table(&["SLUG", "CATEGORY", "NAME (JA)", "NAME (EN)"], rows);
    Ok(())
}

// ---------------------------------------------------------------------------
// show / resolve
// ---------------------------------------------------------------------------

fn show(ctx: &Invocation, slug: &str) -> anyhow::Result<()> {
    let config = ctx.config()?;
    let taxonomy = ctx.load_taxonomy(&config)?;
    let entry = taxonomy.lookup_by_slug(slug)?;

    if ctx.json {
        return print_json(entry);
    }
    println!("Slug:     {}", entry.slug);
    println!("Category: {}", entry.category);
    for lang in Language::all() {
        println!("Name ({lang}): {}", entry.name(*lang));
        let desc = entry.description(*lang);
        if !desc.is_empty() {
            println!("  {desc}");
        }
    }
    Ok(())
}

fn resolve(ctx: &Invocation, name: &str, lang: Language) -> anyhow::Result<()> {
    let config = ctx.config()?;
    let taxonomy = ctx.load_taxonomy(&config)?;
    let entry = taxonomy.lookup_by_display_name(name, lang)?;

    if ctx.json {
        return print_json(&serde_json::json!({
            "slug": entry.slug,
            "category": entry.category,
        }));
    }
    println!("{}", entry.slug);
    Ok(())
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

fn check(ctx: &Invocation) -> anyhow::Result<()> {
    let config = ctx.config()?;
    let taxonomy = ctx.load_taxonomy(&config)?;

    let mut problems: Vec<String> = taxonomy
        .duplicate_names()
        .into_iter()
        .map(|(lang, name, slugs)| {
            format!(
                "{lang} name '{name}' is shared by {}; resolving it will fail",
                slugs.join(", ")
            )
        })
        .collect();
    // CMS posts carry no category, so it is inferred from the slug prefix.
    problems.extend(
        taxonomy
            .entries()
            .iter()
            .filter(|e| Category::from_slug_convention(&e.slug) != e.category)
            .map(|e| {
                format!(
                    "'{}' is a {} entry but its slug reads as {}",
                    e.slug,
                    e.category,
                    Category::from_slug_convention(&e.slug)
                )
            }),
    );

    let counts: Vec<(Category, usize)> = Category::all()
        .iter()
        .map(|c| (*c, taxonomy.in_category(*c).count()))
        .collect();

    if ctx.json {
        let counts: serde_json::Map<String, serde_json::Value> = counts
            .iter()
            .map(|(c, n)| (c.to_string(), serde_json::Value::from(*n)))
            .collect();
        return print_json(&serde_json::json!({
            "path": ctx.taxonomy_path(&config),
            "entries": taxonomy.len(),
            "counts": counts,
            "warnings": problems,
        }));
    }

    let summary: Vec<String> = counts.iter().map(|(c, n)| format!("{c} {n}")).collect();
    println!(
        "Taxonomy OK: {} entries ({})",
        taxonomy.len(),
        summary.join(", ")
    );
    for p in &problems {
        println!("[warning] {p}");
    }
    Ok(())
}
