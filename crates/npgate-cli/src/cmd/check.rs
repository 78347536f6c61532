use super::{Invocation, EXIT_VIOLATIONS};
use crate::output::{print_json, print_verdict};
use anyhow::Context;
use npgate_core::document::ArticleDocument;
use npgate_core::validator::Validator;
use std::path::Path;

pub fn run(ctx: &Invocation, document: &Path, strict: bool) -> anyhow::Result<i32> {
    let config = ctx.config()?;
    let taxonomy = ctx.load_taxonomy(&config)?;
    let validator = Validator::new(config.gate).context("invalid gate rules")?;
    let doc = ArticleDocument::load(document).context("failed to load document")?;

    let verdict = validator
        .validate(&doc, &taxonomy)
        .context("document could not be validated")?;
    let verdict = if strict { verdict.into_strict() } else { verdict };

    if ctx.json {
        print_json(&serde_json::json!({
            "slug": doc.slug,
            "grade": verdict.grade(),
            "passed": verdict.passed,
            "violations": verdict.violations,
            "warnings": verdict.warnings,
        }))?;
    } else {
        print_verdict(&verdict);
        println!("{}: {}", doc.slug, verdict.grade().as_str().to_uppercase());
    }

    Ok(if verdict.passed { 0 } else { EXIT_VIOLATIONS })
}
