use super::{Invocation, EXIT_INVALID_INPUT, EXIT_VIOLATIONS};
use crate::output::{print_json, print_verdict};
use anyhow::Context;
use npgate_core::document::ArticleDocument;
use npgate_core::gate::{Disposition, FsPublisher, PublicationGate};
use npgate_core::paths;
use npgate_core::validator::{ViolationKind, Validator};
use std::path::Path;

pub fn run(ctx: &Invocation, document: &Path, strict: bool) -> anyhow::Result<i32> {
    let config = ctx.config()?;
    let taxonomy = ctx.load_taxonomy(&config)?;
    let validator = Validator::new(config.gate).context("invalid gate rules")?;
    let doc = ArticleDocument::load(document).context("failed to load document")?;

    let gate = PublicationGate::new(validator, &taxonomy).strict(strict);
    let mut publisher = FsPublisher::new(&ctx.root);
    let outcome = gate
        .submit(&doc, &mut publisher)
        .context("failed to store article")?;

    if ctx.json {
        print_json(&outcome)?;
    } else {
        print_verdict(&outcome.verdict);
        match outcome.disposition {
            Disposition::Published => println!(
                "Published '{}' -> {}",
                outcome.slug,
                paths::published_path(&ctx.root, &outcome.slug).display()
            ),
            Disposition::Draft => println!(
                "Blocked '{}': kept as draft in {}",
                outcome.slug,
                paths::drafts_dir(&ctx.root).display()
            ),
        }
    }

    Ok(match outcome.disposition {
        Disposition::Published => 0,
        Disposition::Draft if outcome.verdict.has(ViolationKind::InvalidDocument) => {
            EXIT_INVALID_INPUT
        }
        Disposition::Draft => EXIT_VIOLATIONS,
    })
}
