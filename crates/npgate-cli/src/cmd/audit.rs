use super::Invocation;
use crate::output::print_json;
use anyhow::Context;
use clap::Args;
use npgate_core::audit::{AuditReporter, CorpusSource, Detail, DirectorySource};
use npgate_core::ghost::{GhostApiSource, GhostExportSource};
use npgate_core::validator::Validator;
use npgate_core::{io, paths};

#[derive(Args)]
pub struct AuditArgs {
    /// Directory of article files, a Ghost posts JSON file (--ghost-export)
    /// or a Ghost site URL (--ghost-api). Defaults to .npgate/published, or
    /// the configured Ghost URL with --ghost-api.
    source: Option<String>,

    /// Read posts from a Ghost API response saved to a file
    #[arg(long, conflicts_with = "ghost_api")]
    ghost_export: bool,

    /// Fetch published posts from the Ghost Content API
    #[arg(long, requires = "key")]
    ghost_api: bool,

    /// Ghost Content API key
    #[arg(long, env = "GHOST_CONTENT_API_KEY", hide_env_values = true)]
    key: Option<String>,

    /// Audit only the article with this slug
    #[arg(long)]
    slug: Option<String>,

    /// Also list warnings, and the articles that only have warnings
    #[arg(long)]
    warnings: bool,

    /// Also list the articles that passed
    #[arg(long)]
    all: bool,

    /// Also write the text report to .npgate/audits/
    #[arg(long)]
    save: bool,
}

pub fn run(ctx: &Invocation, args: AuditArgs) -> anyhow::Result<()> {
    let config = ctx.config()?;
    let taxonomy = ctx.load_taxonomy(&config)?;
    // Rendered Ghost posts get the audit rules; local files went through
    // the gate and are held to the gate rules.
    let from_ghost = args.ghost_api || args.ghost_export;
    let rules = if from_ghost {
        config.audit_rules().clone()
    } else {
        config.gate.clone()
    };
    let metadata_fields = rules.required_metadata_fields.clone();
    let validator = Validator::new(rules).context("invalid audit rules")?;

    let source: Box<dyn CorpusSource> = if args.ghost_api {
        let url = args.source.unwrap_or_else(|| config.ghost.url.clone());
        let key = args.key.unwrap_or_default();
        let mut api = GhostApiSource::new(url, key, config.ghost.clone(), metadata_fields)
            .context("failed to build Ghost API client")?;
        if let Some(slug) = &args.slug {
            api = api.with_slug(slug);
        }
        Box::new(api)
    } else if args.ghost_export {
        let path = args
            .source
            .context("--ghost-export needs the path of the exported posts file")?;
        Box::new(GhostExportSource::new(path, config.ghost.clone(), metadata_fields))
    } else {
        let dir = args
            .source
            .map(Into::into)
            .unwrap_or_else(|| paths::published_dir(&ctx.root));
        Box::new(DirectorySource::new(dir))
    };

    let mut reporter = AuditReporter::new(validator, &taxonomy);
    if let Some(slug) = args.slug {
        reporter = reporter.only(slug);
    }
    let report = reporter.run(source.as_ref()).context("audit failed")?;

    let detail = if args.all {
        Detail::All
    } else if args.warnings {
        Detail::Warnings
    } else {
        Detail::Failures
    };
    let text = report.render_text(detail);

    if ctx.json {
        print_json(&report)?;
    } else {
        print!("{text}");
    }

    if args.save {
        let name = format!("{}.txt", report.generated_at.format("%Y%m%dT%H%M%SZ"));
        let path = paths::audits_dir(&ctx.root).join(name);
        io::atomic_write(&path, text.as_bytes())
            .with_context(|| format!("failed to save report to {}", path.display()))?;
        eprintln!("Saved report to {}", path.display());
    }
    Ok(())
}
