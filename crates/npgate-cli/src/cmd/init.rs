use anyhow::Context;
use npgate_core::{config::Config, io, paths};
use std::path::Path;

pub fn run(root: &Path, name: Option<&str>) -> anyhow::Result<()> {
    let project_name = match name {
        Some(n) => n.to_string(),
        None => root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "nowpattern".to_string()),
    };

    println!("Initializing npgate in: {}", root.display());

    for dir in [
        paths::NPGATE_DIR,
        paths::DRAFTS_DIR,
        paths::PUBLISHED_DIR,
        paths::AUDITS_DIR,
    ] {
        let p = root.join(dir);
        io::ensure_dir(&p).with_context(|| format!("failed to create {}", p.display()))?;
    }

    let cfg = Config::new(&project_name);
    let data = serde_yaml::to_string(&cfg).context("failed to serialize config")?;
    if io::write_if_missing(&paths::config_path(root), data.as_bytes())
        .context("failed to write config.yaml")?
    {
        println!("  created: {}", paths::CONFIG_FILE);
    } else {
        println!("  exists:  {}", paths::CONFIG_FILE);
    }

    let taxonomy = cfg.taxonomy_path(root);
    if !taxonomy.exists() {
        println!(
            "  note:    taxonomy {} not found; place it there or pass --taxonomy",
            taxonomy.display()
        );
    }
    Ok(())
}
