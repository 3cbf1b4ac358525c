//! Sheetforge - Main entry point.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sheetforge_domain::EnricherRegistry;
use sheetforge_engine::cli::Args;
use sheetforge_engine::infrastructure::{
    export::JsonRecordWriter, importers::load_rules, settings::AppSettings,
};
use sheetforge_engine::use_cases::SheetExporter;

fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sheetforge_engine=info,sheetforge_domain=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let registry = EnricherRegistry::new();

    if args.list_systems {
        for (id, name) in registry.list_systems_with_names() {
            println!("{:<8} {}", id, name);
        }
        return Ok(());
    }

    let settings = args.apply(AppSettings::from_env());
    let input = args
        .input
        .clone()
        .context("an input character sheet is required")?;
    let output = args
        .output_path(&settings)
        .context("could not derive an output path")?;

    let rules = load_rules(&settings.rules_path)
        .with_context(|| format!("loading rules from {}", settings.rules_path.display()))?;
    if rules.is_empty() {
        tracing::warn!(path = %settings.rules_path.display(), "Rule file defines no fields");
    }

    let strategy = registry.select(Some(&settings.enricher));
    let exporter = SheetExporter::new(rules, strategy, Arc::new(JsonRecordWriter::new()));

    let report = exporter
        .export(&input, &output)
        .with_context(|| format!("converting {}", input.display()))?;

    for miss in &report.misses {
        tracing::debug!(%miss, "Missing from sheet");
    }
    if let Some(e) = &report.enrich_error {
        tracing::warn!(error = %e, "Record written without full enrichment");
    }

    tracing::info!(
        output = %output.display(),
        system = exporter.strategy().system_id(),
        scalars = report.record.scalars().count(),
        lists = report.record.lists().count(),
        misses = report.misses.len(),
        "Character sheet converted"
    );
    Ok(())
}

/// Load `.env.local` then `.env` from the workspace root, if present.
fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
