use anyhow::{Context, Result};
use clap::Parser;
use std::collections::BTreeMap;
use std::path::PathBuf;
use steptimer::{cli::Cli, inspect, TimerExport};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.debug);

    let mut exports: Vec<(PathBuf, TimerExport)> = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let export = TimerExport::from_file(path)
            .with_context(|| format!("Failed to load timer summary {}", path.display()))?;
        tracing::debug!(path = %path.display(), events = export.events.len(), "Loaded export");
        exports.push((path.clone(), export));
    }

    if args.json {
        let by_path: BTreeMap<String, &TimerExport> = exports
            .iter()
            .map(|(path, export)| (path.display().to_string(), export))
            .collect();
        println!("{}", serde_json::to_string_pretty(&by_path)?);
        return Ok(());
    }

    for (i, (path, export)) in exports.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("=== {} ===", path.display());
        print!("{}", inspect::render_export(export, args.sort));
    }

    Ok(())
}
