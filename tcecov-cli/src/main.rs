//! tcecov CLI - Resolve, merge and summarise test coverage data

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tcecov_core::config::{CONFIG_FILE_NAME, DEFAULT_CONFIG};
use tcecov_core::{
    collect_summaries, file_checksum, render_html, Config, CounterReport, CovError,
    ProcessMerger, TreeResolver,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tcecov")]
#[command(about = "Resolve, merge and summarise test coverage data", long_about = None)]
struct Cli {
    /// Config file (TOML, or JSON with a .json extension)
    #[arg(long, global = true, default_value = CONFIG_FILE_NAME, env = "TCECOV_CONFIG")]
    config: PathBuf,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init,

    /// Point .gcov artifacts at local sources, dropping unresolvable ones
    Resolve {
        /// Artifact directory (default: tcedir from config)
        dir: Option<PathBuf>,
    },

    /// Merge a counter file into another
    Merge {
        /// Counter file merged into
        primary: PathBuf,

        /// Counter file merged from
        secondary: PathBuf,

        /// Build root the secondary file was produced in (default: platform_build_root)
        #[arg(long)]
        other_build_root: Option<PathBuf>,

        /// Write the result here instead of over the primary file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Roll the configured summary pages up into one HTML report
    Summary {
        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Report title
        #[arg(long, default_value = "Test coverage summary")]
        title: String,
    },

    /// Print `cksum`-style checksums of source files
    Checksum {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    // stdout carries command output only
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Init => cmd_init(&cli.config),
        Commands::Resolve { dir } => cmd_resolve(&cli.config, dir, cli.json),
        Commands::Merge {
            primary,
            secondary,
            other_build_root,
            output,
        } => cmd_merge(
            &cli.config,
            &primary,
            &secondary,
            other_build_root,
            output,
            cli.json,
        ),
        Commands::Summary { output, title } => cmd_summary(&cli.config, output, &title, cli.json),
        Commands::Checksum { files } => cmd_checksum(&files, cli.json),
    };

    if let Err(e) = result {
        tracing::debug!(error = ?e, "command failed");
        if cli.json {
            let error_json = serde_json::json!({ "code": e.code(), "message": e.to_string() });
            eprintln!("{}", error_json);
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

fn print_json(value: &impl serde::Serialize) -> tcecov_core::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_init(config_path: &Path) -> tcecov_core::Result<()> {
    use colored::Colorize;

    if config_path.exists() {
        return Err(CovError::ConfigExists(config_path.to_path_buf()));
    }
    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(config_path, DEFAULT_CONFIG)?;

    println!("{} {}", "Created".green(), config_path.display());
    Ok(())
}

fn cmd_resolve(config_path: &Path, dir: Option<PathBuf>, json: bool) -> tcecov_core::Result<()> {
    use colored::Colorize;

    let config = Config::load(config_path)?;
    let dir = dir.unwrap_or_else(|| config.tcedir.clone());
    let summary = TreeResolver::new(config.resolver())
        .with_unresolved_output(config.unresolved_output.clone())
        .resolve_dir(&dir)?;

    if json {
        return print_json(&summary);
    }

    println!(
        "{}: {} artifacts ({} rewritten, {} unchanged)",
        "Resolved".green(),
        summary.scanned - summary.removed,
        summary.rewritten,
        summary.untouched
    );
    if summary.removed > 0 {
        println!(
            "{}: {} artifacts with unresolved sources",
            "Removed".yellow(),
            summary.removed
        );
        for source in &summary.unresolved {
            println!("  {}", source.dimmed());
        }
    }
    Ok(())
}

fn cmd_merge(
    config_path: &Path,
    primary: &Path,
    secondary: &Path,
    other_build_root: Option<PathBuf>,
    output: Option<PathBuf>,
    json: bool,
) -> tcecov_core::Result<()> {
    use colored::Colorize;

    let config = Config::load(config_path)?;
    let merger = Arc::new(ProcessMerger::from_config(&config)?);
    // Checksums are taken from the build tree as seen on this machine
    let own_root = config.platform_build_root().to_path_buf();
    let other_root = other_build_root.unwrap_or_else(|| own_root.clone());

    let mut report = CounterReport::read(primary, own_root, merger.clone())?;
    let other = CounterReport::read(secondary, other_root, merger)?;
    let incoming = other.len();
    report.merge_from(other)?;

    let output = output.unwrap_or_else(|| primary.to_path_buf());
    report.write(&output)?;

    if json {
        return print_json(&serde_json::json!({
            "output": output,
            "merged": incoming,
            "records": report.len(),
        }));
    }
    println!(
        "{}: {} records into {} ({} total)",
        "Merged".green(),
        incoming,
        output.display(),
        report.len()
    );
    Ok(())
}

fn cmd_summary(
    config_path: &Path,
    output: Option<PathBuf>,
    title: &str,
    json: bool,
) -> tcecov_core::Result<()> {
    use colored::Colorize;

    let config = Config::load(config_path)?;
    let tree = collect_summaries(&config)?;
    let html = render_html(&tree, title);

    match &output {
        Some(path) => std::fs::write(path, &html)?,
        None if !json => print!("{}", html),
        None => {}
    }

    if json {
        let total = tree.total();
        return print_json(&serde_json::json!({
            "output": output,
            "total": total,
            "lines": total.line_percent(),
            "branches": total.branch_percent(),
        }));
    }
    if let Some(path) = output {
        let total = tree.total();
        println!(
            "{}: {} ({} files, lines {}, branches {})",
            "Wrote".green(),
            path.display(),
            total.files,
            total.line_percent(),
            total.branch_percent()
        );
    }
    Ok(())
}

fn cmd_checksum(files: &[PathBuf], json: bool) -> tcecov_core::Result<()> {
    let mut sums = Vec::with_capacity(files.len());
    for file in files {
        sums.push((file, file_checksum(file)?));
    }

    if json {
        let entries: Vec<_> = sums
            .iter()
            .map(|(file, sum)| {
                serde_json::json!({ "file": file, "checksum": sum.checksum, "bytes": sum.bytes })
            })
            .collect();
        return print_json(&entries);
    }
    for (file, sum) in sums {
        println!("{} {} {}", sum.checksum, sum.bytes, file.display());
    }
    Ok(())
}
