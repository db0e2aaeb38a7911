use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use edit_tree::file::{atomic_write, read_document};
use edit_tree::script::{load_for_document, BuiltTree, EditScript};
use edit_tree::EditTree;
use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "edit-tree")]
#[command(about = "Apply offset-stable trees of text edits to a file", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply an edit script to a file
    Apply {
        /// Edit script (TOML)
        #[arg(short, long)]
        script: PathBuf,

        /// Document to edit
        file: PathBuf,

        /// Write the result here instead of editing the file in place
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Dry run - show what would change without writing anything
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,

        /// Print the final region of every scripted edit as JSON
        #[arg(long)]
        regions: bool,
    },

    /// Validate an edit script against a file without applying it
    Check {
        /// Edit script (TOML)
        #[arg(short, long)]
        script: PathBuf,

        /// Document the script targets
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "edit_tree=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            script,
            file,
            output,
            dry_run,
            diff,
            regions,
        } => cmd_apply(&script, &file, output, dry_run, diff, regions),

        Commands::Check { script, file } => cmd_check(&script, &file),
    }
}

/// Read the document, then load and build the script against it.
fn prepare(script_path: &Path, file: &Path) -> Result<(EditScript, String, BuiltTree)> {
    let document =
        read_document(file).with_context(|| format!("failed to read {}", file.display()))?;
    let (script, built) = load_for_document(script_path, file, &document)?;
    Ok((script, document, built))
}

fn cmd_check(script_path: &Path, file: &Path) -> Result<()> {
    let (script, _, built) = prepare(script_path, file)?;
    built.tree.validate()?;

    println!(
        "{} {} ({} edits) is valid for {}",
        "✓".green(),
        display_name(&script, script_path),
        script.edits.len(),
        file.display()
    );
    Ok(())
}

fn cmd_apply(
    script_path: &Path,
    file: &Path,
    output: Option<PathBuf>,
    dry_run: bool,
    show_diff: bool,
    regions: bool,
) -> Result<()> {
    let (script, original, mut built) = prepare(script_path, file)?;

    println!("Script: {}", display_name(&script, script_path));
    println!("File: {}", file.display());

    let mut edited = original.clone();
    let report = built.tree.apply(&mut edited)?;

    if show_diff {
        display_diff(file, &original, &edited);
    }

    if regions {
        println!("{}", regions_json(&built)?);
    }

    let destination = output.unwrap_or_else(|| file.to_path_buf());
    if dry_run {
        println!("{}", "[DRY RUN - nothing written]".cyan());
    } else if edited != original || destination != file {
        atomic_write(&destination, edited.as_bytes())?;
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} edits applied", script.edits.len().to_string().green());
    println!("  {} bytes -> {} bytes ({:+})", original.len(), edited.len(), report.delta);
    if !dry_run {
        println!("  Written to {}", destination.display());
    }
    Ok(())
}

fn display_name<'a>(script: &'a EditScript, path: &'a Path) -> std::borrow::Cow<'a, str> {
    if script.meta.name.is_empty() {
        path.to_string_lossy()
    } else {
        std::borrow::Cow::Borrowed(script.meta.name.as_str())
    }
}

#[derive(Serialize)]
struct Region<'a> {
    id: &'a str,
    kind: &'static str,
    offset: usize,
    length: usize,
    deleted: bool,
}

fn regions_json(built: &BuiltTree) -> Result<String> {
    let tree: &EditTree = &built.tree;
    let regions: Vec<Region<'_>> = built
        .ids()
        .map(|(id, edit)| {
            let node = tree.node(edit);
            Region {
                id,
                kind: node.kind().name(),
                offset: node.offset(),
                length: node.length(),
                deleted: node.is_deleted(),
            }
        })
        .collect();
    Ok(serde_json::to_string_pretty(&regions)?)
}

/// Helper: Show unified diff between original and edited content
fn display_diff(file: &Path, original: &str, edited: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (edited)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, edited);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}
