//! Curation command line for the charges catalog.
//!
//! Analytics (the co-occurrence graph and the temporal distribution) are a
//! library concern consumed by the rendering widgets; this binary only
//! carries the dataset hygiene chores: checking that the catalog loads,
//! stripping upload hashes from image filenames, and pruning image files no
//! entry references anymore.

use anyhow::Context;
use charge_catalog::{maintenance, Catalog, CooccurrenceGraph, Timeline};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::{Path, PathBuf};

/// Curation toolbox for the charges catalog
#[derive(Parser, Debug)]
#[command(version, author)]
struct Args {
    /// Path to the catalog JSON file
    #[arg(short, long, default_value = "data/charges.json")]
    catalog: PathBuf,

    #[command(subcommand)]
    command: Command,
}

/// What to do with the catalog
#[derive(Subcommand, Debug)]
enum Command {
    /// Load the catalog and report what the analytical views would see
    ///
    /// Fails with the index and reason of the first malformed record, which
    /// makes it a cheap pre-publication sanity check after hand edits.
    Check,

    /// Strip upload-hash suffixes from image filenames
    ///
    /// Renames the files in the image folder and rewrites the catalog's
    /// image_url fields to match, backing up the catalog file first.
    NormalizeFilenames {
        /// Folder holding the image files
        #[arg(short, long, default_value = "data/img")]
        images: PathBuf,

        /// Preview the rename plan without touching files or the catalog
        #[arg(long)]
        dry_run: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete image files that no catalog entry references
    PruneImages {
        /// Folder holding the image files
        #[arg(short, long, default_value = "data/img")]
        images: PathBuf,

        /// List the orphaned images without deleting anything
        #[arg(long)]
        dry_run: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

fn main() -> anyhow::Result<()> {
    // Set up logging
    setup_logging().map_err(|e| anyhow::format_err!("{e}"))?;

    // Decode CLI arguments
    let args = Args::parse();
    match args.command {
        Command::Check => check(&args.catalog),
        Command::NormalizeFilenames {
            images,
            dry_run,
            yes,
        } => normalize_filenames(&args.catalog, &images, dry_run, yes),
        Command::PruneImages {
            images,
            dry_run,
            yes,
        } => prune_images(&args.catalog, &images, dry_run, yes),
    }
}

/// Load the catalog and summarize the derived views
fn check(catalog_path: &Path) -> anyhow::Result<()> {
    let catalog = Catalog::from_path(catalog_path).context("loading the catalog")?;
    let graph = CooccurrenceGraph::from_catalog(&catalog);
    let by_theme = Timeline::by_theme(&catalog);
    let by_category = Timeline::by_category(&catalog);

    println!(
        "{} records loaded from {}",
        catalog.len(),
        catalog_path.display()
    );
    match (
        catalog.records().iter().map(|r| r.year).min(),
        catalog.records().iter().map(|r| r.year).max(),
    ) {
        (Some(first), Some(last)) => println!("publication years {first}..={last}"),
        _ => println!("catalog is empty"),
    }
    println!(
        "{} themes, {} co-occurring theme pairs",
        graph.nodes().len(),
        graph.edges().len()
    );
    println!(
        "{} theme timeline cells, {} categories",
        by_theme.cells().len(),
        by_category.keys().len()
    );
    for node in graph.nodes().iter().take(5) {
        println!("  {:>5}  {}", node.frequency, node.theme);
    }
    Ok(())
}

/// Preview and apply the image filename normalization
fn normalize_filenames(
    catalog_path: &Path,
    image_dir: &Path,
    dry_run: bool,
    yes: bool,
) -> anyhow::Result<()> {
    let mut entries =
        maintenance::read_entries(catalog_path).context("reading the catalog entries")?;
    let plan = maintenance::plan_renames(&entries, image_dir);

    for (filename, reason) in &plan.skipped {
        println!("skipping {filename}: {reason}");
    }
    if plan.ops.is_empty() {
        println!("No files need normalization.");
        return Ok(());
    }
    println!("Found {} files to normalize:", plan.ops.len());
    for op in &plan.ops {
        println!("  {} -> {}", op.from.display(), op.to.display());
    }
    if dry_run {
        println!("Dry run: no files or catalog entries were modified.");
        return Ok(());
    }
    if !confirmed(
        &format!("Rename {} files and rewrite the catalog?", plan.ops.len()),
        yes,
    )? {
        println!("Operation cancelled.");
        return Ok(());
    }

    let renamed = maintenance::apply_renames(&plan, &mut entries);
    if renamed > 0 {
        maintenance::write_entries_with_backup(catalog_path, &entries)
            .context("rewriting the catalog file")?;
    }
    println!("Normalized {renamed} files and updated the catalog.");
    Ok(())
}

/// List and delete image files that no catalog entry references
fn prune_images(
    catalog_path: &Path,
    image_dir: &Path,
    dry_run: bool,
    yes: bool,
) -> anyhow::Result<()> {
    let entries =
        maintenance::read_entries(catalog_path).context("reading the catalog entries")?;
    let orphans = maintenance::unreferenced_images(&entries, image_dir)
        .context("scanning the image folder")?;

    if orphans.is_empty() {
        println!("No unreferenced images found.");
        return Ok(());
    }
    println!("Found {} unreferenced image(s):", orphans.len());
    for name in &orphans {
        println!("  {name}");
    }
    if dry_run {
        println!("Dry run: no files were deleted.");
        return Ok(());
    }
    if !confirmed(
        &format!("Delete these {} unreferenced images?", orphans.len()),
        yes,
    )? {
        println!("Operation cancelled.");
        return Ok(());
    }

    let deleted = maintenance::delete_images(image_dir, &orphans);
    println!("Deleted {deleted} unreferenced images.");
    Ok(())
}

/// Ask before touching files, unless --yes was passed
fn confirmed(prompt: &str, yes: bool) -> anyhow::Result<bool> {
    if yes {
        return Ok(true);
    }
    Ok(dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

/// Set up logging
fn setup_logging() -> syslog::Result<()> {
    syslog::init(
        syslog::Facility::LOG_USER,
        if cfg!(feature = "log-trace") {
            LevelFilter::Trace
        } else if cfg!(debug_assertions) {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        },
        None,
    )
}
