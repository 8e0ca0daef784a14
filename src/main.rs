//! Kinetree CLI - Command-line tool for robot model hierarchy export.
//!
//! This is the main entry point for the Kinetree command-line application.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

use kinetree::prelude::*;

/// Kinetree - segment hierarchy and URDF export tool
#[derive(Parser)]
#[command(name = "kinetree")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert YAML model specifications to URDF
    UrdfExport {
        /// Input YAML files (glob patterns allowed)
        #[arg(short, long, required = true, num_args = 1.., env = "KINETREE_INPUT")]
        input: Vec<String>,

        /// Output directory, or a .urdf file for a single input
        #[arg(short, long, env = "KINETREE_OUTPUT")]
        output: PathBuf,

        /// Attach segments with unknown parents as extra roots
        #[arg(long)]
        lenient: bool,
    },

    /// Print the nested segment hierarchy of a model
    Tree {
        /// Input YAML file
        #[arg(short, long)]
        input: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = TreeFormat::Xml)]
        format: TreeFormat,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Attach segments with unknown parents as extra roots
        #[arg(long)]
        lenient: bool,
    },

    /// Validate model hierarchies without writing anything
    Check {
        /// Input YAML files (glob patterns allowed)
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<String>,

        /// Attach segments with unknown parents as extra roots
        #[arg(long)]
        lenient: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TreeFormat {
    Xml,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::UrdfExport { input, output, lenient } => {
            cmd_urdf_export(&input, &output, policy(lenient))?;
        }
        Commands::Tree {
            input,
            format,
            output,
            lenient,
        } => {
            cmd_tree(&input, format, output.as_deref(), policy(lenient))?;
        }
        Commands::Check { input, lenient } => {
            cmd_check(&input, policy(lenient))?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("KINETREE_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn policy(lenient: bool) -> OrphanPolicy {
    if lenient {
        OrphanPolicy::Lenient
    } else {
        OrphanPolicy::Strict
    }
}

/// Expand glob patterns; plain paths pass through unchanged.
fn expand_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        if !pattern.contains(['*', '?', '[']) {
            paths.push(PathBuf::from(pattern));
            continue;
        }

        let before = paths.len();
        for entry in glob::glob(pattern).with_context(|| format!("Invalid glob pattern: {}", pattern))? {
            paths.push(entry.context("Failed to read glob match")?);
        }
        if paths.len() == before {
            tracing::warn!(pattern = %pattern, "pattern matched no files");
        }
    }

    if paths.is_empty() {
        anyhow::bail!("No input files");
    }

    Ok(paths)
}

fn load(path: &Path, policy: OrphanPolicy) -> Result<UrdfExporter> {
    let exporter = UrdfExporter::from_path(path)
        .with_context(|| format!("Failed to load model: {}", path.display()))?;
    Ok(exporter.with_orphan_policy(policy))
}

fn cmd_urdf_export(inputs: &[String], output: &Path, policy: OrphanPolicy) -> Result<()> {
    let inputs = expand_inputs(inputs)?;

    let targets = plan_targets(inputs, output)?;
    let single_file = matches!(targets.as_slice(), [(_, target)] if target == output);

    if single_file {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
    } else {
        fs::create_dir_all(output)
            .with_context(|| format!("Failed to create output directory: {}", output.display()))?;
    }

    println!("Exporting {} models to {}...", targets.len(), output.display());

    let pb = ProgressBar::new(targets.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let failures: Vec<(PathBuf, anyhow::Error)> = targets
        .par_iter()
        .filter_map(|(input, target)| {
            let result = load(input, policy).and_then(|exporter| {
                exporter
                    .export(target)
                    .with_context(|| format!("Failed to export {}", target.display()))
            });
            pb.inc(1);
            result.err().map(|e| (input.clone(), e))
        })
        .collect();

    pb.finish_with_message("Done");

    for (input, error) in &failures {
        eprintln!("Error exporting {}: {:#}", input.display(), error);
    }

    println!(
        "Exported {} models in {:?} ({} errors)",
        targets.len() - failures.len(),
        start.elapsed(),
        failures.len()
    );

    if !failures.is_empty() {
        anyhow::bail!("{} of {} models failed to export", failures.len(), targets.len());
    }

    Ok(())
}

/// Pair every input with its URDF output path.
///
/// A single input may name the output file directly; otherwise each model is
/// written to `<output>/<stem>.urdf`. Two inputs mapping to the same file are
/// rejected before anything is written.
fn plan_targets(inputs: Vec<PathBuf>, output: &Path) -> Result<Vec<(PathBuf, PathBuf)>> {
    let single_file = inputs.len() == 1 && output.extension().is_some_and(|ext| ext == "urdf");
    let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::with_capacity(inputs.len());
    let mut targets = Vec::with_capacity(inputs.len());

    for input in inputs {
        let target = if single_file {
            output.to_path_buf()
        } else {
            let stem = input.file_stem().unwrap_or(input.as_os_str());
            output.join(stem).with_extension("urdf")
        };

        if let Some(previous) = claimed.insert(target.clone(), input.clone()) {
            anyhow::bail!(
                "{} and {} would both be written to {}",
                previous.display(),
                input.display(),
                target.display()
            );
        }
        targets.push((input, target));
    }

    Ok(targets)
}

fn cmd_tree(input: &Path, format: TreeFormat, output: Option<&Path>, policy: OrphanPolicy) -> Result<()> {
    let exporter = load(input, policy)?;
    let segments = exporter.summary_segments();
    let tree = HierarchyExporter::new(&segments)
        .with_policy(policy)
        .export()
        .with_context(|| format!("Invalid hierarchy in {}", input.display()))?;

    let rendered = match format {
        TreeFormat::Xml => tree
            .to_xml_string(&XmlOptions::default())
            .context("Failed to render XML")?,
        TreeFormat::Json => serde_json::to_string_pretty(&tree).context("Failed to render JSON")?,
    };

    match output {
        Some(path) => {
            fs::write(path, rendered).with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {} segments to {}", tree.len(), path.display());
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

fn cmd_check(inputs: &[String], policy: OrphanPolicy) -> Result<()> {
    let inputs = expand_inputs(inputs)?;
    let mut errors = 0;

    for input in &inputs {
        match check_one(input, policy) {
            Ok((segments, roots, depth)) => {
                println!(
                    "{}: ok ({} segments, {} roots, depth {})",
                    input.display(),
                    segments,
                    roots,
                    depth
                );
            }
            Err(e) => {
                eprintln!("{}: {:#}", input.display(), e);
                errors += 1;
            }
        }
    }

    println!("\nChecked {} models ({} errors)", inputs.len(), errors);

    if errors > 0 {
        anyhow::bail!("{} models failed validation", errors);
    }

    Ok(())
}

fn check_one(input: &Path, policy: OrphanPolicy) -> Result<(usize, usize, usize)> {
    let exporter = load(input, policy)?;
    // Resolving links also validates joint types and geometry
    let segments = exporter.segments()?;
    let map = HierarchyExporter::new(&segments).with_policy(policy).adjacency()?;

    Ok((map.len(), map.roots().count(), map.depth()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_use_file_stem() {
        let inputs = vec![PathBuf::from("models/golfer.yaml"), PathBuf::from("arm.yml")];
        let targets = plan_targets(inputs, Path::new("out")).unwrap();
        assert_eq!(targets[0].1, PathBuf::from("out/golfer.urdf"));
        assert_eq!(targets[1].1, PathBuf::from("out/arm.urdf"));
    }

    #[test]
    fn test_single_input_to_named_file() {
        let targets = plan_targets(vec![PathBuf::from("golfer.yaml")], Path::new("build/model.urdf")).unwrap();
        assert_eq!(targets, [(PathBuf::from("golfer.yaml"), PathBuf::from("build/model.urdf"))]);
    }

    #[test]
    fn test_shared_stem_rejected() {
        let inputs = vec![PathBuf::from("a/golfer.yaml"), PathBuf::from("b/golfer.yaml")];
        let err = plan_targets(inputs, Path::new("out")).unwrap_err();
        assert!(err.to_string().contains("golfer.urdf"));
    }
}
