use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use serde_json::json;
use skydm_diff::{ChangeLog, DiffOptions, StructuralDiff};
use skydm_format::{DiskBackend, FormatBackend};
use skydm_fuzzy::best_match_index;
use skydm_product::{Config, DataModel, ExpandedFile, ProductContext, ProductList};
use skydm_types::{TracingWarnings, VersionPair};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let format = cli.format;
    match cli.command {
        Command::Match(args) => cmd_match(args, &config, format),
        Command::Products(args) => cmd_products(args, &config, format),
        Command::Expand(args) => cmd_expand(args, &config, format),
        Command::Changelog(args) => cmd_changelog(args, &config, format),
        Command::Diff(args) => cmd_diff(args, &config, format),
    }
}

fn load_products(source: &ProductSource, context: &ProductContext) -> anyhow::Result<ProductList> {
    let datamodel = match &source.datamodel {
        Some(path) => DataModel::load(path)?,
        None => DataModel::default(),
    };
    datamodel
        .load_products(&source.products, context)
        .with_context(|| format!("loading {}", source.products.display()))
}

fn context(config: &Config) -> ProductContext {
    ProductContext::from_config(config, Arc::new(DiskBackend), Arc::new(TracingWarnings))
}

fn print_json(value: serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn cmd_match(args: MatchArgs, config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let min_score = args.min_score.unwrap_or(config.min_score);
    let found = best_match_index(&args.query, &args.candidates, min_score)?;
    match format {
        OutputFormat::Json => print_json(json!({
            "query": args.query,
            "match": found.candidate,
            "index": found.index,
            "score": found.score,
        })),
        OutputFormat::Text => {
            println!("{} (score {})", found.candidate.green().bold(), found.score);
            Ok(())
        }
    }
}

fn cmd_products(args: ProductsArgs, config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let products = load_products(&args.source, &context(config))?;
    match format {
        OutputFormat::Json => print_json(
            products
                .iter()
                .map(|p| {
                    json!({
                        "key": p.key(),
                        "name": p.name(),
                        "datatype": p.datatype().as_str(),
                        "versions": p.versions(),
                    })
                })
                .collect(),
        ),
        OutputFormat::Text => {
            if products.is_empty() {
                println!("No products.");
            }
            for product in &products {
                println!(
                    "{} ({}) {}",
                    product.name().bold(),
                    product.datatype().as_str().cyan(),
                    product.versions().join(", ").dimmed()
                );
            }
            Ok(())
        }
    }
}

fn file_json(file: &ExpandedFile) -> serde_json::Value {
    json!({
        "version": file.version(),
        "path": file.fullpath().map(|p| p.display().to_string()),
        "exists": file.file_exists(),
    })
}

fn cmd_expand(args: ExpandArgs, config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let mut products = load_products(&args.source, &context(config))?;
    let product = products.get_mut(args.product.as_str())?;
    let name = product.name().to_string();
    let expanded = product.expand_product()?;
    match format {
        OutputFormat::Json => print_json(json!({
            "product": name,
            "versions": expanded.iter().map(file_json).collect::<Vec<_>>(),
        })),
        OutputFormat::Text => {
            println!("{}", name.bold());
            for file in expanded {
                let status = if file.file_exists() { "✓".green() } else { "✗".red() };
                let path = file
                    .fullpath()
                    .map_or_else(|| "(placeholder)".dimmed().to_string(), |p| p.display().to_string());
                println!("  {} {} {}", status, file.version().yellow(), path);
            }
            Ok(())
        }
    }
}

fn cmd_changelog(args: ChangelogArgs, config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let mut config = config.clone();
    config.full_report |= args.full;
    let mut products = load_products(&args.source, &context(&config))?;
    let product = products.get_mut(args.product.as_str())?;
    let versions = (!args.versions.is_empty()).then_some(args.versions.as_slice());
    let log = product.compute_changelog(versions, false)?;

    match (format, args.split) {
        (OutputFormat::Json, _) => print_json(json!({
            "diffs": log.keys(),
            "report": report_lines(log),
        })),
        (OutputFormat::Text, true) => {
            for line in report_lines(log) {
                println!("{line}");
            }
            Ok(())
        }
        (OutputFormat::Text, false) => {
            if log.is_empty() {
                println!("No changes between existing versions.");
            }
            print!("{}", log.generate_report(true));
            Ok(())
        }
    }
}

/// Changelog report split into lines, separators included.
fn report_lines(log: &ChangeLog) -> Vec<String> {
    log.generate_report_lines(true)
}

fn cmd_diff(args: DiffArgs, config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let backend = DiskBackend;
    for path in [&args.file1, &args.file2] {
        anyhow::ensure!(backend.exists(path), "{} does not exist", path.display());
    }
    let options = DiffOptions {
        full: args.full || config.full_report,
        rtol: config.header_rtol,
    };
    let versions = VersionPair::new(label(&args.file1), label(&args.file2));
    let diff = StructuralDiff::compute(&backend, versions, &args.file1, &args.file2, args.kind, &options)?;
    match format {
        OutputFormat::Json => print_json(json!({ "report": diff.report_lines() })),
        OutputFormat::Text => {
            print!("{}", diff.report());
            Ok(())
        }
    }
}

fn label(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use skydm_diff::{CatalogDiff, REPORT_SEPARATOR};
    use skydm_format::CatalogStructure;

    fn catalog_diff(older: &str, newer: &str, rows: (usize, usize)) -> StructuralDiff {
        StructuralDiff::Catalog(CatalogDiff::from_structures(
            VersionPair::new(older, newer),
            (Path::new("a.csv"), &CatalogStructure::new(vec!["ra".into()], rows.0)),
            (Path::new("b.csv"), &CatalogStructure::new(vec!["ra".into(), "dec".into()], rows.1)),
            &DiffOptions::default(),
        ))
    }

    #[test]
    fn split_report_keeps_separators() {
        let log = ChangeLog::new(vec![catalog_diff("v1", "v2", (1, 2)), catalog_diff("v2", "v3", (2, 4))]);
        let lines = report_lines(&log);
        assert_eq!(lines.join("\n"), log.generate_report(true));
        assert_eq!(lines.iter().filter(|l| *l == REPORT_SEPARATOR).count(), 2);
        assert_eq!(lines[0], REPORT_SEPARATOR);
    }

    #[test]
    fn label_is_file_name() {
        assert_eq!(label(Path::new("/data/v1/cube.fits")), "cube.fits");
        assert_eq!(label(Path::new("cube.fits")), "cube.fits");
    }
}
