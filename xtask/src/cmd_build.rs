use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use wat_splice::{BuildConfig, BuildOutcome, InsertionRule, MissingImportPolicy, Pipeline};

use crate::{BuildArgs, Insertion};

impl BuildArgs {
    fn root(&self) -> Result<PathBuf> {
        match &self.root {
            Some(root) => Ok(root.clone()),
            None => env::current_dir().context("resolve current directory"),
        }
    }

    fn to_config(&self) -> Result<BuildConfig> {
        let mut config = match &self.config {
            Some(path) => BuildConfig::load(path)
                .with_context(|| format!("load build config {}", path.display()))?,
            None => BuildConfig::default(),
        };

        if let Some(dir) = &self.build_dir {
            config.build_dir = dir.clone();
        }
        if let Some(fragment) = &self.fragment {
            config.fragment = fragment.clone();
        }
        if self.strict_import {
            config.splice.on_missing_import = MissingImportPolicy::Error;
        }
        match self.insertion {
            Some(Insertion::Fixed) => {
                config.splice.insertion = InsertionRule::FixedOffset { from_end: 2 }
            }
            Some(Insertion::ClosingDelimiter) => {
                config.splice.insertion = InsertionRule::ClosingDelimiter
            }
            None => {}
        }
        if self.no_debug_names {
            config.splice.debug_names = false;
        }
        Ok(config)
    }

    fn pipeline(&self) -> Result<Pipeline> {
        let root = self.root()?;
        Pipeline::new(root, self.to_config()?).context("invalid build config")
    }
}

pub fn build_all(args: &BuildArgs) -> Result<()> {
    let pipeline = args.pipeline()?;
    let outcomes = pipeline.build_all()?;
    for outcome in &outcomes {
        report(outcome);
    }
    println!("summary: built {} target(s)", outcomes.len());
    Ok(())
}

pub fn build_one(args: &BuildArgs, target: &str) -> Result<()> {
    let outcome = args
        .pipeline()?
        .build(target)
        .with_context(|| format!("build target `{target}`"))?;
    report(&outcome);
    Ok(())
}

pub fn splice(args: &BuildArgs, target: &str) -> Result<()> {
    let outcome = args
        .pipeline()?
        .splice(target)
        .with_context(|| format!("splice target `{target}`"))?;
    report(&outcome);
    Ok(())
}

pub fn list_targets(args: &BuildArgs) -> Result<()> {
    let config = args.to_config()?;
    for target in &config.targets {
        let paths = target.artifacts(&config.build_dir);
        println!(
            "{}: {} -> {}, {}",
            target.name,
            target.entry.display(),
            paths.compiled_wasm.display(),
            paths.merged_wasm.display()
        );
    }
    Ok(())
}

fn report(outcome: &BuildOutcome) {
    for warning in &outcome.report.warnings {
        eprintln!("warning: {warning}");
    }
    let removed = match outcome.report.removed_import {
        Some(line) => format!("import removed at line {}", line + 1),
        None => "import not found".to_string(),
    };
    println!(
        "{}: merged {} fragment line(s), {removed}; wrote {} ({} bytes) and {}",
        outcome.target,
        outcome.report.fragment_lines,
        outcome.artifacts.merged_wasm.display(),
        outcome.merged_bytes,
        outcome.artifacts.merged_wat.display()
    );
}
