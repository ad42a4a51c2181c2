use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::assemble::assemble;
use crate::compiler::Compiler;
use crate::config::{ArtifactPaths, BuildConfig, Target};
use crate::error::{Error, Result};
use crate::splice::{splice, SpliceReport};

/// Result of building (or re-splicing) one target.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub target: String,
    pub artifacts: ArtifactPaths,
    pub report: SpliceReport,
    pub merged_bytes: usize,
}

/// Compile-then-splice builds for the targets in a [`BuildConfig`].
///
/// All config paths are resolved against `root`.
pub struct Pipeline {
    root: PathBuf,
    config: BuildConfig,
}

impl Pipeline {
    pub fn new(root: impl Into<PathBuf>, config: BuildConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            root: root.into(),
            config,
        })
    }

    /// Build every configured target in order, stopping at the first failure.
    pub fn build_all(&self) -> Result<Vec<BuildOutcome>> {
        let mut outcomes = Vec::with_capacity(self.config.targets.len());
        for target in &self.config.targets {
            outcomes.push(self.build_target(target)?);
        }
        Ok(outcomes)
    }

    /// Build the target called `name`.
    pub fn build(&self, name: &str) -> Result<BuildOutcome> {
        let target = self.config.target(name)?;
        self.build_target(target)
    }

    pub fn build_target(&self, target: &Target) -> Result<BuildOutcome> {
        info!(name = %target.name, "building");
        Compiler::new(&self.root, &self.config.build_dir, &self.config.compiler).compile(target)?;
        self.splice_target(target)
    }

    /// Run only the splice stage against an existing `<input_name>.wat`.
    pub fn splice_target(&self, target: &Target) -> Result<BuildOutcome> {
        let artifacts = target.artifacts(&self.root.join(&self.config.build_dir));
        let fragment_path = self.root.join(&self.config.fragment);

        let fragment = read_text(&fragment_path)?;
        info!(path = %artifacts.compiled_wat.display(), "loading compiler wat");
        let main = read_text(&artifacts.compiled_wat)?;

        let spliced = splice(&main, &fragment, &self.config.splice)?;
        write(&artifacts.merged_wat, spliced.text.as_bytes())?;

        let name = format!("{}.wat", target.output_name);
        let binary = assemble(&name, &spliced.text, &self.config.splice)?;
        write(&artifacts.merged_wasm, &binary)?;

        info!(
            name = %target.name,
            path = %artifacts.merged_wasm.display(),
            bytes = binary.len(),
            "done merging wat"
        );
        Ok(BuildOutcome {
            target: target.name.clone(),
            artifacts,
            report: spliced.report,
            merged_bytes: binary.len(),
        })
    }

    /// [`Pipeline::splice_target`] by name.
    pub fn splice(&self, name: &str) -> Result<BuildOutcome> {
        let target = self.config.target(name)?;
        self.splice_target(target)
    }
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

fn write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::write(path, data).map_err(|e| Error::io(path, e))
}
