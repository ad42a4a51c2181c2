//! AssemblyScript compiler invocation.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::{CompilerOptions, Target};
use crate::error::{Error, Result};
use crate::runner::Runner;
use crate::tools;

/// Arguments passed to `asc` after `command[1..]`.
///
/// Paths are relative to the project root; the compiler runs with the root as its working
/// directory.
pub fn compiler_args(options: &CompilerOptions, target: &Target, build_dir: &Path) -> Vec<OsString> {
    let artifacts = target.artifacts(build_dir);
    let mut args: Vec<OsString> = vec![
        target.entry.clone().into(),
        "--binaryFile".into(),
        artifacts.compiled_wasm.into(),
        "--textFile".into(),
        artifacts.compiled_wat.into(),
    ];
    if options.source_map {
        args.push("--sourceMap".into());
    }
    if options.measure {
        args.push("--measure".into());
    }
    args.push("--runtime".into());
    args.push(options.runtime.as_str().into());
    args.push("--use".into());
    args.push(format!("abort={}", options.abort).into());
    args.push("--memoryBase".into());
    args.push(options.memory_base.to_string().into());
    if options.optimize {
        args.push("--optimize".into());
    }
    args
}

pub struct Compiler<'a> {
    root: PathBuf,
    build_dir: PathBuf,
    options: &'a CompilerOptions,
    runner: Runner,
}

impl<'a> Compiler<'a> {
    pub fn new(root: impl Into<PathBuf>, build_dir: impl Into<PathBuf>, options: &'a CompilerOptions) -> Self {
        Self {
            root: root.into(),
            build_dir: build_dir.into(),
            options,
            runner: Runner::new(),
        }
    }

    /// Compile `target`, producing `<input_name>.wasm`/`.wat` (and a source map) in the build
    /// directory.
    pub fn compile(&self, target: &Target) -> Result<()> {
        let out_dir = self.root.join(&self.build_dir);
        fs::create_dir_all(&out_dir).map_err(|e| Error::io(&out_dir, e))?;

        let (program, prefix) = self
            .options
            .command
            .split_first()
            .ok_or_else(|| Error::Config("compiler.command must name a program".to_string()))?;

        let mut cmd = tools::command(program);
        cmd.current_dir(&self.root)
            .args(prefix)
            .args(compiler_args(self.options, target, &self.build_dir));

        let status = self.runner.run_step(
            &format!("AssemblyScript: compile {} ({})", target.name, target.entry.display()),
            &mut cmd,
        )?;
        info!(name = %target.name, ?status, "asc done");

        if !status.success() {
            return Err(Error::CompileFailed {
                target: target.name.clone(),
                code: status.code(),
            });
        }
        Ok(())
    }
}
