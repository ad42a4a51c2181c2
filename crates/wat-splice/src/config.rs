//! Build configuration.
//!
//! [`BuildConfig::default`] reproduces the stock project layout: two AssemblyScript entry points
//! (`assembly/main.ts`, `assembly/token.ts`) compiled into `build/`, with the keccak fragment at
//! `assembly/src/ethash_keccak_funcs.wat`. A JSON file can override any subset of the fields.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The placeholder import AssemblyScript emits for `export declare function ethash_keccak256`.
///
/// If the declaration moves to a different file the mangled name changes with it, and the entry
/// function in the fragment (`$keccak/keccak`) has to be renamed to match.
pub const DEFAULT_IMPORT: &str = r#"(import "watimports" "$ethash_keccak256" (func $assembly/keccak/ethash_keccak256 (param i32 i32 i32)))"#;

pub const DEFAULT_SCAN_WINDOW: usize = 30;
pub const DEFAULT_MEMORY_BASE: u32 = 10000;
pub const DEFAULT_FRAGMENT: &str = "assembly/src/ethash_keccak_funcs.wat";
pub const DEFAULT_BUILD_DIR: &str = "build";

/// AssemblyScript `--runtime` selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuntimeVariant {
    /// Memory manager plus reference-counting GC, with runtime interfaces exported to the host.
    Full,
    /// `Full` without the exports.
    Half,
    /// Arena allocator that never frees, with the same exports as `Full`.
    Stub,
    /// `Stub` without the exports; mostly optimized away.
    #[default]
    None,
}

impl RuntimeVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Half => "half",
            Self::Stub => "stub",
            Self::None => "none",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerOptions {
    /// Program and leading arguments, e.g. `["asc"]` or `["npx", "asc"]`.
    pub command: Vec<String>,
    pub runtime: RuntimeVariant,
    pub optimize: bool,
    pub measure: bool,
    pub source_map: bool,
    pub memory_base: u32,
    /// Value for `--use abort=<handler>`; empty disables the abort import.
    pub abort: String,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            command: vec!["asc".to_string()],
            runtime: RuntimeVariant::None,
            optimize: true,
            measure: true,
            source_map: true,
            memory_base: DEFAULT_MEMORY_BASE,
            abort: String::new(),
        }
    }
}

/// Where the fragment is inserted into the compiler's line list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum InsertionRule {
    /// `lines.len() - from_end`. With binaryen's output (closing paren, then a trailing empty
    /// line) `from_end = 2` lands right before the module's closing paren.
    FixedOffset { from_end: usize },
    /// Before the last line that is exactly `)` once trimmed.
    ClosingDelimiter,
}

impl Default for InsertionRule {
    fn default() -> Self {
        Self::FixedOffset { from_end: 2 }
    }
}

/// Which line counts as the import declaration to delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportMatcher {
    /// Trimmed line equals the literal.
    Exact(String),
    /// Trimmed line starts with `(import "<module>" "<field>"`, whatever the local name and
    /// signature are.
    Field { module: String, field: String },
}

impl ImportMatcher {
    pub fn matches(&self, line: &str) -> bool {
        let line = line.trim();
        match self {
            Self::Exact(literal) => line == literal,
            Self::Field { module, field } => {
                let Some(rest) = line.strip_prefix("(import") else {
                    return false;
                };
                let prefix = format!("\"{module}\" \"{field}\"");
                rest.trim_start().starts_with(&prefix)
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Exact(literal) => literal.clone(),
            Self::Field { module, field } => format!("(import \"{module}\" \"{field}\" ...)"),
        }
    }
}

impl Default for ImportMatcher {
    fn default() -> Self {
        Self::Exact(DEFAULT_IMPORT.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingImportPolicy {
    /// Log and keep going; the merged module will most likely fail validation.
    #[default]
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpliceOptions {
    pub import: ImportMatcher,
    /// Number of leading lines searched for the import.
    pub scan_window: usize,
    pub insertion: InsertionRule,
    pub on_missing_import: MissingImportPolicy,
    /// Keep the `name` custom section in the merged binary.
    pub debug_names: bool,
    /// Allow importing/exporting mutable globals when validating.
    pub mutable_globals: bool,
}

impl Default for SpliceOptions {
    fn default() -> Self {
        Self {
            import: ImportMatcher::default(),
            scan_window: DEFAULT_SCAN_WINDOW,
            insertion: InsertionRule::default(),
            on_missing_import: MissingImportPolicy::Warn,
            debug_names: true,
            mutable_globals: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Target {
    pub name: String,
    /// Entry file, relative to the project root.
    pub entry: PathBuf,
    /// Base name of the compiler outputs (`<input_name>.wasm`, `<input_name>.wat`).
    pub input_name: String,
    /// Base name of the merged outputs (`<output_name>.wasm`, `<output_name>_merged.wat`).
    pub output_name: String,
}

impl Target {
    pub fn new(name: &str, entry: impl Into<PathBuf>, input_name: &str, output_name: &str) -> Self {
        Self {
            name: name.to_string(),
            entry: entry.into(),
            input_name: input_name.to_string(),
            output_name: output_name.to_string(),
        }
    }

    pub fn evm() -> Self {
        Self::new("evm", "assembly/main.ts", "evm", "evm_with_keccak")
    }

    pub fn token() -> Self {
        Self::new("token", "assembly/token.ts", "token", "token_with_keccak")
    }

    pub fn artifacts(&self, build_dir: &Path) -> ArtifactPaths {
        ArtifactPaths {
            compiled_wasm: build_dir.join(format!("{}.wasm", self.input_name)),
            compiled_wat: build_dir.join(format!("{}.wat", self.input_name)),
            source_map: build_dir.join(format!("{}.wasm.map", self.input_name)),
            merged_wat: build_dir.join(format!("{}_merged.wat", self.output_name)),
            merged_wasm: build_dir.join(format!("{}.wasm", self.output_name)),
        }
    }
}

/// Files produced for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub compiled_wasm: PathBuf,
    pub compiled_wat: PathBuf,
    pub source_map: PathBuf,
    pub merged_wat: PathBuf,
    pub merged_wasm: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Output directory, relative to the project root.
    pub build_dir: PathBuf,
    /// Hand-written WAT fragment, relative to the project root.
    pub fragment: PathBuf,
    pub compiler: CompilerOptions,
    pub splice: SpliceOptions,
    /// Built in order by `build`.
    pub targets: Vec<Target>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            build_dir: PathBuf::from(DEFAULT_BUILD_DIR),
            fragment: PathBuf::from(DEFAULT_FRAGMENT),
            compiler: CompilerOptions::default(),
            splice: SpliceOptions::default(),
            targets: vec![Target::evm(), Target::token()],
        }
    }
}

impl BuildConfig {
    /// Read a JSON config; missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.compiler.command.is_empty() || self.compiler.command[0].is_empty() {
            return Err(Error::Config("compiler.command must name a program".to_string()));
        }
        if self.splice.scan_window == 0 {
            return Err(Error::Config("splice.scan_window must be at least 1".to_string()));
        }
        let mut seen = HashSet::new();
        for target in &self.targets {
            if target.name.is_empty() {
                return Err(Error::Config("target names must not be empty".to_string()));
            }
            if !seen.insert(target.name.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate target name `{}`",
                    target.name
                )));
            }
        }
        Ok(())
    }

    pub fn target(&self, name: &str) -> Result<&Target> {
        self.targets
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| Error::UnknownTarget {
                name: name.to_string(),
                known: self
                    .targets
                    .iter()
                    .map(|t| t.name.as_str())
                    .collect::<Vec<_>>()
                    .join("|"),
            })
    }
}
