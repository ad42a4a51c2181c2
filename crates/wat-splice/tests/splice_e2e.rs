use std::fs;
use std::path::Path;

use tempfile::{tempdir, TempDir};
use wasmparser::{Parser, Payload};
use wat_splice::config::DEFAULT_IMPORT;
use wat_splice::{BuildConfig, Error, MissingImportPolicy, Pipeline};

const FRAGMENT: &str = r#" (func $assembly/keccak/ethash_keccak256 (param $ctx i32) (param $in i32) (param $out i32)
  local.get $out
  local.get $in
  i32.load
  i32.store
 )"#;

fn compiled_wat(import_line: &str) -> String {
    format!(
        r#"(module
 (type $i32_i32_i32_=>_none (func (param i32 i32 i32)))
 (type $none_=>_none (func))
 (type $i32_=>_i32 (func (param i32) (result i32)))
 {import_line}
 (memory $0 1)
 (export "memory" (memory $0))
 (export "main" (func $assembly/main/main))
 (func $~lib/map/Map<usize,u32>#hash (type $i32_=>_i32) (param $0 i32) (result i32)
  local.get $0
 )
 (func $assembly/main/main (type $none_=>_none)
  i32.const 0
  i32.const 32
  i32.const 64
  call $assembly/keccak/ethash_keccak256
 )
)
"#
    )
}

fn project(main_wat: &str) -> TempDir {
    let dir = tempdir().unwrap();
    let config = BuildConfig::default();
    fs::create_dir_all(dir.path().join("build")).unwrap();
    fs::create_dir_all(dir.path().join(config.fragment.parent().unwrap())).unwrap();
    fs::write(dir.path().join(&config.fragment), FRAGMENT).unwrap();
    fs::write(dir.path().join("build/evm.wat"), main_wat).unwrap();
    dir
}

fn import_names(wasm: &[u8]) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for payload in Parser::new(0).parse_all(wasm) {
        if let Payload::ImportSection(imports) = payload.expect("parse wasm") {
            for group in imports {
                let group = group.expect("parse import group");
                for import in group {
                    let (_offset, import) = import.expect("parse import");
                    out.push((import.module.to_string(), import.name.to_string()));
                }
            }
        }
    }
    out
}

fn function_bodies(wasm: &[u8]) -> usize {
    Parser::new(0)
        .parse_all(wasm)
        .filter(|p| matches!(p, Ok(Payload::CodeSectionEntry(_))))
        .count()
}

fn splice_evm(root: &Path) -> wat_splice::Result<wat_splice::BuildOutcome> {
    Pipeline::new(root, BuildConfig::default())?.splice("evm")
}

#[test]
fn splices_fragment_and_drops_placeholder_import() {
    let dir = project(&compiled_wat(DEFAULT_IMPORT));
    let outcome = splice_evm(dir.path()).unwrap();

    assert_eq!(outcome.report.removed_import, Some(4));
    assert!(outcome.report.warnings.is_empty());
    assert_eq!(
        outcome.artifacts.merged_wasm,
        dir.path().join("build/evm_with_keccak.wasm")
    );

    let merged_wat = fs::read_to_string(dir.path().join("build/evm_with_keccak_merged.wat")).unwrap();
    assert!(!merged_wat.contains("(import \"watimports\""));
    assert!(merged_wat.contains("Map<usizeu32>#hash"));
    assert!(merged_wat.ends_with(" )\n)\n"));
    assert_eq!(
        merged_wat.lines().count(),
        compiled_wat(DEFAULT_IMPORT).lines().count() + FRAGMENT.lines().count() - 1
    );

    let wasm = fs::read(&outcome.artifacts.merged_wasm).unwrap();
    assert_eq!(wasm.len(), outcome.merged_bytes);
    assert!(import_names(&wasm).is_empty());
    assert_eq!(function_bodies(&wasm), 3);
}

#[test]
fn repeated_runs_are_byte_identical() {
    let a = project(&compiled_wat(DEFAULT_IMPORT));
    let b = project(&compiled_wat(DEFAULT_IMPORT));

    splice_evm(a.path()).unwrap();
    let first = fs::read(a.path().join("build/evm_with_keccak.wasm")).unwrap();
    splice_evm(a.path()).unwrap();
    let again = fs::read(a.path().join("build/evm_with_keccak.wasm")).unwrap();
    splice_evm(b.path()).unwrap();
    let other = fs::read(b.path().join("build/evm_with_keccak.wasm")).unwrap();

    assert_eq!(first, again);
    assert_eq!(first, other);
}

#[test]
fn import_outside_window_warns_then_fails_to_parse() {
    // Push the import past the 30-line scan window.
    let padding = " (global i32 (i32.const 0))\n".repeat(30);
    let dir = project(&compiled_wat(&format!("{padding} {DEFAULT_IMPORT}")));

    let err = splice_evm(dir.path()).unwrap_err();
    assert!(matches!(err, Error::Parse { ref name, .. } if name == "evm_with_keccak.wat"));

    // The patched text is still written for inspection.
    let merged = fs::read_to_string(dir.path().join("build/evm_with_keccak_merged.wat")).unwrap();
    assert!(merged.contains(DEFAULT_IMPORT));
    assert!(!dir.path().join("build/evm_with_keccak.wasm").exists());
}

#[test]
fn strict_import_policy_stops_before_writing() {
    let dir = project(&compiled_wat(""));
    let mut config = BuildConfig::default();
    config.splice.on_missing_import = MissingImportPolicy::Error;

    let err = Pipeline::new(dir.path(), config)
        .unwrap()
        .splice("evm")
        .unwrap_err();
    assert!(matches!(err, Error::ImportNotFound { window: 30, .. }));
    assert!(!dir.path().join("build/evm_with_keccak_merged.wat").exists());
}

#[test]
fn missing_inputs_are_io_errors() {
    let dir = tempdir().unwrap();
    let err = splice_evm(dir.path()).unwrap_err();
    let Error::Io { path, .. } = &err else {
        panic!("expected io error, got {err:?}");
    };
    assert!(path.ends_with("assembly/src/ethash_keccak_funcs.wat"));

    let dir = project(&compiled_wat(DEFAULT_IMPORT));
    fs::remove_file(dir.path().join("build/evm.wat")).unwrap();
    let err = splice_evm(dir.path()).unwrap_err();
    assert!(matches!(err, Error::Io { ref path, .. } if path.ends_with("build/evm.wat")));
}
