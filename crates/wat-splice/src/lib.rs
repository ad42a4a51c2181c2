//! Post-processing for AssemblyScript builds that need a hand-written WAT function.
//!
//! AssemblyScript can't express the keccak-256 routine the EVM and token contracts call, so the
//! source declares it as an import and a WAT fragment provides the body. A build:
//!
//! 1. runs `asc` to produce `<name>.wasm` and `<name>.wat` ([`compiler`]);
//! 2. rewrites identifiers the strict parser rejects ([`normalize`]);
//! 3. inserts the fragment before the module's closing paren and deletes the placeholder import
//!    ([`splice`]);
//! 4. parses, validates (mutable globals disabled), and encodes the result ([`assemble`]).
//!
//! [`Pipeline`] sequences these for every configured [`Target`].

pub mod assemble;
pub mod compiler;
pub mod config;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod runner;
pub mod splice;
pub mod tools;

pub use config::{
    ArtifactPaths, BuildConfig, CompilerOptions, ImportMatcher, InsertionRule,
    MissingImportPolicy, RuntimeVariant, SpliceOptions, Target,
};
pub use error::{Error, Result};
pub use pipeline::{BuildOutcome, Pipeline};
pub use splice::{SpliceReport, Spliced};
