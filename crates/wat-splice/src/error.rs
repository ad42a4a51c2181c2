use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("missing required command: {program}")]
    MissingTool { program: String },

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("AssemblyScript compilation failed for target `{target}` (exit code {})", display_code(.code))]
    CompileFailed { target: String, code: Option<i32> },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse merged wat {name}: {message}")]
    Parse { name: String, message: String },

    #[error("merged module {name} failed validation: {source}")]
    Validate {
        name: String,
        #[source]
        source: wasmparser::BinaryReaderError,
    },

    #[error("failed to re-encode {name}: {source}")]
    Encode {
        name: String,
        #[source]
        source: wasmparser::BinaryReaderError,
    },

    #[error("import to delete not found in the first {window} lines: {import}")]
    ImportNotFound { import: String, window: usize },

    #[error("no closing `)` delimiter found in {lines} line(s) of compiler output")]
    NoClosingDelimiter { lines: usize },

    #[error("invalid config: {0}")]
    Config(String),

    #[error("unknown target `{name}` (expected one of: {known})")]
    UnknownTarget { name: String, known: String },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        // Killed by a signal on unix.
        None => "none".to_string(),
    }
}
