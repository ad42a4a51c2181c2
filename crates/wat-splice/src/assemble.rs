//! Parse, validate, and encode the merged WAT.

use tracing::debug;
use wasm_encoder::{Module, RawSection};
use wasmparser::{Parser, Payload, Validator, WasmFeatures};

use crate::config::SpliceOptions;
use crate::error::{Error, Result};

/// Name of the custom section holding debug names.
const NAME_SECTION: &str = "name";

/// Turn merged WAT into a validated binary module.
///
/// `name` is only used for diagnostics. Symbolic references (`$keccak/keccak`, ...) are resolved
/// by the parser; any unresolved name is a parse error.
pub fn assemble(name: &str, wat: &str, options: &SpliceOptions) -> Result<Vec<u8>> {
    let binary = wat::parse_str(wat).map_err(|err| Error::Parse {
        name: name.to_string(),
        message: err.to_string(),
    })?;
    debug!(name, bytes = binary.len(), "parsed merged wat");

    validate(name, &binary, options.mutable_globals)?;
    debug!(name, "module validated");

    if options.debug_names {
        Ok(binary)
    } else {
        strip_name_section(name, &binary)
    }
}

pub fn features(mutable_globals: bool) -> WasmFeatures {
    let mut features = WasmFeatures::default();
    features.set(WasmFeatures::MUTABLE_GLOBAL, mutable_globals);
    features
}

pub fn validate(name: &str, binary: &[u8], mutable_globals: bool) -> Result<()> {
    Validator::new_with_features(features(mutable_globals))
        .validate_all(binary)
        .map(|_| ())
        .map_err(|source| Error::Validate {
            name: name.to_string(),
            source,
        })
}

/// Re-emit every section except the `name` custom section.
fn strip_name_section(name: &str, binary: &[u8]) -> Result<Vec<u8>> {
    let mut module = Module::new();
    for payload in Parser::new(0).parse_all(binary) {
        let payload = payload.map_err(|source| Error::Encode {
            name: name.to_string(),
            source,
        })?;
        if let Payload::CustomSection(reader) = &payload {
            if reader.name() == NAME_SECTION {
                continue;
            }
        }
        if let Some((id, range)) = payload.as_section() {
            module.section(&RawSection {
                id,
                data: &binary[range],
            });
        }
    }
    Ok(module.finish())
}
