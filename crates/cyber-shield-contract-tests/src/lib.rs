//! Helpers for validating frozen contract files under `contracts/`.

use std::path::PathBuf;

use jsonschema::JSONSchema;
use serde_json::Value;

/// Absolute path of `relative` inside the workspace `contracts/` directory.
pub fn contract_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../contracts")
        .join(relative)
}

/// Reads and decodes a contract JSON file.
///
/// # Panics
/// Panics when the file is missing or not JSON; contract files are checked in.
pub fn load_contract_json(relative: &str) -> Value {
    let path = contract_path(relative);
    let raw = std::fs::read_to_string(&path)
        .unwrap_or_else(|error| panic!("{} should be readable: {error}", path.display()));
    serde_json::from_str(&raw)
        .unwrap_or_else(|error| panic!("{} should be valid json: {error}", path.display()))
}

/// Compiles the schema stored at `relative`.
///
/// # Panics
/// Panics when the schema does not compile.
pub fn compile_contract_schema(relative: &str) -> JSONSchema {
    let schema = load_contract_json(relative);
    JSONSchema::compile(&schema)
        .unwrap_or_else(|error| panic!("{relative} should compile: {error}"))
}
