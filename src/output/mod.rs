pub mod json_schema;

pub use json_schema::*;

use anyhow::Result;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Pretty JSON to `out` when given, otherwise to stdout.
pub fn write_json<T: Serialize>(value: &T, out: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => fs::write(path, &json)?,
        None => println!("{}", json),
    }
    Ok(())
}
