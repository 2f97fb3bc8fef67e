//! `wharf schema` - print the manifest JSON schema.

use anyhow::Result;
use wharf::core::schema::manifest_json_schema;

pub fn execute() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&manifest_json_schema())?);
    Ok(())
}
