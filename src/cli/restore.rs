use serde_json::Value;

use crate::error::{AtelierError, Result};
use crate::models::Snapshot;

use super::open_store;

/// Exports written by the web application wrap the collections in a `data`
/// object next to export metadata; bare snapshots are accepted too.
fn parse_snapshot(raw: &str) -> Result<Snapshot> {
    let mut doc: Value = serde_json::from_str(raw).map_err(AtelierError::ImportParse)?;
    let body = if doc.get("data").is_some_and(Value::is_object) {
        doc["data"].take()
    } else {
        doc
    };
    if !body.is_object() {
        return Err(AtelierError::ImportFormat(
            "expected an object of collections".to_string(),
        ));
    }
    Ok(serde_json::from_value(body)?)
}

pub fn run(file: &str) -> Result<()> {
    let raw = std::fs::read_to_string(file)?;
    let snapshot = parse_snapshot(&raw)?;

    let mut store = open_store()?;
    store.replace_snapshot(&snapshot)?;

    println!("Restored from {file}");
    for (collection, count) in store.collection_counts()? {
        println!("  {:<24}{count}", format!("{collection}:"));
    }
    Ok(())
}
