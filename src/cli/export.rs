use std::path::PathBuf;

use serde_json::json;

use crate::db::get_metadata;
use crate::error::Result;

use super::open_store;

/// Write all collections in the shape `atelier restore` reads back.
pub fn run(output: Option<String>) -> Result<()> {
    let store = open_store()?;
    let snapshot = store.load_snapshot()?;
    let doc = json!({
        "exportDate": chrono::Local::now().to_rfc3339(),
        "agency": get_metadata(store.conn(), "agency_name"),
        "data": snapshot,
    });
    let body = serde_json::to_string_pretty(&doc)?;

    match output {
        Some(path) => {
            let path = PathBuf::from(path);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(&path, format!("{body}\n"))?;
            println!("Wrote {}", path.display());
        }
        None => println!("{body}"),
    }
    Ok(())
}
