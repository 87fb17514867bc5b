use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDateTime;
use rusqlite::backup::Backup;
use rusqlite::Connection;

use crate::error::Result;
use crate::fmt::format_bytes;
use crate::settings::get_data_dir;

use super::open_store;

fn timestamped_path(data_dir: &Path, at: NaiveDateTime) -> PathBuf {
    data_dir
        .join("backups")
        .join(format!("atelier-{}.db", at.format("%Y%m%d-%H%M%S")))
}

/// Copy the live database page by page; safe while another session has it open.
pub fn run(output: Option<String>) -> Result<()> {
    let store = open_store()?;
    let dest = match output {
        Some(p) => PathBuf::from(p),
        None => timestamped_path(&get_data_dir(), chrono::Local::now().naive_local()),
    };
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut copy = Connection::open(&dest)?;
    Backup::new(store.conn(), &mut copy)?.run_to_completion(100, Duration::from_millis(10), None)?;
    drop(copy);

    let records: i64 = store.collection_counts()?.iter().map(|(_, n)| n).sum();
    println!("Backup saved to {}", dest.display());
    println!(
        "{} records, {}",
        records,
        format_bytes(std::fs::metadata(&dest)?.len())
    );
    Ok(())
}
