use std::path::PathBuf;

use crate::db::{set_metadata, DB_FILE};
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};
use crate::store::Store;

pub fn run(data_dir: Option<String>, agency: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    save_settings(&settings)?;

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&resolved)?;
    std::fs::create_dir_all(resolved.join("backups"))?;

    let store = Store::open(&resolved.join(DB_FILE))?;
    if let Some(name) = agency.as_deref() {
        set_metadata(store.conn(), "agency_name", name)?;
    }

    println!("Initialized atelier at {}", resolved.display());
    Ok(())
}
