use std::path::PathBuf;

use crate::db::{get_metadata, DB_FILE};
use crate::error::{AtelierError, Result};
use crate::settings::{load_settings, save_settings, shellexpand_path};
use crate::store::{ModelRepository, PaymentRepository, Store};

/// Point the settings at another agency's data directory.
pub fn run(path: &str) -> Result<()> {
    let data_dir = PathBuf::from(shellexpand_path(path));
    let db_file = data_dir.join(DB_FILE);
    if !db_file.is_file() {
        return Err(AtelierError::Settings(format!(
            "{} has no {DB_FILE}\nRun `atelier init --data-dir {}` to create one.",
            data_dir.display(),
            data_dir.display()
        )));
    }

    // Opening adds any missing tables or collections.
    let store = Store::open(&db_file)?;
    let models = store.models()?.len();
    let payments = store.payments()?.len();

    let mut settings = load_settings();
    settings.data_dir = data_dir.to_string_lossy().to_string();
    save_settings(&settings)?;

    let agency = get_metadata(store.conn(), "agency_name");
    println!(
        "Now using {} ({})",
        data_dir.display(),
        agency.as_deref().unwrap_or("unnamed agency")
    );
    println!("{models} model(s), {payments} payment(s)");
    Ok(())
}
