use crate::db::{get_metadata, DB_FILE};
use crate::error::Result;
use crate::fmt::format_bytes;
use crate::settings::{get_data_dir, load_settings};
use crate::store::Store;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = get_data_dir();
    let db_path = data_dir.join(DB_FILE);

    let user = if settings.user_name.is_empty() {
        "(not set)"
    } else {
        settings.user_name.as_str()
    };
    println!("User:       {user}");
    println!("Data dir:   {}", data_dir.display());
    println!("Database:   {}", db_path.display());

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let store = Store::open(&db_path)?;
        let agency = get_metadata(store.conn(), "agency_name");
        println!("Agency:     {}", agency.as_deref().unwrap_or("(not set)"));

        let imports: i64 = store
            .conn()
            .query_row("SELECT count(*) FROM imports", [], |r| r.get(0))?;

        println!();
        for (collection, count) in store.collection_counts()? {
            println!("{:<24}{count}", format!("{collection}:"));
        }
        println!("{:<24}{imports}", "imports:");
    } else {
        println!();
        println!("Database not found. Run `atelier init` to set up.");
    }

    Ok(())
}
