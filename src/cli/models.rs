use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::grouper::group_models;
use crate::store::{ModelRepository, PaymentRepository};

use super::open_store;

pub fn list(duplicates: bool) -> Result<()> {
    let store = open_store()?;
    let models = store.models()?;
    let payments = store.payments()?;

    let groups: Vec<_> = group_models(&models)
        .into_iter()
        .filter(|g| !duplicates || g.has_duplicates())
        .collect();

    if groups.is_empty() {
        println!("{}", if duplicates { "No duplicate models found." } else { "No models." });
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Name", "Records", "IDs", "Payments"]);
    for group in &groups {
        let count = payments.iter().filter(|p| group.contains(&p.model_id)).count();
        table.add_row(vec![
            Cell::new(&group.name),
            Cell::new(group.ids.len()),
            Cell::new(group.ids.join(", ")),
            Cell::new(count),
        ]);
    }
    println!("Models\n{table}");

    let dup_count = groups.iter().filter(|g| g.has_duplicates()).count();
    if dup_count > 0 {
        println!(
            "{dup_count} name(s) shared by several records. Run `atelier merge` to fold them."
        );
    }
    Ok(())
}
