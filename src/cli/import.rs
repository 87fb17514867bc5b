use std::path::PathBuf;

use comfy_table::{Cell, Table};

use crate::error::{AtelierError, Result};
use crate::fmt::money;
use crate::importer::{compute_checksum, import_payments, ImportSource};
use crate::store::{ImportRecord, ModelRepository, PaymentRepository};

use super::{open_store, today};

pub fn run(file: &str, dry_run: bool, force: bool) -> Result<()> {
    let file_path = PathBuf::from(file);
    let bytes = std::fs::read(&file_path)?;
    let checksum = compute_checksum(&bytes);
    let raw = String::from_utf8(bytes).map_err(AtelierError::ImportEncoding)?;

    let mut store = open_store()?;
    if !force && store.import_seen(&checksum)? {
        println!(
            "This file has already been imported (duplicate checksum). \
             Use --force to re-check it."
        );
        return Ok(());
    }

    let existing = store.payments()?;
    let models = store.models()?;
    let outcome = import_payments(&raw, &existing, &models, today())?;

    let source = match outcome.source {
        ImportSource::PaymentArray => "payment list",
        ImportSource::AccountingExport => "accounting export",
    };
    println!("Read {file} as {source}");

    if outcome.is_empty() {
        println!("Nothing new to import ({} skipped)", outcome.skipped());
        return Ok(());
    }

    if dry_run {
        let mut table = Table::new();
        table.set_header(vec!["Date", "Month", "Model", "Amount", "Method", "Status"]);
        for p in &outcome.additions {
            table.add_row(vec![
                Cell::new(p.day()),
                Cell::new(&p.month),
                Cell::new(&p.model_name),
                Cell::new(money(p.amount)),
                Cell::new(p.method.label()),
                Cell::new(p.status.label()),
            ]);
        }
        println!("Would import\n{table}");
    } else {
        let filename = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file.to_string());
        let record = ImportRecord::new(&filename, &checksum, &outcome.additions);
        let mut payments = existing;
        payments.extend(outcome.additions.iter().cloned());
        store.apply_import(&payments, &record)?;
    }

    let verb = if dry_run { "to import" } else { "imported" };
    println!(
        "{} {verb}, {} skipped ({} unknown model, {} repeated in file, {} already recorded, \
         {} bad amount)",
        outcome.additions.len(),
        outcome.skipped(),
        outcome.unresolved,
        outcome.duplicates_in_batch,
        outcome.duplicates_existing,
        outcome.invalid_amounts
    );
    Ok(())
}
