use colored::Colorize;

use crate::error::Result;
use crate::merger::{merge_duplicates, MergeOutcome};
use crate::store::{ModelRepository, PaymentRepository};

use super::open_store;

pub fn run(dry_run: bool) -> Result<()> {
    let mut store = open_store()?;
    let models = store.models()?;
    let payments = store.payments()?;
    let transactions = store.transactions()?;

    let report = match merge_duplicates(&models, &payments, &transactions) {
        MergeOutcome::NoDuplicates => {
            println!("No duplicate models found.");
            return Ok(());
        }
        MergeOutcome::Merged(report) => report,
    };

    println!("{} duplicate group(s) merged", report.groups_merged);
    println!("{} payment(s) reassigned", report.reassigned_count);
    println!("{} duplicate payment(s) removed", report.removed_count);
    println!("{} transaction(s) reassigned", report.transactions_reassigned);

    if dry_run {
        println!("{}", "Dry run: nothing saved.".yellow());
        return Ok(());
    }

    store.save_ledger(&report.payments, &report.transactions)?;
    println!("{}", "Ledger saved.".green());
    Ok(())
}
