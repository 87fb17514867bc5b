use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::fmt::money;
use crate::grouper::group_models;
use crate::normalize::normalize_name;
use crate::stats::{compute_stats, summarize};
use crate::store::{ModelRepository, PaymentRepository};

use super::{current_month, open_store, parse_month};

pub fn run(month: Option<&str>, model: Option<&str>) -> Result<()> {
    let current = match month {
        Some(m) => parse_month(m)?,
        None => current_month(),
    };

    let store = open_store()?;
    let models = store.models()?;
    let payments = store.payments()?;
    let groups = group_models(&models);
    let stats = compute_stats(&groups, &payments, &current);
    let summary = summarize(&stats, &payments, &current);

    let filter = model.map(normalize_name);
    let shown: Vec<_> = stats
        .iter()
        .filter(|s| filter.as_deref().map_or(true, |f| s.group.key.contains(f)))
        .collect();

    let mut table = Table::new();
    table.set_header(vec![
        "Model",
        "Payments",
        "Total paid",
        "Pending",
        "Overdue",
        "Last payment",
        current.as_str(),
    ]);
    for s in &shown {
        let last = s
            .last_payment
            .as_ref()
            .map(|p| format!("{} ({})", p.day(), money(p.amount)))
            .unwrap_or_else(|| "-".to_string());
        let up = if s.is_up_to_date {
            "à jour".green().to_string()
        } else {
            "en retard".red().to_string()
        };
        table.add_row(vec![
            Cell::new(&s.group.name),
            Cell::new(s.payments.len()),
            Cell::new(money(s.total_paid)),
            Cell::new(s.partial_payments),
            Cell::new(s.unpaid_payments),
            Cell::new(last),
            Cell::new(up),
        ]);
    }
    println!("Payments by model\n{table}");

    println!();
    println!("{:<22}{}", "Total collected:", money(summary.total_collected).bold());
    println!("{:<22}{}", format!("Collected {current}:"), money(summary.collected_this_month));
    println!("{:<22}{}", "Pending payments:", summary.pending_count);
    println!("{:<22}{}", "Overdue payments:", summary.overdue_count);
    println!(
        "{:<22}{} up to date, {} behind",
        "Models:",
        summary.up_to_date.to_string().green(),
        summary.behind.to_string().red()
    );
    Ok(())
}
