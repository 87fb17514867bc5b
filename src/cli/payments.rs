use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::dedup::DedupIndex;
use crate::error::{AtelierError, Result};
use crate::fmt::money;
use crate::grouper::group_models;
use crate::models::{new_record_id, PaymentMethod, PaymentRecord, PaymentStatus};
use crate::normalize::{normalize_name, EntityResolver, NameIndex};
use crate::store::{ModelRepository, PaymentRepository};

use super::{check_amount, open_store, parse_day, parse_month, today};

fn status_cell(status: PaymentStatus) -> String {
    match status {
        PaymentStatus::Paid => status.label().green().to_string(),
        PaymentStatus::Pending => status.label().yellow().to_string(),
        PaymentStatus::Overdue => status.label().red().to_string(),
    }
}

pub fn list(model: Option<&str>, month: Option<&str>) -> Result<()> {
    let store = open_store()?;
    let models = store.models()?;
    let mut payments = store.payments()?;

    if let Some(name) = model {
        // Match on the whole group so payments under duplicate ids show up.
        let key = normalize_name(name);
        let group = group_models(&models)
            .into_iter()
            .find(|g| g.key == key)
            .ok_or_else(|| AtelierError::UnknownModel(name.to_string()))?;
        payments.retain(|p| group.contains(&p.model_id));
    }
    if let Some(m) = month {
        let m = parse_month(m)?;
        payments.retain(|p| p.month == m);
    }
    payments.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));

    if payments.is_empty() {
        println!("No payments found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Month", "Model", "Amount", "Method", "Status"]);
    for p in &payments {
        table.add_row(vec![
            Cell::new(&p.id),
            Cell::new(p.day()),
            Cell::new(&p.month),
            Cell::new(&p.model_name),
            Cell::new(money(p.amount)),
            Cell::new(p.method.label()),
            Cell::new(status_cell(p.status)),
        ]);
    }
    println!("Payments\n{table}");
    println!("{} payment(s)", payments.len());
    Ok(())
}

pub struct NewPayment<'a> {
    pub model: &'a str,
    pub amount: f64,
    pub date: Option<&'a str>,
    pub month: Option<&'a str>,
    pub method: &'a str,
    pub status: &'a str,
    pub notes: Option<String>,
    pub force: bool,
}

pub fn add(new: NewPayment<'_>) -> Result<()> {
    let amount = check_amount(new.amount)?;
    let mut store = open_store()?;
    let models = store.models()?;
    let index = NameIndex::build(&models);
    let model = index
        .resolve(new.model)
        .ok_or_else(|| AtelierError::UnknownModel(new.model.to_string()))?;

    let day = match new.date {
        Some(d) => parse_day(d)?,
        None => today(),
    };
    let month = match new.month {
        Some(m) => parse_month(m)?,
        None => day.format("%Y-%m").to_string(),
    };

    let payment = PaymentRecord {
        id: new_record_id("pay"),
        model_id: model.id.clone(),
        model_name: model.name.clone(),
        month,
        amount,
        method: PaymentMethod::from_loose(new.method),
        payment_date: day.format("%Y-%m-%d").to_string(),
        status: PaymentStatus::from_loose(new.status),
        notes: new.notes.filter(|n| !n.trim().is_empty()),
    };

    let mut payments = store.payments()?;
    if !new.force && DedupIndex::from_payments(&payments).contains(&payment) {
        println!(
            "{} {} already has a payment of {} for {} or on {}. Use --force to record it anyway.",
            "Skipped:".yellow(),
            payment.model_name,
            money(payment.amount),
            payment.month,
            payment.day()
        );
        return Ok(());
    }

    println!(
        "Recorded {} for {} ({}) as {}",
        money(payment.amount),
        payment.model_name,
        payment.month,
        payment.id
    );
    payments.push(payment);
    store.save_payments(&payments)?;
    Ok(())
}

pub fn delete(id: &str) -> Result<()> {
    let mut store = open_store()?;
    let mut payments = store.payments()?;
    let before = payments.len();
    payments.retain(|p| p.id != id);
    if payments.len() == before {
        return Err(AtelierError::UnknownPayment(id.to_string()));
    }
    store.save_payments(&payments)?;
    println!("Deleted payment {id}");
    Ok(())
}
