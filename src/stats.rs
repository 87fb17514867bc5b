use crate::grouper::ModelGroup;
use crate::models::{PaymentRecord, PaymentStatus};

/// Per-group payment rollup. Re-derived whenever the collections change.
#[derive(Debug, Clone)]
pub struct PaymentStat {
    pub group: ModelGroup,
    /// Newest first.
    pub payments: Vec<PaymentRecord>,
    pub total_paid: f64,
    pub partial_payments: usize,
    pub unpaid_payments: usize,
    pub is_up_to_date: bool,
    pub last_payment: Option<PaymentRecord>,
}

/// `current_month` is `YYYY-MM`.
pub fn compute_stats(
    groups: &[ModelGroup],
    payments: &[PaymentRecord],
    current_month: &str,
) -> Vec<PaymentStat> {
    groups
        .iter()
        .map(|group| {
            let mut mine: Vec<PaymentRecord> = payments
                .iter()
                .filter(|p| group.contains(&p.model_id))
                .cloned()
                .collect();
            mine.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));

            let total_paid: f64 = mine.iter().filter(|p| p.is_paid()).map(|p| p.amount).sum();
            let partial_payments = mine
                .iter()
                .filter(|p| p.status == PaymentStatus::Pending)
                .count();
            let unpaid_payments = mine
                .iter()
                .filter(|p| p.status == PaymentStatus::Overdue)
                .count();
            let is_up_to_date = mine
                .iter()
                .any(|p| p.month == current_month && p.is_paid());

            PaymentStat {
                group: group.clone(),
                last_payment: mine.first().cloned(),
                payments: mine,
                total_paid,
                partial_payments,
                unpaid_payments,
                is_up_to_date,
            }
        })
        .collect()
}

/// Ledger-wide figures for the dashboard header.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerSummary {
    pub total_collected: f64,
    pub collected_this_month: f64,
    pub pending_count: usize,
    pub overdue_count: usize,
    pub up_to_date: usize,
    pub behind: usize,
}

pub fn summarize(
    stats: &[PaymentStat],
    payments: &[PaymentRecord],
    current_month: &str,
) -> LedgerSummary {
    let paid = payments.iter().filter(|p| p.is_paid());
    let (total_collected, collected_this_month) = paid.fold((0.0, 0.0), |(all, month), p| {
        let this_month = if p.month == current_month { p.amount } else { 0.0 };
        (all + p.amount, month + this_month)
    });
    let up_to_date = stats.iter().filter(|s| s.is_up_to_date).count();
    LedgerSummary {
        total_collected,
        collected_this_month,
        pending_count: stats.iter().map(|s| s.partial_payments).sum(),
        overdue_count: stats.iter().map(|s| s.unpaid_payments).sum(),
        up_to_date,
        behind: stats.len() - up_to_date,
    }
}
