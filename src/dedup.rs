use std::collections::HashSet;

use crate::models::PaymentRecord;

/// Amounts are compared in whole cents.
fn cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Composite keys under which two payments count as the same payment: same
/// model and amount, and either the same calendar day or the same month.
#[derive(Debug, Default)]
pub struct DedupIndex {
    day_keys: HashSet<(String, String, i64)>,
    month_keys: HashSet<(String, String, i64)>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_payments<'a>(payments: impl IntoIterator<Item = &'a PaymentRecord>) -> Self {
        let mut index = Self::new();
        for payment in payments {
            index.insert(payment);
        }
        index
    }

    fn day_key(payment: &PaymentRecord) -> (String, String, i64) {
        (
            payment.model_id.clone(),
            payment.day().to_string(),
            cents(payment.amount),
        )
    }

    fn month_key(payment: &PaymentRecord) -> (String, String, i64) {
        (
            payment.model_id.clone(),
            payment.month.clone(),
            cents(payment.amount),
        )
    }

    pub fn contains(&self, payment: &PaymentRecord) -> bool {
        self.day_keys.contains(&Self::day_key(payment))
            || self.month_keys.contains(&Self::month_key(payment))
    }

    pub fn insert(&mut self, payment: &PaymentRecord) {
        self.day_keys.insert(Self::day_key(payment));
        self.month_keys.insert(Self::month_key(payment));
    }

    /// Record the payment unless it collides with one already seen. Returns
    /// whether it was new. Rejected payments leave the index untouched.
    pub fn admit(&mut self, payment: &PaymentRecord) -> bool {
        if self.contains(payment) {
            return false;
        }
        self.insert(payment);
        true
    }
}

/// Keep the first payment of every colliding set, in input order. Returns the
/// survivors and the number dropped.
pub fn dedupe(payments: Vec<PaymentRecord>) -> (Vec<PaymentRecord>, usize) {
    let before = payments.len();
    let mut index = DedupIndex::new();
    let kept: Vec<PaymentRecord> = payments.into_iter().filter(|p| index.admit(p)).collect();
    let removed = before - kept.len();
    (kept, removed)
}
