use std::collections::HashMap;

use tracing::{debug, info};

use crate::dedup::dedupe;
use crate::grouper::{group_models, ModelGroup};
use crate::models::{AccountingTransaction, Model, PaymentRecord};

/// Picks the id a duplicate group is consolidated onto.
pub trait PrimaryPolicy {
    fn choose(&self, group: &ModelGroup, payments: &[PaymentRecord]) -> String;
}

/// The id carrying the most payments wins; ties go to the id seen first.
///
/// This is a heuristic: stray payments attached to the wrong id can outvote
/// the record users actually work with.
pub struct MostPayments;

impl PrimaryPolicy for MostPayments {
    fn choose(&self, group: &ModelGroup, payments: &[PaymentRecord]) -> String {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for payment in payments {
            if group.contains(&payment.model_id) {
                *counts.entry(payment.model_id.as_str()).or_default() += 1;
            }
        }
        let mut best = &group.primary_id;
        let mut best_count = counts.get(best.as_str()).copied().unwrap_or(0);
        for id in &group.ids {
            let count = counts.get(id.as_str()).copied().unwrap_or(0);
            if count > best_count {
                best = id;
                best_count = count;
            }
        }
        best.clone()
    }
}

/// Secondary id to primary id, plus the names primaries are refreshed to.
struct Remap<'a> {
    primary_of: HashMap<String, String>,
    names: HashMap<&'a str, &'a str>,
}

impl Remap<'_> {
    /// The primary id and name for `id`, or `None` when it needs no move.
    fn target(&self, id: &str) -> Option<(&str, &str)> {
        let primary = self.primary_of.get(id)?;
        if primary == id {
            return None;
        }
        let name = self.names.get(primary.as_str()).copied().unwrap_or_default();
        Some((primary.as_str(), name))
    }
}

#[derive(Debug)]
pub struct MergeReport {
    /// Payments after reassignment and dedup, in ascending payment date.
    pub payments: Vec<PaymentRecord>,
    pub transactions: Vec<AccountingTransaction>,
    pub groups_merged: usize,
    pub reassigned_count: usize,
    pub removed_count: usize,
    pub transactions_reassigned: usize,
}

#[derive(Debug)]
pub enum MergeOutcome {
    /// No model name is shared by more than one id.
    NoDuplicates,
    Merged(MergeReport),
}

pub fn merge_duplicates(
    models: &[Model],
    payments: &[PaymentRecord],
    transactions: &[AccountingTransaction],
) -> MergeOutcome {
    merge_duplicates_with(&MostPayments, models, payments, transactions)
}

/// Consolidate every duplicate model group onto one id.
///
/// Payments and accounting transactions pointing at a secondary id are moved
/// to the primary and take its current name. Payments are then deduplicated
/// oldest first; transactions are only reassigned.
pub fn merge_duplicates_with<P: PrimaryPolicy>(
    policy: &P,
    models: &[Model],
    payments: &[PaymentRecord],
    transactions: &[AccountingTransaction],
) -> MergeOutcome {
    let work: Vec<ModelGroup> = group_models(models)
        .into_iter()
        .filter(ModelGroup::has_duplicates)
        .collect();
    if work.is_empty() {
        return MergeOutcome::NoDuplicates;
    }

    let mut remap = Remap {
        primary_of: HashMap::new(),
        names: models
            .iter()
            .map(|m| (m.id.as_str(), m.name.as_str()))
            .collect(),
    };
    for group in &work {
        let primary = policy.choose(group, payments);
        debug!(group = %group.name, primary = %primary, ids = ?group.ids, "primary chosen");
        for id in &group.ids {
            remap.primary_of.insert(id.clone(), primary.clone());
        }
    }

    let mut reassigned_count = 0usize;
    let mut moved: Vec<PaymentRecord> = payments
        .iter()
        .cloned()
        .map(|mut p| {
            if let Some((primary, name)) = remap.target(&p.model_id) {
                p.model_id = primary.to_string();
                p.model_name = name.to_string();
                reassigned_count += 1;
            }
            p
        })
        .collect();

    moved.sort_by(|a, b| a.payment_date.cmp(&b.payment_date));
    let (payments, removed_count) = dedupe(moved);

    let mut transactions_reassigned = 0usize;
    let transactions: Vec<AccountingTransaction> = transactions
        .iter()
        .cloned()
        .map(|mut t| {
            let target = t.related_model_id.as_deref().and_then(|id| remap.target(id));
            if let Some((primary, name)) = target {
                t.related_model_id = Some(primary.to_string());
                t.related_model_name = Some(name.to_string());
                transactions_reassigned += 1;
            }
            t
        })
        .collect();

    info!(
        groups = work.len(),
        reassigned_count, removed_count, transactions_reassigned, "duplicate models merged"
    );

    MergeOutcome::Merged(MergeReport {
        payments,
        transactions,
        groups_merged: work.len(),
        reassigned_count,
        removed_count,
        transactions_reassigned,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::tests::payment;
    use serde_json::Map;

    fn transaction(id: &str, model_id: &str, name: &str) -> AccountingTransaction {
        AccountingTransaction {
            id: id.to_string(),
            date: "2025-01-05".to_string(),
            category: "revenue".to_string(),
            subcategory: "cotisation".to_string(),
            description: String::new(),
            amount: 1500.0,
            related_model_id: Some(model_id.to_string()),
            related_model_name: Some(name.to_string()),
            extra: Map::new(),
        }
    }

    fn unwrap_merged(outcome: MergeOutcome) -> MergeReport {
        match outcome {
            MergeOutcome::Merged(report) => report,
            MergeOutcome::NoDuplicates => panic!("expected a merge"),
        }
    }

    #[test]
    fn test_no_duplicates_is_a_noop() {
        let models = vec![Model::new("m1", "Ada"), Model::new("m2", "Grace")];
        let payments = vec![payment("p1", "m1", 10.0, "2025-01-01")];
        assert!(matches!(
            merge_duplicates(&models, &payments, &[]),
            MergeOutcome::NoDuplicates
        ));
    }

    #[test]
    fn test_merge_collapses_month_duplicate() {
        let models = vec![
            Model::new("m1", "Ada Lovelace"),
            Model::new("m2", "ada lovelace"),
        ];
        let payments = vec![
            payment("p1", "m1", 1500.0, "2025-01-05"),
            payment("p2", "m2", 1500.0, "2025-01-06"),
        ];
        let report = unwrap_merged(merge_duplicates(&models, &payments, &[]));
        assert_eq!(report.groups_merged, 1);
        assert_eq!(report.removed_count, 1);
        assert_eq!(report.payments.len(), 1);
        assert_eq!(report.payments[0].id, "p1");
        assert_eq!(report.payments[0].model_id, "m1");
        assert_eq!(report.reassigned_count, 1);
    }

    #[test]
    fn test_primary_is_id_with_most_payments() {
        let models = vec![Model::new("m1", "Léa"), Model::new("m2", "LEA")];
        let payments = vec![
            payment("p1", "m1", 100.0, "2025-01-05"),
            payment("p2", "m2", 100.0, "2025-02-05"),
            payment("p3", "m2", 100.0, "2025-03-05"),
        ];
        let txns = vec![transaction("t1", "m1", "Léa")];
        let report = unwrap_merged(merge_duplicates(&models, &payments, &txns));
        assert!(report.payments.iter().all(|p| p.model_id == "m2"));
        let moved = report.payments.iter().find(|p| p.id == "p1").unwrap();
        assert_eq!(moved.model_name, "LEA");
        assert_eq!(report.reassigned_count, 1);
        assert_eq!(report.removed_count, 0);
        assert_eq!(report.transactions[0].related_model_id.as_deref(), Some("m2"));
        assert_eq!(report.transactions[0].related_model_name.as_deref(), Some("LEA"));
        assert_eq!(report.transactions_reassigned, 1);
    }

    #[test]
    fn test_tie_goes_to_first_seen_id() {
        let models = vec![Model::new("m1", "Inès"), Model::new("m2", "Ines")];
        let payments = vec![
            payment("p1", "m2", 100.0, "2025-01-05"),
            payment("p2", "m1", 200.0, "2025-01-05"),
        ];
        let report = unwrap_merged(merge_duplicates(&models, &payments, &[]));
        assert!(report.payments.iter().all(|p| p.model_id == "m1"));
    }

    #[test]
    fn test_transactions_are_not_deduplicated() {
        let models = vec![Model::new("m1", "Ada"), Model::new("m2", "ADA")];
        let txns = vec![transaction("t1", "m1", "Ada"), transaction("t2", "m2", "ADA")];
        let report = unwrap_merged(merge_duplicates(&models, &[], &txns));
        assert_eq!(report.transactions.len(), 2);
        assert!(report
            .transactions
            .iter()
            .all(|t| t.related_model_id.as_deref() == Some("m1")));
    }

    #[test]
    fn test_payments_sorted_oldest_first_before_dedup() {
        let models = vec![Model::new("m1", "Ada"), Model::new("m2", "ada")];
        let payments = vec![
            payment("late", "m1", 100.0, "2025-01-25"),
            payment("early", "m2", 100.0, "2025-01-02"),
        ];
        let report = unwrap_merged(merge_duplicates(&models, &payments, &[]));
        assert_eq!(report.payments.len(), 1);
        assert_eq!(report.payments[0].id, "early");
    }

    #[test]
    fn test_merge_is_idempotent() {
        let models = vec![
            Model::new("m1", "Ada"),
            Model::new("m2", "ada"),
            Model::new("m3", "Grace"),
            Model::new("m4", "GRÂCE"),
        ];
        let payments = vec![
            payment("p1", "m1", 100.0, "2025-01-05"),
            payment("p2", "m2", 100.0, "2025-01-09"),
            payment("p3", "m2", 100.0, "2025-02-09"),
            payment("p4", "m4", 50.0, "2025-01-01"),
            payment("p5", "m3", 50.0, "2025-01-01"),
        ];
        let txns = vec![transaction("t1", "m1", "Ada"), transaction("t2", "m3", "Grace")];
        let first = unwrap_merged(merge_duplicates(&models, &payments, &txns));
        let second = unwrap_merged(merge_duplicates(&models, &first.payments, &first.transactions));
        assert_eq!(second.reassigned_count, 0);
        assert_eq!(second.removed_count, 0);
        assert_eq!(second.transactions_reassigned, 0);
        assert_eq!(second.payments, first.payments);
    }

    struct FirstSeen;

    impl PrimaryPolicy for FirstSeen {
        fn choose(&self, group: &ModelGroup, _payments: &[PaymentRecord]) -> String {
            group.ids[0].clone()
        }
    }

    #[test]
    fn test_custom_policy() {
        let models = vec![Model::new("m1", "Ada"), Model::new("m2", "ada")];
        let payments = vec![
            payment("p1", "m2", 100.0, "2025-01-05"),
            payment("p2", "m2", 100.0, "2025-02-05"),
        ];
        let report = unwrap_merged(merge_duplicates_with(&FirstSeen, &models, &payments, &[]));
        assert!(report.payments.iter().all(|p| p.model_id == "m1"));
        assert_eq!(report.reassigned_count, 2);
    }
}
