use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::dedup::DedupIndex;
use crate::error::{AtelierError, Result};
use crate::models::{new_record_id, Model, PaymentMethod, PaymentRecord, PaymentStatus};
use crate::normalize::{EntityResolver, NameIndex};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `YYYY-MM` or `YYYY-MM-DD` at the start of a string. ASCII digits only, so
/// the first seven bytes are always a slicable month.
fn iso_date_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[0-9]{4}-(0[1-9]|1[0-2])(-[0-9]{2})?").expect("valid date regex")
    })
}

/// First non-blank string among `keys`.
fn str_field<'v>(obj: &'v Map<String, Value>, keys: &[&str]) -> Option<&'v str> {
    keys.iter()
        .filter_map(|k| obj.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// Amounts arrive as numbers or as strings like "1 500,00 €". Missing or
/// unreadable amounts count as zero; `None` means the value spelled out
/// NaN or an infinity, which the store cannot hold.
pub fn parse_amount(value: Option<&Value>) -> Option<f64> {
    let amount = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !c.is_whitespace() && *c != '€')
                .map(|c| if c == ',' { '.' } else { c })
                .collect();
            cleaned.parse().unwrap_or(0.0)
        }
        _ => 0.0,
    };
    amount.is_finite().then_some(amount)
}

/// Only `YYYY-MM...` dates are usable for month and day keys.
fn iso_date(raw: Option<&str>) -> Option<&str> {
    raw.filter(|d| iso_date_prefix().is_match(d))
}

/// The `YYYY-MM` a date or month string starts with.
fn month_of(raw: &str) -> Option<&str> {
    if iso_date_prefix().is_match(raw) {
        raw.get(..7)
    } else {
        None
    }
}

/// Why a single import record was left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejected {
    UnknownModel,
    BadAmount,
}

// ---------------------------------------------------------------------------
// Import outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportSource {
    /// A bare array of payment-like records.
    PaymentArray,
    /// A full data export carrying `accountingTransactions`.
    AccountingExport,
}

#[derive(Debug)]
pub struct ImportOutcome {
    pub source: ImportSource,
    pub additions: Vec<PaymentRecord>,
    /// Records that could not be tied to a known model.
    pub unresolved: usize,
    /// Records whose amount was NaN or infinite.
    pub invalid_amounts: usize,
    pub duplicates_in_batch: usize,
    pub duplicates_existing: usize,
}

impl ImportOutcome {
    pub fn skipped(&self) -> usize {
        self.unresolved + self.invalid_amounts + self.duplicates_in_batch + self.duplicates_existing
    }

    /// Nothing new to import.
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty()
    }
}

/// Hex SHA-256 of an import file's bytes, used to spot re-imports.
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// import_payments
// ---------------------------------------------------------------------------

/// Parse an import payload and return the payments it would add.
///
/// Pure: nothing is persisted, and a payload that fails to parse yields an
/// error without any partial result. `today` stands in for "now" wherever a
/// record lacks a date.
pub fn import_payments(
    raw: &str,
    existing: &[PaymentRecord],
    models: &[Model],
    today: NaiveDate,
) -> Result<ImportOutcome> {
    let resolver = NameIndex::build(models);
    import_payments_with(raw, existing, models, &resolver, today)
}

pub fn import_payments_with<R: EntityResolver>(
    raw: &str,
    existing: &[PaymentRecord],
    models: &[Model],
    resolver: &R,
    today: NaiveDate,
) -> Result<ImportOutcome> {
    let doc: Value = serde_json::from_str(raw).map_err(AtelierError::ImportParse)?;
    let by_id: HashMap<&str, &Model> = models.iter().map(|m| (m.id.as_str(), m)).collect();

    let (source, parsed) = if let Some(items) = doc.as_array() {
        let parsed = items
            .iter()
            .map(|item| payment_from_record(item, &by_id, resolver, today))
            .collect::<Vec<_>>();
        (ImportSource::PaymentArray, parsed)
    } else if let Some(txns) = find_transactions(&doc) {
        let parsed = txns
            .iter()
            .filter(|t| is_income_entry(t))
            .map(|t| payment_from_transaction(t, resolver, today))
            .collect::<Vec<_>>();
        (ImportSource::AccountingExport, parsed)
    } else {
        return Err(AtelierError::ImportFormat(
            "expected a JSON array of payments or an export with accountingTransactions"
                .to_string(),
        ));
    };

    let mut candidates = Vec::with_capacity(parsed.len());
    let mut unresolved = 0usize;
    let mut invalid_amounts = 0usize;
    for record in parsed {
        match record {
            Ok(payment) => candidates.push(payment),
            Err(Rejected::UnknownModel) => unresolved += 1,
            Err(Rejected::BadAmount) => invalid_amounts += 1,
        }
    }
    if unresolved > 0 {
        warn!(unresolved, "skipped import records with no matching model");
    }
    if invalid_amounts > 0 {
        warn!(invalid_amounts, "skipped import records with a non-finite amount");
    }

    let mut batch = DedupIndex::new();
    let mut duplicates_in_batch = 0usize;
    let mut unique = Vec::with_capacity(candidates.len());
    for payment in candidates {
        if batch.admit(&payment) {
            unique.push(payment);
        } else {
            debug!(
                model_id = %payment.model_id,
                month = %payment.month,
                amount = payment.amount,
                "duplicate within batch"
            );
            duplicates_in_batch += 1;
        }
    }

    let known = DedupIndex::from_payments(existing);
    let mut duplicates_existing = 0usize;
    let mut additions = Vec::with_capacity(unique.len());
    for payment in unique {
        if known.contains(&payment) {
            debug!(
                model_id = %payment.model_id,
                month = %payment.month,
                amount = payment.amount,
                "already recorded"
            );
            duplicates_existing += 1;
        } else {
            additions.push(payment);
        }
    }

    info!(
        ?source,
        added = additions.len(),
        unresolved,
        invalid_amounts,
        duplicates_in_batch,
        duplicates_existing,
        "import parsed"
    );

    Ok(ImportOutcome {
        source,
        additions,
        unresolved,
        invalid_amounts,
        duplicates_in_batch,
        duplicates_existing,
    })
}

fn find_transactions(doc: &Value) -> Option<&Vec<Value>> {
    doc.get("accountingTransactions")
        .and_then(Value::as_array)
        .or_else(|| {
            doc.get("data")
                .and_then(|d| d.get("accountingTransactions"))
                .and_then(Value::as_array)
        })
}

fn is_income_entry(entry: &Value) -> bool {
    let category = entry
        .get("category")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase();
    ["revenue", "cotisation", "inscription"]
        .iter()
        .any(|k| category.contains(k))
}

/// Map one element of a payment array.
fn payment_from_record<R: EntityResolver>(
    item: &Value,
    by_id: &HashMap<&str, &Model>,
    resolver: &R,
    today: NaiveDate,
) -> std::result::Result<PaymentRecord, Rejected> {
    let obj = item.as_object().ok_or(Rejected::UnknownModel)?;
    let model_name = str_field(obj, &["modelName"]);

    let model = str_field(obj, &["modelId"])
        .and_then(|id| by_id.get(id).copied())
        .or_else(|| model_name.and_then(|name| resolver.resolve(name)))
        .ok_or(Rejected::UnknownModel)?;
    let amount = parse_amount(obj.get("amount")).ok_or(Rejected::BadAmount)?;

    let payment_date = iso_date(str_field(obj, &["paymentDate"]))
        .map(str::to_string)
        .unwrap_or_else(|| today.format("%Y-%m-%d").to_string());
    let month = str_field(obj, &["month"])
        .and_then(month_of)
        .or_else(|| month_of(&payment_date))
        .map(str::to_string)
        .unwrap_or_else(|| today.format("%Y-%m").to_string());

    Ok(PaymentRecord {
        id: str_field(obj, &["id"])
            .map(str::to_string)
            .unwrap_or_else(|| new_record_id("pay")),
        model_id: model.id.clone(),
        model_name: model_name.unwrap_or(model.name.as_str()).to_string(),
        month,
        amount,
        method: str_field(obj, &["method", "paymentMethod"])
            .map(PaymentMethod::from_loose)
            .unwrap_or(PaymentMethod::Other),
        payment_date,
        status: str_field(obj, &["status"])
            .map(PaymentStatus::from_loose)
            .unwrap_or(PaymentStatus::Paid),
        notes: str_field(obj, &["notes"]).map(str::to_string),
    })
}

/// Map an income accounting entry to a settled payment.
fn payment_from_transaction<R: EntityResolver>(
    entry: &Value,
    resolver: &R,
    today: NaiveDate,
) -> std::result::Result<PaymentRecord, Rejected> {
    let obj = entry.as_object().ok_or(Rejected::UnknownModel)?;
    let Some(model) = str_field(obj, &["relatedModelName", "modelName"])
        .and_then(|name| resolver.resolve(name))
    else {
        debug!(id = ?obj.get("id"), "accounting entry names no known model");
        return Err(Rejected::UnknownModel);
    };
    let amount = parse_amount(obj.get("amount")).ok_or(Rejected::BadAmount)?;

    let payment_date = iso_date(str_field(obj, &["date"]))
        .map(|d| d.get(..10).unwrap_or(d).to_string())
        .unwrap_or_else(|| today.format("%Y-%m-%d").to_string());
    let month = month_of(&payment_date)
        .map(str::to_string)
        .unwrap_or_else(|| today.format("%Y-%m").to_string());

    Ok(PaymentRecord {
        id: str_field(obj, &["id"])
            .map(|id| format!("tx-{id}"))
            .unwrap_or_else(|| new_record_id("pay")),
        model_id: model.id.clone(),
        model_name: model.name.clone(),
        month,
        amount,
        method: str_field(obj, &["paymentMethod", "method"])
            .map(PaymentMethod::from_loose)
            .unwrap_or(PaymentMethod::Other),
        payment_date,
        status: PaymentStatus::Paid,
        notes: str_field(obj, &["description"]).map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::tests::payment;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn ada() -> Vec<Model> {
        vec![Model::new("m1", "Ada")]
    }

    #[test]
    fn test_array_shape_defaults() {
        let raw = r#"[{"modelId":"m1","modelName":"Ada","amount":1500,"paymentDate":"2025-03-05"}]"#;
        let outcome = import_payments(raw, &[], &ada(), today()).unwrap();
        assert_eq!(outcome.source, ImportSource::PaymentArray);
        assert_eq!(outcome.additions.len(), 1);
        let p = &outcome.additions[0];
        assert_eq!(p.month, "2025-03");
        assert_eq!(p.status, PaymentStatus::Paid);
        assert_eq!(p.method, PaymentMethod::Other);
        assert_eq!(p.model_id, "m1");
        assert_eq!(p.amount, 1500.0);
    }

    #[test]
    fn test_array_shape_duplicate_of_existing() {
        let raw = r#"[{"modelId":"m1","modelName":"Ada","amount":1500,"paymentDate":"2025-03-05"}]"#;
        let existing = vec![payment("old", "m1", 1500.0, "2025-03-28")];
        let outcome = import_payments(raw, &existing, &ada(), today()).unwrap();
        assert!(outcome.is_empty());
        assert_eq!(outcome.duplicates_existing, 1);
        assert_eq!(outcome.skipped(), 1);
    }

    #[test]
    fn test_missing_dates_fall_back_to_today() {
        let raw = r#"[{"modelName":"ada","amount":"200,50","paymentMethod":"cash","status":"pending"}]"#;
        let outcome = import_payments(raw, &[], &ada(), today()).unwrap();
        let p = &outcome.additions[0];
        assert_eq!(p.payment_date, "2025-06-15");
        assert_eq!(p.month, "2025-06");
        assert_eq!(p.amount, 200.5);
        assert_eq!(p.method, PaymentMethod::Cash);
        assert_eq!(p.status, PaymentStatus::Pending);
        assert_eq!(p.model_id, "m1");
        assert!(p.id.starts_with("pay-"));
    }

    #[test]
    fn test_unresolvable_records_are_skipped() {
        let raw = r#"[
            {"modelId":"ghost","amount":100,"paymentDate":"2025-01-01"},
            {"modelName":"Nobody","amount":100,"paymentDate":"2025-01-01"},
            42,
            {"modelName":"ADA","amount":100,"paymentDate":"2025-01-01"}
        ]"#;
        let outcome = import_payments(raw, &[], &ada(), today()).unwrap();
        assert_eq!(outcome.additions.len(), 1);
        assert_eq!(outcome.unresolved, 3);
    }

    #[test]
    fn test_intra_batch_duplicates() {
        let raw = r#"[
            {"modelId":"m1","amount":100,"paymentDate":"2025-01-01"},
            {"modelId":"m1","amount":100,"paymentDate":"2025-01-20"},
            {"modelId":"m1","amount":100,"paymentDate":"2025-02-01","month":"2025-02"}
        ]"#;
        let outcome = import_payments(raw, &[], &ada(), today()).unwrap();
        assert_eq!(outcome.additions.len(), 2);
        assert_eq!(outcome.duplicates_in_batch, 1);
        assert_eq!(outcome.additions[1].month, "2025-02");
    }

    #[test]
    fn test_accounting_export_shape() {
        let raw = r#"{"data":{"accountingTransactions":[
            {"id":"t1","date":"2025-04-02","category":"Revenue","description":"Cotisation avril",
             "amount":300,"relatedModelName":"Adà","paymentMethod":"bank_transfer"},
            {"id":"t2","date":"2025-04-03","category":"expense","amount":50,"relatedModelName":"Ada"},
            {"id":"t3","date":"2025-04-04","category":"Inscription","amount":80,"modelName":"Unknown"},
            {"id":"t4","date":"2025-05-01T10:00:00Z","category":"cotisations","amount":300,"relatedModelName":"ada"}
        ]}}"#;
        let outcome = import_payments(raw, &[], &ada(), today()).unwrap();
        assert_eq!(outcome.source, ImportSource::AccountingExport);
        assert_eq!(outcome.additions.len(), 2);
        assert_eq!(outcome.unresolved, 1);
        let first = &outcome.additions[0];
        assert_eq!(first.id, "tx-t1");
        assert_eq!(first.model_name, "Ada");
        assert_eq!(first.method, PaymentMethod::Transfer);
        assert_eq!(first.notes.as_deref(), Some("Cotisation avril"));
        assert_eq!(outcome.additions[1].payment_date, "2025-05-01");
        assert_eq!(outcome.additions[1].month, "2025-05");
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let err = import_payments("{not json", &[], &ada(), today()).unwrap_err();
        assert!(matches!(err, AtelierError::ImportParse(_)));
    }

    #[test]
    fn test_unrecognized_shape_is_an_error() {
        let err = import_payments(r#"{"models":[]}"#, &[], &ada(), today()).unwrap_err();
        assert!(matches!(err, AtelierError::ImportFormat(_)));
    }

    #[test]
    fn test_parse_amount_variants() {
        assert_eq!(parse_amount(Some(&serde_json::json!(12.5))), Some(12.5));
        assert_eq!(parse_amount(Some(&serde_json::json!("1 500,00 €"))), Some(1500.0));
        assert_eq!(parse_amount(Some(&serde_json::json!("abc"))), Some(0.0));
        assert_eq!(parse_amount(None), Some(0.0));
    }

    #[test]
    fn test_parse_amount_rejects_non_finite() {
        for raw in ["NaN", "nan", "inf", "-inf", "infinity", "1e400"] {
            assert_eq!(parse_amount(Some(&serde_json::json!(raw))), None, "{raw}");
        }
    }

    #[test]
    fn test_non_finite_amounts_are_skipped_and_counted() {
        let raw = r#"[
            {"modelId":"m1","amount":"NaN","paymentDate":"2025-03-05"},
            {"modelId":"m1","amount":"inf","paymentDate":"2025-04-05"},
            {"modelId":"m1","amount":"1e400","paymentDate":"2025-05-05"},
            {"modelId":"m1","amount":75,"paymentDate":"2025-06-05"}
        ]"#;
        let outcome = import_payments(raw, &[], &ada(), today()).unwrap();
        assert_eq!(outcome.additions.len(), 1);
        assert_eq!(outcome.invalid_amounts, 3);
        assert_eq!(outcome.skipped(), 3);
        assert!(outcome.additions.iter().all(|p| p.amount.is_finite()));
        // What gets saved must load back.
        let json = serde_json::to_string(&outcome.additions).unwrap();
        let back: Vec<PaymentRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, outcome.additions);
    }

    #[test]
    fn test_out_of_range_number_literal_never_lands() {
        let raw = r#"[{"modelId":"m1","amount":1e400,"paymentDate":"2025-03-05"}]"#;
        match import_payments(raw, &[], &ada(), today()) {
            Err(e) => assert!(matches!(e, AtelierError::ImportParse(_))),
            Ok(outcome) => assert!(outcome.additions.is_empty()),
        }
    }

    #[test]
    fn test_non_ascii_digit_dates_fall_back_to_today() {
        let raw = r#"[
            {"modelId":"m1","amount":100,"paymentDate":"٢٠٢٥-٠٣-٠٥"},
            {"modelId":"m1","amount":200,"paymentDate":"2025-03-05","month":"٢٠٢٥-٠٣"}
        ]"#;
        let outcome = import_payments(raw, &[], &ada(), today()).unwrap();
        assert_eq!(outcome.additions.len(), 2);
        assert_eq!(outcome.additions[0].payment_date, "2025-06-15");
        assert_eq!(outcome.additions[0].month, "2025-06");
        assert_eq!(outcome.additions[1].month, "2025-03");
    }

    #[test]
    fn test_invalid_month_field_uses_payment_date() {
        let raw = r#"[
            {"modelId":"m1","amount":100,"paymentDate":"2025-03-05","month":"2025-13"},
            {"modelId":"m1","amount":200,"paymentDate":"2025-04-05","month":"mars"},
            {"modelId":"m1","amount":300,"paymentDate":"2025-02-30","month":"2025-02"}
        ]"#;
        let outcome = import_payments(raw, &[], &ada(), today()).unwrap();
        let months: Vec<&str> = outcome.additions.iter().map(|p| p.month.as_str()).collect();
        assert_eq!(months, vec!["2025-03", "2025-04", "2025-02"]);
    }

    #[test]
    fn test_non_ascii_transaction_date_falls_back_to_today() {
        let raw = r#"{"accountingTransactions":[
            {"id":"t1","date":"٢٠٢٥-٠٤-٠٢","category":"revenue","amount":300,"relatedModelName":"Ada"},
            {"id":"t2","date":"2025-04-02","category":"revenue","amount":"NaN","relatedModelName":"Ada"}
        ]}"#;
        let outcome = import_payments(raw, &[], &ada(), today()).unwrap();
        assert_eq!(outcome.additions.len(), 1);
        assert_eq!(outcome.additions[0].payment_date, "2025-06-15");
        assert_eq!(outcome.additions[0].month, "2025-06");
        assert_eq!(outcome.invalid_amounts, 1);
    }

    #[test]
    fn test_checksum_is_stable_hex() {
        let a = compute_checksum(b"[]");
        assert_eq!(a.len(), 64);
        assert_eq!(a, compute_checksum(b"[]"));
        assert_ne!(a, compute_checksum(b"[ ]"));
    }
}
