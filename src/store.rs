use std::path::Path;

use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::db::{self, get_connection, init_db};
use crate::error::Result;
use crate::models::{AccountingTransaction, Model, PaymentRecord, Snapshot};

pub trait ModelRepository {
    fn models(&self) -> Result<Vec<Model>>;
}

pub trait PaymentRepository {
    fn payments(&self) -> Result<Vec<PaymentRecord>>;
    fn transactions(&self) -> Result<Vec<AccountingTransaction>>;
    fn save_payments(&mut self, payments: &[PaymentRecord]) -> Result<()>;
    /// Writes both collections or neither.
    fn save_ledger(
        &mut self,
        payments: &[PaymentRecord],
        transactions: &[AccountingTransaction],
    ) -> Result<()>;
}

/// One row of the import log.
#[derive(Debug, Clone)]
pub struct ImportRecord {
    pub filename: String,
    pub checksum: String,
    pub record_count: usize,
    pub date_range_start: Option<String>,
    pub date_range_end: Option<String>,
}

impl ImportRecord {
    pub fn new(filename: &str, checksum: &str, additions: &[PaymentRecord]) -> Self {
        Self {
            filename: filename.to_string(),
            checksum: checksum.to_string(),
            record_count: additions.len(),
            date_range_start: additions.iter().map(|p| p.day().to_string()).min(),
            date_range_end: additions.iter().map(|p| p.day().to_string()).max(),
        }
    }
}

/// SQLite-backed document store. Each collection is one JSON array.
///
/// Writes are last-writer-wins: there is no version check, so a concurrent
/// session saving the same collection overwrites it.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = get_connection(db_path)?;
        init_db(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        let body: Option<String> = self
            .conn
            .query_row("SELECT body FROM documents WHERE key = ?1", [key], |r| r.get(0))
            .optional()?;
        match body {
            Some(body) => Ok(serde_json::from_str(&body)?),
            None => Ok(Vec::new()),
        }
    }

    /// Replace several collections in one transaction.
    fn write(&mut self, docs: &[(&str, String)]) -> Result<()> {
        let tx = self.conn.transaction()?;
        for (key, body) in docs {
            tx.execute(
                "INSERT INTO documents (key, body, updated_at) VALUES (?1, ?2, datetime('now')) \
                 ON CONFLICT(key) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
                rusqlite::params![key, body],
            )?;
            debug!(collection = *key, bytes = body.len(), "collection written");
        }
        tx.commit()?;
        Ok(())
    }

    fn encode<T: Serialize>(key: &'static str, items: &[T]) -> Result<(&'static str, String)> {
        Ok((key, serde_json::to_string(items)?))
    }

    pub fn load_snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            models: self.load(db::MODELS)?,
            monthly_payments: self.load(db::MONTHLY_PAYMENTS)?,
            accounting_transactions: self.load(db::ACCOUNTING_TRANSACTIONS)?,
            casting_applications: self.load(db::CASTING_APPLICATIONS)?,
            booking_requests: self.load(db::BOOKING_REQUESTS)?,
            contact_messages: self.load(db::CONTACT_MESSAGES)?,
            fashion_day_reservations: self.load(db::FASHION_DAY_RESERVATIONS)?,
        })
    }

    pub fn replace_snapshot(&mut self, snapshot: &Snapshot) -> Result<()> {
        let docs = vec![
            Self::encode(db::MODELS, &snapshot.models)?,
            Self::encode(db::MONTHLY_PAYMENTS, &snapshot.monthly_payments)?,
            Self::encode(db::ACCOUNTING_TRANSACTIONS, &snapshot.accounting_transactions)?,
            Self::encode(db::CASTING_APPLICATIONS, &snapshot.casting_applications)?,
            Self::encode(db::BOOKING_REQUESTS, &snapshot.booking_requests)?,
            Self::encode(db::CONTACT_MESSAGES, &snapshot.contact_messages)?,
            Self::encode(db::FASHION_DAY_RESERVATIONS, &snapshot.fashion_day_reservations)?,
        ];
        self.write(&docs)?;
        info!(
            models = snapshot.models.len(),
            payments = snapshot.monthly_payments.len(),
            "snapshot replaced"
        );
        Ok(())
    }

    /// Number of records in every collection, in display order.
    pub fn collection_counts(&self) -> Result<Vec<(String, i64)>> {
        let mut counts = Vec::with_capacity(db::ALL_COLLECTIONS.len());
        for key in db::ALL_COLLECTIONS {
            let count: Option<i64> = self
                .conn
                .query_row(
                    "SELECT json_array_length(body) FROM documents WHERE key = ?1",
                    [key],
                    |r| r.get(0),
                )
                .optional()?;
            counts.push((key.to_string(), count.unwrap_or(0)));
        }
        Ok(counts)
    }

    pub fn import_seen(&self, checksum: &str) -> Result<bool> {
        let mut stmt = self.conn.prepare("SELECT 1 FROM imports WHERE checksum = ?1")?;
        Ok(stmt.exists([checksum])?)
    }

    /// Save the grown payment list and log the import in one transaction.
    pub fn apply_import(
        &mut self,
        payments: &[PaymentRecord],
        record: &ImportRecord,
    ) -> Result<()> {
        let body = serde_json::to_string(payments)?;
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO documents (key, body, updated_at) VALUES (?1, ?2, datetime('now')) \
             ON CONFLICT(key) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
            rusqlite::params![db::MONTHLY_PAYMENTS, body],
        )?;
        tx.execute(
            "INSERT INTO imports (filename, record_count, date_range_start, date_range_end, checksum) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                record.filename,
                record.record_count as i64,
                record.date_range_start,
                record.date_range_end,
                record.checksum,
            ],
        )?;
        tx.commit()?;
        info!(file = %record.filename, added = record.record_count, "import applied");
        Ok(())
    }
}

impl ModelRepository for Store {
    fn models(&self) -> Result<Vec<Model>> {
        self.load(db::MODELS)
    }
}

impl PaymentRepository for Store {
    fn payments(&self) -> Result<Vec<PaymentRecord>> {
        self.load(db::MONTHLY_PAYMENTS)
    }

    fn transactions(&self) -> Result<Vec<AccountingTransaction>> {
        self.load(db::ACCOUNTING_TRANSACTIONS)
    }

    fn save_payments(&mut self, payments: &[PaymentRecord]) -> Result<()> {
        self.write(&[Self::encode(db::MONTHLY_PAYMENTS, payments)?])
    }

    fn save_ledger(
        &mut self,
        payments: &[PaymentRecord],
        transactions: &[AccountingTransaction],
    ) -> Result<()> {
        self.write(&[
            Self::encode(db::MONTHLY_PAYMENTS, payments)?,
            Self::encode(db::ACCOUNTING_TRANSACTIONS, transactions)?,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::tests::payment;

    fn test_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&dir.path().join(db::DB_FILE)).unwrap();
        (dir, store)
    }

    #[test]
    fn test_fresh_store_is_empty() {
        let (_dir, store) = test_store();
        let snapshot = store.load_snapshot().unwrap();
        assert_eq!(snapshot, Snapshot::default());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let (_dir, mut store) = test_store();
        let snapshot = Snapshot {
            models: vec![Model::new("m1", "Ada")],
            monthly_payments: vec![payment("p1", "m1", 100.0, "2025-01-02")],
            ..Snapshot::default()
        };
        store.replace_snapshot(&snapshot).unwrap();
        assert_eq!(store.load_snapshot().unwrap(), snapshot);
        let counts = store.collection_counts().unwrap();
        assert_eq!(counts[0], ("models".to_string(), 1));
        assert_eq!(counts[1], ("monthlyPayments".to_string(), 1));
        assert_eq!(counts[2].1, 0);
    }

    #[test]
    fn test_save_ledger_writes_both() {
        let (_dir, mut store) = test_store();
        let txn: AccountingTransaction = serde_json::from_str(
            r#"{"id":"t1","date":"2025-01-02","category":"revenue","amount":10,"relatedModelId":"m1"}"#,
        )
        .unwrap();
        store
            .save_ledger(&[payment("p1", "m1", 10.0, "2025-01-02")], &[txn])
            .unwrap();
        assert_eq!(store.payments().unwrap().len(), 1);
        assert_eq!(store.transactions().unwrap()[0].related_model_id.as_deref(), Some("m1"));
    }

    #[test]
    fn test_apply_import_logs_checksum() {
        let (_dir, mut store) = test_store();
        let additions = vec![
            payment("p1", "m1", 10.0, "2025-01-02"),
            payment("p2", "m1", 20.0, "2025-03-02"),
        ];
        assert!(!store.import_seen("abc").unwrap());
        let record = ImportRecord::new("pay.json", "abc", &additions);
        assert_eq!(record.date_range_start.as_deref(), Some("2025-01-02"));
        assert_eq!(record.date_range_end.as_deref(), Some("2025-03-02"));
        store.apply_import(&additions, &record).unwrap();
        assert!(store.import_seen("abc").unwrap());
        assert_eq!(store.payments().unwrap().len(), 2);
    }
}
