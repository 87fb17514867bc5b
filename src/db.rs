use std::path::Path;

use rusqlite::{Connection, OptionalExtension};

use crate::error::Result;

pub const DB_FILE: &str = "atelier.db";

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS documents (
    key TEXT PRIMARY KEY,
    body TEXT NOT NULL,
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    import_date TEXT DEFAULT (datetime('now')),
    record_count INTEGER,
    date_range_start TEXT,
    date_range_end TEXT,
    checksum TEXT
);

CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT
);
";

/// Collection keys, named as the web application names them.
pub const MODELS: &str = "models";
pub const MONTHLY_PAYMENTS: &str = "monthlyPayments";
pub const ACCOUNTING_TRANSACTIONS: &str = "accountingTransactions";
pub const CASTING_APPLICATIONS: &str = "castingApplications";
pub const BOOKING_REQUESTS: &str = "bookingRequests";
pub const CONTACT_MESSAGES: &str = "contactMessages";
pub const FASHION_DAY_RESERVATIONS: &str = "fashionDayReservations";

pub const ALL_COLLECTIONS: &[&str] = &[
    MODELS,
    MONTHLY_PAYMENTS,
    ACCOUNTING_TRANSACTIONS,
    CASTING_APPLICATIONS,
    BOOKING_REQUESTS,
    CONTACT_MESSAGES,
    FASHION_DAY_RESERVATIONS,
];

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    for key in ALL_COLLECTIONS {
        conn.execute(
            "INSERT OR IGNORE INTO documents (key, body) VALUES (?1, '[]')",
            [key],
        )?;
    }
    Ok(())
}

pub fn get_metadata(conn: &Connection, key: &str) -> Option<String> {
    conn.query_row("SELECT value FROM metadata WHERE key = ?1", [key], |r| r.get(0))
        .optional()
        .ok()
        .flatten()
}

pub fn set_metadata(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO metadata (key, value) VALUES (?1, ?2) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        [key, value],
    )?;
    Ok(())
}
