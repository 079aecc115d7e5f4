//! # Repository Module
//!
//! Table-level access to the local durable store.
//!
//! ## Store Contract → SQL
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  put(table, record)              INSERT ... ON CONFLICT DO UPDATE       │
//! │  get(table, key)                 SELECT ... WHERE <pk> = ?              │
//! │  delete(table, key)              DELETE ... WHERE <pk> = ?              │
//! │  queryByIndex(table, idx, v)     SELECT ... WHERE barcode = ? /         │
//! │                                              synced = ?                 │
//! │  scanOrdered(table, idx, dir, n) SELECT ... ORDER BY created_at <dir>   │
//! │                                              LIMIT n                    │
//! │  clearAndBulkInsert(table, rs)   BEGIN; DELETE; INSERT × n; COMMIT      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every single-record operation is one statement and therefore atomic.
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - product read cache
//! - [`SaleQueueRepository`](sale_queue::SaleQueueRepository) - sale write queue

pub mod product;
pub mod sale_queue;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::error::{DbError, DbResult};

/// Direction of an ordered index scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDirection {
    /// Oldest first.
    Ascending,
    /// Newest first.
    Descending,
}

impl ScanDirection {
    pub(crate) fn as_sql(&self) -> &'static str {
        match self {
            ScanDirection::Ascending => "ASC",
            ScanDirection::Descending => "DESC",
        }
    }
}

/// Fixed-width RFC 3339 (`2026-01-31T18:30:00.000000Z`) so text order is time order.
pub(crate) fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_timestamp(field: &str, raw: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| DbError::corrupt(field, e))
}

pub(crate) fn decode_date(field: &str, raw: &str) -> DbResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| DbError::corrupt(field, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_text_is_fixed_width_and_ordered() {
        let a = Utc.with_ymd_and_hms(2026, 1, 31, 18, 30, 0).unwrap();
        let b = a + chrono::Duration::microseconds(500_000);
        let c = a + chrono::Duration::seconds(1);

        let (ea, eb, ec) = (encode_timestamp(a), encode_timestamp(b), encode_timestamp(c));
        assert_eq!(ea, "2026-01-31T18:30:00.000000Z");
        assert_eq!(ea.len(), eb.len());
        assert!(ea < eb && eb < ec);

        assert_eq!(decode_timestamp("created_at", &eb).unwrap(), b);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_timestamp("created_at", "yesterday"),
            Err(DbError::Corrupt { .. })
        ));
        assert!(decode_date("sale_local_date", "2026-02-01").is_ok());
        assert!(decode_date("sale_local_date", "01/02/2026").is_err());
    }
}
