//! # Document Correlative Repository
//!
//! Per (store, document type, series) counters for sale document numbers.
//!
//! ## How Numbers Are Issued
//! ```text
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │              Issuing a Correlative, Inside One Transaction             │
//! │                                                                        │
//! │  1. get_next_document_number(tx, store, type, series)  → e.g. 42       │
//! │  2. insert the sale carrying "B001-00000042"                           │
//! │  3. increment_document_number(tx, store, type, series) → row at 43     │
//! │  4. commit                                                             │
//! │                                                                        │
//! │  Steps 1-3 run on the same write transaction. SQLite allows one        │
//! │  writer at a time, so two sales cannot observe the same next_number    │
//! │  and commit both: the second transaction either waits or fails and     │
//! │  rolls back in full. Numbers are never reused - a cancelled sale       │
//! │  keeps the number it consumed.                                         │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The counter row is created lazily: a scope that has never issued a
//! number reads 1, and the first increment UPSERTs the row at 2.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockroom_core::DocumentType;

/// Repository for document correlative counters.
#[derive(Debug, Clone)]
pub struct CorrelativeRepository {
    pool: SqlitePool,
}

impl CorrelativeRepository {
    /// Creates a new CorrelativeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CorrelativeRepository { pool }
    }

    /// Reads the number the next document in this scope will take.
    ///
    /// Non-mutating. Call on the transaction that will also insert the
    /// document and increment the counter, so the read cannot go stale.
    pub async fn get_next_document_number(
        &self,
        conn: &mut SqliteConnection,
        store_id: &str,
        document_type: DocumentType,
        series: &str,
    ) -> DbResult<i64> {
        let next: Option<i64> = sqlx::query_scalar(
            "SELECT next_number FROM document_counters \
             WHERE store_id = ?1 AND document_type = ?2 AND series = ?3",
        )
        .bind(store_id)
        .bind(document_type)
        .bind(series)
        .fetch_optional(&mut *conn)
        .await?;

        // No row yet means this scope has never issued a number
        Ok(next.unwrap_or(1))
    }

    /// Advances the counter past the number just consumed.
    ///
    /// A single relative UPSERT: the increment is computed by the storage
    /// engine, never from an application-side read.
    pub async fn increment_document_number(
        &self,
        conn: &mut SqliteConnection,
        store_id: &str,
        document_type: DocumentType,
        series: &str,
    ) -> DbResult<()> {
        debug!(store_id = %store_id, %document_type, series = %series, "Incrementing correlative");

        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO document_counters (store_id, document_type, series, next_number, updated_at)
            VALUES (?1, ?2, ?3, 2, ?4)
            ON CONFLICT (store_id, document_type, series)
            DO UPDATE SET next_number = next_number + 1, updated_at = ?4
            "#,
        )
        .bind(store_id)
        .bind(document_type)
        .bind(series)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Peeks at a counter outside any transaction (diagnostics only; do not
    /// use the value to number a document).
    pub async fn peek(
        &self,
        store_id: &str,
        document_type: DocumentType,
        series: &str,
    ) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        self.get_next_document_number(&mut conn, store_id, document_type, series)
            .await
    }
}

/// Formats an issued correlative as it appears on the document.
///
/// ## Example
/// ```rust
/// use stockroom_db::repository::correlative::format_document_number;
///
/// assert_eq!(format_document_number("B001", 42), "B001-00000042");
/// ```
pub fn format_document_number(series: &str, number: i64) -> String {
    format!("{}-{:08}", series, number)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::format_document_number;
    use crate::pool::{Database, DbConfig};
    use stockroom_core::{DocumentType, Store};

    async fn setup() -> (Database, Store) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store = Store::new("Main Street");
        let mut conn = db.pool().acquire().await.unwrap();
        db.parties().insert_store(&mut conn, &store).await.unwrap();
        (db, store)
    }

    #[tokio::test]
    async fn test_fresh_scope_starts_at_one() {
        let (db, store) = setup().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let next = db
            .correlatives()
            .get_next_document_number(&mut conn, &store.id, DocumentType::Receipt, "B001")
            .await
            .unwrap();
        assert_eq!(next, 1);
    }

    #[tokio::test]
    async fn test_increment_advances_monotonically() {
        let (db, store) = setup().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let repo = db.correlatives();

        let mut issued = Vec::new();
        for _ in 0..5 {
            let n = repo
                .get_next_document_number(&mut conn, &store.id, DocumentType::Receipt, "B001")
                .await
                .unwrap();
            repo.increment_document_number(&mut conn, &store.id, DocumentType::Receipt, "B001")
                .await
                .unwrap();
            issued.push(n);
        }

        assert_eq!(issued, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_scopes_are_independent() {
        let (db, store) = setup().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let repo = db.correlatives();

        repo.increment_document_number(&mut conn, &store.id, DocumentType::Receipt, "B001")
            .await
            .unwrap();
        repo.increment_document_number(&mut conn, &store.id, DocumentType::Receipt, "B001")
            .await
            .unwrap();

        // Same series, different document type
        let invoice_next = repo
            .get_next_document_number(&mut conn, &store.id, DocumentType::Invoice, "B001")
            .await
            .unwrap();
        assert_eq!(invoice_next, 1);

        // Same type, different series
        let other_series = repo
            .get_next_document_number(&mut conn, &store.id, DocumentType::Receipt, "B002")
            .await
            .unwrap();
        assert_eq!(other_series, 1);

        let receipt_next = repo
            .get_next_document_number(&mut conn, &store.id, DocumentType::Receipt, "B001")
            .await
            .unwrap();
        assert_eq!(receipt_next, 3);
    }

    #[test]
    fn test_format_document_number() {
        assert_eq!(format_document_number("B001", 1), "B001-00000001");
        assert_eq!(format_document_number("F01", 12345678), "F01-12345678");
    }
}
