//! SQLite-backed store for documents and analysis results.
//!
//! One connection behind a mutex, WAL journal, cached statements. All batch
//! writes (`create_results`, `replace_results_for_kind`) run inside a single
//! transaction so a failed batch leaves no partial rows visible.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::info;

use crate::schema::SCHEMA_SQL;
use crate::types::*;
use medsift_core::{AnalysisKind, Error, Result, SourceKind};

/// SQLite store holding the document corpus and all analysis results.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open or create the store.
    ///
    /// `db_dir` is the directory (e.g., `data/corpus/`). The file will be
    /// `db_dir/medsift.db`.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join("medsift.db");

        let conn = Self::create_connection(&db_path)?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };

        let stats = store.get_stats()?;
        info!(
            "SqliteStore initialized: {} documents, {} results, path={}",
            stats.total_documents,
            stats.total_results,
            store.db_path.display()
        );

        Ok(store)
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(conn)
    }

    // ---------------------------------------------------------------
    // Documents
    // ---------------------------------------------------------------

    /// Insert a captured document.
    pub fn add_document(&self, doc: &Document) -> Result<()> {
        let payload_json = serde_json::to_string(&doc.payload)?;
        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO documents (id, source_kind, external_id, title, payload_json, link, captured_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .map_err(|e| Error::Database(e.to_string()))?
        .execute(params![
            doc.id,
            doc.source.as_str(),
            doc.external_id,
            doc.title,
            payload_json,
            doc.link,
            doc.captured_at.to_rfc3339(),
        ])
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint") {
                Error::DuplicateDocument(doc.external_id.clone())
            } else {
                Error::Database(e.to_string())
            }
        })?;
        Ok(())
    }

    /// Get a document by ID.
    pub fn get_document(&self, doc_id: &str) -> Result<Option<Document>> {
        let conn = self.conn.lock();
        let result = conn
            .prepare_cached("SELECT * FROM documents WHERE id = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![doc_id], Self::row_to_document)
            .optional()
            .map_err(|e| Error::Database(e.to_string()));
        result
    }

    /// Whether a document from this source was already captured.
    pub fn document_exists(&self, external_id: &str, source: SourceKind) -> Result<bool> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .prepare_cached(
                "SELECT COUNT(*) FROM documents WHERE external_id = ?1 AND source_kind = ?2",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![external_id, source.as_str()], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Count total documents.
    pub fn count_documents(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Get documents with pagination (page is 1-based). Returns (docs, total).
    pub fn documents_paginated(&self, page: usize, page_size: usize) -> Result<(Vec<Document>, i64)> {
        let total = self.count_documents()?;
        let offset = page_offset(page, page_size);

        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT * FROM documents ORDER BY captured_at DESC LIMIT ?1 OFFSET ?2",
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![sql_bound(page_size), offset], Self::row_to_document)
            .map_err(|e| Error::Database(e.to_string()))?;

        let docs: Vec<Document> = rows.filter_map(|r| r.ok()).collect();
        Ok((docs, total))
    }

    /// Delete a document and its results (cascade). Returns true if it existed.
    pub fn delete_document(&self, doc_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let count = conn
            .execute("DELETE FROM documents WHERE id = ?1", params![doc_id])
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count > 0)
    }

    // ---------------------------------------------------------------
    // Analysis results
    // ---------------------------------------------------------------

    /// Insert a batch of results in one transaction. Returns the new IDs.
    pub fn create_results(&self, results: &[AnalysisResult]) -> Result<Vec<String>> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(|e| Error::Database(e.to_string()))?;
        let ids = Self::insert_results(&tx, results)?;
        tx.commit().map_err(|e| Error::Database(e.to_string()))?;
        Ok(ids)
    }

    fn insert_results(tx: &rusqlite::Transaction<'_>, results: &[AnalysisResult]) -> Result<Vec<String>> {
        let mut ids = Vec::with_capacity(results.len());
        let mut stmt = tx
            .prepare_cached(
                "INSERT INTO analysis_results (id, document_id, kind, keyword, frequency, metadata_json, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        for r in results {
            let metadata_json = serde_json::to_string(&r.metadata)?;
            stmt.execute(params![
                r.id,
                r.document_id,
                r.kind.as_str(),
                r.keyword,
                r.frequency,
                metadata_json,
                r.created_at.to_rfc3339(),
            ])
            .map_err(|e| Error::Database(e.to_string()))?;
            ids.push(r.id.clone());
        }
        Ok(ids)
    }

    /// Delete every row of `kind` and insert `results`, in one transaction.
    ///
    /// This is the FREQUENT_TERMS replace cycle: the new set is a full
    /// replacement, never an accumulation. Returns (deleted, inserted).
    pub fn replace_results_for_kind(
        &self,
        kind: AnalysisKind,
        results: &[AnalysisResult],
    ) -> Result<(usize, usize)> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(|e| Error::Database(e.to_string()))?;
        let deleted = tx
            .execute(
                "DELETE FROM analysis_results WHERE kind = ?1",
                params![kind.as_str()],
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        let ids = Self::insert_results(&tx, results)?;
        tx.commit().map_err(|e| Error::Database(e.to_string()))?;
        Ok((deleted, ids.len()))
    }

    /// Get a result by ID.
    pub fn get_result(&self, result_id: &str) -> Result<Option<AnalysisResult>> {
        let conn = self.conn.lock();
        let result = conn
            .prepare_cached("SELECT * FROM analysis_results WHERE id = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![result_id], Self::row_to_result)
            .optional()
            .map_err(|e| Error::Database(e.to_string()));
        result
    }

    /// All results of one kind.
    pub fn results_by_kind(&self, kind: AnalysisKind) -> Result<Vec<AnalysisResult>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT * FROM analysis_results WHERE kind = ?1 ORDER BY rowid")
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![kind.as_str()], Self::row_to_result)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// All results for one document.
    pub fn results_by_document(&self, doc_id: &str) -> Result<Vec<AnalysisResult>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT * FROM analysis_results WHERE document_id = ?1 ORDER BY rowid")
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![doc_id], Self::row_to_result)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Filtered, paginated listing for the read API. Returns (rows, total).
    pub fn list_results(
        &self,
        filter: &ResultFilter,
        page: usize,
        page_size: usize,
    ) -> Result<(Vec<AnalysisResult>, i64)> {
        let mut conds: Vec<&str> = Vec::new();
        let mut bind: Vec<Value> = Vec::new();

        if let Some(kind) = filter.kind {
            conds.push("kind = ?");
            bind.push(Value::Text(kind.as_str().to_string()));
        }
        if let Some(doc_id) = &filter.document_id {
            conds.push("document_id = ?");
            bind.push(Value::Text(doc_id.clone()));
        }
        if let Some(keyword) = &filter.keyword {
            conds.push("keyword = ?");
            bind.push(Value::Text(keyword.clone()));
        }

        let where_clause = if conds.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conds.join(" AND "))
        };

        let conn = self.conn.lock();

        let count_sql = format!("SELECT COUNT(*) FROM analysis_results {}", where_clause);
        let total: i64 = conn
            .prepare(&count_sql)
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params_from_iter(bind.iter()), |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))?;

        let offset = page_offset(page, page_size);
        let list_sql = format!(
            "SELECT * FROM analysis_results {} ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
            where_clause
        );
        bind.push(Value::Integer(sql_bound(page_size)));
        bind.push(Value::Integer(offset));

        let mut stmt = conn
            .prepare(&list_sql)
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params_from_iter(bind.iter()), Self::row_to_result)
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok((rows.filter_map(|r| r.ok()).collect(), total))
    }

    /// Delete one result row. NotFound if it does not exist.
    pub fn delete_result(&self, result_id: &str) -> Result<()> {
        let conn = self.conn.lock();
        let count = conn
            .execute("DELETE FROM analysis_results WHERE id = ?1", params![result_id])
            .map_err(|e| Error::Database(e.to_string()))?;
        if count == 0 {
            return Err(Error::NotFound(format!("analysis result {}", result_id)));
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Pipeline queries
    // ---------------------------------------------------------------

    /// Document IDs with no result row (sentinel or real) of the given kind.
    ///
    /// Ordered by document rowid so repeated calls against unchanged data are
    /// deterministic; callers get no other ordering promise.
    pub fn unprocessed_document_ids(&self, kind: AnalysisKind, limit: usize) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT d.id FROM documents d
                 WHERE d.id NOT IN (
                     SELECT DISTINCT document_id FROM analysis_results
                     WHERE kind = ?1 AND document_id IS NOT NULL
                 )
                 ORDER BY d.rowid
                 LIMIT ?2",
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![kind.as_str(), limit as i64], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Sum of `frequency` and contributing row count per keyword, most
    /// frequent first. Sentinel rows (NULL keyword) never contribute.
    ///
    /// Ties on the summed frequency break toward the keyword whose first row
    /// was stored earliest (smaller MIN(rowid)), which keeps output stable
    /// across recomputations over unchanged data.
    pub fn most_frequent_terms(
        &self,
        limit: usize,
        kind: Option<AnalysisKind>,
    ) -> Result<Vec<FrequentTerm>> {
        let conn = self.conn.lock();
        let (sql, bind): (&str, Vec<Value>) = match kind {
            Some(kind) => (
                "SELECT keyword, SUM(frequency) AS total_frequency, COUNT(*) AS document_count
                 FROM analysis_results
                 WHERE keyword IS NOT NULL AND kind = ?1
                 GROUP BY keyword
                 ORDER BY total_frequency DESC, MIN(rowid) ASC
                 LIMIT ?2",
                vec![
                    Value::Text(kind.as_str().to_string()),
                    Value::Integer(limit as i64),
                ],
            ),
            None => (
                "SELECT keyword, SUM(frequency) AS total_frequency, COUNT(*) AS document_count
                 FROM analysis_results
                 WHERE keyword IS NOT NULL
                 GROUP BY keyword
                 ORDER BY total_frequency DESC, MIN(rowid) ASC
                 LIMIT ?1",
                vec![Value::Integer(limit as i64)],
            ),
        };

        let mut stmt = conn
            .prepare_cached(sql)
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params_from_iter(bind.iter()), |row| {
                Ok(FrequentTerm {
                    keyword: row.get(0)?,
                    total_frequency: row.get(1)?,
                    document_count: row.get(2)?,
                })
            })
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Store statistics.
    pub fn get_stats(&self) -> Result<StoreStats> {
        let conn = self.conn.lock();
        let total_documents: i64 = conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))?;
        let total_results: i64 = conn
            .query_row("SELECT COUNT(*) FROM analysis_results", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))?;
        let frequent_terms_rows: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM analysis_results WHERE kind = ?1",
                params![AnalysisKind::FrequentTerms.as_str()],
                |row| row.get(0),
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(StoreStats {
            total_documents,
            total_results,
            frequent_terms_rows,
            db_path: self.db_path.display().to_string(),
        })
    }

    // ---------------------------------------------------------------
    // Row mapping
    // ---------------------------------------------------------------

    fn row_to_document(row: &Row<'_>) -> rusqlite::Result<Document> {
        let source_raw: String = row.get("source_kind")?;
        let source = SourceKind::parse(&source_raw)
            .ok_or_else(|| bad_column(1, format!("unknown source kind: {}", source_raw)))?;
        let payload_raw: String = row.get("payload_json")?;
        let payload = serde_json::from_str(&payload_raw)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
        Ok(Document {
            id: row.get("id")?,
            source,
            external_id: row.get("external_id")?,
            title: row.get("title")?,
            payload,
            link: row.get("link")?,
            captured_at: parse_timestamp(row.get("captured_at")?, 6)?,
        })
    }

    fn row_to_result(row: &Row<'_>) -> rusqlite::Result<AnalysisResult> {
        let kind_raw: String = row.get("kind")?;
        let kind = AnalysisKind::parse(&kind_raw)
            .ok_or_else(|| bad_column(2, format!("unknown analysis kind: {}", kind_raw)))?;
        let metadata_raw: String = row.get("metadata_json")?;
        let metadata = serde_json::from_str(&metadata_raw)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;
        Ok(AnalysisResult {
            id: row.get("id")?,
            document_id: row.get("document_id")?,
            kind,
            keyword: row.get("keyword")?,
            frequency: row.get("frequency")?,
            metadata,
            created_at: parse_timestamp(row.get("created_at")?, 6)?,
        })
    }
}

/// Clamp a usize into an i64 SQL bind. A negative LIMIT/OFFSET would mean
/// "unbounded"/"no offset" to SQLite, so untrusted page numbers from query
/// strings must saturate instead of wrapping.
fn sql_bound(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn page_offset(page: usize, page_size: usize) -> i64 {
    sql_bound(page.saturating_sub(1).saturating_mul(page_size))
}

fn parse_timestamp(raw: String, col: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(col, Type::Text, Box::new(e)))
}

fn bad_column(col: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        col,
        Type::Text,
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message)),
    )
}
