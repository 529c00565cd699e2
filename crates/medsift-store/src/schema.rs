//! Database schema SQL.

/// Core tables: documents and analysis_results.
///
/// `analysis_results.document_id` is nullable: NULL marks a global aggregation
/// row (FREQUENT_TERMS). `keyword` is independently nullable: NULL marks a
/// "processed, no findings" sentinel that still carries its document_id.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    source_kind TEXT NOT NULL,
    external_id TEXT NOT NULL,
    title TEXT NOT NULL,
    payload_json TEXT NOT NULL,
    link TEXT,
    captured_at TEXT NOT NULL,
    UNIQUE(external_id, source_kind)
);

CREATE TABLE IF NOT EXISTS analysis_results (
    id TEXT PRIMARY KEY,
    document_id TEXT REFERENCES documents(id) ON DELETE CASCADE,
    kind TEXT NOT NULL,
    keyword TEXT,
    frequency INTEGER NOT NULL CHECK (frequency >= 0),
    metadata_json TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_results_kind ON analysis_results(kind);
CREATE INDEX IF NOT EXISTS idx_results_document ON analysis_results(document_id);
CREATE INDEX IF NOT EXISTS idx_results_kind_keyword ON analysis_results(kind, keyword);
CREATE INDEX IF NOT EXISTS idx_documents_source ON documents(source_kind, external_id);
"#;
