//! Data types for documents and analysis results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use medsift_core::{AnalysisKind, SourceKind};

/// A captured document from one of the external registries.
///
/// Immutable from the analysis pipeline's point of view: the pipeline only
/// ever reads these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub source: SourceKind,
    pub external_id: String,
    pub title: String,
    /// Semi-structured payload as captured from the registry.
    pub payload: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub captured_at: DateTime<Utc>,
}

impl Document {
    pub fn new(
        source: SourceKind,
        external_id: impl Into<String>,
        title: impl Into<String>,
        payload: serde_json::Value,
        link: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source,
            external_id: external_id.into(),
            title: title.into(),
            payload,
            link,
            captured_at: Utc::now(),
        }
    }
}

/// One stored analysis result.
///
/// Two optional fields carry distinct meanings and are never collapsed:
/// `document_id = None` marks a global aggregation row (FREQUENT_TERMS only),
/// `keyword = None` marks a per-document "processed, no findings" sentinel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    pub kind: AnalysisKind,
    pub keyword: Option<String>,
    pub frequency: i64,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl AnalysisResult {
    /// A real finding tied to a document.
    pub fn finding(
        document_id: &str,
        kind: AnalysisKind,
        keyword: impl Into<String>,
        frequency: i64,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            document_id: Some(document_id.to_string()),
            kind,
            keyword: Some(keyword.into()),
            frequency,
            metadata,
            created_at: Utc::now(),
        }
    }

    /// A "processed, no findings" marker. Exists so the selector never
    /// re-offers this document for this kind.
    pub fn sentinel(document_id: &str, kind: AnalysisKind, reason: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            document_id: Some(document_id.to_string()),
            kind,
            keyword: None,
            frequency: 0,
            metadata: serde_json::json!({
                "processed": true,
                "no_results": true,
                "reason": reason,
            }),
            created_at: Utc::now(),
        }
    }

    /// A global aggregation row not tied to any single document.
    pub fn global(
        kind: AnalysisKind,
        keyword: impl Into<String>,
        frequency: i64,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            document_id: None,
            kind,
            keyword: Some(keyword.into()),
            frequency,
            metadata,
            created_at: Utc::now(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.document_id.is_some() && self.keyword.is_none()
    }
}

/// One row of the most-frequent-terms aggregation query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrequentTerm {
    pub keyword: String,
    pub total_frequency: i64,
    /// Number of contributing rows. KEYWORD_FREQUENCY stores at most one row
    /// per (document, keyword), so this equals distinct source documents.
    pub document_count: i64,
}

/// Filters for listing analysis results through the read API.
#[derive(Debug, Clone, Default)]
pub struct ResultFilter {
    pub kind: Option<AnalysisKind>,
    pub document_id: Option<String>,
    pub keyword: Option<String>,
}

/// Store-level statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_documents: i64,
    pub total_results: i64,
    pub frequent_terms_rows: i64,
    pub db_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_shape() {
        let row = AnalysisResult::sentinel("doc-1", AnalysisKind::KeywordFrequency, "no_findings");
        assert!(row.is_sentinel());
        assert_eq!(row.document_id.as_deref(), Some("doc-1"));
        assert_eq!(row.keyword, None);
        assert_eq!(row.frequency, 0);
        assert_eq!(row.metadata["no_results"], serde_json::json!(true));
    }

    #[test]
    fn test_global_has_no_document() {
        let row = AnalysisResult::global(
            AnalysisKind::FrequentTerms,
            "trial",
            12,
            serde_json::json!({"rank": 1}),
        );
        assert_eq!(row.document_id, None);
        assert!(!row.is_sentinel());
    }
}
