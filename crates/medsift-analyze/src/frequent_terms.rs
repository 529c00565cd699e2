//! Global most-frequent-terms aggregation.

use serde_json::json;
use tracing::debug;

use medsift_core::{AnalysisKind, Result};
use medsift_store::{AnalysisResult, SqliteStore};

/// Aggregation over aggregations: recomputes the globally most frequent terms
/// from stored KEYWORD_FREQUENCY rows, not from raw documents.
///
/// Output rows have no document_id. Metadata keys: `document_count`
/// (contributing rows, one per source document), `aggregated_from`, and a
/// 1-based `rank` matching output order.
pub struct FrequentTermsAnalyzer {
    limit: usize,
}

impl FrequentTermsAnalyzer {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    pub fn kind(&self) -> AnalysisKind {
        AnalysisKind::FrequentTerms
    }

    /// Build the replacement FREQUENT_TERMS row set. Empty when no
    /// KEYWORD_FREQUENCY rows exist yet; the coordinator treats that as
    /// "no change", never as a wipe.
    pub fn analyze(&self, store: &SqliteStore) -> Result<Vec<AnalysisResult>> {
        let terms = store.most_frequent_terms(self.limit, Some(AnalysisKind::KeywordFrequency))?;

        debug!("Frequent terms aggregation: {} terms", terms.len());

        Ok(terms
            .into_iter()
            .enumerate()
            .map(|(i, term)| {
                AnalysisResult::global(
                    AnalysisKind::FrequentTerms,
                    term.keyword,
                    term.total_frequency,
                    json!({
                        "document_count": term.document_count,
                        "aggregated_from": AnalysisKind::KeywordFrequency.as_str(),
                        "rank": i + 1,
                    }),
                )
            })
            .collect())
    }
}
