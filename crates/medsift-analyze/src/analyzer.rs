//! The per-document analyzer contract.

use medsift_core::{AnalysisKind, Result};
use medsift_store::Document;

/// One (keyword, frequency, metadata) tuple produced by an analyzer.
///
/// The metadata map is deliberately schema-loose per analysis kind; each
/// analyzer documents its own keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub keyword: String,
    pub frequency: i64,
    pub metadata: serde_json::Value,
}

/// A pure per-document analyzer.
///
/// Returning an empty vec is a normal outcome (the coordinator stores a
/// sentinel for it); `Err` is reserved for unexpected faults and leaves the
/// document unprocessed, to be retried on the next pass. Malformed or
/// wrong-shaped payloads must be tolerated by returning no findings.
pub trait DocumentAnalyzer: Send + Sync {
    fn kind(&self) -> AnalysisKind;
    fn analyze(&self, doc: &Document) -> Result<Vec<Finding>>;
}
