//! Analysis run coordinator.
//!
//! One pass walks the per-document kinds in a fixed order, pulls a bounded
//! batch of unprocessed documents for each, and persists findings or a
//! sentinel per document. The FREQUENT_TERMS aggregation always runs last
//! because it reads stored KEYWORD_FREQUENCY rows.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::analyzer::DocumentAnalyzer;
use crate::category::CategoryGroupingAnalyzer;
use crate::condition::ConditionGroupingAnalyzer;
use crate::frequent_terms::FrequentTermsAnalyzer;
use crate::keyword::KeywordFrequencyAnalyzer;
use medsift_core::{AnalysisKind, AnalysisSettings, Error, Result};
use medsift_store::{AnalysisResult, SqliteStore};

const SENTINEL_REASON: &str = "no_findings";

/// Per-kind counts for one pass.
#[derive(Debug, Clone, Serialize)]
pub struct KindReport {
    pub kind: AnalysisKind,
    /// Documents the selector offered.
    pub selected: usize,
    /// Documents persisted with real findings.
    pub analyzed: usize,
    /// Documents persisted with a "no findings" sentinel.
    pub sentinels: usize,
    /// Documents that failed (analyzer fault or write fault); retried next pass.
    pub errors: usize,
    /// Documents that vanished between selection and load; not an error.
    pub skipped_missing: usize,
}

impl KindReport {
    fn new(kind: AnalysisKind) -> Self {
        Self {
            kind,
            selected: 0,
            analyzed: 0,
            sentinels: 0,
            errors: 0,
            skipped_missing: 0,
        }
    }
}

/// What happened to the FREQUENT_TERMS set in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum AggregationOutcome {
    /// Prior rows deleted, new rows inserted, in one transaction.
    Replaced { deleted: usize, inserted: usize },
    /// Aggregator produced nothing; prior rows left untouched.
    SkippedEmpty,
    /// Aggregation or its replace transaction failed; prior rows intact.
    Failed,
}

/// Result of one full analysis pass.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub kinds: Vec<KindReport>,
    pub aggregation: AggregationOutcome,
    pub duration_ms: u64,
}

impl RunReport {
    /// Total documents persisted with real findings across all kinds.
    pub fn total_analyzed(&self) -> usize {
        self.kinds.iter().map(|k| k.analyzed).sum()
    }
}

/// Coordinates one full analysis pass over the stored corpus.
pub struct AnalysisPipeline {
    store: Arc<SqliteStore>,
    settings: AnalysisSettings,
    analyzers: Vec<Box<dyn DocumentAnalyzer>>,
    aggregator: FrequentTermsAnalyzer,
    run_guard: Mutex<()>,
}

impl AnalysisPipeline {
    pub fn new(store: Arc<SqliteStore>, settings: AnalysisSettings) -> Self {
        // Fixed order: FREQUENT_TERMS depends on KEYWORD_FREQUENCY being current.
        let analyzers: Vec<Box<dyn DocumentAnalyzer>> = vec![
            Box::new(KeywordFrequencyAnalyzer::new(&settings)),
            Box::new(ConditionGroupingAnalyzer),
            Box::new(CategoryGroupingAnalyzer),
        ];
        let aggregator = FrequentTermsAnalyzer::new(settings.frequent_terms_limit);
        Self {
            store,
            settings,
            analyzers,
            aggregator,
            run_guard: Mutex::new(()),
        }
    }

    /// Run one full pass: per-document kinds, then the global aggregation.
    ///
    /// Not re-entrant. A trigger while a pass is running is rejected so two
    /// passes can never double-process the same unprocessed document.
    pub fn run_once(&self) -> Result<RunReport> {
        let _guard = self
            .run_guard
            .try_lock()
            .ok_or_else(|| Error::Internal("analysis run already in progress".into()))?;

        let start = std::time::Instant::now();
        info!("Starting analysis pass");

        let mut kinds = Vec::with_capacity(self.analyzers.len());
        for analyzer in &self.analyzers {
            match self.run_kind(analyzer.as_ref()) {
                Ok(report) => kinds.push(report),
                Err(e) => {
                    // One kind's pass failing must not affect the others.
                    error!("{} pass failed: {}", analyzer.kind(), e);
                    let mut report = KindReport::new(analyzer.kind());
                    report.errors = 1;
                    kinds.push(report);
                }
            }
        }

        let aggregation = self.run_aggregation();

        let report = RunReport {
            kinds,
            aggregation,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            "Analysis pass complete: {} analyzed, aggregation={:?}, duration={}ms",
            report.total_analyzed(),
            report.aggregation,
            report.duration_ms
        );
        Ok(report)
    }

    fn run_kind(&self, analyzer: &dyn DocumentAnalyzer) -> Result<KindReport> {
        let kind = analyzer.kind();
        let mut report = KindReport::new(kind);

        let doc_ids = self
            .store
            .unprocessed_document_ids(kind, self.settings.batch_size)?;
        report.selected = doc_ids.len();
        if doc_ids.is_empty() {
            info!("No unprocessed documents for {}", kind);
            return Ok(report);
        }

        info!("Found {} unprocessed documents for {}", doc_ids.len(), kind);

        for doc_id in &doc_ids {
            // Each document is its own unit of work: a failure here must not
            // abort the rest of the batch.
            let doc = match self.store.get_document(doc_id) {
                Ok(Some(doc)) => doc,
                Ok(None) => {
                    // Deleted between selection and load; nothing left to
                    // process, so no row of any kind is written.
                    info!("Document {} vanished before {} analysis", doc_id, kind);
                    report.skipped_missing += 1;
                    continue;
                }
                Err(e) => {
                    error!("Failed to load document {}: {}", doc_id, e);
                    report.errors += 1;
                    continue;
                }
            };

            let findings = match analyzer.analyze(&doc) {
                Ok(findings) => findings,
                Err(e) => {
                    // Analyzer fault: leave unprocessed so the next pass retries.
                    error!("{} analysis failed for document {}: {}", kind, doc_id, e);
                    report.errors += 1;
                    continue;
                }
            };

            if findings.is_empty() {
                // Exactly one sentinel so the selector never re-offers this
                // document for this kind.
                let sentinel = AnalysisResult::sentinel(doc_id, kind, SENTINEL_REASON);
                match self.store.create_results(&[sentinel]) {
                    Ok(_) => report.sentinels += 1,
                    Err(e) => {
                        error!("Failed to store sentinel for document {}: {}", doc_id, e);
                        report.errors += 1;
                    }
                }
                continue;
            }

            let rows: Vec<AnalysisResult> = findings
                .into_iter()
                .map(|f| AnalysisResult::finding(&doc.id, kind, f.keyword, f.frequency, f.metadata))
                .collect();
            match self.store.create_results(&rows) {
                Ok(_) => report.analyzed += 1,
                Err(e) => {
                    error!("Failed to store {} results for document {}: {}", kind, doc_id, e);
                    report.errors += 1;
                }
            }
        }

        info!(
            "Completed {} pass: {} analyzed, {} sentinels, {} errors, {} missing",
            kind, report.analyzed, report.sentinels, report.errors, report.skipped_missing
        );
        Ok(report)
    }

    fn run_aggregation(&self) -> AggregationOutcome {
        let rows = match self.aggregator.analyze(&self.store) {
            Ok(rows) => rows,
            Err(e) => {
                error!("Frequent terms aggregation failed: {}", e);
                return AggregationOutcome::Failed;
            }
        };

        if rows.is_empty() {
            // "No data" means "no change": wiping prior rows on a transient
            // empty recompute would lose valid results.
            warn!("Frequent terms aggregation produced no rows; keeping prior set");
            return AggregationOutcome::SkippedEmpty;
        }

        match self
            .store
            .replace_results_for_kind(AnalysisKind::FrequentTerms, &rows)
        {
            Ok((deleted, inserted)) => {
                info!(
                    "Frequent terms replaced: {} deleted, {} inserted",
                    deleted, inserted
                );
                AggregationOutcome::Replaced { deleted, inserted }
            }
            Err(e) => {
                error!("Failed to replace frequent terms: {}", e);
                AggregationOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medsift_core::SourceKind;
    use medsift_store::Document;
    use serde_json::json;

    fn test_pipeline() -> (Arc<SqliteStore>, AnalysisPipeline, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteStore::open(dir.path()).unwrap());
        let pipeline = AnalysisPipeline::new(store.clone(), AnalysisSettings::default());
        (store, pipeline, dir)
    }

    fn trial_doc(external_id: &str, title: &str, payload: serde_json::Value) -> Document {
        Document::new(SourceKind::ClinicalTrials, external_id, title, payload, None)
    }

    fn kind_report(report: &RunReport, kind: AnalysisKind) -> &KindReport {
        report.kinds.iter().find(|k| k.kind == kind).unwrap()
    }

    #[test]
    fn test_two_passes_are_idempotent() {
        let (store, pipeline, _dir) = test_pipeline();
        store
            .add_document(&trial_doc(
                "NCT001",
                "Asthma inhaler maintenance study",
                json!({
                    "protocolSection": {
                        "conditionsModule": {"conditions": ["Asthma"]},
                        "designModule": {"phases": ["Phase 2"]},
                    }
                }),
            ))
            .unwrap();

        let first = pipeline.run_once().unwrap();
        for kind in AnalysisKind::per_document() {
            let k = kind_report(&first, *kind);
            assert_eq!(k.selected, 1, "{} should select the document", kind);
            assert_eq!(k.analyzed + k.sentinels, 1);
            assert_eq!(k.errors, 0);
        }

        // Second pass over unchanged data must find nothing to do.
        let second = pipeline.run_once().unwrap();
        for kind in AnalysisKind::per_document() {
            let k = kind_report(&second, *kind);
            assert_eq!(k.selected, 0, "{} re-offered a processed document", kind);
        }
    }

    #[test]
    fn test_sentinel_discrimination() {
        let (store, pipeline, _dir) = test_pipeline();
        // No strings anywhere: every analyzer legitimately finds nothing.
        let barren = trial_doc("NCT001", "", json!({"count": 3}));
        // Real findings for keyword analysis at least.
        let rich = trial_doc(
            "NCT002",
            "Hypertension treatment outcomes",
            json!({"protocolSection": {"conditionsModule": {"conditions": ["Hypertension"]}}}),
        );
        store.add_document(&barren).unwrap();
        store.add_document(&rich).unwrap();

        pipeline.run_once().unwrap();

        let barren_rows = store.results_by_document(&barren.id).unwrap();
        // Exactly one row per kind, all sentinels.
        assert_eq!(barren_rows.len(), AnalysisKind::per_document().len());
        for row in &barren_rows {
            assert!(row.is_sentinel());
            assert_eq!(row.frequency, 0);
            assert_eq!(row.metadata["no_results"], json!(true));
        }

        let rich_rows = store.results_by_document(&rich.id).unwrap();
        assert!(rich_rows
            .iter()
            .filter(|r| r.kind == AnalysisKind::KeywordFrequency)
            .all(|r| r.keyword.is_some()));

        // Both documents are now processed for every kind.
        for kind in AnalysisKind::per_document() {
            assert!(store.unprocessed_document_ids(*kind, 10).unwrap().is_empty());
        }
    }

    #[test]
    fn test_cross_kind_independence() {
        let (store, pipeline, _dir) = test_pipeline();
        let doc = trial_doc("NCT001", "Diabetes trial", json!({}));
        store.add_document(&doc).unwrap();

        // Mark processed for keyword frequency only.
        store
            .create_results(&[AnalysisResult::finding(
                &doc.id,
                AnalysisKind::KeywordFrequency,
                "diabetes",
                1,
                json!({}),
            )])
            .unwrap();

        assert!(store
            .unprocessed_document_ids(AnalysisKind::KeywordFrequency, 10)
            .unwrap()
            .is_empty());
        assert_eq!(
            store
                .unprocessed_document_ids(AnalysisKind::ConditionGrouping, 10)
                .unwrap(),
            vec![doc.id.clone()]
        );

        let report = pipeline.run_once().unwrap();
        assert_eq!(kind_report(&report, AnalysisKind::KeywordFrequency).selected, 0);
        assert_eq!(kind_report(&report, AnalysisKind::ConditionGrouping).selected, 1);
    }

    #[test]
    fn test_aggregation_replace_semantics() {
        let (store, pipeline, _dir) = test_pipeline();
        let a = trial_doc("NCT001", "A", json!({}));
        let b = trial_doc("NCT002", "B", json!({}));
        store.add_document(&a).unwrap();
        store.add_document(&b).unwrap();
        store
            .create_results(&[
                AnalysisResult::finding(&a.id, AnalysisKind::KeywordFrequency, "trial", 5, json!({})),
                AnalysisResult::finding(&b.id, AnalysisKind::KeywordFrequency, "trial", 7, json!({})),
            ])
            .unwrap();

        let report = pipeline.run_once().unwrap();
        assert!(matches!(
            report.aggregation,
            AggregationOutcome::Replaced { deleted: 0, .. }
        ));

        let terms = store.results_by_kind(AnalysisKind::FrequentTerms).unwrap();
        let trial: Vec<_> = terms
            .iter()
            .filter(|r| r.keyword.as_deref() == Some("trial"))
            .collect();
        assert_eq!(trial.len(), 1);
        assert_eq!(trial[0].frequency, 12);
        assert_eq!(trial[0].metadata["document_count"], json!(2));

        // A third contribution appears; recompute replaces, never accumulates.
        let c = trial_doc("NCT003", "C", json!({}));
        store.add_document(&c).unwrap();
        store
            .create_results(&[AnalysisResult::finding(
                &c.id,
                AnalysisKind::KeywordFrequency,
                "trial",
                3,
                json!({}),
            )])
            .unwrap();

        pipeline.run_once().unwrap();

        let terms = store.results_by_kind(AnalysisKind::FrequentTerms).unwrap();
        let trial: Vec<_> = terms
            .iter()
            .filter(|r| r.keyword.as_deref() == Some("trial"))
            .collect();
        assert_eq!(trial.len(), 1);
        assert_eq!(trial[0].frequency, 15);
        assert_eq!(trial[0].metadata["document_count"], json!(3));
    }

    #[test]
    fn test_empty_aggregation_is_non_destructive() {
        let (store, pipeline, _dir) = test_pipeline();
        // Prior FREQUENT_TERMS rows but no KEYWORD_FREQUENCY rows at all.
        store
            .create_results(&[AnalysisResult::global(
                AnalysisKind::FrequentTerms,
                "stale",
                9,
                json!({"rank": 1}),
            )])
            .unwrap();

        let report = pipeline.run_once().unwrap();
        assert_eq!(report.aggregation, AggregationOutcome::SkippedEmpty);

        let terms = store.results_by_kind(AnalysisKind::FrequentTerms).unwrap();
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].keyword.as_deref(), Some("stale"));
    }

    struct FailingAnalyzer;

    impl DocumentAnalyzer for FailingAnalyzer {
        fn kind(&self) -> AnalysisKind {
            AnalysisKind::ConditionGrouping
        }

        fn analyze(&self, doc: &Document) -> medsift_core::Result<Vec<crate::Finding>> {
            Err(Error::Analysis {
                kind: self.kind(),
                document_id: doc.id.clone(),
                message: "simulated fault".into(),
            })
        }
    }

    #[test]
    fn test_analyzer_fault_leaves_document_unprocessed() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteStore::open(dir.path()).unwrap());
        let doc = trial_doc("NCT001", "Trial", json!({}));
        store.add_document(&doc).unwrap();

        let pipeline = AnalysisPipeline {
            store: store.clone(),
            settings: AnalysisSettings::default(),
            analyzers: vec![Box::new(FailingAnalyzer)],
            aggregator: FrequentTermsAnalyzer::new(50),
            run_guard: Mutex::new(()),
        };

        let report = pipeline.run_once().unwrap();
        let k = kind_report(&report, AnalysisKind::ConditionGrouping);
        assert_eq!(k.errors, 1);
        assert_eq!(k.analyzed, 0);
        assert_eq!(k.sentinels, 0);

        // No row was written, so the next pass retries this document.
        assert_eq!(
            store
                .unprocessed_document_ids(AnalysisKind::ConditionGrouping, 10)
                .unwrap(),
            vec![doc.id]
        );
    }

    #[test]
    fn test_concurrent_trigger_rejected() {
        let (_store, pipeline, _dir) = test_pipeline();
        let _held = pipeline.run_guard.lock();
        let err = pipeline.run_once().unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn test_batch_size_bounds_selection() {
        let (store, _pipeline, dir) = test_pipeline();
        drop(_pipeline);
        for i in 0..5 {
            store
                .add_document(&trial_doc(&format!("NCT{:03}", i), "Trial", json!({})))
                .unwrap();
        }
        let pipeline = AnalysisPipeline::new(
            store.clone(),
            AnalysisSettings {
                batch_size: 2,
                ..Default::default()
            },
        );
        let report = pipeline.run_once().unwrap();
        assert_eq!(kind_report(&report, AnalysisKind::KeywordFrequency).selected, 2);
        drop(dir);
    }
}
