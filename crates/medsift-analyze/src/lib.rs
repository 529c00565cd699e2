//! MedSift Analyze — lexical analyzers and the incremental analysis pipeline.
//!
//! Each per-document analyzer implements [`DocumentAnalyzer`]; the
//! [`AnalysisPipeline`] pulls batches of unprocessed documents per kind,
//! persists findings (or a "processed, no findings" sentinel), then recomputes
//! the global FREQUENT_TERMS aggregation from stored keyword rows.

pub mod analyzer;
pub mod category;
pub mod condition;
pub mod frequent_terms;
pub mod keyword;
pub mod pipeline;
pub mod stopwords;
pub mod text;

pub use analyzer::{DocumentAnalyzer, Finding};
pub use category::CategoryGroupingAnalyzer;
pub use condition::ConditionGroupingAnalyzer;
pub use frequent_terms::FrequentTermsAnalyzer;
pub use keyword::KeywordFrequencyAnalyzer;
pub use pipeline::{AggregationOutcome, AnalysisPipeline, KindReport, RunReport};
pub use text::extract_text;
