//! Keyword frequency analysis with n-gram extraction.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use tracing::debug;

use crate::analyzer::{DocumentAnalyzer, Finding};
use crate::stopwords::is_stop_word;
use crate::text::extract_text;
use medsift_core::{AnalysisKind, AnalysisSettings, Result};
use medsift_store::Document;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z]+").expect("valid token regex"));

/// Counts keywords from title + payload text.
///
/// Unigrams pass a minimum-length and stop-word filter. Word n-grams
/// (2..=max_ngram) are taken from the unfiltered token stream and accepted
/// when the stop-word fraction stays at or below the ceiling and at least one
/// non-stop token meets the minimum length. Unigrams and n-grams share one
/// frequency table; output is the top-k by frequency, ties broken by first
/// encounter.
///
/// Metadata keys per finding: `source`, `title`.
pub struct KeywordFrequencyAnalyzer {
    min_token_len: usize,
    max_ngram: usize,
    max_stopword_ratio: f64,
    top_k: usize,
}

impl KeywordFrequencyAnalyzer {
    pub fn new(settings: &AnalysisSettings) -> Self {
        Self {
            min_token_len: settings.min_token_len,
            max_ngram: settings.max_ngram,
            max_stopword_ratio: settings.max_stopword_ratio,
            top_k: settings.keyword_top_k,
        }
    }

    /// Tokenize into maximal ASCII-letter runs, lowercased, unfiltered.
    fn tokenize(text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        TOKEN_RE
            .find_iter(&lowered)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    fn ngram_accepted(&self, window: &[String]) -> bool {
        let stop_count = window.iter().filter(|t| is_stop_word(t)).count();
        let ratio = stop_count as f64 / window.len() as f64;
        if ratio > self.max_stopword_ratio {
            return false;
        }
        window
            .iter()
            .any(|t| !is_stop_word(t) && t.len() >= self.min_token_len)
    }

    fn count_terms(&self, tokens: &[String]) -> TermCounter {
        let mut counter = TermCounter::default();

        for token in tokens {
            if token.len() >= self.min_token_len && !is_stop_word(token) {
                counter.bump(token.clone());
            }
        }

        for n in 2..=self.max_ngram {
            if tokens.len() < n {
                break;
            }
            for window in tokens.windows(n) {
                if self.ngram_accepted(window) {
                    counter.bump(window.join(" "));
                }
            }
        }

        counter
    }
}

impl DocumentAnalyzer for KeywordFrequencyAnalyzer {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::KeywordFrequency
    }

    fn analyze(&self, doc: &Document) -> Result<Vec<Finding>> {
        let mut text = doc.title.clone();
        let payload_text = extract_text(&doc.payload);
        if !payload_text.is_empty() {
            text.push(' ');
            text.push_str(&payload_text);
        }

        let tokens = Self::tokenize(&text);
        let counter = self.count_terms(&tokens);
        let top = counter.into_top(self.top_k);

        debug!(
            "Keyword analysis for document {}: {} terms kept",
            doc.id,
            top.len()
        );

        let metadata = json!({
            "source": doc.source.as_str(),
            "title": doc.title,
        });
        Ok(top
            .into_iter()
            .map(|(keyword, frequency)| Finding {
                keyword,
                frequency,
                metadata: metadata.clone(),
            })
            .collect())
    }
}

/// Frequency table that remembers first-encounter order for stable tie-breaks.
#[derive(Default)]
struct TermCounter {
    counts: HashMap<String, i64>,
    order: Vec<String>,
}

impl TermCounter {
    fn bump(&mut self, term: String) {
        match self.counts.get_mut(&term) {
            Some(count) => *count += 1,
            None => {
                self.counts.insert(term.clone(), 1);
                self.order.push(term);
            }
        }
    }

    /// Top-k entries by frequency descending. The sort is stable over
    /// first-encounter order, so equal frequencies keep that order.
    fn into_top(self, k: usize) -> Vec<(String, i64)> {
        let mut entries: Vec<(String, i64)> = self
            .order
            .into_iter()
            .map(|term| {
                let count = self.counts[&term];
                (term, count)
            })
            .collect();
        entries.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
        entries.truncate(k);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medsift_core::SourceKind;
    use serde_json::json;

    fn analyzer() -> KeywordFrequencyAnalyzer {
        KeywordFrequencyAnalyzer::new(&AnalysisSettings::default())
    }

    fn doc(title: &str, payload: serde_json::Value) -> Document {
        Document::new(SourceKind::ClinicalTrials, "NCT001", title, payload, None)
    }

    #[test]
    fn test_unigram_filtering() {
        let a = analyzer();
        let d = doc("", json!({"summary": "the drug is safe and the drug works"}));
        let findings = a.analyze(&d).unwrap();
        let keywords: Vec<&str> = findings.iter().map(|f| f.keyword.as_str()).collect();
        assert!(keywords.contains(&"drug"));
        assert!(keywords.contains(&"safe"));
        assert!(keywords.contains(&"works"));
        // Stop words and short tokens never appear as unigrams.
        assert!(!keywords.contains(&"the"));
        assert!(!keywords.contains(&"is"));
        assert!(!keywords.contains(&"and"));
    }

    #[test]
    fn test_ngram_boundary_at_default_ratio() {
        let a = analyzer();
        // 1 stop word out of 2 is exactly at the 0.5 ceiling: accepted.
        assert!(a.ngram_accepted(&["drug".into(), "is".into()]));
        // 2 of 3 exceeds it: rejected.
        assert!(!a.ngram_accepted(&["the".into(), "drug".into(), "is".into()]));
        // No stop words, both qualify: accepted.
        assert!(a.ngram_accepted(&["drug".into(), "safe".into()]));
    }

    #[test]
    fn test_ngram_rejected_below_strict_ratio() {
        let strict = KeywordFrequencyAnalyzer::new(&AnalysisSettings {
            max_stopword_ratio: 0.4,
            ..Default::default()
        });
        assert!(!strict.ngram_accepted(&["drug".into(), "is".into()]));
        assert!(strict.ngram_accepted(&["drug".into(), "safe".into()]));
    }

    #[test]
    fn test_ngram_needs_one_qualifying_token() {
        let a = analyzer();
        // Neither non-stop token reaches min length 3.
        assert!(!a.ngram_accepted(&["mg".into(), "iv".into()]));
    }

    #[test]
    fn test_ngrams_counted_with_unigrams() {
        let a = analyzer();
        let d = doc("", json!({"s": "lung cancer study lung cancer trial"}));
        let findings = a.analyze(&d).unwrap();
        let freq = |kw: &str| {
            findings
                .iter()
                .find(|f| f.keyword == kw)
                .map(|f| f.frequency)
        };
        assert_eq!(freq("lung"), Some(2));
        assert_eq!(freq("cancer"), Some(2));
        assert_eq!(freq("lung cancer"), Some(2));
        assert_eq!(freq("cancer study"), Some(1));
        assert_eq!(freq("lung cancer study"), Some(1));
    }

    #[test]
    fn test_top_k_tie_break_is_first_seen() {
        let mut counter = TermCounter::default();
        for term in ["beta", "alpha", "beta", "alpha", "gamma"] {
            counter.bump(term.to_string());
        }
        let top = counter.into_top(2);
        // beta and alpha both have 2; beta was seen first.
        assert_eq!(top, vec![("beta".to_string(), 2), ("alpha".to_string(), 2)]);
    }

    #[test]
    fn test_title_contributes_tokens() {
        let a = analyzer();
        let d = doc("Asthma maintenance study", json!({}));
        let findings = a.analyze(&d).unwrap();
        assert!(findings.iter().any(|f| f.keyword == "asthma"));
        assert_eq!(
            findings[0].metadata["source"],
            json!("CLINICAL_TRIALS")
        );
    }

    #[test]
    fn test_empty_payload_yields_no_findings() {
        let a = analyzer();
        let d = doc("", json!({"count": 12, "flag": true}));
        assert!(a.analyze(&d).unwrap().is_empty());
    }
}
