//! Condition grouping — which medical conditions a document mentions.

use std::collections::BTreeSet;

use serde_json::{json, Value};
use tracing::debug;

use crate::analyzer::{DocumentAnalyzer, Finding};
use medsift_core::{AnalysisKind, Result, SourceKind};
use medsift_store::Document;

/// Extracts a set of condition strings from structured payload fields.
///
/// Presence is the signal here, not repetition: every finding carries
/// frequency 1 and duplicates within one document collapse.
///
/// Metadata keys per finding: `source`, `title`, `grouped_by` ("condition").
pub struct ConditionGroupingAnalyzer;

impl ConditionGroupingAnalyzer {
    /// `protocolSection.conditionsModule.conditions` plus the module's
    /// `keywords` list.
    fn from_clinical_trials(payload: &Value) -> BTreeSet<String> {
        let mut conditions = BTreeSet::new();
        let module = &payload["protocolSection"]["conditionsModule"];
        collect_strings(&module["conditions"], &mut conditions);
        collect_strings(&module["keywords"], &mut conditions);
        conditions
    }

    /// `indication` / `indication_text` scalar and the `indications` list.
    /// Label payload shapes vary by endpoint, so every lookup is optional.
    fn from_drug_label(payload: &Value) -> BTreeSet<String> {
        let mut conditions = BTreeSet::new();
        for field in ["indication", "indication_text"] {
            if let Some(s) = payload[field].as_str() {
                insert_trimmed(s, &mut conditions);
            }
        }
        collect_strings(&payload["indications"], &mut conditions);
        conditions
    }
}

impl DocumentAnalyzer for ConditionGroupingAnalyzer {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::ConditionGrouping
    }

    fn analyze(&self, doc: &Document) -> Result<Vec<Finding>> {
        let conditions = match doc.source {
            SourceKind::ClinicalTrials => Self::from_clinical_trials(&doc.payload),
            SourceKind::FdaDrugLabels => Self::from_drug_label(&doc.payload),
        };

        debug!(
            "Condition grouping for document {}: {} conditions",
            doc.id,
            conditions.len()
        );

        Ok(conditions
            .into_iter()
            .map(|condition| Finding {
                keyword: condition,
                frequency: 1,
                metadata: json!({
                    "source": doc.source.as_str(),
                    "title": doc.title,
                    "grouped_by": "condition",
                }),
            })
            .collect())
    }
}

/// Add every trimmed, non-empty string from a JSON list to the set.
fn collect_strings(value: &Value, out: &mut BTreeSet<String>) {
    if let Some(items) = value.as_array() {
        for item in items {
            if let Some(s) = item.as_str() {
                insert_trimmed(s, out);
            }
        }
    }
}

fn insert_trimmed(s: &str, out: &mut BTreeSet<String>) {
    let trimmed = s.trim();
    if !trimmed.is_empty() {
        out.insert(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clinical_trials_conditions_and_keywords() {
        let doc = Document::new(
            SourceKind::ClinicalTrials,
            "NCT001",
            "Asthma trial",
            json!({
                "protocolSection": {
                    "conditionsModule": {
                        "conditions": ["Asthma", "  Asthma  ", "", "COPD"],
                        "keywords": ["Bronchodilator", 7],
                    }
                }
            }),
            None,
        );

        let findings = ConditionGroupingAnalyzer.analyze(&doc).unwrap();
        let keywords: Vec<&str> = findings.iter().map(|f| f.keyword.as_str()).collect();
        // Set semantics: the duplicate "Asthma" collapses, empties are dropped.
        assert_eq!(keywords, vec!["Asthma", "Bronchodilator", "COPD"]);
        assert!(findings.iter().all(|f| f.frequency == 1));
        assert!(findings
            .iter()
            .all(|f| f.metadata["grouped_by"] == json!("condition")));
    }

    #[test]
    fn test_drug_label_indications() {
        let doc = Document::new(
            SourceKind::FdaDrugLabels,
            "NDA123",
            "Some label",
            json!({
                "indication": "Hypertension",
                "indications": ["Hypertension", "Angina"],
            }),
            None,
        );

        let findings = ConditionGroupingAnalyzer.analyze(&doc).unwrap();
        let keywords: Vec<&str> = findings.iter().map(|f| f.keyword.as_str()).collect();
        assert_eq!(keywords, vec!["Angina", "Hypertension"]);
    }

    #[test]
    fn test_wrong_shape_yields_empty_not_error() {
        let doc = Document::new(
            SourceKind::ClinicalTrials,
            "NCT002",
            "Odd payload",
            json!({"protocolSection": "not an object"}),
            None,
        );
        assert!(ConditionGroupingAnalyzer.analyze(&doc).unwrap().is_empty());
    }
}
