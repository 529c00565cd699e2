//! Category grouping — structured classification fields per document.

use std::collections::BTreeSet;

use serde_json::{json, Value};
use tracing::debug;

use crate::analyzer::{DocumentAnalyzer, Finding};
use medsift_core::{AnalysisKind, Result, SourceKind};
use medsift_store::Document;

/// Extracts a set of (value, dimension) category pairs.
///
/// Trial registry documents contribute phases, study type, intervention types
/// and the lead sponsor class; drug labels contribute administration route and
/// drug class. De-duplication is by the (value, dimension) pair; frequency is
/// always 1.
///
/// Metadata keys per finding: `source`, `title`, `grouped_by` ("category"),
/// `category_type` (the dimension).
pub struct CategoryGroupingAnalyzer;

impl CategoryGroupingAnalyzer {
    fn from_clinical_trials(payload: &Value) -> BTreeSet<(String, String)> {
        let mut categories = BTreeSet::new();
        let protocol = &payload["protocolSection"];

        let design = &protocol["designModule"];
        if let Some(phases) = design["phases"].as_array() {
            for phase in phases {
                if let Some(s) = phase.as_str() {
                    insert_pair(s, "phase", &mut categories);
                }
            }
        }
        if let Some(study_type) = design["studyType"].as_str() {
            insert_pair(study_type, "study_type", &mut categories);
        }

        if let Some(interventions) = protocol["armsInterventionsModule"]["interventions"].as_array()
        {
            for intervention in interventions {
                if let Some(kind) = intervention["type"].as_str() {
                    insert_pair(kind, "intervention_type", &mut categories);
                }
            }
        }

        if let Some(class) =
            protocol["sponsorCollaboratorsModule"]["leadSponsor"]["class"].as_str()
        {
            insert_pair(class, "sponsor_type", &mut categories);
        }

        categories
    }

    fn from_drug_label(payload: &Value) -> BTreeSet<(String, String)> {
        let mut categories = BTreeSet::new();

        for field in ["route", "route_of_administration"] {
            if let Some(route) = payload[field].as_str() {
                insert_pair(route, "route", &mut categories);
            }
        }
        for field in ["drug_class", "category"] {
            if let Some(class) = payload[field].as_str() {
                insert_pair(class, "drug_class", &mut categories);
            }
        }

        categories
    }
}

impl DocumentAnalyzer for CategoryGroupingAnalyzer {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::CategoryGrouping
    }

    fn analyze(&self, doc: &Document) -> Result<Vec<Finding>> {
        let categories = match doc.source {
            SourceKind::ClinicalTrials => Self::from_clinical_trials(&doc.payload),
            SourceKind::FdaDrugLabels => Self::from_drug_label(&doc.payload),
        };

        debug!(
            "Category grouping for document {}: {} categories",
            doc.id,
            categories.len()
        );

        Ok(categories
            .into_iter()
            .map(|(value, dimension)| Finding {
                keyword: value,
                frequency: 1,
                metadata: json!({
                    "source": doc.source.as_str(),
                    "title": doc.title,
                    "grouped_by": "category",
                    "category_type": dimension,
                }),
            })
            .collect())
    }
}

fn insert_pair(value: &str, dimension: &str, out: &mut BTreeSet<(String, String)>) {
    let trimmed = value.trim();
    if !trimmed.is_empty() {
        out.insert((trimmed.to_string(), dimension.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clinical_trials_categories() {
        let doc = Document::new(
            SourceKind::ClinicalTrials,
            "NCT001",
            "Trial",
            json!({
                "protocolSection": {
                    "designModule": {
                        "phases": ["Phase 2", "Phase 2", "Phase 3"],
                        "studyType": "Interventional",
                    },
                    "armsInterventionsModule": {
                        "interventions": [
                            {"type": "Drug", "name": "X"},
                            {"type": "Drug", "name": "Y"},
                            {"name": "untyped"},
                        ],
                    },
                    "sponsorCollaboratorsModule": {
                        "leadSponsor": {"class": "INDUSTRY"},
                    },
                }
            }),
            None,
        );

        let findings = CategoryGroupingAnalyzer.analyze(&doc).unwrap();
        let pairs: Vec<(String, String)> = findings
            .iter()
            .map(|f| {
                (
                    f.keyword.clone(),
                    f.metadata["category_type"].as_str().unwrap().to_string(),
                )
            })
            .collect();

        // Duplicate phases and duplicate intervention types collapse.
        assert_eq!(
            pairs.iter().filter(|(v, _)| v == "Phase 2").count(),
            1
        );
        assert!(pairs.contains(&("Phase 3".into(), "phase".into())));
        assert!(pairs.contains(&("Interventional".into(), "study_type".into())));
        assert_eq!(
            pairs.iter().filter(|(v, d)| v == "Drug" && d == "intervention_type").count(),
            1
        );
        assert!(pairs.contains(&("INDUSTRY".into(), "sponsor_type".into())));
        assert!(findings.iter().all(|f| f.frequency == 1));
    }

    #[test]
    fn test_same_value_different_dimensions_both_kept() {
        let doc = Document::new(
            SourceKind::FdaDrugLabels,
            "NDA1",
            "Label",
            json!({"route": "Oral", "drug_class": "Oral"}),
            None,
        );
        let findings = CategoryGroupingAnalyzer.analyze(&doc).unwrap();
        assert_eq!(findings.len(), 2);
    }

    #[test]
    fn test_drug_label_fallback_fields() {
        let doc = Document::new(
            SourceKind::FdaDrugLabels,
            "NDA2",
            "Label",
            json!({"route_of_administration": "Intravenous", "category": "Antibiotic"}),
            None,
        );
        let findings = CategoryGroupingAnalyzer.analyze(&doc).unwrap();
        let pairs: Vec<(&str, &str)> = findings
            .iter()
            .map(|f| {
                (
                    f.keyword.as_str(),
                    f.metadata["category_type"].as_str().unwrap(),
                )
            })
            .collect();
        assert!(pairs.contains(&("Intravenous", "route")));
        assert!(pairs.contains(&("Antibiotic", "drug_class")));
    }

    #[test]
    fn test_missing_sections_yield_empty() {
        let doc = Document::new(SourceKind::ClinicalTrials, "NCT002", "Bare", json!({}), None);
        assert!(CategoryGroupingAnalyzer.analyze(&doc).unwrap().is_empty());
    }
}
