//! Closed enumerations shared across crates.
//!
//! Both enums have a stable SCREAMING_SNAKE string form that is what gets
//! stored in SQLite and sent over the wire, so the database stays readable
//! and new kinds can be added without renumbering anything.

use serde::{Deserialize, Serialize};

/// Kind of analysis an `AnalysisResult` row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisKind {
    KeywordFrequency,
    ConditionGrouping,
    CategoryGrouping,
    FrequentTerms,
}

impl AnalysisKind {
    /// Per-document kinds in the order the coordinator runs them.
    /// FREQUENT_TERMS is not listed: it aggregates KEYWORD_FREQUENCY output
    /// and always runs after everything here.
    pub fn per_document() -> &'static [AnalysisKind] {
        &[
            Self::KeywordFrequency,
            Self::ConditionGrouping,
            Self::CategoryGrouping,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KeywordFrequency => "KEYWORD_FREQUENCY",
            Self::ConditionGrouping => "CONDITION_GROUPING",
            Self::CategoryGrouping => "CATEGORY_GROUPING",
            Self::FrequentTerms => "FREQUENT_TERMS",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "KEYWORD_FREQUENCY" => Some(Self::KeywordFrequency),
            "CONDITION_GROUPING" => Some(Self::ConditionGrouping),
            "CATEGORY_GROUPING" => Some(Self::CategoryGrouping),
            "FREQUENT_TERMS" => Some(Self::FrequentTerms),
            _ => None,
        }
    }
}

impl std::fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which external registry a document was captured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceKind {
    ClinicalTrials,
    FdaDrugLabels,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClinicalTrials => "CLINICAL_TRIALS",
            Self::FdaDrugLabels => "FDA_DRUG_LABELS",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CLINICAL_TRIALS" => Some(Self::ClinicalTrials),
            "FDA_DRUG_LABELS" => Some(Self::FdaDrugLabels),
            _ => None,
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            AnalysisKind::KeywordFrequency,
            AnalysisKind::ConditionGrouping,
            AnalysisKind::CategoryGrouping,
            AnalysisKind::FrequentTerms,
        ] {
            assert_eq!(AnalysisKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(AnalysisKind::parse("SENTIMENT"), None);
    }

    #[test]
    fn test_per_document_order() {
        let kinds = AnalysisKind::per_document();
        assert_eq!(kinds[0], AnalysisKind::KeywordFrequency);
        assert_eq!(kinds[1], AnalysisKind::ConditionGrouping);
        assert_eq!(kinds[2], AnalysisKind::CategoryGrouping);
        assert!(!kinds.contains(&AnalysisKind::FrequentTerms));
    }

    #[test]
    fn test_source_kind_serde() {
        let json = serde_json::to_string(&SourceKind::ClinicalTrials).unwrap();
        assert_eq!(json, "\"CLINICAL_TRIALS\"");
        let back: SourceKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SourceKind::ClinicalTrials);
    }
}
