//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Paths to MedSift data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// SQLite corpus directory (`data/corpus/`).
    pub corpus: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            corpus: root.join("corpus"),
            root,
        };
        std::fs::create_dir_all(&paths.corpus)?;
        Ok(paths)
    }
}

/// Tuning knobs for the analysis pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// How many unprocessed documents one pass pulls per analysis kind.
    pub batch_size: usize,
    /// Seconds between scheduled passes.
    pub interval_secs: u64,
    /// Minimum token length for keyword extraction.
    pub min_token_len: usize,
    /// Largest n-gram length extracted (inclusive; 1 disables n-grams).
    pub max_ngram: usize,
    /// Ceiling on the stop-word fraction inside an accepted n-gram.
    pub max_stopword_ratio: f64,
    /// Per-document keyword entries kept (top by frequency).
    pub keyword_top_k: usize,
    /// Rows stored per FREQUENT_TERMS recomputation.
    pub frequent_terms_limit: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            batch_size: 100,
            interval_secs: 300,
            min_token_len: 3,
            max_ngram: 3,
            max_stopword_ratio: 0.5,
            keyword_top_k: 50,
            frequent_terms_limit: 50,
        }
    }
}

/// Top-level MedSift configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedsiftConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Analysis pipeline settings.
    pub analysis: AnalysisSettings,
}

impl MedsiftConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3010);

        let data_paths = DataPaths::new(data_dir)?;

        let mut analysis = AnalysisSettings::default();
        if let Some(v) = env_parse("MEDSIFT_ANALYSIS_BATCH_SIZE") {
            analysis.batch_size = v;
        }
        if let Some(v) = env_parse("MEDSIFT_ANALYSIS_INTERVAL_SECS") {
            analysis.interval_secs = v;
        }
        if let Some(v) = env_parse("MEDSIFT_KEYWORD_TOP_K") {
            analysis.keyword_top_k = v;
        }
        if let Some(v) = env_parse("MEDSIFT_KEYWORD_MIN_LEN") {
            analysis.min_token_len = v;
        }
        if let Some(v) = env_parse("MEDSIFT_KEYWORD_MAX_NGRAM") {
            analysis.max_ngram = v;
        }
        if let Some(v) = env_parse("MEDSIFT_KEYWORD_MAX_STOPWORD_RATIO") {
            analysis.max_stopword_ratio = v;
        }
        if let Some(v) = env_parse("MEDSIFT_FREQUENT_TERMS_LIMIT") {
            analysis.frequent_terms_limit = v;
        }

        Ok(Self {
            port,
            data_paths,
            analysis,
        })
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
