//! MedSift Core — shared enums, errors, configuration.

pub mod config;
pub mod error;
pub mod kinds;

pub use config::{AnalysisSettings, DataPaths, MedsiftConfig};
pub use error::{Error, Result};
pub use kinds::{AnalysisKind, SourceKind};
